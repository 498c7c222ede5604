//! Splits a worked-example answer across two generator calls: one explains,
//! the other writes the runnable code.

use super::prompts::{explanation_context, final_code_prompt, final_code_section};
use super::{GenerationError, Generator};
use crate::postprocessing::{first_fenced_block, FinalCode};
use crate::preprocessing::Methodology;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};

#[derive(Debug, Clone, Copy)]
pub struct ArtifactFlags {
    pub include_final_code: bool,
    pub max_final_code_lines: usize,
}

impl Default for ArtifactFlags {
    fn default() -> Self {
        Self {
            include_final_code: true,
            max_final_code_lines: 150,
        }
    }
}

/// Side artifacts returned next to the markdown.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Extras {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_code: Option<FinalCode>,
}

impl Extras {
    pub fn is_empty(&self) -> bool {
        self.final_code.is_none()
    }
}

pub struct Team {
    generator: Arc<dyn Generator>,
}

impl Team {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self { generator }
    }

    #[instrument(skip_all, fields(include_final_code = flags.include_final_code))]
    pub async fn generate_with_artifacts(
        &self,
        query: &str,
        context: Option<&str>,
        flags: ArtifactFlags,
    ) -> Result<(String, Extras), GenerationError> {
        let explanation = self
            .generator
            .generate(
                query,
                Some(explanation_context(context).as_str()),
                Methodology::WorkedExamples,
            )
            .await?;

        let mut extras = Extras::default();
        let mut sections = vec![explanation.trim().to_string()];

        if flags.include_final_code {
            let code_reply = self
                .generator
                .generate(
                    &final_code_prompt(query, flags.max_final_code_lines),
                    context,
                    Methodology::Default,
                )
                .await?;

            match first_fenced_block(&code_reply).filter(|b| !b.body.is_empty()) {
                Some(block) => {
                    sections.push(final_code_section(&block.lang, &block.body));
                    extras.final_code = Some(FinalCode::new(
                        &block.lang,
                        &block.body,
                        flags.max_final_code_lines,
                    ));
                }
                None => debug!("Final-code reply carried no fenced block"),
            }
        }

        let markdown = sections
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n");
        Ok((markdown, extras))
    }
}
