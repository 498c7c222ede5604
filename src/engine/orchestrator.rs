//! High-level coordinator: gate → context → generator → post-processing →
//! response → best-effort persistence.

use super::core::{rejection_response, session_record, success_metadata};
use super::types::{AskRequest, TutorResponse};
use super::EngineError;
use crate::config::Config;
use crate::llm::{ArtifactFlags, Extras, Generator, Team};
use crate::memory::{LearningSession, SessionStore};
use crate::postprocessing::{
    extract_fenced_blocks, select_final_code, shuffle_quiz_in_markdown, FinalCode, Segment,
    SegmentBuilder,
};
use crate::preprocessing::{Methodology, Preprocessor};
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, instrument, warn};

/// Outcome of the synchronous text pass over a generated answer.
struct Processed {
    markdown: String,
    selected: Option<FinalCode>,
    segments: Vec<Segment>,
}

pub struct Orchestrator {
    preprocessor: Preprocessor,
    segments: SegmentBuilder,
    store: Arc<dyn SessionStore>,
}

impl Orchestrator {
    pub fn new(config: &Config, store: Arc<dyn SessionStore>) -> Self {
        Self {
            preprocessor: Preprocessor::new(config.gate.clone(), config.output.clone()),
            segments: SegmentBuilder::new(config.segments.clone()),
            store,
        }
    }

    /// Answer one question. Only an unknown methodology or a generator failure
    /// is an error; rejections are regular responses.
    #[instrument(skip_all, fields(methodology = %request.methodology))]
    pub async fn ask(
        &self,
        request: &AskRequest,
        generator: Arc<dyn Generator>,
    ) -> Result<TutorResponse, EngineError> {
        let methodology: Methodology = request.methodology.parse()?;

        if let Some(rejection) = self
            .preprocessor
            .screen(Some(&request.user_query), request.learner_signals())
        {
            info!(reason = rejection.as_str(), "Query rejected before generation");
            return Ok(rejection_response(rejection, &request.methodology));
        }

        let started = Instant::now();
        let started_at = Utc::now();
        let limits = self.preprocessor.limits();
        let wants_code = request.wants_final_code();
        let max_lines = request.max_lines_or(limits.max_final_code_lines);

        let recent = match request.user_id() {
            Some(user_id) => self.recent_sessions(user_id).await,
            None => Vec::new(),
        };
        let context = self.preprocessor.build_context(
            request.context.as_deref(),
            &recent,
            wants_code,
            max_lines,
        );

        let (raw, mut extras) = if wants_code {
            Team::new(generator)
                .generate_with_artifacts(
                    &request.user_query,
                    Some(&context),
                    ArtifactFlags {
                        include_final_code: true,
                        max_final_code_lines: max_lines,
                    },
                )
                .await?
        } else {
            let text = generator
                .generate(&request.user_query, Some(&context), methodology)
                .await?;
            (text, Extras::default())
        };
        let elapsed = started.elapsed();

        let processed = self.postprocess(
            &raw,
            wants_code.then_some(max_lines),
            extras.final_code.clone(),
            &request.user_query,
        );

        let metadata =
            success_metadata(request, methodology, elapsed, processed.selected.as_ref());
        if let Some(selected) = processed.selected {
            extras.final_code = Some(selected);
        }

        let response = TutorResponse::new(
            processed.markdown,
            &request.methodology,
            metadata,
            extras,
            processed.segments,
        );

        if let Some(session) = session_record(
            request,
            methodology,
            &response.response,
            started_at,
            limits.persisted_response_chars,
        ) {
            self.persist(&session).await;
        }

        info!(
            elapsed_ms = elapsed.as_millis() as u64,
            segments = response.segments.as_ref().map_or(0, Vec::len),
            "Question answered"
        );
        Ok(response)
    }

    /// Quiz shuffle, final-code selection and segmentation. The RNG never
    /// leaves this function.
    fn postprocess(
        &self,
        raw: &str,
        final_code_lines: Option<usize>,
        team_code: Option<FinalCode>,
        query: &str,
    ) -> Processed {
        let mut rng = rand::thread_rng();
        let markdown = shuffle_quiz_in_markdown(raw, &mut rng);

        let selected = final_code_lines
            .and_then(|max| select_final_code(&extract_fenced_blocks(&markdown), max));
        let for_segments = match &selected {
            Some(fc) => Some(fc.clone()),
            None if final_code_lines.is_some() => team_code.filter(FinalCode::has_code),
            None => None,
        };

        let segments =
            match self
                .segments
                .build(&markdown, for_segments.as_ref(), Some(query), &mut rng)
            {
                Ok(segments) => segments,
                Err(e) => {
                    error!(error = %e, "Failed to build segments");
                    Vec::new()
                }
            };

        Processed {
            markdown,
            selected,
            segments,
        }
    }

    async fn recent_sessions(&self, user_id: &str) -> Vec<LearningSession> {
        let limit = self.preprocessor.limits().memory_sessions;
        match self.store.recent_sessions(user_id, limit).await {
            Ok(sessions) => sessions,
            Err(e) => {
                warn!(error = %e, "Session memory unavailable, continuing without it");
                Vec::new()
            }
        }
    }

    async fn persist(&self, session: &LearningSession) {
        if let Err(e) = self.store.save_session(session).await {
            warn!(error = %e, session_id = %session.id, "Failed to persist learning session");
        }
    }
}
