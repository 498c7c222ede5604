pub mod context;
pub mod gate;
pub mod router;

pub use context::{augment_context, compact_memory, with_memory};
pub use gate::{Gate, LearnerSignals, Rejection};
pub use router::{InvalidMethodology, Methodology, MethodologyProfile};

use crate::config::{GateConfig, OutputConfig};
use crate::memory::LearningSession;

/// Everything that happens to a question before the generator sees it.
#[derive(Debug, Clone, Default)]
pub struct Preprocessor {
    gate: Gate,
    limits: OutputConfig,
}

impl Preprocessor {
    pub fn new(gate: GateConfig, limits: OutputConfig) -> Self {
        Self {
            gate: Gate::new(gate),
            limits,
        }
    }

    pub fn limits(&self) -> &OutputConfig {
        &self.limits
    }

    pub fn screen(&self, query: Option<&str>, learner: LearnerSignals) -> Option<Rejection> {
        self.gate.screen(query, learner)
    }

    /// Caller context, then session memory, then the formatting instructions.
    pub fn build_context(
        &self,
        base: Option<&str>,
        recent: &[LearningSession],
        include_final_code: bool,
        max_final_code_lines: usize,
    ) -> String {
        let memory = compact_memory(recent, &self.limits);
        let with_mem = with_memory(base.unwrap_or_default(), memory.as_deref());
        augment_context(&with_mem, include_final_code, max_final_code_lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn context_layers_in_order() {
        let mut session = LearningSession::lesson("u", "agno:default");
        session.interactions = vec![json!({"role": "user", "message": "antes"})];

        let ctx = Preprocessor::default().build_context(Some("Curso"), &[session], true, 150);
        let base = ctx.find("Curso").unwrap();
        let memory = ctx.find("MEMÓRIA DA SESSÃO").unwrap();
        let rules = ctx.find("FORMATAÇÃO GERAL").unwrap();
        assert!(base < memory && memory < rules);
        assert!(ctx.contains("- user: antes"));
    }

    #[test]
    fn no_base_and_no_memory_gives_instructions_only() {
        let ctx = Preprocessor::default().build_context(None, &[], false, 150);
        assert!(ctx.starts_with("FORMATAÇÃO GERAL"));
    }
}
