//! Cheap checks that keep noise and off-topic questions away from the generator.

use crate::config::GateConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    Gibberish,
    OutOfScope,
}

impl Rejection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rejection::Gibberish => "gibberish",
            Rejection::OutOfScope => "out_of_scope",
        }
    }

    /// Canned markdown answer returned instead of a generation.
    pub fn message(&self) -> &'static str {
        match self {
            Rejection::Gibberish => "Sua mensagem não parece uma pergunta educacional válida. Por favor, reformule com um objetivo de aprendizagem claro (ex.: 'Como implementar ...?', 'Explique ...').",
            Rejection::OutOfScope => "No momento, este assistente atende apenas dúvidas de ensino/aprendizagem. Por favor, reformule sua pergunta com foco educacional (ex.: 'Explique...', 'Como resolver...', 'Exemplo de...').",
        }
    }
}

/// What the gate needs to know about the caller's learning context.
#[derive(Debug, Clone, Copy, Default)]
pub struct LearnerSignals {
    pub has_topic: bool,
    pub has_progress: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Gate {
    config: GateConfig,
}

impl Gate {
    pub fn new(config: GateConfig) -> Self {
        Self { config }
    }

    /// Gibberish is checked first; `None` lets the query through.
    pub fn screen(&self, query: Option<&str>, learner: LearnerSignals) -> Option<Rejection> {
        if self.is_gibberish(query) {
            return Some(Rejection::Gibberish);
        }
        if !self.is_educational(query, learner) {
            return Some(Rejection::OutOfScope);
        }
        None
    }

    pub fn is_gibberish(&self, query: Option<&str>) -> bool {
        let Some(text) = query.map(str::trim) else {
            return true;
        };
        let total = text.chars().count();
        if total < self.config.min_query_length {
            return true;
        }
        let allowed = text
            .chars()
            .filter(|c| c.is_alphanumeric() || c.is_whitespace())
            .count();
        (allowed as f64 / total.max(1) as f64) < self.config.min_alphanumeric_ratio
    }

    pub fn is_educational(&self, query: Option<&str>, learner: LearnerSignals) -> bool {
        let Some(text) = query.filter(|q| !q.is_empty()) else {
            return false;
        };
        if learner.has_topic || learner.has_progress {
            return true;
        }
        let low = text.to_lowercase();
        self.config
            .educational_keywords
            .iter()
            .any(|k| low.contains(k.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> Gate {
        Gate::default()
    }

    #[test]
    fn random_letters_are_out_of_scope() {
        assert_eq!(
            gate().screen(Some("asdkjh"), LearnerSignals::default()),
            Some(Rejection::OutOfScope)
        );
    }

    #[test]
    fn punctuation_heavy_query_is_gibberish() {
        assert_eq!(
            gate().screen(Some("a!!!"), LearnerSignals::default()),
            Some(Rejection::Gibberish)
        );
    }

    #[test]
    fn short_or_missing_query_is_gibberish() {
        assert!(gate().is_gibberish(None));
        assert!(gate().is_gibberish(Some("  ab  ")));
        assert!(!gate().is_gibberish(Some("abc")));
    }

    #[test]
    fn accented_text_counts_as_alphanumeric() {
        assert!(!gate().is_gibberish(Some("ação, função?")));
    }

    #[test]
    fn keyword_match_is_case_insensitive() {
        let g = gate();
        assert!(g.is_educational(Some("Explique o ALGORITMO de Dijkstra"), LearnerSignals::default()));
        assert!(g.is_educational(Some("Como ordenar uma lista?"), LearnerSignals::default()));
        assert!(!g.is_educational(Some("qual a previsão do tempo"), LearnerSignals::default()));
    }

    #[test]
    fn learner_context_bypasses_keywords() {
        let signals = LearnerSignals {
            has_topic: true,
            has_progress: false,
        };
        assert_eq!(gate().screen(Some("e agora?"), signals), None);

        let signals = LearnerSignals {
            has_topic: false,
            has_progress: true,
        };
        assert!(gate().is_educational(Some("qual o próximo?"), signals));
    }

    #[test]
    fn configured_keywords_replace_defaults() {
        let g = Gate::new(GateConfig {
            educational_keywords: vec!["rust".to_string()],
            ..GateConfig::default()
        });
        assert!(g.is_educational(Some("Rust ownership"), LearnerSignals::default()));
        assert!(!g.is_educational(Some("explique python"), LearnerSignals::default()));
    }

    #[test]
    fn rejection_tags_and_messages() {
        assert_eq!(Rejection::Gibberish.as_str(), "gibberish");
        assert_eq!(Rejection::OutOfScope.as_str(), "out_of_scope");
        assert!(Rejection::OutOfScope.message().starts_with("No momento"));
        assert_eq!(
            serde_json::to_value(Rejection::OutOfScope).unwrap(),
            "out_of_scope"
        );
    }
}
