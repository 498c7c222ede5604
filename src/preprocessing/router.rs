use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Metodologia '{0}' não é válida")]
pub struct InvalidMethodology(pub String);

/// Educational strategy that shapes the instructions sent to the generator.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Methodology {
    SequentialThinking,
    Analogy,
    Socratic,
    Scaffolding,
    WorkedExamples,
    Default,
}

/// Display metadata for a methodology.
#[derive(Debug, Clone, Copy)]
pub struct MethodologyProfile {
    pub description: &'static str,
    pub display_name: &'static str,
    pub summary: &'static str,
    pub use_cases: &'static [&'static str],
    pub xml_formatted: bool,
}

impl Methodology {
    pub const ALL: [Methodology; 6] = [
        Methodology::SequentialThinking,
        Methodology::Analogy,
        Methodology::Socratic,
        Methodology::Scaffolding,
        Methodology::WorkedExamples,
        Methodology::Default,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Methodology::SequentialThinking => "sequential_thinking",
            Methodology::Analogy => "analogy",
            Methodology::Socratic => "socratic",
            Methodology::Scaffolding => "scaffolding",
            Methodology::WorkedExamples => "worked_examples",
            Methodology::Default => "default",
        }
    }

    pub fn profile(&self) -> MethodologyProfile {
        match self {
            Methodology::SequentialThinking => MethodologyProfile {
                description: "Tutor especializado em pensamento sequencial com foco em progressão lógica.",
                display_name: "Pensamento Sequencial",
                summary: "Explica o raciocínio passo a passo de forma estruturada",
                use_cases: &[
                    "Problemas complexos com múltiplas etapas",
                    "Estudantes que precisam de estrutura",
                    "Conceitos que requerem ordem lógica",
                ],
                xml_formatted: false,
            },
            Methodology::Analogy => MethodologyProfile {
                description: "Tutor que aproxima conceitos a experiências familiares sem perder precisão técnica.",
                display_name: "Analogias",
                summary: "Usa analogias do cotidiano para facilitar o entendimento",
                use_cases: &[
                    "Conceitos abstratos",
                    "Estudantes visuais",
                    "Tópicos difíceis de visualizar",
                ],
                xml_formatted: false,
            },
            Methodology::Socratic => MethodologyProfile {
                description: "Tutor que conduz o aprendizado por perguntas encadeadas e reflexão.",
                display_name: "Método Socrático",
                summary: "Estimula o pensamento crítico através de perguntas",
                use_cases: &[
                    "Desenvolvimento de pensamento crítico",
                    "Estudantes avançados",
                    "Discussões conceituais",
                ],
                xml_formatted: false,
            },
            Methodology::Scaffolding => MethodologyProfile {
                description: "Tutor que oferece suporte gradual removendo andaimes à medida que o aluno avança.",
                display_name: "Scaffolding",
                summary: "Oferece dicas graduais removendo o suporte progressivamente",
                use_cases: &[
                    "Estudantes iniciantes",
                    "Conceitos progressivos",
                    "Desenvolvimento gradual de habilidades",
                ],
                xml_formatted: false,
            },
            Methodology::WorkedExamples => MethodologyProfile {
                description: "Tutor especializado em exemplos trabalhados completos com reflexão guiada.",
                display_name: "Exemplos Resolvidos",
                summary: "Ensina através de exemplos detalhadamente resolvidos",
                use_cases: &[
                    "Resolução de problemas",
                    "Aprendizado de algoritmos",
                    "Demonstração de técnicas",
                ],
                xml_formatted: false,
            },
            Methodology::Default => MethodologyProfile {
                description: "Tutor educacional padrão orientado por pesquisas.",
                display_name: "Padrão",
                summary: "Resposta educacional padrão, clara e objetiva",
                use_cases: &[
                    "Uso geral",
                    "Primeira interação",
                    "Quando não há preferência específica",
                ],
                xml_formatted: false,
            },
        }
    }
}

impl FromStr for Methodology {
    type Err = InvalidMethodology;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Methodology::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| InvalidMethodology(s.to_string()))
    }
}

impl fmt::Display for Methodology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
