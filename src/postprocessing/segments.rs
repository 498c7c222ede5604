//! Splits a generated answer into typed, titled segments for step-by-step
//! navigation on the front-end.
//!
//! Order is fixed: reflection, question, intro, steps, correct example,
//! incorrect example, final code, quiz. Reflection and question are always
//! present; when the answer has no matching heading a short text built from
//! the student's query stands in.

use super::formatter::strip_fenced_blocks;
use super::interpreter::{find_quiz, shuffle_quiz_payload};
use super::validator::FinalCode;
use rand::Rng;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use thiserror::Error;

/// Section boundary: a `##` or `###` heading line.
static HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^#{2,3}[ \t]+.+$").expect("Invalid heading regex")
});

static LIST_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:\d+\.|[-*+])\s+").expect("Invalid list line regex")
});

static BULLET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*[-*+]\s+").expect("Invalid bullet regex"));

const REFLECTION_PREAMBLE: &str = "Antes da solução, foque em compreender o objetivo, organizar informações e escolher uma estratégia inicial. Observe relações importantes e critérios para validar sua resposta.";

#[derive(Error, Debug)]
pub enum SegmentError {
    #[error("Invalid {rule} heading rule: {source}")]
    InvalidRule {
        rule: &'static str,
        source: regex::Error,
    },
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SegmentKind {
    Intro,
    Steps,
    CorrectExample,
    IncorrectExample,
    Reflection,
    Question,
    FinalCode,
    Quiz,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: SegmentKind,
    pub content: String,
    pub language: Option<String>,
}

impl Segment {
    fn new(prefix: &str, title: &str, kind: SegmentKind, content: String) -> Self {
        Self {
            id: format!("{}_1", prefix),
            title: title.to_string(),
            kind,
            content,
            language: None,
        }
    }
}

/// Case-insensitive regex fragments that recognise section headings.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct SegmentRules {
    pub analysis: String,
    pub reflection: String,
    pub question: String,
    /// Tried in order; the first heading that matches wins.
    pub steps: Vec<String>,
    pub correct_example: String,
    pub incorrect_example: String,
}

impl Default for SegmentRules {
    fn default() -> Self {
        Self {
            analysis: r"An[áa]lise do Problema".to_string(),
            reflection: r"Reflex[aã]o guiada|Reflex[aã]o|Dica".to_string(),
            question: r"Pergunta|Perguntas|Pergunta ao aluno".to_string(),
            steps: vec![
                r"Passo\s*a\s*passo".to_string(),
                r"Exemplo\s*Trabalhado(?:\s*\(Passo\s*a\s*passo\))?".to_string(),
            ],
            correct_example: r"exemplo\s*corr[eé]to|\bcorreto".to_string(),
            incorrect_example: r"exemplo\s*incorr[eé]to|incorreto|\berro".to_string(),
        }
    }
}

struct CompiledRules {
    analysis: Regex,
    reflection: Regex,
    question: Regex,
    steps: Vec<Regex>,
    correct_example: Regex,
    incorrect_example: Regex,
}

impl CompiledRules {
    fn compile(rules: &SegmentRules) -> Result<Self, SegmentError> {
        Ok(Self {
            analysis: heading_regex("analysis", &format!(r"^#{{2,}}[ \t]+(?:{})", rules.analysis))?,
            reflection: named_heading("reflection", &rules.reflection)?,
            question: named_heading("question", &rules.question)?,
            steps: rules
                .steps
                .iter()
                .map(|frag| named_heading("steps", frag))
                .collect::<Result<_, _>>()?,
            correct_example: keyword_heading("correct_example", &rules.correct_example)?,
            incorrect_example: keyword_heading("incorrect_example", &rules.incorrect_example)?,
        })
    }
}

/// `## <name>` headings: the name must start the title.
fn named_heading(rule: &'static str, fragment: &str) -> Result<Regex, SegmentError> {
    heading_regex(rule, &format!(r"^#{{2,}}[ \t]+(?:{})\b.*$", fragment))
}

/// `##`/`###` headings that mention the keyword anywhere in the title.
fn keyword_heading(rule: &'static str, fragment: &str) -> Result<Regex, SegmentError> {
    heading_regex(rule, &format!(r"^#{{2,3}}[ \t]+.*(?:{}).*$", fragment))
}

fn heading_regex(rule: &'static str, pattern: &str) -> Result<Regex, SegmentError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .multi_line(true)
        .build()
        .map_err(|source| SegmentError::InvalidRule { rule, source })
}

/// Body under the first heading matching `heading`, up to the next
/// `##`/`###` heading or the end of the text.
fn section_after(text: &str, heading: &Regex) -> Option<String> {
    let m = heading.find(text)?;
    let start = m.end();
    let end = HEADING
        .find_at(text, start)
        .map(|next| next.start())
        .unwrap_or(text.len());
    Some(text[start..end].trim().to_string())
}

#[derive(Debug, Clone, Default)]
pub struct SegmentBuilder {
    rules: SegmentRules,
}

impl SegmentBuilder {
    pub fn new(rules: SegmentRules) -> Self {
        Self { rules }
    }

    pub fn build<R: Rng + ?Sized>(
        &self,
        markdown: &str,
        final_code: Option<&FinalCode>,
        user_query: Option<&str>,
        rng: &mut R,
    ) -> Result<Vec<Segment>, SegmentError> {
        let rules = CompiledRules::compile(&self.rules)?;
        let text = markdown.trim().replace("\r\n", "\n");
        let query = user_query.map(str::trim).filter(|q| !q.is_empty());

        let mut segments = vec![
            reflection_segment(&text, &rules, query),
            question_segment(&text, &rules, query),
        ];
        segments.extend(intro_segment(&text, &rules));
        segments.extend(steps_segment(&text, &rules));
        segments.extend(section_after(&text, &rules.correct_example).map(|content| {
            Segment::new("correct", "Exemplo Correto", SegmentKind::CorrectExample, content)
        }));
        segments.extend(section_after(&text, &rules.incorrect_example).map(|content| {
            Segment::new("incorrect", "Exemplo Incorreto", SegmentKind::IncorrectExample, content)
        }));
        segments.extend(final_code.filter(|fc| fc.has_code()).map(final_code_segment));
        segments.extend(quiz_segment(&text, rng));

        Ok(segments)
    }
}

fn intro_segment(text: &str, rules: &CompiledRules) -> Option<Segment> {
    let intro_end = HEADING.find(text).map(|m| m.start()).unwrap_or(text.len());
    let intro = strip_fenced_blocks(text[..intro_end].trim()).trim().to_string();
    if intro.is_empty() {
        return None;
    }
    let title = if rules.analysis.is_match(text) {
        "Análise do Problema"
    } else {
        "Introdução"
    };
    Some(Segment::new("intro", title, SegmentKind::Intro, intro))
}

fn reflection_segment(text: &str, rules: &CompiledRules, query: Option<&str>) -> Segment {
    let content = match section_after(text, &rules.reflection).filter(|b| !b.is_empty()) {
        Some(body) if BULLET.is_match(&body) => {
            format!("{}\n\n{}", REFLECTION_PREAMBLE, BULLET.replace_all(&body, ""))
        }
        Some(body) => body,
        None => format!(
            "Antes de partir para a solução, alinhe o pensamento: esclareça o que o problema pede, \
             liste os dados relevantes e imagine uma estratégia inicial. Considere como verificará o resultado \
             no contexto de: \"{}\". Foque na lógica por trás das decisões, não nos detalhes de código.",
            query.unwrap_or("o problema proposto")
        ),
    };
    Segment::new("reflection", "Reflexão", SegmentKind::Reflection, content)
}

fn question_segment(text: &str, rules: &CompiledRules, query: Option<&str>) -> Segment {
    let content = section_after(text, &rules.question)
        .filter(|b| !b.is_empty())
        .unwrap_or_else(|| {
            format!(
                "Como você explicaria, em poucas linhas, qual seria sua primeira abordagem para resolver \"{}\"?",
                query.unwrap_or("o problema")
            )
        });
    Segment::new("question", "Pergunta", SegmentKind::Question, content)
}

fn steps_segment(text: &str, rules: &CompiledRules) -> Option<Segment> {
    let section = rules
        .steps
        .iter()
        .find_map(|heading| section_after(text, heading).filter(|s| !s.is_empty()));

    let content = match section {
        Some(s) => s,
        None => {
            let lines: Vec<&str> = text.lines().filter(|l| LIST_LINE.is_match(l)).collect();
            if lines.is_empty() {
                return None;
            }
            lines.join("\n")
        }
    };
    Some(Segment::new("steps", "Passo a passo", SegmentKind::Steps, content))
}

fn final_code_segment(final_code: &FinalCode) -> Segment {
    let lang = match final_code.language.trim() {
        "" => "text".to_string(),
        l => l.to_lowercase(),
    };
    let mut segment = Segment::new(
        "final_code",
        "Código final",
        SegmentKind::FinalCode,
        format!("```{}\n{}\n```", lang, final_code.code),
    );
    segment.language = Some(lang);
    segment
}

/// The quiz is shuffled again here, independently of any earlier pass.
fn quiz_segment<R: Rng + ?Sized>(text: &str, rng: &mut R) -> Option<Segment> {
    let block = find_quiz(text)?;
    let content =
        shuffle_quiz_payload(block.inner, rng).unwrap_or_else(|| block.raw.to_string());
    Some(Segment::new("quiz", "Quiz", SegmentKind::Quiz, content))
}
