//! Picks the code artifact the response recommends as its runnable solution.

use super::formatter::FencedBlock;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Tags whose blocks are never treated as code.
const NON_CODE_TAGS: [&str; 3] = ["quiz", "mermaid", "excalidraw"];

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FinalCode {
    pub language: String,
    pub code: String,
    /// Advisory only: content is never cut, the flag marks an overlong block.
    pub truncated: bool,
    pub line_count: usize,
}

impl FinalCode {
    pub fn new(language: &str, code: &str, max_lines: usize) -> Self {
        let line_count = code.lines().count();
        let language = language.trim().to_lowercase();
        Self {
            language: if language.is_empty() {
                "text".to_string()
            } else {
                language
            },
            code: code.to_string(),
            truncated: max_lines > 0 && line_count > max_lines,
            line_count,
        }
    }

    /// Normalises a `final_code` value produced elsewhere (e.g. a team run),
    /// accepting `language` or `lang`. Empty code yields `None`.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let code = obj.get("code").and_then(Value::as_str).unwrap_or_default();
        if code.trim().is_empty() {
            return None;
        }
        let language = obj
            .get("language")
            .or_else(|| obj.get("lang"))
            .and_then(Value::as_str)
            .unwrap_or("text");

        let mut final_code = Self::new(language, code, 0);
        final_code.truncated = obj
            .get("truncated")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        Some(final_code)
    }

    pub fn has_code(&self) -> bool {
        !self.code.trim().is_empty()
    }
}

/// Scans from the end and returns the last block that carries real code.
pub fn select_final_code(blocks: &[FencedBlock], max_lines: usize) -> Option<FinalCode> {
    blocks
        .iter()
        .rev()
        .filter(|b| !NON_CODE_TAGS.contains(&b.lang.as_str()))
        .find(|b| !b.body.trim().is_empty())
        .map(|b| FinalCode::new(&b.lang, &b.body, max_lines))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::postprocessing::formatter::extract_fenced_blocks;
    use serde_json::json;

    fn five_line_python() -> String {
        "Texto\n\n```python\na = 1\nb = 2\nc = a + b\nprint(c)\nprint('ok')\n```\n".to_string()
    }

    #[test]
    fn none_without_blocks() {
        assert!(select_final_code(&extract_fenced_blocks("sem código"), 150).is_none());
    }

    #[test]
    fn five_line_block_under_limit() {
        let fc = select_final_code(&extract_fenced_blocks(&five_line_python()), 150).unwrap();
        assert_eq!(fc.language, "python");
        assert_eq!(fc.line_count, 5);
        assert!(!fc.truncated);
    }

    #[test]
    fn truncation_is_advisory_only() {
        let blocks = extract_fenced_blocks(&five_line_python());
        let loose = select_final_code(&blocks, 150).unwrap();
        let tight = select_final_code(&blocks, 2).unwrap();

        assert!(tight.truncated);
        assert_eq!(tight.code, loose.code);
        assert_eq!(tight.line_count, loose.line_count);
    }

    #[test]
    fn single_code_block_wins_regardless_of_position() {
        let md = "```rust\nfn main() {}\n```\n\n```quiz\n{\"options\": []}\n```\n\n```mermaid\ngraph TD\n```";
        let fc = select_final_code(&extract_fenced_blocks(md), 150).unwrap();
        assert_eq!(fc.language, "rust");
        assert_eq!(fc.code, "fn main() {}");
    }

    #[test]
    fn last_code_block_is_chosen_and_blank_blocks_skipped() {
        let md = "```js\nfirst()\n```\n```go\nsecond()\n```\n```\n   \n```";
        let fc = select_final_code(&extract_fenced_blocks(md), 150).unwrap();
        assert_eq!(fc.language, "go");
        assert_eq!(fc.code, "second()");
    }

    #[test]
    fn untagged_block_reports_text() {
        let fc = select_final_code(&extract_fenced_blocks("```\necho hi\n```"), 150).unwrap();
        assert_eq!(fc.language, "text");
    }

    #[test]
    fn from_value_accepts_lang_alias() {
        let fc = FinalCode::from_value(&json!({"lang": "Python", "code": "x = 1\ny = 2"})).unwrap();
        assert_eq!(fc.language, "python");
        assert_eq!(fc.line_count, 2);
        assert!(!fc.truncated);

        assert!(FinalCode::from_value(&json!({"language": "go", "code": "  "})).is_none());
        assert!(FinalCode::from_value(&json!("not an object")).is_none());
    }
}
