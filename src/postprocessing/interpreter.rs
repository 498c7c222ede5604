//! Interprets the JSON payload of a ```quiz block and shuffles its options.

use rand::seq::SliceRandom;
use rand::Rng;
use regex::{Captures, Regex};
use serde_json::Value;
use std::ops::Range;
use std::sync::LazyLock;
use tracing::debug;

static QUIZ: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)```quiz\s*(.*?)```").expect("Invalid quiz block regex")
});

/// The first quiz-tagged block of a text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizBlock<'a> {
    /// Full fenced text, fences included.
    pub raw: &'a str,
    /// JSON payload between the fences.
    pub inner: &'a str,
    pub range: Range<usize>,
}

pub fn find_quiz(text: &str) -> Option<QuizBlock<'_>> {
    let caps: Captures<'_> = QUIZ.captures(text)?;
    let whole = caps.get(0)?;
    Some(QuizBlock {
        raw: whole.as_str(),
        inner: caps.get(1).map(|m| m.as_str()).unwrap_or_default(),
        range: whole.range(),
    })
}

/// Parses a quiz payload, permutes `options` and relabels them `A`, `B`, ...
/// in their new order. Returns the re-fenced block, or `None` when the payload
/// is not an object with at least two object options.
pub fn shuffle_quiz_payload<R: Rng + ?Sized>(inner: &str, rng: &mut R) -> Option<String> {
    let mut quiz: Value = match serde_json::from_str(inner.trim()) {
        Ok(v) => v,
        Err(e) => {
            debug!(error = %e, "Quiz payload is not valid JSON");
            return None;
        }
    };

    let options = quiz.get_mut("options")?.as_array_mut()?;
    if options.len() < 2 || !options.iter().all(Value::is_object) {
        return None;
    }

    options.shuffle(rng);
    for (option, letter) in options.iter_mut().zip(option_letters()) {
        if let Some(obj) = option.as_object_mut() {
            obj.insert("id".to_string(), Value::String(letter.to_string()));
        }
    }

    let pretty = serde_json::to_string_pretty(&quiz).ok()?;
    Some(format!("```quiz\n{}\n```", pretty))
}

/// Shuffles the first quiz block in place. Text without a usable quiz block
/// comes back unchanged.
pub fn shuffle_quiz_in_markdown<R: Rng + ?Sized>(md: &str, rng: &mut R) -> String {
    let Some(block) = find_quiz(md) else {
        return md.to_string();
    };
    match shuffle_quiz_payload(block.inner, rng) {
        Some(new_block) => {
            let mut out = String::with_capacity(md.len() + 64);
            out.push_str(&md[..block.range.start]);
            out.push_str(&new_block);
            out.push_str(&md[block.range.end..]);
            out
        }
        None => md.to_string(),
    }
}

fn option_letters() -> impl Iterator<Item = char> {
    // Past 'Z' the labels continue through the following code points.
    (0u32..).filter_map(|i| char::from_u32('A' as u32 + i))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::BTreeSet;

    const TWO_OPTIONS: &str = r#"{"options":[{"id":"A","text":"x"},{"id":"B","text":"y"}]}"#;

    fn quiz_md(payload: &str) -> String {
        format!("## Quiz\n\n```quiz\n{}\n```\n\nFim.", payload)
    }

    fn options_of(md: &str) -> Vec<Value> {
        let block = find_quiz(md).expect("quiz block present");
        let v: Value = serde_json::from_str(block.inner.trim()).unwrap();
        v["options"].as_array().unwrap().clone()
    }

    #[test]
    fn two_options_keep_sequential_ids() {
        let mut rng = rand::thread_rng();
        for _ in 0..20 {
            let out = shuffle_quiz_in_markdown(&quiz_md(TWO_OPTIONS), &mut rng);
            let options = options_of(&out);
            assert_eq!(options.len(), 2);
            assert_eq!(options[0]["id"], "A");
            assert_eq!(options[1]["id"], "B");
            let texts: BTreeSet<_> = options.iter().map(|o| o["text"].to_string()).collect();
            assert_eq!(texts.len(), 2);
        }
    }

    #[test]
    fn payloads_are_preserved_ignoring_ids() {
        let payload = r#"{"question":"q?","options":[
            {"id":"A","text":"um","correct":true,"reason":"r1"},
            {"id":"B","text":"dois","correct":false,"reason":"r2"},
            {"id":"C","text":"três","correct":false,"reason":"r3"},
            {"id":"D","text":"quatro","correct":false,"reason":"r4"}
        ],"explanation":"e"}"#;
        let mut rng = StdRng::seed_from_u64(7);
        let out = shuffle_quiz_in_markdown(&quiz_md(payload), &mut rng);

        let strip_id = |o: &Value| {
            let mut o = o.clone();
            o.as_object_mut().unwrap().remove("id");
            o.to_string()
        };
        let before: BTreeSet<_> = options_of(&quiz_md(payload)).iter().map(strip_id).collect();
        let after_opts = options_of(&out);
        let after: BTreeSet<_> = after_opts.iter().map(strip_id).collect();

        assert_eq!(before, after);
        let ids: Vec<_> = after_opts.iter().map(|o| o["id"].as_str().unwrap().to_string()).collect();
        assert_eq!(ids, vec!["A", "B", "C", "D"]);
        assert!(out.starts_with("## Quiz\n\n```quiz\n"));
        assert!(out.ends_with("```\n\nFim."));
        assert!(out.contains("três"), "non-ascii text must not be escaped");
    }

    #[test]
    fn other_keys_keep_their_order() {
        let payload = r#"{"question":"q","options":[{"id":"A","text":"a"},{"id":"B","text":"b"}],"explanation":"e"}"#;
        let out = shuffle_quiz_payload(payload, &mut StdRng::seed_from_u64(1)).unwrap();
        let q = out.find("\"question\"").unwrap();
        let o = out.find("\"options\"").unwrap();
        let e = out.find("\"explanation\"").unwrap();
        assert!(q < o && o < e);
    }

    #[test]
    fn malformed_payload_leaves_text_unchanged() {
        let md = quiz_md("{not json");
        assert_eq!(shuffle_quiz_in_markdown(&md, &mut rand::thread_rng()), md);
    }

    #[test]
    fn single_option_or_missing_options_unchanged() {
        let one = quiz_md(r#"{"options":[{"id":"A","text":"x"}]}"#);
        assert_eq!(shuffle_quiz_in_markdown(&one, &mut rand::thread_rng()), one);

        let none = quiz_md(r#"{"question":"x"}"#);
        assert_eq!(shuffle_quiz_in_markdown(&none, &mut rand::thread_rng()), none);

        let scalars = quiz_md(r#"{"options":["a","b"]}"#);
        assert_eq!(shuffle_quiz_in_markdown(&scalars, &mut rand::thread_rng()), scalars);
    }

    #[test]
    fn only_first_quiz_block_is_touched() {
        let second = r#"{"options":[{"id":"Z","text":"p"},{"id":"Y","text":"q"}]}"#;
        let md = format!("{}\n```quiz\n{}\n```", quiz_md(TWO_OPTIONS), second);
        let out = shuffle_quiz_in_markdown(&md, &mut rand::thread_rng());
        assert!(out.ends_with(&format!("```quiz\n{}\n```", second)));
    }

    #[test]
    fn text_without_quiz_is_returned_as_is() {
        let md = "```python\nprint(1)\n```";
        assert_eq!(shuffle_quiz_in_markdown(md, &mut rand::thread_rng()), md);
    }

    #[test]
    fn tag_match_is_case_insensitive() {
        let md = format!("```QUIZ\n{}\n```", TWO_OPTIONS);
        assert!(find_quiz(&md).is_some());
    }
}
