//! Post-processing of generated markdown: fenced blocks, final code, quiz
//! shuffling and segmentation for the front-end.

pub mod formatter;
pub mod interpreter;
pub mod segments;
pub mod validator;

pub use formatter::{extract_fenced_blocks, first_fenced_block, strip_fenced_blocks, FencedBlock};
pub use interpreter::{find_quiz, shuffle_quiz_in_markdown, shuffle_quiz_payload};
pub use segments::{Segment, SegmentBuilder, SegmentError, SegmentKind, SegmentRules};
pub use validator::{select_final_code, FinalCode};
