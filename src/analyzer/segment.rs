//! Error-block segmentation over build-log lines.
//!
//! A small explicit state machine replaces the usual flag-plus-accumulator
//! idiom: the scanner is either idle or inside an error block, and every
//! line either triggers a new block, continues the current one, or closes
//! it. End-of-stream closes any open block exactly once.
//!
//! The continuation rule is deliberately eager: any non-blank line after a
//! trigger joins the current block, even unrelated output. Downstream CI
//! tooling keys off these block boundaries, so the rule must not be
//! tightened.

use crate::models::ErrorBlock;
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

// Lines that start a new error block.
static TRIGGER_REGEX: Lazy<Regex> = Lazy::new(|| {
    RegexBuilder::new(r"\serror:|\sfatal error:|undefined reference to")
        .case_insensitive(true)
        .build()
        .expect("Invalid trigger regex")
});

// Nested make failure markers, e.g. "make[2]: *** [foo] Error 1".
static MAKE_SUB_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"make\[\d+\]:").expect("Invalid make sub-error regex"));

/// Completed segmentation of one log stream.
#[derive(Debug, Clone, Default)]
pub struct Segmentation {
    /// Closed blocks in input order.
    pub blocks: Vec<ErrorBlock>,
    /// Total trigger-line occurrences. Counted per trigger line, so it can
    /// exceed `blocks.len()` when consecutive triggers fold together.
    pub trigger_count: usize,
}

/// Does this line start an error block?
pub fn is_trigger(line: &str) -> bool {
    TRIGGER_REGEX.is_match(line)
}

/// Does this line continue an open error block?
///
/// Compiler notes, nested make errors, and any other non-blank line all
/// qualify.
pub fn is_continuation(line: &str) -> bool {
    line.contains("note:")
        || (MAKE_SUB_REGEX.is_match(line) && line.contains("***"))
        || !line.trim().is_empty()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    InError,
}

/// Streaming scanner: feed lines with [`Segmenter::push`], then take the
/// result with [`Segmenter::finish`].
#[derive(Debug)]
pub struct Segmenter {
    state: State,
    current: Vec<String>,
    out: Segmentation,
}

impl Segmenter {
    pub fn new() -> Self {
        Segmenter {
            state: State::Idle,
            current: Vec::new(),
            out: Segmentation::default(),
        }
    }

    /// Consume one log line (newline already stripped).
    pub fn push(&mut self, line: &str) {
        if is_trigger(line) {
            // A trigger while already inside a block closes the old block
            // and starts a fresh one; the counter ticks for every trigger
            // line regardless of block boundaries.
            if self.state == State::InError && !self.current.is_empty() {
                self.close_current();
            }
            self.out.trigger_count += 1;
            self.current = vec![line.to_string()];
            self.state = State::InError;
        } else if self.state == State::InError && is_continuation(line) {
            self.current.push(line.to_string());
        } else {
            // Blank line, or not inside a block: close anything open.
            if self.state == State::InError && !self.current.is_empty() {
                self.close_current();
            }
            self.state = State::Idle;
            self.current.clear();
        }
    }

    /// Close any open block and return the completed segmentation.
    pub fn finish(mut self) -> Segmentation {
        if self.state == State::InError && !self.current.is_empty() {
            self.close_current();
        }
        self.out
    }

    fn close_current(&mut self) {
        self.out.blocks.push(ErrorBlock {
            lines: std::mem::take(&mut self.current),
        });
    }
}

impl Default for Segmenter {
    fn default() -> Self {
        Segmenter::new()
    }
}

/// Segment an in-memory sequence of lines.
pub fn segment_lines<I, S>(lines: I) -> Segmentation
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut segmenter = Segmenter::new();
    for line in lines {
        segmenter.push(line.as_ref());
    }
    segmenter.finish()
}
