//! JSON recovery for LLM replies
//!
//! Model output is untrusted text: it may be clean JSON, JSON wrapped in a
//! markdown fence, JSON surrounded by prose, or an object cut off by the
//! output token limit. Recovery runs an ordered list of strategies, each a
//! pure `text -> Option<Value>` function, and stops at the first success.
//!
//! 1. `Direct` parses the (fence-stripped) text as-is.
//! 2. `FencedBlock` parses the first ```` ```json {...} ``` ```` block found
//!    in the original text.
//! 3. `OuterObject` takes the span from the first `{` to the last `}` and
//!    repairs truncation artifacts: trailing commas, dangling key/value
//!    pairs, and unclosed braces.
//!
//! Parse failures inside a strategy only move on to the next one; nothing
//! here panics or returns an error.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

static LEADING_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^```[a-zA-Z]*\s*").expect("valid regex"));

static TRAILING_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```$").expect("valid regex"));

// Non-greedy: the first object that is directly followed by a closing fence
static FENCED_OBJECT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"```(?:json)?\s*(\{[\s\S]*?\})\s*```").expect("valid regex")
});

static TRAILING_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",\s*([}\]])").expect("valid regex"));

// `, "key": value` immediately before a closing brace or bracket, where the
// value holds no structural characters
static DANGLING_PAIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#",\s*"[^"]*"\s*:\s*[^,{}\[\]]*([}\]])"#).expect("valid regex")
});

/// A single recovery strategy, in the order they are attempted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    Direct,
    FencedBlock,
    OuterObject,
}

impl Strategy {
    /// Attempt order
    pub const ALL: [Strategy; 3] = [Self::Direct, Self::FencedBlock, Self::OuterObject];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::FencedBlock => "fenced_block",
            Self::OuterObject => "outer_object",
        }
    }

    /// Run this strategy
    ///
    /// `original` is the reply as received, `unfenced` the same text after
    /// a leading/trailing markdown fence has been removed.
    fn attempt(self, original: &str, unfenced: &str) -> Option<Value> {
        match self {
            Self::Direct => direct_parse(unfenced),
            Self::FencedBlock => fenced_block(original),
            Self::OuterObject => outer_object(unfenced),
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A value recovered from model text, tagged with the strategy that found it
#[derive(Debug, Clone, PartialEq)]
pub struct Recovered {
    pub value: Value,
    pub strategy: Strategy,
}

/// Recover a JSON value from arbitrary model text
///
/// Returns `None` when no strategy finds parseable JSON.
pub fn recover_json(text: &str) -> Option<Recovered> {
    let unfenced = strip_fences(text);

    Strategy::ALL.into_iter().find_map(|strategy| {
        strategy
            .attempt(text, &unfenced)
            .map(|value| Recovered { value, strategy })
    })
}

/// Remove a leading fence (optionally language-tagged) and a trailing fence
///
/// Text that does not start with a fence is returned untouched.
pub fn strip_fences(text: &str) -> Cow<'_, str> {
    let trimmed = text.trim();
    if !trimmed.starts_with("```") {
        return Cow::Borrowed(text);
    }

    let without_lead = LEADING_FENCE.replace(trimmed, "");
    let body = without_lead.trim();
    Cow::Owned(TRAILING_FENCE.replace(body, "").into_owned())
}

fn parse(candidate: &str) -> Option<Value> {
    serde_json::from_str(candidate).ok()
}

/// Parse the text verbatim
pub fn direct_parse(text: &str) -> Option<Value> {
    parse(text)
}

/// Parse the first fenced block containing an object
pub fn fenced_block(text: &str) -> Option<Value> {
    let captures = FENCED_OBJECT.captures(text)?;
    parse(captures.get(1)?.as_str())
}

/// Parse the span from the first `{` to the last `}`, repairing truncation
pub fn outer_object(text: &str) -> Option<Value> {
    let span = outer_span(text)?;

    let mut candidate = trim_trailing_commas(span).into_owned();
    if let Some(value) = parse(&candidate) {
        return Some(value);
    }

    loop {
        match strip_last_dangling_pair(&candidate) {
            // Nothing left to strip
            Cow::Borrowed(_) => break,
            Cow::Owned(next) => candidate = next,
        }
        if let Some(value) = parse(&candidate) {
            return Some(value);
        }
        if !candidate.contains(':') {
            break;
        }
    }

    close_open_braces(&candidate).and_then(|closed| parse(&closed))
}

/// First `{` through last `}`, if they appear in that order
fn outer_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

/// Drop commas that sit directly before a closing brace or bracket
pub fn trim_trailing_commas(candidate: &str) -> Cow<'_, str> {
    TRAILING_COMMA.replace_all(candidate, "${1}")
}

/// Drop trailing `, "key": value` fragments before a closing brace/bracket
///
/// Returns `Cow::Borrowed` when there was nothing to strip.
pub fn strip_last_dangling_pair(candidate: &str) -> Cow<'_, str> {
    DANGLING_PAIR.replace_all(candidate, "${1}")
}

/// Append the closing braces a truncated object is missing
///
/// Returns `None` when braces are already balanced (or over-closed).
pub fn close_open_braces(candidate: &str) -> Option<String> {
    let (open, close) = brace_counts(candidate);
    if open <= close {
        return None;
    }

    let mut closed = String::with_capacity(candidate.len() + (open - close));
    closed.push_str(candidate);
    closed.extend(std::iter::repeat('}').take(open - close));
    Some(closed)
}

fn brace_counts(text: &str) -> (usize, usize) {
    text.bytes().fold((0, 0), |(open, close), b| match b {
        b'{' => (open + 1, close),
        b'}' => (open, close + 1),
        _ => (open, close),
    })
}
