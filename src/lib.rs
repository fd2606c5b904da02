//! Backtracking matcher for the Kernighan–Pike regular-expression dialect.
//!
//! Based on the `match`/`matchhere`/`matchstar` routines from Kernighan &
//! Pike, *The Practice of Programming* (chapter 9), with one deliberate
//! change to the acceptance rule (see below).
//!
//! # Grammar
//!
//! | Pattern   | Meaning                                             |
//! |-----------|-----------------------------------------------------|
//! | `c`       | the literal byte `c`                                |
//! | `.`       | any single byte                                     |
//! | `^`       | start of text, only as the first pattern byte       |
//! | `$`       | end of text, only as the last pattern byte          |
//! | `x*`      | zero or more `x`, where `x` is a literal or `.`     |
//!
//! There is no escape syntax.  A metacharacter outside the position where
//! it has meaning is compared as a literal byte, and malformed patterns
//! (a leading `*`, a trailing lone `*`) are never rejected.
//!
//! # Architecture
//!
//! ```text
//! search ──(each start offset)──> matches_from <──> matches_repeat
//! ```
//!
//! [`search`] handles the start anchor and slides the starting offset over
//! `0..=text.len()`.  [`matches_from`] evaluates one pattern position
//! against one text position; it hands `x*` over to [`matches_repeat`],
//! which tries `0, 1, 2, ...` repetitions of `x` in that order.
//!
//! ## Acceptance rule
//!
//! In the textbook algorithm an exhausted pattern means success.  Here it
//! means *failure*: a match is only ever proven by reaching a final `$`
//! exactly at the end of the text.  Consequently:
//!
//! - `search(b"a*bc$", b"aaabc")` is `true`;
//! - `search(b"a*bc", b"aaabcx")` is `false`, although a classical engine
//!   accepts it as a substring match;
//! - a pattern that does not end in `$` never matches anything.
//!
//! ## Observation
//!
//! Every state the matcher visits can be reported to an [`Observer`] via
//! [`search_observed`].  The reported order is the exact evaluation order,
//! which is what an input-exploration driver (see [`explore`]) measures.

use std::fmt;

pub mod explore;

/// Matches any single byte.
const WILDCARD: u8 = b'.';
/// Repeats the preceding atom zero or more times.
const STAR: u8 = b'*';
/// Start anchor, meaningful only as the first byte of the whole pattern.
const START_ANCHOR: u8 = b'^';
/// End anchor, meaningful only as the last byte of the remaining pattern.
const END_ANCHOR: u8 = b'$';

// ---------------------------------------------------------------------------
// Atoms
// ---------------------------------------------------------------------------

/// A single-byte pattern symbol that can be compared against, or repeated
/// over, the text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Atom {
    /// A literal byte.  Includes `^`, `$` and `*` when they appear in a
    /// position where they carry no special meaning.
    Byte(u8),
    /// `.` — accepts any byte.
    Any,
}

impl Atom {
    /// Classify a raw pattern byte.
    #[inline]
    pub fn from_byte(byte: u8) -> Self {
        if byte == WILDCARD {
            Self::Any
        } else {
            Self::Byte(byte)
        }
    }

    /// Whether this atom accepts `byte`.
    #[inline]
    pub fn accepts(self, byte: u8) -> bool {
        match self {
            Self::Any => true,
            Self::Byte(b) => b == byte,
        }
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("."),
            Self::Byte(b) => write!(f, "{}", b.escape_ascii()),
        }
    }
}

// ---------------------------------------------------------------------------
// Observation
// ---------------------------------------------------------------------------

/// One state visited by the matcher.
///
/// All offsets are absolute byte offsets into the pattern and text that
/// were handed to the public entry point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// [`search`] starts an attempt at text offset `text`.
    Start { text: usize },
    /// [`matches_from`] evaluates pattern offset `pattern` against text
    /// offset `text`.
    Here { pattern: usize, text: usize },
    /// [`matches_repeat`] tries the rest of the pattern (at `pattern`)
    /// after `count` repetitions of `atom`, with the text at `text`.
    Repeat {
        atom: Atom,
        count: usize,
        pattern: usize,
        text: usize,
    },
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Start { text } => write!(f, "start  text@{text}"),
            Self::Here { pattern, text } => write!(f, "here   re@{pattern} text@{text}"),
            Self::Repeat {
                atom,
                count,
                pattern,
                text,
            } => write!(f, "repeat {atom}*{count} re@{pattern} text@{text}"),
        }
    }
}

/// Receives every [`Step`] the matcher takes, in evaluation order.
pub trait Observer {
    fn visit(&mut self, step: Step);
}

/// Discards every step.
impl Observer for () {
    #[inline]
    fn visit(&mut self, _step: Step) {}
}

/// Records the full trace.
impl Observer for Vec<Step> {
    #[inline]
    fn visit(&mut self, step: Step) {
        self.push(step);
    }
}

// ---------------------------------------------------------------------------
// Backtracking engine
// ---------------------------------------------------------------------------

/// Carries the observer and the full input lengths, so that sub-slice views
/// can be reported as absolute offsets.
struct Backtracker<'o, O: ?Sized> {
    observer: &'o mut O,
    pattern_len: usize,
    text_len: usize,
}

impl<'o, O: Observer + ?Sized> Backtracker<'o, O> {
    fn new(observer: &'o mut O, pattern: &[u8], text: &[u8]) -> Self {
        Self {
            observer,
            pattern_len: pattern.len(),
            text_len: text.len(),
        }
    }

    #[inline]
    fn pattern_offset(&self, pattern: &[u8]) -> usize {
        self.pattern_len - pattern.len()
    }

    #[inline]
    fn text_offset(&self, text: &[u8]) -> usize {
        self.text_len - text.len()
    }

    fn search(&mut self, pattern: &[u8], text: &[u8]) -> bool {
        if let Some((&START_ANCHOR, rest)) = pattern.split_first() {
            self.observer.visit(Step::Start { text: 0 });
            return self.here(rest, text);
        }
        (0..=text.len()).any(|start| {
            self.observer.visit(Step::Start { text: start });
            self.here(pattern, &text[start..])
        })
    }

    /// Single-step matching of literals and `.` is a loop rather than a
    /// recursive call, so stack depth only grows through `x*`.
    fn here(&mut self, mut pattern: &[u8], mut text: &[u8]) -> bool {
        loop {
            self.observer.visit(Step::Here {
                pattern: self.pattern_offset(pattern),
                text: self.text_offset(text),
            });

            // An exhausted pattern has not reached `$`: not a match.
            let Some((&first, rest)) = pattern.split_first() else {
                return false;
            };
            if let Some((&STAR, rest)) = rest.split_first() {
                return self.repeat(Atom::from_byte(first), rest, text);
            }
            if first == END_ANCHOR && rest.is_empty() {
                return text.is_empty();
            }
            match text.split_first() {
                Some((&byte, tail)) if Atom::from_byte(first).accepts(byte) => {
                    pattern = rest;
                    text = tail;
                }
                _ => return false,
            }
        }
    }

    fn repeat(&mut self, atom: Atom, pattern: &[u8], mut text: &[u8]) -> bool {
        let mut count = 0;
        loop {
            self.observer.visit(Step::Repeat {
                atom,
                count,
                pattern: self.pattern_offset(pattern),
                text: self.text_offset(text),
            });
            if self.here(pattern, text) {
                return true;
            }
            match text.split_first() {
                Some((&byte, tail)) if atom.accepts(byte) => {
                    text = tail;
                    count += 1;
                }
                _ => return false,
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry points
// ---------------------------------------------------------------------------

/// Report whether `pattern` matches somewhere in `text`.
///
/// A leading `^` pins the attempt to offset 0; otherwise every offset from
/// 0 up to and including `text.len()` is tried in order.
///
/// ```
/// use regex_kernighan_pike::search;
///
/// assert!(search(b"^he.*$", b"hello"));
/// assert!(search(b"a*bc$", b"aaabc"));
/// // No `$`: the pattern runs out before a match is proven.
/// assert!(!search(b"el", b"hello"));
/// ```
pub fn search(pattern: &[u8], text: &[u8]) -> bool {
    search_observed(pattern, text, &mut ())
}

/// Like [`search`], reporting every visited [`Step`] to `observer`.
pub fn search_observed<O>(pattern: &[u8], text: &[u8], observer: &mut O) -> bool
where
    O: Observer + ?Sized,
{
    Backtracker::new(observer, pattern, text).search(pattern, text)
}

/// Match `pattern` against `text` anchored at the current front of `text`.
///
/// A leading `^` is *not* special here; anchoring is [`search`]'s job.
/// Returns `false` when the pattern is exhausted without having reached a
/// final `$`.
pub fn matches_from(pattern: &[u8], text: &[u8]) -> bool {
    Backtracker::new(&mut (), pattern, text).here(pattern, text)
}

/// Match `atom` repeated zero or more times followed by `pattern`, anchored
/// at the front of `text`.
///
/// Repetition counts are tried in increasing order, stopping at the first
/// count for which the rest of the pattern matches.
pub fn matches_repeat(atom: Atom, pattern: &[u8], text: &[u8]) -> bool {
    Backtracker::new(&mut (), pattern, text).repeat(atom, pattern, text)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
