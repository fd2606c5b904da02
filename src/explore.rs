//! Exhaustive input exploration.
//!
//! Enumerates every pattern up to a length bound over a small alphabet,
//! runs each one against a fixed text, and records which patterns match
//! together with how many matcher states each run visited.  This is the
//! concrete counterpart of making the pattern buffer symbolic: with the
//! metacharacters `^$.*` in the alphabet, every branch of the matcher's
//! case analysis is reached by some candidate.

use itertools::Itertools;
use thiserror::Error;

use crate::{search_observed, Observer, Step};

/// Upper bound on the number of candidate patterns a single run may
/// enumerate.
pub const MAX_PATTERNS: usize = 1 << 24;

/// Always part of the default alphabet.
const METACHARACTERS: &[u8] = b"^$.*";

const DEFAULT_MAX_LEN: usize = 4;

/// An exploration request that cannot be run.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExploreError {
    #[error("alphabet is empty")]
    EmptyAlphabet,
    #[error("alphabet contains `{}` more than once", .0.escape_ascii())]
    DuplicateByte(u8),
    #[error(
        "search space exceeds {} patterns (alphabet of {alphabet} bytes, max length {max_len})",
        MAX_PATTERNS
    )]
    TooManyPatterns { alphabet: usize, max_len: usize },
}

/// What to enumerate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExploreConfig {
    /// Pattern bytes, in enumeration order.
    pub alphabet: Vec<u8>,
    /// Longest pattern tried.  Every length from 0 up to this is covered.
    pub max_len: usize,
}

impl Default for ExploreConfig {
    fn default() -> Self {
        Self::for_text(b"")
    }
}

impl ExploreConfig {
    /// The metacharacters followed by the distinct bytes of `text`, in
    /// order of first appearance.
    pub fn for_text(text: &[u8]) -> Self {
        let alphabet = METACHARACTERS
            .iter()
            .chain(text)
            .copied()
            .unique()
            .collect();
        Self {
            alphabet,
            max_len: DEFAULT_MAX_LEN,
        }
    }

    pub fn with_alphabet(mut self, alphabet: impl Into<Vec<u8>>) -> Self {
        self.alphabet = alphabet.into();
        self
    }

    pub fn with_max_len(mut self, max_len: usize) -> Self {
        self.max_len = max_len;
        self
    }

    /// Number of candidate patterns, or `None` on overflow.
    pub fn pattern_count(&self) -> Option<usize> {
        let base = self.alphabet.len();
        let mut total = 0usize;
        let mut at_len = 1usize;
        for len in 0..=self.max_len {
            if len > 0 {
                at_len = at_len.checked_mul(base)?;
            }
            total = total.checked_add(at_len)?;
        }
        Some(total)
    }

    pub fn validate(&self) -> Result<(), ExploreError> {
        if self.alphabet.is_empty() {
            return Err(ExploreError::EmptyAlphabet);
        }
        if let Some(&byte) = self.alphabet.iter().duplicates().next() {
            return Err(ExploreError::DuplicateByte(byte));
        }
        match self.pattern_count() {
            Some(n) if n <= MAX_PATTERNS => Ok(()),
            _ => Err(ExploreError::TooManyPatterns {
                alphabet: self.alphabet.len(),
                max_len: self.max_len,
            }),
        }
    }

    /// Every candidate, shortest first, lexicographic in alphabet order
    /// within a length.
    pub fn patterns(&self) -> impl Iterator<Item = Vec<u8>> + '_ {
        std::iter::once(Vec::new()).chain((1..=self.max_len).flat_map(move |len| {
            std::iter::repeat_n(self.alphabet.iter().copied(), len).multi_cartesian_product()
        }))
    }
}

/// A pattern that matched the explored text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Witness {
    pub pattern: Vec<u8>,
    /// Matcher states visited before the match was proven.
    pub steps: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Report {
    /// Candidates tried.
    pub explored: usize,
    /// Matching candidates, in enumeration order.
    pub matched: Vec<Witness>,
    /// Most states visited by any single candidate, matching or not.
    pub max_steps: usize,
}

#[derive(Default)]
struct StepCounter(usize);

impl Observer for StepCounter {
    #[inline]
    fn visit(&mut self, _step: Step) {
        self.0 += 1;
    }
}

/// Run every candidate pattern of `config` against `text`.
pub fn explore(config: &ExploreConfig, text: &[u8]) -> Result<Report, ExploreError> {
    config.validate()?;
    tracing::debug!(
        alphabet = %config.alphabet.escape_ascii(),
        max_len = config.max_len,
        text = %text.escape_ascii(),
        "exploring"
    );

    let mut report = Report::default();
    for pattern in config.patterns() {
        let mut counter = StepCounter::default();
        let matched = search_observed(&pattern, text, &mut counter);
        report.explored += 1;
        report.max_steps = report.max_steps.max(counter.0);
        if matched {
            tracing::debug!(pattern = %pattern.escape_ascii(), steps = counter.0, "match");
            report.matched.push(Witness {
                pattern,
                steps: counter.0,
            });
        }
    }

    tracing::info!(
        explored = report.explored,
        matched = report.matched.len(),
        max_steps = report.max_steps,
        "exploration finished"
    );
    Ok(report)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
