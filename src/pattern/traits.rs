//! Core traits for pattern matching

use crate::capture::CaptureFragment;
use crate::error::PatternBuildError;
use std::fmt::Debug;
use std::sync::Arc;

/// Outcome of testing one value against one pattern
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    /// The value does not satisfy the pattern
    NoMatch,
    /// The value satisfies the pattern; the fragment may be empty
    Matched(CaptureFragment),
}

impl MatchOutcome {
    /// A match that captures nothing
    pub fn matched() -> Self {
        MatchOutcome::Matched(CaptureFragment::empty())
    }

    /// Whether the pattern matched
    pub fn is_match(&self) -> bool {
        matches!(self, MatchOutcome::Matched(_))
    }

    /// The captured fragment, if matched
    pub fn into_fragment(self) -> Option<CaptureFragment> {
        match self {
            MatchOutcome::Matched(fragment) => Some(fragment),
            MatchOutcome::NoMatch => None,
        }
    }
}

/// Groups captured by a successful regex match
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegexCaptures {
    /// Named groups in declaration order
    pub named: Vec<(String, String)>,
    /// All groups in order, index 0 being the whole match
    pub positional: Vec<String>,
}

/// A compiled regex literal
pub trait RegexMatcher: Debug + Send + Sync {
    /// The literal this regex was compiled from
    fn literal(&self) -> &str;

    /// Names of the named groups, in declaration order
    fn group_names(&self) -> &[String];

    /// Run against a subject, returning the groups on success
    fn try_match(&self, subject: &str) -> Option<RegexCaptures>;
}

/// Regex collaborator consulted by the pattern compiler
pub trait RegexService: Debug + Send + Sync {
    /// Whether a string is a delimiter-bounded regex literal
    fn looks_like_regex_literal(&self, literal: &str) -> bool;

    /// Compile a literal previously recognized by `looks_like_regex_literal`
    fn compile(&self, literal: &str) -> Result<Arc<dyn RegexMatcher>, PatternBuildError>;

    /// Compile (or fetch) and run a literal in one step
    fn try_match(
        &self,
        literal: &str,
        subject: &str,
    ) -> Result<Option<RegexCaptures>, PatternBuildError> {
        Ok(self.compile(literal)?.try_match(subject))
    }
}
