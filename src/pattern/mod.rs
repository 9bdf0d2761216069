//! Compiled patterns and their compiler
//!
//! A [`Pattern`] tests one value and describes what a successful test
//! captures. Patterns are immutable once compiled and cheap to clone.

pub mod compiler;
pub mod regex_pattern;
pub mod security;
pub mod traits;

pub use compiler::*;
pub use regex_pattern::{is_regex_literal, CompiledRegex, RegexPattern, StandardRegex};
pub use security::safe_regex_compile;
pub use traits::*;

use crate::callable::Callable;
use crate::capture::CaptureFragment;
use crate::error::{MatchError, PatternBuildError, Result};
use crate::config::DEFAULT_MAX_DEPTH;
use crate::matcher::{Depth, Matcher};
use crate::value::{Value, ValueExt};

/// A compiled test-and-capture unit applied to one value
#[derive(Debug, Clone)]
pub enum Pattern {
    /// Strict equality with the expected value
    Exact(Value),
    /// Matches anything, capturing under the name when given
    Wildcard(Option<String>),
    /// Matches strings accepted by a regex
    Regex(RegexPattern),
    /// Matches when the callable returns a truthy value
    Predicate(Callable),
    /// Matches when the sub-matcher produces a result for the value
    Nested(Matcher),
}

impl Pattern {
    /// Strict equality pattern
    pub fn exact(value: impl Into<Value>) -> Self {
        Pattern::Exact(value.into())
    }

    /// Unnamed wildcard
    pub fn wildcard() -> Self {
        Pattern::Wildcard(None)
    }

    /// Wildcard capturing under `name`
    pub fn bind(name: impl Into<String>) -> Self {
        Pattern::Wildcard(Some(name.into()))
    }

    /// Predicate pattern
    pub fn predicate(callable: Callable) -> Self {
        Pattern::Predicate(callable)
    }

    /// Regex pattern compiled with the shared standard service
    pub fn regex(literal: &str) -> std::result::Result<Self, PatternBuildError> {
        Ok(Pattern::Regex(RegexPattern::new(
            StandardRegex::shared().compile(literal)?,
        )))
    }

    /// Names this pattern is known to capture before running it
    pub fn bind_names(&self) -> Vec<String> {
        match self {
            Pattern::Wildcard(Some(name)) => vec![name.clone()],
            Pattern::Regex(regex) => regex.group_names().to_vec(),
            _ => Vec::new(),
        }
    }

    /// Test a value against this pattern
    pub fn try_match(&self, value: &Value) -> Result<MatchOutcome> {
        self.try_match_at(value, Depth::root(DEFAULT_MAX_DEPTH))
    }

    pub(crate) fn try_match_at(&self, value: &Value, depth: Depth) -> Result<MatchOutcome> {
        let outcome = match self {
            Pattern::Exact(expected) => {
                if value == expected {
                    MatchOutcome::matched()
                } else {
                    MatchOutcome::NoMatch
                }
            }
            Pattern::Wildcard(None) => MatchOutcome::matched(),
            Pattern::Wildcard(Some(name)) => {
                MatchOutcome::Matched(CaptureFragment::named(name.clone(), value.clone()))
            }
            Pattern::Regex(regex) => match value {
                Value::String(subject) => regex
                    .capture(subject)
                    .map_or(MatchOutcome::NoMatch, MatchOutcome::Matched),
                _ => MatchOutcome::NoMatch,
            },
            Pattern::Predicate(callable) => {
                let result = callable.call(std::slice::from_ref(value));
                if !result.is_truthy() {
                    MatchOutcome::NoMatch
                } else if result.is_object() {
                    MatchOutcome::Matched(CaptureFragment::from_value(result))
                } else {
                    MatchOutcome::matched()
                }
            }
            Pattern::Nested(matcher) => {
                match matcher.match_at(std::slice::from_ref(value), depth.descend()?) {
                    Ok(result) => MatchOutcome::Matched(CaptureFragment::from_value(result)),
                    Err(MatchError::NoMatch(_)) => MatchOutcome::NoMatch,
                    Err(err) => return Err(err),
                }
            }
        };
        Ok(outcome)
    }
}
