//! Compilation of raw pattern specifications
//!
//! [`PatternSpec`] is the closed set of shapes a caller may hand the
//! engine for one argument slot. [`PatternCompiler`] turns a spec into a
//! [`Pattern`]; the matcher calls it at most once per slot.

use crate::callable::Callable;
use crate::error::PatternBuildError;
use crate::matcher::Matcher;
use crate::pattern::regex_pattern::{RegexPattern, StandardRegex};
use crate::pattern::traits::RegexService;
use crate::pattern::Pattern;
use crate::value::{Value, ValueExt};
use std::sync::Arc;

/// The wildcard sentinel
pub const WILDCARD: &str = "_";

/// An uncompiled pattern for one argument slot
#[derive(Debug, Clone)]
pub enum PatternSpec {
    /// Matches `null` exactly
    Null,
    /// Matches an integer exactly
    Int(i64),
    /// A wildcard, bound wildcard, regex literal or exact string
    Str(String),
    /// Matches any value strictly, bypassing the string rules
    Exact(Value),
    /// A predicate over the slot's value
    Callable(Callable),
    /// An already compiled pattern, used as is
    Pattern(Pattern),
    /// A value with no pattern meaning; compiling it fails
    Unsupported(Value),
}

impl PatternSpec {
    /// Strict match against any value
    pub fn exact(value: impl Into<Value>) -> Self {
        PatternSpec::Exact(value.into())
    }

    /// Capture names known without compiling: `"_name"` strings and
    /// precompiled wildcards and regexes
    pub fn static_bind_names(&self) -> Vec<String> {
        match self {
            PatternSpec::Str(s) if s != WILDCARD => s
                .strip_prefix('_')
                .filter(|name| !name.is_empty())
                .map(|name| vec![name.to_string()])
                .unwrap_or_default(),
            PatternSpec::Pattern(pattern) => pattern.bind_names(),
            _ => Vec::new(),
        }
    }
}

impl From<i64> for PatternSpec {
    fn from(value: i64) -> Self {
        PatternSpec::Int(value)
    }
}

impl From<i32> for PatternSpec {
    fn from(value: i32) -> Self {
        PatternSpec::Int(i64::from(value))
    }
}

impl From<&str> for PatternSpec {
    fn from(value: &str) -> Self {
        PatternSpec::Str(value.to_string())
    }
}

impl From<String> for PatternSpec {
    fn from(value: String) -> Self {
        PatternSpec::Str(value)
    }
}

impl From<Callable> for PatternSpec {
    fn from(callable: Callable) -> Self {
        PatternSpec::Callable(callable)
    }
}

impl From<Pattern> for PatternSpec {
    fn from(pattern: Pattern) -> Self {
        PatternSpec::Pattern(pattern)
    }
}

impl From<Matcher> for PatternSpec {
    fn from(matcher: Matcher) -> Self {
        PatternSpec::Pattern(Pattern::Nested(matcher))
    }
}

impl From<Value> for PatternSpec {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => PatternSpec::Null,
            Value::String(s) => PatternSpec::Str(s),
            Value::Number(ref n) => match n.as_i64() {
                Some(i) => PatternSpec::Int(i),
                None => PatternSpec::Unsupported(value),
            },
            other => PatternSpec::Unsupported(other),
        }
    }
}

/// Turns [`PatternSpec`]s into [`Pattern`]s
#[derive(Debug, Clone)]
pub struct PatternCompiler {
    regex: Arc<dyn RegexService>,
}

impl Default for PatternCompiler {
    fn default() -> Self {
        Self::new(StandardRegex::shared())
    }
}

impl PatternCompiler {
    /// Create a compiler using the given regex collaborator
    pub fn new(regex: Arc<dyn RegexService>) -> Self {
        Self { regex }
    }

    /// The regex collaborator
    pub fn regex_service(&self) -> &Arc<dyn RegexService> {
        &self.regex
    }

    /// Compile one spec
    pub fn compile(&self, spec: &PatternSpec) -> Result<Pattern, PatternBuildError> {
        match spec {
            PatternSpec::Null => Ok(Pattern::Exact(Value::Null)),
            PatternSpec::Int(value) => Ok(Pattern::Exact(Value::from(*value))),
            PatternSpec::Pattern(pattern) => Ok(pattern.clone()),
            PatternSpec::Callable(callable) => Ok(Pattern::Predicate(callable.clone())),
            PatternSpec::Exact(value) => Ok(Pattern::Exact(value.clone())),
            PatternSpec::Str(s) => self.compile_str(s),
            PatternSpec::Unsupported(value) => Err(PatternBuildError::Unsupported {
                kind: value.type_name(),
            }),
        }
    }

    fn compile_str(&self, s: &str) -> Result<Pattern, PatternBuildError> {
        if s == WILDCARD {
            return Ok(Pattern::Wildcard(None));
        }
        if s.is_empty() {
            return Err(PatternBuildError::Empty);
        }
        if let Some(name) = s.strip_prefix('_') {
            return Ok(Pattern::Wildcard(Some(name.to_string())));
        }
        if s.chars().count() < 2 {
            return Err(PatternBuildError::TooShort(s.to_string()));
        }
        if self.regex.looks_like_regex_literal(s) {
            return Ok(Pattern::Regex(RegexPattern::new(self.regex.compile(s)?)));
        }
        Ok(Pattern::Exact(Value::String(s.to_string())))
    }
}
