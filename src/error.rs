//! Error types for the matching engine
use thiserror::Error;

/// A single pattern specification could not be compiled
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatternBuildError {
    /// The empty string is not a pattern
    #[error("empty string is not a valid pattern")]
    Empty,

    /// A one-character string that is not the wildcard sentinel
    #[error("pattern '{0}' is too short (use '_' for a wildcard)")]
    TooShort(String),

    /// The value has no pattern meaning (floats, booleans, arrays, objects)
    #[error("unsupported pattern value of type {kind}")]
    Unsupported {
        /// Type name of the rejected value
        kind: &'static str,
    },

    /// A regex literal was recognized but could not be compiled
    #[error("invalid regex literal {literal}: {reason}")]
    InvalidRegex {
        /// The literal as written, delimiters and modifiers included
        literal: String,
        /// Why compilation was refused
        reason: String,
    },
}

/// Two pattern slots of the same case bind the same capture name
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("capture '{name}' is bound more than once in case #{case}")]
pub struct CaptureCollisionError {
    /// Index of the offending case
    pub case: usize,
    /// The name bound twice
    pub name: String,
}

/// The case list does not describe a valid matcher
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MatcherBuildError {
    /// A matcher needs at least one case
    #[error("matcher has no cases")]
    NoCases,

    /// A non-fallback case declared no pattern slots
    #[error("case #{case} must have at least one pattern")]
    EmptyCase {
        /// Index of the offending case
        case: usize,
    },

    /// Cases disagree on the number of pattern slots
    #[error("case #{case} has {found} pattern slots, expected {expected}")]
    InconsistentArity {
        /// Index of the offending case
        case: usize,
        /// Slot count of the first case
        expected: usize,
        /// Slot count of the offending case
        found: usize,
    },

    /// Only the last case may be the fallback
    #[error("fallback case #{case} must be the last case")]
    FallbackNotLast {
        /// Index of the fallback case
        case: usize,
    },

    /// A guard or result was added before any pattern
    #[error("case #{case} must have at least one pattern before a guard or result")]
    MissingPattern {
        /// Index of the case being built
        case: usize,
    },

    /// A pattern was added after a guard of the same case
    #[error("case #{case} cannot take more patterns after a guard")]
    PatternAfterGuard {
        /// Index of the case being built
        case: usize,
    },

    /// `build` was called with patterns that have no result yet
    #[error("case #{case} is incomplete")]
    IncompleteCase {
        /// Index of the case being built
        case: usize,
    },
}

/// No case was satisfied by the supplied arguments
#[derive(Error, Debug, Clone, PartialEq, Eq, Default)]
#[error("no case matched the arguments{}", render_diagnostics(.diagnostics))]
pub struct NoMatchError {
    /// Guard rejections collected from cases whose patterns all matched
    pub diagnostics: Vec<String>,
}

fn render_diagnostics(diagnostics: &[String]) -> String {
    if diagnostics.is_empty() {
        return String::new();
    }
    format!(" ({})", diagnostics.join("; "))
}

/// Main error type for building and invoking matchers
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MatchError {
    /// A slot's pattern specification failed to compile
    #[error("case #{case}, slot #{slot}: {source}")]
    Pattern {
        /// Index of the case
        case: usize,
        /// Index of the slot within the case
        slot: usize,
        /// The compiler's complaint
        source: PatternBuildError,
    },

    /// Capture names collided within one case
    #[error(transparent)]
    Collision(#[from] CaptureCollisionError),

    /// The case list is invalid
    #[error(transparent)]
    Build(#[from] MatcherBuildError),

    /// Nothing matched
    #[error(transparent)]
    NoMatch(#[from] NoMatchError),

    /// Argument count differs from the matcher's case arity
    #[error("matcher expects {expected} arguments, got {found}")]
    ArgumentCount {
        /// Pattern slots per case
        expected: usize,
        /// Arguments supplied
        found: usize,
    },

    /// A guard, call or continuation referenced a capture that is not there
    #[error("case #{case} refers to missing capture {key}")]
    MissingCapture {
        /// Index of the case
        case: usize,
        /// The missing key, rendered
        key: String,
    },

    /// Nested matching went deeper than the configured limit
    #[error("nested matching exceeded the depth limit of {limit}")]
    RecursionLimit {
        /// Configured maximum depth
        limit: usize,
    },

    /// Configuration could not be loaded
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl MatchError {
    /// Whether this is the ordinary "no case applied" outcome
    pub fn is_no_match(&self) -> bool {
        matches!(self, MatchError::NoMatch(_))
    }

    /// Guard diagnostics when this is a no-match, empty otherwise
    pub fn diagnostics(&self) -> &[String] {
        match self {
            MatchError::NoMatch(err) => &err.diagnostics,
            _ => &[],
        }
    }
}

impl From<serde_yaml::Error> for MatchError {
    fn from(err: serde_yaml::Error) -> Self {
        MatchError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for MatchError {
    fn from(err: serde_json::Error) -> Self {
        MatchError::Config(err.to_string())
    }
}

/// Result type alias for matching operations
pub type Result<T> = std::result::Result<T, MatchError>;
