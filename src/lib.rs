//! Ordered structural pattern matching over JSON-like values
//!
//! A [`Matcher`] holds an ordered list of cases. Each case tests one pattern
//! per argument, collects what the patterns capture, checks its guards and,
//! if everything holds, produces a result. The first satisfied case wins.
//!
//! # Example
//!
//! ```
//! use casematch::{build, CaseSpec, Callable, ResultSpec};
//! use serde_json::json;
//!
//! let matcher = build(vec![
//!     CaseSpec::new([1], ResultSpec::value("one")),
//!     CaseSpec::new(["/^(?P<user>\\w+):(?P<id>\\d+)$/"], ResultSpec::capture("user")),
//!     CaseSpec::new(["_x"], ResultSpec::call(Callable::new(["x"], |args| {
//!         json!(format!("other: {}", args[0]))
//!     }))),
//! ])
//! .unwrap();
//!
//! assert_eq!(matcher.match_one(json!(1)).unwrap(), json!("one"));
//! assert_eq!(matcher.match_one(json!("ada:42")).unwrap(), json!("ada"));
//! assert_eq!(matcher.match_one(json!(true)).unwrap(), json!("other: true"));
//! ```
//!
//! # Patterns
//!
//! Raw patterns are [`PatternSpec`]s and compile lazily, once per slot:
//!
//! - `null` and integers match exactly
//! - `"_"` matches anything, `"_name"` matches anything and captures it
//! - a delimited string such as `"/\\d+/i"` is a regex
//! - any other string of two or more characters matches exactly
//! - a [`Callable`] is a predicate, a [`Matcher`] a nested match

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]

pub use callable::{Callable, DeclaredParameters, Introspector};
pub use capture::{CaptureFragment, CaptureKey, CaptureSet};
pub use config::{MatchConfig, RegexLimits};
pub use error::{
    CaptureCollisionError, MatchError, MatcherBuildError, NoMatchError, PatternBuildError, Result,
};
pub use matcher::{
    build, CaseSpec, Guard, MatchCase, Matcher, MatcherBuilder, MatcherStats, ResultProducer,
    ResultSpec, Services,
};
pub use pattern::{MatchOutcome, Pattern, PatternCompiler, PatternSpec};
pub use value::{Value, ValueExt};

/// Callables and parameter introspection
pub mod callable;

/// Capture keys, fragments and sets
pub mod capture;

/// Configuration
pub mod config;

/// Error types
pub mod error;

/// Matchers, cases and the builder
pub mod matcher;

/// Patterns and their compiler
pub mod pattern;

/// Value model
pub mod value;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the tracing subscriber with default settings
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().json())
        .init();
}
