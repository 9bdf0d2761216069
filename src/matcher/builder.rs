//! Fluent assembly of a case list
//!
//! Patterns accumulate into the current case until a result method
//! (`value`, `call`, `capture`, `continue_with`) closes it. Misuse is
//! remembered and reported by [`MatcherBuilder::build`].
//!
//! ```
//! use casematch::{Callable, MatcherBuilder};
//! use serde_json::json;
//!
//! let matcher = MatcherBuilder::new()
//!     .when(0)
//!     .value("zero")
//!     .when("_n")
//!     .guard(Callable::new(["n"], |args| json!(args[0].as_i64() < Some(0))))
//!     .value("negative")
//!     .otherwise()
//!     .value("positive")
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(matcher.match_one(json!(-4)).unwrap(), json!("negative"));
//! ```

use crate::callable::Callable;
use crate::capture::CaptureKey;
use crate::config::MatchConfig;
use crate::error::{MatcherBuildError, Result};
use crate::matcher::case::{CaseSpec, ResultSpec};
use crate::matcher::{Matcher, Services};
use crate::pattern::PatternSpec;
use crate::value::Value;

/// Builder for [`Matcher`]
#[derive(Debug, Default)]
pub struct MatcherBuilder {
    cases: Vec<CaseSpec>,
    patterns: Vec<PatternSpec>,
    guards: Vec<Callable>,
    fallback: bool,
    config: MatchConfig,
    services: Option<Services>,
    error: Option<MatcherBuildError>,
}

impl MatcherBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a pattern slot to the current case
    pub fn when(mut self, pattern: impl Into<PatternSpec>) -> Self {
        if self.check_pattern_allowed() {
            self.patterns.push(pattern.into());
        }
        self
    }

    /// Add a slot matching `value` strictly
    pub fn exact(self, value: impl Into<Value>) -> Self {
        self.when(PatternSpec::exact(value))
    }

    /// Start the fallback case, which applies to any arguments
    pub fn otherwise(mut self) -> Self {
        if self.check_pattern_allowed() {
            if self.patterns.is_empty() {
                self.fallback = true;
            } else {
                let case = self.current_case();
                self.fail(MatcherBuildError::IncompleteCase { case });
            }
        }
        self
    }

    /// Add a guard to the current case
    pub fn guard(mut self, guard: Callable) -> Self {
        if self.check_has_patterns() {
            self.guards.push(guard);
        }
        self
    }

    /// Close the current case with a literal result
    pub fn value(self, value: impl Into<Value>) -> Self {
        self.end_case(ResultSpec::value(value))
    }

    /// Close the current case with a call over its captures
    pub fn call(self, callable: Callable) -> Self {
        self.end_case(ResultSpec::call(callable))
    }

    /// Close the current case returning one of its captures
    pub fn capture(self, key: impl Into<CaptureKey>) -> Self {
        self.end_case(ResultSpec::capture(key))
    }

    /// Close the current case by matching selected captures against `matcher`
    pub fn continue_with<I, S>(self, bind: I, matcher: Matcher) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.end_case(ResultSpec::continue_with(bind, matcher))
    }

    /// Use a custom configuration
    pub fn with_config(mut self, config: MatchConfig) -> Self {
        self.config = config;
        self
    }

    /// Use custom collaborators
    pub fn with_services(mut self, services: Services) -> Self {
        self.services = Some(services);
        self
    }

    /// Build the matcher, reporting the first misuse if any
    pub fn build(self) -> Result<Matcher> {
        if let Some(error) = self.error {
            return Err(error.into());
        }
        if !self.patterns.is_empty() || self.fallback || !self.guards.is_empty() {
            return Err(MatcherBuildError::IncompleteCase {
                case: self.cases.len(),
            }
            .into());
        }
        if self.cases.is_empty() {
            return Err(MatcherBuildError::NoCases.into());
        }

        let services = self
            .services
            .unwrap_or_else(|| Services::from_config(&self.config));
        Matcher::with_services(self.cases, self.config, services)
    }

    /// Build and match in one step
    pub fn match_args(self, args: &[Value]) -> Result<Value> {
        self.build()?.match_args(args)
    }

    fn current_case(&self) -> usize {
        self.cases.len()
    }

    fn fail(&mut self, error: MatcherBuildError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    fn check_pattern_allowed(&mut self) -> bool {
        let case = self.current_case();
        if self.cases.last().map_or(false, CaseSpec::is_fallback) {
            self.fail(MatcherBuildError::FallbackNotLast { case: case - 1 });
            false
        } else if !self.guards.is_empty() {
            self.fail(MatcherBuildError::PatternAfterGuard { case });
            false
        } else if self.fallback {
            self.fail(MatcherBuildError::IncompleteCase { case });
            false
        } else {
            true
        }
    }

    fn check_has_patterns(&mut self) -> bool {
        if self.patterns.is_empty() && !self.fallback {
            let case = self.current_case();
            self.fail(MatcherBuildError::MissingPattern { case });
            false
        } else {
            true
        }
    }

    fn end_case(mut self, result: ResultSpec) -> Self {
        if !self.check_has_patterns() {
            return self;
        }

        let patterns = std::mem::take(&mut self.patterns);
        let guards = std::mem::take(&mut self.guards);
        let mut case = if std::mem::take(&mut self.fallback) {
            CaseSpec::fallback(result)
        } else {
            CaseSpec::new(patterns, result)
        };
        for guard in guards {
            case = case.with_guard(guard);
        }
        self.cases.push(case);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MatchError;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn build_error(builder: MatcherBuilder) -> MatcherBuildError {
        match builder.build() {
            Err(MatchError::Build(err)) => err,
            other => panic!("expected a build error, got {:?}", other),
        }
    }

    #[test]
    fn test_builds_cases_in_order() {
        let matcher = MatcherBuilder::new()
            .when(1)
            .value("one")
            .when("_")
            .value("any")
            .build()
            .unwrap();

        assert_eq!(matcher.cases().len(), 2);
        assert_eq!(matcher.match_one(json!(1)).unwrap(), json!("one"));
        assert_eq!(matcher.match_one(json!(9)).unwrap(), json!("any"));
    }

    #[test]
    fn test_result_without_pattern() {
        assert_eq!(
            build_error(MatcherBuilder::new().value(1)),
            MatcherBuildError::MissingPattern { case: 0 }
        );
        let guard = Callable::variadic(|_| json!(true));
        assert_eq!(
            build_error(MatcherBuilder::new().guard(guard)),
            MatcherBuildError::MissingPattern { case: 0 }
        );
    }

    #[test]
    fn test_pattern_after_guard() {
        let guard = Callable::variadic(|_| json!(true));
        let builder = MatcherBuilder::new().when("_x").guard(guard).when("_y").value(1);
        assert_eq!(
            build_error(builder),
            MatcherBuildError::PatternAfterGuard { case: 0 }
        );
    }

    #[test]
    fn test_nothing_after_fallback() {
        let builder = MatcherBuilder::new()
            .when(1)
            .value("one")
            .otherwise()
            .value("other")
            .when(2)
            .value("two");
        assert_eq!(
            build_error(builder),
            MatcherBuildError::FallbackNotLast { case: 1 }
        );
    }

    #[test]
    fn test_incomplete_and_empty() {
        assert_eq!(
            build_error(MatcherBuilder::new().when(1)),
            MatcherBuildError::IncompleteCase { case: 0 }
        );
        assert_eq!(build_error(MatcherBuilder::new()), MatcherBuildError::NoCases);
        assert_eq!(
            build_error(MatcherBuilder::new().when(1).otherwise()),
            MatcherBuildError::IncompleteCase { case: 0 }
        );
    }

    #[test]
    fn test_first_error_is_kept() {
        let builder = MatcherBuilder::new().value(1).when(1).value(2).build();
        assert_eq!(
            builder.unwrap_err(),
            MatchError::Build(MatcherBuildError::MissingPattern { case: 0 })
        );
    }

    #[test]
    fn test_match_args_shortcut() {
        let result = MatcherBuilder::new()
            .when("_a")
            .when("_b")
            .capture("b")
            .match_args(&[json!(1), json!(2)])
            .unwrap();
        assert_eq!(result, json!(2));
    }
}
