//! First-match-wins dispatch over ordered cases
//!
//! A [`Matcher`] owns its case records. Pattern slots compile lazily on
//! first use and are cached for the life of the matcher, so one matcher
//! can be shared across threads and called concurrently.

pub mod builder;
pub mod case;

pub use builder::MatcherBuilder;
pub use case::{CaseSpec, DeferredCall, Guard, MatchCase, ResultProducer, ResultSpec};

use crate::callable::{DeclaredParameters, Introspector};
use crate::config::MatchConfig;
use crate::error::{MatchError, MatcherBuildError, NoMatchError, Result};
use crate::pattern::{PatternCompiler, RegexService, StandardRegex};
use crate::value::Value;
use case::CaseContext;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

/// Collaborators a matcher calls out to
#[derive(Debug, Clone)]
pub struct Services {
    /// Regex recognition and compilation
    pub regex: Arc<dyn RegexService>,
    /// Parameter-name discovery for guards and calls
    pub introspector: Arc<dyn Introspector>,
}

impl Default for Services {
    fn default() -> Self {
        Self {
            regex: StandardRegex::shared(),
            introspector: Arc::new(DeclaredParameters),
        }
    }
}

impl Services {
    /// Default collaborators honouring the configured regex limits
    pub fn from_config(config: &MatchConfig) -> Self {
        let shared = StandardRegex::shared();
        let regex: Arc<dyn RegexService> = if shared.limits() == &config.regex {
            shared
        } else {
            Arc::new(StandardRegex::new(config.regex.clone()))
        };
        Self {
            regex,
            introspector: Arc::new(DeclaredParameters),
        }
    }

    /// Replace the regex collaborator
    pub fn with_regex(mut self, regex: Arc<dyn RegexService>) -> Self {
        self.regex = regex;
        self
    }

    /// Replace the introspection collaborator
    pub fn with_introspector(mut self, introspector: Arc<dyn Introspector>) -> Self {
        self.introspector = introspector;
        self
    }
}

/// Point-in-time counters for a matcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatcherStats {
    /// Number of cases
    pub cases: usize,
    /// Pattern slots across all cases
    pub slots: usize,
    /// Slots whose compilation has run
    pub compiled_slots: usize,
    /// Times the pattern compiler was invoked
    pub compilations: usize,
}

/// Nesting position within one top-level match
#[derive(Debug, Clone, Copy)]
pub(crate) struct Depth {
    level: usize,
    limit: usize,
}

impl Depth {
    pub(crate) fn root(limit: usize) -> Self {
        Self { level: 0, limit }
    }

    /// One level deeper, or an error once the limit is reached
    pub(crate) fn descend(self) -> Result<Self> {
        if self.level >= self.limit {
            return Err(MatchError::RecursionLimit { limit: self.limit });
        }
        Ok(Self {
            level: self.level + 1,
            limit: self.limit,
        })
    }
}

struct MatcherInner {
    cases: Vec<MatchCase>,
    arity: Option<usize>,
    compiler: PatternCompiler,
    introspector: Arc<dyn Introspector>,
    config: MatchConfig,
    compilations: AtomicUsize,
}

/// An ordered list of cases tried first-match-wins
#[derive(Clone)]
pub struct Matcher {
    inner: Arc<MatcherInner>,
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Matcher")
            .field("cases", &self.inner.cases.len())
            .field("arity", &self.inner.arity)
            .finish()
    }
}

impl Matcher {
    /// Build a matcher with the default configuration
    pub fn new(cases: Vec<CaseSpec>) -> Result<Self> {
        Self::with_config(cases, MatchConfig::default())
    }

    /// Build a matcher with the given configuration
    pub fn with_config(cases: Vec<CaseSpec>, config: MatchConfig) -> Result<Self> {
        let services = Services::from_config(&config);
        Self::with_services(cases, config, services)
    }

    /// Build a matcher with explicit collaborators
    pub fn with_services(cases: Vec<CaseSpec>, config: MatchConfig, services: Services) -> Result<Self> {
        let arity = validate(&cases)?;
        let cases = cases
            .into_iter()
            .enumerate()
            .map(|(index, spec)| MatchCase::from_spec(index, spec))
            .collect::<Result<Vec<_>>>()?;

        debug!(cases = cases.len(), arity = ?arity, "built matcher");

        Ok(Self {
            inner: Arc::new(MatcherInner {
                cases,
                arity,
                compiler: PatternCompiler::new(services.regex),
                introspector: services.introspector,
                config,
                compilations: AtomicUsize::new(0),
            }),
        })
    }

    /// Match an argument list; the first fully satisfied case produces the result
    pub fn match_args(&self, args: &[Value]) -> Result<Value> {
        self.match_at(args, Depth::root(self.inner.config.max_depth))
    }

    /// Match a single argument
    pub fn match_one(&self, value: Value) -> Result<Value> {
        self.match_args(std::slice::from_ref(&value))
    }

    /// Pattern slots per case, `None` when only the fallback case exists
    pub fn arity(&self) -> Option<usize> {
        self.inner.arity
    }

    /// Case records in order
    pub fn cases(&self) -> &[MatchCase] {
        &self.inner.cases
    }

    /// The configuration this matcher was built with
    pub fn config(&self) -> &MatchConfig {
        &self.inner.config
    }

    /// Current counters
    pub fn stats(&self) -> MatcherStats {
        let inner = &self.inner;
        MatcherStats {
            cases: inner.cases.len(),
            slots: inner.cases.iter().map(MatchCase::arity).sum(),
            compiled_slots: inner.cases.iter().map(MatchCase::compiled_slots).sum(),
            compilations: inner.compilations.load(Ordering::Relaxed),
        }
    }

    /// Whether two handles refer to the same matcher
    pub fn ptr_eq(&self, other: &Matcher) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Match on behalf of an enclosing matcher; the recursion limit is the
    /// outermost matcher's
    pub(crate) fn match_at(&self, args: &[Value], depth: Depth) -> Result<Value> {
        let inner = &self.inner;

        if let Some(expected) = inner.arity {
            if args.len() != expected {
                return Err(MatchError::ArgumentCount {
                    expected,
                    found: args.len(),
                });
            }
        }

        let ctx = CaseContext {
            compiler: &inner.compiler,
            introspector: inner.introspector.as_ref(),
            compilations: &inner.compilations,
            depth,
        };

        let mut diagnostics = Vec::new();
        for case in &inner.cases {
            let captures = match case.capture(args, &ctx)? {
                Some(captures) => captures,
                None => continue,
            };

            if let Some(diagnostic) = case.check_guards(&captures, args, &ctx)? {
                diagnostics.push(diagnostic);
                continue;
            }

            debug!(case = case.index(), depth = depth.level, "case matched");
            return case.produce(&captures, args, &ctx);
        }

        trace!(depth = depth.level, rejected = diagnostics.len(), "no case matched");
        Err(NoMatchError { diagnostics }.into())
    }
}

/// Build a matcher from case descriptions with the default configuration
pub fn build(cases: Vec<CaseSpec>) -> Result<Matcher> {
    Matcher::new(cases)
}

/// Check the case list shape and return the common arity
fn validate(cases: &[CaseSpec]) -> Result<Option<usize>> {
    if cases.is_empty() {
        return Err(MatcherBuildError::NoCases.into());
    }

    let last = cases.len() - 1;
    let mut arity: Option<usize> = None;

    for (index, case) in cases.iter().enumerate() {
        if case.is_fallback() {
            if index != last {
                return Err(MatcherBuildError::FallbackNotLast { case: index }.into());
            }
            continue;
        }

        let found = case.patterns().len();
        if found == 0 {
            return Err(MatcherBuildError::EmptyCase { case: index }.into());
        }

        match arity {
            None => arity = Some(found),
            Some(expected) if expected != found => {
                return Err(MatcherBuildError::InconsistentArity {
                    case: index,
                    expected,
                    found,
                }
                .into());
            }
            Some(_) => {}
        }
    }

    Ok(arity)
}
