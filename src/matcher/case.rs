//! Case records: pattern slots, guards and result producers

use crate::callable::{Callable, Introspector};
use crate::capture::{bind_parameters, CaptureKey, CaptureSet};
use crate::error::{CaptureCollisionError, MatchError, PatternBuildError, Result};
use crate::matcher::{Depth, Matcher};
use crate::pattern::{MatchOutcome, Pattern, PatternCompiler, PatternSpec};
use crate::value::{describe, Value, ValueExt};
use once_cell::sync::OnceCell;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, trace};

/// How a selected case computes its result
#[derive(Debug, Clone)]
pub enum ResultSpec {
    /// Return a literal
    Value(Value),
    /// Return one captured value
    Capture(CaptureKey),
    /// Call a function with arguments taken from the captures
    Call(Callable),
    /// Match the named captures against another matcher
    Continue {
        /// Captures forwarded as the sub-matcher's arguments
        bind: Vec<String>,
        /// The matcher to continue with
        matcher: Matcher,
    },
}

impl ResultSpec {
    /// Literal result
    pub fn value(value: impl Into<Value>) -> Self {
        ResultSpec::Value(value.into())
    }

    /// Captured value as result
    pub fn capture(key: impl Into<CaptureKey>) -> Self {
        ResultSpec::Capture(key.into())
    }

    /// Deferred call as result
    pub fn call(callable: Callable) -> Self {
        ResultSpec::Call(callable)
    }

    /// Recursive match as result
    pub fn continue_with<I, S>(bind: I, matcher: Matcher) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ResultSpec::Continue {
            bind: bind.into_iter().map(Into::into).collect(),
            matcher,
        }
    }
}

/// Description of one case, as accepted by [`crate::build`]
#[derive(Debug, Clone)]
pub struct CaseSpec {
    pub(crate) patterns: Vec<PatternSpec>,
    pub(crate) guards: Vec<Callable>,
    pub(crate) result: ResultSpec,
    pub(crate) fallback: bool,
}

impl CaseSpec {
    /// A case with one pattern per argument slot
    pub fn new<I, P>(patterns: I, result: ResultSpec) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PatternSpec>,
    {
        Self {
            patterns: patterns.into_iter().map(Into::into).collect(),
            guards: Vec::new(),
            result,
            fallback: false,
        }
    }

    /// A slotless case that applies to any arguments; must come last
    pub fn fallback(result: ResultSpec) -> Self {
        Self {
            patterns: Vec::new(),
            guards: Vec::new(),
            result,
            fallback: true,
        }
    }

    /// Add a guard evaluated against the case's captures
    pub fn with_guard(mut self, guard: Callable) -> Self {
        self.guards.push(guard);
        self
    }

    /// Pattern slots
    pub fn patterns(&self) -> &[PatternSpec] {
        &self.patterns
    }

    /// Whether this is the fallback case
    pub fn is_fallback(&self) -> bool {
        self.fallback
    }
}

/// One argument slot: the spec and its compiled pattern, written once
#[derive(Debug)]
struct Slot {
    spec: PatternSpec,
    compiled: OnceCell<std::result::Result<Pattern, PatternBuildError>>,
}

impl Slot {
    fn new(spec: PatternSpec) -> Self {
        Self {
            spec,
            compiled: OnceCell::new(),
        }
    }

    fn pattern(
        &self,
        compiler: &PatternCompiler,
        compilations: &AtomicUsize,
    ) -> std::result::Result<&Pattern, &PatternBuildError> {
        self.compiled
            .get_or_init(|| {
                compilations.fetch_add(1, Ordering::Relaxed);
                let compiled = compiler.compile(&self.spec);
                debug!(spec = ?self.spec, ok = compiled.is_ok(), "compiled pattern slot");
                compiled
            })
            .as_ref()
    }

    fn is_compiled(&self) -> bool {
        self.compiled.get().is_some()
    }

    /// Whether the slot's capture names are only known once compiled
    fn has_compiled_names(&self, compiler: &PatternCompiler) -> bool {
        match &self.spec {
            PatternSpec::Str(s) => {
                !s.starts_with('_') && compiler.regex_service().looks_like_regex_literal(s)
            }
            _ => false,
        }
    }
}

/// A callable whose parameter-to-capture binding is derived on first use
#[derive(Debug)]
pub struct DeferredCall {
    callable: Callable,
    binding: OnceCell<Vec<CaptureKey>>,
}

impl DeferredCall {
    fn new(callable: Callable) -> Self {
        Self {
            callable,
            binding: OnceCell::new(),
        }
    }

    /// The wrapped callable
    pub fn callable(&self) -> &Callable {
        &self.callable
    }

    /// The derived binding, once the call has been reached
    pub fn binding(&self) -> Option<&[CaptureKey]> {
        self.binding.get().map(Vec::as_slice)
    }

    fn arguments(
        &self,
        case: usize,
        captures: &CaptureSet,
        args: &[Value],
        introspector: &dyn Introspector,
    ) -> Result<Vec<Value>> {
        let binding = self.binding.get_or_init(|| {
            bind_parameters(&introspector.parameter_names_of(&self.callable), captures)
        });

        if binding.is_empty() {
            return Ok(unbound_arguments(captures, args));
        }

        binding
            .iter()
            .map(|key| {
                captures
                    .get(key)
                    .cloned()
                    .ok_or_else(|| MatchError::MissingCapture {
                        case,
                        key: key.to_string(),
                    })
            })
            .collect()
    }

    fn invoke(
        &self,
        case: usize,
        captures: &CaptureSet,
        args: &[Value],
        introspector: &dyn Introspector,
    ) -> Result<Value> {
        let arguments = self.arguments(case, captures, args, introspector)?;
        Ok(self.callable.call(&arguments))
    }
}

/// A guard: a deferred call whose result is tested for truthiness
pub type Guard = DeferredCall;

/// Arguments for a call that bound no parameters: the positional captures,
/// or the matched arguments themselves when nothing positional was captured
fn unbound_arguments(captures: &CaptureSet, args: &[Value]) -> Vec<Value> {
    let positional: Vec<Value> = captures.positional().cloned().collect();
    if positional.is_empty() {
        args.to_vec()
    } else {
        positional
    }
}

/// The strategy producing a selected case's value
#[derive(Debug)]
pub enum ResultProducer {
    /// Literal
    Value(Value),
    /// A captured value
    Capture(CaptureKey),
    /// Deferred call over the captures
    Call(DeferredCall),
    /// Recursive match over selected captures
    Continue {
        /// Captures forwarded, in order
        bind: Vec<String>,
        /// The matcher continued with
        matcher: Matcher,
    },
}

impl From<ResultSpec> for ResultProducer {
    fn from(spec: ResultSpec) -> Self {
        match spec {
            ResultSpec::Value(value) => ResultProducer::Value(value),
            ResultSpec::Capture(key) => ResultProducer::Capture(key),
            ResultSpec::Call(callable) => ResultProducer::Call(DeferredCall::new(callable)),
            ResultSpec::Continue { bind, matcher } => ResultProducer::Continue { bind, matcher },
        }
    }
}

/// Shared state a case needs while being evaluated
pub(crate) struct CaseContext<'a> {
    pub compiler: &'a PatternCompiler,
    pub introspector: &'a dyn Introspector,
    pub compilations: &'a AtomicUsize,
    pub depth: Depth,
}

/// One ordered group of slots, guards and a result producer
#[derive(Debug)]
pub struct MatchCase {
    index: usize,
    slots: Vec<Slot>,
    guards: Vec<Guard>,
    result: ResultProducer,
    fallback: bool,
    compiled_collision: OnceCell<Option<String>>,
}

impl MatchCase {
    /// Validate a spec and turn it into a case record
    pub(crate) fn from_spec(index: usize, spec: CaseSpec) -> Result<Self> {
        let mut seen: Vec<String> = Vec::new();
        for name in spec.patterns.iter().flat_map(PatternSpec::static_bind_names) {
            if seen.contains(&name) {
                return Err(CaptureCollisionError { case: index, name }.into());
            }
            seen.push(name);
        }

        Ok(Self {
            index,
            slots: spec.patterns.into_iter().map(Slot::new).collect(),
            guards: spec.guards.into_iter().map(DeferredCall::new).collect(),
            result: spec.result.into(),
            fallback: spec.fallback,
            compiled_collision: OnceCell::new(),
        })
    }

    /// Position of this case in its matcher
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of pattern slots
    pub fn arity(&self) -> usize {
        self.slots.len()
    }

    /// Whether this is the fallback case
    pub fn is_fallback(&self) -> bool {
        self.fallback
    }

    /// Guards in evaluation order
    pub fn guards(&self) -> &[Guard] {
        &self.guards
    }

    /// The result producer
    pub fn result(&self) -> &ResultProducer {
        &self.result
    }

    pub(crate) fn compiled_slots(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_compiled()).count()
    }

    /// Test every slot; `None` when some slot does not match
    pub(crate) fn capture(&self, args: &[Value], ctx: &CaseContext<'_>) -> Result<Option<CaptureSet>> {
        let mut captures = CaptureSet::new();

        for (slot_index, (slot, arg)) in self.slots.iter().zip(args).enumerate() {
            let pattern = slot
                .pattern(ctx.compiler, ctx.compilations)
                .map_err(|source| MatchError::Pattern {
                    case: self.index,
                    slot: slot_index,
                    source: source.clone(),
                })?;

            if slot.has_compiled_names(ctx.compiler) {
                self.check_compiled_names(ctx)?;
            }

            match pattern.try_match_at(arg, ctx.depth)? {
                MatchOutcome::NoMatch => {
                    trace!(case = self.index, slot = slot_index, "slot did not match");
                    return Ok(None);
                }
                MatchOutcome::Matched(fragment) => {
                    captures.merge(fragment).map_err(|name| CaptureCollisionError {
                        case: self.index,
                        name,
                    })?;
                }
            }
        }

        Ok(Some(captures))
    }

    /// Check regex group names against the rest of the case. Runs once, when
    /// the first regex-string slot is reached; the verdict is cached.
    fn check_compiled_names(&self, ctx: &CaseContext<'_>) -> Result<()> {
        let collision = self.compiled_collision.get_or_init(|| {
            let mut seen: Vec<String> = Vec::new();
            for slot in &self.slots {
                let names = if slot.has_compiled_names(ctx.compiler) {
                    // A failed compile is reported when its own slot is reached
                    slot.pattern(ctx.compiler, ctx.compilations)
                        .map(Pattern::bind_names)
                        .unwrap_or_default()
                } else {
                    slot.spec.static_bind_names()
                };
                for name in names {
                    if seen.contains(&name) {
                        debug!(case = self.index, %name, "regex group collides with another slot");
                        return Some(name);
                    }
                    seen.push(name);
                }
            }
            None
        });

        match collision {
            Some(name) => Err(CaptureCollisionError {
                case: self.index,
                name: name.clone(),
            }
            .into()),
            None => Ok(()),
        }
    }

    /// Run the guards in order; a rejection yields its diagnostic
    pub(crate) fn check_guards(
        &self,
        captures: &CaptureSet,
        args: &[Value],
        ctx: &CaseContext<'_>,
    ) -> Result<Option<String>> {
        for (guard_index, guard) in self.guards.iter().enumerate() {
            let verdict = guard.invoke(self.index, captures, args, ctx.introspector)?;
            if !verdict.is_truthy() {
                let diagnostic = format!(
                    "case #{}: guard #{} {} rejected captures {}",
                    self.index,
                    guard_index,
                    guard.callable(),
                    describe(&captures.to_value())
                );
                trace!(case = self.index, guard = guard_index, "guard rejected");
                return Ok(Some(diagnostic));
            }
        }
        Ok(None)
    }

    /// Compute the result of this (selected) case
    pub(crate) fn produce(
        &self,
        captures: &CaptureSet,
        args: &[Value],
        ctx: &CaseContext<'_>,
    ) -> Result<Value> {
        match &self.result {
            ResultProducer::Value(value) => Ok(value.clone()),
            ResultProducer::Capture(key) => {
                captures
                    .get(key)
                    .cloned()
                    .ok_or_else(|| MatchError::MissingCapture {
                        case: self.index,
                        key: key.to_string(),
                    })
            }
            ResultProducer::Call(call) => call.invoke(self.index, captures, args, ctx.introspector),
            ResultProducer::Continue { bind, matcher } => {
                let forwarded = self.forwarded_arguments(bind, captures, args)?;
                matcher.match_at(&forwarded, ctx.depth.descend()?)
            }
        }
    }

    /// Named captures in `bind` order; a name that was not captured takes
    /// the next positional capture instead
    fn forwarded_arguments(
        &self,
        bind: &[String],
        captures: &CaptureSet,
        args: &[Value],
    ) -> Result<Vec<Value>> {
        if bind.is_empty() {
            return Ok(unbound_arguments(captures, args));
        }

        let mut next = 0;
        bind.iter()
            .map(|name| {
                if let Some(value) = captures.get_named(name) {
                    return Ok(value.clone());
                }
                let value = captures.get_index(next).cloned().ok_or_else(|| {
                    MatchError::MissingCapture {
                        case: self.index,
                        key: CaptureKey::Name(name.clone()).to_string(),
                    }
                })?;
                next += 1;
                Ok(value)
            })
            .collect()
    }
}
