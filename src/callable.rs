//! Native callables used as predicates, guards and case results
//!
//! A [`Callable`] is a shared closure over a slice of [`Value`]s plus the
//! ordered names of its formal parameters. The names are only ever read
//! through an [`Introspector`], which maps them onto captures.

use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// Signature of every native function the engine invokes
pub type NativeFn = dyn Fn(&[Value]) -> Value + Send + Sync;

/// A cheaply clonable function reference with declared parameter names
#[derive(Clone)]
pub struct Callable {
    name: Option<Arc<str>>,
    params: Arc<[String]>,
    func: Arc<NativeFn>,
}

impl Callable {
    /// Create a callable whose parameters are named, in order, by `params`
    pub fn new<I, S, F>(params: I, func: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        Self {
            name: None,
            params: params.into_iter().map(Into::into).collect(),
            func: Arc::new(func),
        }
    }

    /// Create a callable that declares no parameters and receives positional arguments
    pub fn variadic<F>(func: F) -> Self
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        Self::new(std::iter::empty::<String>(), func)
    }

    /// Attach a display name used in diagnostics
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(Arc::from(name.into()));
        self
    }

    /// Display name, if one was attached
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Declared parameter names
    pub fn declared_parameters(&self) -> &[String] {
        &self.params
    }

    /// Invoke the function
    pub fn call(&self, args: &[Value]) -> Value {
        (self.func)(args)
    }

    /// Whether two handles refer to the same function
    pub fn ptr_eq(&self, other: &Callable) -> bool {
        Arc::ptr_eq(&self.func, &other.func)
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callable")
            .field("name", &self.name())
            .field("params", &self.params)
            .finish()
    }
}

impl fmt::Display for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({})",
            self.name().unwrap_or("<fn>"),
            self.params.join(", ")
        )
    }
}

/// Reflection collaborator: reports a callable's formal parameter names
pub trait Introspector: fmt::Debug + Send + Sync {
    /// Ordered parameter names, or an empty list when unknown
    fn parameter_names_of(&self, callable: &Callable) -> Vec<String>;
}

/// Introspector that trusts the names given at construction
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclaredParameters;

impl Introspector for DeclaredParameters {
    fn parameter_names_of(&self, callable: &Callable) -> Vec<String> {
        callable.declared_parameters().to_vec()
    }
}
