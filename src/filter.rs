//! Filter stages over the lazy declaration stream.
//!
//! A stage takes the upstream sequence and returns a new one. Stages run in
//! registration order, each seeing only the previous stage's output. The
//! built-in stages never buffer declarations; [`UniqueFilter`] keeps the set
//! of names it has already yielded.
//!
//! Upstream `Err` items must be passed through untouched so the consumer
//! sees them at the position they occurred.

use regex::Regex;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::declaration::{Declaration, NAMESPACE_SEPARATOR};
use crate::error::{ConfigError, Result};
use crate::kind::KindMask;

/// A lazy, fallible stream of declarations.
pub type Declarations = Box<dyn Iterator<Item = Result<Declaration>>>;

pub trait Filter: Send + Sync {
    fn apply(&self, upstream: Declarations) -> Declarations;
}

/// Ordered list of stages. Builder methods copy; a chain is never changed
/// after it has been built.
#[derive(Clone, Default)]
pub struct FilterChain {
    stages: Vec<Arc<dyn Filter>>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn with(&self, filter: Arc<dyn Filter>) -> Self {
        self.with_all([filter])
    }

    pub fn with_all<I>(&self, filters: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn Filter>>,
    {
        let mut stages = self.stages.clone();
        stages.extend(filters);
        Self { stages }
    }

    pub fn apply(&self, upstream: Declarations) -> Declarations {
        self.stages
            .iter()
            .fold(upstream, |stream, stage| stage.apply(stream))
    }
}

impl fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterChain")
            .field("stages", &self.stages.len())
            .finish()
    }
}

impl FromIterator<Arc<dyn Filter>> for FilterChain {
    fn from_iter<I: IntoIterator<Item = Arc<dyn Filter>>>(iter: I) -> Self {
        Self {
            stages: iter.into_iter().collect(),
        }
    }
}

fn keep<F>(upstream: Declarations, mut predicate: F) -> Declarations
where
    F: FnMut(&Declaration) -> bool + 'static,
{
    Box::new(upstream.filter(move |item| match item {
        Ok(decl) => predicate(decl),
        Err(_) => true,
    }))
}

/// Adapts a stream transformation into a stage.
pub struct FnFilter<F>(F);

pub fn from_fn<F>(transform: F) -> FnFilter<F>
where
    F: Fn(Declarations) -> Declarations + Send + Sync + 'static,
{
    FnFilter(transform)
}

impl<F> Filter for FnFilter<F>
where
    F: Fn(Declarations) -> Declarations + Send + Sync + 'static,
{
    fn apply(&self, upstream: Declarations) -> Declarations {
        (self.0)(upstream)
    }
}

/// Keeps declarations for which the predicate holds.
pub struct Retain<F> {
    predicate: Arc<F>,
}

pub fn retain<F>(predicate: F) -> Retain<F>
where
    F: Fn(&Declaration) -> bool + Send + Sync + 'static,
{
    Retain {
        predicate: Arc::new(predicate),
    }
}

impl<F> Filter for Retain<F>
where
    F: Fn(&Declaration) -> bool + Send + Sync + 'static,
{
    fn apply(&self, upstream: Declarations) -> Declarations {
        let predicate = Arc::clone(&self.predicate);
        keep(upstream, move |decl| predicate(decl))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct KindFilter {
    kinds: KindMask,
}

impl KindFilter {
    pub fn new(kinds: impl Into<KindMask>) -> Self {
        Self {
            kinds: kinds.into(),
        }
    }
}

impl Filter for KindFilter {
    fn apply(&self, upstream: Declarations) -> Declarations {
        let kinds = self.kinds;
        keep(upstream, move |decl| kinds.includes(decl.kind()))
    }
}

/// Keeps declarations inside any of the given namespaces, sub-namespaces
/// included. Comparison ignores ASCII case, as PHP does.
#[derive(Debug, Clone)]
pub struct NamespaceFilter {
    prefixes: Arc<[String]>,
}

impl NamespaceFilter {
    pub fn new<I>(prefixes: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let prefixes = prefixes
            .into_iter()
            .map(|p| {
                p.as_ref()
                    .trim()
                    .trim_matches(NAMESPACE_SEPARATOR)
                    .to_ascii_lowercase()
            })
            .collect();
        Self { prefixes }
    }

    pub fn matches(&self, decl: &Declaration) -> bool {
        matches_namespace(&self.prefixes, decl)
    }
}

fn matches_namespace(prefixes: &[String], decl: &Declaration) -> bool {
    let namespace = decl.namespace().unwrap_or("").to_ascii_lowercase();
    prefixes.iter().any(|prefix| {
        prefix.is_empty()
            || namespace == *prefix
            || namespace
                .strip_prefix(prefix.as_str())
                .is_some_and(|rest| rest.starts_with(NAMESPACE_SEPARATOR))
    })
}

impl Filter for NamespaceFilter {
    fn apply(&self, upstream: Declarations) -> Declarations {
        let prefixes = Arc::clone(&self.prefixes);
        keep(upstream, move |decl| matches_namespace(&prefixes, decl))
    }
}

/// Matches fully-qualified names against a regular expression.
#[derive(Debug, Clone)]
pub struct PatternFilter {
    pattern: Regex,
    exclude: bool,
}

impl PatternFilter {
    pub fn new(pattern: &str) -> Result<Self> {
        let pattern = Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self {
            pattern,
            exclude: false,
        })
    }

    /// Drops matching names instead of keeping them.
    pub fn excluding(mut self) -> Self {
        self.exclude = true;
        self
    }
}

impl Filter for PatternFilter {
    fn apply(&self, upstream: Declarations) -> Declarations {
        let pattern = self.pattern.clone();
        let exclude = self.exclude;
        keep(upstream, move |decl| pattern.is_match(decl.name()) != exclude)
    }
}

/// Drops declarations whose name was already yielded (case-insensitive).
#[derive(Debug, Clone, Copy, Default)]
pub struct UniqueFilter;

impl Filter for UniqueFilter {
    fn apply(&self, upstream: Declarations) -> Declarations {
        let mut seen = HashSet::new();
        keep(upstream, move |decl| {
            seen.insert(decl.name().to_ascii_lowercase())
        })
    }
}
