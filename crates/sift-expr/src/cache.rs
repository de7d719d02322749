//! Memoizing compiler.
//!
//! Compiling is pure, so the same string always compiles to an equal
//! expression. [`ExpressionCompiler`] keeps compiled expressions keyed by
//! their source text and hands out shared references to them.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, PoisonError, RwLock};

use super::error::FilterResult;
use super::evaluator::Predicate;
use super::parser::CompiledExpression;

/// Compiles criteria strings and memoizes the results.
///
/// The cache is owned by the compiler instance. It is unbounded by default;
/// [`ExpressionCompiler::with_capacity`] bounds it, evicting the oldest
/// entry first when full.
///
/// # Thread Safety
///
/// `ExpressionCompiler` is [`Send`] and [`Sync`]. Lookups take a shared
/// lock; inserting a new entry takes an exclusive lock and re-checks the
/// cache first, so each key is compiled at most once even when several
/// threads ask for it at the same time. Share one compiler between
/// coordinators with `Arc<ExpressionCompiler>`.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use sift_expr_rs::ExpressionCompiler;
///
/// let compiler = ExpressionCompiler::new();
/// let first = compiler.compile("a:asdf;d:1..10");
/// let second = compiler.compile("a:asdf;d:1..10");
///
/// assert!(Arc::ptr_eq(&first, &second));
/// assert_eq!(compiler.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct ExpressionCompiler {
    capacity: Option<usize>,
    state: RwLock<CacheState>,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<String, Arc<CompiledExpression>>,
    /// Keys in insertion order, for eviction.
    order: VecDeque<String>,
}

impl ExpressionCompiler {
    /// Creates a compiler with an unbounded cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a compiler whose cache holds at most `capacity` expressions.
    ///
    /// A capacity of zero disables caching.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
            state: RwLock::default(),
        }
    }

    /// Returns the cache bound, if any.
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Compiles `input`, returning the cached expression when there is one.
    pub fn compile(&self, input: &str) -> Arc<CompiledExpression> {
        if let Some(hit) = self.lookup(input) {
            return hit;
        }

        if self.capacity == Some(0) {
            return Arc::new(CompiledExpression::parse(input));
        }

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        // Another caller may have compiled it while we waited for the lock.
        if let Some(hit) = state.entries.get(input) {
            return Arc::clone(hit);
        }

        let compiled = Arc::new(CompiledExpression::parse(input));
        state.insert(input, Arc::clone(&compiled), self.capacity);
        compiled
    }

    /// Compiles `input`, failing on the first dropped segment or unparseable operand.
    ///
    /// The expression is cached either way.
    ///
    /// # Errors
    ///
    /// See [`CompiledExpression::parse_strict`].
    pub fn compile_strict(&self, input: &str) -> FilterResult<Arc<CompiledExpression>> {
        let compiled = self.compile(input);
        compiled.check()?;
        Ok(compiled)
    }

    /// Compiles `input` into a predicate over records.
    pub fn predicate(&self, input: &str) -> Predicate {
        Predicate::new(self.compile(input))
    }

    /// Returns true if `input` has a cached expression.
    pub fn contains(&self, input: &str) -> bool {
        self.lookup(input).is_some()
    }

    /// Returns the number of cached expressions.
    pub fn len(&self) -> usize {
        self.read_state().entries.len()
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.read_state().entries.is_empty()
    }

    /// Drops every cached expression.
    pub fn clear(&self) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.entries.clear();
        state.order.clear();
    }

    fn lookup(&self, input: &str) -> Option<Arc<CompiledExpression>> {
        self.read_state().entries.get(input).map(Arc::clone)
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, CacheState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CacheState {
    fn insert(&mut self, key: &str, compiled: Arc<CompiledExpression>, capacity: Option<usize>) {
        if let Some(capacity) = capacity {
            while self.entries.len() >= capacity {
                let Some(oldest) = self.order.pop_front() else {
                    break;
                };
                tracing::debug!(key = %oldest, "evicting compiled expression");
                self.entries.remove(&oldest);
            }
        }

        self.entries.insert(key.to_string(), compiled);
        self.order.push_back(key.to_string());
    }
}
