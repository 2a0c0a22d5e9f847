//! # Predicate Cache
//!
//! Compiled predicates keyed by [`SchemaKey`]. The first successful
//! compilation of a schema is stored and every later lookup with the same
//! key reuses it. Failed compilations are not cached.
//!
//! A cache belongs to exactly one run; runs never share one.

use std::collections::HashMap;
use std::sync::Arc;

use crate::registry::SchemaRegistry;
use crate::validate::{compile, CompiledPredicate, SchemaError, SchemaKey, SchemaSpec};

/// Hit/miss counters, for run summaries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups served from the cache.
    pub hits: usize,
    /// Lookups that compiled a new predicate.
    pub misses: usize,
}

/// Identity-keyed store of compiled predicates.
#[derive(Debug, Default)]
pub struct PredicateCache {
    entries: HashMap<SchemaKey, Arc<CompiledPredicate>>,
    stats: CacheStats,
}

impl PredicateCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the predicate for `spec`, compiling it on first use.
    ///
    /// # Errors
    ///
    /// Propagates `SchemaError::Compile`; nothing is stored in that case.
    pub fn get_or_compile(
        &mut self,
        spec: &SchemaSpec,
        registry: &SchemaRegistry,
    ) -> Result<Arc<CompiledPredicate>, SchemaError> {
        let key = spec.key();
        if let Some(predicate) = self.entries.get(&key) {
            self.stats.hits += 1;
            return Ok(Arc::clone(predicate));
        }
        let predicate = Arc::new(compile(spec, registry)?);
        self.stats.misses += 1;
        self.entries.insert(key, Arc::clone(&predicate));
        Ok(predicate)
    }

    /// Returns true if a predicate for `key` is cached.
    pub fn contains(&self, key: &SchemaKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of cached predicates.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Hit/miss counters so far.
    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}
