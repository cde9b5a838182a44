//! Per-cycle memoisation of aggregator queries

use super::Stage;
use crate::attribute::{ContributionFilter, Reduced, ReduceMode};
use crate::types::CharacterId;
use crate::value::ResolveError;
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, HashMap};
use std::hash::{Hash, Hasher};

/// What was asked of the aggregator
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Query {
    pub key: String,
    pub mode: ReduceMode,
    pub filter: ContributionFilter,
    /// Hash of the variables visible to the resolver at query time
    pub variables: u64,
}

impl Query {
    pub fn new(
        key: &str,
        mode: ReduceMode,
        filter: &ContributionFilter,
        variables: &BTreeMap<String, i32>,
    ) -> Self {
        let mut hasher = DefaultHasher::new();
        variables.hash(&mut hasher);
        Query {
            key: key.to_string(),
            mode,
            filter: filter.clone(),
            variables: hasher.finish(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub character: CharacterId,
    pub stage: Stage,
    pub query: Query,
}

/// Typed memo table, cleared at the start of every recompute
#[derive(Debug, Default)]
pub struct ComputationCache {
    entries: HashMap<CacheKey, Result<Reduced, ResolveError>>,
    hits: u64,
    misses: u64,
}

impl ComputationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop everything from the previous cycle
    pub fn begin_cycle(&mut self) {
        self.entries.clear();
        self.hits = 0;
        self.misses = 0;
    }

    pub fn get_or_compute<F>(&mut self, key: CacheKey, compute: F) -> Result<Reduced, ResolveError>
    where
        F: FnOnce() -> Result<Reduced, ResolveError>,
    {
        if let Some(found) = self.entries.get(&key) {
            self.hits += 1;
            return found.clone();
        }
        self.misses += 1;
        let value = compute();
        self.entries.insert(key, value.clone());
        value
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}
