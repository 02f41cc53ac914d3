//! Keyed registry of long-lived aggregators

use std::{
    collections::HashSet,
    fmt::Debug,
    hash::{BuildHasher, Hash},
};

use harvest_core::MetricSink;
use hashbrown::HashMap;

use crate::Aggregator;

/// Owns one aggregator per key.
///
/// Entries are created the first time a key is seen and evicted by
/// [`reconcile`](KeyedRegistry::reconcile) the first time a poll no longer contains it.
/// After a poll's reconcile and aggregation, the registry holds exactly the keys of that poll.
///
/// The registry is owned by the task driving one poll and is never shared; emission only
/// reads the key set.
#[derive(Debug)]
pub struct KeyedRegistry<K, A> {
    entries: HashMap<K, A>,
}

impl<K, A> Default for KeyedRegistry<K, A> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash, A> KeyedRegistry<K, A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delete every entry whose key is not in `current`, returning the number evicted.
    ///
    /// Entries whose key is in `current` are kept as they are, accumulated state included.
    pub fn reconcile<S: BuildHasher>(&mut self, current: &HashSet<K, S>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| current.contains(key));
        before - self.entries.len()
    }

    /// The aggregator for `key`, built with `factory` if there is none yet.
    pub fn get_or_create(&mut self, key: K, factory: impl FnOnce(&K) -> A) -> &mut A {
        self.entries.entry(key).or_insert_with_key(factory)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys currently registered, in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &A)> {
        self.entries.iter()
    }
}

impl<K: Eq + Hash + Debug, A: Aggregator> KeyedRegistry<K, A> {
    /// Emit and reset every aggregator.
    ///
    /// An aggregator that fails to build its summary writes nothing and is logged; the others
    /// are unaffected. Returns the number of instances written.
    pub fn emit_all(&mut self, sink: &dyn MetricSink) -> usize {
        let mut written = 0;
        for (key, aggregator) in self.entries.iter_mut() {
            match aggregator.emit(sink) {
                Ok(n) => written += n,
                Err(error) => {
                    tracing::warn!(?key, %error, "dropping malformed aggregate");
                }
            }
        }
        written
    }
}
