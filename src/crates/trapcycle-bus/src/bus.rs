//! Named collections of running chains with release history

use crate::{BusError, Result};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// Release batches kept by default
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

/// Identifier handed out by [`BusRegistry::register`]
///
/// Ordered by creation tick, then by registration order within the tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VoiceId {
    pub created_at: i64,
    pub seq: u64,
}

impl fmt::Display for VoiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.created_at, self.seq)
    }
}

/// Active entries in registration order plus a bounded history of releases
///
/// History is grouped into batches by release step, most recent first.
/// Releasing several entries at the same step appends them to one batch.
#[derive(Debug, Clone)]
pub struct BusRegistry<T> {
    name: String,
    entries: Vec<(VoiceId, T)>,
    history: VecDeque<(i64, Vec<T>)>,
    history_limit: usize,
    next_seq: u64,
}

impl<T> BusRegistry<T> {
    pub fn new(name: impl Into<String>) -> Self {
        BusRegistry {
            name: name.into(),
            entries: Vec::new(),
            history: VecDeque::new(),
            history_limit: DEFAULT_HISTORY_LIMIT,
            next_seq: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add an entry created at step `created_at`
    pub fn register(&mut self, item: T, created_at: i64) -> VoiceId {
        self.next_seq += 1;
        let id = VoiceId {
            created_at,
            seq: self.next_seq,
        };
        self.entries.push((id, item));
        id
    }

    /// Move an entry into the history batch for `step`
    ///
    /// Returns false when `id` is not active.
    pub fn release(&mut self, id: VoiceId, step: i64) -> bool {
        let Some(item) = self.take(id) else {
            return false;
        };

        match self.history.front_mut() {
            Some((batch_step, batch)) if *batch_step == step => batch.push(item),
            _ => self.history.push_front((step, vec![item])),
        }
        self.history.truncate(self.history_limit);
        true
    }

    /// Drop an entry without recording it in the history
    pub fn remove(&mut self, id: VoiceId) -> Option<T> {
        self.take(id)
    }

    fn take(&mut self, id: VoiceId) -> Option<T> {
        let index = self.entries.iter().position(|(entry, _)| *entry == id)?;
        Some(self.entries.remove(index).1)
    }

    pub fn get(&self, id: VoiceId) -> Option<&T> {
        self.entries
            .iter()
            .find(|(entry, _)| *entry == id)
            .map(|(_, item)| item)
    }

    pub fn contains(&self, id: VoiceId) -> bool {
        self.get(id).is_some()
    }

    /// Entry with the greatest id
    pub fn newest(&self) -> Option<&T> {
        self.entries
            .iter()
            .max_by_key(|(id, _)| *id)
            .map(|(_, item)| item)
    }

    /// Entry with the smallest id
    pub fn oldest(&self) -> Option<&T> {
        self.entries
            .iter()
            .min_by_key(|(id, _)| *id)
            .map(|(_, item)| item)
    }

    /// Positional access; negative indices count from the end
    pub fn get_index(&self, index: isize) -> Result<&T> {
        let len = self.entries.len();
        let resolved = if index < 0 {
            len.checked_sub(index.unsigned_abs())
        } else {
            Some(index as usize)
        };

        resolved
            .and_then(|i| self.entries.get(i))
            .map(|(_, item)| item)
            .ok_or(BusError::IndexOutOfRange { index, len })
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|(_, item)| item)
    }

    /// Active ids in registration order
    pub fn ids(&self) -> Vec<VoiceId> {
        self.entries.iter().map(|(id, _)| *id).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries of the `n`-th most recent release batch; empty past the end
    pub fn last(&self, n: usize) -> &[T] {
        self.history
            .get(n)
            .map(|(_, batch)| batch.as_slice())
            .unwrap_or(&[])
    }

    /// All batches, most recent first
    pub fn history(&self) -> Vec<&[T]> {
        self.history.iter().map(|(_, batch)| batch.as_slice()).collect()
    }

    /// Release step of each batch, most recent first
    pub fn history_steps(&self) -> Vec<i64> {
        self.history.iter().map(|(step, _)| *step).collect()
    }

    pub fn history_limit(&self) -> usize {
        self.history_limit
    }

    /// Change the batch bound, evicting the oldest batches if needed
    pub fn set_history_limit(&mut self, limit: usize) {
        self.history_limit = limit;
        self.history.truncate(limit);
    }
}

impl<T> fmt::Display for BusRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<BusRegistry '{}': {} voices>", self.name, self.entries.len())
    }
}
