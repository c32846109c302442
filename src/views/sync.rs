//! Optimistic list state shared by the feed and the fitness tracker.
//!
//! A user action mutates the local list right away and hands back a
//! [`Ticket`] holding the item as it was. The ticket is later settled with
//! the authoritative list (reconcile) or used to restore the prior item
//! (rollback). A newer action on the same item supersedes older tickets;
//! settling a superseded ticket is a no-op.

use std::collections::HashMap;

use crate::api::models::{FitnessTask, Post};

pub trait Keyed {
    fn key(&self) -> &str;
}

impl Keyed for Post {
    fn key(&self) -> &str {
        &self.post_id
    }
}

impl Keyed for FitnessTask {
    fn key(&self) -> &str {
        &self.task_id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Local state equals the last known server state.
    Synced,
    /// Mutated locally, server call in flight.
    OptimisticPending,
    /// Server response applied.
    Reconciled,
    /// Server call failed, local mutation reverted.
    RolledBack,
}

#[derive(Debug)]
pub struct Ticket<T> {
    key: String,
    seq: u64,
    /// Position and value before the mutation.
    prior: (usize, T),
}

impl<T> Ticket<T> {
    pub fn key(&self) -> &str {
        &self.key
    }
}

#[derive(Debug, Clone)]
pub struct OptimisticList<T> {
    items: Vec<T>,
    states: HashMap<String, SyncState>,
    latest: HashMap<String, u64>,
    next_seq: u64,
}

impl<T> Default for OptimisticList<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            states: HashMap::new(),
            latest: HashMap::new(),
            next_seq: 0,
        }
    }
}

impl<T: Keyed + Clone> OptimisticList<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items,
            ..Self::default()
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        self.items.iter().find(|i| i.key() == key)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn state(&self, key: &str) -> SyncState {
        self.states.get(key).copied().unwrap_or(SyncState::Synced)
    }

    /// Replace the list with freshly fetched server state. Items with an
    /// action still in flight keep their pending marker.
    pub fn replace_all(&mut self, items: Vec<T>) {
        self.items = items;
        self.states
            .retain(|_, state| *state == SyncState::OptimisticPending);
    }

    /// Append a server-confirmed item.
    pub fn push(&mut self, item: T) {
        self.states.insert(item.key().to_string(), SyncState::Synced);
        self.items.push(item);
    }

    /// Mutate one item in place. `None` if the key is unknown.
    pub fn begin_update(&mut self, key: &str, mutate: impl FnOnce(&mut T)) -> Option<Ticket<T>> {
        let index = self.items.iter().position(|i| i.key() == key)?;
        let prior = self.items[index].clone();
        mutate(&mut self.items[index]);
        Some(self.issue(key, (index, prior)))
    }

    /// Remove one item. `None` if the key is unknown.
    pub fn begin_remove(&mut self, key: &str) -> Option<Ticket<T>> {
        let index = self.items.iter().position(|i| i.key() == key)?;
        let prior = self.items.remove(index);
        Some(self.issue(key, (index, prior)))
    }

    fn issue(&mut self, key: &str, prior: (usize, T)) -> Ticket<T> {
        self.next_seq += 1;
        let seq = self.next_seq;
        self.latest.insert(key.to_string(), seq);
        self.states
            .insert(key.to_string(), SyncState::OptimisticPending);
        Ticket {
            key: key.to_string(),
            seq,
            prior,
        }
    }

    pub fn is_current(&self, ticket: &Ticket<T>) -> bool {
        self.latest.get(&ticket.key) == Some(&ticket.seq)
    }

    /// Overwrite the list with the authoritative server state.
    pub fn reconcile(&mut self, ticket: Ticket<T>, authoritative: Vec<T>) -> bool {
        if !self.is_current(&ticket) {
            tracing::debug!("Ignoring superseded completion for {}", ticket.key);
            return false;
        }
        self.items = authoritative;
        self.states.insert(ticket.key, SyncState::Reconciled);
        true
    }

    /// The server accepted the action but fresh state is unavailable; keep
    /// the local prediction.
    pub fn confirm(&mut self, ticket: Ticket<T>) -> bool {
        if !self.is_current(&ticket) {
            return false;
        }
        self.states.insert(ticket.key, SyncState::Reconciled);
        true
    }

    /// Restore the item captured when the ticket was issued.
    pub fn rollback(&mut self, ticket: Ticket<T>) -> bool {
        if !self.is_current(&ticket) {
            tracing::debug!("Ignoring superseded rollback for {}", ticket.key);
            return false;
        }

        let (index, prior) = ticket.prior;
        match self.items.iter().position(|i| i.key() == ticket.key) {
            Some(i) => self.items[i] = prior,
            None => {
                let index = index.min(self.items.len());
                self.items.insert(index, prior);
            }
        }
        self.states.insert(ticket.key, SyncState::RolledBack);
        true
    }
}
