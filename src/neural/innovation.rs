//! Innovation numbering.
//!
//! The [`InnovationLedger`] is the run-wide counter that hands out innovation
//! ids. [`GenerationInnovations`] lives for one reproduction phase and records
//! which structural mutations already received ids, so that the same mutation
//! appearing in several children of one generation is numbered once.

use super::gene::NodeId;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Monotonic innovation counter shared by every genome of a run
#[derive(Debug, Default)]
pub struct InnovationLedger {
    next: AtomicUsize,
}

impl InnovationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a ledger whose next id is `next` (checkpoint resume)
    pub fn starting_at(next: usize) -> Self {
        Self {
            next: AtomicUsize::new(next),
        }
    }

    /// Issue a fresh innovation id
    #[inline]
    pub fn next_id(&self) -> usize {
        self.next.fetch_add(1, Ordering::SeqCst)
    }

    /// Make sure ids `0..count` are taken. Used by the minimal topology,
    /// whose genes carry the same ids in every genome.
    pub fn reserve(&self, count: usize) {
        self.next.fetch_max(count, Ordering::SeqCst);
    }

    /// Number of ids issued so far (also the dimension of the speciation space)
    #[inline]
    pub fn count(&self) -> usize {
        self.next.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.next.store(0, Ordering::SeqCst);
    }
}

/// Structural mutations recorded during a single generation
#[derive(Debug)]
pub struct GenerationInnovations<'a> {
    ledger: &'a InnovationLedger,
    connections: HashMap<(NodeId, NodeId), usize>,
    splits: HashMap<usize, (usize, usize)>,
}

impl<'a> GenerationInnovations<'a> {
    pub fn new(ledger: &'a InnovationLedger) -> Self {
        Self {
            ledger,
            connections: HashMap::new(),
            splits: HashMap::new(),
        }
    }

    /// Innovation id for a new `source -> target` connection
    pub fn connection(&mut self, source: NodeId, target: NodeId) -> usize {
        let ledger = self.ledger;
        *self
            .connections
            .entry((source, target))
            .or_insert_with(|| ledger.next_id())
    }

    /// Innovation ids for the (incoming, outgoing) genes created by splitting
    /// the gene with innovation `split`
    pub fn split(&mut self, split: usize) -> (usize, usize) {
        let ledger = self.ledger;
        *self.splits.entry(split).or_insert_with(|| {
            let incoming = ledger.next_id();
            let outgoing = ledger.next_id();
            (incoming, outgoing)
        })
    }

    /// A fresh id that is never shared with another mutation
    pub fn fresh(&mut self) -> usize {
        self.ledger.next_id()
    }

    /// Number of distinct structural mutations seen this generation
    pub fn recorded(&self) -> usize {
        self.connections.len() + self.splits.len()
    }
}
