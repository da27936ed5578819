//! FIFO buffer of actions awaiting compilation or streaming.
//!
//! The queue preserves insertion order and never reorders or coalesces.
//! Blocks are explicit boundaries recorded with [`ActionQueue::close_block`];
//! a block is a contiguous run of actions intended to compile into one
//! program unit. Non-draining reads are idempotent, which supports dry-run
//! exports against a live queue that a producer keeps filling.

use crate::action::Action;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ActionQueue {
    pending: VecDeque<Action>,
    /// Lengths of closed blocks, oldest first.
    blocks: VecDeque<usize>,
}

impl ActionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an action to the open tail of the queue.
    pub fn enqueue(&mut self, action: Action) {
        self.pending.push_back(action);
    }

    /// Marks a block boundary after the most recently enqueued action.
    ///
    /// Closing with no actions since the previous boundary records nothing.
    pub fn close_block(&mut self) {
        let closed: usize = self.blocks.iter().sum();
        let open = self.pending.len() - closed;
        if open > 0 {
            self.blocks.push_back(open);
        }
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Returns the next contiguous block, or everything pending when no
    /// boundary is recorded. Removes the returned prefix iff `drain`.
    pub fn peek_block(&mut self, drain: bool) -> Vec<Action> {
        let count = self.blocks.front().copied().unwrap_or(self.pending.len());
        let actions: Vec<Action> = self.pending.iter().take(count).cloned().collect();
        if drain {
            self.remove_prefix(count);
        }
        actions
    }

    /// Returns the entire remaining content. Removes it iff `drain`.
    pub fn peek_all(&mut self, drain: bool) -> Vec<Action> {
        let actions: Vec<Action> = self.pending.iter().cloned().collect();
        if drain {
            self.pending.clear();
            self.blocks.clear();
        }
        actions
    }

    /// Removes and returns the oldest pending action, keeping block
    /// boundaries consistent.
    pub(crate) fn take_next(&mut self) -> Option<Action> {
        let action = self.pending.pop_front()?;
        match self.blocks.front_mut() {
            Some(len) if *len > 1 => *len -= 1,
            Some(_) => {
                self.blocks.pop_front();
            }
            None => {}
        }
        Some(action)
    }

    /// Removes exactly `count` actions from the front.
    pub(crate) fn remove_prefix(&mut self, count: usize) {
        for _ in 0..count {
            self.take_next();
        }
    }
}
