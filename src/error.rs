//! Cursor and compiler errors.

use thiserror::Error;

use crate::action::ActionId;

/// Errors raised while folding actions into device state.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum StateError {
    /// `apply_next` was called on a cursor with no pending actions.
    #[error("no pending actions to apply")]
    EmptyQueue,

    /// A PopSettings action found the settings stack empty.
    #[error("action {id}: cannot restore settings, the settings stack is empty")]
    EmptySettingsStack { id: ActionId },
}

/// Errors that abort a whole compile pass. No partial program is ever
/// returned and the source queue is left untouched.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CompileError {
    /// A tool-frame value was requested while no tool is attached.
    #[error("action {id}: cannot derive a tool frame, no tool is attached")]
    NoToolAttached { id: ActionId },

    #[error(transparent)]
    State(#[from] StateError),
}
