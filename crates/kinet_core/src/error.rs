//! Stage error types

use thiserror::Error;

/// Lifecycle and attachment errors
///
/// Only the explicit entry points (`setup`, `teardown`, `add_child`,
/// `remove_child`, `despawn`) return these. Misuse on the frame event-loop
/// path (update/draw/input on an entity that is not set up) is reported as a
/// warning and ignored, since aborting the tick would punish the whole tree
/// for one stale handle.
#[derive(Error, Debug)]
pub enum StageError {
    /// `setup` called on an entity that is already set up
    #[error("entity is already set up")]
    AlreadySetup,

    /// `teardown` called on an entity that was never set up
    #[error("entity must be set up first")]
    NotSetup,

    /// Operation on an entity whose slot has been released; torn-down
    /// entities are never reused, so this also covers repeated `teardown`
    #[error("entity no longer exists")]
    Dangling,

    /// `add_child` on a child already attached to a different parent
    #[error("entity is already attached to another parent")]
    AlreadyAttached,

    /// `add_child` with identical parent and child
    #[error("entity cannot be its own child")]
    SelfParent,

    /// `despawn` on an entity that is attached or has been activated
    #[error("entity is still attached or active")]
    StillActive,
}

/// Result type for stage operations
pub type Result<T> = std::result::Result<T, StageError>;
