//! Event kinds and listener plumbing
//!
//! Named events are a closed enum: transmission dispatches with a `match`
//! on the kind, never by string lookup.

use crate::stage::{EntityId, Stage};

/// A named event propagated through the entity tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Setup,
    Update,
    Draw,
    Teardown,
    MousePressed,
    MouseReleased,
    KeyPressed,
    KeyReleased,
}

impl EventKind {
    /// Number of event kinds; sizes the per-entity stop-flag array.
    pub const COUNT: usize = 8;

    pub(crate) const fn index(self) -> usize {
        self as usize
    }

    /// Pointer and key events visit children lowest z first. A lower z is
    /// drawn later and therefore sits visually on top, so the topmost
    /// element gets the first chance to consume the event. Every other
    /// event visits highest z first.
    pub const fn is_input(self) -> bool {
        matches!(
            self,
            EventKind::MousePressed
                | EventKind::MouseReleased
                | EventKind::KeyPressed
                | EventKind::KeyReleased
        )
    }
}

/// Callback registered with [`Stage::on`].
///
/// Invoked while the event transmits through its entity, after the entity's
/// own behavior hook and before the children. Listeners observe an entity
/// from outside; they do not replace its behavior.
pub type Listener = Box<dyn FnMut(&mut Stage, EntityId)>;
