//! Child descriptors for composition behaviors
//!
//! Sequence and Parallel take their children as descriptors so a child can
//! be handed over ready-made or produced lazily at the moment it is needed.

use kinet_core::{EntityId, Stage};

/// A child descriptor: an entity spawned up front, or a factory invoked
/// when the descriptor is reached.
pub enum Resolvable {
    Spawned(EntityId),
    Factory(Box<dyn FnOnce(&mut Stage) -> EntityId>),
}

impl Resolvable {
    /// Deferred construction. The factory runs only when this descriptor
    /// becomes current, so it can depend on side effects of earlier steps.
    pub fn with(factory: impl FnOnce(&mut Stage) -> EntityId + 'static) -> Self {
        Resolvable::Factory(Box::new(factory))
    }

    pub(crate) fn resolve(self, stage: &mut Stage) -> EntityId {
        match self {
            Resolvable::Spawned(id) => id,
            Resolvable::Factory(factory) => factory(stage),
        }
    }
}

impl From<EntityId> for Resolvable {
    fn from(id: EntityId) -> Self {
        Resolvable::Spawned(id)
    }
}
