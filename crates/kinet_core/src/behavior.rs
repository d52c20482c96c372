//! Entity behaviors
//!
//! A behavior customizes an entity the way subclassing would in a class
//! hierarchy: every hook has a no-op default, so implementors override only
//! the events they care about. Capability composition replaces inheritance —
//! an updatable/drawable/input-receiving entity is just a behavior that
//! overrides those hooks.

use crate::stage::{EntityId, Stage};

/// Verdict returned by propagation-capable hooks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Flow {
    /// Keep going: transmit the event to listeners and children.
    #[default]
    Continue,
    /// Handled here: skip transmission for this call only.
    Consume,
    /// This entity is done: the stage tears it down once the hook returns.
    Finish,
}

/// Per-entity capability object.
///
/// Hooks run with the behavior temporarily detached from its node, which is
/// why each receives the stage and its own id explicitly. A behavior that
/// wants to end its own life mid-hook returns [`Flow::Finish`] instead of
/// calling [`Stage::teardown`] on itself; the stage performs the teardown
/// right after the hook returns, with the teardown hook observable as usual.
pub trait Behavior: 'static {
    /// Name shown by [`Stage::schema`].
    fn name(&self) -> &str {
        "Entity"
    }

    /// Extra per-node text for [`Stage::schema`], shown in place of the
    /// on/off lifecycle marker (e.g. a frame count for time-based entities).
    fn detail(&self, _id: EntityId, _stage: &Stage) -> Option<String> {
        None
    }

    /// Runs while this entity is being set up, before the setup event
    /// reaches its children and before the entity is marked live.
    fn on_setup(&mut self, _id: EntityId, _stage: &mut Stage) -> Flow {
        Flow::Continue
    }

    fn on_update(&mut self, _id: EntityId, _stage: &mut Stage) -> Flow {
        Flow::Continue
    }

    /// Runs after the update event has propagated through the children, so
    /// the hook observes any detachment they performed this call.
    fn after_update(&mut self, _id: EntityId, _stage: &mut Stage) -> Flow {
        Flow::Continue
    }

    /// Drawing never alters lifecycle state; `Finish` is ignored here.
    fn on_draw(&mut self, _id: EntityId, _stage: &mut Stage) -> Flow {
        Flow::Continue
    }

    fn on_teardown(&mut self, _id: EntityId, _stage: &mut Stage) {}

    fn on_mouse_pressed(&mut self, _id: EntityId, _stage: &mut Stage) -> Flow {
        Flow::Continue
    }

    fn on_mouse_released(&mut self, _id: EntityId, _stage: &mut Stage) -> Flow {
        Flow::Continue
    }

    fn on_key_pressed(&mut self, _id: EntityId, _stage: &mut Stage) -> Flow {
        Flow::Continue
    }

    fn on_key_released(&mut self, _id: EntityId, _stage: &mut Stage) -> Flow {
        Flow::Continue
    }

    /// Invoked on a live parent when one of its children detaches during
    /// teardown. Composition behaviors advance on this.
    fn on_child_teardown(&mut self, _id: EntityId, _child: EntityId, _stage: &mut Stage) {}
}

/// Inert behavior for plain grouping nodes and roots.
#[derive(Clone, Copy, Debug, Default)]
pub struct Group;

impl Behavior for Group {
    fn name(&self) -> &str {
        "Group"
    }
}
