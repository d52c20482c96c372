//! Entity stage
//!
//! The stage owns every entity in an arena and drives the lifecycle state
//! machine (`Unset -> Setup -> TornDown`) plus depth-first event
//! transmission. Entities are addressed by [`EntityId`] handles; a torn-down
//! entity's slot is released and its key is never reused, so stale handles
//! fail cleanly instead of touching a recycled node.
//!
//! Transmission of an event through a node runs the node's registered
//! listeners first, then a point-in-time snapshot of its children in z
//! order. Children frequently detach themselves mid-transmission (a
//! finished animation, a cancelled subtree); the snapshot guarantees no
//! sibling is skipped or visited twice when that happens.

use std::cmp::Reverse;

use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;

use crate::behavior::{Behavior, Flow};
use crate::clock::FrameClock;
use crate::error::{Result, StageError};
use crate::events::{EventKind, Listener};

new_key_type! {
    /// Handle to an entity living on a [`Stage`].
    pub struct EntityId;
}

/// Lifecycle states. `TornDown` is terminal: the slot is released at the end
/// of teardown and the entity is never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lifecycle {
    Unset,
    Setup,
    TornDown,
}

struct Node {
    behavior: Option<Box<dyn Behavior>>,
    state: Lifecycle,
    start_frame: u64,
    z_index: Option<i32>,
    parent: Option<EntityId>,
    children: SmallVec<[EntityId; 4]>,
    listeners: FxHashMap<EventKind, Vec<Listener>>,
    stop_flags: [bool; EventKind::COUNT],
}

impl Node {
    fn new(behavior: Box<dyn Behavior>) -> Self {
        Self {
            behavior: Some(behavior),
            state: Lifecycle::Unset,
            start_frame: 0,
            z_index: None,
            parent: None,
            children: SmallVec::new(),
            listeners: FxHashMap::default(),
            stop_flags: [false; EventKind::COUNT],
        }
    }
}

/// The entity tree runtime.
pub struct Stage {
    nodes: SlotMap<EntityId, Node>,
    clock: FrameClock,
}

impl Stage {
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            clock: FrameClock::new(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Frame clock
    // ─────────────────────────────────────────────────────────────────────

    /// Advance the frame clock. The host calls this exactly once per tick,
    /// before dispatching the root update.
    pub fn advance_frame(&mut self) -> u64 {
        self.clock.advance()
    }

    /// The current frame count.
    pub fn frame(&self) -> u64 {
        self.clock.current()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Tree construction
    // ─────────────────────────────────────────────────────────────────────

    /// Create an entity in the `Unset` state, detached from any tree.
    pub fn spawn(&mut self, behavior: impl Behavior) -> EntityId {
        self.nodes.insert(Node::new(Box::new(behavior)))
    }

    /// Release a spawned entity that was never activated or attached.
    pub fn despawn(&mut self, id: EntityId) -> Result<()> {
        let node = self.nodes.get(id).ok_or(StageError::Dangling)?;
        if node.state != Lifecycle::Unset || node.parent.is_some() {
            return Err(StageError::StillActive);
        }
        self.nodes.remove(id);
        Ok(())
    }

    /// Attach `child` under `parent`. A duplicate attach to the same parent
    /// is a no-op. If the parent is already set up, the child is set up
    /// synchronously within this call — activation is never deferred.
    pub fn add_child(&mut self, parent: EntityId, child: EntityId) -> Result<()> {
        if parent == child {
            return Err(StageError::SelfParent);
        }
        if !self.nodes.contains_key(parent) {
            return Err(StageError::Dangling);
        }
        let child_node = self.nodes.get_mut(child).ok_or(StageError::Dangling)?;
        match child_node.parent {
            Some(existing) if existing == parent => return Ok(()),
            Some(_) => return Err(StageError::AlreadyAttached),
            None => {}
        }
        child_node.parent = Some(parent);
        self.nodes[parent].children.push(child);
        if self.nodes[parent].state == Lifecycle::Setup {
            self.setup(child)?;
        }
        Ok(())
    }

    /// Detach `child` from `parent`. A live child is torn down (cascading
    /// through its own subtree); a never-activated child is discarded
    /// without invoking any hook.
    pub fn remove_child(&mut self, parent: EntityId, child: EntityId) -> Result<()> {
        if !self.nodes.contains_key(parent) {
            return Err(StageError::Dangling);
        }
        match self.lifecycle(child) {
            None => Err(StageError::Dangling),
            Some(Lifecycle::Setup) => self.teardown(child),
            Some(_) => {
                self.detach(parent, child);
                Ok(())
            }
        }
    }

    fn detach(&mut self, parent: EntityId, child: EntityId) {
        if let Some(node) = self.nodes.get_mut(parent) {
            node.children.retain(|c| *c != child);
        }
        if let Some(node) = self.nodes.get_mut(child) {
            if node.parent == Some(parent) {
                node.parent = None;
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────

    pub fn lifecycle(&self, id: EntityId) -> Option<Lifecycle> {
        self.nodes.get(id).map(|node| node.state)
    }

    pub fn is_setup(&self, id: EntityId) -> bool {
        matches!(self.lifecycle(id), Some(Lifecycle::Setup))
    }

    pub fn parent(&self, id: EntityId) -> Option<EntityId> {
        self.nodes.get(id).and_then(|node| node.parent)
    }

    /// Children in insertion order (not the transmission order, which is
    /// z-sorted per event kind).
    pub fn children(&self, id: EntityId) -> &[EntityId] {
        self.nodes
            .get(id)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    /// Frame at which this entity was set up.
    pub fn start_frame(&self, id: EntityId) -> Option<u64> {
        self.nodes.get(id).map(|node| node.start_frame)
    }

    /// Frames elapsed since this entity's own activation.
    pub fn elapsed(&self, id: EntityId) -> Option<u64> {
        self.nodes
            .get(id)
            .map(|node| self.clock.current().saturating_sub(node.start_frame))
    }

    /// The z-order key: the explicit value if one was assigned, otherwise
    /// the entity's current position in its parent's child list.
    pub fn z_index(&self, id: EntityId) -> i32 {
        let Some(node) = self.nodes.get(id) else {
            return 0;
        };
        if let Some(z) = node.z_index {
            return z;
        }
        node.parent
            .and_then(|parent| self.nodes.get(parent))
            .and_then(|parent| parent.children.iter().position(|&c| c == id))
            .map(|position| position as i32)
            .unwrap_or(0)
    }

    pub fn set_z_index(&mut self, id: EntityId, z: i32) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.z_index = Some(z);
        }
    }

    /// Number of entities currently on the stage.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Listeners and propagation control
    // ─────────────────────────────────────────────────────────────────────

    /// Register an extra listener for `kind` on `id`, invoked during
    /// transmission in registration order. This observes an entity from the
    /// outside without replacing its behavior.
    pub fn on(
        &mut self,
        id: EntityId,
        kind: EventKind,
        listener: impl FnMut(&mut Stage, EntityId) + 'static,
    ) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.listeners
                .entry(kind)
                .or_default()
                .push(Box::new(listener));
        }
    }

    /// Suppress propagation of `kind` to the remaining children for the
    /// transmission call currently in flight on `id`. The flag resets when
    /// that call ends; it never leaks into the next transmission.
    pub fn stop_transmission(&mut self, id: EntityId, kind: EventKind) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.stop_flags[kind.index()] = true;
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Lifecycle entry points
    // ─────────────────────────────────────────────────────────────────────

    /// Activate an entity: capture its start frame, run its setup hook,
    /// transmit `Setup` through its children, then mark it live.
    pub fn setup(&mut self, id: EntityId) -> Result<()> {
        let frame = self.clock.current();
        let node = self.nodes.get_mut(id).ok_or(StageError::Dangling)?;
        match node.state {
            Lifecycle::Unset => {}
            Lifecycle::Setup => return Err(StageError::AlreadySetup),
            Lifecycle::TornDown => return Err(StageError::Dangling),
        }
        node.start_frame = frame;
        let flow = self.run_hook(id, EventKind::Setup);
        if !self.nodes.contains_key(id) {
            return Ok(());
        }
        if flow != Flow::Consume {
            self.transmit(id, EventKind::Setup)?;
        }
        if let Some(node) = self.nodes.get_mut(id) {
            node.state = Lifecycle::Setup;
        }
        if flow == Flow::Finish {
            self.teardown(id)?;
        }
        Ok(())
    }

    /// Finalize an entity: mark it torn down (re-entrant calls are rejected
    /// from here on), run its teardown hook, detach it from its parent,
    /// cascade through its children, then release its slot.
    pub fn teardown(&mut self, id: EntityId) -> Result<()> {
        let node = self.nodes.get_mut(id).ok_or(StageError::Dangling)?;
        match node.state {
            Lifecycle::Setup => {}
            Lifecycle::Unset => return Err(StageError::NotSetup),
            Lifecycle::TornDown => return Err(StageError::NotSetup),
        }
        node.state = Lifecycle::TornDown;
        self.run_hook(id, EventKind::Teardown);
        let parent = self.nodes.get(id).and_then(|node| node.parent);
        if let Some(parent) = parent {
            self.detach(parent, id);
            self.notify_child_teardown(parent, id);
        }
        let _ = self.transmit(id, EventKind::Teardown);
        self.nodes.remove(id);
        Ok(())
    }

    /// Per-tick update. Not set up is a warning, not an error: the frame
    /// loop keeps running.
    pub fn update(&mut self, id: EntityId) {
        self.frame_event(id, EventKind::Update);
    }

    /// Per-tick draw. Same contract as [`Stage::update`] but with zero
    /// effect on lifecycle state.
    pub fn draw(&mut self, id: EntityId) {
        self.frame_event(id, EventKind::Draw);
    }

    pub fn mouse_pressed(&mut self, id: EntityId) {
        self.frame_event(id, EventKind::MousePressed);
    }

    pub fn mouse_released(&mut self, id: EntityId) {
        self.frame_event(id, EventKind::MouseReleased);
    }

    pub fn key_pressed(&mut self, id: EntityId) {
        self.frame_event(id, EventKind::KeyPressed);
    }

    pub fn key_released(&mut self, id: EntityId) {
        self.frame_event(id, EventKind::KeyReleased);
    }

    // ─────────────────────────────────────────────────────────────────────
    // Dispatch internals
    // ─────────────────────────────────────────────────────────────────────

    fn frame_event(&mut self, id: EntityId, kind: EventKind) {
        match self.lifecycle(id) {
            Some(Lifecycle::Setup) => {}
            state => {
                tracing::warn!(?kind, ?state, "event dispatched to an entity that is not set up");
                return;
            }
        }
        match self.run_hook(id, kind) {
            Flow::Finish => {
                if kind == EventKind::Draw {
                    tracing::warn!("draw hook cannot finish an entity; ignoring");
                } else {
                    // already gone if the hook tore itself down directly
                    let _ = self.teardown(id);
                    return;
                }
            }
            Flow::Consume => return,
            Flow::Continue => {}
        }
        let _ = self.transmit(id, kind);
        if kind == EventKind::Update && self.run_after_update(id) == Flow::Finish {
            let _ = self.teardown(id);
        }
    }

    /// Transmit `kind` through `id`: listeners in registration order, then
    /// an ordered snapshot of the children with the stop flag checked before
    /// each one. Only `Setup` transmission can fail (a child may legally
    /// reject a second activation).
    fn transmit(&mut self, id: EntityId, kind: EventKind) -> Result<()> {
        self.run_listeners(id, kind);
        if !self.nodes.contains_key(id) {
            return Ok(());
        }
        let ordered = self.ordered_children(id, kind);
        let mut result = Ok(());
        for child in ordered {
            let Some(node) = self.nodes.get_mut(id) else {
                break;
            };
            if node.stop_flags[kind.index()] {
                break;
            }
            if let Err(err) = self.dispatch_child(child, kind) {
                result = Err(err);
                break;
            }
        }
        if let Some(node) = self.nodes.get_mut(id) {
            node.stop_flags[kind.index()] = false;
        }
        result
    }

    fn dispatch_child(&mut self, child: EntityId, kind: EventKind) -> Result<()> {
        match kind {
            EventKind::Setup => self.setup(child),
            EventKind::Teardown => {
                // cascade: a sibling's listener may have torn this child
                // down already, which is snapshot protection, not misuse
                match self.teardown(child) {
                    Err(StageError::Dangling) | Err(StageError::NotSetup) => Ok(()),
                    other => other,
                }
            }
            _ => {
                if self.nodes.contains_key(child) {
                    self.frame_event(child, kind);
                }
                Ok(())
            }
        }
    }

    /// Children snapshot in transmission order: input events ascend z so the
    /// visually topmost (lowest z, drawn last) element goes first; all other
    /// events descend z. Stable for equal keys.
    fn ordered_children(&self, id: EntityId, kind: EventKind) -> SmallVec<[EntityId; 4]> {
        let Some(node) = self.nodes.get(id) else {
            return SmallVec::new();
        };
        let mut keyed: SmallVec<[(i32, EntityId); 4]> = node
            .children
            .iter()
            .enumerate()
            .map(|(position, &child)| {
                let z = self
                    .nodes
                    .get(child)
                    .and_then(|c| c.z_index)
                    .unwrap_or(position as i32);
                (z, child)
            })
            .collect();
        if kind.is_input() {
            keyed.sort_by_key(|&(z, _)| z);
        } else {
            keyed.sort_by_key(|&(z, _)| Reverse(z));
        }
        keyed.into_iter().map(|(_, child)| child).collect()
    }

    /// Run the behavior hook for `kind`, with the behavior detached from its
    /// node for the duration of the call.
    fn run_hook(&mut self, id: EntityId, kind: EventKind) -> Flow {
        let Some(node) = self.nodes.get_mut(id) else {
            return Flow::Continue;
        };
        let Some(mut behavior) = node.behavior.take() else {
            return Flow::Continue;
        };
        let flow = match kind {
            EventKind::Setup => behavior.on_setup(id, self),
            EventKind::Update => behavior.on_update(id, self),
            EventKind::Draw => behavior.on_draw(id, self),
            EventKind::Teardown => {
                behavior.on_teardown(id, self);
                Flow::Continue
            }
            EventKind::MousePressed => behavior.on_mouse_pressed(id, self),
            EventKind::MouseReleased => behavior.on_mouse_released(id, self),
            EventKind::KeyPressed => behavior.on_key_pressed(id, self),
            EventKind::KeyReleased => behavior.on_key_released(id, self),
        };
        if let Some(node) = self.nodes.get_mut(id) {
            node.behavior = Some(behavior);
        }
        flow
    }

    fn run_after_update(&mut self, id: EntityId) -> Flow {
        let Some(node) = self.nodes.get_mut(id) else {
            return Flow::Continue;
        };
        let Some(mut behavior) = node.behavior.take() else {
            return Flow::Continue;
        };
        let flow = behavior.after_update(id, self);
        if let Some(node) = self.nodes.get_mut(id) {
            node.behavior = Some(behavior);
        }
        flow
    }

    fn notify_child_teardown(&mut self, parent: EntityId, child: EntityId) {
        let Some(node) = self.nodes.get_mut(parent) else {
            return;
        };
        if node.state != Lifecycle::Setup {
            // parent is mid-teardown itself; nothing left to drive
            return;
        }
        let Some(mut behavior) = node.behavior.take() else {
            return;
        };
        behavior.on_child_teardown(parent, child, self);
        if let Some(node) = self.nodes.get_mut(parent) {
            node.behavior = Some(behavior);
        }
    }

    /// Run the listeners registered for `kind` on `id`. The list is
    /// detached from the node while it runs, so listeners may freely mutate
    /// the entity; listeners registered during the run join in from the
    /// next transmission.
    fn run_listeners(&mut self, id: EntityId, kind: EventKind) {
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        let Some(mut listeners) = node.listeners.remove(&kind) else {
            return;
        };
        for listener in listeners.iter_mut() {
            listener(self, id);
            if !self.nodes.contains_key(id) {
                return;
            }
        }
        if let Some(node) = self.nodes.get_mut(id) {
            if let Some(added) = node.listeners.remove(&kind) {
                listeners.extend(added);
            }
            node.listeners.insert(kind, listeners);
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Diagnostics
    // ─────────────────────────────────────────────────────────────────────

    /// Human-readable indented dump of the subtree rooted at `id`, for
    /// debugging and test assertions — not a stable machine format.
    pub fn schema(&self, id: EntityId, indentation: usize) -> String {
        let mut out = String::new();
        self.schema_node(id, indentation, 0, None, &mut out);
        out
    }

    fn schema_node(
        &self,
        id: EntityId,
        indentation: usize,
        depth: usize,
        index: Option<usize>,
        out: &mut String,
    ) {
        use std::fmt::Write;

        let pad = " ".repeat(indentation * depth);
        let (label, detail) = match self.nodes.get(id) {
            Some(node) => {
                let name = node
                    .behavior
                    .as_ref()
                    .map(|b| b.name().to_owned())
                    .unwrap_or_else(|| "Entity".to_owned());
                let detail = match node.behavior.as_ref().and_then(|b| b.detail(id, self)) {
                    Some(detail) => detail,
                    None if node.state == Lifecycle::Setup => "on".to_owned(),
                    None => "off".to_owned(),
                };
                (name, detail)
            }
            None => ("<released>".to_owned(), "off".to_owned()),
        };
        let children = self.children(id);
        let colon = if children.is_empty() { "" } else { ":" };
        match index {
            Some(i) => {
                let _ = writeln!(out, "{pad}{i} - {label} [{detail}]{colon}");
            }
            None => {
                let _ = writeln!(out, "{pad}{label} [{detail}]{colon}");
            }
        }
        for (i, &child) in children.iter().enumerate() {
            self.schema_node(child, indentation, depth + 1, Some(i), out);
        }
    }
}

impl Default for Stage {
    fn default() -> Self {
        Self::new()
    }
}
