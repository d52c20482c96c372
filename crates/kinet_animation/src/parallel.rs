//! All-at-once child orchestration

use kinet_core::{Behavior, EntityId, Flow, Stage};

use crate::resolvable::Resolvable;

/// Attaches every descriptor up front and finishes once all of its children
/// have torn themselves down, in any order.
///
/// Children detach themselves from their parent as part of their own
/// teardown, so completion tracking reduces to watching the shared child
/// set empty out — no counters.
pub struct Parallel {
    steps: Vec<Resolvable>,
}

impl Parallel {
    pub fn new(steps: Vec<Resolvable>) -> Self {
        Self { steps }
    }
}

impl Behavior for Parallel {
    fn name(&self) -> &str {
        "Parallel"
    }

    fn on_setup(&mut self, id: EntityId, stage: &mut Stage) -> Flow {
        for step in self.steps.drain(..) {
            let child = step.resolve(stage);
            if let Err(err) = stage.add_child(id, child) {
                panic!("parallel step produced an unattachable entity: {err}");
            }
        }
        Flow::Continue
    }

    fn after_update(&mut self, id: EntityId, stage: &mut Stage) -> Flow {
        if stage.children(id).is_empty() {
            Flow::Finish
        } else {
            Flow::Continue
        }
    }
}
