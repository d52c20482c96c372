//! One-at-a-time child orchestration

use std::vec;

use kinet_core::{Behavior, EntityId, Flow, Stage};

use crate::resolvable::Resolvable;

/// Runs its descriptors one at a time: the next child attaches only once
/// the current one has torn down, and the sequence finishes when the list
/// is exhausted. An empty sequence finishes within its own setup, without
/// ever activating a child.
pub struct Sequence {
    remaining: vec::IntoIter<Resolvable>,
    current: Option<EntityId>,
}

impl Sequence {
    pub fn new(steps: Vec<Resolvable>) -> Self {
        Self {
            remaining: steps.into_iter(),
            current: None,
        }
    }

    fn advance(&mut self, id: EntityId, stage: &mut Stage) -> Flow {
        match self.remaining.next() {
            Some(step) => {
                let child = step.resolve(stage);
                if let Err(err) = stage.add_child(id, child) {
                    panic!("sequence step produced an unattachable entity: {err}");
                }
                self.current = Some(child);
                Flow::Continue
            }
            None => {
                self.current = None;
                Flow::Finish
            }
        }
    }
}

impl Behavior for Sequence {
    fn name(&self) -> &str {
        "Sequence"
    }

    fn on_setup(&mut self, id: EntityId, stage: &mut Stage) -> Flow {
        self.advance(id, stage)
    }

    fn on_child_teardown(&mut self, id: EntityId, child: EntityId, stage: &mut Stage) {
        if self.current != Some(child) {
            return;
        }
        if self.advance(id, stage) == Flow::Finish {
            if let Err(err) = stage.teardown(id) {
                tracing::warn!(?err, "sequence could not finish itself");
            }
        }
    }

    fn on_teardown(&mut self, _id: EntityId, stage: &mut Stage) {
        // cancelled early: release descriptors that never became current;
        // a descriptor the caller attached elsewhere is left alone
        for step in self.remaining.by_ref() {
            if let Resolvable::Spawned(spawned) = step {
                let _ = stage.despawn(spawned);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::Animation;
    use kinet_core::Group;

    #[test]
    fn empty_sequence_finishes_within_setup() {
        let mut stage = Stage::new();
        let root = stage.spawn(Group);
        stage.setup(root).unwrap();

        let seq = stage.spawn(Sequence::new(Vec::new()));
        stage.add_child(root, seq).unwrap();
        assert!(!stage.is_setup(seq));
        assert!(stage.children(root).is_empty());
    }

    #[test]
    fn cancellation_releases_pending_spawned_steps() {
        let mut stage = Stage::new();
        let root = stage.spawn(Group);
        stage.setup(root).unwrap();

        let first = stage.spawn(Animation::new(0.0, 1.0, 5).unwrap());
        let second = stage.spawn(Animation::new(0.0, 1.0, 5).unwrap());
        let seq = stage.spawn(Sequence::new(vec![first.into(), second.into()]));
        stage.add_child(root, seq).unwrap();
        // first is live, second is waiting its turn
        assert!(stage.is_setup(first));
        assert_eq!(stage.len(), 4);

        stage.teardown(seq).unwrap();
        // the cascade takes the current child, the cleanup takes the rest
        assert_eq!(stage.len(), 1);
    }
}
