//! Integration tests for the entity tree + animation system
//!
//! These tests verify that:
//! - Animations report deterministic frame-relative samples and finish
//!   themselves exactly when their duration elapses
//! - Sequence attaches one child at a time, resolves factories lazily, and
//!   finishes only after its last child
//! - Parallel attaches everything up front and finishes in the same update
//!   call in which its child set empties
//! - Combinators nest and are driven by a plain host loop with no
//!   special-casing

use std::sync::{Arc, Mutex};

use kinet_animation::{Animation, Easing, Parallel, Resolvable, Sequence};
use kinet_core::{EventKind, Group, Stage};

fn tick(stage: &mut Stage, root: kinet_core::EntityId) {
    stage.advance_frame();
    stage.update(root);
}

/// Record the frame at which an entity tears down.
fn watch_teardown(stage: &mut Stage, id: kinet_core::EntityId) -> Arc<Mutex<Option<u64>>> {
    let torn = Arc::new(Mutex::new(None));
    let slot = torn.clone();
    stage.on(id, EventKind::Teardown, move |stage, _| {
        *slot.lock().unwrap() = Some(stage.frame());
    });
    torn
}

#[test]
fn animation_samples_and_self_teardown() {
    let mut stage = Stage::new();
    let root = stage.spawn(Group);
    stage.setup(root).unwrap();

    let samples = Arc::new(Mutex::new(Vec::new()));
    let sink = samples.clone();
    let anim = stage.spawn(
        Animation::new(0.0, 1.0, 3)
            .unwrap()
            .on_update(move |value| sink.lock().unwrap().push(value)),
    );
    stage.add_child(root, anim).unwrap();
    let torn = watch_teardown(&mut stage, anim);

    for _ in 0..4 {
        tick(&mut stage, root);
    }

    let samples = samples.lock().unwrap();
    // initial sample at setup, one per surviving tick, terminal at teardown
    assert_eq!(samples.len(), 4);
    assert_eq!(samples[0], 0.0);
    assert!((samples[1] - 1.0 / 3.0).abs() < 1e-6);
    assert!((samples[2] - 2.0 / 3.0).abs() < 1e-6);
    assert_eq!(samples[3], 1.0);

    // torn down on the update call where elapsed first reached the duration
    assert_eq!(*torn.lock().unwrap(), Some(3));
    assert!(!stage.is_setup(anim));
    assert!(stage.children(root).is_empty());
}

#[test]
fn decreasing_animation_needs_no_sign_assumption() {
    let mut stage = Stage::new();
    let root = stage.spawn(Group);
    stage.setup(root).unwrap();

    let samples = Arc::new(Mutex::new(Vec::new()));
    let sink = samples.clone();
    let anim = stage.spawn(
        Animation::new(10.0, 2.0, 4)
            .unwrap()
            .on_update(move |value| sink.lock().unwrap().push(value)),
    );
    stage.add_child(root, anim).unwrap();

    for _ in 0..4 {
        tick(&mut stage, root);
    }

    let samples = samples.lock().unwrap();
    assert_eq!(samples.first(), Some(&10.0));
    assert_eq!(samples.last(), Some(&2.0));
    assert!(samples.windows(2).all(|pair| pair[1] < pair[0]));
}

#[test]
fn eased_animation_still_hits_exact_bounds() {
    let mut stage = Stage::new();
    let root = stage.spawn(Group);
    stage.setup(root).unwrap();

    let samples = Arc::new(Mutex::new(Vec::new()));
    let sink = samples.clone();
    let anim = stage.spawn(
        Animation::new(0.0, 100.0, 5)
            .unwrap()
            .with_easing(Easing::EaseInOutCubic)
            .on_update(move |value| sink.lock().unwrap().push(value)),
    );
    stage.add_child(root, anim).unwrap();

    for _ in 0..5 {
        tick(&mut stage, root);
    }

    let samples = samples.lock().unwrap();
    assert_eq!(samples.first(), Some(&0.0));
    assert_eq!(samples.last(), Some(&100.0));
    // easing reshapes the interior only
    assert!((samples[1] - 100.0 * Easing::EaseInOutCubic.apply(0.2)).abs() < 1e-4);
}

#[test]
fn draw_reports_without_touching_lifecycle() {
    let mut stage = Stage::new();
    let root = stage.spawn(Group);
    stage.setup(root).unwrap();

    let drawn = Arc::new(Mutex::new(Vec::new()));
    let sink = drawn.clone();
    let anim = stage.spawn(
        Animation::new(0.0, 1.0, 2)
            .unwrap()
            .on_draw(move |value| sink.lock().unwrap().push(value)),
    );
    stage.add_child(root, anim).unwrap();

    stage.advance_frame();
    stage.update(root);
    stage.draw(root);
    assert_eq!(drawn.lock().unwrap().as_slice(), [0.5]);
    assert!(stage.is_setup(anim));
}

#[test]
fn sequence_runs_children_one_at_a_time() {
    let mut stage = Stage::new();
    let root = stage.spawn(Group);
    stage.setup(root).unwrap();

    let created = Arc::new(Mutex::new(Vec::new()));
    let step = |created: &Arc<Mutex<Vec<u64>>>| {
        let created = created.clone();
        Resolvable::with(move |stage| {
            created.lock().unwrap().push(stage.frame());
            stage.spawn(Animation::new(0.0, 1.0, 3).unwrap())
        })
    };

    let seq = stage.spawn(Sequence::new(vec![step(&created), step(&created)]));
    stage.add_child(root, seq).unwrap();
    let torn = watch_teardown(&mut stage, seq);

    for _ in 0..6 {
        tick(&mut stage, root);
        // never more than one live child
        assert!(stage.children(seq).len() <= 1);
    }

    // the second factory ran only once the first child completed
    assert_eq!(created.lock().unwrap().as_slice(), [0, 3]);
    assert_eq!(*torn.lock().unwrap(), Some(6));
    assert_eq!(stage.len(), 1);
}

#[test]
fn parallel_finishes_when_all_children_have() {
    let mut stage = Stage::new();
    let root = stage.spawn(Group);
    stage.setup(root).unwrap();

    let short = stage.spawn(Animation::new(0.0, 1.0, 2).unwrap());
    let long = stage.spawn(Animation::new(0.0, 1.0, 4).unwrap());
    let par = stage.spawn(Parallel::new(vec![short.into(), long.into()]));
    stage.add_child(root, par).unwrap();

    // everything attached and live immediately
    assert_eq!(stage.children(par).len(), 2);
    assert!(stage.is_setup(short));
    assert!(stage.is_setup(long));

    let short_torn = watch_teardown(&mut stage, short);
    let long_torn = watch_teardown(&mut stage, long);
    let par_torn = watch_teardown(&mut stage, par);

    for _ in 0..4 {
        tick(&mut stage, root);
    }

    assert_eq!(*short_torn.lock().unwrap(), Some(2));
    assert_eq!(*long_torn.lock().unwrap(), Some(4));
    // same update call as its last child, not a frame later
    assert_eq!(*par_torn.lock().unwrap(), Some(4));
    assert_eq!(stage.len(), 1);
}

#[test]
fn combinators_nest() {
    let mut stage = Stage::new();
    let root = stage.spawn(Group);
    stage.setup(root).unwrap();

    let inner = Sequence::new(vec![
        Resolvable::with(|stage| stage.spawn(Animation::new(0.0, 1.0, 2).unwrap())),
        Resolvable::with(|stage| stage.spawn(Animation::new(1.0, 0.0, 2).unwrap())),
    ]);
    let lone = stage.spawn(Animation::new(0.0, 1.0, 3).unwrap());
    let seq = stage.spawn(inner);
    let par = stage.spawn(Parallel::new(vec![seq.into(), lone.into()]));
    stage.add_child(root, par).unwrap();
    let par_torn = watch_teardown(&mut stage, par);

    for _ in 0..4 {
        tick(&mut stage, root);
    }

    // sequence: 2 + 2 frames; lone animation: 3 frames; parallel: max of both
    assert_eq!(*par_torn.lock().unwrap(), Some(4));
    assert_eq!(stage.len(), 1);
}

#[test]
fn cancelling_a_subtree_is_a_plain_teardown() {
    let mut stage = Stage::new();
    let root = stage.spawn(Group);
    stage.setup(root).unwrap();

    let par = stage.spawn(Parallel::new(vec![
        Resolvable::with(|stage| stage.spawn(Animation::new(0.0, 1.0, 100).unwrap())),
        Resolvable::with(|stage| stage.spawn(Animation::new(0.0, 1.0, 100).unwrap())),
    ]));
    stage.add_child(root, par).unwrap();
    assert_eq!(stage.len(), 4);

    tick(&mut stage, root);
    stage.teardown(par).unwrap();
    assert_eq!(stage.len(), 1);
    assert!(stage.children(root).is_empty());
}
