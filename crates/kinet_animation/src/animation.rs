//! Frame-driven value interpolation
//!
//! An [`Animation`] is an ordinary entity behavior: attach it as a child of
//! a live tree and it starts; once its duration has elapsed it finishes
//! itself and detaches. All timing derives from the entity's own elapsed
//! frames — there is no wall clock anywhere.

use kinet_core::{Behavior, EntityId, Flow, Stage};
use thiserror::Error;

use crate::easing::Easing;

/// Animation construction errors
#[derive(Error, Debug)]
pub enum AnimationError {
    /// Duration must cover at least one frame; zero would divide by itself
    #[error("animation duration must be at least one frame")]
    ZeroDuration,
}

type ValueHook = Box<dyn FnMut(f32)>;
type UnitHook = Box<dyn FnMut()>;

/// A tween mapping this entity's elapsed frames through an easing curve
/// into an interpolated value stream.
///
/// Reporting contract, observable through the caller-supplied hooks:
/// - at setup, the initial value `from` lands before the first tick elapses
/// - each update reports the eased value for the current elapsed frame
/// - once `duration` frames have elapsed the terminal value `to` lands,
///   followed by the teardown hook, and nothing is reported afterwards
///
/// Hooks are caller code; if one panics, the panic propagates to the host's
/// call site untouched.
pub struct Animation {
    from: f32,
    to: f32,
    duration: u64,
    easing: Easing,
    setup_hook: Option<UnitHook>,
    update_hook: Option<ValueHook>,
    draw_hook: Option<ValueHook>,
    teardown_hook: Option<UnitHook>,
}

impl Animation {
    /// `duration` is a whole number of frames and must be positive.
    pub fn new(from: f32, to: f32, duration: u64) -> Result<Self, AnimationError> {
        if duration == 0 {
            return Err(AnimationError::ZeroDuration);
        }
        Ok(Self {
            from,
            to,
            duration,
            easing: Easing::default(),
            setup_hook: None,
            update_hook: None,
            draw_hook: None,
            teardown_hook: None,
        })
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn on_setup(mut self, hook: impl FnMut() + 'static) -> Self {
        self.setup_hook = Some(Box::new(hook));
        self
    }

    /// `hook` receives each interpolated value, including the initial and
    /// terminal samples.
    pub fn on_update(mut self, hook: impl FnMut(f32) + 'static) -> Self {
        self.update_hook = Some(Box::new(hook));
        self
    }

    pub fn on_draw(mut self, hook: impl FnMut(f32) + 'static) -> Self {
        self.draw_hook = Some(Box::new(hook));
        self
    }

    pub fn on_teardown(mut self, hook: impl FnMut() + 'static) -> Self {
        self.teardown_hook = Some(Box::new(hook));
        self
    }

    fn value_at(&self, elapsed: u64) -> f32 {
        let progress = (elapsed as f32 / self.duration as f32).clamp(0.0, 1.0);
        remap(self.easing.apply(progress), self.from, self.to)
    }

    fn report(&mut self, value: f32) {
        if let Some(hook) = self.update_hook.as_mut() {
            hook(value);
        }
    }
}

/// Linear remap of an eased fraction onto `[from, to]`. No sign assumption:
/// `from > to` yields a correctly decreasing sequence.
fn remap(t: f32, from: f32, to: f32) -> f32 {
    from + t * (to - from)
}

impl Behavior for Animation {
    fn name(&self) -> &str {
        "Animation"
    }

    fn detail(&self, id: EntityId, stage: &Stage) -> Option<String> {
        stage
            .elapsed(id)
            .map(|elapsed| format!("{}/{}f", elapsed.min(self.duration), self.duration))
    }

    fn on_setup(&mut self, _id: EntityId, _stage: &mut Stage) -> Flow {
        if let Some(hook) = self.setup_hook.as_mut() {
            hook();
        }
        // deterministic starting sample before the first tick elapses
        let from = self.from;
        self.report(from);
        Flow::Continue
    }

    fn on_update(&mut self, id: EntityId, stage: &mut Stage) -> Flow {
        let Some(elapsed) = stage.elapsed(id) else {
            return Flow::Continue;
        };
        if elapsed >= self.duration {
            // teardown reports the terminal value
            return Flow::Finish;
        }
        let value = self.value_at(elapsed);
        self.report(value);
        Flow::Continue
    }

    fn on_draw(&mut self, id: EntityId, stage: &mut Stage) -> Flow {
        if let Some(elapsed) = stage.elapsed(id) {
            let value = self.value_at(elapsed);
            if let Some(hook) = self.draw_hook.as_mut() {
                hook(value);
            }
        }
        Flow::Continue
    }

    fn on_teardown(&mut self, _id: EntityId, _stage: &mut Stage) {
        // terminal value lands before the caller's teardown hook
        let to = self.to;
        self.report(to);
        if let Some(hook) = self.teardown_hook.as_mut() {
            hook();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_duration_is_rejected() {
        assert!(matches!(
            Animation::new(0.0, 1.0, 0),
            Err(AnimationError::ZeroDuration)
        ));
    }

    #[test]
    fn remap_covers_both_directions() {
        assert_eq!(remap(0.0, 2.0, 10.0), 2.0);
        assert_eq!(remap(1.0, 2.0, 10.0), 10.0);
        assert_eq!(remap(0.5, 2.0, 10.0), 6.0);
        // decreasing range, no sign assumption
        assert_eq!(remap(0.25, 8.0, 0.0), 6.0);
    }

    #[test]
    fn value_endpoints_ignore_curve_shape() {
        let anim = Animation::new(3.0, -5.0, 10)
            .unwrap()
            .with_easing(Easing::EaseInOutElastic);
        assert_eq!(anim.value_at(0), 3.0);
        assert_eq!(anim.value_at(10), -5.0);
    }
}
