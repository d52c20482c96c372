//! Kinet Animation System
//!
//! Frame-driven tweens and composition combinators for entity trees.
//!
//! # Features
//!
//! - **Easing catalog**: the standard named curves plus pluggable custom
//!   functions
//! - **Animation**: interpolates a value stream from an entity's own
//!   elapsed frames, finishing itself on completion
//! - **Sequence / Parallel**: orchestrate child entities one at a time or
//!   all at once, as ordinary behaviors the host never special-cases

pub mod animation;
pub mod easing;
pub mod parallel;
pub mod resolvable;
pub mod sequence;

pub use animation::{Animation, AnimationError};
pub use easing::Easing;
pub use parallel::Parallel;
pub use resolvable::Resolvable;
pub use sequence::Sequence;
