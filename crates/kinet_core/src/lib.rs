//! Kinet Core Runtime
//!
//! This crate provides the foundational primitives for the Kinet entity
//! framework:
//!
//! - **Entity tree**: an arena-backed hierarchy with parent/child ownership
//! - **Lifecycle state machine**: `Unset -> Setup -> TornDown`, never reused
//! - **Event transmission**: named events propagated depth-first over a
//!   point-in-time child snapshot, with per-event stop flags
//! - **Frame clock**: the single monotonic counter driving relative time
//!
//! # Example
//!
//! ```rust
//! use kinet_core::{Group, Stage};
//!
//! let mut stage = Stage::new();
//! let root = stage.spawn(Group);
//! let child = stage.spawn(Group);
//! stage.add_child(root, child).unwrap();
//!
//! stage.setup(root).unwrap();
//! assert!(stage.is_setup(child));
//!
//! // one host tick
//! stage.advance_frame();
//! stage.update(root);
//! ```

pub mod behavior;
pub mod clock;
pub mod error;
pub mod events;
pub mod stage;
pub mod style;

pub use behavior::{Behavior, Flow, Group};
pub use clock::FrameClock;
pub use error::{Result, StageError};
pub use events::{EventKind, Listener};
pub use stage::{EntityId, Lifecycle, Stage};
pub use style::{Color, Fill, Stroke, Style, TextAlign, TextStyle};
