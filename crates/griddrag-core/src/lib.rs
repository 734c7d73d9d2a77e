#![forbid(unsafe_code)]

//! Core: pixel geometry, identifiers and the host input model.
//!
//! # Role in griddrag
//! `griddrag-core` is the input layer. It owns the pixel-space primitives
//! ([`geometry::Rect`], [`geometry::Point`]), the stable node identifiers
//! shared by every crate, and the normalized pointer/keyboard events hosts
//! feed into the engine.
//!
//! # How it fits in the system
//! `griddrag-layout` builds the grid/block model and the geometry, cascade
//! and collision solvers on top of these types; `griddrag-runtime` consumes
//! [`event::InputEvent`] values and drives the drag/resize/transfer state
//! machines.

pub mod event;
pub mod geometry;
pub mod id;

pub use event::{
    CancelReason, InputEvent, KeyCode, KeyEvent, Modifiers, PointerButton, PointerEvent,
    PointerPhase, PointerTarget, ResizeDirection,
};
pub use geometry::{Point, Rect};
pub use id::{BlockId, GridId, IdAllocator, IdError};
