#![forbid(unsafe_code)]

//! griddrag runtime
//!
//! Gesture state machines and the engine that drives a
//! [`griddrag_layout::Board`] from pointer and keyboard input.
//!
//! # Key Components
//!
//! - [`GridEngine`] - single entry point: feed [`griddrag_core::InputEvent`]s,
//!   receive [`EngineEvent`]s
//! - [`GestureMachine`] - per-pointer drag/resize lifecycle with a transition log
//! - [`TransferCoordinator`] - cross-grid moves and `before_drop` hooks
//! - [`EngineConfig`] - capability defaults and tunables, loadable from TOML/JSON
//!
//! # Logging
//! Structured `tracing` events are emitted under the `griddrag.drag`,
//! `griddrag.resize`, `griddrag.transfer` and `griddrag.engine` targets, inside
//! a `griddrag.gesture` debug span per pointer event. No subscriber is
//! installed by the library.

pub mod config;
pub mod drag;
pub mod engine;
mod error;
pub mod gesture;
pub mod notify;
pub mod resize;
pub mod transfer;

pub use config::{ConfigError, EngineConfig};
pub use engine::GridEngine;
pub use error::{EngineError, HookError};
pub use gesture::{
    ActiveGesture, GestureEffect, GestureKind, GestureLimits, GestureMachine, GesturePhase,
    GestureTransition, NoopReason,
};
pub use notify::{DragProgress, EngineEvent, ResizeProgress, TransferRejectReason};
pub use transfer::{BeforeDrop, HookFuture, TransferCoordinator, TransferRequest};
