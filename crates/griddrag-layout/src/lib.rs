#![forbid(unsafe_code)]

//! Grid/block model and the pure solvers behind griddrag.
//!
//! - [`model`]: declarative [`Grid`] and [`Block`] records forming an ownership tree.
//! - [`tracks`]: the geometry mapper between pixel rectangles and [`CellSpan`]s.
//! - [`cascade`]: effective capabilities folded over nested option levels.
//! - [`collision`]: placement checks and minimal grid growth.
//! - [`board`]: id-addressed forest of root grids, nested areas and hit testing.
//!
//! Nothing here keeps gesture state; see `griddrag-runtime` for that.

pub mod board;
pub mod cascade;
pub mod collision;
mod error;
pub mod model;
pub mod span;
pub mod tracks;

pub use board::{Board, Lineage};
pub use cascade::{CapabilityDefaults, EffectiveConfig};
pub use collision::{Expansion, Placement, RejectReason, can_place};
pub use error::LayoutError;
pub use model::{Block, BlockOptions, CascadeOptions, Grid, GridMetrics, GridOptions, Overflow};
pub use span::{Axis, CellSpan, SpanError};
pub use tracks::{AxisTracks, Track, TrackLayout};
