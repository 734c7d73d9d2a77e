//! Configuration cascade.
//!
//! Effective capabilities are never stored. They are folded on demand over
//! the option levels from the outermost root grid down to the block being
//! asked about: every level may override a capability (nearest level wins),
//! `readonly` accumulates with OR, and an effective `readonly` vetoes every
//! capability regardless of what a nearer level declares.
//!
//! Expansion is not a cascading capability: each grid declares its own
//! `column_expandable`/`row_expandable`, and the root grid's `debug` flag may
//! switch expansion off for every nested grid.

use serde::{Deserialize, Serialize};

use crate::collision::Expansion;
use crate::model::{CascadeOptions, Grid, Overflow};

/// Values used when no level of the chain declares a capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapabilityDefaults {
    pub draggable: bool,
    pub resizable: bool,
    pub removable: bool,
    pub droppable_in: bool,
    pub droppable_out: bool,
    pub overflow: Overflow,
    pub drag_handler: Option<String>,
}

impl Default for CapabilityDefaults {
    fn default() -> Self {
        Self {
            draggable: true,
            resizable: true,
            removable: false,
            droppable_in: false,
            droppable_out: false,
            overflow: Overflow::Hidden,
            drag_handler: None,
        }
    }
}

/// Capability set after cascade resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveConfig {
    pub readonly: bool,
    pub draggable: bool,
    pub resizable: bool,
    pub removable: bool,
    pub droppable_in: bool,
    pub droppable_out: bool,
    pub overflow: Overflow,
    pub drag_handler: Option<String>,
}

impl EffectiveConfig {
    /// Starting point of every fold.
    #[must_use]
    pub fn from_defaults(defaults: &CapabilityDefaults) -> Self {
        Self {
            readonly: false,
            draggable: defaults.draggable,
            resizable: defaults.resizable,
            removable: defaults.removable,
            droppable_in: defaults.droppable_in,
            droppable_out: defaults.droppable_out,
            overflow: defaults.overflow,
            drag_handler: defaults.drag_handler.clone(),
        }
        .with_veto()
    }

    /// Layer one level of declared options on top of `self`.
    #[must_use]
    pub fn apply(&self, level: &CascadeOptions) -> Self {
        Self {
            readonly: self.readonly || level.readonly.unwrap_or(false),
            draggable: level.draggable.unwrap_or(self.draggable),
            resizable: level.resizable.unwrap_or(self.resizable),
            removable: level.removable.unwrap_or(self.removable),
            droppable_in: level.droppable_in.unwrap_or(self.droppable_in),
            droppable_out: level.droppable_out.unwrap_or(self.droppable_out),
            overflow: level.overflow.unwrap_or(self.overflow),
            drag_handler: level
                .drag_handler
                .clone()
                .or_else(|| self.drag_handler.clone()),
        }
        .with_veto()
    }

    fn with_veto(mut self) -> Self {
        if self.readonly {
            self.draggable = false;
            self.resizable = false;
            self.removable = false;
            self.droppable_in = false;
            self.droppable_out = false;
        }
        self
    }

    /// Whether a pointer on `handle` may start a drag. Without a configured
    /// selector the whole block is a handle.
    #[must_use]
    pub fn accepts_handle(&self, handle: Option<&str>) -> bool {
        match self.drag_handler.as_deref() {
            None => true,
            Some(selector) => handle == Some(selector),
        }
    }
}

/// Fold `chain` (outermost level first) over `defaults`.
#[must_use]
pub fn resolve<'a, I>(defaults: &CapabilityDefaults, chain: I) -> EffectiveConfig
where
    I: IntoIterator<Item = &'a CascadeOptions>,
{
    chain
        .into_iter()
        .fold(EffectiveConfig::from_defaults(defaults), |acc, level| {
            acc.apply(level)
        })
}

/// Expansion permitted on a grid at `depth` (0 for a root grid).
///
/// With `debug_couples` set, a root grid declaring `debug` disables expansion
/// in every grid nested below it; the root itself keeps its own flags.
#[must_use]
pub fn resolve_expansion<T>(
    grid: &Grid<T>,
    depth: usize,
    root_debug: bool,
    debug_couples: bool,
) -> Expansion {
    if depth > 0 && root_debug && debug_couples {
        return Expansion::NONE;
    }
    Expansion::new(grid.column_expandable, grid.row_expandable)
}
