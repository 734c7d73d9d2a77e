#![forbid(unsafe_code)]

//! Canonical host input events.
//!
//! Hosts translate their native pointer/keyboard callbacks into these types
//! and feed them to the engine. The model is intentionally small: one pointer
//! position per event, an optional hit target resolved by the host (which
//! knows the element tree), and a phase.
//!
//! # Design Notes
//!
//! - The host performs element hit testing. A pointer-down reports which block
//!   was pressed and, when the press landed on an element matching a drag
//!   handle selector, which selector matched.
//! - Move/up events carry [`PointerTarget::Surface`]; the engine tracks the
//!   gesture by pointer id, not by target.
//! - `Modifiers` use bitflags for easy combination.

use bitflags::bitflags;
use std::fmt;

use crate::geometry::Point;
use crate::id::BlockId;

/// Canonical input event consumed by the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// A pointer (mouse, pen, single touch) event.
    Pointer(PointerEvent),
    /// A keyboard event.
    Key(KeyEvent),
    /// The host window lost focus; every active gesture is cancelled.
    Blur,
}

/// Lifecycle phase of a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PointerPhase {
    Down,
    Move,
    Up,
    /// The platform aborted the pointer stream (capture lost, pointercancel).
    Cancel(CancelReason),
}

/// Why an in-flight gesture was cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum CancelReason {
    EscapeKey,
    PointerCancel,
    CaptureLost,
    FocusLost,
    Programmatic,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::EscapeKey => "escape key",
            Self::PointerCancel => "pointer cancel",
            Self::CaptureLost => "pointer capture lost",
            Self::FocusLost => "focus lost",
            Self::Programmatic => "programmatic",
        };
        f.write_str(label)
    }
}

/// Pointer button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PointerButton {
    #[default]
    Primary,
    Secondary,
    Middle,
}

bitflags! {
    /// Modifier keys held during an event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct Modifiers: u8 {
        /// No modifiers.
        const NONE  = 0b0000;
        /// Shift key.
        const SHIFT = 0b0001;
        /// Alt/Option key.
        const ALT   = 0b0010;
        /// Control key.
        const CTRL  = 0b0100;
        /// Super/Meta/Command key.
        const SUPER = 0b1000;
    }
}

impl Default for Modifiers {
    fn default() -> Self {
        Self::NONE
    }
}

/// Compass direction of a resize handle.
///
/// The direction names the edges that follow the pointer: `E` moves
/// `column_end`, `NW` moves `row_start` and `column_start`, and so on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ResizeDirection {
    N,
    S,
    E,
    W,
    NE,
    NW,
    SE,
    SW,
}

impl ResizeDirection {
    /// Every direction, in handle paint order.
    pub const ALL: [Self; 8] = [
        Self::N,
        Self::S,
        Self::E,
        Self::W,
        Self::NE,
        Self::NW,
        Self::SE,
        Self::SW,
    ];

    /// Horizontal edge driven by this direction: `Some(true)` for the end
    /// (east) edge, `Some(false)` for the start (west) edge.
    #[must_use]
    pub const fn horizontal_edge(self) -> Option<bool> {
        match self {
            Self::W | Self::NW | Self::SW => Some(false),
            Self::E | Self::NE | Self::SE => Some(true),
            Self::N | Self::S => None,
        }
    }

    /// Vertical edge driven by this direction: `Some(true)` for the end
    /// (south) edge, `Some(false)` for the start (north) edge.
    #[must_use]
    pub const fn vertical_edge(self) -> Option<bool> {
        match self {
            Self::N | Self::NE | Self::NW => Some(false),
            Self::S | Self::SE | Self::SW => Some(true),
            Self::E | Self::W => None,
        }
    }

    /// CSS cursor shown while the handle is dragged.
    #[must_use]
    pub const fn cursor(self) -> &'static str {
        match self {
            Self::N => "n-resize",
            Self::S => "s-resize",
            Self::E => "e-resize",
            Self::W => "w-resize",
            Self::NE => "ne-resize",
            Self::NW => "nw-resize",
            Self::SE => "se-resize",
            Self::SW => "sw-resize",
        }
    }

    /// Lower-case compass label (`"ne"`), as hosts tag handle elements.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::N => "n",
            Self::S => "s",
            Self::E => "e",
            Self::W => "w",
            Self::NE => "ne",
            Self::NW => "nw",
            Self::SE => "se",
            Self::SW => "sw",
        }
    }
}

impl fmt::Display for ResizeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ResizeDirection {
    type Err = UnknownDirection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|direction| direction.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownDirection(s.to_string()))
    }
}

/// A handle label that is not one of the eight compass directions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownDirection(pub String);

impl fmt::Display for UnknownDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown resize direction {:?}", self.0)
    }
}

impl std::error::Error for UnknownDirection {}

/// Element the host resolved under the pointer on pointer-down.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PointerTarget {
    /// Somewhere inside a block. `handle` names the drag-handle selector the
    /// pressed element matched, if any.
    Block {
        block: BlockId,
        handle: Option<String>,
    },
    /// One of the eight resize handles of a block.
    ResizeHandle {
        block: BlockId,
        direction: ResizeDirection,
    },
    /// Anything else (grid background, outside every grid).
    #[default]
    Surface,
}

impl PointerTarget {
    /// Block addressed by this target, if any.
    #[must_use]
    pub fn block(&self) -> Option<BlockId> {
        match self {
            Self::Block { block, .. } | Self::ResizeHandle { block, .. } => Some(*block),
            Self::Surface => None,
        }
    }
}

/// One pointer sample.
#[derive(Debug, Clone, PartialEq)]
pub struct PointerEvent {
    pub pointer_id: u32,
    pub phase: PointerPhase,
    pub position: Point,
    pub button: PointerButton,
    pub modifiers: Modifiers,
    pub target: PointerTarget,
}

impl PointerEvent {
    /// Build an event with default button/modifiers.
    #[must_use]
    pub fn new(pointer_id: u32, phase: PointerPhase, position: Point) -> Self {
        Self {
            pointer_id,
            phase,
            position,
            button: PointerButton::Primary,
            modifiers: Modifiers::NONE,
            target: PointerTarget::Surface,
        }
    }

    /// Pointer-down on a target.
    #[must_use]
    pub fn down(pointer_id: u32, position: Point, target: PointerTarget) -> Self {
        Self::new(pointer_id, PointerPhase::Down, position).with_target(target)
    }

    /// Pointer-move.
    #[must_use]
    pub fn moved(pointer_id: u32, position: Point) -> Self {
        Self::new(pointer_id, PointerPhase::Move, position)
    }

    /// Pointer-up.
    #[must_use]
    pub fn up(pointer_id: u32, position: Point) -> Self {
        Self::new(pointer_id, PointerPhase::Up, position)
    }

    /// Platform cancellation of the pointer stream.
    #[must_use]
    pub fn cancel(pointer_id: u32, position: Point, reason: CancelReason) -> Self {
        Self::new(pointer_id, PointerPhase::Cancel(reason), position)
    }

    /// Set the hit target.
    #[must_use]
    pub fn with_target(mut self, target: PointerTarget) -> Self {
        self.target = target;
        self
    }

    /// Set the button.
    #[must_use]
    pub fn with_button(mut self, button: PointerButton) -> Self {
        self.button = button;
        self
    }

    /// Set the modifiers.
    #[must_use]
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

/// Keys the engine reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCode {
    Escape,
    Other,
}

/// A keyboard event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    /// Create a key event without modifiers.
    #[must_use]
    pub const fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifiers::NONE,
        }
    }
}
