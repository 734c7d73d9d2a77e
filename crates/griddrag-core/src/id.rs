#![forbid(unsafe_code)]

//! Stable identifiers for grids and blocks.
//!
//! Both identifiers are non-zero `u64` newtypes; `0` is reserved so that a
//! zeroed record never aliases a real node.

use std::fmt;

/// Error returned when constructing or advancing an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdError {
    /// Raw value `0` is reserved.
    Zero,
    /// The allocator ran past `u64::MAX`.
    Overflow { current: u64 },
}

impl fmt::Display for IdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Zero => write!(f, "identifier must be non-zero"),
            Self::Overflow { current } => write!(f, "identifier overflow after {current}"),
        }
    }
}

impl std::error::Error for IdError {}

macro_rules! node_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[cfg_attr(feature = "serde", serde(transparent))]
        pub struct $name(u64);

        impl $name {
            /// Lowest valid ID.
            pub const MIN: Self = Self(1);

            /// Create a new ID, rejecting 0.
            pub const fn new(raw: u64) -> Result<Self, IdError> {
                if raw == 0 {
                    return Err(IdError::Zero);
                }
                Ok(Self(raw))
            }

            /// Get the raw numeric value.
            #[must_use]
            pub const fn get(self) -> u64 {
                self.0
            }

            /// Return the next ID, or an error on overflow.
            pub const fn checked_next(self) -> Result<Self, IdError> {
                match self.0.checked_add(1) {
                    Some(next) => Ok(Self(next)),
                    None => Err(IdError::Overflow { current: self.0 }),
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::MIN
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }
    };
}

node_id!(
    /// Identifier of one grid instance (root or nested).
    GridId,
    "grid"
);

node_id!(
    /// Identifier of one block, unique across every grid of a board.
    BlockId,
    "block"
);

/// Deterministic allocator handing out monotonically increasing IDs.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    /// Start allocating at `next` (clamped to 1).
    #[must_use]
    pub const fn starting_at(next: u64) -> Self {
        Self {
            next: if next == 0 { 1 } else { next },
        }
    }

    /// Peek at the next raw value without consuming.
    #[must_use]
    pub const fn peek(&self) -> u64 {
        self.next
    }

    /// Ensure future allocations are strictly greater than `seen`.
    pub fn observe(&mut self, seen: u64) {
        if seen >= self.next {
            self.next = seen.saturating_add(1);
        }
    }

    fn bump(&mut self) -> Result<u64, IdError> {
        let current = self.next;
        self.next = current
            .checked_add(1)
            .ok_or(IdError::Overflow { current })?;
        Ok(current)
    }

    /// Allocate the next grid ID.
    pub fn grid(&mut self) -> Result<GridId, IdError> {
        self.bump().and_then(GridId::new)
    }

    /// Allocate the next block ID.
    pub fn block(&mut self) -> Result<BlockId, IdError> {
        self.bump().and_then(BlockId::new)
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::starting_at(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn zero_is_rejected() {
        assert_eq!(GridId::new(0), Err(IdError::Zero));
        assert_eq!(BlockId::new(0), Err(IdError::Zero));
    }

    #[test]
    fn checked_next_overflows() {
        let max = BlockId::new(u64::MAX).expect("non-zero");
        assert_eq!(
            max.checked_next(),
            Err(IdError::Overflow { current: u64::MAX })
        );
    }

    #[test]
    fn display_is_prefixed() {
        assert_eq!(GridId::new(3).expect("non-zero").to_string(), "grid#3");
        assert_eq!(BlockId::new(9).expect("non-zero").to_string(), "block#9");
    }

    #[test]
    fn observe_skips_existing_ids() {
        let mut ids = IdAllocator::default();
        ids.observe(41);
        assert_eq!(ids.block().expect("allocate").get(), 42);
        ids.observe(10);
        assert_eq!(ids.grid().expect("allocate").get(), 43);
    }

    proptest! {
        #[test]
        fn allocator_is_monotonic(start in 0u64..1_000_000, count in 1usize..64) {
            let mut ids = IdAllocator::starting_at(start);
            let mut prev = 0u64;
            for i in 0..count {
                let raw = if i % 2 == 0 {
                    ids.grid().expect("allocate").get()
                } else {
                    ids.block().expect("allocate").get()
                };
                prop_assert!(raw > prev);
                prev = raw;
            }
        }
    }
}
