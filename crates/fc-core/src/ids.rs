//! Strongly typed identifier wrappers.
//!
//! Every entity lives in an arena `Vec` and is addressed by its index, so the
//! ids double as deterministic ordering keys: "ascending id" is the
//! tie-break order used by the selector and the allocator.

use std::fmt;

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub $inner);

        impl $name {
            /// Sentinel meaning "no valid ID".
            pub const INVALID: $name = $name(<$inner>::MAX);

            /// Cast to `usize` for direct use as a `Vec` index.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }

            #[inline(always)]
            pub fn is_valid(self) -> bool {
                self != Self::INVALID
            }
        }

        impl Default for $name {
            #[inline(always)]
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl From<$name> for usize {
            #[inline(always)]
            fn from(id: $name) -> usize {
                id.0 as usize
            }
        }

        impl TryFrom<usize> for $name {
            type Error = std::num::TryFromIntError;
            fn try_from(n: usize) -> Result<$name, Self::Error> {
                <$inner>::try_from(n).map($name)
            }
        }
    };
}

typed_id! {
    /// Index of a vehicle in the fleet.  Also the per-step processing order.
    pub struct VehicleId(u32);
}

typed_id! {
    /// Index of a shared, immutable vehicle type.
    pub struct VehicleTypeId(u16);
}

typed_id! {
    /// Index of a depot or public charging station.
    pub struct LocationId(u32);
}

typed_id! {
    pub struct ChargerId(u32);
}

typed_id! {
    /// Index of a single charging bay.  Allocation order is ascending `PointId`.
    pub struct PointId(u32);
}

typed_id! {
    pub struct PlugTypeId(u16);
}
