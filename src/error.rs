use thiserror::Error;

/// A refused occupancy transition. Both cases are recovered locally by the
/// worker that hit them, neither is ever fatal.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OccupancyError {
    #[error("all {capacity} slots are taken")]
    Full { capacity: u8 },
    #[error("no slot is taken")]
    Empty,
}
