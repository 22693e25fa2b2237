//! Conversion of PC-98 cylinder ranges to LBA ranges.
//!
//! PC-98 partition tables address partitions by cylinder, head, and sector. The geometry
//! of the disk is not recorded anywhere in the table, so a fixed geometry of 8 heads with
//! 17 sectors per track is assumed. This matches what conversion tools for real PC-98
//! media do and is never detected from the device.

/// Assumed number of heads.
pub const HEADS: u32 = 8;
/// Assumed number of sectors per track.
pub const SECTORS_PER_TRACK: u32 = 17;
/// Assumed number of sectors per cylinder.
pub const SECTORS_PER_CYLINDER: u32 = HEADS * SECTORS_PER_TRACK;

/// Range of sectors in LBA addressing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LbaRange {
    /// First sector.
    pub start: u32,
    /// Number of sectors.
    pub size: u32,
}

/// Compute the LBA range spanned by the cylinders `start..=end`.
///
/// Head and sector of the PC-98 addresses are ignored, partitions are assumed to be
/// cylinder-aligned. The result is not checked against the size of the device.
pub fn cylinders_to_lba(start: u16, end: u16) -> LbaRange {
    cylinders_to_lba_with(SECTORS_PER_CYLINDER, start, end)
}

/// Same as [`cylinders_to_lba`] with the given number of sectors per cylinder.
///
/// Arithmetic wraps around on overflow, e.g., an end cylinder before the start cylinder
/// yields a huge size rather than an error.
pub(crate) fn cylinders_to_lba_with(
    sectors_per_cylinder: u32,
    start: u16,
    end: u16,
) -> LbaRange {
    let cylinders = u32::from(end).wrapping_sub(u32::from(start)).wrapping_add(1);
    LbaRange {
        start: u32::from(start).wrapping_mul(sectors_per_cylinder),
        size: cylinders.wrapping_mul(sectors_per_cylinder),
    }
}
