//! Mapping of PC-98 system types to MBR partition types.
//!
//! There is no authoritative correspondence between both, the mapping has been derived by
//! comparing disks converted with existing tools. Types without a known MBR equivalent
//! are mapped to [`mbr_types::FREE`], which effectively hides the partition from systems
//! reading the MBR.

use tracing::info;

use crate::mbr::mbr_types;

/// PC-98 system types, without the active flag.
pub mod pc98_types {
    /// FAT12 partition.
    pub const FAT12: u8 = 0x01;
    /// PC-UX partition.
    pub const PC_UX: u8 = 0x04;
    /// N88-BASIC partition.
    pub const N88_BASIC: u8 = 0x06;
    /// FAT16 partition, first variant.
    pub const FAT16A: u8 = 0x11;
    /// FAT16 partition, second variant.
    pub const FAT16B: u8 = 0x21;
    /// IFS, HPFS, or NTFS partition.
    pub const NTFS: u8 = 0x31;
    /// 386BSD partition.
    pub const BSD: u8 = 0x44;
    /// FAT32 partition.
    pub const FAT32: u8 = 0x61;
    /// Linux partition.
    pub const LINUX: u8 = 0x62;
}

/// Human-readable name of a PC-98 system type.
pub fn type_name(system_type: u8) -> &'static str {
    match system_type {
        pc98_types::PC_UX => "PC-UX (rare). Please upload it to archive.org.",
        pc98_types::N88_BASIC => "N88-BASIC",
        pc98_types::FAT12 => "FAT12",
        pc98_types::FAT16A => "FAT16A",
        pc98_types::FAT16B => "FAT16B",
        pc98_types::NTFS => "IFS/HPFS/NTFS",
        pc98_types::BSD => "386BSD",
        pc98_types::FAT32 => "FAT32",
        pc98_types::LINUX => "Linux",
        _ => "?",
    }
}

/// Outcome of looking up the MBR equivalent of a PC-98 system type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeGuess {
    /// The system type has an MBR equivalent.
    Mapped(u8),
    /// The system type is known but has no MBR equivalent.
    NoEquivalent,
    /// The system type is known but no MBR type is guessed for it.
    ///
    /// This applies to 386BSD, although MBR types for BSD exist.
    Unguessed,
    /// The system type is unknown.
    Unknown,
}

impl TypeGuess {
    /// The MBR type to use, [`mbr_types::FREE`] if there is no equivalent.
    pub fn mbr_type(self) -> u8 {
        match self {
            TypeGuess::Mapped(ty) => ty,
            TypeGuess::NoEquivalent | TypeGuess::Unguessed | TypeGuess::Unknown => {
                mbr_types::FREE
            }
        }
    }
}

/// Look up the MBR equivalent of a PC-98 system type.
///
/// The active flag must already be stripped from the system type.
pub fn lookup(system_type: u8) -> TypeGuess {
    match system_type {
        pc98_types::PC_UX | pc98_types::N88_BASIC => TypeGuess::NoEquivalent,
        pc98_types::FAT12 => TypeGuess::Mapped(mbr_types::FAT12),
        pc98_types::FAT16A => TypeGuess::Mapped(mbr_types::FAT16_SMALL),
        pc98_types::FAT16B => TypeGuess::Mapped(mbr_types::FAT32_LBA),
        pc98_types::NTFS => TypeGuess::Mapped(mbr_types::NTFS),
        pc98_types::BSD => TypeGuess::Unguessed,
        pc98_types::FAT32 => TypeGuess::Mapped(mbr_types::FAT32_LBA),
        pc98_types::LINUX => TypeGuess::Mapped(mbr_types::LINUX),
        _ => TypeGuess::Unknown,
    }
}

/// Guess the MBR type of a PC-98 system type.
///
/// Never fails. If the system type has no MBR equivalent, the partition is marked as free
/// and a diagnostic is logged.
pub fn guess_mbr_type(system_type: u8) -> u8 {
    let guess = lookup(system_type);
    match guess {
        TypeGuess::NoEquivalent => {
            info!("This partition format has no equivalent in MBR. Marked as free (0x00).");
        }
        TypeGuess::Unknown => {
            info!(
                "This partition has an unknown identifier (0x{system_type:02x}). \
                Marked as free (0x00)."
            );
        }
        TypeGuess::Mapped(_) | TypeGuess::Unguessed => {}
    }
    guess.mbr_type()
}
