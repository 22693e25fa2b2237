//! MBR partition entries and tables.

use std::io::{self, Read, Seek, SeekFrom, Write};

use thiserror::Error;
use tracing::debug;

use crate::{read_record, record_bytes, ReadError, TableFullError, TruncatedRecordError};

/// Byte offset of the MBR partition table.
pub const TABLE_OFFSET: u64 = 0x1BE;
/// Size of an MBR partition entry.
pub const ENTRY_SIZE: usize = 16;
/// Maximal number of entries of an MBR partition table.
pub const MAX_ENTRIES: usize = 4;
/// Byte offset of the boot signature.
pub const SIGNATURE_OFFSET: u64 = 0x1FE;
/// Boot signature marking a valid MBR.
pub const SIGNATURE: [u8; 2] = [0x55, 0xAA];

/// Bootable flag of the status byte.
pub const STATUS_BOOTABLE: u8 = 0x80;

/// MBR partition types.
pub mod mbr_types {
    /// Free partition entry.
    pub const FREE: u8 = 0x00;
    /// FAT12 partition.
    pub const FAT12: u8 = 0x01;
    /// FAT16 partition smaller than 32MiB.
    pub const FAT16_SMALL: u8 = 0x04;
    /// IFS, HPFS, or NTFS partition.
    pub const NTFS: u8 = 0x07;
    /// FAT32 partition with LBA addressing.
    pub const FAT32_LBA: u8 = 0x0C;
    /// FAT16 partition with LBA addressing.
    pub const FAT16_LBA: u8 = 0x0E;
    /// Linux swap partition.
    pub const LINUX_SWAP: u8 = 0x82;
    /// Linux filesystem.
    pub const LINUX: u8 = 0x83;
}

/// Human-readable name of an MBR partition type.
///
/// Only types that can reasonably appear on a converted PC-98 disk are known.
pub fn type_name(ty: u8) -> &'static str {
    match ty {
        mbr_types::NTFS => "IFS/HPFS/NTFS",
        mbr_types::FAT32_LBA => "FAT32/LBA",
        mbr_types::FAT16_LBA => "FAT16B/LBA",
        mbr_types::LINUX_SWAP => "Linux swap",
        mbr_types::LINUX => "Linux native",
        _ => "?",
    }
}

/// Packed cylinder, head, and sector address of an MBR partition entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ChsAddress {
    pub head: u8,
    /// Sector in bits 0–5 and the high bits of the cylinder in bits 6–7.
    pub sector_cylinder_high: u8,
    /// Low byte of the cylinder.
    pub cylinder_low: u8,
}

impl ChsAddress {
    /// Address with all fields at their maximum, forcing LBA addressing.
    pub const LBA_ONLY: Self = Self {
        head: 0xFE,
        sector_cylinder_high: 0xFF,
        cylinder_low: 0xFF,
    };

    /// Cylinder including the two high bits stored with the sector.
    pub fn cylinder(&self) -> u16 {
        (u16::from(self.sector_cylinder_high & 0xC0) << 2) | u16::from(self.cylinder_low)
    }

    /// Sector without the high bits of the cylinder.
    pub fn sector(&self) -> u8 {
        self.sector_cylinder_high & 0x3F
    }
}

/// Entry of an MBR partition table.
///
/// Decoding is purely mechanical: any 16 bytes decode into an entry and encode back into
/// the same 16 bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MbrEntry {
    /// Status byte with the bootable flag.
    pub status: u8,
    /// CHS address of the first sector.
    pub start: ChsAddress,
    /// Type of the partition.
    pub ty: u8,
    /// CHS address of the last sector.
    pub end: ChsAddress,
    /// LBA of the first sector.
    pub lba_start: u32,
    /// Size of the partition in sectors.
    pub lba_size: u32,
}

impl MbrEntry {
    /// Decode an entry from the first [`ENTRY_SIZE`] bytes of the given slice.
    pub fn decode(bytes: &[u8]) -> Result<Self, TruncatedRecordError> {
        let bytes = record_bytes::<ENTRY_SIZE>(bytes)?;
        Ok(Self {
            status: bytes[0],
            start: ChsAddress {
                head: bytes[1],
                sector_cylinder_high: bytes[2],
                cylinder_low: bytes[3],
            },
            ty: bytes[4],
            end: ChsAddress {
                head: bytes[5],
                sector_cylinder_high: bytes[6],
                cylinder_low: bytes[7],
            },
            lba_start: u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
            lba_size: u32::from_le_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]),
        })
    }

    /// Encode the entry.
    pub fn encode(&self) -> [u8; ENTRY_SIZE] {
        let mut bytes = [0; ENTRY_SIZE];
        bytes[0] = self.status;
        bytes[1] = self.start.head;
        bytes[2] = self.start.sector_cylinder_high;
        bytes[3] = self.start.cylinder_low;
        bytes[4] = self.ty;
        bytes[5] = self.end.head;
        bytes[6] = self.end.sector_cylinder_high;
        bytes[7] = self.end.cylinder_low;
        bytes[8..12].copy_from_slice(&self.lba_start.to_le_bytes());
        bytes[12..16].copy_from_slice(&self.lba_size.to_le_bytes());
        bytes
    }

    /// Indicates whether the entry is free.
    pub fn is_free(&self) -> bool {
        self.ty == mbr_types::FREE
    }

    /// Indicates whether the partition is bootable.
    pub fn is_bootable(&self) -> bool {
        self.status & STATUS_BOOTABLE != 0
    }

    /// LBA one past the last sector of the partition.
    pub fn lba_end(&self) -> u64 {
        u64::from(self.lba_start) + u64::from(self.lba_size)
    }
}

/// MBR partition table, the position of an entry determines its partition number.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MbrTable {
    entries: Vec<MbrEntry>,
}

impl MbrTable {
    /// Create an empty partition table.
    pub fn new() -> Self {
        Self {
            entries: Vec::with_capacity(MAX_ENTRIES),
        }
    }

    /// Create a partition table from the given entries.
    pub fn from_entries(
        entries: impl IntoIterator<Item = MbrEntry>,
    ) -> Result<Self, TableFullError> {
        let mut table = Self::new();
        for entry in entries {
            table.push(entry)?;
        }
        Ok(table)
    }

    /// Append an entry to the table.
    pub fn push(&mut self, entry: MbrEntry) -> Result<(), TableFullError> {
        if self.entries.len() >= MAX_ENTRIES {
            return Err(TableFullError {
                capacity: MAX_ENTRIES,
            });
        }
        self.entries.push(entry);
        Ok(())
    }

    /// Entries of the table.
    pub fn entries(&self) -> &[MbrEntry] {
        &self.entries
    }

    /// Entries up to the first free entry.
    ///
    /// These are the entries which [`write_table`] persists.
    pub fn active_entries(&self) -> impl '_ + Iterator<Item = &MbrEntry> {
        self.entries.iter().take_while(|entry| !entry.is_free())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Read the MBR partition table of a disk image or block device.
///
/// Entries are read until a free entry is found or [`MAX_ENTRIES`] entries have been
/// read. The boot signature is not checked.
pub fn read_table<R: Read + Seek>(mut source: R) -> Result<MbrTable, ReadError> {
    source.seek(SeekFrom::Start(TABLE_OFFSET))?;
    let mut table = MbrTable::new();
    let mut buffer = [0; ENTRY_SIZE];
    while table.len() < MAX_ENTRIES {
        let read = read_record(&mut source, &mut buffer)?;
        let entry = MbrEntry::decode(&buffer[..read])?;
        if entry.is_free() {
            break;
        }
        table.entries.push(entry);
    }
    debug!("found {} MBR partition entries", table.len());
    Ok(table)
}

/// Write the given partition table and the boot signature.
///
/// Entries are written consecutively starting at [`TABLE_OFFSET`] up to the first free
/// entry; a free entry hides all entries after it. Bytes of the remaining slots are left
/// untouched.
///
/// This modifies the target in place without a backup. If writing fails midway, the bytes
/// which have already been written stay written.
pub fn write_table<W: Write + Seek>(mut sink: W, table: &MbrTable) -> Result<(), WriteError> {
    sink.seek(SeekFrom::Start(TABLE_OFFSET))
        .map_err(|source| WriteError::Partition { index: 0, source })?;
    for (index, entry) in table.active_entries().enumerate() {
        sink.write_all(&entry.encode())
            .map_err(|source| WriteError::Partition { index, source })?;
        debug!(
            "wrote MBR partition entry {} at 0x{:X}",
            index + 1,
            TABLE_OFFSET + (index * ENTRY_SIZE) as u64
        );
    }
    sink.seek(SeekFrom::Start(SIGNATURE_OFFSET))
        .and_then(|_| sink.write_all(&SIGNATURE))
        .and_then(|_| sink.flush())
        .map_err(|source| WriteError::Signature { source })?;
    debug!("wrote MBR signature at 0x{SIGNATURE_OFFSET:X}");
    Ok(())
}

/// Stage at which writing a partition table failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteStage {
    /// Writing the partition entries.
    Partition,
    /// Writing the boot signature.
    Signature,
}

/// Error writing a partition table.
#[derive(Debug, Error)]
pub enum WriteError {
    /// Failed to write a partition entry.
    #[error("failed to write partition entry {}", .index + 1)]
    Partition {
        /// Index of the entry in the table.
        index: usize,
        #[source]
        source: io::Error,
    },
    /// Failed to write the boot signature.
    #[error("failed to write MBR signature")]
    Signature {
        #[source]
        source: io::Error,
    },
}

impl WriteError {
    /// Stage at which writing failed.
    pub fn stage(&self) -> WriteStage {
        match self {
            WriteError::Partition { .. } => WriteStage::Partition,
            WriteError::Signature { .. } => WriteStage::Signature,
        }
    }
}
