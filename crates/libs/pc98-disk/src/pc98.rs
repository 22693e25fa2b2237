//! PC-98 partition entries and tables.

use std::io::{Read, Seek, SeekFrom};

use tracing::debug;

use crate::{read_record, record_bytes, ReadError, TableFullError, TruncatedRecordError};

/// Byte offset of the PC-98 partition table.
pub const TABLE_OFFSET: u64 = 0x200;
/// Size of a PC-98 partition entry.
pub const ENTRY_SIZE: usize = 32;
/// Maximal number of entries of a PC-98 partition table.
pub const MAX_ENTRIES: usize = 17;
/// Size of the name field of a PC-98 partition entry.
pub const NAME_SIZE: usize = 16;

/// Bootable flag of the boot mode byte.
pub const MID_BOOTABLE: u8 = 0x80;
/// Mask of the boot mode code.
pub const MID_MASK: u8 = 0x7F;
/// Active flag of the system byte.
pub const SID_ACTIVE: u8 = 0x80;
/// Mask of the system type code.
pub const SID_MASK: u8 = 0x7F;

/// Cylinder, head, and sector address as stored in a PC-98 partition entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Pc98Chs {
    pub sector: u8,
    pub head: u8,
    pub cylinder: u16,
}

impl Pc98Chs {
    fn decode(bytes: &[u8; 4]) -> Self {
        Self {
            sector: bytes[0],
            head: bytes[1],
            cylinder: u16::from_le_bytes([bytes[2], bytes[3]]),
        }
    }

    fn encode(&self) -> [u8; 4] {
        let [cylinder_low, cylinder_high] = self.cylinder.to_le_bytes();
        [self.sector, self.head, cylinder_low, cylinder_high]
    }
}

/// Entry of a PC-98 partition table.
///
/// Decoding is purely mechanical: any 32 bytes decode into an entry and encode back into
/// the same 32 bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pc98Entry {
    /// Boot mode byte, bootable flag and mode code.
    pub mid: u8,
    /// System byte, active flag and system type code.
    pub sid: u8,
    /// Reserved bytes.
    pub reserved: [u8; 2],
    /// Address of the initial program loader, usually the start of the partition.
    pub ipl: Pc98Chs,
    /// First sector of the partition.
    pub start: Pc98Chs,
    /// Last sector of the partition.
    pub end: Pc98Chs,
    /// Name of the partition, neither guaranteed to be NUL-terminated nor printable.
    pub name: [u8; NAME_SIZE],
}

impl Pc98Entry {
    /// Decode an entry from the first [`ENTRY_SIZE`] bytes of the given slice.
    pub fn decode(bytes: &[u8]) -> Result<Self, TruncatedRecordError> {
        let bytes = record_bytes::<ENTRY_SIZE>(bytes)?;
        let chs = |offset: usize| Pc98Chs::decode(&[
            bytes[offset],
            bytes[offset + 1],
            bytes[offset + 2],
            bytes[offset + 3],
        ]);
        let mut name = [0; NAME_SIZE];
        name.copy_from_slice(&bytes[16..ENTRY_SIZE]);
        Ok(Self {
            mid: bytes[0],
            sid: bytes[1],
            reserved: [bytes[2], bytes[3]],
            ipl: chs(4),
            start: chs(8),
            end: chs(12),
            name,
        })
    }

    /// Encode the entry.
    pub fn encode(&self) -> [u8; ENTRY_SIZE] {
        let mut bytes = [0; ENTRY_SIZE];
        bytes[0] = self.mid;
        bytes[1] = self.sid;
        bytes[2..4].copy_from_slice(&self.reserved);
        bytes[4..8].copy_from_slice(&self.ipl.encode());
        bytes[8..12].copy_from_slice(&self.start.encode());
        bytes[12..16].copy_from_slice(&self.end.encode());
        bytes[16..].copy_from_slice(&self.name);
        bytes
    }

    /// Indicates whether the entry marks the end of the table.
    ///
    /// An entry starting at cylinder zero terminates the table. A real partition starting
    /// at cylinder zero is thus indistinguishable from the end of the table and will be
    /// ignored. PC-98 disks reserve cylinder zero for the boot code and the partition
    /// table, so this should not happen in practice.
    pub fn is_terminator(&self) -> bool {
        self.start.cylinder == 0
    }

    /// Indicates whether the partition is bootable.
    pub fn is_bootable(&self) -> bool {
        self.mid & MID_BOOTABLE != 0
    }

    /// Boot mode code without the bootable flag.
    pub fn mode(&self) -> u8 {
        self.mid & MID_MASK
    }

    /// Indicates whether the partition is active.
    pub fn is_active(&self) -> bool {
        self.sid & SID_ACTIVE != 0
    }

    /// System type code without the active flag.
    pub fn system_type(&self) -> u8 {
        self.sid & SID_MASK
    }

    /// Name of the partition with every byte interpreted as a character.
    ///
    /// Bytes outside of the printable ASCII range are replaced with `.`.
    pub fn name_lossy(&self) -> String {
        self.name
            .iter()
            .map(|byte| match byte {
                0x20..=0x7E => *byte as char,
                _ => '.',
            })
            .collect()
    }
}

/// PC-98 partition table without the terminating entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pc98Table {
    entries: Vec<Pc98Entry>,
}

impl Pc98Table {
    /// Create an empty partition table.
    pub fn new() -> Self {
        Self {
            entries: Vec::with_capacity(MAX_ENTRIES),
        }
    }

    /// Create a partition table from the given entries.
    pub fn from_entries(
        entries: impl IntoIterator<Item = Pc98Entry>,
    ) -> Result<Self, TableFullError> {
        let mut table = Self::new();
        for entry in entries {
            table.push(entry)?;
        }
        Ok(table)
    }

    /// Append an entry to the table.
    pub fn push(&mut self, entry: Pc98Entry) -> Result<(), TableFullError> {
        if self.entries.len() >= MAX_ENTRIES {
            return Err(TableFullError {
                capacity: MAX_ENTRIES,
            });
        }
        self.entries.push(entry);
        Ok(())
    }

    /// Entries of the table.
    pub fn entries(&self) -> &[Pc98Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Read the PC-98 partition table of a disk image or block device.
///
/// Entries are read until an entry starts at cylinder zero (see
/// [`Pc98Entry::is_terminator`]) or [`MAX_ENTRIES`] entries have been read. The
/// terminating entry is not part of the result.
pub fn read_table<R: Read + Seek>(mut source: R) -> Result<Pc98Table, ReadError> {
    source.seek(SeekFrom::Start(TABLE_OFFSET))?;
    let mut table = Pc98Table::new();
    let mut buffer = [0; ENTRY_SIZE];
    while table.len() < MAX_ENTRIES {
        let read = read_record(&mut source, &mut buffer)?;
        let entry = Pc98Entry::decode(&buffer[..read])?;
        if entry.is_terminator() {
            break;
        }
        table.entries.push(entry);
    }
    debug!("found {} PC-98 partition entries", table.len());
    Ok(table)
}

#[cfg(test)]
pub(crate) mod tests {
    use std::io::Cursor;

    use super::*;

    /// Build an entry spanning the given cylinders.
    pub(crate) fn entry(sid: u8, start: u16, end: u16) -> Pc98Entry {
        Pc98Entry {
            mid: 0xA0,
            sid,
            reserved: [0; 2],
            ipl: Pc98Chs {
                sector: 0,
                head: 0,
                cylinder: start,
            },
            start: Pc98Chs {
                sector: 0,
                head: 0,
                cylinder: start,
            },
            end: Pc98Chs {
                sector: 16,
                head: 7,
                cylinder: end,
            },
            name: *b"MS-DOS 6.20     ",
        }
    }

    /// Build an image with the given raw PC-98 table bytes.
    pub(crate) fn image(entries: &[Pc98Entry]) -> Vec<u8> {
        let mut image = vec![0; 0x200];
        for entry in entries {
            image.extend_from_slice(&entry.encode());
        }
        image.resize(image.len().max(0x200 + MAX_ENTRIES * ENTRY_SIZE + 512), 0);
        image
    }

    #[test]
    pub fn test_entry_layout() {
        let mut bytes = [0u8; ENTRY_SIZE];
        bytes[0] = 0xA0;
        bytes[1] = 0xA1;
        bytes[8] = 0x03;
        bytes[9] = 0x02;
        bytes[10..12].copy_from_slice(&0x0102u16.to_le_bytes());
        bytes[14..16].copy_from_slice(&0x0304u16.to_le_bytes());
        bytes[16..].copy_from_slice(b"MS-DOS 6.20\0\0\0\0\0");
        let entry = Pc98Entry::decode(&bytes).unwrap();
        assert!(entry.is_bootable());
        assert_eq!(entry.mode(), 0x20);
        assert!(entry.is_active());
        assert_eq!(entry.system_type(), 0x21);
        assert_eq!(
            entry.start,
            Pc98Chs {
                sector: 3,
                head: 2,
                cylinder: 0x0102
            }
        );
        assert_eq!(entry.end.cylinder, 0x0304);
        assert_eq!(entry.name_lossy(), "MS-DOS 6.20.....");
        assert_eq!(entry.encode(), bytes);
    }

    #[test]
    pub fn test_entry_roundtrip_arbitrary_bytes() {
        for seed in 0..=255u8 {
            let mut bytes = [0u8; ENTRY_SIZE];
            for (idx, byte) in bytes.iter_mut().enumerate() {
                *byte = seed.wrapping_mul(31).wrapping_add(idx as u8 * 7);
            }
            let entry = Pc98Entry::decode(&bytes).unwrap();
            assert_eq!(entry.encode(), bytes);
            assert_eq!(Pc98Entry::decode(&entry.encode()).unwrap(), entry);
        }
    }

    #[test]
    pub fn test_entry_truncated() {
        assert_eq!(
            Pc98Entry::decode(&[0; 31]).unwrap_err(),
            TruncatedRecordError {
                expected: 32,
                actual: 31
            }
        );
    }

    #[test]
    pub fn test_read_stops_at_terminator() {
        let entries = [entry(0xA1, 1, 10), entry(0xA1, 11, 20), entry(0xE2, 21, 30)];
        let mut raw = entries.to_vec();
        raw.push(entry(0xA1, 0, 40));
        raw.push(entry(0xA1, 41, 50));
        let table = read_table(Cursor::new(image(&raw))).unwrap();
        assert_eq!(table.entries(), &entries);
    }

    #[test]
    pub fn test_read_stops_after_max_entries() {
        let raw = (1..=20)
            .map(|idx| entry(0xA1, idx * 10, idx * 10 + 9))
            .collect::<Vec<_>>();
        let table = read_table(Cursor::new(image(&raw))).unwrap();
        assert_eq!(table.len(), MAX_ENTRIES);
        assert_eq!(table.entries(), &raw[..MAX_ENTRIES]);
    }

    #[test]
    pub fn test_read_empty_table() {
        let table = read_table(Cursor::new(vec![0; 4096])).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    pub fn test_read_partition_at_cylinder_zero_is_dropped() {
        let raw = [entry(0xA1, 0, 10), entry(0xA1, 11, 20)];
        let table = read_table(Cursor::new(image(&raw))).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    pub fn test_read_truncated_image() {
        let mut image = vec![0; 0x200];
        image.extend_from_slice(&entry(0xA1, 1, 10).encode());
        image.extend_from_slice(&[0xFF; 12]);
        match read_table(Cursor::new(image)) {
            Err(ReadError::Truncated(error)) => assert_eq!(error.actual, 12),
            other => panic!("expected truncated record, got {other:?}"),
        }
    }

    #[test]
    pub fn test_table_capacity() {
        let raw = (1..=MAX_ENTRIES as u16 + 1).map(|idx| entry(0xA1, idx, idx));
        assert_eq!(
            Pc98Table::from_entries(raw).unwrap_err(),
            TableFullError {
                capacity: MAX_ENTRIES
            }
        );
    }
}
