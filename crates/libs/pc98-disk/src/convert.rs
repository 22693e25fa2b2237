//! Derivation of an MBR partition table from a PC-98 partition table.

use tracing::debug;

use crate::geometry::cylinders_to_lba;
use crate::mbr::{self, ChsAddress, MbrEntry, MbrTable};
use crate::pc98::{Pc98Entry, Pc98Table};
use crate::types::guess_mbr_type;

/// Derive the MBR entry of a PC-98 partition entry.
///
/// The entry uses LBA addressing only, both CHS addresses are set to
/// [`ChsAddress::LBA_ONLY`]. The status is always `0x00`, the bootable flag of the PC-98
/// entry is not carried over.
pub fn mbr_entry(entry: &Pc98Entry) -> MbrEntry {
    let lba = cylinders_to_lba(entry.start.cylinder, entry.end.cylinder);
    MbrEntry {
        status: 0x00,
        start: ChsAddress::LBA_ONLY,
        ty: guess_mbr_type(entry.system_type()),
        end: ChsAddress::LBA_ONLY,
        lba_start: lba.start,
        lba_size: lba.size,
    }
}

/// Suggest an MBR partition table equivalent to the given PC-98 partition table.
///
/// Only the first four partitions are converted. Partitions without an MBR equivalent
/// are kept as free entries so that the remaining entries keep their partition numbers.
pub fn suggest_mbr(table: &Pc98Table) -> MbrTable {
    let mut suggestion = MbrTable::new();
    for entry in table
        .entries()
        .iter()
        .take(mbr::MAX_ENTRIES)
        .take_while(|entry| !entry.is_terminator())
    {
        let mbr_entry = mbr_entry(entry);
        debug!(
            "PC-98 cylinders {}..={} map to LBA {}+{}",
            entry.start.cylinder, entry.end.cylinder, mbr_entry.lba_start, mbr_entry.lba_size
        );
        // At most `MAX_ENTRIES` entries are taken.
        let _ = suggestion.push(mbr_entry);
    }
    suggestion
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pc98::tests::entry;
    use crate::types::pc98_types;

    #[test]
    pub fn test_entry_conversion() {
        let converted = mbr_entry(&entry(0x80 | pc98_types::FAT16B, 10, 19));
        assert_eq!(
            converted,
            MbrEntry {
                status: 0x00,
                start: ChsAddress {
                    head: 0xFE,
                    sector_cylinder_high: 0xFF,
                    cylinder_low: 0xFF,
                },
                ty: 0x0C,
                end: ChsAddress::LBA_ONLY,
                lba_start: 1360,
                lba_size: 1360,
            }
        );
    }

    #[test]
    pub fn test_bootable_flag_not_propagated() {
        let mut bootable = entry(0x80 | pc98_types::LINUX, 1, 2);
        bootable.mid = 0x80;
        assert!(bootable.is_bootable());
        assert!(!mbr_entry(&bootable).is_bootable());
    }

    #[test]
    pub fn test_suggestion_is_capped() {
        let table =
            Pc98Table::from_entries((1..=10).map(|idx| entry(0xA1, idx * 10, idx * 10 + 9)))
                .unwrap();
        let suggestion = suggest_mbr(&table);
        assert_eq!(suggestion.len(), 4);
        assert_eq!(suggestion.entries()[3].lba_start, 40 * 136);
    }

    #[test]
    pub fn test_suggestion_stops_at_terminator() {
        let terminator = entry(0xA1, 0, 0);
        assert!(terminator.is_terminator());
        let table =
            Pc98Table::from_entries([entry(0xA1, 1, 9), terminator, entry(0xA1, 10, 19)])
                .unwrap();
        assert_eq!(suggest_mbr(&table).len(), 1);
    }

    #[test]
    pub fn test_suggestion_keeps_free_slots() {
        let table = Pc98Table::from_entries([
            entry(0x80 | pc98_types::N88_BASIC, 1, 9),
            entry(0x80 | pc98_types::FAT12, 10, 19),
        ])
        .unwrap();
        let suggestion = suggest_mbr(&table);
        assert_eq!(suggestion.len(), 2);
        assert!(suggestion.entries()[0].is_free());
        assert_eq!(suggestion.entries()[1].ty, 0x01);
        assert_eq!(suggestion.active_entries().count(), 0);
    }

    #[test]
    pub fn test_empty_table() {
        assert!(suggest_mbr(&Pc98Table::new()).is_empty());
    }
}
