//! Human-readable rendering of partition entries.

use std::fmt;

use console::style;
use pc98_disk::{mbr, types, MbrEntry, Pc98Entry};

/// Heading preceding a partition table.
pub fn heading(text: &str) -> String {
    style(text).bold().to_string()
}

/// Display a PC-98 partition entry with its partition number.
pub struct ShowPc98<'entry> {
    pub number: usize,
    pub entry: &'entry Pc98Entry,
}

impl fmt::Display for ShowPc98<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entry = self.entry;
        writeln!(f, "PC-98 Partition {}:", self.number)?;
        write!(f, "mid: 0x{:x}", entry.mode())?;
        if entry.is_bootable() {
            f.write_str(" (bootable)")?;
        }
        writeln!(f)?;
        write!(f, "sid: 0x{:x}", entry.system_type())?;
        if entry.is_active() {
            f.write_str(" (active)")?;
        }
        writeln!(f, " ({})", types::type_name(entry.system_type()))?;
        for (label, chs) in [("IPL  ", entry.ipl), ("Start", entry.start), ("End  ", entry.end)] {
            writeln!(f, "{label} (C/H/S): {}/{}/{}", chs.cylinder, chs.head, chs.sector)?;
        }
        write!(f, "Name: \"{}\"", entry.name_lossy())
    }
}

/// Display an MBR partition entry with its partition number.
pub struct ShowMbr<'entry> {
    pub number: usize,
    pub entry: &'entry MbrEntry,
}

impl fmt::Display for ShowMbr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entry = self.entry;
        writeln!(f, "MBR Partition {}:", self.number)?;
        write!(f, "Flags        : 0x{:x}", entry.status)?;
        if entry.is_bootable() {
            f.write_str(" (bootable/active)")?;
        }
        writeln!(f)?;
        for (label, chs) in [("Start", entry.start), ("End  ", entry.end)] {
            writeln!(
                f,
                "{label} (C/H/S): {}/{}/{}",
                chs.cylinder(),
                chs.head,
                chs.sector()
            )?;
        }
        writeln!(f, "Start   (LBA): {}", entry.lba_start)?;
        writeln!(
            f,
            "End     (LBA): {} (size {}/{}MB)",
            entry.lba_end(),
            entry.lba_size,
            u64::from(entry.lba_size) * 512 / (1 << 20)
        )?;
        write!(f, "Type         : 0x{:x} ({})", entry.ty, mbr::type_name(entry.ty))
    }
}

#[cfg(test)]
mod tests {
    use pc98_disk::mbr::ChsAddress;
    use pc98_disk::pc98::Pc98Chs;

    use super::*;

    #[test]
    pub fn test_show_pc98() {
        let entry = Pc98Entry {
            mid: 0xA0,
            sid: 0xA1,
            reserved: [0; 2],
            ipl: Pc98Chs {
                sector: 0,
                head: 0,
                cylinder: 1,
            },
            start: Pc98Chs {
                sector: 0,
                head: 0,
                cylinder: 1,
            },
            end: Pc98Chs {
                sector: 16,
                head: 7,
                cylinder: 120,
            },
            name: *b"MS-DOS 6.20\0\0\0\0\0",
        };
        let shown = ShowPc98 {
            number: 1,
            entry: &entry,
        }
        .to_string();
        assert_eq!(
            shown,
            "PC-98 Partition 1:\n\
            mid: 0x20 (bootable)\n\
            sid: 0x21 (active) (FAT16B)\n\
            IPL   (C/H/S): 1/0/0\n\
            Start (C/H/S): 1/0/0\n\
            End   (C/H/S): 120/7/16\n\
            Name: \"MS-DOS 6.20.....\""
        );
    }

    #[test]
    pub fn test_show_mbr() {
        let entry = MbrEntry {
            status: 0x00,
            start: ChsAddress::LBA_ONLY,
            ty: 0x0C,
            end: ChsAddress::LBA_ONLY,
            lba_start: 136,
            lba_size: 16320,
        };
        let shown = ShowMbr {
            number: 2,
            entry: &entry,
        }
        .to_string();
        assert_eq!(
            shown,
            "MBR Partition 2:\n\
            Flags        : 0x0\n\
            Start (C/H/S): 1023/254/63\n\
            End   (C/H/S): 1023/254/63\n\
            Start   (LBA): 136\n\
            End     (LBA): 16456 (size 16320/7MB)\n\
            Type         : 0xc (FAT32/LBA)"
        );
    }
}
