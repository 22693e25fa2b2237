//! Definition of the command line interface (CLI).

use std::error::Error as _;
use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::io::{Seek, Write};
use std::path::{Path, PathBuf};

use clap::Parser;
use pc98_disk::mbr::{self, WriteStage};
use pc98_disk::{pc98, suggest_mbr, MbrTable, ReadError};
use tracing::error;

use crate::display::{heading, ShowMbr, ShowPc98};

/// Exit code after successful completion.
pub const EXIT_SUCCESS: u8 = 0;
/// Exit code after showing the usage or failing to read the target.
pub const EXIT_USAGE: u8 = 1;
/// Exit code after failing to write a partition entry.
pub const EXIT_PARTITION_WRITE_FAILED: u8 = 2;
/// Exit code after failing to write the MBR signature.
pub const EXIT_SIGNATURE_WRITE_FAILED: u8 = 3;

/// Name of the executable if it cannot be determined from the arguments.
const DEFAULT_NAME: &str = "pc98-mbr";

#[derive(Debug, Parser)]
#[clap(disable_help_flag = true, disable_version_flag = true)]
pub struct Args {
    /// Switch selecting the mode by its first letter, e.g., `-r` or `-read`.
    #[clap(allow_hyphen_values = true)]
    switch: String,
    /// Disk image or block device.
    target: PathBuf,
    /// Additional arguments are ignored.
    #[clap(hide = true, allow_hyphen_values = true)]
    _rest: Vec<OsString>,
}

/// Mode of operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Show the usage.
    Help,
    /// Show the PC-98 partition table and the MBR on disk.
    Read,
    /// Show the suggested MBR.
    Suggest,
    /// Show and write the suggested MBR.
    Write,
}

impl Mode {
    /// Select the mode from a switch like `-r`, `-read`, or `-wreck`.
    pub fn from_switch(switch: &str) -> Option<Self> {
        match switch.strip_prefix('-')?.chars().next()? {
            'h' => Some(Self::Help),
            'r' => Some(Self::Read),
            's' => Some(Self::Suggest),
            'w' => Some(Self::Write),
            _ => None,
        }
    }
}

/// Run the CLI with the given arguments, including the name of the executable, and
/// return the exit code.
pub fn run<I, T>(args: I) -> u8
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let args = args.into_iter().map(Into::into).collect::<Vec<OsString>>();
    let name = args
        .first()
        .and_then(|name| name.to_str())
        .unwrap_or(DEFAULT_NAME)
        .to_owned();
    let Ok(args) = Args::try_parse_from(&args) else {
        return print_help(&name);
    };
    match Mode::from_switch(&args.switch) {
        None | Some(Mode::Help) => print_help(&name),
        Some(Mode::Read) => exit_on_read_error(&args.target, read_tables(&args.target)),
        Some(Mode::Suggest) => {
            exit_on_read_error(&args.target, suggest(&args.target).map(|_| ()))
        }
        Some(Mode::Write) => write(&args.target),
    }
}

fn print_help(name: &str) -> u8 {
    println!(
        "Shows PC-98 partition tables and writes an MBR equivalent for use on modern systems."
    );
    println!("Usage:");
    println!("{name} -h : Show this\n");
    println!(
        "{name} -r or \n{name} -read : Reads and displays the PC-98 partition table of the \
        image/block device, and shows the corresponding MBR data already written.\n"
    );
    println!("{name} -s or \n{name} -suggest: Suggest a MBR\n");
    println!(
        "{name} -w file or \n{name} -write file or \n{name} -wreck file : WRITES the \
        suggested MBR to the image/block device. Make sure to select the correct file !\n"
    );
    EXIT_USAGE
}

fn exit_on_read_error(target: &Path, result: Result<(), ReadError>) -> u8 {
    match result {
        Ok(()) => EXIT_SUCCESS,
        Err(error) => {
            error!("unable to read partition table of {target:?}: {error}");
            EXIT_USAGE
        }
    }
}

/// Show the PC-98 partition table and the MBR partition table on disk.
fn read_tables(target: &Path) -> Result<(), ReadError> {
    let mut drive = File::open(target)?;
    let table = pc98::read_table(&mut drive)?;
    for (idx, entry) in table.entries().iter().enumerate() {
        println!("{}", ShowPc98 { number: idx + 1, entry });
    }
    if table.is_empty() {
        println!("No PC-98 partition table.");
    }
    println!("\n{}", heading("Corresponding MBR on disk:"));
    let on_disk = mbr::read_table(&mut drive)?;
    for (idx, entry) in on_disk.entries().iter().enumerate() {
        println!("{}", ShowMbr { number: idx + 1, entry });
    }
    Ok(())
}

/// Show and return the suggested MBR partition table.
fn suggest(target: &Path) -> Result<MbrTable, ReadError> {
    let table = pc98::read_table(File::open(target)?)?;
    println!("\n{}", heading("Suggested MBR:"));
    let suggestion = suggest_mbr(&table);
    for (idx, entry) in suggestion.active_entries().enumerate() {
        println!("{}", ShowMbr { number: idx + 1, entry });
    }
    Ok(suggestion)
}

/// Show and write the suggested MBR partition table.
fn write(target: &Path) -> u8 {
    let suggestion = match suggest(target) {
        Ok(suggestion) => suggestion,
        Err(error) => return exit_on_read_error(target, Err(error)),
    };
    let drive = match OpenOptions::new().read(true).write(true).open(target) {
        Ok(drive) => drive,
        Err(error) => {
            error!("unable to open {target:?} for writing: {error}");
            return EXIT_PARTITION_WRITE_FAILED;
        }
    };
    commit(drive, &suggestion)
}

/// Write the partition table to the sink and return the exit code.
pub(crate) fn commit<W: Write + Seek>(sink: W, table: &MbrTable) -> u8 {
    match mbr::write_table(sink, table) {
        Ok(()) => {
            println!("Successfully written.");
            EXIT_SUCCESS
        }
        Err(error) => {
            match error.source() {
                Some(cause) => error!("{error}: {cause}"),
                None => error!("{error}"),
            }
            match error.stage() {
                WriteStage::Partition => EXIT_PARTITION_WRITE_FAILED,
                WriteStage::Signature => EXIT_SIGNATURE_WRITE_FAILED,
            }
        }
    }
}
