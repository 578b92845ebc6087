//! Thin front end over the `storectl` feature crates.
//!
//! Device discovery, the transport library, and file I/O for log dumps
//! are out of scope for the core: nothing in this workspace implements
//! `DeviceHandle` against real hardware ([`storectl_core::device`]).
//! This binary covers the two things that don't need one: reading a
//! partition table out of a disk image file, and interpreting a raw
//! log/page dump captured elsewhere (`smartctl --log`, a vendor tool, a
//! SATL pass-through utility) without re-issuing any command.

use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

mod image;

use image::ImageDevice;

#[derive(Debug, Parser)]
#[command(name = "storectl", about = "Cross-protocol storage-device administration toolkit")]
struct Arguments {
    /// Increase log verbosity (info, then debug).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Read and print the partition table on a disk image file.
    Partitions {
        /// Path to a raw disk image.
        image: PathBuf,
    },
    /// Interpret a 512-byte DCO-Identify page dump.
    Dco {
        /// Path to a raw 512-byte DCO-Identify response.
        dump: PathBuf,
    },
    /// Interpret a 512-byte ATA CDL log page 0x18 dump.
    CdlAta {
        /// Path to a raw 512-byte ATA CDL log page.
        dump: PathBuf,
    },
    /// Interpret a 512-byte SATA PHY Event Counters log (ATA log 0x11) dump.
    PhySata {
        /// Path to a raw 512-byte SATA PHY event counter log page.
        dump: PathBuf,
    },
    /// Derive the ATA Security state from a 512-byte (256-word) IDENTIFY DEVICE dump.
    SecurityState {
        /// Path to a raw 512-byte IDENTIFY DEVICE response.
        dump: PathBuf,
    },
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };
    tracing_subscriber::fmt().with_max_level(level).with_target(false).init();
}

fn read_fixed_dump<const N: usize>(path: &PathBuf) -> Result<[u8; N]> {
    let mut file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut buf = [0u8; N];
    file.read_exact(&mut buf).with_context(|| format!("{} must be exactly {N} bytes", path.display()))?;
    Ok(buf)
}

fn main() -> Result<()> {
    let args = Arguments::parse();
    init_tracing(args.verbose);

    match args.command {
        Command::Partitions { image } => cmd_partitions(&image),
        Command::Dco { dump } => cmd_dco(&dump),
        Command::CdlAta { dump } => cmd_cdl_ata(&dump),
        Command::PhySata { dump } => cmd_phy_sata(&dump),
        Command::SecurityState { dump } => cmd_security_state(&dump),
    }
}

fn cmd_partitions(path: &PathBuf) -> Result<()> {
    let mut device = ImageDevice::open(path).with_context(|| format!("opening {}", path.display()))?;
    match storectl_part::read_partition_table(&mut device) {
        Ok(Some(table)) => {
            println!("{table:#?}");
            Ok(())
        }
        Ok(None) => bail!("no recognizable partition table signature found on {}", path.display()),
        Err(err) => bail!("reading partition table: {err}"),
    }
}

fn cmd_dco(path: &PathBuf) -> Result<()> {
    let buf: [u8; 512] = read_fixed_dump(path)?;
    let page = storectl_dco::DcoPage::parse(&buf);
    if !page.valid_checksum {
        tracing::warn!("word-sum checksum did not validate; fields are parsed anyway");
    }
    println!("{page:#?}");
    Ok(())
}

fn cmd_cdl_ata(path: &PathBuf) -> Result<()> {
    let buf: [u8; 512] = read_fixed_dump(path)?;
    let settings = storectl_cdl::AtaCdlSettings::parse(&buf);
    println!("{settings:#?}");
    Ok(())
}

fn cmd_phy_sata(path: &PathBuf) -> Result<()> {
    let buf: [u8; 512] = read_fixed_dump(path)?;
    let log = storectl_phy::SataPhyEventLog::parse(&buf);
    if !log.valid_checksum {
        tracing::warn!("ATA sector checksum did not validate; counters are parsed anyway");
    }
    println!("{log:#?}");
    Ok(())
}

fn cmd_security_state(path: &PathBuf) -> Result<()> {
    let words_buf: [u8; 512] = read_fixed_dump(path)?;
    let mut words = [0u16; 256];
    for (i, word) in words.iter_mut().enumerate() {
        *word = u16::from_le_bytes([words_buf[i * 2], words_buf[i * 2 + 1]]);
    }
    let identify = storectl_core::AtaIdentify { words };
    let status = storectl_security::SecurityStatus::from_identify(&identify);
    let state = storectl_security::SecurityState::derive(&status);
    println!("{status:#?}\nstate: {state:?}");
    Ok(())
}
