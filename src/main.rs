//! macho-relocate - make a macOS application tree relocatable.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use macho_relocate::{relocate_bundle, RelocateConfig, XcodeTools};

/// Rewrite absolute library references to @rpath and copy vendored dylibs.
#[derive(Parser, Debug)]
#[command(name = "macho-relocate")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Vendored dependency tree the binaries were linked against
    lib_sysroot: PathBuf,

    /// Application install tree to make relocatable
    app_root: PathBuf,

    /// Directory receiving copies of vendored libraries
    deps_dir: PathBuf,

    /// Executable that receives the final rpaths (repeatable).
    /// Defaults to octave-gui, octave-cli, mkoctfile, octave-config and gs.
    #[arg(short, long = "entry-point", value_name = "NAME")]
    entry_points: Vec<String>,

    /// Increase verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let config = RelocateConfig::new(&cli.lib_sysroot, &cli.app_root, &cli.deps_dir, cli.entry_points)?;
    let report = relocate_bundle(&XcodeTools, &config)?;

    info!(
        "Relocated {} binaries: {} libraries copied, {} rpaths removed, {} entry points finalized",
        report.roots,
        report.copied.len(),
        report.rpaths_removed,
        report.entry_points.len()
    );
    Ok(())
}

fn setup_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .without_time()
        .finish();

    tracing::subscriber::set_global_default(subscriber).ok();
}
