//! memmosaic command line viewer.
//!
//! Reads a frame stream produced by a pagemap collector from a file or stdin,
//! renders the latest layout to the terminal and answers tile/address probes.
//!
//! # Usage
//!
//! ```bash
//! # Render every frame of a capture at 128 tiles per row
//! memmosaic --file capture.bin --columns 128 --render
//!
//! # Pipe from a collector and inspect two tiles of the final frame
//! collector --pid 1234 | memmosaic --probe 0:0 --probe 3:17
//!
//! # Where does an address land?
//! memmosaic --file capture.bin --address 0x7f3a1c000000
//! ```

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

use memmosaic::renderer::render_legend;
use memmosaic::{
    HalfBlockRenderer, Mosaic, MosaicConfig, MosaicError, Palette, QueryError, TileBuffer,
    printable_page_flags,
};

const READ_CHUNK: usize = 64 * 1024;

#[derive(Parser)]
#[command(name = "memmosaic")]
#[command(version)]
#[command(about = "Render a per-page memory mosaic from a pagemap frame stream")]
struct Cli {
    /// Input file (reads stdin if not provided)
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Tiles per row
    #[arg(long)]
    columns: Option<u32>,

    /// Largest gap in pages kept inside one block
    #[arg(long)]
    max_gap_pages: Option<u64>,

    /// Separator rows between blocks
    #[arg(long)]
    separator_rows: Option<u32>,

    /// Page size in bytes
    #[arg(long)]
    page_size: Option<u64>,

    /// Render every completed frame to the terminal
    #[arg(long)]
    render: bool,

    /// Print page info for a tile of the final frame (ROW:COLUMN)
    #[arg(long, value_parser = parse_position)]
    probe: Vec<(u32, u32)>,

    /// Print the tile of an address in the final frame (hex with 0x, or decimal)
    #[arg(long, value_parser = parse_address)]
    address: Vec<u64>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_position(s: &str) -> Result<(u32, u32), String> {
    let (row, column) = s
        .split_once(':')
        .ok_or_else(|| format!("expected ROW:COLUMN, got '{s}'"))?;
    let row = row.trim().parse().map_err(|e| format!("bad row '{row}': {e}"))?;
    let column = column.trim().parse().map_err(|e| format!("bad column '{column}': {e}"))?;
    Ok((row, column))
}

fn parse_address(s: &str) -> Result<u64, String> {
    let s = s.trim();
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse(),
    }
    .map_err(|e| format!("bad address '{s}': {e}"))
}

fn load_config(cli: &Cli) -> anyhow::Result<MosaicConfig> {
    let mut config = match &cli.config {
        Some(path) => MosaicConfig::from_json_file(path)?,
        None => MosaicConfig::default(),
    };
    if let Some(columns) = cli.columns {
        config.columns_per_row = columns;
    }
    if let Some(gap) = cli.max_gap_pages {
        config.max_gap_pages = gap;
    }
    if let Some(rows) = cli.separator_rows {
        config.separator_rows = rows;
    }
    if let Some(page_size) = cli.page_size {
        config.page_size = page_size;
    }
    config.validate()?;
    Ok(config)
}

fn render_frame(mosaic: &Mosaic, renderer: &mut HalfBlockRenderer) -> io::Result<()> {
    let buffer = TileBuffer::from_layout(mosaic.layout());
    let mut stdout = io::stdout().lock();
    renderer.render_all(&mut stdout, &buffer)?;
    writeln!(stdout)
}

fn report(mosaic: &Mosaic, cli: &Cli) -> io::Result<()> {
    let layout = mosaic.layout();
    let mut stdout = io::stdout().lock();
    writeln!(
        stdout,
        "{} regions, {} blocks, {} mapped pages, {}x{} tiles",
        mosaic.regions().len(),
        layout.large_regions().len(),
        layout.mapped_pages(),
        layout.columns(),
        layout.rows()
    )?;
    render_legend(&mut stdout, &Palette::classic(), layout.histogram())?;

    for &(row, column) in &cli.probe {
        match mosaic.page_at_position(row, column) {
            Ok(page) => writeln!(
                stdout,
                "{row}:{column} {:#x} use {} [{}] {}",
                page.address,
                page.use_count,
                printable_page_flags(page.flags),
                page.backing_file
            )?,
            Err(QueryError::NotMapped(addr)) => writeln!(stdout, "{row}:{column} {addr:#x} gap")?,
            Err(QueryError::OutOfRange) => writeln!(stdout, "{row}:{column} no page")?,
        }
    }

    for &addr in &cli.address {
        match mosaic.position_from_address(addr) {
            Ok(pos) => writeln!(stdout, "{addr:#x} -> {}:{}", pos.row, pos.column)?,
            Err(_) => writeln!(stdout, "{addr:#x} not in any block")?,
        }
    }
    Ok(())
}

/// Feed `data`, then keep feeding empty chunks while buffered bytes still
/// yield frames or errors. A rejected frame may sit in front of complete
/// ones, and an error found after a completed frame is reported one call late.
fn drain(
    mosaic: &mut Mosaic,
    data: &[u8],
    cli: &Cli,
    renderer: &mut HalfBlockRenderer,
) -> anyhow::Result<()> {
    let mut data = data;
    loop {
        let progressed = match mosaic.feed(data) {
            Ok(true) => {
                if cli.render {
                    render_frame(mosaic, renderer)?;
                }
                true
            }
            Ok(false) => false,
            Err(MosaicError::Decode(e)) => {
                warn!(error = %e, "dropped frame");
                true
            }
            Err(e) => {
                warn!(error = %e, "frame not laid out");
                true
            }
        };
        if !progressed || !mosaic.decoder().has_pending() {
            return Ok(());
        }
        data = &[];
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli)?;
    let mut mosaic = Mosaic::new(config)?;
    let mut renderer = HalfBlockRenderer::new(Palette::classic());

    let mut input: Box<dyn Read> = match &cli.file {
        Some(path) => Box::new(
            File::open(path).with_context(|| format!("failed to open {}", path.display()))?,
        ),
        None => Box::new(io::stdin().lock()),
    };

    let mut chunk = vec![0u8; READ_CHUNK];
    loop {
        let n = match input.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e).context("failed to read stream"),
        };

        drain(&mut mosaic, &chunk[..n], &cli, &mut renderer)?;
    }

    if mosaic.decoder().has_pending() {
        warn!(
            bytes = mosaic.decoder().buffered_len(),
            "stream ended inside a frame"
        );
    }
    info!(frames = mosaic.decoder().frames_decoded(), updates = mosaic.updates(), "stream finished");

    report(&mosaic, &cli)?;
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("memmosaic: {e:#}");
            ExitCode::FAILURE
        }
    }
}
