//! `gms2mesh` command line driver
//!
//! ```text
//! gms2mesh mesh --xyz YiLan_xyz.txt --mat YiLan_mat.txt --top YiLan_top.txt \
//!     --bot YiLan_bot.txt --output cv2tecplot.dat
//! gms2mesh borehole --input logs.csv --output boreholes.txt --merge
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use gms2mesh::prelude::*;
use log::LevelFilter;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::time::Instant;

/// Convert GMS structured grid exports into hexahedral meshes
#[derive(Parser)]
#[command(name = "gms2mesh")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Convert GMS grid exports into hexahedral meshes", long_about = None)]
struct Cli {
    /// log level (trace, debug, info, warn, error). Falls back to RUST_LOG, then info
    #[arg(short, long, global = true)]
    log_level: Option<LevelFilter>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// build a hexahedral mesh from the four grid exports
    Mesh(MeshArgs),
    /// write a GMS borehole data file from a layer table
    Borehole(BoreholeArgs),
}

#[derive(clap::Args)]
struct MeshArgs {
    /// grid geometry export (origin and cell sizes)
    #[arg(long)]
    xyz: PathBuf,

    /// material export
    #[arg(long)]
    mat: PathBuf,

    /// top elevation export
    #[arg(long)]
    top: PathBuf,

    /// bottom elevation export, also holding the active flags
    #[arg(long)]
    bot: PathBuf,

    /// output file
    #[arg(short, long)]
    output: PathBuf,

    /// output format
    #[arg(short, long, value_enum, default_value_t = Format::Tecplot)]
    format: Format,

    /// Tecplot zone title
    #[arg(long, default_value = "cv2tecplot")]
    zone: String,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Tecplot,
    VtuAscii,
    VtuBase64,
    VtuBinary,
}

#[derive(clap::Args)]
struct BoreholeArgs {
    /// layer table: group,column,x,y,z,material,horizon,depth_start,depth_end
    #[arg(short, long)]
    input: PathBuf,

    /// output file
    #[arg(short, long)]
    output: PathBuf,

    /// merge consecutive layers with identical ids
    #[arg(long)]
    merge: bool,
}

fn init_logging(level: Option<LevelFilter>) {
    let level = level
        .or_else(|| std::env::var("RUST_LOG").ok().and_then(|v| v.parse().ok()))
        .unwrap_or(LevelFilter::Info);

    env_logger::Builder::new().filter_level(level).init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level);

    match cli.command {
        Commands::Mesh(args) => run_mesh(args),
        Commands::Borehole(args) => run_borehole(args),
    }
}

fn run_mesh(args: MeshArgs) -> Result<()> {
    let start = Instant::now();

    log::info!("reading...");
    let paths = SourcePaths::new(args.xyz, args.mat, args.top, args.bot);
    let sources = GridSources::read(&paths).context("failed to read grid exports")?;

    log::info!("converting...");
    let mesh = convert(&sources);

    log::info!("writing {}...", args.output.display());
    let file = File::create(&args.output)
        .with_context(|| format!("failed to create {}", args.output.display()))?;
    let writer = BufWriter::new(file);

    match args.format {
        Format::Tecplot => Tecplot::new(args.zone).write_mesh(writer, &mesh),
        Format::VtuAscii => Vtu::<Ascii>::new().write_mesh(writer, &mesh),
        Format::VtuBase64 => Vtu::<Base64>::new().write_mesh(writer, &mesh),
        Format::VtuBinary => Vtu::<Binary>::new().write_mesh(writer, &mesh),
    }
    .with_context(|| format!("failed to write {}", args.output.display()))?;

    log::info!(
        "finished: {} nodes, {} elements in {:.2?}",
        mesh.nodes.len(),
        mesh.elements.len(),
        start.elapsed()
    );

    Ok(())
}

fn run_borehole(args: BoreholeArgs) -> Result<()> {
    let text = std::fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    let groups = gms2mesh::borehole::BoreholeGroup::parse_table(&text);

    let file = File::create(&args.output)
        .with_context(|| format!("failed to create {}", args.output.display()))?;
    let writer = BufWriter::new(file);

    if args.merge {
        gms2mesh::write_boreholes_with(writer, &groups, gms2mesh::borehole::merge_homogeneous)
    } else {
        gms2mesh::write_boreholes(writer, &groups)
    }
    .with_context(|| format!("failed to write {}", args.output.display()))?;

    Ok(())
}
