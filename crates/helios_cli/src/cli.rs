//! Command-line arguments, clap derive style.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use log::LevelFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Parser)]
#[command(name = "helios")]
#[command(about = "Multi-threaded ray tracer with remote render dispatch")]
pub struct Args {
    /// Set the logging level
    #[arg(long, default_value = "info", global = true)]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Render the scene to a PNG
    Render(RenderArgs),
    /// Accept row-range requests from a render master over TCP
    Serve(ServeArgs),
}

#[derive(clap::Args)]
pub struct RenderArgs {
    /// Image width in pixels
    #[arg(long, default_value = "640")]
    pub width: u32,

    /// Image height in pixels
    #[arg(long, default_value = "480")]
    pub height: u32,

    /// Worker slots; 0 means one per CPU core
    #[arg(long, short = 't', default_value = "0")]
    pub threads: u32,

    /// Supersampling grid side (1 = one sample per pixel)
    #[arg(long, short = 's', default_value = "2")]
    pub supersampling: u32,

    /// Jitter sub-pixel sample positions
    #[arg(long)]
    pub jitter: bool,

    /// Base seed for the per-worker RNG streams
    #[arg(long, default_value = "12")]
    pub seed: u64,

    /// Maximum recursion depth for secondary rays
    #[arg(long, default_value = "8")]
    pub max_depth: u32,

    /// Disable shadow rays
    #[arg(long = "no-shadows")]
    pub no_shadows: bool,

    /// Disable specular reflections
    #[arg(long = "no-reflections")]
    pub no_reflections: bool,

    /// Disable refractions
    #[arg(long = "no-refractions")]
    pub no_refractions: bool,

    /// Collect a point cloud and export it as ASCII PLY to this path
    #[arg(long = "point-cloud")]
    pub point_cloud: Option<PathBuf>,

    /// Remote render client address (repeatable)
    #[arg(long = "client")]
    pub clients: Vec<SocketAddr>,

    /// Remote client connect/request timeout in milliseconds
    #[arg(long, default_value = "10000")]
    pub client_timeout_ms: u64,

    /// Output image path
    #[arg(short, long, default_value = "output.png")]
    pub output: PathBuf,
}

#[derive(clap::Args)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0:4150")]
    pub listen: SocketAddr,
}
