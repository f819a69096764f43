use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "quire",
    about = "Quire: a wiki kept in git",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    #[command(flatten)]
    pub store: StoreArgs,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Serve the wiki over HTTP
    Serve(ServeArgs),
    /// Create the document directory and its git repository
    Init,
    /// Show the revision history of a document
    Log(LogArgs),
    /// Print a document at head or at a past revision
    Show(ShowArgs),
}

/// Where the store lives; shared by every command.
#[derive(Args)]
pub struct StoreArgs {
    /// TOML config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
    /// Document directory (git working tree)
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,
}

#[derive(Args)]
pub struct ServeArgs {
    #[arg(long)]
    pub bind: Option<SocketAddr>,
    #[arg(long)]
    pub title: Option<String>,
    /// URL prefix the wiki is mounted under
    #[arg(long)]
    pub basepath: Option<String>,
}

#[derive(Args)]
pub struct LogArgs {
    /// Document URL path, e.g. /notes/rust
    pub path: String,
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
}

#[derive(Args)]
pub struct ShowArgs {
    /// Document URL path, e.g. /notes/rust
    pub path: String,
    #[arg(short, long)]
    pub revision: Option<String>,
}
