use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "quire",
    about = "Quire: revision-controlled wiki content store",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// TOML store configuration
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Store root, overriding the configuration file
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// File holding the config-blob key (hex, or a passphrase)
    #[arg(long, global = true)]
    pub key_file: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create a wiki store
    Init(InitArgs),
    /// Print a page
    Get(GetArgs),
    /// Create or replace a page
    Put(PutArgs),
    /// Delete a page
    Rm(RmArgs),
    /// Rename a page
    Mv(MvArgs),
    /// Show the history of a page or file
    Log(LogArgs),
    /// Show recent changes across the store
    Changes(ChangesArgs),
    /// List pages
    Pages,
    /// List uploaded files
    Files,
    /// Upload a file
    Upload(UploadArgs),
    /// Write an uploaded file to disk or stdout
    Download(DownloadArgs),
    /// Print a decrypted config blob
    ConfigGet(ConfigGetArgs),
    /// Encrypt and store a config blob
    ConfigPut(ConfigPutArgs),
}

/// Attribution for commands that record a revision.
#[derive(Args, Clone, Debug)]
pub struct WriteArgs {
    /// Revision message; a default is derived when omitted
    #[arg(short, long, default_value = "")]
    pub message: String,
    #[arg(long, default_value = "quire")]
    pub author: String,
    #[arg(long)]
    pub email: Option<String>,
}

#[derive(Args)]
pub struct InitArgs {
    pub path: Option<PathBuf>,
    /// Write a freshly generated config-blob key here
    #[arg(long)]
    pub key_out: Option<PathBuf>,
}

#[derive(Args)]
pub struct GetArgs {
    pub title: String,
    /// Revision id; the tip when omitted
    #[arg(long)]
    pub rev: Option<String>,
}

#[derive(Args)]
pub struct PutArgs {
    pub title: String,
    /// Read content from this file instead of stdin
    #[arg(short, long)]
    pub file: Option<PathBuf>,
    #[command(flatten)]
    pub write: WriteArgs,
}

#[derive(Args)]
pub struct RmArgs {
    pub title: String,
    #[command(flatten)]
    pub write: WriteArgs,
}

#[derive(Args)]
pub struct MvArgs {
    pub from: String,
    pub to: String,
    #[command(flatten)]
    pub write: WriteArgs,
}

#[derive(Args)]
pub struct LogArgs {
    pub name: String,
    /// Treat NAME as an uploaded file rather than a page
    #[arg(long)]
    pub file: bool,
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
    /// Continuation token from a previous page
    #[arg(long)]
    pub cursor: Option<String>,
}

#[derive(Args)]
pub struct ChangesArgs {
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
    #[arg(long)]
    pub cursor: Option<String>,
}

#[derive(Args)]
pub struct UploadArgs {
    pub path: PathBuf,
    /// Store under this name instead of the source file name
    #[arg(long)]
    pub name: Option<String>,
    #[command(flatten)]
    pub write: WriteArgs,
}

#[derive(Args)]
pub struct DownloadArgs {
    pub name: String,
    #[arg(long)]
    pub rev: Option<String>,
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct ConfigGetArgs {
    pub name: String,
}

#[derive(Args)]
pub struct ConfigPutArgs {
    pub name: String,
    #[arg(short, long)]
    pub file: Option<PathBuf>,
}
