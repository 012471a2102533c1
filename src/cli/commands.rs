use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tw", about = concat!("[~] tickwatch v", env!("CARGO_PKG_VERSION"), " - watch Redmine feeds, mark tickets done"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Run against a different workspace directory
    #[arg(short = 'C', long = "workspace-dir", global = true)]
    pub workspace_dir: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a tickwatch workspace in the current directory
    Init(InitArgs),
    /// Fetch all feeds once and merge into the ticket store
    Sync,
    /// List tickets grouped by feed
    List(ListArgs),
    /// Mark tickets done
    Done(DoneArgs),
    /// Clear the done flag on tickets
    Undone(DoneArgs),
    /// List configured feeds, or add/remove one
    Feeds(FeedsCmd),
    /// Show recent sync failures
    Log(LogArgs),
}

// ---------------------------------------------------------------------------
// Init args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct InitArgs {
    /// Reinitialize even if tickwatch/ already exists
    #[arg(long)]
    pub force: bool,
}

// ---------------------------------------------------------------------------
// Read command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ListArgs {
    /// Only show tickets from this feed ID
    #[arg(long)]
    pub feed: Option<String>,
    /// Only show tickets not marked done
    #[arg(long)]
    pub open: bool,
    /// Only show tickets marked done
    #[arg(long)]
    pub done: bool,
}

#[derive(Args)]
pub struct LogArgs {
    /// Maximum number of entries to show
    #[arg(long, default_value = "20")]
    pub limit: usize,
}

// ---------------------------------------------------------------------------
// Write command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct DoneArgs {
    /// Ticket ID(s)
    #[arg(required = true)]
    pub ids: Vec<String>,
}

#[derive(Args)]
pub struct FeedsCmd {
    #[command(subcommand)]
    pub action: Option<FeedsAction>,
}

#[derive(Subcommand)]
pub enum FeedsAction {
    /// Add a feed to config.toml
    Add(FeedAddArgs),
    /// Remove a feed from config.toml by ID
    Remove(FeedRemoveArgs),
}

#[derive(Args)]
pub struct FeedAddArgs {
    /// Display title for the feed
    pub title: String,
    /// Atom feed URL
    pub url: String,
    /// Comma-separated keywords to flag matching tickets
    #[arg(long)]
    pub search: Option<String>,
    /// Explicit feed ID (default: derived from the title)
    #[arg(long)]
    pub id: Option<String>,
}

#[derive(Args)]
pub struct FeedRemoveArgs {
    /// Feed ID (see `tw feeds`)
    pub id: String,
}
