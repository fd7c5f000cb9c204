use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "qd", about = concat!("quadrant v", env!("CARGO_PKG_VERSION"), " - tasks sorted by what matters"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Use a different data directory
    #[arg(short = 'C', long = "data-dir", global = true, env = "QUADRANT_DATA_DIR")]
    pub data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a task
    Add(AddArgs),
    /// List tasks in display order
    List(ListArgs),
    /// Show tasks grouped by quadrant
    Quadrants(ListArgs),
    /// Show task details
    Show(IdArg),
    /// Flip the completion state of tasks
    Toggle(IdsArg),
    /// Mark tasks done
    Done(IdsArg),
    /// Delete tasks
    Rm(IdsArg),
    /// Delete every completed task
    ClearDone,
    /// Change a task's title
    Title(TitleArgs),
    /// Set a task's detail text (empty clears it)
    Detail(DetailArgs),
    /// Set the priority of tasks
    Priority(PriorityArgs),
    /// Set or clear a task's due date
    Due(DueArgs),
    /// Move a task within its priority group
    Mv(MvArgs),
    /// Tag management
    Tag(TagCmd),
    /// Import tasks from an exported file
    Import(ImportArgs),
    /// Write the data file to stdout or a file
    Export(ExportArgs),
}

// ---------------------------------------------------------------------------
// Read command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ListArgs {
    /// Only titles containing this text (case-insensitive)
    #[arg(long, short)]
    pub search: Option<String>,
    /// Filter by priority (high, medium, low, none)
    #[arg(long, short)]
    pub priority: Option<String>,
    /// Filter by tag name
    #[arg(long, short)]
    pub tag: Option<String>,
}

#[derive(Args)]
pub struct IdArg {
    /// Task ID or unique prefix
    pub id: String,
}

#[derive(Args)]
pub struct IdsArg {
    /// Task IDs or unique prefixes
    #[arg(required = true)]
    pub ids: Vec<String>,
}

// ---------------------------------------------------------------------------
// Write command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct AddArgs {
    /// Task title
    pub title: String,
    /// Priority (high, medium, low, none)
    #[arg(long, short, default_value = "none")]
    pub priority: String,
}

#[derive(Args)]
pub struct TitleArgs {
    pub id: String,
    /// New title
    pub title: String,
}

#[derive(Args)]
pub struct DetailArgs {
    pub id: String,
    /// Detail text
    pub text: String,
}

#[derive(Args)]
pub struct PriorityArgs {
    /// Priority (high, medium, low, none)
    pub priority: String,
    #[arg(required = true)]
    pub ids: Vec<String>,
}

#[derive(Args)]
pub struct DueArgs {
    pub id: String,
    /// Date as YYYY-MM-DD, `today`, `tomorrow`, or `none`
    pub date: String,
}

#[derive(Args)]
pub struct MvArgs {
    pub id: String,
    /// Zero-based position within the task's priority group
    pub index: usize,
}

// ---------------------------------------------------------------------------
// Tag management
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct TagCmd {
    #[command(subcommand)]
    pub action: TagAction,
}

#[derive(Subcommand)]
pub enum TagAction {
    /// Create a tag
    New(TagNewArgs),
    /// Rename a tag
    Rename(TagRenameArgs),
    /// Change a tag's color
    Color(TagColorArgs),
    /// Delete a tag and remove it from every task
    Rm(TagNameArg),
    /// List tags
    Ls,
    /// Attach a tag to a task
    Add(TaskTagArgs),
    /// Detach a tag from a task
    Remove(TaskTagArgs),
}

#[derive(Args)]
pub struct TagNewArgs {
    pub name: String,
    /// Color (red, orange, yellow, green, blue, purple, pink, gray)
    #[arg(long, short, default_value = "blue")]
    pub color: String,
}

#[derive(Args)]
pub struct TagRenameArgs {
    /// Current tag name or ID prefix
    pub tag: String,
    pub name: String,
}

#[derive(Args)]
pub struct TagColorArgs {
    /// Tag name or ID prefix
    pub tag: String,
    pub color: String,
}

#[derive(Args)]
pub struct TagNameArg {
    /// Tag name or ID prefix
    pub tag: String,
}

#[derive(Args)]
pub struct TaskTagArgs {
    /// Task ID or unique prefix
    pub id: String,
    /// Tag name or ID prefix
    pub tag: String,
}

// ---------------------------------------------------------------------------
// Import / export
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ImportArgs {
    /// File previously written by `export`
    pub file: PathBuf,
    /// Keep existing tasks and add only new ones
    #[arg(long)]
    pub merge: bool,
}

#[derive(Args)]
pub struct ExportArgs {
    /// Output file (default: stdout)
    pub file: Option<PathBuf>,
}
