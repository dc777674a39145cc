use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tl", about = concat!("[x] tasklane v", env!("CARGO_PKG_VERSION"), " - tasks with #tags and @mentions"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Use a different data directory
    #[arg(short = 'D', long = "data-dir", global = true)]
    pub data_dir: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create an account and sign in
    Signup(CredentialArgs),
    /// Sign in to an existing account
    Login(CredentialArgs),
    /// Sign out
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Add a task to the bottom of the list
    Add(AddArgs),
    /// List tasks through the current filter and sort
    List(ListArgs),
    /// Show task details
    Show(IdArg),
    /// Replace task text (tags and mentions are re-read from it)
    Edit(EditArgs),
    /// Set task comment
    Comment(CommentArgs),
    /// Set task status
    Status(StatusArgs),
    /// Toggle a task between completed and its previous status
    Done(IdArg),
    /// Add or remove tags
    Tag(AnnotationArgs),
    /// Add or remove mentions
    Mention(AnnotationArgs),
    /// Move a task within the manual order
    Mv(MvArgs),
    /// Permanently delete tasks
    Delete(DeleteArgs),
    /// Print the list again every time it changes
    Watch(ListArgs),
    /// Show or change view defaults
    View(ViewArgs),
    /// Print text with tags and mentions highlighted
    Highlight(HighlightArgs),
}

// ---------------------------------------------------------------------------
// Account args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct CredentialArgs {
    /// Email address
    pub email: String,
    /// Password (read from TL_PASSWORD when omitted)
    #[arg(long, env = "TL_PASSWORD", hide_env_values = true)]
    pub password: String,
}

// ---------------------------------------------------------------------------
// Read command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ListArgs {
    /// Filter by status (repeatable: not-started, in-progress, on-hold, completed)
    #[arg(long)]
    pub status: Vec<String>,
    /// Filter by tag (repeatable, matches any)
    #[arg(long)]
    pub tag: Vec<String>,
    /// Filter by mention (repeatable, matches any)
    #[arg(long)]
    pub mention: Vec<String>,
    /// Case-insensitive search over text, tags and mentions
    #[arg(short, long)]
    pub search: Option<String>,
    /// Sort key: none, date, status (default from config)
    #[arg(long)]
    pub sort: Option<String>,
    /// Sort direction: asc, desc (default from config)
    #[arg(long)]
    pub direction: Option<String>,
    /// Force the simple view
    #[arg(long)]
    pub simple: bool,
}

#[derive(Args)]
pub struct IdArg {
    /// Task ID (or unique prefix)
    pub id: String,
}

#[derive(Args)]
pub struct HighlightArgs {
    /// Text to highlight
    pub text: String,
}

// ---------------------------------------------------------------------------
// Write command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct AddArgs {
    /// Task text; #tags and @mentions are picked up from it
    pub text: String,
    /// Initial comment
    #[arg(long)]
    pub comment: Option<String>,
}

#[derive(Args)]
pub struct EditArgs {
    /// Task ID
    pub id: String,
    /// New text
    pub text: String,
}

#[derive(Args)]
pub struct CommentArgs {
    /// Task ID
    pub id: String,
    /// Comment text (empty clears it)
    pub text: String,
}

#[derive(Args)]
pub struct StatusArgs {
    /// Task ID
    pub id: String,
    /// New status (not-started, in-progress, on-hold, completed)
    pub status: String,
}

#[derive(Args)]
pub struct AnnotationArgs {
    /// Task ID
    pub id: String,
    /// Action: "add" or "rm"
    pub action: String,
    /// Value, with or without its # or @ prefix
    pub value: String,
}

#[derive(Args)]
pub struct MvArgs {
    /// Current position (0-indexed, manual order)
    pub from: usize,
    /// New position (0-indexed)
    pub to: usize,
    /// Sort the list is being viewed with; only "none" is accepted
    #[arg(long)]
    pub sort: Option<String>,
}

#[derive(Args)]
pub struct DeleteArgs {
    /// Task IDs to delete
    #[arg(required = true)]
    pub ids: Vec<String>,
}

#[derive(Args)]
pub struct ViewArgs {
    /// Turn the simple view on or off
    #[arg(long)]
    pub simple: Option<bool>,
    /// Default sort key: none, date, status
    #[arg(long)]
    pub sort: Option<String>,
    /// Default sort direction: asc, desc
    #[arg(long)]
    pub direction: Option<String>,
}
