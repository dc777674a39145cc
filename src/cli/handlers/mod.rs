mod auth;
pub use auth::{cmd_login, cmd_logout, cmd_signup, cmd_whoami};

use std::io::IsTerminal;
use std::path::Path;
use std::time::Duration;

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::config_io;
use crate::io::identity::{Identity, LocalIdentity};
use crate::io::json_store::JsonTaskStore;
use crate::io::store::TaskStore;
use crate::io::watcher::Subscription;
use crate::model::config::AppConfig;
use crate::model::query::{SortDirection, SortKey, ViewQuery};
use crate::model::task::{Task, TaskPatch};
use crate::model::user::User;
use crate::ops::annotation_ops::Marker;
use crate::ops::{status, task_ops, view};
use crate::parse::render_highlighted_text;

/// How long `watch` blocks per wait before polling again
const WATCH_POLL: Duration = Duration::from_millis(500);

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let json = cli.json;

    match cli.command {
        // Highlight needs no data directory
        Commands::Highlight(args) => cmd_highlight(args, json),
        command => {
            let data_dir = config_io::resolve_data_dir(cli.data_dir.as_deref())?;
            tracing::debug!(dir = %data_dir.display(), "using data directory");
            run(command, &data_dir, json)
        }
    }
}

fn run(command: Commands, data_dir: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        // Account commands
        Commands::Signup(args) => cmd_signup(data_dir, args, json),
        Commands::Login(args) => cmd_login(data_dir, args, json),
        Commands::Logout => cmd_logout(data_dir),
        Commands::Whoami => cmd_whoami(data_dir, json),

        // Read commands
        Commands::List(args) => cmd_list(data_dir, args, json),
        Commands::Show(args) => cmd_show(data_dir, args, json),
        Commands::Watch(args) => cmd_watch(data_dir, args, json),

        // Write commands
        Commands::Add(args) => cmd_add(data_dir, args, json),
        Commands::Edit(args) => cmd_edit(data_dir, args, json),
        Commands::Comment(args) => cmd_comment(data_dir, args, json),
        Commands::Status(args) => cmd_status(data_dir, args, json),
        Commands::Done(args) => cmd_done(data_dir, args, json),
        Commands::Tag(args) => cmd_annotation(data_dir, args, Marker::Tag, json),
        Commands::Mention(args) => cmd_annotation(data_dir, args, Marker::Mention, json),
        Commands::Mv(args) => cmd_mv(data_dir, args, json),
        Commands::Delete(args) => cmd_delete(data_dir, args, json),

        // Configuration
        Commands::View(args) => cmd_view(data_dir, args, json),

        Commands::Highlight(args) => cmd_highlight(args, json),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Signed-in user plus the store their tasks live in
struct Session {
    store: JsonTaskStore,
    user: User,
}

impl Session {
    fn open(data_dir: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let user = LocalIdentity::new(data_dir).require_user()?;
        Ok(Session {
            store: JsonTaskStore::new(data_dir),
            user,
        })
    }

    fn tasks(&self) -> Result<Vec<Task>, Box<dyn std::error::Error>> {
        Ok(self.store.list(&self.user.id)?)
    }

    /// Resolve `id` (or a prefix) among the user's tasks, then let `f` build
    /// a patch from the stored task inside the store's write. Returns the
    /// task as the store now has it.
    fn update_task(
        &self,
        id: &str,
        f: impl FnOnce(&mut Task) -> Result<TaskPatch, Box<dyn std::error::Error>>,
    ) -> Result<Task, Box<dyn std::error::Error>> {
        let tasks = self.tasks()?;
        let full_id = task_ops::find_task(&tasks, id)?.id.clone();
        self.store.update_with(&full_id, f)
    }
}

fn parse_sort_key(s: &str) -> Result<SortKey, String> {
    SortKey::from_label(s)
        .ok_or_else(|| format!("unknown sort key '{}' (expected: none, date, status)", s))
}

fn parse_direction(s: &str) -> Result<SortDirection, String> {
    SortDirection::from_label(s)
        .ok_or_else(|| format!("unknown sort direction '{}' (expected: asc, desc)", s))
}

/// Build the projection query from list flags, falling back to the
/// configured default sort.
fn build_query(args: &ListArgs, config: &AppConfig) -> Result<ViewQuery, String> {
    let statuses = args
        .status
        .iter()
        .map(|s| parse_status(s))
        .collect::<Result<Vec<_>, _>>()?;
    let sort_key = match args.sort.as_deref() {
        Some(s) => parse_sort_key(s)?,
        None => config.view.sort,
    };
    let sort_direction = match args.direction.as_deref() {
        Some(s) => parse_direction(s)?,
        None => config.view.direction,
    };
    Ok(ViewQuery {
        statuses,
        tags: args
            .tag
            .iter()
            .map(|t| t.trim().trim_start_matches('#').to_string())
            .collect(),
        mentions: args
            .mention
            .iter()
            .map(|m| m.trim().trim_start_matches('@').to_string())
            .collect(),
        search: args.search.clone().unwrap_or_default(),
        sort_key,
        sort_direction,
    })
}

fn render_options(simple: bool) -> RenderOptions {
    let terminal = std::io::stdout().is_terminal();
    RenderOptions {
        simple,
        color: terminal,
        width: if terminal {
            crossterm::terminal::size().ok().map(|(w, _)| w as usize)
        } else {
            None
        },
    }
}

fn print_tasks(tasks: &[&Task], opts: &RenderOptions, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        let items: Vec<TaskJson> = tasks.iter().map(|t| task_to_json(t)).collect();
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else {
        for task in tasks {
            for line in format_task_lines(task, opts) {
                println!("{}", line);
            }
        }
    }
    Ok(())
}

/// Confirm a single-task write: the task as JSON, or a one-line summary
fn report(task: &Task, message: &str, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(&task_to_json(task))?);
    } else {
        println!("{} {}", short_id(&task.id), message);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_list(data_dir: &Path, args: ListArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let session = Session::open(data_dir)?;
    let (config, _) = config_io::read_config(data_dir)?;
    let query = build_query(&args, &config)?;
    let tasks = session.tasks()?;
    let shown = view::project(&tasks, &query);
    print_tasks(&shown, &render_options(args.simple || config.view.simple), json)
}

fn cmd_show(data_dir: &Path, args: IdArg, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let session = Session::open(data_dir)?;
    let tasks = session.tasks()?;
    let task = task_ops::find_task(&tasks, &args.id)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&task_to_json(task))?);
    } else {
        for line in format_task_detail(task, &render_options(false)) {
            println!("{}", line);
        }
    }
    Ok(())
}

fn cmd_watch(data_dir: &Path, args: ListArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let session = Session::open(data_dir)?;
    let (config, _) = config_io::read_config(data_dir)?;
    let query = build_query(&args, &config)?;
    let opts = render_options(args.simple || config.view.simple);

    let mut subscription = Subscription::start(session.store.clone(), &session.user.id)?;
    let mut first = true;
    loop {
        let Some(tasks) = subscription.next_snapshot(WATCH_POLL)? else {
            continue;
        };
        let shown = view::project(&tasks, &query);
        if json {
            // One line per delivery
            let items: Vec<TaskJson> = shown.iter().map(|t| task_to_json(t)).collect();
            println!("{}", serde_json::to_string(&items)?);
        } else {
            if !first {
                println!();
            }
            print_tasks(&shown, &opts, false)?;
        }
        first = false;
    }
}

fn cmd_highlight(args: HighlightArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let segments = render_highlighted_text(&args.text);
    if json {
        println!("{}", serde_json::to_string_pretty(&segments)?);
    } else {
        let color = std::io::stdout().is_terminal();
        println!("{}", render_segments(&segments, color));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

fn cmd_add(data_dir: &Path, args: AddArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let session = Session::open(data_dir)?;
    let existing = session.tasks()?.len();
    let mut new = task_ops::new_task(&args.text, &session.user.id, existing, task_ops::today())?;
    if let Some(comment) = args.comment {
        new.comment = comment;
    }
    let id = session.store.create(new)?;
    let tasks = session.tasks()?;
    let task = task_ops::find_task(&tasks, &id)?;
    report(task, &format!("added at position {}", task.order), json)
}

fn cmd_edit(data_dir: &Path, args: EditArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let session = Session::open(data_dir)?;
    let task = session.update_task(&args.id, |t| Ok(task_ops::edit_text(t, &args.text)?))?;
    report(&task, "text updated", json)
}

fn cmd_comment(data_dir: &Path, args: CommentArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let session = Session::open(data_dir)?;
    let task = session.update_task(&args.id, |t| Ok(task_ops::set_comment(t, &args.text)))?;
    let message = if task.comment.is_empty() {
        "comment cleared"
    } else {
        "comment updated"
    };
    report(&task, message, json)
}

fn cmd_status(data_dir: &Path, args: StatusArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let new_status = parse_status(&args.status)?;
    let session = Session::open(data_dir)?;
    let task = session.update_task(&args.id, |t| Ok(status::set_status(t, new_status)))?;
    report(&task, &format!("-> {}", task.status), json)
}

fn cmd_done(data_dir: &Path, args: IdArg, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let session = Session::open(data_dir)?;
    let task = session.update_task(&args.id, |t| Ok(status::toggle_complete(t)))?;
    report(&task, &format!("-> {}", task.status), json)
}

fn cmd_annotation(
    data_dir: &Path,
    args: AnnotationArgs,
    marker: Marker,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let noun = match marker {
        Marker::Tag => "tag",
        Marker::Mention => "mention",
    };
    let session = Session::open(data_dir)?;
    let task = session.update_task(&args.id, |t| match args.action.as_str() {
        "add" => Ok(task_ops::add_annotation(t, &args.value, marker)),
        "rm" => Ok(task_ops::remove_annotation(t, &args.value, marker)),
        other => Err(format!("unknown action '{}' (expected: add, rm)", other).into()),
    })?;
    let value = crate::ops::annotation_ops::clean_input(&args.value, marker);
    report(
        &task,
        &format!("{} {} {}{}", noun, args.action, marker.prefix(), value),
        json,
    )
}

fn cmd_mv(data_dir: &Path, args: MvArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(sort) = args.sort.as_deref()
        && parse_sort_key(sort)? != SortKey::None
    {
        return Err(format!(
            "cannot reorder while sorted by {}; list with --sort none first",
            sort
        )
        .into());
    }

    let session = Session::open(data_dir)?;
    let (config, mut doc) = config_io::read_config(data_dir)?;
    let mut query = ViewQuery {
        sort_key: config.view.sort,
        sort_direction: config.view.direction,
        ..Default::default()
    };
    if query.is_sorted() {
        query.clear_sort();
        config_io::set_default_sort(&mut doc, query.sort_key, query.sort_direction);
        config_io::write_config(data_dir, &doc)?;
        eprintln!("default sort reset to none");
    }

    let tasks = session.tasks()?;
    let (_, patches) = view::reorder(&tasks, args.from, args.to)?;
    session.store.apply_batch(&patches)?;
    tracing::info!(from = args.from, to = args.to, "task moved");

    let fresh = session.tasks()?;
    let moved = fresh
        .iter()
        .find(|t| t.order == args.to)
        .ok_or_else(|| format!("no task at position {}", args.to))?;
    report(moved, &format!("moved {} -> {}", args.from, args.to), json)
}

fn cmd_delete(data_dir: &Path, args: DeleteArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let session = Session::open(data_dir)?;
    let tasks = session.tasks()?;

    // Resolve every id before deleting anything
    let mut doomed: Vec<&Task> = Vec::new();
    for id in &args.ids {
        let task = task_ops::find_task(&tasks, id)?;
        if !doomed.iter().any(|t| t.id == task.id) {
            doomed.push(task);
        }
    }
    // Each delete closes its own gap in the manual order
    for task in &doomed {
        session.store.delete(&task.id)?;
    }

    if json {
        let ids: Vec<&str> = doomed.iter().map(|t| t.id.as_str()).collect();
        println!("{}", serde_json::to_string_pretty(&ids)?);
    } else {
        for task in &doomed {
            println!("{} deleted", short_id(&task.id));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

fn cmd_view(data_dir: &Path, args: ViewArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let (mut config, mut doc) = config_io::read_config(data_dir)?;
    let changed = args.simple.is_some() || args.sort.is_some() || args.direction.is_some();

    if let Some(simple) = args.simple {
        config_io::set_simple_view(&mut doc, simple);
        config.view.simple = simple;
    }
    if args.sort.is_some() || args.direction.is_some() {
        if let Some(sort) = args.sort.as_deref() {
            config.view.sort = parse_sort_key(sort)?;
        }
        if let Some(direction) = args.direction.as_deref() {
            config.view.direction = parse_direction(direction)?;
        }
        config_io::set_default_sort(&mut doc, config.view.sort, config.view.direction);
    }
    if changed {
        config_io::write_config(data_dir, &doc)?;
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&config.view)?);
    } else {
        println!("simple:    {}", config.view.simple);
        println!("sort:      {}", config.view.sort.label());
        println!("direction: {}", config.view.direction.label());
    }
    Ok(())
}
