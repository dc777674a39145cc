use crossterm::style::Stylize;
use serde::Serialize;

use crate::model::task::{Task, TaskStatus};
use crate::parse::{Segment, SegmentKind, render_highlighted_text};
use crate::util::unicode::{display_width, pad_to_width, take_width};

/// Display settings passed into every formatter
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    /// Hide date, id and comment; one line per task
    pub simple: bool,
    /// Emit ANSI colors for tags and mentions
    pub color: bool,
    /// Terminal width used to truncate task text, if known
    pub width: Option<usize>,
}

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct TaskJson<'a> {
    #[serde(flatten)]
    pub task: &'a Task,
    pub segments: Vec<Segment>,
}

pub fn task_to_json(task: &Task) -> TaskJson<'_> {
    TaskJson {
        task,
        segments: render_highlighted_text(&task.text),
    }
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

/// Checkbox-style symbol for each status
pub fn status_symbol(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::NotStarted => "[ ]",
        TaskStatus::InProgress => "[>]",
        TaskStatus::OnHold => "[~]",
        TaskStatus::Completed => "[x]",
    }
}

/// First 8 characters of a task id
pub fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

/// Join segments back into a line, styling tags and mentions when colored.
pub fn render_segments(segments: &[Segment], color: bool) -> String {
    segments
        .iter()
        .map(|seg| match (seg.kind, color) {
            (SegmentKind::Tag, true) => seg.text.as_str().cyan().to_string(),
            (SegmentKind::Mention, true) => seg.text.as_str().magenta().to_string(),
            _ => seg.text.clone(),
        })
        .collect()
}

/// Cut segments down to `max_cells`, ending with `…` when anything was dropped.
pub fn truncate_segments(segments: &[Segment], max_cells: usize) -> Vec<Segment> {
    let total: usize = segments.iter().map(|s| display_width(&s.text)).sum();
    if total <= max_cells {
        return segments.to_vec();
    }
    if max_cells == 0 {
        return Vec::new();
    }
    let mut remaining = max_cells - 1;
    let mut out = Vec::new();
    for seg in segments {
        let piece = take_width(&seg.text, remaining);
        if !piece.is_empty() {
            out.push(Segment {
                kind: seg.kind,
                text: piece.to_string(),
            });
            remaining -= display_width(piece);
        }
        if piece.len() < seg.text.len() {
            break;
        }
    }
    out.push(Segment {
        kind: SegmentKind::Plain,
        text: "\u{2026}".to_string(),
    });
    out
}

/// Format one task for `list`. Full view adds position, id, date and a
/// comment line; simple view is a single status-and-text line.
pub fn format_task_lines(task: &Task, opts: &RenderOptions) -> Vec<String> {
    let prefix = if opts.simple {
        format!("{} ", status_symbol(task.status))
    } else {
        format!(
            "{:>3} {} {}  {}  ",
            task.order,
            status_symbol(task.status),
            short_id(&task.id),
            task.date_key()
        )
    };

    let mut segments = render_highlighted_text(&task.text);
    if let Some(width) = opts.width {
        segments = truncate_segments(&segments, width.saturating_sub(display_width(&prefix)));
    }

    let mut lines = vec![format!("{}{}", prefix, render_segments(&segments, opts.color))];
    if !opts.simple && !task.comment.is_empty() {
        for line in task.comment.lines() {
            lines.push(format!("{}// {}", " ".repeat(8), line));
        }
    }
    lines
}

/// Format detailed task view
pub fn format_task_detail(task: &Task, opts: &RenderOptions) -> Vec<String> {
    let field = |name: &str, value: String| format!("{}{}", pad_to_width(name, 10), value);
    let mut lines = vec![
        format!(
            "{} {}",
            status_symbol(task.status),
            render_segments(&render_highlighted_text(&task.text), opts.color)
        ),
        field("id:", task.id.clone()),
        field("status:", task.status.to_string()),
    ];
    if let Some(prev) = task.previous_status
        && task.status == TaskStatus::Completed
    {
        lines.push(field("was:", prev.to_string()));
    }
    lines.push(field("created:", task.date_key()));
    lines.push(field("position:", task.order.to_string()));
    if !task.tags.is_empty() {
        let tags: Vec<String> = task.tags.iter().map(|t| format!("#{}", t)).collect();
        lines.push(field("tags:", tags.join(" ")));
    }
    if !task.mentions.is_empty() {
        let mentions: Vec<String> = task.mentions.iter().map(|m| format!("@{}", m)).collect();
        lines.push(field("mentions:", mentions.join(" ")));
    }
    if !task.comment.is_empty() {
        lines.push("comment:".to_string());
        for line in task.comment.lines() {
            lines.push(format!("  {}", line));
        }
    }
    lines
}

/// Parse a status string into TaskStatus
pub fn parse_status(s: &str) -> Result<TaskStatus, String> {
    TaskStatus::from_label(s).ok_or_else(|| {
        format!(
            "unknown status '{}' (expected: not-started, in-progress, on-hold, completed)",
            s
        )
    })
}
