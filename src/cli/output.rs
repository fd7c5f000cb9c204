use chrono::Local;
use serde::Serialize;
use uuid::Uuid;

use crate::model::quadrant::Quadrant;
use crate::model::tag::Tag;
use crate::model::task::{Priority, Task};
use crate::ops::import::ImportSummary;
use crate::parse::format_timestamp;
use crate::util::unicode::{fit_to_width, truncate_to_width};

/// Hex digits of a UUID shown in listings
pub const SHORT_ID_LEN: usize = 8;

/// Title cells in one-line listings
const TITLE_CELLS: usize = 60;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct TaskJson {
    pub id: Uuid,
    pub title: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub detail: String,
    pub completed: bool,
    pub priority: Priority,
    pub quadrant: Quadrant,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due: Option<String>,
    pub created: String,
    pub updated: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
}

#[derive(Serialize)]
pub struct TagJson {
    pub id: Uuid,
    pub name: String,
    pub color: &'static str,
    /// Number of tasks carrying this tag
    pub tasks: usize,
}

#[derive(Serialize)]
pub struct QuadrantJson {
    pub quadrant: Quadrant,
    pub name: &'static str,
    pub hint: &'static str,
    pub tasks: Vec<TaskJson>,
}

#[derive(Serialize)]
pub struct ImportJson {
    pub added: usize,
    pub skipped: usize,
    pub tags_added: usize,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

/// A task's tags in its own order, skipping references to deleted tags
fn resolve_tags<'a>(task: &Task, tags: &'a [Tag]) -> Vec<&'a Tag> {
    task.tag_ids
        .iter()
        .filter_map(|id| tags.iter().find(|t| t.id == *id))
        .collect()
}

pub fn task_to_json(task: &Task, tags: &[Tag]) -> TaskJson {
    TaskJson {
        id: task.id,
        title: task.title.clone(),
        detail: task.detail.clone(),
        completed: task.is_completed,
        priority: task.priority,
        quadrant: task.quadrant(),
        tags: resolve_tags(task, tags).iter().map(|t| t.name.clone()).collect(),
        due: task.due_date.map(|d| d.with_timezone(&Local).date_naive().to_string()),
        created: format_timestamp(&task.created_at),
        updated: format_timestamp(&task.updated_at),
        completed_at: task.completed_at.as_ref().map(format_timestamp),
    }
}

pub fn tag_to_json(tag: &Tag, tasks: &[Task]) -> TagJson {
    TagJson {
        id: tag.id,
        name: tag.name.clone(),
        color: tag.color.as_str(),
        tasks: tasks.iter().filter(|t| t.tag_ids.contains(&tag.id)).count(),
    }
}

pub fn quadrant_to_json(quadrant: Quadrant, tasks: &[Task], tags: &[Tag]) -> QuadrantJson {
    QuadrantJson {
        quadrant,
        name: quadrant.display_name(),
        hint: quadrant.action_hint(),
        tasks: tasks.iter().map(|t| task_to_json(t, tags)).collect(),
    }
}

pub fn import_to_json(summary: &ImportSummary) -> ImportJson {
    ImportJson {
        added: summary.added,
        skipped: summary.skipped,
        tags_added: summary.tags_added,
    }
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

pub fn short_id(id: &Uuid) -> String {
    id.simple().to_string()[..SHORT_ID_LEN].to_string()
}

fn priority_label(priority: Priority) -> &'static str {
    match priority {
        Priority::High => "!!!",
        Priority::Medium => "!!",
        Priority::Low => "!",
        Priority::None => "",
    }
}

/// `#name`, wrapped in the tag's ANSI color when `color` is set
fn format_tag(tag: &Tag, color: bool) -> String {
    if color {
        format!("\x1b[{}m#{}\x1b[0m", tag.color.ansi_code(), tag.name)
    } else {
        format!("#{}", tag.name)
    }
}

/// Format a single task as a one-line summary
pub fn format_task_line(task: &Task, tags: &[Tag], color: bool) -> String {
    let check = if task.is_completed { 'x' } else { ' ' };
    let mut line = format!(
        "[{}] {} {} {}",
        check,
        short_id(&task.id),
        fit_to_width(priority_label(task.priority), 3),
        truncate_to_width(&task.title, TITLE_CELLS)
    );
    for tag in resolve_tags(task, tags) {
        line.push(' ');
        line.push_str(&format_tag(tag, color));
    }
    if let Some(due) = task.due_date {
        line.push_str(&format!(" (due {})", due.with_timezone(&Local).date_naive()));
    }
    line
}

/// Format detailed task view
pub fn format_task_detail(task: &Task, tags: &[Tag], color: bool) -> Vec<String> {
    let mut lines = Vec::new();
    let check = if task.is_completed { 'x' } else { ' ' };
    lines.push(format!("[{}] {}", check, task.title));
    lines.push(format!("id: {}", task.id));
    lines.push(format!("priority: {}", task.priority.as_str()));

    let quadrant = task.quadrant();
    lines.push(format!(
        "quadrant: {} ({})",
        quadrant.display_name(),
        quadrant.action_hint()
    ));

    let task_tags = resolve_tags(task, tags);
    if !task_tags.is_empty() {
        lines.push(format!(
            "tags: {}",
            task_tags
                .iter()
                .map(|t| format_tag(t, color))
                .collect::<Vec<_>>()
                .join(" ")
        ));
    }
    if let Some(due) = task.due_date {
        lines.push(format!("due: {}", due.with_timezone(&Local).date_naive()));
    }
    lines.push(format!("created: {}", format_timestamp(&task.created_at)));
    lines.push(format!("updated: {}", format_timestamp(&task.updated_at)));
    if let Some(done) = task.completed_at {
        lines.push(format!("completed: {}", format_timestamp(&done)));
    }
    if !task.detail.is_empty() {
        lines.push("detail:".to_string());
        for line in task.detail.lines() {
            lines.push(format!("  {}", line));
        }
    }
    lines
}

/// Format a quadrant header with its task count
pub fn format_quadrant_header(quadrant: Quadrant, count: usize) -> String {
    format!(
        "== {} [{}] ({}) ==",
        quadrant.display_name(),
        quadrant.action_hint(),
        count
    )
}

pub fn format_tag_line(tag: &Tag, tasks: &[Task], color: bool) -> String {
    let count = tasks.iter().filter(|t| t.tag_ids.contains(&tag.id)).count();
    format!(
        "{} {} {} ({} tasks)",
        short_id(&tag.id),
        format_tag(tag, color),
        tag.color.as_str(),
        count
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tag::TagColor;
    use pretty_assertions::assert_eq;

    fn fixed_task(title: &str, priority: Priority) -> Task {
        let mut task = Task::new(title.to_string(), priority, 0);
        task.id = Uuid::parse_str("12345678-1234-4234-8234-123456789012").unwrap();
        task
    }

    #[test]
    fn task_line_shows_state_id_priority_and_tags() {
        let tag = Tag::new("home".into(), TagColor::Green);
        let mut task = fixed_task("Water plants", Priority::Medium);
        task.tag_ids.insert(tag.id);
        // Dangling reference is skipped
        task.tag_ids.insert(Uuid::new_v4());
        assert_eq!(
            format_task_line(&task, &[tag], false),
            "[ ] 12345678 !!  Water plants #home"
        );
    }

    #[test]
    fn completed_task_line() {
        let mut task = fixed_task("Done thing", Priority::None);
        task.set_completed(true);
        assert_eq!(format_task_line(&task, &[], false), "[x] 12345678     Done thing");
    }

    #[test]
    fn colored_tag_uses_ansi_code() {
        let tag = Tag::new("urgent".into(), TagColor::Red);
        assert_eq!(
            format_tag(&tag, true),
            format!("\x1b[{}m#urgent\x1b[0m", TagColor::Red.ansi_code())
        );
    }

    #[test]
    fn long_titles_are_truncated() {
        let task = fixed_task(&"a".repeat(100), Priority::None);
        let line = format_task_line(&task, &[], false);
        assert!(line.ends_with('\u{2026}'));
    }

    #[test]
    fn detail_view_lists_fields() {
        let mut task = fixed_task("Plan trip", Priority::High);
        task.detail = "book flights\nfind hotel".into();
        let lines = format_task_detail(&task, &[], false);
        assert_eq!(lines[0], "[ ] Plan trip");
        assert_eq!(lines[2], "priority: high");
        assert_eq!(lines[3], "quadrant: Important, not urgent (schedule)");
        assert!(lines.ends_with(&["detail:".to_string(), "  book flights".to_string(), "  find hotel".to_string()]));
    }

    #[test]
    fn json_skips_empty_optionals() {
        let task = fixed_task("plain", Priority::None);
        let value = serde_json::to_value(task_to_json(&task, &[])).unwrap();
        assert!(value.get("detail").is_none());
        assert!(value.get("due").is_none());
        assert_eq!(value["quadrant"], "not-urgent-not-important");
        assert_eq!(value["priority"], "none");
    }
}
