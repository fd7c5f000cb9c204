use chrono::{DateTime, Local, NaiveDate, SubsecRound, Utc};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::quadrant::Quadrant;

/// Task priority. Declaration order is display order (high first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
    #[default]
    None,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::High,
        Priority::Medium,
        Priority::Low,
        Priority::None,
    ];

    /// Rank used for sorting: lower ranks are displayed first
    pub fn sort_rank(self) -> u8 {
        match self {
            Priority::High => 0,
            Priority::Medium => 1,
            Priority::Low => 2,
            Priority::None => 3,
        }
    }

    /// High and medium tasks count as important for quadrant placement
    pub fn is_important(self) -> bool {
        match self {
            Priority::High | Priority::Medium => true,
            Priority::Low | Priority::None => false,
        }
    }

    /// The wire/CLI name of this priority
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
            Priority::None => "none",
        }
    }

    /// Parse a priority name (case-insensitive)
    pub fn parse_priority(s: &str) -> Option<Priority> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" | "h" => Some(Priority::High),
            "medium" | "med" | "m" => Some(Priority::Medium),
            "low" | "l" => Some(Priority::Low),
            "none" | "-" => Some(Priority::None),
            _ => None,
        }
    }
}

/// A single task record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    /// Immutable identifier
    pub id: Uuid,
    /// Trimmed title, 1..=200 characters
    pub title: String,
    /// Free-form detail text, may be empty
    pub detail: String,
    pub is_completed: bool,
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
    /// Present exactly when `is_completed` is true
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    pub due_date: Option<DateTime<Utc>>,
    /// Relative position within the task's priority group
    pub sort_order: i64,
    /// Tag references in insertion order. May dangle after a tag is deleted elsewhere.
    pub tag_ids: IndexSet<Uuid>,
}

impl Task {
    /// Create a new open task with a fresh identifier and current timestamps
    pub fn new(title: String, priority: Priority, sort_order: i64) -> Self {
        let now = now_millis();
        Task {
            id: Uuid::new_v4(),
            title,
            detail: String::new(),
            is_completed: false,
            priority,
            created_at: now,
            completed_at: None,
            updated_at: now,
            due_date: None,
            sort_order,
            tag_ids: IndexSet::new(),
        }
    }

    /// Stamp the last-modified time
    pub fn touch(&mut self) {
        self.updated_at = now_millis();
    }

    /// Set the completion flag, keeping `completed_at` in step with it
    pub fn set_completed(&mut self, completed: bool) {
        self.is_completed = completed;
        self.completed_at = if completed { Some(now_millis()) } else { None };
        self.touch();
    }

    /// Quadrant relative to the local calendar day
    pub fn quadrant(&self) -> Quadrant {
        self.quadrant_on(Local::now().date_naive())
    }

    /// Quadrant relative to an explicit "today"
    pub fn quadrant_on(&self, today: NaiveDate) -> Quadrant {
        let urgent = self
            .due_date
            .is_some_and(|due| due.with_timezone(&Local).date_naive() <= today);
        Quadrant::from_flags(self.priority.is_important(), urgent)
    }
}

/// Current time truncated to the precision the codec persists
pub fn now_millis() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}
