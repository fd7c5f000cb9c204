use serde::Serialize;

/// Importance x urgency classification of a task. Derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Quadrant {
    UrgentImportant,
    NotUrgentImportant,
    UrgentNotImportant,
    NotUrgentNotImportant,
}

impl Quadrant {
    /// Row-major grid order: Q1 | Q2 over Q3 | Q4
    pub const GRID_ORDER: [Quadrant; 4] = [
        Quadrant::UrgentImportant,
        Quadrant::NotUrgentImportant,
        Quadrant::UrgentNotImportant,
        Quadrant::NotUrgentNotImportant,
    ];

    pub fn from_flags(important: bool, urgent: bool) -> Quadrant {
        match (important, urgent) {
            (true, true) => Quadrant::UrgentImportant,
            (true, false) => Quadrant::NotUrgentImportant,
            (false, true) => Quadrant::UrgentNotImportant,
            (false, false) => Quadrant::NotUrgentNotImportant,
        }
    }

    pub fn is_important(self) -> bool {
        matches!(
            self,
            Quadrant::UrgentImportant | Quadrant::NotUrgentImportant
        )
    }

    pub fn is_urgent(self) -> bool {
        matches!(
            self,
            Quadrant::UrgentImportant | Quadrant::UrgentNotImportant
        )
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Quadrant::UrgentImportant => "Urgent & important",
            Quadrant::NotUrgentImportant => "Important, not urgent",
            Quadrant::UrgentNotImportant => "Urgent, not important",
            Quadrant::NotUrgentNotImportant => "Neither",
        }
    }

    /// Suggested action for tasks in this quadrant
    pub fn action_hint(self) -> &'static str {
        match self {
            Quadrant::UrgentImportant => "do now",
            Quadrant::NotUrgentImportant => "schedule",
            Quadrant::UrgentNotImportant => "delegate",
            Quadrant::NotUrgentNotImportant => "drop",
        }
    }
}
