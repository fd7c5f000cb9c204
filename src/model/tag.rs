use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::task::now_millis;

/// Closed set of tag colors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagColor {
    Red,
    Orange,
    Yellow,
    Green,
    #[default]
    Blue,
    Purple,
    Pink,
    Gray,
}

impl TagColor {
    pub const ALL: [TagColor; 8] = [
        TagColor::Red,
        TagColor::Orange,
        TagColor::Yellow,
        TagColor::Green,
        TagColor::Blue,
        TagColor::Purple,
        TagColor::Pink,
        TagColor::Gray,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TagColor::Red => "red",
            TagColor::Orange => "orange",
            TagColor::Yellow => "yellow",
            TagColor::Green => "green",
            TagColor::Blue => "blue",
            TagColor::Purple => "purple",
            TagColor::Pink => "pink",
            TagColor::Gray => "gray",
        }
    }

    /// ANSI SGR foreground code used when printing the tag in a terminal
    pub fn ansi_code(self) -> u8 {
        match self {
            TagColor::Red => 31,
            TagColor::Orange => 91,
            TagColor::Yellow => 33,
            TagColor::Green => 32,
            TagColor::Blue => 34,
            TagColor::Purple => 35,
            TagColor::Pink => 95,
            TagColor::Gray => 90,
        }
    }

    pub fn parse_color(s: &str) -> Option<TagColor> {
        let s = s.trim().to_ascii_lowercase();
        match s.as_str() {
            "grey" => Some(TagColor::Gray),
            _ => TagColor::ALL.into_iter().find(|c| c.as_str() == s),
        }
    }
}

/// A user-defined label that tasks reference by id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub id: Uuid,
    /// Trimmed name, 1..=50 characters
    pub name: String,
    pub color: TagColor,
    pub created_at: DateTime<Utc>,
}

impl Tag {
    pub fn new(name: String, color: TagColor) -> Self {
        Tag {
            id: Uuid::new_v4(),
            name,
            color,
            created_at: now_millis(),
        }
    }
}
