use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Which optional club columns exist in the live schema. `id`, `name` and
/// `member_count` are always present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClubColumns {
    pub category: bool,
    pub meeting_day: bool,
    pub description: bool,
}

impl ClubColumns {
    pub const fn base_only() -> Self {
        Self {
            category: false,
            meeting_day: false,
            description: false,
        }
    }

    #[cfg(test)]
    pub const fn all() -> Self {
        Self {
            category: true,
            meeting_day: true,
            description: true,
        }
    }

    pub fn from_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let mut cols = Self::base_only();
        for name in names {
            match name {
                "category" => cols.category = true,
                "meeting_day" => cols.meeting_day = true,
                "description" => cols.description = true,
                _ => {}
            }
        }
        cols
    }

    /// Narrows `club` to the supported columns, returning the names of the
    /// fields that carried a value but had to be left out.
    pub fn fit(&self, club: &NewClub) -> (NewClub, Vec<String>) {
        let mut fitted = club.clone();
        let mut dropped = Vec::new();
        if !self.category && fitted.category.take().is_some() {
            dropped.push("category".to_string());
        }
        if !self.meeting_day && fitted.meeting_day.take().is_some() {
            dropped.push("meeting_day".to_string());
        }
        if !self.description && fitted.description.take().is_some() {
            dropped.push("description".to_string());
        }
        (fitted, dropped)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Club {
    pub id: Uuid,
    pub name: String,
    pub category: Option<String>,
    pub description: Option<String>,
    pub meeting_day: Option<String>,
    pub member_count: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewClub {
    pub name: String,
    pub category: Option<String>,
    pub description: Option<String>,
    pub meeting_day: Option<String>,
}
