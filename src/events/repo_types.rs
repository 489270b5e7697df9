use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::Date;
use uuid::Uuid;

use crate::{auth::Role, error::StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Audience {
    All,
    Students,
    Staff,
    Parents,
}

impl Audience {
    pub fn as_str(self) -> &'static str {
        match self {
            Audience::All => "all",
            Audience::Students => "students",
            Audience::Staff => "staff",
            Audience::Parents => "parents",
        }
    }

    /// Audiences whose events a user with `role` gets to see.
    pub fn visible_to(role: Role) -> &'static [Audience] {
        match role {
            Role::Admin => &[
                Audience::All,
                Audience::Students,
                Audience::Staff,
                Audience::Parents,
            ],
            Role::Teacher | Role::Editor => &[Audience::All, Audience::Staff],
            Role::Student => &[Audience::All, Audience::Students],
            Role::Parent => &[Audience::All, Audience::Parents],
        }
    }
}

impl fmt::Display for Audience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Audience {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Audience::All),
            "students" => Ok(Audience::Students),
            "staff" => Ok(Audience::Staff),
            "parents" => Ok(Audience::Parents),
            other => Err(StoreError::Database(format!("unknown audience {other:?}"))),
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct EventRow {
    pub id: Uuid,
    pub title: String,
    pub event_date: Date,
    pub location: Option<String>,
    pub audience: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchoolEvent {
    pub id: Uuid,
    pub title: String,
    pub event_date: Date,
    pub location: Option<String>,
    pub audience: Audience,
    pub description: Option<String>,
}

impl TryFrom<EventRow> for SchoolEvent {
    type Error = StoreError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            title: row.title,
            event_date: row.event_date,
            location: row.location,
            audience: row.audience.parse()?,
            description: row.description,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewEvent {
    pub title: String,
    pub event_date: Date,
    pub location: Option<String>,
    pub audience: Audience,
    pub description: Option<String>,
}
