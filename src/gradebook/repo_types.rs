use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::AppError;

/// Beginning, middle and end of term marking periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AssessmentType {
    Bot,
    Mot,
    Eot,
}

impl AssessmentType {
    pub fn as_str(self) -> &'static str {
        match self {
            AssessmentType::Bot => "BOT",
            AssessmentType::Mot => "MOT",
            AssessmentType::Eot => "EOT",
        }
    }
}

impl fmt::Display for AssessmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssessmentType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BOT" => Ok(AssessmentType::Bot),
            "MOT" => Ok(AssessmentType::Mot),
            "EOT" => Ok(AssessmentType::Eot),
            _ => Err(AppError::validation(format!(
                "Unknown assessment type {s:?}; expected BOT, MOT or EOT"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct SheetStudent {
    pub id: Uuid,
    pub full_name: String,
    pub student_id_human: String,
}

#[derive(Debug, Clone, Copy, PartialEq, FromRow)]
pub struct MarkRow {
    pub student_id: Uuid,
    pub score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkUpsert {
    pub student_id: Uuid,
    pub score: f64,
}

/// Per-row result of a batched mark write.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkOutcome {
    pub student_id: Uuid,
    pub error: Option<String>,
}
