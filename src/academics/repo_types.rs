use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Subject {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub level: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewSubject {
    pub name: String,
    pub code: String,
    pub level: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ClassLevel {
    pub id: Uuid,
    pub name: String,
    pub level: i32, // ordinal, Senior 1 = 1
}

#[derive(Debug, Clone)]
pub struct NewClassLevel {
    pub name: String,
    pub level: i32,
}

/// Subdivision of a class level; belongs to exactly one class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Stream {
    pub id: Uuid,
    pub name: String,
    pub class_id: Uuid,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewStream {
    pub name: String,
    pub class_id: Uuid,
}

/// `is_current` is derived from the settings pointer on every read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct AcademicYear {
    pub id: Uuid,
    pub name: String,
    pub start_date: Date,
    pub end_date: Date,
    pub current_term_id: Option<Uuid>,
    pub is_current: bool,
}

#[derive(Debug, Clone)]
pub struct NewYear {
    pub name: String,
    pub start_date: Date,
    pub end_date: Date,
}

/// `is_current` is derived from the owning year's `current_term_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Term {
    pub id: Uuid,
    pub academic_year_id: Uuid,
    pub name: String,
    pub start_date: Date,
    pub end_date: Date,
    pub is_current: bool,
}

#[derive(Debug, Clone)]
pub struct NewTerm {
    pub academic_year_id: Uuid,
    pub name: String,
    pub start_date: Date,
    pub end_date: Date,
}

/// One teacher teaching one subject to one stream for one academic year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct TeacherAllocation {
    pub id: Uuid,
    pub teacher_id: Uuid,
    pub subject_id: Uuid,
    pub stream_id: Uuid,
    pub academic_year_id: Uuid,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewAllocation {
    pub teacher_id: Uuid,
    pub subject_id: Uuid,
    pub stream_id: Uuid,
    pub academic_year_id: Uuid,
}

/// Allocation joined with the display names the dashboards show.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct AllocationView {
    pub id: Uuid,
    pub teacher_id: Uuid,
    pub teacher_name: String,
    pub subject_id: Uuid,
    pub subject_name: String,
    pub subject_code: String,
    pub stream_id: Uuid,
    pub stream_name: String,
    pub class_name: String,
    pub academic_year_id: Uuid,
    pub created_at: OffsetDateTime,
}
