use serde::{Deserialize, Serialize};
use time::Date;
use uuid::Uuid;

use super::repo_types::{AcademicYear, AllocationView, ClassLevel, Stream, Subject};
use crate::auth::Profile;

fn yes() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct CreateYearRequest {
    pub name: String,
    pub start_date: Date,
    pub end_date: Date,
    #[serde(default = "yes")]
    pub make_current: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateTermRequest {
    pub name: String,
    pub start_date: Date,
    pub end_date: Date,
    #[serde(default = "yes")]
    pub make_current: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateSubjectRequest {
    pub name: String,
    pub code: Option<String>,
    pub level: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateClassLevelRequest {
    pub name: String,
    pub level: i32,
}

#[derive(Debug, Deserialize)]
pub struct CreateStreamRequest {
    pub name: String,
    pub class_id: Uuid,
}

/// Every field is optional on the wire so an unfinished form is reported as
/// such instead of as a deserialization failure.
#[derive(Debug, Default, Deserialize)]
pub struct AllocateRequest {
    pub teacher_id: Option<Uuid>,
    pub subject_id: Option<Uuid>,
    pub class_id: Option<Uuid>,
    pub stream_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct AllocationQuery {
    #[serde(default = "default_allocation_limit")]
    pub limit: i64,
}

fn default_allocation_limit() -> i64 {
    20
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActiveYearSource {
    /// The settings pointer names this year.
    Current,
    /// No pointer is set; this is the latest year by start date.
    MostRecent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveYear {
    #[serde(flatten)]
    pub year: AcademicYear,
    pub source: ActiveYearSource,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ActiveYearResponse {
    pub active_year: Option<ActiveYear>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Overview {
    pub teachers: Vec<Profile>,
    pub subjects: Vec<Subject>,
    pub class_levels: Vec<ClassLevel>,
    pub streams: Vec<Stream>,
    pub years: Vec<AcademicYear>,
    pub allocations: Vec<AllocationView>,
    pub active_year: Option<ActiveYear>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedReport {
    pub inserted: usize,
    pub skipped: usize,
}
