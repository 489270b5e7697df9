use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repo_types::AssessmentType;
use crate::academics::repo_types::AllocationView;

#[derive(Debug, Deserialize)]
pub struct SheetQuery {
    #[serde(default = "default_assessment")]
    pub assessment: AssessmentType,
    #[serde(default = "default_sheet_limit")]
    pub limit: i64,
}

fn default_assessment() -> AssessmentType {
    AssessmentType::Bot
}

fn default_sheet_limit() -> i64 {
    100
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetRow {
    pub student_id: Uuid,
    pub student_id_human: String,
    pub full_name: String,
    pub score: Option<f64>,
    pub grade: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GradeSheet {
    pub allocation: AllocationView,
    pub assessment_type: AssessmentType,
    pub rows: Vec<SheetRow>,
    /// Mean of the entered scores, one decimal place.
    pub average: Option<f64>,
}

/// Raw cell content as typed into the sheet: a number, a string, or null.
#[derive(Debug, Deserialize)]
pub struct MarkCell {
    pub student_id: Uuid,
    #[serde(default)]
    pub value: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct SaveMarksRequest {
    pub assessment_type: AssessmentType,
    pub cells: Vec<MarkCell>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedMark {
    pub student_id: Uuid,
    pub error: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SaveMarksResponse {
    pub saved: usize,
    /// Students whose pending mark was cleared and therefore not written.
    pub cleared: Vec<Uuid>,
    pub failed: Vec<FailedMark>,
    /// Cells rejected as non-numeric or outside 0..=100.
    pub ignored: Vec<Uuid>,
}
