use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::{info, warn};
use uuid::Uuid;

use super::{
    dto::{FailedMark, GradeSheet, MarkCell, SaveMarksRequest, SaveMarksResponse, SheetRow},
    repo::GradebookRepo,
    repo_types::{AssessmentType, MarkUpsert},
};
use crate::{
    academics::repo_types::AllocationView,
    error::{AppError, AppResult},
};

/// Roster size used to check that written marks belong to the stream.
const ROSTER_LIMIT: i64 = 1_000;

/// Display grade for a score. Not persisted.
pub fn grade_band(score: Option<f64>) -> &'static str {
    match score {
        None => "-",
        Some(s) if s >= 80.0 => "A",
        Some(s) if s >= 70.0 => "B",
        Some(s) if s >= 60.0 => "C",
        Some(s) if s >= 50.0 => "D",
        Some(_) => "F",
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEffect {
    Set(f64),
    Cleared,
    Ignored,
}

/// Unsaved marks keyed by student.
#[derive(Debug, Clone, Default)]
pub struct PendingMarks {
    scores: BTreeMap<Uuid, f64>,
}

impl PendingMarks {
    /// A number in 0..=100 sets the mark, empty input clears it, anything
    /// else leaves the draft untouched.
    pub fn apply_input(&mut self, student_id: Uuid, raw: &str) -> InputEffect {
        let raw = raw.trim();
        if raw.is_empty() {
            self.scores.remove(&student_id);
            return InputEffect::Cleared;
        }
        match raw.parse::<f64>() {
            Ok(n) if (0.0..=100.0).contains(&n) => {
                self.scores.insert(student_id, n);
                InputEffect::Set(n)
            }
            _ => InputEffect::Ignored,
        }
    }

    #[cfg(test)]
    pub fn get(&self, student_id: Uuid) -> Option<f64> {
        self.scores.get(&student_id).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn to_upserts(&self) -> Vec<MarkUpsert> {
        self.scores
            .iter()
            .map(|(&student_id, &score)| MarkUpsert { student_id, score })
            .collect()
    }
}

fn cell_text(cell: &MarkCell) -> String {
    match &cell.value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Loads an allocation the caller owns; anyone else's is reported missing.
async fn owned_allocation<S: GradebookRepo + ?Sized>(
    store: &S,
    teacher_id: Uuid,
    allocation_id: Uuid,
) -> AppResult<AllocationView> {
    match store.find_allocation(allocation_id).await? {
        Some(a) if a.teacher_id == teacher_id => Ok(a),
        Some(_) => {
            warn!(%teacher_id, %allocation_id, "allocation belongs to another teacher");
            Err(AppError::not_found("Allocation not found"))
        }
        None => Err(AppError::not_found("Allocation not found")),
    }
}

pub async fn my_allocations<S: GradebookRepo + ?Sized>(
    store: &S,
    teacher_id: Uuid,
) -> AppResult<Vec<AllocationView>> {
    Ok(store.list_teacher_allocations(teacher_id).await?)
}

pub async fn load_sheet<S: GradebookRepo + ?Sized>(
    store: &S,
    teacher_id: Uuid,
    allocation_id: Uuid,
    assessment: AssessmentType,
    limit: i64,
) -> AppResult<GradeSheet> {
    let allocation = owned_allocation(store, teacher_id, allocation_id).await?;
    let (students, marks) = tokio::try_join!(
        store.students_in_stream(allocation.stream_id, limit.clamp(1, 500)),
        store.marks_for(allocation_id, assessment),
    )?;
    let scores: HashMap<Uuid, f64> = marks.into_iter().map(|m| (m.student_id, m.score)).collect();

    let rows: Vec<SheetRow> = students
        .into_iter()
        .map(|s| {
            let score = scores.get(&s.id).copied();
            SheetRow {
                student_id: s.id,
                student_id_human: s.student_id_human,
                full_name: s.full_name,
                score,
                grade: grade_band(score).to_string(),
            }
        })
        .collect();

    let entered: Vec<f64> = rows.iter().filter_map(|r| r.score).collect();
    let average = (!entered.is_empty())
        .then(|| (entered.iter().sum::<f64>() / entered.len() as f64 * 10.0).round() / 10.0);

    Ok(GradeSheet {
        allocation,
        assessment_type: assessment,
        rows,
        average,
    })
}

pub async fn save_marks<S: GradebookRepo + ?Sized>(
    store: &S,
    teacher_id: Uuid,
    allocation_id: Uuid,
    req: SaveMarksRequest,
) -> AppResult<SaveMarksResponse> {
    let allocation = owned_allocation(store, teacher_id, allocation_id).await?;

    let mut draft = PendingMarks::default();
    let mut ignored = Vec::new();
    let mut cleared = HashSet::new();
    for cell in &req.cells {
        match draft.apply_input(cell.student_id, &cell_text(cell)) {
            InputEffect::Set(_) => {
                cleared.remove(&cell.student_id);
            }
            InputEffect::Cleared => {
                cleared.insert(cell.student_id);
            }
            InputEffect::Ignored => ignored.push(cell.student_id),
        }
    }

    let mut response = SaveMarksResponse {
        cleared: cleared.into_iter().collect(),
        ignored,
        ..Default::default()
    };
    if draft.is_empty() {
        return Ok(response);
    }

    let roster: HashSet<Uuid> = store
        .students_in_stream(allocation.stream_id, ROSTER_LIMIT)
        .await?
        .into_iter()
        .map(|s| s.id)
        .collect();
    let (in_stream, outside): (Vec<MarkUpsert>, Vec<MarkUpsert>) = draft
        .to_upserts()
        .into_iter()
        .partition(|m| roster.contains(&m.student_id));
    response.failed.extend(outside.into_iter().map(|m| FailedMark {
        student_id: m.student_id,
        error: format!("Student is not enrolled in {}", allocation.stream_name),
    }));

    let outcomes = store
        .upsert_marks(allocation_id, req.assessment_type, &in_stream)
        .await?;
    for outcome in outcomes {
        match outcome.error {
            None => response.saved += 1,
            Some(error) => response.failed.push(FailedMark {
                student_id: outcome.student_id,
                error,
            }),
        }
    }

    info!(
        %allocation_id,
        assessment = %req.assessment_type,
        saved = response.saved,
        failed = response.failed.len(),
        ignored = response.ignored.len(),
        "marks saved"
    );
    Ok(response)
}
