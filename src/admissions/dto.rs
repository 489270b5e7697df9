use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repo_types::{Gender, Student};
use crate::{
    academics::repo_types::{ClassLevel, Stream},
    clubs::repo_types::Club,
};

/// Options for the admission form's cascading selects.
#[derive(Debug, Serialize, Deserialize)]
pub struct FormData {
    pub class_levels: Vec<ClassLevel>,
    pub streams: Vec<Stream>,
    pub clubs: Vec<Club>,
}

#[derive(Debug, Deserialize)]
pub struct AdmitRequest {
    pub full_name: String,
    pub student_id_human: String,
    #[serde(default = "default_gender")]
    pub gender: Gender,
    pub class_id: Option<Uuid>,
    pub stream_id: Option<Uuid>,
    pub club_id: Option<Uuid>,
}

fn default_gender() -> Gender {
    Gender::M
}

/// Outcome of the optional club link; never fails the admission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ClubEnrollment {
    NotRequested,
    Enrolled { club_id: Uuid },
    Failed { club_id: Uuid, reason: String },
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AdmissionResponse {
    pub student: Student,
    pub club_enrollment: ClubEnrollment,
}
