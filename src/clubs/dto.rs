use serde::{Deserialize, Serialize};

use super::repo_types::Club;

#[derive(Debug, Deserialize)]
pub struct CreateClubRequest {
    pub name: String,
    pub category: Option<String>,
    pub description: Option<String>,
    pub meeting_day: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedClub {
    pub club: Club,
    /// Fields that were supplied but not stored because the schema lacks them.
    pub dropped_fields: Vec<String>,
}
