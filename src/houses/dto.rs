use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CreateHouseRequest {
    pub name: String,
    /// CSS colour used for the house badge; falls back to a neutral grey.
    pub color: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AwardPoints {
    pub delta: i32,
    pub reason: Option<String>,
}
