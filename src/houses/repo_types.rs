use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct House {
    pub id: Uuid,
    pub name: String,
    pub color: String,
    pub points: i32,
    pub members: i32,
}

#[derive(Debug, Clone)]
pub struct NewHouse {
    pub name: String,
    pub color: String,
}
