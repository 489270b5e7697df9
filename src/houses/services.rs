use tracing::info;
use uuid::Uuid;

use super::{
    dto::{AwardPoints, CreateHouseRequest},
    repo::HouseRepo,
    repo_types::{House, NewHouse},
};
use crate::{
    academics::dto::SeedReport,
    error::{AppError, AppResult, StoreError},
};

const DEFAULT_COLOR: &str = "#94a3b8";

/// The four houses a fresh school starts with.
const DEFAULT_HOUSES: [(&str, &str); 4] = [
    ("Red", "#ef4444"),
    ("Blue", "#3b82f6"),
    ("Green", "#22c55e"),
    ("Yellow", "#eab308"),
];

pub async fn create_house<S: HouseRepo + ?Sized>(
    store: &S,
    req: CreateHouseRequest,
) -> AppResult<House> {
    let name = req.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::validation("House name is required"));
    }
    let color = req
        .color
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| DEFAULT_COLOR.to_string());
    let house = store
        .insert_house(&NewHouse {
            name: name.clone(),
            color,
        })
        .await
        .map_err(|e| match e {
            StoreError::UniqueViolation(_) => {
                AppError::Conflict(format!("A house named {name} already exists"))
            }
            other => other.into(),
        })?;
    info!(house_id = %house.id, name = %house.name, "house created");
    Ok(house)
}

/// Inserts whichever default houses are missing by name.
pub async fn seed_houses<S: HouseRepo + ?Sized>(store: &S) -> AppResult<SeedReport> {
    let existing: Vec<String> = store
        .list_houses()
        .await?
        .into_iter()
        .map(|h| h.name.to_lowercase())
        .collect();
    let mut inserted = 0;
    for (name, color) in DEFAULT_HOUSES {
        if existing.contains(&name.to_lowercase()) {
            continue;
        }
        store
            .insert_house(&NewHouse {
                name: name.into(),
                color: color.into(),
            })
            .await?;
        inserted += 1;
    }
    let report = SeedReport {
        inserted,
        skipped: DEFAULT_HOUSES.len() - inserted,
    };
    info!(?report, "houses seeded");
    Ok(report)
}

pub async fn award_points<S: HouseRepo + ?Sized>(
    store: &S,
    house_id: Uuid,
    award: AwardPoints,
) -> AppResult<House> {
    if award.delta == 0 {
        return Err(AppError::validation("Points change must be non-zero"));
    }
    let house = store
        .adjust_points(house_id, award.delta)
        .await
        .map_err(|e| match e {
            StoreError::NotFound => AppError::not_found("House not found"),
            other => other.into(),
        })?;
    info!(
        house_id = %house.id,
        delta = award.delta,
        total = house.points,
        reason = award.reason.as_deref().unwrap_or(""),
        "house points adjusted"
    );
    Ok(house)
}
