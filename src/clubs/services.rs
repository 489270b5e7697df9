use tokio::sync::RwLock;
use tracing::{info, warn};

use super::{
    dto::{CreateClubRequest, CreatedClub},
    repo::ClubRepo,
    repo_types::{Club, ClubColumns, NewClub},
};
use crate::error::{AppError, AppResult, StoreError};

const DEFAULT_CATEGORY: &str = "General";

fn non_blank(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Re-reads the schema after an undefined-column failure and stores the
/// result. When the schema reports nothing new, falls back to base columns.
async fn refresh_columns<S: ClubRepo + ?Sized>(
    store: &S,
    cache: &RwLock<ClubColumns>,
    stale: ClubColumns,
) -> AppResult<ClubColumns> {
    let detected = store.detect_club_columns().await?;
    let fresh = if detected == stale {
        ClubColumns::base_only()
    } else {
        detected
    };
    *cache.write().await = fresh;
    info!(?stale, ?fresh, "club schema capabilities refreshed");
    Ok(fresh)
}

pub async fn list_clubs<S: ClubRepo + ?Sized>(
    store: &S,
    cache: &RwLock<ClubColumns>,
) -> AppResult<Vec<Club>> {
    let columns = *cache.read().await;
    match store.list_clubs(&columns).await {
        Err(StoreError::UndefinedColumn(msg)) => {
            warn!(error = %msg, "club listing hit a missing column");
            let fresh = refresh_columns(store, cache, columns).await?;
            Ok(store.list_clubs(&fresh).await?)
        }
        other => Ok(other?),
    }
}

/// Inserts a club with whatever optional fields the schema supports. A
/// single reduced retry follows an undefined-column failure.
pub async fn create_club<S: ClubRepo + ?Sized>(
    store: &S,
    cache: &RwLock<ClubColumns>,
    req: CreateClubRequest,
) -> AppResult<CreatedClub> {
    let name = req.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::validation("Club name is required"));
    }
    let entered = NewClub {
        name,
        category: non_blank(req.category),
        description: non_blank(req.description),
        meeting_day: non_blank(req.meeting_day),
    };
    // Dropped fields are reported against what the caller filled in, not the default.
    let requested = NewClub {
        category: entered
            .category
            .clone()
            .or_else(|| Some(DEFAULT_CATEGORY.to_string())),
        ..entered.clone()
    };

    let columns = *cache.read().await;
    let (_, dropped_fields) = columns.fit(&entered);
    let club = match store.insert_club(&requested, &columns).await {
        Ok(club) => club,
        Err(StoreError::UndefinedColumn(msg)) => {
            warn!(error = %msg, "club insert hit a missing column; retrying with reduced fields");
            let fresh = refresh_columns(store, cache, columns).await?;
            let (_, dropped_fields) = fresh.fit(&entered);
            let club = store.insert_club(&requested, &fresh).await?;
            info!(club_id = %club.id, ?dropped_fields, "club created after schema fallback");
            return Ok(CreatedClub {
                club,
                dropped_fields,
            });
        }
        Err(e) => return Err(e.into()),
    };

    if dropped_fields.is_empty() {
        info!(club_id = %club.id, name = %club.name, "club created");
    } else {
        info!(club_id = %club.id, ?dropped_fields, "club created without unsupported fields");
    }
    Ok(CreatedClub {
        club,
        dropped_fields,
    })
}
