use time::Date;
use tracing::info;

use super::{
    dto::CreateEventRequest,
    repo::EventRepo,
    repo_types::{Audience, NewEvent, SchoolEvent},
};
use crate::{
    auth::Role,
    error::{AppError, AppResult},
};

fn non_blank(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

pub async fn create_event<S: EventRepo + ?Sized>(
    store: &S,
    req: CreateEventRequest,
) -> AppResult<SchoolEvent> {
    let title = req.title.trim().to_string();
    if title.is_empty() {
        return Err(AppError::validation("Event title is required"));
    }
    let event = store
        .insert_event(&NewEvent {
            title,
            event_date: req.event_date,
            location: non_blank(req.location),
            audience: req.audience,
            description: non_blank(req.description),
        })
        .await?;
    info!(event_id = %event.id, date = %event.event_date, audience = %event.audience, "event published");
    Ok(event)
}

/// Events the caller's role may see, earliest first.
pub async fn feed<S: EventRepo + ?Sized>(
    store: &S,
    role: Role,
    from: Option<Date>,
    limit: i64,
) -> AppResult<Vec<SchoolEvent>> {
    Ok(store
        .list_events_for(Audience::visible_to(role), from, limit.clamp(1, 200))
        .await?)
}

/// First event on or after `today` visible to `role`.
pub async fn next_event<S: EventRepo + ?Sized>(
    store: &S,
    role: Role,
    today: Date,
) -> AppResult<Option<SchoolEvent>> {
    Ok(store
        .list_events_for(Audience::visible_to(role), Some(today), 1)
        .await?
        .into_iter()
        .next())
}
