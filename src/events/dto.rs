use serde::Deserialize;
use time::Date;

use super::repo_types::Audience;

#[derive(Debug, Default, Deserialize)]
pub struct EventQuery {
    pub audience: Option<Audience>,
}

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    pub from: Option<Date>,
    #[serde(default = "default_feed_limit")]
    pub limit: i64,
}

fn default_feed_limit() -> i64 {
    50
}

#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    pub title: String,
    pub event_date: Date,
    pub location: Option<String>,
    #[serde(default = "default_audience")]
    pub audience: Audience,
    pub description: Option<String>,
}

fn default_audience() -> Audience {
    Audience::All
}
