use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    academics::{
        repo_types::{AcademicYear, Term},
        AcademicsRepo,
    },
    auth::Role,
    error::AppResult,
    events::{self, repo_types::SchoolEvent, EventRepo},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TermWeek {
    Upcoming,
    Week { number: i64 },
}

/// Week 1 is the seven days starting on the term's start date.
pub fn week_of_term(start: Date, today: Date) -> TermWeek {
    if start > today {
        return TermWeek::Upcoming;
    }
    TermWeek::Week {
        number: (today - start).whole_days() / 7 + 1,
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DashboardView {
    pub current_year: Option<AcademicYear>,
    pub current_term: Option<Term>,
    pub week_of_term: Option<TermWeek>,
    pub next_event: Option<SchoolEvent>,
}

pub async fn dashboard<S: AcademicsRepo + EventRepo + ?Sized>(
    store: &S,
    role: Role,
    today: Date,
) -> AppResult<DashboardView> {
    let (current_year, current_term) = tokio::try_join!(store.current_year(), store.current_term())?;
    let next_event = events::services::next_event(store, role, today).await?;
    Ok(DashboardView {
        week_of_term: current_term
            .as_ref()
            .map(|t| week_of_term(t.start_date, today)),
        current_year,
        current_term,
        next_event,
    })
}
