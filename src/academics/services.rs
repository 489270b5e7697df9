use std::collections::HashSet;

use tracing::{info, warn};
use uuid::Uuid;

use super::{
    dto::{
        ActiveYear, ActiveYearSource, AllocateRequest, CreateClassLevelRequest,
        CreateStreamRequest, CreateSubjectRequest, CreateTermRequest, CreateYearRequest,
        Overview, SeedReport,
    },
    repo::AcademicsRepo,
    repo_types::{
        AcademicYear, ClassLevel, NewAllocation, NewClassLevel, NewStream, NewSubject, NewTerm,
        NewYear, Stream, Subject, TeacherAllocation, Term,
    },
    selection::{streams_for_class, ClassStreamSelection},
};
use crate::{
    auth::{ProfileRepo, Role},
    error::{AppError, AppResult},
};

pub const RECENT_ALLOCATIONS: i64 = 20;

const DEFAULT_SUBJECTS: [&str; 19] = [
    "Biology",
    "Physics",
    "Chemistry",
    "ICT",
    "Mathematics",
    "English",
    "Geography",
    "Kiswahili",
    "Fine Art",
    "CRE",
    "Luganda",
    "Entrepreneurship",
    "Performing Arts",
    "Moral Training",
    "History",
    "Agriculture",
    "Physical Education",
    "Literature",
    "Economics",
];
const DEFAULT_SUBJECT_LEVEL: &str = "O-Level";
const DEFAULT_STREAMS: [&str; 5] = ["North", "Central", "South", "East", "West"];
/// Class levels that receive the default streams (Senior 1 to Senior 4).
const STREAMED_LEVELS: std::ops::RangeInclusive<i32> = 1..=4;
const SENIOR_LEVELS: std::ops::RangeInclusive<i32> = 1..=6;

/// Short code derived from a subject name: first three letters, uppercased.
pub fn subject_code(name: &str) -> String {
    name.trim().chars().take(3).collect::<String>().to_uppercase()
}

fn required(value: &str, field: &str) -> AppResult<String> {
    let v = value.trim();
    if v.is_empty() {
        return Err(AppError::validation(format!("{field} is required")));
    }
    Ok(v.to_string())
}

fn check_range(start: time::Date, end: time::Date) -> AppResult<()> {
    if start > end {
        return Err(AppError::validation("Start date must be on or before end date"));
    }
    Ok(())
}

/// The current year when the pointer is set, else the latest by start date.
pub async fn resolve_active_year<S: AcademicsRepo + ?Sized>(
    store: &S,
) -> AppResult<Option<ActiveYear>> {
    if let Some(year) = store.current_year().await? {
        return Ok(Some(ActiveYear {
            year,
            source: ActiveYearSource::Current,
        }));
    }
    let latest = store.list_years().await?.into_iter().next();
    Ok(latest.map(|year| ActiveYear {
        year,
        source: ActiveYearSource::MostRecent,
    }))
}

pub async fn overview<S: AcademicsRepo + ProfileRepo + ?Sized>(store: &S) -> AppResult<Overview> {
    let (teachers, subjects, class_levels, streams, years, allocations) = tokio::try_join!(
        store.list_profiles_by_role(Role::Teacher),
        store.list_subjects(),
        store.list_class_levels(),
        store.list_streams(),
        store.list_years(),
        store.list_recent_allocations(RECENT_ALLOCATIONS),
    )?;
    let active_year = resolve_active_year(store).await?;
    Ok(Overview {
        teachers,
        subjects,
        class_levels,
        streams,
        years,
        allocations,
        active_year,
    })
}

pub async fn create_year<S: AcademicsRepo + ?Sized>(
    store: &S,
    req: CreateYearRequest,
) -> AppResult<AcademicYear> {
    let name = required(&req.name, "Year name")?;
    check_range(req.start_date, req.end_date)?;
    let year = store
        .insert_year(
            &NewYear {
                name,
                start_date: req.start_date,
                end_date: req.end_date,
            },
            req.make_current,
        )
        .await?;
    info!(year_id = %year.id, name = %year.name, current = year.is_current, "academic year created");
    Ok(year)
}

pub async fn activate_year<S: AcademicsRepo + ?Sized>(
    store: &S,
    year_id: Uuid,
) -> AppResult<AcademicYear> {
    if store.find_year(year_id).await?.is_none() {
        return Err(AppError::not_found("Academic year not found"));
    }
    store.set_current_year(year_id).await?;
    info!(%year_id, "academic year activated");
    store
        .find_year(year_id)
        .await?
        .ok_or_else(|| AppError::not_found("Academic year not found"))
}

pub async fn list_terms<S: AcademicsRepo + ?Sized>(store: &S, year_id: Uuid) -> AppResult<Vec<Term>> {
    if store.find_year(year_id).await?.is_none() {
        return Err(AppError::not_found("Academic year not found"));
    }
    Ok(store.list_terms(year_id).await?)
}

pub async fn create_term<S: AcademicsRepo + ?Sized>(
    store: &S,
    year_id: Uuid,
    req: CreateTermRequest,
) -> AppResult<Term> {
    let year = store
        .find_year(year_id)
        .await?
        .ok_or_else(|| AppError::not_found("Academic year not found"))?;
    let name = required(&req.name, "Term name")?;
    check_range(req.start_date, req.end_date)?;
    if req.start_date < year.start_date || req.end_date > year.end_date {
        return Err(AppError::validation(format!(
            "Term dates must fall within {} ({} to {})",
            year.name, year.start_date, year.end_date
        )));
    }
    let term = store
        .insert_term(
            &NewTerm {
                academic_year_id: year_id,
                name,
                start_date: req.start_date,
                end_date: req.end_date,
            },
            req.make_current,
        )
        .await?;
    info!(term_id = %term.id, %year_id, current = term.is_current, "term created");
    Ok(term)
}

pub async fn activate_term<S: AcademicsRepo + ?Sized>(store: &S, term_id: Uuid) -> AppResult<Term> {
    let term = store
        .find_term(term_id)
        .await?
        .ok_or_else(|| AppError::not_found("Term not found"))?;
    store
        .set_current_term(term.academic_year_id, term_id)
        .await?;
    info!(%term_id, year_id = %term.academic_year_id, "term activated");
    store
        .find_term(term_id)
        .await?
        .ok_or_else(|| AppError::not_found("Term not found"))
}

pub async fn create_subject<S: AcademicsRepo + ?Sized>(
    store: &S,
    req: CreateSubjectRequest,
) -> AppResult<Subject> {
    let name = required(&req.name, "Subject name")?;
    let code = req
        .code
        .map(|c| c.trim().to_uppercase())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| subject_code(&name));
    let level = req.level.filter(|l| !l.trim().is_empty());
    let mut rows = store
        .insert_subjects(&[NewSubject { name, code, level }])
        .await?;
    rows.pop()
        .ok_or_else(|| AppError::Unexpected(anyhow::anyhow!("subject insert returned no row")))
}

pub async fn create_class_level<S: AcademicsRepo + ?Sized>(
    store: &S,
    req: CreateClassLevelRequest,
) -> AppResult<ClassLevel> {
    let name = required(&req.name, "Class name")?;
    if req.level < 1 {
        return Err(AppError::validation("Level must be a positive ordinal"));
    }
    let mut rows = store
        .insert_class_levels(&[NewClassLevel {
            name,
            level: req.level,
        }])
        .await?;
    rows.pop()
        .ok_or_else(|| AppError::Unexpected(anyhow::anyhow!("class level insert returned no row")))
}

pub async fn create_stream<S: AcademicsRepo + ?Sized>(
    store: &S,
    req: CreateStreamRequest,
) -> AppResult<Stream> {
    let name = required(&req.name, "Stream name")?;
    let levels = store.list_class_levels().await?;
    if !levels.iter().any(|l| l.id == req.class_id) {
        return Err(AppError::not_found("Class level not found"));
    }
    let mut rows = store
        .insert_streams(&[NewStream {
            name,
            class_id: req.class_id,
        }])
        .await?;
    rows.pop()
        .ok_or_else(|| AppError::Unexpected(anyhow::anyhow!("stream insert returned no row")))
}

pub async fn stream_options<S: AcademicsRepo + ?Sized>(
    store: &S,
    class_id: Uuid,
) -> AppResult<Vec<Stream>> {
    let streams = store.list_streams().await?;
    Ok(streams_for_class(&streams, class_id))
}

/// Records that a teacher teaches a subject to a stream in the active year.
/// Nothing is written unless every check passes.
pub async fn allocate_teacher<S: AcademicsRepo + ProfileRepo + ?Sized>(
    store: &S,
    req: AllocateRequest,
) -> AppResult<TeacherAllocation> {
    let Some(active) = resolve_active_year(store).await? else {
        warn!("allocation attempted without an academic year");
        return Err(AppError::NoActiveYear);
    };

    let (Some(teacher_id), Some(subject_id), Some(stream_id)) =
        (req.teacher_id, req.subject_id, req.stream_id)
    else {
        return Err(AppError::IncompleteForm(
            "Please select a teacher, subject, class and stream.".into(),
        ));
    };

    let stream = store
        .find_stream(stream_id)
        .await?
        .ok_or_else(|| AppError::validation("Selected stream does not exist"))?;
    let class_id = req.class_id.unwrap_or(stream.class_id);
    let stream_id = ClassStreamSelection::resolve(std::slice::from_ref(&stream), class_id, stream_id)
        .ok_or_else(|| AppError::validation("Selected stream does not belong to the selected class"))?;

    match store.find_profile(teacher_id).await? {
        Some(p) if p.role == Role::Teacher => {}
        Some(p) => {
            return Err(AppError::validation(format!(
                "{} is not a teacher",
                p.full_name
            )))
        }
        None => return Err(AppError::validation("Selected teacher does not exist")),
    }

    let allocation = store
        .insert_allocation(&NewAllocation {
            teacher_id,
            subject_id,
            stream_id,
            academic_year_id: active.year.id,
        })
        .await?;
    info!(
        allocation_id = %allocation.id,
        %teacher_id,
        %subject_id,
        %stream_id,
        year_id = %active.year.id,
        "teacher allocated"
    );
    Ok(allocation)
}

pub async fn seed_subjects<S: AcademicsRepo + ?Sized>(store: &S) -> AppResult<SeedReport> {
    let existing: HashSet<String> = store
        .list_subjects()
        .await?
        .into_iter()
        .map(|s| s.name.to_lowercase())
        .collect();
    let missing: Vec<NewSubject> = DEFAULT_SUBJECTS
        .iter()
        .filter(|name| !existing.contains(&name.to_lowercase()))
        .map(|name| NewSubject {
            name: name.to_string(),
            code: subject_code(name),
            level: Some(DEFAULT_SUBJECT_LEVEL.to_string()),
        })
        .collect();
    let inserted = store.insert_subjects(&missing).await?.len();
    let report = SeedReport {
        inserted,
        skipped: DEFAULT_SUBJECTS.len() - missing.len(),
    };
    info!(?report, "subjects seeded");
    Ok(report)
}

pub async fn seed_class_levels<S: AcademicsRepo + ?Sized>(store: &S) -> AppResult<SeedReport> {
    let existing = store.list_class_levels().await?;
    let missing: Vec<NewClassLevel> = SENIOR_LEVELS
        .filter(|n| !existing.iter().any(|l| l.level == *n))
        .map(|n| NewClassLevel {
            name: format!("Senior {n}"),
            level: n,
        })
        .collect();
    let total = SENIOR_LEVELS.count();
    let inserted = store.insert_class_levels(&missing).await?.len();
    let report = SeedReport {
        inserted,
        skipped: total - missing.len(),
    };
    info!(?report, "class levels seeded");
    Ok(report)
}

pub async fn seed_streams<S: AcademicsRepo + ?Sized>(store: &S) -> AppResult<SeedReport> {
    let levels: Vec<ClassLevel> = store
        .list_class_levels()
        .await?
        .into_iter()
        .filter(|l| STREAMED_LEVELS.contains(&l.level))
        .collect();
    if levels.is_empty() {
        return Err(AppError::validation(
            "Class levels Senior 1-4 not found. Seed class levels first.",
        ));
    }

    let existing: HashSet<(Uuid, String)> = store
        .list_streams()
        .await?
        .into_iter()
        .map(|s| (s.class_id, s.name))
        .collect();
    let mut missing = Vec::new();
    let mut skipped = 0;
    for level in &levels {
        for name in DEFAULT_STREAMS {
            if existing.contains(&(level.id, name.to_string())) {
                skipped += 1;
            } else {
                missing.push(NewStream {
                    name: name.to_string(),
                    class_id: level.id,
                });
            }
        }
    }
    let inserted = store.insert_streams(&missing).await?.len();
    let report = SeedReport { inserted, skipped };
    info!(?report, "streams seeded");
    Ok(report)
}
