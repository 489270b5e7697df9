use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::{
    dto::{
        ActiveYearResponse, AllocateRequest, AllocationQuery, CreateClassLevelRequest,
        CreateStreamRequest, CreateSubjectRequest, CreateTermRequest, CreateYearRequest, Overview,
        SeedReport,
    },
    repo_types::{AcademicYear, AllocationView, ClassLevel, Stream, Subject, TeacherAllocation, Term},
    services,
};
use crate::{
    auth::{AuthUser, Role},
    error::AppResult,
    state::AppState,
};

const ADMIN: &[Role] = &[Role::Admin];

pub fn calendar_routes() -> Router<AppState> {
    Router::new()
        .route("/academics/overview", get(overview))
        .route("/academics/active-year", get(active_year))
        .route("/academics/years", get(list_years).post(create_year))
        .route("/academics/years/:id/activate", post(activate_year))
        .route(
            "/academics/years/:id/terms",
            get(list_terms).post(create_term),
        )
        .route("/academics/terms/:id/activate", post(activate_term))
}

pub fn reference_routes() -> Router<AppState> {
    Router::new()
        .route("/academics/subjects", get(list_subjects).post(create_subject))
        .route(
            "/academics/class-levels",
            get(list_class_levels).post(create_class_level),
        )
        .route("/academics/class-levels/:id/streams", get(class_streams))
        .route("/academics/streams", get(list_streams).post(create_stream))
        .route(
            "/academics/allocations",
            get(list_allocations).post(allocate_teacher),
        )
        .route("/academics/seed/subjects", post(seed_subjects))
        .route("/academics/seed/class-levels", post(seed_class_levels))
        .route("/academics/seed/streams", post(seed_streams))
}

#[instrument(skip(state), fields(user_id = %user.id))]
pub async fn overview(State(state): State<AppState>, user: AuthUser) -> AppResult<Json<Overview>> {
    user.require(ADMIN)?;
    Ok(Json(services::overview(state.store.as_ref()).await?))
}

#[instrument(skip(state), fields(user_id = %user.id))]
pub async fn active_year(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ActiveYearResponse>> {
    user.require(ADMIN)?;
    let active_year = services::resolve_active_year(state.store.as_ref()).await?;
    Ok(Json(ActiveYearResponse { active_year }))
}

#[instrument(skip(state), fields(user_id = %user.id))]
pub async fn list_years(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<Vec<AcademicYear>>> {
    user.require(ADMIN)?;
    Ok(Json(state.store.list_years().await?))
}

#[instrument(skip(state, payload), fields(user_id = %user.id))]
pub async fn create_year(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateYearRequest>,
) -> AppResult<(StatusCode, Json<AcademicYear>)> {
    user.require(ADMIN)?;
    let year = services::create_year(state.store.as_ref(), payload).await?;
    Ok((StatusCode::CREATED, Json(year)))
}

#[instrument(skip(state), fields(user_id = %user.id))]
pub async fn activate_year(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<AcademicYear>> {
    user.require(ADMIN)?;
    Ok(Json(services::activate_year(state.store.as_ref(), id).await?))
}

#[instrument(skip(state), fields(user_id = %user.id))]
pub async fn list_terms(
    State(state): State<AppState>,
    user: AuthUser,
    Path(year_id): Path<Uuid>,
) -> AppResult<Json<Vec<Term>>> {
    user.require(ADMIN)?;
    Ok(Json(services::list_terms(state.store.as_ref(), year_id).await?))
}

#[instrument(skip(state, payload), fields(user_id = %user.id))]
pub async fn create_term(
    State(state): State<AppState>,
    user: AuthUser,
    Path(year_id): Path<Uuid>,
    Json(payload): Json<CreateTermRequest>,
) -> AppResult<(StatusCode, Json<Term>)> {
    user.require(ADMIN)?;
    let term = services::create_term(state.store.as_ref(), year_id, payload).await?;
    Ok((StatusCode::CREATED, Json(term)))
}

#[instrument(skip(state), fields(user_id = %user.id))]
pub async fn activate_term(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Term>> {
    user.require(ADMIN)?;
    Ok(Json(services::activate_term(state.store.as_ref(), id).await?))
}

#[instrument(skip(state), fields(user_id = %user.id))]
pub async fn list_subjects(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<Vec<Subject>>> {
    user.require(ADMIN)?;
    Ok(Json(state.store.list_subjects().await?))
}

#[instrument(skip(state, payload), fields(user_id = %user.id))]
pub async fn create_subject(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateSubjectRequest>,
) -> AppResult<(StatusCode, Json<Subject>)> {
    user.require(ADMIN)?;
    let subject = services::create_subject(state.store.as_ref(), payload).await?;
    Ok((StatusCode::CREATED, Json(subject)))
}

#[instrument(skip(state), fields(user_id = %user.id))]
pub async fn list_class_levels(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<Vec<ClassLevel>>> {
    user.require(ADMIN)?;
    Ok(Json(state.store.list_class_levels().await?))
}

#[instrument(skip(state, payload), fields(user_id = %user.id))]
pub async fn create_class_level(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateClassLevelRequest>,
) -> AppResult<(StatusCode, Json<ClassLevel>)> {
    user.require(ADMIN)?;
    let level = services::create_class_level(state.store.as_ref(), payload).await?;
    Ok((StatusCode::CREATED, Json(level)))
}

#[instrument(skip(state), fields(user_id = %user.id))]
pub async fn class_streams(
    State(state): State<AppState>,
    user: AuthUser,
    Path(class_id): Path<Uuid>,
) -> AppResult<Json<Vec<Stream>>> {
    user.require(ADMIN)?;
    Ok(Json(services::stream_options(state.store.as_ref(), class_id).await?))
}

#[instrument(skip(state), fields(user_id = %user.id))]
pub async fn list_streams(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<Vec<Stream>>> {
    user.require(ADMIN)?;
    Ok(Json(state.store.list_streams().await?))
}

#[instrument(skip(state, payload), fields(user_id = %user.id))]
pub async fn create_stream(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateStreamRequest>,
) -> AppResult<(StatusCode, Json<Stream>)> {
    user.require(ADMIN)?;
    let stream = services::create_stream(state.store.as_ref(), payload).await?;
    Ok((StatusCode::CREATED, Json(stream)))
}

#[instrument(skip(state), fields(user_id = %user.id))]
pub async fn list_allocations(
    State(state): State<AppState>,
    user: AuthUser,
    Query(q): Query<AllocationQuery>,
) -> AppResult<Json<Vec<AllocationView>>> {
    user.require(ADMIN)?;
    let limit = q.limit.clamp(1, 200);
    Ok(Json(state.store.list_recent_allocations(limit).await?))
}

#[instrument(skip(state, payload), fields(user_id = %user.id))]
pub async fn allocate_teacher(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<AllocateRequest>,
) -> AppResult<(StatusCode, Json<TeacherAllocation>)> {
    user.require(ADMIN)?;
    let allocation = services::allocate_teacher(state.store.as_ref(), payload).await?;
    Ok((StatusCode::CREATED, Json(allocation)))
}

#[instrument(skip(state), fields(user_id = %user.id))]
pub async fn seed_subjects(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<SeedReport>> {
    user.require(ADMIN)?;
    Ok(Json(services::seed_subjects(state.store.as_ref()).await?))
}

#[instrument(skip(state), fields(user_id = %user.id))]
pub async fn seed_class_levels(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<SeedReport>> {
    user.require(ADMIN)?;
    Ok(Json(services::seed_class_levels(state.store.as_ref()).await?))
}

#[instrument(skip(state), fields(user_id = %user.id))]
pub async fn seed_streams(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<SeedReport>> {
    user.require(ADMIN)?;
    Ok(Json(services::seed_streams(state.store.as_ref()).await?))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request},
    };
    use serde_json::json;
    use tower::ServiceExt;

    use super::*;
    use crate::{
        academics::{
            repo::AcademicsRepo,
            repo_types::{NewClassLevel, NewStream, NewSubject},
        },
        app::build_app,
        auth::{Profile, ProfileRepo},
        error::{ErrorDto, StoreError},
        testing::{bearer, MemoryStore},
    };

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        (status, to_bytes(res.into_body(), usize::MAX).await.unwrap().to_vec())
    }

    #[tokio::test]
    async fn teachers_cannot_reach_academic_administration() {
        let state = AppState::fake();
        let token = bearer(&state, Uuid::new_v4(), Role::Teacher);
        let app = build_app(state);
        let (status, body) = send(
            &app,
            Request::get("/api/v1/academics/overview")
                .header(header::AUTHORIZATION, token)
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let err: ErrorDto = serde_json::from_slice(&body).unwrap();
        assert_eq!(err.code, "forbidden");
    }

    #[tokio::test]
    async fn allocation_without_year_returns_no_active_year() {
        let state = AppState::fake_with(MemoryStore::default());
        let token = bearer(&state, Uuid::new_v4(), Role::Admin);
        let app = build_app(state);
        let (status, body) = send(
            &app,
            Request::post("/api/v1/academics/allocations")
                .header(header::AUTHORIZATION, token)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({
                        "teacher_id": Uuid::new_v4(),
                        "subject_id": Uuid::new_v4(),
                        "stream_id": Uuid::new_v4()
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let err: ErrorDto = serde_json::from_slice(&body).unwrap();
        assert_eq!(err.code, "no_active_year");
    }

    #[tokio::test]
    async fn created_year_is_reported_as_active() {
        let state = AppState::fake();
        let token = bearer(&state, Uuid::new_v4(), Role::Admin);
        let app = build_app(state);
        let (status, _) = send(
            &app,
            Request::post("/api/v1/academics/years")
                .header(header::AUTHORIZATION, token.clone())
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({"name": "2025", "start_date": "2025-02-01", "end_date": "2025-11-30"})
                        .to_string(),
                ))
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = send(
            &app,
            Request::get("/api/v1/academics/active-year")
                .header(header::AUTHORIZATION, token)
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let v: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(v["active_year"]["name"], "2025");
        assert_eq!(v["active_year"]["source"], "current");
        assert_eq!(v["active_year"]["is_current"], true);
    }

    #[tokio::test]
    async fn allocation_refused_by_row_policy_is_permission_denied() {
        let store = MemoryStore::default();
        services::create_year(
            &store,
            CreateYearRequest {
                name: "2025".into(),
                start_date: time::macros::date!(2025 - 02 - 01),
                end_date: time::macros::date!(2025 - 11 - 30),
                make_current: true,
            },
        )
        .await
        .unwrap();
        let teacher = Profile {
            id: Uuid::new_v4(),
            email: "okello@school.org".into(),
            full_name: "Okello".into(),
            role: Role::Teacher,
            avatar_url: None,
        };
        store.insert_profile(&teacher).await.unwrap();
        let level = store
            .insert_class_levels(&[NewClassLevel {
                name: "Senior 2".into(),
                level: 2,
            }])
            .await
            .unwrap()
            .remove(0);
        let stream = store
            .insert_streams(&[NewStream {
                name: "East".into(),
                class_id: level.id,
            }])
            .await
            .unwrap()
            .remove(0);
        let subject = store
            .insert_subjects(&[NewSubject {
                name: "Chemistry".into(),
                code: "CHE".into(),
                level: None,
            }])
            .await
            .unwrap()
            .remove(0);
        store.fail_writes_with(StoreError::PermissionDenied(
            "new row violates row-level security policy for table \"teacher_allocations\"".into(),
        ));

        let state = AppState::fake_with(store);
        let token = bearer(&state, Uuid::new_v4(), Role::Admin);
        let app = build_app(state.clone());
        let (status, body) = send(
            &app,
            Request::post("/api/v1/academics/allocations")
                .header(header::AUTHORIZATION, token)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({
                        "teacher_id": teacher.id,
                        "subject_id": subject.id,
                        "class_id": level.id,
                        "stream_id": stream.id
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let err: ErrorDto = serde_json::from_slice(&body).unwrap();
        assert_eq!(err.code, "permission_denied");
        assert!(state.store.list_recent_allocations(20).await.unwrap().is_empty());
    }
}
