use tokio::sync::RwLock;
use tracing::{info, warn};

use super::{
    dto::{AdmissionResponse, AdmitRequest, ClubEnrollment, FormData},
    repo::AdmissionsRepo,
    repo_types::NewStudent,
};
use crate::{
    academics::{selection::ClassStreamSelection, AcademicsRepo},
    clubs::{services::list_clubs, ClubColumns, ClubRepo},
    error::{AppError, AppResult, StoreError},
};

pub async fn form_data<S: AcademicsRepo + ClubRepo + ?Sized>(
    store: &S,
    club_columns: &RwLock<ClubColumns>,
) -> AppResult<FormData> {
    let (class_levels, streams, clubs) = tokio::try_join!(
        async { Ok::<_, AppError>(store.list_class_levels().await?) },
        async { Ok::<_, AppError>(store.list_streams().await?) },
        list_clubs(store, club_columns),
    )?;
    Ok(FormData {
        class_levels,
        streams,
        clubs,
    })
}

/// Registers a student. The optional club link runs after the student row
/// exists and its failure is reported, not raised.
pub async fn admit<S: AcademicsRepo + AdmissionsRepo + ClubRepo + ?Sized>(
    store: &S,
    req: AdmitRequest,
) -> AppResult<AdmissionResponse> {
    let full_name = req.full_name.trim().to_string();
    let student_id_human = req.student_id_human.trim().to_string();
    if full_name.is_empty() || student_id_human.is_empty() {
        return Err(AppError::IncompleteForm(
            "Full name and student ID are required.".into(),
        ));
    }
    let (Some(class_id), Some(stream_id)) = (req.class_id, req.stream_id) else {
        return Err(AppError::IncompleteForm(
            "Please select a class and stream.".into(),
        ));
    };
    let stream = store
        .find_stream(stream_id)
        .await?
        .ok_or_else(|| AppError::validation("Selected stream does not exist"))?;
    let stream_id = ClassStreamSelection::resolve(std::slice::from_ref(&stream), class_id, stream_id)
        .ok_or_else(|| AppError::validation("Selected stream does not belong to the selected class"))?;

    let student = store
        .insert_student(&NewStudent {
            full_name,
            student_id_human,
            gender: req.gender,
            current_stream_id: stream_id,
        })
        .await
        .map_err(|e| match e {
            StoreError::UniqueViolation(_) => AppError::Conflict(format!(
                "Student ID {} is already in use",
                req.student_id_human.trim()
            )),
            other => other.into(),
        })?;
    info!(student_id = %student.id, human_id = %student.student_id_human, %stream_id, "student admitted");

    let club_enrollment = match req.club_id {
        None => ClubEnrollment::NotRequested,
        Some(club_id) => match store.enroll_student(club_id, student.id).await {
            Ok(()) => {
                info!(student_id = %student.id, %club_id, "student enrolled in club");
                ClubEnrollment::Enrolled { club_id }
            }
            Err(e) => {
                warn!(error = %e, student_id = %student.id, %club_id, "club enrollment failed; admission kept");
                ClubEnrollment::Failed {
                    club_id,
                    reason: e.to_string(),
                }
            }
        },
    };

    Ok(AdmissionResponse {
        student,
        club_enrollment,
    })
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::{
        academics::repo_types::{NewClassLevel, NewStream, Stream},
        admissions::repo_types::Gender,
        clubs::repo_types::NewClub,
        testing::MemoryStore,
    };

    async fn s1_north(store: &MemoryStore) -> Stream {
        let level = store
            .insert_class_levels(&[NewClassLevel {
                name: "Senior 1".into(),
                level: 1,
            }])
            .await
            .unwrap()
            .remove(0);
        store
            .insert_streams(&[NewStream {
                name: "North".into(),
                class_id: level.id,
            }])
            .await
            .unwrap()
            .remove(0)
    }

    fn request(stream: &Stream, club_id: Option<Uuid>) -> AdmitRequest {
        AdmitRequest {
            full_name: "Achieng Mary".into(),
            student_id_human: "S1-0042".into(),
            gender: Gender::F,
            class_id: Some(stream.class_id),
            stream_id: Some(stream.id),
            club_id,
        }
    }

    #[tokio::test]
    async fn admission_survives_failed_club_enrollment() {
        let store = MemoryStore::default();
        let stream = s1_north(&store).await;
        let club = store
            .insert_club(
                &NewClub {
                    name: "Wildlife".into(),
                    category: None,
                    description: None,
                    meeting_day: None,
                },
                &ClubColumns::all(),
            )
            .await
            .unwrap();
        store.fail_club_enrollment(true);

        let res = admit(&store, request(&stream, Some(club.id))).await.unwrap();
        assert_eq!(res.student.full_name, "Achieng Mary");
        assert_eq!(res.student.current_stream_id, Some(stream.id));
        assert!(matches!(res.club_enrollment, ClubEnrollment::Failed { .. }));
        assert_eq!(store.student_count(), 1);
    }

    #[tokio::test]
    async fn enrollment_bumps_member_count() {
        let store = MemoryStore::default();
        let stream = s1_north(&store).await;
        let club = store
            .insert_club(
                &NewClub {
                    name: "Interact".into(),
                    category: Some("Community".into()),
                    description: None,
                    meeting_day: None,
                },
                &ClubColumns::all(),
            )
            .await
            .unwrap();

        let res = admit(&store, request(&stream, Some(club.id))).await.unwrap();
        assert_eq!(
            res.club_enrollment,
            ClubEnrollment::Enrolled { club_id: club.id }
        );
        let clubs = store.list_clubs(&ClubColumns::all()).await.unwrap();
        assert_eq!(clubs[0].member_count, 1);
    }

    #[tokio::test]
    async fn stream_must_belong_to_class() {
        let store = MemoryStore::default();
        let stream = s1_north(&store).await;
        let mut req = request(&stream, None);
        req.class_id = Some(Uuid::new_v4());
        let err = admit(&store, req).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(store.student_count(), 0);
    }

    #[tokio::test]
    async fn duplicate_student_id_is_a_conflict() {
        let store = MemoryStore::default();
        let stream = s1_north(&store).await;
        admit(&store, request(&stream, None)).await.unwrap();
        let err = admit(&store, request(&stream, None)).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(ref m) if m.contains("S1-0042")));
        assert_eq!(store.student_count(), 1);
    }

    #[tokio::test]
    async fn missing_stream_is_an_incomplete_form() {
        let store = MemoryStore::default();
        let stream = s1_north(&store).await;
        let mut req = request(&stream, None);
        req.stream_id = None;
        assert!(matches!(
            admit(&store, req).await.unwrap_err(),
            AppError::IncompleteForm(_)
        ));
    }
}
