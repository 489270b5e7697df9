//! In-memory store and fakes for unit and router tests.

use std::{
    collections::{HashMap, HashSet},
    sync::Mutex,
};

use async_trait::async_trait;
use axum::extract::FromRef;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::{
    academics::{
        repo_types::{
            AcademicYear, AllocationView, ClassLevel, NewAllocation, NewClassLevel, NewStream,
            NewSubject, NewTerm, NewYear, Stream, Subject, TeacherAllocation, Term,
        },
        AcademicsRepo,
    },
    admissions::{
        repo_types::{NewStudent, Student},
        AdmissionsRepo,
    },
    assistant::{AssistantError, TextGenerator},
    auth::{
        jwt::JwtKeys,
        repo_types::{NewUser, UserRecord},
        services::provisional_profile,
        Profile, ProfileRepo, Role,
    },
    clubs::{
        repo_types::{Club, NewClub},
        ClubColumns, ClubRepo,
    },
    db::HealthRepo,
    error::StoreError,
    events::{
        repo_types::{Audience, NewEvent, SchoolEvent},
        EventRepo,
    },
    gradebook::{
        repo_types::{AssessmentType, MarkOutcome, MarkRow, MarkUpsert, SheetStudent},
        GradebookRepo,
    },
    houses::{
        repo_types::{House, NewHouse},
        HouseRepo,
    },
    state::AppState,
};

/// `Authorization` header value for a user of `role`, signed with the
/// state's keys.
pub fn bearer(state: &AppState, user_id: Uuid, role: Role) -> String {
    let keys = JwtKeys::from_ref(state);
    format!("Bearer {}", keys.sign_access(user_id, role).unwrap())
}

struct YearRec {
    id: Uuid,
    name: String,
    start_date: Date,
    end_date: Date,
    current_term_id: Option<Uuid>,
}

struct TermRec {
    id: Uuid,
    year_id: Uuid,
    name: String,
    start_date: Date,
    end_date: Date,
}

struct Inner {
    users: Vec<UserRecord>,
    profiles: Vec<Profile>,
    subjects: Vec<Subject>,
    class_levels: Vec<ClassLevel>,
    streams: Vec<Stream>,
    years: Vec<YearRec>,
    terms: Vec<TermRec>,
    current_year_id: Option<Uuid>,
    allocations: Vec<TeacherAllocation>,
    students: Vec<Student>,
    clubs: Vec<Club>,
    memberships: Vec<(Uuid, Uuid)>,
    events: Vec<SchoolEvent>,
    marks: HashMap<(Uuid, Uuid, AssessmentType), f64>,
    houses: Vec<House>,

    provision_profiles: bool,
    offline: bool,
    write_failure: Option<StoreError>,
    fail_enrollment: bool,
    rejected_marks: HashSet<Uuid>,
    live_club_columns: ClubColumns,
}

impl Default for Inner {
    fn default() -> Self {
        Self {
            users: Vec::new(),
            profiles: Vec::new(),
            subjects: Vec::new(),
            class_levels: Vec::new(),
            streams: Vec::new(),
            years: Vec::new(),
            terms: Vec::new(),
            current_year_id: None,
            allocations: Vec::new(),
            students: Vec::new(),
            clubs: Vec::new(),
            memberships: Vec::new(),
            events: Vec::new(),
            marks: HashMap::new(),
            houses: Vec::new(),
            provision_profiles: true,
            offline: false,
            write_failure: None,
            fail_enrollment: false,
            rejected_marks: HashSet::new(),
            live_club_columns: ClubColumns::all(),
        }
    }
}

impl Inner {
    fn reachable(&self) -> Result<(), StoreError> {
        if self.offline {
            return Err(StoreError::Unavailable("connection refused".into()));
        }
        Ok(())
    }

    fn writable(&self) -> Result<(), StoreError> {
        self.reachable()?;
        match &self.write_failure {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }

    fn year(&self, rec: &YearRec) -> AcademicYear {
        AcademicYear {
            id: rec.id,
            name: rec.name.clone(),
            start_date: rec.start_date,
            end_date: rec.end_date,
            current_term_id: rec.current_term_id,
            is_current: self.current_year_id == Some(rec.id),
        }
    }

    fn term(&self, rec: &TermRec) -> Term {
        let current = self
            .years
            .iter()
            .find(|y| y.id == rec.year_id)
            .and_then(|y| y.current_term_id);
        Term {
            id: rec.id,
            academic_year_id: rec.year_id,
            name: rec.name.clone(),
            start_date: rec.start_date,
            end_date: rec.end_date,
            is_current: current == Some(rec.id),
        }
    }

    fn allocation_view(&self, a: &TeacherAllocation) -> AllocationView {
        let subject = self.subjects.iter().find(|s| s.id == a.subject_id);
        let stream = self.streams.iter().find(|s| s.id == a.stream_id);
        let class = stream.and_then(|st| self.class_levels.iter().find(|c| c.id == st.class_id));
        AllocationView {
            id: a.id,
            teacher_id: a.teacher_id,
            teacher_name: self
                .profiles
                .iter()
                .find(|p| p.id == a.teacher_id)
                .map_or_else(|| "Unknown".to_string(), |p| p.full_name.clone()),
            subject_id: a.subject_id,
            subject_name: subject.map_or_else(|| "Unknown Subject".to_string(), |s| s.name.clone()),
            subject_code: subject.map(|s| s.code.clone()).unwrap_or_default(),
            stream_id: a.stream_id,
            stream_name: stream.map(|s| s.name.clone()).unwrap_or_default(),
            class_name: class.map(|c| c.name.clone()).unwrap_or_default(),
            academic_year_id: a.academic_year_id,
            created_at: a.created_at,
        }
    }

    fn check_club_columns(&self, requested: &ClubColumns) -> Result<(), StoreError> {
        let live = self.live_club_columns;
        let missing = [
            (requested.category && !live.category, "category"),
            (requested.meeting_day && !live.meeting_day, "meeting_day"),
            (requested.description && !live.description, "description"),
        ]
        .into_iter()
        .find(|(missing, _)| *missing);
        match missing {
            Some((_, column)) => Err(StoreError::UndefinedColumn(format!(
                "column \"{column}\" of relation \"clubs\" does not exist"
            ))),
            None => Ok(()),
        }
    }
}

/// Stand-in for Postgres that keeps every table in memory.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap()
    }

    /// Whether creating a user also creates its profile, as the database
    /// trigger does.
    pub fn set_provision_profiles(&self, on: bool) {
        self.lock().provision_profiles = on;
    }

    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    /// Every subsequent write fails with `err`.
    pub fn fail_writes_with(&self, err: StoreError) {
        self.lock().write_failure = Some(err);
    }

    pub fn fail_club_enrollment(&self, fail: bool) {
        self.lock().fail_enrollment = fail;
    }

    pub fn reject_marks_for(&self, student_id: Uuid) {
        self.lock().rejected_marks.insert(student_id);
    }

    /// Optional club columns the simulated schema carries.
    pub fn club_columns(&self) -> ClubColumns {
        self.lock().live_club_columns
    }

    pub fn set_club_columns(&self, columns: ClubColumns) {
        self.lock().live_club_columns = columns;
    }

    pub fn student_count(&self) -> usize {
        self.lock().students.len()
    }

    pub fn add_student(&self, full_name: &str, human_id: &str, stream_id: Option<Uuid>) -> Uuid {
        let id = Uuid::new_v4();
        self.lock().students.push(Student {
            id,
            full_name: full_name.into(),
            student_id_human: human_id.into(),
            gender: "F".into(),
            current_stream_id: stream_id,
            created_at: OffsetDateTime::now_utc(),
        });
        id
    }

    pub fn add_house(&self, name: &str, color: &str, points: i32) -> Uuid {
        let id = Uuid::new_v4();
        self.lock().houses.push(House {
            id,
            name: name.into(),
            color: color.into(),
            points,
            members: 0,
        });
        id
    }
}

#[async_trait]
impl HealthRepo for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.lock().reachable()
    }
}

#[async_trait]
impl ProfileRepo for MemoryStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let db = self.lock();
        db.reachable()?;
        Ok(db.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, StoreError> {
        let db = self.lock();
        db.reachable()?;
        Ok(db.users.iter().find(|u| u.id == id).cloned())
    }

    async fn create_user(&self, new: &NewUser) -> Result<UserRecord, StoreError> {
        let mut db = self.lock();
        db.writable()?;
        if db.users.iter().any(|u| u.email == new.email) {
            return Err(StoreError::UniqueViolation(
                "duplicate key value violates unique constraint \"users_email_key\"".into(),
            ));
        }
        let user = UserRecord {
            id: Uuid::new_v4(),
            email: new.email.clone(),
            password_hash: new.password_hash.clone(),
            full_name: new.full_name.clone(),
            role: new.role,
            created_at: OffsetDateTime::now_utc(),
        };
        if db.provision_profiles {
            db.profiles.push(provisional_profile(&user));
        }
        db.users.push(user.clone());
        Ok(user)
    }

    async fn find_profile(&self, id: Uuid) -> Result<Option<Profile>, StoreError> {
        let db = self.lock();
        db.reachable()?;
        Ok(db.profiles.iter().find(|p| p.id == id).cloned())
    }

    async fn insert_profile(&self, profile: &Profile) -> Result<Profile, StoreError> {
        let mut db = self.lock();
        db.writable()?;
        if db.profiles.iter().any(|p| p.id == profile.id) {
            return Err(StoreError::UniqueViolation("profiles_pkey".into()));
        }
        db.profiles.push(profile.clone());
        Ok(profile.clone())
    }

    async fn list_profiles_by_role(&self, role: Role) -> Result<Vec<Profile>, StoreError> {
        let db = self.lock();
        db.reachable()?;
        let mut rows: Vec<Profile> = db.profiles.iter().filter(|p| p.role == role).cloned().collect();
        rows.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        Ok(rows)
    }
}

#[async_trait]
impl AcademicsRepo for MemoryStore {
    async fn list_subjects(&self) -> Result<Vec<Subject>, StoreError> {
        let db = self.lock();
        db.reachable()?;
        let mut rows = db.subjects.clone();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn insert_subjects(&self, subjects: &[NewSubject]) -> Result<Vec<Subject>, StoreError> {
        let mut db = self.lock();
        db.writable()?;
        let rows: Vec<Subject> = subjects
            .iter()
            .map(|s| Subject {
                id: Uuid::new_v4(),
                name: s.name.clone(),
                code: s.code.clone(),
                level: s.level.clone(),
            })
            .collect();
        db.subjects.extend(rows.iter().cloned());
        Ok(rows)
    }

    async fn list_class_levels(&self) -> Result<Vec<ClassLevel>, StoreError> {
        let db = self.lock();
        db.reachable()?;
        let mut rows = db.class_levels.clone();
        rows.sort_by_key(|l| l.level);
        Ok(rows)
    }

    async fn insert_class_levels(
        &self,
        levels: &[NewClassLevel],
    ) -> Result<Vec<ClassLevel>, StoreError> {
        let mut db = self.lock();
        db.writable()?;
        let rows: Vec<ClassLevel> = levels
            .iter()
            .map(|l| ClassLevel {
                id: Uuid::new_v4(),
                name: l.name.clone(),
                level: l.level,
            })
            .collect();
        db.class_levels.extend(rows.iter().cloned());
        Ok(rows)
    }

    async fn list_streams(&self) -> Result<Vec<Stream>, StoreError> {
        let db = self.lock();
        db.reachable()?;
        let mut rows = db.streams.clone();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn find_stream(&self, id: Uuid) -> Result<Option<Stream>, StoreError> {
        let db = self.lock();
        db.reachable()?;
        Ok(db.streams.iter().find(|s| s.id == id).cloned())
    }

    async fn insert_streams(&self, streams: &[NewStream]) -> Result<Vec<Stream>, StoreError> {
        let mut db = self.lock();
        db.writable()?;
        let rows: Vec<Stream> = streams
            .iter()
            .map(|s| Stream {
                id: Uuid::new_v4(),
                name: s.name.clone(),
                class_id: s.class_id,
            })
            .collect();
        db.streams.extend(rows.iter().cloned());
        Ok(rows)
    }

    async fn list_years(&self) -> Result<Vec<AcademicYear>, StoreError> {
        let db = self.lock();
        db.reachable()?;
        let mut rows: Vec<AcademicYear> = db.years.iter().map(|y| db.year(y)).collect();
        rows.sort_by(|a, b| b.start_date.cmp(&a.start_date));
        Ok(rows)
    }

    async fn find_year(&self, id: Uuid) -> Result<Option<AcademicYear>, StoreError> {
        let db = self.lock();
        db.reachable()?;
        Ok(db.years.iter().find(|y| y.id == id).map(|y| db.year(y)))
    }

    async fn current_year(&self) -> Result<Option<AcademicYear>, StoreError> {
        let db = self.lock();
        db.reachable()?;
        Ok(db
            .years
            .iter()
            .find(|y| Some(y.id) == db.current_year_id)
            .map(|y| db.year(y)))
    }

    async fn insert_year(
        &self,
        year: &NewYear,
        make_current: bool,
    ) -> Result<AcademicYear, StoreError> {
        let mut db = self.lock();
        db.writable()?;
        let id = Uuid::new_v4();
        db.years.push(YearRec {
            id,
            name: year.name.clone(),
            start_date: year.start_date,
            end_date: year.end_date,
            current_term_id: None,
        });
        if make_current {
            db.current_year_id = Some(id);
        }
        let rec = db.years.last().map(|y| db.year(y));
        rec.ok_or(StoreError::NotFound)
    }

    async fn set_current_year(&self, year_id: Uuid) -> Result<(), StoreError> {
        let mut db = self.lock();
        db.writable()?;
        if !db.years.iter().any(|y| y.id == year_id) {
            return Err(StoreError::ForeignKeyViolation("school_settings_current_year_id_fkey".into()));
        }
        db.current_year_id = Some(year_id);
        Ok(())
    }

    async fn list_terms(&self, year_id: Uuid) -> Result<Vec<Term>, StoreError> {
        let db = self.lock();
        db.reachable()?;
        let mut rows: Vec<Term> = db
            .terms
            .iter()
            .filter(|t| t.year_id == year_id)
            .map(|t| db.term(t))
            .collect();
        rows.sort_by_key(|t| t.start_date);
        Ok(rows)
    }

    async fn find_term(&self, id: Uuid) -> Result<Option<Term>, StoreError> {
        let db = self.lock();
        db.reachable()?;
        Ok(db.terms.iter().find(|t| t.id == id).map(|t| db.term(t)))
    }

    async fn current_term(&self) -> Result<Option<Term>, StoreError> {
        let db = self.lock();
        db.reachable()?;
        let term_id = db
            .years
            .iter()
            .find(|y| Some(y.id) == db.current_year_id)
            .and_then(|y| y.current_term_id);
        Ok(db
            .terms
            .iter()
            .find(|t| Some(t.id) == term_id)
            .map(|t| db.term(t)))
    }

    async fn insert_term(&self, term: &NewTerm, make_current: bool) -> Result<Term, StoreError> {
        let mut db = self.lock();
        db.writable()?;
        let Some(year_idx) = db.years.iter().position(|y| y.id == term.academic_year_id) else {
            return Err(StoreError::ForeignKeyViolation("terms_academic_year_id_fkey".into()));
        };
        let id = Uuid::new_v4();
        db.terms.push(TermRec {
            id,
            year_id: term.academic_year_id,
            name: term.name.clone(),
            start_date: term.start_date,
            end_date: term.end_date,
        });
        if make_current {
            db.years[year_idx].current_term_id = Some(id);
        }
        let rec = db.terms.last().map(|t| db.term(t));
        rec.ok_or(StoreError::NotFound)
    }

    async fn set_current_term(&self, year_id: Uuid, term_id: Uuid) -> Result<(), StoreError> {
        let mut db = self.lock();
        db.writable()?;
        let year = db
            .years
            .iter_mut()
            .find(|y| y.id == year_id)
            .ok_or(StoreError::NotFound)?;
        year.current_term_id = Some(term_id);
        Ok(())
    }

    async fn insert_allocation(
        &self,
        allocation: &NewAllocation,
    ) -> Result<TeacherAllocation, StoreError> {
        let mut db = self.lock();
        db.writable()?;
        let row = TeacherAllocation {
            id: Uuid::new_v4(),
            teacher_id: allocation.teacher_id,
            subject_id: allocation.subject_id,
            stream_id: allocation.stream_id,
            academic_year_id: allocation.academic_year_id,
            created_at: OffsetDateTime::now_utc(),
        };
        db.allocations.push(row.clone());
        Ok(row)
    }

    async fn list_recent_allocations(
        &self,
        limit: i64,
    ) -> Result<Vec<AllocationView>, StoreError> {
        let db = self.lock();
        db.reachable()?;
        Ok(db
            .allocations
            .iter()
            .rev()
            .take(limit.max(0) as usize)
            .map(|a| db.allocation_view(a))
            .collect())
    }
}

#[async_trait]
impl AdmissionsRepo for MemoryStore {
    async fn insert_student(&self, student: &NewStudent) -> Result<Student, StoreError> {
        let mut db = self.lock();
        db.writable()?;
        if db
            .students
            .iter()
            .any(|s| s.student_id_human == student.student_id_human)
        {
            return Err(StoreError::UniqueViolation("students_student_id_human_key".into()));
        }
        let row = Student {
            id: Uuid::new_v4(),
            full_name: student.full_name.clone(),
            student_id_human: student.student_id_human.clone(),
            gender: student.gender.as_str().to_string(),
            current_stream_id: Some(student.current_stream_id),
            created_at: OffsetDateTime::now_utc(),
        };
        db.students.push(row.clone());
        Ok(row)
    }
}

#[async_trait]
impl ClubRepo for MemoryStore {
    async fn detect_club_columns(&self) -> Result<ClubColumns, StoreError> {
        let db = self.lock();
        db.reachable()?;
        Ok(db.live_club_columns)
    }

    async fn list_clubs(&self, columns: &ClubColumns) -> Result<Vec<Club>, StoreError> {
        let db = self.lock();
        db.reachable()?;
        db.check_club_columns(columns)?;
        let mut rows = db.clubs.clone();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn insert_club(&self, club: &NewClub, columns: &ClubColumns) -> Result<Club, StoreError> {
        let mut db = self.lock();
        db.writable()?;
        db.check_club_columns(columns)?;
        let (club, _) = columns.fit(club);
        let row = Club {
            id: Uuid::new_v4(),
            name: club.name,
            category: club.category,
            description: club.description,
            meeting_day: club.meeting_day,
            member_count: 0,
        };
        db.clubs.push(row.clone());
        Ok(row)
    }

    async fn enroll_student(&self, club_id: Uuid, student_id: Uuid) -> Result<(), StoreError> {
        let mut db = self.lock();
        db.writable()?;
        if db.fail_enrollment {
            return Err(StoreError::PermissionDenied(
                "new row violates row-level security policy for table \"club_members\"".into(),
            ));
        }
        let club = db
            .clubs
            .iter_mut()
            .find(|c| c.id == club_id)
            .ok_or_else(|| StoreError::ForeignKeyViolation("club_members_club_id_fkey".into()))?;
        club.member_count += 1;
        db.memberships.push((club_id, student_id));
        Ok(())
    }
}

#[async_trait]
impl EventRepo for MemoryStore {
    async fn list_events(&self, audience: Option<Audience>) -> Result<Vec<SchoolEvent>, StoreError> {
        let db = self.lock();
        db.reachable()?;
        let mut rows: Vec<SchoolEvent> = db
            .events
            .iter()
            .filter(|e| audience.map_or(true, |a| e.audience == a))
            .cloned()
            .collect();
        rows.sort_by_key(|e| e.event_date);
        Ok(rows)
    }

    async fn list_events_for(
        &self,
        audiences: &[Audience],
        from: Option<Date>,
        limit: i64,
    ) -> Result<Vec<SchoolEvent>, StoreError> {
        let db = self.lock();
        db.reachable()?;
        let mut rows: Vec<SchoolEvent> = db
            .events
            .iter()
            .filter(|e| audiences.contains(&e.audience))
            .filter(|e| from.map_or(true, |d| e.event_date >= d))
            .cloned()
            .collect();
        rows.sort_by_key(|e| e.event_date);
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }

    async fn insert_event(&self, event: &NewEvent) -> Result<SchoolEvent, StoreError> {
        let mut db = self.lock();
        db.writable()?;
        let row = SchoolEvent {
            id: Uuid::new_v4(),
            title: event.title.clone(),
            event_date: event.event_date,
            location: event.location.clone(),
            audience: event.audience,
            description: event.description.clone(),
        };
        db.events.push(row.clone());
        Ok(row)
    }
}

#[async_trait]
impl GradebookRepo for MemoryStore {
    async fn list_teacher_allocations(
        &self,
        teacher_id: Uuid,
    ) -> Result<Vec<AllocationView>, StoreError> {
        let db = self.lock();
        db.reachable()?;
        Ok(db
            .allocations
            .iter()
            .filter(|a| a.teacher_id == teacher_id)
            .map(|a| db.allocation_view(a))
            .collect())
    }

    async fn find_allocation(&self, id: Uuid) -> Result<Option<AllocationView>, StoreError> {
        let db = self.lock();
        db.reachable()?;
        Ok(db
            .allocations
            .iter()
            .find(|a| a.id == id)
            .map(|a| db.allocation_view(a)))
    }

    async fn students_in_stream(
        &self,
        stream_id: Uuid,
        limit: i64,
    ) -> Result<Vec<SheetStudent>, StoreError> {
        let db = self.lock();
        db.reachable()?;
        let mut rows: Vec<SheetStudent> = db
            .students
            .iter()
            .filter(|s| s.current_stream_id == Some(stream_id))
            .map(|s| SheetStudent {
                id: s.id,
                full_name: s.full_name.clone(),
                student_id_human: s.student_id_human.clone(),
            })
            .collect();
        rows.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }

    async fn marks_for(
        &self,
        allocation_id: Uuid,
        assessment: AssessmentType,
    ) -> Result<Vec<MarkRow>, StoreError> {
        let db = self.lock();
        db.reachable()?;
        Ok(db
            .marks
            .iter()
            .filter(|((_, alloc, kind), _)| *alloc == allocation_id && *kind == assessment)
            .map(|((student_id, _, _), score)| MarkRow {
                student_id: *student_id,
                score: *score,
            })
            .collect())
    }

    async fn upsert_marks(
        &self,
        allocation_id: Uuid,
        assessment: AssessmentType,
        marks: &[MarkUpsert],
    ) -> Result<Vec<MarkOutcome>, StoreError> {
        let mut db = self.lock();
        db.writable()?;
        let mut outcomes = Vec::with_capacity(marks.len());
        for mark in marks {
            let known = db.students.iter().any(|s| s.id == mark.student_id);
            let error = if !known || db.rejected_marks.contains(&mark.student_id) {
                Some("insert or update on table \"marks\" violates foreign key constraint".to_string())
            } else {
                db.marks
                    .insert((mark.student_id, allocation_id, assessment), mark.score);
                None
            };
            outcomes.push(MarkOutcome {
                student_id: mark.student_id,
                error,
            });
        }
        Ok(outcomes)
    }
}

#[async_trait]
impl HouseRepo for MemoryStore {
    async fn list_houses(&self) -> Result<Vec<House>, StoreError> {
        let db = self.lock();
        db.reachable()?;
        let mut rows = db.houses.clone();
        rows.sort_by(|a, b| b.points.cmp(&a.points).then_with(|| a.name.cmp(&b.name)));
        Ok(rows)
    }

    async fn insert_house(&self, house: &NewHouse) -> Result<House, StoreError> {
        let mut db = self.lock();
        db.writable()?;
        if db.houses.iter().any(|h| h.name == house.name) {
            return Err(StoreError::UniqueViolation("houses_name_key".into()));
        }
        let row = House {
            id: Uuid::new_v4(),
            name: house.name.clone(),
            color: house.color.clone(),
            points: 0,
            members: 0,
        };
        db.houses.push(row.clone());
        Ok(row)
    }

    async fn adjust_points(&self, house_id: Uuid, delta: i32) -> Result<House, StoreError> {
        let mut db = self.lock();
        db.writable()?;
        let house = db
            .houses
            .iter_mut()
            .find(|h| h.id == house_id)
            .ok_or(StoreError::NotFound)?;
        house.points += delta;
        Ok(house.clone())
    }
}

/// Scripted text generator that remembers the last prompt it saw.
pub struct FakeGenerator {
    reply: Option<String>,
    last_prompt: Mutex<Option<String>>,
}

impl Default for FakeGenerator {
    fn default() -> Self {
        Self::replying("Here is your draft.")
    }
}

impl FakeGenerator {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Some(text.to_string()),
            last_prompt: Mutex::new(None),
        }
    }

    /// Answers without any text.
    pub fn silent() -> Self {
        Self {
            reply: None,
            last_prompt: Mutex::new(None),
        }
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for FakeGenerator {
    async fn generate(&self, prompt: &str, _json_array: bool) -> Result<Option<String>, AssistantError> {
        *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
        Ok(self.reply.clone())
    }
}
