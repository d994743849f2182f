//! Lecturer views and record updates. Every route requires a lecturer
//! access token.
//!
//! - GET `/dashboard?page=N` - Paginated student listing
//! - POST `/attendance/{student_id}` - Mark attendance for today
//! - POST `/grade/{student_id}` - Assign or update a grade for an exam

use axum::{
    Form, Json, Router,
    extract::{Path, Query, State},
    response::Redirect,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use super::error::{ApiError, ResultExt, validate_text};
use crate::auth::{Auth, LecturerOnly};
use crate::db::{AttendanceStatus, Database, Identity, Page, Role};
use crate::flash::Flash;
use crate::impl_has_auth_backend;
use crate::jwt::JwtConfig;

/// Students listed per dashboard page.
pub const STUDENTS_PER_PAGE: u32 = 5;

const MAX_EXAM_NAME_LEN: usize = 50;
const MAX_GRADE_LEN: usize = 5;

#[derive(Clone)]
pub struct LecturerState {
    pub db: Database,
    pub jwt: Arc<JwtConfig>,
}

impl_has_auth_backend!(LecturerState);

pub fn router(state: LecturerState) -> Router {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/attendance/{student_id}", post(mark_attendance))
        .route("/grade/{student_id}", post(assign_grade))
        .with_state(state)
}

#[derive(Deserialize)]
struct DashboardQuery {
    page: Option<String>,
}

impl DashboardQuery {
    /// Requested page. Anything that is not a positive number means page 1.
    fn page(&self) -> u32 {
        self.page
            .as_deref()
            .and_then(|p| p.trim().parse().ok())
            .filter(|&p| p > 0)
            .unwrap_or(1)
    }
}

#[derive(Serialize)]
struct DashboardResponse {
    lecturer_id: i64,
    students: Page<Identity>,
}

#[derive(Deserialize)]
struct AttendanceForm {
    status: AttendanceStatus,
}

#[derive(Deserialize)]
struct GradeForm {
    exam_name: String,
    score: f64,
    grade: String,
}

async fn dashboard(
    State(state): State<LecturerState>,
    Auth(user, _): Auth<LecturerOnly>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<DashboardResponse>, ApiError> {
    let students = state
        .db
        .users()
        .list_by_role(Role::Student, query.page(), STUDENTS_PER_PAGE)
        .await
        .db_err("Failed to list students")?;

    Ok(Json(DashboardResponse {
        lecturer_id: user.id,
        students,
    }))
}

/// Whether `student_id` names an existing student account.
async fn is_student(db: &Database, student_id: i64) -> Result<bool, ApiError> {
    Ok(db
        .users()
        .get_by_id_and_role(student_id, Role::Student)
        .await
        .db_err("Failed to get student")?
        .is_some())
}

async fn mark_attendance(
    State(state): State<LecturerState>,
    Auth(user, _): Auth<LecturerOnly>,
    Path(student_id): Path<i64>,
    Form(form): Form<AttendanceForm>,
) -> Result<Redirect, ApiError> {
    let dashboard = Role::Lecturer.dashboard_path();
    if !is_student(&state.db, student_id).await? {
        return Ok(Flash::UnknownStudent.redirect(dashboard));
    }

    state
        .db
        .attendance()
        .mark(student_id, form.status)
        .await
        .db_err("Failed to mark attendance")?;

    info!(
        lecturer_id = user.id,
        student_id,
        status = form.status.as_str(),
        "Attendance marked"
    );
    Ok(Flash::AttendanceMarked.redirect(dashboard))
}

async fn assign_grade(
    State(state): State<LecturerState>,
    Auth(user, _): Auth<LecturerOnly>,
    Path(student_id): Path<i64>,
    Form(form): Form<GradeForm>,
) -> Result<Redirect, ApiError> {
    let exam_name = form.exam_name.trim();
    let grade = form.grade.trim();
    validate_text("Exam name", exam_name, MAX_EXAM_NAME_LEN)?;
    validate_text("Grade", grade, MAX_GRADE_LEN)?;
    if !form.score.is_finite() {
        return Err(ApiError::bad_request("Score must be a number"));
    }

    let dashboard = Role::Lecturer.dashboard_path();
    if !is_student(&state.db, student_id).await? {
        return Ok(Flash::UnknownStudent.redirect(dashboard));
    }

    let created = state
        .db
        .grades()
        .upsert(student_id, exam_name, form.score, grade)
        .await
        .db_err("Failed to save grade")?;

    info!(
        lecturer_id = user.id,
        student_id,
        exam_name,
        created,
        "Grade saved"
    );
    Ok(Flash::GradeSaved.redirect(dashboard))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(raw: Option<&str>) -> u32 {
        DashboardQuery {
            page: raw.map(String::from),
        }
        .page()
    }

    #[test]
    fn test_page_falls_back_to_first() {
        assert_eq!(page(None), 1);
        assert_eq!(page(Some("3")), 3);
        assert_eq!(page(Some("abc")), 1);
        assert_eq!(page(Some("0")), 1);
        assert_eq!(page(Some("-2")), 1);
        assert_eq!(page(Some("")), 1);
    }
}
