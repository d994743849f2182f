//! Student views. Every route requires a student access token, and only ever
//! reads the caller's own records.
//!
//! - GET `/dashboard` - Own profile, attendance and grades
//! - GET `/attendance` - Own attendance
//! - GET `/grades` - Own grades

use axum::{
    Json, Router,
    extract::State,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use std::sync::Arc;

use super::error::{ApiError, ResultExt};
use crate::auth::{Auth, AuthErrorKind, PageAuthError, StudentOnly};
use crate::db::{AttendanceRecord, Database, GradeRecord, Identity, Role};
use crate::impl_has_auth_backend;
use crate::jwt::JwtConfig;

#[derive(Clone)]
pub struct StudentState {
    pub db: Database,
    pub jwt: Arc<JwtConfig>,
}

impl_has_auth_backend!(StudentState);

pub fn router(state: StudentState) -> Router {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/attendance", get(attendance))
        .route("/grades", get(grades))
        .with_state(state)
}

#[derive(Serialize)]
struct DashboardResponse {
    student: Identity,
    attendance: Vec<AttendanceRecord>,
    grades: Vec<GradeRecord>,
}

#[derive(Serialize)]
struct AttendanceResponse {
    attendance: Vec<AttendanceRecord>,
}

#[derive(Serialize)]
struct GradesResponse {
    grades: Vec<GradeRecord>,
}

async fn dashboard(
    State(state): State<StudentState>,
    Auth(user, _): Auth<StudentOnly>,
) -> Result<Response, ApiError> {
    // The token outlives a deleted account; there is nothing left to show.
    let Some(student) = state
        .db
        .users()
        .get_by_id(user.id)
        .await
        .db_err("Failed to get student")?
    else {
        return Ok(PageAuthError {
            kind: AuthErrorKind::Unauthenticated,
            required: Role::Student,
        }
        .into_response());
    };

    let attendance = state
        .db
        .attendance()
        .list_for_student(user.id)
        .await
        .db_err("Failed to list attendance")?;
    let grades = state
        .db
        .grades()
        .list_for_student(user.id)
        .await
        .db_err("Failed to list grades")?;

    Ok(Json(DashboardResponse {
        student,
        attendance,
        grades,
    })
    .into_response())
}

async fn attendance(
    State(state): State<StudentState>,
    Auth(user, _): Auth<StudentOnly>,
) -> Result<Json<AttendanceResponse>, ApiError> {
    let attendance = state
        .db
        .attendance()
        .list_for_student(user.id)
        .await
        .db_err("Failed to list attendance")?;
    Ok(Json(AttendanceResponse { attendance }))
}

async fn grades(
    State(state): State<StudentState>,
    Auth(user, _): Auth<StudentOnly>,
) -> Result<Json<GradesResponse>, ApiError> {
    let grades = state
        .db
        .grades()
        .list_for_student(user.id)
        .await
        .db_err("Failed to list grades")?;
    Ok(Json(GradesResponse { grades }))
}
