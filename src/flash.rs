//! One-shot user-facing messages carried on redirects as `?flash=<code>`.

use axum::response::Redirect;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flash {
    SignupSuccessful,
    InvalidExternalId,
    AccountExists,
    LoginSuccessful,
    InvalidCredentials,
    LoggedOut,
    AccessDenied,
    AttendanceMarked,
    GradeSaved,
    UnknownStudent,
}

impl Flash {
    pub fn code(&self) -> &'static str {
        match self {
            Flash::SignupSuccessful => "signup_successful",
            Flash::InvalidExternalId => "invalid_external_id",
            Flash::AccountExists => "account_exists",
            Flash::LoginSuccessful => "login_successful",
            Flash::InvalidCredentials => "invalid_credentials",
            Flash::LoggedOut => "logged_out",
            Flash::AccessDenied => "access_denied",
            Flash::AttendanceMarked => "attendance_marked",
            Flash::GradeSaved => "grade_saved",
            Flash::UnknownStudent => "unknown_student",
        }
    }

    /// `303 See Other` to `path` carrying this message.
    pub fn redirect(self, path: &str) -> Redirect {
        Redirect::to(&format!("{}?flash={}", path, self.code()))
    }
}
