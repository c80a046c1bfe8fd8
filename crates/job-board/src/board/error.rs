use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use super::domain::{ApplicationId, ApplicationStatus, JobId, JobStatus, ResumeId, UnknownStatus};
use super::files::FileStoreError;
use super::repository::RepositoryError;

/// Failures surfaced by the board components. Every variant is recoverable.
#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    #[error("cannot move application from {from} to {to}")]
    InvalidTransition {
        from: ApplicationStatus,
        to: ApplicationStatus,
    },
    #[error("resume limit reached: at most {limit} resumes per user")]
    QuotaExceeded { limit: usize },
    #[error("unsupported resume format '{declared}': upload a PDF, DOC, or DOCX file")]
    UnsupportedFormat { declared: String },
    #[error("resume {resume_id} is referenced by existing applications; confirm to withdraw them")]
    DependentApplicationsExist {
        resume_id: ResumeId,
        application_ids: Vec<ApplicationId>,
    },
    #[error("select a resume before applying")]
    NoResumeSelected,
    #[error("job {job_id} is {status} and not accepting applications")]
    JobNotOpen { job_id: JobId, status: JobStatus },
    #[error("resume {resume_id} does not belong to the applicant")]
    ResumeNotOwned { resume_id: ResumeId },
    #[error("not authorized to {action}")]
    NotAuthorized { action: &'static str },
    #[error("authentication required")]
    Unauthenticated,
    #[error("an open application for job {job_id} already exists")]
    DuplicateApplication { job_id: JobId },
    #[error("job {0} not found")]
    JobNotFound(JobId),
    #[error("resume {0} not found")]
    ResumeNotFound(ResumeId),
    #[error("application {0} not found")]
    ApplicationNotFound(ApplicationId),
    #[error("invalid job posting: {0}")]
    InvalidJob(String),
    #[error(transparent)]
    UnknownStatus(#[from] UnknownStatus),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    FileStore(#[from] FileStoreError),
}

impl BoardError {
    /// Stable code the presentation layer maps to a user message.
    pub fn kind(&self) -> &'static str {
        match self {
            BoardError::InvalidTransition { .. } => "invalid_transition",
            BoardError::QuotaExceeded { .. } => "quota_exceeded",
            BoardError::UnsupportedFormat { .. } => "unsupported_format",
            BoardError::DependentApplicationsExist { .. } => "dependent_applications_exist",
            BoardError::NoResumeSelected => "no_resume_selected",
            BoardError::JobNotOpen { .. } => "job_not_open",
            BoardError::ResumeNotOwned { .. } => "resume_not_owned",
            BoardError::NotAuthorized { .. } => "not_authorized",
            BoardError::Unauthenticated => "unauthenticated",
            BoardError::DuplicateApplication { .. } => "duplicate_application",
            BoardError::JobNotFound(_) => "job_not_found",
            BoardError::ResumeNotFound(_) => "resume_not_found",
            BoardError::ApplicationNotFound(_) => "application_not_found",
            BoardError::InvalidJob(_) => "invalid_job",
            BoardError::UnknownStatus(_) => "unknown_status",
            BoardError::Repository(_) => "repository",
            BoardError::FileStore(_) => "file_store",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            BoardError::InvalidTransition { .. }
            | BoardError::JobNotOpen { .. }
            | BoardError::DependentApplicationsExist { .. }
            | BoardError::DuplicateApplication { .. } => StatusCode::CONFLICT,
            BoardError::QuotaExceeded { .. }
            | BoardError::UnsupportedFormat { .. }
            | BoardError::NoResumeSelected
            | BoardError::ResumeNotOwned { .. }
            | BoardError::InvalidJob(_) => StatusCode::UNPROCESSABLE_ENTITY,
            BoardError::UnknownStatus(_) => StatusCode::BAD_REQUEST,
            BoardError::NotAuthorized { .. } => StatusCode::FORBIDDEN,
            BoardError::Unauthenticated => StatusCode::UNAUTHORIZED,
            BoardError::JobNotFound(_)
            | BoardError::ResumeNotFound(_)
            | BoardError::ApplicationNotFound(_) => StatusCode::NOT_FOUND,
            BoardError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
            BoardError::Repository(
                RepositoryError::Conflict
                | RepositoryError::Stale
                | RepositoryError::MissingReference
                | RepositoryError::DuplicateOpen,
            ) => StatusCode::CONFLICT,
            BoardError::Repository(RepositoryError::QuotaExceeded { .. }) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            BoardError::Repository(_) | BoardError::FileStore(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for BoardError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let mut payload = json!({
            "error": self.to_string(),
            "code": self.kind(),
        });

        if let BoardError::DependentApplicationsExist {
            resume_id,
            application_ids,
        } = &self
        {
            payload["resume_id"] = json!(resume_id);
            payload["dependent_application_ids"] = json!(application_ids);
        }

        (status, Json(payload)).into_response()
    }
}
