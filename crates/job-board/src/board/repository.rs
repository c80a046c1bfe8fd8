use chrono::{DateTime, Utc};

use super::domain::{
    Application, ApplicationId, ApplicationStatus, Job, JobId, Resume, ResumeId, UserId,
};

/// A single mutation inside a [`BoardRepository::commit`] batch.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    ReplaceJob(Job),
    DeleteJob(JobId),
    /// Removes a resume, provided the applications referencing it are still
    /// exactly `dependents`.
    DeleteResume {
        id: ResumeId,
        dependents: Vec<ApplicationId>,
    },
    /// Moves an application to `status`, provided it is still at `expected`.
    SetApplicationStatus {
        id: ApplicationId,
        expected: ApplicationStatus,
        status: ApplicationStatus,
        updated_at: DateTime<Utc>,
    },
    SetApplicationNotes {
        id: ApplicationId,
        notes: Vec<String>,
        updated_at: DateTime<Utc>,
    },
}

/// Storage abstraction over the `jobs`, `resumes`, and `applications` record sets.
///
/// Reads and inserts are atomic per call. `commit` applies every op of a batch
/// or none of them; status and notes are written as separate fields so a
/// notes edit never clobbers a concurrent status change.
///
/// Guards that depend on other records are re-checked under the write lock:
/// `insert_resume` enforces the per-owner cap, `insert_application` requires
/// the resume to still belong to the applicant and rejects a second open
/// application for the same job, and `commit` rejects ops whose preconditions
/// no longer hold with [`RepositoryError::Stale`].
pub trait BoardRepository: Send + Sync {
    fn insert_job(&self, job: Job) -> Result<Job, RepositoryError>;
    fn fetch_job(&self, id: &JobId) -> Result<Option<Job>, RepositoryError>;
    fn jobs(&self) -> Result<Vec<Job>, RepositoryError>;

    fn insert_resume(&self, resume: Resume, max_per_owner: usize)
        -> Result<Resume, RepositoryError>;
    fn fetch_resume(&self, id: &ResumeId) -> Result<Option<Resume>, RepositoryError>;
    fn resumes_for(&self, owner: &UserId) -> Result<Vec<Resume>, RepositoryError>;

    fn insert_application(&self, application: Application)
        -> Result<Application, RepositoryError>;
    fn fetch_application(&self, id: &ApplicationId)
        -> Result<Option<Application>, RepositoryError>;
    fn applications_for(&self, applicant: &UserId) -> Result<Vec<Application>, RepositoryError>;
    fn applications_referencing(
        &self,
        resume: &ResumeId,
    ) -> Result<Vec<Application>, RepositoryError>;
    /// Indexed lookup backing the admin view; replaces per-job round trips.
    fn applications_with_status(
        &self,
        statuses: &[ApplicationStatus],
    ) -> Result<Vec<Application>, RepositoryError>;

    fn commit(&self, batch: Vec<WriteOp>) -> Result<(), RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("record changed since it was read")]
    Stale,
    #[error("owner already holds {limit} records")]
    QuotaExceeded { limit: usize },
    #[error("referenced record is missing or owned by someone else")]
    MissingReference,
    #[error("an open record already exists for this pair")]
    DuplicateOpen,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
