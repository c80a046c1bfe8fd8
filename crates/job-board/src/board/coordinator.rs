use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};

use super::domain::{
    Actor, Application, ApplicationId, ApplicationStatus, JobId, JobStatus, ResumeId,
};
use super::error::BoardError;
use super::repository::{BoardRepository, RepositoryError};

static APPLICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_application_id() -> ApplicationId {
    let id = APPLICATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ApplicationId(format!("app-{id:06}"))
}

/// Applicant input for a new application.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApplicationRequest {
    pub job_id: JobId,
    #[serde(default)]
    pub resume_id: Option<ResumeId>,
    #[serde(default)]
    pub cover_letter: String,
}

/// Validates a submission and links the new application to its job and resume.
pub struct JobApplicationCoordinator<R> {
    repository: Arc<R>,
}

impl<R> JobApplicationCoordinator<R>
where
    R: BoardRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    pub fn submit_application(
        &self,
        actor: &Actor,
        request: ApplicationRequest,
    ) -> Result<Application, BoardError> {
        let result = self.validate_and_store(actor, request);
        if let Err(err) = &result {
            warn!(actor = %actor.id, kind = err.kind(), "application refused");
        }
        result
    }

    fn validate_and_store(
        &self,
        actor: &Actor,
        request: ApplicationRequest,
    ) -> Result<Application, BoardError> {
        let ApplicationRequest {
            job_id,
            resume_id,
            cover_letter,
        } = request;

        let resume_id = resume_id
            .filter(|id| !id.0.trim().is_empty())
            .ok_or(BoardError::NoResumeSelected)?;

        let job = self
            .repository
            .fetch_job(&job_id)?
            .ok_or_else(|| BoardError::JobNotFound(job_id.clone()))?;
        if job.status != JobStatus::Active && !actor.is_admin() {
            return Err(BoardError::JobNotOpen {
                job_id,
                status: job.status,
            });
        }

        let owned = self
            .repository
            .fetch_resume(&resume_id)?
            .is_some_and(|resume| resume.owner == actor.id);
        if !owned {
            return Err(BoardError::ResumeNotOwned { resume_id });
        }

        let already_open = self
            .repository
            .applications_for(&actor.id)?
            .iter()
            .any(|existing| {
                existing.job_id == job_id && existing.status != ApplicationStatus::Withdrawn
            });
        if already_open {
            return Err(BoardError::DuplicateApplication { job_id });
        }

        let now = Utc::now();
        let application = Application {
            id: next_application_id(),
            job_id,
            applicant_id: actor.id.clone(),
            resume_id,
            cover_letter,
            status: ApplicationStatus::Pending,
            notes: Vec::new(),
            applied_at: now,
            updated_at: now,
        };

        let job_id = application.job_id.clone();
        let resume_id = application.resume_id.clone();
        let stored = match self.repository.insert_application(application) {
            Ok(stored) => stored,
            Err(RepositoryError::MissingReference) => {
                return Err(BoardError::ResumeNotOwned { resume_id })
            }
            Err(RepositoryError::DuplicateOpen) => {
                return Err(BoardError::DuplicateApplication { job_id })
            }
            Err(err) => return Err(err.into()),
        };
        info!(
            application = %stored.id,
            job = %stored.job_id,
            applicant = %stored.applicant_id,
            "application submitted"
        );
        Ok(stored)
    }
}
