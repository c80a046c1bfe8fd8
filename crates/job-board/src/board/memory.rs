use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::domain::{
    Application, ApplicationId, ApplicationStatus, Job, JobId, Resume, ResumeId, UserId,
};
use super::repository::{BoardRepository, RepositoryError, WriteOp};

#[derive(Debug, Default, Clone)]
struct BoardState {
    jobs: BTreeMap<JobId, Job>,
    resumes: BTreeMap<ResumeId, Resume>,
    applications: BTreeMap<ApplicationId, Application>,
}

impl BoardState {
    fn apply(&mut self, op: WriteOp) -> Result<(), RepositoryError> {
        match op {
            WriteOp::ReplaceJob(job) => {
                let slot = self
                    .jobs
                    .get_mut(&job.id)
                    .ok_or(RepositoryError::NotFound)?;
                *slot = job;
            }
            WriteOp::DeleteJob(id) => {
                self.jobs.remove(&id).ok_or(RepositoryError::NotFound)?;
            }
            WriteOp::DeleteResume { id, mut dependents } => {
                let mut current: Vec<ApplicationId> = self
                    .applications
                    .values()
                    .filter(|application| application.resume_id == id)
                    .map(|application| application.id.clone())
                    .collect();
                current.sort();
                dependents.sort();
                if current != dependents {
                    return Err(RepositoryError::Stale);
                }
                self.resumes.remove(&id).ok_or(RepositoryError::NotFound)?;
            }
            WriteOp::SetApplicationStatus {
                id,
                expected,
                status,
                updated_at,
            } => {
                let application = self
                    .applications
                    .get_mut(&id)
                    .ok_or(RepositoryError::NotFound)?;
                if application.status != expected {
                    return Err(RepositoryError::Stale);
                }
                application.status = status;
                application.updated_at = updated_at;
            }
            WriteOp::SetApplicationNotes {
                id,
                notes,
                updated_at,
            } => {
                let application = self
                    .applications
                    .get_mut(&id)
                    .ok_or(RepositoryError::NotFound)?;
                application.notes = notes;
                application.updated_at = updated_at;
            }
        }
        Ok(())
    }
}

/// Mutex-guarded repository used by the service binary, the demo, and tests.
#[derive(Debug, Default, Clone)]
pub struct InMemoryBoardRepository {
    state: Arc<Mutex<BoardState>>,
}

impl InMemoryBoardRepository {
    fn lock(&self) -> Result<MutexGuard<'_, BoardState>, RepositoryError> {
        self.state
            .lock()
            .map_err(|_| RepositoryError::Unavailable("board state mutex poisoned".to_string()))
    }
}

impl BoardRepository for InMemoryBoardRepository {
    fn insert_job(&self, job: Job) -> Result<Job, RepositoryError> {
        let mut guard = self.lock()?;
        if guard.jobs.contains_key(&job.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.jobs.insert(job.id.clone(), job.clone());
        Ok(job)
    }

    fn fetch_job(&self, id: &JobId) -> Result<Option<Job>, RepositoryError> {
        Ok(self.lock()?.jobs.get(id).cloned())
    }

    fn jobs(&self) -> Result<Vec<Job>, RepositoryError> {
        Ok(self.lock()?.jobs.values().cloned().collect())
    }

    fn insert_resume(
        &self,
        resume: Resume,
        max_per_owner: usize,
    ) -> Result<Resume, RepositoryError> {
        let mut guard = self.lock()?;
        if guard.resumes.contains_key(&resume.id) {
            return Err(RepositoryError::Conflict);
        }
        let held = guard
            .resumes
            .values()
            .filter(|existing| existing.owner == resume.owner)
            .count();
        if held >= max_per_owner {
            return Err(RepositoryError::QuotaExceeded {
                limit: max_per_owner,
            });
        }
        guard.resumes.insert(resume.id.clone(), resume.clone());
        Ok(resume)
    }

    fn fetch_resume(&self, id: &ResumeId) -> Result<Option<Resume>, RepositoryError> {
        Ok(self.lock()?.resumes.get(id).cloned())
    }

    fn resumes_for(&self, owner: &UserId) -> Result<Vec<Resume>, RepositoryError> {
        Ok(self
            .lock()?
            .resumes
            .values()
            .filter(|resume| &resume.owner == owner)
            .cloned()
            .collect())
    }

    fn insert_application(
        &self,
        application: Application,
    ) -> Result<Application, RepositoryError> {
        let mut guard = self.lock()?;
        if guard.applications.contains_key(&application.id) {
            return Err(RepositoryError::Conflict);
        }
        match guard.resumes.get(&application.resume_id) {
            Some(resume) if resume.owner == application.applicant_id => {}
            _ => return Err(RepositoryError::MissingReference),
        }
        let already_open = guard.applications.values().any(|existing| {
            existing.applicant_id == application.applicant_id
                && existing.job_id == application.job_id
                && existing.status != ApplicationStatus::Withdrawn
        });
        if already_open {
            return Err(RepositoryError::DuplicateOpen);
        }
        guard
            .applications
            .insert(application.id.clone(), application.clone());
        Ok(application)
    }

    fn fetch_application(
        &self,
        id: &ApplicationId,
    ) -> Result<Option<Application>, RepositoryError> {
        Ok(self.lock()?.applications.get(id).cloned())
    }

    fn applications_for(&self, applicant: &UserId) -> Result<Vec<Application>, RepositoryError> {
        Ok(self
            .lock()?
            .applications
            .values()
            .filter(|application| &application.applicant_id == applicant)
            .cloned()
            .collect())
    }

    fn applications_referencing(
        &self,
        resume: &ResumeId,
    ) -> Result<Vec<Application>, RepositoryError> {
        Ok(self
            .lock()?
            .applications
            .values()
            .filter(|application| &application.resume_id == resume)
            .cloned()
            .collect())
    }

    fn applications_with_status(
        &self,
        statuses: &[ApplicationStatus],
    ) -> Result<Vec<Application>, RepositoryError> {
        Ok(self
            .lock()?
            .applications
            .values()
            .filter(|application| statuses.contains(&application.status))
            .cloned()
            .collect())
    }

    fn commit(&self, batch: Vec<WriteOp>) -> Result<(), RepositoryError> {
        let mut guard = self.lock()?;
        let mut staged = guard.clone();
        for op in batch {
            staged.apply(op)?;
        }
        *guard = staged;
        Ok(())
    }
}
