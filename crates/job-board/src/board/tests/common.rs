use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{Duration, Utc};
use serde_json::Value;

use crate::board::domain::{
    Actor, Application, ApplicationId, ApplicationStatus, EmploymentType, Job, JobId, JobStatus,
    Resume, ResumeId, UserId,
};
use crate::board::repository::{BoardRepository, RepositoryError, WriteOp};
use crate::board::{
    board_router, ApplicationRequest, InMemoryBoardRepository, InMemoryFileStore, JobBoardService,
    JobDraft, ResumeUpload, MAX_RESUMES_PER_USER,
};

pub(super) type MemoryService = JobBoardService<InMemoryBoardRepository, InMemoryFileStore>;

pub(super) fn build_service() -> (
    MemoryService,
    Arc<InMemoryBoardRepository>,
    Arc<InMemoryFileStore>,
) {
    let repository = Arc::new(InMemoryBoardRepository::default());
    let files = Arc::new(InMemoryFileStore::default());
    let service = JobBoardService::new(repository.clone(), files.clone());
    (service, repository, files)
}

pub(super) fn admin() -> Actor {
    Actor::admin("admin-1")
}

pub(super) fn alice() -> Actor {
    Actor::user("user-alice")
}

pub(super) fn bob() -> Actor {
    Actor::user("user-bob")
}

pub(super) fn job_draft(title: &str, status: JobStatus) -> JobDraft {
    JobDraft {
        title: title.to_string(),
        company: "Northwind Logistics".to_string(),
        location: "Des Moines, IA".to_string(),
        employment_type: EmploymentType::FullTime,
        category: "engineering".to_string(),
        description: "Build and run the dispatch platform.".to_string(),
        requirements: vec!["3+ years of Rust".to_string()],
        responsibilities: vec!["Own the routing service".to_string()],
        skills: vec!["rust".to_string(), "postgres".to_string()],
        salary: None,
        experience_years: 3,
        application_deadline: None,
        status,
    }
}

pub(super) fn pdf_upload(file_name: &str) -> ResumeUpload {
    ResumeUpload {
        file_name: file_name.to_string(),
        content_type: Some("application/pdf".to_string()),
        bytes: b"%PDF-1.7 resume".to_vec(),
    }
}

pub(super) fn post_job<R>(
    service: &JobBoardService<R, InMemoryFileStore>,
    title: &str,
    status: JobStatus,
) -> Job
where
    R: BoardRepository + 'static,
{
    service
        .catalog()
        .create_job(&admin(), job_draft(title, status))
        .expect("admin creates job")
}

pub(super) fn upload_resume<R>(
    service: &JobBoardService<R, InMemoryFileStore>,
    actor: &Actor,
    file_name: &str,
) -> Resume
where
    R: BoardRepository + 'static,
{
    service
        .resumes()
        .add_resume(actor, pdf_upload(file_name))
        .expect("resume stored")
}

pub(super) fn apply<R>(
    service: &JobBoardService<R, InMemoryFileStore>,
    actor: &Actor,
    job: &Job,
    resume: &Resume,
) -> Application
where
    R: BoardRepository + 'static,
{
    service
        .coordinator()
        .submit_application(
            actor,
            ApplicationRequest {
                job_id: job.id.clone(),
                resume_id: Some(resume.id.clone()),
                cover_letter: "I would love to join the team.".to_string(),
            },
        )
        .expect("application accepted")
}

/// A stored application with a fixed id and an `applied_at` `minutes_ago` in the past.
pub(super) fn seeded_application(
    id: &str,
    applicant: &str,
    status: ApplicationStatus,
    minutes_ago: i64,
) -> Application {
    let at = Utc::now() - Duration::minutes(minutes_ago);
    Application {
        id: ApplicationId(id.to_string()),
        job_id: JobId(format!("job-for-{id}")),
        applicant_id: UserId(applicant.to_string()),
        resume_id: ResumeId(format!("resume-of-{applicant}")),
        cover_letter: String::new(),
        status,
        notes: Vec::new(),
        applied_at: at,
        updated_at: at,
    }
}

/// Inserts `application`, first storing the resume it points at if that
/// resume is not there yet.
pub(super) fn seed_application(
    repository: &impl BoardRepository,
    application: Application,
) -> Application {
    let present = repository
        .fetch_resume(&application.resume_id)
        .expect("repository readable")
        .is_some();
    if !present {
        repository
            .insert_resume(
                Resume {
                    id: application.resume_id.clone(),
                    owner: application.applicant_id.clone(),
                    name: "seeded.pdf".to_string(),
                    storage_path: format!("resumes/{}.pdf", application.resume_id),
                    content_type: "application/pdf".to_string(),
                    created_at: application.applied_at,
                },
                MAX_RESUMES_PER_USER,
            )
            .expect("seed resume");
    }
    repository
        .insert_application(application)
        .expect("seed application")
}

pub(super) fn stored_status(
    repository: &InMemoryBoardRepository,
    id: &ApplicationId,
) -> ApplicationStatus {
    repository
        .fetch_application(id)
        .expect("repository readable")
        .expect("application present")
        .status
}

/// Delegates to an in-memory repository but refuses every batch commit.
#[derive(Default, Clone)]
pub(super) struct FailingCommitRepository {
    pub(super) inner: InMemoryBoardRepository,
}

impl BoardRepository for FailingCommitRepository {
    fn insert_job(&self, job: Job) -> Result<Job, RepositoryError> {
        self.inner.insert_job(job)
    }

    fn fetch_job(&self, id: &JobId) -> Result<Option<Job>, RepositoryError> {
        self.inner.fetch_job(id)
    }

    fn jobs(&self) -> Result<Vec<Job>, RepositoryError> {
        self.inner.jobs()
    }

    fn insert_resume(
        &self,
        resume: Resume,
        max_per_owner: usize,
    ) -> Result<Resume, RepositoryError> {
        self.inner.insert_resume(resume, max_per_owner)
    }

    fn fetch_resume(&self, id: &ResumeId) -> Result<Option<Resume>, RepositoryError> {
        self.inner.fetch_resume(id)
    }

    fn resumes_for(&self, owner: &UserId) -> Result<Vec<Resume>, RepositoryError> {
        self.inner.resumes_for(owner)
    }

    fn insert_application(
        &self,
        application: Application,
    ) -> Result<Application, RepositoryError> {
        self.inner.insert_application(application)
    }

    fn fetch_application(
        &self,
        id: &ApplicationId,
    ) -> Result<Option<Application>, RepositoryError> {
        self.inner.fetch_application(id)
    }

    fn applications_for(&self, applicant: &UserId) -> Result<Vec<Application>, RepositoryError> {
        self.inner.applications_for(applicant)
    }

    fn applications_referencing(
        &self,
        resume: &ResumeId,
    ) -> Result<Vec<Application>, RepositoryError> {
        self.inner.applications_referencing(resume)
    }

    fn applications_with_status(
        &self,
        statuses: &[ApplicationStatus],
    ) -> Result<Vec<Application>, RepositoryError> {
        self.inner.applications_with_status(statuses)
    }

    fn commit(&self, _batch: Vec<WriteOp>) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("write path offline".to_string()))
    }
}

/// Read calls after which an [`InterleavingRepository`] may run a hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ReadPoint {
    FetchApplication,
    FetchResume,
    ResumesFor,
    ApplicationsFor,
    ApplicationsReferencing,
}

type InterleavedWrite = Box<dyn FnOnce(&InMemoryBoardRepository) + Send>;

/// Delegates to an in-memory repository and, once, runs a competing write
/// right after the chosen read returns. This lands another request's write
/// between a caller's check and its commit.
#[derive(Default)]
pub(super) struct InterleavingRepository {
    pub(super) inner: InMemoryBoardRepository,
    pending: Mutex<Option<(ReadPoint, InterleavedWrite)>>,
}

impl InterleavingRepository {
    pub(super) fn after(
        &self,
        point: ReadPoint,
        write: impl FnOnce(&InMemoryBoardRepository) + Send + 'static,
    ) {
        *self.pending.lock().expect("hook slot") = Some((point, Box::new(write)));
    }

    fn reached(&self, point: ReadPoint) {
        let due = {
            let mut slot = self.pending.lock().expect("hook slot");
            match slot.take() {
                Some((at, write)) if at == point => Some(write),
                other => {
                    *slot = other;
                    None
                }
            }
        };
        if let Some(write) = due {
            write(&self.inner);
        }
    }

    pub(super) fn has_fired(&self) -> bool {
        self.pending.lock().expect("hook slot").is_none()
    }
}

impl BoardRepository for InterleavingRepository {
    fn insert_job(&self, job: Job) -> Result<Job, RepositoryError> {
        self.inner.insert_job(job)
    }

    fn fetch_job(&self, id: &JobId) -> Result<Option<Job>, RepositoryError> {
        self.inner.fetch_job(id)
    }

    fn jobs(&self) -> Result<Vec<Job>, RepositoryError> {
        self.inner.jobs()
    }

    fn insert_resume(
        &self,
        resume: Resume,
        max_per_owner: usize,
    ) -> Result<Resume, RepositoryError> {
        self.inner.insert_resume(resume, max_per_owner)
    }

    fn fetch_resume(&self, id: &ResumeId) -> Result<Option<Resume>, RepositoryError> {
        let found = self.inner.fetch_resume(id);
        self.reached(ReadPoint::FetchResume);
        found
    }

    fn resumes_for(&self, owner: &UserId) -> Result<Vec<Resume>, RepositoryError> {
        let found = self.inner.resumes_for(owner);
        self.reached(ReadPoint::ResumesFor);
        found
    }

    fn insert_application(
        &self,
        application: Application,
    ) -> Result<Application, RepositoryError> {
        self.inner.insert_application(application)
    }

    fn fetch_application(
        &self,
        id: &ApplicationId,
    ) -> Result<Option<Application>, RepositoryError> {
        let found = self.inner.fetch_application(id);
        self.reached(ReadPoint::FetchApplication);
        found
    }

    fn applications_for(&self, applicant: &UserId) -> Result<Vec<Application>, RepositoryError> {
        let found = self.inner.applications_for(applicant);
        self.reached(ReadPoint::ApplicationsFor);
        found
    }

    fn applications_referencing(
        &self,
        resume: &ResumeId,
    ) -> Result<Vec<Application>, RepositoryError> {
        let found = self.inner.applications_referencing(resume);
        self.reached(ReadPoint::ApplicationsReferencing);
        found
    }

    fn applications_with_status(
        &self,
        statuses: &[ApplicationStatus],
    ) -> Result<Vec<Application>, RepositoryError> {
        self.inner.applications_with_status(statuses)
    }

    fn commit(&self, batch: Vec<WriteOp>) -> Result<(), RepositoryError> {
        self.inner.commit(batch)
    }
}

pub(super) type InterleavedService = JobBoardService<InterleavingRepository, InMemoryFileStore>;

pub(super) fn build_interleaved_service() -> (
    InterleavedService,
    Arc<InterleavingRepository>,
    Arc<InMemoryFileStore>,
) {
    let repository = Arc::new(InterleavingRepository::default());
    let files = Arc::new(InMemoryFileStore::default());
    let service = JobBoardService::new(repository.clone(), files.clone());
    (service, repository, files)
}

pub(super) fn router_with_service(service: MemoryService) -> axum::Router {
    board_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
