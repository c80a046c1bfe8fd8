//! Job postings, resume attachments, and the application lifecycle.

pub mod collection;
pub mod coordinator;
pub mod domain;
pub mod error;
pub mod files;
pub mod jobs;
pub mod lifecycle;
pub mod memory;
pub mod repository;
pub mod resumes;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use collection::{admin_view, applicant_view, ApplicationCollection, StatusFilter};
pub use coordinator::{ApplicationRequest, JobApplicationCoordinator};
pub use domain::{
    Actor, Application, ApplicationId, ApplicationStatus, EmploymentType, Job, JobId, JobStatus,
    Resume, ResumeId, Role, SalaryRange, User, UserId,
};
pub use error::BoardError;
pub use files::{FileStore, FileStoreError, InMemoryFileStore, LocalFileStore};
pub use jobs::{JobCatalog, JobDraft, JobForm, JobPage, JobQuery};
pub use lifecycle::{check_transition, notes_from_text, transition_allowed, ApplicationLifecycle};
pub use memory::InMemoryBoardRepository;
pub use repository::{BoardRepository, RepositoryError, WriteOp};
pub use resumes::{ResumeDeletion, ResumeFormat, ResumeStore, ResumeUpload, MAX_RESUMES_PER_USER};
pub use router::board_router;
pub use service::JobBoardService;
