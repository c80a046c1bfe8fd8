use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use mime::Mime;
use serde::Serialize;
use tracing::{info, warn};

use super::domain::{Actor, Application, ApplicationId, Resume, ResumeId, UserId};
use super::error::BoardError;
use super::files::FileStore;
use super::lifecycle;
use super::repository::{BoardRepository, RepositoryError, WriteOp};

/// Maximum number of resumes a single user may hold at once.
pub const MAX_RESUMES_PER_USER: usize = 5;

const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

static RESUME_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_resume_id() -> ResumeId {
    let id = RESUME_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ResumeId(format!("resume-{id:06}"))
}

fn sorted_ids(applications: &[Application]) -> Vec<ApplicationId> {
    let mut ids: Vec<ApplicationId> = applications
        .iter()
        .map(|application| application.id.clone())
        .collect();
    ids.sort();
    ids
}

/// Document types accepted for upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResumeFormat {
    Pdf,
    Doc,
    Docx,
}

impl ResumeFormat {
    pub fn from_mime(mime: &Mime) -> Option<Self> {
        match mime.essence_str() {
            "application/pdf" => Some(Self::Pdf),
            "application/msword" => Some(Self::Doc),
            DOCX_MIME => Some(Self::Docx),
            _ => None,
        }
    }

    pub const fn content_type(self) -> &'static str {
        match self {
            ResumeFormat::Pdf => "application/pdf",
            ResumeFormat::Doc => "application/msword",
            ResumeFormat::Docx => DOCX_MIME,
        }
    }
}

/// An incoming document as handed over by the transport layer.
#[derive(Debug, Clone)]
pub struct ResumeUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl ResumeUpload {
    /// The declared type: the explicit content type, or a guess from the file
    /// extension when the transport only sent a generic binary type.
    pub fn declared_type(&self) -> String {
        match self.content_type.as_deref().map(str::trim) {
            Some(declared)
                if !declared.is_empty() && declared != mime::APPLICATION_OCTET_STREAM.as_ref() =>
            {
                declared.to_string()
            }
            _ => mime_guess::from_path(&self.file_name)
                .first_raw()
                .unwrap_or("application/octet-stream")
                .to_string(),
        }
    }

    pub fn format(&self) -> Result<ResumeFormat, BoardError> {
        let declared = self.declared_type();
        declared
            .parse::<Mime>()
            .ok()
            .as_ref()
            .and_then(ResumeFormat::from_mime)
            .ok_or(BoardError::UnsupportedFormat { declared })
    }
}

/// Outcome of a completed resume deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResumeDeletion {
    pub resume_id: ResumeId,
    pub withdrawn: Vec<ApplicationId>,
}

/// Owns each user's resumes and the two-phase delete protocol.
pub struct ResumeStore<R, F> {
    repository: Arc<R>,
    files: Arc<F>,
}

impl<R, F> ResumeStore<R, F>
where
    R: BoardRepository + 'static,
    F: FileStore + 'static,
{
    pub fn new(repository: Arc<R>, files: Arc<F>) -> Self {
        Self { repository, files }
    }

    /// Store a new resume for the calling actor.
    pub fn add_resume(&self, actor: &Actor, upload: ResumeUpload) -> Result<Resume, BoardError> {
        let held = self.repository.resumes_for(&actor.id)?.len();
        if held >= MAX_RESUMES_PER_USER {
            warn!(user = %actor.id, held, "resume quota reached");
            return Err(BoardError::QuotaExceeded {
                limit: MAX_RESUMES_PER_USER,
            });
        }

        let format = upload.format()?;
        let storage_path = self.files.store(&upload.file_name, &upload.bytes)?;

        let resume = Resume {
            id: next_resume_id(),
            owner: actor.id.clone(),
            name: upload.file_name,
            storage_path: storage_path.clone(),
            content_type: format.content_type().to_string(),
            created_at: Utc::now(),
        };

        let stored = match self.repository.insert_resume(resume, MAX_RESUMES_PER_USER) {
            Ok(stored) => stored,
            Err(err) => {
                if let Err(cleanup) = self.files.remove(&storage_path) {
                    warn!(path = %storage_path, error = %cleanup, "orphaned resume file left behind");
                }
                return Err(match err {
                    RepositoryError::QuotaExceeded { limit } => {
                        warn!(user = %actor.id, "resume quota reached at insert");
                        BoardError::QuotaExceeded { limit }
                    }
                    other => other.into(),
                });
            }
        };

        info!(user = %actor.id, resume = %stored.id, ?format, "resume stored");
        Ok(stored)
    }

    /// Resumes held by `owner`, newest first.
    pub fn list_resumes(&self, actor: &Actor, owner: &UserId) -> Result<Vec<Resume>, BoardError> {
        if !actor.may_act_for(owner) {
            return Err(BoardError::NotAuthorized {
                action: "list another user's resumes",
            });
        }
        let mut resumes = self.repository.resumes_for(owner)?;
        resumes.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(resumes)
    }

    /// Metadata and document bytes for a resume visible to `actor`.
    pub fn resolve_resume(
        &self,
        actor: &Actor,
        resume_id: &ResumeId,
    ) -> Result<(Resume, Vec<u8>), BoardError> {
        let resume = self.visible_resume(actor, resume_id, "read another user's resume")?;
        let bytes = self.files.resolve(&resume.storage_path)?;
        Ok((resume, bytes))
    }

    /// Delete a resume.
    ///
    /// With dependents and no confirmation this fails with
    /// `DependentApplicationsExist` and changes nothing. With confirmation the
    /// resume removal and the withdrawal of every open dependent application
    /// are committed as one batch.
    pub fn delete_resume(
        &self,
        actor: &Actor,
        resume_id: &ResumeId,
        confirm_cascade: bool,
    ) -> Result<ResumeDeletion, BoardError> {
        let resume = self.visible_resume(actor, resume_id, "delete another user's resume")?;
        let dependents = self.repository.applications_referencing(resume_id)?;

        if !dependents.is_empty() && !confirm_cascade {
            let application_ids = sorted_ids(&dependents);
            info!(resume = %resume_id, dependents = application_ids.len(), "resume delete awaiting confirmation");
            return Err(BoardError::DependentApplicationsExist {
                resume_id: resume_id.clone(),
                application_ids,
            });
        }

        let now = Utc::now();
        let mut batch = vec![WriteOp::DeleteResume {
            id: resume_id.clone(),
            dependents: sorted_ids(&dependents),
        }];
        let mut withdrawn = Vec::new();
        for application in &dependents {
            if let Some(op) = lifecycle::cascade_withdrawal(application, now) {
                withdrawn.push(application.id.clone());
                batch.push(op);
            }
        }
        withdrawn.sort();

        match self.repository.commit(batch) {
            Ok(()) => {}
            // The caller confirmed a set of dependents that no longer matches;
            // report the current set and let them confirm again.
            Err(RepositoryError::Stale) => {
                let application_ids =
                    sorted_ids(&self.repository.applications_referencing(resume_id)?);
                warn!(resume = %resume_id, dependents = application_ids.len(), "dependents changed during resume delete");
                return Err(BoardError::DependentApplicationsExist {
                    resume_id: resume_id.clone(),
                    application_ids,
                });
            }
            Err(err) => return Err(err.into()),
        }
        info!(
            resume = %resume_id,
            withdrawn = withdrawn.len(),
            "resume deleted"
        );

        if let Err(err) = self.files.remove(&resume.storage_path) {
            warn!(resume = %resume_id, error = %err, "stored resume file not removed");
        }

        Ok(ResumeDeletion {
            resume_id: resume_id.clone(),
            withdrawn,
        })
    }

    fn visible_resume(
        &self,
        actor: &Actor,
        resume_id: &ResumeId,
        action: &'static str,
    ) -> Result<Resume, BoardError> {
        let resume = self
            .repository
            .fetch_resume(resume_id)?
            .ok_or_else(|| BoardError::ResumeNotFound(resume_id.clone()))?;
        if !actor.may_act_for(&resume.owner) {
            return Err(BoardError::NotAuthorized { action });
        }
        Ok(resume)
    }
}
