use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::domain::{Actor, EmploymentType, Job, JobId, JobStatus, SalaryRange};
use super::error::BoardError;
use super::repository::{BoardRepository, WriteOp};

static JOB_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_job_id() -> JobId {
    let id = JOB_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    JobId(format!("job-{id:06}"))
}

/// Editable fields of a posting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDraft {
    pub title: String,
    pub company: String,
    pub location: String,
    pub employment_type: EmploymentType,
    pub category: String,
    pub description: String,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub responsibilities: Vec<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub salary: Option<SalaryRange>,
    #[serde(default)]
    pub experience_years: u8,
    #[serde(default)]
    pub application_deadline: Option<NaiveDate>,
    pub status: JobStatus,
}

/// Free-text posting form: list fields arrive as newline or comma separated text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct JobForm {
    pub title: String,
    pub company: String,
    pub location: String,
    pub category: String,
    pub description: String,
    pub requirements: String,
    pub responsibilities: String,
    pub skills: String,
    pub experience_years: u8,
    pub application_deadline: Option<NaiveDate>,
}

fn split_list(text: &str, separator: char) -> Vec<String> {
    text.split(separator)
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

impl JobDraft {
    pub fn from_form(form: JobForm, employment_type: EmploymentType, status: JobStatus) -> Self {
        Self {
            requirements: split_list(&form.requirements, '\n'),
            responsibilities: split_list(&form.responsibilities, '\n'),
            skills: split_list(&form.skills, ','),
            title: form.title,
            company: form.company,
            location: form.location,
            employment_type,
            category: form.category,
            description: form.description,
            salary: None,
            experience_years: form.experience_years,
            application_deadline: form.application_deadline,
            status,
        }
    }

    pub fn validate(&self) -> Result<(), BoardError> {
        let required = [
            ("title", &self.title),
            ("company", &self.company),
            ("description", &self.description),
        ];
        if let Some((field, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(BoardError::InvalidJob(format!("{field} must not be empty")));
        }
        if let Some(salary) = &self.salary {
            if salary.min > salary.max {
                return Err(BoardError::InvalidJob(
                    "salary minimum exceeds maximum".to_string(),
                ));
            }
        }
        Ok(())
    }

    fn into_job(self, id: JobId, posted_at: chrono::DateTime<Utc>) -> Job {
        Job {
            id,
            title: self.title.trim().to_string(),
            company: self.company.trim().to_string(),
            location: self.location.trim().to_string(),
            employment_type: self.employment_type,
            category: self.category.trim().to_string(),
            description: self.description,
            requirements: self.requirements,
            responsibilities: self.responsibilities,
            skills: self.skills,
            salary: self.salary,
            experience_years: self.experience_years,
            application_deadline: self.application_deadline,
            status: self.status,
            posted_at,
        }
    }
}

/// Browse filters. Non-admin callers only ever see active postings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct JobQuery {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub status: Option<JobStatus>,
    #[serde(default)]
    pub page: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobPage {
    pub jobs: Vec<Job>,
    pub current_page: usize,
    pub total_pages: usize,
    pub total: usize,
}

/// Admin-owned postings and the public browse view over them.
pub struct JobCatalog<R> {
    repository: Arc<R>,
    page_size: usize,
}

impl<R> JobCatalog<R>
where
    R: BoardRepository + 'static,
{
    pub fn new(repository: Arc<R>, page_size: usize) -> Self {
        Self {
            repository,
            page_size: page_size.max(1),
        }
    }

    pub fn list_jobs(&self, actor: Option<&Actor>, query: &JobQuery) -> Result<JobPage, BoardError> {
        let is_admin = actor.is_some_and(Actor::is_admin);
        let status = if is_admin {
            query.status
        } else {
            Some(JobStatus::Active)
        };
        let category = query
            .category
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty());
        let location = query
            .location
            .as_deref()
            .map(|value| value.trim().to_lowercase())
            .filter(|value| !value.is_empty());

        let mut matching: Vec<Job> = self
            .repository
            .jobs()?
            .into_iter()
            .filter(|job| status.map_or(true, |wanted| job.status == wanted))
            .filter(|job| category.map_or(true, |wanted| job.category == wanted))
            .filter(|job| {
                location
                    .as_deref()
                    .map_or(true, |wanted| job.location.to_lowercase().contains(wanted))
            })
            .collect();
        matching.sort_by(|a, b| b.posted_at.cmp(&a.posted_at).then(b.id.cmp(&a.id)));

        let total = matching.len();
        let total_pages = total.div_ceil(self.page_size).max(1);
        let current_page = query.page.unwrap_or(1).clamp(1, total_pages);
        let jobs = matching
            .into_iter()
            .skip((current_page - 1) * self.page_size)
            .take(self.page_size)
            .collect();

        Ok(JobPage {
            jobs,
            current_page,
            total_pages,
            total,
        })
    }

    pub fn get_job(&self, actor: Option<&Actor>, job_id: &JobId) -> Result<Job, BoardError> {
        let job = self
            .repository
            .fetch_job(job_id)?
            .ok_or_else(|| BoardError::JobNotFound(job_id.clone()))?;
        let is_admin = actor.is_some_and(Actor::is_admin);
        if job.status != JobStatus::Active && !is_admin {
            return Err(BoardError::JobNotFound(job_id.clone()));
        }
        Ok(job)
    }

    pub fn create_job(&self, actor: &Actor, draft: JobDraft) -> Result<Job, BoardError> {
        require_admin(actor, "create jobs")?;
        draft.validate()?;
        let job = self
            .repository
            .insert_job(draft.into_job(next_job_id(), Utc::now()))?;
        info!(job = %job.id, status = %job.status, "job created");
        Ok(job)
    }

    pub fn update_job(
        &self,
        actor: &Actor,
        job_id: &JobId,
        draft: JobDraft,
    ) -> Result<Job, BoardError> {
        require_admin(actor, "update jobs")?;
        draft.validate()?;
        let existing = self
            .repository
            .fetch_job(job_id)?
            .ok_or_else(|| BoardError::JobNotFound(job_id.clone()))?;
        let job = draft.into_job(existing.id, existing.posted_at);
        self.repository.commit(vec![WriteOp::ReplaceJob(job.clone())])?;
        info!(job = %job.id, status = %job.status, "job updated");
        Ok(job)
    }

    pub fn delete_job(&self, actor: &Actor, job_id: &JobId) -> Result<(), BoardError> {
        require_admin(actor, "delete jobs")?;
        if self.repository.fetch_job(job_id)?.is_none() {
            return Err(BoardError::JobNotFound(job_id.clone()));
        }
        self.repository
            .commit(vec![WriteOp::DeleteJob(job_id.clone())])?;
        info!(job = %job_id, "job deleted");
        Ok(())
    }
}

fn require_admin(actor: &Actor, action: &'static str) -> Result<(), BoardError> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(BoardError::NotAuthorized { action })
    }
}
