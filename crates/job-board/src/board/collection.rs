use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;

use super::domain::{Actor, Application, ApplicationId, ApplicationStatus, UserId};
use super::error::BoardError;
use super::repository::BoardRepository;

/// Set of statuses selected in the admin view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusFilter(BTreeSet<ApplicationStatus>);

impl StatusFilter {
    /// No status selected; the admin view shows nothing.
    pub fn none() -> Self {
        Self(BTreeSet::new())
    }

    pub fn all() -> Self {
        Self(ApplicationStatus::ALL.into_iter().collect())
    }

    /// Parses a comma separated list such as `pending,under_review`.
    pub fn parse(raw: &str) -> Result<Self, BoardError> {
        raw.split(',')
            .map(str::trim)
            .filter(|label| !label.is_empty())
            .map(|label| label.parse::<ApplicationStatus>().map_err(BoardError::from))
            .collect()
    }

    pub fn contains(&self, status: ApplicationStatus) -> bool {
        self.0.contains(&status)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn statuses(&self) -> Vec<ApplicationStatus> {
        self.0.iter().copied().collect()
    }
}

impl Default for StatusFilter {
    fn default() -> Self {
        [ApplicationStatus::Pending, ApplicationStatus::UnderReview]
            .into_iter()
            .collect()
    }
}

impl FromIterator<ApplicationStatus> for StatusFilter {
    fn from_iter<I: IntoIterator<Item = ApplicationStatus>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

fn newest_first(applications: &mut [Application]) {
    applications.sort_by(|a, b| b.applied_at.cmp(&a.applied_at).then(b.id.cmp(&a.id)));
}

/// The applicant's default view: their own applications minus withdrawn ones, newest first.
pub fn applicant_view<I>(applications: I, applicant: &UserId) -> Vec<Application>
where
    I: IntoIterator<Item = Application>,
{
    let mut visible: Vec<Application> = applications
        .into_iter()
        .filter(|application| &application.applicant_id == applicant)
        .filter(|application| application.status != ApplicationStatus::Withdrawn)
        .collect();
    newest_first(&mut visible);
    visible
}

/// The admin view: every application whose status is selected, newest first.
pub fn admin_view<I>(applications: I, filter: &StatusFilter) -> Vec<Application>
where
    I: IntoIterator<Item = Application>,
{
    let mut visible: Vec<Application> = applications
        .into_iter()
        .filter(|application| filter.contains(application.status))
        .collect();
    newest_first(&mut visible);
    visible
}

/// Read-only views over the stored application set.
pub struct ApplicationCollection<R> {
    repository: Arc<R>,
}

impl<R> ApplicationCollection<R>
where
    R: BoardRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    pub fn list_for_applicant(
        &self,
        actor: &Actor,
        applicant: &UserId,
    ) -> Result<Vec<Application>, BoardError> {
        if !actor.may_act_for(applicant) {
            return Err(BoardError::NotAuthorized {
                action: "list another user's applications",
            });
        }
        let applications = self.repository.applications_for(applicant)?;
        Ok(applicant_view(applications, applicant))
    }

    pub fn list_for_admin(
        &self,
        actor: &Actor,
        filter: &StatusFilter,
    ) -> Result<Vec<Application>, BoardError> {
        if !actor.is_admin() {
            return Err(BoardError::NotAuthorized {
                action: "list all applications",
            });
        }
        if filter.is_empty() {
            return Ok(Vec::new());
        }
        let applications = self
            .repository
            .applications_with_status(&filter.statuses())?;
        Ok(admin_view(applications, filter))
    }

    /// A single application, visible to its applicant and to admins.
    pub fn get_application(
        &self,
        actor: &Actor,
        application_id: &ApplicationId,
    ) -> Result<Application, BoardError> {
        let application = self
            .repository
            .fetch_application(application_id)?
            .ok_or_else(|| BoardError::ApplicationNotFound(application_id.clone()))?;
        if !actor.may_act_for(&application.applicant_id) {
            return Err(BoardError::NotAuthorized {
                action: "view another user's application",
            });
        }
        Ok(application)
    }
}
