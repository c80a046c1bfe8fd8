//! Application status state machine.
//!
//! ```text
//! pending ──► under_review ──► accepted
//!    │              │    └────► rejected
//!    └──────────────┴─────────► withdrawn   (applicant only)
//! ```
//!
//! `accepted`, `rejected`, and `withdrawn` have no outgoing edges.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::domain::{Actor, Application, ApplicationId, ApplicationStatus};
use super::error::BoardError;
use super::repository::{BoardRepository, RepositoryError, WriteOp};

/// Whether `to` is reachable from `from` in one step.
pub const fn transition_allowed(from: ApplicationStatus, to: ApplicationStatus) -> bool {
    use ApplicationStatus::*;
    matches!(
        (from, to),
        (Pending, UnderReview)
            | (UnderReview, Accepted)
            | (UnderReview, Rejected)
            | (Pending, Withdrawn)
            | (UnderReview, Withdrawn)
    )
}

/// Checks capability first, then the transition graph.
///
/// Withdrawal belongs to the applicant alone; every other target needs admin capability.
pub fn check_transition(
    application: &Application,
    to: ApplicationStatus,
    actor: &Actor,
) -> Result<(), BoardError> {
    if to == ApplicationStatus::Withdrawn {
        if actor.id != application.applicant_id {
            return Err(BoardError::NotAuthorized {
                action: "withdraw another user's application",
            });
        }
    } else if !actor.is_admin() {
        return Err(BoardError::NotAuthorized {
            action: "change application status",
        });
    }

    if !transition_allowed(application.status, to) {
        return Err(BoardError::InvalidTransition {
            from: application.status,
            to,
        });
    }
    Ok(())
}

/// Withdrawal op for a resume cascade, or `None` when the application is
/// already closed and must keep its status.
pub(crate) fn cascade_withdrawal(application: &Application, now: DateTime<Utc>) -> Option<WriteOp> {
    transition_allowed(application.status, ApplicationStatus::Withdrawn).then(|| {
        WriteOp::SetApplicationStatus {
            id: application.id.clone(),
            expected: application.status,
            status: ApplicationStatus::Withdrawn,
            updated_at: now,
        }
    })
}

/// Splits comma separated reviewer input into a notes sequence.
pub fn notes_from_text(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|note| !note.is_empty())
        .map(str::to_string)
        .collect()
}

/// Drives status and notes changes for stored applications.
pub struct ApplicationLifecycle<R> {
    repository: Arc<R>,
}

impl<R> ApplicationLifecycle<R>
where
    R: BoardRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    pub fn set_status(
        &self,
        actor: &Actor,
        application_id: &ApplicationId,
        status: ApplicationStatus,
    ) -> Result<Application, BoardError> {
        let application = self.load(application_id)?;
        if let Err(err) = check_transition(&application, status, actor) {
            warn!(
                application = %application_id,
                actor = %actor.id,
                from = %application.status,
                to = %status,
                kind = err.kind(),
                "status change refused"
            );
            return Err(err);
        }

        let committed = self.repository.commit(vec![WriteOp::SetApplicationStatus {
            id: application_id.clone(),
            expected: application.status,
            status,
            updated_at: Utc::now(),
        }]);
        match committed {
            Ok(()) => {}
            Err(RepositoryError::Stale) => {
                let current = self.load(application_id)?;
                warn!(
                    application = %application_id,
                    actor = %actor.id,
                    read = %application.status,
                    current = %current.status,
                    to = %status,
                    "status changed underneath transition"
                );
                return Err(BoardError::InvalidTransition {
                    from: current.status,
                    to: status,
                });
            }
            Err(err) => return Err(err.into()),
        }
        info!(
            application = %application_id,
            actor = %actor.id,
            from = %application.status,
            to = %status,
            "application status changed"
        );
        self.load(application_id)
    }

    /// Replaces the notes sequence wholesale. Status is left alone.
    pub fn replace_notes(
        &self,
        actor: &Actor,
        application_id: &ApplicationId,
        notes: Vec<String>,
    ) -> Result<Application, BoardError> {
        if !actor.is_admin() {
            return Err(BoardError::NotAuthorized {
                action: "edit application notes",
            });
        }
        self.load(application_id)?;

        let count = notes.len();
        self.repository.commit(vec![WriteOp::SetApplicationNotes {
            id: application_id.clone(),
            notes,
            updated_at: Utc::now(),
        }])?;
        info!(application = %application_id, notes = count, "application notes replaced");
        self.load(application_id)
    }

    /// Applicant-initiated withdrawal. The record is kept; it drops out of the
    /// applicant's default view and stays visible to admin filters.
    pub fn withdraw(
        &self,
        actor: &Actor,
        application_id: &ApplicationId,
    ) -> Result<Application, BoardError> {
        self.set_status(actor, application_id, ApplicationStatus::Withdrawn)
    }

    fn load(&self, application_id: &ApplicationId) -> Result<Application, BoardError> {
        self.repository
            .fetch_application(application_id)?
            .ok_or_else(|| BoardError::ApplicationNotFound(application_id.clone()))
    }
}
