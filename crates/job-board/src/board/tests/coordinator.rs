use super::common::*;

use crate::board::domain::{ApplicationStatus, JobId, JobStatus, ResumeId};
use crate::board::repository::{BoardRepository, WriteOp};
use crate::board::{ApplicationRequest, BoardError};

fn request(job_id: &JobId, resume_id: Option<&ResumeId>) -> ApplicationRequest {
    ApplicationRequest {
        job_id: job_id.clone(),
        resume_id: resume_id.cloned(),
        cover_letter: String::new(),
    }
}

#[test]
fn submission_creates_pending_application() {
    let (service, repository, _) = build_service();
    let job = post_job(&service, "Backend Engineer", JobStatus::Active);
    let resume = upload_resume(&service, &alice(), "alice.pdf");

    let application = apply(&service, &alice(), &job, &resume);

    assert_eq!(application.status, ApplicationStatus::Pending);
    assert_eq!(application.job_id, job.id);
    assert_eq!(application.resume_id, resume.id);
    assert_eq!(application.applicant_id, alice().id);
    assert!(application.notes.is_empty());
    assert_eq!(application.applied_at, application.updated_at);
    assert!(application.id.0.starts_with("app-"));
    assert!(repository
        .fetch_application(&application.id)
        .unwrap()
        .is_some());
}

#[test]
fn missing_resume_selection_is_refused() {
    let (service, repository, _) = build_service();
    let job = post_job(&service, "Backend Engineer", JobStatus::Active);

    let err = service
        .coordinator()
        .submit_application(&alice(), request(&job.id, None))
        .expect_err("resume required");
    assert!(matches!(err, BoardError::NoResumeSelected));

    let blank = ResumeId("   ".to_string());
    let err = service
        .coordinator()
        .submit_application(&alice(), request(&job.id, Some(&blank)))
        .expect_err("blank resume id");
    assert!(matches!(err, BoardError::NoResumeSelected));
    assert!(repository.applications_for(&alice().id).unwrap().is_empty());
}

#[test]
fn closed_and_draft_jobs_are_not_open() {
    let (service, _, _) = build_service();
    let resume = upload_resume(&service, &alice(), "alice.pdf");

    for status in [JobStatus::Closed, JobStatus::Draft] {
        let job = post_job(&service, "Archived Role", status);
        let err = service
            .coordinator()
            .submit_application(&alice(), request(&job.id, Some(&resume.id)))
            .expect_err("job not open");
        assert!(matches!(
            err,
            BoardError::JobNotOpen { status: found, .. } if found == status
        ));
    }
}

#[test]
fn admins_may_apply_to_closed_jobs() {
    let (service, _, _) = build_service();
    let job = post_job(&service, "Internal Transfer", JobStatus::Closed);
    let resume = upload_resume(&service, &admin(), "admin.pdf");

    let application = apply(&service, &admin(), &job, &resume);
    assert_eq!(application.status, ApplicationStatus::Pending);
}

#[test]
fn unknown_job_is_reported() {
    let (service, _, _) = build_service();
    let resume = upload_resume(&service, &alice(), "alice.pdf");
    let missing = JobId("job-missing".to_string());

    let err = service
        .coordinator()
        .submit_application(&alice(), request(&missing, Some(&resume.id)))
        .expect_err("no such job");
    assert!(matches!(err, BoardError::JobNotFound(id) if id == missing));
}

#[test]
fn resume_must_belong_to_the_applicant() {
    let (service, _, _) = build_service();
    let job = post_job(&service, "Backend Engineer", JobStatus::Active);
    let bobs = upload_resume(&service, &bob(), "bob.pdf");

    let err = service
        .coordinator()
        .submit_application(&alice(), request(&job.id, Some(&bobs.id)))
        .expect_err("foreign resume");
    assert!(matches!(err, BoardError::ResumeNotOwned { ref resume_id } if *resume_id == bobs.id));

    let ghost = ResumeId("resume-ghost".to_string());
    let err = service
        .coordinator()
        .submit_application(&alice(), request(&job.id, Some(&ghost)))
        .expect_err("missing resume");
    assert_eq!(err.kind(), "resume_not_owned");
}

#[test]
fn one_open_application_per_job() {
    let (service, _, _) = build_service();
    let job = post_job(&service, "Backend Engineer", JobStatus::Active);
    let resume = upload_resume(&service, &alice(), "alice.pdf");
    let first = apply(&service, &alice(), &job, &resume);

    let err = service
        .coordinator()
        .submit_application(&alice(), request(&job.id, Some(&resume.id)))
        .expect_err("duplicate");
    assert!(matches!(err, BoardError::DuplicateApplication { .. }));

    service
        .lifecycle()
        .withdraw(&alice(), &first.id)
        .expect("withdraw");
    let second = apply(&service, &alice(), &job, &resume);
    assert_ne!(second.id, first.id);
}

#[test]
fn resume_deleted_mid_submission_is_not_referenced() {
    let (service, repository, _) = build_interleaved_service();
    let job = post_job(&service, "Backend Engineer", JobStatus::Active);
    let resume = upload_resume(&service, &alice(), "alice.pdf");

    let doomed = resume.id.clone();
    repository.after(ReadPoint::FetchResume, move |inner| {
        inner
            .commit(vec![WriteOp::DeleteResume {
                id: doomed,
                dependents: Vec::new(),
            }])
            .expect("resume deleted");
    });

    let err = service
        .coordinator()
        .submit_application(&alice(), request(&job.id, Some(&resume.id)))
        .expect_err("resume vanished before insert");

    assert!(repository.has_fired());
    assert!(matches!(err, BoardError::ResumeNotOwned { resume_id } if resume_id == resume.id));
    assert!(repository.inner.applications_for(&alice().id).unwrap().is_empty());
}

#[test]
fn parallel_submissions_leave_one_open_application() {
    let (service, repository, _) = build_interleaved_service();
    let job = post_job(&service, "Backend Engineer", JobStatus::Active);
    let resume = upload_resume(&service, &alice(), "alice.pdf");

    let mut first = seeded_application("app-parallel", "user-alice", ApplicationStatus::Pending, 0);
    first.job_id = job.id.clone();
    first.resume_id = resume.id.clone();
    repository.after(ReadPoint::ApplicationsFor, move |inner| {
        inner.insert_application(first).expect("first submission lands");
    });

    let err = service
        .coordinator()
        .submit_application(&alice(), request(&job.id, Some(&resume.id)))
        .expect_err("second submission for the same job");

    assert!(repository.has_fired());
    assert!(matches!(err, BoardError::DuplicateApplication { job_id } if job_id == job.id));
    let stored = repository.inner.applications_for(&alice().id).unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id.0, "app-parallel");
}
