use std::sync::Arc;

use job_board::board::{
    Actor, ApplicationRequest, ApplicationStatus, BoardError, EmploymentType, InMemoryBoardRepository,
    JobBoardService, JobDraft, JobQuery, JobStatus, LocalFileStore, ResumeUpload, StatusFilter,
};

fn scratch_dir(label: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("job-board-{label}-{}", std::process::id()))
}

fn draft(title: &str) -> JobDraft {
    JobDraft {
        title: title.to_string(),
        company: "Northwind Logistics".to_string(),
        location: "Remote".to_string(),
        employment_type: EmploymentType::Remote,
        category: "engineering".to_string(),
        description: "Keep the trucks moving.".to_string(),
        requirements: Vec::new(),
        responsibilities: Vec::new(),
        skills: vec!["rust".to_string()],
        salary: None,
        experience_years: 2,
        application_deadline: None,
        status: JobStatus::Active,
    }
}

fn pdf(name: &str) -> ResumeUpload {
    ResumeUpload {
        file_name: name.to_string(),
        content_type: Some("application/pdf".to_string()),
        bytes: format!("%PDF-1.7 {name}").into_bytes(),
    }
}

#[test]
fn applicant_journey_from_upload_to_cascade_delete() {
    let root = scratch_dir("journey");
    let service = JobBoardService::new(
        Arc::new(InMemoryBoardRepository::default()),
        Arc::new(LocalFileStore::new(&root)),
    );
    let admin = Actor::admin("admin-1");
    let dana = Actor::user("user-dana");

    let backend = service
        .catalog()
        .create_job(&admin, draft("Backend Engineer"))
        .expect("job posted");
    let platform = service
        .catalog()
        .create_job(&admin, draft("Platform Engineer"))
        .expect("job posted");
    let listing = service
        .catalog()
        .list_jobs(None, &JobQuery::default())
        .expect("browse");
    assert_eq!(listing.total, 2);

    let resume = service
        .resumes()
        .add_resume(&dana, pdf("dana.pdf"))
        .expect("resume stored on disk");
    let (_, bytes) = service
        .resumes()
        .resolve_resume(&dana, &resume.id)
        .expect("resume readable");
    assert_eq!(bytes, b"%PDF-1.7 dana.pdf".to_vec());

    let submit = |job_id| {
        service.coordinator().submit_application(
            &dana,
            ApplicationRequest {
                job_id,
                resume_id: Some(resume.id.clone()),
                cover_letter: "Happy to help.".to_string(),
            },
        )
    };
    let first = submit(backend.id.clone()).expect("first application");
    let second = submit(platform.id.clone()).expect("second application");

    service
        .lifecycle()
        .set_status(&admin, &second.id, ApplicationStatus::UnderReview)
        .expect("review starts");

    let open = service
        .applications()
        .list_for_admin(&admin, &StatusFilter::default())
        .expect("admin view");
    assert_eq!(open.len(), 2);

    match service.resumes().delete_resume(&dana, &resume.id, false) {
        Err(BoardError::DependentApplicationsExist {
            application_ids, ..
        }) => assert_eq!(application_ids.len(), 2),
        other => panic!("expected confirmation request, got {other:?}"),
    }

    let deletion = service
        .resumes()
        .delete_resume(&dana, &resume.id, true)
        .expect("cascade");
    assert_eq!(deletion.withdrawn.len(), 2);

    assert!(service
        .applications()
        .list_for_applicant(&dana, &dana.id)
        .expect("own view")
        .is_empty());
    let withdrawn: StatusFilter = [ApplicationStatus::Withdrawn].into_iter().collect();
    let archived = service
        .applications()
        .list_for_admin(&admin, &withdrawn)
        .expect("admin view");
    let mut ids: Vec<_> = archived.into_iter().map(|application| application.id).collect();
    ids.sort();
    let mut expected = vec![first.id, second.id];
    expected.sort();
    assert_eq!(ids, expected);

    assert!(service.resumes().resolve_resume(&dana, &resume.id).is_err());
    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn closed_postings_turn_applicants_away() {
    let service = JobBoardService::new(
        Arc::new(InMemoryBoardRepository::default()),
        Arc::new(LocalFileStore::new(scratch_dir("closed"))),
    );
    let admin = Actor::admin("admin-1");
    let erin = Actor::user("user-erin");

    let mut closed = draft("Seasonal Driver");
    closed.status = JobStatus::Closed;
    let job = service.catalog().create_job(&admin, closed).expect("posted");
    let resume = service
        .resumes()
        .add_resume(&erin, pdf("erin.pdf"))
        .expect("resume stored");

    let err = service
        .coordinator()
        .submit_application(
            &erin,
            ApplicationRequest {
                job_id: job.id,
                resume_id: Some(resume.id),
                cover_letter: String::new(),
            },
        )
        .expect_err("closed job");
    assert_eq!(err.kind(), "job_not_open");
    assert!(service
        .applications()
        .list_for_applicant(&erin, &erin.id)
        .expect("own view")
        .is_empty());
    let _ = std::fs::remove_dir_all(scratch_dir("closed"));
}
