use clap::Args;
use job_board::board::{
    Actor, Application, ApplicationRequest, ApplicationStatus, BoardError, EmploymentType,
    InMemoryBoardRepository, InMemoryFileStore, Job, JobBoardService, JobDraft, JobForm, JobQuery,
    JobStatus, ResumeUpload, SalaryRange, StatusFilter,
};
use job_board::error::AppError;
use std::sync::Arc;

type DemoBoard = JobBoardService<InMemoryBoardRepository, InMemoryFileStore>;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Number of postings shown per catalog page
    #[arg(long, default_value_t = 2)]
    pub(crate) page_size: usize,
    /// Stop after the confirmation prompt instead of confirming the resume cascade
    #[arg(long)]
    pub(crate) skip_cascade: bool,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        page_size,
        skip_cascade,
    } = args;

    let service: DemoBoard = JobBoardService::with_page_size(
        Arc::new(InMemoryBoardRepository::default()),
        Arc::new(InMemoryFileStore::default()),
        page_size,
    );
    let admin = Actor::admin("admin-ops");
    let applicant = Actor::user("user-jordan");

    println!("Job board demo");
    let jobs = seed_postings(&service, &admin)?;

    let page = service.catalog().list_jobs(None, &JobQuery::default())?;
    println!(
        "\nPublic catalog: {} open postings across {} page(s)",
        page.total, page.total_pages
    );
    for job in &page.jobs {
        println!("  - {} @ {} ({})", job.title, job.company, job.location);
    }

    let resume = service.resumes().add_resume(
        &applicant,
        ResumeUpload {
            file_name: "jordan-resume.pdf".to_string(),
            content_type: None,
            bytes: b"%PDF-1.7 demo resume".to_vec(),
        },
    )?;
    println!(
        "\n{} uploaded {} ({})",
        applicant.id, resume.name, resume.content_type
    );

    let mut submitted = Vec::new();
    for job in &jobs {
        let request = ApplicationRequest {
            job_id: job.id.clone(),
            resume_id: Some(resume.id.clone()),
            cover_letter: format!("I'd like to be considered for {}.", job.title),
        };
        match service.coordinator().submit_application(&applicant, request) {
            Ok(application) => {
                println!("- Applied to {} -> {}", job.title, application.id);
                submitted.push(application);
            }
            Err(err) => println!("- {} refused: {} [{}]", job.title, err, err.kind()),
        }
    }

    if let Some(first) = submitted.first() {
        service
            .lifecycle()
            .set_status(&admin, &first.id, ApplicationStatus::UnderReview)?;
        service.lifecycle().replace_notes(
            &admin,
            &first.id,
            job_board::board::notes_from_text("clear Rust samples, schedule a call"),
        )?;
    }

    print_admin_view(&service, &admin, &StatusFilter::default(), "open")?;

    match service.resumes().delete_resume(&applicant, &resume.id, false) {
        Err(BoardError::DependentApplicationsExist {
            application_ids, ..
        }) => {
            let listed: Vec<String> = application_ids.iter().map(ToString::to_string).collect();
            println!(
                "\nDeleting {} needs confirmation: it backs {}",
                resume.id,
                listed.join(", ")
            );
        }
        Err(err) => return Err(err.into()),
        Ok(deletion) => println!("\nDeleted {} without dependents", deletion.resume_id),
    }

    if skip_cascade {
        return Ok(());
    }

    let deletion = service
        .resumes()
        .delete_resume(&applicant, &resume.id, true)?;
    println!(
        "Confirmed: {} removed, {} application(s) withdrawn",
        deletion.resume_id,
        deletion.withdrawn.len()
    );

    let own = service
        .applications()
        .list_for_applicant(&applicant, &applicant.id)?;
    println!("{} now sees {} active application(s)", applicant.id, own.len());

    let withdrawn: StatusFilter = [ApplicationStatus::Withdrawn].into_iter().collect();
    print_admin_view(&service, &admin, &withdrawn, "withdrawn")?;

    Ok(())
}

fn seed_postings(service: &DemoBoard, admin: &Actor) -> Result<Vec<Job>, BoardError> {
    let mut backend = JobDraft::from_form(
        JobForm {
            title: "Backend Engineer".to_string(),
            company: "Northwind Logistics".to_string(),
            location: "Des Moines, IA".to_string(),
            category: "engineering".to_string(),
            description: "Design and operate the dispatch APIs.".to_string(),
            requirements: "3+ years building services\nComfort with SQL".to_string(),
            responsibilities: "Own the routing service\nMentor new hires".to_string(),
            skills: "rust, postgres, tokio".to_string(),
            experience_years: 3,
            application_deadline: None,
        },
        EmploymentType::FullTime,
        JobStatus::Active,
    );
    backend.salary = Some(SalaryRange {
        min: 120_000,
        max: 150_000,
        currency: "USD".to_string(),
    });

    let support = JobDraft::from_form(
        JobForm {
            title: "Support Specialist".to_string(),
            company: "Northwind Logistics".to_string(),
            location: "Remote".to_string(),
            category: "operations".to_string(),
            description: "Help carriers get the most out of the platform.".to_string(),
            skills: "communication, zendesk".to_string(),
            ..JobForm::default()
        },
        EmploymentType::Remote,
        JobStatus::Active,
    );

    let seasonal = JobDraft::from_form(
        JobForm {
            title: "Seasonal Dispatcher".to_string(),
            company: "Northwind Logistics".to_string(),
            location: "Ames, IA".to_string(),
            category: "operations".to_string(),
            description: "Peak season dispatch coverage.".to_string(),
            ..JobForm::default()
        },
        EmploymentType::Contract,
        JobStatus::Closed,
    );

    [backend, support, seasonal]
        .into_iter()
        .map(|draft| service.catalog().create_job(admin, draft))
        .collect()
}

fn print_admin_view(
    service: &DemoBoard,
    admin: &Actor,
    filter: &StatusFilter,
    label: &str,
) -> Result<(), BoardError> {
    let applications: Vec<Application> = service.applications().list_for_admin(admin, filter)?;
    println!("\nAdmin view ({label}): {} application(s)", applications.len());
    for application in applications {
        let notes = if application.notes.is_empty() {
            "no notes".to_string()
        } else {
            application.notes.join("; ")
        };
        println!(
            "  - {} | job {} | {} | {}",
            application.id, application.job_id, application.status, notes
        );
    }
    Ok(())
}
