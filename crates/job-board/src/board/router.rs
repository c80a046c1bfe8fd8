use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Deserialize;

use super::collection::StatusFilter;
use super::coordinator::ApplicationRequest;
use super::domain::{Actor, ApplicationId, ApplicationStatus, JobId, ResumeId, Role, UserId};
use super::error::BoardError;
use super::files::FileStore;
use super::jobs::{JobDraft, JobQuery};
use super::lifecycle::notes_from_text;
use super::repository::BoardRepository;
use super::resumes::ResumeUpload;
use super::service::JobBoardService;

/// Header carrying the authenticated user id, set by the upstream auth layer.
pub const USER_ID_HEADER: &str = "x-user-id";
/// Header carrying the authenticated user's role (`user` or `admin`).
pub const USER_ROLE_HEADER: &str = "x-user-role";
/// Client-supplied file name of a raw resume upload.
pub const FILE_NAME_HEADER: &str = "x-file-name";

type SharedService<R, F> = Arc<JobBoardService<R, F>>;

/// Router builder exposing the job board endpoints.
pub fn board_router<R, F>(service: SharedService<R, F>) -> Router
where
    R: BoardRepository + 'static,
    F: FileStore + 'static,
{
    Router::new()
        .route(
            "/api/jobs",
            get(list_jobs_handler::<R, F>).post(create_job_handler::<R, F>),
        )
        .route(
            "/api/jobs/:job_id",
            get(get_job_handler::<R, F>)
                .put(update_job_handler::<R, F>)
                .delete(delete_job_handler::<R, F>),
        )
        .route("/api/jobs/:job_id/apply", post(apply_handler::<R, F>))
        .route(
            "/api/resumes",
            get(list_resumes_handler::<R, F>).post(upload_resume_handler::<R, F>),
        )
        .route(
            "/api/resumes/:resume_id",
            delete(delete_resume_handler::<R, F>),
        )
        .route(
            "/api/resumes/:resume_id/file",
            get(resume_file_handler::<R, F>),
        )
        .route("/api/applications", get(admin_applications_handler::<R, F>))
        .route(
            "/api/applications/mine",
            get(my_applications_handler::<R, F>),
        )
        .route(
            "/api/applications/:application_id",
            get(get_application_handler::<R, F>),
        )
        .route(
            "/api/applications/:application_id/status",
            put(set_status_handler::<R, F>),
        )
        .route(
            "/api/applications/:application_id/notes",
            put(set_notes_handler::<R, F>),
        )
        .route(
            "/api/applications/:application_id/withdraw",
            post(withdraw_handler::<R, F>),
        )
        .with_state(service)
}

/// Reads the actor forwarded by the authentication layer; `None` when anonymous.
pub fn actor_from_headers(headers: &HeaderMap) -> Option<Actor> {
    let id = headers.get(USER_ID_HEADER)?.to_str().ok()?.trim();
    if id.is_empty() {
        return None;
    }
    let role = match headers
        .get(USER_ROLE_HEADER)
        .and_then(|value| value.to_str().ok())
    {
        Some(value) if value.trim().eq_ignore_ascii_case(Role::Admin.label()) => Role::Admin,
        _ => Role::User,
    };
    Some(Actor {
        id: UserId(id.to_string()),
        role,
    })
}

fn require_actor(headers: &HeaderMap) -> Result<Actor, BoardError> {
    actor_from_headers(headers).ok_or(BoardError::Unauthenticated)
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApplyPayload {
    #[serde(default)]
    resume_id: Option<ResumeId>,
    #[serde(default)]
    cover_letter: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct DeleteResumeParams {
    #[serde(default)]
    confirm_cascade: bool,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct AdminListParams {
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusPayload {
    status: ApplicationStatus,
}

/// Notes arrive either as a list or as the reviewer's comma separated text.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum NotesPayload {
    List { notes: Vec<String> },
    Text { text: String },
}

pub(crate) async fn list_jobs_handler<R, F>(
    State(service): State<SharedService<R, F>>,
    headers: HeaderMap,
    Query(query): Query<JobQuery>,
) -> Result<Response, BoardError>
where
    R: BoardRepository + 'static,
    F: FileStore + 'static,
{
    let actor = actor_from_headers(&headers);
    let page = service.catalog().list_jobs(actor.as_ref(), &query)?;
    Ok(Json(page).into_response())
}

pub(crate) async fn get_job_handler<R, F>(
    State(service): State<SharedService<R, F>>,
    Path(job_id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, BoardError>
where
    R: BoardRepository + 'static,
    F: FileStore + 'static,
{
    let actor = actor_from_headers(&headers);
    let job = service.catalog().get_job(actor.as_ref(), &JobId(job_id))?;
    Ok(Json(job).into_response())
}

pub(crate) async fn create_job_handler<R, F>(
    State(service): State<SharedService<R, F>>,
    headers: HeaderMap,
    Json(draft): Json<JobDraft>,
) -> Result<Response, BoardError>
where
    R: BoardRepository + 'static,
    F: FileStore + 'static,
{
    let actor = require_actor(&headers)?;
    let job = service.catalog().create_job(&actor, draft)?;
    Ok((StatusCode::CREATED, Json(job)).into_response())
}

pub(crate) async fn update_job_handler<R, F>(
    State(service): State<SharedService<R, F>>,
    Path(job_id): Path<String>,
    headers: HeaderMap,
    Json(draft): Json<JobDraft>,
) -> Result<Response, BoardError>
where
    R: BoardRepository + 'static,
    F: FileStore + 'static,
{
    let actor = require_actor(&headers)?;
    let job = service
        .catalog()
        .update_job(&actor, &JobId(job_id), draft)?;
    Ok(Json(job).into_response())
}

pub(crate) async fn delete_job_handler<R, F>(
    State(service): State<SharedService<R, F>>,
    Path(job_id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, BoardError>
where
    R: BoardRepository + 'static,
    F: FileStore + 'static,
{
    let actor = require_actor(&headers)?;
    service.catalog().delete_job(&actor, &JobId(job_id))?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

pub(crate) async fn apply_handler<R, F>(
    State(service): State<SharedService<R, F>>,
    Path(job_id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<ApplyPayload>,
) -> Result<Response, BoardError>
where
    R: BoardRepository + 'static,
    F: FileStore + 'static,
{
    let actor = require_actor(&headers)?;
    let request = ApplicationRequest {
        job_id: JobId(job_id),
        resume_id: payload.resume_id,
        cover_letter: payload.cover_letter,
    };
    let application = service.coordinator().submit_application(&actor, request)?;
    Ok((StatusCode::CREATED, Json(application)).into_response())
}

pub(crate) async fn list_resumes_handler<R, F>(
    State(service): State<SharedService<R, F>>,
    headers: HeaderMap,
) -> Result<Response, BoardError>
where
    R: BoardRepository + 'static,
    F: FileStore + 'static,
{
    let actor = require_actor(&headers)?;
    let resumes = service.resumes().list_resumes(&actor, &actor.id)?;
    Ok(Json(resumes).into_response())
}

pub(crate) async fn upload_resume_handler<R, F>(
    State(service): State<SharedService<R, F>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, BoardError>
where
    R: BoardRepository + 'static,
    F: FileStore + 'static,
{
    let actor = require_actor(&headers)?;
    let header_text = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    };
    let upload = ResumeUpload {
        file_name: header_text(FILE_NAME_HEADER).unwrap_or_else(|| "resume".to_string()),
        content_type: header_text("content-type"),
        bytes: body.to_vec(),
    };
    let resume = service.resumes().add_resume(&actor, upload)?;
    Ok((StatusCode::CREATED, Json(resume)).into_response())
}

pub(crate) async fn resume_file_handler<R, F>(
    State(service): State<SharedService<R, F>>,
    Path(resume_id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, BoardError>
where
    R: BoardRepository + 'static,
    F: FileStore + 'static,
{
    let actor = require_actor(&headers)?;
    let (resume, bytes) = service
        .resumes()
        .resolve_resume(&actor, &ResumeId(resume_id))?;
    Ok(([(header::CONTENT_TYPE, resume.content_type)], bytes).into_response())
}

pub(crate) async fn delete_resume_handler<R, F>(
    State(service): State<SharedService<R, F>>,
    Path(resume_id): Path<String>,
    headers: HeaderMap,
    Query(params): Query<DeleteResumeParams>,
) -> Result<Response, BoardError>
where
    R: BoardRepository + 'static,
    F: FileStore + 'static,
{
    let actor = require_actor(&headers)?;
    let deletion = service.resumes().delete_resume(
        &actor,
        &ResumeId(resume_id),
        params.confirm_cascade,
    )?;
    Ok(Json(deletion).into_response())
}

pub(crate) async fn my_applications_handler<R, F>(
    State(service): State<SharedService<R, F>>,
    headers: HeaderMap,
) -> Result<Response, BoardError>
where
    R: BoardRepository + 'static,
    F: FileStore + 'static,
{
    let actor = require_actor(&headers)?;
    let applications = service
        .applications()
        .list_for_applicant(&actor, &actor.id)?;
    Ok(Json(applications).into_response())
}

pub(crate) async fn admin_applications_handler<R, F>(
    State(service): State<SharedService<R, F>>,
    headers: HeaderMap,
    Query(params): Query<AdminListParams>,
) -> Result<Response, BoardError>
where
    R: BoardRepository + 'static,
    F: FileStore + 'static,
{
    let actor = require_actor(&headers)?;
    let filter = match params.status.as_deref() {
        None => StatusFilter::default(),
        Some(raw) => StatusFilter::parse(raw)?,
    };
    let applications = service.applications().list_for_admin(&actor, &filter)?;
    Ok(Json(applications).into_response())
}

pub(crate) async fn get_application_handler<R, F>(
    State(service): State<SharedService<R, F>>,
    Path(application_id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, BoardError>
where
    R: BoardRepository + 'static,
    F: FileStore + 'static,
{
    let actor = require_actor(&headers)?;
    let application = service
        .applications()
        .get_application(&actor, &ApplicationId(application_id))?;
    Ok(Json(application).into_response())
}

pub(crate) async fn set_status_handler<R, F>(
    State(service): State<SharedService<R, F>>,
    Path(application_id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<StatusPayload>,
) -> Result<Response, BoardError>
where
    R: BoardRepository + 'static,
    F: FileStore + 'static,
{
    let actor = require_actor(&headers)?;
    let application = service.lifecycle().set_status(
        &actor,
        &ApplicationId(application_id),
        payload.status,
    )?;
    Ok(Json(application).into_response())
}

pub(crate) async fn set_notes_handler<R, F>(
    State(service): State<SharedService<R, F>>,
    Path(application_id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<NotesPayload>,
) -> Result<Response, BoardError>
where
    R: BoardRepository + 'static,
    F: FileStore + 'static,
{
    let actor = require_actor(&headers)?;
    let notes = match payload {
        NotesPayload::List { notes } => notes,
        NotesPayload::Text { text } => notes_from_text(&text),
    };
    let application =
        service
            .lifecycle()
            .replace_notes(&actor, &ApplicationId(application_id), notes)?;
    Ok(Json(application).into_response())
}

pub(crate) async fn withdraw_handler<R, F>(
    State(service): State<SharedService<R, F>>,
    Path(application_id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, BoardError>
where
    R: BoardRepository + 'static,
    F: FileStore + 'static,
{
    let actor = require_actor(&headers)?;
    let application = service
        .lifecycle()
        .withdraw(&actor, &ApplicationId(application_id))?;
    Ok(Json(application).into_response())
}
