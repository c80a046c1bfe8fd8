use std::sync::Arc;

use super::collection::ApplicationCollection;
use super::coordinator::JobApplicationCoordinator;
use super::files::FileStore;
use super::jobs::JobCatalog;
use super::lifecycle::ApplicationLifecycle;
use super::repository::BoardRepository;
use super::resumes::ResumeStore;

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Facade composing the board components over one repository and file store.
pub struct JobBoardService<R, F> {
    catalog: JobCatalog<R>,
    resumes: ResumeStore<R, F>,
    lifecycle: ApplicationLifecycle<R>,
    applications: ApplicationCollection<R>,
    coordinator: JobApplicationCoordinator<R>,
}

impl<R, F> JobBoardService<R, F>
where
    R: BoardRepository + 'static,
    F: FileStore + 'static,
{
    pub fn new(repository: Arc<R>, files: Arc<F>) -> Self {
        Self::with_page_size(repository, files, DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(repository: Arc<R>, files: Arc<F>, page_size: usize) -> Self {
        Self {
            catalog: JobCatalog::new(repository.clone(), page_size),
            resumes: ResumeStore::new(repository.clone(), files),
            lifecycle: ApplicationLifecycle::new(repository.clone()),
            applications: ApplicationCollection::new(repository.clone()),
            coordinator: JobApplicationCoordinator::new(repository),
        }
    }

    pub fn catalog(&self) -> &JobCatalog<R> {
        &self.catalog
    }

    pub fn resumes(&self) -> &ResumeStore<R, F> {
        &self.resumes
    }

    pub fn lifecycle(&self) -> &ApplicationLifecycle<R> {
        &self.lifecycle
    }

    pub fn applications(&self) -> &ApplicationCollection<R> {
        &self.applications
    }

    pub fn coordinator(&self) -> &JobApplicationCoordinator<R> {
        &self.coordinator
    }
}
