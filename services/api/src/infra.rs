use job_board::board::{InMemoryBoardRepository, JobBoardService, LocalFileStore};
use job_board::config::BoardConfig;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type ServedBoard = JobBoardService<InMemoryBoardRepository, LocalFileStore>;

/// Board service backed by the in-process record store and resumes on local disk.
pub(crate) fn board_service(config: &BoardConfig) -> Arc<ServedBoard> {
    Arc::new(JobBoardService::with_page_size(
        Arc::new(InMemoryBoardRepository::default()),
        Arc::new(LocalFileStore::new(config.resume_dir.clone())),
        config.page_size,
    ))
}
