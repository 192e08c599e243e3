mod handlers;

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use axum::{
    http::{
        header::{ACCESS_CONTROL_ALLOW_ORIGIN, CACHE_CONTROL},
        HeaderValue,
    },
    routing::get,
    Router,
};
use chrono::Utc;
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};

use crate::config::Layout;
use crate::monitor::ChangeMonitor;

pub use handlers::UpdateStatus;

/// Shared state for the dev server.
#[derive(Clone, Debug)]
pub struct AppState {
    notes_dir: PathBuf,
    viewer_dir: PathBuf,
    public_dir: PathBuf,
    monitor: Arc<ChangeMonitor>,
    clock: Arc<UpdateClock>,
}

impl AppState {
    pub fn new(
        notes_dir: impl Into<PathBuf>,
        viewer_dir: impl Into<PathBuf>,
        public_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            notes_dir: notes_dir.into(),
            viewer_dir: viewer_dir.into(),
            public_dir: public_dir.into(),
            monitor: Arc::new(ChangeMonitor::new()),
            clock: Arc::new(UpdateClock::default()),
        }
    }

    pub fn from_layout(layout: &Layout) -> Self {
        Self::new(&layout.notes_dir, &layout.viewer_dir, &layout.public_dir)
    }

    /// Run the first change check so later polls compare against it.
    /// Returns the number of tracked documents.
    pub fn establish_baseline(&self) -> usize {
        self.monitor.check_for_changes(&self.notes_dir);
        self.monitor.tracked()
    }
}

/// Wall-clock seconds that never go backwards within one process.
#[derive(Debug, Default)]
struct UpdateClock {
    last: Mutex<f64>,
}

impl UpdateClock {
    fn now(&self) -> f64 {
        let now = Utc::now().timestamp_micros() as f64 / 1_000_000.0;
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        if now > *last {
            *last = now;
        }
        *last
    }
}

pub fn create_router(state: AppState) -> Router {
    let json = Router::new()
        .route("/files.json", get(handlers::files_json))
        // Legacy listing for older viewers
        .route("/api/files", get(handlers::list_files))
        // Any path below check-updates polls as well.
        .route("/api/check-updates", get(handlers::check_updates))
        .route("/api/check-updates/", get(handlers::check_updates))
        .route("/api/check-updates/{*rest}", get(handlers::check_updates))
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            CACHE_CONTROL,
            HeaderValue::from_static("no-cache"),
        ));

    Router::new()
        .route("/", get(handlers::entry_page))
        .route("/index.html", get(handlers::entry_page))
        .route("/style.css", get(handlers::stylesheet))
        .merge(json)
        .fallback(handlers::fallback)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
