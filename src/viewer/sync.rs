//! Background execution of persistence calls and highlight listings.

use std::sync::Arc;
use std::time::Duration;

use bevy::prelude::*;
use bevy::tasks::{AsyncComputeTaskPool, Task};
use futures_lite::future;

use crate::config::AppConfig;
use crate::overlay::{Highlight, OperationId, PersistReply, PersistenceError};
use crate::persistence::{HighlightBackend, HttpBackend, MemoryBackend, execute};

use super::{OverlayEngine, ReloadHighlightsRequest};
use super::notices::Notices;

/// Where highlights are stored.
#[derive(Resource, Clone)]
pub struct Backend(pub Arc<dyn HighlightBackend>);

impl Default for Backend {
    fn default() -> Self {
        Self(Arc::new(MemoryBackend::new()))
    }
}

/// Progress of background work, shown in the status bar.
#[derive(Resource, Default)]
pub struct SyncStatus {
    pub in_flight: usize,
    pub loading: bool,
    pub backend_name: &'static str,
    /// Bumped per listing so only the newest result is applied.
    load_generation: u64,
}

/// One create/update/delete call running on the task pool.
#[derive(Component)]
pub struct PersistTask {
    op: OperationId,
    task: Task<Result<PersistReply, PersistenceError>>,
}

/// Listing of a document's highlights.
#[derive(Component)]
pub struct ListTask {
    document_id: String,
    generation: u64,
    task: Task<Result<Vec<Highlight>, PersistenceError>>,
}

/// Build the backend from the config: the HTTP API when a base URL is set,
/// otherwise an in-memory store.
pub fn backend_from_config(config: &AppConfig) -> Arc<dyn HighlightBackend> {
    match config.data.api_base_url.as_deref().map(str::trim) {
        Some(url) if !url.is_empty() => Arc::new(HttpBackend::new(
            url,
            config.data.api_token.clone(),
            Duration::from_secs(config.data.request_timeout_secs.max(1)),
        )),
        _ => Arc::new(MemoryBackend::new()),
    }
}

pub fn init_backend(
    config: Res<AppConfig>,
    mut backend: ResMut<Backend>,
    mut status: ResMut<SyncStatus>,
) {
    backend.0 = backend_from_config(&config);
    status.backend_name = backend.0.name();
    match &config.data.api_base_url {
        Some(url) if backend.0.name() == "http" => info!("Persisting highlights to {}", url),
        _ => info!("No API configured, highlights are kept in memory"),
    }
}

pub fn start_highlight_load(
    mut commands: Commands,
    mut events: MessageReader<ReloadHighlightsRequest>,
    backend: Res<Backend>,
    engine: Res<OverlayEngine>,
    mut status: ResMut<SyncStatus>,
) {
    events.clear();

    status.load_generation += 1;
    status.loading = true;

    let document_id = engine.document_id().to_string();
    debug!("Loading highlights for document {}", document_id);

    let backend = backend.0.clone();
    let query = document_id.clone();
    let task_pool = AsyncComputeTaskPool::get();
    let task = task_pool.spawn(async move { backend.list(&query) });
    commands.spawn(ListTask {
        document_id,
        generation: status.load_generation,
        task,
    });
}

pub fn poll_highlight_load(
    mut commands: Commands,
    mut engine: ResMut<OverlayEngine>,
    mut notices: ResMut<Notices>,
    mut status: ResMut<SyncStatus>,
    mut tasks: Query<(Entity, &mut ListTask)>,
) {
    for (entity, mut task) in tasks.iter_mut() {
        let Some(result) = future::block_on(future::poll_once(&mut task.task)) else {
            continue;
        };
        commands.entity(entity).despawn();

        if task.generation != status.load_generation || task.document_id != engine.document_id() {
            debug!("Dropping stale highlight listing for {}", task.document_id);
            continue;
        }
        status.loading = false;

        match result {
            Ok(highlights) => engine.load(highlights),
            Err(e) => {
                warn!("Failed to load highlights for {}: {}", task.document_id, e);
                notices.push(format!("Could not load highlights: {}", e));
            }
        }
    }
}

/// Hand every queued engine request to the task pool.
pub fn dispatch_requests(
    mut commands: Commands,
    mut engine: ResMut<OverlayEngine>,
    backend: Res<Backend>,
) {
    let requests = engine.take_requests();
    if requests.is_empty() {
        return;
    }

    let task_pool = AsyncComputeTaskPool::get();
    for request in requests {
        debug!("Dispatching operation {} ({})", request.op, request.call.label());
        let backend = backend.0.clone();
        let call = request.call;
        let task = task_pool.spawn(async move { execute(backend.as_ref(), &call) });
        commands.spawn(PersistTask {
            op: request.op,
            task,
        });
    }
}

pub fn poll_persist_tasks(
    mut commands: Commands,
    mut engine: ResMut<OverlayEngine>,
    mut status: ResMut<SyncStatus>,
    mut tasks: Query<(Entity, &mut PersistTask)>,
) {
    let mut running = 0;
    for (entity, mut task) in tasks.iter_mut() {
        match future::block_on(future::poll_once(&mut task.task)) {
            Some(result) => {
                engine.resolve(task.op, result);
                commands.entity(entity).despawn();
            }
            None => running += 1,
        }
    }
    status.in_flight = running;
}

/// Move engine notices into the on-screen notice list.
pub fn collect_notices(mut engine: ResMut<OverlayEngine>, mut notices: ResMut<Notices>) {
    for notice in engine.drain_notices() {
        notices.push(notice.message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfigData;

    fn config(api_base_url: Option<&str>) -> AppConfig {
        AppConfig {
            data: AppConfigData {
                api_base_url: api_base_url.map(String::from),
                ..default()
            },
            ..default()
        }
    }

    #[test]
    fn test_backend_defaults_to_memory() {
        assert_eq!(backend_from_config(&config(None)).name(), "memory");
        assert_eq!(backend_from_config(&config(Some("  "))).name(), "memory");
    }

    #[test]
    fn test_backend_uses_http_when_url_set() {
        let backend = backend_from_config(&config(Some("http://localhost:8000")));
        assert_eq!(backend.name(), "http");
    }
}
