use std::{path::PathBuf, sync::Arc};

use tokio::sync::{Mutex, broadcast, mpsc, oneshot};

use crate::{
    core::{
        store::{DrillStore, DrillUpdate, ImportOutcome, StoreError},
        table::DrillTable,
    },
    drill::DrillDraft,
    key::scoped_key,
};

use super::events::DrillEvent;

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("join error: {0}")]
    Join(String),
    #[error("drill runtime is not running")]
    ChannelClosed,
}

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub command_queue_bound: usize,
    pub event_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            command_queue_bound: 256,
            event_capacity: 1024,
        }
    }
}

/// Cloneable handle to a store owned by a single runtime task.
///
/// Commands are applied one at a time in arrival order; each mutation has
/// been persisted (or has failed to) before its future resolves.
#[derive(Clone)]
pub struct DrillbookHandle {
    cmd_tx: mpsc::Sender<Command>,
    events_tx: broadcast::Sender<DrillEvent>,
}

struct TrackRef {
    playlist_title: String,
    artist_name: String,
    track_name: String,
}

enum Command {
    CreateOrUpdate {
        draft: DrillDraft,
        resp: oneshot::Sender<Result<DrillUpdate, RuntimeError>>,
    },
    Lookup {
        track: TrackRef,
        resp: oneshot::Sender<Option<String>>,
    },
    IsScoped {
        track: TrackRef,
        resp: oneshot::Sender<bool>,
    },
    RemoveScoped {
        track: TrackRef,
        resp: oneshot::Sender<Result<(), RuntimeError>>,
    },
    Import {
        location: PathBuf,
        resp: oneshot::Sender<Result<ImportOutcome, RuntimeError>>,
    },
    Reload {
        resp: oneshot::Sender<Result<usize, RuntimeError>>,
    },
    ExportLocation {
        resp: oneshot::Sender<PathBuf>,
    },
    Snapshot {
        resp: oneshot::Sender<DrillTable>,
    },
    Shutdown {
        resp: oneshot::Sender<()>,
    },
}

/// Moves `store` into a runtime task and returns a handle to it.
///
/// Must be called from within a tokio runtime.
pub fn spawn_drillbook(store: DrillStore, config: RuntimeConfig) -> DrillbookHandle {
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<Command>(config.command_queue_bound);
    let (events_tx, _) = broadcast::channel::<DrillEvent>(config.event_capacity);

    let events_tx_loop = events_tx.clone();
    let store = Arc::new(Mutex::new(store));

    tokio::spawn(async move {
        while let Some(cmd) = cmd_rx.recv().await {
            if handle_command(cmd, &store, &events_tx_loop).await {
                break;
            }
        }
        log::debug!("Drill runtime stopped");
    });

    DrillbookHandle { cmd_tx, events_tx }
}

impl DrillbookHandle {
    pub fn subscribe(&self) -> broadcast::Receiver<DrillEvent> {
        self.events_tx.subscribe()
    }

    pub async fn create_or_update_drill(&self, draft: DrillDraft) -> Result<DrillUpdate, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::CreateOrUpdate { draft, resp: tx }).await?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    pub async fn lookup_drill(
        &self,
        playlist_title: impl Into<String>,
        artist_name: impl Into<String>,
        track_name: impl Into<String>,
    ) -> Result<Option<String>, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        let track = TrackRef::new(playlist_title, artist_name, track_name);
        self.send(Command::Lookup { track, resp: tx }).await?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    pub async fn is_scoped_to_playlist(
        &self,
        playlist_title: impl Into<String>,
        artist_name: impl Into<String>,
        track_name: impl Into<String>,
    ) -> Result<bool, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        let track = TrackRef::new(playlist_title, artist_name, track_name);
        self.send(Command::IsScoped { track, resp: tx }).await?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    pub async fn remove_scoped_drill(
        &self,
        artist_name: impl Into<String>,
        track_name: impl Into<String>,
        playlist_title: impl Into<String>,
    ) -> Result<(), RuntimeError> {
        let (tx, rx) = oneshot::channel();
        let track = TrackRef::new(playlist_title, artist_name, track_name);
        self.send(Command::RemoveScoped { track, resp: tx }).await?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    pub async fn import_and_merge(&self, location: impl Into<PathBuf>) -> Result<ImportOutcome, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Import {
            location: location.into(),
            resp: tx,
        })
        .await?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    pub async fn reload(&self) -> Result<usize, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Reload { resp: tx }).await?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    pub async fn export_location(&self) -> Result<PathBuf, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::ExportLocation { resp: tx }).await?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    /// Copy of the current table.
    pub async fn snapshot(&self) -> Result<DrillTable, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Snapshot { resp: tx }).await?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    /// Stops the runtime after all previously sent commands are done.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Shutdown { resp: tx }).await?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    async fn send(&self, cmd: Command) -> Result<(), RuntimeError> {
        self.cmd_tx
            .send(cmd)
            .await
            .map_err(|_| RuntimeError::ChannelClosed)
    }
}

impl TrackRef {
    fn new(
        playlist_title: impl Into<String>,
        artist_name: impl Into<String>,
        track_name: impl Into<String>,
    ) -> Self {
        Self {
            playlist_title: playlist_title.into(),
            artist_name: artist_name.into(),
            track_name: track_name.into(),
        }
    }
}

async fn handle_command(
    cmd: Command,
    store: &Arc<Mutex<DrillStore>>,
    events_tx: &broadcast::Sender<DrillEvent>,
) -> bool {
    match cmd {
        Command::CreateOrUpdate { draft, resp } => {
            let res = with_store_blocking(store, move |store| store.create_or_update_drill(draft)).await;
            if let Ok(update) = &res {
                if let Some(key) = &update.demoted {
                    let _ = events_tx.send(DrillEvent::Removed { key: key.clone() });
                }
                let key = update.key.clone();
                let evt = if update.removed {
                    DrillEvent::Removed { key }
                } else {
                    DrillEvent::Saved { key }
                };
                let _ = events_tx.send(evt);
            }
            let _ = resp.send(res);
        }
        Command::Lookup { track, resp } => {
            let store = store.lock().await;
            let notes = store
                .lookup_drill(&track.playlist_title, &track.artist_name, &track.track_name)
                .map(str::to_owned);
            let _ = resp.send(notes);
        }
        Command::IsScoped { track, resp } => {
            let store = store.lock().await;
            let _ = resp.send(store.is_scoped_to_playlist(
                &track.playlist_title,
                &track.artist_name,
                &track.track_name,
            ));
        }
        Command::RemoveScoped { track, resp } => {
            let key = scoped_key(&track.artist_name, &track.track_name, &track.playlist_title);
            let res = with_store_blocking(store, move |store| {
                store.remove_scoped_drill(&track.artist_name, &track.track_name, &track.playlist_title)
            })
            .await;
            if res.is_ok() {
                let _ = events_tx.send(DrillEvent::Removed { key });
            }
            let _ = resp.send(res);
        }
        Command::Import { location, resp } => {
            let res = with_store_blocking(store, move |store| store.import_and_merge(&location)).await;
            if let Ok(ImportOutcome::Merged { entries }) = res {
                let _ = events_tx.send(DrillEvent::Imported { entries });
            }
            let _ = resp.send(res);
        }
        Command::Reload { resp } => {
            let res = with_store_blocking(store, DrillStore::load_from_storage).await;
            if let Ok(drills) = res {
                let _ = events_tx.send(DrillEvent::Reloaded { drills });
            }
            let _ = resp.send(res);
        }
        Command::ExportLocation { resp } => {
            let store = store.lock().await;
            let _ = resp.send(store.export_location().to_path_buf());
        }
        Command::Snapshot { resp } => {
            let store = store.lock().await;
            let _ = resp.send(store.table().clone());
        }
        Command::Shutdown { resp } => {
            let _ = resp.send(());
            return true;
        }
    }

    false
}

/// Runs a store operation that performs file I/O off the async executor.
async fn with_store_blocking<T, F>(store: &Arc<Mutex<DrillStore>>, op: F) -> Result<T, RuntimeError>
where
    T: Send + 'static,
    F: FnOnce(&mut DrillStore) -> Result<T, StoreError> + Send + 'static,
{
    let store_ref = Arc::clone(store);
    tokio::task::spawn_blocking(move || {
        let mut store = store_ref.blocking_lock();
        op(&mut *store)
    })
    .await
    .map_err(|e| RuntimeError::Join(e.to_string()))?
    .map_err(RuntimeError::from)
}
