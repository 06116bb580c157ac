// File: src/watcher.rs
// Purpose: Development watcher: every change in the routes directory triggers stop, reload, start

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context as TaskContext, Poll};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::error::Result;
use crate::server::Server;

/// Something the watcher can cycle on change
#[async_trait]
pub trait Reloadable: Send {
    async fn stop(&mut self) -> Result<()>;
    async fn refresh(&mut self) -> Result<()>;
    async fn start(&mut self) -> Result<()>;
}

#[async_trait]
impl Reloadable for Server {
    async fn stop(&mut self) -> Result<()> {
        Server::stop(self).await
    }

    async fn refresh(&mut self) -> Result<()> {
        self.reload_routes()
    }

    async fn start(&mut self) -> Result<()> {
        Server::start(self).await.map(|_| ())
    }
}

/// One reload: stop, refresh, start
pub async fn reload_cycle<R: Reloadable + ?Sized>(target: &mut R) -> Result<()> {
    target.stop().await?;
    target.refresh().await?;
    target.start().await
}

/// How a reload loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopExit {
    /// Reload cycles run, failed ones included
    pub cycles: usize,
    /// Whether the loop ended on the shutdown signal rather than the end of
    /// the change stream
    pub interrupted: bool,
}

/// Run one reload cycle per change until the stream ends or `shutdown` resolves
///
/// A failed cycle is logged and the loop keeps going. Changes are not
/// debounced.
pub async fn run_reload_loop<R, S, F>(target: &mut R, changes: &mut S, shutdown: F) -> LoopExit
where
    R: Reloadable + ?Sized,
    S: Stream<Item = Event> + Unpin,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut cycles = 0;

    let interrupted = loop {
        tokio::select! {
            change = changes.next() => match change {
                Some(event) => {
                    cycles += 1;
                    info!(kind = ?event.kind, paths = ?event.paths, "Change detected, reloading");
                    tokio::select! {
                        result = reload_cycle(&mut *target) => match result {
                            Ok(()) => info!("Reload complete"),
                            Err(e) => error!(error = %e, "Reload failed"),
                        },
                        _ = &mut shutdown => {
                            warn!("Shutdown requested during reload");
                            break true;
                        }
                    }
                }
                None => break false,
            },
            _ = &mut shutdown => break true,
        }
    };

    LoopExit { cycles, interrupted }
}

/// Recursive watcher over the routes directory
///
/// Yields every event except pure access events. The stream ends once the
/// watcher is closed.
pub struct DevWatcher {
    watcher: Option<RecommendedWatcher>,
    events: mpsc::UnboundedReceiver<Event>,
    dir: PathBuf,
}

impl std::fmt::Debug for DevWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DevWatcher")
            .field("dir", &self.dir)
            .field("open", &self.is_open())
            .finish()
    }
}

impl DevWatcher {
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        let (tx, events) = mpsc::unbounded_channel();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) if is_change(&event) => {
                let _ = tx.send(event);
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Watch error"),
        })?;

        watcher.watch(&dir, RecursiveMode::Recursive)?;
        info!(dir = %dir.display(), "Watching routes directory");

        Ok(Self {
            watcher: Some(watcher),
            events,
            dir,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn is_open(&self) -> bool {
        self.watcher.is_some()
    }

    /// Stop watching; buffered events are still delivered
    pub fn close(&mut self) {
        if self.watcher.take().is_some() {
            info!(dir = %self.dir.display(), "Watcher closed");
        }
    }
}

impl Stream for DevWatcher {
    type Item = Event;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Option<Event>> {
        self.events.poll_recv(cx)
    }
}

fn is_change(event: &Event) -> bool {
    !matches!(event.kind, EventKind::Access(_))
}

/// Watch `dir` and cycle `target` on every change until SIGINT
///
/// On SIGINT the watcher is closed and the process exits with status 0.
pub async fn watch<R: Reloadable + ?Sized>(target: &mut R, dir: impl AsRef<Path>) -> Result<()> {
    let mut watcher = DevWatcher::new(dir)?;

    let exit = run_reload_loop(target, &mut watcher, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    })
    .await;

    watcher.close();

    if exit.interrupted {
        info!(cycles = exit.cycles, "Interrupted, exiting");
        std::process::exit(0);
    }
    Ok(())
}
