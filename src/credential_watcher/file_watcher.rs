//! File-based storage change detection using the `notify` crate.
//!
//! Another process signing in or out rewrites the shared session file. The
//! watcher re-reads the token on every change to that file and relays it
//! through [`CredentialService::notify_external`], so resource stores see
//! the same [`StorageEvent`] they would for a local sign-in.

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;

use super::types::{ChangeSource, StorageEvent};
use crate::auth::CredentialService;
use crate::traits::TOKEN_KEY;

/// Spawn the file watcher for the session file at `path`.
///
/// Returns the watcher handle (MUST be kept alive - dropping it stops
/// watching and ends the relay task). Must be called inside a tokio
/// runtime.
pub fn spawn_file_watcher(
    service: Arc<CredentialService>,
    path: impl Into<PathBuf>,
) -> notify::Result<RecommendedWatcher> {
    let path = path.into();
    // Watch the directory: the file is replaced by rename on every write.
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&dir).map_err(notify::Error::io)?;

    let (tx, rx) = mpsc::unbounded_channel::<()>();
    let file_name = path.file_name().map(|n| n.to_os_string());

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
        Ok(event) => {
            if !is_content_change(&event.kind) {
                return;
            }
            let touches_file = event
                .paths
                .iter()
                .any(|p| p.file_name().map(|n| n.to_os_string()) == file_name);
            if touches_file {
                // Receiver gone means the relay ended; nothing to do.
                let _ = tx.send(());
            }
        }
        Err(e) => tracing::warn!("Session file watch error: {}", e),
    })?;
    watcher.watch(&dir, RecursiveMode::NonRecursive)?;

    tracing::info!(path = %path.display(), "Watching session file for changes");
    tokio::spawn(relay_changes(service, path, rx));

    Ok(watcher)
}

fn is_content_change(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    )
}

/// Re-read the token after each change and publish it when it differs from
/// the last value relayed. Several raw events per write collapse into one.
async fn relay_changes(
    service: Arc<CredentialService>,
    path: PathBuf,
    mut rx: mpsc::UnboundedReceiver<()>,
) {
    let mut last_seen: Option<String> = None;

    while rx.recv().await.is_some() {
        while rx.try_recv().is_ok() {}

        let token = read_token(&service).await;
        if token == last_seen {
            tracing::trace!("Session file changed, token unchanged");
            continue;
        }
        tracing::debug!(present = token.is_some(), "Token changed on disk");
        last_seen = token.clone();
        service.notify_external(StorageEvent::new(
            TOKEN_KEY,
            token,
            ChangeSource::File(path.clone()),
        ));
    }

    tracing::debug!("Session file relay stopped");
}

async fn read_token(service: &CredentialService) -> Option<String> {
    service.current().await.map(|c| c.token().to_string())
}
