//! Tests for the file-backed session store and its change relay.
//!
//! Two `FileSessionStorage` handles on the same path stand in for two
//! processes sharing one session.

use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tradewatch::adapters::FileSessionStorage;
use tradewatch::auth::CredentialService;
use tradewatch::credential_watcher::{spawn_file_watcher, ChangeSource, StorageEvent};
use tradewatch::traits::{SessionStorage, IDENTITY_KEY, TOKEN_KEY};

async fn next_token_event(
    events: &mut tokio::sync::broadcast::Receiver<StorageEvent>,
) -> StorageEvent {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let event = events.recv().await.unwrap();
            if event.key == TOKEN_KEY {
                return event;
            }
        }
    })
    .await
    .expect("no storage event within 5s")
}

#[tokio::test]
async fn test_sign_in_persists_across_handles() {
    let temp_dir = TempDir::new().unwrap();
    let storage = FileSessionStorage::in_dir(temp_dir.path());
    let service = CredentialService::new(Arc::new(storage.clone()));

    service
        .sign_in("persisted", Some(&serde_json::json!({ "name": "ops" })))
        .await
        .unwrap();

    let other = FileSessionStorage::at_path(storage.path());
    assert_eq!(other.get(TOKEN_KEY).await.unwrap().as_deref(), Some("persisted"));
    assert!(other.get(IDENTITY_KEY).await.unwrap().is_some());

    service.clear_session().await.unwrap();
    assert!(other.get(TOKEN_KEY).await.unwrap().is_none());
    assert!(other.get(IDENTITY_KEY).await.unwrap().is_none());
}

#[tokio::test]
async fn test_write_by_other_process_is_relayed() {
    let temp_dir = TempDir::new().unwrap();
    let storage = FileSessionStorage::in_dir(temp_dir.path());
    let service = Arc::new(CredentialService::new(Arc::new(storage.clone())));
    let mut events = service.subscribe();

    let _watcher = spawn_file_watcher(service.clone(), storage.path()).unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let other = FileSessionStorage::at_path(storage.path());
    other.set(TOKEN_KEY, "from-elsewhere").await.unwrap();

    let event = next_token_event(&mut events).await;
    assert_eq!(event.new_value.as_deref(), Some("from-elsewhere"));
    assert_eq!(event.source, ChangeSource::File(storage.path().to_path_buf()));
    assert_eq!(event.credential().unwrap().token(), "from-elsewhere");

    other.remove(TOKEN_KEY).await.unwrap();

    let event = next_token_event(&mut events).await;
    assert!(event.new_value.is_none());
}
