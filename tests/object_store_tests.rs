use bytes::Bytes;
use lesson_media::object_store::{LocalStore, ObjectStore};

#[tokio::test]
async fn test_local_store_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path()).unwrap();

    let data = Bytes::from("hello world");
    let stored = store
        .store("photo.png", "image/png", data.clone())
        .await
        .unwrap();

    assert_eq!(stored.public_url, format!("/uploads/{}", stored.external_ref));
    assert!(stored.external_ref.ends_with("photo.png"));

    let on_disk = std::fs::read(dir.path().join(&stored.external_ref)).unwrap();
    assert_eq!(on_disk, data);
}

#[tokio::test]
async fn test_local_store_sanitizes_names() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path()).unwrap();

    let stored = store
        .store("../escape attempt.png", "image/png", Bytes::from("data"))
        .await
        .unwrap();

    // The blob stays inside the uploads root under a safe name
    assert!(!stored.external_ref.contains(".."));
    assert!(!stored.external_ref.contains('/'));
    assert!(dir.path().join(&stored.external_ref).exists());
}

#[tokio::test]
async fn test_local_store_keys_are_collision_resistant() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path()).unwrap();

    let a = store
        .store("same.png", "image/png", Bytes::from("first"))
        .await
        .unwrap();
    let b = store
        .store("same.png", "image/png", Bytes::from("second"))
        .await
        .unwrap();

    assert_ne!(a.external_ref, b.external_ref);
    assert_eq!(
        std::fs::read(dir.path().join(&a.external_ref)).unwrap(),
        b"first"
    );
    assert_eq!(
        std::fs::read(dir.path().join(&b.external_ref)).unwrap(),
        b"second"
    );
}

#[tokio::test]
async fn test_local_store_delete() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path()).unwrap();

    let stored = store
        .store("gone.mp4", "video/mp4", Bytes::from("data"))
        .await
        .unwrap();
    assert!(dir.path().join(&stored.external_ref).exists());

    store.delete(&stored.external_ref).await.unwrap();
    assert!(!dir.path().join(&stored.external_ref).exists());
}

#[tokio::test]
async fn test_local_store_delete_nonexistent() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path()).unwrap();

    // Deleting a ref that is already gone should not error
    store.delete("nonexistent").await.unwrap();
}
