use super::*;
use tempfile::tempdir;

// -------------------- In-memory behavior --------------------

#[test]
fn put_get_overwrite() {
    let mut idx = KeyIndex::empty();
    assert!(idx.is_empty());
    assert_eq!(idx.get(b"key"), None);

    idx.put(b"key".to_vec(), FilePointer::new(1, 0));
    assert_eq!(idx.get(b"key"), Some(FilePointer::new(1, 0)));
    assert_eq!(idx.len(), 1);

    // last-write-wins
    idx.put(b"key".to_vec(), FilePointer::new(2, 128));
    assert_eq!(idx.get(b"key"), Some(FilePointer::new(2, 128)));
    assert_eq!(idx.len(), 1);
}

#[test]
fn keys_compare_by_exact_bytes() {
    let mut idx = KeyIndex::empty();
    idx.put(vec![0x00, 0x01], FilePointer::new(1, 0));
    assert_eq!(idx.get(&[0x00, 0x01]), Some(FilePointer::new(1, 0)));
    assert_eq!(idx.get(&[0x00]), None);
    assert_eq!(idx.get(&[0x00, 0x01, 0x00]), None);
}

// -------------------- Persistence --------------------

#[test]
fn save_and_load_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("index.snapshot");

    let mut idx = KeyIndex::empty();
    idx.put(b"alpha".to_vec(), FilePointer::new(1, 0));
    idx.put(b"beta".to_vec(), FilePointer::new(1, 42));
    idx.put(b"gamma".to_vec(), FilePointer::new(3, 7));
    idx.save_to_disk(&path).unwrap();

    let loaded = KeyIndex::load_from_disk(&path).unwrap();
    assert_eq!(loaded, idx);
    assert_eq!(loaded.get(b"beta"), Some(FilePointer::new(1, 42)));
}

#[test]
fn save_replaces_existing_snapshot() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("index.snapshot");

    let mut idx = KeyIndex::empty();
    idx.put(b"k".to_vec(), FilePointer::new(1, 0));
    idx.save_to_disk(&path).unwrap();

    idx.put(b"k".to_vec(), FilePointer::new(2, 9));
    idx.save_to_disk(&path).unwrap();

    let loaded = KeyIndex::load_from_disk(&path).unwrap();
    assert_eq!(loaded.get(b"k"), Some(FilePointer::new(2, 9)));
    // no stray tmp file left behind
    assert!(!dir.path().join("index.snapshot.tmp").exists());
}

#[test]
fn load_missing_snapshot_is_not_found() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("index.snapshot");
    match KeyIndex::load_from_disk(&path) {
        Err(IndexError::NotFound(p)) => assert_eq!(p, path),
        other => panic!("expected NotFound, got {:?}", other),
    }
}

#[test]
fn load_garbage_snapshot_is_corrupt() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("index.snapshot");
    // Truncated bincode: a length prefix promising entries that never come.
    fs::write(&path, [0xFFu8; 3]).unwrap();

    match KeyIndex::load_from_disk(&path) {
        Err(IndexError::Corrupt { .. }) => {}
        other => panic!("expected Corrupt, got {:?}", other),
    }
}

#[test]
fn save_to_unwritable_path_fails_fast() {
    let dir = tempdir().unwrap();
    // Parent directory does not exist.
    let path = dir.path().join("missing").join("index.snapshot");
    let idx = KeyIndex::empty();
    match idx.save_to_disk(&path) {
        Err(IndexError::Io(_)) => {}
        other => panic!("expected Io, got {:?}", other),
    }
}

#[test]
fn empty_index_round_trips() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("index.snapshot");
    KeyIndex::empty().save_to_disk(&path).unwrap();
    let loaded = KeyIndex::load_from_disk(&path).unwrap();
    assert!(loaded.is_empty());
}
