use super::*;
use segment::Segment;
use tempfile::tempdir;

fn seg(key: &[u8], value: &[u8]) -> Segment {
    Segment::encode(key, value).unwrap()
}

// -------------------- Id parsing --------------------

#[test]
fn parse_log_id_accepts_numeric_names() {
    assert_eq!(parse_log_id(Path::new("/data/1.log")), Some(1));
    assert_eq!(parse_log_id(Path::new("42.log")), Some(42));
    // Leading zeros parse numerically.
    assert_eq!(parse_log_id(Path::new("007.log")), Some(7));
}

#[test]
fn parse_log_id_rejects_unmanaged_names() {
    // Orphanized logs, snapshots, and anything non-numeric are not managed.
    assert_eq!(parse_log_id(Path::new("_1.log")), None);
    assert_eq!(parse_log_id(Path::new("index.snapshot")), None);
    assert_eq!(parse_log_id(Path::new("1a.log")), None);
    assert_eq!(parse_log_id(Path::new(".log")), None);
    assert_eq!(parse_log_id(Path::new("1")), None);
    assert_eq!(parse_log_id(Path::new("0.log")), None);
}

#[test]
fn open_rejects_unmanaged_path() {
    let dir = tempdir().unwrap();
    match FileLog::open(dir.path().join("notalog.log")) {
        Err(LogError::NotManaged(_)) => {}
        other => panic!("expected NotManaged, got {:?}", other),
    }
}

// -------------------- Append --------------------

#[test]
fn append_returns_pre_append_offsets() {
    let dir = tempdir().unwrap();
    let mut log = FileLog::open(dir.path().join("1.log")).unwrap();
    assert_eq!(log.size().unwrap(), 0);

    let a = seg(b"key1", b"value1");
    let b = seg(b"key2", b"longer-value-2");

    let p1 = log.append(a.as_bytes()).unwrap();
    assert_eq!(p1, FilePointer::new(1, 0));

    let p2 = log.append(b.as_bytes()).unwrap();
    assert_eq!(p2, FilePointer::new(1, a.len() as u64));

    assert_eq!(log.size().unwrap(), (a.len() + b.len()) as u64);
}

#[test]
fn append_after_reopen_continues_at_end() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("3.log");
    let record = seg(b"k", b"v");

    let mut log = FileLog::open(&path).unwrap();
    log.append(record.as_bytes()).unwrap();
    log.close().unwrap();

    let mut log = FileLog::open(&path).unwrap();
    let p = log.append(record.as_bytes()).unwrap();
    assert_eq!(p, FilePointer::new(3, record.len() as u64));
}

// -------------------- Raw reads --------------------

#[test]
fn read_returns_requested_range() {
    let dir = tempdir().unwrap();
    let mut log = FileLog::open(dir.path().join("1.log")).unwrap();
    let record = seg(b"Hello", b"World");
    log.append(record.as_bytes()).unwrap();

    let all = log.read(0, record.len() as u64).unwrap();
    assert_eq!(&all[..], record.as_bytes());

    // value bytes only
    let value = log.read(13, 5).unwrap();
    assert_eq!(&value[..], b"World");
}

#[test]
fn read_out_of_bounds_is_invalid_range() {
    let dir = tempdir().unwrap();
    let mut log = FileLog::open(dir.path().join("1.log")).unwrap();
    let record = seg(b"Hello", b"World");
    log.append(record.as_bytes()).unwrap();
    let size = log.size().unwrap();

    for (offset, length) in [
        (0, 0),            // zero length
        (size, 1),         // offset at end
        (size + 10, 1),    // offset past end
        (0, size + 1),     // range past end
        (size - 1, 2),     // tail overrun
        (u64::MAX, 1),     // offset + length overflow
    ] {
        match log.read(offset, length) {
            Err(LogError::InvalidRange { .. }) => {}
            other => panic!(
                "offset {} length {}: expected InvalidRange, got {:?}",
                offset, length, other
            ),
        }
    }
}

// -------------------- Segment reads --------------------

#[test]
fn read_segment_at_each_offset() {
    let dir = tempdir().unwrap();
    let mut log = FileLog::open(dir.path().join("1.log")).unwrap();

    let records = [
        seg(b"key1", b"value1"),
        seg(b"key2", b""),
        seg(b"key3", &vec![0x5A; 300]),
    ];
    let mut offsets = Vec::new();
    for r in &records {
        offsets.push(log.append(r.as_bytes()).unwrap().offset);
    }

    for (r, &off) in records.iter().zip(&offsets) {
        let read = log.read_segment(off).unwrap();
        assert_eq!(read.key(), r.key());
        assert_eq!(read.value(), r.value());
        assert!(read.is_valid());
    }
}

#[test]
fn read_segment_out_of_bounds_is_invalid_range() {
    let dir = tempdir().unwrap();
    let mut log = FileLog::open(dir.path().join("1.log")).unwrap();
    let record = seg(b"k", b"v");
    log.append(record.as_bytes()).unwrap();

    match log.read_segment(record.len() as u64) {
        Err(LogError::InvalidRange { .. }) => {}
        other => panic!("expected InvalidRange, got {:?}", other),
    }
}

#[test]
fn read_segment_mid_record_is_rejected() {
    let dir = tempdir().unwrap();
    let mut log = FileLog::open(dir.path().join("1.log")).unwrap();
    log.append(seg(b"Hello", b"World").as_bytes()).unwrap();

    // Offset 1 lands inside the checksum field; whatever the garbage header
    // declares, the result is either a range overrun or a failed checksum.
    match log.read_segment(1) {
        Err(LogError::InvalidRange { .. }) | Err(LogError::CorruptSegment { .. }) => {}
        other => panic!("expected failure, got {:?}", other),
    }
}

#[test]
fn read_segment_detects_bit_rot() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("1.log");
    let record = seg(b"Hello", b"World");
    {
        let mut log = FileLog::open(&path).unwrap();
        log.append(record.as_bytes()).unwrap();
        log.close().unwrap();
    }

    // Flip one payload byte behind the engine's back.
    let mut raw = std::fs::read(&path).unwrap();
    raw[10] ^= 0x01;
    std::fs::write(&path, &raw).unwrap();

    let log = FileLog::open(&path).unwrap();
    match log.read_segment(0) {
        Err(LogError::CorruptSegment { offset: 0, .. }) => {}
        other => panic!("expected CorruptSegment, got {:?}", other),
    }
}

#[test]
fn read_segment_truncated_tail_is_invalid_range() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("1.log");
    let record = seg(b"Hello", b"World");
    {
        let mut log = FileLog::open(&path).unwrap();
        log.append(record.as_bytes()).unwrap();
        log.close().unwrap();
    }

    // Drop the last two bytes, as a crash mid-append would.
    let mut raw = std::fs::read(&path).unwrap();
    raw.truncate(raw.len() - 2);
    std::fs::write(&path, &raw).unwrap();

    let log = FileLog::open(&path).unwrap();
    match log.read_segment(0) {
        Err(LogError::InvalidRange { .. }) => {}
        other => panic!("expected InvalidRange, got {:?}", other),
    }
}

// -------------------- Locking & close --------------------

#[test]
fn second_open_conflicts_on_lock() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("1.log");
    let _held = FileLog::open(&path).unwrap();

    match FileLog::open(&path) {
        Err(LogError::LockConflict(p)) => assert_eq!(p, path),
        other => panic!("expected LockConflict, got {:?}", other),
    }
}

#[test]
fn close_releases_the_lock() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("1.log");

    let log = FileLog::open(&path).unwrap();
    log.close().unwrap();

    // Reopen must succeed now that the lock is gone.
    let log = FileLog::open(&path).unwrap();
    assert_eq!(log.id(), 1);
    assert_eq!(log.path(), path);
}
