use aolog::{FileLog, Log};
use segment::Segment;
use std::fs;
use std::path::Path;

/// Writes `pairs` into `<dir>/<id>.log` as encoded segments and closes the
/// log, releasing its lock so an engine can open it afterwards.
pub fn write_raw_log(dir: &Path, id: u32, pairs: &[(&[u8], &[u8])]) {
    let mut log = FileLog::open(dir.join(format!("{id}.log"))).unwrap();
    for &(key, value) in pairs {
        let segment = Segment::encode(key, value).unwrap();
        log.append(segment.as_bytes()).unwrap();
    }
    log.close().unwrap();
}

/// Sorted filenames present in `dir`.
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter_map(|e| e.file_name().into_string().ok())
        .collect();
    names.sort();
    names
}
