//! End-to-end behavior of the polling watcher against real files.

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use pollwatch::{Digest, PollWatcher, WatchError, WatchedFile};
use tempfile::TempDir;

const WAIT: Duration = Duration::from_secs(2);

#[test]
fn test_overwrite_is_reported_once() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("a.txt");
    fs::write(&path, "v1").unwrap();

    let file = WatchedFile::new(&path).unwrap();
    let mut watcher = PollWatcher::builder()
        .poll_interval(Duration::from_millis(50))
        .file(file.clone())
        .build()
        .unwrap();
    let (events, _errors) = watcher.start().unwrap();

    fs::write(&path, "v2").unwrap();

    // Two ticks is enough; allow slack for slow CI machines
    let event = events.recv_timeout(WAIT).expect("change should be reported");
    assert_eq!(event.len(), 1);
    assert!(Arc::ptr_eq(&event.files()[0], &file));
    assert_eq!(event.files()[0].path(), path.as_path());

    assert!(events.recv_timeout(Duration::from_millis(250)).is_err());

    watcher.stop().unwrap();
}

#[test]
fn test_missing_file_is_rejected() {
    let temp = TempDir::new().unwrap();
    let result = WatchedFile::new(temp.path().join("missing.txt"));

    match result {
        Err(WatchError::InvalidFile { path, .. }) => {
            assert!(path.ends_with("missing.txt"));
        }
        other => panic!("expected InvalidFile, got {other:?}"),
    }
}

#[test]
fn test_zero_poll_interval_is_rejected() {
    let result = PollWatcher::builder().poll_interval(Duration::ZERO).build();
    assert!(matches!(result, Err(WatchError::InvalidDuration)));
}

#[test]
fn test_digest_detects_same_length_rewrite() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("large.bin");
    fs::write(&path, "aaaa").unwrap();

    let file = WatchedFile::builder(&path).strategy(Digest).build().unwrap();
    let mut watcher = PollWatcher::builder()
        .poll_interval(Duration::from_millis(30))
        .file(file.clone())
        .build()
        .unwrap();
    let (events, _errors) = watcher.start().unwrap();

    fs::write(&path, "bbbb").unwrap();

    let event = events.recv_timeout(WAIT).unwrap();
    assert!(event.contains(&file));

    watcher.stop().unwrap();
}

#[test]
fn test_tags_survive_into_events() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("settings.ini");
    fs::write(&path, "x=1").unwrap();

    let file = WatchedFile::builder(&path).tag("config").build().unwrap();
    let mut watcher = PollWatcher::builder()
        .poll_interval(Duration::from_millis(30))
        .file(file.clone())
        .build()
        .unwrap();
    let (events, _errors) = watcher.start().unwrap();

    // Retag while running; the event exposes the current tag
    file.set_tag("reloaded");
    fs::write(&path, "x=2").unwrap();

    let event = events.recv_timeout(WAIT).unwrap();
    assert_eq!(event.files()[0].tag(), "reloaded");
    assert_eq!(watcher.find(|f| f.tag() == "reloaded").len(), 1);

    watcher.stop().unwrap();
}

#[test]
fn test_broken_file_reports_every_tick_until_removed() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("gone.txt");
    fs::write(&path, "v1").unwrap();

    let file = WatchedFile::new(&path).unwrap();
    let mut watcher = PollWatcher::builder()
        .poll_interval(Duration::from_millis(20))
        .file(file.clone())
        .build()
        .unwrap();
    fs::remove_file(&path).unwrap();

    let (_events, errors) = watcher.start().unwrap();

    for _ in 0..3 {
        let err = errors.recv_timeout(WAIT).unwrap();
        assert!(matches!(err, WatchError::Open { .. }));
    }

    watcher.remove_file(&file);
    // At most one error from a pass that had already read the file
    let mut late = 0;
    while errors.recv_timeout(Duration::from_millis(150)).is_ok() {
        late += 1;
        assert!(late <= 1, "removed file kept producing errors");
    }

    watcher.stop().unwrap();
}

#[test]
fn test_independent_watchers_coexist() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("shared.txt");
    fs::write(&path, "v1").unwrap();

    let mut fast = PollWatcher::builder()
        .poll_interval(Duration::from_millis(20))
        .file(WatchedFile::new(&path).unwrap())
        .build()
        .unwrap();
    let mut slow = PollWatcher::builder()
        .poll_interval(Duration::from_millis(60))
        .file(WatchedFile::new(&path).unwrap())
        .build()
        .unwrap();

    let (fast_events, _fast_errors) = fast.start().unwrap();
    let (slow_events, _slow_errors) = slow.start().unwrap();

    fs::write(&path, "v2").unwrap();

    assert_eq!(fast_events.recv_timeout(WAIT).unwrap().len(), 1);
    assert_eq!(slow_events.recv_timeout(WAIT).unwrap().len(), 1);

    fast.stop().unwrap();
    slow.stop().unwrap();
}
