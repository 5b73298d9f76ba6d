// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::TempDir;

fn acquire(path: &Path) -> SingleInstanceLock {
    match SingleInstanceLock::try_acquire(path).unwrap() {
        Acquire::Acquired(lock) => lock,
        Acquire::AlreadyHeld => panic!("expected to acquire {}", path.display()),
    }
}

#[test]
fn second_attempt_reports_already_held() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("job.lock");

    let _first = acquire(&path);
    let second = SingleInstanceLock::try_acquire(&path).unwrap();
    assert!(matches!(second, Acquire::AlreadyHeld));
}

#[test]
fn release_allows_reacquire() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("job.lock");

    let first = acquire(&path);
    assert_eq!(first.path(), path);
    first.release();

    let _second = acquire(&path);
}

#[test]
fn drop_releases_the_lock() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("job.lock");

    drop(acquire(&path));
    let _again = acquire(&path);
}

#[test]
fn locks_existing_read_only_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("script.sh");
    std::fs::write(&path, "#!/bin/sh\n").unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_readonly(true);
    std::fs::set_permissions(&path, perms).unwrap();

    let _lock = acquire(&path);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "#!/bin/sh\n");
}

#[test]
fn creates_missing_resource_and_parents() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("locks/nested/job.lock");

    let _lock = acquire(&path);
    assert!(path.exists());
}

#[test]
fn unopenable_resource_is_an_error() {
    let dir = TempDir::new().unwrap();
    let err = SingleInstanceLock::try_acquire(dir.path()).err();
    // Directories open fine on Linux, so only check the error shape when one occurs
    if let Some(err) = err {
        assert!(matches!(err, LockError::Open { .. } | LockError::Lock { .. }));
    }
}

#[test]
fn shared_handle_outlives_the_lock() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("job.lock");

    let lock = acquire(&path);
    let handle = lock.share().unwrap();
    drop(lock);
    assert!(matches!(
        SingleInstanceLock::try_acquire(&path).unwrap(),
        Acquire::AlreadyHeld
    ));

    drop(handle);
    let _again = acquire(&path);
}
