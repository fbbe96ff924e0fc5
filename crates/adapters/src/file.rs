// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Coordination through advisory file locks
//!
//! Every process pointing a [`FileCoordinationClient`] at the same directory
//! shares its mutexes. A mutex path `/a/b/c` maps to the file
//! `<dir>/a/b/c.lock`; holding the mutex means holding an exclusive lock on
//! that file. The OS drops the lock when the holder exits, so a crashed
//! process never leaves a mutex stuck.
//!
//! Lock files are not removed on release: one file per distinct key stays in
//! the directory for its lifetime. Deployments with unbounded key spaces call
//! [`FileCoordinationClient::prune_unlocked`] periodically, which deletes only
//! files no process currently holds. A mutex that locks a file just as it is
//! pruned notices the file is gone and retries against a fresh one.

use fs2::FileExt;
use ilock_core::coordination::{CoordinationClient, CoordinationError, MutexHandle};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// How often a contended acquire re-checks the file lock
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

const LOCK_EXTENSION: &str = "lock";

/// Client whose mutexes are lock files under a shared directory
#[derive(Clone, Debug)]
pub struct FileCoordinationClient {
    dir: PathBuf,
    poll_interval: Duration,
}

impl FileCoordinationClient {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Lock file backing `path`
    pub fn file_for(&self, path: &str) -> Result<PathBuf, CoordinationError> {
        let invalid = |reason: &str| CoordinationError::InvalidPath {
            path: path.to_string(),
            reason: reason.to_string(),
        };

        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let Some((last, parents)) = segments.split_last() else {
            return Err(invalid("path has no segments"));
        };

        let mut file = self.dir.clone();
        for segment in &segments {
            if *segment == "." || *segment == ".." {
                return Err(invalid("relative segments are not allowed"));
            }
            if segment.contains('\\') || segment.contains('\0') {
                return Err(invalid("segment contains a reserved character"));
            }
        }
        file.extend(parents);
        // `c` -> `c.lock`, keeping any dots already in the segment
        file.push(format!("{last}.{LOCK_EXTENSION}"));
        Ok(file)
    }
}

impl FileCoordinationClient {
    /// Delete every lock file that no process holds, returning how many.
    ///
    /// Directories are left in place.
    pub fn prune_unlocked(&self) -> io::Result<usize> {
        let mut removed = 0;
        let mut pending = vec![self.dir.clone()];
        while let Some(dir) = pending.pop() {
            let entries = match std::fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e),
            };
            for entry in entries {
                let entry = entry?;
                let path = entry.path();
                if entry.file_type()?.is_dir() {
                    pending.push(path);
                } else if path.extension().is_some_and(|ext| ext == LOCK_EXTENSION)
                    && remove_if_unlocked(&path)?
                {
                    removed += 1;
                }
            }
        }
        tracing::debug!(dir = %self.dir.display(), removed, "pruned lock files");
        Ok(removed)
    }
}

/// Remove `path` while holding its lock, so no holder loses its file
fn remove_if_unlocked(path: &Path) -> io::Result<bool> {
    let file = match OpenOptions::new().read(true).write(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    };
    match file.try_lock_exclusive() {
        Ok(()) => {}
        Err(e) if is_contended(&e) => return Ok(false),
        Err(e) => return Err(e),
    }
    if !is_same_file(&file, path)? {
        return Ok(false);
    }
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Whether `file` is still the file linked at `path`
#[cfg(unix)]
fn is_same_file(file: &File, path: &Path) -> io::Result<bool> {
    use std::os::unix::fs::MetadataExt;

    let open = file.metadata()?;
    match std::fs::metadata(path) {
        Ok(linked) => Ok(open.dev() == linked.dev() && open.ino() == linked.ino()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

// Open files cannot be deleted on these platforms
#[cfg(not(unix))]
fn is_same_file(_file: &File, path: &Path) -> io::Result<bool> {
    Ok(path.exists())
}

impl CoordinationClient for FileCoordinationClient {
    fn new_mutex(&self, path: &str) -> Result<Box<dyn MutexHandle>, CoordinationError> {
        let file_path = self.file_for(path)?;
        Ok(Box::new(FileMutex {
            path: path.to_string(),
            dir: self.dir.clone(),
            file_path,
            poll_interval: self.poll_interval,
            held: Mutex::new(None),
        }))
    }
}

/// Mutex backed by an exclusive lock on one file
pub struct FileMutex {
    path: String,
    dir: PathBuf,
    file_path: PathBuf,
    poll_interval: Duration,
    /// Open, locked file while held
    held: Mutex<Option<File>>,
}

impl FileMutex {
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    fn open(&self) -> io::Result<File> {
        if let Some(parent) = self.file_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.file_path)
    }
}

fn is_contended(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::WouldBlock
        || err.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

impl MutexHandle for FileMutex {
    fn path(&self) -> &str {
        &self.path
    }

    fn is_available(&self) -> bool {
        self.dir.is_dir()
    }

    fn try_acquire(&self, timeout: Duration) -> Result<bool, CoordinationError> {
        let mut held = self.held.lock();
        if held.is_some() {
            return Ok(true);
        }

        let mut file = self.open()?;
        let deadline = Instant::now().checked_add(timeout);
        loop {
            match file.try_lock_exclusive() {
                Ok(()) if is_same_file(&file, &self.file_path)? => {
                    *held = Some(file);
                    return Ok(true);
                }
                Ok(()) => {
                    // Pruned between open and lock
                    tracing::trace!(path = %self.path, "lock file replaced, reopening");
                    file = self.open()?;
                    continue;
                }
                Err(e) if is_contended(&e) => {}
                Err(e) => return Err(e.into()),
            }

            let now = Instant::now();
            let wait = match deadline {
                Some(d) if now >= d => return Ok(false),
                Some(d) => self.poll_interval.min(d - now),
                None => self.poll_interval,
            };
            std::thread::sleep(wait);
        }
    }

    fn release(&self) -> Result<(), CoordinationError> {
        let file = self
            .held
            .lock()
            .take()
            .ok_or_else(|| CoordinationError::NotHeld(self.path.clone()))?;
        FileExt::unlock(&file)?;
        Ok(())
    }
}

impl std::fmt::Debug for FileMutex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileMutex")
            .field("path", &self.path)
            .field("file", &self.file_path)
            .field("held", &self.held.lock().is_some())
            .finish()
    }
}

#[cfg(test)]
#[path = "file_tests.rs"]
mod tests;
