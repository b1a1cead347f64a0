//! Atomic replacement of files inside a capability-scoped directory.
//!
//! Contents go to a hidden temporary file in the same directory, are synced,
//! and then renamed over the target. Readers observe either the previous or
//! the new contents, never a partial write.

use std::io::{self, Write};
use std::sync::atomic::{AtomicU64, Ordering};

use cap_std::fs::{Dir, OpenOptions};

pub(super) static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Replace `file_name` in `dir` with `contents`.
///
/// # Errors
/// Returns the underlying I/O error when the temporary file cannot be
/// written, synced or renamed. The temporary file is removed on failure.
pub(crate) fn write_atomic(dir: &Dir, file_name: &str, contents: &[u8]) -> io::Result<()> {
    let tmp_name = temp_name(file_name, TEMP_COUNTER.fetch_add(1, Ordering::Relaxed));

    write_temp_file(dir, &tmp_name, contents).inspect_err(|_| discard(dir, &tmp_name))?;
    dir.rename(&tmp_name, dir, file_name)
        .inspect_err(|_| discard(dir, &tmp_name))?;
    sync_directory(dir);
    Ok(())
}

/// Hidden sibling that `file_name` is staged in for write number `counter`.
pub(super) fn temp_name(file_name: &str, counter: u64) -> String {
    format!(".{file_name}.tmp.{}.{counter}", std::process::id())
}

fn write_temp_file(dir: &Dir, tmp_name: &str, contents: &[u8]) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    let mut file = dir.open_with(tmp_name, &options)?;
    file.write_all(contents)?;
    file.sync_all()
}

fn discard(dir: &Dir, tmp_name: &str) {
    if dir.remove_file(tmp_name).is_err() {
        // The original error is what callers need.
    }
}

fn sync_directory(dir: &Dir) {
    if dir.open(".").and_then(|handle| handle.sync_all()).is_err() {
        // Directory fsync is unsupported on some platforms.
    }
}
