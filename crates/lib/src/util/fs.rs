//! Atomic file writes.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Write `contents` to `path` atomically (write to a sibling temp file, then rename).
pub fn write_atomic(path: &Path, contents: &str) -> io::Result<()> {
  if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
    fs::create_dir_all(parent)?;
  }

  let temp_path = temp_path_for(path);
  fs::write(&temp_path, contents)?;
  fs::rename(&temp_path, path).inspect_err(|_| {
    let _ = fs::remove_file(&temp_path);
  })
}

fn temp_path_for(path: &Path) -> PathBuf {
  let mut name = path.file_name().map(OsString::from).unwrap_or_default();
  name.push(".tmp");
  path.with_file_name(name)
}
