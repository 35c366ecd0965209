use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::Error;
use crate::model::EnvMap;

/// Serialize entries as `KEY=VALUE` lines in iteration order, without quoting.
pub fn render(map: &EnvMap) -> String {
    let capacity = map
        .iter()
        .map(|entry| entry.key.len() + entry.value.len() + 2)
        .sum();
    let mut out = String::with_capacity(capacity);
    for entry in map {
        out.push_str(&entry.key);
        out.push('=');
        out.push_str(&entry.value);
        out.push('\n');
    }
    out
}

/// Replace `path` with `contents` so readers only ever see the old or the
/// new file.
///
/// The temporary file is created next to the target so the final rename
/// stays on one filesystem. A temporary file that fails to replace the
/// target is removed.
pub fn write_atomic(path: &Path, contents: &str) -> Result<(), Error> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(contents.as_bytes())?;
    temp.flush()?;
    temp.as_file().sync_all()?;
    debug!(temp = %temp.path().display(), target = %path.display(), "replacing file");

    // Dropping the PersistError drops the temporary file, which deletes it.
    temp.persist(path).map_err(|err| Error::Persist {
        path: path.to_path_buf(),
        source: err.error,
    })?;
    Ok(())
}
