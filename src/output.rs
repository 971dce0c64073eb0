use crate::error::{Error, Result};
use crate::types::MethodIndex;
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use tempfile::NamedTempFile;

/// Serialize `value` and write it to `path`, replacing any previous file.
///
/// The document is written to a temp file next to `path` and renamed into
/// place, so readers never observe a half-written output. The result keeps
/// the mode of the file it replaces; a new file gets the usual `0666` minus
/// umask.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T, pretty: bool) -> Result<()> {
    let write_err = |source: io::Error| Error::StorageWrite {
        path: path.to_path_buf(),
        source,
    };

    let bytes = if pretty {
        serde_json::to_vec_pretty(value)
    } else {
        serde_json::to_vec(value)
    }
    .map_err(|e| write_err(e.into()))?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(write_err)?;

    let mut tmp = temp_file_for(dir, path).map_err(write_err)?;
    tmp.write_all(&bytes).map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;

    tracing::debug!(path = %path.display(), bytes = bytes.len(), "wrote document");
    Ok(())
}

fn temp_file_for(dir: &Path, target: &Path) -> io::Result<NamedTempFile> {
    let mut builder = tempfile::Builder::new();
    // tempfile defaults to 0600; the mode passed here is masked by the umask
    #[cfg(unix)]
    builder.permissions(fs::Permissions::from_mode(0o666));
    let tmp = builder.tempfile_in(dir)?;

    if let Ok(existing) = fs::metadata(target) {
        tmp.as_file().set_permissions(existing.permissions())?;
    }
    Ok(tmp)
}

/// Print each contract name followed by its methods, one per tab-indented line.
pub fn print_method_index(index: &MethodIndex) {
    for (contract, methods) in index {
        println!("{contract}");
        for method in methods {
            println!("\t{method}");
        }
    }
}
