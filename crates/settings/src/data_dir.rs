use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use directories::UserDirs;
use walkdir::WalkDir;

/// Folder created under the user's documents directory.
pub const DOCUMENTS_FOLDER_NAME: &str = "JiHou";

/// 預設資料目錄：使用者文件資料夾下的 `JiHou`，否則為 `<app_dir>/data`。
/// / Fallback data directory: `<documents>/JiHou`, or `<app_dir>/data` when
/// the platform reports no documents directory.
pub fn fallback_data_dir(app_dir: &Path) -> PathBuf {
    UserDirs::new()
        .and_then(|dirs| dirs.document_dir().map(|docs| docs.join(DOCUMENTS_FOLDER_NAME)))
        .unwrap_or_else(|| app_dir.join("data"))
}

/// Copies the contents of `source` into `target`, creating `target` if needed.
///
/// Top-level directories already present in `target` are replaced; files are
/// overwritten. Entries are copied in sorted walk order.
pub fn copy_tree(source: &Path, target: &Path) -> io::Result<()> {
    fs::create_dir_all(target)?;
    for entry in WalkDir::new(source).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
        let destination = target.join(relative);
        if entry.file_type().is_dir() {
            if entry.depth() == 1 && destination.is_dir() {
                fs::remove_dir_all(&destination)?;
            }
            fs::create_dir_all(&destination)?;
        } else {
            fs::copy(entry.path(), &destination)?;
        }
    }
    Ok(())
}
