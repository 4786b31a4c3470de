//! Workspace and file utilities.
//!
//! Every analysis run gets a [`RunWorkspace`]: a fresh temporary directory
//! holding the input image and an `analysis/` output directory for the
//! collaborators. The directory is removed when the workspace is dropped, on
//! success and failure alike.

use crate::{EclipseraError, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use zip::write::{FileOptions, ZipWriter};

/// Prefix of run workspaces under the system temp directory.
pub const WORKSPACE_PREFIX: &str = "eclipsera-decode-";

/// Name of the collaborator output directory inside a workspace.
pub const OUTPUT_DIR_NAME: &str = "analysis";

/// Reduce an untrusted file name to a safe basename.
///
/// Directory components are stripped, an empty result becomes `upload.png`,
/// and a name without any dot gets `.png` appended.
pub fn sanitize_filename(name: &str) -> String {
    let base = Path::new(name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    if base.is_empty() {
        return "upload.png".to_string();
    }
    if !base.contains('.') {
        return format!("{}.png", base);
    }
    base
}

/// Temporary directory scoped to one analysis run.
#[derive(Debug)]
pub struct RunWorkspace {
    dir: tempfile::TempDir,
    output_dir: PathBuf,
    image_path: PathBuf,
}

impl RunWorkspace {
    /// Create the workspace and write the input image into it.
    pub fn create(image_name: &str, image_bytes: &[u8]) -> Result<Self> {
        let dir = tempfile::Builder::new().prefix(WORKSPACE_PREFIX).tempdir()?;
        let output_dir = dir.path().join(OUTPUT_DIR_NAME);
        fs::create_dir_all(&output_dir)?;

        let image_path = dir.path().join(sanitize_filename(image_name));
        fs::write(&image_path, image_bytes)?;

        Ok(Self {
            dir,
            output_dir,
            image_path,
        })
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Directory collaborators write their results into.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn image_path(&self) -> &Path {
        &self.image_path
    }
}

/// Collect every file below `dir`, sorted by path.
///
/// # Errors
///
/// Returns `EclipseraError::Validation` if `dir` is not a directory and
/// `EclipseraError::Io` for read failures.
pub fn traverse_directory(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(EclipseraError::validation(format!(
            "Path is not a directory: {}",
            dir.display()
        )));
    }

    let mut files = Vec::new();
    traverse_directory_impl(dir, &mut files)?;
    files.sort();
    Ok(files)
}

fn traverse_directory_impl(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() {
            files.push(path);
        } else if path.is_dir() {
            traverse_directory_impl(&path, files)?;
        }
    }
    Ok(())
}

/// Bundle every file below `src_dir` into a zip archive at `dest`.
///
/// Entry names are relative to `src_dir` with `/` separators. Returns the
/// number of files written; an empty directory produces no archive.
pub fn bundle_directory(src_dir: &Path, dest: &Path) -> Result<usize> {
    let files = traverse_directory(src_dir)?;
    if files.is_empty() {
        return Ok(0);
    }

    let mut zip = ZipWriter::new(fs::File::create(dest)?);
    let options = FileOptions::<'_, ()>::default();

    for file in &files {
        let relative = file.strip_prefix(src_dir).unwrap_or(file);
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        zip.start_file(name, options)?;
        zip.write_all(&fs::read(file)?)?;
    }

    zip.finish()?;
    Ok(files.len())
}

/// Copy a captured log file into `log_dir`, returning the new path.
pub fn persist_log(src: &Path, log_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(log_dir)?;
    let name = src
        .file_name()
        .ok_or_else(|| EclipseraError::validation(format!("Log path has no file name: {}", src.display())))?;
    let dest = log_dir.join(name);
    fs::copy(src, &dest)?;
    Ok(dest)
}
