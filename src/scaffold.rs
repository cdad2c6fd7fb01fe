use anyhow::{anyhow, ensure, Context};
use chrono::{DateTime, TimeZone};
use fs_extra::dir::CopyOptions;
use std::{
    ffi::OsString,
    fmt::Display,
    fs,
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

use crate::{info, trace};

/// Layout of the suffix given to a destination that is moved aside
pub const BACKUP_STAMP: &str = "%Y%m%d%H%M%S";

/// `path` made absolute, so later stages and the tools they spawn agree on it
/// whatever their working directory. A path ending in `..`, or a bare `.` on
/// platforms that keep it, is resolved on disk to get a name to back up under.
///
/// # Errors
///
/// Returns an [`Err`] if the current directory can not be read, or if a
/// path without a name does not exist.
pub fn destination(path: &Path) -> anyhow::Result<PathBuf> {
    let absolute = std::path::absolute(path)
        .with_context(|| format!("Failed to resolve {}", path.display()))?;

    if absolute.file_name().is_some() {
        return Ok(absolute);
    }

    absolute
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", path.display()))
}

/// Makes room for a fresh project at `dest`.
///
/// Whatever is already there (file, directory or dangling symlink) is renamed to
/// `<dest>_<YYYYMMDDHHMMSS>`, never removed. The destination is then created
/// together with any missing parent.
///
/// Returns the path the previous entry was moved to, if any. `dest` has to
/// end in a name, see [`destination`].
///
/// # Errors
///
/// Returns an [`Err`] if `dest` has no name, or if the rename or the
/// directory creation fail.
pub fn reconcile<Tz>(dest: &Path, now: &DateTime<Tz>) -> anyhow::Result<Option<PathBuf>>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let backup = if dest.symlink_metadata().is_ok() {
        let backup = backup_path(dest, &now.format(BACKUP_STAMP).to_string())?;

        info!(
            "{} already exists, moving it to {}",
            dest.display(),
            backup.display()
        );

        fs::rename(dest, &backup).with_context(|| {
            format!("Failed to move {} to {}", dest.display(), backup.display())
        })?;

        Some(backup)
    } else {
        None
    };

    fs::create_dir_all(dest)
        .with_context(|| format!("Failed to create directory {}", dest.display()))?;

    Ok(backup)
}

/// First free sibling of `dest` named `<name>_<stamp>`, adding `-1`, `-2`, ...
/// when runs collide within the same second.
fn backup_path(dest: &Path, stamp: &str) -> anyhow::Result<PathBuf> {
    let file_name = dest
        .file_name()
        .ok_or(anyhow!("Can not move {} aside, it has no name", dest.display()))?;

    let sibling = |suffix: &str| {
        let mut name = OsString::from(file_name);
        name.push(format!("_{stamp}{suffix}"));
        dest.with_file_name(name)
    };

    let mut candidate = sibling("");
    let mut n = 0usize;

    while candidate.symlink_metadata().is_ok() {
        n += 1;
        candidate = sibling(&format!("-{n}"));
    }

    Ok(candidate)
}

/// Checks that `template` can be copied. Does not touch the filesystem.
///
/// # Errors
///
/// Returns an [`Err`] if the path does not exist or is not a directory.
pub fn check_template(template: &Path) -> anyhow::Result<()> {
    ensure!(
        template.is_dir(),
        anyhow!("Template {} is not a directory", template.display())
    );

    Ok(())
}

/// Recursively copies every entry of `template`, hidden ones included, into the
/// existing directory `dest`.
///
/// Permission bits come along with the copy. Modification times of files are
/// restored afterwards where the platform lets a read handle set them.
///
/// Returns how many entries (files and directories) were copied.
///
/// # Errors
///
/// Returns an [`Err`] on any IO error, the copy is not resumed.
pub fn materialize(template: &Path, dest: &Path) -> anyhow::Result<usize> {
    check_template(template)?;

    let options = CopyOptions {
        content_only: true,
        ..CopyOptions::new()
    };

    fs_extra::dir::copy(template, dest, &options).map_err(|e| {
        anyhow!(
            "Failed to copy template {} into {}: {e}",
            template.display(),
            dest.display()
        )
    })?;

    let mut copied = 0;

    for entry in WalkDir::new(template).min_depth(1) {
        let entry = entry?;
        let relative = entry.path().strip_prefix(template)?;
        let target = dest.join(relative);

        trace!("Copied {}", relative.display());
        copied += 1;

        if entry.file_type().is_file() {
            let modified = entry.metadata()?.modified()?;
            if let Err(e) = fs::File::open(&target).and_then(|f| f.set_modified(modified)) {
                trace!("Kept new modification time of {}: {e}", target.display());
            }
        }
    }

    Ok(copied)
}
