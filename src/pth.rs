use anyhow::{anyhow, bail, Context};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Finds the `site-packages` directory of the environment rooted at `env`.
///
/// # Errors
///
/// Returns an [`Err`] if there is none.
pub fn site_packages(env: &Path) -> anyhow::Result<PathBuf> {
    let windows = env.join("Lib").join("site-packages");
    if windows.is_dir() {
        return Ok(windows);
    }

    let lib = env.join("lib");
    let mut found = Vec::new();

    if lib.is_dir() {
        for entry in lib.read_dir()? {
            let entry = entry?;
            let candidate = entry.path().join("site-packages");
            let is_python = entry
                .file_name()
                .to_str()
                .is_some_and(|n| n.starts_with("python"));

            if is_python && candidate.is_dir() {
                found.push(candidate);
            }
        }
    }

    // python3.9 sorts after python3.12, good enough for a single-interpreter env
    found.sort();
    found
        .pop()
        .ok_or(anyhow!("No site-packages directory in {}", env.display()))
}

/// Writes `<root name>.pth` into the environment's `site-packages` so that
/// `root` lands on `sys.path`.
///
/// Returns the written file.
///
/// # Errors
///
/// Returns an [`Err`] if `root` can not be resolved or there is no
/// `site-packages` to write into.
pub fn link_root(env: &Path, root: &Path) -> anyhow::Result<PathBuf> {
    let root = root
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", root.display()))?;

    let Some(name) = root.file_name().and_then(|n| n.to_str()) else {
        bail!("Can not name a .pth file after {}", root.display());
    };

    let pth = site_packages(env)?.join(format!("{name}.pth"));
    let line = root
        .to_str()
        .ok_or(anyhow!("Path {} is not valid UTF-8", root.display()))?;

    fs::write(&pth, format!("{line}\n"))
        .with_context(|| format!("Failed to write {}", pth.display()))?;

    Ok(pth)
}

/// Root of the virtual environment active in this process, from `VIRTUAL_ENV`.
///
/// # Errors
///
/// Returns an [`Err`] when no environment is active.
pub fn active_env() -> anyhow::Result<PathBuf> {
    std::env::var_os("VIRTUAL_ENV")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .context("No active virtual environment, VIRTUAL_ENV is not set")
}
