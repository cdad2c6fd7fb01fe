use anyhow::{anyhow, ensure, Context};
use derive_builder::Builder;
use directories::UserDirs;
use std::path::{Path, PathBuf};

use crate::{info, trace};

/// Files placed in the starter template by `pyseed init`
pub const STARTER_FILES: [(&str, &str); 2] = [
    (".gitignore", "__pycache__/\n*.py[cod]\n.venv/\n.DS_Store\n"),
    (
        ".pre-commit-config.yaml",
        "repos:\n  - repo: https://github.com/astral-sh/ruff-pre-commit\n    rev: v0.4.4\n    hooks:\n      - id: ruff\n        args: [--fix]\n      - id: ruff-format\n",
    ),
];

#[derive(Builder, Debug, Clone)]
#[builder(setter(into))]
pub struct SeedDirs {
    user_home: PathBuf,
    global_config: PathBuf,
}

impl SeedDirs {
    /// Create a new [`SeedDirs`] builder
    #[must_use]
    pub fn builder() -> SeedDirsBuilder {
        SeedDirsBuilder::create_empty()
    }

    /// Attempt to create a new [`SeedDirs`] instance with sane defaults for
    /// path locations
    ///
    /// # Errors
    ///
    /// Returns an [`Err`] if the user home can not be found.
    pub fn default_paths() -> anyhow::Result<Self> {
        let home = Self::get_user_home()?;
        Ok(Self {
            global_config: Self::get_config_dir(
                &home,
                std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
            ),
            user_home: home,
        })
    }

    /// Returns the path for the user home `~/`
    ///
    /// # Errors
    ///
    /// Returns an [`Err`] if a path for the users home can not
    /// be found
    pub fn get_user_home() -> anyhow::Result<PathBuf> {
        Ok(UserDirs::new()
            .context("Failed to get user's home directory")?
            .home_dir()
            .to_owned())
    }

    /// Returns the path where the global config and default template live
    ///
    /// Looks for the global configuration dir, in order:
    /// - `$XDG_CONFIG_HOME/pyseed`
    /// - `~/.config/pyseed`
    /// - `~/.pyseed`
    ///
    /// The first two are used when their parent exists.
    #[must_use]
    pub fn get_config_dir(home: &Path, xdg_config_home: Option<PathBuf>) -> PathBuf {
        let config_home = xdg_config_home.unwrap_or(home.join(".config"));

        if config_home.is_dir() {
            config_home.join("pyseed")
        } else {
            home.join(".pyseed")
        }
    }

    /// Template used when none is given.
    #[must_use]
    pub fn default_template(&self) -> PathBuf {
        self.global_config.join("template")
    }

    /// Picks the template to copy: `explicit` if given, the default one otherwise.
    ///
    /// # Errors
    ///
    /// Returns an [`Err`] if the chosen path is not a directory.
    pub fn template(&self, explicit: Option<&Path>) -> anyhow::Result<PathBuf> {
        match explicit {
            Some(template) => checked_template(template.to_path_buf(), false),
            None => checked_template(self.default_template(), true),
        }
    }

    /// Creates `dir`. An existing directory is left alone, anything else in its
    /// place is removed first.
    ///
    /// # Errors
    ///
    /// This function will return an error if any IO error occurs
    pub fn create_dir(dir: &Path) -> anyhow::Result<()> {
        let exists = dir.symlink_metadata().is_ok();

        if exists && dir.is_dir() {
            info!(
                "The directory at path {} already exists. Skipping creation.",
                dir.display()
            );

            return Ok(());
        } else if exists {
            info!(
                "The path {} exists but is not a directory. Removing existing path.",
                dir.display(),
            );

            Self::remove_path(dir)?;
        }

        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;

        Ok(())
    }

    /// Creates the global config directory and the default template, seeding
    /// the template with [`STARTER_FILES`] that are not there yet.
    ///
    /// # Errors
    ///
    /// This function will return an error if any IO error occurs
    pub fn init(&self) -> anyhow::Result<()> {
        Self::create_dir(self.global_config())?;

        let template = self.default_template();
        Self::create_dir(&template)?;

        for (name, contents) in STARTER_FILES {
            let path = template.join(name);

            if path.symlink_metadata().is_ok() {
                trace!("Keeping {}", path.display());
                continue;
            }

            info!("Writing {}", self.tilde(&path));
            std::fs::write(&path, contents)
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }

        Ok(())
    }

    pub fn remove_path(path: &Path) -> anyhow::Result<()> {
        let file_type = path.symlink_metadata()?.file_type();

        if file_type.is_symlink() {
            // https://stackoverflow.com/questions/76351822/creating-and-removing-symlinks

            #[cfg(target_os = "windows")]
            std::fs::remove_dir(path)?;

            #[cfg(not(target_os = "windows"))]
            std::fs::remove_file(path)?;
        } else if file_type.is_dir() {
            std::fs::remove_dir_all(path)?;
        } else {
            std::fs::remove_file(path)?;
        }

        Ok(())
    }

    /// `path` with the user home shown as `~`
    #[must_use]
    pub fn tilde(&self, path: &Path) -> String {
        path.strip_prefix(self.user_home())
            .map(|rest| Path::new("~").join(rest).display().to_string())
            .unwrap_or_else(|_| path.display().to_string())
    }

    /// Returns a reference to the user home of this [`SeedDirs`].
    #[must_use]
    pub fn user_home(&self) -> &Path {
        self.user_home.as_path()
    }

    /// Returns a reference to the global config of this [`SeedDirs`].
    #[must_use]
    pub fn global_config(&self) -> &Path {
        self.global_config.as_path()
    }
}

/// Picks the template for a run. `seed_dirs` is only called when no template
/// was given, so an explicit one works without a resolvable home.
///
/// # Errors
///
/// Returns an [`Err`] if the chosen path is not a directory, or if the config
/// dirs are needed and can not be found.
pub fn pick_template<F>(explicit: Option<&Path>, seed_dirs: F) -> anyhow::Result<PathBuf>
where
    F: FnOnce() -> anyhow::Result<SeedDirs>,
{
    match explicit {
        Some(template) => checked_template(template.to_path_buf(), false),
        None => seed_dirs()?.template(None),
    }
}

fn checked_template(template: PathBuf, hint_init: bool) -> anyhow::Result<PathBuf> {
    trace!("Template: {}", template.display());

    ensure!(
        template.is_dir(),
        anyhow!(
            "Template {} is not a directory{}",
            template.display(),
            if hint_init {
                "\n    Run `pyseed init` to create it"
            } else {
                ""
            }
        )
    );

    Ok(template)
}
