use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

use crate::{
    bootstrap::{self, Runner, Toolchain},
    emit,
    project::Project,
    scaffold, step, trace,
};

/// Mutating stages of a setup, in the order they run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Reconcile,
    Materialize,
    Bootstrap,
    /// Appends the lint block to `pyproject.toml` and writes the README. The
    /// copied `.gitignore` may also gain `.DS_Store` and the environment dir
    /// when they are missing.
    Emit,
}

impl Stage {
    pub const ALL: [Stage; 4] = [
        Stage::Reconcile,
        Stage::Materialize,
        Stage::Bootstrap,
        Stage::Emit,
    ];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Stage::Reconcile => "Preparing destination",
            Stage::Materialize => "Copying template",
            Stage::Bootstrap => "Setting up git, virtual environment and tools",
            Stage::Emit => "Writing lint config, README and .gitignore entries",
        }
    }
}

/// What a finished setup did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub destination: PathBuf,
    /// Where a previous entry at the destination was moved to
    pub backup: Option<PathBuf>,
    /// Entries copied from the template
    pub copied: usize,
}

/// Everything one run needs, after the operator confirmed it.
pub struct Setup<'a> {
    pub project: &'a Project,
    pub template: &'a Path,
    pub toolchain: &'a Toolchain,
    pub started: DateTime<Local>,
}

/// Holds the runner for the duration of the stages. Dropping it deactivates
/// whatever environment is still active, on success and on failure alike.
struct Session<'r> {
    runner: &'r mut dyn Runner,
    /// Project root, absolute once the destination exists
    root: PathBuf,
    report: Report,
}

impl Drop for Session<'_> {
    fn drop(&mut self) {
        if self.runner.is_active() {
            trace!("Leaving virtual environment");
            self.runner.deactivate();
        }
    }
}

impl Setup<'_> {
    /// Runs every [`Stage`] in order, stopping at the first error.
    ///
    /// # Errors
    ///
    /// Returns the error of the stage that failed. Nothing done by earlier
    /// stages is undone.
    pub fn run(&self, runner: &mut dyn Runner) -> anyhow::Result<Report> {
        let mut session = Session {
            runner,
            root: self.project.path().to_path_buf(),
            report: Report {
                destination: self.project.path().to_path_buf(),
                backup: None,
                copied: 0,
            },
        };

        for (i, stage) in Stage::ALL.into_iter().enumerate() {
            step!(i + 1, Stage::ALL.len(), "{}", stage.label());
            self.perform(stage, &mut session)?;
        }

        Ok(session.report.clone())
    }

    fn perform(&self, stage: Stage, session: &mut Session<'_>) -> anyhow::Result<()> {
        let root = session.root.as_path();

        match stage {
            Stage::Reconcile => {
                let dest = scaffold::destination(root)?;
                session.report.backup = scaffold::reconcile(&dest, &self.started)?;
                session.root = dest;
            }
            Stage::Materialize => {
                session.report.copied = scaffold::materialize(self.template, root)?;
            }
            Stage::Bootstrap => {
                bootstrap::plan(
                    root,
                    self.project.name(),
                    self.project.description(),
                    self.toolchain,
                )
                .execute(session.runner)?;
            }
            Stage::Emit => {
                emit::append_lint_config(root)?;
                emit::write_readme(root, self.project.name(), self.project.description())?;
                emit::ensure_gitignore(root, &self.toolchain.env_dir)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{abort::Abort, bootstrap::tests::Recorder};
    use std::fs;

    fn template(root: &Path) -> PathBuf {
        let template = root.join("template");
        fs::create_dir_all(template.join("tests")).unwrap();
        fs::write(template.join(".editorconfig"), "root = true\n").unwrap();
        fs::write(template.join("tests").join("test_demo.py"), "").unwrap();
        template
    }

    fn project(dest: &Path) -> Project {
        Project::builder()
            .name("demo")
            .description("A demo.")
            .path(dest)
            .build()
            .unwrap()
    }

    #[test]
    fn full_run() {
        let tmp = tempfile::tempdir().unwrap();
        let template = template(tmp.path());
        let dest = tmp.path().join("out").join("demo");
        let project = project(&dest);
        let toolchain = Toolchain::default();
        let mut recorder = Recorder::default();

        let report = Setup {
            project: &project,
            template: &template,
            toolchain: &toolchain,
            started: Local::now(),
        }
        .run(&mut recorder)
        .unwrap();

        assert_eq!(report.destination, dest);
        assert_eq!(report.backup, None);
        assert_eq!(report.copied, 3);

        assert_eq!(
            fs::read_to_string(dest.join(".editorconfig")).unwrap(),
            "root = true\n"
        );
        assert!(dest.join("tests").join("test_demo.py").is_file());
        assert_eq!(
            fs::read_to_string(dest.join("README.md")).unwrap(),
            "# demo\nA demo.\n"
        );
        assert!(fs::read_to_string(dest.join("pyproject.toml"))
            .unwrap()
            .contains(emit::LINT_CONFIG));
        assert_eq!(
            fs::read_to_string(dest.join(".gitignore")).unwrap(),
            ".DS_Store\n.venv/\n"
        );

        assert_eq!(recorder.log.first().map(String::as_str), Some("git init"));
        assert_eq!(recorder.log.last().map(String::as_str), Some("deactivate"));
        assert!(!recorder.is_active());
    }

    #[test]
    fn relative_destination_runs_from_absolute_root() {
        let tmp = tempfile::tempdir_in(".").unwrap();
        let template = template(tmp.path());
        let dest = tmp.path().join("output").join("demo");
        assert!(dest.is_relative());
        let project = project(&dest);
        let toolchain = Toolchain::default();
        let mut recorder = Recorder::default();

        let report = Setup {
            project: &project,
            template: &template,
            toolchain: &toolchain,
            started: Local::now(),
        }
        .run(&mut recorder)
        .unwrap();

        assert_eq!(report.destination, dest);
        assert!(dest.join(".editorconfig").is_file());
        assert!(dest.join("README.md").is_file());

        let activated = recorder
            .log
            .iter()
            .find_map(|l| l.strip_prefix("activate "))
            .map(PathBuf::from)
            .unwrap();
        assert!(activated.is_absolute());
        assert_eq!(activated, std::path::absolute(&dest).unwrap().join(".venv"));
    }

    #[test]
    fn existing_destination_is_kept() {
        let tmp = tempfile::tempdir().unwrap();
        let template = template(tmp.path());
        let dest = tmp.path().join("demo");
        fs::create_dir_all(&dest).unwrap();
        fs::write(dest.join("notes.txt"), "old work").unwrap();
        let project = project(&dest);
        let toolchain = Toolchain::default();

        let report = Setup {
            project: &project,
            template: &template,
            toolchain: &toolchain,
            started: Local::now(),
        }
        .run(&mut Recorder::default())
        .unwrap();

        let backup = report.backup.unwrap();
        assert_eq!(
            fs::read_to_string(backup.join("notes.txt")).unwrap(),
            "old work"
        );
        assert!(!dest.join("notes.txt").exists());
        assert!(dest.join(".editorconfig").is_file());
    }

    #[test]
    fn failing_tool_stops_and_deactivates() {
        let tmp = tempfile::tempdir().unwrap();
        let template = template(tmp.path());
        let dest = tmp.path().join("demo");
        let project = project(&dest);
        let toolchain = Toolchain::default();
        let mut recorder = Recorder::failing_on("poetry");

        let err = Setup {
            project: &project,
            template: &template,
            toolchain: &toolchain,
            started: Local::now(),
        }
        .run(&mut recorder)
        .unwrap_err();

        assert_eq!(
            err.downcast_ref::<Abort>(),
            Some(&Abort::ToolFailed {
                program: "poetry".into(),
                code: 2
            })
        );
        assert!(!recorder.is_active());
        assert_eq!(recorder.log.last().map(String::as_str), Some("deactivate"));
        assert!(!recorder.log.iter().any(|l| l.starts_with("pre-commit")));
        assert!(!dest.join("README.md").exists());
        assert!(dest.join(".editorconfig").is_file());
    }

    #[test]
    fn failing_copy_runs_no_tools() {
        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("demo");
        let project = project(&dest);
        let toolchain = Toolchain::default();
        let mut recorder = Recorder::default();
        let missing = tmp.path().join("missing");

        let result = Setup {
            project: &project,
            template: &missing,
            toolchain: &toolchain,
            started: Local::now(),
        }
        .run(&mut recorder);

        assert!(result.is_err());
        assert!(recorder.log.is_empty());
    }
}
