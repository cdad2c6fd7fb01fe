use anyhow::{anyhow, Context};
use std::{
    ffi::OsString,
    fmt::Display,
    path::{Path, PathBuf},
    process::Command,
};

use crate::{abort::Abort, trace};

/// Directory inside a virtual environment holding its executables
#[cfg(windows)]
pub const ENV_BIN: &str = "Scripts";
#[cfg(not(windows))]
pub const ENV_BIN: &str = "bin";

/// External tools used to set a project up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    /// Interpreter used to create the environment
    pub python: String,
    /// Environment directory, relative to the project root
    pub env_dir: PathBuf,
    pub package_manager: String,
    pub dev_dependencies: Vec<String>,
}

impl Default for Toolchain {
    fn default() -> Self {
        Toolchain {
            python: if cfg!(windows) { "python" } else { "python3" }.to_owned(),
            env_dir: PathBuf::from(".venv"),
            package_manager: "poetry".to_owned(),
            dev_dependencies: ["ruff", "pylint", "pytest", "pre-commit"]
                .map(str::to_owned)
                .to_vec(),
        }
    }
}

impl Toolchain {
    #[must_use]
    pub fn with_python(mut self, python: Option<String>) -> Self {
        if let Some(python) = python {
            self.python = python;
        }
        self
    }
}

/// A virtual environment on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualEnv {
    root: PathBuf,
}

impl VirtualEnv {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        VirtualEnv { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        self.root.as_path()
    }

    #[must_use]
    pub fn bin_dir(&self) -> PathBuf {
        self.root.join(ENV_BIN)
    }

    /// The same environment with its root resolved against the current
    /// directory. Children run from another directory still find it.
    #[must_use]
    pub fn absolute(self) -> Self {
        match std::path::absolute(&self.root) {
            Ok(root) => VirtualEnv { root },
            Err(e) => {
                trace!("Keeping {} as given: {e}", self.root.display());
                self
            }
        }
    }

    /// Path of an executable installed in the environment
    #[must_use]
    pub fn executable(&self, name: &str) -> PathBuf {
        let bin = self.bin_dir().join(name);
        if cfg!(windows) {
            bin.with_extension("exe")
        } else {
            bin
        }
    }

    /// `PATH` for a child process with this environment in front
    ///
    /// # Errors
    ///
    /// Returns an [`Err`] if the bin dir contains the platform's path list separator.
    pub fn path_var(&self, current: Option<OsString>) -> anyhow::Result<OsString> {
        let mut paths = vec![self.bin_dir()];
        if let Some(current) = current {
            paths.extend(std::env::split_paths(&current));
        }

        std::env::join_paths(paths).context("Failed to build PATH for the virtual environment")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Program {
    /// Looked up through the regular `PATH`
    System(String),
    /// Installed in the active virtual environment
    Env(String),
}

impl Display for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Program::System(name) | Program::Env(name) => write!(f, "{name}"),
        }
    }
}

/// One external command, run from `cwd`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: Program,
    pub args: Vec<String>,
    pub cwd: PathBuf,
}

impl Invocation {
    pub fn system<I, S>(program: &str, args: I, cwd: &Path) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Invocation {
            program: Program::System(program.to_owned()),
            args: args.into_iter().map(Into::into).collect(),
            cwd: cwd.to_path_buf(),
        }
    }

    pub fn env<I, S>(program: &str, args: I, cwd: &Path) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Invocation {
            program: Program::Env(program.to_owned()),
            ..Self::system(program, args, cwd)
        }
    }
}

impl Display for Invocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Runs external tools on behalf of a setup.
///
/// While an environment is active every invocation sees it, the same way a
/// shell sees an activated venv.
pub trait Runner {
    fn activate(&mut self, env: VirtualEnv);

    fn deactivate(&mut self);

    fn is_active(&self) -> bool;

    /// Runs the invocation to completion.
    ///
    /// # Errors
    ///
    /// A non-zero exit must come back as an [`Abort::ToolFailed`] or
    /// [`Abort::ToolKilled`].
    fn run(&mut self, invocation: &Invocation) -> anyhow::Result<()>;
}

/// [`Runner`] spawning real processes with inherited stdio.
#[derive(Debug, Default)]
pub struct SystemRunner {
    active: Option<VirtualEnv>,
}

impl SystemRunner {
    fn command(&self, invocation: &Invocation) -> anyhow::Result<Command> {
        let mut command = match (&invocation.program, &self.active) {
            (Program::System(name), _) => Command::new(name),
            (Program::Env(name), Some(env)) => Command::new(env.executable(name)),
            (Program::Env(name), None) => {
                return Err(anyhow!(
                    "`{name}` has to run inside a virtual environment but none is active"
                ))
            }
        };

        command.args(&invocation.args).current_dir(&invocation.cwd);

        if let Some(env) = &self.active {
            command
                .env("VIRTUAL_ENV", env.root())
                .env("PATH", env.path_var(std::env::var_os("PATH"))?)
                .env_remove("PYTHONHOME");
        }

        Ok(command)
    }
}

impl Runner for SystemRunner {
    fn activate(&mut self, env: VirtualEnv) {
        let env = env.absolute();
        trace!("Activating {}", env.root().display());
        self.active = Some(env);
    }

    fn deactivate(&mut self) {
        if let Some(env) = self.active.take() {
            trace!("Deactivated {}", env.root().display());
        }
    }

    fn is_active(&self) -> bool {
        self.active.is_some()
    }

    fn run(&mut self, invocation: &Invocation) -> anyhow::Result<()> {
        trace!("Running `{invocation}` in {}", invocation.cwd.display());

        let status = self
            .command(invocation)?
            .status()
            .with_context(|| format!("Failed to start `{}`", invocation.program))?;

        if status.success() {
            return Ok(());
        }

        let program = invocation.program.to_string();
        Err(match status.code() {
            Some(code) => Abort::ToolFailed { program, code },
            None => Abort::ToolKilled { program },
        }
        .into())
    }
}

/// Commands that turn a freshly copied template into a working project, in order.
///
/// The environment is activated right after the first two commands; everything
/// after that runs inside it.
#[must_use]
pub fn plan(root: &Path, name: &str, description: &str, toolchain: &Toolchain) -> Plan {
    let env_dir = toolchain.env_dir.to_string_lossy().into_owned();
    let pm = toolchain.package_manager.as_str();

    let before = vec![
        Invocation::system("git", ["init"], root),
        Invocation::system(&toolchain.python, ["-m", "venv", env_dir.as_str()], root),
    ];

    let mut inside = vec![
        Invocation::env("pip", ["install", pm], root),
        Invocation::env(
            pm,
            [
                "init",
                "--no-interaction",
                "--name",
                name,
                "--description",
                description,
            ],
            root,
        ),
        Invocation::env(
            pm,
            ["add", "--group", "dev"]
                .into_iter()
                .chain(toolchain.dev_dependencies.iter().map(String::as_str)),
            root,
        ),
        Invocation::env("pre-commit", ["install"], root),
    ];

    if root.join(".pre-commit-config.yaml").is_file() {
        inside.push(Invocation::env("pre-commit", ["autoupdate"], root));
    }

    Plan {
        before,
        env: VirtualEnv::new(root.join(&toolchain.env_dir)),
        inside,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub before: Vec<Invocation>,
    pub env: VirtualEnv,
    pub inside: Vec<Invocation>,
}

impl Plan {
    /// Runs the plan, stopping at the first failure. The environment is left
    /// active; deactivating it is up to the caller.
    ///
    /// # Errors
    ///
    /// Returns the first failing invocation's error.
    pub fn execute(self, runner: &mut dyn Runner) -> anyhow::Result<()> {
        for invocation in &self.before {
            runner.run(invocation)?;
        }

        runner.activate(self.env);

        for invocation in &self.inside {
            runner.run(invocation)?;
        }

        Ok(())
    }
}
