use anyhow::{anyhow, Context};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};
use tera::Tera;

/// Lint settings appended to every new `pyproject.toml`
pub const LINT_CONFIG: &str = r#"[tool.ruff]
line-length = 88
target-version = "py311"

[tool.ruff.lint]
select = ["ALL"]
ignore = ["D203", "D213", "COM812", "ISC001"]

[tool.ruff.lint.per-file-ignores]
"tests/**/*.py" = ["S101", "D"]

[tool.pylint.format]
max-line-length = 88
"#;

const README: &str = "# {{ name }}\n{% if description %}{{ description }}\n{% endif %}";

/// Appends [`LINT_CONFIG`] to `<root>/pyproject.toml`, creating the file if needed.
///
/// # Errors
///
/// Returns an [`Err`] if the file can not be opened or written.
pub fn append_lint_config(root: &Path) -> anyhow::Result<PathBuf> {
    let path = root.join("pyproject.toml");

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .and_then(|mut f| write!(f, "\n{LINT_CONFIG}"))
        .with_context(|| format!("Failed to append lint config to {}", path.display()))?;

    Ok(path)
}

/// README text: a heading with the name and the description below it, both
/// written as typed.
///
/// # Errors
///
/// Returns an [`Err`] if rendering fails.
pub fn render_readme(name: &str, description: &str) -> anyhow::Result<String> {
    let mut context = tera::Context::new();
    context.insert("name", name);
    context.insert("description", description);

    Tera::one_off(README, &context, false).map_err(|e| anyhow!("Failed to render README: {e}"))
}

/// Writes `<root>/README.md`, replacing any README the template brought.
///
/// # Errors
///
/// Returns an [`Err`] if rendering or writing fails.
pub fn write_readme(root: &Path, name: &str, description: &str) -> anyhow::Result<PathBuf> {
    let path = root.join("README.md");

    fs::write(&path, render_readme(name, description)?)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(path)
}

/// Adds the environment directory and `.DS_Store` to `<root>/.gitignore` unless
/// already listed.
///
/// # Errors
///
/// Returns an [`Err`] on IO errors.
pub fn ensure_gitignore(root: &Path, env_dir: &Path) -> anyhow::Result<PathBuf> {
    let path = root.join(".gitignore");
    let current = match fs::read_to_string(&path) {
        Ok(s) => s,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e).with_context(|| format!("Failed to read {}", path.display())),
    };

    let env_entry = format!("{}/", env_dir.to_string_lossy().trim_end_matches('/'));
    let listed = |entry: &str| {
        current
            .lines()
            .map(str::trim)
            .any(|l| l == entry || l == entry.trim_end_matches('/'))
    };

    let missing = [".DS_Store", env_entry.as_str()]
        .into_iter()
        .filter(|e| !listed(*e))
        .collect::<Vec<_>>();

    if missing.is_empty() {
        return Ok(path);
    }

    let mut addition = String::new();
    if !current.is_empty() && !current.ends_with('\n') {
        addition.push('\n');
    }
    for entry in missing {
        addition.push_str(entry);
        addition.push('\n');
    }

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .and_then(|mut f| f.write_all(addition.as_bytes()))
        .with_context(|| format!("Failed to update {}", path.display()))?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readme_lines() {
        let tmp = tempfile::tempdir().unwrap();

        let path = write_readme(tmp.path(), "demo", "A demo.").unwrap();
        let readme = fs::read_to_string(path).unwrap();
        let mut lines = readme.lines();

        assert_eq!(lines.next(), Some("# demo"));
        assert_eq!(lines.next(), Some("A demo."));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn readme_is_not_escaped() {
        assert_eq!(
            render_readme("a <b> & {{c}}", "\"quoted\" & 'single'").unwrap(),
            "# a <b> & {{c}}\n\"quoted\" & 'single'\n"
        );
    }

    #[test]
    fn readme_without_description() {
        assert_eq!(render_readme("demo", "").unwrap(), "# demo\n");
    }

    #[test]
    fn lint_config_is_appended() {
        let tmp = tempfile::tempdir().unwrap();
        let pyproject = tmp.path().join("pyproject.toml");
        fs::write(&pyproject, "[tool.poetry]\nname = \"demo\"\n").unwrap();

        append_lint_config(tmp.path()).unwrap();

        let contents = fs::read_to_string(pyproject).unwrap();
        assert!(contents.starts_with("[tool.poetry]\nname = \"demo\"\n\n[tool.ruff]\n"));
        assert!(contents.ends_with(LINT_CONFIG));
    }

    #[test]
    fn lint_config_creates_file() {
        let tmp = tempfile::tempdir().unwrap();

        let path = append_lint_config(tmp.path()).unwrap();

        assert_eq!(fs::read_to_string(path).unwrap(), format!("\n{LINT_CONFIG}"));
    }

    #[test]
    fn gitignore_gets_missing_entries() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join(".gitignore"), "__pycache__/\n.venv\n").unwrap();

        ensure_gitignore(tmp.path(), Path::new(".venv")).unwrap();
        ensure_gitignore(tmp.path(), Path::new(".venv")).unwrap();

        assert_eq!(
            fs::read_to_string(tmp.path().join(".gitignore")).unwrap(),
            "__pycache__/\n.venv\n.DS_Store\n"
        );
    }

    #[test]
    fn gitignore_is_created() {
        let tmp = tempfile::tempdir().unwrap();

        ensure_gitignore(tmp.path(), Path::new(".venv")).unwrap();

        assert_eq!(
            fs::read_to_string(tmp.path().join(".gitignore")).unwrap(),
            ".DS_Store\n.venv/\n"
        );
    }
}
