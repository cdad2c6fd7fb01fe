use derive_builder::Builder;
use std::path::{is_separator, Path, PathBuf};

/// The three values collected from the operator.
///
/// Nothing here is sanitized: `name` and `description` reach the README and the
/// external tools exactly as typed.
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
#[builder(setter(into))]
pub struct Project {
    name: String,
    #[builder(default)]
    description: String,
    path: PathBuf,
}

impl Project {
    #[must_use]
    pub fn builder() -> ProjectBuilder {
        ProjectBuilder::create_empty()
    }

    /// Builds a project from raw input, resolving the destination with
    /// [`resolve_path`].
    #[must_use]
    pub fn from_input(name: &str, description: &str, raw_path: &str, output_root: &Path) -> Self {
        Project {
            name: name.to_owned(),
            description: description.to_owned(),
            path: resolve_path(raw_path, name, output_root),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    /// Things in the name that downstream tools are likely to reject.
    /// The name is used as is; this only feeds a warning.
    #[must_use]
    pub fn name_concerns(&self) -> Vec<&'static str> {
        let mut concerns = Vec::new();

        if self.name.is_empty() {
            concerns.push("it is empty");
        }
        if self.name.chars().any(char::is_whitespace) {
            concerns.push("it contains whitespace");
        }
        if self.name.chars().any(is_separator) {
            concerns.push("it contains a path separator");
        }

        concerns
    }
}

/// Blank input becomes `<output_root>/<name>`. Otherwise trailing separators
/// are stripped (`foo/` -> `foo`), keeping a bare root as is.
#[must_use]
pub fn resolve_path(raw: &str, name: &str, output_root: &Path) -> PathBuf {
    if raw.trim().is_empty() {
        return output_root.join(name);
    }

    let trimmed = raw.trim_end_matches(is_separator);

    if trimmed.is_empty() {
        PathBuf::from(&raw[..1])
    } else {
        PathBuf::from(trimmed)
    }
}
