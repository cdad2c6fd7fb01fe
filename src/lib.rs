pub mod abort;
pub mod args;
pub mod bootstrap;
pub mod config;
pub mod emit;
pub mod log;
pub mod project;
pub mod prompt;
pub mod pth;
pub mod scaffold;
pub mod setup;

use lazy_format::lazy_format;
use std::path::Path;

use abort::Abort;
use project::Project;
use prompt::Prompter;

/// Values given up front on the command line. Missing ones are asked for.
#[derive(Debug, Clone, Default)]
pub struct Given {
    pub name: Option<String>,
    pub description: Option<String>,
    pub path: Option<String>,
}

/// Gathers name, description and destination, prompting for whatever `given`
/// lacks. A blank path resolves to `<output_root>/<name>`.
///
/// # Errors
///
/// Returns [`Abort::Declined`] if the operator cancels a prompt.
pub fn collect_project(
    prompter: &mut dyn Prompter,
    given: Given,
    output_root: &Path,
) -> anyhow::Result<Project> {
    let name = match given.name {
        Some(name) => name,
        None => prompter.text("Project name:", None)?,
    };

    let description = match given.description {
        Some(description) => description,
        None => prompter.text("Project description:", None)?,
    };

    let path = match given.path {
        Some(path) => path,
        None => {
            let help = format!("leave blank for {}", output_root.join(&name).display());
            prompter.text("Project path:", Some(help.as_str()))?
        }
    };

    Ok(Project::from_input(&name, &description, &path, output_root))
}

/// Echoes the values back and asks for approval, unless `assume_yes`.
///
/// # Errors
///
/// Returns [`Abort::Declined`] for any answer but `y` or `Y`.
pub fn confirm_project(
    prompter: &mut dyn Prompter,
    project: &Project,
    template: &Path,
    assume_yes: bool,
) -> anyhow::Result<()> {
    let summary = lazy_format!(
        "  name:        {}\n  description: {}\n  path:        {}\n  template:    {}",
        project.name(),
        project.description(),
        project.path().display(),
        template.display()
    );
    println!("{summary}");

    for concern in project.name_concerns() {
        warn!("The project name is used as typed, but {concern}");
    }

    if assume_yes || prompter.confirm("Create the project?")? {
        Ok(())
    } else {
        Err(Abort::Declined.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::LinePrompter;
    use std::io::Cursor;

    fn lines(input: &str) -> LinePrompter<Cursor<Vec<u8>>, Vec<u8>> {
        LinePrompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn prompts_for_missing_values() {
        let mut p = lines("demo\nA demo.\n\n");

        let project = collect_project(&mut p, Given::default(), Path::new("output")).unwrap();

        assert_eq!(project.name(), "demo");
        assert_eq!(project.description(), "A demo.");
        assert_eq!(project.path(), Path::new("output/demo"));
    }

    #[test]
    fn given_values_skip_prompts() {
        let mut p = lines("");
        let given = Given {
            name: Some("demo".into()),
            description: Some(String::new()),
            path: Some("somewhere/".into()),
        };

        let project = collect_project(&mut p, given, Path::new("output")).unwrap();

        assert_eq!(project.path(), Path::new("somewhere"));
        assert!(p.into_output().is_empty());
    }

    #[test]
    fn declining_touches_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let template = tmp.path().join("template");
        std::fs::create_dir_all(&template).unwrap();
        let before = std::fs::read_dir(tmp.path()).unwrap().count();

        for answer in ["n\n", "\n", "yes\n", ""] {
            let dest = tmp.path().join("dest");
            let mut p = lines(&format!("demo\nA demo.\n{}\n{answer}", dest.display()));
            let project = collect_project(&mut p, Given::default(), tmp.path()).unwrap();

            let err = confirm_project(&mut p, &project, &template, false).unwrap_err();

            assert_eq!(err.downcast_ref::<Abort>(), Some(&Abort::Declined));
        }

        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), before);
        assert!(!tmp.path().join("dest").exists());
    }

    #[test]
    fn approving() {
        let mut p = lines("y\n");
        let project = Project::from_input("demo", "", "x", Path::new("output"));

        confirm_project(&mut p, &project, Path::new("template"), false).unwrap();
        confirm_project(&mut lines(""), &project, Path::new("template"), true).unwrap();
    }
}
