use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use pyseed::{
    abort::Abort,
    args::{Args, Commands},
    bootstrap::{SystemRunner, Toolchain},
    collect_project,
    config::{self, SeedDirs},
    confirm_project, error, info,
    prompt::{InquirePrompter, LinePrompter, Prompter},
    pth,
    setup::Setup,
    trace, warn, Given,
};
use std::{io::IsTerminal, process::ExitCode};

fn app(args: &Args) -> Result<()> {
    match args.command {
        Commands::New {
            ref name,
            ref description,
            ref path,
            ref template,
            ref output_root,
            ref python,
            yes,
        } => {
            let template = config::pick_template(template.as_deref(), SeedDirs::default_paths)?;

            let mut prompter: Box<dyn Prompter> = if std::io::stdin().is_terminal() {
                Box::new(InquirePrompter)
            } else {
                trace!("stdin is not a terminal, reading answers line by line");
                Box::new(LinePrompter::stdio())
            };

            let given = Given {
                name: name.clone(),
                description: description.clone(),
                path: path.clone(),
            };

            let project = collect_project(prompter.as_mut(), given, output_root)?;
            confirm_project(prompter.as_mut(), &project, &template, yes)?;

            let toolchain = Toolchain::default().with_python(python.clone());
            let report = Setup {
                project: &project,
                template: &template,
                toolchain: &toolchain,
                started: Local::now(),
            }
            .run(&mut SystemRunner::default())?;

            if let Some(backup) = report.backup {
                info!("Previous contents kept at {}", backup.display());
            }
            info!(
                "Created {} at {} ({} entries from the template)",
                project.name(),
                report.destination.display(),
                report.copied
            );

            Ok(())
        }
        Commands::Init => {
            let seed_dirs = SeedDirs::default_paths()?;

            trace!("Global config: {}", seed_dirs.global_config().display());

            seed_dirs.init()?;
            info!(
                "Template ready at {}",
                seed_dirs.tilde(&seed_dirs.default_template())
            );

            Ok(())
        }
        Commands::LinkRoot { ref root } => {
            let env = pth::active_env()?;
            let root = match root {
                Some(root) => root.clone(),
                None => std::env::current_dir().context("Failed to get current dir")?,
            };

            let written = pth::link_root(&env, &root)?;
            info!("Wrote {}", written.display());

            Ok(())
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    match app(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => match e.downcast_ref::<Abort>() {
            Some(Abort::Declined) => {
                warn!("{e}");
                ExitCode::from(1)
            }
            abort => {
                if !args.no_errors() {
                    error!("{e:#}");
                }
                ExitCode::from(abort.map_or(1, Abort::exit_code))
            }
        },
    }
}
