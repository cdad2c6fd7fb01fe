use std::path::PathBuf;

pub use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[clap(version, about)]
pub struct Args {
    /// Do not print the error that stopped the run
    #[clap(long, global = true)]
    pub no_errors: bool,

    #[clap(subcommand)]
    pub command: Commands,
}

impl Args {
    #[must_use]
    pub fn no_errors(&self) -> bool {
        self.no_errors
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new project from the template
    New {
        /// Name of the project [prompted if missing]
        #[clap(long, short)]
        name: Option<String>,

        /// One line description of the project [prompted if missing]
        #[clap(long, short)]
        description: Option<String>,

        /// Where to create the project [prompted if missing, blank means <output-root>/<name>]
        #[clap(long, short)]
        path: Option<String>,

        /// Template directory to copy [default: <config dir>/template]
        #[clap(long, short, env = "PYSEED_TEMPLATE")]
        template: Option<PathBuf>,

        /// Parent directory used when the path is left blank
        #[clap(long, default_value = "output")]
        output_root: PathBuf,

        /// Python interpreter used to create the virtual environment
        #[clap(long, env = "PYSEED_PYTHON")]
        python: Option<String>,

        /// Skip the confirmation prompt
        #[clap(long, short)]
        yes: bool,
    },
    /// Create the global config directory and a starter template
    Init,
    /// Make the project root importable from the active virtual environment
    LinkRoot {
        /// Project root to expose [default: current directory]
        #[clap(long, short)]
        root: Option<PathBuf>,
    },
}
