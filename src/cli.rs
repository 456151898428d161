use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "ghextract")]
#[command(version)]
#[command(about = "Fetch selected files from GitHub tarballs and workflow artifacts", long_about = None)]
#[command(after_help = "Examples:\n  \
  ghextract tarball octocat/hello main -i '^\\.github/'   list workflow files of octocat/hello\n  \
  ghextract -p tarball octocat/hello -i 'README'         print the README to stdout\n  \
  ghextract -v artifact coverage                         list the coverage artifact of the current run")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// List file names (default)
    #[arg(short = 'l', global = true)]
    pub list: bool,

    /// List verbosely: size, mode, modification time
    #[arg(short = 'v', global = true)]
    pub verbose: bool,

    /// Extract files to pipe
    #[arg(short = 'p', global = true)]
    pub pipe: bool,

    /// Quiet mode (only errors are logged)
    #[arg(short = 'q', action = clap::ArgAction::Count, global = true)]
    pub quiet: u8,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Select files from a repository tarball
    Tarball {
        /// Repository as owner/name
        #[arg(value_name = "OWNER/REPO")]
        repository: String,

        /// Branch, tag or commit
        #[arg(value_name = "REF", default_value = "HEAD")]
        branch: String,

        /// Regular expressions selecting paths (default: all)
        #[arg(short = 'i', long = "include", value_name = "PATTERN")]
        include: Vec<String>,
    },

    /// Fetch a workflow run artifact
    Artifact {
        /// Artifact name
        #[arg(value_name = "NAME")]
        name: String,

        /// Repository as owner/name (default: $GITHUB_REPOSITORY)
        #[arg(short = 'r', long = "repository", value_name = "OWNER/REPO")]
        repository: Option<String>,

        /// Workflow run id (default: $GITHUB_RUN_ID)
        #[arg(long = "run-id", value_name = "ID")]
        run_id: Option<u64>,
    },
}

impl Cli {
    pub fn is_quiet(&self) -> bool {
        self.quiet > 0
    }

    /// Default log filter, overridden by `RUST_LOG`.
    pub fn log_filter(&self) -> &'static str {
        if self.is_quiet() { "error" } else { "warn" }
    }
}
