use clap::{Parser, Subcommand, ValueEnum};

fn get_version() -> &'static str {
    const BASE_VERSION: &str = env!("CARGO_PKG_VERSION");

    if let Some(tag) = option_env!("SOLC_SELECT_GIT_TAG") {
        return tag;
    }

    let commit = option_env!("SOLC_SELECT_GIT_COMMIT").unwrap_or("unknown");
    // Computed once at startup
    let version = format!("v{}-{}", BASE_VERSION, commit);
    Box::leak(version.into_boxed_str())
}

#[derive(Parser)]
#[command(name = "solc-select")]
#[command(about = "Manage multiple Solidity compiler versions")]
#[command(version = get_version(), propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (use multiple times for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Reduce output to errors only
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Install available solc versions
    #[command(after_help = "Examples:\n  solc-select install 0.8.1\n  solc-select install 0.8.1 0.4.23\n  solc-select install --all")]
    Install {
        /// Versions to install (e.g. '0.8.1')
        #[arg(conflicts_with = "all")]
        versions: Vec<String>,
        /// Install every available version
        #[arg(short, long)]
        all: bool,
        /// Download and install versions concurrently
        #[arg(short, long)]
        parallel: bool,
    },

    /// Remove installed solc versions
    Uninstall {
        /// Versions to remove
        #[arg(conflicts_with = "all")]
        versions: Vec<String>,
        /// Remove every installed version
        #[arg(short, long)]
        all: bool,
    },

    /// Change the version of the global solc compiler
    Use {
        #[arg(id = "version_arg", value_name = "VERSION")]
        version: String,
        /// Install the version first if it is missing
        #[arg(short, long)]
        install: bool,
    },

    /// List installed solc versions
    Versions {
        #[command(subcommand)]
        action: Option<VersionsAction>,
    },

    /// Print the current solc version
    Current,

    /// Run the current solc compiler with the given arguments
    #[command(
        allow_hyphen_values = true,
        disable_help_flag = true,
        disable_version_flag = true
    )]
    Run {
        #[arg(trailing_var_arg = true)]
        args: Vec<String>,
    },

    /// Show the effective configuration
    Config {
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },

    /// Show the solc-select version
    Version,
}

#[derive(Subcommand)]
pub enum VersionsAction {
    /// List versions available for installation
    Installable {
        /// Versions built for Linux
        #[arg(short, long, conflicts_with_all = ["mac", "windows"])]
        linux: bool,
        /// Versions built for macOS
        #[arg(short, long, conflicts_with_all = ["linux", "windows"])]
        mac: bool,
        /// Versions built for Windows
        #[arg(short, long, conflicts_with_all = ["linux", "mac"])]
        windows: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Yaml,
}
