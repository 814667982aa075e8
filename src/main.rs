mod cli;

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use cli::{Cli, Commands, OutputFormat, VersionsAction};
use console::style;
use indicatif::{MultiProgress, ProgressDrawTarget};
use solc_select::manifest::ManifestClient;
use solc_select::platform::{self, LinuxPlatform, MacPlatform, Platform, WindowsPlatform};
use solc_select::{
    download, uninstall, use_version, versions, ArtifactStore, Config, InstallMode, InstallReport,
    Installer,
};
use std::collections::BTreeSet;
use std::process::Command;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(&cli)?;

    let config = Config::load()?;
    config
        .ensure_layout()
        .with_context(|| format!("Could not prepare {}", config.home.display()))?;

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted; no new downloads will be started");
            interrupt.cancel();
        }
    });

    let store = ArtifactStore::new(&config);

    match cli.command {
        Commands::Version => {
            println!("solc-select v{}", env!("CARGO_PKG_VERSION"));
        }

        Commands::Install {
            versions,
            all,
            parallel,
        } => {
            let mode = if parallel {
                InstallMode::Parallel
            } else {
                InstallMode::Sequential
            };
            install_versions(&config, &store, versions, all, mode, !cli.quiet, &cancel).await?;
        }

        Commands::Uninstall { versions, all } => {
            uninstall_versions(&store, versions, all)?;
        }

        Commands::Use { version, install } => {
            versions::validate(&version)?;

            if install && !store.is_installed(&version)? {
                let report = installer(&config, platform::current()?, !cli.quiet)?
                    .install(&[version.clone()], InstallMode::Sequential, &cancel)
                    .await?;
                print_install_report(&report);
            }

            use_version(&store, &version)?;
            println!("Switched global version to '{}'.", version);
        }

        Commands::Versions { action: None } => {
            list_installed(&store)?;
        }

        Commands::Versions {
            action:
                Some(VersionsAction::Installable {
                    linux,
                    mac,
                    windows,
                }),
        } => {
            let platform: Arc<dyn Platform> = if linux {
                Arc::new(LinuxPlatform)
            } else if mac {
                Arc::new(MacPlatform)
            } else if windows {
                Arc::new(WindowsPlatform)
            } else {
                platform::current()?
            };

            let client = ManifestClient::new(download::http_client()?, config.clone());
            let mut available: Vec<String> = client
                .available_versions(platform.as_ref(), &cancel)
                .await?
                .into_keys()
                .collect();
            versions::sort(&mut available);
            for version in available {
                println!("{}", version);
            }
        }

        Commands::Current => {
            println!("{}", store.current()?);
        }

        Commands::Run { args } => {
            let version = store.current()?;
            let executable = store.path(&version);

            tracing::debug!("Executing: {:?} {:?}", executable, args);
            let status = Command::new(&executable)
                .args(&args)
                .status()
                .with_context(|| format!("Could not execute {}", executable.display()))?;
            std::process::exit(status.code().unwrap_or(1));
        }

        Commands::Config { format } => {
            let rendered = match format {
                OutputFormat::Json => serde_json::to_string_pretty(&config)?,
                OutputFormat::Yaml => serde_yaml::to_string(&config)?,
            };
            println!("{}", rendered.trim_end());
        }
    }

    Ok(())
}

fn setup_logging(cli: &Cli) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let level = if cli.quiet {
        "error"
    } else if cli.verbose == 0 {
        "warn"
    } else if cli.verbose == 1 {
        "info"
    } else {
        "debug"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow!("Could not initialise logging: {}", e))?;

    Ok(())
}

fn installer(config: &Config, platform: Arc<dyn Platform>, show_progress: bool) -> Result<Installer> {
    let target = if show_progress {
        ProgressDrawTarget::stderr()
    } else {
        ProgressDrawTarget::hidden()
    };
    Ok(
        Installer::new(download::http_client()?, config.clone(), platform)
            .with_progress(MultiProgress::with_draw_target(target)),
    )
}

async fn install_versions(
    config: &Config,
    store: &ArtifactStore,
    requested: Vec<String>,
    all: bool,
    mode: InstallMode,
    show_progress: bool,
    cancel: &CancellationToken,
) -> Result<()> {
    if requested.is_empty() && !all {
        bail!("Wrong number of arguments: expected at least one version or `--all`");
    }
    for version in &requested {
        versions::validate(version)?;
    }

    let platform = platform::current()?;
    let client = ManifestClient::new(download::http_client()?, config.clone());
    let builds = client.fetch_builds(platform.as_ref(), cancel).await?;
    let available: BTreeSet<&str> = builds.iter().map(|b| b.version.as_str()).collect();
    let installed = store.list_installed()?;

    for version in &requested {
        if !available.contains(version.as_str()) {
            bail!(
                "'{}' is not available. Run `solc-select versions installable`",
                version
            );
        }
        if installed.contains(version) {
            bail!(
                "Version '{}' is already installed. Run `solc-select versions`",
                version
            );
        }
    }

    let mut targets: Vec<String> = if all {
        available
            .iter()
            .filter(|v| !installed.contains(**v))
            .map(|v| v.to_string())
            .collect()
    } else {
        requested
    };
    versions::sort(&mut targets);
    targets.dedup();

    if targets.is_empty() {
        println!("All available versions are already installed.");
        return Ok(());
    }

    eprintln!("Installing {} version(s)...", targets.len());
    let installer = installer(config, platform, show_progress)?;
    let report = match mode {
        InstallMode::Sequential => installer.install_builds(&builds, &targets, cancel).await,
        InstallMode::Parallel => {
            installer
                .install_builds_parallel(&builds, &targets, cancel)
                .await
        }
    };
    print_install_report(&report);

    if !report.not_installed.is_empty() {
        bail!(
            "Failed to install {} version(s): {}",
            report.not_installed.len(),
            report.not_installed.join(", ")
        );
    }
    Ok(())
}

fn print_install_report(report: &InstallReport) {
    for version in &report.installed {
        println!("Version {} installed.", version);
    }
    for version in &report.not_installed {
        eprintln!("Failed to install version {}.", version);
    }
}

fn uninstall_versions(store: &ArtifactStore, requested: Vec<String>, all: bool) -> Result<()> {
    let installed = store.list_installed()?;

    for version in &requested {
        versions::validate(version)?;
    }

    let targets: Vec<String> = if all {
        installed.into_iter().collect()
    } else {
        requested
            .into_iter()
            .filter(|version| {
                let present = installed.contains(version);
                if !present {
                    tracing::warn!("Version '{}' is not installed", version);
                }
                present
            })
            .collect()
    };

    if targets.is_empty() {
        return Ok(());
    }

    let report = uninstall(store, &targets);
    for version in &report.removed {
        println!("Version {} uninstalled.", version);
    }
    for version in &report.not_removed {
        eprintln!("Failed to uninstall version {}.", version);
    }

    if !report.not_removed.is_empty() {
        bail!(
            "Failed to uninstall {} version(s): {}",
            report.not_removed.len(),
            report.not_removed.join(", ")
        );
    }
    Ok(())
}

fn list_installed(store: &ArtifactStore) -> Result<()> {
    let mut installed: Vec<String> = store.list_installed()?.into_iter().collect();
    if installed.is_empty() {
        println!("No solc version installed. Run `solc-select install <version>`.");
        return Ok(());
    }
    versions::sort(&mut installed);

    // A broken marker must not hide the listing
    let current = store.current().ok();

    for version in installed {
        let mut line = version.clone();
        if current.as_deref() == Some(version.as_str()) {
            line = format!("{} {}", style(line).green().bold(), style("(current)").green());
        }
        if !store.is_complete(&version) {
            line = format!("{} {}", line, style("(missing executable)").yellow());
        }
        println!("{}", line);
    }
    Ok(())
}
