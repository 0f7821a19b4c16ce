//! Tether CLI - operator surface over the local connector
//! Every subcommand maps onto one Connector operation.

mod logging;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tabled::{Table, Tabled};
use tracing::info;

use tether_core::domain::{SetupSpec, SpawnOptions};
use tether_core::{Connector, ConnectorConfig, ExecCapture};
use tether_infra_local::LocalConnector;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "tether")]
#[command(about = "Run commands and probe the local execution environment", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Working directory (overrides TETHER_CWD)
    #[arg(long, global = true)]
    cwd: Option<String>,

    /// Exit-code capture mode: native | status-line (overrides TETHER_EXEC_CAPTURE)
    #[arg(long, global = true)]
    capture: Option<ExecCapture>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a command and exit with its exit code
    Exec {
        /// Shell command text
        cmd: String,
    },

    /// Start a command detached and print its pid
    Spawn {
        cmd: String,

        /// Extra environment variables (KEY=VALUE)
        #[arg(short, long = "env", value_parser = parse_env_pair)]
        env: Vec<(String, String)>,

        /// Keep printing the process's error output until it closes
        #[arg(long)]
        watch: bool,
    },

    /// Start a managed process, wait for readiness, tear down on Ctrl+C
    Run {
        cmd: String,

        /// Readiness token expected on stdout
        #[arg(short, long)]
        wait_for: Option<String>,
    },

    /// Report CPU cores, memory, disk space and virtualization support
    Probe {
        /// Location whose filesystem free space is reported
        #[arg(short, long, default_value = "")]
        disk: String,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Check whether an address answers HTTP 200 within the timeout
    Reachable { address: String },

    /// Print the absolute form of a path
    Resolve { path: String },

    /// Check whether a path exists
    Exists { path: String },

    /// Check a file's content for a substring
    Contains {
        path: String,
        needle: String,

        /// Expect the substring to be absent
        #[arg(long)]
        absent: bool,
    },
}

#[derive(Tabled)]
struct ProbeRow {
    probe: &'static str,
    value: String,
}

fn parse_env_pair(raw: &str) -> std::result::Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", raw))
}

fn load_config(cli: &Cli) -> ConnectorConfig {
    let mut config = ConnectorConfig::from_env();
    if let Some(cwd) = &cli.cwd {
        config.cwd = cwd.clone();
    }
    if let Some(capture) = cli.capture {
        config.capture = capture;
    }
    config
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_logging().context("Failed to initialize logging")?;

    let cli = Cli::parse();
    let config = load_config(&cli);
    info!(
        version = VERSION,
        cwd = %config.cwd,
        capture = %config.capture,
        "Tether connector ready"
    );

    let connector = LocalConnector::from_config(&config);

    match cli.command {
        Commands::Exec { cmd } => {
            let result = connector.exec(&cmd).await.context("Command could not be run")?;
            if !result.stdout.is_empty() {
                println!("{}", result.stdout);
            }
            eprint!("{}", result.stderr);
            std::process::exit(result.exit_code);
        }

        Commands::Spawn { cmd, env, watch } => {
            let options = env
                .into_iter()
                .fold(SpawnOptions::default(), |opts, (k, v)| opts.env(k, v));

            let mut spawned = connector
                .spawn(&cmd, options)
                .await
                .context("Spawn failed")?;

            match spawned.pid() {
                Some(pid) => println!("{}", pid),
                None => println!("{}", "pid unavailable".yellow()),
            }

            if watch {
                while let Some(error) = spawned.next_error().await {
                    eprint!("{}", error.red());
                }
            } else {
                spawned.detach();
            }
        }

        Commands::Run { cmd, wait_for } => {
            let spec = SetupSpec {
                cmd: Some(cmd),
                wait_for,
            };

            let Some(mut process) = connector.start(&spec).await.context("Setup failed")? else {
                println!("{}", "Nothing to run".yellow());
                return Ok(());
            };
            println!("Press Ctrl+C to tear down");

            let ready = tokio::select! {
                ready = connector.wait_ready(&mut process) => Some(ready),
                _ = tokio::signal::ctrl_c() => None,
            };

            match ready {
                Some(Ok(())) => {
                    println!("{} (pid {:?})", "✓ Ready".green().bold(), process.pid());
                    tokio::signal::ctrl_c().await?;
                }
                Some(Err(e)) => {
                    connector.tear_down(Some(&mut process)).await;
                    return Err(e).context("Setup failed");
                }
                None => {}
            }

            connector.tear_down(Some(&mut process)).await;
            println!("{}", "✓ Torn down".green());
        }

        Commands::Probe { disk, json } => {
            let report = connector
                .resource_report(&disk)
                .await
                .context("Resource probe failed")?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                let rows = vec![
                    ProbeRow {
                        probe: "cpu cores",
                        value: report.cpu_cores.to_string(),
                    },
                    ProbeRow {
                        probe: "memory (GB)",
                        value: report.memory_gb.to_string(),
                    },
                    ProbeRow {
                        probe: "disk free (GB)",
                        value: report.disk_free_gb.to_string(),
                    },
                    ProbeRow {
                        probe: "virtualization",
                        value: report.virtualization.to_string(),
                    },
                ];
                println!("{}", Table::new(rows));
            }
        }

        Commands::Reachable { address } => {
            let reachable = connector.is_reachable(&address).await;
            if reachable {
                println!("{}", "reachable".green());
            } else {
                println!("{}", "unreachable".red());
                std::process::exit(1);
            }
        }

        Commands::Resolve { path } => {
            println!("{}", connector.resolve_path(&path).display());
        }

        Commands::Exists { path } => {
            let exists = connector.path_exists(&path).await;
            println!("{}", exists);
            if !exists {
                std::process::exit(1);
            }
        }

        Commands::Contains {
            path,
            needle,
            absent,
        } => {
            let matched = connector
                .contains(&path, &needle, !absent)
                .await
                .with_context(|| format!("Cannot inspect {}", path))?;
            println!("{}", matched);
            if !matched {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
