use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use command_channel::CommandChannel;
use site_build::{assemble, load_settings, BuildPlan};
use tracing::{info, warn};

#[derive(Parser, Debug)]
struct Cli {
    /// Site configuration file.
    #[arg(long, default_value = "site.toml")]
    config: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check the site configuration and entry points.
    Validate,
    /// Print the computed output layout as JSON.
    Plan,
    /// Assemble the static output directory.
    Build,
    /// Replay a JSON-lines command script through a command channel.
    Replay {
        #[arg(long)]
        script: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let cli = Cli::parse();

    match cli.command {
        Command::Validate => {
            let settings = load_settings(&cli.config)?;
            settings.validate()?;
            println!(
                "ok: {} entry point(s), output to {}",
                settings.entries.len(),
                settings.out_dir.display()
            );
        }
        Command::Plan => {
            let settings = load_settings(&cli.config)?;
            let plan = BuildPlan::from_settings(&settings)?;
            println!("{}", serde_json::to_string_pretty(&plan)?);
        }
        Command::Build => {
            let settings = load_settings(&cli.config)?;
            let plan = BuildPlan::from_settings(&settings)?;
            let report = assemble(&plan)?;
            for bundle in &report.bundles {
                info!(
                    bundle = %bundle.name,
                    files = bundle.files_written.len(),
                    "bundle written"
                );
            }
            println!(
                "built {} bundle(s) into {}",
                report.bundles.len(),
                report.out_dir.display()
            );
        }
        Command::Replay { script } => replay(&script)?,
    }

    Ok(())
}

fn replay(script: &Path) -> Result<()> {
    let raw = fs::read_to_string(script)
        .with_context(|| format!("failed to read command script {}", script.display()))?;

    let channel = CommandChannel::new();
    let _printer = channel.subscribe(|command| match command {
        Some(command) => println!(
            "-> {}",
            serde_json::to_string(command).unwrap_or_else(|_| "<unserializable>".into())
        ),
        None => println!("-> (empty)"),
    });

    for (index, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let payload: serde_json::Value = match serde_json::from_str(line) {
            Ok(payload) => payload,
            Err(error) => {
                warn!(line = index + 1, %error, "skipping malformed script line");
                continue;
            }
        };
        if let Err(error) = channel.publish(payload) {
            warn!(line = index + 1, %error, "command rejected");
        }
    }

    Ok(())
}
