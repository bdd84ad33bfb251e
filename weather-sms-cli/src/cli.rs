use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use inquire::{Confirm, Text};
use weather_sms_core::{Config, EnvCredentials, LayeredCredentials, Services};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-sms", version, about = "Text tomorrow's forecast to a list of phones")]
pub struct Cli {
    /// Config file to use instead of the platform default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Defaults to `run` so a scheduler can invoke the bare binary.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch tomorrow's forecast and send it to every recipient.
    Run(RunArgs),

    /// Interactively edit the postal code, recipients and narrative setting.
    Configure,
}

#[derive(Debug, Default, Args)]
pub struct RunArgs {
    /// Postal code to forecast, overriding the config file.
    #[arg(long)]
    pub postal_code: Option<String>,

    /// Recipient phone number (repeatable); replaces the configured list.
    #[arg(long = "recipient")]
    pub recipients: Vec<String>,

    /// Skip the rain narrative.
    #[arg(long)]
    pub no_narrative: bool,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let path = match self.config {
            Some(path) => path,
            None => Config::config_file_path()?,
        };

        match self.command.unwrap_or(Command::Run(RunArgs::default())) {
            Command::Run(args) => run(&path, args).await,
            Command::Configure => configure(&path),
        }
    }
}

async fn run(path: &Path, args: RunArgs) -> anyhow::Result<()> {
    let mut config = Config::load_from(path)?;
    apply_overrides(&mut config, args);

    let credentials = LayeredCredentials::new().push(EnvCredentials).push(config.clone());
    let services = Services::from_config(&config, &credentials);

    let report = weather_sms_core::run(&config, &credentials, &services, &Local::now()).await?;

    for line in report.delivery.summary_lines() {
        println!("{line}");
    }
    println!(
        "[{}] Weather SMS sent to {} numbers",
        Local::now().format("%Y-%m-%d %H:%M:%S"),
        report.delivery.sent()
    );

    Ok(())
}

fn apply_overrides(config: &mut Config, args: RunArgs) {
    if let Some(postal_code) = args.postal_code {
        config.postal_code = postal_code;
    }
    if !args.recipients.is_empty() {
        config.recipients.clear();
        for r in args.recipients {
            config.add_recipient(r);
        }
    }
    if args.no_narrative {
        config.narrative.enabled = false;
    }
}

fn configure(path: &Path) -> anyhow::Result<()> {
    let mut config = Config::load_from(path)?;

    config.postal_code = Text::new("Postal code:")
        .with_default(&config.postal_code)
        .prompt()
        .context("Postal code prompt cancelled")?;

    let current = config.recipients.join(", ");
    let recipients = Text::new("Recipients (comma-separated, E.164):")
        .with_default(&current)
        .prompt()
        .context("Recipients prompt cancelled")?;
    config.recipients.clear();
    for r in recipients.split(',') {
        config.add_recipient(r);
    }

    config.narrative.enabled = Confirm::new("Include a rain timing narrative?")
        .with_default(config.narrative.enabled)
        .prompt()
        .context("Narrative prompt cancelled")?;

    config.validate()?;
    config.save_to(path)?;
    println!("Saved configuration to {}", path.display());

    Ok(())
}
