//! cidata-init - first-boot provisioning from a cidata config drive
//!
//! Exits non-zero only when the configuration cannot be mounted, read or
//! decoded. Failures on individual groups or users are logged and skipped.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use cidata_init::datasources::{CONFIG_DRIVE_LABEL, ConfigSource};
use cidata_init::modules::sudoers::SUDOERS_DIR;
use cidata_init::settings::DEFAULT_CLIENT_TAG;
use cidata_init::system::CommandSystem;
use cidata_init::{Settings, run};

#[derive(Parser)]
#[command(name = "cidata-init")]
#[command(author, version, about = "Provision hostname, groups and users from a cidata config drive", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Filesystem label of the config drive
    #[arg(long, env = "CIDATA_LABEL", default_value = CONFIG_DRIVE_LABEL)]
    label: String,

    /// Read meta-data and user-data from this directory instead of mounting
    #[arg(long, env = "CIDATA_SEED_DIR")]
    seed_dir: Option<PathBuf>,

    /// Tag for the SSH key set and the sudoers fragment name
    #[arg(long, env = "CIDATA_CLIENT_TAG", default_value = DEFAULT_CLIENT_TAG)]
    client_tag: String,

    /// Directory the sudoers fragment is created in
    #[arg(long, env = "CIDATA_SUDOERS_DIR", default_value = SUDOERS_DIR)]
    sudoers_dir: PathBuf,

    /// Seconds any external command may run before it is killed
    #[arg(long, env = "CIDATA_COMMAND_TIMEOUT", default_value_t = 300)]
    command_timeout: u64,

    /// Write a JSON result document here
    #[arg(long, env = "CIDATA_RESULT_FILE")]
    result_file: Option<PathBuf>,
}

impl Cli {
    fn settings(&self) -> Settings {
        let source = match &self.seed_dir {
            Some(dir) => ConfigSource::SeedDir(dir.clone()),
            None => ConfigSource::Volume {
                label: self.label.clone(),
            },
        };

        Settings {
            source,
            client_tag: self.client_tag.clone(),
            sudoers_dir: self.sudoers_dir.clone(),
            command_timeout: Duration::from_secs(self.command_timeout),
            result_file: self.result_file.clone(),
        }
    }
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };

    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {e}");
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    info!("Starting cidata-init");

    let settings = cli.settings();
    let system = CommandSystem::new().with_timeout(settings.command_timeout);

    match run(&settings, &system).await {
        Ok(report) => {
            if !report.is_clean() {
                info!("{} items failed, see errors above", report.errors.len());
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("ERROR: {}", e);
            ExitCode::FAILURE
        }
    }
}
