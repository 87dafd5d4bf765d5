//! Wiring & DI. Entry point: bootstrap adapters, inject into services, run.
//! No business logic here; login is delegated to AuthService and the
//! backup / restore flow to TransferService.

use clap::Parser;
use dotenv::dotenv;
use et_export::adapters::CliAppState;
use et_export::adapters::engine::{SimulatedAccount, SimulatedEngine, TransferPlan};
use et_export::adapters::ui::{TerminalInput, init_ui};
use et_export::domain::{LoginCredentials, Operation, TaskError};
use et_export::ports::{AppStatePort, InputPort, NetworkObserver, ReleasePort};
use et_export::shared::config::AppConfig;
use et_export::shared::paths;
use et_export::usecases::{AuthService, TaskRunner, TransferService, check_for_updates};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Simulated latency of each login step.
const SIM_SESSION_DELAY: Duration = Duration::from_millis(300);

#[derive(Parser, Debug)]
#[command(name = "et-export", version, about = "Account data exporter")]
struct Cli {
    /// Operation to run: backup or restore
    #[arg(default_value = "backup")]
    operation: Operation,

    /// Export directory (backup target, or backup to restore from)
    #[arg(short = 'e', long = "export-dir", env = "ET_EXPORT_DIR")]
    export_dir: Option<String>,

    /// User's password
    #[arg(short = 'p', long, env = "ET_USER_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// User's mailbox password when using 2 Password Mode
    #[arg(
        short = 'm',
        long = "mbox-password",
        env = "ET_USER_MAILBOX_PASSWORD",
        hide_env_values = true
    )]
    mbox_password: Option<String>,

    /// User's TOTP 2FA code
    #[arg(short = 't', long, env = "ET_TOTP_CODE", hide_env_values = true)]
    totp: Option<String>,

    /// User's account / email
    #[arg(short = 'u', long, env = "ET_USER_EMAIL")]
    user: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if is_cancelled(&e) => {
            info!("exiting after cancellation");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "exiting with failure");
            eprintln!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<()> {
    let env_loaded = dotenv();
    let cli = Cli::parse();

    let cfg = match AppConfig::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Ignoring invalid configuration: {e}");
            AppConfig::default()
        }
    };

    let exec_dir = match paths::executable_dir() {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("Failed to get executable directory: {e}");
            eprintln!("Will use working directory instead");
            std::env::current_dir()?
        }
    };

    init_ui();

    let log_dir = cfg.log_dir_or_default(&exec_dir);
    match init_logging(&log_dir) {
        Ok(path) => println!("Session Log: {}\n", path.display()),
        Err(e) => eprintln!("Failed to open session log in '{}': {e}", log_dir.display()),
    }
    match &env_loaded {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(_) => debug!("no .env found"),
    }
    info!(operation = %cli.operation, exec_dir = %exec_dir.display(), "starting");

    let state = Arc::new(CliAppState::new());
    let _ctrl_c = state.listen_for_ctrl_c();

    let plan = TransferPlan {
        steps: cfg.sim_steps_or_default(),
        step_delay: cfg.sim_step_delay_or_default(),
        ..Default::default()
    };
    let observer: Arc<dyn NetworkObserver> = Arc::clone(&state) as Arc<dyn NetworkObserver>;
    let engine = Arc::new(
        SimulatedEngine::new(SimulatedAccount::default(), SIM_SESSION_DELAY)
            .with_plan(plan)
            .with_observer(observer)
            .with_newer_release(cfg.sim_newer_release.unwrap_or(false)),
    );
    info!(api_url = %cfg.api_url_or_default(), "using simulated engine");

    let app_state: Arc<dyn AppStatePort> = Arc::clone(&state) as Arc<dyn AppStatePort>;
    let mut runner = TaskRunner::stdout(app_state, cfg.poll_interval());

    check_for_updates(&mut runner, Arc::clone(&engine) as Arc<dyn ReleasePort>).await;

    // --- Login ---
    let input: Arc<dyn InputPort> = Arc::new(TerminalInput::new(Arc::clone(&state)));
    let credentials = LoginCredentials::new(cli.user, cli.password, cli.totp, cli.mbox_password);
    AuthService::new(engine.clone(), Arc::clone(&input), credentials)
        .run_auth_flow(&mut runner)
        .await?;

    // --- Backup / restore ---
    let report = TransferService::new(engine, input, exec_dir)
        .run(&mut runner, cli.operation, cli.export_dir.as_deref())
        .await?;
    info!(
        operation = %report.operation,
        path = %report.path.display(),
        elapsed_ms = report.elapsed.as_millis() as u64,
        "operation finished"
    );

    Ok(())
}

/// Session log file under `log_dir`, one per run. ANSI is off so the file
/// stays readable and log lines never touch the status line.
fn init_logging(log_dir: &Path) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(log_dir)?;
    let name = format!(
        "et-export-{}.log",
        chrono::Local::now().format("%Y%m%d-%H%M%S")
    );
    let path = log_dir.join(name);
    let file = std::fs::File::create(&path)?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_env("ET_LOG").unwrap_or_else(|_| "info".into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false),
        )
        .try_init()?;
    Ok(path)
}

fn is_cancelled(e: &anyhow::Error) -> bool {
    e.downcast_ref::<TaskError>()
        .is_some_and(TaskError::is_cancelled)
}
