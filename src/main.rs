//! vlock: locks the current virtual console.
//!
//! Main entry point that wires the plugin framework, the terminal and the
//! authentication loop together.

use std::path::Path;
use std::process;
use std::sync::Arc;

use clap::Parser;
use nix::sys::signal::Signal;
use nix::unistd::{User, getuid};
use tracing::{debug, warn};
use tracing_subscriber::{EnvFilter, fmt};

use vlock_auth::{ShadowAuthenticator, TerminalInput};
use vlock_core::config::{AppConfig, SYSTEM_CONFIG_PATH};
use vlock_core::error::{AppError, ErrorKind};
use vlock_plugin::PluginManager;
use vlock_session::{LockSession, SessionSettings, tries_message};
use vlock_terminal::{
    CleanupStack, SecureTerminal, TerminationSignals, ignore_stop_signal, reraise,
    termination_message,
};

mod cli;
mod output;

use cli::Cli;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    let config = match load_configuration(&cli) {
        Ok(c) => c,
        Err(e) => process::exit(report(&e)),
    };

    init_logging(&config);

    process::exit(run(cli, config).await);
}

/// Load the system file and the session environment.
fn load_configuration(cli: &Cli) -> Result<AppConfig, AppError> {
    let path = match &cli.config {
        Some(_) if !getuid().is_root() => {
            return Err(AppError::configuration(
                "--config may only be given by root",
            ));
        }
        Some(path) => path.as_path(),
        None => Path::new(SYSTEM_CONFIG_PATH),
    };

    AppConfig::load(path)
}

/// Initialize tracing/logging on stderr.
fn init_logging(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if config.lock.debug() {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new(&config.logging.level)
        }
    });

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(std::io::stderr)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

/// The user whose password unlocks the console.
fn locking_user() -> Option<String> {
    let uid = getuid();
    let from_env = std::env::var("USER").ok().filter(|u| !u.is_empty());

    if uid.is_root() && from_env.is_some() {
        return from_env;
    }

    match User::from_uid(uid) {
        Ok(Some(user)) => Some(user.name),
        Ok(None) => from_env,
        Err(e) => {
            warn!(error = %e, "Password database lookup failed");
            from_env
        }
    }
}

/// Runs the locker and returns the exit status.
async fn run(cli: Cli, config: AppConfig) -> i32 {
    if let Err(e) = ignore_stop_signal() {
        warn!(error = %e, "Could not ignore SIGTSTP");
    }

    let mut signals = match TerminationSignals::new() {
        Ok(s) => s,
        Err(e) => return report(&e.into()),
    };

    let Some(user) = locking_user() else {
        return report(&AppError::internal("could not get username"));
    };
    debug!(user = %user, "Locking user determined");

    let mut manager = PluginManager::from_config(&config.plugins);

    if let Err(e) = prepare_plugins(&mut manager, &cli).await {
        let code = report(&e);
        manager.shutdown().await;
        return code;
    }

    if cli.check {
        output::print_list(&output::plugin_rows(manager.plugins()), cli.format);
        manager.shutdown().await;
        return 0;
    }

    if let Err(e) = manager.start().await {
        let code = report(&e.into());
        manager.shutdown().await;
        return code;
    }

    // Secured only now: a plugin may have switched to another console.
    let terminal = match SecureTerminal::acquire() {
        Ok(t) => t,
        Err(e) => {
            let code = report(&e.into());
            manager.shutdown().await;
            return code;
        }
    };

    let cleanup = Arc::new(CleanupStack::new());
    cleanup.push("restore terminal", move || {
        let mut terminal = terminal;
        terminal.restore();
    });
    install_panic_cleanup(cleanup.clone());

    let mut input = match TerminalInput::stdin() {
        Ok(i) => i,
        Err(e) => {
            cleanup.run();
            let code = report(&e.into());
            manager.shutdown().await;
            return code;
        }
    };

    let settings = SessionSettings::new(&config.lock, &config.auth, cli.all);
    let authenticator = ShadowAuthenticator::new();

    let (signal, failed_tries) = {
        let mut session = LockSession::new(&mut manager, &mut input, &authenticator, &user, settings);
        let signal = tokio::select! {
            () = session.run() => None,
            signal = signals.recv() => Some(signal),
        };
        (signal, session.failed_tries())
    };

    cleanup.run();
    manager.shutdown().await;

    if let Some(message) = tries_message(failed_tries) {
        eprintln!("{message}");
    }

    match signal {
        None => 0,
        Some(signal) => die_from(signal),
    }
}

/// Loads the requested plugins and resolves their dependencies.
async fn prepare_plugins(manager: &mut PluginManager, cli: &Cli) -> Result<(), AppError> {
    for name in &cli.plugins {
        manager.load(name).await.map_err(|e| {
            if e.is_not_found() {
                AppError::from(e)
            } else {
                let message = format!("loading plugin '{name}' failed: {e}");
                AppError::with_source(ErrorKind::Plugin, message, e)
            }
        })?;
    }

    manager.resolve().await.map_err(|e| {
        let message = format!("error resolving plugin dependencies: {e}");
        AppError::with_source(ErrorKind::Dependency, message, e)
    })
}

/// Prints a fatal error and returns the exit status.
fn report(err: &AppError) -> i32 {
    debug!(kind = %err.kind(), error = %err, "Exiting on error");
    eprintln!("vlock: {}", err.message);
    1
}

/// Restores the terminal before the default panic output.
fn install_panic_cleanup(cleanup: Arc<CleanupStack>) {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        cleanup.run();
        default_hook(info);
    }));
}

/// Reports `signal` and terminates through it.
fn die_from(signal: Signal) -> i32 {
    eprint!("{}", termination_message(signal));
    if let Err(e) = reraise(signal) {
        warn!(error = %e, "Could not re-raise signal");
    }
    128 + signal as i32
}
