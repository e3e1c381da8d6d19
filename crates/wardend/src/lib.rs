//! The warden service host binary.
//!
//! Three modes of operation, selected on the command line:
//!
//! - **service mode** (no subcommand): register with the host adapter,
//!   run the heartbeat service under the lifecycle controller until the
//!   manager winds it down, then tear down runtime artefacts;
//! - **`install`**: add this binary to the service manager database;
//! - **`remove`**: stop a running instance and delete its database entry.
//!
//! Anything unparsable prints short usage guidance and exits successfully.

mod cli;
pub mod heartbeat;
pub mod host;
pub mod registrar;
pub mod telemetry;

use std::ffi::OsString;
use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser;
use clap::error::ErrorKind;

use warden_config::{RuntimePaths, ServiceConfig};
use warden_control::ControlDispatchBridge;
use warden_control_types::AcceptedControls;

use crate::cli::{Cli, CliCommand};

pub use crate::heartbeat::HeartbeatService;
pub use crate::host::SignalHost;
pub use crate::registrar::{Registrar, RegistrarError, ServiceDefinition, StartPolicy};
pub use crate::telemetry::{TelemetryError, TelemetryHandle};

const RUN_TARGET: &str = "wardend::run";

/// Entry point shared by `main` and the integration tests.
pub fn run<I, T>(args: I) -> ExitCode
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error)
            if matches!(
                error.kind(),
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion
            ) =>
        {
            let _ = error.print();
            return ExitCode::SUCCESS;
        }
        Err(_) => {
            let _ = cli::write_usage(io::stdout());
            return ExitCode::SUCCESS;
        }
    };

    let config = match ServiceConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(error) => {
            // Telemetry is not up yet; this is the one place stderr is
            // written to directly.
            let _ = writeln!(io::stderr(), "wardend: {error}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(error) = telemetry::initialise(&config) {
        let _ = writeln!(io::stderr(), "wardend: {error}");
        return ExitCode::FAILURE;
    }

    let paths = match RuntimePaths::resolve() {
        Ok(paths) => paths,
        Err(error) => {
            tracing::error!(target: RUN_TARGET, %error, "cannot prepare the state directory");
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Some(CliCommand::Install {
            start_policy,
            dependencies,
            account,
            credential,
        }) => install(
            &config,
            paths,
            start_policy,
            dependencies,
            account,
            credential.as_deref(),
        ),
        Some(CliCommand::Remove) => remove(&config, paths),
        None => serve(&config, paths),
    }
}

fn install(
    config: &ServiceConfig,
    paths: RuntimePaths,
    start_policy: StartPolicy,
    dependencies: Vec<String>,
    account: String,
    credential: Option<&str>,
) -> ExitCode {
    let definition = registrar::definition_for_current_binary(
        &config.service.name,
        &config.service.display_name,
        start_policy,
        dependencies,
        account,
    );
    match Registrar::new(paths).register(definition, credential) {
        Ok(()) => {
            tracing::info!(
                target: RUN_TARGET,
                service = %config.service.name,
                "service installed"
            );
            ExitCode::SUCCESS
        }
        Err(error) => {
            tracing::error!(target: RUN_TARGET, %error, "install failed");
            ExitCode::FAILURE
        }
    }
}

fn remove(config: &ServiceConfig, paths: RuntimePaths) -> ExitCode {
    match Registrar::new(paths).unregister(&config.service.name) {
        Ok(()) => {
            tracing::info!(
                target: RUN_TARGET,
                service = %config.service.name,
                "service removed"
            );
            ExitCode::SUCCESS
        }
        Err(error) => {
            tracing::error!(target: RUN_TARGET, %error, "remove failed");
            ExitCode::FAILURE
        }
    }
}

fn serve(config: &ServiceConfig, paths: RuntimePaths) -> ExitCode {
    let host = SignalHost::new(paths);
    let hooks = HeartbeatService::new(config.worker, config.stop_wait);
    let outcome = ControlDispatchBridge::register(
        &host,
        &config.service.name,
        Box::new(hooks),
        AcceptedControls::default(),
        config.pending_wait_hint(),
    )
    .and_then(|bridge| bridge.run(&[]));
    host.teardown();

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(target: RUN_TARGET, %error, "service run ended abnormally");
            ExitCode::FAILURE
        }
    }
}
