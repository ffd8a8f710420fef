//! snmpbug: minimal SNMP v1/v2c agent.

use std::process::ExitCode;

use clap::Parser;
use snmpbug::cli::{Args, FileConfig, init_tracing};
use snmpbug::host::ProcHost;
use snmpbug::server::Server;
use tokio::signal::unix::{SignalKind, signal};
use tokio_util::sync::CancellationToken;

/// Invalid arguments or configuration.
const EXIT_ARGS: u8 = 1;
/// Socket setup or runtime failure.
const EXIT_SYSCALL: u8 = 2;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.log_level());

    let agent = match FileConfig::load(&args.config).and_then(|file| args.agent_config(file)) {
        Ok(agent) => agent,
        Err(e) => {
            tracing::error!(target: "snmpbug::config", { error = %e }, "invalid configuration");
            return ExitCode::from(EXIT_ARGS);
        }
    };

    tracing::info!(target: "snmpbug::server", { version = env!("CARGO_PKG_VERSION") }, "snmpbug starting");

    let host = Box::new(ProcHost::new());
    let mut server = match Server::bind(&args.server_config(), agent, host).await {
        Ok(server) => server,
        Err(e) => {
            tracing::error!(target: "snmpbug::server", { error = %e }, "startup failed");
            return ExitCode::from(EXIT_SYSCALL);
        }
    };

    if let Err(e) = watch_signals(server.cancel()) {
        tracing::error!(target: "snmpbug::server", { error = %e }, "cannot install signal handlers");
        return ExitCode::from(EXIT_SYSCALL);
    }

    match server.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(target: "snmpbug::server", { error = %e }, "server failed");
            ExitCode::from(EXIT_SYSCALL)
        }
    }
}

/// Cancel `token` on SIGTERM, SIGINT or SIGHUP.
fn watch_signals(token: CancellationToken) -> std::io::Result<()> {
    let mut term = signal(SignalKind::terminate())?;
    let mut int = signal(SignalKind::interrupt())?;
    let mut hup = signal(SignalKind::hangup())?;

    tokio::spawn(async move {
        let name = tokio::select! {
            _ = term.recv() => "SIGTERM",
            _ = int.recv() => "SIGINT",
            _ = hup.recv() => "SIGHUP",
        };
        tracing::info!(target: "snmpbug::server", { signal = name }, "received signal");
        token.cancel();
    });
    Ok(())
}
