//! axond - host an axon engine with an HTTP ingress, or talk to one.
//!
//! # Verbs
//!
//! | Verb | Effect |
//! |------|--------|
//! | `up` | Host an engine + ingress, write the runtime-info file, wait for signals |
//! | `down` | Signal the recorded process (SIGINT; SIGTERM with `--force`) |
//! | `clean` | Kill the recorded process if reachable, then wipe the file |
//! | `ping` | 10 liveness pings against `--address` |
//! | `emit` | Submit one event over HTTP |
//!
//! # Exit codes
//!
//! 0 on success, 1 on configuration or startup failure, 24 when a
//! hosted server is force-killed by SIGTERM.
//!
//! # Logging
//!
//! `--debug` > `--verbose` > `RUST_LOG` > default `warn`.

mod rti;

use anyhow::{bail, Context as _, Result};
use axon_event::{Event, TopicCfg};
use axon_ingress::{client, AuthCallback, Config, Endpoint, SubmitRequest};
use axon_runtime::Engine;
use clap::{Parser, Subcommand};
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use rti::{RtiError, RuntimeInfo};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const EXIT_FORCE_KILL: i32 = 24;

const DEFAULT_ADDRESS: &str = "127.0.0.1:4096";
const DEFAULT_RTI: &str = ".axond";
const DEFAULT_GRACE_SECS: u64 = 5;

const HTTP_TOPIC: &str = "topic.http";

/// axond - event engine host and client
#[derive(Parser, Debug)]
#[command(name = "axond")]
#[command(version, about, long_about = None)]
struct Args {
    /// Address to bind or target [address:port]
    #[arg(long, default_value = DEFAULT_ADDRESS)]
    address: String,

    /// Seconds to wait for graceful server shutdown
    #[arg(long, default_value_t = DEFAULT_GRACE_SECS)]
    grace: u64,

    /// Runtime-info file recording the hosted server
    #[arg(long, default_value = DEFAULT_RTI)]
    rti: PathBuf,

    /// Auth token for HTTP submissions (enables the auth gate on `up`)
    #[arg(long)]
    token: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Host a server
    Up,
    /// Stop a hosted server (graceful)
    Down {
        /// Force-kill instead of graceful shutdown
        #[arg(long)]
        force: bool,
    },
    /// Kill a hosted server iff running, then wipe the runtime-info file
    Clean,
    /// Ping a server
    Ping,
    /// Emit an event over HTTP
    Emit {
        /// Topic for the event
        #[arg(long, default_value = HTTP_TOPIC)]
        topic: String,

        /// Producer id for the event
        #[arg(long, default_value = "human.cli")]
        producer: String,

        /// String payload for the event
        #[arg(long, default_value = "[TEST EVENT]")]
        data: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = if args.debug {
        EnvFilter::new("debug")
    } else if args.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match &args.command {
        Command::Up => run_up(&args).await,
        Command::Down { force } => run_down(&args, *force),
        Command::Clean => run_clean(&args).await,
        Command::Ping => run_ping(&args).await,
        Command::Emit {
            topic,
            producer,
            data,
        } => run_emit(&args, topic, producer, data).await,
    }
}

async fn run_up(args: &Args) -> Result<()> {
    match RuntimeInfo::load(&args.rti) {
        Ok(info) if info.running => {
            bail!("server already running (pid {}, rti {})", info.pid, args.rti.display());
        }
        Ok(_) | Err(RtiError::NotFound) => {}
        Err(err) => return Err(err).context("unable to read runtime-info file"),
    }

    let mut config = Config::new(&args.address)
        .with_graceful_shutdown(Duration::from_secs(args.grace));
    if let Some(token) = args.token.clone() {
        info!("auth enabled for http submissions");
        let auth: AuthCallback = Arc::new(move |request: &SubmitRequest| {
            request.auth.as_ref().and_then(Value::as_str) == Some(token.as_str())
        });
        config = config.with_auth(auth);
    }

    let mut engine = Engine::new();
    engine
        .use_module(Box::new(Endpoint::new(config)), &[TopicCfg::new(HTTP_TOPIC)])
        .context("unable to add http module")?;
    engine.start().context("engine start failed")?;

    // Confirm the server actually answers before recording it.
    if client::submit_ping(&args.address, 1, None).await.failed > 0 {
        let _ = engine.stop();
        bail!("unable to reach recently started server");
    }

    let mut info = RuntimeInfo::new(&args.address);
    info.running = true;
    info.write(&args.rti)
        .context("failed to write runtime information")?;
    info!(pid = info.pid, address = %args.address, "server up");

    let mut sigterm = signal(SignalKind::terminate()).context("sigterm handler")?;
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("interrupt received, stopping");
            if let Err(err) = engine.stop() {
                error!(error = %err, "engine stop failed");
            }
            RuntimeInfo::remove(&args.rti);
        }
        _ = sigterm.recv() => {
            // Force kill: no cleanup, the file stays for `clean`.
            warn!("force kill requested");
            std::process::exit(EXIT_FORCE_KILL);
        }
    }
    Ok(())
}

fn run_down(args: &Args, force: bool) -> Result<()> {
    let info = match RuntimeInfo::load(&args.rti) {
        Ok(info) => info,
        Err(RtiError::NotFound) => {
            println!(
                "no server seems to be running. perhaps you forgot to specify the rti file?"
            );
            return Ok(());
        }
        Err(err) => return Err(err).context("unable to read runtime-info file"),
    };

    let sig = if force { Signal::SIGTERM } else { Signal::SIGINT };
    kill(Pid::from_raw(info.pid), sig)
        .with_context(|| format!("failed to signal pid {}", info.pid))?;
    println!("success");
    Ok(())
}

async fn run_clean(args: &Args) -> Result<()> {
    let info = match RuntimeInfo::load(&args.rti) {
        Ok(info) => info,
        Err(RtiError::NotFound) => {
            info!("no file to clean");
            return Ok(());
        }
        Err(err) => {
            return Err(err).context("file could not be validated as a runtime-info file")
        }
    };

    // `Running` alone is not good enough: a crash or force kill leaves
    // the flag set. Probe the recorded address before signalling.
    if client::submit_ping(&info.address, 1, None).await.failed == 0 {
        info!(pid = info.pid, "process reachable, issuing kill");
        kill(Pid::from_raw(info.pid), Signal::SIGTERM)
            .with_context(|| format!("failed to signal pid {}", info.pid))?;
    } else {
        info!(pid = info.pid, "process not reachable, cruft detected");
    }

    RuntimeInfo::remove(&args.rti);
    info!("cleaned");
    Ok(())
}

async fn run_ping(args: &Args) -> Result<()> {
    let report = client::submit_ping(&args.address, 10, Some(10)).await;
    println!("Ping finished {}/{} pings failed", report.failed, report.total);
    Ok(())
}

async fn run_emit(args: &Args, topic: &str, producer: &str, data: &str) -> Result<()> {
    let event = Event::new(producer, topic, Value::String(data.to_string()));

    let response = match &args.token {
        Some(token) => {
            warn!("submit with auth");
            client::submit_event_with_auth(&args.address, &event, json!(token)).await
        }
        None => client::submit_event(&args.address, &event).await,
    }
    .context("event submission failed")?;

    println!("{}", response.status);
    Ok(())
}
