//! Ledpulse CLI
//!
//!   ledpulse run [--config PATH]                       → Spawn configured LEDs and sequencers
//!   ledpulse blink <interval_ms> [times] [--led NAME]  → Blink one LED, -1 or no times = forever
//!   ledpulse config [--config PATH]                    → Print the effective config as JSON
//!
//! Config lookup: --config, then $LEDPULSE_CONFIG, then
//! <config_dir>/ledpulse/config.json, then a single simulated "status" LED.

use anyhow::{anyhow, bail, Context, Result};
use ledpulse::logging::init_logging;
use ledpulse::runtime::install_signal_handlers;
use ledpulse::{LedpulseConfig, Registry, INFINITE};
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

fn main() {
    init_logging();

    let args: Vec<String> = env::args().collect();
    let opts = ParsedArgs::parse(&args[1..]);

    if opts.help {
        print_usage();
        return;
    }

    if opts.version {
        println!("ledpulse {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    let result = match opts.command.as_deref() {
        Some("run") => block_on(cmd_run(&opts)),
        Some("blink") => block_on(cmd_blink(&opts)),
        Some("config") => cmd_config(&opts),
        Some(cmd) => Err(anyhow!("unknown command: {}", cmd)),
        None => {
            print_usage();
            return;
        }
    };

    if let Err(e) = result {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

#[derive(Default)]
struct ParsedArgs {
    command: Option<String>,
    positional: Vec<String>,
    config: Option<PathBuf>,
    led: Option<String>,
    help: bool,
    version: bool,
}

impl ParsedArgs {
    fn parse(args: &[String]) -> Self {
        let mut opts = ParsedArgs::default();
        let mut i = 0;

        while i < args.len() {
            let arg = &args[i];
            match arg.as_str() {
                "--help" | "-h" => opts.help = true,
                "--version" | "-V" => opts.version = true,
                "--config" | "-c" => {
                    if i + 1 < args.len() {
                        opts.config = Some(PathBuf::from(&args[i + 1]));
                        i += 1;
                    }
                }
                "--led" | "-l" => {
                    if i + 1 < args.len() {
                        opts.led = Some(args[i + 1].clone());
                        i += 1;
                    }
                }
                // Negative numbers are positional (times = -1)
                _ if arg.starts_with('-') && arg.parse::<i64>().is_err() => {
                    debug!(arg = %arg, "ignoring unknown flag");
                }
                _ => {
                    if opts.command.is_none() {
                        opts.command = Some(arg.clone());
                    } else {
                        opts.positional.push(arg.clone());
                    }
                }
            }
            i += 1;
        }

        opts
    }
}

fn print_usage() {
    println!(
        r#"ledpulse - blink schedulers and pattern sequencers for LEDs

USAGE:
    ledpulse <COMMAND> [OPTIONS]

COMMANDS:
    run                              Spawn configured LEDs and sequencers until Ctrl+C
    blink <interval_ms> [times]      Blink one LED; omit times or pass -1 to blink forever
    config                           Print the effective configuration

OPTIONS:
    -c, --config <PATH>   Config file (default: $LEDPULSE_CONFIG, then <config_dir>/ledpulse/config.json)
    -l, --led <NAME>      LED for `blink` (default: first configured LED)
    -h, --help            Show this help
    -V, --version         Show version

ENVIRONMENT:
    RUST_LOG              Log filter (default: info)
    LEDPULSE_LOG_JSON=1   Log as JSON lines"#
    );
}

fn block_on<F: std::future::Future<Output = Result<()>>>(future: F) -> Result<()> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start tokio runtime")?
        .block_on(future)
}

fn load_config(opts: &ParsedArgs) -> Result<LedpulseConfig> {
    LedpulseConfig::discover(opts.config.as_deref()).context("failed to load config")
}

fn cmd_config(opts: &ParsedArgs) -> Result<()> {
    let config = load_config(opts)?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

async fn cmd_run(opts: &ParsedArgs) -> Result<()> {
    let config = load_config(opts)?;
    let shutdown = install_signal_handlers().context("failed to install signal handlers")?;
    let registry = Registry::new();

    let running = config.spawn(&registry, &shutdown)?;
    info!(leds = ?registry.names(), "running, Ctrl+C to stop");

    shutdown.wait().await;
    running.join().await;
    Ok(())
}

async fn cmd_blink(opts: &ParsedArgs) -> Result<()> {
    let interval: u32 = match opts.positional.first() {
        Some(raw) => raw.parse().with_context(|| format!("invalid interval: {}", raw))?,
        None => bail!("usage: ledpulse blink <interval_ms> [times] [--led NAME]"),
    };
    let times: i64 = match opts.positional.get(1) {
        Some(raw) => raw.parse().with_context(|| format!("invalid times: {}", raw))?,
        None => INFINITE,
    };

    let mut config = load_config(opts)?;
    let name = match &opts.led {
        Some(name) => name.clone(),
        None => config
            .leds
            .first()
            .map(|led| led.name.clone())
            .ok_or_else(|| anyhow!("no LEDs configured"))?,
    };
    // Only the chosen LED; sequencers would fight over it
    config.leds.retain(|led| led.name == name);
    config.sequencers.clear();
    if config.leds.is_empty() {
        bail!("no LED named '{}' in config", name);
    }

    let shutdown = install_signal_handlers().context("failed to install signal handlers")?;
    let running = config.spawn(&Registry::new(), &shutdown)?;
    let led = running
        .led(&name)
        .cloned()
        .ok_or_else(|| anyhow!("LED '{}' did not start", name))?;

    led.blink(interval, times).await?;
    info!(led = %name, interval, times, "blinking");

    let poll = Duration::from_millis(u64::from(interval.max(10)));
    loop {
        tokio::select! {
            _ = shutdown.wait() => break,
            _ = tokio::time::sleep(poll) => {
                if !led.status().await?.blinking {
                    break;
                }
            }
        }
    }

    shutdown.trigger();
    running.join().await;
    Ok(())
}
