//! identify-pulse CLI
//!
//! Usage:
//!   identify-pulse                              # Serve GET /identify on 127.0.0.1:16888
//!   identify-pulse --serve --addr 0.0.0.0:8080  # Serve on another address
//!   identify-pulse --map COM3=5:2               # Let ?com=COM3 blink target 5, channel 2
//!   identify-pulse --identify "5:2"             # Run one identify blink locally
//!   identify-pulse --test "5"                   # Run the test pattern locally
//!   identify-pulse --identify "5" --json        # JSON property changes

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use identify_pulse::core::{IdentifyPlugin, PluginConfig, RunPolicy, SelectorMapping};
use identify_pulse::types::{PropertyChange, SequenceReport};
use identify_pulse::{ACTION_IDENTIFY, ACTION_TEST_PATTERN, DEFAULT_LISTEN_ADDR, VERSION};

#[derive(Parser, Debug)]
#[command(
    name = "identify-pulse",
    version = VERSION,
    about = "Blink a peripheral so an operator can tell which device is which",
    long_about = "identify-pulse drives an on/off identify signal through a property bus.\n\n\
                  Commands use the form TARGET[:CHANNEL[:MODE]]; every part is optional\n\
                  and falls back to target 1, channel 0, mode 0.\n\n\
                  Modes:\n  \
                  0        - Normal identify (5 pulses, 300ms on / 300ms off)\n  \
                  1        - Test pattern (10 pulses, 200ms on / 200ms off)\n  \
                  other    - Treated as normal identify"
)]
struct Args {
    /// Run the HTTP listener (default when no action is given)
    #[arg(short, long, conflicts_with_all = ["identify", "test"])]
    serve: bool,

    /// Run "Trigger Identify Blink" once with this command
    #[arg(short, long, value_name = "COMMAND", conflicts_with = "test")]
    identify: Option<String>,

    /// Run "Trigger Test Pattern" once with this command
    #[arg(short, long, value_name = "COMMAND")]
    test: Option<String>,

    /// Listen address for the HTTP listener
    #[arg(long, default_value = DEFAULT_LISTEN_ADDR)]
    addr: String,

    /// Map an HTTP selector to a command (repeatable)
    #[arg(long = "map", value_name = "SELECTOR=COMMAND")]
    mappings: Vec<SelectorMapping>,

    /// Queue overlapping runs instead of letting them interleave
    #[arg(long)]
    serialize_runs: bool,

    /// Output property changes as JSON
    #[arg(long)]
    json: bool,

    /// Disable colors in output
    #[arg(long)]
    no_color: bool,
}

impl Args {
    fn plugin_config(&self) -> PluginConfig {
        PluginConfig {
            listen_addr: self.addr.clone(),
            run_policy: if self.serialize_runs {
                RunPolicy::Serialized
            } else {
                RunPolicy::Overlap
            },
            selectors: self.mappings.iter().cloned().collect(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("identify_pulse=info")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let mut plugin = IdentifyPlugin::new(args.plugin_config());

    if args.serve {
        run_serve(&mut plugin, &args).await
    } else if let Some(ref command) = args.identify {
        run_action(&mut plugin, ACTION_IDENTIFY, command, &args).await
    } else if let Some(ref command) = args.test {
        run_action(&mut plugin, ACTION_TEST_PATTERN, command, &args).await
    } else {
        run_serve(&mut plugin, &args).await
    }
}

/// Run one action and stream every property change until the run ends
async fn run_action(plugin: &mut IdentifyPlugin, action: &str, command: &str, args: &Args) -> Result<()> {
    plugin.register();

    let mut changes = plugin.bus().subscribe();
    let mut run = plugin.actions().invoke(action, command)?;

    let report = loop {
        tokio::select! {
            joined = &mut run => break joined.context("identify sequence did not complete")?,
            change = changes.recv() => match change {
                Ok(change) => print_change(&change, args),
                Err(RecvError::Lagged(missed)) => warn!(missed, "output fell behind"),
                Err(RecvError::Closed) => {}
            },
        }
    };
    while let Ok(change) = changes.try_recv() {
        print_change(&change, args);
    }

    print_report(&report, args)
}

/// Print one property change
fn print_change(change: &PropertyChange, args: &Args) {
    if args.json {
        match serde_json::to_string(change) {
            Ok(line) => println!("{}", line),
            Err(e) => warn!(error = %e, "failed to encode change"),
        }
    } else if args.no_color {
        println!("{}", change.to_parseable_string());
    } else {
        println!("{}", change.to_terminal_string());
    }
}

/// Print the run summary
fn print_report(report: &SequenceReport, args: &Args) -> Result<()> {
    if args.json {
        println!("{}", serde_json::to_string(report)?);
        return Ok(());
    }

    let (color, reset) = if args.no_color { ("", "") } else { ("\x1b[32m", "\x1b[0m") };
    println!(
        "{}✓ identify {} done: {} pulses ({}ms on / {}ms off) in {:.1}s, expected {:.1}s{}",
        color,
        report.request,
        report.pulses,
        report.profile.on_ms,
        report.profile.off_ms,
        report.elapsed.as_secs_f64(),
        report.profile.total_duration().as_secs_f64(),
        reset
    );
    Ok(())
}

/// Run the HTTP listener until Ctrl-C
async fn run_serve(plugin: &mut IdentifyPlugin, args: &Args) -> Result<()> {
    let addr = plugin.init().await?;

    if args.no_color {
        println!("identify-pulse v{} listening on http://{}", VERSION, addr);
    } else {
        println!("\x1b[1m◉ identify-pulse v{}\x1b[0m listening on http://{}", VERSION, addr);
    }
    println!("  GET /identify?com=<selector>");
    let selectors = &plugin.config().selectors;
    if selectors.is_empty() {
        println!("  no selectors mapped; requests are acknowledged but drive nothing");
    } else {
        println!("  {} selector(s) mapped", selectors.len());
    }
    println!("Press Ctrl-C to stop.");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    plugin.shutdown().await?;
    Ok(())
}
