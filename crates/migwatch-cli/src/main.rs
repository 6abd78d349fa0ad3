mod commands;
mod events;
mod logging;
mod render;
mod source;

use std::io::{self, Write};
use std::path::Path;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use chrono::{Local, Utc};
use clap::{CommandFactory, Parser};
use commands::{Cli, Commands};
use crossterm::{cursor, terminal, QueueableCommand};
use dotenv::dotenv;
use migwatch_core::{build_dashboard, DashboardOptions, WatchConfig};
use render::{Palette, Renderer};
use source::{FileSource, OcSource, SnapshotSource};
use tracing::{debug, error};

const FALLBACK_WIDTH: usize = 100;

fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let _guard = logging::init_logger();

    let args = Cli::parse();

    let Some(command) = args.command else {
        let _ = Cli::command().print_long_help();
        return Ok(());
    };

    // an early return drops `_guard`, which flushes the file log
    let mut config = load_config(args.config.as_deref())?;

    match command {
        Commands::Watch(watch) => {
            watch.apply(&mut config);
            let source = OcSource::new(&config.namespace);
            run_watch(&config, &source, watch.once)
        }
        Commands::Snapshot(snapshot) => {
            snapshot.display.apply(&mut config);
            let source = FileSource {
                resources: snapshot.resources,
                transfers: snapshot.datavolumes,
                events: snapshot.events,
            };
            refresh(&config, &source, Palette::detect(), false)
        }
        Commands::PrintConfig => {
            println!("Configuration: {:?}", config);
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<WatchConfig> {
    migwatch_core::config::load_configuration_from(path).or_else(|err| {
        error!("Error loading configuration: {}", err);
        Err(err).context("loading configuration")
    })
}

fn run_watch(config: &WatchConfig, source: &dyn SnapshotSource, once: bool) -> anyhow::Result<()> {
    let palette = Palette::detect();
    let scope = if config.plans.is_empty() {
        "all plans".to_string()
    } else {
        format!("plans: {}", config.plans.join(" "))
    };
    println!(
        "Watching namespace: {} ({}), refresh {}s",
        config.namespace, scope, config.interval_secs
    );
    println!("Press Ctrl-C to exit.");

    loop {
        if let Err(err) = refresh(config, source, palette, palette.is_enabled()) {
            error!("Refresh failed: {:#}", err);
        }
        if once {
            return Ok(());
        }
        thread::sleep(Duration::from_secs(config.interval_secs.max(1)));
    }
}

fn refresh(
    config: &WatchConfig,
    source: &dyn SnapshotSource,
    palette: Palette,
    clear_screen: bool,
) -> anyhow::Result<()> {
    let snapshot = source
        .fetch(config.show_events)
        .context("fetching snapshot")?;
    let views = build_dashboard(
        &snapshot.resources,
        &snapshot.transfers,
        &DashboardOptions::from(config),
    );
    debug!("Rendering {} migrations", views.len());

    let width = terminal::size()
        .map(|(columns, _)| columns as usize)
        .unwrap_or(FALLBACK_WIDTH);
    let renderer = Renderer::new(config, palette, Utc::now(), width);

    let mut out = io::stdout().lock();
    if clear_screen {
        out.queue(terminal::Clear(terminal::ClearType::All))?
            .queue(cursor::MoveTo(0, 0))?;
    }
    writeln!(out, "{}", Local::now().format("%Y-%m-%d %H:%M:%S %Z"))?;
    writeln!(out)?;

    renderer.render(&mut out, &views)?;
    if config.show_events {
        writeln!(out)?;
        renderer.events(&mut out, &snapshot.events)?;
    }
    out.flush()?;
    Ok(())
}
