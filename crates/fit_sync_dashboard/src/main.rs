use std::pin::Pin;
use std::sync::Arc;

use anyhow::Context;
use fit_sync_client::config::Config;
use fit_sync_client::http_client::ReqwestFitnessService;
use fit_sync_dashboard::{SettingsStore, ViewBinding, ViewOptions};
use metrics_exporter_prometheus::PrometheusBuilder;
use tokio::io::{AsyncBufReadExt, BufReader};

const HELP: &str = "commands: c=connect d=disconnect r=retry t=toggle theme j=json m=metrics q=quit";

type Action<'a> = Pin<Box<dyn Future<Output = bool> + 'a>>;

enum Event {
    Changed(bool),
    Finished(bool),
    Input(Option<String>),
    Quit,
}

/// Drive the in-flight action, if any. Never resolves while idle.
async fn finish(action: &mut Option<Action<'_>>) -> bool {
    match action.as_mut() {
        Some(fut) => fut.await,
        None => std::future::pending().await,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Configure logging from env var `FIT_SYNC_LOG_LEVEL` (or fallback to `RUST_LOG`, default `info`).
    let log_env = std::env::var("FIT_SYNC_LOG_LEVEL")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".to_string());

    // Keep HTTP internals quiet by default
    let combined_filter = format!("{},hyper=warn,reqwest=warn", log_env);
    let env_filter = tracing_subscriber::EnvFilter::try_new(combined_filter)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,hyper=warn,reqwest=warn"));
    tracing_subscriber::fmt()
        .compact()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .with_env_filter(env_filter)
        .init();
    tracing::info!("fit_sync_dashboard: log filter: {}", log_env);

    let cfg = Config::from_env().context("loading configuration")?;
    let metrics = PrometheusBuilder::new()
        .install_recorder()
        .context("installing metrics recorder")?;

    let service = Arc::new(ReqwestFitnessService::from_config(&cfg).context("building http client")?);
    tracing::info!("fit_sync_dashboard: backend {}", cfg.base_url);

    let settings = SettingsStore::from_config(&cfg);
    let view = ViewBinding::new(service, ViewOptions::from_config(&cfg), settings);
    let mut watchers = view.watchers();
    // at most one user action runs at a time, alongside the render loop
    let mut action: Option<Action<'_>> = Some(Box::pin(view.start()));
    println!("{}\n{HELP}\n", view.render());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let event = tokio::select! {
            alive = watchers.changed() => Event::Changed(alive),
            ok = finish(&mut action) => Event::Finished(ok),
            line = lines.next_line() => Event::Input(line.context("reading stdin")?),
            _ = tokio::signal::ctrl_c() => Event::Quit,
        };

        match event {
            Event::Changed(true) => {}
            Event::Changed(false) | Event::Quit | Event::Input(None) => break,
            Event::Finished(ok) => {
                action = None;
                tracing::debug!(ok, "fit_sync_dashboard: action finished");
                continue;
            }
            Event::Input(Some(line)) => {
                let next: Action<'_> = match line.trim() {
                    "c" => Box::pin(view.on_connect()),
                    "d" => Box::pin(view.on_disconnect()),
                    "r" => Box::pin(view.on_retry()),
                    "t" => {
                        view.settings().toggle_dark_mode();
                        continue;
                    }
                    "j" => {
                        println!("{}", serde_json::to_string_pretty(&view.snapshot())?);
                        continue;
                    }
                    "m" => {
                        println!("{}", metrics.render());
                        continue;
                    }
                    "q" => break,
                    "" => {
                        println!("{}\n", view.render());
                        continue;
                    }
                    other => {
                        println!("unknown command {other:?}; {HELP}");
                        continue;
                    }
                };
                if action.is_some() {
                    println!("busy, wait for the current request to finish");
                } else {
                    action = Some(next);
                }
                continue;
            }
        }
        println!("{}\n", view.render());
    }

    drop(action);
    view.unmount();
    tracing::info!("fit_sync_dashboard: exiting");
    Ok(())
}
