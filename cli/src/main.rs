mod console;

use std::time::Duration;

use anyhow::{Context, anyhow, bail};
use clap::{Parser, Subcommand};
use tokio::sync::mpsc::UnboundedReceiver;
use xcel_core::{
    AppAction, AppConfig, AppUpdate, FfiApp, PollPhase, ReactionRowView, SessionState,
    load_app_config, now_millis, save_app_config,
};

use console::{ConsoleHaptics, Forwarder, render_rows};

const SESSION_CREATE_TIMEOUT: Duration = Duration::from_secs(30);
const END_SESSION_GRACE: Duration = Duration::from_millis(750);

#[derive(Parser)]
#[command(name = "xcel", version, about = "Presenter-side reaction feed")]
struct Cli {
    /// State directory (config, log file)
    #[arg(long, env = "XCEL_DATA_DIR", default_value = ".xcel", global = true)]
    data_dir: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start (or join) a session and print the pooled reaction list as it changes
    Watch(WatchArgs),
    /// Print the effective configuration
    Config,
}

#[derive(clap::Args)]
struct WatchArgs {
    /// Poll an existing session instead of creating one
    #[arg(long)]
    session_id: Option<String>,

    /// Reaction API base URL; persisted into the data dir config. Without it the
    /// core falls back to `XCEL_BASE_URL` at runtime, which is never persisted.
    #[arg(long)]
    base_url: Option<String>,

    /// Interval between polls
    #[arg(long, default_value_t = 1000)]
    tick_ms: u64,

    /// Stop after this many seconds (default: run until Ctrl-C)
    #[arg(long)]
    duration_secs: Option<u64>,

    /// Pooling window override
    #[arg(long)]
    pooling_window_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Watch(args) => watch(&cli.data_dir, args).await,
        Command::Config => {
            let config = load_app_config(&cli.data_dir);
            println!("base_url            {}", config.base_url());
            println!("pooling_window_ms   {}", config.pooling_window_ms());
            println!("request_timeout_ms  {}", config.request_timeout_ms());
            println!(
                "refresh_offset_ms   {}",
                config.runtime_session_refresh_offset_ms()
            );
            println!("network             {}", config.network_enabled());
            Ok(())
        }
    }
}

async fn watch(data_dir: &str, args: WatchArgs) -> anyhow::Result<()> {
    if args.tick_ms == 0 {
        bail!("--tick-ms must be greater than zero");
    }

    let mut config = load_app_config(data_dir);
    if apply_overrides(&mut config, &args) {
        save_app_config(data_dir, &config).context("persist config overrides")?;
    }

    let app = FfiApp::new(data_dir.to_string());
    app.set_haptic_device(Box::new(ConsoleHaptics));
    let (tx, mut updates) = tokio::sync::mpsc::unbounded_channel();
    app.listen_for_updates(Box::new(Forwarder { tx }));

    let (session_id, owned) = match args.session_id {
        Some(id) => (id, false),
        None => {
            let id = create_session(&app, &mut updates).await?;
            (id, true)
        }
    };

    app.dispatch(AppAction::StartPolling {
        session_id: session_id.clone(),
    });
    tracing::info!(session_id = %session_id, tick_ms = args.tick_ms, "watch: polling");

    let deadline = args
        .duration_secs
        .map(|secs| tokio::time::Instant::now() + Duration::from_secs(secs));
    let mut ticker = tokio::time::interval(Duration::from_millis(args.tick_ms));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut shown: Vec<ReactionRowView> = vec![];

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                app.dispatch(AppAction::Tick { now_ms: now_millis() });
            }
            update = updates.recv() => {
                let Some(update) = update else { break };
                if let AppUpdate::FullState(state) = update {
                    if state.reactions != shown {
                        println!("{}\n", render_rows(&state.reactions, now_millis()));
                        shown = state.reactions;
                    }
                    if matches!(state.poll, PollPhase::Stopped) {
                        break;
                    }
                }
            }
            _ = sleep_until(deadline) => {
                tracing::info!("watch: duration elapsed");
                break;
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("watch: interrupted");
                break;
            }
        }
    }

    if owned {
        app.dispatch(AppAction::EndSession);
        // The end request is best effort; give it a moment before the runtime goes away.
        tokio::time::sleep(END_SESSION_GRACE).await;
    } else {
        app.dispatch(AppAction::StopPolling);
    }
    Ok(())
}

/// Copies explicitly given flags into `config`. Returns whether anything changed.
fn apply_overrides(config: &mut AppConfig, args: &WatchArgs) -> bool {
    let before = config.clone();
    if let Some(url) = &args.base_url {
        config.base_url = Some(url.clone());
    }
    if let Some(ms) = args.pooling_window_ms {
        config.pooling_window_ms = Some(ms);
    }
    *config != before
}

async fn sleep_until(deadline: Option<tokio::time::Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

async fn create_session(
    app: &FfiApp,
    updates: &mut UnboundedReceiver<AppUpdate>,
) -> anyhow::Result<String> {
    app.dispatch(AppAction::CreateSession);
    let wait = async {
        while let Some(update) = updates.recv().await {
            match update {
                AppUpdate::SessionCreated {
                    session_id, link, ..
                } => {
                    println!("session {session_id}\njoin at {link}\n");
                    return Ok(session_id);
                }
                AppUpdate::FullState(state) => {
                    if let Some(alert) = state.alert {
                        return Err(anyhow!(alert));
                    }
                    if let SessionState::Active { session_id, .. } = state.session {
                        return Ok(session_id);
                    }
                }
            }
        }
        Err(anyhow!("core stopped before the session was created"))
    };
    tokio::time::timeout(SESSION_CREATE_TIMEOUT, wait)
        .await
        .context("timed out creating session")?
}
