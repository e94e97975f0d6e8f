use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use touchguard::kernel::session::{Session, SessionPhase, UserAction};
use touchguard::outputs::{
    AlertCue, CommandCue, CommandNotifier, LogNotifier, LogUi, Notifier, Outputs,
    ThrottledNotifier, TimedCue,
};
use touchguard::vision::{
    FeatureExtractor, PerceptualHashExtractor, SnapshotFileSource, ThumbnailExtractor,
};
use touchguard::SessionConfig;

// Console commands (never reach the kernel directly)
enum Command {
    Next,
    Action(UserAction),
    Quit,
}

fn parse_command(line: &str) -> Option<Command> {
    match line.trim().to_ascii_lowercase().as_str() {
        "" | "next" => Some(Command::Next),
        "away" | "not-touched" => Some(Command::Action(UserAction::CollectNotTouched)),
        "touch" | "touched" => Some(Command::Action(UserAction::CollectTouched)),
        "start" => Some(Command::Action(UserAction::StartMonitoring)),
        "quit" | "exit" | "q" => Some(Command::Quit),
        _ => None,
    }
}

fn load_config() -> anyhow::Result<SessionConfig> {
    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("TOUCHGUARD_CONFIG").ok());
    match path {
        Some(path) => SessionConfig::from_json_file(path),
        None => Ok(SessionConfig::default()),
    }
}

fn build_cue() -> anyhow::Result<Arc<dyn AlertCue>> {
    if let Ok(cmd) = std::env::var("TOUCHGUARD_CUE_CMD") {
        let mut parts = cmd.split_whitespace().map(str::to_string);
        let program = parts.next().context("TOUCHGUARD_CUE_CMD is empty")?;
        return Ok(Arc::new(CommandCue::new(program, parts.collect())));
    }
    if let Ok(path) = std::env::var("TOUCHGUARD_CUE_WAV") {
        let cue = TimedCue::from_wav(&path).with_context(|| format!("reading cue {}", path))?;
        return Ok(Arc::new(cue));
    }
    Ok(Arc::new(TimedCue::new(Duration::from_millis(1500))))
}

fn build_notifier(config: &SessionConfig) -> Arc<dyn Notifier> {
    let cooldown = config.notification_cooldown();
    match std::env::var("TOUCHGUARD_NOTIFY").as_deref() {
        Ok("log") => Arc::new(ThrottledNotifier::new(LogNotifier, cooldown)),
        _ => Arc::new(ThrottledNotifier::new(CommandNotifier::default(), cooldown)),
    }
}

fn build_extractor() -> Arc<dyn FeatureExtractor> {
    match std::env::var("TOUCHGUARD_EXTRACTOR").as_deref() {
        Ok("hash") => Arc::new(PerceptualHashExtractor::new()),
        _ => Arc::new(ThumbnailExtractor::default()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Setup Logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")?;

    tracing::info!("Starting touchguard...");

    // 2. Collaborators
    let config = load_config()?;
    let frame_path =
        std::env::var("TOUCHGUARD_FRAME").unwrap_or_else(|_| "latest.jpg".to_string());
    let source = Arc::new(SnapshotFileSource::new(&frame_path));
    let outputs = Outputs::new(build_cue()?, build_notifier(&config), Arc::new(LogUi));

    let mut session = Session::new(config, source, build_extractor(), outputs)?;
    tracing::info!(
        session = %session.id(),
        "{} examples per phase, touch threshold {}",
        session.config().examples_per_phase,
        session.config().touch_threshold
    );

    // 3. Camera + model; stays in Init on failure
    if let Err(e) = session.initialize().await {
        tracing::warn!("Setup failed (frames from {}): {}", frame_path, e);
        println!("Setup failed. Press <enter> to retry.");
    }

    // 4. Console input
    let (tx, mut rx) = mpsc::channel(16);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            match parse_command(&line) {
                Some(cmd) => {
                    if tx.send(cmd).await.is_err() {
                        break;
                    }
                }
                None => println!("Commands: <enter>/next, away, touch, start, quit"),
            }
        }
    });

    println!("Press <enter> to run the next step, 'quit' to stop.");

    // 5. Drive the session
    loop {
        let cmd = tokio::select! {
            cmd = rx.recv() => cmd.unwrap_or(Command::Quit),
            _ = tokio::signal::ctrl_c() => Command::Quit,
        };

        let action = match cmd {
            Command::Quit => break,
            Command::Action(action) => action,
            Command::Next if session.phase() == SessionPhase::Init => {
                if let Err(e) = session.initialize().await {
                    tracing::warn!("Setup failed (frames from {}): {}", frame_path, e);
                }
                continue;
            }
            Command::Next => match session.valid_actions().first() {
                Some(action) => *action,
                None => {
                    println!("Nothing to do in phase {:?}", session.phase());
                    continue;
                }
            },
        };

        // Training takes seconds; keep ctrl-c live meanwhile
        let result = tokio::select! {
            result = session.handle(action) => result,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted during {:?}", action);
                break;
            }
        };
        if let Err(e) = result {
            tracing::warn!("{}", e);
        }
    }

    // 6. Teardown
    let id = session.id();
    let telemetry = session.telemetry().clone();
    if let Some(report) = session.shutdown().await? {
        tracing::info!("Inference: {}", serde_json::to_string(&report)?);
    }
    tracing::info!(session = %id, "Telemetry: {}", serde_json::to_string(&telemetry.snapshot())?);
    Ok(())
}
