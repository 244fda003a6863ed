//! Replay tool: runs a recorded room session through the client core and prints the final
//! snapshot.

use std::{env, fs, path::PathBuf, rc::Rc, sync::Arc};

use anyhow::{Context, bail};
use serde::Deserialize;
use tokio::sync::mpsc::unbounded_channel;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quiz_buzzer_client::{
    config::ClientConfig,
    services,
    state::{
        game::{Participant, Quiz},
        session::{Session, SharedRoster},
    },
    transport::{MpscChannel, mpsc::pump},
};

#[derive(Debug, Deserialize)]
/// JSON representation of a replay script.
struct ReplayScript {
    /// Participant whose point of view is replayed.
    session: Participant,
    #[serde(default)]
    roster: Vec<Participant>,
    #[serde(default)]
    quizzes: Vec<Quiz>,
    /// Raw inbound frames, in delivery order.
    frames: Vec<serde_json::Value>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let Some(path) = env::args_os().nth(1).map(PathBuf::from) else {
        bail!("usage: quiz-buzzer-client <script.json>");
    };
    let contents = fs::read_to_string(&path)
        .with_context(|| format!("reading replay script {}", path.display()))?;
    let script: ReplayScript =
        serde_json::from_str(&contents).context("parsing replay script")?;

    let config = Arc::new(ClientConfig::load());
    let roster = SharedRoster::from_participants(script.roster);
    roster.upsert(script.session.clone());

    let (outbound_tx, mut outbound_rx) = unbounded_channel();
    let channel = Rc::new(MpscChannel::new(outbound_tx));
    let client = services::connect(
        Session::new(script.session),
        Arc::new(roster),
        channel.clone(),
        script.quizzes,
        config,
    );

    let (inbound_tx, inbound_rx) = unbounded_channel();
    for frame in &script.frames {
        inbound_tx
            .send(frame.to_string())
            .context("queueing replay frame")?;
    }
    drop(inbound_tx);

    let dispatched = pump(&channel, inbound_rx).await;
    info!(frames = script.frames.len(), dispatched, "replay finished");
    while let Ok(frame) = outbound_rx.try_recv() {
        info!(%frame, "outbound frame");
    }

    let snapshot =
        serde_json::to_string_pretty(&client.snapshot()).context("serializing snapshot")?;
    println!("{snapshot}");
    Ok(())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
