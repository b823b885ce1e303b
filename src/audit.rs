//! Gameplay audit sessions: a timeline of match events for later review.
//!
//! The recorder observes the controller's event stream and forwards
//! sequence-numbered records to a [`SessionSink`] through a spawned task.
//! Persistence is fire-and-forget: a failed write is logged as a warning
//! and never rolls back into game state. Ordering within a session is by
//! sequence number, not arrival time.

use crate::controller::EngineEvent;
use crate::games::backgammon::Player;
use crate::players::{AiPreset, EvaluationTrace};
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

/// How a session is consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    /// A human is watching live (e.g. an AI-vs-AI exhibition).
    Observable,
    /// Unattended batch run for later aggregate analysis.
    Batch,
}

/// Audit configuration supplied at match start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Whether auditing is on at all.
    pub enabled: bool,
    /// Session mode.
    pub mode: SessionMode,
    /// Free-form operator notes.
    pub notes: Option<String>,
    /// Attach search evaluation traces to AI move events.
    pub enable_evaluation_logging: bool,
}

impl AuditConfig {
    /// An observable session with no evaluation logging.
    pub fn observable() -> Self {
        Self {
            enabled: true,
            mode: SessionMode::Observable,
            notes: None,
            enable_evaluation_logging: false,
        }
    }

    /// A batch session with no evaluation logging.
    pub fn batch() -> Self {
        Self {
            enabled: true,
            mode: SessionMode::Batch,
            notes: None,
            enable_evaluation_logging: false,
        }
    }

    /// Turns evaluation-trace logging on.
    pub fn with_evaluation_logging(mut self) -> Self {
        self.enable_evaluation_logging = true;
        self
    }

    /// Sets operator notes.
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// A recorded gameplay session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameplaySession {
    /// Unique session id.
    pub id: String,
    /// Session mode.
    pub mode: SessionMode,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Completion timestamp, once the match ends or is abandoned.
    pub completed_at: Option<DateTime<Utc>>,
    /// Games completed under this session.
    pub total_games: u32,
    /// Games won by White.
    pub white_wins: u32,
    /// Games won by Black.
    pub black_wins: u32,
    /// Preset of the White seat, when AI-controlled.
    pub white_ai_preset: Option<String>,
    /// Preset of the Black seat, when AI-controlled.
    pub black_ai_preset: Option<String>,
    /// Operator notes.
    pub notes: Option<String>,
}

/// One sequence-numbered entry in a session's timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionEvent {
    /// The owning session.
    pub session_id: String,
    /// Monotonically increasing within the session; defines ordering.
    pub sequence: u64,
    /// Wall-clock time the engine recorded the event.
    pub recorded_at: DateTime<Utc>,
    /// The engine event.
    pub event: EngineEvent,
    /// Search trace for AI moves, when evaluation logging is enabled.
    pub evaluation: Option<EvaluationTrace>,
}

/// Persistence boundary for session events. Durable storage is a
/// collaborator's concern; the engine only appends.
#[async_trait::async_trait]
pub trait SessionSink: Send + Sync {
    /// Appends one event to the session timeline.
    async fn append(&self, event: SessionEvent) -> anyhow::Result<()>;

    /// Marks the session complete with its final tallies.
    async fn complete(&self, session: GameplaySession) -> anyhow::Result<()> {
        debug!(session_id = %session.id, "Session completed (sink default)");
        Ok(())
    }
}

/// In-memory sink for tests and observable sessions.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    events: Arc<Mutex<Vec<SessionEvent>>>,
    completed: Arc<Mutex<Vec<GameplaySession>>>,
}

impl MemorySink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all appended events.
    pub fn events(&self) -> Vec<SessionEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Snapshot of completed sessions.
    pub fn completed(&self) -> Vec<GameplaySession> {
        self.completed.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl SessionSink for MemorySink {
    async fn append(&self, event: SessionEvent) -> anyhow::Result<()> {
        self.events
            .lock()
            .map_err(|_| anyhow::anyhow!("sink mutex poisoned"))?
            .push(event);
        Ok(())
    }

    async fn complete(&self, session: GameplaySession) -> anyhow::Result<()> {
        self.completed
            .lock()
            .map_err(|_| anyhow::anyhow!("sink mutex poisoned"))?
            .push(session);
        Ok(())
    }
}

/// Appends each record as one JSON line to a file. Suits batch sessions
/// whose timelines are analyzed offline.
#[derive(Debug, Clone)]
pub struct JsonLinesSink {
    path: std::path::PathBuf,
}

impl JsonLinesSink {
    /// Creates a sink appending to the given path. The file is created on
    /// first write.
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn append_line(&self, line: String) -> anyhow::Result<()> {
        use tokio::io::AsyncWriteExt;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.write_all(b"\n").await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl SessionSink for JsonLinesSink {
    async fn append(&self, event: SessionEvent) -> anyhow::Result<()> {
        self.append_line(serde_json::to_string(&event)?).await
    }

    async fn complete(&self, session: GameplaySession) -> anyhow::Result<()> {
        self.append_line(serde_json::to_string(&session)?).await
    }
}

enum RecorderMessage {
    Event(SessionEvent),
    Complete(GameplaySession),
}

/// Records a session's event timeline without ever blocking the engine.
pub struct AuditRecorder {
    session: GameplaySession,
    sequence: u64,
    evaluation_logging: bool,
    tx: mpsc::UnboundedSender<RecorderMessage>,
}

impl AuditRecorder {
    /// Creates a recorder and spawns its writer task on the current tokio
    /// runtime.
    #[instrument(skip(config, sink))]
    pub fn new(
        config: &AuditConfig,
        sink: Arc<dyn SessionSink>,
        white_ai_preset: Option<AiPreset>,
        black_ai_preset: Option<AiPreset>,
    ) -> Self {
        let session = GameplaySession {
            id: new_session_id(),
            mode: config.mode,
            created_at: Utc::now(),
            completed_at: None,
            total_games: 0,
            white_wins: 0,
            black_wins: 0,
            white_ai_preset: white_ai_preset.map(|p| p.to_string()),
            black_ai_preset: black_ai_preset.map(|p| p.to_string()),
            notes: config.notes.clone(),
        };
        info!(session_id = %session.id, mode = ?session.mode, "Audit session created");

        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(write_loop(rx, sink));

        Self {
            session,
            sequence: 0,
            evaluation_logging: config.enable_evaluation_logging,
            tx,
        }
    }

    /// The session being recorded.
    pub fn session(&self) -> &GameplaySession {
        &self.session
    }

    /// Whether AI move events should carry evaluation traces.
    pub fn evaluation_logging(&self) -> bool {
        self.evaluation_logging
    }

    /// Records one engine event. Fire-and-forget: failures to enqueue are
    /// warnings, never errors.
    pub fn record(&mut self, event: &EngineEvent, evaluation: Option<EvaluationTrace>) {
        if let EngineEvent::GameOver { winner, .. } = event {
            self.session.total_games += 1;
            match winner {
                Player::White => self.session.white_wins += 1,
                Player::Black => self.session.black_wins += 1,
            }
        }

        self.sequence += 1;
        let record = SessionEvent {
            session_id: self.session.id.clone(),
            sequence: self.sequence,
            recorded_at: Utc::now(),
            event: event.clone(),
            evaluation: if self.evaluation_logging { evaluation } else { None },
        };
        if self.tx.send(RecorderMessage::Event(record)).is_err() {
            warn!(session_id = %self.session.id, "Recorder task gone; event dropped");
        }
    }

    /// Marks the session complete and notifies the sink. Idempotent.
    #[instrument(skip(self), fields(session_id = %self.session.id))]
    pub fn complete(&mut self) {
        if self.session.completed_at.is_some() {
            return;
        }
        self.session.completed_at = Some(Utc::now());
        info!(
            total_games = self.session.total_games,
            white_wins = self.session.white_wins,
            black_wins = self.session.black_wins,
            "Audit session completed"
        );
        if self
            .tx
            .send(RecorderMessage::Complete(self.session.clone()))
            .is_err()
        {
            warn!(session_id = %self.session.id, "Recorder task gone; completion dropped");
        }
    }
}

async fn write_loop(
    mut rx: mpsc::UnboundedReceiver<RecorderMessage>,
    sink: Arc<dyn SessionSink>,
) {
    while let Some(message) = rx.recv().await {
        match message {
            RecorderMessage::Event(event) => {
                let session_id = event.session_id.clone();
                let sequence = event.sequence;
                if let Err(err) = sink.append(event).await {
                    warn!(%session_id, sequence, error = %err, "Audit write failed");
                }
            }
            RecorderMessage::Complete(session) => {
                let session_id = session.id.clone();
                if let Err(err) = sink.complete(session).await {
                    warn!(%session_id, error = %err, "Audit completion write failed");
                }
            }
        }
    }
    debug!("Audit writer task finished");
}

fn new_session_id() -> String {
    let mut rng = rand::thread_rng();
    format!(
        "session-{}-{:04x}",
        Utc::now().timestamp_millis(),
        rng.gen_range(0u16..=0xffff)
    )
}
