use super::config::InterviewConfig;
use super::events::{CompletionReason, OutboundEvent, SessionEvent, Stage};
use super::status::SessionStatus;
use super::transcript::{Speaker, Transcript, TranscriptEntry};
use super::warning::{self, SentWarnings, WarningKind, WarningSchedule};
use crate::connector::{Connector, ConnectorEvent, ConnectorFrame};
use crate::error::SessionError;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch, Mutex, RwLock};
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

type OutboundSender = broadcast::Sender<OutboundEvent>;

/// Session timing. `started_at` is set exactly once, on the first
/// successful engine handshake; `frozen` pins the final elapsed value
/// on entry to the terminal stage.
#[derive(Debug, Default)]
struct Timing {
    started_at: Option<Instant>,
    frozen: Option<Duration>,
}

async fn current_elapsed(timing: &RwLock<Timing>) -> Duration {
    let t = timing.read().await;
    if let Some(frozen) = t.frozen {
        return frozen;
    }
    match t.started_at {
        Some(started) => started.elapsed(),
        None => Duration::ZERO,
    }
}

async fn emit(outbound: &RwLock<Option<OutboundSender>>, event: OutboundEvent) {
    if let Some(tx) = outbound.read().await.as_ref() {
        // Err means no live subscribers, which is fine.
        let _ = tx.send(event);
    }
}

async fn set_stage(stage: &RwLock<Stage>, outbound: &RwLock<Option<OutboundSender>>, next: Stage) {
    {
        let mut current = stage.write().await;
        *current = next;
    }
    emit(outbound, OutboundEvent::StageChanged { stage: next }).await;
}

/// Resources handed to the driver task on `start()`. Held here so the
/// public handle stays cheaply shareable.
struct Startup {
    connector: Box<dyn Connector>,
    events_rx: mpsc::Receiver<SessionEvent>,
    completed_tx: watch::Sender<bool>,
}

/// One interview's full lifecycle.
///
/// The handle is shared across transport connections; all state
/// mutation happens on a single driver task spawned by `start()`, so
/// event processing is serialized without fine-grained locking. The
/// shared fields exist only to serve read-side status queries.
pub struct Session {
    config: InterviewConfig,
    stage: Arc<RwLock<Stage>>,
    timing: Arc<RwLock<Timing>>,
    question_count: Arc<AtomicU32>,
    connected: Arc<AtomicBool>,
    transcript: Arc<Transcript>,
    events_tx: mpsc::Sender<SessionEvent>,
    outbound: Arc<RwLock<Option<OutboundSender>>>,
    cancel: CancellationToken,
    completed_rx: watch::Receiver<bool>,
    startup: Mutex<Option<Startup>>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("session_id", &self.config.session_id)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Create a session around an unconnected engine connector. The
    /// config snapshot is immutable from here on.
    pub fn new(config: InterviewConfig, connector: Box<dyn Connector>) -> Arc<Self> {
        let (events_tx, events_rx) = mpsc::channel(256);
        let (completed_tx, completed_rx) = watch::channel(false);
        let (outbound_tx, _) = broadcast::channel(256);

        Arc::new(Self {
            config,
            stage: Arc::new(RwLock::new(Stage::PreStart)),
            timing: Arc::new(RwLock::new(Timing::default())),
            question_count: Arc::new(AtomicU32::new(0)),
            connected: Arc::new(AtomicBool::new(false)),
            transcript: Arc::new(Transcript::new()),
            events_tx,
            outbound: Arc::new(RwLock::new(Some(outbound_tx))),
            cancel: CancellationToken::new(),
            completed_rx,
            startup: Mutex::new(Some(Startup {
                connector,
                events_rx,
                completed_tx,
            })),
        })
    }

    pub fn id(&self) -> &str {
        &self.config.session_id
    }

    pub fn config(&self) -> &InterviewConfig {
        &self.config
    }

    /// Establish the engine connection, start the clock, and spawn the
    /// driver. A handshake failure leaves the session terminal; callers
    /// create a new session instead of retrying this one.
    pub async fn start(&self) -> Result<(), SessionError> {
        let startup = {
            let mut slot = self.startup.lock().await;
            slot.take()
        };
        let Some(mut startup) = startup else {
            return Err(SessionError::AlreadyStarted(self.id().to_string()));
        };

        info!(session_id = %self.id(), "Starting interview session");

        let engine_rx = match time::timeout(
            self.config.connect_timeout(),
            startup.connector.connect(),
        )
        .await
        {
            Ok(Ok(rx)) => rx,
            Ok(Err(e)) => {
                self.abort_startup(&startup).await;
                return Err(SessionError::ConnectorInit(format!("{e:#}")));
            }
            Err(_) => {
                self.abort_startup(&startup).await;
                return Err(SessionError::ConnectorInit(format!(
                    "handshake timed out after {}s",
                    self.config.connect_timeout_secs
                )));
            }
        };

        self.connected.store(true, Ordering::SeqCst);
        {
            let mut timing = self.timing.write().await;
            timing.started_at = Some(Instant::now());
        }
        set_stage(&self.stage, &self.outbound, Stage::Greeting).await;

        // Hand the model its interviewer instructions; a failure here
        // will also surface as an Error event on the engine stream.
        if let Err(e) = startup
            .connector
            .send(ConnectorFrame::Text(self.config.model.system_prompt.clone()))
            .await
        {
            warn!(session_id = %self.id(), "Failed to send session instructions: {e:#}");
        }

        self.spawn_engine_pump(engine_rx);
        let tick_rx = self.spawn_tick_task();

        let driver = Driver {
            config: self.config.clone(),
            connector: startup.connector,
            events_rx: startup.events_rx,
            tick_rx,
            events_tx: self.events_tx.clone(),
            stage: Arc::clone(&self.stage),
            timing: Arc::clone(&self.timing),
            question_count: Arc::clone(&self.question_count),
            connected: Arc::clone(&self.connected),
            transcript: Arc::clone(&self.transcript),
            outbound: Arc::clone(&self.outbound),
            cancel: self.cancel.clone(),
            completed_tx: startup.completed_tx,
            schedule: self.config.warning_schedule(),
            warnings: SentWarnings::default(),
            early_completion_armed: false,
            done: false,
        };
        tokio::spawn(driver.run());

        info!(
            session_id = %self.id(),
            scheduled_duration_secs = self.config.scheduled_duration_secs,
            "Interview session started"
        );
        Ok(())
    }

    /// Candidate audio from the transport layer. Enqueues and returns;
    /// frames arriving after completion are dropped.
    pub async fn push_audio(&self, bytes: Vec<u8>) {
        if self
            .events_tx
            .send(SessionEvent::AudioFrame(bytes))
            .await
            .is_err()
        {
            debug!(session_id = %self.id(), "Dropping audio frame for completed session");
        }
    }

    /// Normal end requested by the candidate or interviewer.
    pub async fn end(&self) {
        self.request_completion(CompletionReason::Finished).await;
    }

    /// Request completion with an explicit reason. Idempotent: once the
    /// session is terminal, further requests are no-ops.
    pub async fn request_completion(&self, reason: CompletionReason) {
        // A session that never started has no driver task to process
        // the event; finalize it inline so waiters are not stranded.
        {
            let mut slot = self.startup.lock().await;
            if let Some(startup) = slot.take() {
                self.finalize_unstarted(&startup, reason).await;
                return;
            }
        }
        if self
            .events_tx
            .send(SessionEvent::Complete(reason))
            .await
            .is_err()
        {
            debug!(session_id = %self.id(), "Completion request after terminal stage ignored");
        }
    }

    /// Subscribe to the session's outbound event stream. The stream
    /// closes for all subscribers when the session completes.
    pub async fn subscribe(&self) -> broadcast::Receiver<OutboundEvent> {
        match self.outbound.read().await.as_ref() {
            Some(tx) => tx.subscribe(),
            None => {
                let (tx, rx) = broadcast::channel(1);
                drop(tx);
                rx
            }
        }
    }

    pub async fn status(&self) -> SessionStatus {
        SessionStatus {
            session_id: self.id().to_string(),
            stage: *self.stage.read().await,
            elapsed_secs: current_elapsed(&self.timing).await.as_secs(),
            scheduled_duration_secs: self.config.scheduled_duration_secs,
            question_count: self.question_count.load(Ordering::SeqCst),
            connected: self.connected.load(Ordering::SeqCst),
            transcript: self.transcript.snapshot().await,
        }
    }

    pub async fn stage(&self) -> Stage {
        *self.stage.read().await
    }

    pub async fn transcript(&self) -> Vec<TranscriptEntry> {
        self.transcript.snapshot().await
    }

    pub fn is_completed(&self) -> bool {
        *self.completed_rx.borrow()
    }

    /// Wait until the session reaches its terminal stage.
    pub async fn wait_completed(&self) {
        let mut rx = self.completed_rx.clone();
        while !*rx.borrow() {
            if rx.changed().await.is_err() {
                break;
            }
        }
    }

    /// Handshake failed: pin the session in its terminal stage so the
    /// registry can reap it.
    async fn abort_startup(&self, startup: &Startup) {
        self.finalize_unstarted(startup, CompletionReason::Error)
            .await;
    }

    /// Terminal transition for a session whose driver never ran. The
    /// clock never started, so elapsed freezes at zero.
    async fn finalize_unstarted(&self, startup: &Startup, reason: CompletionReason) {
        {
            let mut timing = self.timing.write().await;
            timing.frozen = Some(Duration::ZERO);
        }
        set_stage(&self.stage, &self.outbound, Stage::Completed(reason)).await;
        let _ = startup.completed_tx.send(true);
        self.cancel.cancel();
        let mut outbound = self.outbound.write().await;
        *outbound = None;
    }

    /// Forward engine events into the session's single inbound queue.
    fn spawn_engine_pump(&self, mut engine_rx: mpsc::Receiver<ConnectorEvent>) {
        let events_tx = self.events_tx.clone();
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    event = engine_rx.recv() => match event {
                        Some(event) => {
                            if events_tx.send(SessionEvent::Connector(event)).await.is_err() {
                                break;
                            }
                        }
                        None => break,
                    },
                }
            }
        });
    }

    /// Ticks travel on their own channel so the timeout check is never
    /// starved by a backlog of engine events.
    fn spawn_tick_task(&self) -> mpsc::Receiver<()> {
        let (tick_tx, tick_rx) = mpsc::channel(4);
        let interval_duration = self.config.tick_interval();
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            let mut interval = time::interval(interval_duration);
            // The first interval tick fires immediately; skip it.
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = interval.tick() => {
                        // A full channel means the driver already has
                        // ticks queued; the next one recomputes anyway.
                        let _ = tick_tx.try_send(());
                    }
                }
            }
        });
        tick_rx
    }
}

/// The single task that owns all session state transitions.
struct Driver {
    config: InterviewConfig,
    connector: Box<dyn Connector>,
    events_rx: mpsc::Receiver<SessionEvent>,
    tick_rx: mpsc::Receiver<()>,
    events_tx: mpsc::Sender<SessionEvent>,
    stage: Arc<RwLock<Stage>>,
    timing: Arc<RwLock<Timing>>,
    question_count: Arc<AtomicU32>,
    connected: Arc<AtomicBool>,
    transcript: Arc<Transcript>,
    outbound: Arc<RwLock<Option<OutboundSender>>>,
    cancel: CancellationToken,
    completed_tx: watch::Sender<bool>,
    schedule: WarningSchedule,
    warnings: SentWarnings,
    early_completion_armed: bool,
    done: bool,
}

impl Driver {
    async fn run(mut self) {
        debug!(session_id = %self.config.session_id, "Session driver started");
        while !self.done {
            tokio::select! {
                biased;
                tick = self.tick_rx.recv() => {
                    if tick.is_some() {
                        self.handle_tick().await;
                    }
                }
                event = self.events_rx.recv() => match event {
                    Some(event) => self.handle_event(event).await,
                    None => break,
                },
            }
        }
        debug!(session_id = %self.config.session_id, "Session driver stopped");
    }

    async fn handle_tick(&mut self) {
        if self.done {
            return;
        }

        let elapsed_secs = current_elapsed(&self.timing).await.as_secs();
        let scheduled = self.config.scheduled_duration_secs;
        self.emit(OutboundEvent::TimeUpdate {
            elapsed_secs,
            remaining_secs: scheduled.saturating_sub(elapsed_secs),
            percent: elapsed_secs as f64 * 100.0 / scheduled as f64,
        })
        .await;

        // Hard safety net: bounds cost and candidate time regardless of
        // stage or engine behavior.
        if elapsed_secs >= scheduled {
            self.complete(CompletionReason::Timeout).await;
            return;
        }

        if *self.stage.read().await != Stage::Questions {
            return;
        }
        for kind in warning::due(&self.schedule, &self.warnings, elapsed_secs) {
            self.warnings.mark(kind);
            let script = match kind {
                WarningKind::First => self.config.scripts.first_warning.clone(),
                WarningKind::Final => self.config.scripts.final_warning.clone(),
            };
            if let Err(e) = self.connector.send(ConnectorFrame::Text(script)).await {
                self.fail(format!("failed to deliver time warning: {e:#}")).await;
                return;
            }
            info!(session_id = %self.config.session_id, ?kind, elapsed_secs, "Time warning delivered");
            self.emit(OutboundEvent::TimeWarning { kind }).await;
        }
    }

    async fn handle_event(&mut self, event: SessionEvent) {
        if self.done {
            return;
        }
        match event {
            SessionEvent::AudioFrame(bytes) => {
                if let Err(e) = self.connector.send(ConnectorFrame::Audio(bytes)).await {
                    self.fail(format!("failed to forward candidate audio: {e:#}")).await;
                }
            }
            SessionEvent::Connector(event) => self.handle_connector_event(event).await,
            SessionEvent::Complete(reason) => self.complete(reason).await,
        }
    }

    async fn handle_connector_event(&mut self, event: ConnectorEvent) {
        match event {
            ConnectorEvent::AudioOut(bytes) => {
                self.emit(OutboundEvent::AudioOut { data: bytes }).await;
            }
            ConnectorEvent::TextOut {
                speaker,
                text,
                confidence,
            } => {
                let is_question = speaker == Speaker::Ai && text.contains('?');
                self.transcribe(speaker, text, confidence).await;
                if is_question && *self.stage.read().await == Stage::Questions {
                    let count = self.question_count.fetch_add(1, Ordering::SeqCst) + 1;
                    debug!(
                        session_id = %self.config.session_id,
                        question_count = count,
                        total_questions = self.config.total_questions,
                        "AI question counted"
                    );
                    if count >= self.config.total_questions && !self.early_completion_armed {
                        self.early_completion_armed = true;
                        self.arm_early_completion();
                    }
                }
            }
            ConnectorEvent::TurnComplete => {
                if *self.stage.read().await == Stage::Greeting {
                    self.set_stage(Stage::Questions).await;
                }
            }
            ConnectorEvent::Error(message) => self.fail(message).await,
        }
    }

    /// Question budget exhausted: leave a final window for the
    /// candidate to respond, then close out the remaining time.
    fn arm_early_completion(&self) {
        let grace = self.config.early_completion_grace();
        let events_tx = self.events_tx.clone();
        let cancel = self.cancel.clone();
        info!(
            session_id = %self.config.session_id,
            grace_secs = grace.as_secs(),
            "Question budget exhausted, scheduling early completion"
        );
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = time::sleep(grace) => {
                    let _ = events_tx
                        .send(SessionEvent::Complete(CompletionReason::EarlyCompletion))
                        .await;
                }
            }
        });
    }

    /// Engine failure path: report once, then degrade to the terminal
    /// stage. Never reconnects and never panics the process.
    async fn fail(&mut self, message: String) {
        error!(session_id = %self.config.session_id, "Session error: {message}");
        self.emit(OutboundEvent::SessionError { message }).await;
        self.connected.store(false, Ordering::SeqCst);
        self.complete(CompletionReason::Error).await;
    }

    /// Terminal transition. Idempotent: the first call wins, later
    /// calls (and any queued Complete events) are no-ops.
    async fn complete(&mut self, reason: CompletionReason) {
        if self.done {
            return;
        }
        self.done = true;
        info!(session_id = %self.config.session_id, ?reason, "Completing session");

        {
            let mut timing = self.timing.write().await;
            let final_elapsed = timing
                .started_at
                .map(|started| started.elapsed())
                .unwrap_or_default();
            timing.frozen = Some(final_elapsed);
        }

        let script = match reason {
            CompletionReason::Finished | CompletionReason::Shutdown => {
                Some(self.config.scripts.standard_closing.clone())
            }
            CompletionReason::Timeout => Some(self.config.scripts.time_expired_closing.clone()),
            CompletionReason::EarlyCompletion => {
                Some(self.config.scripts.early_completion_closing.clone())
            }
            // The engine is gone; there is nobody to read a script to.
            CompletionReason::Error => None,
        };

        if let Some(script) = script {
            if self.connected.load(Ordering::SeqCst) {
                self.set_stage(Stage::WrappingUp).await;
                match self.connector.send(ConnectorFrame::Text(script)).await {
                    Ok(()) => self.await_final_utterance().await,
                    Err(e) => {
                        warn!(
                            session_id = %self.config.session_id,
                            "Closing script not delivered, skipping grace wait: {e:#}"
                        );
                    }
                }
                self.set_stage(Stage::SignOff).await;
            }
        }

        if let Err(e) = self.connector.close().await {
            warn!(session_id = %self.config.session_id, "Connector close failed: {e:#}");
        }
        self.connected.store(false, Ordering::SeqCst);
        self.cancel.cancel();

        self.set_stage(Stage::Completed(reason)).await;
        let _ = self.completed_tx.send(true);

        // Dropping the only sender closes every outbound subscription.
        {
            let mut outbound = self.outbound.write().await;
            *outbound = None;
        }

        info!(session_id = %self.config.session_id, ?reason, "Session completed");
    }

    /// Bounded grace wait for the engine's sign-off after the closing
    /// script. Late utterances arriving in the window still make the
    /// transcript.
    async fn await_final_utterance(&mut self) {
        let deadline = Instant::now() + self.config.closing_grace();
        loop {
            match time::timeout_at(deadline, self.events_rx.recv()).await {
                Ok(Some(SessionEvent::Connector(event))) => match event {
                    ConnectorEvent::AudioOut(bytes) => {
                        self.emit(OutboundEvent::AudioOut { data: bytes }).await;
                    }
                    ConnectorEvent::TextOut {
                        speaker,
                        text,
                        confidence,
                    } => {
                        self.transcribe(speaker, text, confidence).await;
                    }
                    ConnectorEvent::TurnComplete => break,
                    ConnectorEvent::Error(message) => {
                        warn!(
                            session_id = %self.config.session_id,
                            "Engine failed during sign-off: {message}"
                        );
                        self.connected.store(false, Ordering::SeqCst);
                        break;
                    }
                },
                // Audio frames and duplicate completion requests are
                // moot once the terminal transition is underway.
                Ok(Some(_)) => {}
                Ok(None) => break,
                Err(_) => break,
            }
        }
    }

    async fn transcribe(&self, speaker: Speaker, text: String, confidence: f32) {
        let timestamp_secs = current_elapsed(&self.timing).await.as_secs();
        let entry = self
            .transcript
            .append(speaker, text, confidence, timestamp_secs)
            .await;
        self.emit(OutboundEvent::TranscriptAppended { entry }).await;
    }

    async fn set_stage(&self, next: Stage) {
        set_stage(&self.stage, &self.outbound, next).await;
    }

    async fn emit(&self, event: OutboundEvent) {
        emit(&self.outbound, event).await;
    }
}
