use std::sync::{Arc, LazyLock};
use std::time::Duration;

use chrono::Utc;
use regex::Regex;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::request::ValidatedRequest;
use super::settings::SessionSettings;
use super::state::SessionPhase;
use super::view::SessionView;
use crate::errors::ScanwatchError;
use crate::events::{PollEvent, StreamEvent, Tagged};
use crate::metrics::{recompute, SampleSeries};
use crate::models::{ScanResult, ToolName};
use crate::poll::{PollFallback, PollScope, ResultsFetcher};
use crate::store::ResultStore;
use crate::stream::{Connector, StreamTransport};

static LOG_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[(?P<tool>[^\]]+)\]\s?(?P<rest>.*)$").expect("valid log prefix pattern"));

/// Everything the session loop consumes, funnelled through one channel.
#[derive(Debug)]
pub enum SessionInput {
    Stream(Tagged<StreamEvent>),
    Poll(Tagged<PollEvent>),
    /// Outcome of a one-shot catch-up fetch, started on (re)connect and on each
    /// catch-up tick while streaming.
    Reconciled(Tagged<Result<Vec<ScanResult>, String>>),
}

impl From<Tagged<StreamEvent>> for SessionInput {
    fn from(tagged: Tagged<StreamEvent>) -> Self {
        SessionInput::Stream(tagged)
    }
}

impl From<Tagged<PollEvent>> for SessionInput {
    fn from(tagged: Tagged<PollEvent>) -> Self {
        SessionInput::Poll(tagged)
    }
}

/// Coordinates stream and poll ingestion for one scan and owns its results.
///
/// All mutation happens in [`ScanSession::handle`], one input at a time. Inputs
/// whose epoch differs from the session's current epoch are discarded.
pub struct ScanSession<C: Connector, F: ResultsFetcher + ?Sized> {
    request: ValidatedRequest,
    settings: SessionSettings,
    fetcher: Arc<F>,
    transport: StreamTransport<C, SessionInput>,
    inbox: mpsc::UnboundedReceiver<SessionInput>,
    outbox: mpsc::UnboundedSender<SessionInput>,
    store: ResultStore,
    samples: SampleSeries,
    feed: Vec<String>,
    phase: SessionPhase,
    epoch: u64,
    progress: f64,
    poll_cancel: Option<CancellationToken>,
    reconcile_in_flight: bool,
    degraded: bool,
    notice: Option<String>,
    view_tx: watch::Sender<SessionView>,
}

impl<C, F> ScanSession<C, F>
where
    C: Connector,
    F: ResultsFetcher + ?Sized,
{
    pub fn new(request: ValidatedRequest, settings: SessionSettings, connector: Arc<C>, fetcher: Arc<F>) -> Self {
        let (outbox, inbox) = mpsc::unbounded_channel();
        let transport = StreamTransport::new(connector, settings.reconnect, outbox.clone());
        let store = ResultStore::new(request.tools().len());
        let (view_tx, _) = watch::channel(SessionView {
            project_id: request.project_id().to_string(),
            scan_id: request.scan_id().to_string(),
            phase: SessionPhase::Initializing,
            logs: Vec::new(),
            results: Vec::new(),
            aggregated: recompute(&[]),
            samples: Vec::new(),
            progress_percent: 0.0,
            is_complete: false,
            degraded: false,
            notice: None,
            dropped_frames: 0,
        });

        Self {
            request,
            settings,
            fetcher,
            transport,
            inbox,
            outbox,
            store,
            samples: SampleSeries::new(),
            feed: Vec::new(),
            phase: SessionPhase::Initializing,
            epoch: 0,
            progress: 0.0,
            poll_cancel: None,
            reconcile_in_flight: false,
            degraded: false,
            notice: None,
            view_tx,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn store(&self) -> &ResultStore {
        &self.store
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.view_tx.subscribe()
    }

    /// Build the current read-only projection.
    pub fn view(&self) -> SessionView {
        let results = self.store.all();
        SessionView {
            project_id: self.request.project_id().to_string(),
            scan_id: self.request.scan_id().to_string(),
            phase: self.phase,
            logs: self.feed.clone(),
            aggregated: recompute(&results),
            results,
            samples: self.samples.as_slice().to_vec(),
            progress_percent: self.progress,
            is_complete: self.phase == SessionPhase::Completed,
            degraded: self.degraded,
            notice: self.notice.clone(),
            dropped_frames: self.transport.dropped_frames(),
        }
    }

    /// Leave `Initializing` and attach the live stream.
    pub fn start(&mut self) {
        if self.phase != SessionPhase::Initializing {
            return;
        }
        self.bump_epoch();
        info!(
            project_id = %self.request.project_id(),
            scan_id = %self.request.scan_id(),
            tools = self.request.tools().len(),
            epoch = self.epoch,
            "Session streaming"
        );
        self.transport.open(self.request.scan_id(), self.epoch);
        self.phase = SessionPhase::Streaming;
        self.publish();
    }

    /// Tear the session down: stop both producers and discard anything still queued.
    pub fn close(&mut self) {
        self.transport.close();
        if let Some(token) = self.poll_cancel.take() {
            token.cancel();
        }
        self.reconcile_in_flight = false;
        self.bump_epoch();
        debug!(scan_id = %self.request.scan_id(), epoch = self.epoch, "Session closed");
    }

    pub fn handle(&mut self, input: SessionInput) {
        if self.phase == SessionPhase::Completed {
            return;
        }
        match input {
            SessionInput::Stream(Tagged { epoch, event }) => {
                if self.is_stale(epoch, "stream") {
                    return;
                }
                self.on_stream(event);
            }
            SessionInput::Poll(Tagged { epoch, event }) => {
                if self.is_stale(epoch, "poll") {
                    return;
                }
                self.on_poll(event);
            }
            SessionInput::Reconciled(Tagged { epoch, event }) => {
                if self.is_stale(epoch, "reconcile") {
                    return;
                }
                self.on_reconciled(event);
            }
        }
    }

    /// Fetch once from the results service while the stream is open.
    ///
    /// Covers streams that stay connected but never deliver a `complete`
    /// frame. No-op outside `Streaming` or while a catch-up fetch is in flight.
    pub fn catch_up(&mut self) {
        if self.phase != SessionPhase::Streaming || self.reconcile_in_flight {
            return;
        }
        debug!(scan_id = %self.request.scan_id(), "Periodic catch-up fetch");
        self.start_reconcile();
        self.publish();
    }

    /// Run the session loop until it completes or `cancel` fires.
    ///
    /// While streaming, a catch-up fetch runs every poll interval.
    pub async fn run(mut self, cancel: CancellationToken) -> SessionView {
        let period = self.settings.poll.interval.max(Duration::from_millis(1));
        let mut catch_up = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        catch_up.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        self.start();
        while self.phase != SessionPhase::Completed {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    self.close();
                    break;
                }
                input = self.inbox.recv() => match input {
                    Some(input) => self.handle(input),
                    None => break,
                },
                _ = catch_up.tick() => self.catch_up(),
            }
        }
        self.view()
    }

    pub fn spawn(self) -> SessionHandle {
        let cancel = CancellationToken::new();
        let view = self.subscribe();
        let task = tokio::spawn(self.run(cancel.clone()));
        SessionHandle { view, cancel, task }
    }

    fn is_stale(&self, epoch: u64, source: &str) -> bool {
        if epoch != self.epoch {
            debug!(source, event_epoch = epoch, current_epoch = self.epoch, "Discarding stale input");
            return true;
        }
        false
    }

    fn on_stream(&mut self, event: StreamEvent) {
        match event {
            StreamEvent::Connected { attempt } => {
                debug!(attempt, "Stream connected; reconciling");
                self.start_reconcile();
                self.publish();
            }
            StreamEvent::Log(line) => {
                self.record_log(line);
                self.after_mutation();
            }
            StreamEvent::ResultUpdate(result) => {
                self.apply(result);
                self.after_mutation();
            }
            StreamEvent::Error(message) => {
                warn!(scan_id = %self.request.scan_id(), error = %message, "Stream failed; falling back to polling");
                self.switch_to_polling(&message);
                self.publish();
            }
        }
    }

    fn on_poll(&mut self, event: PollEvent) {
        match event {
            PollEvent::Snapshot(results) => {
                if self.degraded {
                    info!(scan_id = %self.request.scan_id(), "Polling recovered");
                    self.degraded = false;
                    self.notice = Some(self.polling_notice());
                }
                for result in results {
                    self.apply(result);
                }
                self.after_mutation();
            }
            PollEvent::FetchFailed { consecutive_failures, message, degraded } => {
                if degraded {
                    self.degraded = true;
                    self.notice = Some(format!(
                        "Results service unreachable ({} failed fetches, last: {}); still retrying",
                        consecutive_failures, message
                    ));
                }
                self.publish();
            }
            PollEvent::Finished => {
                self.poll_cancel = None;
                if !self.store.is_session_complete() {
                    warn!(
                        held = self.store.len(),
                        expected = self.store.expected(),
                        "Poll fallback finished before session completion; restarting it after one interval"
                    );
                    self.bump_epoch();
                    self.start_polling(self.settings.poll.interval);
                }
            }
        }
    }

    fn on_reconciled(&mut self, outcome: Result<Vec<ScanResult>, String>) {
        self.reconcile_in_flight = false;
        if self.phase == SessionPhase::Reconciling {
            self.phase = SessionPhase::Streaming;
        }
        match outcome {
            Ok(results) => {
                debug!(count = results.len(), "Reconcile fetch merged");
                for result in results {
                    self.apply(result);
                }
            }
            Err(message) => warn!(error = %message, "Reconcile fetch failed"),
        }
        self.after_mutation();
    }

    fn record_log(&mut self, line: String) {
        if let Some(caps) = LOG_PREFIX.captures(&line) {
            let tool = caps["tool"].parse::<ToolName>().ok();
            if let Some(tool) = tool.filter(|t| self.request.tools().contains(t)) {
                let result_id = ScanResult::result_id(self.request.scan_id(), tool);
                self.store.append_log(&result_id, &caps["rest"]);
            }
        }
        self.feed.push(line);
        let step = self.settings.progress_step(self.request.tools().len());
        self.progress = (self.progress + step).min(100.0);
    }

    /// The single mutation path for results, whichever producer delivered them.
    fn apply(&mut self, result: ScanResult) {
        if !result.belongs_to_scan(self.request.scan_id()) {
            debug!(result_id = %result.id, "Ignoring result from another scan");
            return;
        }
        if !self.request.tools().contains(&result.tool_name) {
            debug!(result_id = %result.id, tool = %result.tool_name, "Ignoring result for a tool outside this session");
            return;
        }
        let id = result.id.clone();
        let outcome = self.store.upsert(result);
        if outcome.metrics_arrived() {
            if let Some(stored) = self.store.get(&id) {
                self.samples.record(stored, Utc::now());
            }
        }

        let expected = self.store.expected().max(1) as f64;
        let floor = self.store.settled_count() as f64 / expected * 100.0;
        self.progress = self.progress.max(floor).min(100.0);
    }

    fn after_mutation(&mut self) {
        if self.store.is_session_complete() {
            self.complete();
        }
        self.publish();
    }

    fn complete(&mut self) {
        let from = self.phase;
        self.close();
        self.phase = SessionPhase::Completed;
        self.progress = 100.0;
        self.degraded = false;
        info!(
            scan_id = %self.request.scan_id(),
            from = %from,
            results = self.store.len(),
            "Session completed"
        );
    }

    fn start_reconcile(&mut self) {
        if !self.phase.is_streaming() || self.reconcile_in_flight {
            return;
        }
        self.reconcile_in_flight = true;
        self.phase = SessionPhase::Reconciling;

        let fetcher = self.fetcher.clone();
        let outbox = self.outbox.clone();
        let epoch = self.epoch;
        tokio::spawn(async move {
            let outcome = fetcher.fetch().await.map_err(|e: ScanwatchError| e.to_string());
            let _ = outbox.send(SessionInput::Reconciled(Tagged::new(epoch, outcome)));
        });
    }

    fn switch_to_polling(&mut self, reason: &str) {
        if !self.phase.is_streaming() {
            return;
        }
        self.transport.close();
        self.reconcile_in_flight = false;
        self.bump_epoch();
        self.phase = SessionPhase::Polling;
        self.notice = Some(format!("Live stream unavailable ({}); {}", reason, self.polling_notice()));
        self.start_polling(Duration::ZERO);
    }

    fn start_polling(&mut self, first_delay: Duration) {
        let scope = PollScope::new(self.request.scan_id(), self.request.tools().to_vec());
        let token = PollFallback::start(
            self.settings.poll,
            self.fetcher.clone(),
            scope,
            first_delay,
            self.epoch,
            self.outbox.clone(),
        );
        self.poll_cancel = Some(token);
    }

    fn polling_notice(&self) -> String {
        format!("polling results every {}s", self.settings.poll.interval.as_secs_f64())
    }

    fn bump_epoch(&mut self) {
        self.epoch += 1;
    }

    fn publish(&self) {
        self.view_tx.send_replace(self.view());
    }
}

impl<C: Connector, F: ResultsFetcher + ?Sized> Drop for ScanSession<C, F> {
    fn drop(&mut self) {
        if let Some(token) = self.poll_cancel.take() {
            token.cancel();
        }
    }
}

/// Handle to a session running on its own task.
pub struct SessionHandle {
    view: watch::Receiver<SessionView>,
    cancel: CancellationToken,
    task: JoinHandle<SessionView>,
}

impl SessionHandle {
    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.view.clone()
    }

    pub fn view(&self) -> SessionView {
        self.view.borrow().clone()
    }

    /// Stop the session. Events arriving afterwards are discarded.
    pub fn close(&self) {
        self.cancel.cancel();
    }

    /// Wait for the session loop to end and return its final view.
    pub async fn wait(self) -> Result<SessionView, ScanwatchError> {
        self.task
            .await
            .map_err(|e| ScanwatchError::Internal(format!("Session task failed: {}", e)))
    }
}
