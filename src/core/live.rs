use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::core::models::request::{CommandRequest, ReportKind};
use crate::core::process::{CommandResult, Invoke};
use crate::core::sanitize::sanitize;

pub const DEFAULT_PERIOD: Duration = Duration::from_secs(5);

pub const START_MARKER: &str = "Live monitoring started";
pub const STOP_MARKER: &str = "Live monitoring stopped";

/// Raw output accumulates as a transcript; structured output only ever
/// shows the latest snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiveMode {
    Raw,
    Structured,
}

/// Result of one polling tick, tagged with the session that issued it.
#[derive(Debug)]
pub struct TickOutcome {
    session: u64,
    pub result: CommandResult,
}

/// Proof of a running poll. Consumed by [`LiveController::stop`].
#[derive(Debug)]
#[must_use = "a poll can only be stopped with its token"]
pub struct PollToken {
    session: u64,
}

#[derive(Debug, Default)]
pub struct LiveSessionState {
    pub is_polling: bool,
    interval: Option<JoinHandle<()>>,
    pub accumulated_text: String,
    /// Invocations issued by the timer in the current session.
    dispatched: Arc<AtomicUsize>,
    /// Outcomes of the current session folded in so far.
    applied: usize,
}

/// What the view should show after the controller handled an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiveUpdate {
    /// Full accumulated raw text.
    Transcript(String),
    /// Latest structured output, replacing whatever was shown.
    Snapshot(String),
    /// The tick failed; polling goes on.
    Error(String),
    /// Result from a cancelled session.
    Ignored,
}

/// Idle/Polling state machine that re-invokes the collaborator on a fixed
/// period. Tick results arrive on the receiver returned by [`LiveController::new`]
/// and are fed back through [`LiveController::apply`].
pub struct LiveController<I: Invoke + 'static> {
    invoker: Arc<I>,
    period: Duration,
    mode: LiveMode,
    session: u64,
    state: LiveSessionState,
    outcomes: mpsc::UnboundedSender<TickOutcome>,
}

impl<I: Invoke + 'static> LiveController<I> {
    pub fn new(invoker: Arc<I>, period: Duration) -> (Self, mpsc::UnboundedReceiver<TickOutcome>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let controller = Self {
            invoker,
            period,
            mode: LiveMode::Raw,
            session: 0,
            state: LiveSessionState::default(),
            outcomes: tx,
        };
        (controller, rx)
    }

    pub fn state(&self) -> &LiveSessionState {
        &self.state
    }

    pub fn is_polling(&self) -> bool {
        self.state.is_polling
    }

    pub fn mode(&self) -> LiveMode {
        self.mode
    }

    /// Ticks of the current session that were dispatched but whose outcome
    /// has not been applied yet.
    pub fn pending_ticks(&self) -> usize {
        self.state
            .dispatched
            .load(Ordering::SeqCst)
            .saturating_sub(self.state.applied)
    }

    /// Idle -> Polling. Issues one invocation right away, then one per period.
    /// Returns `None` if already polling.
    pub fn start(&mut self, request: CommandRequest) -> Option<PollToken> {
        if self.state.is_polling {
            return None;
        }
        self.session += 1;
        self.mode = if request.json {
            LiveMode::Structured
        } else {
            LiveMode::Raw
        };
        self.state.accumulated_text = format!("{}\n", START_MARKER);
        self.state.is_polling = true;
        self.state.dispatched = Arc::new(AtomicUsize::new(0));
        self.state.applied = 0;

        let invoker = Arc::clone(&self.invoker);
        let outcomes = self.outcomes.clone();
        let session = self.session;
        let period = self.period;
        let dispatched = Arc::clone(&self.state.dispatched);
        self.state.interval = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                tracing::debug!(session, "live tick");
                dispatched.fetch_add(1, Ordering::SeqCst);
                let invoker = Arc::clone(&invoker);
                let outcomes = outcomes.clone();
                let request = request.clone();
                tokio::spawn(async move {
                    let result = invoker.invoke(request).await;
                    let _ = outcomes.send(TickOutcome { session, result });
                });
            }
        }));

        tracing::info!(session, period_secs = period.as_secs_f64(), mode = ?self.mode, "live polling started");
        Some(PollToken { session })
    }

    /// Polling -> Idle. The timer is cancelled immediately; a tick already
    /// dispatched still completes and is appended after the stop marker.
    pub fn stop(&mut self, token: PollToken) -> LiveUpdate {
        if token.session != self.session || !self.state.is_polling {
            return LiveUpdate::Ignored;
        }
        self.cancel_timer();
        self.state
            .accumulated_text
            .push_str(&format!("\n{}\n", STOP_MARKER));
        tracing::info!(session = token.session, "live polling stopped");
        LiveUpdate::Transcript(self.state.accumulated_text.clone())
    }

    /// Leaving the live view cancels polling and drops late results from
    /// the abandoned session.
    pub fn switch_view(&mut self, view: ReportKind) {
        if view.is_live() {
            return;
        }
        if self.state.is_polling {
            tracing::info!(session = self.session, %view, "live polling cancelled by view switch");
        }
        self.cancel_timer();
        self.session += 1;
        self.state.accumulated_text.clear();
        self.state.dispatched = Arc::new(AtomicUsize::new(0));
        self.state.applied = 0;
    }

    /// Folds one tick result into the session state.
    pub fn apply(&mut self, outcome: TickOutcome) -> LiveUpdate {
        if outcome.session != self.session {
            return LiveUpdate::Ignored;
        }
        self.state.applied += 1;
        match outcome.result {
            Ok(output) => match self.mode {
                LiveMode::Raw => {
                    let stamp = Local::now().format("%H:%M:%S");
                    self.state
                        .accumulated_text
                        .push_str(&format!("[{}] {}\n", stamp, sanitize(&output)));
                    LiveUpdate::Transcript(self.state.accumulated_text.clone())
                }
                LiveMode::Structured => LiveUpdate::Snapshot(output),
            },
            Err(e) => {
                tracing::warn!(session = self.session, error = %e, "live tick failed");
                LiveUpdate::Error(e.to_string())
            }
        }
    }

    fn cancel_timer(&mut self) {
        if let Some(handle) = self.state.interval.take() {
            handle.abort();
        }
        self.state.is_polling = false;
    }
}

impl<I: Invoke + 'static> Drop for LiveController<I> {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::request::ReportOptions;
    use crate::core::process::{ErrorDetail, InvokeError, InvokeFuture};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::Instant;

    #[derive(Default)]
    struct Scripted {
        calls: AtomicUsize,
        fail_first: bool,
    }

    impl Scripted {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Invoke for Scripted {
        fn invoke(&self, _request: CommandRequest) -> InvokeFuture<'_> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            let fail = self.fail_first && n == 0;
            Box::pin(async move {
                if fail {
                    Err(InvokeError::NonZeroExit {
                        detail: ErrorDetail {
                            stderr: "boom".into(),
                            exit_code: Some(1),
                            ..Default::default()
                        },
                    })
                } else {
                    Ok(format!("\x1b[1mtick {}\x1b[0m", n))
                }
            })
        }
    }

    fn live_request(json: bool) -> CommandRequest {
        let options = ReportOptions {
            json,
            ..Default::default()
        };
        CommandRequest::new(ReportKind::BlocksLive, &options)
    }

    #[tokio::test(start_paused = true)]
    async fn first_invocation_is_immediate() {
        let invoker = Arc::new(Scripted::default());
        let (mut live, mut rx) = LiveController::new(invoker.clone(), DEFAULT_PERIOD);
        let began = Instant::now();

        let _token = live.start(live_request(false)).unwrap();
        let outcome = rx.recv().await.unwrap();

        assert!(began.elapsed() < Duration::from_secs(1));
        assert_eq!(invoker.calls(), 1);
        let LiveUpdate::Transcript(text) = live.apply(outcome) else {
            panic!("expected transcript");
        };
        assert!(text.starts_with(START_MARKER));
        assert!(text.contains("] tick 0\n"));
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_repeat_every_period_and_accumulate() {
        let invoker = Arc::new(Scripted::default());
        let (mut live, mut rx) = LiveController::new(invoker.clone(), DEFAULT_PERIOD);
        let _token = live.start(live_request(false)).unwrap();

        for _ in 0..3 {
            let outcome = rx.recv().await.unwrap();
            live.apply(outcome);
        }
        assert_eq!(invoker.calls(), 3);
        let text = &live.state().accumulated_text;
        let t0 = text.find("tick 0").unwrap();
        let t2 = text.find("tick 2").unwrap();
        assert!(t0 < t2);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_cancels_future_ticks() {
        let invoker = Arc::new(Scripted::default());
        let (mut live, mut rx) = LiveController::new(invoker.clone(), DEFAULT_PERIOD);
        let token = live.start(live_request(false)).unwrap();
        let first = rx.recv().await.unwrap();
        live.apply(first);

        let LiveUpdate::Transcript(text) = live.stop(token) else {
            panic!("expected transcript");
        };
        assert!(text.trim_end().ends_with(STOP_MARKER));
        assert!(!live.is_polling());

        tokio::time::sleep(Duration::from_millis(5_100) * 2).await;
        assert_eq!(invoker.calls(), 1);
        assert!(rx.try_recv().is_err());
    }

    /// Answers after a fixed delay.
    struct Slow {
        delay: Duration,
    }

    impl Invoke for Slow {
        fn invoke(&self, _request: CommandRequest) -> InvokeFuture<'_> {
            Box::pin(async move {
                tokio::time::sleep(self.delay).await;
                Ok("late".to_string())
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stop_appends_inflight_tick_after_marker() {
        let invoker = Arc::new(Slow {
            delay: Duration::from_secs(2),
        });
        let (mut live, mut rx) = LiveController::new(invoker, DEFAULT_PERIOD);
        let token = live.start(live_request(false)).unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(live.pending_ticks(), 1);
        let LiveUpdate::Transcript(stopped) = live.stop(token) else {
            panic!("expected transcript");
        };
        assert!(stopped.trim_end().ends_with(STOP_MARKER));
        assert_eq!(live.pending_ticks(), 1);

        let late = rx.recv().await.unwrap();
        let LiveUpdate::Transcript(text) = live.apply(late) else {
            panic!("expected transcript");
        };
        let stop_at = text.find(STOP_MARKER).unwrap();
        let late_at = text.find("] late\n").unwrap();
        assert!(stop_at < late_at);
        assert_eq!(live.pending_ticks(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_tick_keeps_polling() {
        let invoker = Arc::new(Scripted {
            fail_first: true,
            ..Default::default()
        });
        let (mut live, mut rx) = LiveController::new(invoker.clone(), DEFAULT_PERIOD);
        let _token = live.start(live_request(false)).unwrap();

        let first = rx.recv().await.unwrap();
        assert_eq!(live.apply(first), LiveUpdate::Error("boom".into()));
        assert!(live.is_polling());

        let second = rx.recv().await.unwrap();
        assert!(matches!(live.apply(second), LiveUpdate::Transcript(_)));
        assert_eq!(invoker.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn structured_mode_replaces_snapshot() {
        let invoker = Arc::new(Scripted::default());
        let (mut live, mut rx) = LiveController::new(invoker.clone(), DEFAULT_PERIOD);
        let _token = live.start(live_request(true)).unwrap();
        assert_eq!(live.mode(), LiveMode::Structured);

        let first = rx.recv().await.unwrap();
        assert!(matches!(live.apply(first), LiveUpdate::Snapshot(s) if s.contains("tick 0")));
        let second = rx.recv().await.unwrap();
        assert!(matches!(live.apply(second), LiveUpdate::Snapshot(s) if s.contains("tick 1")));
    }

    #[tokio::test(start_paused = true)]
    async fn switching_view_cancels_and_discards_late_results() {
        let invoker = Arc::new(Scripted::default());
        let (mut live, mut rx) = LiveController::new(invoker.clone(), DEFAULT_PERIOD);
        let _token = live.start(live_request(false)).unwrap();
        let first = rx.recv().await.unwrap();

        live.switch_view(ReportKind::Daily);
        assert!(!live.is_polling());
        assert!(live.state().accumulated_text.is_empty());
        assert_eq!(live.apply(first), LiveUpdate::Ignored);
        assert_eq!(live.pending_ticks(), 0);

        tokio::time::sleep(Duration::from_secs(11)).await;
        assert_eq!(invoker.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn start_while_polling_is_refused() {
        let invoker = Arc::new(Scripted::default());
        let (mut live, _rx) = LiveController::new(invoker, DEFAULT_PERIOD);
        let token = live.start(live_request(false)).unwrap();
        assert!(live.start(live_request(false)).is_none());
        live.stop(token);
        assert!(live.start(live_request(false)).is_some());
    }
}
