use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

use futures::future::{abortable, AbortHandle};
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::backoff::{Backoff, BackoffConfig};
use crate::error::ChannelError;
use crate::timer::Sleeper;
use crate::transport::{Connector, TransportEvent};

pub const DEFAULT_MAX_RETRIES: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// Consecutive drops tolerated before the channel gives up. Never less than 1.
    pub max_retries: u32,
    pub backoff: BackoffConfig,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            backoff: BackoffConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ChannelState {
    Connecting,
    Open,
    ReconnectPending,
    Closed,
    Failed,
}

impl ChannelState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ChannelState::Closed | ChannelState::Failed)
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => ChannelState::Connecting,
            1 => ChannelState::Open,
            2 => ChannelState::ReconnectPending,
            3 => ChannelState::Closed,
            _ => ChannelState::Failed,
        }
    }
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChannelState::Connecting => "Connecting",
            ChannelState::Open => "Connected",
            ChannelState::ReconnectPending => "Reconnecting",
            ChannelState::Closed => "Closed",
            ChannelState::Failed => "Disconnected",
        };
        f.write_str(s)
    }
}

/// One consecutive failure as seen by a [`Backoff`] policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryAttempt {
    /// Consecutive drops so far, starting at 1.
    pub failures: u32,
    /// Retries left after this one. Always at least 1.
    pub remaining: u32,
    pub max_retries: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryBudget {
    max: u32,
    remaining: u32,
}

impl RetryBudget {
    pub fn new(max_retries: u32) -> Self {
        let max = max_retries.max(1);
        Self {
            max,
            remaining: max,
        }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn reset(&mut self) {
        self.remaining = self.max;
    }

    /// Records a drop. `None` means the budget is spent.
    pub fn consume(&mut self) -> Option<RetryAttempt> {
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            return None;
        }
        Some(RetryAttempt {
            failures: self.max - self.remaining,
            remaining: self.remaining,
            max_retries: self.max,
        })
    }
}

struct Shared {
    closed: AtomicBool,
    state: AtomicU8,
}

impl Shared {
    fn state(&self) -> ChannelState {
        ChannelState::from_u8(self.state.load(Ordering::SeqCst))
    }
}

/// Consumer side of an open channel.
///
/// Cloning is cheap; every clone controls the same channel.
#[derive(Clone)]
pub struct ChannelHandle {
    shared: Arc<Shared>,
    abort: AbortHandle,
}

impl ChannelHandle {
    /// Stops the channel. No callback fires after this returns, and a pending
    /// reconnect never happens. Calling it again does nothing.
    pub fn close(&self) {
        if !self.shared.closed.swap(true, Ordering::SeqCst) {
            log::debug!("Closing game state channel");
            let _ = self.shared.state.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |s| {
                match ChannelState::from_u8(s) {
                    state if state.is_terminal() => None,
                    _ => Some(ChannelState::Closed as u8),
                }
            });
        }
        self.abort.abort();
    }

    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::SeqCst)
    }

    pub fn state(&self) -> ChannelState {
        self.shared.state()
    }
}

impl fmt::Debug for ChannelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelHandle")
            .field("state", &self.state())
            .field("closed", &self.is_closed())
            .finish()
    }
}

pub struct StateChannel;

impl StateChannel {
    pub fn builder<C, T>(
        connector: C,
        sleeper: T,
    ) -> ChannelBuilder<C, T, BackoffConfig, fn(ChannelState), fn(String)>
    where
        C: Connector,
        T: Sleeper,
    {
        let config = ChannelConfig::default();
        ChannelBuilder {
            connector,
            sleeper,
            max_retries: config.max_retries,
            backoff: config.backoff,
            on_state_change: |_| {},
            on_transport_error: |_| {},
        }
    }
}

pub struct ChannelBuilder<C, T, B, O, R> {
    connector: C,
    sleeper: T,
    max_retries: u32,
    backoff: B,
    on_state_change: O,
    on_transport_error: R,
}

impl<C, T, O, R> ChannelBuilder<C, T, BackoffConfig, O, R> {
    pub fn config(mut self, config: ChannelConfig) -> Self {
        self.max_retries = config.max_retries;
        self.backoff = config.backoff;
        self
    }
}

impl<C, T, B, O, R> ChannelBuilder<C, T, B, O, R>
where
    C: Connector,
    T: Sleeper,
    B: Backoff,
    O: FnMut(ChannelState),
    R: FnMut(String),
{
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn backoff<B2: Backoff>(self, backoff: B2) -> ChannelBuilder<C, T, B2, O, R> {
        ChannelBuilder {
            connector: self.connector,
            sleeper: self.sleeper,
            max_retries: self.max_retries,
            backoff,
            on_state_change: self.on_state_change,
            on_transport_error: self.on_transport_error,
        }
    }

    pub fn on_state_change<O2>(self, on_state_change: O2) -> ChannelBuilder<C, T, B, O2, R>
    where
        O2: FnMut(ChannelState),
    {
        ChannelBuilder {
            connector: self.connector,
            sleeper: self.sleeper,
            max_retries: self.max_retries,
            backoff: self.backoff,
            on_state_change,
            on_transport_error: self.on_transport_error,
        }
    }

    /// Called with the message of every transport error, including failed connects.
    ///
    /// The channel still retries afterwards; only `on_fatal_error` marks the end.
    pub fn on_transport_error<R2>(self, on_transport_error: R2) -> ChannelBuilder<C, T, B, O, R2>
    where
        R2: FnMut(String),
    {
        ChannelBuilder {
            connector: self.connector,
            sleeper: self.sleeper,
            max_retries: self.max_retries,
            backoff: self.backoff,
            on_state_change: self.on_state_change,
            on_transport_error,
        }
    }

    /// Subscribes to `target_id`.
    ///
    /// Returns the handle and the task driving the channel; nothing happens until
    /// the task is spawned on an executor. `on_fatal_error` fires at most once.
    pub fn open<S, F, E>(
        self,
        target_id: &str,
        on_snapshot: F,
        on_fatal_error: E,
    ) -> Result<(ChannelHandle, impl Future<Output = ()>), ChannelError>
    where
        S: DeserializeOwned,
        F: FnMut(S),
        E: FnOnce(ChannelError),
    {
        if target_id.is_empty() {
            return Err(ChannelError::EmptyTarget);
        }
        let shared = Arc::new(Shared {
            closed: AtomicBool::new(false),
            state: AtomicU8::new(ChannelState::Connecting as u8),
        });
        let session = Session {
            target_id: target_id.to_owned(),
            connector: self.connector,
            sleeper: self.sleeper,
            backoff: self.backoff,
            on_state_change: self.on_state_change,
            on_transport_error: self.on_transport_error,
            on_snapshot,
            on_fatal_error: Some(on_fatal_error),
            budget: RetryBudget::new(self.max_retries),
            shared: Arc::clone(&shared),
            _snapshot: PhantomData,
        };
        let (task, abort) = abortable(session.run());
        let task = async move {
            if task.await.is_err() {
                log::debug!("Game state channel task aborted");
            }
        };
        Ok((ChannelHandle { shared, abort }, task))
    }
}

enum Dropped {
    Closed,
    Errored(String),
    Cancelled,
    Fault(ChannelError),
}

struct Session<S, C, T, B, O, R, F, E> {
    target_id: String,
    connector: C,
    sleeper: T,
    backoff: B,
    on_state_change: O,
    on_transport_error: R,
    on_snapshot: F,
    on_fatal_error: Option<E>,
    budget: RetryBudget,
    shared: Arc<Shared>,
    _snapshot: PhantomData<fn() -> S>,
}

impl<S, C, T, B, O, R, F, E> Session<S, C, T, B, O, R, F, E>
where
    S: DeserializeOwned,
    C: Connector,
    T: Sleeper,
    B: Backoff,
    O: FnMut(ChannelState),
    R: FnMut(String),
    F: FnMut(S),
    E: FnOnce(ChannelError),
{
    async fn run(mut self) {
        loop {
            if self.is_closed() {
                return;
            }
            self.transition(ChannelState::Connecting);
            let dropped = match self.connector.connect(&self.target_id) {
                Ok(connection) => self.pump(connection).await,
                Err(e) => {
                    log::warn!("Could not open game state connection: {e}");
                    let e = e.to_string();
                    self.report_transport_error(&e);
                    Dropped::Errored(e)
                }
            };
            let last_error = match dropped {
                Dropped::Cancelled => return,
                Dropped::Fault(e) => {
                    self.fail(e);
                    return;
                }
                Dropped::Closed => None,
                Dropped::Errored(e) => Some(e),
            };
            if self.is_closed() {
                return;
            }

            let Some(attempt) = self.budget.consume() else {
                log::error!("Game state connection lost, no retries left");
                self.fail(match last_error {
                    Some(e) => ChannelError::TransportFailed(e),
                    None => ChannelError::RetriesExhausted,
                });
                return;
            };
            let delay = self.backoff.delay(attempt);
            log::warn!(
                "Server connection was lost, reconnecting in {}ms ({} retries left)",
                delay.as_millis(),
                attempt.remaining
            );
            self.transition(ChannelState::ReconnectPending);
            self.sleeper.sleep(delay).await;
        }
    }

    // Drives one connection until it goes away. The connection is dropped on return.
    async fn pump(&mut self, mut connection: C::Connection) -> Dropped {
        let mut error = None;
        while let Some(event) = connection.next().await {
            if self.is_closed() {
                return Dropped::Cancelled;
            }
            match event {
                TransportEvent::Opened => {
                    log::debug!("Game state connection open");
                    self.transition(ChannelState::Open);
                }
                TransportEvent::Message(msg) => {
                    let snapshot = match serde_json::from_str::<S>(&msg) {
                        Ok(s) => s,
                        Err(e) => {
                            log::error!("Could not decode game state: {e}");
                            return Dropped::Fault(ChannelError::Decode(e.to_string()));
                        }
                    };
                    self.budget.reset();
                    (self.on_snapshot)(snapshot);
                    if self.is_closed() {
                        return Dropped::Cancelled;
                    }
                }
                TransportEvent::Error(e) => {
                    log::warn!("Server connection error: {e}");
                    self.report_transport_error(&e);
                    if self.is_closed() {
                        return Dropped::Cancelled;
                    }
                    error = Some(e);
                    break;
                }
                TransportEvent::Closed => break,
            }
        }
        match error {
            Some(e) => Dropped::Errored(e),
            None => Dropped::Closed,
        }
    }

    fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::SeqCst)
    }

    fn report_transport_error(&mut self, error: &str) {
        if !self.is_closed() {
            (self.on_transport_error)(error.to_owned());
        }
    }

    fn transition(&mut self, next: ChannelState) {
        if self.is_closed() {
            return;
        }
        let prev = ChannelState::from_u8(self.shared.state.swap(next as u8, Ordering::SeqCst));
        if prev != next {
            (self.on_state_change)(next);
        }
    }

    fn fail(&mut self, error: ChannelError) {
        if self.is_closed() {
            return;
        }
        self.transition(ChannelState::Failed);
        if let Some(on_fatal_error) = self.on_fatal_error.take() {
            on_fatal_error(error);
        }
    }
}

#[cfg(test)]
mod test {
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;
    use std::time::Duration;

    use futures::stream::{self, BoxStream};
    use serde::Deserialize;

    use super::*;
    use crate::backoff::InverseBudgetBackoff;
    use crate::error::TransportError;

    #[derive(Debug, Clone, PartialEq, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct TestState {
        phase: String,
        curr_round: u32,
    }

    enum Script {
        // Plays the events, then the connection ends.
        Events(Vec<TransportEvent>),
        // Plays the events, then stays open.
        Hold(Vec<TransportEvent>),
        Refuse,
    }

    struct MockConnector {
        scripts: VecDeque<Script>,
        connects: Arc<AtomicUsize>,
    }

    impl Connector for MockConnector {
        type Connection = BoxStream<'static, TransportEvent>;

        fn connect(&mut self, target_id: &str) -> Result<Self::Connection, TransportError> {
            assert_eq!(target_id, "game-42");
            self.connects.fetch_add(1, Ordering::SeqCst);
            match self.scripts.pop_front() {
                Some(Script::Events(events)) => Ok(stream::iter(events).boxed()),
                Some(Script::Hold(events)) => {
                    Ok(stream::iter(events).chain(stream::pending()).boxed())
                }
                Some(Script::Refuse) => Err(TransportError::Connect("refused".to_string())),
                None => Ok(stream::pending().boxed()),
            }
        }
    }

    #[derive(Clone, Default)]
    struct RecordingSleeper {
        delays: Arc<Mutex<Vec<Duration>>>,
    }

    impl RecordingSleeper {
        fn millis(&self) -> Vec<u128> {
            self.delays
                .lock()
                .unwrap()
                .iter()
                .map(|d| d.as_millis())
                .collect()
        }
    }

    impl Sleeper for RecordingSleeper {
        type Sleep = tokio::time::Sleep;

        fn sleep(&self, duration: Duration) -> Self::Sleep {
            self.delays.lock().unwrap().push(duration);
            tokio::time::sleep(duration)
        }
    }

    #[derive(Clone, Default)]
    struct Observed {
        snapshots: Arc<Mutex<Vec<TestState>>>,
        errors: Arc<Mutex<Vec<ChannelError>>>,
        states: Arc<Mutex<Vec<ChannelState>>>,
        transport_errors: Arc<Mutex<Vec<String>>>,
    }

    impl Observed {
        fn snapshots(&self) -> Vec<TestState> {
            self.snapshots.lock().unwrap().clone()
        }

        fn errors(&self) -> Vec<ChannelError> {
            self.errors.lock().unwrap().clone()
        }

        fn states(&self) -> Vec<ChannelState> {
            self.states.lock().unwrap().clone()
        }

        fn transport_errors(&self) -> Vec<String> {
            self.transport_errors.lock().unwrap().clone()
        }
    }

    fn state(phase: &str, curr_round: u32) -> TestState {
        TestState {
            phase: phase.to_string(),
            curr_round,
        }
    }

    fn message(phase: &str, curr_round: u32) -> TransportEvent {
        TransportEvent::Message(format!(
            r#"{{"phase":"{phase}","currRound":{curr_round}}}"#
        ))
    }

    fn drops(n: usize) -> impl Iterator<Item = Script> {
        (0..n).map(|_| Script::Events(vec![TransportEvent::Closed]))
    }

    fn open_channel<B: Backoff + Send + 'static>(
        scripts: impl IntoIterator<Item = Script>,
        backoff: B,
        observed: &Observed,
    ) -> (
        ChannelHandle,
        impl Future<Output = ()> + Send + 'static,
        Arc<AtomicUsize>,
        RecordingSleeper,
    ) {
        let connects = Arc::new(AtomicUsize::new(0));
        let connector = MockConnector {
            scripts: scripts.into_iter().collect(),
            connects: Arc::clone(&connects),
        };
        let sleeper = RecordingSleeper::default();
        let snapshots = Arc::clone(&observed.snapshots);
        let errors = Arc::clone(&observed.errors);
        let states = Arc::clone(&observed.states);
        let transport_errors = Arc::clone(&observed.transport_errors);
        let (handle, task) = StateChannel::builder(connector, sleeper.clone())
            .backoff(backoff)
            .on_state_change(move |s| states.lock().unwrap().push(s))
            .on_transport_error(move |e| transport_errors.lock().unwrap().push(e))
            .open(
                "game-42",
                move |s: TestState| snapshots.lock().unwrap().push(s),
                move |e| errors.lock().unwrap().push(e),
            )
            .unwrap();
        (handle, task, connects, sleeper)
    }

    #[test]
    fn retry_budget_counts_down() {
        let mut budget = RetryBudget::new(3);
        let first = budget.consume().unwrap();
        assert_eq!((first.failures, first.remaining), (1, 2));
        let second = budget.consume().unwrap();
        assert_eq!((second.failures, second.remaining), (2, 1));
        assert!(budget.consume().is_none());
        assert_eq!(budget.remaining(), 0);

        budget.reset();
        assert_eq!(budget.remaining(), 3);
    }

    #[test]
    fn retry_budget_is_at_least_one() {
        let mut budget = RetryBudget::new(0);
        assert_eq!(budget.remaining(), 1);
        assert!(budget.consume().is_none());
    }

    #[test]
    fn config_defaults() {
        let config: ChannelConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ChannelConfig::default());
        assert_eq!(config.max_retries, DEFAULT_MAX_RETRIES);

        let config: ChannelConfig = serde_json::from_str(r#"{"max_retries": 3}"#).unwrap();
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.backoff, BackoffConfig::default());
    }

    #[test]
    fn empty_target_is_rejected() {
        let connects = Arc::new(AtomicUsize::new(0));
        let connector = MockConnector {
            scripts: VecDeque::new(),
            connects,
        };
        let result = StateChannel::builder(connector, RecordingSleeper::default()).open(
            "",
            |_: TestState| {},
            |_| {},
        );
        assert!(matches!(result, Err(ChannelError::EmptyTarget)));
    }

    #[tokio::test(start_paused = true)]
    async fn snapshot_then_five_drops_fails_once() {
        let observed = Observed::default();
        let first = Script::Events(vec![
            TransportEvent::Opened,
            message("Playing", 1),
            TransportEvent::Closed,
        ]);
        let scripts = std::iter::once(first).chain(drops(4));
        let (handle, task, connects, _) =
            open_channel(scripts, BackoffConfig::default(), &observed);

        task.await;

        assert_eq!(observed.snapshots(), vec![state("Playing", 1)]);
        assert_eq!(observed.errors(), vec![ChannelError::RetriesExhausted]);
        assert_eq!(
            observed.errors()[0].to_string(),
            "Could not reconnect to server."
        );
        assert_eq!(connects.load(Ordering::SeqCst), 5);
        assert_eq!(handle.state(), ChannelState::Failed);
    }

    #[tokio::test(start_paused = true)]
    async fn fewer_drops_than_budget_recover() {
        for n in 1..DEFAULT_MAX_RETRIES as usize {
            let observed = Observed::default();
            let live = Script::Hold(vec![TransportEvent::Opened, message("Playing", 3)]);
            let scripts = drops(n).chain(std::iter::once(live));
            let (handle, task, connects, _) =
                open_channel(scripts, BackoffConfig::default(), &observed);
            tokio::spawn(task);

            tokio::time::sleep(Duration::from_secs(60)).await;

            assert!(observed.errors().is_empty());
            assert_eq!(connects.load(Ordering::SeqCst), n + 1);
            assert_eq!(observed.snapshots(), vec![state("Playing", 3)]);
            assert_eq!(handle.state(), ChannelState::Open);
            handle.close();
        }
    }

    #[tokio::test(start_paused = true)]
    async fn snapshot_resets_retry_budget() {
        let observed = Observed::default();
        let recovered = Script::Events(vec![
            TransportEvent::Opened,
            message("Playing", 2),
            TransportEvent::Closed,
        ]);
        let scripts = drops(3)
            .chain(std::iter::once(recovered))
            .chain(drops(4));
        let (_handle, task, connects, _) =
            open_channel(scripts, BackoffConfig::default(), &observed);

        task.await;

        // 3 drops before the snapshot, 5 after it
        assert_eq!(connects.load(Ordering::SeqCst), 8);
        assert_eq!(observed.errors().len(), 1);
        assert_eq!(observed.snapshots().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn close_during_backoff_cancels_reconnect() {
        let observed = Observed::default();
        let live = Script::Hold(vec![TransportEvent::Opened, message("Playing", 1)]);
        let scripts = drops(1).chain(std::iter::once(live));
        let (handle, task, connects, sleeper) =
            open_channel(scripts, BackoffConfig::default(), &observed);
        tokio::spawn(task);

        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(handle.state(), ChannelState::ReconnectPending);
        assert_eq!(sleeper.millis(), vec![500]);

        handle.close();
        handle.close();
        tokio::time::sleep(Duration::from_secs(60)).await;

        assert!(handle.is_closed());
        assert_eq!(handle.state(), ChannelState::Closed);
        assert_eq!(connects.load(Ordering::SeqCst), 1);
        assert!(observed.snapshots().is_empty());
        assert!(observed.errors().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn close_before_start_never_connects() {
        let observed = Observed::default();
        let (handle, task, connects, _) =
            open_channel(drops(1), BackoffConfig::default(), &observed);

        handle.close();
        task.await;

        assert_eq!(connects.load(Ordering::SeqCst), 0);
        assert_eq!(handle.state(), ChannelState::Closed);
        assert!(observed.states().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn snapshots_arrive_in_wire_order() {
        let observed = Observed::default();
        let live = Script::Hold(vec![
            TransportEvent::Opened,
            message("SinnersPlaying", 1),
            message("CzarChoosingWinner", 1),
            message("SinnersPlaying", 2),
        ]);
        let (handle, task, _, _) =
            open_channel(std::iter::once(live), BackoffConfig::default(), &observed);
        tokio::spawn(task);

        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(
            observed.snapshots(),
            vec![
                state("SinnersPlaying", 1),
                state("CzarChoosingWinner", 1),
                state("SinnersPlaying", 2),
            ]
        );
        handle.close();
    }

    #[tokio::test(start_paused = true)]
    async fn close_from_callback_stops_delivery() {
        let connects = Arc::new(AtomicUsize::new(0));
        let connector = MockConnector {
            scripts: VecDeque::from([Script::Hold(vec![
                TransportEvent::Opened,
                message("Playing", 1),
                message("Playing", 2),
            ])]),
            connects: Arc::clone(&connects),
        };
        let slot: Arc<Mutex<Option<ChannelHandle>>> = Arc::default();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let slot_clone = Arc::clone(&slot);
        let seen_clone = Arc::clone(&seen);
        let (handle, task) = StateChannel::builder(connector, RecordingSleeper::default())
            .open(
                "game-42",
                move |s: TestState| {
                    seen_clone.lock().unwrap().push(s);
                    if let Some(handle) = slot_clone.lock().unwrap().as_ref() {
                        handle.close();
                    }
                },
                |_| panic!("no fatal error expected"),
            )
            .unwrap();
        *slot.lock().unwrap() = Some(handle.clone());

        task.await;

        assert_eq!(*seen.lock().unwrap(), vec![state("Playing", 1)]);
        assert_eq!(handle.state(), ChannelState::Closed);
        assert_eq!(connects.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn refused_connections_consume_retries() {
        let observed = Observed::default();
        let scripts = (0..5).map(|_| Script::Refuse);
        let (_handle, task, connects, _) =
            open_channel(scripts, BackoffConfig::default(), &observed);

        task.await;

        assert_eq!(connects.load(Ordering::SeqCst), 5);
        assert_eq!(
            observed.errors(),
            vec![ChannelError::TransportFailed(
                "Could not connect: refused".to_string()
            )]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn transport_error_forces_close() {
        let observed = Observed::default();
        let scripts = (0..5).map(|_| {
            Script::Hold(vec![
                TransportEvent::Opened,
                TransportEvent::Error("boom".to_string()),
                message("Playing", 1),
            ])
        });
        let (_handle, task, connects, _) =
            open_channel(scripts, BackoffConfig::default(), &observed);

        task.await;

        assert_eq!(connects.load(Ordering::SeqCst), 5);
        assert!(observed.snapshots().is_empty());
        let errors = observed.errors();
        assert_eq!(errors, vec![ChannelError::TransportFailed("boom".to_string())]);
        assert_eq!(observed.transport_errors().len(), 5);
        assert_eq!(
            errors[0].to_string(),
            "Could not reconnect to server. Server connection error: boom"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn recovered_transport_error_is_reported() {
        let observed = Observed::default();
        let errored = Script::Events(vec![
            TransportEvent::Opened,
            TransportEvent::Error("boom".to_string()),
        ]);
        let live = Script::Hold(vec![TransportEvent::Opened, message("Playing", 1)]);
        let scripts = [errored, Script::Refuse, live];
        let (handle, task, connects, _) =
            open_channel(scripts, BackoffConfig::default(), &observed);
        tokio::spawn(task);

        tokio::time::sleep(Duration::from_secs(60)).await;

        assert_eq!(connects.load(Ordering::SeqCst), 3);
        assert_eq!(observed.snapshots(), vec![state("Playing", 1)]);
        assert_eq!(
            observed.transport_errors(),
            vec!["boom".to_string(), "Could not connect: refused".to_string()]
        );
        assert!(observed.errors().is_empty());
        assert_eq!(handle.state(), ChannelState::Open);
        handle.close();
    }

    #[tokio::test(start_paused = true)]
    async fn last_drop_decides_fatal_message() {
        let observed = Observed::default();
        let errored = Script::Events(vec![TransportEvent::Error("boom".to_string())]);
        let scripts = std::iter::once(errored).chain(drops(4));
        let (_handle, task, _, _) = open_channel(scripts, BackoffConfig::default(), &observed);

        task.await;

        assert_eq!(observed.errors(), vec![ChannelError::RetriesExhausted]);
    }

    #[tokio::test(start_paused = true)]
    async fn malformed_payload_is_fatal() {
        let observed = Observed::default();
        let live = Script::Hold(vec![
            TransportEvent::Opened,
            TransportEvent::Message("not json".to_string()),
            message("Playing", 1),
        ]);
        let (handle, task, connects, _) =
            open_channel(std::iter::once(live), BackoffConfig::default(), &observed);

        task.await;

        assert_eq!(connects.load(Ordering::SeqCst), 1);
        assert!(observed.snapshots().is_empty());
        let errors = observed.errors();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], ChannelError::Decode(_)));
        assert_eq!(handle.state(), ChannelState::Failed);
    }

    #[tokio::test(start_paused = true)]
    async fn state_transitions_are_reported() {
        let observed = Observed::default();
        let first = Script::Events(vec![
            TransportEvent::Opened,
            message("Playing", 1),
            TransportEvent::Closed,
        ]);
        let scripts = std::iter::once(first).chain(drops(4));
        let (_handle, task, _, _) = open_channel(scripts, BackoffConfig::default(), &observed);

        task.await;

        use ChannelState::*;
        assert_eq!(
            observed.states(),
            vec![
                Open,
                ReconnectPending,
                Connecting,
                ReconnectPending,
                Connecting,
                ReconnectPending,
                Connecting,
                ReconnectPending,
                Connecting,
                Failed,
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_policy_is_applied() {
        let observed = Observed::default();
        let (_handle, task, _, sleeper) =
            open_channel(drops(5), BackoffConfig::default(), &observed);
        task.await;
        assert_eq!(sleeper.millis(), vec![500, 1000, 2000, 4000]);

        let observed = Observed::default();
        let (_handle, task, _, sleeper) =
            open_channel(drops(5), InverseBudgetBackoff::default(), &observed);
        task.await;
        assert_eq!(sleeper.millis(), vec![500, 666, 1000, 2000]);
    }
}
