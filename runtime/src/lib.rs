//! # Bazaar Runtime
//!
//! Runtime implementation for the Bazaar reducer architecture.
//!
//! This crate provides the Store runtime that coordinates reducer execution
//! and effect handling.
//!
//! ## Core Components
//!
//! - **Store**: The runtime that manages state and executes effects
//! - **Effect Executor**: Executes effect descriptions and feeds actions back to reducers
//! - **Cancellation registry**: Tracks in-flight [`Effect::Cancellable`] tasks by id
//!
//! ## Example
//!
//! ```ignore
//! use bazaar_runtime::Store;
//!
//! let store = Store::new(initial_state, my_reducer, environment);
//!
//! // Send an action
//! store.send(Action::DoSomething).await?;
//!
//! // Read state
//! let value = store.state(|s| s.some_field).await;
//! ```

use bazaar_core::{effect::Effect, effect::EffectId, reducer::Reducer};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{watch, RwLock};

pub use error::StoreError;
pub use store::Store;

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug)]
    pub enum StoreError {
        /// Store is shutting down and not accepting new actions
        ///
        /// This error is returned when `send()` is called after shutdown initiated.
        #[error("Store is shutting down")]
        ShutdownInProgress,

        /// Shutdown timed out waiting for effects to complete
        ///
        /// Some effects were still running when the timeout elapsed.
        #[error("Shutdown timed out with {0} effects still running")]
        ShutdownTimeout(usize),

        /// Timed out waiting for the effects of an action to finish
        #[error("Timeout waiting for effects")]
        Timeout,
    }
}

/// Configuration for Store instances
///
/// # Example
///
/// ```
/// use bazaar_runtime::StoreConfig;
/// use std::time::Duration;
///
/// let config = StoreConfig::default()
///     .with_broadcast_capacity(64)
///     .with_shutdown_timeout(Duration::from_secs(5));
/// assert_eq!(config.broadcast_capacity, 64);
/// ```
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Number of effect-produced actions buffered for slow observers
    pub broadcast_capacity: usize,
    /// Default timeout for graceful shutdown
    pub default_shutdown_timeout: Duration,
}

impl StoreConfig {
    /// Set the action broadcast capacity
    #[must_use]
    pub const fn with_broadcast_capacity(mut self, capacity: usize) -> Self {
        self.broadcast_capacity = capacity;
        self
    }

    /// Set the default shutdown timeout
    #[must_use]
    pub const fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.default_shutdown_timeout = timeout;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            broadcast_capacity: 16,
            default_shutdown_timeout: Duration::from_secs(30),
        }
    }
}

/// Handle for tracking effect completion
///
/// Returned by [`Store::send()`] to allow waiting for the effects started by
/// that action to complete. Effects that are aborted through cancellation
/// count as complete.
///
/// # Example
///
/// ```ignore
/// let mut handle = store.send(Action::Start).await?;
/// handle.wait_with_timeout(Duration::from_secs(5)).await?;
/// ```
#[derive(Clone)]
pub struct EffectHandle {
    effects: Arc<AtomicUsize>,
    completion: watch::Receiver<()>,
}

impl EffectHandle {
    /// Create a new effect handle together with its internal tracking side
    fn new() -> (Self, EffectTracking) {
        let counter = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = watch::channel(());

        let handle = Self {
            effects: Arc::clone(&counter),
            completion: rx,
        };

        let tracking = EffectTracking {
            counter,
            notifier: Arc::new(tx),
        };

        (handle, tracking)
    }

    /// Create a handle that's already complete
    #[must_use]
    pub fn completed() -> Self {
        let (handle, _tracking) = Self::new();
        handle
    }

    /// Number of effects from this action that are still running
    #[must_use]
    pub fn pending(&self) -> usize {
        self.effects.load(Ordering::SeqCst)
    }

    /// Wait for all effects to complete
    pub async fn wait(&mut self) {
        while self.effects.load(Ordering::SeqCst) > 0 {
            if self.completion.changed().await.is_err() {
                break;
            }
        }
    }

    /// Wait for all effects to complete with a timeout
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Timeout`] if the timeout expires before all effects complete.
    pub async fn wait_with_timeout(&mut self, timeout: Duration) -> Result<(), StoreError> {
        tokio::time::timeout(timeout, self.wait())
            .await
            .map_err(|_| StoreError::Timeout)
    }
}

impl std::fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectHandle")
            .field("pending_effects", &self.effects.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

/// Internal: Effect tracking context passed through effect execution
#[derive(Clone)]
struct EffectTracking {
    counter: Arc<AtomicUsize>,
    notifier: Arc<watch::Sender<()>>,
}

impl EffectTracking {
    /// Tracking for effects started outside of `send` (nobody waits on it)
    fn detached() -> Self {
        EffectHandle::new().1
    }

    /// Increment the effect counter (effect started)
    fn increment(&self) {
        self.counter.fetch_add(1, Ordering::SeqCst);
    }

    /// Decrement the effect counter (effect completed)
    fn decrement(&self) {
        if self.counter.fetch_sub(1, Ordering::SeqCst) == 1 {
            // Counter reached zero, notify waiters
            let _ = self.notifier.send(());
        }
    }
}

/// Internal: RAII guard that decrements effect counter on drop
///
/// Runs on completion, on panic and when the task is aborted.
struct DecrementGuard(EffectTracking);

impl Drop for DecrementGuard {
    fn drop(&mut self) {
        self.0.decrement();
    }
}

/// Guard that decrements an atomic counter on drop (for shutdown tracking)
struct AtomicCounterGuard(Arc<AtomicUsize>);

impl Drop for AtomicCounterGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// An in-flight cancellable effect
struct InFlight {
    generation: u64,
    handle: tokio::task::AbortHandle,
}

type Registry = Arc<Mutex<HashMap<EffectId, InFlight>>>;

fn lock_registry(
    registry: &Mutex<HashMap<EffectId, InFlight>>,
) -> MutexGuard<'_, HashMap<EffectId, InFlight>> {
    // The map holds no invariants a panicking holder could break.
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Store runtime for coordinating reducer execution and effect handling.
pub mod store {
    use super::{
        lock_registry, Arc, AtomicBool, AtomicCounterGuard, AtomicU64, AtomicUsize,
        DecrementGuard, Duration, Effect, EffectHandle, EffectId, EffectTracking, HashMap,
        InFlight, Mutex, Ordering, Reducer, Registry, RwLock, StoreConfig, StoreError,
    };
    use futures::future::BoxFuture;
    use tokio::sync::broadcast;

    /// The Store - runtime coordinator for a reducer
    ///
    /// The Store manages:
    /// 1. State (behind `RwLock` for concurrent access)
    /// 2. Reducer (business logic)
    /// 3. Environment (injected dependencies)
    /// 4. Effect execution (with feedback loop)
    ///
    /// Cloning a Store is cheap; clones share state and effects.
    ///
    /// # Type Parameters
    ///
    /// - `S`: State type
    /// - `A`: Action type
    /// - `E`: Environment type
    /// - `R`: Reducer implementation
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        state: Arc<RwLock<S>>,
        reducer: Arc<R>,
        environment: Arc<E>,
        shutdown: Arc<AtomicBool>,
        pending_effects: Arc<AtomicUsize>,
        in_flight: Registry,
        generations: Arc<AtomicU64>,
        shutdown_timeout: Duration,
        /// Actions produced by effects (e.g. a fired `Effect::Delay`) are
        /// broadcast to observers after the store has applied them.
        action_broadcast: broadcast::Sender<A>,
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        fn clone(&self) -> Self {
            Self {
                state: Arc::clone(&self.state),
                reducer: Arc::clone(&self.reducer),
                environment: Arc::clone(&self.environment),
                shutdown: Arc::clone(&self.shutdown),
                pending_effects: Arc::clone(&self.pending_effects),
                in_flight: Arc::clone(&self.in_flight),
                generations: Arc::clone(&self.generations),
                shutdown_timeout: self.shutdown_timeout,
                action_broadcast: self.action_broadcast.clone(),
            }
        }
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
        A: Send + Clone + 'static,
        S: Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        /// Create a new store with initial state, reducer, and environment
        ///
        /// Uses [`StoreConfig::default()`].
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            Self::with_config(initial_state, reducer, environment, &StoreConfig::default())
        }

        /// Create a new Store with custom configuration
        #[must_use]
        pub fn with_config(
            initial_state: S,
            reducer: R,
            environment: E,
            config: &StoreConfig,
        ) -> Self {
            let (action_broadcast, _) = broadcast::channel(config.broadcast_capacity.max(1));

            Self {
                state: Arc::new(RwLock::new(initial_state)),
                reducer: Arc::new(reducer),
                environment: Arc::new(environment),
                shutdown: Arc::new(AtomicBool::new(false)),
                pending_effects: Arc::new(AtomicUsize::new(0)),
                in_flight: Arc::new(Mutex::new(HashMap::new())),
                generations: Arc::new(AtomicU64::new(0)),
                shutdown_timeout: config.default_shutdown_timeout,
                action_broadcast,
            }
        }

        /// Send an action to the store
        ///
        /// 1. Acquires write lock on state
        /// 2. Calls reducer with (state, action, environment)
        /// 3. Starts the returned effects on the tokio runtime
        /// 4. Effects may produce more actions (feedback loop)
        ///
        /// `send()` returns after starting effect execution, not completion.
        /// Use the returned [`EffectHandle`] to wait for the effects.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub async fn send(&self, action: A) -> Result<EffectHandle, StoreError> {
            if self.shutdown.load(Ordering::Acquire) {
                tracing::warn!("Rejected action: store is shutting down");
                metrics::counter!("store.shutdown.rejected_actions").increment(1);
                return Err(StoreError::ShutdownInProgress);
            }

            tracing::debug!("Processing action");
            metrics::counter!("store.commands.total").increment(1);

            let (handle, tracking) = EffectHandle::new();

            let effects = {
                let mut state = self.state.write().await;
                tracing::trace!("Acquired write lock on state");

                let start = std::time::Instant::now();
                let effects = self.reducer.reduce(&mut *state, action, &self.environment);
                metrics::histogram!("store.reducer.duration_seconds")
                    .record(start.elapsed().as_secs_f64());

                tracing::trace!("Reducer completed, returned {} effects", effects.len());
                effects
            };

            for effect in effects {
                self.execute_effect_internal(effect, tracking.clone());
            }

            Ok(handle)
        }

        /// Run an effect that did not come from the reducer
        ///
        /// Callers that sequence an action with a side effect of their own
        /// (for example a timed auto-dismiss) hand the effect to the store so
        /// that it takes part in cancellation, feedback and shutdown tracking.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
        pub fn run_effect(&self, effect: Effect<A>) -> Result<EffectHandle, StoreError> {
            if self.shutdown.load(Ordering::Acquire) {
                return Err(StoreError::ShutdownInProgress);
            }

            let (handle, tracking) = EffectHandle::new();
            self.execute_effect_internal(effect, tracking);
            Ok(handle)
        }

        /// Subscribe to actions produced by effects
        ///
        /// Only actions produced by effects are broadcast (not actions sent
        /// directly via `send`). Each action is broadcast after the reducer
        /// has applied it.
        #[must_use]
        pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
            self.action_broadcast.subscribe()
        }

        /// Read current state via a closure
        ///
        /// ```ignore
        /// let count = store.state(|s| s.items.len()).await;
        /// ```
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.state.read().await;
            f(&*state)
        }

        /// Shutdown timeout taken from [`StoreConfig::default_shutdown_timeout`]
        #[must_use]
        pub const fn shutdown_timeout(&self) -> Duration {
            self.shutdown_timeout
        }

        /// Whether a cancellable effect is currently registered under `id`
        #[must_use]
        pub fn is_in_flight(&self, id: &EffectId) -> bool {
            lock_registry(&self.in_flight).contains_key(id)
        }

        /// Number of effects currently running across all actions
        #[must_use]
        pub fn pending_effects(&self) -> usize {
            self.pending_effects.load(Ordering::Acquire)
        }

        /// Initiate graceful shutdown of the store
        ///
        /// 1. Sets the shutdown flag (rejecting new actions)
        /// 2. Aborts registered cancellable effects
        /// 3. Waits for the remaining effects to complete (with timeout)
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownTimeout`] if the timeout expires before all
        /// pending effects complete.
        pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
            tracing::info!("Initiating graceful shutdown");
            metrics::counter!("store.shutdown.initiated").increment(1);

            self.shutdown.store(true, Ordering::Release);

            let aborted: Vec<InFlight> = lock_registry(&self.in_flight)
                .drain()
                .map(|(_, in_flight)| in_flight)
                .collect();
            for in_flight in &aborted {
                in_flight.handle.abort();
            }
            if !aborted.is_empty() {
                tracing::debug!(count = aborted.len(), "Aborted cancellable effects");
            }

            let start = tokio::time::Instant::now();
            let poll_interval = Duration::from_millis(10);

            loop {
                let pending = self.pending_effects.load(Ordering::Acquire);

                if pending == 0 {
                    tracing::info!("All effects completed, shutdown successful");
                    metrics::counter!("store.shutdown.completed").increment(1);
                    return Ok(());
                }

                if start.elapsed() >= timeout {
                    tracing::error!(
                        pending_effects = pending,
                        "Shutdown timeout: {} effects still running", pending
                    );
                    metrics::counter!("store.shutdown.timeout").increment(1);
                    return Err(StoreError::ShutdownTimeout(pending));
                }

                tokio::time::sleep(poll_interval).await;
            }
        }

        /// Feed an effect-produced action back into the store, then broadcast it
        async fn feed_back(&self, action: A) {
            match self.send(action.clone()).await {
                Ok(_) => {
                    // No receivers is fine
                    let _ = self.action_broadcast.send(action);
                },
                Err(error) => {
                    tracing::debug!(%error, "Dropped effect-produced action");
                },
            }
        }

        /// Drive an effect to completion on the current task
        fn drive(&self, effect: Effect<A>) -> BoxFuture<'static, ()> {
            let store = self.clone();
            Box::pin(async move {
                match effect {
                    Effect::None => {},
                    Effect::Future(fut) => {
                        if let Some(action) = fut.await {
                            tracing::trace!("Effect::Future produced an action, sending to store");
                            store.feed_back(action).await;
                        }
                    },
                    Effect::Delay { duration, action } => {
                        tokio::time::sleep(duration).await;
                        tracing::trace!("Effect::Delay completed, sending action");
                        store.feed_back(*action).await;
                    },
                    nested @ (Effect::Cancellable { .. } | Effect::Cancel(_)) => {
                        store.execute_effect_internal(nested, EffectTracking::detached());
                    },
                }
            })
        }

        /// Spawn a tracked task that drives `effect`
        fn spawn_tracked(
            &self,
            effect: Effect<A>,
            tracking: EffectTracking,
        ) -> tokio::task::JoinHandle<()> {
            tracking.increment();
            self.pending_effects.fetch_add(1, Ordering::SeqCst);
            let pending_guard = AtomicCounterGuard(Arc::clone(&self.pending_effects));
            let work = self.drive(effect);

            tokio::spawn(async move {
                let _guard = DecrementGuard(tracking);
                let _pending_guard = pending_guard;
                work.await;
            })
        }

        /// Abort the effect registered under `id`
        fn cancel_in_flight(&self, id: &EffectId) {
            if let Some(previous) = lock_registry(&self.in_flight).remove(id) {
                previous.handle.abort();
                metrics::counter!("store.effects.cancelled").increment(1);
                tracing::debug!(effect_id = %id, "Cancelled in-flight effect");
            }
        }

        /// Execute an effect with tracking
        ///
        /// - `None`: No-op
        /// - `Future` / `Delay`: spawned on a tracked task
        /// - `Cancellable`: aborts the previous task with the same id, then
        ///   spawns and registers a new one
        /// - `Cancel`: aborts the task registered under the id
        #[tracing::instrument(skip(self, effect, tracking), name = "execute_effect")]
        fn execute_effect_internal(&self, effect: Effect<A>, tracking: EffectTracking) {
            match effect {
                Effect::None => {
                    tracing::trace!("Executing Effect::None (no-op)");
                    metrics::counter!("store.effects.executed", "type" => "none").increment(1);
                },
                Effect::Cancel(id) => {
                    metrics::counter!("store.effects.executed", "type" => "cancel").increment(1);
                    self.cancel_in_flight(&id);
                },
                Effect::Cancellable { id, effect } => {
                    metrics::counter!("store.effects.executed", "type" => "cancellable")
                        .increment(1);
                    let generation = self.generations.fetch_add(1, Ordering::SeqCst);

                    // Hold the registry lock until the new task is registered so
                    // its own cleanup cannot run first.
                    let mut registry = lock_registry(&self.in_flight);
                    if let Some(previous) = registry.remove(&id) {
                        previous.handle.abort();
                        metrics::counter!("store.effects.cancelled").increment(1);
                        tracing::debug!(effect_id = %id, "Replaced in-flight effect");
                    }

                    let registry_ref = Arc::clone(&self.in_flight);
                    let task_id = id.clone();
                    let inner = self.drive(*effect);
                    let task = self.spawn_tracked(
                        Effect::Future(Box::pin(async move {
                            inner.await;
                            let mut registry = lock_registry(&registry_ref);
                            if registry
                                .get(&task_id)
                                .is_some_and(|entry| entry.generation == generation)
                            {
                                registry.remove(&task_id);
                            }
                            None
                        })),
                        tracking,
                    );

                    registry.insert(
                        id,
                        InFlight {
                            generation,
                            handle: task.abort_handle(),
                        },
                    );
                },
                effect @ (Effect::Future(_) | Effect::Delay { .. }) => {
                    let kind = if matches!(effect, Effect::Future(_)) {
                        "future"
                    } else {
                        "delay"
                    };
                    tracing::trace!("Executing Effect::{kind}");
                    metrics::counter!("store.effects.executed", "type" => kind).increment(1);
                    self.spawn_tracked(effect, tracking);
                },
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code
mod tests {
    use super::*;
    use bazaar_core::{smallvec, SmallVec};

    #[derive(Debug, Clone)]
    struct TestState {
        value: i32,
    }

    #[derive(Debug, Clone, PartialEq)]
    enum TestAction {
        Increment,
        Decrement,
        NoOp,
        ProduceEffect,
        ProduceDelayedAction,
        ProduceCancellableIncrement,
        CancelIncrement,
    }

    #[derive(Debug, Clone)]
    struct TestEnv;

    #[derive(Debug, Clone)]
    struct TestReducer;

    const INCREMENT_TIMER: EffectId = EffectId::new("test.increment");

    impl Reducer for TestReducer {
        type State = TestState;
        type Action = TestAction;
        type Environment = TestEnv;

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            match action {
                TestAction::Increment => {
                    state.value += 1;
                    smallvec![Effect::None]
                },
                TestAction::Decrement => {
                    state.value -= 1;
                    smallvec![Effect::None]
                },
                TestAction::NoOp => smallvec![Effect::None],
                TestAction::ProduceEffect => {
                    smallvec![Effect::Future(Box::pin(async { Some(TestAction::Increment) }))]
                },
                TestAction::ProduceDelayedAction => {
                    smallvec![Effect::Delay {
                        duration: Duration::from_millis(10),
                        action: Box::new(TestAction::Increment),
                    }]
                },
                TestAction::ProduceCancellableIncrement => {
                    smallvec![
                        Effect::Delay {
                            duration: Duration::from_secs(3),
                            action: Box::new(TestAction::Increment),
                        }
                        .cancellable(INCREMENT_TIMER)
                    ]
                },
                TestAction::CancelIncrement => smallvec![Effect::Cancel(INCREMENT_TIMER)],
            }
        }
    }

    fn store() -> Store<TestState, TestAction, TestEnv, TestReducer> {
        Store::new(TestState { value: 0 }, TestReducer, TestEnv)
    }

    #[tokio::test]
    async fn test_store_creation() {
        let value = store().state(|s| s.value).await;
        assert_eq!(value, 0);
    }

    #[tokio::test]
    async fn test_multiple_actions() {
        let store = store();

        store.send(TestAction::Increment).await.unwrap();
        store.send(TestAction::Increment).await.unwrap();
        store.send(TestAction::Decrement).await.unwrap();

        assert_eq!(store.state(|s| s.value).await, 1);
    }

    #[tokio::test]
    async fn test_effect_none() {
        let store = store();

        let handle = store.send(TestAction::NoOp).await.unwrap();
        assert_eq!(handle.pending(), 0);
        assert_eq!(store.state(|s| s.value).await, 0);
    }

    #[tokio::test]
    async fn test_effect_future() {
        let store = store();

        let mut handle = store.send(TestAction::ProduceEffect).await.unwrap();
        handle.wait_with_timeout(Duration::from_secs(1)).await.unwrap();

        assert_eq!(store.state(|s| s.value).await, 1);
    }

    #[tokio::test]
    async fn test_effect_delay() {
        let store = store();

        let mut handle = store.send(TestAction::ProduceDelayedAction).await.unwrap();
        assert_eq!(store.state(|s| s.value).await, 0);

        handle.wait_with_timeout(Duration::from_secs(1)).await.unwrap();
        assert_eq!(store.state(|s| s.value).await, 1);
    }

    #[tokio::test]
    async fn test_store_clone_shares_state() {
        let store = store();
        let clone = store.clone();

        clone.send(TestAction::Increment).await.unwrap();
        assert_eq!(store.state(|s| s.value).await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellable_replaces_previous() {
        let store = store();

        store.send(TestAction::ProduceCancellableIncrement).await.unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;

        let mut second = store.send(TestAction::ProduceCancellableIncrement).await.unwrap();
        assert!(store.is_in_flight(&INCREMENT_TIMER));

        // The first timer would have fired at t=3s
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(store.state(|s| s.value).await, 0);

        second.wait().await;
        assert_eq!(store.state(|s| s.value).await, 1);
        assert!(!store.is_in_flight(&INCREMENT_TIMER));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_aborts_in_flight() {
        let store = store();

        let mut handle = store.send(TestAction::ProduceCancellableIncrement).await.unwrap();
        store.send(TestAction::CancelIncrement).await.unwrap();

        handle.wait().await;
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(store.state(|s| s.value).await, 0);
        assert!(!store.is_in_flight(&INCREMENT_TIMER));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_effect_feeds_back() {
        let store = store();
        let mut rx = store.subscribe_actions();

        store
            .run_effect(bazaar_core::delay! {
                duration: Duration::from_secs(1),
                action: TestAction::Increment
            })
            .unwrap();

        assert_eq!(rx.recv().await.unwrap(), TestAction::Increment);
        assert_eq!(store.state(|s| s.value).await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_aborts_cancellables_and_rejects_actions() {
        let store = store();

        store.send(TestAction::ProduceCancellableIncrement).await.unwrap();
        store.shutdown(Duration::from_secs(1)).await.unwrap();

        assert_eq!(store.pending_effects(), 0);
        assert!(matches!(
            store.send(TestAction::Increment).await,
            Err(StoreError::ShutdownInProgress)
        ));
        assert!(store.run_effect(Effect::None).is_err());
    }

    #[test]
    fn test_shutdown_timeout_from_config() {
        assert_eq!(store().shutdown_timeout(), Duration::from_secs(30));

        let configured = Store::with_config(
            TestState { value: 0 },
            TestReducer,
            TestEnv,
            &StoreConfig::default().with_shutdown_timeout(Duration::from_millis(250)),
        );
        assert_eq!(configured.shutdown_timeout(), Duration::from_millis(250));
        assert_eq!(configured.clone().shutdown_timeout(), Duration::from_millis(250));
    }

    #[tokio::test]
    async fn test_completed_handle() {
        let mut handle = EffectHandle::completed();
        assert_eq!(handle.pending(), 0);
        tokio_test::assert_ok!(handle.wait_with_timeout(Duration::from_millis(10)).await);
    }
}
