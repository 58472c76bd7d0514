//! Supervisor: keeps the worker pool alive.
//!
//! Owns a map from unit identity to the task currently running that unit.
//! Workers and the failure worker report claim failures on two separate
//! fatal-signal channels; each signal is acknowledged, logged, and followed
//! by a jittered restart under the same identity.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::instrument::WithSubscriber;
use tracing::{Dispatch, Instrument, debug, error, info, info_span, warn};

use crate::app::backoff::Jitter;
use crate::app::failure_worker::FailureWorker;
use crate::app::unit::{FatalSender, FatalSignal, Unit, fatal_channel};
use crate::app::worker::Worker;
use crate::domain::{UnitId, UnitKind};
use crate::ports::{Clock, Connector, QueueStore};
use crate::queue::RetryPolicy;
use crate::runtime::TaskHandler;

/// Everything a supervisor needs; assembled by `SupervisorBuilder`.
pub(crate) struct Wiring {
    pub connector: Arc<dyn Connector>,
    pub worker_count: usize,
    pub handler: Arc<dyn TaskHandler>,
    pub escalation: Arc<dyn TaskHandler>,
    pub policy: RetryPolicy,
    pub dial_backoff: Jitter,
    pub restart_backoff: Jitter,
    pub clock: Arc<dyn Clock>,
    pub dispatch: Dispatch,
}

struct Inner {
    wiring: Wiring,
    worker_fatal: FatalSender,
    failure_fatal: FatalSender,
    units: Mutex<HashMap<UnitId, JoinHandle<()>>>,
    restarts: AtomicU64,
    aborted: AtomicBool,
}

/// A configured, not yet started pool.
pub struct Supervisor {
    inner: Arc<Inner>,
    worker_rx: mpsc::Receiver<FatalSignal>,
    failure_rx: mpsc::Receiver<FatalSignal>,
}

impl Supervisor {
    pub(crate) fn new(wiring: Wiring) -> Self {
        let (worker_fatal, worker_rx) = fatal_channel();
        let (failure_fatal, failure_rx) = fatal_channel();
        Self {
            inner: Arc::new(Inner {
                wiring,
                worker_fatal,
                failure_fatal,
                units: Mutex::new(HashMap::new()),
                restarts: AtomicU64::new(0),
                aborted: AtomicBool::new(false),
            }),
            worker_rx,
            failure_rx,
        }
    }

    pub fn task_type(&self) -> &str {
        self.inner.wiring.connector.keyspace().task_type()
    }

    pub fn worker_count(&self) -> usize {
        self.inner.wiring.worker_count
    }

    /// Launch `worker_count` workers and one failure worker, then the fatal
    /// signal dispatcher.
    pub async fn start(self) -> RunningPool {
        let Supervisor {
            inner,
            worker_rx,
            failure_rx,
        } = self;

        let dispatch = inner.wiring.dispatch.clone();
        tracing::dispatcher::with_default(&dispatch, || {
            info!(
                task_type = inner.wiring.connector.keyspace().task_type(),
                workers = inner.wiring.worker_count,
                "starting pool"
            );
        });

        for index in 0..inner.wiring.worker_count {
            launch(&inner, UnitId::worker(index)).await;
        }
        launch(&inner, UnitId::failure_worker(0)).await;

        let dispatcher = tokio::spawn(
            dispatch_loop(Arc::clone(&inner), worker_rx, failure_rx).with_subscriber(dispatch),
        );

        RunningPool { inner, dispatcher }
    }

    /// Start the pool and never return.
    pub async fn run(self) {
        self.start().await.wait().await;
    }
}

/// Handle to a started pool.
///
/// Dropping it leaves the pool running. `abort` tears every unit down on the
/// spot; in-flight tasks stay in their claim lists exactly as after a crash.
pub struct RunningPool {
    inner: Arc<Inner>,
    dispatcher: JoinHandle<()>,
}

impl RunningPool {
    /// Identities currently owned by the pool, sorted.
    pub async fn units(&self) -> Vec<UnitId> {
        let mut ids: Vec<UnitId> = self.inner.units.lock().await.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Identities whose current run loop has not exited.
    pub async fn live_units(&self) -> Vec<UnitId> {
        let mut ids: Vec<UnitId> = self
            .inner
            .units
            .lock()
            .await
            .iter()
            .filter(|(_, handle)| !handle.is_finished())
            .map(|(id, _)| *id)
            .collect();
        ids.sort();
        ids
    }

    /// Number of replacement units launched since start.
    pub fn restart_count(&self) -> u64 {
        self.inner.restarts.load(Ordering::SeqCst)
    }

    pub async fn abort(self) {
        self.dispatcher.abort();
        let mut units = self.inner.units.lock().await;
        self.inner.aborted.store(true, Ordering::SeqCst);
        for (id, handle) in units.drain() {
            debug!(unit = %id, "aborting unit");
            handle.abort();
        }
    }

    /// Wait on the dispatcher. It only returns if the dispatcher task is
    /// cancelled or panics.
    pub async fn wait(self) {
        if let Err(e) = self.dispatcher.await {
            error!(error = %e, "fatal signal dispatcher stopped");
        }
    }
}

/// Dial until a connection is up. Never gives up.
async fn dial(connector: &dyn Connector, backoff: Jitter) -> Box<dyn QueueStore> {
    loop {
        match connector.connect().await {
            Ok(store) => {
                debug!("connected");
                return store;
            }
            Err(e) => {
                warn!(error = %e, "dial failed");
                backoff.sleep().await;
            }
        }
    }
}

fn build_unit(inner: &Inner, id: UnitId, store: Box<dyn QueueStore>) -> Box<dyn Unit> {
    let wiring = &inner.wiring;
    match id.kind() {
        UnitKind::Worker => Box::new(
            Worker::new(
                id.index(),
                store,
                Arc::clone(&wiring.handler),
                inner.worker_fatal.clone(),
            )
            .with_clock(Arc::clone(&wiring.clock)),
        ),
        UnitKind::FailureWorker => Box::new(FailureWorker::new(
            id.index(),
            store,
            Arc::clone(&wiring.escalation),
            wiring.policy.clone(),
            inner.failure_fatal.clone(),
        )),
    }
}

/// Spawn the unit `id` on a fresh connection, replacing any previous handle.
async fn launch(inner: &Arc<Inner>, id: UnitId) {
    let this = Arc::clone(inner);
    let task_type = inner.wiring.connector.keyspace().task_type().to_string();
    let unit = async move {
        let span = info_span!("unit", unit = %id, task_type = %task_type);
        async move {
            let store = dial(this.wiring.connector.as_ref(), this.wiring.dial_backoff).await;
            let mut unit = build_unit(&this, id, store);
            unit.run().await;
        }
        .instrument(span)
        .await;
    }
    .with_subscriber(inner.wiring.dispatch.clone());

    let mut units = inner.units.lock().await;
    if inner.aborted.load(Ordering::SeqCst) {
        return;
    }
    units.insert(id, tokio::spawn(unit));
}

async fn dispatch_loop(
    inner: Arc<Inner>,
    mut worker_rx: mpsc::Receiver<FatalSignal>,
    mut failure_rx: mpsc::Receiver<FatalSignal>,
) {
    loop {
        let signal = tokio::select! {
            Some(signal) = worker_rx.recv() => signal,
            Some(signal) = failure_rx.recv() => signal,
            else => break,
        };
        let fatal = signal.acknowledge();
        error!(
            unit = %fatal.unit,
            task_type = %fatal.task_type,
            error = %fatal.source,
            "unit terminated"
        );

        let inner = Arc::clone(&inner);
        let id = fatal.unit;
        tokio::spawn(
            async move {
                inner.wiring.restart_backoff.sleep().await;
                inner.restarts.fetch_add(1, Ordering::SeqCst);
                info!(unit = %id, "restarting unit");
                launch(&inner, id).await;
            }
            .with_current_subscriber(),
        );
    }
}
