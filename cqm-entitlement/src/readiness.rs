//! Sticky one-shot readiness signals.
//!
//! A [`ReadinessSignal`] moves from pending to fired exactly once. Listeners
//! registered before or after the transition are each run exactly once, in
//! registration order, on the signal's delivery task. A listener never runs
//! inline inside [`ReadinessSignal::subscribe`] or [`ReadinessSignal::fire`].
//!
//! [`SignalRegistry`] names signals so unrelated collaborators can find them,
//! and tracks which of them the host must see fired before startup completes.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};

type Listener = Box<dyn FnOnce() + Send + 'static>;

enum State {
    Pending(Vec<Listener>),
    Fired,
}

struct Inner {
    name: String,
    state: Mutex<State>,
    fired: watch::Sender<bool>,
    delivery: mpsc::UnboundedSender<Listener>,
}

/// Process-wide one-shot event.
///
/// Cloning yields another handle to the same signal.
#[derive(Clone)]
pub struct ReadinessSignal {
    inner: Arc<Inner>,
}

impl ReadinessSignal {
    /// Create a pending signal whose listeners run on `handle`.
    pub fn new(name: impl Into<String>, handle: &Handle) -> Self {
        let name = name.into();
        let (delivery, mut queue) = mpsc::unbounded_channel::<Listener>();

        #[cfg(feature = "tracing")]
        let task_name = name.clone();
        handle.spawn(async move {
            while let Some(listener) = queue.recv().await {
                if catch_unwind(AssertUnwindSafe(listener)).is_err() {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(signal = %task_name, "readiness listener panicked");
                }
            }
        });

        let (fired, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                name,
                state: Mutex::new(State::Pending(Vec::new())),
                fired,
                delivery,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn is_fired(&self) -> bool {
        *self.inner.fired.borrow()
    }

    /// Register a listener. It runs once, after the signal fires.
    pub fn subscribe<F>(&self, listener: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let mut state = lock(&self.inner.state);
        match &mut *state {
            State::Pending(listeners) => listeners.push(Box::new(listener)),
            State::Fired => self.deliver(Box::new(listener)),
        }
    }

    /// Fire the signal. Returns `false` if it had already fired.
    pub fn fire(&self) -> bool {
        let mut state = lock(&self.inner.state);
        let State::Pending(listeners) = std::mem::replace(&mut *state, State::Fired) else {
            return false;
        };

        #[cfg(feature = "tracing")]
        tracing::debug!(
            signal = %self.inner.name,
            listeners = listeners.len(),
            "readiness signal fired"
        );

        for listener in listeners {
            self.deliver(listener);
        }
        self.inner.fired.send_replace(true);
        true
    }

    /// Wait until the signal has fired. Returns immediately if it already has.
    pub async fn wait(&self) {
        let mut fired = self.inner.fired.subscribe();
        // The sender lives in `inner`, which `self` keeps alive.
        let _ = fired.wait_for(|fired| *fired).await;
    }

    fn deliver(&self, listener: Listener) {
        if self.inner.delivery.send(listener).is_err() {
            #[cfg(feature = "tracing")]
            tracing::warn!(
                signal = %self.inner.name,
                "delivery task is gone, dropping readiness listener"
            );
        }
    }
}

impl std::fmt::Debug for ReadinessSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadinessSignal")
            .field("name", &self.inner.name)
            .field("fired", &self.is_fired())
            .finish()
    }
}

/// Named sticky signals plus the set the host waits on during startup.
pub struct SignalRegistry {
    handle: Handle,
    signals: RwLock<HashMap<String, ReadinessSignal>>,
    required: Mutex<Vec<String>>,
}

impl SignalRegistry {
    /// Create an empty registry whose signals deliver on `handle`.
    pub fn new(handle: Handle) -> Self {
        Self {
            handle,
            signals: RwLock::new(HashMap::new()),
            required: Mutex::new(Vec::new()),
        }
    }

    /// Create a registry on the current Tokio runtime.
    ///
    /// Returns `None` outside a runtime context.
    pub fn current() -> Option<Self> {
        Handle::try_current().ok().map(Self::new)
    }

    /// Return the signal called `name`, creating it if needed.
    pub fn create_sticky(&self, name: &str) -> ReadinessSignal {
        let mut signals = self
            .signals
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        signals
            .entry(name.to_string())
            .or_insert_with(|| ReadinessSignal::new(name, &self.handle))
            .clone()
    }

    pub fn get(&self, name: &str) -> Option<ReadinessSignal> {
        self.signals
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Mark `name` as required before startup is complete.
    pub fn wait_for_initialization(&self, name: &str) -> ReadinessSignal {
        let signal = self.create_sticky(name);
        let mut required = lock(&self.required);
        if !required.iter().any(|r| r == name) {
            required.push(name.to_string());
        }
        signal
    }

    /// Required signals that have not fired yet, in registration order.
    pub fn pending_initialization(&self) -> Vec<String> {
        self.required_signals()
            .into_iter()
            .filter(|signal| !signal.is_fired())
            .map(|signal| signal.name().to_string())
            .collect()
    }

    /// Resolve once every signal marked required at call time has fired.
    pub async fn initialized(&self) {
        for signal in self.required_signals() {
            signal.wait().await;
        }
    }

    fn required_signals(&self) -> Vec<ReadinessSignal> {
        let required = lock(&self.required).clone();
        required
            .iter()
            .filter_map(|name| self.get(name))
            .collect()
    }
}

impl std::fmt::Debug for SignalRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let signals = self
            .signals
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("SignalRegistry")
            .field("signals", &signals.keys().collect::<Vec<_>>())
            .field("required", &*lock(&self.required))
            .finish()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
