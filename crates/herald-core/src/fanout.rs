//! Concurrent event fanout to registered listeners.
//!
//! Every call to [`EventFanoutManager::handle`] turns into one task per
//! listener in the current snapshot. Tasks run on the runtime captured at
//! construction and wait for a semaphore permit inside the task, so `handle`
//! itself never blocks.
//!
//! A listener that returns an error, panics or (when configured) times out is
//! logged at error level. Nothing it does reaches other listeners or the
//! caller.

use crate::error::FanoutError;
use async_trait::async_trait;
use futures_util::FutureExt;
use parking_lot::RwLock;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

/// Receives events from an [`EventFanoutManager`].
#[async_trait]
pub trait EventListener<E>: Send + Sync
where
    E: Send + Sync + 'static,
{
    async fn on_event(&self, event: Arc<E>) -> anyhow::Result<()>;

    /// Name used in log fields.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Listener backed by an async closure.
pub struct FnListener<F> {
    name: String,
    f: F,
}

impl<F> FnListener<F> {
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

#[async_trait]
impl<E, F, Fut> EventListener<E> for FnListener<F>
where
    E: Send + Sync + 'static,
    F: Fn(Arc<E>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    async fn on_event(&self, event: Arc<E>) -> anyhow::Result<()> {
        (self.f)(event).await
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Worker pool limits.
#[derive(Debug, Clone)]
pub struct FanoutConfig {
    /// Listener invocations allowed to run at once.
    pub max_concurrency: usize,
    /// Upper bound on a single listener invocation. `None` waits forever.
    pub listener_timeout: Option<Duration>,
}

impl Default for FanoutConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 64,
            listener_timeout: None,
        }
    }
}

struct ListenerSet<E: Send + Sync + 'static> {
    entries: im::Vector<Arc<dyn EventListener<E>>>,
    shut_down: bool,
}

pub struct EventFanoutManager<E: Send + Sync + 'static> {
    listeners: RwLock<ListenerSet<E>>,
    permits: Arc<Semaphore>,
    tracker: TaskTracker,
    runtime: Handle,
    listener_timeout: Option<Duration>,
}

impl<E: Send + Sync + 'static> EventFanoutManager<E> {
    /// Create a manager on the current tokio runtime.
    pub fn new(config: FanoutConfig) -> Result<Self, FanoutError> {
        Ok(Self::with_runtime(config, Handle::try_current()?))
    }

    pub fn with_runtime(config: FanoutConfig, runtime: Handle) -> Self {
        // A zero-permit semaphore would park every task forever.
        let permits = config.max_concurrency.max(1);
        Self {
            listeners: RwLock::new(ListenerSet {
                entries: im::Vector::new(),
                shut_down: false,
            }),
            permits: Arc::new(Semaphore::new(permits)),
            tracker: TaskTracker::new(),
            runtime,
            listener_timeout: config.listener_timeout,
        }
    }

    /// Add a listener. Registering the same listener twice delivers every
    /// event to it twice.
    pub fn register(&self, listener: Arc<dyn EventListener<E>>) -> Result<(), FanoutError> {
        let mut set = self.listeners.write();
        if set.shut_down {
            return Err(FanoutError::ShutDown);
        }
        debug!(listener = listener.name(), "listener registered");
        set.entries.push_back(listener);
        Ok(())
    }

    /// Remove the first registration of `listener` (compared by identity).
    /// Returns whether anything was removed.
    pub fn unregister(&self, listener: &Arc<dyn EventListener<E>>) -> bool {
        let mut set = self.listeners.write();
        let Some(index) = set.entries.iter().position(|l| Arc::ptr_eq(l, listener)) else {
            return false;
        };
        set.entries.remove(index);
        debug!(listener = listener.name(), "listener unregistered");
        true
    }

    /// Point-in-time copy of the listener list, in registration order.
    pub fn listeners(&self) -> im::Vector<Arc<dyn EventListener<E>>> {
        self.listeners.read().entries.clone()
    }

    /// Deliver `event` to every registered listener.
    ///
    /// Returns the number of deliveries scheduled. After shutdown nothing is
    /// scheduled and 0 is returned.
    pub fn handle(&self, event: E) -> usize {
        self.handle_shared(Arc::new(event))
    }

    pub fn handle_shared(&self, event: Arc<E>) -> usize {
        // Held across spawning so shutdown cannot slip in between the flag
        // check and the tracker seeing the tasks.
        let set = self.listeners.read();
        if set.shut_down {
            warn!("event dropped after fanout shutdown");
            return 0;
        }

        for listener in set.entries.iter() {
            let listener = Arc::clone(listener);
            let event = Arc::clone(&event);
            let permits = Arc::clone(&self.permits);
            let limit = self.listener_timeout;
            self.tracker.spawn_on(
                async move {
                    let Ok(_permit) = permits.acquire_owned().await else {
                        return;
                    };
                    deliver(listener.as_ref(), event, limit).await;
                },
                &self.runtime,
            );
        }
        set.entries.len()
    }

    /// Deliveries scheduled or running.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    pub fn is_shut_down(&self) -> bool {
        self.listeners.read().shut_down
    }

    /// Stop accepting events and wait for every scheduled delivery to
    /// finish. Running listeners are not cancelled.
    pub async fn shutdown(&self) {
        {
            let mut set = self.listeners.write();
            if set.shut_down {
                return;
            }
            set.shut_down = true;
        }
        self.tracker.close();
        info!(in_flight = self.tracker.len(), "draining event fanout");
        self.tracker.wait().await;
        info!("event fanout drained");
    }
}

impl<E: Send + Sync + 'static> std::fmt::Debug for EventFanoutManager<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let set = self.listeners.read();
        f.debug_struct("EventFanoutManager")
            .field("listeners", &set.entries.len())
            .field("shut_down", &set.shut_down)
            .field("in_flight", &self.tracker.len())
            .field("available_permits", &self.permits.available_permits())
            .finish_non_exhaustive()
    }
}

async fn deliver<E>(listener: &dyn EventListener<E>, event: Arc<E>, limit: Option<Duration>)
where
    E: Send + Sync + 'static,
{
    let name = listener.name();
    let call = AssertUnwindSafe(listener.on_event(event)).catch_unwind();

    let outcome = match limit {
        Some(limit) => match tokio::time::timeout(limit, call).await {
            Ok(outcome) => outcome,
            Err(_) => {
                error!(
                    listener = name,
                    timeout_ms = u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
                    "listener timed out"
                );
                return;
            }
        },
        None => call.await,
    };

    match outcome {
        Ok(Ok(())) => debug!(listener = name, "event delivered"),
        Ok(Err(e)) => error!(listener = name, error = %e, "listener failed"),
        Err(panic) => error!(
            listener = name,
            panic = panic_message(panic.as_ref()),
            "listener panicked"
        ),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named;

    #[async_trait]
    impl EventListener<u32> for Named {
        async fn on_event(&self, _event: Arc<u32>) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn default_name_is_type_name() {
        let listener = Named;
        assert!(EventListener::<u32>::name(&listener).ends_with("Named"));
    }

    #[test]
    fn new_outside_runtime_fails() {
        let result = EventFanoutManager::<u32>::new(FanoutConfig::default());
        assert!(matches!(result, Err(FanoutError::NoRuntime(_))));
    }

    #[test]
    fn panic_payloads_are_readable() {
        let boxed: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(boxed.as_ref()), "boom");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(boxed.as_ref()), "owned");
        let boxed: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(boxed.as_ref()), "non-string panic payload");
    }
}
