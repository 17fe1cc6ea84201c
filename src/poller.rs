use crate::session::Session;
use crate::view::View;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, trace};

pub const DEFAULT_PERIOD: Duration = Duration::from_secs(5);

/// Periodically reconciles a session with the shared store and redraws the
/// visible part of its view. Stopped when dropped.
pub struct Poller<V: View + 'static> {
    session: Arc<Mutex<Session>>,
    view: Arc<Mutex<V>>,
    period: Duration,
    handle: Option<JoinHandle<()>>,
}

impl<V: View + 'static> Poller<V> {
    pub fn new(session: Arc<Mutex<Session>>, view: Arc<Mutex<V>>, period: Duration) -> Self {
        Self {
            session,
            view,
            period,
            handle: None,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Arm the timer, replacing any running one. The first refresh happens
    /// one period from now. Must be called from within a tokio runtime.
    pub fn start(&mut self) {
        self.stop();
        let session = Arc::clone(&self.session);
        let view = Arc::clone(&self.view);
        let period = self.period;
        self.handle = Some(tokio::spawn(async move {
            let mut ticks = interval_at(Instant::now() + period, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticks.tick().await;
                refresh(&session, &view).await;
            }
        }));
        debug!(period = ?self.period, "poller started");
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            debug!("poller stopped");
        }
    }

    /// Run one refresh immediately, outside of the timer.
    pub async fn refresh_now(&self) {
        refresh(&self.session, &self.view).await;
    }
}

impl<V: View + 'static> Drop for Poller<V> {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn refresh<V: View>(session: &Mutex<Session>, view: &Mutex<V>) {
    let mut session = session.lock().await;
    let Some(partition) = session.refresh().await else {
        trace!(session = %session.id(), "refresh without logged-in user");
        return;
    };
    if let Some(user) = session.user() {
        trace!(session = %session.id(), ?partition, "redrawing");
        view.lock().await.render(partition, session.snapshot(), user);
    }
}
