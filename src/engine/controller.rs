use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::error::SessionError;
use crate::types::Outcome;
use super::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimulationStatus {
    Idle,
    Running,
    Stopped,
    Finished,
}

impl std::fmt::Display for SimulationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimulationStatus::Idle => write!(f, "Idle"),
            SimulationStatus::Running => write!(f, "Running"),
            SimulationStatus::Stopped => write!(f, "Stopped"),
            SimulationStatus::Finished => write!(f, "Finished"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulationState {
    pub status: SimulationStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub hands_played: u64,
}

/// Paces a session on a timer. Each tick locks the session for exactly one
/// round, and a stop request is honoured at the next round boundary.
pub struct SimulationController {
    session: Arc<Mutex<Session>>,
    interval: Duration,
    is_running: AtomicBool,
    stop_requested: AtomicBool,
    started_at: RwLock<Option<DateTime<Utc>>>,
    hands_played: AtomicU64,
    last_status: RwLock<SimulationStatus>,
    status_tx: broadcast::Sender<SimulationStatus>,
}

impl SimulationController {
    pub fn new(session: Session) -> Self {
        let interval = Duration::from_millis(session.config().session.interval_ms.max(1));
        let (status_tx, _) = broadcast::channel(32);
        Self {
            session: Arc::new(Mutex::new(session)),
            interval,
            is_running: AtomicBool::new(false),
            stop_requested: AtomicBool::new(false),
            started_at: RwLock::new(None),
            hands_played: AtomicU64::new(0),
            last_status: RwLock::new(SimulationStatus::Idle),
            status_tx,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval.max(Duration::from_millis(1));
        self
    }

    pub fn session(&self) -> Arc<Mutex<Session>> {
        Arc::clone(&self.session)
    }

    async fn publish(&self, status: SimulationStatus) {
        *self.last_status.write().await = status;
        let _ = self.status_tx.send(status);
    }

    /// Plays up to `hands` hands and returns how many were played.
    pub async fn run(&self, hands: u64) -> Result<u64, SessionError> {
        if self.is_running.swap(true, Ordering::AcqRel) {
            return Err(SessionError::AlreadyRunning);
        }
        self.stop_requested.store(false, Ordering::Release);
        self.hands_played.store(0, Ordering::Relaxed);
        *self.started_at.write().await = Some(Utc::now());

        info!(hands, interval_ms = self.interval.as_millis() as u64, "Simulation started");
        self.publish(SimulationStatus::Running).await;

        let mut ticker = tokio::time::interval(self.interval);
        let mut played = 0u64;
        let mut stopped = false;
        let result = loop {
            if played >= hands {
                break Ok(());
            }
            ticker.tick().await;
            if self.stop_requested.load(Ordering::Acquire) {
                stopped = true;
                break Ok(());
            }

            let mut session = self.session.lock().await;
            match session.play_hand() {
                Ok(summary) => {
                    played += 1;
                    self.hands_played.fetch_add(1, Ordering::Relaxed);
                    debug!(
                        hand = summary.hand,
                        outcome = %summary.outcome,
                        bankroll = %summary.bankroll,
                        "Round complete"
                    );
                }
                Err(e) => break Err(e),
            }
        };

        self.is_running.store(false, Ordering::Release);
        let status = if stopped {
            SimulationStatus::Stopped
        } else {
            SimulationStatus::Finished
        };
        info!(played, status = %status, "Simulation ended");
        self.publish(status).await;

        result.map(|_| played)
    }

    /// Asks a running simulation to stop after the current round.
    pub fn stop(&self) -> Result<(), SessionError> {
        if !self.is_running.load(Ordering::Acquire) {
            return Err(SessionError::NotRunning);
        }
        self.stop_requested.store(true, Ordering::Release);
        info!("Simulation stop requested");
        Ok(())
    }

    pub async fn undo(&self) -> Result<Outcome, SessionError> {
        if self.is_running.load(Ordering::Acquire) {
            warn!("Undo refused while the simulation is running");
            return Err(SessionError::SimulationRunning);
        }
        self.session.lock().await.undo()
    }

    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::Acquire)
    }

    pub async fn get_state(&self) -> SimulationState {
        SimulationState {
            status: *self.last_status.read().await,
            started_at: *self.started_at.read().await,
            hands_played: self.hands_played.load(Ordering::Relaxed),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SimulationStatus> {
        self.status_tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulatorConfig;
    use tokio_test::{assert_err, assert_ok};

    fn controller() -> Arc<SimulationController> {
        let mut config = SimulatorConfig::default();
        config.table.seed = Some(11);
        let session = Session::new(config).unwrap();
        Arc::new(SimulationController::new(session).with_interval(Duration::from_millis(1)))
    }

    #[tokio::test]
    async fn test_run_plays_requested_hands() {
        let controller = controller();
        let mut status = controller.subscribe();

        let played = assert_ok!(controller.run(25).await);
        assert_eq!(played, 25);
        assert_eq!(status.recv().await.unwrap(), SimulationStatus::Running);
        assert_eq!(status.recv().await.unwrap(), SimulationStatus::Finished);

        let state = controller.get_state().await;
        assert_eq!(state.status, SimulationStatus::Finished);
        assert_eq!(state.hands_played, 25);
        assert!(state.started_at.is_some());
        assert_eq!(controller.session().lock().await.history().len(), 25);
    }

    #[tokio::test]
    async fn test_stop_is_honoured_at_round_boundary() {
        let controller = controller();
        let mut status = controller.subscribe();

        let runner = {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move { controller.run(100_000).await })
        };
        assert_eq!(status.recv().await.unwrap(), SimulationStatus::Running);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_ok!(controller.stop());

        let played = runner.await.unwrap().unwrap();
        assert!(played < 100_000);
        assert_eq!(status.recv().await.unwrap(), SimulationStatus::Stopped);
        assert!(!controller.is_running());

        let session = controller.session();
        let session = session.lock().await;
        assert_eq!(session.history().len() as u64, played);
        assert_eq!(session.hands(), played);
    }

    #[tokio::test]
    async fn test_undo_and_second_run_refused_while_running() {
        let controller = controller();
        let mut status = controller.subscribe();

        let runner = {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move { controller.run(100_000).await })
        };
        assert_eq!(status.recv().await.unwrap(), SimulationStatus::Running);

        assert!(matches!(controller.undo().await, Err(SessionError::SimulationRunning)));
        assert!(matches!(controller.run(5).await, Err(SessionError::AlreadyRunning)));

        assert_ok!(controller.stop());
        assert_ok!(runner.await.unwrap());
    }

    #[tokio::test]
    async fn test_undo_after_run() {
        let controller = controller();
        assert_ok!(controller.run(3).await);
        assert_ok!(controller.undo().await);
        assert_eq!(controller.session().lock().await.history().len(), 2);
    }

    #[tokio::test]
    async fn test_stop_when_idle_is_an_error() {
        let controller = controller();
        assert_err!(controller.stop());
        assert_eq!(controller.get_state().await.status, SimulationStatus::Idle);
    }
}
