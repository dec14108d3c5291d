//! Turn coordination across concurrent submitters.
//!
//! The [`Game`] sits behind a mutex, so writes to a faction's order slot are
//! serialized and the last one wins. Each write wakes the closer, which
//! resolves as soon as every required faction has submitted, or when the
//! deadline passes, whichever comes first.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, Notify};
use tokio::time::{timeout_at, Instant};
use tracing::{info, warn};

use crate::abilities::{AbilityInvocation, AbilityOutcome};
use crate::board::{Faction, Order, PhaseId};
use crate::error::{EngineError, StateError};
use crate::game::{Game, TurnResult};
use crate::intake::SubmissionReport;
use crate::protocol::submission::OrderSubmission;

/// Why a phase was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    Quorum,
    Timeout,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosedPhase {
    pub reason: CloseReason,
    /// Factions that had not submitted when the phase closed.
    pub defaulted: Vec<Faction>,
    pub result: TurnResult,
}

pub struct TurnCoordinator {
    game: Mutex<Game>,
    submitted: Arc<Notify>,
    timeout: Duration,
}

impl TurnCoordinator {
    /// Uses the game's configured orders timeout.
    pub fn new(game: Game) -> Self {
        let timeout = game.config().session.orders_timeout();
        Self::with_timeout(game, timeout)
    }

    pub fn with_timeout(game: Game, timeout: Duration) -> Self {
        TurnCoordinator {
            game: Mutex::new(game),
            submitted: Arc::new(Notify::new()),
            timeout,
        }
    }

    pub async fn phase_id(&self) -> PhaseId {
        self.game.lock().await.phase_id()
    }

    pub async fn pending_factions(&self) -> Vec<Faction> {
        self.game.lock().await.pending_factions()
    }

    /// Runs `f` with shared access to the game.
    pub async fn inspect<R>(&self, f: impl FnOnce(&Game) -> R) -> R {
        let game = self.game.lock().await;
        f(&game)
    }

    pub async fn submit_orders(
        &self,
        faction: Faction,
        phase: PhaseId,
        orders: &[Order],
    ) -> Result<SubmissionReport, StateError> {
        let report = self.game.lock().await.submit_orders(faction, phase, orders)?;
        self.submitted.notify_one();
        Ok(report)
    }

    pub async fn submit(
        &self,
        faction: Faction,
        phase: PhaseId,
        submissions: &[OrderSubmission],
    ) -> Result<SubmissionReport, StateError> {
        let report = self.game.lock().await.submit(faction, phase, submissions)?;
        self.submitted.notify_one();
        Ok(report)
    }

    pub async fn invoke_ability(
        &self,
        faction: Faction,
        invocation: &AbilityInvocation,
    ) -> Result<AbilityOutcome, EngineError> {
        self.game.lock().await.invoke_ability(faction, invocation)
    }

    /// Waits for quorum or the timeout, then resolves the current phase.
    ///
    /// Factions still missing at the deadline get their default orders.
    /// Resolution itself is never interrupted.
    pub async fn close_orders_phase(&self) -> Result<ClosedPhase, EngineError> {
        let deadline = Instant::now() + self.timeout;
        let reason = loop {
            if self.game.lock().await.has_quorum() {
                break CloseReason::Quorum;
            }
            if timeout_at(deadline, self.submitted.notified()).await.is_err() {
                break CloseReason::Timeout;
            }
        };

        let mut game = self.game.lock().await;
        let defaulted = game.pending_factions();
        if reason == CloseReason::Timeout {
            warn!(
                phase = %game.phase_id(),
                missing = ?defaulted,
                "timeout, resolving with default orders"
            );
        } else {
            info!(phase = %game.phase_id(), "quorum reached");
        }
        let result = game.resolve()?;
        Ok(ClosedPhase {
            reason,
            defaulted,
            result,
        })
    }
}
