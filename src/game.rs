//! Phase state machine.
//!
//! [`Game`] owns the canonical [`GameState`] and sequences
//! Orders -> (Retreat) -> (Build) -> Orders. Every mutation goes through it:
//! order submission, ability use, alliance actions and phase resolution.
//!
//! Resolution works on a copy of the state and commits only after the
//! invariant checks pass, so a fatal error leaves the game where it was.

use std::sync::Arc;

use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::abilities::{
    AbilityBook, AbilityContext, AbilityEvent, AbilityInvocation, AbilityOutcome, AbilityRegistry,
};
use crate::alliance::AllianceManager;
use crate::board::{
    standard_board, Board, BoardState, Faction, Order, Phase, PhaseId, Season, TerritoryId, Unit,
    ALL_FACTIONS,
};
use crate::config::GameConfig;
use crate::economy::Ledger;
use crate::error::{
    AbilityError, ConfigError, EngineError, InvariantViolation, Rejection, StateError,
};
use crate::intake::{fill_implicit_holds, match_supports, OrderIntake, SubmissionReport};
use crate::protocol::submission::OrderSubmission;
use crate::resolve::{
    adjustment, advance_state, apply_builds, apply_resolution, apply_retreats, needs_build_phase,
    resolve_builds,
    resolve_retreats, retreat_destinations, Adjustment, Dislodgement, ResolvedOrder, Resolver,
};
use crate::victory::{evaluate, newly_eliminated, Victory, VictoryContext};

/// Everything that changes over a game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub position: BoardState,
    /// Factions that started the game, in faction order.
    pub players: Vec<Faction>,
    pub eliminated: Vec<Faction>,
    pub alliances: AllianceManager,
    pub ledger: Ledger,
    pub abilities: AbilityBook,
    pub victory: Option<Victory>,
}

impl GameState {
    pub fn is_active(&self, faction: Faction) -> bool {
        self.players.contains(&faction) && !self.eliminated.contains(&faction)
    }

    pub fn active_factions(&self) -> Vec<Faction> {
        self.players
            .iter()
            .copied()
            .filter(|f| !self.eliminated.contains(f))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GameStatus {
    InProgress { phase: PhaseId },
    GameOver { victory: Victory },
}

/// A dislodged unit and where it may go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingRetreat {
    pub territory: TerritoryId,
    pub faction: Faction,
    pub destinations: Vec<TerritoryId>,
}

/// Everything a phase resolution produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnResult {
    /// The phase that was resolved.
    pub phase: PhaseId,
    pub orders: Vec<ResolvedOrder>,
    /// Orders dropped when the phase closed.
    pub rejections: Vec<Rejection>,
    pub ability_events: Vec<AbilityEvent>,
    pub dislodged: Vec<Dislodgement>,
    pub standoffs: Vec<TerritoryId>,
    /// Retreats owed in the phase that follows.
    pub retreats: Vec<PendingRetreat>,
    /// Builds and disbands owed in the phase that follows.
    pub adjustments: Vec<(Faction, Adjustment)>,
    pub ownership_changes: Vec<TerritoryId>,
    pub units: Vec<Unit>,
    pub sc_owner: Vec<Option<Faction>>,
    pub eliminated: Vec<Faction>,
    /// Latinum credited as the next Orders phase opened.
    pub income: Option<u32>,
    pub victory: Option<Victory>,
    pub status: GameStatus,
}

impl TurnResult {
    fn new(phase: PhaseId) -> Self {
        TurnResult {
            phase,
            orders: Vec::new(),
            rejections: Vec::new(),
            ability_events: Vec::new(),
            dislodged: Vec::new(),
            standoffs: Vec::new(),
            retreats: Vec::new(),
            adjustments: Vec::new(),
            ownership_changes: Vec::new(),
            units: Vec::new(),
            sc_owner: Vec::new(),
            eliminated: Vec::new(),
            income: None,
            victory: None,
            status: GameStatus::InProgress { phase },
        }
    }
}

pub struct Game {
    config: GameConfig,
    board: Arc<Board>,
    state: GameState,
    intake: OrderIntake,
    registry: AbilityRegistry,
    resolver: Resolver,
    rng: SmallRng,
}

impl Game {
    /// Starts a game on the standard board at Spring Orders.
    pub fn new(config: GameConfig, players: &[Faction]) -> Result<Game, EngineError> {
        Self::with_board(config, standard_board(), players)
    }

    /// Starts a game on `board`: every player holds its home centers with one
    /// unit on each. The opening Orders phase credits Ferengi income.
    pub fn with_board(
        config: GameConfig,
        board: Arc<Board>,
        players: &[Faction],
    ) -> Result<Game, EngineError> {
        let players = normalize_players(players)?;
        let position = BoardState::initial(&board, config.rules.start_year, &players);
        let mut game = Self::build(config, board, position, players)?;
        game.state.ledger_income();
        info!(players = game.state.players.len(), phase = %game.phase_id(), "new game");
        Ok(game)
    }

    /// Starts from an arbitrary position, taken as is. No income is credited.
    pub fn from_position(
        config: GameConfig,
        board: Arc<Board>,
        position: BoardState,
        players: &[Faction],
    ) -> Result<Game, EngineError> {
        if position.units.len() != board.territory_count() {
            return Err(ConfigError::Invalid(format!(
                "position has {} territories, board has {}",
                position.units.len(),
                board.territory_count()
            ))
            .into());
        }
        let players = normalize_players(players)?;
        Self::build(config, board, position, players)
    }

    fn build(
        config: GameConfig,
        board: Arc<Board>,
        position: BoardState,
        players: Vec<Faction>,
    ) -> Result<Game, EngineError> {
        config.validate()?;
        let state = GameState {
            position,
            players,
            eliminated: Vec::new(),
            alliances: AllianceManager::new(config.rules.max_alliances_per_faction),
            ledger: Ledger::new(&config.economy),
            abilities: AbilityBook::new(&config.abilities),
            victory: None,
        };
        Ok(Game {
            registry: AbilityRegistry::new(&config.abilities),
            resolver: Resolver::new(board.territory_count()),
            rng: SmallRng::seed_from_u64(config.rules.seed),
            intake: OrderIntake::new(),
            config,
            board,
            state,
        })
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn position(&self) -> &BoardState {
        &self.state.position
    }

    pub fn phase_id(&self) -> PhaseId {
        self.state.position.phase_id()
    }

    pub fn is_over(&self) -> bool {
        self.state.victory.is_some()
    }

    pub fn status(&self) -> GameStatus {
        match self.state.victory {
            Some(victory) => GameStatus::GameOver { victory },
            None => GameStatus::InProgress { phase: self.phase_id() },
        }
    }

    pub fn intake(&self) -> &OrderIntake {
        &self.intake
    }

    fn check_actor(&self, faction: Faction) -> Result<(), StateError> {
        if self.is_over() {
            return Err(StateError::GameOver);
        }
        if !self.state.players.contains(&faction) {
            return Err(StateError::NotInGame(faction));
        }
        if self.state.eliminated.contains(&faction) {
            return Err(StateError::Eliminated(faction));
        }
        Ok(())
    }

    fn check_phase(&self, phase: PhaseId) -> Result<(), StateError> {
        let current = self.phase_id();
        if phase != current {
            return Err(StateError::WrongPhase {
                expected: current,
                actual: phase,
            });
        }
        Ok(())
    }

    /// Stores `orders` as the faction's set for `phase`, replacing any earlier
    /// submission. Invalid orders are dropped individually.
    pub fn submit_orders(
        &mut self,
        faction: Faction,
        phase: PhaseId,
        orders: &[Order],
    ) -> Result<SubmissionReport, StateError> {
        self.check_actor(faction)?;
        self.check_phase(phase)?;
        let frozen: &[TerritoryId] = match phase.phase {
            Phase::Orders => &self.state.abilities.pending.frozen,
            _ => &[],
        };
        let report = self.intake.submit(&self.board, &self.state.position, faction, orders, frozen);
        for r in &report.rejected {
            debug!(%r, "order rejected");
        }
        debug!(
            faction = %faction,
            accepted = report.accepted.len(),
            rejected = report.rejected.len(),
            "orders submitted"
        );
        Ok(report)
    }

    /// Like [`Game::submit_orders`], with territories named by string id.
    pub fn submit(
        &mut self,
        faction: Faction,
        phase: PhaseId,
        submissions: &[OrderSubmission],
    ) -> Result<SubmissionReport, StateError> {
        self.check_actor(faction)?;
        self.check_phase(phase)?;
        let mut orders = Vec::with_capacity(submissions.len());
        let mut unreadable = Vec::new();
        for s in submissions {
            match s.to_order(&self.board) {
                Ok(order) => orders.push(order),
                Err(reason) => unreadable.push(Rejection::new(faction, None, reason)),
            }
        }
        let mut report = self.submit_orders(faction, phase, &orders)?;
        unreadable.append(&mut report.rejected);
        report.rejected = unreadable;
        Ok(report)
    }

    /// Uses the faction's ability. Refusals consume nothing.
    pub fn invoke_ability(
        &mut self,
        faction: Faction,
        invocation: &AbilityInvocation,
    ) -> Result<AbilityOutcome, EngineError> {
        self.check_actor(faction)?;
        let phase = self.state.position.phase;
        if phase != Phase::Orders {
            return Err(AbilityError::WrongPhase(phase).into());
        }
        let submitted = self.intake.combined();
        let ctx = AbilityContext {
            board: &self.board,
            state: &self.state.position,
            submitted: &submitted,
        };
        let outcome = self
            .registry
            .invoke(faction, invocation, &ctx, &mut self.state.abilities, &mut self.state.ledger)
            .inspect_err(|e| debug!(faction = %faction, error = %e, "ability refused"))?;
        Ok(outcome)
    }

    pub fn propose_alliance(&mut self, from: Faction, to: Faction) -> Result<(), StateError> {
        self.check_actor(from)?;
        let active = self.state.active_factions();
        self.state.alliances.propose(from, to, &active)?;
        info!(from = %from, to = %to, "alliance proposed");
        Ok(())
    }

    pub fn accept_alliance(&mut self, by: Faction, proposer: Faction) -> Result<(), StateError> {
        self.check_actor(by)?;
        self.state.alliances.accept(by, proposer)?;
        info!(a = %proposer, b = %by, "alliance formed");
        Ok(())
    }

    pub fn reject_alliance(&mut self, by: Faction, proposer: Faction) -> Result<(), StateError> {
        self.check_actor(by)?;
        self.state.alliances.reject(by, proposer)?;
        info!(from = %proposer, by = %by, "alliance rejected");
        Ok(())
    }

    pub fn break_alliance(&mut self, by: Faction, other: Faction) -> Result<(), StateError> {
        self.check_actor(by)?;
        self.state.alliances.break_alliance(by, other)?;
        info!(by = %by, other = %other, "alliance broken");
        Ok(())
    }

    /// Factions that must submit before the phase can close.
    ///
    /// Orders: active factions with units. Retreat: factions with dislodged
    /// units. Build: factions that owe builds or disbands.
    pub fn required_factions(&self) -> Vec<Faction> {
        let pos = &self.state.position;
        self.state
            .active_factions()
            .into_iter()
            .filter(|&f| match pos.phase {
                Phase::Orders => pos.unit_count(f) > 0,
                Phase::Retreat => pos.dislodged.iter().flatten().any(|d| d.faction == f),
                Phase::Build => !adjustment(&self.board, pos, f).is_none(),
            })
            .collect()
    }

    /// Required factions that have not submitted yet.
    pub fn pending_factions(&self) -> Vec<Faction> {
        self.required_factions()
            .into_iter()
            .filter(|&f| !self.intake.has_submitted(f))
            .collect()
    }

    pub fn has_quorum(&self) -> bool {
        self.pending_factions().is_empty()
    }

    /// Closes the current phase.
    ///
    /// Missing submissions default to holds, disbands or waives. The result is
    /// committed only if every invariant still holds; otherwise the game is
    /// left untouched and the violation is returned.
    pub fn resolve(&mut self) -> Result<TurnResult, EngineError> {
        if self.is_over() {
            return Err(StateError::GameOver.into());
        }
        let phase = self.phase_id();
        let mut next = self.state.clone();
        let mut rng = self.rng.clone();
        let mut result = TurnResult::new(phase);

        let build_applied = match phase.phase {
            Phase::Orders => {
                self.close_orders(&mut next, &mut rng, &mut result)?;
                false
            }
            Phase::Retreat => {
                self.close_retreats(&mut next, &mut result)?;
                false
            }
            Phase::Build => {
                self.close_builds(&mut next, &mut result)?;
                true
            }
        };

        let has_dislodgements = next.position.has_dislodgements();
        result
            .ownership_changes
            .extend(advance_state(&self.board, &mut next.position, has_dislodgements));

        let mut build_applied = build_applied;
        if next.position.phase == Phase::Build && !needs_build_phase(&self.board, &next.position) {
            debug!(year = next.position.year, "no adjustments owed, build phase skipped");
            advance_state(&self.board, &mut next.position, false);
            build_applied = true;
        }

        if build_applied {
            for faction in newly_eliminated(&next.position, &next.active_factions()) {
                next.eliminated.push(faction);
                next.alliances.drop_faction(faction);
                result.eliminated.push(faction);
                info!(faction = %faction, "faction eliminated");
            }
        }

        if let Err(violation) = check_invariants(&self.board, &self.state, &next) {
            error!(%violation, phase = %phase, "invariant violated, turn discarded");
            return Err(violation.into());
        }

        if next.position.phase == Phase::Orders {
            next.abilities.reset_turn();
            result.income = next.ledger_income();
        }

        next.victory = evaluate(&VictoryContext {
            state: &next.position,
            active: &next.active_factions(),
            alliances: &next.alliances,
            ledger: &next.ledger,
            solo_threshold: self.config.rules.solo_threshold,
        });
        if let Some(victory) = next.victory {
            info!(%victory, "game over");
        }

        self.fill_report(&next, &mut result);
        self.state = next;
        self.rng = rng;
        self.intake.clear();
        info!(from = %phase, to = %self.phase_id(), "phase resolved");
        Ok(result)
    }

    fn close_orders(
        &mut self,
        next: &mut GameState,
        rng: &mut SmallRng,
        result: &mut TurnResult,
    ) -> Result<(), EngineError> {
        let mut orders = self.intake.combined();
        fill_implicit_holds(&self.state.position, &mut orders);

        let submitted = orders.clone();
        let ctx = AbilityContext {
            board: &self.board,
            state: &self.state.position,
            submitted: &submitted,
        };
        let filtered = self.registry.filter_orders(&ctx, &next.abilities.pending, &mut orders);
        result.ability_events.extend(filtered.events);
        result.rejections.extend(filtered.rejections);
        result.rejections.extend(match_supports(&mut orders));

        let registry = &self.registry;
        let mut scratch = next.abilities.clone();
        let mut offered: Vec<(Dislodgement, AbilityEvent)> = Vec::new();
        let (resolution, saved) =
            self.resolver
                .resolve_with_overrides(&orders, &self.state.position, registry, |d| {
                    match registry.override_dislodgement(d, &mut scratch, rng) {
                        Some(event) => {
                            offered.push((*d, event));
                            event.prevents_dislodgement()
                        }
                        None => false,
                    }
                });

        // Charges are spent only for saves the final resolution kept.
        for (d, event) in offered {
            if !event.prevents_dislodgement() {
                result.ability_events.push(event);
            } else if saved.contains(&d.territory) {
                if next.abilities.slot(d.faction).charges.is_some() {
                    result
                        .ability_events
                        .extend(registry.override_dislodgement(&d, &mut next.abilities, rng));
                } else {
                    result.ability_events.push(event);
                }
            }
        }

        apply_resolution(&mut next.position, &resolution)?;
        debug!(
            orders = resolution.orders.len(),
            dislodged = resolution.dislodged.len(),
            standoffs = resolution.standoffs.len(),
            saved = saved.len(),
            "orders adjudicated"
        );

        result.orders = resolution.orders;
        result.dislodged = resolution.dislodged;
        result.standoffs = resolution.standoffs;
        Ok(())
    }

    fn close_retreats(
        &self,
        next: &mut GameState,
        result: &mut TurnResult,
    ) -> Result<(), EngineError> {
        let orders = self.intake.combined();
        let results = resolve_retreats(&orders, &next.position);
        apply_retreats(&mut next.position, &results)?;
        result.orders = results
            .into_iter()
            .map(|r| ResolvedOrder {
                order: r.order,
                faction: r.faction,
                result: r.result,
            })
            .collect();
        Ok(())
    }

    fn close_builds(
        &self,
        next: &mut GameState,
        result: &mut TurnResult,
    ) -> Result<(), EngineError> {
        let orders = self.intake.combined();
        let results = resolve_builds(&self.board, &orders, &next.position);
        apply_builds(&mut next.position, &results)?;
        result.orders = results
            .into_iter()
            .map(|r| ResolvedOrder {
                order: r.order,
                faction: r.faction,
                result: r.result,
            })
            .collect();
        Ok(())
    }

    fn fill_report(&self, next: &GameState, result: &mut TurnResult) {
        let pos = &next.position;
        match pos.phase {
            Phase::Retreat => {
                result.retreats = self
                    .board
                    .ids()
                    .filter_map(|id| {
                        pos.dislodged[id.index()].map(|d| PendingRetreat {
                            territory: id,
                            faction: d.faction,
                            destinations: retreat_destinations(&self.board, pos, id),
                        })
                    })
                    .collect();
            }
            Phase::Build => {
                result.adjustments = next
                    .active_factions()
                    .into_iter()
                    .map(|f| (f, adjustment(&self.board, pos, f)))
                    .filter(|(_, a)| !a.is_none())
                    .collect();
            }
            Phase::Orders => {}
        }
        result.units = pos.units().collect();
        result.sc_owner = pos.sc_owner.clone();
        result.victory = next.victory;
        result.status = match next.victory {
            Some(victory) => GameStatus::GameOver { victory },
            None => GameStatus::InProgress { phase: pos.phase_id() },
        };
    }
}

impl GameState {
    /// Credits Ferengi income for the Orders phase now opening.
    fn ledger_income(&mut self) -> Option<u32> {
        if !self.is_active(Faction::Ferengi) {
            return None;
        }
        let centers = self.position.center_count(Faction::Ferengi);
        let amount = self.ledger.credit_income(centers, self.position.phase_id());
        debug!(amount, balance = self.ledger.balance(), "latinum income");
        Some(amount)
    }
}

fn normalize_players(players: &[Faction]) -> Result<Vec<Faction>, ConfigError> {
    let list: Vec<Faction> = ALL_FACTIONS.iter().copied().filter(|f| players.contains(f)).collect();
    if list.is_empty() {
        return Err(ConfigError::Invalid("a game needs at least one faction".to_string()));
    }
    Ok(list)
}

/// Checks the position invariants after a phase, against the state before it.
fn check_invariants(
    board: &Board,
    before: &GameState,
    after: &GameState,
) -> Result<(), InvariantViolation> {
    let pos = &after.position;
    for unit in pos.units() {
        if after.eliminated.contains(&unit.faction) || !after.players.contains(&unit.faction) {
            return Err(InvariantViolation::EliminatedUnit {
                faction: unit.faction,
                territory: unit.territory,
            });
        }
    }
    for id in board.ids() {
        if pos.sc_owner[id.index()].is_some() && !board.territory(id).supply_center {
            return Err(InvariantViolation::OwnershipOffSupply(id));
        }
    }
    if before.position.season == Season::Spring && before.position.sc_owner != pos.sc_owner {
        return Err(InvariantViolation::SpringOwnershipChange);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Phase;

    fn t(key: &str) -> TerritoryId {
        standard_board().lookup(key).unwrap()
    }

    #[test]
    fn opening_state() {
        let game = Game::new(GameConfig::default(), &ALL_FACTIONS).unwrap();
        assert_eq!(
            game.phase_id(),
            PhaseId {
                year: 2370,
                season: Season::Spring,
                phase: Phase::Orders
            }
        );
        assert_eq!(game.position().units().count(), 21);
        // 10 starting + 3 per home center.
        assert_eq!(game.state().ledger.balance(), 19);
        assert_eq!(game.pending_factions().len(), 7);
    }

    #[test]
    fn players_must_not_be_empty() {
        assert!(Game::new(GameConfig::default(), &[]).is_err());
    }

    #[test]
    fn outsiders_and_stale_phases_are_refused() {
        let mut game =
            Game::new(GameConfig::default(), &[Faction::Federation, Faction::Klingon]).unwrap();
        let phase = game.phase_id();
        assert_eq!(
            game.submit_orders(Faction::Gorn, phase, &[]),
            Err(StateError::NotInGame(Faction::Gorn))
        );
        let stale = PhaseId {
            season: Season::Fall,
            ..phase
        };
        assert!(matches!(
            game.submit_orders(Faction::Federation, stale, &[]),
            Err(StateError::WrongPhase { .. })
        ));
    }

    #[test]
    fn quorum_tracks_submissions() {
        let mut game =
            Game::new(GameConfig::default(), &[Faction::Federation, Faction::Klingon]).unwrap();
        let phase = game.phase_id();
        assert!(!game.has_quorum());
        game.submit_orders(Faction::Federation, phase, &[]).unwrap();
        assert_eq!(game.pending_factions(), vec![Faction::Klingon]);
        game.submit_orders(Faction::Klingon, phase, &[Order::Hold { unit: t("qonos") }]).unwrap();
        assert!(game.has_quorum());
    }

    #[test]
    fn abilities_only_in_orders_phase() {
        let board = standard_board();
        let mut position = BoardState::initial(&board, 2370, &[Faction::Romulan]);
        position.phase = Phase::Retreat;
        let mut game =
            Game::from_position(GameConfig::default(), board, position, &[Faction::Romulan])
                .unwrap();
        let err = game
            .invoke_ability(Faction::Romulan, &AbilityInvocation::Intercept)
            .unwrap_err();
        assert!(matches!(err, EngineError::Ability(AbilityError::WrongPhase(Phase::Retreat))));
    }

    #[test]
    fn failed_invariant_leaves_state_untouched() {
        let board = standard_board();
        let mut position = BoardState::initial(&board, 2370, &[Faction::Federation]);
        // A unit of a faction that is not playing.
        position.place_unit(t("risa"), Faction::Klingon);
        let mut game =
            Game::from_position(GameConfig::default(), board, position, &[Faction::Federation])
                .unwrap();
        let before = game.state().clone();
        let err = game.resolve().unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(game.state(), &before);
    }
}
