//! Victory and elimination checks.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::alliance::AllianceManager;
use crate::board::{BoardState, Faction};
use crate::economy::Ledger;

/// How the game was won.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Victory {
    Solo { faction: Faction, centers: usize },
    Allied { factions: [Faction; 2], centers: usize },
    Economic { faction: Faction, latinum: u32 },
    LastStanding { faction: Faction },
}

impl Victory {
    pub fn winners(&self) -> Vec<Faction> {
        match *self {
            Victory::Solo { faction, .. }
            | Victory::Economic { faction, .. }
            | Victory::LastStanding { faction } => {
                vec![faction]
            }
            Victory::Allied { factions, .. } => factions.to_vec(),
        }
    }
}

impl fmt::Display for Victory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Victory::Solo { faction, centers } => {
                write!(f, "solo victory: {faction} with {centers} centers")
            }
            Victory::Allied { factions, centers } => {
                write!(
                    f,
                    "allied victory: {} and {} with {centers} centers",
                    factions[0], factions[1]
                )
            }
            Victory::Economic { faction, latinum } => {
                write!(f, "economic victory: {faction} with {latinum} latinum")
            }
            Victory::LastStanding { faction } => write!(f, "last standing: {faction}"),
        }
    }
}

/// Inputs to a victory check.
pub struct VictoryContext<'a> {
    pub state: &'a BoardState,
    /// Factions still in the game.
    pub active: &'a [Faction],
    pub alliances: &'a AllianceManager,
    pub ledger: &'a Ledger,
    pub solo_threshold: usize,
}

/// Checks, in priority order: solo, allied, economic, last standing.
///
/// Ties within one rule go to the larger total, then the lower faction index.
pub fn evaluate(ctx: &VictoryContext<'_>) -> Option<Victory> {
    let counts = ctx.state.center_counts();

    let solo = ctx
        .active
        .iter()
        .map(|&f| (f, counts[f.index()]))
        .filter(|&(_, c)| c >= ctx.solo_threshold)
        .min_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    if let Some((faction, centers)) = solo {
        return Some(Victory::Solo { faction, centers });
    }

    let allied = ctx
        .alliances
        .active_pairs()
        .into_iter()
        .filter(|(a, b)| ctx.active.contains(a) && ctx.active.contains(b))
        .map(|(a, b)| ((a, b), ctx.alliances.combined_supply_centers(ctx.state, a, b)))
        .filter(|&(_, c)| c >= ctx.solo_threshold)
        .min_by(|x, y| y.1.cmp(&x.1).then(x.0.cmp(&y.0)));
    if let Some(((a, b), centers)) = allied {
        return Some(Victory::Allied {
            factions: [a, b],
            centers,
        });
    }

    if ctx.active.contains(&Faction::Ferengi) && ctx.ledger.has_economic_victory() {
        return Some(Victory::Economic {
            faction: Faction::Ferengi,
            latinum: ctx.ledger.balance(),
        });
    }

    if let [faction] = ctx.active {
        return Some(Victory::LastStanding { faction: *faction });
    }

    None
}

/// Active factions that own no units and no supply centers.
pub fn newly_eliminated(state: &BoardState, active: &[Faction]) -> Vec<Faction> {
    let units = state.unit_counts();
    let centers = state.center_counts();
    active
        .iter()
        .copied()
        .filter(|f| units[f.index()] == 0 && centers[f.index()] == 0)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{standard_board, Board, TerritoryId, ALL_FACTIONS};
    use crate::config::EconomyConfig;

    /// Gives `faction` the first `n` unowned supply centers.
    fn grant(board: &Board, state: &mut BoardState, faction: Faction, n: usize) {
        let free: Vec<TerritoryId> = board
            .ids()
            .filter(|&id| board.territory(id).supply_center && state.sc_owner[id.index()].is_none())
            .take(n)
            .collect();
        assert_eq!(free.len(), n);
        for id in free {
            state.set_sc_owner(id, Some(faction));
        }
    }

    fn check(
        state: &BoardState,
        alliances: &AllianceManager,
        ledger: &Ledger,
        active: &[Faction],
    ) -> Option<Victory> {
        evaluate(&VictoryContext {
            state,
            active,
            alliances,
            ledger,
            solo_threshold: 24,
        })
    }

    #[test]
    fn solo_at_exactly_threshold() {
        let board = standard_board();
        let ledger = Ledger::new(&EconomyConfig::default());
        let alliances = AllianceManager::new(None);

        let mut state = BoardState::for_board(&board, 2370);
        grant(&board, &mut state, Faction::Klingon, 23);
        assert_eq!(check(&state, &alliances, &ledger, &ALL_FACTIONS), None);

        grant(&board, &mut state, Faction::Klingon, 1);
        assert_eq!(
            check(&state, &alliances, &ledger, &ALL_FACTIONS),
            Some(Victory::Solo {
                faction: Faction::Klingon,
                centers: 24
            })
        );
    }

    #[test]
    fn allied_pair_needs_active_alliance() {
        let board = standard_board();
        let ledger = Ledger::new(&EconomyConfig::default());
        let mut alliances = AllianceManager::new(None);
        let mut state = BoardState::for_board(&board, 2370);
        grant(&board, &mut state, Faction::Romulan, 12);
        grant(&board, &mut state, Faction::Breen, 12);

        alliances.propose(Faction::Romulan, Faction::Breen, &ALL_FACTIONS).unwrap();
        assert_eq!(check(&state, &alliances, &ledger, &ALL_FACTIONS), None);

        alliances.accept(Faction::Breen, Faction::Romulan).unwrap();
        let victory = check(&state, &alliances, &ledger, &ALL_FACTIONS).unwrap();
        assert_eq!(victory.winners(), vec![Faction::Romulan, Faction::Breen]);

        alliances.break_alliance(Faction::Breen, Faction::Romulan).unwrap();
        assert_eq!(check(&state, &alliances, &ledger, &ALL_FACTIONS), None);
    }

    #[test]
    fn economic_victory_requires_active_ferengi() {
        let board = standard_board();
        let state = BoardState::initial(&board, 2370, &ALL_FACTIONS);
        let alliances = AllianceManager::new(None);
        let ledger = Ledger::new(&EconomyConfig {
            starting_latinum: 250,
            ..EconomyConfig::default()
        });
        assert!(matches!(
            check(&state, &alliances, &ledger, &ALL_FACTIONS),
            Some(Victory::Economic { latinum: 250, .. })
        ));
        assert_eq!(check(&state, &alliances, &ledger, &[Faction::Gorn, Faction::Klingon]), None);
    }

    #[test]
    fn last_faction_standing() {
        let board = standard_board();
        let state = BoardState::initial(&board, 2370, &[Faction::Gorn]);
        let ledger = Ledger::new(&EconomyConfig::default());
        let alliances = AllianceManager::new(None);
        assert_eq!(
            check(&state, &alliances, &ledger, &[Faction::Gorn]),
            Some(Victory::LastStanding { faction: Faction::Gorn })
        );
    }

    #[test]
    fn elimination_needs_no_units_and_no_centers() {
        let board = standard_board();
        let mut state = BoardState::initial(&board, 2370, &[Faction::Federation, Faction::Klingon]);
        for id in state.units_of(Faction::Klingon) {
            state.remove_unit(id);
        }
        assert!(newly_eliminated(&state, &[Faction::Federation, Faction::Klingon]).is_empty());
        for id in board.home_centers(Faction::Klingon) {
            state.set_sc_owner(id, Some(Faction::Federation));
        }
        assert_eq!(
            newly_eliminated(&state, &[Faction::Federation, Faction::Klingon]),
            vec![Faction::Klingon]
        );
    }
}
