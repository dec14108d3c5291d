//! Cardassian: see where other factions are moving, but not who supports whom.

use super::{
    Ability, AbilityContext, AbilityInvocation, AbilityOutcome, HookPoint, Intel, PendingActions,
};
use crate::board::{Faction, Order};
use crate::economy::Ledger;
use crate::error::AbilityError;

pub struct Surveillance;

impl Ability for Surveillance {
    fn faction(&self) -> Faction {
        Faction::Cardassian
    }

    fn name(&self) -> &'static str {
        "surveillance"
    }

    fn hook(&self) -> HookPoint {
        HookPoint::Visibility
    }

    fn is_invocable(&self) -> bool {
        true
    }

    fn invoke(
        &self,
        invocation: &AbilityInvocation,
        ctx: &AbilityContext<'_>,
        _ledger: &mut Ledger,
        _pending: &mut PendingActions,
    ) -> Result<AbilityOutcome, AbilityError> {
        if !matches!(invocation, AbilityInvocation::Surveil) {
            return Err(AbilityError::WrongAbility {
                faction: Faction::Cardassian,
                ability: invocation.name(),
            });
        }
        let destinations = ctx
            .submitted
            .iter()
            .filter_map(|&(order, f)| match order {
                Order::Move { dest, .. } if f != Faction::Cardassian => Some((f, dest)),
                _ => None,
            })
            .collect();
        Ok(AbilityOutcome::Intel {
            intel: Intel::MoveDestinations { destinations },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{standard_board, BoardState, ALL_FACTIONS};
    use crate::config::EconomyConfig;

    #[test]
    fn only_move_destinations_are_revealed() {
        let board = standard_board();
        let state = BoardState::initial(&board, 2370, &ALL_FACTIONS);
        let t = |k: &str| board.lookup(k).unwrap();
        let submitted = [
            (
                Order::Move {
                    unit: t("earth"),
                    dest: t("risa"),
                },
                Faction::Federation,
            ),
            (
                Order::SupportHold {
                    unit: t("vulcan"),
                    supported: t("earth"),
                },
                Faction::Federation,
            ),
            (
                Order::Move {
                    unit: t("cardassia"),
                    dest: t("badlands"),
                },
                Faction::Cardassian,
            ),
        ];
        let ctx = AbilityContext {
            board: &board,
            state: &state,
            submitted: &submitted,
        };
        let outcome = Surveillance
            .invoke(
                &AbilityInvocation::Surveil,
                &ctx,
                &mut Ledger::new(&EconomyConfig::default()),
                &mut PendingActions::default(),
            )
            .unwrap();
        assert_eq!(
            outcome,
            AbilityOutcome::Intel {
                intel: Intel::MoveDestinations {
                    destinations: vec![(Faction::Federation, t("risa"))]
                }
            }
        );
    }
}
