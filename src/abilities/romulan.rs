//! Romulan: intercept every other faction's submitted orders.

use super::{
    Ability, AbilityContext, AbilityInvocation, AbilityOutcome, HookPoint, Intel, PendingActions,
};
use crate::board::Faction;
use crate::economy::Ledger;
use crate::error::AbilityError;

pub struct Intercept;

impl Ability for Intercept {
    fn faction(&self) -> Faction {
        Faction::Romulan
    }

    fn name(&self) -> &'static str {
        "intercept"
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
        if !matches!(invocation, AbilityInvocation::Intercept) {
            return Err(AbilityError::WrongAbility {
                faction: Faction::Romulan,
                ability: invocation.name(),
            });
        }
        let orders = ctx
            .submitted
            .iter()
            .filter(|(_, f)| *f != Faction::Romulan)
            .map(|&(order, f)| (f, order))
            .collect();
        Ok(AbilityOutcome::Intel {
            intel: Intel::Orders { orders },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{standard_board, BoardState, Order, ALL_FACTIONS};
    use crate::config::EconomyConfig;

    #[test]
    fn sees_everyone_but_itself() {
        let board = standard_board();
        let state = BoardState::initial(&board, 2370, &ALL_FACTIONS);
        let t = |k: &str| board.lookup(k).unwrap();
        let submitted = [
            (Order::Hold { unit: t("romulus") }, Faction::Romulan),
            (
                Order::Move {
                    unit: t("qonos"),
                    dest: t("sherman"),
                },
                Faction::Klingon,
            ),
        ];
        let ctx = AbilityContext {
            board: &board,
            state: &state,
            submitted: &submitted,
        };
        let mut ledger = Ledger::new(&EconomyConfig::default());
        let mut pending = PendingActions::default();

        let outcome = Intercept
            .invoke(&AbilityInvocation::Intercept, &ctx, &mut ledger, &mut pending)
            .unwrap();
        assert_eq!(
            outcome,
            AbilityOutcome::Intel {
                intel: Intel::Orders {
                    orders: vec![(
                        Faction::Klingon,
                        Order::Move {
                            unit: t("qonos"),
                            dest: t("sherman")
                        }
                    )]
                }
            }
        );

        let err = Intercept
            .invoke(&AbilityInvocation::Surveil, &ctx, &mut ledger, &mut pending)
            .unwrap_err();
        assert_eq!(
            err,
            AbilityError::WrongAbility {
                faction: Faction::Romulan,
                ability: "surveil"
            }
        );
    }
}
