//! Ferengi: buy a change to an enemy order.
//!
//! Bribe turns the target's order into a Hold. Sabotage turns it into a move
//! to a territory of the Ferengi's choosing, adjacent to the target. Both are
//! paid for when invoked and applied when the Orders phase closes.

use super::{
    replace_order, Ability, AbilityContext, AbilityEvent, AbilityInvocation, AbilityOutcome,
    FilterOutput,
    HookPoint, PendingActions,
};
use crate::board::{Faction, Order, TerritoryId};
use crate::economy::{EconomicAction, Ledger};
use crate::error::AbilityError;

pub struct Commerce;

impl Commerce {
    fn check_target(
        ctx: &AbilityContext<'_>,
        pending: &PendingActions,
        target: TerritoryId,
    ) -> Result<(), AbilityError> {
        match ctx.state.unit_at(target) {
            None => {
                return Err(AbilityError::InvalidTarget(format!(
                    "no unit in {}",
                    ctx.board.key(target)
                )))
            }
            Some(Faction::Ferengi) => {
                return Err(AbilityError::InvalidTarget(format!(
                    "{} is a Ferengi unit",
                    ctx.board.key(target)
                )))
            }
            Some(_) => {}
        }
        if pending.targets(target) {
            return Err(AbilityError::InvalidTarget(format!(
                "{} is already targeted this turn",
                ctx.board.key(target)
            )));
        }
        Ok(())
    }
}

impl Ability for Commerce {
    fn faction(&self) -> Faction {
        Faction::Ferengi
    }

    fn name(&self) -> &'static str {
        "commerce"
    }

    fn hook(&self) -> HookPoint {
        HookPoint::PreIntake
    }

    fn is_invocable(&self) -> bool {
        true
    }

    fn invoke(
        &self,
        invocation: &AbilityInvocation,
        ctx: &AbilityContext<'_>,
        ledger: &mut Ledger,
        pending: &mut PendingActions,
    ) -> Result<AbilityOutcome, AbilityError> {
        let phase = ctx.state.phase_id();
        let balance = match *invocation {
            AbilityInvocation::Bribe { target } => {
                Self::check_target(ctx, pending, target)?;
                let balance = ledger.spend(EconomicAction::Bribe, phase)?;
                pending.bribes.push(target);
                balance
            }
            AbilityInvocation::Sabotage { target, redirect } => {
                Self::check_target(ctx, pending, target)?;
                if redirect == target || !ctx.board.is_adjacent(target, redirect) {
                    return Err(AbilityError::InvalidTarget(format!(
                        "{} is not adjacent to {}",
                        ctx.board.key(redirect),
                        ctx.board.key(target)
                    )));
                }
                let balance = ledger.spend(EconomicAction::Sabotage, phase)?;
                pending.sabotages.push((target, redirect));
                balance
            }
            other => {
                return Err(AbilityError::WrongAbility {
                    faction: Faction::Ferengi,
                    ability: other.name(),
                })
            }
        };
        Ok(AbilityOutcome::Queued { balance: Some(balance) })
    }

    fn filter_orders(
        &self,
        _ctx: &AbilityContext<'_>,
        pending: &PendingActions,
        orders: &mut [(Order, Faction)],
        out: &mut FilterOutput,
    ) {
        for &target in &pending.bribes {
            if let Some((_, victim)) = replace_order(orders, target, Order::Hold { unit: target }) {
                out.events.push(AbilityEvent::Bribed { target, victim });
            }
        }
        for &(target, redirect) in &pending.sabotages {
            let corrupted = Order::Move {
                unit: target,
                dest: redirect,
            };
            if let Some((_, victim)) = replace_order(orders, target, corrupted) {
                out.events.push(AbilityEvent::Sabotaged {
                    target,
                    victim,
                    redirect,
                });
            }
        }
    }
}
