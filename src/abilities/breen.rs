//! Breen: freeze a territory so units there cannot move this turn.

use super::{
    replace_order, Ability, AbilityContext, AbilityEvent, AbilityInvocation, AbilityOutcome,
    FilterOutput,
    HookPoint, PendingActions,
};
use crate::board::{Faction, Order};
use crate::economy::Ledger;
use crate::error::{AbilityError, RejectReason, Rejection};

pub struct Freeze;

impl Ability for Freeze {
    fn faction(&self) -> Faction {
        Faction::Breen
    }

    fn name(&self) -> &'static str {
        "freeze"
    }

    fn hook(&self) -> HookPoint {
        HookPoint::PreIntake
    }

    fn is_invocable(&self) -> bool {
        true
    }

    /// The territory must hold a Breen unit or be one move away from one.
    fn invoke(
        &self,
        invocation: &AbilityInvocation,
        ctx: &AbilityContext<'_>,
        _ledger: &mut Ledger,
        pending: &mut PendingActions,
    ) -> Result<AbilityOutcome, AbilityError> {
        let AbilityInvocation::Freeze { territory } = *invocation else {
            return Err(AbilityError::WrongAbility {
                faction: Faction::Breen,
                ability: invocation.name(),
            });
        };
        let breen_here = ctx.state.unit_at(territory) == Some(Faction::Breen);
        let breen_near = ctx
            .board
            .neighbors(territory)
            .any(|n| ctx.state.unit_at(n) == Some(Faction::Breen));
        if !breen_here && !breen_near {
            return Err(AbilityError::InvalidTarget(format!(
                "{} is out of Breen reach",
                ctx.board.key(territory)
            )));
        }
        if pending.is_frozen(territory) {
            return Err(AbilityError::InvalidTarget(format!(
                "{} is already frozen",
                ctx.board.key(territory)
            )));
        }
        pending.frozen.push(territory);
        Ok(AbilityOutcome::Queued { balance: None })
    }

    /// Moves submitted before the freeze landed become holds.
    fn filter_orders(
        &self,
        _ctx: &AbilityContext<'_>,
        pending: &PendingActions,
        orders: &mut [(Order, Faction)],
        out: &mut FilterOutput,
    ) {
        for &territory in &pending.frozen {
            let is_move = orders
                .iter()
                .any(|(o, _)| matches!(o, Order::Move { unit, .. } if *unit == territory));
            if !is_move {
                continue;
            }
            if let Some((previous, victim)) =
                replace_order(orders, territory, Order::Hold { unit: territory })
            {
                out.events.push(AbilityEvent::MoveFrozen { territory, victim });
                out.rejections
                    .push(Rejection::new(victim, Some(previous), RejectReason::Frozen));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{standard_board, BoardState, ALL_FACTIONS};
    use crate::config::EconomyConfig;

    #[test]
    fn freeze_reach_and_effect() {
        let board = standard_board();
        let state = BoardState::initial(&board, 2370, &ALL_FACTIONS);
        let t = |k: &str| board.lookup(k).unwrap();
        let ctx = AbilityContext {
            board: &board,
            state: &state,
            submitted: &[],
        };
        let mut ledger = Ledger::new(&EconomyConfig::default());
        let mut pending = PendingActions::default();

        // galorndon borders breen's portas.
        let outcome = Freeze
            .invoke(
                &AbilityInvocation::Freeze { territory: t("galorndon") },
                &ctx,
                &mut ledger,
                &mut pending,
            )
            .unwrap();
        assert_eq!(outcome, AbilityOutcome::Queued { balance: None });

        let twice = Freeze.invoke(
            &AbilityInvocation::Freeze { territory: t("galorndon") },
            &ctx,
            &mut ledger,
            &mut pending,
        );
        assert!(matches!(twice, Err(AbilityError::InvalidTarget(_))));

        let mut frozen = pending.clone();
        frozen.frozen.push(t("talos"));
        let mut orders = vec![
            (Order::Hold { unit: t("galorndon") }, Faction::Romulan),
            (
                Order::Move {
                    unit: t("talos"),
                    dest: t("rator"),
                },
                Faction::Romulan,
            ),
        ];
        let mut out = FilterOutput::default();
        Freeze.filter_orders(&ctx, &frozen, &mut orders, &mut out);
        assert_eq!(orders[0].0, Order::Hold { unit: t("galorndon") });
        assert_eq!(orders[1].0, Order::Hold { unit: t("talos") });
        assert_eq!(
            out.events,
            vec![AbilityEvent::MoveFrozen {
                territory: t("talos"),
                victim: Faction::Romulan
            }]
        );
        assert_eq!(out.rejections.len(), 1);
        assert_eq!(out.rejections[0].reason, RejectReason::Frozen);
    }
}
