//! Federation: a unit that would be dislodged stays in place, while charges last.

use rand::rngs::SmallRng;

use super::{Ability, AbilityEvent, AbilitySlot, HookPoint};
use crate::board::Faction;
use crate::resolve::Dislodgement;

pub struct Immunity;

impl Ability for Immunity {
    fn faction(&self) -> Faction {
        Faction::Federation
    }

    fn name(&self) -> &'static str {
        "immunity"
    }

    fn hook(&self) -> HookPoint {
        HookPoint::PostResolution
    }

    fn override_dislodgement(
        &self,
        dislodged: &Dislodgement,
        slot: &mut AbilitySlot,
        _rng: &mut SmallRng,
    ) -> Option<AbilityEvent> {
        slot.check().ok()?;
        slot.consume();
        Some(AbilityEvent::ImmunityUsed {
            territory: dislodged.territory,
            charges_left: slot.charges.unwrap_or(0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::TerritoryId;
    use rand::SeedableRng;

    fn dislodged() -> Dislodgement {
        Dislodgement {
            faction: Faction::Federation,
            territory: TerritoryId(22),
            attacker_from: TerritoryId(21),
        }
    }

    #[test]
    fn each_use_costs_one_charge() {
        let mut slot = AbilitySlot::with_charges(2);
        let mut rng = SmallRng::seed_from_u64(1);

        let first = Immunity.override_dislodgement(&dislodged(), &mut slot, &mut rng);
        assert_eq!(
            first,
            Some(AbilityEvent::ImmunityUsed {
                territory: TerritoryId(22),
                charges_left: 1
            })
        );
        assert_eq!(slot.charges, Some(1));

        Immunity.override_dislodgement(&dislodged(), &mut slot, &mut rng);
        assert_eq!(slot.charges, Some(0));
    }

    #[test]
    fn exhausted_immunity_has_no_effect() {
        let mut slot = AbilitySlot::with_charges(0);
        let mut rng = SmallRng::seed_from_u64(1);
        assert_eq!(Immunity.override_dislodgement(&dislodged(), &mut slot, &mut rng), None);
        assert_eq!(slot.charges, Some(0));
    }
}
