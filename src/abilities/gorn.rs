//! Gorn: a dislodged unit may shrug it off and stay.

use rand::rngs::SmallRng;
use rand::Rng;

use super::{Ability, AbilityEvent, AbilitySlot, HookPoint};
use crate::board::Faction;
use crate::resolve::Dislodgement;

pub struct Regeneration {
    probability: f64,
}

impl Regeneration {
    /// `probability` is clamped to [0, 1].
    pub fn new(probability: f64) -> Self {
        Regeneration {
            probability: probability.clamp(0.0, 1.0),
        }
    }
}

impl Ability for Regeneration {
    fn faction(&self) -> Faction {
        Faction::Gorn
    }

    fn name(&self) -> &'static str {
        "regeneration"
    }

    fn hook(&self) -> HookPoint {
        HookPoint::PostResolution
    }

    fn override_dislodgement(
        &self,
        dislodged: &Dislodgement,
        _slot: &mut AbilitySlot,
        rng: &mut SmallRng,
    ) -> Option<AbilityEvent> {
        Some(AbilityEvent::SurvivalRoll {
            territory: dislodged.territory,
            survived: rng.gen_bool(self.probability),
        })
    }
}
