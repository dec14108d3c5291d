//! Klingon: +1 strength when moving, -1 when staying put. Always active.

use super::{Ability, HookPoint};
use crate::board::Faction;

pub struct Warrior;

impl Ability for Warrior {
    fn faction(&self) -> Faction {
        Faction::Klingon
    }

    fn name(&self) -> &'static str {
        "warrior"
    }

    fn hook(&self) -> HookPoint {
        HookPoint::Strength
    }

    fn modify_attack(&self, base: i32) -> i32 {
        base + 1
    }

    fn modify_defense(&self, base: i32) -> i32 {
        (base - 1).max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attack_and_defense_shift() {
        assert_eq!(Warrior.modify_attack(1), 2);
        assert_eq!(Warrior.modify_attack(3), 4);
        assert_eq!(Warrior.modify_defense(1), 0);
        assert_eq!(Warrior.modify_defense(3), 2);
        assert_eq!(Warrior.modify_defense(0), 0);
        assert_eq!(Warrior.modify_support(1), 1);
    }
}
