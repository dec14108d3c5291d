//! Ferengi latinum ledger.
//!
//! One running balance. Income is credited per owned supply center when an
//! Orders phase opens; bribes and sabotage are paid the moment they are
//! accepted. Every movement is journaled.

use serde::{Deserialize, Serialize};

use crate::board::PhaseId;
use crate::config::EconomyConfig;
use crate::error::AbilityError;

/// Something latinum can be spent on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EconomicAction {
    Bribe,
    Sabotage,
}

/// Why the balance changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Income,
    Spend(EconomicAction),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub phase: PhaseId,
    pub kind: EntryKind,
    pub amount: u32,
    pub balance: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    balance: u32,
    income_per_center: u32,
    bribe_cost: u32,
    sabotage_cost: u32,
    victory_threshold: u32,
    entries: Vec<LedgerEntry>,
}

impl Ledger {
    pub fn new(config: &EconomyConfig) -> Self {
        Ledger {
            balance: config.starting_latinum,
            income_per_center: config.income_per_center,
            bribe_cost: config.bribe_cost,
            sabotage_cost: config.sabotage_cost,
            victory_threshold: config.victory_threshold,
            entries: Vec::new(),
        }
    }

    pub fn balance(&self) -> u32 {
        self.balance
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn cost(&self, action: EconomicAction) -> u32 {
        match action {
            EconomicAction::Bribe => self.bribe_cost,
            EconomicAction::Sabotage => self.sabotage_cost,
        }
    }

    /// Credits income for `centers` owned supply centers. Returns the amount.
    pub fn credit_income(&mut self, centers: usize, phase: PhaseId) -> u32 {
        let amount = self.income_per_center.saturating_mul(centers as u32);
        self.balance = self.balance.saturating_add(amount);
        self.entries.push(LedgerEntry {
            phase,
            kind: EntryKind::Income,
            amount,
            balance: self.balance,
        });
        amount
    }

    /// Checks the balance covers `action` without spending.
    pub fn check(&self, action: EconomicAction) -> Result<(), AbilityError> {
        let needed = self.cost(action);
        if self.balance < needed {
            return Err(AbilityError::InsufficientFunds {
                needed,
                available: self.balance,
            });
        }
        Ok(())
    }

    /// Pays for `action`. Returns the new balance. On error nothing changes.
    pub fn spend(&mut self, action: EconomicAction, phase: PhaseId) -> Result<u32, AbilityError> {
        self.check(action)?;
        let amount = self.cost(action);
        self.balance -= amount;
        self.entries.push(LedgerEntry {
            phase,
            kind: EntryKind::Spend(action),
            amount,
            balance: self.balance,
        });
        Ok(self.balance)
    }

    /// True once the balance reaches the economic victory threshold.
    pub fn has_economic_victory(&self) -> bool {
        self.balance >= self.victory_threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Phase, Season};

    fn phase() -> PhaseId {
        PhaseId {
            year: 2370,
            season: Season::Spring,
            phase: Phase::Orders,
        }
    }

    #[test]
    fn income_scales_with_centers() {
        let mut ledger = Ledger::new(&EconomyConfig::default());
        assert_eq!(ledger.balance(), 10);
        assert_eq!(ledger.credit_income(3, phase()), 9);
        assert_eq!(ledger.balance(), 19);
        assert_eq!(ledger.entries().len(), 1);
        assert_eq!(ledger.entries()[0].kind, EntryKind::Income);
    }

    #[test]
    fn spend_deducts_cost() {
        let mut ledger = Ledger::new(&EconomyConfig::default());
        assert_eq!(ledger.spend(EconomicAction::Bribe, phase()), Ok(2));
        assert_eq!(ledger.balance(), 2);
    }

    #[test]
    fn insufficient_funds_leaves_balance() {
        let mut ledger = Ledger::new(&EconomyConfig::default());
        let err = ledger.spend(EconomicAction::Sabotage, phase()).unwrap_err();
        assert_eq!(
            err,
            AbilityError::InsufficientFunds {
                needed: 12,
                available: 10
            }
        );
        assert_eq!(ledger.balance(), 10);
        assert!(ledger.entries().is_empty());
    }

    #[test]
    fn economic_victory_threshold() {
        let config = EconomyConfig {
            starting_latinum: 190,
            ..EconomyConfig::default()
        };
        let mut ledger = Ledger::new(&config);
        assert!(!ledger.has_economic_victory());
        ledger.credit_income(4, phase());
        assert_eq!(ledger.balance(), 202);
        assert!(ledger.has_economic_victory());
    }
}
