//! Alliance bookkeeping.
//!
//! Each unordered pair of factions is in one of three states: no relation, a
//! pending proposal, or an active alliance. Absence from the table is the "no
//! relation" state.

use serde::{Deserialize, Serialize};

use crate::board::{BoardState, Faction};
use crate::error::AllianceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Relation {
    Proposed { by: Faction },
    Active,
}

/// One pair and its relation. `a < b` always.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alliance {
    pub a: Faction,
    pub b: Faction,
    pub relation: Relation,
}

impl Alliance {
    pub fn involves(&self, faction: Faction) -> bool {
        self.a == faction || self.b == faction
    }

    pub fn partner_of(&self, faction: Faction) -> Option<Faction> {
        if self.a == faction {
            Some(self.b)
        } else if self.b == faction {
            Some(self.a)
        } else {
            None
        }
    }
}

fn pair(a: Faction, b: Faction) -> (Faction, Faction) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllianceManager {
    relations: Vec<Alliance>,
    /// Active alliances a faction may hold at once. None means unlimited.
    limit: Option<usize>,
}

impl AllianceManager {
    pub fn new(limit: Option<usize>) -> Self {
        AllianceManager {
            relations: Vec::new(),
            limit,
        }
    }

    fn find(&self, a: Faction, b: Faction) -> Option<usize> {
        let (a, b) = pair(a, b);
        self.relations.iter().position(|r| r.a == a && r.b == b)
    }

    pub fn relation(&self, a: Faction, b: Faction) -> Option<Relation> {
        self.find(a, b).map(|i| self.relations[i].relation)
    }

    pub fn is_allied(&self, a: Faction, b: Faction) -> bool {
        self.relation(a, b) == Some(Relation::Active)
    }

    /// Number of active alliances `faction` holds.
    pub fn active_count(&self, faction: Faction) -> usize {
        self.relations
            .iter()
            .filter(|r| r.relation == Relation::Active && r.involves(faction))
            .count()
    }

    pub fn allies_of(&self, faction: Faction) -> Vec<Faction> {
        self.relations
            .iter()
            .filter(|r| r.relation == Relation::Active)
            .filter_map(|r| r.partner_of(faction))
            .collect()
    }

    /// Active pairs, each as `(a, b)` with `a < b`.
    pub fn active_pairs(&self) -> Vec<(Faction, Faction)> {
        self.relations
            .iter()
            .filter(|r| r.relation == Relation::Active)
            .map(|r| (r.a, r.b))
            .collect()
    }

    pub fn relations(&self) -> &[Alliance] {
        &self.relations
    }

    fn check_limit(&self, faction: Faction) -> Result<(), AllianceError> {
        match self.limit {
            Some(limit) if self.active_count(faction) >= limit => {
                Err(AllianceError::LimitReached(faction))
            }
            _ => Ok(()),
        }
    }

    /// `from` proposes an alliance to `to`. Both must be in `active`.
    pub fn propose(
        &mut self,
        from: Faction,
        to: Faction,
        active: &[Faction],
    ) -> Result<(), AllianceError> {
        if from == to {
            return Err(AllianceError::SameFaction);
        }
        for f in [from, to] {
            if !active.contains(&f) {
                return Err(AllianceError::Inactive(f));
            }
        }
        if self.find(from, to).is_some() {
            return Err(AllianceError::AlreadyRelated(from, to));
        }
        self.check_limit(from)?;
        let (a, b) = pair(from, to);
        self.relations.push(Alliance {
            a,
            b,
            relation: Relation::Proposed { by: from },
        });
        Ok(())
    }

    /// `by` accepts the proposal made by `proposer`.
    pub fn accept(&mut self, by: Faction, proposer: Faction) -> Result<(), AllianceError> {
        let i = self.pending(by, proposer)?;
        self.check_limit(by)?;
        self.check_limit(proposer)?;
        self.relations[i].relation = Relation::Active;
        Ok(())
    }

    /// `by` turns down the proposal made by `proposer`.
    pub fn reject(&mut self, by: Faction, proposer: Faction) -> Result<(), AllianceError> {
        let i = self.pending(by, proposer)?;
        self.relations.remove(i);
        Ok(())
    }

    /// Ends an active alliance. Either side may do this alone.
    pub fn break_alliance(&mut self, a: Faction, b: Faction) -> Result<(), AllianceError> {
        match self.find(a, b) {
            Some(i) if self.relations[i].relation == Relation::Active => {
                self.relations.remove(i);
                Ok(())
            }
            _ => Err(AllianceError::NotAllied(a, b)),
        }
    }

    fn pending(&self, by: Faction, proposer: Faction) -> Result<usize, AllianceError> {
        if by == proposer {
            return Err(AllianceError::SameFaction);
        }
        let i = self
            .find(by, proposer)
            .ok_or(AllianceError::NoProposal(proposer, by))?;
        match self.relations[i].relation {
            Relation::Proposed { by: p } if p == proposer => Ok(i),
            Relation::Proposed { .. } => Err(AllianceError::OwnProposal(by)),
            Relation::Active => Err(AllianceError::NoProposal(proposer, by)),
        }
    }

    /// Drops every relation involving `faction`. Returns the dropped entries.
    pub fn drop_faction(&mut self, faction: Faction) -> Vec<Alliance> {
        let (dropped, kept): (Vec<Alliance>, Vec<Alliance>) =
            std::mem::take(&mut self.relations).into_iter().partition(|r| r.involves(faction));
        self.relations = kept;
        dropped
    }

    /// Supply centers owned by `a` and `b` together.
    pub fn combined_supply_centers(&self, state: &BoardState, a: Faction, b: Faction) -> usize {
        state.center_count(a) + state.center_count(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{standard_board, ALL_FACTIONS};
    use Faction::*;

    #[test]
    fn propose_accept_break() {
        let mut m = AllianceManager::new(None);
        m.propose(Federation, Klingon, &ALL_FACTIONS).unwrap();
        assert_eq!(m.relation(Klingon, Federation), Some(Relation::Proposed { by: Federation }));
        assert!(!m.is_allied(Federation, Klingon));

        m.accept(Klingon, Federation).unwrap();
        assert!(m.is_allied(Klingon, Federation));
        assert_eq!(m.allies_of(Federation), vec![Klingon]);
        assert_eq!(m.active_pairs(), vec![(Federation, Klingon)]);

        m.break_alliance(Federation, Klingon).unwrap();
        assert_eq!(m.relation(Federation, Klingon), None);
        assert_eq!(
            m.break_alliance(Federation, Klingon),
            Err(AllianceError::NotAllied(Federation, Klingon))
        );
    }

    #[test]
    fn reject_clears_proposal() {
        let mut m = AllianceManager::new(None);
        m.propose(Romulan, Breen, &ALL_FACTIONS).unwrap();
        m.reject(Breen, Romulan).unwrap();
        assert_eq!(m.relation(Romulan, Breen), None);
        m.propose(Breen, Romulan, &ALL_FACTIONS).unwrap();
    }

    #[test]
    fn transition_errors() {
        let mut m = AllianceManager::new(None);
        assert_eq!(m.propose(Gorn, Gorn, &ALL_FACTIONS), Err(AllianceError::SameFaction));
        assert_eq!(
            m.propose(Gorn, Ferengi, &[Gorn, Klingon]),
            Err(AllianceError::Inactive(Ferengi))
        );
        m.propose(Gorn, Ferengi, &ALL_FACTIONS).unwrap();
        assert_eq!(
            m.propose(Ferengi, Gorn, &ALL_FACTIONS),
            Err(AllianceError::AlreadyRelated(Ferengi, Gorn))
        );
        assert_eq!(m.accept(Gorn, Ferengi), Err(AllianceError::OwnProposal(Gorn)));
        assert_eq!(m.accept(Klingon, Gorn), Err(AllianceError::NoProposal(Gorn, Klingon)));
        assert_eq!(m.break_alliance(Gorn, Ferengi), Err(AllianceError::NotAllied(Gorn, Ferengi)));
    }

    #[test]
    fn alliance_limit() {
        let mut m = AllianceManager::new(Some(1));
        m.propose(Federation, Klingon, &ALL_FACTIONS).unwrap();
        m.accept(Klingon, Federation).unwrap();
        assert_eq!(
            m.propose(Federation, Romulan, &ALL_FACTIONS),
            Err(AllianceError::LimitReached(Federation))
        );
        m.propose(Romulan, Federation, &ALL_FACTIONS).unwrap();
        assert_eq!(m.accept(Federation, Romulan), Err(AllianceError::LimitReached(Federation)));
    }

    #[test]
    fn dropping_a_faction_clears_its_relations() {
        let mut m = AllianceManager::new(None);
        m.propose(Federation, Klingon, &ALL_FACTIONS).unwrap();
        m.accept(Klingon, Federation).unwrap();
        m.propose(Cardassian, Klingon, &ALL_FACTIONS).unwrap();
        m.propose(Breen, Gorn, &ALL_FACTIONS).unwrap();

        let dropped = m.drop_faction(Klingon);
        assert_eq!(dropped.len(), 2);
        assert_eq!(m.relations().len(), 1);
        assert!(m.allies_of(Federation).is_empty());
    }

    #[test]
    fn combined_centers() {
        let board = standard_board();
        let state = BoardState::initial(&board, 2370, &ALL_FACTIONS);
        let m = AllianceManager::new(None);
        assert_eq!(m.combined_supply_centers(&state, Federation, Gorn), 6);
    }
}
