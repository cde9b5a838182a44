//! ContributionFilter - Restrict which contributions an aggregation sees

use super::Contribution;
use crate::character::Trait;
use crate::types::TraitKind;

/// Restriction applied before reduction
///
/// Hashable so it can take part in cache keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ContributionFilter {
    exclude_situational: bool,
    only_kinds: Vec<TraitKind>,
    exclude_kinds: Vec<TraitKind>,
}

impl ContributionFilter {
    /// Accept everything
    pub fn all() -> Self {
        Self::default()
    }

    /// Drop contributions flagged as situational
    pub fn without_situational(mut self) -> Self {
        self.exclude_situational = true;
        self
    }

    /// Keep only traits of these kinds
    pub fn only(mut self, kinds: &[TraitKind]) -> Self {
        self.only_kinds = kinds.to_vec();
        self.only_kinds.sort();
        self
    }

    /// Skip traits of these kinds
    pub fn excluding(mut self, kinds: &[TraitKind]) -> Self {
        self.exclude_kinds = kinds.to_vec();
        self.exclude_kinds.sort();
        self
    }

    pub(crate) fn accepts_trait(&self, t: &Trait) -> bool {
        if !self.only_kinds.is_empty() && !self.only_kinds.contains(&t.kind) {
            return false;
        }
        !self.exclude_kinds.contains(&t.kind)
    }

    pub(crate) fn accepts_contribution(&self, c: &Contribution) -> bool {
        !(self.exclude_situational && c.situational)
    }
}
