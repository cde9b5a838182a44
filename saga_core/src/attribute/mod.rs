//! Attribute aggregation - Collect contributions from traits and reduce them
//!
//! Every trait carries a list of `(key, value)` contributions. The aggregator
//! walks the active traits in order, keeps the contributions whose key
//! matches, and collapses them with a [`ReduceMode`].

mod filter;

pub use filter::ContributionFilter;

use crate::character::{Character, Trait};
use crate::types::TraitId;
use crate::value::{resolve_int, resolve_one, AttributeValue, ResolveError, ValueContext};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single bonus emitted by a trait toward a named attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contribution {
    pub key: String,
    #[serde(default)]
    pub value: AttributeValue,
    /// Optional modifier/condition tag (e.g. "vs. mind-affecting")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modifier: Option<String>,
    /// Only applies in specific situations
    #[serde(default)]
    pub situational: bool,
}

impl Contribution {
    pub fn new(key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        Contribution {
            key: key.into(),
            value: value.into(),
            modifier: None,
            situational: false,
        }
    }

    /// Mark as a situational modifier
    pub fn situational(mut self) -> Self {
        self.situational = true;
        self
    }

    pub fn with_modifier(mut self, modifier: impl Into<String>) -> Self {
        self.modifier = Some(modifier.into());
        self
    }
}

/// Strategy used to collapse contributions sharing a key
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReduceMode {
    Sum,
    Max,
    Or,
    First,
    Values,
    ValuesToLowercase,
    NumericValues,
    Mapped,
    Summary,
}

/// A contribution together with where it came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappedContribution {
    pub source: String,
    pub source_id: TraitId,
    pub value: AttributeValue,
    pub modifier: Option<String>,
    pub situational: bool,
}

/// Result of one reduction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Reduced {
    Number(i32),
    Bool(bool),
    Value(Option<AttributeValue>),
    Values(Vec<AttributeValue>),
    Strings(Vec<String>),
    Mapped(Vec<MappedContribution>),
    Summary(String),
}

impl Reduced {
    pub fn as_number(&self) -> Option<i32> {
        match self {
            Reduced::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Reduced::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_strings(&self) -> Option<&[String]> {
        match self {
            Reduced::Strings(s) => Some(s),
            _ => None,
        }
    }
}

/// One field per requested mode
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Aggregation {
    results: BTreeMap<ReduceMode, Reduced>,
}

impl Aggregation {
    pub fn get(&self, mode: ReduceMode) -> Option<&Reduced> {
        self.results.get(&mode)
    }

    pub fn number(&self, mode: ReduceMode) -> Option<i32> {
        self.get(mode).and_then(Reduced::as_number)
    }

    pub fn summary(&self) -> Option<&str> {
        match self.get(ReduceMode::Summary) {
            Some(Reduced::Summary(s)) => Some(s),
            _ => None,
        }
    }

    pub fn modes(&self) -> impl Iterator<Item = &ReduceMode> {
        self.results.keys()
    }
}

/// Reduces contributions over a fixed, ordered set of traits
pub struct Aggregator<'a> {
    traits: Vec<&'a Trait>,
    ctx: &'a dyn ValueContext,
}

impl<'a> Aggregator<'a> {
    /// Create an aggregator over the given traits (order is significant for FIRST/VALUES)
    pub fn new(traits: Vec<&'a Trait>, ctx: &'a dyn ValueContext) -> Self {
        Aggregator { traits, ctx }
    }

    pub fn traits(&self) -> &[&'a Trait] {
        &self.traits
    }

    /// All matching contributions in trait order
    pub fn contributions(&self, key: &str, filter: &ContributionFilter) -> Vec<(&'a Trait, &'a Contribution)> {
        let mut found = Vec::new();
        for t in self.traits.iter().copied() {
            if !filter.accepts_trait(t) {
                continue;
            }
            for c in &t.contributions {
                if c.key == key && filter.accepts_contribution(c) {
                    found.push((t, c));
                }
            }
        }
        found
    }

    /// Reduce all contributions for `key` with a single mode
    pub fn reduce(&self, key: &str, mode: ReduceMode, filter: &ContributionFilter) -> Result<Reduced, ResolveError> {
        let found = self.contributions(key, filter);
        reduce_contributions(&found, mode, self.ctx)
    }

    /// Reduce with several modes at once
    pub fn aggregate(
        &self,
        key: &str,
        modes: &[ReduceMode],
        filter: &ContributionFilter,
    ) -> Result<Aggregation, ResolveError> {
        let found = self.contributions(key, filter);
        let mut results = BTreeMap::new();
        for mode in modes {
            results.insert(*mode, reduce_contributions(&found, *mode, self.ctx)?);
        }
        Ok(Aggregation { results })
    }

    pub fn sum(&self, key: &str, filter: &ContributionFilter) -> Result<i32, ResolveError> {
        self.reduce(key, ReduceMode::Sum, filter).map(|r| r.as_number().unwrap_or(0))
    }

    pub fn max(&self, key: &str, filter: &ContributionFilter) -> Result<i32, ResolveError> {
        self.reduce(key, ReduceMode::Max, filter).map(|r| r.as_number().unwrap_or(0))
    }

    pub fn any(&self, key: &str, filter: &ContributionFilter) -> bool {
        self.contributions(key, filter).iter().any(|(_, c)| c.value.is_truthy())
    }

    pub fn first(&self, key: &str, filter: &ContributionFilter) -> Option<AttributeValue> {
        self.contributions(key, filter)
            .into_iter()
            .map(|(_, c)| c.value.clone())
            .find(|v| !v.is_null())
    }

    pub fn values_lowercase(&self, key: &str, filter: &ContributionFilter) -> Vec<String> {
        lowercase_values(&self.contributions(key, filter))
    }

    pub fn summary(&self, key: &str, filter: &ContributionFilter) -> String {
        summarize(&self.contributions(key, filter))
    }
}

/// Aggregate over a character's active traits, using its persisted derived
/// block to resolve variables
pub fn aggregate(
    character: &Character,
    key: &str,
    modes: &[ReduceMode],
    filter: &ContributionFilter,
) -> Result<Aggregation, ResolveError> {
    let aggregator = Aggregator::new(character.active_traits(), &character.stats);
    aggregator.aggregate(key, modes, filter)
}

fn reduce_contributions(
    found: &[(&Trait, &Contribution)],
    mode: ReduceMode,
    ctx: &dyn ValueContext,
) -> Result<Reduced, ResolveError> {
    let reduced = match mode {
        ReduceMode::Sum => Reduced::Number(resolve_int(found.iter().map(|(_, c)| &c.value), ctx)?),
        ReduceMode::Max => {
            let mut best: Option<f64> = None;
            for (_, c) in found {
                if let Some(n) = resolve_one(&c.value, ctx)? {
                    best = Some(best.map_or(n, |b| b.max(n)));
                }
            }
            Reduced::Number(best.map_or(0, |b| b.floor() as i32))
        }
        ReduceMode::Or => Reduced::Bool(found.iter().any(|(_, c)| c.value.is_truthy())),
        ReduceMode::First => Reduced::Value(
            found
                .iter()
                .map(|(_, c)| &c.value)
                .find(|v| !v.is_null())
                .cloned(),
        ),
        ReduceMode::Values => Reduced::Values(found.iter().map(|(_, c)| c.value.clone()).collect()),
        ReduceMode::ValuesToLowercase => Reduced::Strings(lowercase_values(found)),
        ReduceMode::NumericValues => Reduced::Values(
            found
                .iter()
                .map(|(_, c)| c.value.clone())
                .filter(|v| v.as_number().is_some())
                .collect(),
        ),
        ReduceMode::Mapped => Reduced::Mapped(
            found
                .iter()
                .map(|(t, c)| MappedContribution {
                    source: t.name.clone(),
                    source_id: t.id.clone(),
                    value: c.value.clone(),
                    modifier: c.modifier.clone(),
                    situational: c.situational,
                })
                .collect(),
        ),
        ReduceMode::Summary => Reduced::Summary(summarize(found)),
    };
    Ok(reduced)
}

fn lowercase_values(found: &[(&Trait, &Contribution)]) -> Vec<String> {
    found
        .iter()
        .filter(|(_, c)| !c.value.is_null())
        .map(|(_, c)| c.value.to_string().to_lowercase())
        .collect()
}

fn summarize(found: &[(&Trait, &Contribution)]) -> String {
    found
        .iter()
        .filter(|(_, c)| !c.value.is_null())
        .map(|(t, c)| match &c.modifier {
            Some(modifier) => format!("{}: {} ({})", t.name, c.value, modifier),
            None => format!("{}: {}", t.name, c.value),
        })
        .collect::<Vec<_>>()
        .join(", ")
}
