//! Consensus engine
//!
//! Turns the tag sequences of several independent taggers for one log line
//! into a [`ConsensusRecord`]: per token a majority tag (absent on a tie), a
//! confidence score, and the taggers that dissented.
//!
//! Algorithm per token position:
//! 1. Count the tags proposed by all taggers
//! 2. Repair known tagset collisions ([`TagsetProfile`])
//! 3. One tag left → unanimous; top two counts equal → tie; otherwise the
//!    strict leader wins with `count / number_of_taggers` confidence
//!
//! Pure functions, no shared state: lines can be processed in parallel.

pub mod repair;
pub mod stats;

pub use repair::{MergeRule, TagCounts, TagsetProfile};
pub use stats::{AgreementCounts, ConsensusStats};

use crate::error::{ReviewError, ReviewResult};
use rayon::prelude::*;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Tag sequences from each tagger for one log line, in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaggerOutputs {
    runs: Vec<(String, Vec<String>)>,
}

impl TaggerOutputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the output of `tagger`
    ///
    /// Replacing keeps the tagger's original position.
    pub fn insert(&mut self, tagger: impl Into<String>, tags: Vec<String>) {
        let tagger = tagger.into();
        match self.runs.iter_mut().find(|(name, _)| *name == tagger) {
            Some((_, existing)) => *existing = tags,
            None => self.runs.push((tagger, tags)),
        }
    }

    /// Number of taggers
    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.runs
            .iter()
            .map(|(name, tags)| (name.as_str(), tags.as_slice()))
    }

    pub fn get(&self, tagger: &str) -> Option<&[String]> {
        self.runs
            .iter()
            .find(|(name, _)| name == tagger)
            .map(|(_, tags)| tags.as_slice())
    }

    /// Shared sequence length; fails when empty or lengths disagree
    pub fn token_count(&self) -> ReviewResult<usize> {
        let mut runs = self.runs.iter();
        let (first_name, first_tags) = runs
            .next()
            .ok_or_else(|| ReviewError::Input("no tagger outputs provided".to_string()))?;

        for (name, tags) in runs {
            if tags.len() != first_tags.len() {
                return Err(ReviewError::Input(format!(
                    "tagger '{}' produced {} tags but '{}' produced {}",
                    name,
                    tags.len(),
                    first_name,
                    first_tags.len()
                )));
            }
        }
        Ok(first_tags.len())
    }
}

impl<S: Into<String>> FromIterator<(S, Vec<String>)> for TaggerOutputs {
    fn from_iter<I: IntoIterator<Item = (S, Vec<String>)>>(iter: I) -> Self {
        let mut outputs = TaggerOutputs::new();
        for (tagger, tags) in iter {
            outputs.insert(tagger, tags);
        }
        outputs
    }
}

impl Serialize for TaggerOutputs {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.runs.len()))?;
        for (tagger, tags) in &self.runs {
            map.serialize_entry(tagger, tags)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for TaggerOutputs {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OutputsVisitor;

        impl<'de> Visitor<'de> for OutputsVisitor {
            type Value = TaggerOutputs;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of tagger name to tag sequence")
            }

            // Map entries arrive in document order
            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut outputs = TaggerOutputs::new();
                while let Some((tagger, tags)) = access.next_entry::<String, Vec<String>>()? {
                    outputs.insert(tagger, tags);
                }
                Ok(outputs)
            }
        }

        deserializer.deserialize_map(OutputsVisitor)
    }
}

/// Dissenting taggers at one token position (tagger id → tag)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MinorityTags(BTreeMap<String, String>);

impl MinorityTags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, tagger: impl Into<String>, tag: impl Into<String>) {
        self.0.insert(tagger.into(), tag.into());
    }

    pub fn get(&self, tagger: &str) -> Option<&str> {
        self.0.get(tagger).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Distinct dissenting tags with their vote counts, sorted by tag
    pub fn tag_counts(&self) -> Vec<(&str, usize)> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for tag in self.0.values() {
            *counts.entry(tag.as_str()).or_default() += 1;
        }
        counts.into_iter().collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MinorityTags {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut minority = MinorityTags::new();
        for (tagger, tag) in iter {
            minority.insert(tagger, tag);
        }
        minority
    }
}

/// Agreement summary for one log line
///
/// Invariant: the three sequences have the same length (the token count).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsensusRecord {
    /// Majority tag per token; `None` marks an unresolved tie
    pub majority: Vec<Option<String>>,
    /// Share of taggers voting for the majority tag, 0.0 on a tie
    pub confidence: Vec<f64>,
    /// Dissenting taggers per token; empty when unanimous
    pub minority: Vec<MinorityTags>,
}

impl ConsensusRecord {
    /// Token count
    pub fn len(&self) -> usize {
        self.majority.len()
    }

    pub fn is_empty(&self) -> bool {
        self.majority.is_empty()
    }

    /// Check the length invariant (used on records loaded from disk)
    pub fn validate(&self) -> ReviewResult<()> {
        let len = self.majority.len();
        if self.confidence.len() != len || self.minority.len() != len {
            return Err(ReviewError::Input(format!(
                "consensus sequences disagree in length: majority={}, confidence={}, minority={}",
                self.majority.len(),
                self.confidence.len(),
                self.minority.len()
            )));
        }
        Ok(())
    }

    /// Number of tokens left without a majority
    pub fn tie_count(&self) -> usize {
        self.majority.iter().filter(|m| m.is_none()).count()
    }

    /// Lowest per-token confidence, `None` for an empty line
    pub fn min_confidence(&self) -> Option<f64> {
        self.confidence.iter().copied().reduce(f64::min)
    }
}

/// Build consensus with the Universal tagset repairs
pub fn build_consensus(outputs: &TaggerOutputs) -> ReviewResult<ConsensusRecord> {
    build_consensus_with(&TagsetProfile::universal(), outputs)
}

/// Build consensus for one log line under `profile`
///
/// Fails with `Input` if `outputs` is empty or the sequences differ in length.
pub fn build_consensus_with(
    profile: &TagsetProfile,
    outputs: &TaggerOutputs,
) -> ReviewResult<ConsensusRecord> {
    let token_count = outputs.token_count()?;
    let tagger_count = outputs.len() as f64;

    let mut record = ConsensusRecord {
        majority: Vec::with_capacity(token_count),
        confidence: Vec::with_capacity(token_count),
        minority: Vec::with_capacity(token_count),
    };

    for position in 0..token_count {
        let observed =
            TagCounts::from_tags(outputs.iter().map(|(_, tags)| tags[position].as_str()));
        let counts = profile.repair(observed.clone());

        if counts != observed {
            tracing::trace!(
                position,
                before = ?observed,
                after = ?counts,
                "Tagset repair applied"
            );
        }

        let ranked = counts.most_common();
        let (majority, confidence) = match ranked.as_slice() {
            [] => (None, 0.0),
            [(tag, _)] => (Some(tag.to_string()), 1.0),
            [(_, first), (_, second), ..] if first == second => (None, 0.0),
            [(tag, count), ..] => (Some(tag.to_string()), *count as f64 / tagger_count),
        };

        // Dissenters: taggers whose tag survived repair but lost the vote.
        // Votes merged away by repair count towards their target, not as dissent.
        let minority: MinorityTags = if counts.distinct() > 1 {
            outputs
                .iter()
                .map(|(tagger, tags)| (tagger, tags[position].as_str()))
                .filter(|(_, tag)| counts.contains(tag) && majority.as_deref() != Some(*tag))
                .collect()
        } else {
            MinorityTags::new()
        };

        record.majority.push(majority);
        record.confidence.push(confidence);
        record.minority.push(minority);
    }

    Ok(record)
}

/// Build consensus for many lines in parallel
///
/// One result per input line, in input order; a failing line does not
/// affect the others.
pub fn build_consensus_batch(
    profile: &TagsetProfile,
    lines: &[TaggerOutputs],
) -> Vec<ReviewResult<ConsensusRecord>> {
    lines
        .par_iter()
        .map(|outputs| build_consensus_with(profile, outputs))
        .collect()
}
