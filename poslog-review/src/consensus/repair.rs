//! Tagset repair: declarative merge rules applied before majority voting
//!
//! Some taggers work in a source tagset that cannot express a distinction
//! (Penn-Treebank has no AUX or SCONJ) and systematically map it to a related
//! tag. A [`TagsetProfile`] lists the merges that undo those collisions.

use crate::error::ReviewResult;
use crate::tagset::TagsetId;

/// Multiset of tags at one token position, in first-seen order
///
/// Ordering matters only for ties in [`TagCounts::most_common`], which keeps
/// the first-seen tag first (same as a standard frequency counter).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagCounts {
    entries: Vec<(String, usize)>,
}

impl TagCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count every tag yielded by `tags`
    pub fn from_tags<'a>(tags: impl IntoIterator<Item = &'a str>) -> Self {
        let mut counts = Self::new();
        for tag in tags {
            counts.add(tag, 1);
        }
        counts
    }

    pub fn add(&mut self, tag: &str, n: usize) {
        match self.entries.iter_mut().find(|(t, _)| t == tag) {
            Some((_, count)) => *count += n,
            None => self.entries.push((tag.to_string(), n)),
        }
    }

    pub fn count(&self, tag: &str) -> usize {
        self.entries
            .iter()
            .find(|(t, _)| t == tag)
            .map(|(_, c)| *c)
            .unwrap_or(0)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.entries.iter().any(|(t, _)| t == tag)
    }

    /// Number of distinct tags
    pub fn distinct(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all counts
    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, c)| c).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.entries.iter().map(|(t, c)| (t.as_str(), *c))
    }

    /// Tags by descending count; equal counts keep first-seen order
    pub fn most_common(&self) -> Vec<(&str, usize)> {
        let mut ranked: Vec<(&str, usize)> = self.iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
    }

    /// Most common tag other than `excluded`
    fn leader_excluding(&self, excluded: &str) -> Option<String> {
        self.most_common()
            .into_iter()
            .find(|(t, _)| *t != excluded)
            .map(|(t, _)| t.to_string())
    }

    fn remove(&mut self, tag: &str) -> usize {
        match self.entries.iter().position(|(t, _)| t == tag) {
            Some(pos) => self.entries.remove(pos).1,
            None => 0,
        }
    }

    /// Move the votes of `from` onto `into` and drop `from`
    fn merge_into(&mut self, from: &str, into: &str) -> bool {
        if from == into || !self.contains(from) {
            return false;
        }
        let moved = self.remove(from);
        self.add(into, moved);
        true
    }
}

/// One declarative merge rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeRule {
    /// When `tag` appears next to at least one other tag, its votes go to the
    /// most common other tag
    FoldIntoStrongestOther { tag: String },

    /// When the multiset holds exactly the two tags `first` and `second`,
    /// all votes go to `into`
    CollapsePair {
        first: String,
        second: String,
        into: String,
    },

    /// When `tag` appears at all, its votes go to whichever tag is currently
    /// most common and `tag` is dropped
    ///
    /// If `tag` itself leads, its votes are discarded. A multiset holding only
    /// `tag` is left alone so that no position ends up without any tag.
    FoldIntoLeader { tag: String },
}

impl MergeRule {
    pub fn fold_into_strongest_other(tag: &str) -> Self {
        MergeRule::FoldIntoStrongestOther {
            tag: tag.to_string(),
        }
    }

    pub fn collapse_pair(first: &str, second: &str, into: &str) -> Self {
        MergeRule::CollapsePair {
            first: first.to_string(),
            second: second.to_string(),
            into: into.to_string(),
        }
    }

    pub fn fold_into_leader(tag: &str) -> Self {
        MergeRule::FoldIntoLeader {
            tag: tag.to_string(),
        }
    }

    /// Apply the rule in place; returns true when `counts` changed
    pub fn apply(&self, counts: &mut TagCounts) -> bool {
        match self {
            MergeRule::FoldIntoStrongestOther { tag } => {
                if !counts.contains(tag) || counts.distinct() < 2 {
                    return false;
                }
                match counts.leader_excluding(tag) {
                    Some(target) => counts.merge_into(tag, &target),
                    None => false,
                }
            }
            MergeRule::CollapsePair {
                first,
                second,
                into,
            } => {
                if counts.distinct() != 2 || !counts.contains(first) || !counts.contains(second) {
                    return false;
                }
                let other = if into == first { second } else { first };
                counts.merge_into(other, into)
            }
            MergeRule::FoldIntoLeader { tag } => {
                if !counts.contains(tag) || counts.distinct() < 2 {
                    return false;
                }
                let leader = counts.most_common()[0].0.to_string();
                if &leader == tag {
                    counts.remove(tag);
                    true
                } else {
                    counts.merge_into(tag, &leader)
                }
            }
        }
    }
}

/// Ordered merge rules for one tagset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagsetProfile {
    name: String,
    rules: Vec<MergeRule>,
}

impl TagsetProfile {
    /// Profile with no rules
    pub fn passthrough(name: &str) -> Self {
        Self {
            name: name.to_string(),
            rules: Vec::new(),
        }
    }

    /// Repairs for Universal tags produced through Penn-Treebank-based taggers
    pub fn universal() -> Self {
        Self::passthrough("upos")
            // X (other) is a non-answer when another tag was proposed
            .with_rule(MergeRule::fold_into_strongest_other("X"))
            // PTB has no AUX: auxiliaries surface as VERB
            .with_rule(MergeRule::collapse_pair("AUX", "VERB", "AUX"))
            // PTB IN covers subordinating conjunctions: they surface as ADP
            .with_rule(MergeRule::collapse_pair("SCONJ", "ADP", "SCONJ"))
            .with_rule(MergeRule::collapse_pair("SYM", "NUM", "SYM"))
            // NIL should never occur
            .with_rule(MergeRule::fold_into_leader("NIL"))
    }

    /// Profile for a session tagset
    pub fn for_tagset(tagset: TagsetId) -> Self {
        match tagset {
            TagsetId::Universal => Self::universal(),
            TagsetId::PennTreebank => Self::passthrough("ptb"),
        }
    }

    /// Profile by name; unknown names fail with `UnsupportedTagset`
    pub fn by_name(name: &str) -> ReviewResult<Self> {
        Ok(Self::for_tagset(name.parse()?))
    }

    pub fn with_rule(mut self, rule: MergeRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rules(&self) -> &[MergeRule] {
        &self.rules
    }

    /// Apply every rule in order, repeating the pass until nothing changes
    ///
    /// A later rule can expose an earlier one (dropping NIL may leave exactly
    /// `{AUX, VERB}`), so a single pass is not always stable. Every change
    /// removes a distinct tag, which bounds the loop.
    ///
    /// Results deliberately differ from one pass on such inputs: one vote each
    /// for AUX, VERB and NIL ends as a unanimous AUX, where a single pass
    /// would keep VERB as a dissenter at 2/3 confidence.
    pub fn repair(&self, mut counts: TagCounts) -> TagCounts {
        loop {
            let mut changed = false;
            for rule in &self.rules {
                changed |= rule.apply(&mut counts);
            }
            if !changed {
                return counts;
            }
        }
    }
}

impl Default for TagsetProfile {
    fn default() -> Self {
        Self::universal()
    }
}
