//! Corpus-level agreement statistics over many consensus records
//!
//! Reporting only; nothing here feeds back into the review.

use super::ConsensusRecord;
use serde::Serialize;
use std::fmt;

/// Agreement tallies for one unit (whole lines or single tokens)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AgreementCounts {
    pub total: usize,
    /// Majority found (no tie)
    pub majority_found: usize,
    /// All taggers agreed (confidence 1.0)
    pub clear_majority: usize,
    /// Confidence ≥ 0.8
    pub eighty_percent: usize,
    /// Confidence > 0.5
    pub absolute_majority: usize,
    /// Tie, no majority
    pub parity: usize,
}

impl AgreementCounts {
    /// `count` as a percentage of `total`; 0.0 for an empty corpus
    pub fn percent(&self, count: usize) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            count as f64 / self.total as f64 * 100.0
        }
    }

    fn write_report(&self, f: &mut fmt::Formatter<'_>, unit: &str) -> fmt::Result {
        writeln!(f, "For {} ({} in total):", unit, self.total)?;
        writeln!(
            f,
            "Majority found: {} times ({:.2}%)",
            self.majority_found,
            self.percent(self.majority_found)
        )?;
        writeln!(
            f,
            "- Clear majority: {} times ({:.2}%)",
            self.clear_majority,
            self.percent(self.clear_majority)
        )?;
        writeln!(
            f,
            "- Eighty percent: {} times ({:.2}%)",
            self.eighty_percent,
            self.percent(self.eighty_percent)
        )?;
        writeln!(
            f,
            "- Absolute majority: {} times ({:.2}%)",
            self.absolute_majority,
            self.percent(self.absolute_majority)
        )?;
        writeln!(
            f,
            "Parity: {} times ({:.2}%)",
            self.parity,
            self.percent(self.parity)
        )
    }
}

/// Line- and token-level agreement across a corpus
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConsensusStats {
    pub lines: AgreementCounts,
    pub tokens: AgreementCounts,
}

impl ConsensusStats {
    /// Tally agreement over `records`
    ///
    /// A line counts towards a confidence bucket when its weakest token does.
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a ConsensusRecord>) -> Self {
        let mut stats = ConsensusStats::default();

        for record in records {
            let lines = &mut stats.lines;
            lines.total += 1;

            let ties = record.tie_count();
            if ties > 0 {
                lines.parity += 1;
            } else {
                lines.majority_found += 1;
            }

            if let Some(min) = record.min_confidence() {
                if min >= 1.0 {
                    lines.clear_majority += 1;
                }
                if min >= 0.8 {
                    lines.eighty_percent += 1;
                }
                if min > 0.5 {
                    lines.absolute_majority += 1;
                }
            }

            let tokens = &mut stats.tokens;
            tokens.total += record.len();
            tokens.parity += ties;
            tokens.majority_found += record.len() - ties;
            for &confidence in &record.confidence {
                if confidence >= 1.0 {
                    tokens.clear_majority += 1;
                }
                if confidence >= 0.8 {
                    tokens.eighty_percent += 1;
                }
                if confidence > 0.5 {
                    tokens.absolute_majority += 1;
                }
            }
        }

        stats
    }
}

impl fmt::Display for ConsensusStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.lines.write_report(f, "whole log lines")?;
        writeln!(f)?;
        self.tokens.write_report(f, "words")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::MinorityTags;

    fn record(majority: &[Option<&str>], confidence: &[f64]) -> ConsensusRecord {
        ConsensusRecord {
            majority: majority.iter().map(|m| m.map(str::to_string)).collect(),
            confidence: confidence.to_vec(),
            minority: vec![MinorityTags::new(); majority.len()],
        }
    }

    #[test]
    fn test_stats_over_mixed_corpus() {
        let records = vec![
            record(&[Some("NOUN"), Some("VERB")], &[1.0, 1.0]),
            record(&[Some("NOUN"), Some("VERB")], &[1.0, 2.0 / 3.0]),
            record(&[None, Some("VERB")], &[0.0, 0.8]),
        ];

        let stats = ConsensusStats::from_records(&records);

        assert_eq!(stats.lines.total, 3);
        assert_eq!(stats.lines.majority_found, 2);
        assert_eq!(stats.lines.parity, 1);
        assert_eq!(stats.lines.clear_majority, 1);
        assert_eq!(stats.lines.eighty_percent, 1);
        assert_eq!(stats.lines.absolute_majority, 2);

        assert_eq!(stats.tokens.total, 6);
        assert_eq!(stats.tokens.majority_found, 5);
        assert_eq!(stats.tokens.parity, 1);
        assert_eq!(stats.tokens.clear_majority, 3);
        assert_eq!(stats.tokens.eighty_percent, 4);
        assert_eq!(stats.tokens.absolute_majority, 5);
    }

    #[test]
    fn test_empty_corpus_percentages_are_zero() {
        let stats = ConsensusStats::from_records(std::iter::empty());
        assert_eq!(stats.lines.percent(stats.lines.parity), 0.0);
        assert!(stats.to_string().contains("0 in total"));
    }
}
