//! Tagset identifiers, canonical vocabularies and tagset mappings
//!
//! Taggers report tags in their native tagset; the review works in one
//! session tagset. Penn-Treebank output is translated to Universal tags here.

use crate::error::ReviewError;
use std::fmt;
use std::str::FromStr;

/// The 17 Universal Dependencies POS tags
pub const UNIVERSAL_TAGS: [&str; 17] = [
    "ADJ", "ADP", "ADV", "AUX", "CCONJ", "DET", "INTJ", "NOUN", "NUM", "PART", "PRON", "PROPN",
    "PUNCT", "SCONJ", "SYM", "VERB", "X",
];

/// Penn-Treebank tags, with brackets already unified to `(` and `)`
pub const PTB_TAGS: [&str; 45] = [
    "#", "$", "''", "(", ")", ",", ".", ":", "``", "CC", "CD", "DT", "EX", "FW", "IN", "JJ",
    "JJR", "JJS", "LS", "MD", "NN", "NNP", "NNPS", "NNS", "PDT", "POS", "PRP", "PRP$", "RB",
    "RBR", "RBS", "RP", "SYM", "TO", "UH", "VB", "VBD", "VBG", "VBN", "VBP", "VBZ", "WDT", "WP",
    "WP$", "WRB",
];

/// Prefix for tags a mapping does not know
pub const UNKNOWN_TAG_PREFIX: &str = "UNK-- ";

/// Tag vocabulary identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TagsetId {
    /// Universal POS tags (`upos`)
    #[default]
    Universal,
    /// Penn-Treebank tags (`ptb`)
    PennTreebank,
}

impl TagsetId {
    /// Canonical tags offered to the operator for this tagset
    pub fn canonical_tags(self) -> &'static [&'static str] {
        match self {
            TagsetId::Universal => &UNIVERSAL_TAGS,
            TagsetId::PennTreebank => &PTB_TAGS,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TagsetId::Universal => "upos",
            TagsetId::PennTreebank => "ptb",
        }
    }
}

impl fmt::Display for TagsetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TagsetId {
    type Err = ReviewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "upos" | "universal" => Ok(TagsetId::Universal),
            "ptb" | "penn" | "penn-treebank" => Ok(TagsetId::PennTreebank),
            other => Err(ReviewError::UnsupportedTagset(other.to_string())),
        }
    }
}

/// Translate one Penn-Treebank tag to a Universal tag
///
/// Unknown tags come back as `"UNK-- <tag>"` so they stay visible in review.
pub fn ptb_to_upos(tag: &str) -> String {
    let upos = match tag {
        "#" | "$" | "SYM" => "SYM",
        "''" | "``" | "," | "." | ":" | "(" | ")" | "-LRB-" | "-RRB-" | "-LSB-" | "-RSB-"
        | "-LCB-" | "-RCB-" | "HYPH" | "NFP" => "PUNCT",
        "AFX" | "JJ" | "JJR" | "JJS" => "ADJ",
        "CC" => "CCONJ",
        "CD" => "NUM",
        "DT" | "PDT" => "DET",
        "EX" | "PRP" | "PRP$" | "WDT" | "WP" | "WP$" => "PRON",
        "FW" | "LS" | "ADD" | "GW" | "XX" => "X",
        "IN" | "RP" => "ADP",
        "MD" => "AUX",
        "NN" | "NNS" => "NOUN",
        "NNP" | "NNPS" => "PROPN",
        "POS" | "TO" => "PART",
        "RB" | "RBR" | "RBS" | "WRB" => "ADV",
        "UH" => "INTJ",
        "VB" | "VBD" | "VBG" | "VBN" | "VBP" | "VBZ" => "VERB",
        "NIL" => "NIL",
        unknown => return format!("{}{}", UNKNOWN_TAG_PREFIX, unknown),
    };
    upos.to_string()
}

/// Translate a Penn-Treebank tag sequence to Universal tags
pub fn ptb_tags_to_upos(tags: &[String]) -> Vec<String> {
    tags.iter().map(|tag| ptb_to_upos(tag)).collect()
}

/// Replace PTB bracket tokens (`-LRB-`, `-RSB-`, ...) with `(` and `)`
pub fn unify_ptb_tags(tags: Vec<String>) -> Vec<String> {
    tags.into_iter()
        .map(|tag| match tag.as_str() {
            "-LRB-" | "-LSB-" | "-LCB-" => "(".to_string(),
            "-RRB-" | "-RSB-" | "-RCB-" => ")".to_string(),
            _ => tag,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tagset_ids() {
        assert_eq!("upos".parse::<TagsetId>().unwrap(), TagsetId::Universal);
        assert_eq!("Universal".parse::<TagsetId>().unwrap(), TagsetId::Universal);
        assert_eq!("ptb".parse::<TagsetId>().unwrap(), TagsetId::PennTreebank);
    }

    #[test]
    fn test_unknown_tagset_is_unsupported() {
        let err = "brown".parse::<TagsetId>().unwrap_err();
        assert!(matches!(err, ReviewError::UnsupportedTagset(ref name) if name == "brown"));
    }

    #[test]
    fn test_ptb_to_upos() {
        let tags: Vec<String> = ["NN", "VBD", "MD", "IN", "CD", "-LRB-", "XYZ"]
            .iter()
            .map(|t| t.to_string())
            .collect();
        assert_eq!(
            ptb_tags_to_upos(&tags),
            vec!["NOUN", "VERB", "AUX", "ADP", "NUM", "PUNCT", "UNK-- XYZ"]
        );
    }

    #[test]
    fn test_every_canonical_ptb_tag_maps() {
        for tag in PTB_TAGS {
            assert!(
                !ptb_to_upos(tag).starts_with(UNKNOWN_TAG_PREFIX),
                "{} should map",
                tag
            );
        }
    }

    #[test]
    fn test_unify_brackets() {
        let tags = vec!["-LRB-".to_string(), "NN".to_string(), "-RCB-".to_string()];
        assert_eq!(unify_ptb_tags(tags), vec!["(", "NN", ")"]);
    }
}
