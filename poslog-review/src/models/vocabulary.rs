//! Closed tag vocabulary offered in the free choice menu

use super::review_item::NO_TAG;
use std::collections::BTreeSet;

/// Sorted, de-duplicated set of legal tags for a session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vocabulary {
    tags: Vec<String>,
}

impl Vocabulary {
    /// Union of the tagset's canonical tags and every observed seed tag
    pub fn build<'a>(
        canonical: &[&str],
        observed: impl IntoIterator<Item = &'a Option<String>>,
    ) -> Self {
        let mut tags: BTreeSet<String> = canonical.iter().map(|t| t.to_string()).collect();
        tags.extend(observed.into_iter().flatten().cloned());
        Self {
            tags: tags.into_iter().collect(),
        }
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.tags.binary_search_by(|t| t.as_str().cmp(tag)).is_ok()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Menu entries: the "no tag" marker, then every tag
    pub fn menu(&self) -> Vec<&str> {
        std::iter::once(NO_TAG)
            .chain(self.tags.iter().map(String::as_str))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tagset::UNIVERSAL_TAGS;

    #[test]
    fn test_vocabulary_merges_observed_tags() {
        let seeds = vec![Some("NOUN".to_string()), None, Some("UNK-- XYZ".to_string())];
        let vocab = Vocabulary::build(&UNIVERSAL_TAGS, &seeds);

        assert_eq!(vocab.len(), UNIVERSAL_TAGS.len() + 1);
        assert!(vocab.contains("UNK-- XYZ"));
        assert!(vocab.contains("NOUN"));
        assert!(!vocab.contains("NIL"));

        let mut sorted = vocab.tags().to_vec();
        sorted.sort();
        assert_eq!(sorted, vocab.tags());
    }

    #[test]
    fn test_menu_starts_with_no_tag() {
        let vocab = Vocabulary::build(&["VERB", "ADJ"], std::iter::empty());
        assert_eq!(vocab.menu(), vec![NO_TAG, "ADJ", "VERB"]);
    }
}
