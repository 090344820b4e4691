//! Tagger collaborator seam
//!
//! Real taggers live outside this crate. They implement [`Tagger`] and
//! [`run_taggers`] collects their output for one tokenized line.

use crate::consensus::TaggerOutputs;
use crate::error::{ReviewError, ReviewResult};
use crate::tagset::{ptb_tags_to_upos, unify_ptb_tags, TagsetId};
use rayon::prelude::*;
use tracing::debug;

/// POS tagger producing one tag per token
pub trait Tagger: Send + Sync {
    /// Identifier used as the key in [`TaggerOutputs`]
    fn name(&self) -> &str;

    /// Tag `tokens` in `tagset`
    ///
    /// Taggers that cannot produce `tagset` return `UnsupportedTagset`.
    fn tag(&self, tokens: &[String], tagset: TagsetId) -> ReviewResult<Vec<String>>;
}

/// Wraps a tagger that only speaks Penn-Treebank
///
/// Brackets are unified and Universal tags derived through the mapping table.
pub struct PtbAdapter<T> {
    inner: T,
}

impl<T: Tagger> PtbAdapter<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }
}

impl<T: Tagger> Tagger for PtbAdapter<T> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn tag(&self, tokens: &[String], tagset: TagsetId) -> ReviewResult<Vec<String>> {
        let ptb = unify_ptb_tags(self.inner.tag(tokens, TagsetId::PennTreebank)?);
        Ok(match tagset {
            TagsetId::PennTreebank => ptb,
            TagsetId::Universal => ptb_tags_to_upos(&ptb),
        })
    }
}

/// Run every tagger over `tokens`
///
/// Taggers run in parallel; the outputs keep the order of `taggers`. A tagger
/// returning the wrong number of tags fails the whole line.
pub fn run_taggers(
    taggers: &[Box<dyn Tagger>],
    tokens: &[String],
    tagset: TagsetId,
) -> ReviewResult<TaggerOutputs> {
    let runs = taggers
        .par_iter()
        .map(|tagger| {
            let tags = tagger.tag(tokens, tagset)?;
            if tags.len() != tokens.len() {
                return Err(ReviewError::Input(format!(
                    "tagger '{}' returned {} tags for {} tokens",
                    tagger.name(),
                    tags.len(),
                    tokens.len()
                )));
            }
            Ok((tagger.name().to_string(), tags))
        })
        .collect::<ReviewResult<Vec<_>>>()?;

    debug!(taggers = runs.len(), tokens = tokens.len(), %tagset, "Tagged line");
    Ok(runs.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Tags every token with the same tag
    struct Constant {
        name: &'static str,
        tag: &'static str,
    }

    impl Tagger for Constant {
        fn name(&self) -> &str {
            self.name
        }

        fn tag(&self, tokens: &[String], _tagset: TagsetId) -> ReviewResult<Vec<String>> {
            Ok(vec![self.tag.to_string(); tokens.len()])
        }
    }

    /// Drops the last tag
    struct Short;

    impl Tagger for Short {
        fn name(&self) -> &str {
            "short"
        }

        fn tag(&self, tokens: &[String], _tagset: TagsetId) -> ReviewResult<Vec<String>> {
            Ok(vec!["NOUN".to_string(); tokens.len().saturating_sub(1)])
        }
    }

    /// Penn-Treebank only
    struct PtbOnly;

    impl Tagger for PtbOnly {
        fn name(&self) -> &str {
            "ptb_only"
        }

        fn tag(&self, tokens: &[String], tagset: TagsetId) -> ReviewResult<Vec<String>> {
            if tagset != TagsetId::PennTreebank {
                return Err(ReviewError::UnsupportedTagset(tagset.to_string()));
            }
            Ok(tokens
                .iter()
                .map(|t| if t == "(" { "-LRB-" } else { "MD" }.to_string())
                .collect())
        }
    }

    fn tokens(list: &[&str]) -> Vec<String> {
        list.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_run_taggers_keeps_order() {
        let taggers: Vec<Box<dyn Tagger>> = vec![
            Box::new(Constant { name: "b", tag: "NOUN" }),
            Box::new(Constant { name: "a", tag: "VERB" }),
        ];
        let toks = tokens(&["disk", "full"]);
        let outputs = run_taggers(&taggers, &toks, TagsetId::Universal).unwrap();

        let names: Vec<&str> = outputs.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(outputs.token_count().unwrap(), 2);
    }

    #[test]
    fn test_wrong_length_is_input_error() {
        let taggers: Vec<Box<dyn Tagger>> = vec![
            Box::new(Constant { name: "ok", tag: "NOUN" }),
            Box::new(Short),
        ];
        let err = run_taggers(&taggers, &tokens(&["a", "b"]), TagsetId::Universal).unwrap_err();
        assert!(matches!(err, ReviewError::Input(_)));
    }

    #[test]
    fn test_ptb_adapter_maps_to_universal() {
        let taggers: Vec<Box<dyn Tagger>> = vec![Box::new(PtbAdapter::new(PtbOnly))];
        let toks = tokens(&["(", "can"]);

        let upos = run_taggers(&taggers, &toks, TagsetId::Universal).unwrap();
        assert_eq!(upos.get("ptb_only").unwrap(), ["PUNCT", "AUX"]);

        let ptb = run_taggers(&taggers, &toks, TagsetId::PennTreebank).unwrap();
        assert_eq!(ptb.get("ptb_only").unwrap(), ["(", "MD"]);
    }

    #[test]
    fn test_unsupported_tagset_propagates() {
        let taggers: Vec<Box<dyn Tagger>> = vec![Box::new(PtbOnly)];
        let err = run_taggers(&taggers, &tokens(&["x"]), TagsetId::Universal).unwrap_err();
        assert!(matches!(err, ReviewError::UnsupportedTagset(_)));
    }
}
