//! Voice phrase specifications and their expansion into literal phrases.

use itertools::Itertools;

use crate::error::RegistrationError;

/// How a voice carrier describes the phrases that trigger a function.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PhraseSpec {
    /// One literal phrase.
    Single(String),
    /// Interchangeable wordings, used as-is.
    Variants(Vec<String>),
    /// One synonym list per word; every combination is a phrase.
    Words(Vec<Vec<String>>),
}

impl PhraseSpec {
    /// Expand into the full list of literal phrases, in product order.
    pub fn expand(&self) -> Result<Vec<String>, RegistrationError> {
        let phrases = match self {
            PhraseSpec::Single(p) => vec![p.clone()],
            PhraseSpec::Variants(ps) => ps.clone(),
            PhraseSpec::Words(words) => {
                if words.iter().any(Vec::is_empty) {
                    return Err(RegistrationError::EmptyPhrase);
                }
                multi_phrase(words)
            }
        };
        if phrases.is_empty() || phrases.iter().all(|p| p.trim().is_empty()) {
            return Err(RegistrationError::EmptyPhrase);
        }
        Ok(phrases)
    }
}

impl From<&str> for PhraseSpec {
    fn from(phrase: &str) -> Self {
        PhraseSpec::Single(phrase.to_string())
    }
}

impl From<Vec<String>> for PhraseSpec {
    fn from(variants: Vec<String>) -> Self {
        PhraseSpec::Variants(variants)
    }
}

impl From<Vec<Vec<String>>> for PhraseSpec {
    fn from(words: Vec<Vec<String>>) -> Self {
        PhraseSpec::Words(words)
    }
}

/// Every way to say a sentence given a synonym list per word.
///
/// `multi_phrase(&[vec!["a", "b"], vec!["c", "d"]])` yields
/// `["a c", "a d", "b c", "b d"]`. No word lists yields a single empty phrase.
pub fn multi_phrase<S: AsRef<str>>(words: &[Vec<S>]) -> Vec<String> {
    if words.is_empty() {
        return vec![String::new()];
    }
    words
        .iter()
        .map(|synonyms| {
            synonyms
                .iter()
                .map(|s| s.as_ref().to_owned())
                .collect::<Vec<String>>()
        })
        .multi_cartesian_product()
        .map(|combo| combo.join(" "))
        .collect()
}
