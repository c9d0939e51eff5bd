//! Yes/no reading of the operator's answer to a confirmation

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Response {
    Confirmed,
    Rejected,
}

/// Lexical classifier: an answer confirms only if it contains an affirmative
/// phrase and no negation. Silence and anything unknown count as a rejection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseClassifier {
    pub affirmatives: Vec<String>,
    pub negations: Vec<String>,
    /// Affirmative phrases built from negation words ("no problem"); they
    /// are taken out before negations are looked for
    #[serde(default)]
    pub idioms: Vec<String>,
}

impl Default for ResponseClassifier {
    fn default() -> Self {
        let owned = |words: &[&str]| -> Vec<String> {
            words.iter().map(|w| w.to_string()).collect()
        };
        Self {
            affirmatives: owned(&[
                "yes",
                "yeah",
                "yep",
                "sure",
                "correct",
                "ok",
                "okay",
                "affirmative",
                "go ahead",
                "do it",
                "sounds good",
                "confirm",
            ]),
            negations: owned(&["no", "not", "don't", "cancel", "stop", "wrong"]),
            idioms: owned(&["no problem", "no worries", "not a problem", "why not"]),
        }
    }
}

impl ResponseClassifier {
    pub fn classify(&self, answer: &str) -> Response {
        let mut words = tokens(answer);
        if words.is_empty() {
            return Response::Rejected;
        }

        let mut idiom = false;
        for phrase in &self.idioms {
            idiom |= strip_phrase(&mut words, phrase);
        }

        // "doesn't", "isn't"
        let contracted = words.iter().any(|w| w.ends_with("n't"));
        if contracted || self.negations.iter().any(|n| has_phrase(&words, n)) {
            return Response::Rejected;
        }

        if idiom || self.affirmatives.iter().any(|a| has_phrase(&words, a)) {
            Response::Confirmed
        } else {
            Response::Rejected
        }
    }
}

fn tokens(text: &str) -> Vec<String> {
    text.to_lowercase()
        .replace('\u{2019}', "'")
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .map(|w| w.trim_matches('\''))
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

fn has_phrase(words: &[String], phrase: &str) -> bool {
    let wanted = tokens(phrase);
    !wanted.is_empty() && words.windows(wanted.len()).any(|window| window == wanted)
}

/// Remove every occurrence of `phrase`; true if there was one
fn strip_phrase(words: &mut Vec<String>, phrase: &str) -> bool {
    let wanted = tokens(phrase);
    if wanted.is_empty() {
        return false;
    }
    let mut found = false;
    let mut i = 0;
    while i + wanted.len() <= words.len() {
        if words[i..i + wanted.len()] == wanted[..] {
            words.drain(i..i + wanted.len());
            found = true;
        } else {
            i += 1;
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(answer: &str) -> Response {
        ResponseClassifier::default().classify(answer)
    }

    #[test]
    fn affirmatives_confirm() {
        for answer in ["Yes", "yeah!", "OK", "Sounds good to me.", "sure, go ahead", "Yep."] {
            assert_eq!(classify(answer), Response::Confirmed, "{answer}");
        }
    }

    #[test]
    fn negations_win() {
        for answer in [
            "no",
            "yes, no wait",
            "don't do it",
            "Don\u{2019}t",
            "that doesn't sound good",
            "not okay",
            "stop",
            "wrong",
        ] {
            assert_eq!(classify(answer), Response::Rejected, "{answer}");
        }
    }

    #[test]
    fn idioms_with_negation_words_confirm() {
        for answer in ["No problem, go ahead", "no worries", "Why not?", "not a problem at all"] {
            assert_eq!(classify(answer), Response::Confirmed, "{answer}");
        }
        // A real negation next to an idiom still wins
        assert_eq!(classify("no problem, but don't move yet"), Response::Rejected);
        assert_eq!(classify("no, no problem"), Response::Rejected);
    }

    #[test]
    fn silence_and_unknown_reject() {
        assert_eq!(classify(""), Response::Rejected);
        assert_eq!(classify("   "), Response::Rejected);
        assert_eq!(classify("hmm, maybe"), Response::Rejected);
    }

    #[test]
    fn phrases_match_whole_words() {
        // "ok" inside "token", "no" inside "know"
        assert_eq!(classify("token"), Response::Rejected);
        assert_eq!(classify("I know, yes"), Response::Confirmed);
    }
}
