//! Vocabulary tables for direction cues, units, qualitative markers and
//! spoken numbers
//!
//! The tables are data, not code: [`Lexicon::default`] carries the built-in
//! vocabulary and a YAML [`LexiconExtension`] can append entries. A lexicon is
//! compiled once into a [`LexiconMatcher`] which the rule interpreter uses to
//! split utterances into clauses and scan them for cues.

use crate::{Axis, InterpretError, Result, Sign, UnitToken};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Words that, right after a bare number, mean "in" is a preposition
const PREPOSITION_FOLLOWERS: [&str; 10] = [
    "the", "a", "x", "y", "z", "positive", "negative", "direction", "that", "this",
];

/// A directional phrase family
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectionCue {
    /// Plain wording, shown to language models
    pub phrase: String,
    /// Regex matched against the lower-cased clause; defaults to the phrase
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    pub axis: Axis,
    pub sign: Sign,
    /// Names the axis only ("along the z axis"); a direction word elsewhere in
    /// the clause decides the sign
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub axis_only: bool,
}

/// A qualitative small-motion phrase ("a little", "slightly")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerCue {
    pub phrase: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitAlias {
    pub alias: String,
    pub unit: UnitToken,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumberWord {
    pub word: String,
    pub value: f64,
}

/// Complete vocabulary used to read utterances
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lexicon {
    pub directions: Vec<DirectionCue>,
    pub qualitative_markers: Vec<MarkerCue>,
    pub units: Vec<UnitAlias>,
    pub number_words: Vec<NumberWord>,
    /// Words or punctuation that end one clause and start the next
    pub clause_separators: Vec<String>,
}

/// Entries appended to a lexicon; every table is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LexiconExtension {
    #[serde(default)]
    pub directions: Vec<DirectionCue>,
    #[serde(default)]
    pub qualitative_markers: Vec<MarkerCue>,
    #[serde(default)]
    pub units: Vec<UnitAlias>,
    #[serde(default)]
    pub number_words: Vec<NumberWord>,
    #[serde(default)]
    pub clause_separators: Vec<String>,
}

fn cue(phrase: &str, pattern: Option<&str>, axis: Axis, sign: Sign) -> DirectionCue {
    DirectionCue {
        phrase: phrase.to_string(),
        pattern: pattern.map(str::to_string),
        axis,
        sign,
        axis_only: false,
    }
}

fn marker(phrase: &str, pattern: Option<&str>) -> MarkerCue {
    MarkerCue {
        phrase: phrase.to_string(),
        pattern: pattern.map(str::to_string),
    }
}

/// Axis-named phrases shared by all three axes
fn axis_cues(axis: Axis) -> Vec<DirectionCue> {
    let a = axis.label();
    let named = |phrase: String, pattern: String, sign: Sign| DirectionCue {
        phrase,
        pattern: Some(pattern),
        axis,
        sign,
        axis_only: false,
    };
    let bare = |phrase: String, pattern: String| DirectionCue {
        axis_only: true,
        ..named(phrase, pattern, Sign::Positive)
    };
    vec![
        named(
            format!("positive {a}-axis"),
            format!(r"positive\s+{a}(?:[\s-]*(?:axis|direction))?"),
            Sign::Positive,
        ),
        bare(
            format!("along {a}-axis"),
            format!(r"along\s+(?:the\s+)?{a}(?:[\s-]*(?:axis|direction))?"),
        ),
        bare(
            format!("in {a} direction"),
            format!(r"in\s+(?:the\s+)?{a}[\s-]*direction"),
        ),
        bare(format!("{a}-axis"), format!(r"{a}[\s-]*axis")),
        named(
            format!("negative {a}-axis"),
            format!(r"negative\s+{a}(?:[\s-]*(?:axis|direction))?"),
            Sign::Negative,
        ),
    ]
}

impl Default for Lexicon {
    fn default() -> Self {
        use Axis::{X, Y, Z};
        use Sign::{Negative, Positive};

        let mut directions = vec![
            cue("right", Some(r"right(?:wards?)?"), X, Positive),
            cue("left", Some(r"left(?:wards?)?"), X, Negative),
            cue("back", Some(r"back(?:wards?)?"), Y, Positive),
            cue("away", None, Y, Positive),
            cue("farther", Some(r"f[au]rther"), Y, Positive),
            cue("forward", Some(r"forwards?"), Y, Negative),
            cue("approach", Some(r"approach(?:es|ing)?"), Y, Negative),
            cue("closer", Some(r"closer|nearer"), Y, Negative),
            cue("toward me", Some(r"towards?\s+me"), Y, Negative),
            cue("up", Some(r"up(?:wards?)?"), Z, Positive),
            cue("raise", Some(r"rais(?:e|es|ing)"), Z, Positive),
            cue("ascend", Some(r"ascend(?:s|ing)?"), Z, Positive),
            cue("lift", Some(r"lift(?:s|ing)?"), Z, Positive),
            cue("higher", None, Z, Positive),
            cue(
                "increase height",
                Some(r"increase\s+(?:the\s+)?height"),
                Z,
                Positive,
            ),
            cue("down", Some(r"down(?:wards?)?"), Z, Negative),
            cue("lower", Some(r"lower(?:s|ing)?"), Z, Negative),
            cue("descend", Some(r"descend(?:s|ing)?"), Z, Negative),
            cue("drop", Some(r"drop(?:s|ping)?"), Z, Negative),
            cue(
                "decrease height",
                Some(r"decrease\s+(?:the\s+)?height"),
                Z,
                Negative,
            ),
        ];
        for axis in Axis::ALL {
            directions.extend(axis_cues(axis));
        }

        let qualitative_markers = vec![
            marker("a little bit", Some(r"a\s+little(?:\s+bit)?")),
            marker("a lil bit", Some(r"a\s+lil(?:\s+bit)?")),
            marker("a bit", Some(r"(?:a\s+)?(?:tiny\s+|little\s+|lil\s+)?bit")),
            marker("slightly", None),
            marker("a tad", None),
            marker("a touch", None),
            marker("a smidge", Some(r"a\s+smidg(?:e|en)")),
            marker("a hair", None),
        ];

        let unit_table: [(&[&str], UnitToken); 5] = [
            (
                &["mm", "millimeter", "millimeters", "millimetre", "millimetres"],
                UnitToken::Millimeters,
            ),
            (
                &["cm", "cms", "centimeter", "centimeters", "centimetre", "centimetres"],
                UnitToken::Centimeters,
            ),
            (
                &["m", "meter", "meters", "metre", "metres"],
                UnitToken::Meters,
            ),
            (&["in", "inch", "inches", "\""], UnitToken::Inches),
            (&["ft", "foot", "feet", "'"], UnitToken::Feet),
        ];
        let units = unit_table
            .iter()
            .flat_map(|(aliases, unit)| {
                aliases.iter().map(move |alias| UnitAlias {
                    alias: alias.to_string(),
                    unit: *unit,
                })
            })
            .collect();

        let words = [
            ("zero", 0.0),
            ("one", 1.0),
            ("two", 2.0),
            ("three", 3.0),
            ("four", 4.0),
            ("five", 5.0),
            ("six", 6.0),
            ("seven", 7.0),
            ("eight", 8.0),
            ("nine", 9.0),
            ("ten", 10.0),
            ("eleven", 11.0),
            ("twelve", 12.0),
            ("thirteen", 13.0),
            ("fourteen", 14.0),
            ("fifteen", 15.0),
            ("sixteen", 16.0),
            ("seventeen", 17.0),
            ("eighteen", 18.0),
            ("nineteen", 19.0),
            ("twenty", 20.0),
            ("thirty", 30.0),
            ("forty", 40.0),
            ("fifty", 50.0),
            ("sixty", 60.0),
            ("seventy", 70.0),
            ("eighty", 80.0),
            ("ninety", 90.0),
            ("hundred", 100.0),
            ("thousand", 1000.0),
            ("half", 0.5),
        ];
        let number_words = words
            .iter()
            .map(|(word, value)| NumberWord {
                word: word.to_string(),
                value: *value,
            })
            .collect();

        let clause_separators = [",", ";", "and", "then", "also", "plus"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        Self {
            directions,
            qualitative_markers,
            units,
            number_words,
            clause_separators,
        }
    }
}

impl Lexicon {
    /// Append the entries of an extension
    pub fn extend(&mut self, extension: LexiconExtension) {
        self.directions.extend(extension.directions);
        self.qualitative_markers
            .extend(extension.qualitative_markers);
        self.units.extend(extension.units);
        self.number_words.extend(extension.number_words);
        self.clause_separators.extend(extension.clause_separators);
    }

    /// Built-in vocabulary plus the extension stored at `path`
    pub fn with_extension_file(path: impl AsRef<Path>) -> Result<Self> {
        let mut lexicon = Self::default();
        lexicon.extend(LexiconExtension::load(path)?);
        Ok(lexicon)
    }

    /// Plain phrases for one axis and sign, in table order
    pub fn phrases(&self, axis: Axis, sign: Sign) -> Vec<&str> {
        self.directions
            .iter()
            .filter(|c| c.axis == axis && c.sign == sign)
            .map(|c| c.phrase.as_str())
            .collect()
    }

    pub fn marker_phrases(&self) -> Vec<&str> {
        self.qualitative_markers
            .iter()
            .map(|m| m.phrase.as_str())
            .collect()
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| InterpretError::LexiconFile(e.to_string()))
    }

    /// Compile every table into regex matchers
    pub fn compile(&self) -> Result<LexiconMatcher> {
        let directions = self
            .directions
            .iter()
            .map(|c| {
                let re = phrase_regex(&c.phrase, c.pattern.as_deref())?;
                let cue = if c.axis_only {
                    Cue::AxisName(c.axis, c.sign)
                } else {
                    Cue::Direction(c.axis, c.sign)
                };
                Ok((re, cue))
            })
            .collect::<Result<Vec<_>>>()?;

        let markers = self
            .qualitative_markers
            .iter()
            .map(|m| phrase_regex(&m.phrase, m.pattern.as_deref()))
            .collect::<Result<Vec<_>>>()?;

        let mut units: Vec<(String, UnitToken)> = self
            .units
            .iter()
            .filter(|u| !u.alias.is_empty())
            .map(|u| (u.alias.to_lowercase(), u.unit))
            .collect();
        // Longest alias first so "mm" wins over "m"
        units.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

        let number_values: HashMap<String, f64> = self
            .number_words
            .iter()
            .map(|n| (n.word.to_lowercase(), n.value))
            .collect();
        let number_words = alternation(
            "number words",
            number_values.keys().map(|w| regex::escape(w)),
            true,
        )?;

        let separators = alternation(
            "clause separators",
            self.clause_separators.iter().map(|s| {
                if s.chars().all(char::is_alphanumeric) {
                    format!(r"\b{}\b", regex::escape(s))
                } else {
                    regex::escape(s)
                }
            }),
            false,
        )?;

        Ok(LexiconMatcher {
            directions,
            markers,
            units,
            number_words,
            number_values,
            digits: compile_regex("digits", r"\d+(?:\.\d+)?|\.\d+")?,
            articles: compile_regex("articles", r"\ban?\b")?,
            fraction_tail: compile_regex("fraction tail", r"^\s+and\s+an?\s+([a-z]+)\b")?,
            digit_groups: compile_regex("digit groups", r"(\d),(\d{3})\b")?,
            separators,
        })
    }
}

impl LexiconExtension {
    /// Load an extension from a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| {
            InterpretError::LexiconFile(format!("reading {}: {}", path.display(), e))
        })?;
        serde_yaml::from_str(&raw).map_err(|e| {
            InterpretError::LexiconFile(format!("parsing {}: {}", path.display(), e))
        })
    }
}

fn compile_regex(name: &str, pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| InterpretError::Lexicon {
        phrase: name.to_string(),
        reason: e.to_string(),
    })
}

fn phrase_regex(phrase: &str, pattern: Option<&str>) -> Result<Regex> {
    let body = match pattern {
        Some(p) => p.to_string(),
        None => phrase
            .split_whitespace()
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(r"\s+"),
    };
    if body.is_empty() {
        return Err(InterpretError::Lexicon {
            phrase: phrase.to_string(),
            reason: "empty pattern".to_string(),
        });
    }
    compile_regex(phrase, &format!(r"(?i)\b(?:{})\b", body))
}

/// `(?i)(?:a|b|c)` with the longest alternatives first
fn alternation(name: &str, parts: impl Iterator<Item = String>, bounded: bool) -> Result<Regex> {
    let mut parts: Vec<String> = parts.collect();
    if parts.is_empty() {
        // Matches nothing
        return compile_regex(name, r"[^\s\S]");
    }
    parts.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    let body = parts.join("|");
    if bounded {
        compile_regex(name, &format!(r"(?i)\b(?:{})\b", body))
    } else {
        compile_regex(name, &format!(r"(?i)(?:{})", body))
    }
}

/// A cue found in a clause
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cue {
    Direction(Axis, Sign),
    /// An axis named without a direction word, with its default sign
    AxisName(Axis, Sign),
    Marker,
    Magnitude { value: f64, unit: UnitToken },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CueMatch {
    pub start: usize,
    pub end: usize,
    pub cue: Cue,
}

/// Compiled form of a [`Lexicon`]
#[derive(Debug, Clone)]
pub struct LexiconMatcher {
    directions: Vec<(Regex, Cue)>,
    markers: Vec<Regex>,
    units: Vec<(String, UnitToken)>,
    number_words: Regex,
    number_values: HashMap<String, f64>,
    digits: Regex,
    articles: Regex,
    fraction_tail: Regex,
    digit_groups: Regex,
    separators: Regex,
}

impl LexiconMatcher {
    /// Lower-case the utterance and drop thousands separators ("1,000")
    pub fn normalize(&self, utterance: &str) -> String {
        let lowered = utterance.to_lowercase();
        self.digit_groups.replace_all(&lowered, "$1$2").into_owned()
    }

    /// Split normalized text into non-empty clauses
    ///
    /// An "and" inside a spoken number ("one and a half", "two hundred and
    /// five") does not end the clause.
    pub fn clauses<'t>(&self, text: &'t str) -> Vec<&'t str> {
        let mut clauses = Vec::new();
        let mut start = 0;
        for sep in self.separators.find_iter(text) {
            if sep.as_str().trim() == "and"
                && self.and_joins_number(&text[..sep.start()], &text[sep.end()..])
            {
                continue;
            }
            clauses.push(&text[start..sep.start()]);
            start = sep.end();
        }
        clauses.push(&text[start..]);

        clauses
            .into_iter()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .collect()
    }

    fn and_joins_number(&self, before: &str, after: &str) -> bool {
        let last = before.split_whitespace().next_back().unwrap_or_default();
        let next: Vec<&str> = after.split_whitespace().take(2).collect();
        match next.as_slice() {
            ["a" | "an", word, ..] if is_fraction(self.word_value(word)) => {
                last.parse::<f64>().is_ok() || self.word_value(last) >= 1.0
            }
            [word, ..] => {
                is_multiplier(self.word_value(last)) && (1.0..100.0).contains(&self.word_value(word))
            }
            [] => false,
        }
    }

    /// All cues in a clause, left to right, without overlaps
    ///
    /// Where two candidates overlap the one starting first wins, and among
    /// those starting together the longest wins.
    pub fn scan(&self, clause: &str) -> Vec<CueMatch> {
        let mut found = Vec::new();

        for (re, cue) in &self.directions {
            for m in re.find_iter(clause) {
                found.push(CueMatch {
                    start: m.start(),
                    end: m.end(),
                    cue: *cue,
                });
            }
        }
        for re in &self.markers {
            for m in re.find_iter(clause) {
                found.push(CueMatch {
                    start: m.start(),
                    end: m.end(),
                    cue: Cue::Marker,
                });
            }
        }
        self.scan_magnitudes(clause, &mut found);

        found.sort_by(|a, b| {
            a.start
                .cmp(&b.start)
                .then_with(|| (b.end - b.start).cmp(&(a.end - a.start)))
        });

        let mut kept: Vec<CueMatch> = Vec::with_capacity(found.len());
        for candidate in found {
            if kept.last().map_or(true, |last| candidate.start >= last.end) {
                kept.push(candidate);
            }
        }
        kept
    }

    fn scan_magnitudes(&self, clause: &str, found: &mut Vec<CueMatch>) {
        for m in self.digits.find_iter(clause) {
            let preceded_by_letter = clause[..m.start()]
                .chars()
                .next_back()
                .is_some_and(char::is_alphabetic);
            if preceded_by_letter {
                continue;
            }
            let Ok(mut value) = m.as_str().parse::<f64>() else {
                continue;
            };
            let mut end = m.end();
            // "2 and a half"
            if let Some(tail) = self.fraction_tail.captures(&clause[end..]) {
                let fraction = self.word_value(&tail[1]);
                if is_fraction(fraction) {
                    value += fraction;
                    end += tail[0].len();
                }
            }
            found.push(self.with_unit(clause, m.start(), end, value));
        }

        let words: Vec<regex::Match> = self.number_words.find_iter(clause).collect();
        let mut i = 0;
        while i < words.len() {
            let first = words[i];
            let mut number = SpokenNumber::new(self.word_value(first.as_str()));
            let mut end = first.end();

            while let Some(next) = words.get(i + 1) {
                if !number.join(&clause[end..next.start()], self.word_value(next.as_str())) {
                    break;
                }
                end = next.end();
                i += 1;
            }

            found.push(self.with_unit(clause, first.start(), end, number.value()));
            i += 1;
        }

        // "an inch", "a foot": the article is the number
        for m in self.articles.find_iter(clause) {
            let rest = &clause[m.end()..];
            let Some((len, unit)) = self.unit_at(rest) else {
                continue;
            };
            let alias = rest[..len].trim_start_matches(|c: char| c.is_whitespace() || c == '-');
            if alias == "in" || !alias.chars().all(char::is_alphabetic) {
                continue;
            }
            found.push(CueMatch {
                start: m.start(),
                end: m.end() + len,
                cue: Cue::Magnitude { value: 1.0, unit },
            });
        }
    }

    fn word_value(&self, word: &str) -> f64 {
        self.number_values
            .get(&word.to_lowercase())
            .copied()
            .unwrap_or(0.0)
    }

    /// Unit alias at the start of `text`, after optional spacing: bytes
    /// consumed and the unit
    fn unit_at(&self, text: &str) -> Option<(usize, UnitToken)> {
        let trimmed = text.trim_start_matches(|c: char| c.is_whitespace() || c == '-');
        let skipped = text.len() - trimmed.len();
        self.units.iter().find_map(|(alias, unit)| {
            let after = trimmed.strip_prefix(alias.as_str())?;
            if after.chars().next().is_some_and(char::is_alphanumeric) {
                return None;
            }
            if alias == "in" && followed_by_phrase_word(after) {
                return None;
            }
            Some((skipped + alias.len(), *unit))
        })
    }

    /// Attach the unit spoken right after a number, if any
    fn with_unit(&self, clause: &str, start: usize, end: usize, value: f64) -> CueMatch {
        let rest = &clause[end..];
        // "half a meter"
        let article = ["a ", "an "]
            .iter()
            .find_map(|a| rest.trim_start().strip_prefix(a))
            .map_or(0, |after| rest.len() - after.len());

        let (end, unit) = self
            .unit_at(&rest[article..])
            .map(|(len, unit)| (end + article + len, unit))
            .unwrap_or((end, UnitToken::Unspecified));

        CueMatch {
            start,
            end,
            cue: Cue::Magnitude { value, unit },
        }
    }
}

/// Words that scale what came before them: "two hundred"
fn is_multiplier(value: f64) -> bool {
    value == 100.0 || value == 1000.0
}

fn is_fraction(value: f64) -> bool {
    value > 0.0 && value < 1.0
}

fn is_tens(value: f64) -> bool {
    (20.0..100.0).contains(&value) && value % 10.0 == 0.0
}

/// Running value of a spoken number: "twenty five", "two hundred and five",
/// "one and a half"
#[derive(Debug, Clone, Copy)]
struct SpokenNumber {
    total: f64,
    group: f64,
    last: f64,
}

impl SpokenNumber {
    fn new(value: f64) -> Self {
        Self {
            total: 0.0,
            group: value,
            last: value,
        }
    }

    fn value(&self) -> f64 {
        self.total + self.group
    }

    /// Fold in the next number word if the words between continue this number
    fn join(&mut self, gap: &str, value: f64) -> bool {
        let between: Vec<&str> = gap
            .split(|c: char| c.is_whitespace() || c == '-')
            .filter(|w| !w.is_empty())
            .collect();
        let done = is_fraction(self.last);

        let joined = match between.as_slice() {
            [] if value == 100.0 && (1.0..100.0).contains(&self.group) && !done => {
                self.group *= 100.0;
                true
            }
            [] if value == 1000.0 && self.value() >= 1.0 && !done => {
                self.total = self.value() * 1000.0;
                self.group = 0.0;
                true
            }
            ["and", "a" | "an"] if is_fraction(value) && !done => {
                self.group += value;
                true
            }
            [] | ["and"] if is_multiplier(self.last) && (1.0..100.0).contains(&value) => {
                self.group += value;
                true
            }
            [] if is_tens(self.last) && (1.0..10.0).contains(&value) => {
                self.group += value;
                true
            }
            _ => false,
        };
        if joined {
            self.last = value;
        }
        joined
    }
}

fn followed_by_phrase_word(after: &str) -> bool {
    after
        .split(|c: char| !c.is_alphanumeric())
        .find(|w| !w.is_empty())
        .is_some_and(|w| PREPOSITION_FOLLOWERS.contains(&w))
}
