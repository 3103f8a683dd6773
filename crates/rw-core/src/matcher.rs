//! Criteria matcher: scores one regulatory update against one watch list.
//!
//! The score is a weighted sum of three partial scores, each in `[0, 1]`:
//!
//! ```text
//! keyword   = matched keywords / number of keywords        (1 if none given)
//! authority = 1 if the update's authority is listed        (1 if none given)
//! sector    = |criteria sectors ∩ update sectors| / |criteria sectors|
//!                                                          (1 if none given)
//! total     = round(w_k * keyword + w_a * authority + w_s * sector, precision)
//! ```
//!
//! Matching is pure and holds no shared state, so one `Matcher` can be shared
//! across any number of concurrent callers.

use std::collections::HashSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::entities::{RegulatoryUpdate, WatchCriteria};
use crate::enums::KeywordMode;
use crate::errors::CoreError;

/// Default number of decimal places kept in a score.
pub const DEFAULT_PRECISION: u32 = 4;

/// Highest precision accepted; beyond this `f64` rounding stops being meaningful.
pub const MAX_PRECISION: u32 = 10;

const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

/// Relative weights of the three partial scores. Always sums to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(try_from = "RawWeights")]
pub struct ScoringWeights {
    keywords: f64,
    authority: f64,
    sector: f64,
}

/// Unchecked wire form; deserialization goes through `ScoringWeights::new`.
#[derive(Deserialize, JsonSchema)]
struct RawWeights {
    keywords: f64,
    authority: f64,
    sector: f64,
}

impl TryFrom<RawWeights> for ScoringWeights {
    type Error = CoreError;

    fn try_from(raw: RawWeights) -> Result<Self, Self::Error> {
        Self::new(raw.keywords, raw.authority, raw.sector)
    }
}

impl ScoringWeights {
    /// Build validated weights.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` if a weight is negative or not finite, or
    /// if the weights do not sum to 1.
    pub fn new(keywords: f64, authority: f64, sector: f64) -> Result<Self, CoreError> {
        for (name, w) in [
            ("keywords", keywords),
            ("authority", authority),
            ("sector", sector),
        ] {
            if !w.is_finite() || w < 0.0 {
                return Err(CoreError::validation(format!(
                    "{name} weight must be a non-negative number, got {w}"
                )));
            }
        }
        let sum = keywords + authority + sector;
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(CoreError::validation(format!(
                "scoring weights must sum to 1, got {sum}"
            )));
        }
        Ok(Self {
            keywords,
            authority,
            sector,
        })
    }

    #[must_use]
    pub const fn keywords(&self) -> f64 {
        self.keywords
    }

    #[must_use]
    pub const fn authority(&self) -> f64 {
        self.authority
    }

    #[must_use]
    pub const fn sector(&self) -> f64 {
        self.sector
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            keywords: 0.5,
            authority: 0.25,
            sector: 0.25,
        }
    }
}

/// The partial scores behind a total, for explaining a match.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ScoreBreakdown {
    pub keyword: f64,
    pub authority: f64,
    pub sector: f64,
    pub total: f64,
}

/// Scores updates against watch-list criteria.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matcher {
    weights: ScoringWeights,
    precision: u32,
    keyword_mode: KeywordMode,
}

impl Default for Matcher {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            precision: DEFAULT_PRECISION,
            keyword_mode: KeywordMode::Substring,
        }
    }
}

impl Matcher {
    /// # Errors
    ///
    /// Returns `CoreError::Validation` if `precision` exceeds [`MAX_PRECISION`].
    pub fn new(
        weights: ScoringWeights,
        precision: u32,
        keyword_mode: KeywordMode,
    ) -> Result<Self, CoreError> {
        if precision > MAX_PRECISION {
            return Err(CoreError::validation(format!(
                "score precision must be at most {MAX_PRECISION}, got {precision}"
            )));
        }
        Ok(Self {
            weights,
            precision,
            keyword_mode,
        })
    }

    #[must_use]
    pub const fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    #[must_use]
    pub const fn precision(&self) -> u32 {
        self.precision
    }

    #[must_use]
    pub const fn keyword_mode(&self) -> KeywordMode {
        self.keyword_mode
    }

    /// Weighted relevance of `update` for `criteria`, in `[0, 1]`.
    #[must_use]
    pub fn score(&self, update: &RegulatoryUpdate, criteria: &WatchCriteria) -> f64 {
        self.score_breakdown(update, criteria).total
    }

    /// Whether `update` reaches `threshold` for `criteria`, with the score.
    #[must_use]
    pub fn evaluate(
        &self,
        update: &RegulatoryUpdate,
        criteria: &WatchCriteria,
        threshold: f64,
    ) -> Option<f64> {
        let score = self.score(update, criteria);
        (score >= threshold).then_some(score)
    }

    #[must_use]
    pub fn score_breakdown(
        &self,
        update: &RegulatoryUpdate,
        criteria: &WatchCriteria,
    ) -> ScoreBreakdown {
        let keyword = keyword_score(update, &criteria.keywords, self.keyword_mode);
        let authority = authority_score(&update.authority, &criteria.authorities);
        let sector = sector_score(&update.sectors, &criteria.sectors);

        let raw = self.weights.keywords * keyword
            + self.weights.authority * authority
            + self.weights.sector * sector;

        ScoreBreakdown {
            keyword,
            authority,
            sector,
            total: round_to(raw.clamp(0.0, 1.0), self.precision),
        }
    }
}

fn normalize(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_lowercase())
}

fn normalized_set(values: &[String]) -> HashSet<String> {
    values.iter().filter_map(|v| normalize(v)).collect()
}

#[allow(clippy::cast_precision_loss)]
fn keyword_score(update: &RegulatoryUpdate, keywords: &[String], mode: KeywordMode) -> f64 {
    let wanted = normalized_set(keywords);
    if wanted.is_empty() {
        return 1.0;
    }
    let text = format!("{} {}", update.headline, update.summary).to_lowercase();
    let hits = wanted
        .iter()
        .filter(|kw| match mode {
            KeywordMode::Substring => text.contains(kw.as_str()),
            KeywordMode::WholeWord => contains_whole_word(&text, kw),
        })
        .count();
    (hits as f64 / wanted.len().max(1) as f64).min(1.0)
}

fn contains_whole_word(text: &str, word: &str) -> bool {
    text.match_indices(word).any(|(start, m)| {
        let before = text[..start].chars().next_back();
        let after = text[start + m.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

fn authority_score(authority: &str, authorities: &[String]) -> f64 {
    let wanted = normalized_set(authorities);
    if wanted.is_empty() {
        return 1.0;
    }
    match normalize(authority) {
        Some(a) if wanted.contains(&a) => 1.0,
        _ => 0.0,
    }
}

#[allow(clippy::cast_precision_loss)]
fn sector_score(update_sectors: &[String], sectors: &[String]) -> f64 {
    let wanted = normalized_set(sectors);
    if wanted.is_empty() {
        return 1.0;
    }
    let have = normalized_set(update_sectors);
    let overlap = wanted.intersection(&have).count();
    overlap as f64 / wanted.len() as f64
}

#[allow(clippy::cast_possible_wrap)]
fn round_to(value: f64, precision: u32) -> f64 {
    let factor = 10f64.powi(precision as i32);
    (value * factor).round() / factor
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rstest::rstest;

    fn update(headline: &str, authority: &str, sectors: &[&str]) -> RegulatoryUpdate {
        RegulatoryUpdate {
            id: "upd-1".into(),
            headline: headline.into(),
            summary: String::new(),
            authority: authority.into(),
            sectors: sectors.iter().map(|s| (*s).to_string()).collect(),
            published_at: Utc::now(),
            tags: vec![],
        }
    }

    fn criteria(keywords: &[&str], authorities: &[&str], sectors: &[&str]) -> WatchCriteria {
        let own = |xs: &[&str]| xs.iter().map(|s| (*s).to_string()).collect();
        WatchCriteria {
            keywords: own(keywords),
            authorities: own(authorities),
            sectors: own(sectors),
        }
    }

    #[rstest]
    #[case::empty_criteria_matches_everything(
        update("Anything at all", "SEC", &["Insurance"]),
        criteria(&[], &[], &[]),
        1.0
    )]
    #[case::sanctions_guidance(
        update("FCA sanctions guidance", "FCA", &["Banking"]),
        criteria(&["AML", "sanctions"], &["FCA"], &[]),
        0.75
    )]
    #[case::generic_market_note(
        update("Generic market note", "PRA", &["Banking"]),
        criteria(&["AML", "sanctions"], &["FCA"], &[]),
        0.25
    )]
    #[case::partial_sector_overlap(
        update("Capital rules", "PRA", &["Banking"]),
        criteria(&[], &[], &["Banking", "Insurance"]),
        0.875
    )]
    #[case::disjoint_sectors(
        update("Capital rules", "PRA", &["Payments"]),
        criteria(&[], &[], &["Banking"]),
        0.75
    )]
    #[case::case_insensitive_everything(
        update("new aml RULES", "fca", &["banking"]),
        criteria(&["AML"], &["FCA"], &["Banking"]),
        1.0
    )]
    fn scores(#[case] u: RegulatoryUpdate, #[case] c: WatchCriteria, #[case] expected: f64) {
        assert_eq!(Matcher::default().score(&u, &c), expected);
    }

    #[test]
    fn empty_criteria_scores_one_for_any_update() {
        let matcher = Matcher::default();
        let empty = WatchCriteria::default();
        for u in [
            update("", "", &[]),
            update("Consultation paper", "ESMA", &["Funds", "Markets"]),
            update("x", "y", &["z"]),
        ] {
            assert_eq!(matcher.score(&u, &empty), 1.0);
        }
    }

    #[test]
    fn breakdown_exposes_partials() {
        let b = Matcher::default().score_breakdown(
            &update("FCA sanctions guidance", "FCA", &["Banking"]),
            &criteria(&["AML", "sanctions"], &["FCA"], &[]),
        );
        assert_eq!(b.keyword, 0.5);
        assert_eq!(b.authority, 1.0);
        assert_eq!(b.sector, 1.0);
        assert_eq!(b.total, 0.75);
    }

    #[test]
    fn summary_counts_toward_keywords() {
        let mut u = update("Quarterly bulletin", "FCA", &[]);
        u.summary = "Covers sanctions screening".into();
        let c = criteria(&["sanctions"], &[], &[]);
        assert_eq!(Matcher::default().score(&u, &c), 1.0);
    }

    #[test]
    fn blank_and_duplicate_keywords_are_ignored() {
        let u = update("AML update", "FCA", &[]);
        let c = criteria(&["AML", " ", "aml"], &[], &[]);
        assert_eq!(Matcher::default().score(&u, &c), 1.0);
    }

    #[test]
    fn whole_word_mode_rejects_embedded_matches() {
        let matcher = Matcher::new(ScoringWeights::default(), 4, KeywordMode::WholeWord).unwrap();
        let c = criteria(&["aml"], &[], &[]);
        assert_eq!(matcher.score(&update("Streamlined rules", "X", &[]), &c), 0.5);
        assert_eq!(matcher.score(&update("New AML rules", "X", &[]), &c), 1.0);
        assert_eq!(matcher.score(&update("AML", "X", &[]), &c), 1.0);

        let substring = Matcher::default();
        assert_eq!(substring.score(&update("Streamlined rules", "X", &[]), &c), 1.0);
    }

    #[test]
    fn rounding_is_applied() {
        let matcher = Matcher::new(ScoringWeights::default(), 2, KeywordMode::Substring).unwrap();
        let c = criteria(&["a", "b", "zz"], &[], &[]);
        // keyword = 2/3 -> 0.5 * 0.6667 + 0.5 = 0.8333..
        assert_eq!(matcher.score(&update("a b", "X", &[]), &c), 0.83);
    }

    #[test]
    fn evaluate_applies_threshold() {
        let matcher = Matcher::default();
        let c = criteria(&["AML", "sanctions"], &["FCA"], &[]);
        let hit = update("FCA sanctions guidance", "FCA", &["Banking"]);
        let miss = update("Generic market note", "PRA", &["Banking"]);
        assert_eq!(matcher.evaluate(&hit, &c, 0.6), Some(0.75));
        assert_eq!(matcher.evaluate(&miss, &c, 0.6), None);
        assert_eq!(matcher.evaluate(&hit, &c, 0.75), Some(0.75));
    }

    #[test]
    fn weights_must_sum_to_one() {
        assert!(ScoringWeights::new(0.5, 0.25, 0.25).is_ok());
        assert!(ScoringWeights::new(0.6, 0.3, 0.3).is_err());
        assert!(ScoringWeights::new(1.5, -0.25, -0.25).is_err());
        assert!(ScoringWeights::new(f64::NAN, 0.5, 0.5).is_err());
    }

    #[test]
    fn deserialized_weights_are_validated() {
        let ok: ScoringWeights =
            serde_json::from_str(r#"{"keywords":0.5,"authority":0.25,"sector":0.25}"#).unwrap();
        assert_eq!(ok, ScoringWeights::new(0.5, 0.25, 0.25).unwrap());

        let err = serde_json::from_str::<ScoringWeights>(
            r#"{"keywords":0.9,"authority":0.9,"sector":0.9}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("sum to 1"), "{err}");
        assert!(
            serde_json::from_str::<ScoringWeights>(r#"{"keywords":1.5,"authority":-0.25,"sector":-0.25}"#)
                .is_err()
        );
    }

    #[test]
    fn custom_weights_shift_the_score() {
        let weights = ScoringWeights::new(0.0, 1.0, 0.0).unwrap();
        let matcher = Matcher::new(weights, 4, KeywordMode::Substring).unwrap();
        let c = criteria(&["nothing-matches"], &["FCA"], &["Banking"]);
        assert_eq!(matcher.score(&update("x", "FCA", &[]), &c), 1.0);
    }

    #[test]
    fn precision_is_bounded() {
        assert!(Matcher::new(ScoringWeights::default(), 11, KeywordMode::Substring).is_err());
    }
}
