// src/matcher.rs
// Stage 2: scores curated entries against the normalized query.
// Pure: no logging, no store access. The resolver owns both.

use std::fmt;
use std::str::FromStr;

use crate::curated::CuratedEntry;

/// Minimum keyword hits for `MatchPolicy::BestScore`.
pub const BEST_SCORE_MINIMUM: usize = 1;

/// Fraction of keywords that must appear for `MatchPolicy::ThresholdFraction`.
pub const THRESHOLD_FRACTION: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchPolicy {
    /// Every keyword must appear; first qualifying entry wins.
    StrictAll,
    /// At least half of the keywords must appear; first qualifying entry wins.
    #[default]
    ThresholdFraction,
    /// Highest keyword count across all entries, earliest entry on ties.
    BestScore,
}

impl FromStr for MatchPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "strict" | "strict-all" | "strict_all" => Ok(MatchPolicy::StrictAll),
            "threshold" | "threshold-fraction" | "threshold_fraction" => {
                Ok(MatchPolicy::ThresholdFraction)
            }
            "best" | "best-score" | "best_score" => Ok(MatchPolicy::BestScore),
            other => Err(format!("unknown match policy '{}'", other)),
        }
    }
}

impl fmt::Display for MatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MatchPolicy::StrictAll => "strict-all",
            MatchPolicy::ThresholdFraction => "threshold-fraction",
            MatchPolicy::BestScore => "best-score",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    pub entry: CuratedEntry,
    pub score: usize,
}

/// Keywords that can actually discriminate: blank ones are contained in every query.
fn usable_keywords(entry: &CuratedEntry) -> impl Iterator<Item = &str> {
    entry.keywords.iter().map(|k| k.trim()).filter(|k| !k.is_empty())
}

/// Number of the entry's non-blank keywords contained in `normalized_query`.
pub fn keyword_score(normalized_query: &str, entry: &CuratedEntry) -> usize {
    usable_keywords(entry)
        .filter(|k| normalized_query.contains(k.to_lowercase().as_str()))
        .count()
}

/// Picks the curated entry for a normalized query, if any qualifies.
/// Entries without a non-blank keyword never qualify.
pub fn find_match(
    normalized_query: &str,
    entries: &[CuratedEntry],
    policy: MatchPolicy,
) -> Option<MatchResult> {
    let scored = entries
        .iter()
        .map(|entry| (entry, usable_keywords(entry).count()))
        .filter(|(_, total)| *total > 0)
        .map(|(entry, total)| (entry, keyword_score(normalized_query, entry), total));

    match policy {
        MatchPolicy::StrictAll => scored
            .filter(|(_, score, total)| score == total)
            .map(to_result)
            .next(),
        MatchPolicy::ThresholdFraction => scored
            .filter(|(_, score, total)| *score as f64 / *total as f64 >= THRESHOLD_FRACTION)
            .map(to_result)
            .next(),
        MatchPolicy::BestScore => {
            let mut best: Option<(&CuratedEntry, usize, usize)> = None;
            for (entry, score, total) in scored {
                if score < BEST_SCORE_MINIMUM {
                    continue;
                }
                // strictly greater keeps the earliest entry on ties
                if best.map_or(true, |(_, top, _)| score > top) {
                    best = Some((entry, score, total));
                }
            }
            best.map(to_result)
        }
    }
}

fn to_result((entry, score, _): (&CuratedEntry, usize, usize)) -> MatchResult {
    MatchResult {
        entry: entry.clone(),
        score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curated::seed_entries;

    fn dmv() -> CuratedEntry {
        CuratedEntry::new(
            &["dmv", "license", "renew", "california"],
            "Renew your California driver's license through the DMV portal.",
            "https://www.dmv.ca.gov/",
        )
    }

    #[test]
    fn strict_all_requires_every_keyword() {
        let entries = vec![dmv()];
        let hit = find_match(
            "i need to renew my california driver's license at the dmv",
            &entries,
            MatchPolicy::StrictAll,
        );
        assert_eq!(hit.map(|m| m.score), Some(4));

        let miss = find_match("i need a fishing license", &entries, MatchPolicy::StrictAll);
        assert!(miss.is_none());
    }

    #[test]
    fn threshold_fraction_accepts_half() {
        let entries = vec![dmv()];

        // "license" + "renew" = 2/4
        let half = find_match("renew my license", &entries, MatchPolicy::ThresholdFraction);
        assert_eq!(half.map(|m| m.score), Some(2));

        // "license" only = 1/4
        let quarter = find_match("fishing license", &entries, MatchPolicy::ThresholdFraction);
        assert!(quarter.is_none());
    }

    #[test]
    fn threshold_fraction_takes_first_qualifying_entry() {
        let first = CuratedEntry::new(&["license", "boat"], "Boat licence.", "https://a.gov/");
        let second = CuratedEntry::new(&["license"], "Any licence.", "https://b.gov/");
        let hit = find_match(
            "renew license",
            &[first, second],
            MatchPolicy::ThresholdFraction,
        )
        .unwrap();
        assert_eq!(hit.entry.link, "https://a.gov/");
    }

    #[test]
    fn best_score_prefers_highest_then_earliest() {
        let a = CuratedEntry::new(&["license"], "A", "https://a.gov/");
        let b = CuratedEntry::new(&["license", "hunting"], "B", "https://b.gov/");
        let c = CuratedEntry::new(&["hunting", "license", "moose"], "C", "https://c.gov/");

        let hit = find_match(
            "hunting license",
            &[a.clone(), b.clone(), c.clone()],
            MatchPolicy::BestScore,
        )
        .unwrap();
        assert_eq!(hit.entry, b);
        assert_eq!(hit.score, 2);

        let none = find_match("unemployment benefits", &[a, b, c], MatchPolicy::BestScore);
        assert!(none.is_none());
    }

    #[test]
    fn keywords_compare_case_insensitively() {
        let entry = CuratedEntry::new(&["Miami", "TICKET"], "Pay it.", "https://miami.gov/");
        let hit = find_match("miami ticket", &[entry], MatchPolicy::StrictAll);
        assert!(hit.is_some());
    }

    #[test]
    fn empty_collection_never_matches() {
        for policy in [
            MatchPolicy::StrictAll,
            MatchPolicy::ThresholdFraction,
            MatchPolicy::BestScore,
        ] {
            assert!(find_match("pay my miami traffic ticket", &[], policy).is_none());
        }
    }

    #[test]
    fn entries_without_keywords_never_match() {
        let blank = CuratedEntry::new(&[], "Nothing.", "https://blank.gov/");
        for policy in [
            MatchPolicy::StrictAll,
            MatchPolicy::ThresholdFraction,
            MatchPolicy::BestScore,
        ] {
            assert!(find_match("anything", &[blank.clone()], policy).is_none());
        }
    }

    #[test]
    fn blank_keywords_never_match_unrelated_queries() {
        let blank = CuratedEntry::new(&[""], "Anything.", "https://blank.example/");
        let padded = CuratedEntry::new(&["", "  ", "x-ray"], "Padded.", "https://padded.example/");
        for policy in [
            MatchPolicy::StrictAll,
            MatchPolicy::ThresholdFraction,
            MatchPolicy::BestScore,
        ] {
            let hit = find_match("renew my passport", &[blank.clone(), padded.clone()], policy);
            assert!(hit.is_none(), "{} matched on blank keywords", policy);
        }
        assert_eq!(keyword_score("renew my passport", &padded), 0);
    }

    #[test]
    fn blank_keywords_do_not_dilute_the_threshold() {
        let entry = CuratedEntry::new(&["", "passport", "renew"], "Renew.", "https://travel.state.gov/");
        let hit = find_match("renew my passport", &[entry], MatchPolicy::StrictAll).unwrap();
        assert_eq!(hit.score, 2);
    }

    #[test]
    fn matching_is_deterministic() {
        let entries = seed_entries();
        let query = "pay my miami traffic ticket";
        for policy in [
            MatchPolicy::StrictAll,
            MatchPolicy::ThresholdFraction,
            MatchPolicy::BestScore,
        ] {
            let first = find_match(query, &entries, policy);
            for _ in 0..5 {
                assert_eq!(find_match(query, &entries, policy), first);
            }
        }
    }

    #[test]
    fn parses_policy_names() {
        assert_eq!("strict".parse::<MatchPolicy>(), Ok(MatchPolicy::StrictAll));
        assert_eq!("Threshold".parse::<MatchPolicy>(), Ok(MatchPolicy::ThresholdFraction));
        assert_eq!("best-score".parse::<MatchPolicy>(), Ok(MatchPolicy::BestScore));
        assert!("semantic".parse::<MatchPolicy>().is_err());
    }
}
