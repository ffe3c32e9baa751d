//! Natural sort order: embedded digit runs compare by numeric value, text runs
//! compare case-insensitively.

use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Ordering;

static DIGIT_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]+").unwrap());

/// A run of ASCII digits, stored without leading zeros so that values of any
/// length compare without overflow.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Digits(String);

impl Digits {
    fn parse(run: &str) -> Self {
        let trimmed = run.trim_start_matches('0');
        Self(trimmed.to_string())
    }
}

impl Ord for Digits {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for Digits {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Run {
    Text(String),
    Number(Digits),
}

/// Comparable key for a name.
///
/// The key always alternates text, number, text, ... starting with a
/// (possibly empty) text run, so runs at the same position have the same
/// type. A key that is a strict prefix of another sorts first.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct NaturalKey(Vec<Run>);

impl NaturalKey {
    pub fn new(name: &str) -> Self {
        let lowered = name.to_lowercase();
        let mut runs = Vec::new();
        let mut last = 0;

        for m in DIGIT_RUN.find_iter(&lowered) {
            runs.push(Run::Text(lowered[last..m.start()].to_string()));
            runs.push(Run::Number(Digits::parse(m.as_str())));
            last = m.end();
        }
        runs.push(Run::Text(lowered[last..].to_string()));

        Self(runs)
    }
}

/// Compare two names in natural order
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    NaturalKey::new(a).cmp(&NaturalKey::new(b))
}

/// Stable natural sort of `items` by the name returned from `name`
pub fn sort_natural<T, F>(items: &mut [T], name: F)
where
    F: Fn(&T) -> &str,
{
    items.sort_by_cached_key(|item| NaturalKey::new(name(item)));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(names: &[&str]) -> Vec<String> {
        let mut v: Vec<String> = names.iter().map(|s| s.to_string()).collect();
        sort_natural(&mut v, |s| s.as_str());
        v
    }

    #[test]
    fn test_numbers_compare_by_value() {
        assert_eq!(natural_cmp("file2.mp3", "file10.mp3"), Ordering::Less);
        assert_eq!(natural_cmp("Track 10", "Track 9"), Ordering::Greater);
        assert_eq!(
            sorted(&["Track 10.mp3", "Track 2.mp3", "Track 1.mp3"]),
            vec!["Track 1.mp3", "Track 2.mp3", "Track 10.mp3"]
        );
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(natural_cmp("B", "b"), Ordering::Equal);
        assert_eq!(natural_cmp("apple", "Banana"), Ordering::Less);
    }

    #[test]
    fn test_stable_for_equal_keys() {
        assert_eq!(sorted(&["b", "B", "a"]), vec!["a", "b", "B"]);
        assert_eq!(sorted(&["B", "b", "a"]), vec!["a", "B", "b"]);
        assert_eq!(sorted(&["x01", "x1"]), vec!["x01", "x1"]);
        assert_eq!(sorted(&["x1", "x01"]), vec!["x1", "x01"]);
    }

    #[test]
    fn test_leading_zeros_ignored() {
        assert_eq!(natural_cmp("007", "7"), Ordering::Equal);
        assert_eq!(natural_cmp("010", "9"), Ordering::Greater);
    }

    #[test]
    fn test_prefix_sorts_first() {
        assert_eq!(natural_cmp("track", "track 1"), Ordering::Less);
        assert_eq!(natural_cmp("a", "a1"), Ordering::Less);
    }

    #[test]
    fn test_leading_digits_before_letters() {
        assert_eq!(
            sorted(&["Rock", "10 Jazz", "2 Blues"]),
            vec!["2 Blues", "10 Jazz", "Rock"]
        );
    }

    #[test]
    fn test_huge_numbers_do_not_overflow() {
        let big = "99999999999999999999999999999999";
        let bigger = "100000000000000000000000000000000";
        assert_eq!(natural_cmp(big, bigger), Ordering::Less);
    }

    #[test]
    fn test_folder_names() {
        assert_eq!(
            sorted(&["Rock", "Jazz", "Classical"]),
            vec!["Classical", "Jazz", "Rock"]
        );
    }
}
