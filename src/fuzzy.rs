//! Fuzzy string matching for launcher candidates
//!
//! Produces a relevance score in `[0.0, 1.0]` from a query and a candidate
//! text. Both inputs are expected to be lower-cased by the caller; the
//! matcher itself never allocates a folded copy.
//!
//! Tiers are evaluated in order and the first hit wins:
//!
//! | tier | condition | score |
//! |---|---|---|
//! | exact | `text == query` | `1.0` |
//! | prefix | `text` starts with `query` | `0.9` |
//! | substring | `text` contains `query` | `0.7` |
//! | subsequence | every query char found in order | `<= 0.6` |
//!
//! The subsequence tier is capped so a scattered hit can never outrank a
//! contiguous one.

/// Score for an exact match
pub const EXACT_SCORE: f64 = 1.0;
/// Score for a prefix match
pub const PREFIX_SCORE: f64 = 0.9;
/// Score for a substring match
pub const SUBSTRING_SCORE: f64 = 0.7;
/// Upper bound for subsequence matches
pub const SUBSEQUENCE_CAP: f64 = 0.6;

const MATCH_RATIO_WEIGHT: f64 = 0.4;
const CONSECUTIVE_WEIGHT: f64 = 0.2;

/// Score `text` against `query`.
///
/// An empty query only matches an empty text exactly; against anything else
/// it is a (trivial) prefix, which keeps the result defined and non-negative.
pub fn match_score(query: &str, text: &str) -> f64 {
    if text == query {
        return EXACT_SCORE;
    }
    if text.starts_with(query) {
        return PREFIX_SCORE;
    }
    if text.contains(query) {
        return SUBSTRING_SCORE;
    }
    subsequence_score(query, text)
}

/// Best score of `query` across a list of alias terms.
///
/// Returns `0.0` for an empty term list.
pub fn match_best<S: AsRef<str>>(query: &str, terms: &[S]) -> f64 {
    terms
        .iter()
        .map(|term| match_score(query, term.as_ref()))
        .fold(0.0, f64::max)
}

/// Greedy left-to-right subsequence walk.
///
/// `matchRatio = matched / len(text)` rewards short texts,
/// `consecutive = longest_run / len(query)` rewards tight clusters.
fn subsequence_score(query: &str, text: &str) -> f64 {
    let query_len = query.chars().count();
    let text_len = text.chars().count();
    if query_len == 0 || text_len == 0 || query_len > text_len {
        return 0.0;
    }

    let mut pattern = query.chars().peekable();
    let mut matched = 0usize;
    let mut run = 0usize;
    let mut longest_run = 0usize;

    for ch in text.chars() {
        let Some(&wanted) = pattern.peek() else {
            break;
        };
        if ch == wanted {
            pattern.next();
            matched += 1;
            run += 1;
            longest_run = longest_run.max(run);
        } else {
            run = 0;
        }
    }

    if pattern.peek().is_some() {
        return 0.0;
    }

    let match_ratio = matched as f64 / text_len as f64;
    let consecutive_bonus = longest_run as f64 / query_len as f64;
    (match_ratio * MATCH_RATIO_WEIGHT + consecutive_bonus * CONSECUTIVE_WEIGHT).min(SUBSEQUENCE_CAP)
}

/// Expand a display name into its match terms: the full lower-cased name
/// followed by every suffix that starts at a word boundary.
///
/// `"Google Chrome"` yields `["google chrome", "chrome"]`, so typing the
/// start of any word is treated as a prefix hit.
pub fn word_terms(name: &str) -> Vec<String> {
    let lower = name.to_lowercase();
    let mut terms = vec![lower.clone()];

    let mut prev_is_separator = false;
    for (idx, ch) in lower.char_indices() {
        let is_separator = !ch.is_alphanumeric();
        if idx > 0 && prev_is_separator && !is_separator {
            terms.push(lower[idx..].to_string());
        }
        prev_is_separator = is_separator;
    }

    terms
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match_scores_one() {
        assert_eq!(match_score("safari", "safari"), 1.0);
        assert_eq!(match_score("", ""), 1.0);
    }

    #[test]
    fn test_prefix_match() {
        assert_eq!(match_score("saf", "safari"), PREFIX_SCORE);
    }

    #[test]
    fn test_substring_match() {
        assert_eq!(match_score("chrom", "google chrome"), SUBSTRING_SCORE);
    }

    #[test]
    fn test_empty_query_is_defined_and_non_negative() {
        let score = match_score("", "terminal");
        assert!(score >= 0.0);
        assert!(score <= 1.0);
    }

    #[test]
    fn test_subsequence_match_is_capped() {
        let score = match_score("vsc", "visual studio code");
        assert!(score > 0.0);
        assert!(score <= SUBSEQUENCE_CAP);
    }

    #[test]
    fn test_subsequence_formula() {
        // "ac" in "abc": matched 2/3, longest run 1/2
        let expected = (2.0 / 3.0) * 0.4 + 0.5 * 0.2;
        assert!((match_score("ac", "abc") - expected).abs() < 1e-9);
    }

    #[test]
    fn test_no_match_scores_zero() {
        assert_eq!(match_score("xyz", "safari"), 0.0);
        assert_eq!(match_score("safarix", "safari"), 0.0);
    }

    #[test]
    fn test_out_of_order_chars_do_not_match() {
        assert_eq!(match_score("ba", "ab"), 0.0);
    }

    #[test]
    fn test_prefix_always_beats_subsequence() {
        let texts = ["terminal", "activity monitor", "system settings", "a", "xyz"];
        for text in texts {
            for end in 1..=text.len() {
                let prefix = &text[..end];
                let prefix_score = match_score(prefix, text);
                assert!(prefix_score >= PREFIX_SCORE, "{prefix} vs {text}");
                assert!(prefix_score >= SUBSEQUENCE_CAP);
            }
        }
    }

    #[test]
    fn test_scores_stay_in_unit_range() {
        let samples = [
            ("", "abc"),
            ("a", ""),
            ("abc", "aabbcc"),
            ("zz", "zzzzzzzzzz"),
            ("é", "café"),
            ("cafe", "café"),
            ("q", "q"),
        ];
        for (q, t) in samples {
            let s = match_score(q, t);
            assert!((0.0..=1.0).contains(&s), "{q:?} vs {t:?} = {s}");
        }
    }

    #[test]
    fn test_match_best_takes_maximum() {
        let terms = ["quit", "exit", "terminate"];
        assert_eq!(match_best("exit", &terms), 1.0);
        assert_eq!(match_best("term", &terms), PREFIX_SCORE);
        assert_eq!(match_best("zzz", &terms), 0.0);
    }

    #[test]
    fn test_match_best_empty_terms() {
        let terms: [&str; 0] = [];
        assert_eq!(match_best("a", &terms), 0.0);
    }

    #[test]
    fn test_word_terms_splits_on_boundaries() {
        assert_eq!(
            word_terms("Google Chrome"),
            vec!["google chrome".to_string(), "chrome".to_string()]
        );
        assert_eq!(
            word_terms("Visual Studio Code"),
            vec![
                "visual studio code".to_string(),
                "studio code".to_string(),
                "code".to_string()
            ]
        );
        assert_eq!(word_terms("Safari"), vec!["safari".to_string()]);
    }

    #[test]
    fn test_word_terms_handles_punctuation() {
        let terms = word_terms("App-Store (beta)");
        assert!(terms.contains(&"store (beta)".to_string()));
        assert!(terms.contains(&"beta)".to_string()));
    }
}
