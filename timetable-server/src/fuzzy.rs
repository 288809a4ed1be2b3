//! Fuzzy text matching for stop names.
//!
//! Users type stop names from memory, often without diacritics or with a
//! typo. Matching uses Jaro-Winkler similarity, backed by a literal prefix
//! test so that partially typed names still match.

/// Similarity threshold used by interactive search.
pub const DEFAULT_THRESHOLD: f64 = 0.9;

/// Scaling factor applied to the common prefix.
const PREFIX_SCALE: f64 = 0.1;

/// Longest common prefix that earns a bonus.
const MAX_PREFIX: usize = 4;

/// Jaro score above which the prefix bonus applies.
const BOOST_THRESHOLD: f64 = 0.7;

/// Jaro-Winkler similarity of two strings, in `[0, 1]`.
///
/// Comparison is case-sensitive; see [`similarity_ignore_case`]. Empty
/// inputs score 0.
///
/// # Examples
///
/// ```
/// use timetable_server::fuzzy::similarity;
///
/// assert_eq!(similarity("rynek", "rynek"), 1.0);
/// assert_eq!(similarity("", "rynek"), 0.0);
/// assert!((similarity("martha", "marhta") - 0.9611).abs() < 1e-3);
/// ```
pub fn similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 1.0;
    }

    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let radius = (a.len().max(b.len()) / 2).saturating_sub(1);
    let mut a_matched = vec![false; a.len()];
    let mut b_matched = vec![false; b.len()];
    let mut matches = 0usize;

    for (i, ca) in a.iter().enumerate() {
        let low = i.saturating_sub(radius);
        let high = (i + radius + 1).min(b.len());
        for j in low..high {
            if !b_matched[j] && b[j] == *ca {
                a_matched[i] = true;
                b_matched[j] = true;
                matches += 1;
                break;
            }
        }
    }

    if matches == 0 {
        return 0.0;
    }

    let a_seq = a.iter().zip(&a_matched).filter(|(_, m)| **m).map(|(c, _)| c);
    let b_seq = b.iter().zip(&b_matched).filter(|(_, m)| **m).map(|(c, _)| c);
    let half_transpositions = a_seq.zip(b_seq).filter(|(x, y)| x != y).count();

    let m = matches as f64;
    let t = half_transpositions as f64 / 2.0;
    let jaro = (m / a.len() as f64 + m / b.len() as f64 + (m - t) / m) / 3.0;

    if jaro <= BOOST_THRESHOLD {
        return jaro;
    }

    let prefix = a
        .iter()
        .zip(&b)
        .take(MAX_PREFIX)
        .take_while(|(x, y)| x == y)
        .count();

    jaro + prefix as f64 * PREFIX_SCALE * (1.0 - jaro)
}

/// [`similarity`] after folding both strings to lower case.
pub fn similarity_ignore_case(a: &str, b: &str) -> f64 {
    similarity(&a.to_lowercase(), &b.to_lowercase())
}

/// Whether two strings are at least `threshold` similar, ignoring case.
pub fn equality(a: &str, b: &str, threshold: f64) -> bool {
    similarity_ignore_case(a, b) >= threshold
}

/// Whether a candidate name satisfies a typed query.
///
/// Either a close fuzzy match or a case-insensitive prefix qualifies.
pub fn matches_query(name: &str, query: &str, threshold: f64) -> bool {
    equality(name, query, threshold) || name.to_lowercase().starts_with(&query.to_lowercase())
}
