//! VM option compaction: last-wins dedup by equivalence key, preserving
//! survivor order. Re-expresses the original source's reverse-iterate /
//! keep-first / reverse algorithm using `indexmap`'s order-preserving set,
//! in the idiom `config/merge.rs` uses for `Entry`-based map bookkeeping.

use indexmap::IndexSet;

/// Prefixes that key on themselves when followed by more content (e.g.
/// `-Xmx512m` keys on `-Xmx`, but a bare `-Xmx` is not eligible and falls
/// through to exact-match dedup). Order doesn't matter; lookup is a linear
/// scan since the list is tiny and the VM recognizes a fixed, small set.
const KEYED_PREFIXES: &[&str] = &[
    "-Xms",
    "-Xmx",
    "-Xss",
    "-Xloggc:",
    "-Xshare:",
    "-Xbootclasspath:",
    "-splash:",
];

/// Compute the equivalence key for a single VM option value.
fn equivalence_key(value: &str) -> &str {
    if let Some(eq_idx) = value.find('=') {
        return &value[..=eq_idx];
    }
    for prefix in KEYED_PREFIXES {
        if value.len() > prefix.len() && value.starts_with(prefix) {
            return prefix;
        }
    }
    value
}

/// Compact `options`, keeping the *last* occurrence of each equivalence
/// class and preserving the relative order of survivors.
pub fn compact(options: &[String]) -> Vec<String> {
    let mut keep_indices = IndexSet::new();
    let mut seen_keys = IndexSet::new();

    // Walk from the end so the first key we see in this direction is the
    // last occurrence in the original order.
    for (rev_idx, value) in options.iter().rev().enumerate() {
        let idx = options.len() - 1 - rev_idx;
        let key = equivalence_key(value);
        if seen_keys.insert(key.to_string()) {
            keep_indices.insert(idx);
        }
    }

    options
        .iter()
        .enumerate()
        .filter(|(idx, _)| keep_indices.contains(idx))
        .map(|(_, value)| value.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn v(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[rstest]
    #[case(&["-Xmx512m"], "-Xmx")]
    #[case(&["-Xms64m"], "-Xms")]
    #[case(&["-Xshare:auto"], "-Xshare:")]
    #[case(&["-Dfoo=bar"], "-Dfoo=")]
    #[case(&["-ea"], "-ea")]
    fn test_equivalence_key(#[case] input: &[&str], #[case] expected_key: &str) {
        assert_eq!(equivalence_key(input[0]), expected_key);
    }

    #[test]
    fn test_literal_example_from_spec() {
        let input = v(&["-Xmx512m", "-Xms128m", "-Xmx1g", "-ea"]);
        assert_eq!(compact(&input), v(&["-Xms128m", "-Xmx1g", "-ea"]));
    }

    #[test]
    fn test_equals_key_dedup() {
        let input = v(&["-Dfoo=1", "-Dbar=2", "-Dfoo=3"]);
        assert_eq!(compact(&input), v(&["-Dbar=2", "-Dfoo=3"]));
    }

    #[test]
    fn test_exact_match_dedup_for_bare_prefix() {
        // "-Xmx" alone (no suffix) is not eligible for prefix keying, so it
        // dedups only against another exact "-Xmx".
        let input = v(&["-Xmx", "-Xmx512m", "-Xmx"]);
        assert_eq!(compact(&input), v(&["-Xmx512m", "-Xmx"]));
    }

    #[test]
    fn test_idempotent() {
        let input = v(&["-Xmx512m", "-Xms128m", "-Xmx1g", "-ea"]);
        let once = compact(&input);
        let twice = compact(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_order_preserving_for_survivors() {
        let input = v(&["-ea", "-Dfoo=1", "-esa", "-Dfoo=2"]);
        let result = compact(&input);
        let ea_pos = result.iter().position(|v| v == "-ea").unwrap();
        let esa_pos = result.iter().position(|v| v == "-esa").unwrap();
        assert!(ea_pos < esa_pos);
    }
}
