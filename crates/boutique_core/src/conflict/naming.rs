//! Load-order predictions from file names.
//!
//! The patcher loads rule files alphabetically and the last file wins, so a
//! file resolves its conflicts when its name sorts after every conflicting
//! one.

use std::cmp::Ordering;

const LOAD_LAST_PREFIX: char = 'Z';

/// ASCII case-insensitive order, ties broken by ordinal comparison.
pub fn load_order_cmp(a: &str, b: &str) -> Ordering {
    let folded = |s: &str| s.bytes().map(|b| b.to_ascii_lowercase()).collect::<Vec<_>>();
    folded(a).cmp(&folded(b)).then_with(|| a.cmp(b))
}

/// File name without any directory prefix.
pub fn base_name(path: &str) -> &str {
    path.rfind(['/', '\\'])
        .map_or(path, |index| &path[index + 1..])
}

/// Whether `candidate` sorts strictly after every name in `others`.
pub fn sorts_last<S: AsRef<str>>(candidate: &str, others: &[S]) -> bool {
    let candidate = base_name(candidate);
    others
        .iter()
        .all(|other| load_order_cmp(candidate, base_name(other.as_ref())) == Ordering::Greater)
}

/// Prefixes the candidate's base name with `Z` until it sorts after all of
/// `others`, keeping any directory part. Returns `None` when no number of
/// prefixes can win, e.g. against names that start with `{` or `~`.
pub fn suggest_file_name<S: AsRef<str>>(candidate: &str, others: &[S]) -> Option<String> {
    let base = base_name(candidate);
    let directory = &candidate[..candidate.len() - base.len()];
    let limit = others
        .iter()
        .map(|other| base_name(other.as_ref()).len())
        .max()
        .unwrap_or(0)
        + 2;

    let mut name = base.to_string();
    for _ in 0..limit {
        name.insert(0, LOAD_LAST_PREFIX);
        if sorts_last(&name, others) {
            return Some(format!("{directory}{name}"));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::{base_name, load_order_cmp, sorts_last, suggest_file_name};
    use std::cmp::Ordering;

    #[test]
    fn compares_case_insensitively_then_ordinally() {
        assert_eq!(load_order_cmp("apple.ini", "Banana.ini"), Ordering::Less);
        assert_eq!(load_order_cmp("ABC.ini", "abc.ini"), Ordering::Less);
        assert!(sorts_last("Boutique_Distribution.ini", &["Aardvark_DISTR.ini"]));
    }

    #[test]
    fn suggestion_keeps_the_directory() {
        assert_eq!(base_name(r"Data\SKSE\Rules_DISTR.ini"), "Rules_DISTR.ini");
        assert_eq!(
            suggest_file_name("Data/Rules_DISTR.ini", &["Zebra_DISTR.ini"]).as_deref(),
            Some("Data/ZRules_DISTR.ini")
        );
    }

    #[test]
    fn no_suggestion_when_nothing_can_sort_last() {
        assert_eq!(suggest_file_name("Rules.ini", &["{first}.ini"]), None);
    }
}
