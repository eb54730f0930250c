//! Deterministic name de-duplication
//!
//! Used whenever a child is added to an object so that two properties never
//! share a name under the tree's [`NameComparison`] policy.

use crate::config::NameComparison;
use std::collections::HashSet;

/// Return `base` if it is free, otherwise the first free `"base N"` (N = 1, 2, ...)
///
/// # Examples
///
/// ```rust
/// use valuespace_core::config::NameComparison;
/// use valuespace_core::utils::unique_name;
///
/// let taken = ["Default", "Default 1"];
/// assert_eq!(unique_name("Default", taken, NameComparison::CaseSensitive), "Default 2");
/// assert_eq!(unique_name("Other", taken, NameComparison::CaseSensitive), "Other");
/// ```
pub fn unique_name<'a, I>(base: &str, existing: I, comparison: NameComparison) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let taken: HashSet<String> = existing
        .into_iter()
        .map(|name| comparison.normalize(name).into_owned())
        .collect();

    if !taken.contains(&*comparison.normalize(base)) {
        return base.to_string();
    }

    (1usize..)
        .map(|suffix| format!("{} {}", base, suffix))
        .find(|candidate| !taken.contains(&*comparison.normalize(candidate)))
        .unwrap_or_else(|| base.to_string())
}
