//! The property store: an ordered multimap from property name to an ordered
//! list of string values, with the `hashdot.profile` recursive-include
//! special case.

use derive_more::{Deref, DerefMut};
use indexmap::IndexMap;
use log::trace;
use std::fmt::{self, Display, Formatter};

/// Name of the directive that recursively pulls in another profile. Every
/// assignment to this property is treated as an append, and each appended
/// value triggers a profile load before the store is updated.
pub const PROFILE_KEY: &str = "hashdot.profile";

/// The classpath property, which gets special emission-order treatment (see
/// [crate::launch]) and glob expansion (see [crate::classpath]).
pub const CLASSPATH_KEY: &str = "java.class.path";

/// How a directive assigns its values onto an existing entry.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Assignment {
    /// `=` - replace any existing values
    Replace,
    /// `+=` - append to any existing values
    Append,
}

/// Ordered mapping of property name to ordered value list. Iteration order
/// follows insertion order of the first assignment to each name, matching
/// the teacher's habit of using [IndexMap] everywhere order matters to a
/// human reading config back out.
#[derive(Clone, Debug, Default, Deref, DerefMut, Eq, PartialEq)]
pub struct PropertyStore(IndexMap<String, Vec<String>>);

impl PropertyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a property's value list.
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.0.get(name).map(Vec::as_slice)
    }

    /// Look up a property that is required to have exactly one value.
    pub fn get_scalar(&self, name: &str) -> Option<&str> {
        match self.get(name) {
            Some([single]) => Some(single.as_str()),
            _ => None,
        }
    }

    /// Apply a non-`hashdot.profile` assignment. Callers are responsible for
    /// routing `hashdot.profile` assignments through the profile loader
    /// instead (see [crate::profile::load_profile]).
    pub fn assign(&mut self, name: &str, kind: Assignment, values: Vec<String>) {
        debug_assert_ne!(
            name, PROFILE_KEY,
            "hashdot.profile must go through append_profile_value"
        );
        match kind {
            Assignment::Replace => {
                trace!("Setting {name} = {values:?}");
                self.0.insert(name.to_string(), values);
            }
            Assignment::Append => {
                trace!("Appending {name} += {values:?}");
                self.0.entry(name.to_string()).or_default().extend(values);
            }
        }
    }

    /// Record that `hashdot.profile` was assigned `value`. This only updates
    /// bookkeeping; the caller (the composer) is responsible for actually
    /// loading the named profile before or after calling this, per the order
    /// it wants recursion to observe.
    pub fn append_profile_value(&mut self, value: String) {
        self.0
            .entry(PROFILE_KEY.to_string())
            .or_default()
            .push(value);
    }

    /// Iterate all properties except `java.class.path`, in store order. Used
    /// to format `-D<name>=<values>` system property options; classpath gets
    /// its own emission slot.
    pub fn iter_non_classpath(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0
            .iter()
            .filter(|(name, _)| name.as_str() != CLASSPATH_KEY)
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }
}

impl Display for PropertyStore {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, (name, values)) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{name} = {}", values.join(" "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_then_append() {
        let mut store = PropertyStore::new();
        store.assign("x", Assignment::Replace, vec!["1".into(), "2".into()]);
        store.assign("x", Assignment::Append, vec!["3".into()]);
        assert_eq!(store.get("x"), Some(&["1".to_string(), "2".to_string(), "3".to_string()][..]));
    }

    #[test]
    fn test_append_without_prior_replace_is_replace() {
        let mut store = PropertyStore::new();
        store.assign("x", Assignment::Append, vec!["1".into()]);
        assert_eq!(store.get("x"), Some(&["1".to_string()][..]));
    }

    #[test]
    fn test_later_replace_wins() {
        let mut store = PropertyStore::new();
        store.assign("x", Assignment::Replace, vec!["1".into()]);
        store.assign("x", Assignment::Append, vec!["2".into()]);
        store.assign("x", Assignment::Replace, vec!["3".into()]);
        assert_eq!(store.get("x"), Some(&["3".to_string()][..]));
    }

    #[test]
    fn test_get_scalar_rejects_multi_value() {
        let mut store = PropertyStore::new();
        store.assign("x", Assignment::Replace, vec!["1".into(), "2".into()]);
        assert_eq!(store.get_scalar("x"), None);
    }

    #[test]
    fn test_profile_values_accumulate_in_order() {
        let mut store = PropertyStore::new();
        store.append_profile_value("a".into());
        store.append_profile_value("b".into());
        assert_eq!(
            store.get(PROFILE_KEY),
            Some(&["a".to_string(), "b".to_string()][..])
        );
    }

    #[test]
    fn test_classpath_excluded_from_non_classpath_iter() {
        let mut store = PropertyStore::new();
        store.assign(CLASSPATH_KEY, Assignment::Replace, vec!["a.jar".into()]);
        store.assign("hashdot.main", Assignment::Replace, vec!["Main".into()]);
        let names: Vec<_> = store.iter_non_classpath().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["hashdot.main"]);
    }
}
