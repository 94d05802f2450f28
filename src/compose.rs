//! Profile composer: applies the fixed precedence order of layers onto a
//! single [PropertyStore]. Structurally this is a linear pipeline rather
//! than a symmetric merge, but it borrows `config/merge.rs`'s habit of
//! folding one source into a running accumulator one step at a time.

use crate::{
    error::HashdotError,
    profile::{load_profile, load_script_header},
    properties::{Assignment, PropertyStore},
};
use indexmap::IndexSet;
use log::debug;
use std::path::Path;

/// Name of the profile that always loads first.
const DEFAULT_PROFILE: &str = "default";

/// Inputs to composition, gathered from argv/environment before any profile
/// is read.
pub struct ComposeInputs<'a> {
    pub profile_dir: &'a Path,
    pub script_path: &'a Path,
    /// `HASHDOT_PROFILE` environment variable, if set.
    pub env_profile: Option<&'a str>,
    /// Profile implied by the invocation's basename, if it differs from the
    /// canonical `hashdot` binary name.
    pub invocation_profile: Option<&'a str>,
}

/// Run the full precedence pipeline (spec ch.4.2) and return the resulting
/// property store.
pub fn compose(inputs: &ComposeInputs) -> Result<PropertyStore, HashdotError> {
    let mut store = PropertyStore::new();
    let mut stack = IndexSet::new();

    debug!("Composing properties: loading default profile");
    load_profile(inputs.profile_dir, DEFAULT_PROFILE, &mut store, &mut stack)?;

    store.assign(
        "hashdot.script",
        Assignment::Replace,
        vec![script_path_string(inputs.script_path)],
    );

    if let Some(name) = inputs.env_profile {
        debug!("Composing properties: loading HASHDOT_PROFILE profile {name}");
        load_profile(inputs.profile_dir, name, &mut store, &mut stack)?;
    }

    if let Some(name) = inputs.invocation_profile {
        debug!("Composing properties: loading invocation-name profile {name}");
        load_profile(inputs.profile_dir, name, &mut store, &mut stack)?;
    }

    debug!("Composing properties: reading script header {:?}", inputs.script_path);
    load_script_header(inputs.script_path, &mut store, inputs.profile_dir, &mut stack)?;

    store.assign(
        "hashdot.version",
        Assignment::Replace,
        vec![env!("CARGO_PKG_VERSION").to_string()],
    );

    Ok(store)
}

fn script_path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Resolve the invocation-name profile: present only when the process was
/// invoked under a name other than the canonical `hashdot` binary.
pub fn invocation_profile_name(invocation_name: &str) -> Option<&str> {
    if invocation_name == "hashdot" {
        None
    } else {
        Some(invocation_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, contents: &str) {
        std::fs::write(dir.join(name).with_extension("hdp"), contents).unwrap();
    }

    #[test]
    fn test_precedence_order() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "default", "x = default\n");
        write(tmp.path(), "envprof", "x = env\n");
        write(tmp.path(), "byname", "x = invocation\n");

        let script_dir = TempDir::new().unwrap();
        let script_path = script_dir.path().join("script.x");
        std::fs::write(&script_path, "#!/bin/sh\n#. x = header\necho hi\n").unwrap();

        let store = compose(&ComposeInputs {
            profile_dir: tmp.path(),
            script_path: &script_path,
            env_profile: Some("envprof"),
            invocation_profile: Some("byname"),
        })
        .unwrap();

        assert_eq!(store.get("x"), Some(&["header".to_string()][..]));
    }

    #[test]
    fn test_invocation_profile_name_none_for_canonical() {
        assert_eq!(invocation_profile_name("hashdot"), None);
        assert_eq!(invocation_profile_name("myapp"), Some("myapp"));
    }
}
