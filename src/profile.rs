//! Directive source readers: profile files and script headers, both built
//! atop the shared line grammar in [crate::parser]. Also owns recursive
//! `hashdot.profile` include resolution, guarded against cycles the same way
//! `config/inherit.rs`'s `InheritanceResolver` guards `extends` chains.

use crate::{
    error::HashdotError,
    parser::{self, Directive},
    properties::{PropertyStore, PROFILE_KEY},
};
use indexmap::IndexSet;
use log::{debug, trace};
use std::{
    fs,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

/// Extension used for profile files on disk.
const PROFILE_EXTENSION: &str = "hdp";

/// Resolves `<PROFILE_DIR>/<name>.hdp`, per spec ch.10.3: the
/// `HASHDOT_PROFILE_DIR` environment variable, falling back to a compiled-in
/// default.
pub fn profile_dir() -> PathBuf {
    std::env::var_os("HASHDOT_PROFILE_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("/etc/hashdot/profile.d"))
}

fn profile_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(name).with_extension(PROFILE_EXTENSION)
}

/// Load a named profile into `store`, recursively following any
/// `hashdot.profile` directives it contains. `stack` tracks profiles
/// currently being loaded, on the include path from the original caller, so
/// a profile that re-includes itself (directly or transitively) is rejected
/// with [HashdotError::ProfileCycle] instead of recursing forever.
pub fn load_profile(
    dir: &Path,
    name: &str,
    store: &mut PropertyStore,
    stack: &mut IndexSet<String>,
) -> Result<(), HashdotError> {
    if stack.contains(name) {
        let mut cycle = stack.iter().cloned().collect::<Vec<_>>();
        cycle.push(name.to_string());
        return Err(HashdotError::ProfileCycle(cycle.join(" -> ")));
    }

    let path = profile_path(dir, name);
    debug!("Loading profile {name} from {path:?}");
    let file = fs::File::open(&path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            HashdotError::ProfileNotFound(name.to_string())
        } else {
            HashdotError::Io {
                path: path.display().to_string(),
                source,
            }
        }
    })?;

    stack.insert(name.to_string());
    let result = apply_lines(BufReader::new(file), &path, store, dir, stack);
    stack.shift_remove(name);
    result
}

/// Read every non-comment line of a profile file and apply it to `store`.
fn apply_lines(
    reader: impl BufRead,
    path: &Path,
    store: &mut PropertyStore,
    dir: &Path,
    stack: &mut IndexSet<String>,
) -> Result<(), HashdotError> {
    for line in reader.lines() {
        let line = line.map_err(|source| HashdotError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let trimmed = line.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        apply_directive_line(&line, store, dir, stack)?;
    }
    Ok(())
}

/// Read the leading `#`-comment block of a script file, forwarding only the
/// lines whose second byte is `.` (stripping the `#.` prefix).
pub fn load_script_header(
    script_path: &Path,
    store: &mut PropertyStore,
    dir: &Path,
    stack: &mut IndexSet<String>,
) -> Result<(), HashdotError> {
    let file = fs::File::open(script_path).map_err(|source| HashdotError::Io {
        path: script_path.display().to_string(),
        source,
    })?;

    for line in BufReader::new(file).lines() {
        let line = line.map_err(|source| HashdotError::Io {
            path: script_path.display().to_string(),
            source,
        })?;
        if !line.starts_with('#') {
            break;
        }
        if !line.as_bytes().get(1).is_some_and(|b| *b == b'.') {
            trace!("Skipping non-directive header line: {line}");
            continue;
        }
        let directive_line = &line[2..];
        apply_directive_line(directive_line, store, dir, stack)?;
    }
    Ok(())
}

/// Parse one line and apply the resulting directive to `store`, expanding
/// `hashdot.profile` recursively as it's encountered.
fn apply_directive_line(
    line: &str,
    store: &mut PropertyStore,
    dir: &Path,
    stack: &mut IndexSet<String>,
) -> Result<(), HashdotError> {
    let Some(Directive { name, kind, values }) = parser::parse_line(store, line)? else {
        return Ok(());
    };

    if name == PROFILE_KEY {
        for value in values {
            load_profile(dir, &value, store, stack)?;
            store.append_profile_value(value);
        }
    } else {
        store.assign(&name, kind, values);
    }
    Ok(())
}
