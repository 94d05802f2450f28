//! Classpath glob expansion. Applied to `java.class.path` right before
//! option formatting; preserves input order and multiplicity, per spec
//! ch.4.4. `glob` isn't part of the teacher's own stack; it's the idiomatic
//! choice sibling examples reach for when they need filesystem pattern
//! matching (see DESIGN.md).

use crate::error::HashdotError;
use log::trace;
use std::path::Path;

/// Expand every value in `patterns`, in order, failing the whole operation
/// if any single pattern matches nothing.
pub fn expand(patterns: &[String]) -> Result<Vec<String>, HashdotError> {
    let mut expanded = Vec::new();
    for pattern in patterns {
        let matches = expand_one(pattern)?;
        expanded.extend(matches);
    }
    Ok(expanded)
}

fn expand_one(pattern: &str) -> Result<Vec<String>, HashdotError> {
    let path = Path::new(pattern);
    let (prefix, basename_pattern) = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => (
            format!("{}/", parent.display()),
            path.file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
        ),
        _ => (String::new(), pattern.to_string()),
    };

    let full_pattern = format!("{prefix}{basename_pattern}");
    trace!("Expanding classpath pattern {full_pattern}");
    let mut matches = Vec::new();
    for entry in glob::glob(&full_pattern)
        .map_err(|error| HashdotError::GlobMiss(format!("{pattern}: {error}")))?
    {
        let entry = entry
            .map_err(|error| HashdotError::GlobMiss(format!("{pattern}: {error}")))?;
        matches.push(entry.display().to_string());
    }

    if matches.is_empty() {
        return Err(HashdotError::GlobMiss(pattern.to_string()));
    }
    matches.sort();
    Ok(matches)
}
