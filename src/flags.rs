//! Flag-skipping for invocation-by-name launches. When `hashdot` is invoked
//! under an alias, argv has no fixed shape; the script path has to be found
//! by scanning past flags the alias's own profile says it recognizes. No
//! teacher analogue exists (the teacher's argv parsing is all declarative
//! `clap`); see DESIGN.md for why this is hand-rolled instead.

/// Scan `args` (everything after argv[0]) for the script-path argument,
/// per spec ch.4.7. `value_args` are flags whose next token is their value
/// (skip two); `terminal` flags stop the scan immediately, treating all
/// remaining args (including the flag itself) as script arguments with no
/// script path present in argv.
pub struct ScanResult<'a> {
    /// Index of the script path in `args`, if one was found before a
    /// terminal flag or the end of input.
    pub script_index: Option<usize>,
    /// Everything after the script path (or after a terminal flag).
    pub remaining: &'a [String],
}

pub fn scan<'a>(
    args: &'a [String],
    value_args: &[String],
    terminal: &[String],
) -> ScanResult<'a> {
    let mut i = 0;
    while i < args.len() {
        let arg = &args[i];
        if !arg.starts_with('-') {
            return ScanResult {
                script_index: Some(i),
                remaining: &args[i + 1..],
            };
        }
        if terminal.iter().any(|flag| flag == arg) {
            return ScanResult {
                script_index: None,
                remaining: &args[i..],
            };
        }
        if value_args.iter().any(|flag| flag == arg) {
            i += 2;
        } else {
            i += 1;
        }
    }
    ScanResult {
        script_index: None,
        remaining: &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_no_flags() {
        let args = v(&["script.x", "a", "b"]);
        let result = scan(&args, &[], &[]);
        assert_eq!(result.script_index, Some(0));
        assert_eq!(result.remaining, &["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_value_flag_skips_two_tokens() {
        let args = v(&["--config", "/etc/x", "script.x", "a"]);
        let result = scan(&args, &v(&["--config"]), &[]);
        assert_eq!(result.script_index, Some(2));
        assert_eq!(result.remaining, &["a".to_string()]);
    }

    #[test]
    fn test_bare_flag_skips_one_token() {
        let args = v(&["--verbose", "script.x"]);
        let result = scan(&args, &[], &[]);
        assert_eq!(result.script_index, Some(1));
    }

    #[test]
    fn test_terminal_flag_stops_scan() {
        let args = v(&["--help", "whatever", "else"]);
        let result = scan(&args, &[], &v(&["--help"]));
        assert_eq!(result.script_index, None);
        assert_eq!(result.remaining, args.as_slice());
    }
}
