//! Lexical helpers for emitting text into a ninja file.

use crate::path::Path;

/// Applies ninja's lexical escapes.
///
/// `$` doubles, newlines become `$`-continuations, and `:` is always escaped
/// since it terminates the output list of a `build` line. Spaces are escaped
/// unless `allow_space` is set, which is how whole command lines are emitted:
/// they travel as one variable value and the shell splits them again.
pub fn escape(s: &str, allow_space: bool) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '$' => out.push_str("$$"),
            '\n' => out.push_str("$\n"),
            ' ' if !allow_space => out.push_str("$ "),
            ':' => out.push_str("$:"),
            _ => out.push(ch),
        }
    }
    out
}

/// Reverses [`escape`].
pub fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(ch) = chars.next() {
        if ch != '$' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some(next @ ('$' | ' ' | ':' | '\n')) => out.push(next),
            Some(other) => {
                out.push('$');
                out.push(other);
            }
            None => out.push('$'),
        }
    }
    out
}

/// Rewrites an absolute path inside `build_root` as a path relative to it.
/// Anything else (relative paths, paths outside the build tree) is returned
/// unchanged.
pub fn relativize(path: &str, build_root: &Path) -> String {
    let candidate = Path::from(path);
    if !candidate.is_absolute() {
        return path.into();
    }
    candidate
        .relative_to(build_root)
        .unwrap_or_else(|| path.into())
}

/// Quotes `s` for a POSIX shell, leaving it alone when that is not needed.
pub fn shell_quote(s: &str) -> String {
    if s.is_empty() {
        return "''".into();
    }
    let safe = s
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "@%+=:,./-_".contains(c));
    if safe {
        return s.into();
    }
    format!("'{}'", s.replace('\'', r#"'"'"'"#))
}
