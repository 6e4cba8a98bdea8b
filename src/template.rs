//! Per-target tag expansion.
//!
//! Tags are `NAME -> value` pairs private to one target. Values may refer to
//! other tags as `${NAME}` or `$NAME`. Tags are first resolved against each
//! other until nothing changes, then substituted once into the remaining
//! string fields of the target. References to names that are not tags are
//! left untouched, so shell variables such as `$HOME` pass through. `$$`
//! stands for a literal `$` and is only collapsed by the final substitution.

use std::collections::BTreeMap;

use tracing::trace;

use crate::error::{Error, Result};

/// Upper bound on resolution passes over a tag mapping.
pub const EXPANSION_LIMIT: usize = 100;

pub type Tags = BTreeMap<String, String>;

/// Returns whether `name` is a valid tag name (an uppercase identifier).
pub fn is_tag_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_uppercase() || c == '_')
        && chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

/// Resolves references between tags.
pub fn expand_tags(raw: &Tags) -> Result<Tags> {
    if let Some(name) = find_cycle(raw) {
        return Err(Error::Expansion {
            reason: format!("tag '{name}' refers to itself"),
            tags: raw.clone(),
        });
    }

    let mut current = raw.clone();
    for pass in 0..EXPANSION_LIMIT {
        let next: Tags = current
            .iter()
            .map(|(name, value)| (name.clone(), replace(value, &current, false)))
            .collect();
        if next == current {
            trace!(passes = pass, "tags resolved");
            return Ok(current);
        }
        current = next;
    }

    Err(Error::Expansion {
        reason: format!("still changing after {EXPANSION_LIMIT} passes"),
        tags: raw.clone(),
    })
}

/// Replaces every reference to a known tag in `template`, in a single pass,
/// and turns `$$` into `$`.
pub fn substitute(template: &str, tags: &Tags) -> String {
    replace(template, tags, true)
}

/// A resolved tag value as seen by scripts, with `$$` collapsed.
pub fn literal(value: &str) -> String {
    value.replace("$$", "$")
}

fn replace(template: &str, tags: &Tags, last: bool) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        if let Some(tail) = after.strip_prefix('$') {
            out.push_str(if last { "$" } else { "$$" });
            rest = tail;
            continue;
        }
        match reference_at(after) {
            Some((name, consumed)) if tags.contains_key(name) => {
                if last {
                    out.push_str(&literal(&tags[name]));
                } else {
                    out.push_str(&tags[name]);
                }
                rest = &after[consumed..];
            }
            _ => {
                out.push('$');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Names of known tags referenced by `template`.
fn references<'a>(template: &'a str, tags: &Tags) -> Vec<&'a str> {
    let mut found = Vec::new();
    let mut rest = template;
    while let Some(pos) = rest.find('$') {
        let after = &rest[pos + 1..];
        if let Some(tail) = after.strip_prefix('$') {
            rest = tail;
            continue;
        }
        match reference_at(after) {
            Some((name, consumed)) => {
                if tags.contains_key(name) {
                    found.push(name);
                }
                rest = &after[consumed..];
            }
            None => rest = after,
        }
    }
    found
}

/// Parses the identifier that follows a `$`: either `{NAME}` or a bare
/// identifier. Returns the name and the number of bytes consumed.
fn reference_at(s: &str) -> Option<(&str, usize)> {
    if let Some(braced) = s.strip_prefix('{') {
        let end = braced.find('}')?;
        let name = &braced[..end];
        return is_identifier(name).then_some((name, end + 2));
    }
    let end = s
        .char_indices()
        .find(|&(i, c)| !(c == '_' || c.is_ascii_alphabetic() || (i > 0 && c.is_ascii_digit())))
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    (end > 0).then_some((&s[..end], end))
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c == '_' || c.is_ascii_alphabetic())
        && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

/// Depth-first search over tag references; returns a tag on a cycle.
fn find_cycle(tags: &Tags) -> Option<String> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Visiting,
        Done,
    }

    fn visit<'a>(
        name: &'a str,
        tags: &'a Tags,
        marks: &mut BTreeMap<&'a str, Mark>,
    ) -> Option<String> {
        match marks.get(name) {
            Some(Mark::Done) => return None,
            Some(Mark::Visiting) => return Some(name.into()),
            None => {}
        }
        marks.insert(name, Mark::Visiting);
        for next in references(&tags[name], tags) {
            if let Some(cycle) = visit(next, tags, marks) {
                return Some(cycle);
            }
        }
        marks.insert(name, Mark::Done);
        None
    }

    let mut marks = BTreeMap::new();
    tags.keys().find_map(|name| visit(name, tags, &mut marks))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(pairs: &[(&str, &str)]) -> Tags {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn resolves_chained_references() {
        let raw = tags(&[
            ("NAME", "hello"),
            ("OBJ", "${NAME}.o"),
            ("CMD", "cc -c ${NAME}.c -o $OBJ"),
        ]);
        let expanded = expand_tags(&raw).unwrap();
        assert_eq!(expanded["OBJ"], "hello.o");
        assert_eq!(expanded["CMD"], "cc -c hello.c -o hello.o");
    }

    #[test]
    fn expansion_is_idempotent() {
        let raw = tags(&[("A", "x"), ("B", "${A}/y"), ("C", "$B/$A")]);
        let once = expand_tags(&raw).unwrap();
        let twice = expand_tags(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn unknown_names_are_left_alone() {
        let t = tags(&[("OUT", "a.txt")]);
        assert_eq!(substitute("echo $HOME ${PATH} > $OUT", &t), "echo $HOME ${PATH} > a.txt");
        assert_eq!(substitute("cost: $5 and $", &t), "cost: $5 and $");
    }

    #[test]
    fn doubled_dollar_is_a_literal_dollar() {
        let raw = tags(&[("OUT", "o"), ("MSG", "$$OUT is ${OUT}")]);
        let expanded = expand_tags(&raw).unwrap();
        // kept escaped until the final substitution
        assert_eq!(expanded["MSG"], "$$OUT is o");
        assert_eq!(expand_tags(&expanded).unwrap(), expanded);
        assert_eq!(substitute("echo $$OUT > $OUT", &expanded), "echo $OUT > o");
        assert_eq!(substitute("say $MSG", &expanded), "say $OUT is o");
        assert_eq!(substitute("$$$$", &expanded), "$$");
        assert_eq!(literal(&expanded["MSG"]), "$OUT is o");
    }

    #[test]
    fn doubled_dollar_is_not_a_reference() {
        assert!(expand_tags(&tags(&[("A", "$$A")])).is_ok());
    }

    #[test]
    fn bare_reference_takes_longest_identifier() {
        let t = tags(&[("OUT", "a")]);
        assert_eq!(substitute("$OUTPUT ${OUT}PUT", &t), "$OUTPUT aPUT");
    }

    #[test]
    fn direct_self_reference_fails() {
        let err = expand_tags(&tags(&[("A", "${A}")])).unwrap_err();
        assert!(err.is_expansion());
        let err = expand_tags(&tags(&[("A", "x${A}x")])).unwrap_err();
        assert!(err.is_expansion());
    }

    #[test]
    fn indirect_cycle_fails() {
        let raw = tags(&[("A", "${B}"), ("B", "${C}"), ("C", "-$A-")]);
        let err = expand_tags(&raw).unwrap_err();
        assert!(err.is_expansion());
        assert!(err.to_string().contains("did not converge"));
    }

    #[test]
    fn long_acyclic_chains_resolve() {
        let mut raw = Tags::new();
        for i in 0..200 {
            raw.insert(format!("T{i}"), format!("${{T{}}}", i + 1));
        }
        raw.insert("T200".into(), "end".into());
        let expanded = expand_tags(&raw).unwrap();
        assert!(expanded.values().all(|v| v == "end"));
    }

    #[test]
    fn tag_names_must_be_uppercase_identifiers() {
        assert!(is_tag_name("OUT"));
        assert!(is_tag_name("_X1"));
        assert!(!is_tag_name("out"));
        assert!(!is_tag_name("1X"));
        assert!(!is_tag_name(""));
    }
}
