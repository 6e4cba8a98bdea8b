/// Predefined series every unit belongs to.
pub const ALL: &str = "all";
/// Reserved for the per-unit removal targets.
pub const CLEAN: &str = "clean";

/// A named classification of targets, anchored at the unit that declared it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Series {
    name: String,
    anchor: String,
}

impl Series {
    pub(crate) fn new(name: impl Into<String>, anchor: impl Into<String>) -> Self {
        Series {
            name: name.into(),
            anchor: anchor.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Namespace of the declaring unit.
    pub fn anchor(&self) -> &str {
        &self.anchor
    }

    /// Whether `namespace` is the anchor or one of its descendants.
    pub fn covers(&self, namespace: &str) -> bool {
        is_within(namespace, &self.anchor)
    }
}

pub(crate) fn is_within(namespace: &str, ancestor: &str) -> bool {
    namespace == ancestor
        || namespace
            .strip_prefix(ancestor)
            .is_some_and(|rest| rest.starts_with('.'))
}

pub fn is_series_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphanumeric())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coverage_follows_namespace_components() {
        let series = Series::new("check", "root.a");
        assert!(series.covers("root.a"));
        assert!(series.covers("root.a.b"));
        assert!(!series.covers("root.ab"));
        assert!(!series.covers("root"));
    }

    #[test]
    fn series_names() {
        assert!(is_series_name("test"));
        assert!(is_series_name("lint-2"));
        assert!(!is_series_name("_private"));
        assert!(!is_series_name("a/b"));
        assert!(!is_series_name(""));
    }
}
