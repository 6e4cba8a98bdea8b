use core::fmt;

/// A `/`-separated path kept as plain text.
///
/// Paths end up verbatim in the generated ninja file, so they are handled as
/// strings rather than `std::path::PathBuf`. Backslashes are separators only
/// in Windows-style paths (`C:\...`, `\\server\...`) and are normalised
/// there; anywhere else they are part of a file name.
#[derive(Clone, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Path(String);

const SEP: &str = "/";

impl AsRef<str> for Path {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Path({})", self.0)
    }
}

impl From<&str> for Path {
    fn from(path: &str) -> Self {
        Self::from(path)
    }
}

impl From<String> for Path {
    fn from(path: String) -> Self {
        Self::from(path)
    }
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from(path: impl AsRef<str>) -> Self {
        let path = path.as_ref();
        let path = if is_windows_style(path) {
            path.replace('\\', SEP)
        } else {
            path.to_owned()
        };
        // keep a lone "/" intact, drop any other trailing separator
        if path.len() > 1 && path.ends_with(SEP) {
            return Self(path.trim_end_matches(SEP).into());
        }
        Self(path)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_absolute(&self) -> bool {
        self.0.starts_with(SEP) || self.has_drive_prefix()
    }

    fn has_drive_prefix(&self) -> bool {
        let bytes = self.0.as_bytes();
        bytes.len() >= 3 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' && bytes[2] == b'/'
    }

    /// Appends `path`, unless it is already absolute.
    pub fn join(&self, path: impl AsRef<str>) -> Self {
        let mut path = Path::from(path.as_ref());
        if is_windows_style(&self.0) {
            path.0 = path.0.replace('\\', SEP);
        }
        if path.is_absolute() || self.0.is_empty() {
            return path;
        }
        if path.0.is_empty() {
            return self.clone();
        }

        let mut new_path = String::from(self.0.trim_end_matches(SEP));
        new_path.push_str(SEP);
        new_path.push_str(&path.0);
        Self(new_path)
    }

    /// Returns `self` relative to `base` when `base` is a component-wise
    /// prefix of `self`. A path equal to `base` is relative as `"."`.
    pub fn relative_to(&self, base: &Path) -> Option<String> {
        let rest = self.0.strip_prefix(base.0.trim_end_matches(SEP))?;
        if rest.is_empty() {
            return Some(".".into());
        }
        let rest = rest.strip_prefix(SEP)?;
        if rest.is_empty() {
            Some(".".into())
        } else {
            Some(rest.into())
        }
    }
}

fn is_windows_style(path: &str) -> bool {
    let bytes = path.as_bytes();
    let drive = bytes.len() >= 2
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && matches!(bytes.get(2), None | Some(b'/' | b'\\'));
    drive || path.starts_with(r"\\")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_handles_absolute_and_empty() {
        let base = Path::from("/src/");
        assert_eq!(base.join("a/b").as_str(), "/src/a/b");
        assert_eq!(base.join("/etc").as_str(), "/etc");
        assert_eq!(base.join("").as_str(), "/src");
        assert_eq!(Path::new().join("x").as_str(), "x");
    }

    #[test]
    fn relative_to_requires_component_prefix() {
        let bld = Path::from("/work/bld");
        assert_eq!(Path::from("/work/bld/a/b").relative_to(&bld).as_deref(), Some("a/b"));
        assert_eq!(Path::from("/work/bld").relative_to(&bld).as_deref(), Some("."));
        assert_eq!(Path::from("/work/bld2/x").relative_to(&bld), None);
        assert_eq!(Path::from("/elsewhere").relative_to(&bld), None);
    }

    #[test]
    fn backslashes_are_normalised() {
        assert_eq!(Path::from(r"C:\proj\src").as_str(), "C:/proj/src");
        assert!(Path::from(r"C:\proj").is_absolute());
        assert_eq!(Path::from(r"C:\proj").join(r"sub\x.c").as_str(), "C:/proj/sub/x.c");
    }

    #[test]
    fn posix_backslashes_stay_in_file_names() {
        assert_eq!(Path::from(r"/b/we\ird").as_str(), r"/b/we\ird");
        assert_eq!(Path::from("/b").join(r"a\b").as_str(), r"/b/a\b");
    }
}
