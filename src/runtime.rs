use crate::path::Path;

pub type Result<T> = anyhow::Result<T>;

/// Host services needed while running configuration scripts.
///
/// The library never touches the filesystem directly; every lookup and read
/// of a `mkninja.build` script goes through this trait so embedders (and
/// tests) can serve scripts from anywhere.
pub trait Runtime: 'static {
    /// Emits a user-facing line from `message()` / `warning()`.
    fn print(&self, msg: &str);

    fn exists(&self, path: &Path) -> Result<bool>;
    fn read_file(&self, path: &Path) -> Result<Vec<u8>>;
}
