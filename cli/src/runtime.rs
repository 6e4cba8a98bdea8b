use std::fs;
use std::path::Path;

use mkninja::path::Path as ScriptPath;
use mkninja::runtime;

/// Serves scripts straight from the local filesystem.
pub struct Host;

impl runtime::Runtime for Host {
    fn print(&self, msg: &str) {
        println!("{}", msg);
    }

    fn exists(&self, path: &ScriptPath) -> runtime::Result<bool> {
        Ok(Path::new(path.as_str()).is_file())
    }

    fn read_file(&self, path: &ScriptPath) -> runtime::Result<Vec<u8>> {
        Ok(fs::read(path.as_str())?)
    }
}
