//! Loading configuration units on demand.
//!
//! A unit is loaded the first time its namespace is imported: its script is
//! read through the [`Runtime`], parsed and run with a fresh interpreter
//! bound to that unit. The resulting top-level variables are kept as the
//! unit's exports. Later imports of the same namespace return the cached
//! scope, so every script runs at most once.

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use hashbrown::HashMap;
use tracing::debug;

use crate::error::{Error, Result};
use crate::interpreter::{Interpreter, InterpreterError, Value};
use crate::parser;
use crate::path::Path;
use crate::project::{self, Project, UnitBuilder};
use crate::runtime::Runtime;

/// File name of the per-directory configuration script.
pub const SCRIPT_NAME: &str = "mkninja.build";

#[derive(Debug)]
pub(crate) struct UnitScope {
    namespace: String,
    src: Path,
    bld: Path,
    exports: RefCell<HashMap<String, Value>>,
}

impl UnitScope {
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn src(&self) -> &Path {
        &self.src
    }

    pub fn bld(&self) -> &Path {
        &self.bld
    }

    /// A top-level variable of the unit's script. Empty while the script is
    /// still running.
    pub fn export(&self, name: &str) -> Option<Value> {
        self.exports.borrow().get(name).cloned()
    }
}

pub(crate) struct Discovery {
    runtime: Rc<dyn Runtime>,
    project: RefCell<Project>,
    units: RefCell<HashMap<String, Rc<UnitScope>>>,
}

impl Discovery {
    pub fn new(runtime: Rc<dyn Runtime>, project: Project) -> Rc<Self> {
        Rc::new(Self {
            runtime,
            project: RefCell::new(project),
            units: RefCell::new(HashMap::new()),
        })
    }

    pub fn runtime(&self) -> &dyn Runtime {
        self.runtime.as_ref()
    }

    pub fn project(&self) -> Ref<'_, Project> {
        self.project.borrow()
    }

    /// Runs `f` against the graph builder of an already loaded unit.
    pub fn with_unit<R>(
        &self,
        namespace: &str,
        f: impl FnOnce(UnitBuilder<'_>) -> Result<R>,
    ) -> Result<R> {
        let mut project = self.project.borrow_mut();
        f(project.unit_builder(namespace)?)
    }

    /// Loads the unit for `namespace`, or returns it if it was loaded before.
    pub fn import(self: &Rc<Self>, namespace: &str) -> Result<Rc<UnitScope>> {
        if let Some(unit) = self.units.borrow().get(namespace) {
            return Ok(unit.clone());
        }

        let relpath = project::relpath(namespace)?;
        let (src, bld) = {
            let project = self.project.borrow();
            (project.src().join(&relpath), project.bld().join(&relpath))
        };
        let script = src.join(SCRIPT_NAME);
        let runtime_error = |source: anyhow::Error| Error::Runtime {
            path: script.to_string(),
            source: source.into(),
        };

        if !self.runtime.exists(&script).map_err(runtime_error)? {
            return Err(Error::configuration(
                namespace,
                format!("no {SCRIPT_NAME} found in {src}"),
            ));
        }

        // registered before the script runs, so a unit importing itself
        // sees its own (still empty) scope instead of looping
        {
            let mut project = self.project.borrow_mut();
            project.register_unit(namespace)?;
            project.add_script(script.clone());
        }
        let unit = Rc::new(UnitScope {
            namespace: namespace.into(),
            src,
            bld,
            exports: RefCell::new(HashMap::new()),
        });
        self.units
            .borrow_mut()
            .insert(namespace.into(), unit.clone());
        debug!(unit = namespace, script = %script, "loading configuration unit");

        let bytes = self.runtime.read_file(&script).map_err(runtime_error)?;
        let text = String::from_utf8(bytes).map_err(|err| runtime_error(err.into()))?;
        let statements = parser::parse_script(&text).map_err(|source| Error::Parse {
            path: script.to_string(),
            source,
        })?;

        let mut interp = Interpreter::new(self.clone(), unit.clone());
        interp.interpret(&statements).map_err(|err| match err {
            InterpreterError::Build(err) => *err,
            source => Error::Script {
                path: script.to_string(),
                source,
            },
        })?;

        let exports = interp.into_variables();
        debug!(unit = namespace, exports = exports.len(), "loaded configuration unit");
        *unit.exports.borrow_mut() = exports;
        Ok(unit)
    }

    /// Hands back the project once every script has run.
    pub fn into_project(self: Rc<Self>) -> Project {
        match Rc::try_unwrap(self) {
            Ok(discovery) => discovery.project.into_inner(),
            Err(shared) => shared.project.borrow().clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::project::Helpers;

    #[derive(Default)]
    struct Scripts {
        files: HashMap<String, String>,
        printed: RefCell<Vec<String>>,
    }

    impl Runtime for Rc<Scripts> {
        fn print(&self, msg: &str) {
            self.printed.borrow_mut().push(msg.into());
        }

        fn exists(&self, path: &Path) -> crate::runtime::Result<bool> {
            Ok(self.files.contains_key(path.as_str()))
        }

        fn read_file(&self, path: &Path) -> crate::runtime::Result<Vec<u8>> {
            self.files
                .get(path.as_str())
                .map(|s| s.as_bytes().to_vec())
                .ok_or_else(|| anyhow::anyhow!("no such file"))
        }
    }

    fn discovery(files: &[(&str, &str)]) -> (Rc<Scripts>, Rc<Discovery>) {
        let scripts = Rc::new(Scripts {
            files: files
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            ..Default::default()
        });
        let project = Project::new("/s", "/b", Helpers::default());
        let discovery = Discovery::new(Rc::new(scripts.clone()), project);
        (scripts, discovery)
    }

    #[test]
    fn units_load_once() {
        let (scripts, discovery) = discovery(&[
            ("/s/mkninja.build", "a = import('root.a')\nb = subdir('a')\n"),
            ("/s/a/mkninja.build", "message('loading', mkninja.namespace())\nX = 1\n"),
        ]);
        let root = discovery.import("root").unwrap();
        assert_eq!(*scripts.printed.borrow(), vec!["loading root.a".to_string()]);
        assert_eq!(root.export("a"), root.export("b"));

        let project = discovery.into_project();
        let loaded = project
            .scripts()
            .iter()
            .map(|p| p.as_str())
            .collect::<Vec<_>>();
        assert_eq!(loaded, ["/s/mkninja.build", "/s/a/mkninja.build"]);
    }

    #[test]
    fn missing_script_is_a_configuration_error() {
        let (_, discovery) = discovery(&[("/s/mkninja.build", "import('root.nope')\n")]);
        let err = discovery.import("root").unwrap_err();
        assert!(err.is_configuration(), "{err}");
        assert!(err.to_string().contains("root.nope"));
    }

    #[test]
    fn script_errors_name_the_script() {
        let (_, discovery) = discovery(&[
            ("/s/mkninja.build", "import('root.a')\n"),
            ("/s/a/mkninja.build", "x = undefined_thing\n"),
        ]);
        match discovery.import("root").unwrap_err() {
            Error::Script { path, .. } => assert_eq!(path, "/s/a/mkninja.build"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn parse_errors_carry_line_numbers() {
        let (_, discovery) = discovery(&[("/s/mkninja.build", "x = 1\ny = = 2\n")]);
        match discovery.import("root").unwrap_err() {
            Error::Parse { path, source } => {
                assert_eq!(path, "/s/mkninja.build");
                assert_eq!(source.line, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
