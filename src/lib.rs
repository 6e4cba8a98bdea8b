//! Compiles a tree of per-directory `mkninja.build` scripts into a single
//! ninja build file.

mod discovery;
pub mod error;
pub mod escape;
pub mod graph;
mod interpreter;
pub mod parser;
pub mod path;
pub mod project;
pub mod runtime;
pub mod template;

use std::rc::Rc;

use tracing::info;

pub use crate::discovery::SCRIPT_NAME;
pub use crate::error::{Error, Result};
pub use crate::interpreter::InterpreterError;
use crate::path::Path;
use crate::project::{Helpers, Project, ROOT};

pub struct Mkninja {
    runtime: Rc<dyn runtime::Runtime>,
    helpers: Helpers,
}

impl Mkninja {
    pub fn new(runtime: impl runtime::Runtime) -> Self {
        let runtime = Rc::new(runtime);
        let helpers = Helpers::default();
        Self { runtime, helpers }
    }

    /// Paths of the helper executables referenced by generated commands.
    pub fn helpers(mut self, helpers: Helpers) -> Self {
        self.helpers = helpers;
        self
    }

    /// Loads the root unit of `src_dir` and, transitively, every unit it
    /// imports, collecting their targets into one project.
    pub fn configure(
        &self,
        src_dir: impl AsRef<str>,
        build_dir: impl AsRef<str>,
    ) -> Result<Project> {
        let src_dir = Path::from(src_dir.as_ref());
        let build_dir = Path::from(build_dir.as_ref());

        let project = Project::new(src_dir, build_dir, self.helpers.clone());
        let discovery = discovery::Discovery::new(self.runtime.clone(), project);
        discovery.import(ROOT)?;

        let project = discovery.into_project();
        info!(
            units = project.units().count(),
            nodes = project.nodes().len(),
            scripts = project.scripts().len(),
            "configured project"
        );
        Ok(project)
    }
}
