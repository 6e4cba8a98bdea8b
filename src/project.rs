//! The project registry: every configuration unit, node and series of one
//! generation run, and the code generator that turns them into a ninja file.

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::graph::{self, Node, Series};
use crate::path::Path;

mod render;
mod unit;

pub use render::{Regenerate, RenderOptions};
pub use unit::{ConfigUnit, GlobSpec, ManifestSpec, UnitBuilder, relpath};

/// Namespace of the top-level configuration unit.
pub const ROOT: &str = "root";

/// Paths of the helper executables that generated commands invoke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Helpers {
    /// Reads file names on stdin and rewrites a manifest file when they change.
    pub manifest: String,
    /// Prints the files matching its pattern arguments.
    pub findglob: String,
    /// Touches the file named by its argument.
    pub stamp: String,
}

impl Default for Helpers {
    fn default() -> Self {
        Self {
            manifest: "manifest".into(),
            findglob: "findglob".into(),
            stamp: "stamp".into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Project {
    src: Path,
    bld: Path,
    helpers: Helpers,
    nodes: Vec<Rc<Node>>,
    units: BTreeMap<String, ConfigUnit>,
    series: Vec<Series>,
    scripts: Vec<Path>,
}

impl Project {
    pub fn new(src: impl Into<Path>, bld: impl Into<Path>, helpers: Helpers) -> Self {
        Self {
            src: src.into(),
            bld: bld.into(),
            helpers,
            nodes: Vec::new(),
            units: BTreeMap::new(),
            series: vec![Series::new(graph::ALL, ROOT)],
            scripts: Vec::new(),
        }
    }

    pub fn src(&self) -> &Path {
        &self.src
    }

    pub fn bld(&self) -> &Path {
        &self.bld
    }

    pub fn helpers(&self) -> &Helpers {
        &self.helpers
    }

    /// Every target and alias, in registration order.
    pub fn nodes(&self) -> &[Rc<Node>] {
        &self.nodes
    }

    pub fn unit(&self, namespace: &str) -> Option<&ConfigUnit> {
        self.units.get(namespace)
    }

    /// Units ordered by namespace.
    pub fn units(&self) -> impl Iterator<Item = &ConfigUnit> {
        self.units.values()
    }

    /// Declared series, starting with the predefined `all`.
    pub fn series(&self) -> &[Series] {
        &self.series
    }

    pub fn find_series(&self, name: &str) -> Option<&Series> {
        self.series.iter().find(|s| s.name() == name)
    }

    /// Configuration scripts in the order they were loaded.
    pub fn scripts(&self) -> &[Path] {
        &self.scripts
    }

    pub(crate) fn add_script(&mut self, path: Path) {
        self.scripts.push(path);
    }

    /// Creates the unit for `namespace`. Each namespace is registered once.
    pub fn register_unit(&mut self, namespace: &str) -> Result<&ConfigUnit> {
        if self.units.contains_key(namespace) {
            return Err(Error::configuration(namespace, "unit is already registered"));
        }
        let unit = ConfigUnit::new(namespace, &self.src, &self.bld)?;
        if let Some((parent, leaf)) = namespace.rsplit_once('.') {
            let clash = self
                .series
                .iter()
                .find(|series| series.name() == leaf && series.covers(parent));
            if let Some(series) = clash {
                return Err(Error::configuration(
                    namespace,
                    format!(
                        "unit name clashes with series '{leaf}' declared by {}",
                        series.anchor()
                    ),
                ));
            }
        }
        Ok(self.units.entry(namespace.into()).or_insert(unit))
    }

    /// Graph construction scoped to an already registered unit.
    pub fn unit_builder(&mut self, namespace: &str) -> Result<UnitBuilder<'_>> {
        if !self.units.contains_key(namespace) {
            return Err(Error::configuration(namespace, "no such unit"));
        }
        Ok(UnitBuilder::new(self, namespace.into()))
    }
}
