use std::rc::Rc;

use tracing::debug;

use crate::error::{Error, Result};
use crate::escape::shell_quote;
use crate::graph::{self, Alias, Dep, DepsFormat, Node, Series, Target, TargetSpec};
use crate::path::Path;
use crate::project::{Project, ROOT};
use crate::template::Tags;

/// One directory's worth of declarations.
#[derive(Debug, Clone)]
pub struct ConfigUnit {
    namespace: String,
    relpath: String,
    src: Path,
    bld: Path,
    nodes: Vec<Rc<Node>>,
}

impl ConfigUnit {
    pub(super) fn new(namespace: &str, src_root: &Path, bld_root: &Path) -> Result<Self> {
        let relpath = relpath(namespace)?;
        Ok(Self {
            namespace: namespace.into(),
            src: src_root.join(&relpath),
            bld: bld_root.join(&relpath),
            relpath,
            nodes: Vec::new(),
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Directory of the unit relative to both roots; empty for the root unit.
    pub fn relpath(&self) -> &str {
        &self.relpath
    }

    pub fn src(&self) -> &Path {
        &self.src
    }

    pub fn bld(&self) -> &Path {
        &self.bld
    }

    pub fn nodes(&self) -> &[Rc<Node>] {
        &self.nodes
    }

    pub fn is_root(&self) -> bool {
        self.relpath.is_empty()
    }
}

/// Maps `root.a.b` to `a/b`.
pub fn relpath(namespace: &str) -> Result<String> {
    let mut parts = namespace.split('.');
    if parts.next() != Some(ROOT) {
        return Err(Error::configuration(
            namespace,
            format!("namespaces must start with '{ROOT}'"),
        ));
    }
    let parts = parts.collect::<Vec<_>>();
    let valid = |part: &&str| {
        !part.is_empty()
            && part != &".."
            && part
                .chars()
                .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '+'))
    };
    if let Some(bad) = parts.iter().find(|p| !valid(*p)) {
        return Err(Error::configuration(
            namespace,
            format!("invalid namespace component '{bad}'"),
        ));
    }
    // these would collide with the generated aggregate nodes
    let reserved = |part: &&str| {
        [graph::ALL, graph::CLEAN, graph::PHONY].contains(part) || part.starts_with('_')
    };
    if let Some(bad) = parts.iter().find(|p| reserved(*p)) {
        return Err(Error::configuration(
            namespace,
            format!("namespace component '{bad}' is reserved"),
        ));
    }
    Ok(parts.join("/"))
}

/// Arguments of [`UnitBuilder::add_manifest`].
#[derive(Debug, Clone, Default)]
pub struct ManifestSpec {
    /// Shell command whose stdout lists the files.
    pub command: String,
    pub out: String,
    pub after: Vec<Dep>,
    pub workdir: Option<String>,
    pub tags: Tags,
}

/// Arguments of [`UnitBuilder::add_glob`].
#[derive(Debug, Clone, Default)]
pub struct GlobSpec {
    pub patterns: Vec<String>,
    pub out: String,
    pub after: Vec<Dep>,
    pub workdir: Option<String>,
    pub tags: Tags,
}

/// Graph construction bound to one unit. New nodes default to running in the
/// unit's source directory and are registered with both the unit and the
/// project.
pub struct UnitBuilder<'a> {
    project: &'a mut Project,
    namespace: String,
}

impl<'a> UnitBuilder<'a> {
    pub(super) fn new(project: &'a mut Project, namespace: String) -> Self {
        Self { project, namespace }
    }

    fn unit(&self) -> &ConfigUnit {
        &self.project.units[&self.namespace]
    }

    fn configuration(&self, message: impl Into<String>) -> Error {
        Error::configuration(&self.namespace, message)
    }

    /// Builds a target the way `add_target` would, without registering it.
    pub fn target(&self, spec: TargetSpec) -> Result<Target> {
        if let Some(deps) = spec.deps.as_deref() {
            if deps.parse::<DepsFormat>().is_err() {
                return Err(self.configuration(format!(
                    "deps must be 'gcc' or 'msvc', got '{deps}'"
                )));
            }
        }
        Target::new(spec, self.unit().src.as_str())
    }

    pub fn add_target(&mut self, spec: TargetSpec) -> Result<Rc<Node>> {
        let target = self.target(spec)?;
        self.add_object(Node::from(target))
    }

    pub fn add_alias(&mut self, name: impl Into<String>, inputs: Vec<Dep>, default: bool) -> Result<Rc<Node>> {
        let alias = Alias::new(name, inputs, default)?;
        self.add_object(Node::from(alias))
    }

    /// A phony target that pipes the output of `command` into the manifest
    /// helper, which rewrites `out` only when the listing changes.
    pub fn add_manifest(&mut self, spec: ManifestSpec) -> Result<Rc<Node>> {
        let manifest = shell_quote(&self.project.helpers.manifest);
        let mut target = TargetSpec::new(format!(
            "( {} ) | {manifest} {}",
            spec.command,
            shell_quote(&spec.out)
        ));
        target.outputs = vec![spec.out.into()];
        target.after = spec.after;
        target.workdir = spec.workdir;
        target.display = Some(format!("updating manifest: {}", spec.command));
        target.phony = true;
        target.default = false;
        target.tags = spec.tags;
        self.add_target(target)
    }

    /// Like [`Self::add_manifest`], with the listing produced by the glob
    /// helper.
    pub fn add_glob(&mut self, spec: GlobSpec) -> Result<Rc<Node>> {
        if spec.patterns.is_empty() {
            return Err(Error::invariant("add_glob requires at least one pattern"));
        }
        let patterns = spec
            .patterns
            .iter()
            .map(|p| shell_quote(p))
            .collect::<Vec<_>>()
            .join(" ");
        let mut target = TargetSpec::new(format!(
            "{} {patterns} | {} {}",
            shell_quote(&self.project.helpers.findglob),
            shell_quote(&self.project.helpers.manifest),
            shell_quote(&spec.out)
        ));
        target.outputs = vec![spec.out.into()];
        target.after = spec.after;
        target.workdir = spec.workdir;
        target.display = Some(format!("findglob {patterns}"));
        target.phony = true;
        target.default = false;
        target.tags = spec.tags;
        self.add_target(target)
    }

    /// Declares a series anchored at this unit.
    pub fn add_series(&mut self, name: &str) -> Result<Series> {
        if name == graph::CLEAN || name == graph::PHONY {
            return Err(self.configuration(format!("series name '{name}' is reserved")));
        }
        if !graph::is_series_name(name) {
            return Err(self.configuration(format!("invalid series name '{name}'")));
        }
        if let Some(existing) = self.project.find_series(name) {
            return Err(self.configuration(format!(
                "series '{name}' was already declared by {}",
                existing.anchor()
            )));
        }
        let child = self.project.units.keys().find(|namespace| {
            namespace
                .rsplit_once('.')
                .is_some_and(|(parent, leaf)| leaf == name && graph::is_within(parent, &self.namespace))
        });
        if let Some(child) = child {
            return Err(self.configuration(format!(
                "series '{name}' clashes with unit {child}"
            )));
        }
        let series = Series::new(name, &self.namespace);
        debug!(series = name, unit = %self.namespace, "declared series");
        self.project.series.push(series.clone());
        Ok(series)
    }

    /// Registers a node built elsewhere. A node is registered at most once.
    pub fn add_object(&mut self, node: impl Into<Rc<Node>>) -> Result<Rc<Node>> {
        let node = node.into();
        if self.project.nodes.iter().any(|n| Rc::ptr_eq(n, &node)) {
            return Err(Error::invariant(format!(
                "node {:?} is already registered",
                node.outputs()
            )));
        }
        for name in node.series() {
            if name == graph::ALL || name == graph::CLEAN {
                return Err(self.configuration(format!(
                    "series '{name}' is predefined; use `default` instead"
                )));
            }
            let series = self
                .project
                .find_series(name)
                .ok_or_else(|| self.configuration(format!("unknown series '{name}'")))?;
            if !series.covers(&self.namespace) {
                return Err(self.configuration(format!(
                    "series '{name}' is anchored at {} and does not cover this unit",
                    series.anchor()
                )));
            }
        }

        debug!(unit = %self.namespace, outputs = ?node.outputs(), "registered node");
        self.project.nodes.push(node.clone());
        if let Some(unit) = self.project.units.get_mut(&self.namespace) {
            unit.nodes.push(node.clone());
        }
        Ok(node)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::project::Helpers;

    fn project() -> Project {
        let mut project = Project::new("/s", "/b", Helpers::default());
        project.register_unit("root").unwrap();
        project.register_unit("root.a").unwrap();
        project.register_unit("root.b").unwrap();
        project
    }

    #[test]
    fn namespaces_map_to_directories() {
        assert_eq!(relpath("root").unwrap(), "");
        assert_eq!(relpath("root.a.b").unwrap(), "a/b");
        assert!(relpath("top.a").unwrap_err().is_configuration());
        assert!(relpath("root..a").is_err());
        assert!(relpath("root.a/b").is_err());
    }

    #[test]
    fn reserved_namespace_components() {
        for namespace in ["root.all", "root.a.clean", "root.PHONY", "root._all", "root.a._x"] {
            let err = relpath(namespace).unwrap_err();
            assert!(err.is_configuration(), "{namespace}");
            assert!(err.to_string().contains("reserved"), "{err}");
        }
        assert_eq!(relpath("root.alls.cleaner").unwrap(), "alls/cleaner");
    }

    #[test]
    fn series_and_child_units_cannot_share_a_name() {
        let mut project = project();
        project.register_unit("root.a.check").unwrap();
        let err = project
            .unit_builder("root")
            .unwrap()
            .add_series("check")
            .unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("root.a.check"), "{err}");
        // not below the anchor, so no clash
        project.unit_builder("root.b").unwrap().add_series("check").unwrap();

        let err = project.register_unit("root.b.check").unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("series 'check'"), "{err}");
        project.register_unit("root.check").unwrap();

        assert!(project.unit_builder("root").unwrap().add_series("PHONY").is_err());
    }

    #[test]
    fn unit_paths_follow_roots() {
        let project = project();
        let unit = project.unit("root.a").unwrap();
        assert_eq!(unit.src().as_str(), "/s/a");
        assert_eq!(unit.bld().as_str(), "/b/a");
        assert!(project.unit("root").unwrap().is_root());
    }

    #[test]
    fn targets_default_to_unit_source_dir() {
        let mut project = project();
        let node = project
            .unit_builder("root.a")
            .unwrap()
            .add_target(TargetSpec::new("true").output("/b/a/x"))
            .unwrap();
        assert_eq!(node.as_target().unwrap().workdir(), "/s/a");
        assert_eq!(project.nodes().len(), 1);
        assert_eq!(project.unit("root.a").unwrap().nodes().len(), 1);
        assert!(project.unit("root").unwrap().nodes().is_empty());
    }

    #[test]
    fn duplicate_series_names_first_unit() {
        let mut project = project();
        project.unit_builder("root.a").unwrap().add_series("test").unwrap();
        let err = project
            .unit_builder("root.b")
            .unwrap()
            .add_series("test")
            .unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("root.a"));
    }

    #[test]
    fn predefined_series_cannot_be_redeclared() {
        let mut project = project();
        let mut builder = project.unit_builder("root.a").unwrap();
        let err = builder.add_series("all").unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("already declared by root"));
        assert!(builder.add_series("clean").unwrap_err().is_configuration());
    }

    #[test]
    fn series_membership_is_limited_to_anchor_subtree() {
        let mut project = project();
        project.unit_builder("root.a").unwrap().add_series("lint").unwrap();
        let mut spec = TargetSpec::new("lint").output("/b/b/lint.ok");
        spec.series = vec!["lint".into()];
        let err = project
            .unit_builder("root.b")
            .unwrap()
            .add_target(spec)
            .unwrap_err();
        assert!(err.is_configuration());

        let mut spec = TargetSpec::new("lint").output("/b/a/lint.ok");
        spec.series = vec!["nope".into()];
        assert!(project.unit_builder("root.a").unwrap().add_target(spec).is_err());
    }

    #[test]
    fn manifest_and_glob_commands() {
        let mut project = project();
        let mut builder = project.unit_builder("root").unwrap();
        let manifest = builder
            .add_manifest(ManifestSpec {
                command: "git ls-files".into(),
                out: "/b/files list".into(),
                ..Default::default()
            })
            .unwrap();
        let manifest = manifest.as_target().unwrap();
        assert_eq!(manifest.command(), "( git ls-files ) | manifest '/b/files list'");
        assert_eq!(manifest.display(), Some("updating manifest: git ls-files"));
        assert!(manifest.is_phony());
        assert!(!manifest.is_default());

        let glob = builder
            .add_glob(GlobSpec {
                patterns: vec!["src/*.c".into(), "inc".into()],
                out: "/b/sources".into(),
                ..Default::default()
            })
            .unwrap();
        let glob = glob.as_target().unwrap();
        assert_eq!(glob.command(), "findglob 'src/*.c' inc | manifest /b/sources");
        assert_eq!(glob.display(), Some("findglob 'src/*.c' inc"));

        let err = builder
            .add_glob(GlobSpec {
                out: "/b/none".into(),
                ..Default::default()
            })
            .unwrap_err();
        assert!(err.is_graph_invariant());
    }

    #[test]
    fn bad_deps_format_names_the_unit() {
        let mut project = project();
        let mut spec = TargetSpec::new("cc").output("/b/a/x.o");
        spec.deps = Some("clang".into());
        let err = project
            .unit_builder("root.a")
            .unwrap()
            .add_target(spec)
            .unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("root.a"));
    }

    #[test]
    fn nodes_register_once() {
        let mut project = project();
        let mut builder = project.unit_builder("root").unwrap();
        let target = builder.target(TargetSpec::new("true").output("/b/x")).unwrap();
        let node = builder.add_object(Node::from(target)).unwrap();
        assert!(builder.add_object(node).unwrap_err().is_graph_invariant());
        assert_eq!(project.nodes().len(), 1);
    }
}
