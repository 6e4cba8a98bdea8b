use core::fmt::Write as _;
use core::str::FromStr;

use crate::error::{Error, Result};
use crate::escape::{escape, relativize, shell_quote};
use crate::graph::{Dep, ProvidesOutputs, path_list};
use crate::path::Path;
use crate::template::{self, Tags};

/// How the executor should read the depfile of a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DepsFormat {
    #[default]
    None,
    Gcc,
    Msvc,
}

impl FromStr for DepsFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "gcc" => Ok(DepsFormat::Gcc),
            "msvc" => Ok(DepsFormat::Msvc),
            _ => Err(Error::invariant(format!(
                "deps must be 'gcc' or 'msvc', got '{s}'"
            ))),
        }
    }
}

impl DepsFormat {
    fn as_str(&self) -> Option<&'static str> {
        match self {
            DepsFormat::None => None,
            DepsFormat::Gcc => Some("gcc"),
            DepsFormat::Msvc => Some("msvc"),
        }
    }
}

/// Unvalidated description of a target, as handed to
/// [`Target::new`].
#[derive(Debug, Clone, PartialEq)]
pub struct TargetSpec {
    pub command: String,
    pub outputs: Vec<Dep>,
    pub inputs: Vec<Dep>,
    pub after: Vec<Dep>,
    pub phony: bool,
    /// Falls back to the declaring unit's source directory.
    pub workdir: Option<String>,
    pub display: Option<String>,
    pub default: bool,
    pub stamp: bool,
    pub depfile: Option<String>,
    pub deps: Option<String>,
    pub msvc_deps_prefix: Option<String>,
    pub dyndep: Option<Dep>,
    pub series: Vec<String>,
    pub tags: Tags,
}

impl Default for TargetSpec {
    fn default() -> Self {
        Self {
            command: String::new(),
            outputs: Vec::new(),
            inputs: Vec::new(),
            after: Vec::new(),
            phony: false,
            workdir: None,
            display: None,
            default: true,
            stamp: false,
            depfile: None,
            deps: None,
            msvc_deps_prefix: None,
            dyndep: None,
            series: Vec::new(),
            tags: Tags::new(),
        }
    }
}

impl TargetSpec {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ..Self::default()
        }
    }

    /// Builds the command from an argument vector, quoting each argument for
    /// the shell.
    pub fn argv<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(join_argv(args))
    }

    pub fn output(mut self, dep: impl Into<Dep>) -> Self {
        self.outputs.push(dep.into());
        self
    }

    pub fn input(mut self, dep: impl Into<Dep>) -> Self {
        self.inputs.push(dep.into());
        self
    }

    pub fn after(mut self, dep: impl Into<Dep>) -> Self {
        self.after.push(dep.into());
        self
    }

    pub fn tag(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(name.into(), value.into());
        self
    }
}

pub(crate) fn join_argv<I, S>(args: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    args.into_iter()
        .map(|arg| shell_quote(arg.as_ref()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// One command in the emitted graph. Immutable once constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    outputs: Vec<String>,
    inputs: Vec<String>,
    after: Vec<String>,
    command: String,
    workdir: String,
    phony: bool,
    display: Option<String>,
    depfile: Option<String>,
    deps: DepsFormat,
    msvc_deps_prefix: Option<String>,
    dyndep: Option<String>,
    default: bool,
    stamp: bool,
    series: Vec<String>,
    tags: Tags,
}

impl Target {
    /// Validates `spec`, resolves its tags and substitutes them into every
    /// other string field.
    ///
    /// `default_workdir` is used when the spec leaves `workdir` unset.
    pub fn new(spec: TargetSpec, default_workdir: &str) -> Result<Self> {
        if let Some(bad) = spec.tags.keys().find(|k| !template::is_tag_name(k)) {
            return Err(Error::invariant(format!(
                "tag names must be uppercase identifiers, got '{bad}'"
            )));
        }
        let tags = template::expand_tags(&spec.tags)?;
        let expand = |s: &str| template::substitute(s, &tags);

        let deps = spec
            .deps
            .as_deref()
            .map(DepsFormat::from_str)
            .transpose()?
            .unwrap_or_default();

        let outputs = resolve(&spec.outputs, &tags, |n| n.as_input());
        let inputs = resolve(&spec.inputs, &tags, |n| n.as_input());
        let mut after = resolve(&spec.after, &tags, |n| n.as_after());

        if spec.stamp && outputs.is_empty() {
            return Err(Error::invariant(
                "a target with stamp=true must have at least one output",
            ));
        }
        if outputs.is_empty() {
            return Err(Error::invariant(format!(
                "target '{}' has no outputs",
                spec.command
            )));
        }

        let dyndep = match &spec.dyndep {
            None => None,
            Some(Dep::Path(path)) => Some(expand(path)),
            Some(Dep::Node(node)) => Some(node.as_dyndep()?),
        };
        // the executor only reads a dyndep file that is an input of the edge
        if let Some(dyndep) = &dyndep {
            if !inputs.contains(dyndep) && !after.contains(dyndep) {
                after.push(dyndep.clone());
            }
        }

        Ok(Target {
            outputs,
            inputs,
            after,
            command: expand(&spec.command),
            workdir: expand(spec.workdir.as_deref().unwrap_or(default_workdir)),
            phony: spec.phony,
            display: spec.display.as_deref().map(expand),
            depfile: spec.depfile.as_deref().map(expand),
            deps,
            msvc_deps_prefix: spec.msvc_deps_prefix,
            dyndep,
            default: spec.default,
            stamp: spec.stamp,
            series: spec.series,
            tags: tags
                .iter()
                .map(|(name, value)| (name.clone(), template::literal(value)))
                .collect(),
        })
    }

    pub fn outputs(&self) -> &[String] {
        &self.outputs
    }

    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    pub fn after(&self) -> &[String] {
        &self.after
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn workdir(&self) -> &str {
        &self.workdir
    }

    pub fn display(&self) -> Option<&str> {
        self.display.as_deref()
    }

    pub fn depfile(&self) -> Option<&str> {
        self.depfile.as_deref()
    }

    pub fn deps(&self) -> DepsFormat {
        self.deps
    }

    pub fn dyndep(&self) -> Option<&str> {
        self.dyndep.as_deref()
    }

    pub fn is_phony(&self) -> bool {
        self.phony
    }

    pub fn is_default(&self) -> bool {
        self.default
    }

    pub fn is_stamp(&self) -> bool {
        self.stamp
    }

    pub fn series(&self) -> &[String] {
        &self.series
    }

    /// Resolved tags, readable by scripts and downstream tooling.
    pub fn tags(&self) -> &Tags {
        &self.tags
    }

    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags.get(name).map(String::as_str)
    }

    /// The single output path, for use in string contexts.
    pub fn as_path(&self) -> Result<&str> {
        match self.outputs.as_slice() {
            [only] => Ok(only),
            outputs => Err(Error::invariant(format!(
                "only targets with exactly one output can be used as a path; \
                 this target has outputs {outputs:?}"
            ))),
        }
    }

    pub fn render(&self, build_root: &Path) -> String {
        let mut out = String::from("build ");
        out.push_str(&path_list(&self.outputs, build_root));
        out.push_str(if self.stamp { ": STAMPTARGET |" } else { ": TARGET |" });
        if !self.inputs.is_empty() {
            out.push(' ');
            out.push_str(&path_list(&self.inputs, build_root));
        }
        if self.phony {
            out.push_str(" PHONY");
        }
        out.push_str(" ||");
        if !self.after.is_empty() {
            out.push(' ');
            out.push_str(&path_list(&self.after, build_root));
        }

        let _ = write!(out, "\n CMD = {}", escape(&self.command, true));
        let _ = write!(out, "\n WORKDIR = {}", escape(&self.workdir, true));
        if let Some(display) = &self.display {
            let _ = write!(out, "\n DISPLAY = {}", escape(display, true));
        }
        if self.stamp {
            // the stamp helper runs after `cd $WORKDIR`, so this stays as declared
            let _ = write!(out, "\n STAMP = {}", escape(&self.outputs[0], true));
        }
        if let Some(depfile) = &self.depfile {
            let _ = write!(out, "\n depfile = {}", escape(&relativize(depfile, build_root), true));
        }
        if let Some(deps) = self.deps.as_str() {
            let _ = write!(out, "\n deps = {deps}");
        }
        if let Some(prefix) = &self.msvc_deps_prefix {
            let _ = write!(out, "\n msvc_deps_prefix = {}", escape(prefix, true));
        }
        if let Some(dyndep) = &self.dyndep {
            let _ = write!(out, "\n dyndep = {}", escape(&relativize(dyndep, build_root), true));
        }
        out
    }
}

/// Flattens dependencies into paths. Literal paths get tag substitution;
/// nodes contribute their already-final outputs.
fn resolve(deps: &[Dep], tags: &Tags, contribute: impl Fn(&crate::graph::Node) -> Vec<String>) -> Vec<String> {
    deps.iter()
        .flat_map(|dep| match dep {
            Dep::Path(path) => vec![template::substitute(path, tags)],
            Dep::Node(node) => contribute(node),
        })
        .collect()
}

impl ProvidesOutputs for Target {
    fn as_input(&self) -> Vec<String> {
        self.outputs.clone()
    }

    fn as_dyndep(&self) -> Result<String> {
        match self.outputs.as_slice() {
            [only] => Ok(only.clone()),
            outputs => Err(Error::invariant(format!(
                "a target used as a dyndep must have exactly one output, got {outputs:?}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::graph::Node;

    const SRC: &str = "/p/src";

    fn bld() -> Path {
        Path::from("/p/bld")
    }

    #[test]
    fn renders_plain_target() {
        let spec = TargetSpec::new("echo hi > out.txt").output("out.txt");
        let target = Target::new(spec, SRC).unwrap();
        assert_eq!(
            target.render(&bld()),
            "build out.txt: TARGET | ||\n CMD = echo hi > out.txt\n WORKDIR = /p/src"
        );
    }

    #[test]
    fn outputs_and_inputs_keep_declaration_order() {
        let spec = TargetSpec::new("true")
            .output("/p/bld/z")
            .output("/p/bld/a b")
            .input("/p/src/in:1")
            .input("/p/bld/gen/x.h")
            .after("/p/bld/stamp");
        let target = Target::new(spec, SRC).unwrap();
        let line = target.render(&bld());
        assert_eq!(
            line.lines().next().unwrap(),
            "build z a$ b: TARGET | /p/src/in$:1 gen/x.h || stamp"
        );
    }

    #[test]
    fn nodes_contribute_their_outputs() {
        let first = Target::new(
            TargetSpec::new("gen").output("/p/bld/a.h").output("/p/bld/b.h"),
            SRC,
        )
        .unwrap();
        let first = Rc::new(Node::from(first));
        let spec = TargetSpec::new("cc")
            .output("/p/bld/x.o")
            .input("/p/src/x.c")
            .input(first.clone())
            .after(first);
        let target = Target::new(spec, SRC).unwrap();
        assert_eq!(target.inputs(), ["/p/src/x.c", "/p/bld/a.h", "/p/bld/b.h"]);
        assert_eq!(target.after(), ["/p/bld/a.h", "/p/bld/b.h"]);
    }

    #[test]
    fn tags_are_substituted_into_fields() {
        let spec = TargetSpec::new("cc -c ${SRCFILE} -o ${OBJ}")
            .output("${OBJ}")
            .input("${SRCFILE}")
            .tag("NAME", "main")
            .tag("SRCFILE", "/p/src/${NAME}.c")
            .tag("OBJ", "/p/bld/${NAME}.o");
        let target = Target::new(spec, SRC).unwrap();
        assert_eq!(target.command(), "cc -c /p/src/main.c -o /p/bld/main.o");
        assert_eq!(target.outputs(), ["/p/bld/main.o"]);
        assert_eq!(target.tag("OBJ"), Some("/p/bld/main.o"));
    }

    #[test]
    fn doubled_dollar_survives_as_shell_variable() {
        let spec = TargetSpec::new("echo $$OUT > $OUT")
            .output("o")
            .tag("OUT", "o")
            .tag("PRICE", "$$5");
        let target = Target::new(spec, SRC).unwrap();
        assert_eq!(target.command(), "echo $OUT > o");
        assert_eq!(target.tag("PRICE"), Some("$5"));
        assert!(target.render(&bld()).contains("\n CMD = echo $$OUT > o\n"));
    }

    #[test]
    fn lowercase_tag_is_rejected() {
        let spec = TargetSpec::new("x").output("o").tag("out", "v");
        assert!(Target::new(spec, SRC).unwrap_err().is_graph_invariant());
    }

    #[test]
    fn cyclic_tags_fail_at_construction() {
        let spec = TargetSpec::new("x").output("o").tag("A", "$B").tag("B", "$A");
        assert!(Target::new(spec, SRC).unwrap_err().is_expansion());
    }

    #[test]
    fn stamp_target_requires_output() {
        let mut spec = TargetSpec::new("touch nothing");
        spec.stamp = true;
        let err = Target::new(spec, SRC).unwrap_err();
        assert!(err.is_graph_invariant());
        assert!(err.to_string().contains("stamp"));
    }

    #[test]
    fn stamp_target_renders_stamp_variable() {
        let mut spec = TargetSpec::new("make-marker").output("marker");
        spec.stamp = true;
        let target = Target::new(spec, SRC).unwrap();
        assert_eq!(
            target.render(&bld()),
            "build marker: STAMPTARGET | ||\n CMD = make-marker\n WORKDIR = /p/src\n STAMP = marker"
        );
    }

    #[test]
    fn bad_deps_literal_is_rejected() {
        let mut spec = TargetSpec::new("cc").output("a.o");
        spec.deps = Some("clang".into());
        assert!(Target::new(spec, SRC).is_err());
    }

    #[test]
    fn depfile_and_dyndep_lines() {
        let dd = Target::new(TargetSpec::new("scan").output("/p/bld/x.dd"), SRC).unwrap();
        let mut spec = TargetSpec::new("cc -MD -MF x.d")
            .output("/p/bld/x.o")
            .input("/p/src/x.c");
        spec.depfile = Some("/p/bld/x.d".into());
        spec.deps = Some("msvc".into());
        spec.msvc_deps_prefix = Some("Note: including file:".into());
        spec.dyndep = Some(Dep::Node(Rc::new(dd.into())));
        spec.display = Some("compiling x".into());
        let target = Target::new(spec, SRC).unwrap();
        assert_eq!(
            target.render(&bld()),
            "build x.o: TARGET | /p/src/x.c || x.dd\n \
             CMD = cc -MD -MF x.d\n \
             WORKDIR = /p/src\n \
             DISPLAY = compiling x\n \
             depfile = x.d\n \
             deps = msvc\n \
             msvc_deps_prefix = Note$: including file$:\n \
             dyndep = x.dd"
        );
    }

    #[test]
    fn multi_output_target_cannot_be_dyndep_or_path() {
        let multi = Target::new(TargetSpec::new("g").output("a").output("b"), SRC).unwrap();
        assert!(multi.as_path().is_err());
        let mut spec = TargetSpec::new("c").output("o");
        spec.dyndep = Some(Dep::Node(Rc::new(multi.into())));
        assert!(Target::new(spec, SRC).unwrap_err().is_graph_invariant());
    }

    #[test]
    fn argv_commands_are_quoted() {
        let spec = TargetSpec::argv(["printf", "%s\n", "a b"]).output("o");
        let target = Target::new(spec, SRC).unwrap();
        assert_eq!(target.command(), "printf '%s\n' 'a b'");
    }
}
