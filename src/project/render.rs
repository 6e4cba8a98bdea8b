use core::fmt::Write as _;

use tracing::debug;

use crate::escape::{escape, relativize, shell_quote};
use crate::graph::{self, Series, path_list};
use crate::path::Path;
use crate::project::{ConfigUnit, Project};

/// Self-regeneration wiring for the top-level ninja file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Regenerate {
    /// Shell script replaying the original command line.
    pub rerun_script: String,
    /// The generator executable; rebuilding it regenerates the file.
    pub generator: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Emit the always-dirty `PHONY` sentinel.
    pub is_root: bool,
    pub regenerate: Option<Regenerate>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            is_root: true,
            regenerate: None,
        }
    }
}

const TARGET_RULE: &str = "\
rule TARGET
 command = cd $WORKDIR && $CMD
 description = $DISPLAY
 restat = 1
";

impl Project {
    /// Serializes the whole graph as a ninja file.
    pub fn render(&self, options: &RenderOptions) -> String {
        let bld = &self.bld;
        let mut out = String::new();

        out.push_str(TARGET_RULE);
        out.push('\n');
        let _ = writeln!(
            out,
            "rule STAMPTARGET\n \
             command = cd $WORKDIR && $CMD && {} $STAMP\n \
             description = $DISPLAY\n \
             restat = 1\n",
            escape(&shell_quote(&self.helpers.stamp), true)
        );

        if options.is_root {
            out.push_str("# phony target is always out of date\nbuild PHONY: phony\n\n");
        }

        if let Some(regen) = &options.regenerate {
            let mut deps = vec![regen.rerun_script.clone(), regen.generator.clone()];
            deps.extend(self.scripts.iter().map(|p| p.as_str().to_owned()));
            let _ = writeln!(
                out,
                "# regenerate ninja files based on the original command line\n\
                 build build.ninja: TARGET {}\n \
                 CMD = sh {}\n \
                 WORKDIR = .\n \
                 DISPLAY = regenerating ninja files\n \
                 generator = 1\n",
                path_list(&deps, bld),
                escape(&shell_quote(&relativize(&regen.rerun_script, bld)), true),
            );
        }

        for node in &self.nodes {
            out.push_str(&node.render(bld));
            out.push_str("\n\n");
        }

        for series in &self.series {
            self.render_series(series, &mut out);
        }
        self.render_clean(&mut out);

        out.push_str("default all");

        debug!(nodes = self.nodes.len(), units = self.units.len(), "rendered ninja file");
        self.with_root_variables(out.trim_end())
    }

    fn descendants<'a>(&'a self, unit: &'a ConfigUnit) -> impl Iterator<Item = &'a ConfigUnit> {
        self.units
            .values()
            .filter(move |other| graph::is_within(other.namespace(), unit.namespace()))
    }

    fn render_series(&self, series: &Series, out: &mut String) {
        let name = series.name();
        let units = self
            .units
            .values()
            .filter(|unit| series.covers(unit.namespace()))
            .collect::<Vec<_>>();
        let private = format!("_{name}");

        let _ = writeln!(out, "# {name}-series targets");
        for unit in &units {
            let outputs = unit
                .nodes()
                .iter()
                .filter(|node| node.in_series(name))
                .flat_map(|node| node.outputs().iter().cloned())
                .collect::<Vec<_>>();
            aggregate(out, &unit_node(unit, &private), &path_list(&outputs, &self.bld));
        }
        out.push('\n');

        for unit in &units {
            let public = if name == graph::ALL && !unit.is_root() {
                unit.relpath().to_owned()
            } else {
                unit_node(unit, name)
            };
            let deps = self
                .descendants(unit)
                .map(|child| escape(&unit_node(child, &private), false))
                .collect::<Vec<_>>();
            aggregate(out, &public, &deps.join(" "));
        }
        out.push('\n');
    }

    /// Each unit gets a `_clean` command removing its own outputs, and a
    /// public `clean` depending on those of its whole subtree.
    fn render_clean(&self, out: &mut String) {
        let private = format!("_{}", graph::CLEAN);

        out.push_str("# clean-series targets\n");
        for unit in self.units.values() {
            let outputs = unit
                .nodes()
                .iter()
                .filter_map(|node| node.as_target())
                .flat_map(|target| target.outputs())
                .map(|output| relativize(output, &self.bld))
                // never remove anything outside the build tree
                .filter(|output| !Path::from(output.as_str()).is_absolute())
                .map(|output| shell_quote(&output))
                .collect::<Vec<_>>();
            let name = escape(&unit_node(unit, &private), false);
            if outputs.is_empty() {
                aggregate(out, &name, "");
                continue;
            }
            let _ = writeln!(
                out,
                "build {name}: TARGET\n \
                 CMD = {}\n \
                 WORKDIR = .\n \
                 DISPLAY = {}",
                escape(&format!("rm -rf {}", outputs.join(" ")), true),
                escape(&format!("cleaning {}", unit.namespace()), true),
            );
        }
        out.push('\n');

        for unit in self.units.values() {
            let deps = self
                .descendants(unit)
                .map(|child| escape(&unit_node(child, &private), false))
                .collect::<Vec<_>>();
            aggregate(out, &unit_node(unit, graph::CLEAN), &deps.join(" "));
        }
        out.push('\n');
    }

    /// Replaces every occurrence of the two roots with `${BLD}` and `${SRC}`
    /// and prepends their definitions.
    fn with_root_variables(&self, text: &str) -> String {
        let mut replacements = Vec::new();
        for (root, var) in [(&self.bld, "${BLD}"), (&self.src, "${SRC}")] {
            // a filesystem root would match every absolute path
            if root.as_str().len() <= 1 {
                continue;
            }
            replacements.push((escape(root.as_str(), false), var));
            replacements.push((escape(root.as_str(), true), var));
        }
        // longest first, so a root nested inside the other one wins
        replacements.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        replacements.dedup();

        let mut text = text.to_owned();
        for (from, to) in &replacements {
            text = replace_path_prefix(&text, from, to);
        }

        format!(
            "# global path variables\nBLD={}\nSRC={}\n\n{text}\n",
            escape(self.bld.as_str(), true),
            escape(self.src.as_str(), true),
        )
    }
}

/// Name of the `leaf` aggregate of `unit`, relative to the build root.
fn unit_node(unit: &ConfigUnit, leaf: &str) -> String {
    if unit.is_root() {
        leaf.into()
    } else {
        format!("{}/{leaf}", unit.relpath())
    }
}

fn is_path_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '.' | '_' | '-' | '+' | '~')
}

/// Replaces `from` wherever it appears as a whole leading run of path
/// components, so `/b` matches `/b/x` but not `/bin`.
fn replace_path_prefix(text: &str, from: &str, to: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(at) = rest.find(from) {
        let end = at + from.len();
        let before = rest[..at].chars().next_back();
        let after = rest[end..].chars().next();
        let whole = !before.is_some_and(|c| is_path_char(c) || matches!(c, '/' | '}'))
            && !after.is_some_and(is_path_char);
        out.push_str(&rest[..at]);
        out.push_str(if whole { to } else { from });
        rest = &rest[end..];
    }
    out.push_str(rest);
    out
}

fn aggregate(out: &mut String, name: &str, deps: &str) {
    if deps.is_empty() {
        let _ = writeln!(out, "build {}: phony", escape(name, false));
    } else {
        let _ = writeln!(out, "build {}: phony {deps}", escape(name, false));
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::graph::TargetSpec;
    use crate::project::Helpers;

    fn project() -> Project {
        let mut project = Project::new("/s", "/b", Helpers::default());
        project.register_unit("root").unwrap();
        project
    }

    #[test]
    fn single_target_file() {
        let mut project = project();
        project
            .unit_builder("root")
            .unwrap()
            .add_target(TargetSpec::new("echo hi > out.txt").output("out.txt"))
            .unwrap();

        assert_eq!(
            project.render(&RenderOptions::default()),
            "# global path variables
BLD=/b
SRC=/s

rule TARGET
 command = cd $WORKDIR && $CMD
 description = $DISPLAY
 restat = 1

rule STAMPTARGET
 command = cd $WORKDIR && $CMD && stamp $STAMP
 description = $DISPLAY
 restat = 1

# phony target is always out of date
build PHONY: phony

build out.txt: TARGET | ||
 CMD = echo hi > out.txt
 WORKDIR = ${SRC}

# all-series targets
build _all: phony out.txt

build all: phony _all

# clean-series targets
build _clean: TARGET
 CMD = rm -rf out.txt
 WORKDIR = .
 DISPLAY = cleaning root

build clean: phony _clean

default all
"
        );
    }

    #[test]
    fn regeneration_statement_lists_scripts() {
        let mut project = project();
        project.add_script(Path::from("/s/mkninja.build"));
        let options = RenderOptions {
            is_root: false,
            regenerate: Some(Regenerate {
                rerun_script: "/b/.rerun_mkninja.sh".into(),
                generator: "/usr/bin/mkninja".into(),
            }),
        };
        let text = project.render(&options);
        assert!(!text.contains("build PHONY"));
        assert!(text.contains(
            "# regenerate ninja files based on the original command line\n\
             build build.ninja: TARGET .rerun_mkninja.sh /usr/bin/mkninja ${SRC}/mkninja.build\n \
             CMD = sh .rerun_mkninja.sh\n \
             WORKDIR = .\n \
             DISPLAY = regenerating ninja files\n \
             generator = 1\n\n"
        ));
    }

    #[test]
    fn user_series_aggregates() {
        let mut project = project();
        project.register_unit("root.a").unwrap();
        project.register_unit("root.a.b").unwrap();
        project.unit_builder("root.a").unwrap().add_series("test").unwrap();
        let mut spec = TargetSpec::new("run").output("/b/a/b/test.ok");
        spec.series = vec!["test".into()];
        spec.default = false;
        project.unit_builder("root.a.b").unwrap().add_target(spec).unwrap();

        let text = project.render(&RenderOptions::default());
        assert!(text.contains(
            "# test-series targets\n\
             build a/_test: phony\n\
             build a/b/_test: phony a/b/test.ok\n\
             \n\
             build a/test: phony a/_test a/b/_test\n\
             build a/b/test: phony a/b/_test\n"
        ));
        // not a default target, so the all-series leaves it out
        assert!(text.contains("build a/b/_all: phony\n"));
        assert!(text.contains("build all: phony _all a/_all a/b/_all\n"));
        assert!(text.contains("build a: phony a/_all a/b/_all\n"));
    }

    #[test]
    fn clean_skips_paths_outside_build_tree() {
        let mut project = project();
        project
            .unit_builder("root")
            .unwrap()
            .add_target(
                TargetSpec::new("gen")
                    .output("/b/gen dir/x.h")
                    .output("/etc/passwd"),
            )
            .unwrap();
        let text = project.render(&RenderOptions::default());
        assert!(text.contains(" CMD = rm -rf 'gen dir/x.h'\n"));
    }

    #[test]
    fn roots_are_only_replaced_on_component_boundaries() {
        assert_eq!(
            replace_path_prefix("/b/x /bin/sh a/b /b", "/b", "${BLD}"),
            "${BLD}/x /bin/sh a/b ${BLD}"
        );
        assert_eq!(replace_path_prefix("${BLD}/s/x", "/s", "${SRC}"), "${BLD}/s/x");
    }

    #[test]
    fn nested_build_root_is_substituted_first() {
        let mut project = Project::new("/p", "/p/build", Helpers::default());
        project.register_unit("root").unwrap();
        project
            .unit_builder("root")
            .unwrap()
            .add_target(TargetSpec::new("cp /p/in /p/build/out").output("/p/build/out").input("/p/in"))
            .unwrap();
        let text = project.render(&RenderOptions::default());
        assert!(text.starts_with("# global path variables\nBLD=/p/build\nSRC=/p\n\n"));
        assert!(text.contains("build out: TARGET | ${SRC}/in ||\n CMD = cp ${SRC}/in ${BLD}/out\n WORKDIR = ${SRC}\n"));
    }
}
