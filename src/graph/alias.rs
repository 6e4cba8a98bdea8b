use crate::error::{Error, Result};
use crate::graph::{Dep, ProvidesOutputs, path_list};
use crate::path::Path;

/// A named phony grouping of other paths or nodes. Has no command.
#[derive(Debug, Clone, PartialEq)]
pub struct Alias {
    name: String,
    outputs: Vec<String>,
    inputs: Vec<String>,
    default: bool,
}

impl Alias {
    pub fn new(name: impl Into<String>, inputs: Vec<Dep>, default: bool) -> Result<Self> {
        let name = name.into();
        if inputs.is_empty() {
            return Err(Error::invariant(format!(
                "alias '{name}' requires at least one input"
            )));
        }
        let inputs = inputs
            .into_iter()
            .flat_map(|dep| match dep {
                Dep::Path(path) => vec![path],
                Dep::Node(node) => node.as_input(),
            })
            .collect();
        Ok(Alias {
            outputs: vec![name.clone()],
            name,
            inputs,
            default,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn outputs(&self) -> &[String] {
        &self.outputs
    }

    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    pub fn is_default(&self) -> bool {
        self.default
    }

    pub fn render(&self, build_root: &Path) -> String {
        format!(
            "build {}: phony {}",
            path_list(&self.outputs, build_root),
            path_list(&self.inputs, build_root)
        )
    }
}

impl ProvidesOutputs for Alias {
    /// An alias stands for whatever it groups.
    fn as_input(&self) -> Vec<String> {
        self.inputs.clone()
    }

    fn as_dyndep(&self) -> Result<String> {
        Err(Error::invariant(format!(
            "alias '{}' cannot be used as a dyndep",
            self.name
        )))
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::graph::{Node, Target, TargetSpec};

    #[test]
    fn empty_alias_is_rejected() {
        let err = Alias::new("nothing", vec![], true).unwrap_err();
        assert!(err.is_graph_invariant());
    }

    #[test]
    fn renders_as_phony() {
        let target = Target::new(
            TargetSpec::new("gen").output("/b/x.h").output("/b/y.h"),
            "/s",
        )
        .unwrap();
        let alias = Alias::new(
            "/b/headers",
            vec![Rc::new(Node::from(target)).into(), "/s/extra.h".into()],
            false,
        )
        .unwrap();
        assert_eq!(
            alias.render(&Path::from("/b")),
            "build headers: phony x.h y.h /s/extra.h"
        );
    }

    #[test]
    fn nested_alias_contributes_grouped_paths() {
        let inner = Alias::new("inner", vec!["a".into(), "b".into()], false).unwrap();
        let outer = Alias::new("outer", vec![Rc::new(Node::from(inner)).into()], false).unwrap();
        assert_eq!(outer.inputs(), ["a", "b"]);
        assert!(outer.as_dyndep().is_err());
    }
}
