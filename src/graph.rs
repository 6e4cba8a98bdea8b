//! Build-graph entities: targets, aliases and series.

use std::rc::Rc;

use crate::error::Result;
use crate::path::Path;

mod alias;
mod series;
mod target;

pub use alias::Alias;
pub use series::{ALL, CLEAN, Series, is_series_name};

/// Always-dirty sentinel node emitted at the generation root.
pub const PHONY: &str = "PHONY";
pub(crate) use series::is_within;
pub use target::{DepsFormat, Target, TargetSpec};

/// Something whose outputs can stand in for paths when it is used as a
/// dependency of another node.
pub trait ProvidesOutputs {
    /// Paths contributed when used as an input.
    fn as_input(&self) -> Vec<String>;

    /// Paths contributed when used as an order-only dependency.
    fn as_after(&self) -> Vec<String> {
        self.as_input()
    }

    /// The single path used when referenced as a dyndep file.
    fn as_dyndep(&self) -> Result<String>;
}

/// One entry of the project's flat node list.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Target(Target),
    Alias(Alias),
}

impl Node {
    /// Paths this node produces, as listed on the left of its build line.
    pub fn outputs(&self) -> &[String] {
        match self {
            Node::Target(target) => target.outputs(),
            Node::Alias(alias) => alias.outputs(),
        }
    }

    /// Membership in the predefined `all` series.
    pub fn is_default(&self) -> bool {
        match self {
            Node::Target(target) => target.is_default(),
            Node::Alias(alias) => alias.is_default(),
        }
    }

    pub fn series(&self) -> &[String] {
        match self {
            Node::Target(target) => target.series(),
            Node::Alias(_) => &[],
        }
    }

    pub fn in_series(&self, name: &str) -> bool {
        match name {
            series::ALL => self.is_default(),
            _ => self.series().iter().any(|s| s == name),
        }
    }

    /// String-context coercion: a node that names exactly one path.
    pub fn as_path(&self) -> Result<&str> {
        match self {
            Node::Target(target) => target.as_path(),
            Node::Alias(alias) => Ok(alias.name()),
        }
    }

    pub fn as_target(&self) -> Option<&Target> {
        match self {
            Node::Target(target) => Some(target),
            Node::Alias(_) => None,
        }
    }

    pub fn render(&self, build_root: &Path) -> String {
        match self {
            Node::Target(target) => target.render(build_root),
            Node::Alias(alias) => alias.render(build_root),
        }
    }
}

impl ProvidesOutputs for Node {
    fn as_input(&self) -> Vec<String> {
        match self {
            Node::Target(target) => target.as_input(),
            Node::Alias(alias) => alias.as_input(),
        }
    }

    fn as_after(&self) -> Vec<String> {
        match self {
            Node::Target(target) => target.as_after(),
            Node::Alias(alias) => alias.as_after(),
        }
    }

    fn as_dyndep(&self) -> Result<String> {
        match self {
            Node::Target(target) => target.as_dyndep(),
            Node::Alias(alias) => alias.as_dyndep(),
        }
    }
}

impl From<Target> for Node {
    fn from(target: Target) -> Self {
        Node::Target(target)
    }
}

impl From<Alias> for Node {
    fn from(alias: Alias) -> Self {
        Node::Alias(alias)
    }
}

/// A dependency as written by a script: a literal path, or another node
/// whose outputs are spliced in.
#[derive(Debug, Clone, PartialEq)]
pub enum Dep {
    Path(String),
    Node(Rc<Node>),
}

impl From<&str> for Dep {
    fn from(path: &str) -> Self {
        Dep::Path(path.into())
    }
}

impl From<String> for Dep {
    fn from(path: String) -> Self {
        Dep::Path(path)
    }
}

impl From<Rc<Node>> for Dep {
    fn from(node: Rc<Node>) -> Self {
        Dep::Node(node)
    }
}

/// Joins escaped, build-root-relative paths with single spaces.
pub(crate) fn path_list(paths: &[String], build_root: &Path) -> String {
    paths
        .iter()
        .map(|p| crate::escape::escape(&crate::escape::relativize(p, build_root), false))
        .collect::<Vec<_>>()
        .join(" ")
}
