use std::collections::{HashMap, HashSet};

use crate::ast::Node;

/// Symbol table for one call frame. Variables bind unevaluated nodes;
/// functions live in their own namespace and are never fixed.
#[derive(Debug, Default)]
pub(super) struct Scope {
    vars: HashMap<String, Node>,
    subs: HashMap<String, Node>,
    fixed: HashSet<String>,
}

impl Scope {
    pub(super) fn new() -> Self {
        Self::default()
    }

    /// Binds a definition. Marks the name fixed when asked and never
    /// unmarks, so a re-`let` of a fixed name rebinds but stays fixed.
    pub(super) fn add_var(&mut self, name: &str, node: Node, fixed: bool) {
        self.vars.insert(name.to_string(), node);
        if fixed {
            self.fixed.insert(name.to_string());
        }
    }

    /// Rebinds a name, refusing (without mutating) when it is fixed in
    /// this frame. Outer frames are the caller's concern.
    pub(super) fn set_var(&mut self, name: &str, node: Node) -> bool {
        if self.fixed.contains(name) {
            return false;
        }
        self.vars.insert(name.to_string(), node);
        true
    }

    pub(super) fn get_var(&self, name: &str) -> Option<&Node> {
        self.vars.get(name)
    }

    pub(super) fn add_sub(&mut self, name: &str, node: Node) {
        self.subs.insert(name.to_string(), node);
    }

    pub(super) fn get_sub(&self, name: &str) -> Option<&Node> {
        self.subs.get(name)
    }
}
