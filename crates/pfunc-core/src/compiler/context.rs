//! Read-only binding context threaded through expression compilation

use std::collections::BTreeMap;

use crate::ir::Arg;

/// Names in scope and their declared types.
///
/// Built once per `define` from its `args` clause and handed down by
/// reference; nothing writes to it after construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context {
    bindings: BTreeMap<String, String>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context seeded with a function's declared arguments
    pub fn from_args(args: &[Arg]) -> Self {
        Context {
            bindings: args
                .iter()
                .map(|arg| (arg.name.clone(), arg.typ.clone()))
                .collect(),
        }
    }

    /// Declared type of `name`, if it is bound
    pub fn type_of(&self, name: &str) -> Option<&str> {
        self.bindings.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
