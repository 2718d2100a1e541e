//! Registry - closed-world set of named variables
//!
//! Every variable is parsed exactly once when the registry is built; nothing
//! can be registered after expansion starts. Declaration order is kept so
//! that expansion visits variables in a fixed, reproducible order.

use rustc_hash::FxHashMap;

use crate::template::{self, Template};

/// A named, parsed configuration value. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    pub name: String,
    pub template: Template,
}

impl Variable {
    pub fn new(name: impl Into<String>, raw: &str) -> Self {
        Self {
            name: name.into(),
            template: template::parse(raw),
        }
    }
}

/// Name → variable map that also remembers declaration order
#[derive(Debug, Clone, Default)]
pub struct Registry {
    variables: Vec<Variable>,
    index: FxHashMap<String, usize>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(name, raw value)` pairs.
    ///
    /// A repeated name keeps its first position and takes the last value.
    pub fn from_values<I, K, V>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let mut registry = Self::new();
        for (name, raw) in values {
            registry.insert(Variable::new(name, raw.as_ref()));
        }
        registry
    }

    fn insert(&mut self, variable: Variable) {
        match self.index.get(&variable.name) {
            Some(&i) => self.variables[i] = variable,
            None => {
                self.index.insert(variable.name.clone(), self.variables.len());
                self.variables.push(variable);
            }
        }
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.index.get(name).map(|&i| &self.variables[i])
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Variables in declaration order
    pub fn iter(&self) -> std::slice::Iter<'_, Variable> {
        self.variables.iter()
    }

    /// Names in declaration order
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.variables.iter().map(|v| v.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}

impl<'a> IntoIterator for &'a Registry {
    type Item = &'a Variable;
    type IntoIter = std::slice::Iter<'a, Variable>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
