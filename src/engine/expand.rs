//! Expander - memoized, cycle-safe placeholder substitution
//!
//! Each variable gets one [`ExpansionRecord`], created the first time the
//! variable is visited. The record is marked `InProgress` before any segment
//! is processed; a reference that reaches an `InProgress` record is a cycle
//! and takes that record's current state (empty value, partial deps) instead
//! of re-entering. Unregistered references contribute nothing.
//!
//! Results for cyclic graphs depend on which cycle member is visited first.
//! [`Expander::expand_all`] visits in registry declaration order, so a run is
//! reproducible.

use std::collections::BTreeSet;

use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use super::registry::Registry;
use crate::template::Segment;

/// Transitive dependency names, kept sorted
pub type DependencySet = BTreeSet<String>;

/// Completed dependency sets keyed by variable name
pub type DependencyMap = FxHashMap<String, DependencySet>;

/// Lifecycle of one variable's expansion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpansionState {
    NotStarted,
    InProgress,
    Done,
}

/// Per-variable memo: resolved value plus transitive dependencies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpansionRecord {
    state: ExpansionState,
    value: String,
    deps: DependencySet,
}

impl ExpansionRecord {
    fn in_progress() -> Self {
        Self {
            state: ExpansionState::InProgress,
            value: String::new(),
            deps: DependencySet::new(),
        }
    }

    #[inline]
    pub fn state(&self) -> ExpansionState {
        self.state
    }

    /// Fully expanded, placeholder-free value
    #[inline]
    pub fn value(&self) -> &str {
        &self.value
    }

    #[inline]
    pub fn deps(&self) -> &DependencySet {
        &self.deps
    }

    fn resolved(&self) -> Resolved<'_> {
        Resolved {
            value: &self.value,
            deps: &self.deps,
        }
    }
}

/// Borrowed view of a finished expansion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved<'e> {
    pub value: &'e str,
    pub deps: &'e DependencySet,
}

impl Resolved<'static> {
    /// Result for names that are not registered
    pub const EMPTY: Resolved<'static> = Resolved {
        value: "",
        deps: &BTreeSet::new(),
    };
}

/// Lazily expands variables of one registry, caching every result
pub struct Expander<'r> {
    registry: &'r Registry,
    records: FxHashMap<&'r str, ExpansionRecord>,
}

impl<'r> Expander<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            records: FxHashMap::with_capacity_and_hasher(registry.len(), Default::default()),
        }
    }

    /// Expand `name`, returning its resolved value and transitive deps.
    ///
    /// Unregistered names resolve to `("", {})`. Repeated calls return the
    /// cached record.
    pub fn expand(&mut self, name: &str) -> Resolved<'_> {
        let registry = self.registry;
        let Some(variable) = registry.get(name) else {
            return Resolved::EMPTY;
        };
        let key = variable.name.as_str();

        self.visit(key);

        self.records
            .get(key)
            .map_or(Resolved::EMPTY, ExpansionRecord::resolved)
    }

    /// Expand every registered variable in declaration order
    pub fn expand_all(&mut self) -> DependencyMap {
        let registry = self.registry;
        for name in registry.names() {
            self.visit(name);
        }

        self.records
            .iter()
            .map(|(name, record)| (name.to_string(), record.deps.clone()))
            .collect()
    }

    /// Current state of `name` without triggering expansion
    pub fn state(&self, name: &str) -> ExpansionState {
        self.records
            .get(name)
            .map_or(ExpansionState::NotStarted, ExpansionRecord::state)
    }

    /// Consume the expander, keeping its records keyed by owned names
    pub fn into_records(self) -> FxHashMap<String, ExpansionRecord> {
        self.records
            .into_iter()
            .map(|(name, record)| (name.to_string(), record))
            .collect()
    }

    /// Expand `root` and everything it reaches, using an explicit frame stack.
    ///
    /// A frame parked on a reference to a `NotStarted` variable does not
    /// advance; the child frame is pushed and, once it completes, the parent
    /// revisits the same segment and finds it `Done`.
    fn visit(&mut self, root: &'r str) {
        let registry = self.registry;
        if !registry.contains(root) || self.state(root) != ExpansionState::NotStarted {
            return;
        }

        self.records.insert(root, ExpansionRecord::in_progress());
        let mut stack = vec![Frame::new(root)];

        while let Some(frame) = stack.last_mut() {
            let name = frame.name;
            let segments = registry.get(name).map_or(&[][..], |v| v.template.segments());

            let Some(segment) = segments.get(frame.next) else {
                let value = std::mem::take(&mut frame.value);
                stack.pop();
                if let Some(own) = self.records.get_mut(name) {
                    own.value = value;
                    own.state = ExpansionState::Done;
                }
                continue;
            };

            let target = match segment {
                Segment::Literal(text) => {
                    frame.value.push_str(text);
                    frame.next += 1;
                    continue;
                }
                Segment::Reference(target) => target,
            };

            let Some(target_var) = registry.get(target) else {
                trace!(variable = name, reference = %target, "dropping unresolved reference");
                frame.next += 1;
                continue;
            };
            let target: &'r str = target_var.name.as_str();

            match self.state(target) {
                ExpansionState::NotStarted => {
                    // Marking before any segment is what stops cycles from recursing
                    self.records.insert(target, ExpansionRecord::in_progress());
                    stack.push(Frame::new(target));
                    continue;
                }
                ExpansionState::InProgress => {
                    debug!(variable = name, reference = target, "reference cycle, using partial expansion");
                }
                ExpansionState::Done => {}
            }

            let inherited = match self.records.get(target) {
                Some(record) => {
                    frame.value.push_str(&record.value);
                    record.deps.clone()
                }
                None => DependencySet::new(),
            };

            if let Some(own) = self.records.get_mut(name) {
                own.deps.insert(target.to_string());
                own.deps.extend(inherited);
            }
            frame.next += 1;
        }
    }
}

/// One variable being expanded: next segment to process and the value so far
struct Frame<'r> {
    name: &'r str,
    next: usize,
    value: String,
}

impl<'r> Frame<'r> {
    fn new(name: &'r str) -> Self {
        Self {
            name,
            next: 0,
            value: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deps(names: &[&str]) -> DependencySet {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn literal_expands_to_itself() {
        let registry = Registry::from_values([("a", "x")]);
        let mut expander = Expander::new(&registry);
        let resolved = expander.expand("a");
        assert_eq!(resolved.value, "x");
        assert!(resolved.deps.is_empty());
    }

    #[test]
    fn simple_reference() {
        let registry = Registry::from_values([("A", "x"), ("B", "${A}/y")]);
        let mut expander = Expander::new(&registry);
        let resolved = expander.expand("B");
        assert_eq!(resolved.value, "x/y");
        assert_eq!(resolved.deps, &deps(&["A"]));
    }

    #[test]
    fn transitive_dependencies() {
        let registry = Registry::from_values([("A", "x"), ("B", "${A}"), ("C", "${B}")]);
        let mut expander = Expander::new(&registry);
        assert_eq!(expander.expand("C").deps, &deps(&["A", "B"]));
        assert_eq!(expander.expand("C").value, "x");
    }

    #[test]
    fn expansion_is_memoized() {
        let registry = Registry::from_values([("A", "x"), ("B", "${A}${A}")]);
        let mut expander = Expander::new(&registry);
        assert_eq!(expander.state("B"), ExpansionState::NotStarted);

        let first = expander.expand("B");
        let (value, set) = (first.value.to_string(), first.deps.clone());
        assert_eq!(expander.state("B"), ExpansionState::Done);
        assert_eq!(expander.state("A"), ExpansionState::Done);

        let second = expander.expand("B");
        assert_eq!(second.value, value);
        assert_eq!(second.deps, &set);
        assert_eq!(value, "xx");
    }

    #[test]
    fn self_cycle_resolves_to_empty() {
        let registry = Registry::from_values([("A", "${A}")]);
        let mut expander = Expander::new(&registry);
        let resolved = expander.expand("A");
        assert_eq!(resolved.value, "");
        assert_eq!(resolved.deps, &deps(&["A"]));
    }

    #[test]
    fn self_cycle_keeps_surrounding_literals() {
        let registry = Registry::from_values([("path", "/bin:${path}:/usr/bin")]);
        let mut expander = Expander::new(&registry);
        assert_eq!(expander.expand("path").value, "/bin::/usr/bin");
    }

    #[test]
    fn mutual_cycle_first_visited_sees_empty() {
        let registry = Registry::from_values([("A", "a${B}"), ("B", "b${A}")]);
        let mut expander = Expander::new(&registry);
        expander.expand_all();

        // A is visited first: B sees A in progress (empty), A sees finished B
        assert_eq!(expander.expand("B").value, "b");
        assert_eq!(expander.expand("A").value, "ab");
        assert_eq!(expander.expand("A").deps, &deps(&["A", "B"]));
        assert_eq!(expander.expand("B").deps, &deps(&["A"]));
    }

    #[test]
    fn cycle_member_exposes_partial_deps() {
        // A has already gathered X when B reaches it mid-expansion
        let registry = Registry::from_values([("X", "x"), ("A", "${X}${B}"), ("B", "${A}")]);
        let mut expander = Expander::new(&registry);
        let resolved = expander.expand("A");
        assert_eq!(resolved.value, "x");
        assert_eq!(expander.expand("B").deps, &deps(&["A", "X"]));
    }

    #[test]
    fn unresolved_reference_is_dropped() {
        let registry = Registry::from_values([("A", "${missing}")]);
        let mut expander = Expander::new(&registry);
        let resolved = expander.expand("A");
        assert_eq!(resolved.value, "");
        assert!(resolved.deps.is_empty());
    }

    #[test]
    fn unknown_name_expands_to_empty() {
        let registry = Registry::from_values([("A", "x")]);
        let mut expander = Expander::new(&registry);
        assert_eq!(expander.expand("nope"), Resolved::EMPTY);
        assert_eq!(expander.state("nope"), ExpansionState::NotStarted);
    }

    #[test]
    fn expand_all_covers_every_variable() {
        let registry = Registry::from_values([
            ("prefix", "/usr/local"),
            ("execprefix", "${prefix}"),
            ("bindir", "${execprefix}/bin"),
        ]);
        let mut expander = Expander::new(&registry);
        let map = expander.expand_all();
        assert_eq!(map.len(), 3);
        assert_eq!(map["bindir"], deps(&["execprefix", "prefix"]));

        let records = expander.into_records();
        assert_eq!(records["bindir"].value(), "/usr/local/bin");
        assert!(records.values().all(|r| r.state() == ExpansionState::Done));
    }

    #[test]
    fn deep_chain_does_not_exhaust_the_stack() {
        const DEPTH: usize = 3_000;

        // A small stack makes any per-level recursion fail long before DEPTH
        let handle = std::thread::Builder::new()
            .stack_size(256 * 1024)
            .spawn(|| {
                let mut values = vec![("v0".to_string(), "root".to_string())];
                for i in 1..DEPTH {
                    values.push((format!("v{i}"), format!("${{v{}}}/{i}", i - 1)));
                }
                let registry = Registry::from_values(values);
                let mut expander = Expander::new(&registry);
                let resolved = expander.expand(&format!("v{}", DEPTH - 1));
                (resolved.value.len(), resolved.deps.len(), resolved.value.starts_with("root/1/2/"))
            })
            .unwrap();

        let (len, deps, prefix_ok) = handle.join().unwrap();
        assert_eq!(deps, DEPTH - 1);
        assert!(prefix_ok);
        assert!(len > DEPTH);
    }
}
