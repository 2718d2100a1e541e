//! Orderer - deterministic dependency order for emission
//!
//! Builds the graph A → B for every B in deps(A), groups strongly connected
//! components (Tarjan) into single units, then runs Kahn's algorithm over the
//! units with a min-heap so that ready units come out lexicographically.
//!
//! Names are numbered in sorted order before anything else happens, so the
//! output depends only on the contents of the registry and the dependency
//! sets, never on hash map iteration order.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::hash::BuildHasher;

use rustc_hash::FxHashMap;
use tracing::debug;

use super::expand::DependencySet;
use super::registry::Registry;

/// Names in dependency order: every dependency precedes its dependents.
///
/// Members of a cycle are emitted together, sorted by name.
pub fn order<S: BuildHasher>(registry: &Registry, deps: &HashMap<String, DependencySet, S>) -> Vec<String> {
    order_units(registry, deps).into_iter().flatten().collect()
}

/// Same as [`order`] but keeps each strongly connected unit grouped
pub fn order_units<S: BuildHasher>(
    registry: &Registry,
    deps: &HashMap<String, DependencySet, S>,
) -> Vec<Vec<String>> {
    let mut names: Vec<&str> = registry.names().collect();
    names.sort_unstable();

    let index: FxHashMap<&str, usize> = names.iter().enumerate().map(|(i, &n)| (n, i)).collect();

    // BTreeSet iteration is sorted, so successor lists come out ascending
    let adjacency: Vec<Vec<usize>> = names
        .iter()
        .map(|name| {
            deps.get(*name)
                .map(|set| set.iter().filter_map(|dep| index.get(dep.as_str()).copied()).collect())
                .unwrap_or_default()
        })
        .collect();

    let components = strongly_connected(&adjacency);
    let units = topological_units(&adjacency, &components);

    let cyclic = units.iter().filter(|unit| unit.len() > 1).count();
    debug!(variables = names.len(), units = units.len(), cyclic, "computed emission order");

    units
        .into_iter()
        .map(|unit| unit.into_iter().map(|i| names[i].to_string()).collect())
        .collect()
}

/// Kahn's algorithm over the condensation, smallest ready unit first
fn topological_units(adjacency: &[Vec<usize>], components: &Components) -> Vec<Vec<usize>> {
    let count = components.members.len();
    let mut in_degree = vec![0usize; count];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); count];

    for (node, successors) in adjacency.iter().enumerate() {
        let unit = components.unit_of[node];
        for &dep in successors {
            let dep_unit = components.unit_of[dep];
            if dep_unit != unit {
                dependents[dep_unit].push(unit);
            }
        }
    }

    // Several members of one unit may share a dependency unit; count each edge once
    for list in dependents.iter_mut() {
        list.sort_unstable();
        list.dedup();
        for &unit in list.iter() {
            in_degree[unit] += 1;
        }
    }

    // A unit's key is its smallest member, which is unique across units
    let key = |unit: usize| components.members[unit][0];

    let mut heap: BinaryHeap<Reverse<(usize, usize)>> = (0..count)
        .filter(|&unit| in_degree[unit] == 0)
        .map(|unit| Reverse((key(unit), unit)))
        .collect();

    let mut ordered = Vec::with_capacity(count);
    while let Some(Reverse((_, unit))) = heap.pop() {
        ordered.push(components.members[unit].clone());

        for &next in &dependents[unit] {
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                heap.push(Reverse((key(next), next)));
            }
        }
    }

    ordered
}

struct Components {
    /// unit id per node
    unit_of: Vec<usize>,
    /// sorted node ids per unit
    members: Vec<Vec<usize>>,
}

fn strongly_connected(adjacency: &[Vec<usize>]) -> Components {
    let mut state = TarjanState::new(adjacency);
    for node in 0..adjacency.len() {
        if state.index[node].is_none() {
            state.strong_connect(node);
        }
    }

    let mut unit_of = vec![0; adjacency.len()];
    for (unit, members) in state.components.iter_mut().enumerate() {
        members.sort_unstable();
        for &node in members.iter() {
            unit_of[node] = unit;
        }
    }

    Components {
        unit_of,
        members: state.components,
    }
}

struct TarjanState<'g> {
    adjacency: &'g [Vec<usize>],
    next_index: usize,
    index: Vec<Option<usize>>,
    lowlink: Vec<usize>,
    stack: Vec<usize>,
    on_stack: Vec<bool>,
    components: Vec<Vec<usize>>,
}

impl<'g> TarjanState<'g> {
    fn new(adjacency: &'g [Vec<usize>]) -> Self {
        let n = adjacency.len();
        Self {
            adjacency,
            next_index: 0,
            index: vec![None; n],
            lowlink: vec![0; n],
            stack: Vec::new(),
            on_stack: vec![false; n],
            components: Vec::new(),
        }
    }

    fn open(&mut self, node: usize) {
        self.index[node] = Some(self.next_index);
        self.lowlink[node] = self.next_index;
        self.next_index += 1;
        self.stack.push(node);
        self.on_stack[node] = true;
    }

    /// Tarjan's DFS from `root`, with the call stack kept as `(node, next edge)` frames
    fn strong_connect(&mut self, root: usize) {
        let adjacency = self.adjacency;
        let mut calls: Vec<(usize, usize)> = vec![(root, 0)];
        self.open(root);

        while let Some(top) = calls.last_mut() {
            let (node, edge) = *top;

            if let Some(&target) = adjacency[node].get(edge) {
                top.1 += 1;
                match self.index[target] {
                    None => {
                        self.open(target);
                        calls.push((target, 0));
                    }
                    Some(target_index) if self.on_stack[target] => {
                        self.lowlink[node] = self.lowlink[node].min(target_index);
                    }
                    Some(_) => {}
                }
                continue;
            }

            calls.pop();
            if let Some(&(parent, _)) = calls.last() {
                self.lowlink[parent] = self.lowlink[parent].min(self.lowlink[node]);
            }

            if Some(self.lowlink[node]) == self.index[node] {
                let mut component = Vec::new();
                while let Some(popped) = self.stack.pop() {
                    self.on_stack[popped] = false;
                    component.push(popped);
                    if popped == node {
                        break;
                    }
                }
                self.components.push(component);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Expander;

    fn ordered(values: &[(&str, &str)]) -> Vec<String> {
        let registry = Registry::from_values(values.iter().copied());
        let deps = Expander::new(&registry).expand_all();
        order(&registry, &deps)
    }

    #[test]
    fn chain_orders_dependencies_first() {
        assert_eq!(ordered(&[("C", "${B}"), ("B", "${A}"), ("A", "x")]), vec!["A", "B", "C"]);
    }

    #[test]
    fn independent_names_are_lexicographic() {
        assert_eq!(ordered(&[("zeta", "1"), ("alpha", "2"), ("mid", "3")]), vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn dependency_beats_lexicographic_order() {
        // "a" sorts first but needs "z"
        assert_eq!(ordered(&[("a", "${z}"), ("z", "1"), ("m", "2")]), vec!["m", "z", "a"]);
    }

    #[test]
    fn standard_install_dirs() {
        let order = ordered(&[
            ("prefix", "/usr/local"),
            ("execprefix", "${prefix}"),
            ("bindir", "${execprefix}/bin"),
            ("datarootdir", "${prefix}/share"),
            ("datadir", "${datarootdir}"),
            ("mandir", "${datarootdir}/man"),
        ]);
        assert_eq!(order, vec!["prefix", "datarootdir", "datadir", "execprefix", "bindir", "mandir"]);
    }

    #[test]
    fn mutual_cycle_is_one_sorted_unit() {
        let registry = Registry::from_values([("b", "${a}"), ("a", "${b}"), ("c", "${a}"), ("0", "x")]);
        let deps = Expander::new(&registry).expand_all();
        let units = order_units(&registry, &deps);
        assert_eq!(
            units,
            vec![vec!["0".to_string()], vec!["a".to_string(), "b".to_string()], vec!["c".to_string()]]
        );
    }

    #[test]
    fn self_cycle_is_emitted_once() {
        assert_eq!(ordered(&[("a", "${a}"), ("b", "${a}")]), vec!["a", "b"]);
    }

    #[test]
    fn unregistered_dependencies_are_ignored() {
        let registry = Registry::from_values([("a", "x")]);
        let mut deps: FxHashMap<String, DependencySet> = FxHashMap::default();
        deps.insert("a".to_string(), ["ghost".to_string()].into_iter().collect());
        deps.insert("ghost".to_string(), DependencySet::new());
        assert_eq!(order(&registry, &deps), vec!["a"]);
    }

    #[test]
    fn missing_dependency_entry_means_no_deps() {
        let registry = Registry::from_values([("b", "1"), ("a", "2")]);
        let deps: FxHashMap<String, DependencySet> = FxHashMap::default();
        assert_eq!(order(&registry, &deps), vec!["a", "b"]);
    }

    #[test]
    fn empty_registry() {
        let registry = Registry::new();
        let deps: FxHashMap<String, DependencySet> = FxHashMap::default();
        assert!(order(&registry, &deps).is_empty());
    }

    /// Run `f` on a thread whose stack is far too small for per-node recursion
    fn on_small_stack<T: Send + 'static>(f: impl FnOnce() -> T + Send + 'static) -> T {
        std::thread::Builder::new()
            .stack_size(256 * 1024)
            .spawn(f)
            .unwrap()
            .join()
            .unwrap()
    }

    fn name(i: usize) -> String {
        format!("v{i:05}")
    }

    #[test]
    fn deep_chain_is_ordered_without_recursion() {
        const DEPTH: usize = 20_000;

        let sequence = on_small_stack(|| {
            // Highest index first in declaration, lowest has no deps
            let registry = Registry::from_values((0..DEPTH).rev().map(|i| (name(i), "x")));
            let deps: FxHashMap<String, DependencySet> = (1..DEPTH)
                .map(|i| (name(i), [name(i - 1)].into_iter().collect()))
                .collect();
            order(&registry, &deps)
        });

        assert_eq!(sequence.len(), DEPTH);
        assert!(sequence.iter().enumerate().all(|(i, n)| *n == name(i)));
    }

    #[test]
    fn long_ring_is_a_single_unit() {
        const SIZE: usize = 20_000;

        let units = on_small_stack(|| {
            let registry = Registry::from_values((0..SIZE).map(|i| (name(i), "x")));
            let deps: FxHashMap<String, DependencySet> = (0..SIZE)
                .map(|i| (name(i), [name((i + 1) % SIZE)].into_iter().collect()))
                .collect();
            order_units(&registry, &deps)
        });

        assert_eq!(units.len(), 1);
        assert_eq!(units[0].len(), SIZE);
        assert_eq!(units[0][0], name(0));
    }
}
