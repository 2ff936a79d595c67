//! Dependency graphs and cycle detection.

use std::fmt;
use std::hash::Hash;

use indexmap::{IndexMap, IndexSet};
use nova_ioc_types::{key_matches, TypeEnv, TypeKey};

use crate::{ClassId, ClassMetadata, Dependency, DependencyRole, MemberId, MemberMetadata};

/// Something that requires and provides keys.
pub trait DependencyNode {
    type Id: Copy + Eq + Hash + fmt::Debug;

    fn node_id(&self) -> Self::Id;
    fn dependencies(&self) -> &[Dependency];
    fn provided_keys(&self) -> &[TypeKey];

    /// Extra restriction applied after key matching.
    fn accepts_provider(&self, _dependency: &Dependency, _provider: &Self) -> bool {
        true
    }
}

impl DependencyNode for MemberMetadata {
    type Id = MemberId;

    fn node_id(&self) -> MemberId {
        self.id()
    }

    fn dependencies(&self) -> &[Dependency] {
        MemberMetadata::dependencies(self)
    }

    fn provided_keys(&self) -> &[TypeKey] {
        self.provided_type_keys()
    }

    /// A constructor never depends on members of its own class, and a receiver
    /// is always the owner's own constructor.
    fn accepts_provider(&self, dependency: &Dependency, provider: &Self) -> bool {
        let same_owner = provider.owner() == self.owner();
        if self.is_constructor() && same_owner {
            return false;
        }
        match dependency.role {
            DependencyRole::Receiver => provider.is_constructor() && same_owner,
            DependencyRole::Param(_) | DependencyRole::Field => !provider.is_taskable(),
        }
    }
}

impl DependencyNode for ClassMetadata {
    type Id = ClassId;

    fn node_id(&self) -> ClassId {
        self.id()
    }

    fn dependencies(&self) -> &[Dependency] {
        ClassMetadata::dependencies(self)
    }

    fn provided_keys(&self) -> &[TypeKey] {
        self.provided_types()
    }
}

/// Directed graph where an edge `a -> b` means one of `a`'s requirements is
/// satisfied by `b`. Nodes and successors keep insertion order.
#[derive(Debug, Clone)]
pub struct DependencyGraph<N> {
    edges: IndexMap<N, IndexSet<N>>,
}

impl<N: Copy + Eq + Hash> Default for DependencyGraph<N> {
    fn default() -> Self {
        Self {
            edges: IndexMap::new(),
        }
    }
}

impl<N: Copy + Eq + Hash + fmt::Debug> DependencyGraph<N> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect every node to each other node providing a key it requires.
    pub fn from_nodes<'a, T>(env: &dyn TypeEnv, nodes: impl IntoIterator<Item = &'a T>) -> Self
    where
        T: DependencyNode<Id = N> + 'a,
    {
        let nodes: Vec<&T> = nodes.into_iter().collect();
        let mut graph = Self::new();
        for node in &nodes {
            graph.add_node(node.node_id());
        }
        for node in &nodes {
            for dep in node.dependencies() {
                for provider in &nodes {
                    if provider.node_id() == node.node_id() {
                        continue;
                    }
                    let provides = provider
                        .provided_keys()
                        .iter()
                        .any(|key| key_matches(env, &dep.key, key));
                    if provides && node.accepts_provider(dep, provider) {
                        graph.add_edge(node.node_id(), provider.node_id());
                    }
                }
            }
        }
        graph
    }

    pub fn add_node(&mut self, node: N) {
        self.edges.entry(node).or_default();
    }

    pub fn add_edge(&mut self, from: N, to: N) {
        self.add_node(to);
        self.edges.entry(from).or_default().insert(to);
    }

    pub fn contains(&self, node: N) -> bool {
        self.edges.contains_key(&node)
    }

    pub fn nodes(&self) -> impl Iterator<Item = N> + '_ {
        self.edges.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(IndexSet::len).sum()
    }

    /// Nodes that satisfy `node`'s requirements.
    pub fn successors(&self, node: N) -> impl Iterator<Item = N> + '_ {
        self.edges.get(&node).into_iter().flatten().copied()
    }

    pub fn has_edge(&self, from: N, to: N) -> bool {
        self.edges.get(&from).is_some_and(|succ| succ.contains(&to))
    }

    /// Every group of nodes that lie on a common cycle (strongly connected
    /// components with more than one node, or a single node with a self-loop).
    ///
    /// Groups are ordered by their first node, nodes within a group by
    /// insertion order.
    pub fn cycles(&self) -> Vec<Vec<N>> {
        let adjacency: Vec<Vec<usize>> = self
            .edges
            .values()
            .map(|succ| {
                succ.iter()
                    .filter_map(|n| self.edges.get_index_of(n))
                    .collect()
            })
            .collect();

        let mut groups: Vec<Vec<usize>> = strongly_connected(&adjacency)
            .into_iter()
            .filter(|scc| match scc.as_slice() {
                [single] => adjacency[*single].contains(single),
                _ => true,
            })
            .map(|mut scc| {
                scc.sort_unstable();
                scc
            })
            .collect();
        groups.sort_unstable_by_key(|scc| scc[0]);

        groups
            .into_iter()
            .map(|scc| {
                scc.into_iter()
                    .filter_map(|idx| self.edges.get_index(idx).map(|(n, _)| *n))
                    .collect()
            })
            .collect()
    }

    /// Every node that lies on some cycle, in insertion order.
    pub fn cycle_set(&self) -> IndexSet<N> {
        let mut nodes: Vec<(usize, N)> = self
            .cycles()
            .into_iter()
            .flatten()
            .filter_map(|n| self.edges.get_index_of(&n).map(|idx| (idx, n)))
            .collect();
        nodes.sort_unstable_by_key(|(idx, _)| *idx);
        nodes.into_iter().map(|(_, n)| n).collect()
    }

    pub fn has_cycle(&self) -> bool {
        !self.cycles().is_empty()
    }
}

/// Tarjan's strongly connected components over an adjacency list.
fn strongly_connected(edges: &[Vec<usize>]) -> Vec<Vec<usize>> {
    struct State {
        index: Vec<Option<usize>>,
        lowlink: Vec<usize>,
        on_stack: Vec<bool>,
        stack: Vec<usize>,
        next: usize,
        out: Vec<Vec<usize>>,
    }

    fn visit(node: usize, edges: &[Vec<usize>], st: &mut State) {
        st.index[node] = Some(st.next);
        st.lowlink[node] = st.next;
        st.next += 1;
        st.stack.push(node);
        st.on_stack[node] = true;

        for &next in &edges[node] {
            match st.index[next] {
                None => {
                    visit(next, edges, st);
                    st.lowlink[node] = st.lowlink[node].min(st.lowlink[next]);
                }
                Some(idx) if st.on_stack[next] => {
                    st.lowlink[node] = st.lowlink[node].min(idx);
                }
                Some(_) => {}
            }
        }

        if Some(st.lowlink[node]) == st.index[node] {
            let mut scc = Vec::new();
            while let Some(top) = st.stack.pop() {
                st.on_stack[top] = false;
                scc.push(top);
                if top == node {
                    break;
                }
            }
            st.out.push(scc);
        }
    }

    let mut st = State {
        index: vec![None; edges.len()],
        lowlink: vec![0; edges.len()],
        on_stack: vec![false; edges.len()],
        stack: Vec::new(),
        next: 0,
        out: Vec::new(),
    };
    for node in 0..edges.len() {
        if st.index[node].is_none() {
            visit(node, edges, &mut st);
        }
    }
    st.out
}
