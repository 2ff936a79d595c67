//! Depth-based initialization order.
//!
//! ```text
//! depth(node) = required(node) + offset(node) + sum(depth(p) for p in providers(node))
//! ```
//!
//! `offset` is zero for infrastructure (service, factory, converter and
//! resolver classes) and otherwise the summed depth of every resolver class,
//! so ordinary components always come after the resolvers that may serve them.
//! Nodes are sorted by ascending depth. Equal depths (including depths that
//! saturate at `u64::MAX` on wide graphs) fall back to the dependency level,
//! the longest provider chain below a node, and then to declaration order.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use nova_ioc_metadata::{ClassId, DependencyGraph, InfraRole, MemberId, MetadataRegistry};

use crate::OrderingError;

pub struct OrderingService<'a> {
    registry: &'a MetadataRegistry,
}

impl<'a> OrderingService<'a> {
    pub fn new(registry: &'a MetadataRegistry) -> Self {
        Self { registry }
    }

    pub fn class_order(&self) -> Result<Vec<ClassId>, OrderingError> {
        let registry = self.registry;
        let order = order_by_depth(
            registry.class_graph(),
            &self.resolver_classes(),
            |id| registry.class(id).dependencies().len() as u64,
            |id| registry.class(id).is_infrastructure(),
            |id| registry.class(id).name().to_string(),
        )?;
        tracing::debug!(target = "nova.ioc", classes = order.len(), "computed class order");
        Ok(order)
    }

    pub fn member_order(&self) -> Result<Vec<MemberId>, OrderingError> {
        let registry = self.registry;
        let resolvers: Vec<MemberId> = self
            .resolver_classes()
            .into_iter()
            .map(|id| registry.class(id).constructor())
            .collect();
        let order = order_by_depth(
            registry.member_graph(),
            &resolvers,
            |id| registry.member(id).dependencies().len() as u64,
            |id| registry.owner_of(id).is_infrastructure(),
            |id| registry.member(id).to_string(),
        )?;
        tracing::debug!(target = "nova.ioc", members = order.len(), "computed member order");
        Ok(order)
    }

    /// Depth of every class, keyed by id.
    pub fn class_depths(&self) -> Result<HashMap<ClassId, u64>, OrderingError> {
        let registry = self.registry;
        compute_depths(
            registry.class_graph(),
            &self.resolver_classes(),
            |id| registry.class(id).dependencies().len() as u64,
            |id| registry.class(id).is_infrastructure(),
            |id| registry.class(id).name().to_string(),
        )
    }

    fn resolver_classes(&self) -> Vec<ClassId> {
        self.registry
            .classes()
            .iter()
            .filter(|class| class.role() == Some(InfraRole::Resolver))
            .map(|class| class.id())
            .collect()
    }
}

fn order_by_depth<N>(
    graph: &DependencyGraph<N>,
    resolvers: &[N],
    required: impl Fn(N) -> u64,
    infrastructure: impl Fn(N) -> bool,
    describe: impl Fn(N) -> String,
) -> Result<Vec<N>, OrderingError>
where
    N: Copy + Eq + Hash + fmt::Debug,
{
    let depths = compute_depths(graph, resolvers, required, infrastructure, describe)?;
    let mut levels = HashMap::new();
    let mut order: Vec<(u64, usize, N)> = graph
        .nodes()
        .map(|node| {
            let depth = depths.get(&node).copied().unwrap_or_default();
            (depth, level(graph, node, &mut levels), node)
        })
        .collect();
    // Stable: full ties keep graph (declaration) order.
    order.sort_by_key(|(depth, level, _)| (*depth, *level));
    Ok(order.into_iter().map(|(_, _, node)| node).collect())
}

/// Length of the longest provider chain below `node`. Strictly greater than
/// the level of every provider, so it never inverts a dependency edge.
fn level<N>(graph: &DependencyGraph<N>, node: N, memo: &mut HashMap<N, usize>) -> usize
where
    N: Copy + Eq + Hash + fmt::Debug,
{
    if let Some(level) = memo.get(&node) {
        return *level;
    }
    let providers: Vec<N> = graph.successors(node).collect();
    let level = providers
        .into_iter()
        .map(|provider| level(graph, provider, memo) + 1)
        .max()
        .unwrap_or(0);
    memo.insert(node, level);
    level
}

fn compute_depths<N>(
    graph: &DependencyGraph<N>,
    resolvers: &[N],
    required: impl Fn(N) -> u64,
    infrastructure: impl Fn(N) -> bool,
    describe: impl Fn(N) -> String,
) -> Result<HashMap<N, u64>, OrderingError>
where
    N: Copy + Eq + Hash + fmt::Debug,
{
    let on_cycle = graph.cycle_set();
    if !on_cycle.is_empty() {
        return Err(OrderingError::Cyclic {
            nodes: on_cycle.into_iter().map(describe).collect(),
        });
    }

    let mut depths = Depths {
        graph,
        required,
        infrastructure,
        offset: 0,
        memo: HashMap::new(),
    };
    // Resolvers are infrastructure, so their depths do not include the offset
    // they define. Everything is recomputed once the offset is known.
    let offset = resolvers
        .iter()
        .fold(0u64, |acc, node| acc.saturating_add(depths.depth(*node)));
    depths.memo.clear();
    depths.offset = offset;

    for node in graph.nodes() {
        depths.depth(node);
    }
    Ok(depths.memo)
}

struct Depths<'g, N, R, I> {
    graph: &'g DependencyGraph<N>,
    required: R,
    infrastructure: I,
    offset: u64,
    memo: HashMap<N, u64>,
}

impl<N, R, I> Depths<'_, N, R, I>
where
    N: Copy + Eq + Hash + fmt::Debug,
    R: Fn(N) -> u64,
    I: Fn(N) -> bool,
{
    fn depth(&mut self, node: N) -> u64 {
        if let Some(depth) = self.memo.get(&node) {
            return *depth;
        }
        let offset = if (self.infrastructure)(node) {
            0
        } else {
            self.offset
        };
        let providers: Vec<N> = self.graph.successors(node).collect();
        let mut depth = (self.required)(node).saturating_add(offset);
        for provider in providers {
            depth = depth.saturating_add(self.depth(provider));
        }
        self.memo.insert(node, depth);
        depth
    }
}
