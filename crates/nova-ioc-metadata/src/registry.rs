use std::collections::HashMap;

use nova_ioc_types::{key_matches, TypeKey, TypeStore};
use smol_str::SmolStr;

use crate::builder::{build_store, index_descriptors, MetadataBuilder};
use crate::{
    ClassId, ClassMetadata, DependencyGraph, MarkerTable, MemberId, MemberMetadata, Result,
    TypeDescriptor,
};

/// Everything needed to build a [`MetadataRegistry`].
#[derive(Debug, Clone, Default)]
pub struct RegistryConfig {
    /// Base hierarchy (library types the descriptors extend). Descriptors are
    /// added on top of it.
    pub store: TypeStore,
    pub markers: MarkerTable,
    pub descriptors: Vec<TypeDescriptor>,
}

/// All class and member metadata for one container, plus both dependency
/// graphs. Built once and read-only afterwards.
#[derive(Debug)]
pub struct MetadataRegistry {
    store: TypeStore,
    markers: MarkerTable,
    classes: Vec<ClassMetadata>,
    class_index: HashMap<SmolStr, ClassId>,
    members: Vec<MemberMetadata>,
    /// Providers for every key some member requires.
    provider_index: HashMap<TypeKey, Vec<MemberId>>,
    member_graph: DependencyGraph<MemberId>,
    class_graph: DependencyGraph<ClassId>,
}

impl MetadataRegistry {
    pub fn build(config: RegistryConfig) -> Result<Self> {
        let RegistryConfig {
            store,
            markers,
            descriptors,
        } = config;

        let descriptors = index_descriptors(descriptors)?;
        let store = build_store(store, &descriptors)?;

        let mut classes = Vec::new();
        let mut members = Vec::new();
        {
            let builder = MetadataBuilder::new(&store, &markers, &descriptors);
            for desc in descriptors.values().filter(|d| d.kind.is_concrete()) {
                let id = ClassId(classes.len() as u32);
                classes.push(builder.build_class(id, desc, &mut members)?);
            }
        }

        let class_index = classes
            .iter()
            .map(|class| (class.name.clone(), class.id))
            .collect();

        let member_graph = DependencyGraph::from_nodes(&store, &members);
        let class_graph = DependencyGraph::from_nodes(&store, &classes);

        let mut provider_index: HashMap<TypeKey, Vec<MemberId>> = HashMap::new();
        for member in &members {
            for dep in &member.dependencies {
                if provider_index.contains_key(&dep.key) {
                    continue;
                }
                let providers = scan_providers(&store, &members, &dep.key);
                provider_index.insert(dep.key.clone(), providers);
            }
        }

        tracing::debug!(
            target = "nova.ioc",
            classes = classes.len(),
            members = members.len(),
            member_edges = member_graph.edge_count(),
            class_edges = class_graph.edge_count(),
            "built metadata registry"
        );

        Ok(Self {
            store,
            markers,
            classes,
            class_index,
            members,
            provider_index,
            member_graph,
            class_graph,
        })
    }

    pub fn store(&self) -> &TypeStore {
        &self.store
    }

    pub fn markers(&self) -> &MarkerTable {
        &self.markers
    }

    pub fn classes(&self) -> &[ClassMetadata] {
        &self.classes
    }

    pub fn class(&self, id: ClassId) -> &ClassMetadata {
        &self.classes[id.index()]
    }

    pub fn class_by_name(&self, name: &str) -> Option<&ClassMetadata> {
        self.class_index.get(name).map(|id| self.class(*id))
    }

    pub fn members(&self) -> &[MemberMetadata] {
        &self.members
    }

    pub fn member(&self, id: MemberId) -> &MemberMetadata {
        &self.members[id.index()]
    }

    pub fn owner_of(&self, member: MemberId) -> &ClassMetadata {
        self.class(self.member(member).owner())
    }

    /// Non-handler members providing a key that satisfies `key`, in
    /// declaration order.
    pub fn providers_of(&self, key: &TypeKey) -> Vec<MemberId> {
        match self.provider_index.get(key) {
            Some(providers) => providers.clone(),
            None => scan_providers(&self.store, &self.members, key),
        }
    }

    pub fn member_graph(&self) -> &DependencyGraph<MemberId> {
        &self.member_graph
    }

    pub fn class_graph(&self) -> &DependencyGraph<ClassId> {
        &self.class_graph
    }

    pub fn has_cycle_between_members(&self) -> bool {
        self.member_graph.has_cycle()
    }

    pub fn has_cycle_between_classes(&self) -> bool {
        self.class_graph.has_cycle()
    }
}

fn scan_providers(store: &TypeStore, members: &[MemberMetadata], key: &TypeKey) -> Vec<MemberId> {
    members
        .iter()
        .filter(|member| !member.is_taskable())
        .filter(|member| {
            member
                .provided_type_keys()
                .iter()
                .any(|provided| key_matches(store, key, provided))
        })
        .map(MemberMetadata::id)
        .collect()
}
