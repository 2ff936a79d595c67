use std::sync::Arc;

use nova_ioc_metadata::{
    ConstructorDescriptor, FieldDescriptor, MetadataRegistry, MethodDescriptor, ParamDescriptor,
    RegistryConfig, TypeDescriptor, Value,
};

mod builder;
mod graphs;

pub(crate) fn params(types: &[&str]) -> Vec<ParamDescriptor> {
    types
        .iter()
        .enumerate()
        .map(|(idx, ty)| ParamDescriptor::new(format!("p{idx}"), *ty))
        .collect()
}

pub(crate) fn ctor(types: &[&str]) -> ConstructorDescriptor {
    ConstructorDescriptor::new(params(types), |_| Ok(Arc::new(()) as Value))
}

pub(crate) fn method(name: &str, types: &[&str], ret: Option<&str>) -> MethodDescriptor {
    MethodDescriptor::new(name, params(types), ret, |_, _| Ok(None))
}

pub(crate) fn field(name: &str, ty: &str) -> FieldDescriptor {
    FieldDescriptor::new(name, ty, |_, _| Ok(()))
}

pub(crate) fn registry(descriptors: Vec<TypeDescriptor>) -> MetadataRegistry {
    MetadataRegistry::build(RegistryConfig {
        descriptors,
        ..RegistryConfig::default()
    })
    .unwrap()
}
