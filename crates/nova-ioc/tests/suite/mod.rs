use std::any::Any;
use std::sync::Arc;

use anyhow::anyhow;
use nova_ioc::{BootstrapError, Container, ContainerBuilder};
use nova_ioc_metadata::{
    ConstructorDescriptor, FieldDescriptor, MarkerUse, MethodDescriptor, ParamDescriptor,
    TypeDescriptor, Value,
};
use parking_lot::Mutex;

mod bootstrap;
mod properties;

#[derive(Debug)]
pub(crate) struct Clock {
    pub(crate) id: usize,
}

/// Filled in by field injection and an `Inject` method.
#[derive(Debug, Default)]
pub(crate) struct Holder {
    pub(crate) clock: Mutex<Option<Arc<Clock>>>,
    pub(crate) started_with: Mutex<Option<usize>>,
}

pub(crate) fn clock_descriptor(id: usize) -> TypeDescriptor {
    TypeDescriptor::class("Clock").constructor(ctor(&[], move |_| Ok(value(Clock { id }))))
}

pub(crate) fn holder_descriptor() -> TypeDescriptor {
    TypeDescriptor::class("Holder")
        .constructor(ctor(&[], |_| Ok(value(Holder::default()))))
        .field(
            field("clock", "Clock", |instance, clock| {
                let holder = instance
                    .downcast_ref::<Holder>()
                    .ok_or_else(|| anyhow!("not a holder"))?;
                let clock = clock.downcast::<Clock>().map_err(|_| anyhow!("not a clock"))?;
                *holder.clock.lock() = Some(clock);
                Ok(())
            })
            .marker(MarkerUse::inject()),
        )
        .method(
            MethodDescriptor::new("start", params(&["Clock"]), None, |receiver, args| {
                let holder = receiver
                    .and_then(|r| r.downcast_ref::<Holder>())
                    .ok_or_else(|| anyhow!("not a holder"))?;
                *holder.started_with.lock() = Some(arg::<Clock>(args, 0)?.id);
                Ok(None)
            })
            .marker(MarkerUse::inject()),
        )
}

pub(crate) fn value<T: Any + Send + Sync>(value: T) -> Value {
    Arc::new(value)
}

pub(crate) fn arg<T: Any + Send + Sync>(args: &[Value], idx: usize) -> anyhow::Result<Arc<T>> {
    args.get(idx)
        .cloned()
        .ok_or_else(|| anyhow!("missing argument {idx}"))?
        .downcast::<T>()
        .map_err(|_| anyhow!("argument {idx} is not a {}", std::any::type_name::<T>()))
}

pub(crate) fn params(types: &[&str]) -> Vec<ParamDescriptor> {
    types
        .iter()
        .enumerate()
        .map(|(idx, ty)| ParamDescriptor::new(format!("p{idx}"), *ty))
        .collect()
}

/// Constructor producing `()`, for classes whose instances are never inspected.
pub(crate) fn unit_ctor(types: &[&str]) -> ConstructorDescriptor {
    ConstructorDescriptor::new(params(types), |_| Ok(value(())))
}

pub(crate) fn ctor(
    types: &[&str],
    f: impl Fn(&[Value]) -> anyhow::Result<Value> + Send + Sync + 'static,
) -> ConstructorDescriptor {
    ConstructorDescriptor::new(params(types), f)
}

pub(crate) fn provider(
    name: &str,
    types: &[&str],
    ret: &str,
    f: impl Fn(&[Value]) -> anyhow::Result<Value> + Send + Sync + 'static,
) -> MethodDescriptor {
    MethodDescriptor::new(name, params(types), Some(ret), move |_, args| f(args).map(Some))
}

pub(crate) fn field(
    name: &str,
    ty: &str,
    f: impl Fn(&Value, Value) -> anyhow::Result<()> + Send + Sync + 'static,
) -> FieldDescriptor {
    FieldDescriptor::new(name, ty, f)
}

pub(crate) fn build(descriptors: Vec<TypeDescriptor>) -> Result<Container, BootstrapError> {
    ContainerBuilder::new().descriptors(descriptors).build()
}

pub(crate) fn container(descriptors: Vec<TypeDescriptor>) -> Container {
    build(descriptors).unwrap()
}
