//! Member-kind resolvers: how a provider member is actually invoked once its
//! arguments are resolved.

use anyhow::{anyhow, bail};
use nova_ioc_metadata::{MemberInvoker, MemberKind, MemberMetadata, Value};

/// A member ready to run.
pub struct Invocation<'a> {
    pub member: &'a MemberMetadata,
    /// Owning instance for non-static methods.
    pub receiver: Option<Value>,
    pub args: Vec<Value>,
}

pub trait MemberResolver: Send + Sync {
    fn name(&self) -> &str;
    fn applies(&self, member: &MemberMetadata) -> bool;
    fn invoke(&self, invocation: Invocation<'_>) -> anyhow::Result<Value>;
}

#[derive(Debug, Default)]
pub struct ConstructorResolver;

impl MemberResolver for ConstructorResolver {
    fn name(&self) -> &str {
        "constructor"
    }

    fn applies(&self, member: &MemberMetadata) -> bool {
        member.kind() == MemberKind::Constructor
    }

    fn invoke(&self, invocation: Invocation<'_>) -> anyhow::Result<Value> {
        match invocation.member.invoker() {
            MemberInvoker::Constructor(invoker) => invoker.call(&invocation.args),
            _ => bail!("`{}` is not a constructor", invocation.member),
        }
    }
}

#[derive(Debug, Default)]
pub struct ProviderMethodResolver;

impl MemberResolver for ProviderMethodResolver {
    fn name(&self) -> &str {
        "provider method"
    }

    fn applies(&self, member: &MemberMetadata) -> bool {
        member.kind() == MemberKind::Method && member.flags().provider
    }

    fn invoke(&self, invocation: Invocation<'_>) -> anyhow::Result<Value> {
        let MemberInvoker::Method(invoker) = invocation.member.invoker() else {
            bail!("`{}` is not a method", invocation.member);
        };
        invoker
            .call(invocation.receiver.as_ref(), &invocation.args)?
            .ok_or_else(|| anyhow!("provider `{}` returned no value", invocation.member))
    }
}
