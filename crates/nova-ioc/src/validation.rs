//! Structural checks run before anything is instantiated.

use std::fmt;

use nova_ioc_metadata::{ClassMetadata, DependencyNode, InfraRole, MetadataRegistry, Scope};
use nova_ioc_types::{key_matches, TypeKey};

use crate::config::ValidationConfig;
use crate::resolver::SharedResolver;
use crate::{PropertySource, ValidationError};

pub const IOC_CYCLE: &str = "IOC_CYCLE";
pub const IOC_UNRESOLVED: &str = "IOC_UNRESOLVED";
pub const IOC_HANDLER_PARAM: &str = "IOC_HANDLER_PARAM";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub code: &'static str,
    pub message: String,
    /// Classes, members or keys the issue is about.
    pub implicated: Vec<String>,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if !self.implicated.is_empty() {
            write!(f, " ({})", self.implicated.join(", "))?;
        }
        Ok(())
    }
}

/// When a validation pass runs during bootstrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationPhase {
    /// Nothing is instantiated yet. Graph checks run here, along with the
    /// requirements of the resolver and converter components built first.
    Structure,
    /// Resolver and converter components exist and their resolvers are in
    /// [`ValidationContext::resolvers`]. Every other member is checked here.
    Components,
}

/// What validators may inspect besides the registry.
pub struct ValidationContext<'a> {
    pub registry: &'a MetadataRegistry,
    pub properties: &'a dyn PropertySource,
    /// Keys of beans registered in code before bootstrap.
    pub manual_keys: &'a [TypeKey],
    /// Resolvers supplied in code, plus component resolvers once they exist.
    pub resolvers: &'a [SharedResolver],
    pub phase: ValidationPhase,
}

/// Singleton resolver and converter components, built before anything else.
pub(crate) fn instantiated_early(class: &ClassMetadata) -> bool {
    matches!(class.role(), Some(InfraRole::Resolver | InfraRole::Converter))
        && class.scope() == Scope::Singleton
}

/// Called once per [`ValidationPhase`] during bootstrap.
pub trait Validator: Send + Sync {
    fn name(&self) -> &'static str;
    fn validate(&self, ctx: &ValidationContext<'_>) -> Vec<ValidationIssue>;
}

/// Fails when either dependency graph has a cycle.
#[derive(Debug, Default)]
pub struct CycleValidator;

impl Validator for CycleValidator {
    fn name(&self) -> &'static str {
        "cycles"
    }

    fn validate(&self, ctx: &ValidationContext<'_>) -> Vec<ValidationIssue> {
        if ctx.phase != ValidationPhase::Structure {
            return Vec::new();
        }
        let registry = ctx.registry;
        let mut issues = Vec::new();
        for cycle in registry.class_graph().cycles() {
            issues.push(ValidationIssue {
                code: IOC_CYCLE,
                message: "classes depend on each other".to_string(),
                implicated: cycle
                    .into_iter()
                    .map(|id| registry.class(id).name().to_string())
                    .collect(),
            });
        }
        for cycle in registry.member_graph().cycles() {
            issues.push(ValidationIssue {
                code: IOC_CYCLE,
                message: "members depend on each other".to_string(),
                implicated: cycle
                    .into_iter()
                    .map(|id| registry.member(id).to_string())
                    .collect(),
            });
        }
        issues
    }
}

/// Every non-optional requirement of an ordinary member must have a provider.
#[derive(Debug, Default)]
pub struct ResolvabilityValidator;

impl Validator for ResolvabilityValidator {
    fn name(&self) -> &'static str {
        "resolvability"
    }

    fn validate(&self, ctx: &ValidationContext<'_>) -> Vec<ValidationIssue> {
        let registry = ctx.registry;
        let mut issues = Vec::new();
        for member in registry.members() {
            if member.is_optional() || member.is_taskable() {
                continue;
            }
            let early = instantiated_early(registry.owner_of(member.id()));
            if early != (ctx.phase == ValidationPhase::Structure) {
                continue;
            }
            for dep in member.dependencies().iter().filter(|dep| !dep.optional) {
                let satisfied = match &dep.key {
                    TypeKey::Property(key) => ctx.properties.contains(key.name()),
                    key => {
                        registry
                            .providers_of(key)
                            .into_iter()
                            .any(|id| member.accepts_provider(dep, registry.member(id)))
                            || ctx
                                .manual_keys
                                .iter()
                                .any(|provided| key_matches(registry.store(), key, provided))
                            || ctx.resolvers.iter().any(|resolver| resolver.supports(key))
                    }
                };
                if !satisfied {
                    issues.push(ValidationIssue {
                        code: IOC_UNRESOLVED,
                        message: format!("`{member}` requires `{}` but nothing provides it", dep.key),
                        implicated: vec![member.to_string(), dep.key.to_string()],
                    });
                }
            }
        }
        issues
    }
}

/// Handler parameters must be more specific than the top type.
#[derive(Debug, Default)]
pub struct HandlerParamValidator;

impl Validator for HandlerParamValidator {
    fn name(&self) -> &'static str {
        "handler_params"
    }

    fn validate(&self, ctx: &ValidationContext<'_>) -> Vec<ValidationIssue> {
        if ctx.phase != ValidationPhase::Structure {
            return Vec::new();
        }
        ctx.registry
            .members()
            .iter()
            .filter(|member| member.is_taskable())
            .filter(|member| {
                member
                    .signature()
                    .params
                    .iter()
                    .any(|param| param.erasure().is_top())
            })
            .map(|member| ValidationIssue {
                code: IOC_HANDLER_PARAM,
                message: format!("handler `{member}` accepts any value"),
                implicated: vec![member.to_string()],
            })
            .collect()
    }
}

/// Runs every registered validator and fails with all issues at once.
pub struct ValidationService {
    validators: Vec<Box<dyn Validator>>,
}

impl Default for ValidationService {
    fn default() -> Self {
        Self::from_config(&ValidationConfig::default())
    }
}

impl ValidationService {
    pub fn empty() -> Self {
        Self {
            validators: Vec::new(),
        }
    }

    pub fn from_config(config: &ValidationConfig) -> Self {
        let mut service = Self::empty();
        if config.cycles {
            service.register(Box::new(CycleValidator));
        }
        if config.resolvability {
            service.register(Box::new(ResolvabilityValidator));
        }
        if config.handler_params {
            service.register(Box::new(HandlerParamValidator));
        }
        service
    }

    pub fn register(&mut self, validator: Box<dyn Validator>) {
        self.validators.push(validator);
    }

    pub fn validate(&self, ctx: &ValidationContext<'_>) -> Result<(), ValidationError> {
        let mut issues = Vec::new();
        for validator in &self.validators {
            let found = validator.validate(ctx);
            if !found.is_empty() {
                tracing::warn!(
                    target = "nova.ioc",
                    validator = validator.name(),
                    issues = found.len(),
                    "validation failed"
                );
            }
            issues.extend(found);
        }
        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }
}
