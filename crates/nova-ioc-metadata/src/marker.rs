//! Markers and the precomputed meta-marker closure.
//!
//! A custom marker may itself be marked by other markers (`@OnClick` marked
//! `@Handler`, `@Bean` marked `@Provides`). Instead of recursing at every query,
//! [`MarkerTable`] stores the transitive closure per registered marker and
//! recomputes it on registration. Built-in markers are leaves.

use std::collections::HashMap;

use indexmap::IndexSet;
use smol_str::SmolStr;

use crate::MetadataError;

pub mod builtin {
    pub const INJECT: &str = "Inject";
    pub const PROVIDES: &str = "Provides";
    pub const HANDLER: &str = "Handler";
    pub const SINGLETON: &str = "Singleton";
    pub const PROTOTYPE: &str = "Prototype";
    pub const PRIMARY: &str = "Primary";
    pub const OPTIONAL: &str = "Optional";
    pub const NAMED: &str = "Named";
    pub const PROPERTY: &str = "Property";
    pub const SERVICE: &str = "Service";
    pub const FACTORY: &str = "Factory";
    pub const CONVERTER: &str = "Converter";
    pub const RESOLVER: &str = "Resolver";

    pub const ALL: &[&str] = &[
        INJECT, PROVIDES, HANDLER, SINGLETON, PROTOTYPE, PRIMARY, OPTIONAL, NAMED, PROPERTY,
        SERVICE, FACTORY, CONVERTER, RESOLVER,
    ];

    pub fn is_builtin(name: &str) -> bool {
        ALL.contains(&name)
    }
}

/// One marker applied to a type, member or parameter, with its optional value
/// (`Named("primaryDb")`, `Property("db.url")`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MarkerUse {
    pub name: SmolStr,
    pub value: Option<SmolStr>,
}

impl MarkerUse {
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }

    pub fn with_value(name: impl Into<SmolStr>, value: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }

    pub fn inject() -> Self {
        Self::new(builtin::INJECT)
    }

    pub fn provides() -> Self {
        Self::new(builtin::PROVIDES)
    }

    pub fn named(qualifier: impl Into<SmolStr>) -> Self {
        Self::with_value(builtin::NAMED, qualifier)
    }

    pub fn property(name: impl Into<SmolStr>) -> Self {
        Self::with_value(builtin::PROPERTY, name)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MarkerTable {
    direct: HashMap<SmolStr, Vec<SmolStr>>,
    closure: HashMap<SmolStr, IndexSet<SmolStr>>,
}

impl MarkerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare `marker` as carrying `meta` markers.
    pub fn register(&mut self, marker: &str, meta: &[&str]) -> Result<(), MetadataError> {
        if builtin::is_builtin(marker) {
            return Err(MetadataError::BuiltinMarker {
                name: marker.into(),
            });
        }
        self.direct
            .entry(SmolStr::new(marker))
            .or_default()
            .extend(meta.iter().map(|m| SmolStr::new(m)));
        self.recompute();
        Ok(())
    }

    fn recompute(&mut self) {
        self.closure.clear();
        let names: Vec<SmolStr> = self.direct.keys().cloned().collect();
        for name in names {
            let mut seen = IndexSet::new();
            let mut stack = vec![name.clone()];
            while let Some(current) = stack.pop() {
                if !seen.insert(current.clone()) || builtin::is_builtin(&current) {
                    continue;
                }
                if let Some(metas) = self.direct.get(&current) {
                    stack.extend(metas.iter().rev().cloned());
                }
            }
            self.closure.insert(name, seen);
        }
    }

    /// Whether `name` is `marker` or (transitively) marked by it.
    pub fn implies(&self, name: &str, marker: &str) -> bool {
        if name == marker {
            return true;
        }
        self.closure
            .get(name)
            .is_some_and(|closure| closure.contains(marker))
    }

    pub fn is_marked_by(&self, uses: &[MarkerUse], marker: &str) -> bool {
        self.find(uses, marker).is_some()
    }

    /// First use in `uses` that is, or is marked by, `marker`.
    pub fn find<'a>(&self, uses: &'a [MarkerUse], marker: &str) -> Option<&'a MarkerUse> {
        uses.iter().find(|used| self.implies(&used.name, marker))
    }

    /// Value carried by the first use implying `marker`.
    pub fn value<'a>(&self, uses: &'a [MarkerUse], marker: &str) -> Option<&'a SmolStr> {
        self.find(uses, marker).and_then(|used| used.value.as_ref())
    }
}
