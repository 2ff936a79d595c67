use std::collections::HashMap;

use indexmap::IndexMap;
use nova_ioc_metadata::{MemberId, Value};
use nova_ioc_types::{key_matches, TypeEnv, TypeKey};

/// Where a repository row came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    Member(MemberId),
    /// Registered through `add_bean_to_context`.
    Manual,
    Property,
}

#[derive(Clone)]
pub struct Entry {
    pub value: Value,
    pub source: Source,
    pub primary: bool,
}

impl std::fmt::Debug for Entry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entry")
            .field("source", &self.source)
            .field("primary", &self.primary)
            .finish_non_exhaustive()
    }
}

/// Resolved values keyed by every key their provider supplies.
///
/// Only singleton results and manual registrations are stored; prototype
/// providers produce a fresh value per request and leave no row behind.
#[derive(Debug, Default)]
pub struct Repository {
    rows: IndexMap<TypeKey, Vec<Entry>>,
    executed: HashMap<MemberId, Value>,
}

impl Repository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value a singleton member already produced.
    pub fn executed(&self, member: MemberId) -> Option<&Value> {
        self.executed.get(&member)
    }

    /// Record a singleton result under each of `keys`. Returns the stored value,
    /// which is the earlier one if `member` already ran.
    pub fn persist(&mut self, member: MemberId, keys: &[TypeKey], value: Value, primary: bool) -> Value {
        if let Some(existing) = self.executed.get(&member) {
            return existing.clone();
        }
        self.executed.insert(member, value.clone());
        for key in keys {
            self.insert(
                key.clone(),
                Entry {
                    value: value.clone(),
                    source: Source::Member(member),
                    primary,
                },
            );
        }
        value
    }

    pub fn insert(&mut self, key: TypeKey, entry: Entry) {
        self.rows.entry(key).or_default().push(entry);
    }

    pub fn get(&self, key: &TypeKey) -> &[Entry] {
        self.rows.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Rows from `source` kinds satisfying `required`, in insertion order.
    pub fn matching<'a>(
        &'a self,
        env: &'a dyn TypeEnv,
        required: &'a TypeKey,
        source: impl Fn(Source) -> bool + 'a,
    ) -> impl Iterator<Item = &'a Entry> + 'a {
        self.rows
            .iter()
            .filter(move |(key, _)| key_matches(env, required, key))
            .flat_map(|(_, entries)| entries.iter())
            .filter(move |entry| source(entry.source))
    }

    pub fn len(&self) -> usize {
        self.rows.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
