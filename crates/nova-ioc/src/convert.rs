//! Conversion of raw property strings to declared types.

use std::str::FromStr;
use std::sync::Arc;

use anyhow::Context;
use nova_ioc_metadata::Value;
use nova_ioc_types::Type;

pub trait Converter: Send + Sync {
    fn accepts(&self, target: &Type) -> bool;
    fn convert(&self, raw: &str, target: &Type) -> anyhow::Result<Value>;
}

/// What a `Converter`-marked component's constructor returns.
pub type SharedConverter = Arc<dyn Converter>;

/// Parses into `T` when the target type is named `name`.
struct ParseConverter<T> {
    name: &'static str,
    _marker: std::marker::PhantomData<fn() -> T>,
}

impl<T> ParseConverter<T> {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: std::marker::PhantomData,
        }
    }
}

impl<T> Converter for ParseConverter<T>
where
    T: FromStr + Send + Sync + 'static,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    fn accepts(&self, target: &Type) -> bool {
        target.raw_name() == Some(self.name) && !target.is_parameterized()
    }

    fn convert(&self, raw: &str, _target: &Type) -> anyhow::Result<Value> {
        let value: T = raw
            .trim()
            .parse()
            .with_context(|| format!("`{raw}` is not a valid {}", self.name))?;
        Ok(Arc::new(value))
    }
}

/// Component converters first, then the built-ins.
#[derive(Clone)]
pub struct ConverterRegistry {
    custom: Vec<SharedConverter>,
    builtin: Vec<SharedConverter>,
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        let builtin: Vec<SharedConverter> = vec![
            Arc::new(ParseConverter::<String>::new("String")),
            Arc::new(ParseConverter::<bool>::new("bool")),
            Arc::new(ParseConverter::<i32>::new("i32")),
            Arc::new(ParseConverter::<i64>::new("i64")),
            Arc::new(ParseConverter::<u32>::new("u32")),
            Arc::new(ParseConverter::<u64>::new("u64")),
            Arc::new(ParseConverter::<usize>::new("usize")),
            Arc::new(ParseConverter::<f64>::new("f64")),
        ];
        Self {
            custom: Vec::new(),
            builtin,
        }
    }
}

impl ConverterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, converter: SharedConverter) {
        self.custom.push(converter);
    }

    pub fn find(&self, target: &Type) -> Option<SharedConverter> {
        self.custom
            .iter()
            .chain(self.builtin.iter())
            .find(|converter| converter.accepts(target))
            .cloned()
    }
}

impl std::fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConverterRegistry")
            .field("custom", &self.custom.len())
            .field("builtin", &self.builtin.len())
            .finish()
    }
}
