use std::collections::HashMap;

use serde_json::{Map, Value};
use tracing::debug;

use crate::chart::ChartSpec;
use crate::directive::Arg;

/// Values and stored charts visible to directive arguments
#[derive(Debug, Clone, Default)]
pub struct Environment {
    values: Map<String, Value>,
    charts: HashMap<String, ChartSpec>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_values(values: Map<String, Value>) -> Self {
        Self {
            values,
            charts: HashMap::new(),
        }
    }

    pub fn insert(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    pub fn extend(&mut self, values: Map<String, Value>) {
        self.values.extend(values);
    }

    /// Look up a dotted path: `series.0` indexes into lists, `a.b` into maps.
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let mut current = self.values.get(segments.next()?)?;
        for segment in segments {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Resolve one argument. Anything unresolvable becomes `Null`.
    pub fn resolve(&self, arg: &Arg) -> Value {
        match arg {
            Arg::Literal(value) => value.clone(),
            Arg::Variable(path) => match self.lookup(path) {
                Some(value) => value.clone(),
                None => {
                    debug!(variable = %path, "unresolved value, treating as missing");
                    Value::Null
                }
            },
            Arg::List(items) => Value::Array(items.iter().map(|item| self.resolve(item)).collect()),
        }
    }

    pub fn resolve_all(&self, args: &[Arg]) -> Vec<Value> {
        args.iter().map(|arg| self.resolve(arg)).collect()
    }

    pub fn store_chart(&mut self, name: &str, chart: ChartSpec) {
        self.charts.insert(name.to_string(), chart);
    }

    pub fn chart(&self, name: &str) -> Option<&ChartSpec> {
        self.charts.get(name)
    }
}
