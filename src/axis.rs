use indexmap::IndexMap;

use crate::query::urlencode;

/// Chart side an axis is drawn on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
    Top,
    Bottom,
    /// Code passed through verbatim
    Other(String),
}

impl Side {
    /// Normalize a human-readable side name. Unknown names pass through.
    pub fn from_alias(name: &str) -> Self {
        match name {
            "left" | "y" => Side::Left,
            "right" | "r" => Side::Right,
            "top" | "t" => Side::Top,
            "bottom" | "x" => Side::Bottom,
            other => Side::Other(other.to_string()),
        }
    }

    pub fn code(&self) -> &str {
        match self {
            Side::Left => "y",
            Side::Right => "r",
            Side::Top => "t",
            Side::Bottom => "x",
            Side::Other(code) => code,
        }
    }
}

/// Axis option value waiting for its axis position.
///
/// Every axis parameter starts with the axis index, so a template is only
/// the remainder after that index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisTemplate {
    suffix: String,
}

impl AxisTemplate {
    pub fn new(suffix: impl Into<String>) -> Self {
        Self { suffix: suffix.into() }
    }

    pub fn render(&self, position: usize) -> String {
        format!("{}{}", position, self.suffix)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    pub side: Side,
    options: IndexMap<String, AxisTemplate>,
}

impl Axis {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            options: IndexMap::new(),
        }
    }

    /// Axis with blank style and empty labels
    pub fn hidden(side: Side) -> Self {
        let mut axis = Self::new(side);
        axis.set("chxs", AxisTemplate::new(",000000,11,0,_"));
        axis.set("chxl", AxisTemplate::new(":||"));
        axis
    }

    pub fn set(&mut self, key: &str, template: AxisTemplate) {
        self.options.insert(key.to_string(), template);
    }

    pub fn get(&self, key: &str) -> Option<&AxisTemplate> {
        self.options.get(key)
    }

    pub fn options(&self) -> impl Iterator<Item = (&str, &AxisTemplate)> {
        self.options.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Axis parameters after position substitution
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedAxes {
    /// Side codes in declaration order (`chxt`)
    pub sides: String,
    /// Per-key values joined with `|` in declaration order
    pub options: IndexMap<String, String>,
}

impl RenderedAxes {
    pub fn to_query(&self) -> String {
        let mut pairs = vec![("chxt", self.sides.as_str())];
        pairs.extend(self.options.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        urlencode(pairs)
    }
}

/// Axes in declaration order; an axis' position is its index here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AxisRegistry {
    axes: Vec<Axis>,
}

impl AxisRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `axis` and return its position.
    pub fn register(&mut self, axis: Axis) -> usize {
        self.axes.push(axis);
        self.axes.len() - 1
    }

    pub fn axes(&self) -> &[Axis] {
        &self.axes
    }

    pub fn len(&self) -> usize {
        self.axes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.axes.is_empty()
    }

    /// `None` when no axis was declared. Axes that never set a key
    /// contribute nothing to that key's value.
    pub fn render(&self) -> Option<RenderedAxes> {
        if self.axes.is_empty() {
            return None;
        }

        let sides = self
            .axes
            .iter()
            .map(|axis| axis.side.code())
            .collect::<Vec<_>>()
            .join(",");

        let mut per_key: IndexMap<String, Vec<String>> = IndexMap::new();
        for (position, axis) in self.axes.iter().enumerate() {
            for (key, template) in axis.options() {
                per_key
                    .entry(key.to_string())
                    .or_default()
                    .push(template.render(position));
            }
        }

        let options = per_key
            .into_iter()
            .map(|(key, values)| (key, values.join("|")))
            .collect();

        Some(RenderedAxes { sides, options })
    }
}
