//! Directive catalog.
//!
//! Every directive a chart body can contain is listed once in [`DIRECTIVES`]
//! with its arity and handler. Handlers receive already-resolved argument
//! values (`Null` for anything missing) and return the option entries to
//! merge; they never see the chart except for metadata directives.

use serde_json::Value;
use tracing::warn;

use crate::axis::{Axis, AxisTemplate, Side};
use crate::chart::ChartSpec;
use crate::data::parse_number;
use crate::encoding::format_number;
use crate::error::{ChartError, Result};
use crate::options::{OptionEntry, OptionValue};
use crate::palette;
use crate::resolve::Environment;
use crate::scale::ValueRange;

/// Unresolved directive argument
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Literal(Value),
    /// Dotted path into the environment
    Variable(String),
    List(Vec<Arg>),
}

/// Accepted argument counts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arity {
    pub min: usize,
    /// `None` for variadic directives
    pub max: Option<usize>,
}

impl Arity {
    pub const fn exactly(n: usize) -> Self {
        Self { min: n, max: Some(n) }
    }

    pub const fn between(min: usize, max: usize) -> Self {
        Self { min, max: Some(max) }
    }

    pub const fn at_least(min: usize) -> Self {
        Self { min, max: None }
    }

    pub fn check(&self, directive: &str, got: usize) -> Result<()> {
        if got < self.min {
            return Err(ChartError::TooFewArguments {
                directive: directive.to_string(),
                min: self.min,
                got,
            });
        }
        match self.max {
            Some(max) if got > max => Err(ChartError::TooManyArguments {
                directive: directive.to_string(),
                max,
                got,
            }),
            _ => Ok(()),
        }
    }
}

pub type OptionHandler = fn(&[Value]) -> Result<Vec<OptionEntry>>;
pub type AxisHandler = fn(&[Value]) -> Vec<(&'static str, AxisTemplate)>;
pub type MetadataHandler = fn(&mut ChartSpec, &[Value]) -> Result<()>;

/// What a directive acts on
#[derive(Clone, Copy)]
pub enum Handler {
    /// Appends one dataset per argument
    Data,
    /// Chart-level options
    Chart(OptionHandler),
    /// Options of the enclosing axis
    Axis(AxisHandler),
    /// Chart fields outside the option map
    Metadata(MetadataHandler),
}

impl std::fmt::Debug for Handler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            Handler::Data => "Data",
            Handler::Chart(_) => "Chart",
            Handler::Axis(_) => "Axis",
            Handler::Metadata(_) => "Metadata",
        };
        f.write_str(kind)
    }
}

#[derive(Debug)]
pub struct DirectiveDef {
    pub name: &'static str,
    pub arity: Arity,
    pub handler: Handler,
}

macro_rules! directive {
    ($name:literal, $arity:expr, $handler:expr) => {
        DirectiveDef {
            name: $name,
            arity: $arity,
            handler: $handler,
        }
    };
}

pub static DIRECTIVES: &[DirectiveDef] = &[
    directive!("chart-data", Arity::at_least(0), Handler::Data),
    directive!("chart-type", Arity::exactly(1), Handler::Chart(chart_type)),
    directive!("chart-data-scale", Arity::at_least(0), Handler::Chart(chart_data_scale)),
    directive!("chart-colors", Arity::at_least(0), Handler::Chart(chart_colors)),
    directive!("chart-auto-colors", Arity::exactly(2), Handler::Chart(chart_auto_colors)),
    directive!("chart-size", Arity::between(1, 2), Handler::Chart(chart_size)),
    directive!("chart-background", Arity::exactly(1), Handler::Chart(chart_background)),
    directive!("chart-fill", Arity::exactly(1), Handler::Chart(chart_fill)),
    directive!("chart-background-gradient", Arity::at_least(1), Handler::Chart(chart_background_gradient)),
    directive!("chart-fill-gradient", Arity::at_least(1), Handler::Chart(chart_fill_gradient)),
    directive!("chart-background-stripes", Arity::at_least(1), Handler::Chart(chart_background_stripes)),
    directive!("chart-fill-stripes", Arity::at_least(1), Handler::Chart(chart_fill_stripes)),
    directive!("chart-title", Arity::between(1, 3), Handler::Chart(chart_title)),
    directive!("chart-legend", Arity::at_least(0), Handler::Chart(chart_legend)),
    directive!("chart-labels", Arity::at_least(0), Handler::Chart(chart_labels)),
    directive!("chart-bar-width", Arity::between(1, 3), Handler::Chart(chart_bar_width)),
    directive!("chart-line-style", Arity::between(1, 3), Handler::Chart(chart_line_style)),
    directive!("chart-grid", Arity::between(2, 4), Handler::Chart(chart_grid)),
    directive!("chart-range-marker", Arity::exactly(4), Handler::Chart(chart_range_marker)),
    directive!("chart-fill-area", Arity::between(1, 3), Handler::Chart(chart_fill_area)),
    directive!("chart-marker", Arity::exactly(5), Handler::Chart(chart_marker)),
    directive!("chart-markers", Arity::exactly(2), Handler::Chart(chart_markers)),
    directive!("chart-map-area", Arity::exactly(1), Handler::Chart(chart_map_area)),
    directive!("chart-map-data", Arity::exactly(1), Handler::Chart(chart_map_data)),
    directive!("axis-labels", Arity::at_least(0), Handler::Axis(axis_labels)),
    directive!("axis-label-positions", Arity::at_least(0), Handler::Axis(axis_label_positions)),
    directive!("axis-range", Arity::exactly(2), Handler::Axis(axis_range)),
    directive!("axis-style", Arity::between(1, 3), Handler::Axis(axis_style)),
    directive!("chart-data-range", Arity::between(0, 2), Handler::Metadata(chart_data_range)),
    directive!("chart-alt", Arity::between(0, 1), Handler::Metadata(chart_alt)),
];

pub fn lookup(name: &str) -> Option<&'static DirectiveDef> {
    DIRECTIVES.iter().find(|def| def.name == name)
}

/// A directive call whose arity has been checked
#[derive(Debug, Clone)]
pub struct Invocation {
    def: &'static DirectiveDef,
    args: Vec<Arg>,
}

impl Invocation {
    pub fn new(name: &str, args: Vec<Arg>) -> Result<Self> {
        let def = lookup(name).ok_or_else(|| ChartError::UnknownDirective(name.to_string()))?;
        def.arity.check(name, args.len())?;
        Ok(Self { def, args })
    }

    pub fn name(&self) -> &'static str {
        self.def.name
    }

    pub fn handler(&self) -> Handler {
        self.def.handler
    }

    pub fn args(&self) -> &[Arg] {
        &self.args
    }
}

/// Body of an `axis` directive
#[derive(Debug, Clone)]
pub enum AxisBody {
    Options(Vec<Invocation>),
    Hidden,
}

#[derive(Debug, Clone)]
pub struct AxisDirective {
    side: Arg,
    body: AxisBody,
}

impl AxisDirective {
    /// Only `axis-*` options may appear inside an axis block.
    pub fn new(side: Arg, options: Vec<Invocation>) -> Result<Self> {
        if let Some(bad) = options.iter().find(|inv| !matches!(inv.handler(), Handler::Axis(_))) {
            return Err(ChartError::MisplacedDirective {
                directive: bad.name().to_string(),
                location: "inside an axis block",
            });
        }
        Ok(Self {
            side,
            body: AxisBody::Options(options),
        })
    }

    pub fn hidden(side: Arg) -> Self {
        Self {
            side,
            body: AxisBody::Hidden,
        }
    }

    /// Build the axis, or `None` when its side cannot be resolved.
    pub fn resolve(&self, env: &Environment) -> Option<Axis> {
        let side = match env.resolve(&self.side) {
            Value::Null => {
                warn!(side = ?self.side, "axis side is unresolved, skipping axis");
                return None;
            }
            value => Side::from_alias(&text(&value).unwrap_or_default()),
        };

        match &self.body {
            AxisBody::Hidden => Some(Axis::hidden(side)),
            AxisBody::Options(options) => {
                let mut axis = Axis::new(side);
                for inv in options {
                    if let Handler::Axis(handler) = inv.handler() {
                        for (key, template) in handler(&env.resolve_all(inv.args())) {
                            axis.set(key, template);
                        }
                    }
                }
                Some(axis)
            }
        }
    }
}

/// One statement of a chart body
#[derive(Debug, Clone)]
pub enum Directive {
    Data(Vec<Arg>),
    Option(Invocation),
    Axis(AxisDirective),
    Metadata(Invocation),
}

impl Directive {
    /// Build a chart-level directive. Axis options are rejected here; axes
    /// themselves are built through [`AxisDirective`].
    pub fn new(name: &str, args: Vec<Arg>) -> Result<Self> {
        let inv = Invocation::new(name, args)?;
        match inv.handler() {
            Handler::Data => Ok(Directive::Data(inv.args)),
            Handler::Chart(_) => Ok(Directive::Option(inv)),
            Handler::Metadata(_) => Ok(Directive::Metadata(inv)),
            Handler::Axis(_) => Err(ChartError::MisplacedDirective {
                directive: name.to_string(),
                location: "outside an axis block",
            }),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Directive::Data(_) => "chart-data",
            Directive::Option(inv) | Directive::Metadata(inv) => inv.name(),
            Directive::Axis(_) => "axis",
        }
    }
}

// ---------------------------------------------------------------------------
// Value helpers
// ---------------------------------------------------------------------------

static NULL: Value = Value::Null;

fn arg(args: &[Value], index: usize) -> &Value {
    args.get(index).unwrap_or(&NULL)
}

/// Wire text of a value; `None` for missing values.
pub fn text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(match (n.as_i64(), n.as_u64()) {
            (Some(i), _) => i.to_string(),
            (_, Some(u)) => u.to_string(),
            _ => format_number(n.as_f64().unwrap_or_default()),
        }),
        Value::Array(items) => Some(join(",", items.iter())),
        Value::Object(_) => Some(value.to_string()),
    }
}

/// Python-style truthiness
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Join the text of every present value.
fn join<'a>(separator: &str, values: impl IntoIterator<Item = &'a Value>) -> String {
    values
        .into_iter()
        .filter_map(text)
        .collect::<Vec<_>>()
        .join(separator)
}

fn flatten(values: &[Value]) -> Vec<Value> {
    let mut out = Vec::new();
    for value in values {
        match value {
            Value::Array(items) => out.extend(flatten(items)),
            other => out.push(other.clone()),
        }
    }
    out
}

fn literal(s: &str) -> Value {
    Value::String(s.to_string())
}

fn alias(value: &Value, table: &[(&str, &str)]) -> Value {
    match value {
        Value::String(s) => table
            .iter()
            .find(|(from, _)| *from == s.as_str())
            .map_or_else(|| value.clone(), |(_, to)| literal(to)),
        _ => value.clone(),
    }
}

// ---------------------------------------------------------------------------
// Chart options
// ---------------------------------------------------------------------------

const CHART_TYPES: &[(&str, &str)] = &[
    ("line", "lc"),
    ("sparkline", "lc"),
    ("xy", "lxy"),
    ("line-xy", "lxy"),
    ("bar", "bhg"),
    ("column", "bvg"),
    ("bar-stacked", "bhs"),
    ("column-stacked", "bvs"),
    ("bar-grouped", "bhg"),
    ("column-grouped", "bvg"),
    ("pie", "p"),
    ("pie-3d", "p3"),
    ("venn", "v"),
    ("scatter", "s"),
    ("google-o-meter", "gom"),
    ("map", "t"),
];

fn chart_type(args: &[Value]) -> Result<Vec<OptionEntry>> {
    Ok(text(&alias(arg(args, 0), CHART_TYPES))
        .map(|t| OptionEntry::set("cht", t))
        .into_iter()
        .collect())
}

fn chart_data_scale(args: &[Value]) -> Result<Vec<OptionEntry>> {
    Ok(vec![OptionEntry::merged("chds", join(",", args), ",")])
}

fn chart_colors(args: &[Value]) -> Result<Vec<OptionEntry>> {
    Ok(vec![OptionEntry::merged("chco", join(",", args), ",")])
}

fn chart_auto_colors(args: &[Value]) -> Result<Vec<OptionEntry>> {
    let Some(seed) = text(arg(args, 0)) else {
        return Ok(Vec::new());
    };
    let labels: Vec<String> = match arg(args, 1) {
        Value::Null => return Ok(Vec::new()),
        Value::String(s) => s.split(',').map(|l| l.trim().to_string()).collect(),
        Value::Array(items) => flatten(items).iter().filter_map(text).collect(),
        other => text(other).into_iter().collect(),
    };

    let ramp = palette::generate(&seed, &labels)?;
    Ok(vec![
        OptionEntry::set("chco", ramp.colors.join(",")),
        OptionEntry::internal("_final_color_map", OptionValue::ColorMap(ramp.labels)),
    ])
}

fn chart_size(args: &[Value]) -> Result<Vec<OptionEntry>> {
    let size = if truthy(arg(args, 1)) {
        match text(arg(args, 0)) {
            Some(width) => Some(format!("{}x{}", width, text(arg(args, 1)).unwrap_or_default())),
            None => {
                warn!(height = %arg(args, 1), "chart-size width is unresolved, skipping size");
                None
            }
        }
    } else {
        text(arg(args, 0))
    };
    Ok(size.map(|s| OptionEntry::set("chs", s)).into_iter().collect())
}

fn solid(kind: &str, args: &[Value]) -> Vec<OptionEntry> {
    vec![OptionEntry::merged(
        "chf",
        format!("{},s,{}", kind, text(arg(args, 0)).unwrap_or_default()),
        "|",
    )]
}

fn fancy(kind: &str, style: &str, args: &[Value]) -> Vec<OptionEntry> {
    let parts: Vec<Value> = [literal(kind), literal(style)]
        .into_iter()
        .chain(args.iter().cloned())
        .collect();
    vec![OptionEntry::merged("chf", join(",", &parts), "|")]
}

fn chart_background(args: &[Value]) -> Result<Vec<OptionEntry>> {
    Ok(solid("bg", args))
}

fn chart_fill(args: &[Value]) -> Result<Vec<OptionEntry>> {
    Ok(solid("c", args))
}

fn chart_background_gradient(args: &[Value]) -> Result<Vec<OptionEntry>> {
    Ok(fancy("bg", "lg", args))
}

fn chart_fill_gradient(args: &[Value]) -> Result<Vec<OptionEntry>> {
    Ok(fancy("c", "lg", args))
}

fn chart_background_stripes(args: &[Value]) -> Result<Vec<OptionEntry>> {
    Ok(fancy("bg", "ls", args))
}

fn chart_fill_stripes(args: &[Value]) -> Result<Vec<OptionEntry>> {
    Ok(fancy("c", "ls", args))
}

fn chart_title(args: &[Value]) -> Result<Vec<OptionEntry>> {
    let Some(title) = text(arg(args, 0)) else {
        return Ok(Vec::new());
    };
    let mut entries = vec![OptionEntry::set("chtt", title.replace('\n', "|"))];
    if truthy(arg(args, 1)) {
        let color = text(arg(args, 2)).unwrap_or_else(|| "000000".to_string());
        let size = text(arg(args, 1)).unwrap_or_default();
        entries.push(OptionEntry::set("chts", format!("{},{}", color, size)));
    }
    Ok(entries)
}

fn chart_legend(args: &[Value]) -> Result<Vec<OptionEntry>> {
    Ok(vec![OptionEntry::merged("chdl", join("|", &flatten(args)), "|")])
}

fn chart_labels(args: &[Value]) -> Result<Vec<OptionEntry>> {
    Ok(vec![OptionEntry::merged("chl", join("|", &flatten(args)), "|")])
}

fn chart_bar_width(args: &[Value]) -> Result<Vec<OptionEntry>> {
    Ok(vec![OptionEntry::set("chbh", join(",", args))])
}

fn chart_line_style(args: &[Value]) -> Result<Vec<OptionEntry>> {
    Ok(vec![OptionEntry::merged("chls", join(",", args), "|")])
}

fn chart_grid(args: &[Value]) -> Result<Vec<OptionEntry>> {
    Ok(vec![OptionEntry::set("chg", join(",", args))])
}

const RANGE_TYPES: &[(&str, &str)] = &[
    ("h", "r"),
    ("horiz", "r"),
    ("horizontal", "r"),
    ("v", "R"),
    ("vert", "R"),
    ("vertical", "R"),
];

fn chart_range_marker(args: &[Value]) -> Result<Vec<OptionEntry>> {
    let parts = [
        alias(arg(args, 0), RANGE_TYPES),
        arg(args, 1).clone(),
        literal("0"),
        arg(args, 2).clone(),
        arg(args, 3).clone(),
    ];
    Ok(vec![OptionEntry::merged("chm", join(",", &parts), "|")])
}

fn chart_fill_area(args: &[Value]) -> Result<Vec<OptionEntry>> {
    let start = args.get(1).cloned().unwrap_or(Value::from(0));
    let end = args.get(2).cloned().unwrap_or(Value::from(0));
    let fill_type = if truthy(&start) || truthy(&end) { "b" } else { "B" };
    let parts = [literal(fill_type), arg(args, 0).clone(), start, end, literal("0")];
    Ok(vec![OptionEntry::merged("chm", join(",", &parts), "|")])
}

const MARKER_TYPES: &[(&str, &str)] = &[
    ("arrow", "a"),
    ("cross", "c"),
    ("diamond", "d"),
    ("circle", "o"),
    ("square", "s"),
    ("line", "v"),
    ("full-line", "V"),
    ("h-line", "h"),
    ("horiz-line", "h"),
    ("horizontal-line", "h"),
];

fn chart_marker(args: &[Value]) -> Result<Vec<OptionEntry>> {
    let mut parts = vec![alias(arg(args, 0), MARKER_TYPES)];
    parts.extend(args.iter().skip(1).cloned());
    Ok(vec![OptionEntry::merged("chm", join(",", &parts), "|")])
}

/// `iterable` yields `(marker, color, point, size)` tuples.
fn chart_markers(args: &[Value]) -> Result<Vec<OptionEntry>> {
    let dataset = arg(args, 0);
    let Value::Array(items) = arg(args, 1) else {
        warn!("chart-markers expects a list of (marker, color, point, size)");
        return Ok(Vec::new());
    };

    let markers: Vec<String> = items
        .iter()
        .filter_map(|item| match item {
            Value::Array(fields) if fields.len() == 4 => {
                let parts = [
                    alias(&fields[0], MARKER_TYPES),
                    fields[1].clone(),
                    dataset.clone(),
                    fields[2].clone(),
                    fields[3].clone(),
                ];
                Some(join(",", &parts))
            }
            other => {
                warn!(entry = %other, "skipping malformed marker");
                None
            }
        })
        .collect();

    if markers.is_empty() {
        return Ok(Vec::new());
    }
    Ok(vec![OptionEntry::merged("chm", markers.join("|"), "|")])
}

fn chart_map_area(args: &[Value]) -> Result<Vec<OptionEntry>> {
    Ok(text(arg(args, 0))
        .map(|area| OptionEntry::set("chtm", area))
        .into_iter()
        .collect())
}

fn chart_map_data(args: &[Value]) -> Result<Vec<OptionEntry>> {
    let Value::Object(places) = arg(args, 0) else {
        warn!("chart-map-data expects a mapping of place -> value");
        return Ok(Vec::new());
    };
    let codes: String = places.keys().map(String::as_str).collect();
    let values = places.values().map(parse_number).collect();
    Ok(vec![
        OptionEntry::set("chld", codes),
        OptionEntry::internal("_mapdata", OptionValue::Series(values)),
    ])
}

// ---------------------------------------------------------------------------
// Axis options
// ---------------------------------------------------------------------------

/// `,a,b,...` over the present values
fn positional_suffix(values: &[Value]) -> String {
    values.iter().filter_map(text).map(|v| format!(",{}", v)).collect()
}

fn axis_labels(args: &[Value]) -> Vec<(&'static str, AxisTemplate)> {
    let labels = join("|", &flatten(args));
    vec![("chxl", AxisTemplate::new(format!(":|{}", labels)))]
}

fn axis_label_positions(args: &[Value]) -> Vec<(&'static str, AxisTemplate)> {
    vec![("chxp", AxisTemplate::new(positional_suffix(&flatten(args))))]
}

fn axis_range(args: &[Value]) -> Vec<(&'static str, AxisTemplate)> {
    match (text(arg(args, 0)), text(arg(args, 1))) {
        (Some(start), Some(end)) => vec![("chxr", AxisTemplate::new(format!(",{},{}", start, end)))],
        _ => {
            warn!("axis-range needs both a start and an end");
            Vec::new()
        }
    }
}

const ALIGNMENTS: &[(&str, &str)] = &[("left", "-1"), ("right", "1"), ("center", "0")];

fn axis_style(args: &[Value]) -> Vec<(&'static str, AxisTemplate)> {
    let parts = [arg(args, 0).clone(), arg(args, 1).clone(), alias(arg(args, 2), ALIGNMENTS)];
    vec![("chxs", AxisTemplate::new(positional_suffix(&parts)))]
}

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

fn chart_data_range(chart: &mut ChartSpec, args: &[Value]) -> Result<()> {
    let lower = arg(args, 0);
    if let (Some(min), Some(max)) = (parse_number(lower), parse_number(arg(args, 1))) {
        chart.set_data_range(Some(ValueRange::new(min, max)));
    } else if lower.as_str() == Some("auto") {
        chart.set_data_range(None);
    }
    Ok(())
}

fn chart_alt(chart: &mut ChartSpec, args: &[Value]) -> Result<()> {
    chart.set_alt(text(arg(args, 0)));
    Ok(())
}
