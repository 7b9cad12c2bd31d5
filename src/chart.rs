use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, trace};

use crate::axis::AxisRegistry;
use crate::data::dataset_from_value;
use crate::directive::{Directive, Handler};
use crate::encoding::{encode, Dataset, Encoding};
use crate::error::{ChartError, Result};
use crate::options::{OptionMap, OptionValue};
use crate::palette::isolate;
use crate::query::urlencode;
use crate::resolve::Environment;
use crate::scale::ValueRange;
use crate::EncoderConfig;

const COLOR_MAP_KEY: &str = "_final_color_map";
const MAP_DATA_KEY: &str = "_mapdata";
const MAP_CHART_TYPE: &str = "t";

/// A chart being built from directives.
///
/// Cloning yields an independent chart: directives applied to the clone never
/// reach the original.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartSpec {
    options: OptionMap,
    datasets: Vec<Dataset>,
    axes: AxisRegistry,
    data_range: Option<ValueRange>,
    alt: Option<String>,
}

/// A finished chart image
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageRef {
    pub url: String,
    pub width: u32,
    pub height: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

/// Everything `finalize` produces
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rendered {
    pub image: ImageRef,
    /// One variant per label of a generated color ramp
    pub isolated: IndexMap<String, ImageRef>,
    /// Internal options, prefix stripped
    pub internals: IndexMap<String, Value>,
}

impl ChartSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one directive in source order.
    pub fn apply(&mut self, directive: &Directive, env: &Environment) -> Result<()> {
        trace!(directive = directive.name(), "applying directive");
        match directive {
            Directive::Data(args) => {
                self.datasets
                    .extend(args.iter().map(|arg| dataset_from_value(&env.resolve(arg))));
            }
            Directive::Option(inv) => {
                if let Handler::Chart(handler) = inv.handler() {
                    let entries = handler(&env.resolve_all(inv.args()))?;
                    self.options.apply_all(entries);
                }
            }
            Directive::Axis(axis) => {
                if let Some(axis) = axis.resolve(env) {
                    self.axes.register(axis);
                }
            }
            Directive::Metadata(inv) => {
                if let Handler::Metadata(handler) = inv.handler() {
                    handler(self, &env.resolve_all(inv.args()))?;
                }
            }
        }
        Ok(())
    }

    pub fn options(&self) -> &OptionMap {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut OptionMap {
        &mut self.options
    }

    pub fn datasets(&self) -> &[Dataset] {
        &self.datasets
    }

    pub fn axes(&self) -> &AxisRegistry {
        &self.axes
    }

    pub fn data_range(&self) -> Option<ValueRange> {
        self.data_range
    }

    /// `None` drops any earlier override so the range is inferred again.
    pub fn set_data_range(&mut self, range: Option<ValueRange>) {
        self.data_range = range;
    }

    pub fn alt(&self) -> Option<&str> {
        self.alt.as_deref()
    }

    pub fn set_alt(&mut self, alt: Option<String>) {
        self.alt = alt;
    }

    /// Build the chart URL and its side outputs. The chart itself is left
    /// untouched, so finalizing twice gives the same result.
    pub fn finalize(&self, config: &EncoderConfig) -> Result<Rendered> {
        let mut options = self.options.clone();
        options.set_default("cht", &config.default_type);
        options.set_default("chs", &config.default_size);

        let mut datasets = self.datasets.clone();
        if options.get_text("cht") == Some(MAP_CHART_TYPE) {
            if let Some(OptionValue::Series(values)) = options.get(MAP_DATA_KEY) {
                datasets.push(values.clone());
            }
        }

        // An explicit range still needs something to encode.
        if datasets.iter().flatten().all(Option::is_none) {
            return Err(ChartError::EmptyData);
        }
        let range = match self.data_range {
            Some(range) => range,
            None => ValueRange::from_datasets(&datasets)?,
        };
        let encoding = Encoding::select(options.contains_key("chds"), options.get_text("cht"));
        let chd = encode(
            &datasets,
            &range,
            encoding,
            config.baseline,
            &config.extended_separator,
        )?;
        debug!(?encoding, min = range.min, max = range.max, "encoded chart data");

        let axes = self.axes.render().map(|rendered| rendered.to_query());
        let (width, height) = parse_size(options.get_text("chs").unwrap_or(&config.default_size))?;
        let image_for = |options: &OptionMap| ImageRef {
            url: build_url(&config.base_url, options, &chd, axes.as_deref()),
            width,
            height,
            alt: self.alt.clone(),
        };

        let image = image_for(&options);

        let mut isolated = IndexMap::new();
        if let (Some(OptionValue::ColorMap(colors)), Some(chco)) =
            (options.get(COLOR_MAP_KEY), options.get_text("chco"))
        {
            for (color, label) in colors {
                let mut variant = options.clone();
                variant.set_text("chco", isolate(chco, color, &config.inactive_color));
                isolated.insert(label.clone(), image_for(&variant));
            }
        }

        let internals = options
            .internal()
            .map(|(name, value)| (name.to_string(), value.to_json()))
            .collect();

        Ok(Rendered {
            image,
            isolated,
            internals,
        })
    }
}

fn build_url(base: &str, options: &OptionMap, chd: &str, axes: Option<&str>) -> String {
    let mut url = format!("{}?{}&chd={}", base, urlencode(options.public()), chd);
    if let Some(axes) = axes {
        url.push('&');
        url.push_str(axes);
    }
    url
}

/// `WxH` into pixel dimensions
fn parse_size(size: &str) -> Result<(u32, u32)> {
    let invalid = || ChartError::InvalidSize(size.to_string());
    let (w, h) = size.split_once('x').ok_or_else(invalid)?;
    let width = w.trim().parse().map_err(|_| invalid())?;
    let height = h.trim().parse().map_err(|_| invalid())?;
    Ok((width, height))
}
