// Library exports for chartcode

pub mod axis;
pub mod chart;
pub mod data;
pub mod directive;
pub mod encoding;
pub mod error;
pub mod options;
pub mod palette;
pub mod parser;
pub mod query;
pub mod resolve;
pub mod runtime;
pub mod scale;

pub use chart::{ChartSpec, ImageRef, Rendered};
pub use error::{ChartError, ErrorKind};

use serde::{Deserialize, Serialize};

use crate::encoding::DATASET_SEPARATOR;
use crate::palette::DEFAULT_INACTIVE_COLOR;
use crate::scale::Baseline;

/// Settings shared by every chart of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncoderConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// `cht` when a chart declares no type
    #[serde(default = "default_type")]
    pub default_type: String,
    /// `chs` when a chart declares no size
    #[serde(default = "default_size")]
    pub default_size: String,
    #[serde(default = "default_inactive_color")]
    pub inactive_color: String,
    /// Joins extended-encoded datasets
    #[serde(default = "default_extended_separator")]
    pub extended_separator: String,
    #[serde(default)]
    pub baseline: Baseline,
}

fn default_base_url() -> String { "http://chart.apis.google.com/chart".to_string() }
fn default_type() -> String { "lc".to_string() }
fn default_size() -> String { "200x200".to_string() }
fn default_inactive_color() -> String { DEFAULT_INACTIVE_COLOR.to_string() }
fn default_extended_separator() -> String { DATASET_SEPARATOR.to_string() }

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            default_type: default_type(),
            default_size: default_size(),
            inactive_color: default_inactive_color(),
            extended_separator: default_extended_separator(),
            baseline: Baseline::default(),
        }
    }
}
