// Data encodings understood by the chart service

use crate::error::{ChartError, Result};
use crate::scale::{denormalize, normalize, Baseline, ValueRange, MAX_CODE};

/// One data series; `None` marks an absent value.
pub type Dataset = Vec<Option<f64>>;

/// Alphabet of the extended encoding, one character per base-64 digit
pub const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-.";

/// Extended code of an absent value
pub const MISSING_EXTENDED: &str = "__";

/// Text code of an absent value
pub const MISSING_TEXT: &str = "_";

/// Separator between values inside a text-encoded dataset
pub const VALUE_SEPARATOR: &str = ",";

/// Separator between datasets of either encoding unless configured otherwise
pub const DATASET_SEPARATOR: &str = "|";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// Two characters per value over 4096 codes
    Extended,
    /// Comma-separated decimals
    Text,
}

impl Encoding {
    /// Text is used when scaling is requested explicitly (`chds`) and for
    /// google-o-meter charts; everything else is extended.
    pub fn select(scaling_requested: bool, chart_type: Option<&str>) -> Self {
        if scaling_requested || chart_type == Some("gom") {
            Encoding::Text
        } else {
            Encoding::Extended
        }
    }

    pub fn prefix(&self) -> &'static str {
        match self {
            Encoding::Extended => "e:",
            Encoding::Text => "t:",
        }
    }
}

/// Encode all datasets into the value of the `chd` parameter.
///
/// Text datasets are always joined with `|`. Extended datasets use
/// `extended_separator`, which is also `|` unless configured.
pub fn encode(
    datasets: &[Dataset],
    range: &ValueRange,
    encoding: Encoding,
    baseline: Baseline,
    extended_separator: &str,
) -> Result<String> {
    let body = match encoding {
        Encoding::Text => datasets
            .iter()
            .map(|d| encode_text(d))
            .collect::<Vec<_>>()
            .join(DATASET_SEPARATOR),
        Encoding::Extended => datasets
            .iter()
            .map(|d| encode_extended(d, range, baseline))
            .collect::<Result<Vec<_>>>()?
            .join(extended_separator),
    };
    Ok(format!("{}{}", encoding.prefix(), body))
}

pub fn encode_text(values: &[Option<f64>]) -> String {
    values
        .iter()
        .map(|v| match v {
            Some(v) => format_number(*v),
            None => MISSING_TEXT.to_string(),
        })
        .collect::<Vec<_>>()
        .join(VALUE_SEPARATOR)
}

pub fn encode_extended(values: &[Option<f64>], range: &ValueRange, baseline: Baseline) -> Result<String> {
    let mut out = String::with_capacity(values.len() * 2);
    for value in values {
        match value {
            Some(v) => push_code(&mut out, normalize(*v, range, baseline)?),
            None => out.push_str(MISSING_EXTENDED),
        }
    }
    Ok(out)
}

fn push_code(out: &mut String, code: u16) {
    let code = usize::from(code.min(MAX_CODE));
    out.push(char::from(ALPHABET[code / 64]));
    out.push(char::from(ALPHABET[code % 64]));
}

/// Decode a single extended dataset back into approximate values.
pub fn decode_extended(encoded: &str, range: &ValueRange, baseline: Baseline) -> Result<Dataset> {
    let bytes = encoded.as_bytes();
    if bytes.len() % 2 != 0 {
        return Err(ChartError::InvalidEncoding(format!(
            "odd length {} in '{}'",
            bytes.len(),
            encoded
        )));
    }

    bytes
        .chunks(2)
        .map(|pair| {
            if pair == MISSING_EXTENDED.as_bytes() {
                return Ok(None);
            }
            let hi = digit(pair[0], encoded)?;
            let lo = digit(pair[1], encoded)?;
            Ok(Some(denormalize(hi * 64 + lo, range, baseline)))
        })
        .collect()
}

fn digit(byte: u8, encoded: &str) -> Result<u16> {
    ALPHABET
        .iter()
        .position(|&c| c == byte)
        .map(|p| p as u16)
        .ok_or_else(|| {
            ChartError::InvalidEncoding(format!(
                "'{}' is not an extended digit in '{}'",
                char::from(byte),
                encoded
            ))
        })
}

/// Shortest decimal form: integral values drop the fraction.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}
