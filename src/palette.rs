// Color ramps for per-series coloring

use indexmap::IndexMap;

use crate::error::{ChartError, Result};

/// Color substituted for every inactive series of an isolated chart
pub const DEFAULT_INACTIVE_COLOR: &str = "eeeeee";

/// Saturation factor of the last swatch of a ramp
const DIM_SATURATION: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Hue, saturation and value, each in `0.0..=1.0`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsv {
    pub h: f64,
    pub s: f64,
    pub v: f64,
}

impl Rgb {
    /// Parse `rrggbb`, with or without a leading `#`.
    pub fn from_hex(hex: &str) -> Result<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ChartError::InvalidColor(hex.to_string()));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| ChartError::InvalidColor(hex.to_string()))
        };
        Ok(Self {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
        })
    }

    pub fn to_hex(&self) -> String {
        format!("{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    pub fn to_hsv(&self) -> Hsv {
        let r = f64::from(self.r) / 255.0;
        let g = f64::from(self.g) / 255.0;
        let b = f64::from(self.b) / 255.0;

        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let v = max;
        if max == min {
            return Hsv { h: 0.0, s: 0.0, v };
        }

        let delta = max - min;
        let s = delta / max;
        let rc = (max - r) / delta;
        let gc = (max - g) / delta;
        let bc = (max - b) / delta;
        let h = if r == max {
            bc - gc
        } else if g == max {
            2.0 + rc - bc
        } else {
            4.0 + gc - rc
        };

        Hsv {
            h: (h / 6.0).rem_euclid(1.0),
            s,
            v,
        }
    }
}

impl Hsv {
    pub fn to_rgb(&self) -> Rgb {
        let (r, g, b) = if self.s == 0.0 {
            (self.v, self.v, self.v)
        } else {
            let sector = (self.h * 6.0).floor();
            let f = self.h * 6.0 - sector;
            let p = self.v * (1.0 - self.s);
            let q = self.v * (1.0 - self.s * f);
            let t = self.v * (1.0 - self.s * (1.0 - f));
            match (sector as i64).rem_euclid(6) {
                0 => (self.v, t, p),
                1 => (q, self.v, p),
                2 => (p, self.v, t),
                3 => (p, q, self.v),
                4 => (t, p, self.v),
                _ => (self.v, p, q),
            }
        };

        let channel = |c: f64| (c * 255.0).round().clamp(0.0, 255.0) as u8;
        Rgb {
            r: channel(r),
            g: channel(g),
            b: channel(b),
        }
    }
}

/// Colors generated for a list of labels
#[derive(Debug, Clone, PartialEq)]
pub struct ColorRamp {
    /// One hex color per label, in label order (duplicates kept)
    pub colors: Vec<String>,
    /// Generated color -> label; a later label wins on collision
    pub labels: IndexMap<String, String>,
}

/// Derive one color per label from `seed`.
///
/// The first swatch keeps the seed's saturation, the last one is dimmed to
/// 20% of it, the others are evenly spaced in between. Hue and value are
/// those of the seed.
pub fn generate(seed: &str, labels: &[String]) -> Result<ColorRamp> {
    let base = Rgb::from_hex(seed)?.to_hsv();
    let n = labels.len();

    let colors: Vec<String> = (0..n)
        .map(|i| {
            let t = if n > 1 { i as f64 / (n - 1) as f64 } else { 0.0 };
            let factor = 1.0 - (1.0 - DIM_SATURATION) * t;
            let swatch = Hsv {
                h: base.h,
                s: (base.s * factor).clamp(0.0, base.s),
                v: base.v,
            };
            swatch.to_rgb().to_hex()
        })
        .collect();

    let labels = colors
        .iter()
        .cloned()
        .zip(labels.iter().cloned())
        .collect();

    Ok(ColorRamp { colors, labels })
}

/// Rewrite a `chco` value so only `active` keeps a real color.
///
/// Every occurrence of `active` takes the first color of the list; every
/// other color becomes `inactive`.
pub fn isolate(colors: &str, active: &str, inactive: &str) -> String {
    let first = colors.split(',').next().unwrap_or_default();
    colors
        .split(',')
        .map(|c| if c == active { first } else { inactive })
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_hex_round_trip() {
        let rgb = Rgb::from_hex("336699").unwrap();
        assert_eq!(rgb, Rgb { r: 0x33, g: 0x66, b: 0x99 });
        assert_eq!(rgb.to_hex(), "336699");
        assert_eq!(Rgb::from_hex("#0A0b0C").unwrap().to_hex(), "0a0b0c");
    }

    #[test]
    fn test_invalid_hex() {
        assert!(Rgb::from_hex("12345").is_err());
        assert!(Rgb::from_hex("zzzzzz").is_err());
        assert!(Rgb::from_hex("").is_err());
    }

    #[test]
    fn test_hsv_conversion() {
        let hsv = Rgb::from_hex("336699").unwrap().to_hsv();
        assert!((hsv.h - 210.0 / 360.0).abs() < 1e-9);
        assert!((hsv.s - 2.0 / 3.0).abs() < 1e-9);
        assert!((hsv.v - 0.6).abs() < 1e-9);
        assert_eq!(hsv.to_rgb().to_hex(), "336699");
    }

    #[test]
    fn test_hsv_primaries_and_grays() {
        for hex in ["ff0000", "00ff00", "0000ff", "ffff00", "00ffff", "ff00ff", "808080", "000000"] {
            assert_eq!(Rgb::from_hex(hex).unwrap().to_hsv().to_rgb().to_hex(), hex);
        }
    }

    #[test]
    fn test_generate_three_colors() {
        let ramp = generate("336699", &labels(&["a", "b", "c"])).unwrap();
        assert_eq!(ramp.colors.len(), 3);
        assert_eq!(ramp.colors[0], "336699");
        assert_eq!(ramp.colors[1], "5c7a99");
        assert_eq!(ramp.colors[2], "858f99");

        let last = Rgb::from_hex(&ramp.colors[2]).unwrap().to_hsv();
        assert!((last.s - 0.2 * 2.0 / 3.0).abs() < 0.01);

        assert_eq!(ramp.labels.len(), 3);
        let mapped: Vec<&str> = ramp.labels.values().map(|s| s.as_str()).collect();
        assert_eq!(mapped, vec!["a", "b", "c"]);
        assert_eq!(ramp.labels.get("336699").map(|s| s.as_str()), Some("a"));
    }

    #[test]
    fn test_generate_single_and_empty() {
        let one = generate("336699", &labels(&["only"])).unwrap();
        assert_eq!(one.colors, vec!["336699".to_string()]);

        let none = generate("336699", &[]).unwrap();
        assert!(none.colors.is_empty());
        assert!(none.labels.is_empty());
    }

    #[test]
    fn test_generate_collisions_keep_all_colors() {
        // a gray seed has no saturation to spread
        let ramp = generate("808080", &labels(&["a", "b", "c"])).unwrap();
        assert_eq!(ramp.colors, vec!["808080"; 3]);
        assert_eq!(ramp.labels.len(), 1);
        assert_eq!(ramp.labels.get("808080").map(|s| s.as_str()), Some("c"));
    }

    #[test]
    fn test_generate_rejects_bad_seed() {
        assert!(matches!(
            generate("blue", &labels(&["a"])),
            Err(ChartError::InvalidColor(_))
        ));
    }

    #[test]
    fn test_isolate() {
        assert_eq!(isolate("336699,5c7a99,858f99", "5c7a99", "eeeeee"), "eeeeee,336699,eeeeee");
        assert_eq!(isolate("336699,5c7a99", "336699", "eeeeee"), "336699,eeeeee");
    }
}
