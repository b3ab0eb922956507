//! Parsing of projection definition strings.
//!
//! Accepts the `+key=value` syntax used by PROJ and a handful of EPSG codes
//! that expand to such strings.

use crate::{MapError, Result};
use std::collections::HashMap;

/// Reference ellipsoid given by semi-major axis and flattening
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipsoid {
    pub a: f64,
    pub f: f64,
}

impl Ellipsoid {
    pub const WGS84: Self = Self::from_inverse_flattening(6_378_137.0, 298.257_223_563);
    pub const GRS80: Self = Self::from_inverse_flattening(6_378_137.0, 298.257_222_101);
    pub const INTL: Self = Self::from_inverse_flattening(6_378_388.0, 297.0);
    pub const BESSEL: Self = Self::from_inverse_flattening(6_377_397.155, 299.152_812_8);
    pub const CLRK66: Self = Self {
        a: 6_378_206.4,
        f: (6_378_206.4 - 6_356_583.8) / 6_378_206.4,
    };

    pub const fn from_inverse_flattening(a: f64, rf: f64) -> Self {
        Self { a, f: 1.0 / rf }
    }

    pub const fn sphere(radius: f64) -> Self {
        Self { a: radius, f: 0.0 }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "WGS84" => Some(Self::WGS84),
            "GRS80" => Some(Self::GRS80),
            "intl" => Some(Self::INTL),
            "bessel" => Some(Self::BESSEL),
            "clrk66" => Some(Self::CLRK66),
            "sphere" => Some(Self::sphere(6_370_997.0)),
            _ => None,
        }
    }

    /// Semi-minor axis
    pub fn b(&self) -> f64 {
        self.a * (1.0 - self.f)
    }

    /// First eccentricity squared
    pub fn es(&self) -> f64 {
        self.f * (2.0 - self.f)
    }

    /// First eccentricity
    pub fn e(&self) -> f64 {
        self.es().sqrt()
    }

    pub fn is_sphere(&self) -> bool {
        self.f == 0.0
    }
}

/// Expands the EPSG codes that have a fixed PROJ equivalent.
fn expand_epsg(code: &str) -> Result<String> {
    let n: u32 = code
        .trim()
        .parse()
        .map_err(|_| MapError::Projection(format!("invalid EPSG code '{}'", code)))?;

    let expanded = match n {
        3857 | 900913 => "+proj=merc +a=6378137 +b=6378137 +lat_ts=0 +lon_0=0 +x_0=0 +y_0=0 \
                          +k=1 +units=m +nadgrids=@null +wktext +no_defs"
            .to_string(),
        4326 => "+proj=longlat +datum=WGS84 +no_defs".to_string(),
        32661 => "+proj=stere +lat_0=90 +lat_ts=90 +lon_0=0 +k=0.994 +x_0=2000000 \
                  +y_0=2000000 +datum=WGS84 +units=m +no_defs"
            .to_string(),
        32761 => "+proj=stere +lat_0=-90 +lat_ts=-90 +lon_0=0 +k=0.994 +x_0=2000000 \
                  +y_0=2000000 +datum=WGS84 +units=m +no_defs"
            .to_string(),
        32601..=32660 => format!("+proj=utm +zone={} +datum=WGS84 +units=m +no_defs", n - 32600),
        32701..=32760 => format!(
            "+proj=utm +zone={} +south +datum=WGS84 +units=m +no_defs",
            n - 32700
        ),
        _ => {
            return Err(MapError::Projection(format!(
                "EPSG:{} is not supported",
                n
            )))
        }
    };
    Ok(expanded)
}

/// Tokenized projection definition
#[derive(Debug, Clone, PartialEq)]
pub struct ProjParams {
    proj: String,
    params: HashMap<String, Option<String>>,
}

impl ProjParams {
    pub fn parse(definition: &str) -> Result<Self> {
        let trimmed = definition.trim();
        if trimmed.is_empty() {
            return Err(MapError::Projection("empty projection definition".into()));
        }

        let expanded;
        let text = match trimmed
            .strip_prefix("EPSG:")
            .or_else(|| trimmed.strip_prefix("epsg:"))
        {
            Some(code) => {
                expanded = expand_epsg(code)?;
                expanded.as_str()
            }
            None => trimmed,
        };

        let mut params = HashMap::new();
        for token in text.split_whitespace() {
            let Some(body) = token.strip_prefix('+') else {
                return Err(MapError::Projection(format!(
                    "unexpected token '{}' in projection definition",
                    token
                )));
            };
            match body.split_once('=') {
                Some((key, value)) => params.insert(key.to_string(), Some(value.to_string())),
                None => params.insert(body.to_string(), None),
            };
        }

        let proj = match params.remove("proj") {
            Some(Some(name)) if !name.is_empty() => name,
            _ => {
                return Err(MapError::Projection(
                    "projection definition lacks +proj".into(),
                ))
            }
        };

        Ok(Self { proj, params })
    }

    /// Projection method name, e.g. `merc`
    pub fn proj(&self) -> &str {
        &self.proj
    }

    pub fn has(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    pub fn string(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(|v| v.as_deref())
    }

    pub fn number(&self, key: &str) -> Result<Option<f64>> {
        match self.params.get(key) {
            None => Ok(None),
            Some(None) => Err(MapError::Projection(format!("+{} needs a value", key))),
            Some(Some(value)) => value.parse::<f64>().map(Some).map_err(|_| {
                MapError::Projection(format!("+{}={} is not a number", key, value))
            }),
        }
    }

    /// Angle parameter in degrees, returned in radians
    pub fn angle(&self, key: &str) -> Result<Option<f64>> {
        Ok(self.number(key)?.map(f64::to_radians))
    }

    pub fn ellipsoid(&self) -> Result<Ellipsoid> {
        if let Some(radius) = self.number("R")? {
            return positive("R", radius).map(Ellipsoid::sphere);
        }

        let mut ellipsoid = match (self.string("ellps"), self.string("datum")) {
            (Some(name), _) => Ellipsoid::from_name(name)
                .ok_or_else(|| MapError::Projection(format!("unknown ellipsoid '{}'", name)))?,
            (None, Some("WGS84")) => Ellipsoid::WGS84,
            (None, Some(other)) => {
                return Err(MapError::Projection(format!("unknown datum '{}'", other)))
            }
            (None, None) => Ellipsoid::WGS84,
        };

        if let Some(a) = self.number("a")? {
            ellipsoid.a = positive("a", a)?;
            if self.number("b")?.is_none()
                && self.number("rf")?.is_none()
                && self.number("f")?.is_none()
            {
                // +a alone describes a sphere
                ellipsoid.f = 0.0;
            }
        }
        if let Some(b) = self.number("b")? {
            let b = positive("b", b)?;
            if b > ellipsoid.a {
                return Err(MapError::Projection("+b exceeds +a".into()));
            }
            ellipsoid.f = (ellipsoid.a - b) / ellipsoid.a;
        }
        if let Some(rf) = self.number("rf")? {
            ellipsoid.f = 1.0 / positive("rf", rf)?;
        }
        if let Some(f) = self.number("f")? {
            if !(0.0..1.0).contains(&f) {
                return Err(MapError::Projection(format!("+f={} out of range", f)));
            }
            ellipsoid.f = f;
        }
        Ok(ellipsoid)
    }

    /// Rejects linear units other than meters
    pub fn check_units(&self) -> Result<()> {
        match self.string("units") {
            None | Some("m") => Ok(()),
            Some(other) => Err(MapError::Projection(format!(
                "unsupported units '{}', only meters are allowed",
                other
            ))),
        }
    }
}

fn positive(key: &str, value: f64) -> Result<f64> {
    if value > 0.0 && value.is_finite() {
        Ok(value)
    } else {
        Err(MapError::Projection(format!("+{}={} must be positive", key, value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_values() {
        let params = ProjParams::parse("+proj=utm +zone=32 +south +datum=WGS84 +no_defs").unwrap();
        assert_eq!(params.proj(), "utm");
        assert_eq!(params.number("zone").unwrap(), Some(32.0));
        assert!(params.has("south"));
        assert!(params.has("no_defs"));
        assert_eq!(params.ellipsoid().unwrap(), Ellipsoid::WGS84);
    }

    #[test]
    fn test_epsg_expansion() {
        let web = ProjParams::parse("EPSG:3857").unwrap();
        assert_eq!(web.proj(), "merc");
        assert!(web.ellipsoid().unwrap().is_sphere());

        let utm = ProjParams::parse("EPSG:32733").unwrap();
        assert_eq!(utm.number("zone").unwrap(), Some(33.0));
        assert!(utm.has("south"));

        assert!(ProjParams::parse("EPSG:2056").is_err());
    }

    #[test]
    fn test_ellipsoid_from_axes() {
        let params = ProjParams::parse("+proj=merc +a=6378388.0000 +b=6356911.9461").unwrap();
        let e = params.ellipsoid().unwrap();
        assert!((e.a - 6_378_388.0).abs() < 1e-6);
        assert!((1.0 / e.f - 297.0).abs() < 1e-3);
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(ProjParams::parse("").is_err());
        assert!(ProjParams::parse("merc").is_err());
        assert!(ProjParams::parse("+zone=3").is_err());
        assert!(ProjParams::parse("+proj=merc +a=abc")
            .unwrap()
            .ellipsoid()
            .is_err());
        assert!(ProjParams::parse("+proj=merc +units=ft")
            .unwrap()
            .check_units()
            .is_err());
    }
}
