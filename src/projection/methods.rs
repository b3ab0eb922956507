//! Cartographic projection methods.
//!
//! Every method converts between geographic radians `(lon, lat)` and
//! projected meters `(x, y)`. Longitudes relative to the central meridian
//! are wrapped into ±180° unless `+over` is given, the same way PROJ does it.

use super::params::{Ellipsoid, ProjParams};
use crate::{MapError, Result};
use std::f64::consts::{FRAC_PI_2, PI, TAU};

const EPS10: f64 = 1e-10;
const MAX_ITER: usize = 15;

/// Wraps a longitude into [-π, π]
pub fn adjlon(lon: f64) -> f64 {
    if lon.abs() <= PI {
        return lon;
    }
    lon - TAU * ((lon + PI) / TAU).floor()
}

/// Isometric latitude helper, see Snyder (7-10)
fn tsfn(phi: f64, e: f64) -> f64 {
    let sinphi = phi.sin();
    let con = e * sinphi;
    (0.5 * (FRAC_PI_2 - phi)).tan() / ((1.0 - con) / (1.0 + con)).powf(0.5 * e)
}

/// Inverse of [`tsfn`], see Snyder (7-9)
fn phi2(ts: f64, e: f64) -> Result<f64> {
    let half_e = 0.5 * e;
    let mut phi = FRAC_PI_2 - 2.0 * ts.atan();
    for _ in 0..MAX_ITER {
        let con = e * phi.sin();
        let dphi = FRAC_PI_2 - 2.0 * (ts * ((1.0 - con) / (1.0 + con)).powf(half_e)).atan() - phi;
        phi += dphi;
        if dphi.abs() <= EPS10 {
            return Ok(phi);
        }
    }
    Err(MapError::InvalidCoordinates(
        "latitude iteration did not converge".into(),
    ))
}

fn msfn(phi: f64, es: f64) -> f64 {
    let sinphi = phi.sin();
    phi.cos() / (1.0 - es * sinphi * sinphi).sqrt()
}

fn out_of_range(what: &str) -> MapError {
    MapError::InvalidCoordinates(format!("{} out of range", what))
}

/// Krüger series coefficients for the transverse Mercator
#[derive(Debug, Clone, Copy, PartialEq)]
struct Kruger {
    /// Rectifying radius
    a_hat: f64,
    alpha: [f64; 3],
    beta: [f64; 3],
    delta: [f64; 3],
}

impl Kruger {
    fn new(ellipsoid: &Ellipsoid) -> Self {
        let n = ellipsoid.f / (2.0 - ellipsoid.f);
        let n2 = n * n;
        let n3 = n2 * n;
        Self {
            a_hat: ellipsoid.a / (1.0 + n) * (1.0 + n2 / 4.0 + n2 * n2 / 64.0),
            alpha: [
                n / 2.0 - 2.0 * n2 / 3.0 + 5.0 * n3 / 16.0,
                13.0 * n2 / 48.0 - 3.0 * n3 / 5.0,
                61.0 * n3 / 240.0,
            ],
            beta: [
                n / 2.0 - 2.0 * n2 / 3.0 + 37.0 * n3 / 96.0,
                n2 / 48.0 + n3 / 15.0,
                17.0 * n3 / 480.0,
            ],
            delta: [
                2.0 * n - 2.0 * n2 / 3.0 - 2.0 * n3,
                7.0 * n2 / 3.0 - 8.0 * n3 / 5.0,
                56.0 * n3 / 15.0,
            ],
        }
    }

    /// Returns (ξ, η) scaled by the rectifying radius
    fn forward(&self, dlon: f64, lat: f64, e: f64) -> (f64, f64) {
        let sinphi = lat.sin();
        let t = (sinphi.atanh() - e * (e * sinphi).atanh()).sinh();
        let xi_p = t.atan2(dlon.cos());
        let eta_p = (dlon.sin() / (1.0 + t * t).sqrt()).atanh();

        let mut xi = xi_p;
        let mut eta = eta_p;
        for (j, alpha) in self.alpha.iter().enumerate() {
            let k = 2.0 * (j + 1) as f64;
            xi += alpha * (k * xi_p).sin() * (k * eta_p).cosh();
            eta += alpha * (k * xi_p).cos() * (k * eta_p).sinh();
        }
        (self.a_hat * xi, self.a_hat * eta)
    }

    /// Returns (Δλ, φ) from values scaled by the rectifying radius
    fn inverse(&self, xi: f64, eta: f64) -> (f64, f64) {
        let xi = xi / self.a_hat;
        let eta = eta / self.a_hat;

        let mut xi_p = xi;
        let mut eta_p = eta;
        for (j, beta) in self.beta.iter().enumerate() {
            let k = 2.0 * (j + 1) as f64;
            xi_p -= beta * (k * xi).sin() * (k * eta).cosh();
            eta_p -= beta * (k * xi).cos() * (k * eta).sinh();
        }

        let chi = (xi_p.sin() / eta_p.cosh()).asin();
        let dlon = eta_p.sinh().atan2(xi_p.cos());
        let mut lat = chi;
        for (j, delta) in self.delta.iter().enumerate() {
            let k = 2.0 * (j + 1) as f64;
            lat += delta * (k * chi).sin();
        }
        (dlon, lat)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Method {
    /// Geographic pass-through, projected values stay radians
    LongLat,
    Mercator {
        k0: f64,
    },
    EquidistantCylindrical {
        cos_lat_ts: f64,
        lat_0: f64,
    },
    TransverseMercator {
        k0: f64,
        series: Kruger,
        /// Northing of the latitude of origin
        origin_y: f64,
    },
    PolarStereographic {
        south: bool,
        /// Scale between `t` and `ρ`
        akm1: f64,
    },
}

/// A configured projection method
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionEngine {
    method: Method,
    ellipsoid: Ellipsoid,
    lon_0: f64,
    x_0: f64,
    y_0: f64,
    over: bool,
}

impl ProjectionEngine {
    pub fn from_params(params: &ProjParams) -> Result<Self> {
        let mut ellipsoid = params.ellipsoid()?;
        let mut lon_0 = params.angle("lon_0")?.unwrap_or(0.0);
        let lat_0 = params.angle("lat_0")?.unwrap_or(0.0);
        let mut x_0 = params.number("x_0")?.unwrap_or(0.0);
        let mut y_0 = params.number("y_0")?.unwrap_or(0.0);
        let k = params
            .number("k_0")?
            .or(params.number("k")?)
            .unwrap_or(1.0);
        if k <= 0.0 {
            return Err(MapError::Projection(format!("scale factor {} must be positive", k)));
        }

        let method = match params.proj() {
            "longlat" | "latlong" | "lonlat" | "latlon" => Method::LongLat,
            "merc" | "webmerc" => {
                if params.proj() == "webmerc" {
                    ellipsoid = Ellipsoid::sphere(ellipsoid.a);
                }
                let k0 = match params.angle("lat_ts")? {
                    Some(lat_ts) if lat_ts.abs() >= FRAC_PI_2 => {
                        return Err(MapError::Projection("+lat_ts must be below 90°".into()))
                    }
                    Some(lat_ts) => msfn(lat_ts, ellipsoid.es()),
                    None => k,
                };
                Method::Mercator { k0 }
            }
            "eqc" => {
                let lat_ts = params.angle("lat_ts")?.unwrap_or(0.0);
                let cos_lat_ts = lat_ts.cos();
                if cos_lat_ts <= 0.0 {
                    return Err(MapError::Projection("+lat_ts must be below 90°".into()));
                }
                Method::EquidistantCylindrical { cos_lat_ts, lat_0 }
            }
            "utm" | "tmerc" => {
                let mut k0 = k;
                if params.proj() == "utm" {
                    let zone = params
                        .number("zone")?
                        .ok_or_else(|| MapError::Projection("+proj=utm needs +zone".into()))?;
                    if zone.fract() != 0.0 || !(1.0..=60.0).contains(&zone) {
                        return Err(MapError::Projection(format!(
                            "UTM zone {} outside 1..=60",
                            zone
                        )));
                    }
                    lon_0 = ((zone - 1.0) * 6.0 - 180.0 + 3.0).to_radians();
                    k0 = 0.9996;
                    x_0 = 500_000.0;
                    y_0 = if params.has("south") { 10_000_000.0 } else { 0.0 };
                }
                let series = Kruger::new(&ellipsoid);
                let (origin_xi, _) = series.forward(0.0, lat_0, ellipsoid.e());
                Method::TransverseMercator {
                    k0,
                    series,
                    origin_y: k0 * origin_xi,
                }
            }
            "stere" | "ups" => {
                let south = if params.proj() == "ups" {
                    params.has("south")
                } else if (lat_0.abs() - FRAC_PI_2).abs() < EPS10 {
                    lat_0 < 0.0
                } else {
                    return Err(MapError::Projection(
                        "only the polar aspect of +proj=stere is supported".into(),
                    ));
                };
                if params.proj() == "ups" {
                    x_0 = 2_000_000.0;
                    y_0 = 2_000_000.0;
                }
                let k0 = if params.proj() == "ups" { 0.994 } else { k };
                let e = ellipsoid.e();
                let akm1 = match params.angle("lat_ts")? {
                    Some(lat_ts) if (lat_ts.abs() - FRAC_PI_2).abs() >= EPS10 => {
                        let phits = lat_ts.abs();
                        ellipsoid.a * msfn(phits, ellipsoid.es()) / tsfn(phits, e)
                    }
                    _ => {
                        2.0 * ellipsoid.a * k0
                            / ((1.0 + e).powf(1.0 + e) * (1.0 - e).powf(1.0 - e)).sqrt()
                    }
                };
                Method::PolarStereographic { south, akm1 }
            }
            other => {
                return Err(MapError::Projection(format!(
                    "unsupported projection '{}'",
                    other
                )))
            }
        };

        if method != Method::LongLat {
            params.check_units()?;
        }

        Ok(Self {
            method,
            ellipsoid,
            lon_0,
            x_0,
            y_0,
            over: params.has("over"),
        })
    }

    pub fn is_geographic(&self) -> bool {
        matches!(self.method, Method::LongLat)
    }

    pub fn ellipsoid(&self) -> Ellipsoid {
        self.ellipsoid
    }

    /// Geographic radians to projected meters
    pub fn project(&self, lon: f64, lat: f64) -> Result<(f64, f64)> {
        if !lon.is_finite() || !lat.is_finite() || lat.abs() > FRAC_PI_2 + EPS10 {
            return Err(out_of_range("latitude"));
        }
        let lat = lat.clamp(-FRAC_PI_2, FRAC_PI_2);
        let mut dlon = lon - self.lon_0;
        if !self.over {
            dlon = adjlon(dlon);
        }

        let a = self.ellipsoid.a;
        let e = self.ellipsoid.e();
        let (x, y) = match &self.method {
            Method::LongLat => return Ok((dlon + self.lon_0, lat)),
            Method::Mercator { k0 } => {
                if (lat.abs() - FRAC_PI_2).abs() <= EPS10 {
                    return Err(out_of_range("latitude"));
                }
                (a * k0 * dlon, -a * k0 * tsfn(lat, e).ln())
            }
            Method::EquidistantCylindrical { cos_lat_ts, lat_0 } => {
                (a * dlon * cos_lat_ts, a * (lat - lat_0))
            }
            Method::TransverseMercator {
                k0,
                series,
                origin_y,
            } => {
                if dlon.abs() >= FRAC_PI_2 {
                    return Err(out_of_range("longitude"));
                }
                let (xi, eta) = series.forward(dlon, lat, e);
                (k0 * eta, k0 * xi - origin_y)
            }
            Method::PolarStereographic { south, akm1 } => {
                let (lat, dlon) = if *south { (-lat, -dlon) } else { (lat, dlon) };
                if (lat + FRAC_PI_2).abs() <= EPS10 {
                    return Err(out_of_range("latitude"));
                }
                let rho = akm1 * tsfn(lat, e);
                let (x, y) = (rho * dlon.sin(), -rho * dlon.cos());
                if *south {
                    (-x, -y)
                } else {
                    (x, y)
                }
            }
        };
        Ok((x + self.x_0, y + self.y_0))
    }

    /// Projected meters to geographic radians
    pub fn unproject(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        if !x.is_finite() || !y.is_finite() {
            return Err(out_of_range("coordinate"));
        }
        if let Method::LongLat = self.method {
            let lon = if self.over { x } else { adjlon(x) };
            return Ok((lon, y));
        }

        let x = x - self.x_0;
        let y = y - self.y_0;
        let a = self.ellipsoid.a;
        let e = self.ellipsoid.e();

        let (dlon, lat) = match &self.method {
            Method::LongLat => unreachable!("handled above"),
            Method::Mercator { k0 } => {
                let lat = phi2((-y / (a * k0)).exp(), e)?;
                (x / (a * k0), lat)
            }
            Method::EquidistantCylindrical { cos_lat_ts, lat_0 } => {
                (x / (a * cos_lat_ts), y / a + lat_0)
            }
            Method::TransverseMercator {
                k0,
                series,
                origin_y,
            } => series.inverse((y + origin_y) / k0, x / k0),
            Method::PolarStereographic { south, akm1 } => {
                let (x, y) = if *south { (-x, -y) } else { (x, y) };
                let rho = x.hypot(y);
                let lat = phi2(rho / akm1, e)?;
                let dlon = if rho == 0.0 { 0.0 } else { x.atan2(-y) };
                if *south {
                    (-dlon, -lat)
                } else {
                    (dlon, lat)
                }
            }
        };

        if lat.abs() > FRAC_PI_2 + EPS10 {
            return Err(out_of_range("latitude"));
        }
        let mut lon = dlon + self.lon_0;
        if !self.over {
            lon = adjlon(lon);
        }
        Ok((lon, lat))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(def: &str) -> ProjectionEngine {
        ProjectionEngine::from_params(&ProjParams::parse(def).unwrap()).unwrap()
    }

    #[test]
    fn test_adjlon() {
        assert_eq!(adjlon(1.0), 1.0);
        assert!((adjlon(181f64.to_radians()) - (-179f64).to_radians()).abs() < 1e-12);
        assert!((adjlon(-181f64.to_radians()) - 179f64.to_radians()).abs() < 1e-12);
        assert!((adjlon(3.0 * TAU + 0.5) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_web_mercator_known_values() {
        let merc = engine("EPSG:3857");
        let (x, y) = merc.project(180f64.to_radians(), 0.0).unwrap();
        assert!((x - 20_037_508.342_789_244).abs() < 1e-3);
        assert!(y.abs() < 1e-6);

        let (_, y) = merc.project(0.0, 85.051_128_78f64.to_radians()).unwrap();
        assert!((y - 20_037_508.34).abs() < 1.0);
    }

    #[test]
    fn test_mercator_wraps_longitude() {
        let merc = engine("EPSG:3857");
        let (west, _) = merc.project((-181f64).to_radians(), 0.3).unwrap();
        let (east, _) = merc.project(179f64.to_radians(), 0.3).unwrap();
        assert!((west - east).abs() < 1e-6);

        let over = engine("+proj=merc +a=6378137 +b=6378137 +over");
        let (west, _) = over.project((-181f64).to_radians(), 0.3).unwrap();
        assert!(west < -20_037_508.0);
    }

    #[test]
    fn test_mercator_rejects_poles() {
        let merc = engine("+proj=merc +datum=WGS84");
        assert!(merc.project(0.0, FRAC_PI_2).is_err());
        assert!(merc.project(0.0, 2.0).is_err());
    }

    #[test]
    fn test_utm_known_value() {
        // Zone 32 central meridian at the equator
        let utm = engine("+proj=utm +zone=32 +datum=WGS84");
        let (x, y) = utm.project(9f64.to_radians(), 0.0).unwrap();
        assert!((x - 500_000.0).abs() < 1e-6);
        assert!(y.abs() < 1e-6);

        // Munich, checked against the Snyder series
        let (x, y) = utm
            .project(11.575f64.to_radians(), 48.137f64.to_radians())
            .unwrap();
        assert!((x - 691_567.33).abs() < 0.5, "easting {}", x);
        assert!((y - 5_334_734.33).abs() < 0.5, "northing {}", y);
    }

    #[test]
    fn test_round_trips() {
        let defs = [
            "EPSG:3857",
            "+proj=merc +datum=WGS84 +lat_ts=30",
            "+proj=eqc +lat_ts=45 +R=6371000",
            "+proj=utm +zone=33 +south +ellps=intl",
            "+proj=tmerc +lat_0=49 +lon_0=-2 +k=0.9996012717 +x_0=400000 +y_0=-100000 +ellps=WGS84",
            "EPSG:32661",
            "EPSG:32761",
            "+proj=stere +lat_0=90 +lat_ts=70 +lon_0=-45 +datum=WGS84",
            "EPSG:4326",
        ];
        let points: [(f64, f64); 4] = [(12.5, 47.3), (-3.0, -33.9), (0.5, 5.0), (-60.0, 75.0)];

        for def in defs {
            let proj = engine(def);
            for (lon, lat) in points {
                let (lon, lat) = (lon.to_radians(), lat.to_radians());
                let (x, y) = match proj.project(lon, lat) {
                    Ok(xy) => xy,
                    Err(_) => continue,
                };
                let (lon2, lat2) = proj.unproject(x, y).unwrap();
                assert!((lon2 - lon).abs() < 1e-8, "{}: lon {} vs {}", def, lon2, lon);
                assert!((lat2 - lat).abs() < 1e-8, "{}: lat {} vs {}", def, lat2, lat);
            }
        }
    }

    #[test]
    fn test_ups_pole_at_false_origin() {
        let ups = engine("EPSG:32661");
        let (x, y) = ups.project(0.0, FRAC_PI_2).unwrap();
        assert!((x - 2_000_000.0).abs() < 1e-6);
        assert!((y - 2_000_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_invalid_definitions() {
        let bad = [
            "+proj=utm +zone=61",
            "+proj=utm",
            "+proj=stere +lat_0=45",
            "+proj=lcc +lat_1=30",
            "+proj=merc +k=0",
        ];
        for def in bad {
            let params = ProjParams::parse(def).unwrap();
            assert!(ProjectionEngine::from_params(&params).is_err(), "{}", def);
        }
    }

    #[test]
    fn test_tsfn_phi2_inverse() {
        let e = Ellipsoid::WGS84.e();
        for lat in [-1.2, -0.4, 0.0, 0.7, 1.4] {
            let back = phi2(tsfn(lat, e), e).unwrap();
            assert!((back - lat).abs() < 1e-10);
        }
    }
}
