//! Projection adapter between projected meters and geographic radians.
//!
//! A [`Projection`] is created from a definition string and converts against
//! the geographic reference (WGS84 longitude/latitude in radians). Once
//! created it is immutable and can be shared between threads.
//!
//! The underlying transform wraps longitudes outside ±180°, while a draw
//! context happily works with longitudes beyond the antimeridian. The
//! `rad_to_m*` conversions undo that wrap: a point west of -180° is projected
//! as its wrapped twin and then reflected across the projected -180°
//! meridian at the same latitude (and likewise for the east).

pub mod builder;
pub mod methods;
pub mod params;

use crate::core::geo::Point;
use crate::Result;
use methods::ProjectionEngine;
use params::ProjParams;
use std::f64::consts::PI;

pub use builder::{Datum, ProjectionBuilder};
pub use params::Ellipsoid;

/// Longitude excursion of a point relative to the antimeridian
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Excursion {
    None,
    West,
    East,
}

impl Excursion {
    fn of(lon: f64) -> Self {
        if lon < -PI {
            Excursion::West
        } else if lon > PI {
            Excursion::East
        } else {
            Excursion::None
        }
    }

    fn boundary(self) -> Option<f64> {
        match self {
            Excursion::None => None,
            Excursion::West => Some(-PI),
            Excursion::East => Some(PI),
        }
    }
}

/// A validated projection shared by converters
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    source: String,
    engine: ProjectionEngine,
}

impl Projection {
    pub fn new(definition: &str) -> Result<Self> {
        let params = ProjParams::parse(definition)?;
        let engine = ProjectionEngine::from_params(&params)?;
        Ok(Self {
            source: definition.to_string(),
            engine,
        })
    }

    /// Checks a definition and reports why it is rejected
    pub fn validate(definition: &str) -> Result<()> {
        Self::new(definition).map(|_| ())
    }

    /// The definition string exactly as it was given
    pub fn source(&self) -> &str {
        &self.source
    }

    /// True if "meters" of this projection are really radians
    pub fn is_geographic(&self) -> bool {
        self.engine.is_geographic()
    }

    pub fn ellipsoid(&self) -> Ellipsoid {
        self.engine.ellipsoid()
    }

    /// Meters to radians. Points the transform cannot handle become infinite.
    pub fn m_to_rad(&self, p: Point) -> Point {
        match self.engine.unproject(p.x, p.y) {
            Ok((lon, lat)) => Point::new(lon, lat),
            Err(_) => Point::new(f64::INFINITY, f64::INFINITY),
        }
    }

    pub fn m_to_rad_polygon(&self, poly: &mut [Point]) {
        for p in poly.iter_mut() {
            *p = self.m_to_rad(*p);
        }
    }

    /// Radians to meters as the transform does it, wrapping longitude
    pub fn rad_to_m_wrapped(&self, p: Point) -> Point {
        match self.engine.project(p.x, p.y) {
            Ok((x, y)) => Point::new(x, y),
            Err(_) => Point::new(f64::INFINITY, f64::INFINITY),
        }
    }

    /// Radians to meters keeping longitudes beyond ±180° continuous
    pub fn rad_to_m(&self, p: Point) -> Point {
        let excursion = Excursion::of(p.x);
        let raw = self.rad_to_m_wrapped(p);
        self.fix_excursion(raw, p.y, excursion)
    }

    /// Batch version of [`Projection::rad_to_m`].
    ///
    /// Every vertex keeps its own excursion, so a polygon may have vertices
    /// west of -180°, east of 180° and in between at the same time.
    pub fn rad_to_m_polygon(&self, poly: &mut [Point]) {
        let fixes: Vec<(Excursion, f64)> = poly
            .iter()
            .map(|p| (Excursion::of(p.x), p.y))
            .collect();

        for p in poly.iter_mut() {
            *p = self.rad_to_m_wrapped(*p);
        }

        for (p, (excursion, lat)) in poly.iter_mut().zip(fixes) {
            *p = self.fix_excursion(*p, lat, excursion);
        }
    }

    fn fix_excursion(&self, mut raw: Point, lat: f64, excursion: Excursion) -> Point {
        if let Some(boundary) = excursion.boundary() {
            let offset = self.rad_to_m_wrapped(Point::new(boundary, lat));
            raw.x = 2.0 * offset.x + raw.x;
        }
        raw
    }
}
