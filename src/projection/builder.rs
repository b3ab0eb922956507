//! Composes projection definitions for the common map grids and recognizes
//! them again, so a settings dialog can round-trip a stored definition.

use crate::projection::Projection;
use crate::Result;
use std::fmt::Write as _;

/// Geodetic datum as ellipsoid plus a 7 parameter shift to WGS84
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Datum {
    pub name: &'static str,
    pub a: f64,
    pub inv_flattening: f64,
    pub towgs84: [f64; 7],
}

impl Datum {
    pub const WGS84: Self = Self {
        name: "WGS_1984",
        a: 6_378_137.0,
        inv_flattening: 298.257_223_563,
        towgs84: [0.0; 7],
    };
    pub const ETRS89: Self = Self {
        name: "European_Terrestrial_Reference_System_1989",
        a: 6_378_137.0,
        inv_flattening: 298.257_222_101,
        towgs84: [0.0; 7],
    };
    pub const ED50: Self = Self {
        name: "European_Datum_1950",
        a: 6_378_388.0,
        inv_flattening: 297.0,
        towgs84: [-87.0, -98.0, -121.0, 0.0, 0.0, 0.0, 0.0],
    };
    pub const POTSDAM: Self = Self {
        name: "Deutsches_Hauptdreiecksnetz",
        a: 6_377_397.155,
        inv_flattening: 299.152_812_8,
        towgs84: [598.1, 73.7, 418.2, 0.202, 0.045, -2.455, 6.7],
    };
    pub const NAD27: Self = Self {
        name: "North_American_Datum_1927",
        a: 6_378_206.4,
        inv_flattening: 294.978_698_2,
        towgs84: [-8.0, 160.0, 176.0, 0.0, 0.0, 0.0, 0.0],
    };

    pub const ALL: [Self; 5] = [
        Self::WGS84,
        Self::ETRS89,
        Self::ED50,
        Self::POTSDAM,
        Self::NAD27,
    ];

    /// The `+a +b +towgs84 +units +no_defs` tail describing this datum
    pub fn definition(&self) -> String {
        let b = self.a * (1.0 - 1.0 / self.inv_flattening);
        let mut s = format!("+a={:.4} +b={:.4} +towgs84=", self.a, b);
        for (i, v) in self.towgs84.iter().enumerate() {
            if i > 0 {
                s.push(',');
            }
            let _ = write!(s, "{}", v);
        }
        s.push_str(" +units=m +no_defs");
        s
    }

    /// Finds the datum whose definition tail equals `tail`
    pub fn find(tail: &str) -> Option<Self> {
        let tail = tail.trim();
        Self::ALL.into_iter().find(|d| d.definition() == tail)
    }
}

/// The kinds of projections a user picks from
#[derive(Debug, Clone, PartialEq)]
pub enum ProjectionBuilder {
    /// Spherical Web Mercator, `EPSG:3857`
    WorldMercator,
    Mercator { datum: Datum },
    UpsNorth,
    UpsSouth,
    Utm { zone: u8, south: bool, datum: Datum },
    UserDefined { definition: String, datum: Option<Datum> },
}

impl ProjectionBuilder {
    /// Renders the definition string
    pub fn build(&self) -> String {
        match self {
            Self::WorldMercator => "EPSG:3857".to_string(),
            Self::UpsNorth => "EPSG:32661".to_string(),
            Self::UpsSouth => "EPSG:32761".to_string(),
            Self::Mercator { datum } => format!("+proj=merc {}", datum.definition()),
            Self::Utm { zone, south, datum } => format!(
                "+proj=utm +zone={} {}{}",
                zone,
                if *south { "+south " } else { "" },
                datum.definition()
            ),
            Self::UserDefined { definition, datum } => match datum {
                Some(datum) => format!("{} {}", definition.trim(), datum.definition()),
                None => definition.trim().to_string(),
            },
        }
    }

    /// Builds and validates the definition in one go
    pub fn projection(&self) -> Result<Projection> {
        Projection::new(&self.build())
    }

    /// Recognizes a stored definition.
    ///
    /// Anything that is not one of the fixed layouts comes back as
    /// [`ProjectionBuilder::UserDefined`].
    pub fn detect(definition: &str) -> Self {
        let text = definition.trim();
        match text {
            "EPSG:3857" => return Self::WorldMercator,
            "EPSG:32661" => return Self::UpsNorth,
            "EPSG:32761" => return Self::UpsSouth,
            _ => {}
        }

        if let Some(tail) = text.strip_prefix("+proj=merc ") {
            if let Some(datum) = Datum::find(tail) {
                return Self::Mercator { datum };
            }
        }

        if let Some(rest) = text.strip_prefix("+proj=utm +zone=") {
            if let Some((zone, tail)) = rest.split_once(' ') {
                let (south, tail) = match tail.strip_prefix("+south ") {
                    Some(tail) => (true, tail),
                    None => (false, tail),
                };
                if let (Ok(zone), Some(datum)) = (zone.parse::<u8>(), Datum::find(tail)) {
                    return Self::Utm { zone, south, datum };
                }
            }
        }

        Self::UserDefined {
            definition: text.to_string(),
            datum: None,
        }
    }
}
