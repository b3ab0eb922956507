//! Configuration for a draw context
//!
//! The configuration is plain data that an application persists between
//! sessions (last projection, scale table choice). It loads from and saves
//! to JSON.

use crate::core::constants::{DEFAULT_RESIZE_WAIT_MS, DEFAULT_ZOOM_INDEX};
use crate::core::events::RedrawFlags;
use crate::core::geo::Point;
use crate::core::scales::ScalesType;
use crate::{MapError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DrawContextConfig {
    /// Name used in log output and for the worker thread
    pub name: String,
    /// Redraw bits this context reacts to
    pub redraw_mask: RedrawFlags,
    pub scales: ScalesType,
    pub initial_zoom: usize,
    /// Projection definition applied on creation
    pub projection: Option<String>,
    /// Upper bound `resize` waits for an in-flight render
    pub resize_wait_ms: u64,
    /// Meters to pixel axis orientation before zoom is applied
    pub base_scale: Point,
}

impl Default for DrawContextConfig {
    fn default() -> Self {
        Self {
            name: "map".to_string(),
            redraw_mask: RedrawFlags::MAP,
            scales: ScalesType::Default,
            initial_zoom: DEFAULT_ZOOM_INDEX,
            projection: None,
            resize_wait_ms: DEFAULT_RESIZE_WAIT_MS,
            base_scale: Point::new(1.0, -1.0),
        }
    }
}

impl DrawContextConfig {
    pub fn new(name: impl Into<String>, redraw_mask: RedrawFlags) -> Self {
        Self {
            name: name.into(),
            redraw_mask,
            ..Default::default()
        }
    }

    pub fn with_projection(mut self, projection: impl Into<String>) -> Self {
        self.projection = Some(projection.into());
        self
    }

    pub fn with_scales(mut self, scales: ScalesType) -> Self {
        self.scales = scales;
        self
    }

    pub fn with_initial_zoom(mut self, idx: usize) -> Self {
        self.initial_zoom = idx;
        self
    }

    pub fn with_resize_wait(mut self, wait: Duration) -> Self {
        self.resize_wait_ms = wait.as_millis() as u64;
        self
    }

    pub fn resize_wait(&self) -> Duration {
        Duration::from_millis(self.resize_wait_ms)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| MapError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_scale.x == 0.0 || self.base_scale.y == 0.0 || !self.base_scale.is_finite() {
            return Err(MapError::Config(format!(
                "base scale must be finite and non-zero, got {:?}",
                self.base_scale
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DrawContextConfig::default();
        assert_eq!(config.initial_zoom, 5);
        assert_eq!(config.resize_wait(), Duration::from_millis(100));
        assert_eq!(config.base_scale, Point::new(1.0, -1.0));
        assert!(config.projection.is_none());
    }

    #[test]
    fn test_json_partial_document() {
        let config = DrawContextConfig::from_json_str(
            r#"{ "name": "dem", "redraw_mask": 2, "scales": "square", "projection": "EPSG:3857" }"#,
        )
        .unwrap();

        assert_eq!(config.name, "dem");
        assert_eq!(config.redraw_mask, RedrawFlags::DEM);
        assert_eq!(config.scales, ScalesType::Square);
        assert_eq!(config.projection.as_deref(), Some("EPSG:3857"));
        assert_eq!(config.initial_zoom, 5);
    }

    #[test]
    fn test_json_rejects_unknown_fields() {
        let err = DrawContextConfig::from_json_str(r#"{ "zoomz": 3 }"#).unwrap_err();
        assert!(matches!(err, MapError::Config(_)));
    }

    #[test]
    fn test_json_rejects_zero_scale() {
        let err =
            DrawContextConfig::from_json_str(r#"{ "base_scale": { "x": 0.0, "y": 1.0 } }"#)
                .unwrap_err();
        assert!(matches!(err, MapError::Config(_)));
    }

    #[test]
    fn test_round_trip_through_json() {
        let config = DrawContextConfig::new("gis", RedrawFlags::GIS)
            .with_projection("+proj=utm +zone=32 +datum=WGS84")
            .with_scales(ScalesType::Square);
        let json = config.to_json_string().unwrap();
        assert_eq!(DrawContextConfig::from_json_str(&json).unwrap(), config);
    }
}
