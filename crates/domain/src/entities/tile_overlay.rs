//! Tile overlay entity - Image tile layers over the base map

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;
use crate::value_objects::{OpaqueValue, OverlayId};

/// Lowest zoom level served by tile providers
pub const MIN_ZOOM_LEVEL: u8 = 0;

/// Highest zoom level served by tile providers
pub const MAX_ZOOM_LEVEL: u8 = 20;

/// A layer of image tiles addressed through a URL template
///
/// The template may contain `{x}`, `{y}`, `{z}` and `{scale}` placeholders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileOverlay {
    /// Unique identifier
    pub id: OverlayId,
    /// Tile URL template
    pub url_template: String,
    /// Lowest zoom level at which tiles are requested
    pub minimum_z: u8,
    /// Highest zoom level at which tiles are requested
    pub maximum_z: u8,
    /// Layer opacity in [0, 1]
    pub opacity: f64,
    /// Application payload, also available to templating callbacks
    #[serde(default)]
    pub data: OpaqueValue,
}

impl TileOverlay {
    /// Create a tile overlay covering all zoom levels
    #[must_use]
    pub fn new(url_template: impl Into<String>) -> Self {
        Self {
            id: OverlayId::new(),
            url_template: url_template.into(),
            minimum_z: MIN_ZOOM_LEVEL,
            maximum_z: MAX_ZOOM_LEVEL,
            opacity: 1.0,
            data: OpaqueValue::Null,
        }
    }

    /// Restrict the zoom range
    pub fn with_zoom_range(mut self, minimum_z: u8, maximum_z: u8) -> Result<Self, DomainError> {
        if minimum_z > maximum_z {
            return Err(DomainError::ValidationError(format!(
                "Tile overlay zoom range is empty: {minimum_z} > {maximum_z}"
            )));
        }
        self.minimum_z = minimum_z;
        self.maximum_z = maximum_z;
        Ok(self)
    }

    /// Set the opacity, clamped into [0, 1]
    #[must_use]
    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }

    /// Attach an application payload
    #[must_use]
    pub fn with_data(mut self, data: OpaqueValue) -> Self {
        self.data = data;
        self
    }

    /// Whether tiles are requested at the zoom level
    #[must_use]
    pub fn covers_zoom(&self, z: u8) -> bool {
        (self.minimum_z..=self.maximum_z).contains(&z)
    }

    /// Build the URL for one tile
    ///
    /// Returns `None` when the zoom level lies outside the layer's range.
    /// Column indices wrap around the world; rows outside the grid yield `None`.
    #[must_use]
    pub fn url_for_tile(&self, x: i64, y: i64, z: u8, scale: u8) -> Option<String> {
        if !self.covers_zoom(z) {
            return None;
        }
        let tiles_per_side = 1_i64.checked_shl(u32::from(z))?;
        if !(0..tiles_per_side).contains(&y) {
            return None;
        }
        let x = x.rem_euclid(tiles_per_side);

        Some(
            self.url_template
                .replace("{x}", &x.to_string())
                .replace("{y}", &y.to_string())
                .replace("{z}", &z.to_string())
                .replace("{scale}", &scale.max(1).to_string()),
        )
    }
}
