//! Map entity - The interactive view container
//!
//! The map owns its annotations, overlays and tile overlays and is the only
//! place where their membership and selection change. The viewport is kept
//! as a center map point plus a scale in pixels per map unit, from which the
//! visible region and screen conversions are derived.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::annotation::Annotation;
use super::overlay::Overlay;
use super::tile_overlay::TileOverlay;
use crate::errors::DomainError;
use crate::projection;
use crate::value_objects::{
    AnnotationId, Coordinate, CoordinateRegion, FeatureVisibility, MapPoint, MapRect, OverlayId,
    Padding, ScreenPoint, ViewportSize,
};

/// Edge length of a map tile in pixels at zoom level 0
const TILE_SIZE: f64 = 256.0;

/// Smallest scale in pixels per map unit
const MIN_SCALE: f64 = 16.0;

/// Largest scale in pixels per map unit, zoom level 22
const MAX_SCALE: f64 = TILE_SIZE * 4_194_304.0;

/// Base map imagery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MapType {
    /// Street map
    #[default]
    Standard,
    /// Street map with subdued colors
    MutedStandard,
    /// Satellite imagery with roads and labels
    Hybrid,
    /// Satellite imagery only
    Satellite,
}

/// Light or dark appearance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorScheme {
    /// Light appearance
    #[default]
    Light,
    /// Dark appearance
    Dark,
}

/// Construction options for a [`Map`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MapOptions {
    /// Initial center, applied after `region`
    pub center: Option<Coordinate>,
    /// Initial visible region, defaults to the whole world
    pub region: Option<CoordinateRegion>,
    /// Initial rotation in degrees
    pub rotation: f64,
    /// Base map imagery
    pub map_type: MapType,
    /// Appearance
    pub color_scheme: ColorScheme,
    /// Insets of the content area
    pub padding: Padding,
    /// Pixel size of the container element
    pub viewport_size: ViewportSize,
    /// Compass visibility
    pub shows_compass: FeatureVisibility,
    /// Scale bar visibility
    pub shows_scale: FeatureVisibility,
    /// Whether the map type control is shown
    pub shows_map_type_control: bool,
    /// Whether the zoom control is shown
    pub shows_zoom_control: bool,
    /// Whether the user location control is shown
    pub shows_user_location_control: bool,
    /// Whether points of interest are drawn
    pub shows_points_of_interest: bool,
    /// Whether the user may rotate the map
    pub is_rotation_enabled: bool,
    /// Whether the user may pan the map
    pub is_scroll_enabled: bool,
    /// Whether the user may zoom the map
    pub is_zoom_enabled: bool,
    /// Whether the user location is drawn
    pub shows_user_location: bool,
    /// Whether the map follows the user location
    pub tracking_user_location: bool,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            center: None,
            region: None,
            rotation: 0.0,
            map_type: MapType::default(),
            color_scheme: ColorScheme::default(),
            padding: Padding::ZERO,
            viewport_size: ViewportSize::default(),
            shows_compass: FeatureVisibility::Adaptive,
            shows_scale: FeatureVisibility::Hidden,
            shows_map_type_control: true,
            shows_zoom_control: true,
            shows_user_location_control: false,
            shows_points_of_interest: true,
            is_rotation_enabled: true,
            is_scroll_enabled: true,
            is_zoom_enabled: true,
            shows_user_location: false,
            tracking_user_location: false,
        }
    }
}

/// Reference to an item owned by a map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapItemRef {
    /// An annotation
    Annotation(AnnotationId),
    /// A vector overlay
    Overlay(OverlayId),
}

/// Kind of event a listener subscribes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapEventKind {
    /// The visible region changed
    RegionChange,
    /// The rotation changed
    RotationChange,
    /// The base map imagery changed
    MapTypeChange,
    /// An item was selected
    Select,
    /// An item was deselected
    Deselect,
    /// Annotations were added or removed
    AnnotationsChanged,
    /// Overlays or tile overlays were added or removed
    OverlaysChanged,
}

/// Event delivered to map listeners
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    /// The visible region changed
    RegionChanged { region: CoordinateRegion },
    /// The rotation changed
    RotationChanged { rotation: f64 },
    /// The base map imagery changed
    MapTypeChanged { map_type: MapType },
    /// An item was selected
    Selected(MapItemRef),
    /// An item was deselected
    Deselected(MapItemRef),
    /// Annotations were added or removed
    AnnotationsChanged {
        added: Vec<AnnotationId>,
        removed: Vec<AnnotationId>,
    },
    /// Overlays or tile overlays were added or removed
    OverlaysChanged {
        added: Vec<OverlayId>,
        removed: Vec<OverlayId>,
    },
}

impl MapEvent {
    /// Kind used to route the event to listeners
    #[must_use]
    pub const fn kind(&self) -> MapEventKind {
        match self {
            Self::RegionChanged { .. } => MapEventKind::RegionChange,
            Self::RotationChanged { .. } => MapEventKind::RotationChange,
            Self::MapTypeChanged { .. } => MapEventKind::MapTypeChange,
            Self::Selected(_) => MapEventKind::Select,
            Self::Deselected(_) => MapEventKind::Deselect,
            Self::AnnotationsChanged { .. } => MapEventKind::AnnotationsChanged,
            Self::OverlaysChanged { .. } => MapEventKind::OverlaysChanged,
        }
    }
}

/// Identifier returned when registering a listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type ListenerFn = Box<dyn FnMut(&MapEvent) + Send>;

struct Listener {
    id: ListenerId,
    kind: MapEventKind,
    callback: ListenerFn,
}

/// The interactive map view
pub struct Map {
    container_id: String,
    options: MapOptions,
    center: MapPoint,
    scale: f64,
    rotation: f64,
    annotations: Vec<Annotation>,
    overlays: Vec<Overlay>,
    tile_overlays: Vec<TileOverlay>,
    selected_annotation: Option<AnnotationId>,
    selected_overlay: Option<OverlayId>,
    listeners: Vec<Listener>,
    next_listener_id: u64,
}

impl fmt::Debug for Map {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Map")
            .field("container_id", &self.container_id)
            .field("region", &self.region())
            .field("rotation", &self.rotation)
            .field("map_type", &self.options.map_type)
            .field("annotations", &self.annotations.len())
            .field("overlays", &self.overlays.len())
            .field("tile_overlays", &self.tile_overlays.len())
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl Map {
    /// Create a map bound to a container element
    pub fn new(container_id: impl Into<String>, options: MapOptions) -> Result<Self, DomainError> {
        let container_id = container_id.into();
        if container_id.trim().is_empty() {
            return Err(DomainError::ValidationError(
                "Map container id must not be empty".to_string(),
            ));
        }
        if !options.viewport_size.is_drawable() {
            return Err(DomainError::ValidationError(format!(
                "Map viewport must have a positive size, got {}x{}",
                options.viewport_size.width, options.viewport_size.height
            )));
        }

        let mut map = Self {
            container_id,
            center: MapPoint::new(0.5, 0.5),
            scale: MIN_SCALE,
            rotation: normalize_rotation(options.rotation),
            options,
            annotations: Vec::new(),
            overlays: Vec::new(),
            tile_overlays: Vec::new(),
            selected_annotation: None,
            selected_overlay: None,
            listeners: Vec::new(),
            next_listener_id: 1,
        };

        let initial = map
            .options
            .region
            .map_or_else(|| MapRect::new(0.0, 0.0, 1.0, 1.0), |r| r.to_map_rect());
        map.fit_rect(&initial, Padding::ZERO);
        map.options.rotation = map.rotation;
        if let Some(center) = map.options.center {
            map.center = center.to_map_point();
        }
        Ok(map)
    }

    /// Identifier of the container element
    #[must_use]
    pub fn container_id(&self) -> &str {
        &self.container_id
    }

    /// Current options, reflecting later setter calls
    #[must_use]
    pub const fn options(&self) -> &MapOptions {
        &self.options
    }

    // ---- viewport ----

    /// Geographic center of the content area
    #[must_use]
    pub fn center(&self) -> Coordinate {
        let c = self.center.to_coordinate();
        Coordinate::new(c.latitude(), projection::wrap_longitude(c.longitude()))
    }

    /// Move the center without changing the zoom
    pub fn set_center(&mut self, center: Coordinate) {
        self.center = center.to_map_point();
        self.emit_region_changed();
    }

    /// Visible region of the content area
    #[must_use]
    pub fn region(&self) -> CoordinateRegion {
        self.visible_map_rect().to_coordinate_region()
    }

    /// Show a region, expanding it to the viewport's aspect ratio
    pub fn set_region(&mut self, region: CoordinateRegion) {
        self.set_visible_map_rect(region.to_map_rect());
    }

    /// Visible area of the content area in map space, ignoring rotation
    #[must_use]
    pub fn visible_map_rect(&self) -> MapRect {
        let (width, height) = self.content_size(Padding::ZERO);
        let (w, h) = (width / self.scale, height / self.scale);
        MapRect::new(self.center.x - w / 2.0, self.center.y - h / 2.0, w, h)
    }

    /// Show a map rect, expanding it to the viewport's aspect ratio
    pub fn set_visible_map_rect(&mut self, rect: MapRect) {
        self.fit_rect(&rect, Padding::ZERO);
        self.emit_region_changed();
    }

    /// Rotation in degrees, in [0, 360)
    #[must_use]
    pub const fn rotation(&self) -> f64 {
        self.rotation
    }

    /// Rotate the map; the value is normalised into [0, 360)
    pub fn set_rotation(&mut self, degrees: f64) {
        let rotation = normalize_rotation(degrees);
        if (rotation - self.rotation).abs() > f64::EPSILON {
            self.rotation = rotation;
            self.options.rotation = rotation;
            self.emit(MapEvent::RotationChanged { rotation });
        }
    }

    /// Zoom level where 0 shows the world on one 256 pixel tile
    #[must_use]
    pub fn zoom_level(&self) -> f64 {
        (self.scale / TILE_SIZE).log2()
    }

    /// Base map imagery
    #[must_use]
    pub const fn map_type(&self) -> MapType {
        self.options.map_type
    }

    /// Change the base map imagery
    pub fn set_map_type(&mut self, map_type: MapType) {
        if self.options.map_type != map_type {
            self.options.map_type = map_type;
            self.emit(MapEvent::MapTypeChanged { map_type });
        }
    }

    /// Change the appearance
    pub fn set_color_scheme(&mut self, color_scheme: ColorScheme) {
        self.options.color_scheme = color_scheme;
    }

    /// Content area insets
    #[must_use]
    pub const fn padding(&self) -> Padding {
        self.options.padding
    }

    /// Change the content area insets, keeping center and zoom
    pub fn set_padding(&mut self, padding: Padding) {
        self.options.padding = padding;
        self.emit_region_changed();
    }

    /// Pixel size of the container element
    #[must_use]
    pub const fn viewport_size(&self) -> ViewportSize {
        self.options.viewport_size
    }

    /// Resize the container, keeping center and zoom
    pub fn set_viewport_size(&mut self, size: ViewportSize) -> Result<(), DomainError> {
        if !size.is_drawable() {
            return Err(DomainError::ValidationError(format!(
                "Map viewport must have a positive size, got {}x{}",
                size.width, size.height
            )));
        }
        self.options.viewport_size = size;
        self.emit_region_changed();
        Ok(())
    }

    // ---- screen conversion ----

    /// Screen position of a coordinate, honoring rotation
    ///
    /// Longitudes resolve to the world copy nearest to the center.
    #[must_use]
    pub fn convert_coordinate_to_point(&self, coordinate: &Coordinate) -> ScreenPoint {
        let p = coordinate.to_unwrapped_map_point();
        let mut dx = p.x - self.center.x;
        dx -= dx.round();
        let (px, py) = (dx * self.scale, (p.y - self.center.y) * self.scale);
        let (sin, cos) = self.rotation.to_radians().sin_cos();
        let anchor = self.anchor();
        ScreenPoint::new(
            px.mul_add(cos, py * sin) + anchor.x,
            py.mul_add(cos, -(px * sin)) + anchor.y,
        )
    }

    /// Coordinate under a screen position, inverse of
    /// [`convert_coordinate_to_point`](Self::convert_coordinate_to_point)
    #[must_use]
    pub fn convert_point_to_coordinate(&self, point: &ScreenPoint) -> Coordinate {
        let anchor = self.anchor();
        let (rx, ry) = (point.x - anchor.x, point.y - anchor.y);
        let (sin, cos) = self.rotation.to_radians().sin_cos();
        let px = rx.mul_add(cos, -(ry * sin));
        let py = rx.mul_add(sin, ry * cos);
        let c = MapPoint::new(
            self.center.x + px / self.scale,
            self.center.y + py / self.scale,
        )
        .to_coordinate();
        Coordinate::new(c.latitude(), projection::wrap_longitude(c.longitude()))
    }

    // ---- annotations ----

    /// Annotations in insertion order
    #[must_use]
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Look up an annotation
    #[must_use]
    pub fn annotation(&self, id: AnnotationId) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.id == id)
    }

    /// Mutable access to an annotation
    ///
    /// Callers must not change `id` or `selected`; use the selection methods.
    pub fn annotation_mut(&mut self, id: AnnotationId) -> Option<&mut Annotation> {
        self.annotations.iter_mut().find(|a| a.id == id)
    }

    /// Add an annotation; adding the same annotation twice is an error
    pub fn add_annotation(&mut self, annotation: Annotation) -> Result<AnnotationId, DomainError> {
        let mut ids = self.add_annotations(vec![annotation])?;
        ids.pop()
            .ok_or_else(|| DomainError::ValidationError("No annotation added".to_string()))
    }

    /// Add several annotations; nothing is added if any of them is a duplicate
    pub fn add_annotations(
        &mut self,
        annotations: Vec<Annotation>,
    ) -> Result<Vec<AnnotationId>, DomainError> {
        self.check_new_annotations(&annotations)?;
        if annotations.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<AnnotationId> = annotations.iter().map(|a| a.id).collect();
        self.annotations.extend(annotations.into_iter().map(|mut a| {
            a.selected = false;
            a
        }));
        self.emit(MapEvent::AnnotationsChanged {
            added: ids.clone(),
            removed: Vec::new(),
        });
        Ok(ids)
    }

    /// Reject annotations already on the map or repeated within the batch
    fn check_new_annotations(&self, annotations: &[Annotation]) -> Result<(), DomainError> {
        for (i, annotation) in annotations.iter().enumerate() {
            let repeated = annotations[..i].iter().any(|a| a.id == annotation.id);
            if repeated || self.annotation(annotation.id).is_some() {
                return Err(DomainError::already_present(
                    "Annotation",
                    annotation.id.to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Remove an annotation and hand it back
    pub fn remove_annotation(&mut self, id: AnnotationId) -> Result<Annotation, DomainError> {
        let mut removed = self.remove_annotations(&[id])?;
        removed
            .pop()
            .ok_or_else(|| DomainError::not_found("Annotation", id.to_string()))
    }

    /// Remove several annotations; nothing is removed if any is missing
    pub fn remove_annotations(
        &mut self,
        ids: &[AnnotationId],
    ) -> Result<Vec<Annotation>, DomainError> {
        if let Some(missing) = ids.iter().find(|id| self.annotation(**id).is_none()) {
            return Err(DomainError::not_found("Annotation", missing.to_string()));
        }
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        if self.selected_annotation.is_some_and(|s| ids.contains(&s)) {
            self.deselect_annotation();
        }
        let mut removed = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(index) = self.annotations.iter().position(|a| a.id == *id) {
                removed.push(self.annotations.remove(index));
            }
        }
        self.emit(MapEvent::AnnotationsChanged {
            added: Vec::new(),
            removed: removed.iter().map(|a| a.id).collect(),
        });
        Ok(removed)
    }

    // ---- overlays ----

    /// Overlays in drawing order, bottom first
    #[must_use]
    pub fn overlays(&self) -> &[Overlay] {
        &self.overlays
    }

    /// Look up an overlay
    #[must_use]
    pub fn overlay(&self, id: OverlayId) -> Option<&Overlay> {
        self.overlays.iter().find(|o| o.id == id)
    }

    /// Mutable access to an overlay
    ///
    /// Callers must not change `id` or `selected`; use the selection methods.
    pub fn overlay_mut(&mut self, id: OverlayId) -> Option<&mut Overlay> {
        self.overlays.iter_mut().find(|o| o.id == id)
    }

    /// Add an overlay on top; adding the same overlay twice is an error
    pub fn add_overlay(&mut self, overlay: Overlay) -> Result<OverlayId, DomainError> {
        let mut ids = self.add_overlays(vec![overlay])?;
        ids.pop()
            .ok_or_else(|| DomainError::ValidationError("No overlay added".to_string()))
    }

    /// Add several overlays; nothing is added if any of them is a duplicate
    pub fn add_overlays(&mut self, overlays: Vec<Overlay>) -> Result<Vec<OverlayId>, DomainError> {
        self.check_new_overlays(&overlays)?;
        if overlays.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<OverlayId> = overlays.iter().map(|o| o.id).collect();
        self.overlays.extend(overlays.into_iter().map(|mut o| {
            o.selected = false;
            o
        }));
        self.emit(MapEvent::OverlaysChanged {
            added: ids.clone(),
            removed: Vec::new(),
        });
        Ok(ids)
    }

    /// Reject overlays already on the map or repeated within the batch
    fn check_new_overlays(&self, overlays: &[Overlay]) -> Result<(), DomainError> {
        for (i, overlay) in overlays.iter().enumerate() {
            let repeated = overlays[..i].iter().any(|o| o.id == overlay.id);
            if repeated || self.contains_overlay_id(overlay.id) {
                return Err(DomainError::already_present("Overlay", overlay.id.to_string()));
            }
        }
        Ok(())
    }

    /// Remove an overlay and hand it back
    pub fn remove_overlay(&mut self, id: OverlayId) -> Result<Overlay, DomainError> {
        let mut removed = self.remove_overlays(&[id])?;
        removed
            .pop()
            .ok_or_else(|| DomainError::not_found("Overlay", id.to_string()))
    }

    /// Remove several overlays; nothing is removed if any is missing
    pub fn remove_overlays(&mut self, ids: &[OverlayId]) -> Result<Vec<Overlay>, DomainError> {
        if let Some(missing) = ids.iter().find(|id| self.overlay(**id).is_none()) {
            return Err(DomainError::not_found("Overlay", missing.to_string()));
        }
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        if self.selected_overlay.is_some_and(|s| ids.contains(&s)) {
            self.deselect_overlay();
        }
        let mut removed = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(index) = self.overlays.iter().position(|o| o.id == *id) {
                removed.push(self.overlays.remove(index));
            }
        }
        self.emit(MapEvent::OverlaysChanged {
            added: Vec::new(),
            removed: removed.iter().map(|o| o.id).collect(),
        });
        Ok(removed)
    }

    /// Overlays hit by a coordinate, topmost first
    #[must_use]
    pub fn overlays_at(&self, coordinate: &Coordinate, tolerance_meters: f64) -> Vec<&Overlay> {
        self.overlays
            .iter()
            .rev()
            .filter(|o| o.hit_test(coordinate, tolerance_meters))
            .collect()
    }

    /// Topmost overlay hit by a coordinate
    #[must_use]
    pub fn top_overlay_at(&self, coordinate: &Coordinate, tolerance_meters: f64) -> Option<&Overlay> {
        self.overlays
            .iter()
            .rev()
            .find(|o| o.hit_test(coordinate, tolerance_meters))
    }

    // ---- tile overlays ----

    /// Tile overlays in drawing order, bottom first
    #[must_use]
    pub fn tile_overlays(&self) -> &[TileOverlay] {
        &self.tile_overlays
    }

    /// Add a tile overlay on top; adding the same layer twice is an error
    pub fn add_tile_overlay(&mut self, tile_overlay: TileOverlay) -> Result<OverlayId, DomainError> {
        let id = tile_overlay.id;
        if self.contains_overlay_id(id) {
            return Err(DomainError::already_present("TileOverlay", id.to_string()));
        }
        self.tile_overlays.push(tile_overlay);
        self.emit(MapEvent::OverlaysChanged {
            added: vec![id],
            removed: Vec::new(),
        });
        Ok(id)
    }

    /// Remove a tile overlay and hand it back
    pub fn remove_tile_overlay(&mut self, id: OverlayId) -> Result<TileOverlay, DomainError> {
        let index = self
            .tile_overlays
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| DomainError::not_found("TileOverlay", id.to_string()))?;
        let removed = self.tile_overlays.remove(index);
        self.emit(MapEvent::OverlaysChanged {
            added: Vec::new(),
            removed: vec![id],
        });
        Ok(removed)
    }

    fn contains_overlay_id(&self, id: OverlayId) -> bool {
        self.overlays.iter().any(|o| o.id == id) || self.tile_overlays.iter().any(|t| t.id == id)
    }

    // ---- selection ----

    /// Currently selected annotation
    #[must_use]
    pub fn selected_annotation(&self) -> Option<&Annotation> {
        self.selected_annotation.and_then(|id| self.annotation(id))
    }

    /// Select an annotation, deselecting any previous one
    pub fn select_annotation(&mut self, id: AnnotationId) -> Result<(), DomainError> {
        let annotation = self
            .annotation(id)
            .ok_or_else(|| DomainError::not_found("Annotation", id.to_string()))?;
        if !annotation.is_selectable() {
            return Err(DomainError::NotPermitted(format!(
                "Annotation {id} is hidden or disabled"
            )));
        }
        if self.selected_annotation == Some(id) {
            return Ok(());
        }

        self.deselect_annotation();
        if let Some(annotation) = self.annotation_mut(id) {
            annotation.selected = true;
        }
        self.selected_annotation = Some(id);
        self.emit(MapEvent::Selected(MapItemRef::Annotation(id)));
        Ok(())
    }

    /// Deselect the selected annotation, returning its id
    pub fn deselect_annotation(&mut self) -> Option<AnnotationId> {
        let id = self.selected_annotation.take()?;
        if let Some(annotation) = self.annotation_mut(id) {
            annotation.selected = false;
        }
        self.emit(MapEvent::Deselected(MapItemRef::Annotation(id)));
        Some(id)
    }

    /// Currently selected overlay
    #[must_use]
    pub fn selected_overlay(&self) -> Option<&Overlay> {
        self.selected_overlay.and_then(|id| self.overlay(id))
    }

    /// Select an overlay, deselecting any previous one
    pub fn select_overlay(&mut self, id: OverlayId) -> Result<(), DomainError> {
        let overlay = self
            .overlay(id)
            .ok_or_else(|| DomainError::not_found("Overlay", id.to_string()))?;
        if !overlay.visible || !overlay.enabled {
            return Err(DomainError::NotPermitted(format!(
                "Overlay {id} is hidden or disabled"
            )));
        }
        if self.selected_overlay == Some(id) {
            return Ok(());
        }

        self.deselect_overlay();
        if let Some(overlay) = self.overlay_mut(id) {
            overlay.selected = true;
        }
        self.selected_overlay = Some(id);
        self.emit(MapEvent::Selected(MapItemRef::Overlay(id)));
        Ok(())
    }

    /// Deselect the selected overlay, returning its id
    pub fn deselect_overlay(&mut self) -> Option<OverlayId> {
        let id = self.selected_overlay.take()?;
        if let Some(overlay) = self.overlay_mut(id) {
            overlay.selected = false;
        }
        self.emit(MapEvent::Deselected(MapItemRef::Overlay(id)));
        Some(id)
    }

    // ---- fitting ----

    /// Add items and fit the region to their combined extent
    ///
    /// `padding` is an extra pixel margin kept free around the items, on top
    /// of the map's own padding. Nothing is added if any item is a duplicate.
    pub fn show_items(
        &mut self,
        annotations: Vec<Annotation>,
        overlays: Vec<Overlay>,
        padding: Padding,
    ) -> Result<(), DomainError> {
        self.check_new_annotations(&annotations)?;
        self.check_new_overlays(&overlays)?;

        let extent = annotations
            .iter()
            .map(|a| MapRect::from_points(a.coordinate.to_map_point(), a.coordinate.to_map_point()))
            .chain(overlays.iter().filter_map(|o| {
                o.bounding_region()
                    .map(|b| b.to_coordinate_region().to_map_rect())
            }))
            .reduce(|acc, rect| acc.union(&rect));

        self.add_annotations(annotations)?;
        self.add_overlays(overlays)?;

        if let Some(extent) = extent {
            self.fit_rect(&extent, padding);
            self.emit_region_changed();
        }
        Ok(())
    }

    // ---- events ----

    /// Register a listener for one kind of event
    pub fn add_event_listener<F>(&mut self, kind: MapEventKind, listener: F) -> ListenerId
    where
        F: FnMut(&MapEvent) + Send + 'static,
    {
        let id = ListenerId(self.next_listener_id);
        self.next_listener_id += 1;
        self.listeners.push(Listener {
            id,
            kind,
            callback: Box::new(listener),
        });
        id
    }

    /// Unregister a listener; returns whether it was registered
    pub fn remove_event_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|l| l.id != id);
        self.listeners.len() != before
    }

    fn emit(&mut self, event: MapEvent) {
        let kind = event.kind();
        for listener in self.listeners.iter_mut().filter(|l| l.kind == kind) {
            (listener.callback)(&event);
        }
    }

    fn emit_region_changed(&mut self) {
        let region = self.region();
        self.emit(MapEvent::RegionChanged { region });
    }

    // ---- internals ----

    /// Pixel size of the content area minus an extra margin
    fn content_size(&self, extra: Padding) -> (f64, f64) {
        let viewport = self.options.viewport_size;
        let padding = self.options.padding;
        (
            (viewport.width - padding.horizontal() - extra.horizontal()).max(1.0),
            (viewport.height - padding.vertical() - extra.vertical()).max(1.0),
        )
    }

    /// Screen position of the map center
    fn anchor(&self) -> ScreenPoint {
        let (width, height) = self.content_size(Padding::ZERO);
        let padding = self.options.padding;
        ScreenPoint::new(padding.left() + width / 2.0, padding.top() + height / 2.0)
    }

    /// Center and scale so that `rect` fills the content area minus `extra`
    fn fit_rect(&mut self, rect: &MapRect, extra: Padding) {
        let (width, height) = self.content_size(extra);
        let candidates = [
            (rect.size.width > 0.0).then(|| width / rect.size.width),
            (rect.size.height > 0.0).then(|| height / rect.size.height),
        ];
        if let Some(scale) = candidates.into_iter().flatten().reduce(f64::min) {
            self.scale = scale.clamp(MIN_SCALE, MAX_SCALE);
        }

        let shift_x = (extra.left() - extra.right()) / 2.0;
        let shift_y = (extra.top() - extra.bottom()) / 2.0;
        self.center = MapPoint::new(
            projection::wrap_x(rect.mid_x() - shift_x / self.scale),
            (rect.mid_y() - shift_y / self.scale).clamp(0.0, 1.0),
        );
    }
}

/// Bring an angle into [0, 360)
fn normalize_rotation(degrees: f64) -> f64 {
    let rotation = degrees.rem_euclid(360.0);
    if rotation >= 360.0 {
        0.0
    } else {
        rotation
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::value_objects::CoordinateSpan;

    fn map() -> Map {
        Map::new("map", MapOptions::default()).unwrap()
    }

    fn recorder(map: &mut Map, kind: MapEventKind) -> Arc<Mutex<Vec<MapEvent>>> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        map.add_event_listener(kind, move |e| sink.lock().unwrap().push(e.clone()));
        events
    }

    fn cupertino() -> CoordinateRegion {
        CoordinateRegion::new(Coordinate::new(37.3349, -122.0090), CoordinateSpan::new(0.1, 0.1))
    }

    #[test]
    fn rejects_empty_container() {
        assert!(Map::new("  ", MapOptions::default()).is_err());
    }

    #[test]
    fn rejects_zero_viewport() {
        let options = MapOptions {
            viewport_size: ViewportSize::new(0.0, 100.0),
            ..MapOptions::default()
        };
        assert!(Map::new("map", options).is_err());
    }

    #[test]
    fn initial_region_contains_requested_region() {
        let options = MapOptions {
            region: Some(cupertino()),
            ..MapOptions::default()
        };
        let map = Map::new("map", options).unwrap();
        let region = map.region();
        assert!(region.center.approx_eq(&cupertino().center, 1e-9));
        assert!(region.span.latitude_delta >= 0.1 - 1e-9);
        assert!(region.span.longitude_delta >= 0.1 - 1e-9);
    }

    #[test]
    fn initial_center_overrides_region_center() {
        let options = MapOptions {
            center: Some(Coordinate::new(48.0, 11.0)),
            ..MapOptions::default()
        };
        let map = Map::new("map", options).unwrap();
        assert!(map.center().approx_eq(&Coordinate::new(48.0, 11.0), 1e-9));
    }

    #[test]
    fn set_center_emits_region_change() {
        let mut map = map();
        let events = recorder(&mut map, MapEventKind::RegionChange);
        map.set_center(Coordinate::new(10.0, 20.0));
        assert!(map.center().approx_eq(&Coordinate::new(10.0, 20.0), 1e-9));
        assert_eq!(events.lock().unwrap().len(), 1);
    }

    #[test]
    fn set_region_matches_viewport_aspect() {
        let mut map = map();
        map.set_region(cupertino());
        let rect = map.visible_map_rect();
        let aspect = rect.size.width / rect.size.height;
        assert!((aspect - 1024.0 / 768.0).abs() < 1e-9);
    }

    #[test]
    fn rotation_is_normalised() {
        let mut map = map();
        let events = recorder(&mut map, MapEventKind::RotationChange);
        map.set_rotation(-90.0);
        assert!((map.rotation() - 270.0).abs() < 1e-12);
        map.set_rotation(630.0);
        assert!((map.rotation() - 270.0).abs() < 1e-12);
        assert_eq!(events.lock().unwrap().len(), 1);
    }

    #[test]
    fn center_maps_to_content_center() {
        let mut map = map();
        map.set_region(cupertino());
        let point = map.convert_coordinate_to_point(&map.center());
        assert!((point.x - 512.0).abs() < 1e-6);
        assert!((point.y - 384.0).abs() < 1e-6);
    }

    #[test]
    fn screen_conversion_round_trips_with_rotation() {
        let mut map = map();
        map.set_region(cupertino());
        for rotation in [0.0, 45.0, 90.0, 200.0] {
            map.set_rotation(rotation);
            let c = Coordinate::new(37.36, -122.03);
            let back = map.convert_point_to_coordinate(&map.convert_coordinate_to_point(&c));
            assert!(back.approx_eq(&c, 1e-9), "rotation {rotation}: {back}");
        }
    }

    #[test]
    fn north_is_up_without_rotation() {
        let mut map = map();
        map.set_region(cupertino());
        let north = map.convert_coordinate_to_point(&Coordinate::new(37.36, -122.0090));
        assert!(north.y < 384.0);
        map.set_rotation(180.0);
        let north = map.convert_coordinate_to_point(&Coordinate::new(37.36, -122.0090));
        assert!(north.y > 384.0);
    }

    #[test]
    fn padding_shifts_anchor() {
        let options = MapOptions {
            padding: Padding::new(100.0, 0.0, 0.0, 0.0),
            ..MapOptions::default()
        };
        let map = Map::new("map", options).unwrap();
        let point = map.convert_coordinate_to_point(&map.center());
        assert!((point.y - (100.0 + 334.0)).abs() < 1e-6);
    }

    #[test]
    fn duplicate_annotation_is_rejected() {
        let mut map = map();
        let annotation = Annotation::new(Coordinate::new(1.0, 1.0));
        let copy = annotation.clone();
        map.add_annotation(annotation).unwrap();
        assert!(matches!(
            map.add_annotation(copy),
            Err(DomainError::AlreadyPresent { .. })
        ));
        assert_eq!(map.annotations().len(), 1);
    }

    #[test]
    fn batch_add_is_all_or_nothing() {
        let mut map = map();
        let a = Annotation::new(Coordinate::new(1.0, 1.0));
        let dup = a.clone();
        assert!(map.add_annotations(vec![a, dup]).is_err());
        assert!(map.annotations().is_empty());
    }

    #[test]
    fn remove_returns_ownership_and_emits() {
        let mut map = map();
        let events = recorder(&mut map, MapEventKind::AnnotationsChanged);
        let id = map
            .add_annotation(Annotation::new(Coordinate::new(1.0, 1.0)).with_title("A"))
            .unwrap();
        let removed = map.remove_annotation(id).unwrap();
        assert_eq!(removed.title.as_deref(), Some("A"));
        assert!(map.annotations().is_empty());
        assert!(map.remove_annotation(id).is_err());
        assert_eq!(events.lock().unwrap().len(), 2);
    }

    #[test]
    fn annotation_mut_updates_in_place() {
        let mut map = map();
        let id = map.add_annotation(Annotation::new(Coordinate::new(1.0, 1.0))).unwrap();
        map.annotation_mut(id).unwrap().title = Some("Updated".into());
        assert_eq!(map.annotation(id).unwrap().title.as_deref(), Some("Updated"));
    }

    #[test]
    fn only_one_annotation_selected() {
        let mut map = map();
        let selects = recorder(&mut map, MapEventKind::Select);
        let deselects = recorder(&mut map, MapEventKind::Deselect);
        let a = map.add_annotation(Annotation::new(Coordinate::new(1.0, 1.0))).unwrap();
        let b = map.add_annotation(Annotation::new(Coordinate::new(2.0, 2.0))).unwrap();

        map.select_annotation(a).unwrap();
        map.select_annotation(b).unwrap();
        assert_eq!(map.selected_annotation().map(|s| s.id), Some(b));
        assert!(!map.annotation(a).unwrap().selected);
        assert!(map.annotation(b).unwrap().selected);
        assert_eq!(selects.lock().unwrap().len(), 2);
        assert_eq!(
            deselects.lock().unwrap().as_slice(),
            &[MapEvent::Deselected(MapItemRef::Annotation(a))]
        );
    }

    #[test]
    fn disabled_annotation_cannot_be_selected() {
        let mut map = map();
        let mut annotation = Annotation::new(Coordinate::new(1.0, 1.0));
        annotation.enabled = false;
        let id = map.add_annotation(annotation).unwrap();
        assert!(matches!(
            map.select_annotation(id),
            Err(DomainError::NotPermitted(_))
        ));
        assert!(map.selected_annotation().is_none());
    }

    #[test]
    fn removing_selected_annotation_deselects() {
        let mut map = map();
        let id = map.add_annotation(Annotation::new(Coordinate::new(1.0, 1.0))).unwrap();
        map.select_annotation(id).unwrap();
        let removed = map.remove_annotation(id).unwrap();
        assert!(!removed.selected);
        assert!(map.selected_annotation().is_none());
        assert!(map.deselect_annotation().is_none());
    }

    #[test]
    fn overlays_at_returns_topmost_first() {
        let mut map = map();
        let bottom = map.add_overlay(Overlay::circle(Coordinate::new(0.0, 0.0), 10_000.0)).unwrap();
        let top = map.add_overlay(Overlay::circle(Coordinate::new(0.0, 0.0), 5_000.0)).unwrap();
        let hits: Vec<OverlayId> = map
            .overlays_at(&Coordinate::new(0.0, 0.0), 0.0)
            .iter()
            .map(|o| o.id)
            .collect();
        assert_eq!(hits, vec![top, bottom]);
        assert_eq!(
            map.top_overlay_at(&Coordinate::new(0.07, 0.0), 0.0).map(|o| o.id),
            Some(bottom)
        );
        assert!(map.top_overlay_at(&Coordinate::new(1.0, 1.0), 0.0).is_none());
    }

    #[test]
    fn overlay_selection_and_removal() {
        let mut map = map();
        let id = map.add_overlay(Overlay::circle(Coordinate::new(0.0, 0.0), 100.0)).unwrap();
        map.select_overlay(id).unwrap();
        assert!(map.selected_overlay().unwrap().selected);
        let removed = map.remove_overlay(id).unwrap();
        assert!(!removed.selected);
        assert!(map.selected_overlay().is_none());
    }

    #[test]
    fn tile_overlay_membership() {
        let mut map = map();
        let events = recorder(&mut map, MapEventKind::OverlaysChanged);
        let layer = TileOverlay::new("https://tiles/{z}/{x}/{y}.png");
        let copy = layer.clone();
        let id = map.add_tile_overlay(layer).unwrap();
        assert!(map.add_tile_overlay(copy).is_err());
        assert_eq!(map.tile_overlays().len(), 1);
        map.remove_tile_overlay(id).unwrap();
        assert!(map.remove_tile_overlay(id).is_err());
        assert_eq!(events.lock().unwrap().len(), 2);
    }

    #[test]
    fn show_items_fits_all_items() {
        let mut map = map();
        let a = Annotation::new(Coordinate::new(37.0, -122.5));
        let b = Annotation::new(Coordinate::new(37.8, -122.0));
        let circle = Overlay::circle(Coordinate::new(37.4, -121.8), 1_000.0);
        map.show_items(vec![a, b], vec![circle], Padding::uniform(20.0))
            .unwrap();

        assert_eq!(map.annotations().len(), 2);
        assert_eq!(map.overlays().len(), 1);
        let region = map.region();
        for c in [Coordinate::new(37.0, -122.5), Coordinate::new(37.8, -122.0)] {
            assert!(region.contains(&c), "{c} not in {region:?}");
            let p = map.convert_coordinate_to_point(&c);
            assert!(p.x >= 20.0 - 1e-6 && p.x <= 1004.0 + 1e-6);
            assert!(p.y >= 20.0 - 1e-6 && p.y <= 748.0 + 1e-6);
        }
    }

    #[test]
    fn show_items_rejects_duplicates_without_changes() {
        let mut map = map();
        let a = Annotation::new(Coordinate::new(1.0, 1.0));
        map.add_annotation(a.clone()).unwrap();
        let before = map.region();
        assert!(
            map.show_items(vec![a], vec![Overlay::circle(Coordinate::new(0.0, 0.0), 1.0)], Padding::ZERO)
                .is_err()
        );
        assert!(map.overlays().is_empty());
        assert_eq!(map.region(), before);
    }

    #[test]
    fn show_items_rejects_repeated_overlay_before_adding_anything() {
        let mut map = map();
        let events = recorder(&mut map, MapEventKind::AnnotationsChanged);

        let a = Annotation::new(Coordinate::new(1.0, 1.0));
        let o = Overlay::circle(Coordinate::new(0.0, 0.0), 1.0);
        let before = map.region();
        assert!(map.show_items(vec![a], vec![o.clone(), o], Padding::ZERO).is_err());

        assert!(map.annotations().is_empty());
        assert!(map.overlays().is_empty());
        assert_eq!(map.region(), before);
        assert!(events.lock().unwrap().is_empty());
    }

    #[test]
    fn removed_listener_is_not_called() {
        let mut map = map();
        let events = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&events);
        let id = map.add_event_listener(MapEventKind::MapTypeChange, move |_| {
            *sink.lock().unwrap() += 1;
        });
        map.set_map_type(MapType::Satellite);
        assert!(map.remove_event_listener(id));
        assert!(!map.remove_event_listener(id));
        map.set_map_type(MapType::Hybrid);
        assert_eq!(*events.lock().unwrap(), 1);
        assert_eq!(map.map_type(), MapType::Hybrid);
    }
}
