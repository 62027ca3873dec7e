//! Annotation entity - Points of interest placed on a map
//!
//! The vendor's annotation hierarchy (plain, marker, image) is a closed
//! set, modelled as a shared record plus an [`AnnotationKind`] payload.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::value_objects::{
    AnnotationId, Coordinate, FeatureVisibility, OpaqueValue, ScreenPoint, ViewportSize,
};

/// Default balloon color of marker annotations
pub const DEFAULT_MARKER_COLOR: &str = "#ff5b40";

/// Default glyph color of marker annotations
pub const DEFAULT_GLYPH_COLOR: &str = "white";

/// Relative importance used to resolve collisions between annotations
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DisplayPriority(f64);

impl DisplayPriority {
    /// May be hidden to make room for others
    pub const LOW: Self = Self(250.0);
    /// Preferred over low priority annotations
    pub const HIGH: Self = Self(750.0);
    /// Always displayed
    pub const REQUIRED: Self = Self(1000.0);

    /// Create a custom priority, clamped into [0, 1000]
    #[must_use]
    pub fn new(value: f64) -> Self {
        Self(value.clamp(0.0, 1000.0))
    }

    /// Get the numeric priority
    #[must_use]
    pub const fn value(&self) -> f64 {
        self.0
    }

    /// Whether the annotation must never be hidden by collisions
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.0 >= Self::REQUIRED.0
    }
}

impl Default for DisplayPriority {
    fn default() -> Self {
        Self::REQUIRED
    }
}

/// Shape used when testing annotations for overlap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionMode {
    /// Bounding rectangle of the annotation
    #[default]
    Rectangle,
    /// Inscribed circle of the annotation
    Circle,
}

/// Balloon styling for marker annotations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MarkerStyle {
    /// Balloon fill color
    pub color: String,
    /// Glyph tint color
    pub glyph_color: String,
    /// Short text displayed inside the balloon
    pub glyph_text: Option<String>,
    /// Image set shown as glyph
    pub glyph_image: Option<OpaqueValue>,
    /// Image set shown as glyph while selected
    pub selected_glyph_image: Option<OpaqueValue>,
    /// Title label visibility
    pub title_visibility: FeatureVisibility,
    /// Subtitle label visibility
    pub subtitle_visibility: FeatureVisibility,
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self {
            color: DEFAULT_MARKER_COLOR.to_string(),
            glyph_color: DEFAULT_GLYPH_COLOR.to_string(),
            glyph_text: None,
            glyph_image: None,
            selected_glyph_image: None,
            title_visibility: FeatureVisibility::Adaptive,
            subtitle_visibility: FeatureVisibility::Adaptive,
        }
    }
}

impl MarkerStyle {
    /// Set the balloon color
    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    /// Set the glyph text
    #[must_use]
    pub fn with_glyph_text(mut self, text: impl Into<String>) -> Self {
        self.glyph_text = Some(text.into());
        self
    }

    /// Set the glyph image set
    #[must_use]
    pub fn with_glyph_image(mut self, image: OpaqueValue) -> Self {
        self.glyph_image = Some(image);
        self
    }
}

/// Image set for image annotations, keyed by device pixel ratio
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageSource {
    /// Opaque URL set, e.g. `{"1": "pin.png", "2": "pin@2x.png"}`
    pub url: OpaqueValue,
}

impl ImageSource {
    /// Create an image source from an opaque URL set
    #[must_use]
    pub const fn new(url: OpaqueValue) -> Self {
        Self { url }
    }

    /// Resolve the URL for a pixel ratio, falling back to ratio 1
    #[must_use]
    pub fn url_for_scale(&self, scale: u8) -> Option<&str> {
        match &self.url {
            OpaqueValue::String(single) => Some(single.as_str()),
            OpaqueValue::Object(set) => set
                .get(&scale.to_string())
                .or_else(|| set.get("1"))
                .and_then(OpaqueValue::as_str),
            _ => None,
        }
    }
}

/// Variant-specific payload of an annotation
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnnotationKind {
    /// Plain annotation rendered by a custom factory
    #[default]
    Standard,
    /// Balloon-shaped marker
    Marker(MarkerStyle),
    /// Annotation drawn from an image
    Image(ImageSource),
}

/// Resolved callout contents for a selected annotation
#[derive(Debug, Clone, PartialEq)]
pub struct Callout {
    /// Title line
    pub title: Option<String>,
    /// Subtitle line
    pub subtitle: Option<String>,
    /// Custom content replacing title and subtitle
    pub content: Option<String>,
    /// Accessory on the left side
    pub left_accessory: Option<String>,
    /// Accessory on the right side
    pub right_accessory: Option<String>,
    /// Offset from the annotation anchor
    pub anchor_offset: ScreenPoint,
    /// Whether showing the callout is animated
    pub animates: bool,
}

/// Customizes the callout shown for a selected annotation
///
/// All methods have defaults, so implementors override only what they need.
pub trait CalloutDelegate: fmt::Debug + Send + Sync {
    /// Whether a callout should appear at all
    fn should_appear(&self, _annotation: &Annotation) -> bool {
        true
    }

    /// Whether showing the callout is animated
    fn should_animate(&self, _annotation: &Annotation) -> bool {
        true
    }

    /// Offset of the callout relative to the annotation anchor
    fn anchor_offset(&self, annotation: &Annotation, _viewport: ViewportSize) -> ScreenPoint {
        annotation.callout_offset
    }

    /// Custom content replacing the default title/subtitle layout
    fn content(&self, _annotation: &Annotation) -> Option<String> {
        None
    }

    /// Accessory shown on the left side
    fn left_accessory(&self, _annotation: &Annotation) -> Option<String> {
        None
    }

    /// Accessory shown on the right side
    fn right_accessory(&self, _annotation: &Annotation) -> Option<String> {
        None
    }
}

/// A point of interest on the map
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    /// Unique identifier
    pub id: AnnotationId,
    /// Anchor position
    pub coordinate: Coordinate,
    /// Variant payload
    #[serde(default)]
    pub kind: AnnotationKind,
    /// Title shown in the callout or label
    pub title: Option<String>,
    /// Subtitle shown in the callout or label
    pub subtitle: Option<String>,
    /// Label announced by assistive technologies
    pub accessibility_label: Option<String>,
    /// Application payload
    #[serde(default)]
    pub data: OpaqueValue,
    /// Opaque size hint for the renderer
    pub size: Option<OpaqueValue>,
    /// Offset of the drawn element from the anchor
    #[serde(default)]
    pub anchor_offset: ScreenPoint,
    /// Offset of the callout from the anchor
    #[serde(default)]
    pub callout_offset: ScreenPoint,
    /// Whether the annotation is drawn
    pub visible: bool,
    /// Whether the annotation responds to interaction
    pub enabled: bool,
    /// Whether the annotation is selected; maintained by the map
    pub selected: bool,
    /// Whether a callout is shown on selection
    pub callout_enabled: bool,
    /// Whether appearance changes are animated
    pub animates: bool,
    /// Whether the user can drag the annotation
    pub draggable: bool,
    /// CSS animation used when the annotation appears
    pub appearance_animation: Option<String>,
    /// Annotations sharing an identifier may be clustered
    pub clustering_identifier: Option<String>,
    /// Collision priority
    #[serde(default)]
    pub display_priority: DisplayPriority,
    /// Collision shape
    #[serde(default)]
    pub collision_mode: CollisionMode,
    /// Callout customization
    #[serde(skip)]
    pub callout: Option<Arc<dyn CalloutDelegate>>,
}

impl Annotation {
    /// Create a plain annotation
    #[must_use]
    pub fn new(coordinate: Coordinate) -> Self {
        Self::with_kind(coordinate, AnnotationKind::Standard)
    }

    /// Create a marker annotation
    #[must_use]
    pub fn marker(coordinate: Coordinate, style: MarkerStyle) -> Self {
        Self::with_kind(coordinate, AnnotationKind::Marker(style))
    }

    /// Create an image annotation
    #[must_use]
    pub fn image(coordinate: Coordinate, source: ImageSource) -> Self {
        Self::with_kind(coordinate, AnnotationKind::Image(source))
    }

    fn with_kind(coordinate: Coordinate, kind: AnnotationKind) -> Self {
        Self {
            id: AnnotationId::new(),
            coordinate,
            kind,
            title: None,
            subtitle: None,
            accessibility_label: None,
            data: OpaqueValue::Null,
            size: None,
            anchor_offset: ScreenPoint::default(),
            callout_offset: ScreenPoint::default(),
            visible: true,
            enabled: true,
            selected: false,
            callout_enabled: true,
            animates: true,
            draggable: false,
            appearance_animation: None,
            clustering_identifier: None,
            display_priority: DisplayPriority::default(),
            collision_mode: CollisionMode::default(),
            callout: None,
        }
    }

    /// Set the title
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the subtitle
    #[must_use]
    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    /// Attach an application payload
    #[must_use]
    pub fn with_data(mut self, data: OpaqueValue) -> Self {
        self.data = data;
        self
    }

    /// Set the clustering identifier
    #[must_use]
    pub fn with_clustering_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.clustering_identifier = Some(identifier.into());
        self
    }

    /// Set the display priority
    #[must_use]
    pub const fn with_display_priority(mut self, priority: DisplayPriority) -> Self {
        self.display_priority = priority;
        self
    }

    /// Allow the user to drag the annotation
    #[must_use]
    pub const fn draggable(mut self) -> Self {
        self.draggable = true;
        self
    }

    /// Attach a callout delegate
    #[must_use]
    pub fn with_callout_delegate(mut self, delegate: Arc<dyn CalloutDelegate>) -> Self {
        self.callout = Some(delegate);
        self
    }

    /// Whether this is a marker annotation
    #[must_use]
    pub const fn is_marker(&self) -> bool {
        matches!(self.kind, AnnotationKind::Marker(_))
    }

    /// Whether the annotation can currently be selected
    #[must_use]
    pub const fn is_selectable(&self) -> bool {
        self.visible && self.enabled
    }

    /// Resolve what the callout shows when this annotation is selected
    ///
    /// Returns `None` when callouts are disabled, the delegate vetoes it,
    /// or there is nothing to show.
    #[must_use]
    pub fn resolve_callout(&self, viewport: ViewportSize) -> Option<Callout> {
        if !self.callout_enabled {
            return None;
        }

        let callout = match &self.callout {
            Some(delegate) => {
                if !delegate.should_appear(self) {
                    return None;
                }
                Callout {
                    title: self.title.clone(),
                    subtitle: self.subtitle.clone(),
                    content: delegate.content(self),
                    left_accessory: delegate.left_accessory(self),
                    right_accessory: delegate.right_accessory(self),
                    anchor_offset: delegate.anchor_offset(self, viewport),
                    animates: delegate.should_animate(self),
                }
            },
            None => Callout {
                title: self.title.clone(),
                subtitle: self.subtitle.clone(),
                content: None,
                left_accessory: None,
                right_accessory: None,
                anchor_offset: self.callout_offset,
                animates: self.animates,
            },
        };

        if callout.title.is_none() && callout.subtitle.is_none() && callout.content.is_none() {
            return None;
        }
        Some(callout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug)]
    struct VetoDelegate;

    impl CalloutDelegate for VetoDelegate {
        fn should_appear(&self, _annotation: &Annotation) -> bool {
            false
        }
    }

    #[derive(Debug)]
    struct RichDelegate;

    impl CalloutDelegate for RichDelegate {
        fn content(&self, annotation: &Annotation) -> Option<String> {
            annotation.title.as_ref().map(|t| format!("<b>{t}</b>"))
        }

        fn right_accessory(&self, _annotation: &Annotation) -> Option<String> {
            Some("info".to_string())
        }

        fn should_animate(&self, _annotation: &Annotation) -> bool {
            false
        }
    }

    fn park() -> Coordinate {
        Coordinate::new(37.3349, -122.0090)
    }

    #[test]
    fn new_annotation_defaults() {
        let a = Annotation::new(park());
        assert_eq!(a.kind, AnnotationKind::Standard);
        assert!(a.visible);
        assert!(a.enabled);
        assert!(!a.selected);
        assert!(a.callout_enabled);
        assert!(!a.draggable);
        assert!(a.data.is_null());
        assert!(a.display_priority.is_required());
    }

    #[test]
    fn marker_variant_carries_style() {
        let a = Annotation::marker(park(), MarkerStyle::default().with_glyph_text("A"));
        assert!(a.is_marker());
        match a.kind {
            AnnotationKind::Marker(style) => {
                assert_eq!(style.color, DEFAULT_MARKER_COLOR);
                assert_eq!(style.glyph_text.as_deref(), Some("A"));
            },
            _ => unreachable!("Expected marker annotation"),
        }
    }

    #[test]
    fn image_source_resolves_scale() {
        let source = ImageSource::new(json!({"1": "pin.png", "2": "pin@2x.png"}));
        assert_eq!(source.url_for_scale(2), Some("pin@2x.png"));
        assert_eq!(source.url_for_scale(3), Some("pin.png"));

        let single = ImageSource::new(json!("only.png"));
        assert_eq!(single.url_for_scale(2), Some("only.png"));

        let invalid = ImageSource::new(json!(42));
        assert!(invalid.url_for_scale(1).is_none());
    }

    #[test]
    fn display_priority_is_clamped() {
        assert!((DisplayPriority::new(2000.0).value() - 1000.0).abs() < f64::EPSILON);
        assert!(DisplayPriority::new(-5.0).value().abs() < f64::EPSILON);
        assert!(DisplayPriority::LOW < DisplayPriority::HIGH);
    }

    #[test]
    fn callout_requires_something_to_show() {
        let a = Annotation::new(park());
        assert!(a.resolve_callout(ViewportSize::default()).is_none());

        let titled = Annotation::new(park()).with_title("Apple Park");
        let callout = titled.resolve_callout(ViewportSize::default()).unwrap();
        assert_eq!(callout.title.as_deref(), Some("Apple Park"));
        assert!(callout.animates);
    }

    #[test]
    fn callout_disabled() {
        let mut a = Annotation::new(park()).with_title("Apple Park");
        a.callout_enabled = false;
        assert!(a.resolve_callout(ViewportSize::default()).is_none());
    }

    #[test]
    fn delegate_can_veto_callout() {
        let a = Annotation::new(park())
            .with_title("Apple Park")
            .with_callout_delegate(Arc::new(VetoDelegate));
        assert!(a.resolve_callout(ViewportSize::default()).is_none());
    }

    #[test]
    fn delegate_customizes_callout() {
        let a = Annotation::new(park())
            .with_title("Apple Park")
            .with_callout_delegate(Arc::new(RichDelegate));
        let callout = a.resolve_callout(ViewportSize::default()).unwrap();
        assert_eq!(callout.content.as_deref(), Some("<b>Apple Park</b>"));
        assert_eq!(callout.right_accessory.as_deref(), Some("info"));
        assert!(callout.left_accessory.is_none());
        assert!(!callout.animates);
    }

    #[test]
    fn serialization_skips_delegate() {
        let a = Annotation::marker(park(), MarkerStyle::default())
            .with_title("Apple Park")
            .with_data(json!({"id": 7}))
            .with_callout_delegate(Arc::new(VetoDelegate));
        let json = serde_json::to_string(&a).unwrap();
        assert!(json.contains("\"type\":\"marker\""));
        assert!(json.contains("\"title\":\"Apple Park\""));

        let back: Annotation = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, a.id);
        assert_eq!(back.data, json!({"id": 7}));
        assert!(back.callout.is_none());
    }
}
