//! Vector rendering parameters for overlays

use serde::{Deserialize, Serialize};

/// Default stroke and fill color
pub const DEFAULT_STYLE_COLOR: &str = "rgb(0, 122, 255)";

/// Shape drawn at the ends of open lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineCap {
    /// Flat end at the endpoint
    Butt,
    /// Rounded end
    #[default]
    Round,
    /// Flat end extended by half the line width
    Square,
}

/// Shape drawn where two segments meet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineJoin {
    /// Sharp corner
    Miter,
    /// Rounded corner
    #[default]
    Round,
    /// Cut-off corner
    Bevel,
}

/// Rule deciding which parts of a self-intersecting polygon are filled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillRule {
    /// Non-zero winding number
    #[default]
    NonZero,
    /// Odd number of edge crossings
    EvenOdd,
}

/// Stroke and fill parameters consumed by the renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Style {
    /// CSS color of the stroke, `None` disables stroking
    pub stroke_color: Option<String>,
    /// Stroke opacity in [0, 1]
    pub stroke_opacity: f64,
    /// Stroke width in screen points
    pub line_width: f64,
    /// End cap for open lines
    pub line_cap: LineCap,
    /// Corner join
    pub line_join: LineJoin,
    /// Alternating dash and gap lengths, empty for a solid line
    pub line_dash: Vec<f64>,
    /// Offset into the dash pattern
    pub line_dash_offset: f64,
    /// CSS color of the fill, `None` disables filling
    pub fill_color: Option<String>,
    /// Fill opacity in [0, 1]
    pub fill_opacity: f64,
    /// Polygon fill rule
    pub fill_rule: FillRule,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            stroke_color: Some(DEFAULT_STYLE_COLOR.to_string()),
            stroke_opacity: 1.0,
            line_width: 1.0,
            line_cap: LineCap::default(),
            line_join: LineJoin::default(),
            line_dash: Vec::new(),
            line_dash_offset: 0.0,
            fill_color: Some(DEFAULT_STYLE_COLOR.to_string()),
            fill_opacity: 0.1,
            fill_rule: FillRule::default(),
        }
    }
}

impl Style {
    /// Set the stroke color
    #[must_use]
    pub fn with_stroke_color(mut self, color: impl Into<String>) -> Self {
        self.stroke_color = Some(color.into());
        self
    }

    /// Set the stroke opacity, clamped into [0, 1]
    #[must_use]
    pub fn with_stroke_opacity(mut self, opacity: f64) -> Self {
        self.stroke_opacity = opacity.clamp(0.0, 1.0);
        self
    }

    /// Set the line width; negative widths become zero
    #[must_use]
    pub fn with_line_width(mut self, width: f64) -> Self {
        self.line_width = width.max(0.0);
        self
    }

    /// Set the end cap
    #[must_use]
    pub const fn with_line_cap(mut self, cap: LineCap) -> Self {
        self.line_cap = cap;
        self
    }

    /// Set the corner join
    #[must_use]
    pub const fn with_line_join(mut self, join: LineJoin) -> Self {
        self.line_join = join;
        self
    }

    /// Set the dash pattern
    #[must_use]
    pub fn with_line_dash(mut self, dash: Vec<f64>, offset: f64) -> Self {
        self.line_dash = dash;
        self.line_dash_offset = offset;
        self
    }

    /// Set the fill color
    #[must_use]
    pub fn with_fill_color(mut self, color: impl Into<String>) -> Self {
        self.fill_color = Some(color.into());
        self
    }

    /// Disable filling
    #[must_use]
    pub fn without_fill(mut self) -> Self {
        self.fill_color = None;
        self
    }

    /// Set the fill opacity, clamped into [0, 1]
    #[must_use]
    pub fn with_fill_opacity(mut self, opacity: f64) -> Self {
        self.fill_opacity = opacity.clamp(0.0, 1.0);
        self
    }

    /// Set the polygon fill rule
    #[must_use]
    pub const fn with_fill_rule(mut self, rule: FillRule) -> Self {
        self.fill_rule = rule;
        self
    }

    /// Whether the line is dashed
    #[must_use]
    pub fn is_dashed(&self) -> bool {
        self.line_dash.iter().any(|len| *len > 0.0)
    }
}
