//! Visibility policy for optional map features

use serde::{Deserialize, Serialize};

/// Whether a feature (control, title, subtitle) is shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureVisibility {
    /// Shown or hidden depending on context, e.g. zoom level or interaction
    #[default]
    Adaptive,
    /// Never shown
    Hidden,
    /// Always shown
    Visible,
}

impl FeatureVisibility {
    /// Whether the feature may be shown at all
    #[must_use]
    pub const fn may_show(&self) -> bool {
        !matches!(self, Self::Hidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_never_shows() {
        assert!(!FeatureVisibility::Hidden.may_show());
        assert!(FeatureVisibility::Adaptive.may_show());
        assert!(FeatureVisibility::Visible.may_show());
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&FeatureVisibility::Adaptive).unwrap(),
            "\"adaptive\""
        );
    }
}
