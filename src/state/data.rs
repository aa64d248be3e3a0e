/// Shared data structures for the application state
///
/// These structs represent the data model that flows between
/// the catalog, the location resolver and the UI layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A paired latitude/longitude in decimal degrees
///
/// Always produced together; there is no way to hold half a coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Finite and within the WGS84 ranges
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// "37.000000, -122.000000"
    pub fn display(&self) -> String {
        format!("{:.6}, {:.6}", self.latitude, self.longitude)
    }
}

/// Represents a single photograph in the gallery
#[derive(Debug, Clone, PartialEq)]
pub struct MediaRecord {
    /// Unique catalog ID, never reused
    pub id: i64,
    /// Where the image bytes live (opaque to the catalog)
    pub uri: String,
    /// When the photo was captured or imported
    pub captured_at: DateTime<Utc>,
    /// None means "no location data", not (0, 0)
    pub coordinate: Option<Coordinate>,
    /// None means "unnamed"
    pub display_name: Option<String>,
}

impl MediaRecord {
    /// Name shown in titles and marker labels
    pub fn title(&self) -> &str {
        self.display_name.as_deref().unwrap_or("Unnamed photo")
    }

    /// Local filesystem path for `file://` URIs and bare paths
    pub fn local_path(&self) -> &str {
        self.uri.strip_prefix("file://").unwrap_or(&self.uri)
    }
}

/// Trimmed name, or None for a blank one ("unnamed")
pub fn normalize_display_name(name: &str) -> Option<String> {
    let name = name.trim();
    (!name.is_empty()).then(|| name.to_string())
}

/// Fields supplied when adding an image; the catalog fills in the rest
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewImage {
    pub uri: String,
    pub coordinate: Option<Coordinate>,
    pub captured_at: Option<DateTime<Utc>>,
    pub display_name: Option<String>,
}

impl NewImage {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            ..Default::default()
        }
    }

    pub fn with_coordinate(mut self, coordinate: Option<Coordinate>) -> Self {
        self.coordinate = coordinate;
        self
    }

    pub fn with_captured_at(mut self, captured_at: DateTime<Utc>) -> Self {
        self.captured_at = Some(captured_at);
        self
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_validity() {
        assert!(Coordinate::new(37.0, -122.0).is_valid());
        assert!(!Coordinate::new(91.0, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, f64::NAN).is_valid());
    }

    #[test]
    fn test_local_path_strips_file_scheme() {
        let record = MediaRecord {
            id: 1,
            uri: "file:///home/me/pic.jpg".to_string(),
            captured_at: Utc::now(),
            coordinate: None,
            display_name: None,
        };
        assert_eq!(record.local_path(), "/home/me/pic.jpg");
        assert_eq!(record.title(), "Unnamed photo");
        assert_eq!(record.coordinate, None);
    }

    #[test]
    fn test_normalize_display_name() {
        assert_eq!(normalize_display_name("  Beach "), Some("Beach".to_string()));
        assert_eq!(normalize_display_name("   "), None);
    }
}
