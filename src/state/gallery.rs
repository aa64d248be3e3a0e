/// Gallery browsing modes and the data the map views consume

use chrono::Local;

use super::data::{Coordinate, MediaRecord};

/// Which top-level view is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Gallery,
    Map,
}

/// Base layer for the map views
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MapType {
    #[default]
    Standard,
    Satellite,
}

impl MapType {
    pub fn toggled(self) -> Self {
        match self {
            MapType::Standard => MapType::Satellite,
            MapType::Satellite => MapType::Standard,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MapType::Standard => "Standard",
            MapType::Satellite => "Satellite",
        }
    }
}

/// Visible map area: a centre plus the span in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapRegion {
    pub center: Coordinate,
    pub latitude_delta: f64,
    pub longitude_delta: f64,
}

impl MapRegion {
    /// Street-level view around a single photo
    pub fn focus(center: Coordinate) -> Self {
        Self {
            center,
            latitude_delta: 0.005,
            longitude_delta: 0.005,
        }
    }

    /// Smallest area that holds every coordinate, padded and never tighter
    /// than country level
    pub fn enclosing(coordinates: &[Coordinate]) -> Option<Self> {
        let first = coordinates.first()?;
        let (mut south, mut north) = (first.latitude, first.latitude);
        let (mut west, mut east) = (first.longitude, first.longitude);
        for c in &coordinates[1..] {
            south = south.min(c.latitude);
            north = north.max(c.latitude);
            west = west.min(c.longitude);
            east = east.max(c.longitude);
        }

        Some(Self {
            center: Coordinate::new((south + north) / 2.0, (west + east) / 2.0),
            latitude_delta: ((north - south) * OVERVIEW_PADDING).max(OVERVIEW_MIN_SPAN),
            longitude_delta: ((east - west) * OVERVIEW_PADDING).max(OVERVIEW_MIN_SPAN),
        })
    }
}

/// Narrowest span of the all-photos map, in degrees
pub const OVERVIEW_MIN_SPAN: f64 = 10.0;
/// Headroom around the outermost markers
const OVERVIEW_PADDING: f64 = 1.2;

/// Text attached to a map marker
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerLabel {
    pub title: String,
    /// e.g. "Taken on 2024-05-01 at 14:32"
    pub captured: String,
}

impl MarkerLabel {
    pub fn for_record(record: &MediaRecord) -> Self {
        let local = record.captured_at.with_timezone(&Local);
        Self {
            title: record.title().to_string(),
            captured: format!(
                "Taken on {} at {}",
                local.format("%Y-%m-%d"),
                local.format("%H:%M")
            ),
        }
    }
}

/// One pin on the all-photos map
#[derive(Debug, Clone, PartialEq)]
pub struct MapMarker {
    pub id: i64,
    pub coordinate: Coordinate,
    pub label: MarkerLabel,
}

/// Markers for every record that has location data, in list order
pub fn map_markers(records: &[MediaRecord]) -> Vec<MapMarker> {
    records
        .iter()
        .filter_map(|record| {
            record.coordinate.map(|coordinate| MapMarker {
                id: record.id,
                coordinate,
                label: MarkerLabel::for_record(record),
            })
        })
        .collect()
}

/// Region for the all-photos map, showing every marker; None shows the empty state
pub fn overview_region(markers: &[MapMarker]) -> Option<MapRegion> {
    let coordinates: Vec<Coordinate> = markers.iter().map(|m| m.coordinate).collect();
    MapRegion::enclosing(&coordinates)
}

/// Resolve a marker tap back to its record
pub fn find_record(records: &[MediaRecord], id: i64) -> Option<&MediaRecord> {
    records.iter().find(|record| record.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn record(id: i64, coordinate: Option<Coordinate>) -> MediaRecord {
        MediaRecord {
            id,
            uri: format!("img{}", id),
            captured_at: Utc::now(),
            coordinate,
            display_name: None,
        }
    }

    #[test]
    fn test_markers_skip_records_without_location() {
        let records = vec![
            record(3, Some(Coordinate::new(12.9, 77.6))),
            record(2, None),
            record(1, Some(Coordinate::new(37.0, -122.0))),
        ];

        let markers = map_markers(&records);
        let ids: Vec<i64> = markers.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![3, 1]);
        assert_eq!(markers[0].label.title, "Unnamed photo");
        assert!(markers[0].label.captured.starts_with("Taken on "));

        let region = overview_region(&markers).unwrap();
        assert!((region.center.latitude - 24.95).abs() < 1e-9);
        assert!((region.center.longitude - -22.2).abs() < 1e-9);
        assert!(region.latitude_delta >= 37.0 - 12.9);
        assert!(region.longitude_delta >= 77.6 + 122.0);
    }

    #[test]
    fn test_single_marker_gets_country_level_region() {
        let markers = map_markers(&[record(1, Some(Coordinate::new(12.9, 77.6)))]);
        let region = overview_region(&markers).unwrap();
        assert_eq!(region.center, Coordinate::new(12.9, 77.6));
        assert_eq!(region.latitude_delta, OVERVIEW_MIN_SPAN);
        assert_eq!(region.longitude_delta, OVERVIEW_MIN_SPAN);
    }

    #[test]
    fn test_capture_label_uses_local_time() {
        let local = Local.with_ymd_and_hms(2024, 5, 1, 14, 32, 0).unwrap();
        let mut photo = record(1, None);
        photo.captured_at = local.with_timezone(&Utc);
        assert_eq!(MarkerLabel::for_record(&photo).captured, "Taken on 2024-05-01 at 14:32");
    }

    #[test]
    fn test_no_markers_means_empty_state() {
        let records = vec![record(1, None)];
        assert!(overview_region(&map_markers(&records)).is_none());
    }

    #[test]
    fn test_marker_tap_finds_record() {
        let records = vec![record(1, None), record(2, None)];
        assert_eq!(find_record(&records, 2).map(|r| r.id), Some(2));
        assert!(find_record(&records, 5).is_none());
    }

    #[test]
    fn test_map_type_toggle() {
        assert_eq!(MapType::default().toggled(), MapType::Satellite);
        assert_eq!(MapType::Satellite.toggled(), MapType::Standard);
        assert_eq!(Tab::default(), Tab::Gallery);
    }
}
