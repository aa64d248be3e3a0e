/// Stand-in map surfaces
///
/// Real tiles are out of scope; these canvases paint a plain backdrop
/// with a graticule and the photo pins so location is still readable.
use iced::mouse::{self, Cursor};
use iced::widget::canvas::{self, Path, Stroke};
use iced::{Color, Point, Rectangle, Renderer, Size, Theme};

use crate::state::data::Coordinate;
use crate::state::gallery::{MapMarker, MapRegion, MapType};
use crate::state::review::MapFocus;
use crate::Message;

const PIN_RADIUS: f32 = 7.0;
/// How close a click must land to a pin to count as a tap
const TAP_RADIUS: f32 = 14.0;

/// Map embedded in the review screen, showing one photo's location
#[derive(Debug, Clone)]
pub struct FocusMap {
    /// None while the reveal hasn't committed yet
    pub focus: Option<MapFocus>,
    pub map_type: MapType,
}

impl canvas::Program<Message> for FocusMap {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: Cursor,
    ) -> Vec<canvas::Geometry> {
        let mut frame = canvas::Frame::new(renderer, bounds.size());
        paint_backdrop(&mut frame, bounds.size(), self.map_type);

        let Some(focus) = &self.focus else {
            return vec![frame.into_geometry()];
        };

        match (focus.coordinate, focus.region) {
            (Some(coordinate), Some(region)) => {
                let pin = project(coordinate, &region, bounds.size());
                paint_pin(&mut frame, pin, self.map_type);
                paint_caption(
                    &mut frame,
                    &[
                        focus.label.title.as_str(),
                        focus.label.captured.as_str(),
                        coordinate.display().as_str(),
                    ],
                    self.map_type,
                );
            }
            _ => {
                paint_caption(
                    &mut frame,
                    &[focus.label.title.as_str(), "No location data"],
                    self.map_type,
                );
            }
        }

        vec![frame.into_geometry()]
    }
}

/// The all-photos map; clicking a pin reports its record id
#[derive(Debug, Clone)]
pub struct OverviewMap {
    pub markers: Vec<MapMarker>,
    pub region: MapRegion,
    pub map_type: MapType,
}

impl canvas::Program<Message> for OverviewMap {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> Vec<canvas::Geometry> {
        let mut frame = canvas::Frame::new(renderer, bounds.size());
        paint_backdrop(&mut frame, bounds.size(), self.map_type);

        for marker in &self.markers {
            let pin = project(marker.coordinate, &self.region, bounds.size());
            paint_pin(&mut frame, pin, self.map_type);
        }

        // Label the pin under the cursor
        if let Some(hovered) = cursor
            .position_in(bounds)
            .and_then(|pos| self.marker_at(pos, bounds.size()))
        {
            paint_caption(
                &mut frame,
                &[hovered.label.title.as_str(), hovered.label.captured.as_str()],
                self.map_type,
            );
        }

        vec![frame.into_geometry()]
    }

    fn update(
        &self,
        _state: &mut Self::State,
        event: canvas::Event,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> (canvas::event::Status, Option<Message>) {
        if let canvas::Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) = event {
            if let Some(marker) = cursor
                .position_in(bounds)
                .and_then(|pos| self.marker_at(pos, bounds.size()))
            {
                return (
                    canvas::event::Status::Captured,
                    Some(Message::MarkerTapped(marker.id)),
                );
            }
        }
        (canvas::event::Status::Ignored, None)
    }

    fn mouse_interaction(
        &self,
        _state: &Self::State,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> mouse::Interaction {
        match cursor.position_in(bounds) {
            Some(pos) if self.marker_at(pos, bounds.size()).is_some() => mouse::Interaction::Pointer,
            _ => mouse::Interaction::default(),
        }
    }
}

impl OverviewMap {
    /// The closest pin within tap range of `pos`
    fn marker_at(&self, pos: Point, size: Size) -> Option<&MapMarker> {
        self.markers
            .iter()
            .map(|m| (m, project(m.coordinate, &self.region, size).distance(pos)))
            .filter(|(_, distance)| *distance <= TAP_RADIUS)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(m, _)| m)
    }
}

/// Equirectangular projection of `coordinate` into a `size` canvas showing `region`
pub fn project(coordinate: Coordinate, region: &MapRegion, size: Size) -> Point {
    let west = region.center.longitude - region.longitude_delta / 2.0;
    let north = region.center.latitude + region.latitude_delta / 2.0;

    let x = (coordinate.longitude - west) / region.longitude_delta;
    let y = (north - coordinate.latitude) / region.latitude_delta;

    Point::new(x as f32 * size.width, y as f32 * size.height)
}

fn palette(map_type: MapType) -> (Color, Color, Color) {
    // (background, grid, ink)
    match map_type {
        MapType::Standard => (
            Color::from_rgb(0.93, 0.92, 0.87),
            Color::from_rgba(0.0, 0.0, 0.0, 0.08),
            Color::from_rgb(0.1, 0.1, 0.1),
        ),
        MapType::Satellite => (
            Color::from_rgb(0.12, 0.2, 0.14),
            Color::from_rgba(1.0, 1.0, 1.0, 0.08),
            Color::WHITE,
        ),
    }
}

fn paint_backdrop(frame: &mut canvas::Frame, size: Size, map_type: MapType) {
    let (background, grid, _) = palette(map_type);
    frame.fill_rectangle(Point::ORIGIN, size, background);

    let mut lines = canvas::path::Builder::new();
    let step = 48.0;
    let mut x = 0.0;
    while x < size.width {
        lines.move_to(Point::new(x, 0.0));
        lines.line_to(Point::new(x, size.height));
        x += step;
    }
    let mut y = 0.0;
    while y < size.height {
        lines.move_to(Point::new(0.0, y));
        lines.line_to(Point::new(size.width, y));
        y += step;
    }
    frame.stroke(&lines.build(), Stroke::default().with_color(grid).with_width(1.0));
}

fn paint_pin(frame: &mut canvas::Frame, at: Point, map_type: MapType) {
    let (_, _, ink) = palette(map_type);
    frame.fill(&Path::circle(at, PIN_RADIUS), Color::from_rgb(0.86, 0.2, 0.24));
    frame.stroke(
        &Path::circle(at, PIN_RADIUS),
        Stroke::default().with_color(ink).with_width(1.5),
    );
}

fn paint_caption(frame: &mut canvas::Frame, lines: &[&str], map_type: MapType) {
    let (_, _, ink) = palette(map_type);
    let line_height = 20.0;
    let top = frame.height() - 16.0 - line_height * lines.len() as f32;

    for (i, line) in lines.iter().enumerate() {
        frame.fill_text(canvas::Text {
            content: line.to_string(),
            position: Point::new(16.0, top + i as f32 * line_height),
            color: ink,
            size: (if i == 0 { 18.0 } else { 14.0 }).into(),
            ..canvas::Text::default()
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::data::MediaRecord;
    use crate::state::gallery::{map_markers, overview_region};
    use chrono::Utc;

    #[test]
    fn test_region_center_projects_to_canvas_center() {
        let region = MapRegion::focus(Coordinate::new(37.0, -122.0));
        let center = project(region.center, &region, Size::new(400.0, 200.0));
        assert!((center.x - 200.0).abs() < 0.01);
        assert!((center.y - 100.0).abs() < 0.01);
    }

    #[test]
    fn test_north_west_corner_is_origin() {
        let region = MapRegion {
            center: Coordinate::new(0.0, 0.0),
            latitude_delta: 10.0,
            longitude_delta: 10.0,
        };
        let corner = project(Coordinate::new(5.0, -5.0), &region, Size::new(100.0, 100.0));
        assert!(corner.x.abs() < 0.01 && corner.y.abs() < 0.01);
    }

    fn record(id: i64, latitude: f64, longitude: f64) -> MediaRecord {
        MediaRecord {
            id,
            uri: format!("img{}", id),
            captured_at: Utc::now(),
            coordinate: Some(Coordinate::new(latitude, longitude)),
            display_name: None,
        }
    }

    #[test]
    fn test_every_marker_lands_on_the_overview_canvas() {
        let records = vec![
            record(4, 37.0, -122.0),
            record(3, 12.9, 77.6),
            record(2, -33.9, 151.2),
            record(1, 64.1, -21.9),
        ];
        let markers = map_markers(&records);
        let map = OverviewMap {
            region: overview_region(&markers).unwrap(),
            markers,
            map_type: MapType::Standard,
        };
        let size = Size::new(800.0, 600.0);

        for marker in &map.markers {
            let pin = project(marker.coordinate, &map.region, size);
            assert!((0.0..=size.width).contains(&pin.x), "{} off canvas at {:?}", marker.id, pin);
            assert!((0.0..=size.height).contains(&pin.y), "{} off canvas at {:?}", marker.id, pin);

            // Tapping the pin reports its record
            assert_eq!(map.marker_at(pin, size).map(|m| m.id), Some(marker.id));
        }
    }
}
