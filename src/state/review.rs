/// Full-screen review of a single photo
///
/// Tracks the vertical drag that slides the photo up to reveal a map of
/// where it was taken, the snap animation that follows a release, and the
/// rename/delete/share intents issued from the same screen.
///
/// Offsets are in logical pixels, negative meaning "moved up". The offset
/// never goes above zero.

use log::debug;
use std::time::{Duration, Instant};

use super::data::{normalize_display_name, Coordinate, MediaRecord};
use super::gallery::{MapRegion, MarkerLabel};

/// Upward travel needed on release to commit to showing the map
pub const REVEAL_THRESHOLD: f32 = 100.0;

/// Movement below this is a tap, not a drag
pub const GESTURE_SLOP: f32 = 10.0;

/// Length of the snap animation after a release
pub const SNAP_DURATION: Duration = Duration::from_millis(300);

/// A programmatic slide between two offsets; its target never changes once started
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snap {
    from: f32,
    to: f32,
    started: Instant,
    /// The map was showing when this snap began
    was_open: bool,
}

impl Snap {
    fn progress(&self, now: Instant) -> f32 {
        let elapsed = now.saturating_duration_since(self.started);
        (elapsed.as_secs_f32() / SNAP_DURATION.as_secs_f32()).min(1.0)
    }

    fn offset_at(&self, now: Instant) -> f32 {
        let t = ease_in_out(self.progress(now));
        (self.from + (self.to - self.from) * t).min(0.0)
    }

    fn finished(&self, now: Instant) -> bool {
        self.progress(now) >= 1.0
    }
}

/// Where the reveal gesture currently is
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Phase {
    /// Photo at rest, no map
    Resting,
    /// Finger down and moving; `offset` follows the input
    Dragging { offset: f32, from_open: bool },
    /// Released past the threshold, sliding to the full reveal
    SnappingOpen(Snap),
    /// Released short of the threshold (or closing), sliding back to rest
    SnappingClosed(Snap),
    /// Map committed and shown
    MapOpen,
}

/// What the host must do after the state machine settles
#[derive(Debug, Clone, PartialEq)]
pub enum ReviewEffect {
    ShowMap(MapFocus),
    HideMap,
}

/// What the embedded map is given when the reveal commits
#[derive(Debug, Clone, PartialEq)]
pub struct MapFocus {
    pub record_id: i64,
    /// None renders the placeholder instead of a map
    pub coordinate: Option<Coordinate>,
    pub region: Option<MapRegion>,
    pub label: MarkerLabel,
}

/// A rename ready to be written to the catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameRequest {
    pub id: i64,
    pub name: String,
}

/// Flat snapshot of the session, handy for rendering
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewState {
    pub drag_offset: f32,
    pub map_committed: bool,
    pub animating: bool,
    pub edit_buffer: Option<String>,
}

/// One open full-screen review. Never persisted; rebuilt whenever a review opens.
#[derive(Debug, Clone)]
pub struct ReviewSession {
    record: MediaRecord,
    phase: Phase,
    /// Offset of the fully revealed map (negative)
    full_reveal: f32,
    edit_buffer: Option<String>,
    confirming_delete: bool,
}

impl ReviewSession {
    pub fn new(record: MediaRecord, viewport_height: f32) -> Self {
        let mut session = Self {
            record,
            phase: Phase::Resting,
            full_reveal: -REVEAL_THRESHOLD,
            edit_buffer: None,
            confirming_delete: false,
        };
        session.set_viewport_height(viewport_height);
        session
    }

    pub fn record(&self) -> &MediaRecord {
        &self.record
    }

    #[cfg(test)]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The map slides up to cover half the viewport.
    /// Only taken at rest: a drag, snap or open map keeps the reveal it started with.
    pub fn set_viewport_height(&mut self, height: f32) {
        if self.phase == Phase::Resting && height.is_finite() && height > 0.0 {
            self.full_reveal = -(height / 2.0);
        }
    }

    #[cfg(test)]
    pub fn full_reveal(&self) -> f32 {
        self.full_reveal
    }

    // ========== Drag gesture ==========

    /// Feed the total vertical translation since the finger went down.
    /// Returns whether the input moved the photo.
    pub fn drag_to(&mut self, dy: f32) -> bool {
        // A modal dialog owns the screen
        if !dy.is_finite() || self.edit_buffer.is_some() || self.confirming_delete {
            return false;
        }

        match self.phase {
            Phase::Resting => {
                // Only an upward move starts the reveal
                if dy < -GESTURE_SLOP {
                    self.phase = Phase::Dragging {
                        offset: dy,
                        from_open: false,
                    };
                    true
                } else {
                    false
                }
            }
            Phase::MapOpen => {
                if dy > GESTURE_SLOP {
                    self.phase = Phase::Dragging {
                        offset: (self.full_reveal + dy).min(0.0),
                        from_open: true,
                    };
                    true
                } else {
                    false
                }
            }
            Phase::Dragging { from_open, .. } => {
                let base = if from_open { self.full_reveal } else { 0.0 };
                self.phase = Phase::Dragging {
                    offset: (base + dy).min(0.0),
                    from_open,
                };
                true
            }
            // In-flight snaps finish before anything else happens
            Phase::SnappingOpen(_) | Phase::SnappingClosed(_) => false,
        }
    }

    /// Finger lifted. Starts a snap when a drag was in progress.
    pub fn release(&mut self, now: Instant) {
        let Phase::Dragging { offset, from_open } = self.phase else {
            return;
        };

        let open = if from_open {
            // Closing needs the same travel downward
            offset - self.full_reveal < REVEAL_THRESHOLD
        } else {
            -offset >= REVEAL_THRESHOLD
        };

        let target = if open { self.full_reveal } else { 0.0 };
        let snap = Snap {
            from: offset,
            to: target,
            started: now,
            was_open: from_open,
        };
        debug!(
            "Review {}: released at {:.0}px, snapping {}",
            self.record.id,
            offset,
            if open { "open" } else { "closed" }
        );

        self.phase = if open {
            Phase::SnappingOpen(snap)
        } else {
            Phase::SnappingClosed(snap)
        };
    }

    /// Close the map without a gesture
    pub fn collapse(&mut self, now: Instant) {
        if self.phase == Phase::MapOpen {
            self.phase = Phase::SnappingClosed(Snap {
                from: self.full_reveal,
                to: 0.0,
                started: now,
                was_open: true,
            });
        }
    }

    /// Advance the snap animation; returns an effect when it settles
    pub fn tick(&mut self, now: Instant) -> Option<ReviewEffect> {
        match self.phase {
            Phase::SnappingOpen(snap) if snap.finished(now) => {
                self.phase = Phase::MapOpen;
                Some(ReviewEffect::ShowMap(self.map_focus()))
            }
            Phase::SnappingClosed(snap) if snap.finished(now) => {
                self.phase = Phase::Resting;
                snap.was_open.then_some(ReviewEffect::HideMap)
            }
            _ => None,
        }
    }

    /// Current vertical translation of the photo
    pub fn drag_offset(&self, now: Instant) -> f32 {
        match self.phase {
            Phase::Resting => 0.0,
            Phase::Dragging { offset, .. } => offset,
            Phase::SnappingOpen(snap) | Phase::SnappingClosed(snap) => snap.offset_at(now),
            Phase::MapOpen => self.full_reveal,
        }
    }

    pub fn is_animating(&self) -> bool {
        matches!(self.phase, Phase::SnappingOpen(_) | Phase::SnappingClosed(_))
    }

    pub fn map_committed(&self) -> bool {
        self.phase == Phase::MapOpen
    }

    /// Map content stays up from the moment it commits until a close settles
    pub fn map_visible(&self) -> bool {
        match self.phase {
            Phase::MapOpen => true,
            Phase::Dragging { from_open, .. } => from_open,
            Phase::SnappingOpen(snap) | Phase::SnappingClosed(snap) => snap.was_open,
            Phase::Resting => false,
        }
    }

    pub fn state(&self, now: Instant) -> ReviewState {
        ReviewState {
            drag_offset: self.drag_offset(now),
            map_committed: self.map_committed(),
            animating: self.is_animating(),
            edit_buffer: self.edit_buffer.clone(),
        }
    }

    pub fn map_focus(&self) -> MapFocus {
        MapFocus {
            record_id: self.record.id,
            coordinate: self.record.coordinate,
            region: self.record.coordinate.map(MapRegion::focus),
            label: MarkerLabel::for_record(&self.record),
        }
    }

    // ========== Rename ==========

    /// Open the rename dialog seeded with the current name
    pub fn begin_rename(&mut self) {
        self.edit_buffer = Some(self.record.display_name.clone().unwrap_or_default());
    }

    pub fn edit_rename(&mut self, text: String) {
        if let Some(buffer) = self.edit_buffer.as_mut() {
            *buffer = text;
        }
    }

    pub fn cancel_rename(&mut self) {
        self.edit_buffer = None;
    }

    #[cfg(test)]
    pub fn edit_buffer(&self) -> Option<&str> {
        self.edit_buffer.as_deref()
    }

    /// The write to issue for Save. The dialog stays open until it lands.
    pub fn submit_rename(&self) -> Option<RenameRequest> {
        self.edit_buffer.as_ref().map(|name| RenameRequest {
            id: self.record.id,
            name: name.clone(),
        })
    }

    /// The catalog accepted the name: update the shown record in place
    pub fn rename_applied(&mut self, name: &str) {
        self.record.display_name = normalize_display_name(name);
        self.edit_buffer = None;
    }

    /// The write failed: keep the dialog open with what was typed so Save can be retried
    pub fn rename_failed(&mut self, attempted: String) {
        self.edit_buffer = Some(attempted);
    }

    // ========== Delete & share ==========

    pub fn request_delete(&mut self) {
        self.confirming_delete = true;
    }

    pub fn cancel_delete(&mut self) {
        self.confirming_delete = false;
    }

    #[cfg(test)]
    pub fn is_confirming_delete(&self) -> bool {
        self.confirming_delete
    }

    /// The id to delete, once the user confirmed
    pub fn confirm_delete(&mut self) -> Option<i64> {
        std::mem::take(&mut self.confirming_delete).then_some(self.record.id)
    }

    /// Handed to the platform's share mechanism
    pub fn share_uri(&self) -> &str {
        &self.record.uri
    }
}

fn ease_in_out(t: f32) -> f32 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::data::NewImage;
    use crate::state::library::Library;
    use chrono::Utc;

    const HEIGHT: f32 = 800.0;

    fn record(coordinate: Option<Coordinate>) -> MediaRecord {
        MediaRecord {
            id: 7,
            uri: "img1".to_string(),
            captured_at: Utc::now(),
            coordinate,
            display_name: Some("Pier".to_string()),
        }
    }

    fn session() -> ReviewSession {
        ReviewSession::new(record(Some(Coordinate::new(37.0, -122.0))), HEIGHT)
    }

    /// Drag to `dy`, release, and let the snap settle
    fn swipe(session: &mut ReviewSession, dy: f32, t0: Instant) -> Option<ReviewEffect> {
        session.drag_to(dy);
        session.release(t0);
        session.tick(t0 + SNAP_DURATION)
    }

    #[test]
    fn test_drag_of_exactly_threshold_opens_map() {
        let mut session = session();
        let t0 = Instant::now();

        session.drag_to(-REVEAL_THRESHOLD);
        session.release(t0);
        assert!(matches!(session.phase(), Phase::SnappingOpen(_)));
        assert!(session.is_animating());

        let effect = session.tick(t0 + SNAP_DURATION);
        assert_eq!(session.phase(), Phase::MapOpen);
        assert!(matches!(effect, Some(ReviewEffect::ShowMap(_))));
    }

    #[test]
    fn test_drag_just_short_of_threshold_snaps_back() {
        let mut session = session();
        let t0 = Instant::now();

        session.drag_to(-99.0);
        session.release(t0);
        assert!(matches!(session.phase(), Phase::SnappingClosed(_)));

        let midway = session.drag_offset(t0 + SNAP_DURATION / 2);
        assert!(midway < 0.0 && midway > -99.0);

        assert_eq!(session.tick(t0 + SNAP_DURATION), None);
        assert_eq!(session.phase(), Phase::Resting);
        assert_eq!(session.drag_offset(t0 + SNAP_DURATION), 0.0);
        assert!(!session.map_committed());
    }

    #[test]
    fn test_drag_to_minus_120_commits_full_reveal() {
        let mut session = session();
        let t0 = Instant::now();

        session.drag_to(-120.0);
        session.release(t0);
        assert_eq!(session.drag_offset(t0), -120.0);

        session.tick(t0 + SNAP_DURATION);
        let state = session.state(t0 + SNAP_DURATION);
        assert!(state.map_committed);
        assert!(!state.animating);
        assert_eq!(state.drag_offset, -HEIGHT / 2.0);
    }

    #[test]
    fn test_offset_never_goes_positive() {
        let mut session = session();
        let t0 = Instant::now();

        for dy in [-20.0, 40.0, 300.0, 5.0, -150.0] {
            session.drag_to(dy);
            assert!(session.drag_offset(t0) <= 0.0);
        }

        session.release(t0);
        let mut t = t0;
        while t <= t0 + SNAP_DURATION {
            assert!(session.drag_offset(t) <= 0.0);
            session.tick(t);
            t += Duration::from_millis(16);
        }
        session.tick(t);
        assert_eq!(session.phase(), Phase::MapOpen);

        // Pulling down hard from the open map still clamps at rest
        session.drag_to(HEIGHT * 3.0);
        assert_eq!(session.drag_offset(t), 0.0);
    }

    #[test]
    fn test_downward_or_tiny_moves_at_rest_do_not_start_a_drag() {
        let mut session = session();
        assert!(!session.drag_to(50.0));
        assert!(!session.drag_to(-GESTURE_SLOP / 2.0));
        assert_eq!(session.phase(), Phase::Resting);

        session.release(Instant::now());
        assert_eq!(session.phase(), Phase::Resting);
    }

    #[test]
    fn test_snap_in_flight_ignores_new_gesture() {
        let mut session = session();
        let t0 = Instant::now();

        session.drag_to(-150.0);
        session.release(t0);

        let halfway = t0 + SNAP_DURATION / 2;
        assert!(!session.drag_to(-10.0));
        assert!(!session.drag_to(200.0));
        session.release(halfway);
        assert!(matches!(session.phase(), Phase::SnappingOpen(_)));

        session.tick(t0 + SNAP_DURATION);
        assert_eq!(session.phase(), Phase::MapOpen);
    }

    #[test]
    fn test_map_focus_carries_coordinate_and_label() {
        let mut session = session();
        let t0 = Instant::now();

        let Some(ReviewEffect::ShowMap(focus)) = swipe(&mut session, -200.0, t0) else {
            panic!("expected the map to open");
        };
        assert_eq!(focus.record_id, 7);
        assert_eq!(focus.coordinate, Some(Coordinate::new(37.0, -122.0)));
        assert_eq!(focus.region.unwrap().center, Coordinate::new(37.0, -122.0));
        assert_eq!(focus.label.title, "Pier");
    }

    #[test]
    fn test_missing_coordinate_still_opens_with_placeholder() {
        let mut session = ReviewSession::new(record(None), HEIGHT);

        let Some(ReviewEffect::ShowMap(focus)) = swipe(&mut session, -200.0, Instant::now()) else {
            panic!("expected the map to open");
        };
        assert_eq!(focus.coordinate, None);
        assert_eq!(focus.region, None);
        assert!(session.map_committed());
    }

    #[test]
    fn test_dragging_down_from_open_map_closes_it() {
        let mut session = session();
        let t0 = Instant::now();
        swipe(&mut session, -200.0, t0);

        // A short pull snaps back open
        let t1 = t0 + SNAP_DURATION * 2;
        assert_eq!(swipe(&mut session, 50.0, t1), Some(ReviewEffect::ShowMap(session.map_focus())));
        assert_eq!(session.phase(), Phase::MapOpen);

        let t2 = t1 + SNAP_DURATION * 2;
        session.drag_to(REVEAL_THRESHOLD + 20.0);
        assert!(session.map_visible());
        session.release(t2);
        assert!(matches!(session.phase(), Phase::SnappingClosed(_)));
        assert!(session.map_visible());

        assert_eq!(session.tick(t2 + SNAP_DURATION), Some(ReviewEffect::HideMap));
        assert_eq!(session.phase(), Phase::Resting);
        assert!(!session.map_visible());
    }

    #[test]
    fn test_collapse_closes_open_map() {
        let mut session = session();
        let t0 = Instant::now();
        swipe(&mut session, -200.0, t0);

        let t1 = t0 + SNAP_DURATION * 2;
        session.collapse(t1);
        assert!(session.is_animating());
        assert_eq!(session.tick(t1 + SNAP_DURATION), Some(ReviewEffect::HideMap));
        assert_eq!(session.drag_offset(t1 + SNAP_DURATION), 0.0);
    }

    #[test]
    fn test_rename_cancel_discards_buffer() {
        let mut session = session();
        session.begin_rename();
        assert_eq!(session.edit_buffer(), Some("Pier"));

        session.edit_rename("Dock".to_string());
        session.cancel_rename();
        assert_eq!(session.edit_buffer(), None);
        assert_eq!(session.submit_rename(), None);
        assert_eq!(session.record().display_name.as_deref(), Some("Pier"));
    }

    #[test]
    fn test_rename_failure_keeps_dialog_open() {
        let mut session = session();
        session.begin_rename();
        session.edit_rename("Dock".to_string());
        let request = session.submit_rename().unwrap();

        session.cancel_rename();
        session.rename_failed(request.name);
        assert_eq!(session.edit_buffer(), Some("Dock"));
        assert_eq!(session.record().display_name.as_deref(), Some("Pier"));
    }

    #[tokio::test]
    async fn test_rename_round_trip_through_catalog() {
        let library = Library::open_in_memory().unwrap();
        let stored = library
            .add_image(NewImage::new("img1").with_display_name("Pier"))
            .await
            .unwrap();

        let mut session = ReviewSession::new(stored.clone(), HEIGHT);
        session.begin_rename();
        session.edit_rename("  Golden Gate ".to_string());

        let request = session.submit_rename().unwrap();
        library.rename_image(request.id, request.name.clone()).await.unwrap();
        session.rename_applied(&request.name);

        assert_eq!(session.edit_buffer(), None);
        assert_eq!(session.record(), &library.get_image(stored.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_requires_confirmation() {
        let library = Library::open_in_memory().unwrap();
        let stored = library.add_image(NewImage::new("img1")).await.unwrap();
        let mut session = ReviewSession::new(stored, HEIGHT);

        assert_eq!(session.confirm_delete(), None);

        session.request_delete();
        session.cancel_delete();
        assert_eq!(session.confirm_delete(), None);

        session.request_delete();
        let id = session.confirm_delete().unwrap();
        assert!(!session.is_confirming_delete());

        library.delete_image(id).await.unwrap();
        assert!(library.list_images().await.unwrap().is_empty());
    }

    #[test]
    fn test_viewport_change_mid_snap_keeps_reveal_target() {
        let mut session = session();
        let t0 = Instant::now();

        session.drag_to(-150.0);
        session.release(t0);
        session.set_viewport_height(HEIGHT / 2.0);
        assert_eq!(session.full_reveal(), -(HEIGHT / 2.0));

        session.tick(t0 + SNAP_DURATION);
        assert_eq!(session.phase(), Phase::MapOpen);
        assert_eq!(session.drag_offset(t0 + SNAP_DURATION), -(HEIGHT / 2.0));

        // Still ignored while the map is open
        session.set_viewport_height(HEIGHT * 2.0);
        assert_eq!(session.drag_offset(t0 + SNAP_DURATION), -(HEIGHT / 2.0));
    }

    #[test]
    fn test_viewport_change_at_rest_moves_reveal_target() {
        let mut session = session();
        session.set_viewport_height(HEIGHT / 2.0);
        assert_eq!(session.full_reveal(), -(HEIGHT / 4.0));

        let t0 = Instant::now();
        swipe(&mut session, -150.0, t0);
        assert_eq!(session.drag_offset(t0 + SNAP_DURATION), -(HEIGHT / 4.0));
    }

    #[test]
    fn test_open_dialog_blocks_drag() {
        let mut session = session();
        session.begin_rename();
        assert!(!session.drag_to(-150.0));
        assert_eq!(session.phase(), Phase::Resting);

        session.cancel_rename();
        session.request_delete();
        assert!(!session.drag_to(-150.0));
        assert_eq!(session.drag_offset(Instant::now()), 0.0);

        session.cancel_delete();
        assert!(session.drag_to(-150.0));
    }

    #[test]
    fn test_share_hands_out_the_uri() {
        assert_eq!(session().share_uri(), "img1");
    }
}
