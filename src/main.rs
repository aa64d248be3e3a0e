use iced::widget::{
    button, canvas, column, container, image, opaque, row, scrollable, stack, text, text_input,
    Column, Space,
};
use iced::{window, Alignment, ContentFit, Element, Length, Subscription, Task, Theme};
use iced_aw::Wrap;
use log::{error, info, warn};
use rfd::{FileDialog, MessageButtons, MessageDialog, MessageDialogResult, MessageLevel};
use std::sync::Arc;
use std::time::Instant;

mod config;
mod error;
mod location;
mod state;
mod ui;

use config::Config;
use location::{DevicePosition, IpLookup, Resolver};
use state::capture::{self, CaptureOutcome, ImportSummary, IMAGE_EXTENSIONS};
use state::data::MediaRecord;
use state::gallery::{self as browse, MapType, MarkerLabel, Tab};
use state::library::Library;
use state::review::{MapFocus, RenameRequest, ReviewEffect, ReviewSession};
use ui::{FocusMap, Gesture, OverviewMap, RevealSurface};

type AppResolver = Resolver<DevicePosition, IpLookup>;

/// Height assumed for the review area until the first gesture reports the real one
const DEFAULT_VIEWPORT_HEIGHT: f32 = 720.0;
const THUMBNAIL_SIZE: f32 = 160.0;

/// Main application state
struct GeoGallery {
    /// The photo catalog
    library: Library,
    resolver: Arc<AppResolver>,
    /// Every record, newest first, as last loaded from the catalog
    images: Vec<MediaRecord>,
    tab: Tab,
    map_type: MapType,
    /// Full-screen review of one photo, if open
    review: Option<ReviewSession>,
    /// What the review map shows; set when the reveal commits
    map_focus: Option<MapFocus>,
    viewport_height: f32,
    /// Status message to display to the user
    status: String,
}

/// Application messages (events)
#[derive(Debug, Clone)]
pub enum Message {
    ImagesLoaded(Result<Vec<MediaRecord>, String>),
    Refresh,
    SelectTab(Tab),
    ToggleMapType,

    /// User clicked "Add Photo"
    AddPhoto,
    PhotoCaptured(Result<CaptureOutcome, String>),
    /// User clicked "Import Folder"
    ImportFolder,
    ImportComplete(Result<ImportSummary, String>),

    OpenReview(i64),
    /// Pin tapped on the all-photos map
    MarkerTapped(i64),
    MarkerResolved(Result<MediaRecord, String>),
    CloseReview,
    Gesture(Gesture),
    /// Animation frame while a snap is in flight
    Frame(Instant),
    CollapseMap,

    BeginRename,
    RenameEdited(String),
    CancelRename,
    SaveRename,
    RenameSaved(RenameRequest, Result<(), String>),
    RequestDelete,
    DeleteFinished(Result<(), String>),
    Share,

    CloseRequested(window::Id),
    CatalogClosed,
}

impl GeoGallery {
    /// Create a new instance of the application
    fn new(config: Config) -> (Self, Task<Message>) {
        // The app cannot function without its catalog
        let library = match config.database_path() {
            Some(path) => Library::open(path),
            None => {
                warn!("⚠️  No data directory found, using an in-memory catalog");
                Library::open_in_memory()
            }
        }
        .expect("Failed to open the photo catalog. Check permissions and disk space.");

        let resolver = Resolver::new(
            DevicePosition::from_config(&config.location),
            IpLookup::new(config.location.lookup_url.clone()),
        )
        .with_timeout(config.location.fix_timeout());

        info!("🗺️  Geo Gallery initialized");
        let status = match library.path() {
            Some(path) => format!("Ready. Catalog at {}", path.display()),
            None => "Ready. Photos will not be kept after exit.".to_string(),
        };

        let app = GeoGallery {
            library,
            resolver: Arc::new(resolver),
            images: Vec::new(),
            tab: Tab::default(),
            map_type: MapType::default(),
            review: None,
            map_focus: None,
            viewport_height: DEFAULT_VIEWPORT_HEIGHT,
            status,
        };
        let load = app.reload();
        (app, load)
    }

    /// Fetch the full list from the catalog
    fn reload(&self) -> Task<Message> {
        Task::perform(self.library.list_images(), |result| {
            Message::ImagesLoaded(result.map_err(|e| e.to_string()))
        })
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::ImagesLoaded(Ok(images)) => {
                self.images = images;
                Task::none()
            }
            Message::ImagesLoaded(Err(e)) => {
                error!("Failed to load images: {}", e);
                alert("Error", "Failed to load images", MessageLevel::Error);
                Task::none()
            }
            Message::Refresh => self.reload(),
            Message::SelectTab(tab) => {
                self.tab = tab;
                Task::none()
            }
            Message::ToggleMapType => {
                self.map_type = self.map_type.toggled();
                Task::none()
            }

            Message::AddPhoto => {
                let picked = FileDialog::new()
                    .set_title("Select a Photo")
                    .add_filter("Images", IMAGE_EXTENSIONS.as_slice())
                    .pick_file();

                let Some(path) = picked else {
                    return Task::none();
                };

                self.status = "📍 Finding your location...".to_string();
                let uri = path.to_string_lossy().to_string();
                let library = self.library.clone();
                let resolver = Arc::clone(&self.resolver);
                Task::perform(
                    async move {
                        capture::capture_photo(&library, &resolver, uri)
                            .await
                            .map_err(|e| e.to_string())
                    },
                    Message::PhotoCaptured,
                )
            }
            Message::PhotoCaptured(Ok(outcome)) => {
                self.status = format!("📸 Added {}.", outcome.record.uri);
                if outcome.location_error.is_some() {
                    alert(
                        "Warning",
                        "Failed to get current location. Image saved without location data.",
                        MessageLevel::Warning,
                    );
                }
                self.reload()
            }
            Message::PhotoCaptured(Err(e)) => {
                error!("Failed to save image: {}", e);
                self.status = "Failed to save image.".to_string();
                alert("Error", "Failed to save image", MessageLevel::Error);
                Task::none()
            }
            Message::ImportFolder => {
                // Show the native folder picker dialog
                let folder = FileDialog::new()
                    .set_title("Select Folder with Photos")
                    .pick_folder();

                let Some(folder) = folder else {
                    return Task::none();
                };

                self.status = format!("Importing from {}...", folder.display());
                let library = self.library.clone();
                Task::perform(
                    async move {
                        capture::import_folder(&library, folder)
                            .await
                            .map_err(|e| e.to_string())
                    },
                    Message::ImportComplete,
                )
            }
            Message::ImportComplete(Ok(summary)) => {
                info!(
                    "📊 Import summary: {} new, {} skipped",
                    summary.imported, summary.skipped
                );
                self.status = format!(
                    "✅ Import complete! Added {} photos, skipped {} duplicates.",
                    summary.imported, summary.skipped
                );
                self.reload()
            }
            Message::ImportComplete(Err(e)) => {
                error!("Import failed: {}", e);
                self.status = "Import failed.".to_string();
                alert("Error", "Failed to import folder", MessageLevel::Error);
                self.reload()
            }

            Message::OpenReview(id) => {
                match browse::find_record(&self.images, id) {
                    Some(record) => self.open_review(record.clone()),
                    None => warn!("⚠️  Tapped image {} is no longer in the library", id),
                }
                Task::none()
            }
            Message::MarkerTapped(id) => {
                // Markers can outlive their record; ask the catalog
                Task::perform(self.library.get_image(id), |result| {
                    Message::MarkerResolved(result.map_err(|e| e.to_string()))
                })
            }
            Message::MarkerResolved(Ok(record)) => {
                self.open_review(record);
                Task::none()
            }
            Message::MarkerResolved(Err(e)) => {
                warn!("⚠️  {}", e);
                self.reload()
            }
            Message::CloseReview => {
                self.review = None;
                self.map_focus = None;
                Task::none()
            }
            Message::Gesture(gesture) => {
                let Some(session) = self.review.as_mut() else {
                    return Task::none();
                };
                match gesture {
                    Gesture::Started { viewport_height } => {
                        self.viewport_height = viewport_height;
                        session.set_viewport_height(viewport_height);
                    }
                    Gesture::Moved(dy) => {
                        session.drag_to(dy);
                    }
                    Gesture::Released => session.release(Instant::now()),
                }
                Task::none()
            }
            Message::Frame(now) => {
                if let Some(effect) = self.review.as_mut().and_then(|s| s.tick(now)) {
                    match effect {
                        ReviewEffect::ShowMap(focus) => self.map_focus = Some(focus),
                        ReviewEffect::HideMap => self.map_focus = None,
                    }
                }
                Task::none()
            }
            Message::CollapseMap => {
                if let Some(session) = self.review.as_mut() {
                    session.collapse(Instant::now());
                }
                Task::none()
            }

            Message::BeginRename => {
                if let Some(session) = self.review.as_mut() {
                    session.begin_rename();
                }
                Task::none()
            }
            Message::RenameEdited(value) => {
                if let Some(session) = self.review.as_mut() {
                    session.edit_rename(value);
                }
                Task::none()
            }
            Message::CancelRename => {
                if let Some(session) = self.review.as_mut() {
                    session.cancel_rename();
                }
                Task::none()
            }
            Message::SaveRename => {
                let Some(request) = self.review.as_ref().and_then(|s| s.submit_rename()) else {
                    return Task::none();
                };
                Task::perform(
                    self.library.rename_image(request.id, request.name.clone()),
                    move |result| Message::RenameSaved(request, result.map_err(|e| e.to_string())),
                )
            }
            Message::RenameSaved(request, Ok(())) => {
                if let Some(session) = self.review.as_mut() {
                    if session.record().id == request.id {
                        session.rename_applied(&request.name);
                        if session.map_committed() {
                            self.map_focus = Some(session.map_focus());
                        }
                    }
                }
                self.reload()
            }
            Message::RenameSaved(request, Err(e)) => {
                error!("Failed to rename image {}: {}", request.id, e);
                if let Some(session) = self.review.as_mut() {
                    session.rename_failed(request.name);
                }
                alert("Error", "Failed to rename image", MessageLevel::Error);
                Task::none()
            }
            Message::RequestDelete => {
                let Some(session) = self.review.as_mut() else {
                    return Task::none();
                };
                session.request_delete();

                let confirmed = MessageDialog::new()
                    .set_level(MessageLevel::Warning)
                    .set_title("Delete Image")
                    .set_description("Are you sure you want to delete this image?")
                    .set_buttons(MessageButtons::OkCancel)
                    .show()
                    == MessageDialogResult::Ok;

                if !confirmed {
                    session.cancel_delete();
                    return Task::none();
                }
                match session.confirm_delete() {
                    Some(id) => Task::perform(self.library.delete_image(id), |result| {
                        Message::DeleteFinished(result.map_err(|e| e.to_string()))
                    }),
                    None => Task::none(),
                }
            }
            Message::DeleteFinished(Ok(())) => {
                self.review = None;
                self.map_focus = None;
                self.reload()
            }
            Message::DeleteFinished(Err(e)) => {
                // The review stays open so the user can try again
                error!("Failed to delete image: {}", e);
                alert("Error", "Failed to delete image", MessageLevel::Error);
                Task::none()
            }
            Message::Share => {
                let Some(session) = self.review.as_ref() else {
                    return Task::none();
                };
                self.status = format!("Copied {} to the clipboard.", session.share_uri());
                iced::clipboard::write(session.share_uri().to_string())
            }

            Message::CloseRequested(_) => {
                info!("Closing catalog");
                Task::perform(self.library.close(), |_| Message::CatalogClosed)
            }
            Message::CatalogClosed => iced::exit(),
        }
    }

    fn open_review(&mut self, record: MediaRecord) {
        self.review = Some(ReviewSession::new(record, self.viewport_height));
        self.map_focus = None;
    }

    /// Build the user interface
    fn view(&self) -> Element<Message> {
        if let Some(session) = &self.review {
            return self.review_view(session);
        }

        let tabs = row![
            tab_button("Gallery", Tab::Gallery, self.tab),
            tab_button("Map", Tab::Map, self.tab),
            Space::with_width(Length::Fill),
            button("+ Add Photo").on_press(Message::AddPhoto).padding(10),
            button("Import Folder").on_press(Message::ImportFolder).padding(10),
        ]
        .spacing(10)
        .align_y(Alignment::Center);

        let body = match self.tab {
            Tab::Gallery => self.gallery_view(),
            Tab::Map => self.map_view(),
        };

        let footer = text(format!("{} photos in library. {}", self.images.len(), self.status)).size(14);
        let content: Column<Message> = column![tabs, body, footer]
            .spacing(12)
            .padding(16);

        container(content)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    fn gallery_view(&self) -> Element<Message> {
        if self.images.is_empty() {
            return centered(text("No photos yet. Add one or import a folder.").size(18));
        }

        let thumbnails: Vec<Element<Message>> = self
            .images
            .iter()
            .map(|record| {
                button(
                    image(image::Handle::from_path(record.local_path()))
                        .width(THUMBNAIL_SIZE)
                        .height(THUMBNAIL_SIZE)
                        .content_fit(ContentFit::Cover),
                )
                .on_press(Message::OpenReview(record.id))
                .padding(2)
                .into()
            })
            .collect();

        scrollable(Wrap::with_elements(thumbnails).spacing(4.0).line_spacing(4.0))
            .height(Length::Fill)
            .into()
    }

    fn map_view(&self) -> Element<Message> {
        let markers = browse::map_markers(&self.images);
        let Some(region) = browse::overview_region(&markers) else {
            return centered(text("No images with location data").size(18));
        };

        let map = canvas(OverviewMap {
            markers,
            region,
            map_type: self.map_type,
        })
        .width(Length::Fill)
        .height(Length::Fill);

        column![
            row![
                Space::with_width(Length::Fill),
                button("Refresh").on_press(Message::Refresh),
                button(text(self.map_type.toggled().label())).on_press(Message::ToggleMapType),
            ]
            .spacing(10),
            map,
        ]
        .spacing(8)
        .into()
    }

    fn review_view<'a>(&'a self, session: &'a ReviewSession) -> Element<'a, Message> {
        let snapshot = session.state(Instant::now());
        let reveal = -snapshot.drag_offset;
        let record = session.record();

        let photo = image(image::Handle::from_path(record.local_path()))
            .content_fit(ContentFit::Contain)
            .width(Length::Fill)
            .height(Length::Fill);

        // Nothing behind the photo until the reveal commits
        let map: Element<Message> = if session.map_visible() {
            canvas(FocusMap {
                focus: self.map_focus.clone(),
                map_type: self.map_type,
            })
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
        } else {
            Space::new(Length::Fill, Length::Fill).into()
        };

        let sliding = column![
            container(photo).width(Length::Fill).height(Length::Fill),
            container(map).width(Length::Fill).height(Length::Fixed(reveal)),
        ];

        let surface = canvas(RevealSurface)
            .width(Length::Fill)
            .height(Length::Fill);

        let mut layers = stack![sliding, surface];
        if let Some(buffer) = snapshot.edit_buffer {
            layers = layers.push(rename_dialog(buffer));
        }

        let mut toolbar = row![
            button("Back").on_press(Message::CloseReview),
            column![
                text(record.title()).size(18),
                text(MarkerLabel::for_record(record).captured).size(13),
            ],
            Space::with_width(Length::Fill),
        ]
        .spacing(10)
        .align_y(Alignment::Center);
        if snapshot.map_committed {
            toolbar = toolbar
                .push(button(text(self.map_type.toggled().label())).on_press(Message::ToggleMapType))
                .push(button("Hide Map").on_press(Message::CollapseMap));
        }
        toolbar = toolbar
            .push(button("Rename").on_press(Message::BeginRename))
            .push(button("Share").on_press(Message::Share))
            .push(button("Delete").on_press(Message::RequestDelete));

        column![
            toolbar,
            container(layers).width(Length::Fill).height(Length::Fill),
            text(&self.status).size(14),
        ]
        .spacing(8)
        .padding(16)
        .into()
    }

    fn subscription(&self) -> Subscription<Message> {
        let animating = self
            .review
            .as_ref()
            .is_some_and(ReviewSession::is_animating);

        let frames = if animating {
            window::frames().map(Message::Frame)
        } else {
            Subscription::none()
        };

        Subscription::batch([frames, window::close_requests().map(Message::CloseRequested)])
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

fn tab_button(label: &str, tab: Tab, current: Tab) -> Element<'_, Message> {
    let button = button(text(label)).padding(10);
    if tab == current {
        button.into()
    } else {
        button.on_press(Message::SelectTab(tab)).into()
    }
}

fn rename_dialog<'a>(buffer: String) -> Element<'a, Message> {
    let dialog = column![
        text("Rename Image").size(20),
        text_input("Enter new name", &buffer)
            .on_input(Message::RenameEdited)
            .on_submit(Message::SaveRename)
            .padding(8),
        row![
            button("Cancel").on_press(Message::CancelRename),
            button("Save").on_press(Message::SaveRename),
        ]
        .spacing(10),
    ]
    .spacing(12)
    .padding(20)
    .width(Length::Fixed(360.0));

    // Swallow clicks around the dialog so the photo underneath can't be dragged
    opaque(centered(container(dialog).style(container::rounded_box)))
}

fn centered<'a>(content: impl Into<Element<'a, Message>>) -> Element<'a, Message> {
    container(content)
        .width(Length::Fill)
        .height(Length::Fill)
        .center_x(Length::Fill)
        .center_y(Length::Fill)
        .into()
}

/// Native alert; blocks until dismissed
fn alert(title: &str, description: &str, level: MessageLevel) {
    MessageDialog::new()
        .set_level(level)
        .set_title(title)
        .set_description(description)
        .set_buttons(MessageButtons::Ok)
        .show();
}

fn main() -> iced::Result {
    let config = Config::load();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    iced::application("Geo Gallery", GeoGallery::update, GeoGallery::view)
        .subscription(GeoGallery::subscription)
        .theme(GeoGallery::theme)
        .window(window::Settings {
            exit_on_close_request: false,
            ..window::Settings::default()
        })
        .centered()
        .run_with(move || GeoGallery::new(config))
}
