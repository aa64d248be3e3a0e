use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::thread;
use tokio::sync::{mpsc, oneshot};

use super::data::{normalize_display_name, Coordinate, MediaRecord, NewImage};
use crate::error::StoreError;

type Reply<T> = oneshot::Sender<Result<T, StoreError>>;
type Pending<T> = Result<oneshot::Receiver<Result<T, StoreError>>, StoreError>;

/// Work items for the catalog thread, applied strictly in arrival order
enum Command {
    Add(NewImage, Reply<MediaRecord>),
    List(Reply<Vec<MediaRecord>>),
    Get(i64, Reply<MediaRecord>),
    Rename(i64, String, Reply<()>),
    Delete(i64, Reply<()>),
    Count(Reply<u64>),
    ContainsUri(String, Reply<bool>),
    Close(oneshot::Sender<()>),
}

/// The Library manages the SQLite photo catalog.
///
/// One dedicated thread owns the connection. Every operation is queued
/// when the method is *called*, not when the returned future is first
/// polled, so operations take effect in the order they were issued even
/// if the caller awaits them out of order.
///
/// Handles are cheap to clone; `close` shuts the catalog for all of them.
#[derive(Clone)]
pub struct Library {
    tx: mpsc::UnboundedSender<Command>,
    db_path: Option<PathBuf>,
}

impl Library {
    /// Open (or create) the catalog at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();

        // Ensure the parent directory exists
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path).map_err(StoreError::Open)?;
        info!("📁 Catalog opened at: {}", path.display());

        Self::start(conn, Some(path.to_path_buf()))
    }

    /// Open a throwaway catalog that lives only in memory
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(StoreError::Open)?;
        Self::start(conn, None)
    }

    /// Where the catalog should live when the config doesn't say otherwise
    /// - Linux: ~/.local/share/geo-gallery/gallery.db
    /// - macOS: ~/Library/Application Support/geo-gallery/gallery.db
    /// - Windows: %APPDATA%\geo-gallery\gallery.db
    pub fn default_path() -> Option<PathBuf> {
        let mut path = dirs::data_dir().or_else(dirs::home_dir)?;
        path.push("geo-gallery");
        path.push("gallery.db");
        Some(path)
    }

    fn start(conn: Connection, db_path: Option<PathBuf>) -> Result<Self, StoreError> {
        init_schema(&conn).map_err(StoreError::Open)?;

        let (tx, rx) = mpsc::unbounded_channel();
        thread::Builder::new()
            .name("catalog".to_string())
            .spawn(move || run(conn, rx))?;

        Ok(Library { tx, db_path })
    }

    /// Get the path to the database file (None for in-memory catalogs)
    pub fn path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// Persist a new image and return it with its assigned id and capture time
    pub fn add_image(
        &self,
        image: NewImage,
    ) -> impl Future<Output = Result<MediaRecord, StoreError>> + Send + 'static {
        wait(self.send(|reply| Command::Add(image, reply)))
    }

    /// All images, newest capture first (ties broken by id, highest first)
    pub fn list_images(
        &self,
    ) -> impl Future<Output = Result<Vec<MediaRecord>, StoreError>> + Send + 'static {
        wait(self.send(Command::List))
    }

    /// Fetch one image; fails with `NotFound` when the id is unknown
    pub fn get_image(
        &self,
        id: i64,
    ) -> impl Future<Output = Result<MediaRecord, StoreError>> + Send + 'static {
        wait(self.send(|reply| Command::Get(id, reply)))
    }

    /// Set the display name. Renaming an unknown id succeeds and changes nothing.
    /// A blank name clears it back to "unnamed".
    pub fn rename_image(
        &self,
        id: i64,
        name: impl Into<String>,
    ) -> impl Future<Output = Result<(), StoreError>> + Send + 'static {
        let name = name.into();
        wait(self.send(|reply| Command::Rename(id, name, reply)))
    }

    /// Remove an image. Deleting an unknown id succeeds silently.
    pub fn delete_image(
        &self,
        id: i64,
    ) -> impl Future<Output = Result<(), StoreError>> + Send + 'static {
        wait(self.send(|reply| Command::Delete(id, reply)))
    }

    /// Get a count of images in the catalog
    pub fn image_count(&self) -> impl Future<Output = Result<u64, StoreError>> + Send + 'static {
        wait(self.send(Command::Count))
    }

    /// Whether any image already points at `uri`
    pub fn contains_uri(
        &self,
        uri: impl Into<String>,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send + 'static {
        let uri = uri.into();
        wait(self.send(|reply| Command::ContainsUri(uri, reply)))
    }

    /// Finish queued work and close the connection.
    /// Any later operation on any handle fails with `StoreError::Closed`.
    pub fn close(&self) -> impl Future<Output = ()> + Send + 'static {
        let (done_tx, done_rx) = oneshot::channel();
        let sent = self.tx.send(Command::Close(done_tx)).is_ok();
        async move {
            if sent {
                let _ = done_rx.await;
            }
        }
    }

    fn send<T>(&self, command: impl FnOnce(Reply<T>) -> Command) -> Pending<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(command(reply_tx))
            .map_err(|_| StoreError::Closed)?;
        Ok(reply_rx)
    }
}

async fn wait<T>(pending: Pending<T>) -> Result<T, StoreError> {
    pending?.await.unwrap_or(Err(StoreError::Closed))
}

// Implement Debug for better error messages
impl std::fmt::Debug for Library {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Library")
            .field("db_path", &self.db_path)
            .finish()
    }
}

/// Creates the images table and its ordering index if they don't exist.
fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS images (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            uri             TEXT NOT NULL CHECK (uri <> ''),
            captured_at     INTEGER NOT NULL,
            latitude        REAL,
            longitude       REAL,
            display_name    TEXT,
            CHECK ((latitude IS NULL) = (longitude IS NULL))
        );
        CREATE INDEX IF NOT EXISTS idx_images_captured_at
            ON images(captured_at DESC, id DESC);",
    )?;

    debug!("Catalog schema initialized");
    Ok(())
}

/// Catalog thread: owns the connection until closed or every handle is dropped
fn run(conn: Connection, mut rx: mpsc::UnboundedReceiver<Command>) {
    let mut closed_by: Option<oneshot::Sender<()>> = None;

    while let Some(command) = rx.blocking_recv() {
        match command {
            Command::Add(image, reply) => {
                let _ = reply.send(insert(&conn, image));
            }
            Command::List(reply) => {
                let _ = reply.send(select_all(&conn));
            }
            Command::Get(id, reply) => {
                let _ = reply.send(select_one(&conn, id));
            }
            Command::Rename(id, name, reply) => {
                let _ = reply.send(rename(&conn, id, &name));
            }
            Command::Delete(id, reply) => {
                let _ = reply.send(delete(&conn, id));
            }
            Command::Count(reply) => {
                let result = conn
                    .query_row("SELECT COUNT(*) FROM images", [], |row| row.get::<_, i64>(0))
                    .map(|count| count.max(0) as u64)
                    .map_err(StoreError::Read);
                let _ = reply.send(result);
            }
            Command::ContainsUri(uri, reply) => {
                let result = conn
                    .query_row("SELECT 1 FROM images WHERE uri = ?1 LIMIT 1", [&uri], |_| Ok(()))
                    .optional()
                    .map(|hit| hit.is_some())
                    .map_err(StoreError::Read);
                let _ = reply.send(result);
            }
            Command::Close(done) => {
                rx.close();
                closed_by = Some(done);
                break;
            }
        }
    }

    if let Err((_, e)) = conn.close() {
        warn!("⚠️  Catalog did not close cleanly: {}", e);
    } else {
        info!("Catalog closed");
    }

    if let Some(done) = closed_by {
        let _ = done.send(());
    }
}

fn insert(conn: &Connection, image: NewImage) -> Result<MediaRecord, StoreError> {
    if image.uri.trim().is_empty() {
        return Err(StoreError::InvalidRecord("uri must not be empty".to_string()));
    }
    if let Some(coordinate) = image.coordinate {
        if !coordinate.is_valid() {
            return Err(StoreError::InvalidRecord(format!(
                "coordinate out of range: {}",
                coordinate.display()
            )));
        }
    }

    let display_name = image.display_name.as_deref().and_then(normalize_display_name);

    // Stored at millisecond precision, so hand back exactly what a later read sees
    let captured_at = from_millis(image.captured_at.unwrap_or_else(Utc::now).timestamp_millis());

    conn.execute(
        "INSERT INTO images (uri, captured_at, latitude, longitude, display_name)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            &image.uri,
            captured_at.timestamp_millis(),
            image.coordinate.map(|c| c.latitude),
            image.coordinate.map(|c| c.longitude),
            &display_name,
        ],
    )
    .map_err(StoreError::Write)?;

    let id = conn.last_insert_rowid();
    debug!("Added image {} ({})", id, image.uri);

    Ok(MediaRecord {
        id,
        uri: image.uri,
        captured_at,
        coordinate: image.coordinate,
        display_name,
    })
}

const SELECT_COLUMNS: &str = "SELECT id, uri, captured_at, latitude, longitude, display_name FROM images";

fn select_all(conn: &Connection) -> Result<Vec<MediaRecord>, StoreError> {
    let mut stmt = conn
        .prepare(&format!("{} ORDER BY captured_at DESC, id DESC", SELECT_COLUMNS))
        .map_err(StoreError::Read)?;

    let records = stmt
        .query_map([], record_from_row)
        .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
        .map_err(StoreError::Read)?;

    Ok(records)
}

fn select_one(conn: &Connection, id: i64) -> Result<MediaRecord, StoreError> {
    conn.query_row(&format!("{} WHERE id = ?1", SELECT_COLUMNS), [id], record_from_row)
        .optional()
        .map_err(StoreError::Read)?
        .ok_or(StoreError::NotFound(id))
}

fn rename(conn: &Connection, id: i64, name: &str) -> Result<(), StoreError> {
    let name = normalize_display_name(name);

    let changed = conn
        .execute(
            "UPDATE images SET display_name = ?1 WHERE id = ?2",
            params![name, id],
        )
        .map_err(StoreError::Write)?;

    if changed == 0 {
        debug!("Rename of unknown image {} ignored", id);
    }
    Ok(())
}

fn delete(conn: &Connection, id: i64) -> Result<(), StoreError> {
    let changed = conn
        .execute("DELETE FROM images WHERE id = ?1", [id])
        .map_err(StoreError::Write)?;

    if changed == 0 {
        debug!("Delete of unknown image {} ignored", id);
    } else {
        debug!("Deleted image {}", id);
    }
    Ok(())
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<MediaRecord> {
    let latitude: Option<f64> = row.get(3)?;
    let longitude: Option<f64> = row.get(4)?;

    Ok(MediaRecord {
        id: row.get(0)?,
        uri: row.get(1)?,
        captured_at: from_millis(row.get(2)?),
        coordinate: latitude
            .zip(longitude)
            .map(|(latitude, longitude)| Coordinate::new(latitude, longitude)),
        display_name: row.get(5)?,
    })
}

fn from_millis(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or_default()
}
