/// Adding photos to the catalog
///
/// A single capture gets tagged with wherever the device is right now,
/// best-effort. A folder import only records the files themselves: the
/// current position says nothing about where older photos were taken.

use chrono::{DateTime, Utc};
use log::{info, warn};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::data::{MediaRecord, NewImage};
use super::library::Library;
use crate::error::{LocationError, StoreError};
use crate::location::{NetworkLocator, PositionProvider, Resolver};

/// Supported image extensions (lowercase)
pub const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "heic", "heif", "webp"];

/// Result of a single capture
#[derive(Debug, Clone)]
pub struct CaptureOutcome {
    pub record: MediaRecord,
    /// Set when the photo had to be saved without location data
    pub location_error: Option<LocationError>,
}

/// Result of a folder import operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
}

/// Tag `uri` with the current coordinate (if any) and the current time, then persist it.
///
/// Location failure is not fatal: the record is stored without a coordinate
/// and the error is handed back for the host to mention. Store failure is.
pub async fn capture_photo<P, N>(
    library: &Library,
    resolver: &Resolver<P, N>,
    uri: String,
) -> Result<CaptureOutcome, StoreError>
where
    P: PositionProvider,
    N: NetworkLocator,
{
    let (coordinate, location_error) = match resolver.resolve_current_coordinate().await {
        Ok(coordinate) => (Some(coordinate), None),
        Err(e) => {
            warn!("⚠️  Saving {} without location data: {}", uri, e);
            (None, Some(e))
        }
    };

    let record = library
        .add_image(NewImage::new(uri).with_coordinate(coordinate))
        .await?;
    info!("📸 Captured image {} ({})", record.id, record.uri);

    Ok(CaptureOutcome {
        record,
        location_error,
    })
}

/// Import every supported image under `folder`, skipping ones already in the catalog
pub async fn import_folder(library: &Library, folder: PathBuf) -> Result<ImportSummary, StoreError> {
    info!("🔍 Scanning folder: {}", folder.display());

    // Directory walking blocks, keep it off the async threads
    let candidates = tokio::task::spawn_blocking(move || scan_folder(&folder))
        .await
        .map_err(|e| StoreError::Io(std::io::Error::other(e)))?;

    let mut summary = ImportSummary::default();
    for (uri, modified) in candidates {
        if library.contains_uri(uri.clone()).await? {
            summary.skipped += 1;
            continue;
        }

        let mut image = NewImage::new(uri);
        image.captured_at = modified;
        library.add_image(image).await?;

        summary.imported += 1;
        if summary.imported % 100 == 0 {
            info!("⏳ Imported {} files...", summary.imported);
        }
    }

    info!(
        "✅ Import complete: {} new, {} skipped",
        summary.imported, summary.skipped
    );
    Ok(summary)
}

/// Supported files under `folder` with their modification times, in path order
fn scan_folder(folder: &Path) -> Vec<(String, Option<DateTime<Utc>>)> {
    let mut found: Vec<_> = WalkDir::new(folder)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|entry| entry.file_type().is_file() && is_supported(entry.path()))
        .map(|entry| {
            let modified = entry
                .metadata()
                .ok()
                .and_then(|meta| meta.modified().ok())
                .map(DateTime::<Utc>::from);
            (entry.path().to_string_lossy().to_string(), modified)
        })
        .collect();

    found.sort_by(|a, b| a.0.cmp(&b.0));
    found
}

fn is_supported(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}
