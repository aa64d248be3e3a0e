/// State management module
///
/// This module handles all application state, including:
/// - The SQLite photo catalog (library.rs)
/// - Shared data structures (data.rs)
/// - Adding photos by capture or folder import (capture.rs)
/// - Gallery/map browsing modes (gallery.rs)
/// - The full-screen review and its map reveal (review.rs)

pub mod capture;
pub mod data;
pub mod gallery;
pub mod library;
pub mod review;
