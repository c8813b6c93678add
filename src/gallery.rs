//! Merges the catalog and the uploads directory into one listing.

use serde::Serialize;

use crate::catalog::{CATALOG, Mockup};

/// First id handed to uploaded photos.
pub const UPLOAD_ID_BASE: u32 = 1000;
pub const UPLOAD_MOCKUP: Mockup = Mockup::WatchWhite;
pub const UPLOADS_PREFIX: &str = "/uploads";

/// One entry of the `/all-wallpapers` listing.
#[derive(Debug, Serialize)]
pub struct GalleryItem {
    pub id: u32,
    pub src: String,
    pub name: String,
    pub mockup: Mockup,
}

/// Catalog entries in declared order, then one item per uploaded file.
///
/// `base_url` is `scheme://host` without a trailing slash.
pub fn build_gallery(base_url: &str, uploads: &[String]) -> Vec<GalleryItem> {
    let catalog = CATALOG.iter().map(|entry| GalleryItem {
        id: entry.id,
        src: format!("{base_url}{}", entry.path),
        name: entry.name.to_string(),
        mockup: entry.mockup,
    });

    let uploaded = uploads.iter().enumerate().map(|(index, filename)| GalleryItem {
        id: upload_id(index),
        src: upload_url(base_url, filename),
        name: format!("Photo {}", CATALOG.len() + index + 1),
        mockup: UPLOAD_MOCKUP,
    });

    catalog.chain(uploaded).collect()
}

/// Id of the upload at `index`, saturating at `u32::MAX`.
pub fn upload_id(index: usize) -> u32 {
    u32::try_from(index)
        .ok()
        .and_then(|index| UPLOAD_ID_BASE.checked_add(index))
        .unwrap_or(u32::MAX)
}

/// Public URL of an uploaded file.
pub fn upload_url(base_url: &str, filename: &str) -> String {
    format!("{base_url}{UPLOADS_PREFIX}/{filename}")
}
