//! The built-in wallpaper catalog.

use serde::Serialize;

/// Watch-face mockup a wallpaper is previewed on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Mockup {
    WatchWhite,
    WatchCreamy,
    WatchBlue,
    WatchGold,
    WatchGrey,
}

/// A built-in wallpaper.
#[derive(Debug)]
pub struct CatalogEntry {
    pub id: u32,
    /// Path relative to the server root, with a leading slash.
    pub path: &'static str,
    pub name: &'static str,
    pub mockup: Mockup,
}

pub const CATALOG: [CatalogEntry; 13] = [
    entry(7, "/uploads/MBS.JPG", "الامير محمد بن سلمان", Mockup::WatchWhite),
    entry(10, "/uploads/Saudia.JPG", "سعودية", Mockup::WatchCreamy),
    entry(11, "/uploads/SaudiMap.JPG", "خريطة السعودية", Mockup::WatchWhite),
    entry(13, "/uploads/Nebula.JPG", "سديم", Mockup::WatchBlue),
    entry(1, "/uploads/moon.JPG", "سطح القمر", Mockup::WatchWhite),
    entry(2, "/uploads/earth.JPG", "منظر الأرض", Mockup::WatchBlue),
    entry(8, "/uploads/MBSGold.JPG", "الامير محمد بن سلمان", Mockup::WatchCreamy),
    entry(3, "/uploads/sea.JPG", "أمواج المحيط", Mockup::WatchWhite),
    entry(4, "/uploads/person.JPG", "شخص", Mockup::WatchGold),
    entry(5, "/uploads/stars.JPG", "حقل النجوم", Mockup::WatchGold),
    entry(6, "/uploads/SaudiFlagPassport.JPG", "علم السعودية", Mockup::WatchGrey),
    entry(9, "/uploads/Planets.JPG", "الكواكب والشمس", Mockup::WatchBlue),
    entry(12, "/uploads/SaudiFlagTwoColors.JPG", "شعار المملكة", Mockup::WatchGrey),
];

const fn entry(id: u32, path: &'static str, name: &'static str, mockup: Mockup) -> CatalogEntry {
    CatalogEntry {
        id,
        path,
        name,
        mockup,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn catalog_ids_are_unique_and_below_upload_range() {
        let ids: HashSet<u32> = CATALOG.iter().map(|entry| entry.id).collect();
        assert_eq!(ids.len(), CATALOG.len());
        assert!(ids.iter().all(|id| *id < 1000));
    }

    #[test]
    fn mockup_serializes_as_variant_name() {
        let json = serde_json::to_string(&Mockup::WatchCreamy).expect("serialize");
        assert_eq!(json, "\"WatchCreamy\"");
    }
}
