//! Display-to-native zoom mapping.

use std::collections::BTreeMap;

use crate::error::{TileError, TileResult};
use crate::types::{DisplayZoom, NativeZoom};

/// One display level's sampling parameters: which native capture level to
/// read and how many output pixels one native pixel contributes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomEntry {
    pub native: NativeZoom,
    pub scale: f64,
}

impl ZoomEntry {
    /// Native-resolution edge length covered by one output tile.
    ///
    /// Truncates, so a 256 px tile at scale 0.5 reads 512 native pixels.
    pub fn native_tile_px(&self, tile_px: u32) -> u32 {
        (tile_px as f64 / self.scale) as u32
    }
}

/// Immutable display-to-native mapping for a whole pyramid run.
///
/// Passed by value into synthesis so independent runs never share state.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoomTable {
    entries: BTreeMap<DisplayZoom, ZoomEntry>,
}

impl ZoomTable {
    pub fn from_entries(entries: impl IntoIterator<Item = (DisplayZoom, ZoomEntry)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// Look up a display level. A missing entry is a fatal configuration
    /// error: the run cannot proceed without a complete table.
    pub fn resolve(&self, display: DisplayZoom) -> TileResult<ZoomEntry> {
        self.entries
            .get(&display)
            .copied()
            .ok_or(TileError::UnmappedZoom(display))
    }

    /// Display levels in ascending order.
    pub fn display_levels(&self) -> impl Iterator<Item = DisplayZoom> + '_ {
        self.entries.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ZoomTable {
    /// Seven-level table matching the reference capture set: display levels
    /// 0 to 5 sample native levels 5 down to 0 at half resolution, display
    /// level 6 samples native 0 at full resolution.
    fn default() -> Self {
        Self::from_entries([
            (0, ZoomEntry { native: 5, scale: 0.5 }),
            (1, ZoomEntry { native: 4, scale: 0.5 }),
            (2, ZoomEntry { native: 3, scale: 0.5 }),
            (3, ZoomEntry { native: 2, scale: 0.5 }),
            (4, ZoomEntry { native: 1, scale: 0.5 }),
            (5, ZoomEntry { native: 0, scale: 0.5 }),
            (6, ZoomEntry { native: 0, scale: 1.0 }),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_level() {
        let table = ZoomTable::default();
        let entry = table.resolve(6).unwrap();
        assert_eq!(entry.native, 0);
        assert_eq!(entry.scale, 1.0);
    }

    #[test]
    fn test_resolve_unknown_level_is_fatal() {
        let table = ZoomTable::default();
        assert!(matches!(table.resolve(7), Err(TileError::UnmappedZoom(7))));
    }

    #[test]
    fn test_from_entries_collects_sorted() {
        let table = ZoomTable::from_entries([
            (3, ZoomEntry { native: 1, scale: 0.5 }),
            (1, ZoomEntry { native: 2, scale: 1.0 }),
        ]);
        assert_eq!(table.len(), 2);
        assert!(!table.is_empty());
        assert_eq!(table.resolve(1).unwrap().native, 2);
        let levels: Vec<_> = table.display_levels().collect();
        assert_eq!(levels, vec![1, 3]);
    }

    #[test]
    fn test_native_tile_px_truncates() {
        let half = ZoomEntry { native: 0, scale: 0.5 };
        assert_eq!(half.native_tile_px(256), 512);
        let unity = ZoomEntry { native: 0, scale: 1.0 };
        assert_eq!(unity.native_tile_px(256), 256);
    }

    #[test]
    fn test_display_levels_ordered() {
        let table = ZoomTable::default();
        let levels: Vec<_> = table.display_levels().collect();
        assert_eq!(levels, vec![0, 1, 2, 3, 4, 5, 6]);
    }
}
