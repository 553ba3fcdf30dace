use std::collections::HashMap;

use super::{AssetHandle, AssetNotFound, AssetProvider};

/// Asset lookup table filled by the host as tilesets are loaded
#[derive(Debug, Clone, Default)]
pub struct TilesetCatalog {
    tiles: HashMap<(u32, u32), AssetHandle>,
}

impl TilesetCatalog {
    pub fn insert(&mut self, tileset: u32, tile: u32, handle: AssetHandle) -> Option<AssetHandle> {
        self.tiles.insert((tileset, tile), handle)
    }

    /// Forget every tile of a tileset
    pub fn remove_tileset(&mut self, tileset: u32) {
        self.tiles.retain(|(set, _), _| *set != tileset);
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}

impl AssetProvider for TilesetCatalog {
    fn resolve_asset(&self, tileset: u32, tile: u32) -> Result<AssetHandle, AssetNotFound> {
        self.tiles
            .get(&(tileset, tile))
            .copied()
            .ok_or(AssetNotFound { tileset, tile })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve() {
        let mut catalog = TilesetCatalog::default();
        catalog.insert(1, 4, AssetHandle(7));
        assert_eq!(catalog.resolve_asset(1, 4), Ok(AssetHandle(7)));
        assert_eq!(
            catalog.resolve_asset(1, 5),
            Err(AssetNotFound { tileset: 1, tile: 5 })
        );
    }

    #[test]
    fn test_remove_tileset() {
        let mut catalog = TilesetCatalog::default();
        catalog.insert(1, 0, AssetHandle(1));
        catalog.insert(1, 1, AssetHandle(2));
        catalog.insert(2, 0, AssetHandle(3));
        catalog.remove_tileset(1);
        assert_eq!(catalog.len(), 1);
        assert!(catalog.resolve_asset(2, 0).is_ok());
    }
}
