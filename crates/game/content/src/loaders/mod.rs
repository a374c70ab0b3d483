//! Content loaders for reading game data from files.

pub mod dungeon;
pub mod level;

pub use dungeon::{DungeonTextError, parse_dungeon, room_from_glyph};
pub use level::{LevelData, LevelLoader};

use std::path::Path;

/// Common result type for loaders.
pub type LoadResult<T> = anyhow::Result<T>;

/// Helper function to read file contents.
pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read file {}: {}", path.display(), e))
}
