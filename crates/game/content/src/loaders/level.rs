//! Level file loader.
//!
//! A level file is a dungeon glyph block followed by blank-line-separated
//! entity and metadata lines of the form `<code> <col> <row> [<extra>]`:
//!
//! ```text
//! ╬═╬
//! ║╬║
//! ╬═╬
//!
//! A 0 0
//! D 2 2 3
//! S 1 0
//! CS 2 0
//! T 2
//! ```
//!
//! Unrecognized or malformed entity lines are logged and skipped; a
//! malformed glyph block fails the whole parse.

use std::path::Path;

use game_core::{Adventurer, Dragon, Dungeon, EntityKind, EntityStore, GameData, Position};
use tracing::{debug, error};

use crate::loaders::{LoadResult, read_file};
use crate::loaders::dungeon::{is_room_glyph, parse_dungeon};

/// Everything a level file defines.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelData {
    pub dungeon: Dungeon,
    pub entities: EntityStore,
    /// Treasures the player may place during the session. A counter, not
    /// a placed entity.
    pub treasure_count: u32,
}

impl LevelData {
    pub fn into_game_data(self) -> GameData {
        GameData::new(self.dungeon, self.entities).with_treasure_remaining(self.treasure_count)
    }
}

/// Loader for level definitions in the dungeon text format.
pub struct LevelLoader;

impl LevelLoader {
    /// Load a level from a file on disk.
    pub fn load(path: &Path) -> LoadResult<LevelData> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    /// Parse a level from its textual form.
    pub fn parse(text: &str) -> LoadResult<LevelData> {
        let mut dungeon_lines: Vec<&str> = Vec::new();
        let mut data_lines: Vec<&str> = Vec::new();

        for line in text.lines() {
            let trimmed = line.trim_end();
            if trimmed.is_empty() {
                continue;
            }
            if trimmed.chars().next().is_some_and(is_room_glyph) {
                dungeon_lines.push(trimmed);
            } else {
                data_lines.push(trimmed);
            }
        }

        let dungeon = parse_dungeon(&dungeon_lines)
            .map_err(|e| anyhow::anyhow!("Failed to parse dungeon block: {}", e))?;
        debug!(
            rows = dungeon.rows(),
            cols = dungeon.cols(),
            "parsed dungeon block"
        );

        let mut entities = EntityStore::new();
        let mut treasure_count = 0;
        for line in data_lines {
            if !parse_data_line(line, &mut entities, &mut treasure_count) {
                error!(line, "unrecognized entity or game info line, skipping");
            }
        }

        Ok(LevelData {
            dungeon,
            entities,
            treasure_count,
        })
    }
}

/// Parses one entity or metadata line. Returns false when the line does
/// not match any known form; the caller logs and moves on.
fn parse_data_line(line: &str, entities: &mut EntityStore, treasure_count: &mut u32) -> bool {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let [code, rest @ ..] = fields.as_slice() else {
        return false;
    };

    match (*code, rest) {
        ("A", [col, row]) => {
            let Some(position) = parse_position(col, row) else {
                return false;
            };
            entities.add(position, EntityKind::Adventurer(Adventurer::new(1)));
            debug!(%position, "loaded adventurer");
            true
        }
        ("D", [col, row, level]) => {
            let (Some(position), Ok(level)) = (parse_position(col, row), level.parse::<u32>())
            else {
                return false;
            };
            entities.add(position, EntityKind::Dragon(Dragon::new(level)));
            debug!(%position, level, "loaded dragon");
            true
        }
        ("S", [col, row]) => {
            let Some(position) = parse_position(col, row) else {
                return false;
            };
            entities.add(position, EntityKind::StrongSword);
            debug!(%position, "loaded strong sword");
            true
        }
        ("CS", [col, row]) => {
            let Some(position) = parse_position(col, row) else {
                return false;
            };
            entities.add(position, EntityKind::ChaosSeal);
            debug!(%position, "loaded chaos seal");
            true
        }
        ("T", [count]) => match count.parse::<u32>() {
            Ok(count) => {
                *treasure_count = count;
                debug!(count, "loaded treasure count");
                true
            }
            Err(_) => false,
        },
        _ => false,
    }
}

fn parse_position(col: &str, row: &str) -> Option<Position> {
    let x = col.parse::<i32>().ok()?;
    let y = row.parse::<i32>().ok()?;
    Some(Position::new(x, y))
}
