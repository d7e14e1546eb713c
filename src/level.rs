//! Level descriptions
//!
//! A level is a 20x15 grid of single-character cell codes plus a table of
//! custom codes mapping to a base block and extra behaviors. Extra behaviors
//! come from a closed registry ([`BehaviorSpec`]); unknown tokens fail at load.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::consts::{FLOOR_ROW, GRID_COLS, GRID_ROWS};
use crate::error::{GameError, Result};
use crate::sim::behaviors::{
    AlternateDeathSpec, BlinkingSpec, DeathBlockSpec, GestureSpec, MoverSpec, TurningSpec,
};

/// Cell code of the player spawn point
pub const SPAWN_CODE: char = 's';

/// Block kinds addressable from the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockKind {
    /// Must be cleared; turns yellow when hit
    White,
    Plain,
    /// Breaks on contact
    Broken,
    /// Turns into a hazard when hit
    Yellow,
    /// Shaking hazard
    Red,
    Metal,
    /// Decorative floor tile, not collidable
    Floor,
    /// Static hazard
    Killer,
    /// Wakes up and chases the player
    Sleeper,
}

impl BlockKind {
    pub fn from_code(code: char) -> Option<Self> {
        Some(match code {
            'w' => BlockKind::White,
            'l' => BlockKind::Plain,
            'b' => BlockKind::Broken,
            'y' => BlockKind::Yellow,
            'r' => BlockKind::Red,
            'm' => BlockKind::Metal,
            't' => BlockKind::Floor,
            'k' => BlockKind::Killer,
            'p' => BlockKind::Sleeper,
            _ => return None,
        })
    }

    pub fn code(self) -> char {
        match self {
            BlockKind::White => 'w',
            BlockKind::Plain => 'l',
            BlockKind::Broken => 'b',
            BlockKind::Yellow => 'y',
            BlockKind::Red => 'r',
            BlockKind::Metal => 'm',
            BlockKind::Floor => 't',
            BlockKind::Killer => 'k',
            BlockKind::Sleeper => 'p',
        }
    }

    /// Sprite name, e.g. "wblock"
    pub fn image_name(self) -> String {
        format!("{}block", self.code())
    }
}

/// Extra behavior attached to a custom cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BehaviorSpec {
    TurningBlock(TurningSpec),
    MoverBlock(MoverSpec),
    AlternateDeath(AlternateDeathSpec),
    Shaking,
    Blinking(BlinkingSpec),
    DeathBlock(DeathBlockSpec),
    GestureBlock(GestureSpec),
    BrokenBlock,
}

/// Custom cell code definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellDef {
    /// Base block code ('w', 'l', ...)
    pub base: char,
    #[serde(default)]
    pub behaviors: Vec<BehaviorSpec>,
}

/// A parsed level file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelDesc {
    pub name: String,
    /// Grid rows, top to bottom
    pub map: Vec<String>,
    #[serde(default)]
    pub defs: BTreeMap<String, CellDef>,
}

/// One block to spawn
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub kind: BlockKind,
    pub grid_x: i32,
    pub grid_y: i32,
    pub extras: Vec<BehaviorSpec>,
}

/// What the simulation consumes from a level
#[derive(Debug, Clone, PartialEq)]
pub struct LevelLayout {
    pub placements: Vec<Placement>,
    /// Spawn cell (grid coordinates)
    pub spawn: (i32, i32),
    /// Number of white blocks to clear
    pub white_blocks: i32,
}

impl LevelDesc {
    pub fn from_json(text: &str, path: &Path) -> Result<Self> {
        let level: LevelDesc = serde_json::from_str(text).map_err(|source| GameError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        level.layout()?;
        Ok(level)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| GameError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text, path)
    }

    fn custom(&self, code: char) -> Result<Option<(BlockKind, &CellDef)>> {
        let mut buf = [0u8; 4];
        let Some(def) = self.defs.get(code.encode_utf8(&mut buf) as &str) else {
            return Ok(None);
        };
        let kind = BlockKind::from_code(def.base).ok_or_else(|| {
            GameError::malformed(
                &self.name,
                format!("cell {code:?} has unknown base block {:?}", def.base),
            )
        })?;
        Ok(Some((kind, def)))
    }

    /// Validate and flatten into spawn order: the floor row first, then the grid row by row
    pub fn layout(&self) -> Result<LevelLayout> {
        if self.map.len() < GRID_ROWS {
            return Err(GameError::malformed(
                &self.name,
                format!("expected {GRID_ROWS} rows, found {}", self.map.len()),
            ));
        }
        for key in self.defs.keys() {
            if key.chars().count() != 1 {
                return Err(GameError::malformed(
                    &self.name,
                    format!("custom cell code {key:?} must be a single character"),
                ));
            }
        }

        let mut placements: Vec<Placement> = (-1..=GRID_COLS as i32)
            .map(|x| Placement {
                kind: BlockKind::Floor,
                grid_x: x,
                grid_y: FLOOR_ROW,
                extras: Vec::new(),
            })
            .collect();
        let mut spawn = None;
        let mut white_blocks = 0;

        for (y, row) in self.map.iter().take(GRID_ROWS).enumerate() {
            let cells: Vec<char> = row.chars().collect();
            if cells.len() < GRID_COLS {
                return Err(GameError::malformed(
                    &self.name,
                    format!("row {y} has {} cells, expected {GRID_COLS}", cells.len()),
                ));
            }
            for (x, &code) in cells.iter().take(GRID_COLS).enumerate() {
                let (grid_x, grid_y) = (x as i32, y as i32);
                let placement = if code == SPAWN_CODE {
                    if spawn.replace((grid_x, grid_y)).is_some() {
                        return Err(GameError::malformed(&self.name, "more than one spawn cell"));
                    }
                    None
                } else if let Some(kind) = BlockKind::from_code(code) {
                    Some((kind, Vec::new()))
                } else if let Some((kind, def)) = self.custom(code)? {
                    Some((kind, def.behaviors.clone()))
                } else {
                    None
                };

                if let Some((kind, extras)) = placement {
                    if kind == BlockKind::White {
                        white_blocks += 1;
                    }
                    placements.push(Placement {
                        kind,
                        grid_x,
                        grid_y,
                        extras,
                    });
                }
            }
        }

        let spawn =
            spawn.ok_or_else(|| GameError::malformed(&self.name, "missing spawn cell 's'"))?;
        Ok(LevelLayout {
            placements,
            spawn,
            white_blocks,
        })
    }
}

const BUILTIN_LEVELS: [(&str, &str); 3] = [
    (
        "01_first_bounce.json",
        include_str!("../levels/01_first_bounce.json"),
    ),
    (
        "02_wake_up.json",
        include_str!("../levels/02_wake_up.json"),
    ),
    (
        "03_windmills.json",
        include_str!("../levels/03_windmills.json"),
    ),
];

/// The ordered set of levels and the current position in it
#[derive(Debug, Clone)]
pub struct LevelCatalog {
    levels: Vec<LevelDesc>,
    current: usize,
}

impl LevelCatalog {
    pub fn new(levels: Vec<LevelDesc>) -> Result<Self> {
        if levels.is_empty() {
            return Err(GameError::NoLevels(PathBuf::from("<memory>")));
        }
        Ok(Self { levels, current: 0 })
    }

    /// Levels shipped inside the binary
    pub fn builtin() -> Result<Self> {
        let levels = BUILTIN_LEVELS
            .iter()
            .map(|(name, text)| LevelDesc::from_json(text, Path::new(name)))
            .collect::<Result<Vec<_>>>()?;
        Self::new(levels)
    }

    /// Load every `*.json` file in `dir`, ordered by file name
    pub fn load_dir(dir: &Path) -> Result<Self> {
        let entries = fs::read_dir(dir).map_err(|source| GameError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| GameError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();
        if paths.is_empty() {
            return Err(GameError::NoLevels(dir.to_path_buf()));
        }

        let levels = paths
            .iter()
            .map(|p| LevelDesc::load(p))
            .collect::<Result<Vec<_>>>()?;
        log::info!("Loaded {} levels from {}", levels.len(), dir.display());
        Self::new(levels)
    }

    /// Start at `index` (wrapped)
    pub fn with_start(mut self, index: usize) -> Self {
        self.current = index % self.levels.len();
        self
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> &LevelDesc {
        &self.levels[self.current]
    }

    /// Move forward (or back, for negative `delta`), wrapping both ways
    pub fn advance(&mut self, delta: i32) {
        let len = self.levels.len() as i64;
        self.current = (self.current as i64 + delta as i64).rem_euclid(len) as usize;
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// 20x15 grid: spawn in the middle, `row` placed at grid row 5
    pub(crate) fn grid_with(row: &str) -> Vec<String> {
        let mut map = vec![".".repeat(GRID_COLS); GRID_ROWS];
        map[5] = format!("{row:.<20}");
        map[10] = format!("{:.<20}", ".........s");
        map
    }

    #[test]
    fn test_layout_order_and_counts() {
        let level = LevelDesc {
            name: "test".into(),
            map: grid_with("wwb..T"),
            defs: BTreeMap::from([(
                "T".to_string(),
                CellDef {
                    base: 'w',
                    behaviors: vec![BehaviorSpec::Shaking],
                },
            )]),
        };
        let layout = level.layout().unwrap();
        // Floor row spans columns -1..=20
        let floor = layout
            .placements
            .iter()
            .take_while(|p| p.kind == BlockKind::Floor)
            .count();
        assert_eq!(floor, GRID_COLS + 2);
        assert_eq!(layout.placements[0].grid_x, -1);

        let grid: Vec<_> = layout.placements[floor..].iter().collect();
        assert_eq!(grid.len(), 4);
        assert_eq!((grid[0].kind, grid[0].grid_x, grid[0].grid_y), (BlockKind::White, 0, 5));
        assert_eq!(grid[2].kind, BlockKind::Broken);
        assert_eq!(grid[3].kind, BlockKind::White);
        assert_eq!(grid[3].extras, vec![BehaviorSpec::Shaking]);
        // Custom cells on a white base count toward the remaining total
        assert_eq!(layout.white_blocks, 3);
        assert_eq!(layout.spawn, (9, 10));
    }

    #[test]
    fn test_unknown_cells_are_ignored() {
        let level = LevelDesc {
            name: "test".into(),
            map: grid_with("?!#w"),
            defs: BTreeMap::new(),
        };
        let layout = level.layout().unwrap();
        assert_eq!(layout.placements.len(), GRID_COLS + 2 + 1);
    }

    #[test]
    fn test_missing_spawn_is_error() {
        let mut map = grid_with("w");
        map[10] = ".".repeat(GRID_COLS);
        let level = LevelDesc {
            name: "nospawn".into(),
            map,
            defs: BTreeMap::new(),
        };
        assert!(matches!(
            level.layout(),
            Err(GameError::MalformedLevel { .. })
        ));
    }

    #[test]
    fn test_short_grid_is_error() {
        let level = LevelDesc {
            name: "short".into(),
            map: vec!["s".repeat(GRID_COLS); 3],
            defs: BTreeMap::new(),
        };
        assert!(level.layout().is_err());
    }

    #[test]
    fn test_unknown_behavior_token_fails_parse() {
        let map = grid_with("T");
        let json = serde_json::json!({
            "name": "bad",
            "map": map,
            "defs": { "T": { "base": "m", "behaviors": [ { "kind": "explode_everything" } ] } }
        });
        let err = LevelDesc::from_json(&json.to_string(), Path::new("bad.json")).unwrap_err();
        assert!(matches!(err, GameError::Parse { .. }));
    }

    #[test]
    fn test_unknown_base_fails_layout() {
        let map = grid_with("T");
        let json = serde_json::json!({
            "name": "badbase",
            "map": map,
            "defs": { "T": { "base": "z" } }
        });
        let err = LevelDesc::from_json(&json.to_string(), Path::new("badbase.json")).unwrap_err();
        assert!(matches!(err, GameError::MalformedLevel { .. }));
    }

    #[test]
    fn test_behavior_spec_defaults() {
        let map = grid_with("T");
        let json = serde_json::json!({
            "name": "turning",
            "map": map,
            "defs": { "T": { "base": "m", "behaviors": [ { "kind": "turning_block", "angle": 45.0 } ] } }
        });
        let level = LevelDesc::from_json(&json.to_string(), Path::new("turning.json")).unwrap();
        match &level.defs["T"].behaviors[0] {
            BehaviorSpec::TurningBlock(spec) => {
                assert_eq!(spec.angle, 45.0);
                assert_eq!(spec.step, 2.0);
                assert_eq!(spec.power, 500.0);
            }
            other => panic!("unexpected spec {other:?}"),
        }
    }

    #[test]
    fn test_builtin_levels_parse() {
        let catalog = LevelCatalog::builtin().unwrap();
        assert_eq!(catalog.len(), 3);
        for _ in 0..catalog.len() {
            catalog.current().layout().unwrap();
        }
    }

    #[test]
    fn test_catalog_wraps_both_ways() {
        let mut catalog = LevelCatalog::builtin().unwrap();
        catalog.advance(-1);
        assert_eq!(catalog.current_index(), 2);
        catalog.advance(2);
        assert_eq!(catalog.current_index(), 1);
        let catalog = catalog.with_start(7);
        assert_eq!(catalog.current_index(), 1);
    }
}
