//! Level layouts
//!
//! Levels come from a fixed table of hand-authored 3×6 patterns. Each symbol
//! names a brick kind and, optionally, the drop it releases. The table is a
//! contract between level design and runtime: change a symbol here and every
//! level using it changes with it.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::f32::consts::{FRAC_PI_2, PI};

use super::geometry::Rect;
use super::state::{BrickKind, DropKind};
use crate::config::GameConfig;
use crate::random::SeededRandom;

/// Number of authored levels; later levels repeat the last one
pub const LEVEL_COUNT: usize = 60;

/// Row-major, top row first. Every row reads the same backwards.
pub const LEVEL_PATTERNS: [[&str; 3]; LEVEL_COUNT] = [
    // 1
    ["ssssss", "ssssss", "ssssss"],
    ["ssssss", "spssps", "ssssss"],
    ["tsssst", "ssssss", "smssms"],
    ["stssts", "ssssss", "lssssl"],
    ["tttttt", "ssssss", "s.ss.s"],
    [".ssss.", "smssms", "ssssss"],
    ["sxssxs", "ssssss", "sgssgs"],
    ["tttttt", "sxssxs", "spssps"],
    ["s.ss.s", "tmttmt", "ssssss"],
    ["?ssss?", "ttsstt", "sxssxs"],
    // 11
    ["ussssu", "ssssss", "s?ss?s"],
    ["tsttst", "xsxxsx", "sgssgs"],
    ["ssssss", "uzsszu", "ssssss"],
    ["ttsstt", "sxssxs", "m.ss.m"],
    [".tsst.", "tsssst", "xsrrsx"],
    ["pppppp", "ssssss", "tttttt"],
    ["stssts", "tsttst", "?sxxs?"],
    ["utsstu", "ssssss", "snssns"],
    ["tttttt", "xxxxxx", "ssssss"],
    ["s?ss?s", "tqttqt", "smssms"],
    // 21
    [".xssx.", "stssts", "lttttl"],
    ["usuusu", "ssssss", "zssssz"],
    ["ssssss", "tPttPt", ".ssss."],
    ["tsttst", "sossos", "xssssx"],
    ["xtsstx", "tmssmt", "s.tt.s"],
    ["utuutu", "s?ss?s", "sxssxs"],
    ["ttsstt", "ux..xu", "sgssgs"],
    ["ssssss", "tttttt", "xxmmxx"],
    ["?t??t?", "ssssss", "tussut"],
    ["PtsstP", "stttts", "xlsslx"],
    // 31
    ["tttttt", "tzttzt", ".s..s."],
    ["uxuuxu", "tsttst", "smssms"],
    ["tsttst", "x?xx?x", "unuunu"],
    ["s.xx.s", "tMttMt", "ssssss"],
    ["ttxxtt", "usuusu", "sgssgs"],
    ["xttttx", "tPttPt", "sossos"],
    ["tuttut", "sxssxs", "?s??s?"],
    ["tttttt", "uuuuuu", "sxssxs"],
    ["LtsstL", "xtxxtx", "s.ss.s"],
    ["t?tt?t", "usuusu", "xrxxrx"],
    // 41
    ["tttttt", "txttxt", "qzqqzq"],
    [".u..u.", "tMttMt", "xsxxsx"],
    ["xxttxx", "ttsstt", "u?ss?u"],
    ["tPttPt", "uxuuxu", "smssms"],
    ["ttxxtt", "t?tt?t", "usggsu"],
    ["uttttu", "xWxxWx", "ssssss"],
    ["tttttt", "xMxxMx", "u.uu.u"],
    ["LxttxL", "tuttut", "s?rr?s"],
    ["tuttut", "xPxxPx", "tnttnt"],
    ["u?uu?u", "txttxt", "xmxxmx"],
    // 51
    ["tttttt", "tWttWt", "uxuuxu"],
    ["MtxxtM", "utuutu", "?s??s?"],
    ["txttxt", "uuuuuu", "LsPPsL"],
    ["xxxxxx", "tttttt", "uMuuMu"],
    ["tuttut", "x?xx?x", "tWttWt"],
    ["uxttxu", "tzttzt", "M?LL?M"],
    ["xWxxWx", "utuutu", "t?tt?t"],
    ["tMttMt", "xuxxux", "?o??o?"],
    ["uuuuuu", "xPxxPx", "tLttLt"],
    ["ttuutt", "xWxxWx", "M?MM?M"],
];

/// What the generator should put in one grid cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CellSpec {
    Empty,
    Brick { kind: BrickKind, drop: DropSlot },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DropSlot {
    None,
    Fixed(DropKind),
    /// Rolled from the level's seeded RNG
    Rolled,
}

/// Symbol lookup. `None` means the symbol is not part of the table.
pub fn cell_for_symbol(symbol: char) -> Option<CellSpec> {
    use BrickKind::*;
    let brick = |kind, drop| Some(CellSpec::Brick { kind, drop });
    let fixed = DropSlot::Fixed;
    match symbol {
        '.' | ' ' => Some(CellSpec::Empty),
        's' => brick(Standard, DropSlot::None),
        't' => brick(Tough, DropSlot::None),
        'x' => brick(Explosive, DropSlot::None),
        'u' => brick(Unbreakable, DropSlot::None),
        'm' => brick(Standard, fixed(DropKind::MultiBall { count: 2 })),
        'M' => brick(Tough, fixed(DropKind::MultiBall { count: 3 })),
        'l' => brick(Standard, fixed(DropKind::ExtraLife)),
        'L' => brick(Tough, fixed(DropKind::ExtraLife)),
        'g' => brick(Standard, fixed(DropKind::PaddleGrow)),
        'n' => brick(Standard, fixed(DropKind::PaddleShrink)),
        'r' => brick(Standard, fixed(DropKind::Rotation { angle: FRAC_PI_2 })),
        'q' => brick(Standard, fixed(DropKind::Rotation { angle: -FRAC_PI_2 })),
        'o' => brick(Standard, fixed(DropKind::Rotation { angle: PI })),
        'p' => brick(Standard, fixed(DropKind::Points { amount: 100 })),
        'P' => brick(Tough, fixed(DropKind::Points { amount: 1_000 })),
        'W' => brick(Explosive, fixed(DropKind::Points { amount: 10_000 })),
        'z' => brick(Standard, fixed(DropKind::Gun)),
        '?' => brick(Standard, DropSlot::Rolled),
        _ => None,
    }
}

/// Weighted drop table used by `?` cells
pub fn roll_drop(rng: &mut SeededRandom) -> DropKind {
    let roll = rng.next_uniform();
    if roll < 0.16 {
        DropKind::ExtraLife
    } else if roll < 0.32 {
        DropKind::MultiBall { count: 2 }
    } else if roll < 0.48 {
        DropKind::PaddleGrow
    } else if roll < 0.64 {
        DropKind::PaddleShrink
    } else if roll < 0.78 {
        const ANGLES: [f32; 3] = [FRAC_PI_2, -FRAC_PI_2, PI];
        let angle = ANGLES[pick_index(rng, ANGLES.len())];
        DropKind::Rotation { angle }
    } else if roll < 0.9 {
        DropKind::Gun
    } else {
        const AMOUNTS: [u64; 3] = [100, 1_000, 10_000];
        let amount = AMOUNTS[pick_index(rng, AMOUNTS.len())];
        DropKind::Points { amount }
    }
}

fn pick_index(rng: &mut SeededRandom, len: usize) -> usize {
    ((rng.next_uniform() * len as f64) as usize).min(len - 1)
}

/// One brick of a generated layout, in the layout's own (portrait) frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrickDescriptor {
    pub frame: Rect,
    pub kind: BrickKind,
    pub drop: Option<DropKind>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelLayout {
    pub bricks: Vec<BrickDescriptor>,
    pub seed: u64,
    pub level_number: u32,
    /// Playfield size the frames were computed for
    pub base_size: Vec2,
}

impl LevelLayout {
    /// Brick center relative to the base playfield, each axis in [-1, 1]
    pub fn normalized_center(&self, descriptor: &BrickDescriptor) -> Vec2 {
        let half = (self.base_size / 2.0).max(Vec2::ONE);
        descriptor.frame.center / half
    }
}

/// Hands out layouts for consecutive levels
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelGenerator {
    level_index: u32,
}

impl Default for LevelGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl LevelGenerator {
    pub fn new() -> Self {
        Self { level_index: 1 }
    }

    pub fn reset(&mut self) {
        self.level_index = 1;
    }

    /// Level number the next call to `next_layout` will produce
    pub fn level_index(&self) -> u32 {
        self.level_index
    }

    pub fn next_layout(&mut self, config: &GameConfig, size: Vec2) -> LevelLayout {
        let layout = layout_for_level(config, self.level_index, size);
        self.level_index += 1;
        layout
    }
}

/// Pattern for a 1-based level number, clamped to the last authored level
pub fn pattern_for_level(level: u32) -> &'static [&'static str; 3] {
    let index = (level.max(1) as usize - 1).min(LEVEL_COUNT - 1);
    &LEVEL_PATTERNS[index]
}

/// Build the full layout for `level` inside a playfield of `size`
pub fn layout_for_level(config: &GameConfig, level: u32, size: Vec2) -> LevelLayout {
    let seed = config.level_seed_base.wrapping_add(level as u64);
    let mut layout = LevelLayout {
        bricks: Vec::new(),
        seed,
        level_number: level,
        base_size: size,
    };
    if size.x <= 0.0 || size.y <= 0.0 {
        return layout;
    }

    let pattern = pattern_for_level(level);
    let mut rng = SeededRandom::new(seed);

    let rows = config.brick_rows;
    let columns = config.brick_columns;
    let top_margin = config.brick_top_margin;
    let bottom_margin =
        config.paddle_lane_inset + config.paddle_height * 1.5 + config.brick_bottom_margin;
    let usable_height = (size.y - top_margin - bottom_margin).max(40.0);

    let cell_width = size.x / columns as f32;
    let brick_width = (cell_width - config.brick_spacing).max(1.0);
    let cell_height = (usable_height / rows as f32)
        .clamp(config.brick_cell_height_min, config.brick_cell_height_max);
    let brick_height = config
        .brick_height
        .min(cell_height - config.brick_spacing)
        .max(1.0);
    let start_y = size.y / 2.0 - top_margin - cell_height / 2.0;
    let bottom_limit = -size.y / 2.0 + bottom_margin;
    let half = Vec2::new(brick_width / 2.0, brick_height / 2.0);

    for row in 0..rows {
        let center_y = start_y - row as f32 * cell_height;
        if center_y - half.y <= bottom_limit {
            continue;
        }
        let symbols: Vec<char> = pattern.get(row).map(|r| r.chars().collect()).unwrap_or_default();

        for column in 0..columns {
            let symbol = symbols.get(column).copied().unwrap_or('.');
            let (kind, slot) = match cell_for_symbol(symbol) {
                Some(CellSpec::Empty) => continue,
                Some(CellSpec::Brick { kind, drop }) => (kind, drop),
                None => {
                    log::debug!("Level {level}: unknown symbol {symbol:?}, using a plain brick");
                    (BrickKind::Standard, DropSlot::None)
                }
            };
            let drop = match slot {
                DropSlot::None => None,
                DropSlot::Fixed(kind) => Some(kind),
                DropSlot::Rolled => Some(roll_drop(&mut rng)),
            };

            let center_x = -size.x / 2.0 + cell_width * column as f32 + cell_width / 2.0;
            layout.bricks.push(BrickDescriptor {
                frame: Rect::new(Vec2::new(center_x, center_y), half),
                kind,
                drop,
            });
        }
    }

    layout
}

#[cfg(test)]
mod tests {
    use super::*;

    fn portrait() -> Vec2 {
        Vec2::new(186.0, 218.0)
    }

    #[test]
    fn test_table_shape_and_symmetry() {
        for (i, pattern) in LEVEL_PATTERNS.iter().enumerate() {
            for row in pattern {
                assert_eq!(row.len(), 6, "level {} row {row:?}", i + 1);
                let reversed: String = row.chars().rev().collect();
                assert_eq!(*row, reversed, "level {} row {row:?} is not symmetric", i + 1);
                for symbol in row.chars() {
                    assert!(cell_for_symbol(symbol).is_some(), "unknown symbol {symbol:?}");
                }
            }
        }
    }

    #[test]
    fn test_every_level_has_something_to_break() {
        for level in 1..=LEVEL_COUNT as u32 {
            let layout = layout_for_level(&GameConfig::default(), level, portrait());
            assert!(layout.bricks.iter().any(|b| b.kind.is_breakable()), "level {level}");
        }
    }

    #[test]
    fn test_first_level_geometry() {
        let layout = layout_for_level(&GameConfig::default(), 1, portrait());
        assert_eq!(layout.bricks.len(), 18);
        let first = &layout.bricks[0];
        assert!((first.frame.width() - 25.0).abs() < 1e-4);
        assert!((first.frame.height() - 16.0).abs() < 1e-4);
        assert!((first.frame.center.y - 58.0).abs() < 1e-4);
        assert!((first.frame.center.x - (-77.5)).abs() < 1e-4);
    }

    #[test]
    fn test_rows_that_reach_the_paddle_lane_are_skipped() {
        // Short playfield: usable height collapses to 40, rows land on the lane
        let layout = layout_for_level(&GameConfig::default(), 1, Vec2::new(186.0, 150.0));
        assert!(layout.bricks.len() < 18);
        let bottom_limit = -75.0 + 30.0 + 18.0 + 64.0;
        assert!(layout.bricks.iter().all(|b| b.frame.min().y > bottom_limit));
    }

    #[test]
    fn test_degenerate_size_yields_empty_layout() {
        let layout = layout_for_level(&GameConfig::default(), 3, Vec2::new(0.0, 200.0));
        assert!(layout.bricks.is_empty());
    }

    #[test]
    fn test_generator_is_deterministic_after_reset() {
        let config = GameConfig::default();
        let mut generator = LevelGenerator::new();
        let first: Vec<_> = (0..12).map(|_| generator.next_layout(&config, portrait())).collect();
        generator.reset();
        let second: Vec<_> = (0..12).map(|_| generator.next_layout(&config, portrait())).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_counter_clamps_to_last_pattern() {
        assert_eq!(pattern_for_level(60), pattern_for_level(61));
        assert_eq!(pattern_for_level(60), pattern_for_level(500));
        assert_eq!(pattern_for_level(0), pattern_for_level(1));

        let config = GameConfig::default();
        let last = layout_for_level(&config, 60, portrait());
        let beyond = layout_for_level(&config, 75, portrait());
        let kinds = |l: &LevelLayout| l.bricks.iter().map(|b| b.kind).collect::<Vec<_>>();
        assert_eq!(kinds(&last), kinds(&beyond));
    }

    #[test]
    fn test_symbol_drop_pairings() {
        let drop_of = |symbol| match cell_for_symbol(symbol) {
            Some(CellSpec::Brick { drop: DropSlot::Fixed(kind), .. }) => Some(kind),
            _ => None,
        };
        assert_eq!(drop_of('m'), Some(DropKind::MultiBall { count: 2 }));
        assert_eq!(drop_of('l'), Some(DropKind::ExtraLife));
        assert_eq!(drop_of('z'), Some(DropKind::Gun));
        assert_eq!(drop_of('o'), Some(DropKind::Rotation { angle: PI }));
        assert_eq!(drop_of('x'), None);
        assert_eq!(
            cell_for_symbol('u'),
            Some(CellSpec::Brick {
                kind: BrickKind::Unbreakable,
                drop: DropSlot::None
            })
        );
        assert_eq!(cell_for_symbol('#'), None);
    }

    #[test]
    fn test_rolled_drops_follow_level_seed() {
        let config = GameConfig::default();
        // Level 10 opens with `?` cells
        let a = layout_for_level(&config, 10, portrait());
        let b = layout_for_level(&config, 10, portrait());
        assert!(a.bricks[0].drop.is_some());
        assert_eq!(a.bricks[0].drop, b.bricks[0].drop);
    }

    #[test]
    fn test_normalized_center_spans_unit_square() {
        let layout = layout_for_level(&GameConfig::default(), 1, portrait());
        for brick in &layout.bricks {
            let n = layout.normalized_center(brick);
            assert!(n.x.abs() <= 1.0 && n.y.abs() <= 1.0);
        }
    }
}
