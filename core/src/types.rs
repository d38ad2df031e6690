//! Shared primitive types used across the entire simulation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Simulated time in milliseconds.
pub type Millis = f64;

/// A monotonically increasing spin counter, one per started session.
pub type SpinId = u64;

/// The canonical run identifier.
pub type RunId = String;

/// A rows × columns matrix.
pub type Grid<T> = Vec<Vec<T>>;

/// The closed icon set. Declaration order is the stable enumeration order
/// used by strip generation. NEVER reorder, only append.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IconId {
    Lemon,
    Grape,
    Melon,
    Cherry,
    Diamond,
    Bar,
    Seven,
    Bell,
    Star,
}

impl IconId {
    pub const ALL: [IconId; 9] = [
        IconId::Lemon,
        IconId::Grape,
        IconId::Melon,
        IconId::Cherry,
        IconId::Diamond,
        IconId::Bar,
        IconId::Seven,
        IconId::Bell,
        IconId::Star,
    ];

    /// Icon used to fill strips when the pool is empty.
    pub const FALLBACK: IconId = IconId::Lemon;

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lemon   => "lemon",
            Self::Grape   => "grape",
            Self::Melon   => "melon",
            Self::Cherry  => "cherry",
            Self::Diamond => "diamond",
            Self::Bar     => "bar",
            Self::Seven   => "seven",
            Self::Bell    => "bell",
            Self::Star    => "star",
        }
    }
}

impl fmt::Display for IconId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IconId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IconId::ALL
            .iter()
            .copied()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| format!("\"{s}\" is not a recognised icon id"))
    }
}

/// One grid coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub r: usize,
    pub c: usize,
}

impl Cell {
    pub fn new(r: usize, c: usize) -> Self {
        Self { r, c }
    }
}

/// (width, height) of a grid; an empty grid is 0×0.
pub fn grid_dims<T>(grid: &Grid<T>) -> (usize, usize) {
    let height = grid.len();
    let width = grid.first().map(|row| row.len()).unwrap_or(0);
    (width, height)
}

/// Line families the evaluator scans. Also the target of family-scoped
/// modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    Horizontal,
    Vertical,
    Diagonal,
}

impl PatternKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Horizontal => "horizontal",
            Self::Vertical   => "vertical",
            Self::Diagonal   => "diagonal",
        }
    }
}

impl FromStr for PatternKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "horizontal" => Ok(Self::Horizontal),
            "vertical"   => Ok(Self::Vertical),
            "diagonal"   => Ok(Self::Diagonal),
            other => Err(format!("\"{other}\" is not a known pattern family")),
        }
    }
}
