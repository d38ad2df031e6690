//! Win evaluation over a completed grid.
//!
//! Rows, columns, and both diagonal directions are scanned for maximal runs
//! of identical icons. A run of three or more pays `base_mult × length`.
//! Families are scored independently: a cell may sit in a row win and a
//! column win at the same time, and both pay.

use crate::runtime::EffectiveIconInfo;
use crate::types::{Cell, Grid, IconId, PatternKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const MIN_RUN: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WinPattern {
    pub kind: PatternKind,
    /// Amount this pattern contributes to the payout.
    pub multiplier: f64,
    pub cells: Vec<Cell>,
    pub icons: Vec<IconId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoutComponent {
    pub description: String,
    pub amount: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub payout: f64,
    pub patterns: Vec<WinPattern>,
    pub components: Vec<PayoutComponent>,
}

impl Evaluation {
    /// Distinct families that paid, in scan order.
    pub fn families(&self) -> Vec<PatternKind> {
        let mut families: Vec<PatternKind> = Vec::new();
        for p in &self.patterns {
            if !families.contains(&p.kind) {
                families.push(p.kind);
            }
        }
        families
    }
}

/// The resolved outcome of one spin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpinResult {
    pub grid: Grid<IconId>,
    pub payout: f64,
    pub patterns: Vec<WinPattern>,
    pub components: Vec<PayoutComponent>,
}

impl SpinResult {
    pub fn new(grid: Grid<IconId>, eval: Evaluation) -> Self {
        Self {
            grid,
            payout: eval.payout,
            patterns: eval.patterns,
            components: eval.components,
        }
    }

    pub fn is_win(&self) -> bool {
        self.payout > 0.0
    }
}

pub fn evaluate_grid(
    grid: &Grid<IconId>,
    icons: &BTreeMap<IconId, EffectiveIconInfo>,
) -> Evaluation {
    let height = grid.len();
    // Ragged rows are clipped to the shortest.
    let width = grid.iter().map(Vec::len).min().unwrap_or(0);
    let mut scan = Scanner { grid, icons, eval: Evaluation::default() };

    for r in 0..height {
        scan.line(PatternKind::Horizontal, (0..width).map(|c| Cell::new(r, c)));
    }
    for c in 0..width {
        scan.line(PatternKind::Vertical, (0..height).map(|r| Cell::new(r, c)));
    }

    if width >= MIN_RUN && height >= MIN_RUN {
        // Down-right: one start per left-edge row and per top-edge column.
        let starts = (0..height).map(|r| (r, 0)).chain((1..width).map(|c| (0, c)));
        for (sr, sc) in starts {
            let len = (height - sr).min(width - sc);
            scan.line(PatternKind::Diagonal, (0..len).map(|i| Cell::new(sr + i, sc + i)));
        }
        // Down-left: one start per top-edge column and per right-edge row.
        let starts = (0..width).map(|c| (0, c)).chain((1..height).map(|r| (r, width - 1)));
        for (sr, sc) in starts {
            let len = (height - sr).min(sc + 1);
            scan.line(PatternKind::Diagonal, (0..len).map(|i| Cell::new(sr + i, sc - i)));
        }
    }

    scan.eval
}

struct Scanner<'a> {
    grid: &'a Grid<IconId>,
    icons: &'a BTreeMap<IconId, EffectiveIconInfo>,
    eval: Evaluation,
}

impl Scanner<'_> {
    fn icon(&self, cell: Cell) -> IconId {
        self.grid[cell.r][cell.c]
    }

    fn line(&mut self, kind: PatternKind, cells: impl Iterator<Item = Cell>) {
        let mut run: Vec<Cell> = Vec::new();
        for cell in cells {
            if let Some(last) = run.last() {
                if self.icon(*last) != self.icon(cell) {
                    self.close(kind, std::mem::take(&mut run));
                }
            }
            run.push(cell);
        }
        self.close(kind, run);
    }

    fn close(&mut self, kind: PatternKind, run: Vec<Cell>) {
        if run.len() < MIN_RUN {
            return;
        }
        let icon = self.icon(run[0]);
        let base = self.icons.get(&icon).map(|i| i.base_mult).unwrap_or(1.0);
        let amount = base * run.len() as f64;
        self.eval.payout += amount;
        self.eval.components.push(PayoutComponent {
            description: format!("{} {}x {icon}", kind.as_str(), run.len()),
            amount,
        });
        self.eval.patterns.push(WinPattern {
            kind,
            multiplier: amount,
            icons: vec![icon; run.len()],
            cells: run,
        });
    }
}
