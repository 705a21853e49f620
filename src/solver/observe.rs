//! Entropy-driven cell selection and collapse
//!
//! The entropy of a cell is the sum of the weights of its still-possible
//! patterns, plus a small random tie-breaking perturbation. The scan is
//! also where contradictions surface: a cell with nothing left to be makes
//! the whole attempt fail.

use crate::model::Model;
use crate::solver::wave::Output;
use rand::Rng;
use rand::rngs::StdRng;

/// Terminal or intermediate state of one attempt
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RunStatus {
    /// Every non-boundary cell is frozen to a single pattern
    Success,
    /// Some cell has no possible pattern left (contradiction)
    Fail,
    /// Undecided cells remain
    Unfinished,
}

impl RunStatus {
    /// Human-readable status label
    pub const fn label(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Fail => "contradiction",
            Self::Unfinished => "unfinished",
        }
    }
}

/// Outcome of one entropy scan over all cells
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CellChoice {
    /// All non-boundary cells are frozen; the attempt succeeded
    Finished,
    /// A cell has zero possible patterns; the attempt failed
    Contradiction,
    /// Least-certain cell to collapse next
    Cell {
        /// Cell x coordinate
        x: usize,
        /// Cell y coordinate
        y: usize,
    },
}

/// Scan all non-boundary cells for the lowest-entropy undecided one
///
/// Frozen cells are skipped; ties break on a uniform perturbation in
/// [0, 0.5) so equal-entropy cells are chosen uniformly over a run.
pub fn find_lowest_entropy(model: &dyn Model, output: &Output, rng: &mut StdRng) -> CellChoice {
    let mut min = f64::INFINITY;
    let mut best = None;

    for x in 0..model.width() {
        for y in 0..model.height() {
            if model.on_boundary(x, y) {
                continue;
            }

            let mut superimposed = 0usize;
            let mut entropy = 0.0;
            for t in 0..model.num_patterns() {
                if output.wave.get(x, y, t) {
                    superimposed += 1;
                    entropy += model.pattern_weight(t);
                }
            }

            if superimposed == 0 || entropy <= 0.0 {
                return CellChoice::Contradiction;
            }
            if superimposed == 1 {
                continue;
            }

            let noise = 0.5 * rng.random::<f64>();
            if entropy + noise < min {
                min = entropy + noise;
                best = Some((x, y));
            }
        }
    }

    match best {
        Some((x, y)) => CellChoice::Cell { x, y },
        None => CellChoice::Finished,
    }
}

/// Pick a random index proportionally to `weights`
///
/// `spin` must be uniform in [0, 1). Zero-weight entries are never chosen;
/// all-zero weights fall back to index 0.
fn weighted_choice(weights: &[f64], spin: f64) -> usize {
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return 0;
    }

    let mut remaining = spin * total;
    let mut last_positive = 0;
    for (i, &weight) in weights.iter().enumerate() {
        if weight <= 0.0 {
            continue;
        }
        last_positive = i;
        remaining -= weight;
        if remaining <= 0.0 {
            return i;
        }
    }
    last_positive
}

/// Collapse the least-certain cell to one weighted-random pattern
///
/// Returns `Success` or `Fail` when the entropy scan is terminal; otherwise
/// collapses the chosen cell, marks it dirty, and returns `Unfinished` with
/// propagation still owed to the caller.
pub fn observe(model: &dyn Model, output: &mut Output, rng: &mut StdRng) -> RunStatus {
    let (x, y) = match find_lowest_entropy(model, output, rng) {
        CellChoice::Finished => return RunStatus::Success,
        CellChoice::Contradiction => return RunStatus::Fail,
        CellChoice::Cell { x, y } => (x, y),
    };

    let distribution: Vec<f64> = (0..model.num_patterns())
        .map(|t| {
            if output.wave.get(x, y, t) {
                model.pattern_weight(t)
            } else {
                0.0
            }
        })
        .collect();

    let chosen = weighted_choice(&distribution, rng.random::<f64>());
    output.wave.collapse_to(x, y, chosen);
    output.changes.set(x, y);

    RunStatus::Unfinished
}
