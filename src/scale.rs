use std::cmp::Ordering;

use crate::data::Column;
use crate::ir::Scale;

/// Running min/max of the values a scene will place on one axis.
#[derive(Debug, Clone)]
pub struct MinMax {
    min: f64,
    max: f64,
}

impl Default for MinMax {
    fn default() -> Self {
        MinMax { min: f64::INFINITY, max: f64::NEG_INFINITY }
    }
}

impl MinMax {
    pub fn push(&mut self, v: f64) {
        if v.is_finite() {
            if v < self.min { self.min = v; }
            if v > self.max { self.max = v; }
        }
    }

    pub fn extend<I: IntoIterator<Item = f64>>(&mut self, values: I) {
        for v in values {
            self.push(v);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min > self.max
    }

    /// Padded domain; empty input gives (0, 1).
    pub fn padded(&self) -> (f64, f64) {
        if self.is_empty() {
            (0.0, 1.0)
        } else {
            pad_range(self.min, self.max)
        }
    }

    /// Padded domain that always contains zero (bars, areas, counts).
    pub fn padded_from_zero(&self) -> (f64, f64) {
        let mut mm = self.clone();
        mm.push(0.0);
        let (lo, hi) = mm.padded();
        let lo = if mm.min >= 0.0 { 0.0 } else { lo };
        let hi = if mm.max <= 0.0 { 0.0 } else { hi };
        // All zeros, or nothing at all
        if lo == hi { (0.0, 1.0) } else { (lo, hi) }
    }
}

// Widest domain whose span still fits in an f64
const DOMAIN_LIMIT: f64 = f64::MAX / 4.0;

/// Pad a data range by 5% on each side. The result always has a finite span,
/// so values near `f64::MAX` get clamped rather than producing an infinite axis.
pub fn pad_range(min: f64, max: f64) -> (f64, f64) {
    let (lo, hi) = if min == max {
        (min - 1.0, max + 1.0)
    } else {
        let padding = max * 0.05 - min * 0.05;
        (min - padding, max + padding)
    };
    let (lo, hi) = (lo.clamp(-DOMAIN_LIMIT, DOMAIN_LIMIT), hi.clamp(-DOMAIN_LIMIT, DOMAIN_LIMIT));
    if lo < hi { (lo, hi) } else { (-DOMAIN_LIMIT, DOMAIN_LIMIT) }
}

/// Distinct category labels in display order: numeric order when every label
/// parses as a number, lexicographic otherwise.
pub fn order_categories<I: IntoIterator<Item = String>>(labels: I) -> Vec<String> {
    let mut cats: Vec<String> = labels.into_iter().collect();
    cats.sort();
    cats.dedup();

    let all_numeric = cats.iter().all(|c| c.parse::<f64>().is_ok());
    if all_numeric {
        cats.sort_by(|a, b| {
            let (a, b) = (a.parse::<f64>().unwrap_or(0.0), b.parse::<f64>().unwrap_or(0.0));
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        });
    }
    cats
}

/// How a bound x column maps onto the horizontal axis.
#[derive(Debug, Clone)]
pub struct XAxis {
    pub scale: Scale,
    /// Axis position per row; `None` for missing cells.
    pub positions: Vec<Option<f64>>,
}

impl XAxis {
    /// Numeric columns map to themselves, text columns to category slots.
    pub fn for_column(column: &Column) -> Self {
        if column.is_numeric() {
            let positions: Vec<Option<f64>> = column.cells.iter().map(|c| c.as_f64()).collect();
            let mut mm = MinMax::default();
            mm.extend(positions.iter().flatten().cloned());
            XAxis { scale: Scale::continuous(mm.padded()), positions }
        } else {
            let (categories, positions) = category_slots(column);
            XAxis { scale: Scale::categorical(categories), positions }
        }
    }
}

/// Ordered categories of a column and each row's slot index.
pub fn category_slots(column: &Column) -> (Vec<String>, Vec<Option<f64>>) {
    let labels: Vec<Option<String>> = column.cells.iter().map(|c| c.as_text()).collect();
    let categories = order_categories(labels.iter().flatten().cloned());
    let positions = labels
        .iter()
        .map(|l| {
            l.as_ref()
                .and_then(|l| categories.iter().position(|c| c == l))
                .map(|i| i as f64)
        })
        .collect();
    (categories, positions)
}
