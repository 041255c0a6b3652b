use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::data::Dataset;

/// The dataset subset after filtering. Always a copy; the source is never touched.
pub type FilteredView = Dataset;

/// Keep rows whose `column` contains `substring`, ignoring case.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FilterCriterion {
    pub column: String,
    pub substring: String,
}

impl FilterCriterion {
    pub fn new(column: impl Into<String>, substring: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            substring: substring.into(),
        }
    }

    pub fn is_identity(&self) -> bool {
        self.substring.is_empty()
    }
}

/// Apply a single substring filter. Missing cells never match.
pub fn apply(dataset: &Dataset, criterion: &FilterCriterion) -> FilteredView {
    if criterion.is_identity() {
        return dataset.clone();
    }

    let column = match dataset.column(&criterion.column) {
        Some(c) => c,
        None => {
            warn!(column = %criterion.column, "filter column not found, view is empty");
            return dataset.select_rows(|_| false);
        }
    };

    let needle = criterion.substring.to_lowercase();
    let view = dataset.select_rows(|i| {
        column.cells[i]
            .as_text()
            .is_some_and(|text| text.to_lowercase().contains(&needle))
    });

    debug!(
        column = %criterion.column,
        substring = %criterion.substring,
        kept = view.row_count(),
        total = dataset.row_count(),
        "filter applied"
    );
    view
}
