use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::data::Dataset;
use crate::error::BindingError;

/// The closed catalog of chart kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Scatter,
    Line,
    Histogram,
    Box,
    Heatmap,
    Area,
    Bar,
    Pie,
    Violin,
    Bubble,
    Treemap,
    Sunburst,
}

impl ChartKind {
    pub const ALL: [ChartKind; 12] = [
        ChartKind::Scatter,
        ChartKind::Line,
        ChartKind::Histogram,
        ChartKind::Box,
        ChartKind::Heatmap,
        ChartKind::Area,
        ChartKind::Bar,
        ChartKind::Pie,
        ChartKind::Violin,
        ChartKind::Bubble,
        ChartKind::Treemap,
        ChartKind::Sunburst,
    ];

    /// Display label, as shown in the picker and the report.
    pub fn label(self) -> &'static str {
        match self {
            ChartKind::Scatter => "Scatter Plot",
            ChartKind::Line => "Line Plot",
            ChartKind::Histogram => "Histogram",
            ChartKind::Box => "Box Plot",
            ChartKind::Heatmap => "Heatmap",
            ChartKind::Area => "Area Plot",
            ChartKind::Bar => "Bar Plot",
            ChartKind::Pie => "Pie Chart",
            ChartKind::Violin => "Violin Plot",
            ChartKind::Bubble => "Bubble Chart",
            ChartKind::Treemap => "Treemap",
            ChartKind::Sunburst => "Sunburst Chart",
        }
    }

    pub fn short_name(self) -> &'static str {
        match self {
            ChartKind::Scatter => "scatter",
            ChartKind::Line => "line",
            ChartKind::Histogram => "histogram",
            ChartKind::Box => "box",
            ChartKind::Heatmap => "heatmap",
            ChartKind::Area => "area",
            ChartKind::Bar => "bar",
            ChartKind::Pie => "pie",
            ChartKind::Violin => "violin",
            ChartKind::Bubble => "bubble",
            ChartKind::Treemap => "treemap",
            ChartKind::Sunburst => "sunburst",
        }
    }

    /// The fixed binding template for this kind.
    pub fn template(self) -> BindingTemplate {
        use Role::*;
        match self {
            ChartKind::Scatter | ChartKind::Line | ChartKind::Area | ChartKind::Bar => BindingTemplate {
                required: &[X, Y],
                numeric_only: &[Y],
            },
            ChartKind::Bubble => BindingTemplate {
                required: &[X, Y, Size],
                numeric_only: &[Y, Size],
            },
            ChartKind::Histogram => BindingTemplate {
                required: &[X],
                numeric_only: &[],
            },
            ChartKind::Box | ChartKind::Violin => BindingTemplate {
                required: &[X, Y],
                numeric_only: &[Y],
            },
            ChartKind::Heatmap => BindingTemplate {
                required: &[],
                numeric_only: &[],
            },
            ChartKind::Pie | ChartKind::Treemap | ChartKind::Sunburst => BindingTemplate {
                required: &[Category, Value],
                numeric_only: &[Value],
            },
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ChartKind {
    type Err = String;

    /// Accepts short names (`bar`) and labels (`Bar Plot`), ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        ChartKind::ALL
            .into_iter()
            .find(|k| k.short_name() == wanted || k.label().to_lowercase() == wanted)
            .ok_or_else(|| format!("unknown chart kind '{}'", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    #[default]
    Interactive,
    Static,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Backend::Interactive => "Interactive",
            Backend::Static => "Static",
        })
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "interactive" | "plotly" => Ok(Backend::Interactive),
            "static" | "matplotlib" | "seaborn" => Ok(Backend::Static),
            other => Err(format!("unknown backend '{}'", other)),
        }
    }
}

/// A named role a column can play in a chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    X,
    Y,
    Size,
    Category,
    Value,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Role::X => "x",
            Role::Y => "y",
            Role::Size => "size",
            Role::Category => "category",
            Role::Value => "value",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindingTemplate {
    pub required: &'static [Role],
    pub numeric_only: &'static [Role],
}

impl BindingTemplate {
    pub fn is_numeric_only(&self, role: Role) -> bool {
        self.numeric_only.contains(&role)
    }
}

/// Column selections as made by the user; any subset may be set.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Bindings {
    pub x: Option<String>,
    pub y: Option<String>,
    pub size: Option<String>,
    pub category: Option<String>,
    pub value: Option<String>,
}

impl Bindings {
    pub fn get(&self, role: Role) -> Option<&str> {
        match role {
            Role::X => self.x.as_deref(),
            Role::Y => self.y.as_deref(),
            Role::Size => self.size.as_deref(),
            Role::Category => self.category.as_deref(),
            Role::Value => self.value.as_deref(),
        }
    }

    pub fn set(&mut self, role: Role, column: Option<String>) {
        let slot = match role {
            Role::X => &mut self.x,
            Role::Y => &mut self.y,
            Role::Size => &mut self.size,
            Role::Category => &mut self.category,
            Role::Value => &mut self.value,
        };
        *slot = column;
    }

    pub fn with(mut self, role: Role, column: impl Into<String>) -> Self {
        self.set(role, Some(column.into()));
        self
    }
}

/// One column picker: the role it fills and the columns it may offer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolePicker {
    pub role: Role,
    pub numeric_only: bool,
    pub candidates: Vec<String>,
}

/// What a chart kind needs from the user, given the columns at hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredBindings {
    pub kind: ChartKind,
    pub pickers: Vec<RolePicker>,
}

impl RequiredBindings {
    pub fn roles(&self) -> Vec<Role> {
        self.pickers.iter().map(|p| p.role).collect()
    }
}

/// A chart selection whose bindings have been checked against a view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub backend: Backend,
    pub bindings: Bindings,
}

impl ChartSpec {
    /// Bound column for a role. Only roles in the kind's template are populated.
    pub fn column(&self, role: Role) -> Option<&str> {
        self.bindings.get(role)
    }

    pub fn with_backend(&self, backend: Backend) -> Self {
        Self { backend, ..self.clone() }
    }
}

/// List the pickers a chart kind needs. Numeric-only roles offer only numeric columns.
pub fn resolve(kind: ChartKind, available: &Dataset) -> RequiredBindings {
    let template = kind.template();
    let all = available.column_names();
    let numeric = available.numeric_columns();

    let pickers = template
        .required
        .iter()
        .map(|&role| {
            let numeric_only = template.is_numeric_only(role);
            RolePicker {
                role,
                numeric_only,
                candidates: if numeric_only { numeric.clone() } else { all.clone() },
            }
        })
        .collect();

    RequiredBindings { kind, pickers }
}

/// Check the user's selections against the view and produce a ChartSpec.
///
/// The backend plays no part in validation; the same selections are valid or
/// invalid for both backends.
pub fn validate(
    kind: ChartKind,
    backend: Backend,
    selected: &Bindings,
    view: &Dataset,
) -> Result<ChartSpec, BindingError> {
    let template = kind.template();
    let mut bindings = Bindings::default();

    for &role in template.required {
        let name = selected
            .get(role)
            .filter(|n| !n.is_empty())
            .ok_or(BindingError::Missing { kind, role })?;

        let column = view.column(name).ok_or_else(|| BindingError::UnknownColumn {
            role,
            column: name.to_string(),
        })?;

        if template.is_numeric_only(role) && !column.is_numeric() {
            return Err(BindingError::NotNumeric {
                role,
                column: name.to_string(),
            });
        }

        bindings.set(role, Some(name.to_string()));
    }

    if kind == ChartKind::Heatmap {
        let found = view.numeric_columns().len();
        if found < 2 {
            return Err(BindingError::TooFewNumericColumns { found });
        }
    }

    Ok(ChartSpec { kind, backend, bindings })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use Role::*;

    fn sales() -> Dataset {
        Dataset::load(b"region,sales,cost\nEast,100,40\nWest,80,30\n").unwrap()
    }

    #[test]
    fn test_templates_match_catalog() {
        let expected: [(ChartKind, &[Role], &[Role]); 12] = [
            (ChartKind::Scatter, &[X, Y], &[Y]),
            (ChartKind::Line, &[X, Y], &[Y]),
            (ChartKind::Histogram, &[X], &[]),
            (ChartKind::Box, &[X, Y], &[Y]),
            (ChartKind::Heatmap, &[], &[]),
            (ChartKind::Area, &[X, Y], &[Y]),
            (ChartKind::Bar, &[X, Y], &[Y]),
            (ChartKind::Pie, &[Category, Value], &[Value]),
            (ChartKind::Violin, &[X, Y], &[Y]),
            (ChartKind::Bubble, &[X, Y, Size], &[Y, Size]),
            (ChartKind::Treemap, &[Category, Value], &[Value]),
            (ChartKind::Sunburst, &[Category, Value], &[Value]),
        ];
        for (kind, required, numeric) in expected {
            let t = kind.template();
            assert_eq!(t.required, required, "{kind}");
            assert_eq!(t.numeric_only, numeric, "{kind}");
        }
    }

    #[test]
    fn test_resolve_offers_numeric_candidates_for_numeric_roles() {
        let req = resolve(ChartKind::Bar, &sales());
        assert_eq!(req.roles(), vec![X, Y]);
        assert_eq!(req.pickers[0].candidates, vec!["region", "sales", "cost"]);
        assert_eq!(req.pickers[1].candidates, vec!["sales", "cost"]);
        assert!(req.pickers[1].numeric_only);
    }

    #[test]
    fn test_validate_bar() {
        let sel = Bindings::default().with(X, "region").with(Y, "sales");
        let spec = validate(ChartKind::Bar, Backend::Static, &sel, &sales()).unwrap();
        assert_eq!(spec.column(X), Some("region"));
        assert_eq!(spec.column(Y), Some("sales"));
    }

    #[test]
    fn test_validate_drops_unused_bindings() {
        let sel = Bindings::default()
            .with(X, "region")
            .with(Y, "sales")
            .with(Size, "cost");
        let spec = validate(ChartKind::Scatter, Backend::Interactive, &sel, &sales()).unwrap();
        assert_eq!(spec.column(Size), None);
    }

    #[test]
    fn test_validate_missing_binding() {
        let sel = Bindings::default().with(X, "region");
        let err = validate(ChartKind::Line, Backend::Interactive, &sel, &sales()).unwrap_err();
        assert_eq!(err, BindingError::Missing { kind: ChartKind::Line, role: Y });
    }

    #[test]
    fn test_validate_non_numeric_value() {
        let sel = Bindings::default().with(Category, "region").with(Value, "region");
        let err = validate(ChartKind::Pie, Backend::Interactive, &sel, &sales()).unwrap_err();
        assert!(matches!(err, BindingError::NotNumeric { role: Value, .. }));
    }

    #[test]
    fn test_validate_unknown_column() {
        let sel = Bindings::default().with(X, "nope");
        let err = validate(ChartKind::Histogram, Backend::Static, &sel, &sales()).unwrap_err();
        assert!(matches!(err, BindingError::UnknownColumn { role: X, .. }));
    }

    #[test]
    fn test_histogram_accepts_text_x() {
        let sel = Bindings::default().with(X, "region");
        assert!(validate(ChartKind::Histogram, Backend::Static, &sel, &sales()).is_ok());
    }

    #[test]
    fn test_heatmap_needs_two_numeric_columns() {
        let ds = Dataset::load(b"region,sales\nEast,1\nWest,2\n").unwrap();
        let err = validate(ChartKind::Heatmap, Backend::Static, &Bindings::default(), &ds).unwrap_err();
        assert_eq!(err, BindingError::TooFewNumericColumns { found: 1 });
        assert!(validate(ChartKind::Heatmap, Backend::Static, &Bindings::default(), &sales()).is_ok());
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!("bar".parse::<ChartKind>().unwrap(), ChartKind::Bar);
        assert_eq!("Sunburst Chart".parse::<ChartKind>().unwrap(), ChartKind::Sunburst);
        assert!("radar".parse::<ChartKind>().is_err());
        assert_eq!("seaborn".parse::<Backend>().unwrap(), Backend::Static);
    }

    fn arb_bindings() -> impl Strategy<Value = Bindings> {
        let col = prop::option::of(prop::sample::select(vec![
            "region".to_string(),
            "sales".to_string(),
            "cost".to_string(),
        ]));
        (col.clone(), col.clone(), col.clone(), col.clone(), col).prop_map(|(x, y, size, category, value)| Bindings {
            x,
            y,
            size,
            category,
            value,
        })
    }

    proptest! {
        #[test]
        fn prop_validation_is_backend_independent(sel in arb_bindings(), idx in 0usize..12) {
            let kind = ChartKind::ALL[idx];
            let ds = sales();
            let interactive = validate(kind, Backend::Interactive, &sel, &ds);
            let static_ = validate(kind, Backend::Static, &sel, &ds);
            match (interactive, static_) {
                (Ok(a), Ok(b)) => prop_assert_eq!(a.with_backend(Backend::Static), b),
                (Err(a), Err(b)) => prop_assert_eq!(a, b),
                _ => prop_assert!(false, "backends disagree"),
            }
        }

        #[test]
        fn prop_validation_fails_iff_missing_or_non_numeric(sel in arb_bindings(), idx in 0usize..12) {
            let kind = ChartKind::ALL[idx];
            let template = kind.template();
            let ds = sales();
            let bad = template.required.iter().any(|&role| match sel.get(role) {
                None => true,
                Some(col) => template.is_numeric_only(role) && col == "region",
            });
            prop_assert_eq!(validate(kind, Backend::Interactive, &sel, &ds).is_err(), bad);
        }

        #[test]
        fn prop_resolve_ignores_dataset_content(idx in 0usize..12) {
            let kind = ChartKind::ALL[idx];
            let small = Dataset::load(b"a\nx\n").unwrap();
            prop_assert_eq!(resolve(kind, &sales()).roles(), resolve(kind, &small).roles());
            prop_assert_eq!(resolve(kind, &small).roles(), kind.template().required.to_vec());
        }
    }
}
