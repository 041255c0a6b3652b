use serde::{Deserialize, Serialize};

// =============================================================================
// Scene Graph
// =============================================================================

/// An sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color(pub u8, pub u8, pub u8);

impl Color {
    pub const WHITE: Color = Color(255, 255, 255);
    pub const BLACK: Color = Color(0, 0, 0);
    pub const GRAY: Color = Color(128, 128, 128);

    /// Perceived brightness in [0, 1], used to pick a readable label color.
    pub fn luminance(&self) -> f64 {
        (0.299 * self.0 as f64 + 0.587 * self.1 as f64 + 0.114 * self.2 as f64) / 255.0
    }

    pub fn contrasting_text(&self) -> Color {
        if self.luminance() > 0.55 { Color::BLACK } else { Color::WHITE }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scale {
    /// Data-space extent of the axis.
    pub domain: (f64, f64),
    pub is_categorical: bool,
    /// If categorical, maps index -> label
    pub categories: Vec<String>,
}

impl Scale {
    pub fn continuous(domain: (f64, f64)) -> Self {
        Scale { domain, is_categorical: false, categories: Vec::new() }
    }

    /// Categories sit at integer positions 0..n with half a slot of room on each side.
    pub fn categorical(categories: Vec<String>) -> Self {
        let n = categories.len().max(1) as f64;
        Scale { domain: (-0.5, n - 0.5), is_categorical: true, categories }
    }

    /// Tick label for a data-space position.
    pub fn label_at(&self, v: f64) -> String {
        if self.is_categorical {
            let idx = v.round();
            if (v - idx).abs() < 1e-6 && idx >= 0.0 && (idx as usize) < self.categories.len() {
                self.categories[idx as usize].clone()
            } else {
                String::new()
            }
        } else {
            format_tick(v)
        }
    }
}

fn format_tick(v: f64) -> String {
    if v == v.trunc() && v.abs() < 1e9 {
        format!("{}", v as i64)
    } else {
        let s = format!("{:.3}", v);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// The coordinate frame a scene is drawn in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Frame {
    /// Two axes with ticks and a grid.
    Cartesian { x: Scale, y: Scale },
    /// No axes. `square` keeps one data unit equal in both directions (pies, rings).
    Plain { x: (f64, f64), y: (f64, f64), square: bool },
}

impl Frame {
    pub fn ranges(&self) -> ((f64, f64), (f64, f64)) {
        match self {
            Frame::Cartesian { x, y } => (x.domain, y.domain),
            Frame::Plain { x, y, .. } => (*x, *y),
        }
    }
}

/// A list of primitive drawing commands in data coordinates.
/// The painter just executes these blindly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneGraph {
    pub width: u32,
    pub height: u32,
    pub title: String,
    pub x_label: Option<String>,
    pub y_label: Option<String>,
    pub background: Color,
    pub panel_background: Color,
    pub frame: Frame,
    pub commands: Vec<DrawCommand>,
    pub legend: Vec<LegendEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegendEntry {
    pub label: String,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DrawCommand {
    Line {
        points: Vec<(f64, f64)>,
        color: Color,
        width: u32,
    },
    Marker {
        points: Vec<(f64, f64)>,
        color: Color,
        /// Pixels
        radius: u32,
        alpha: f64,
    },
    Rect {
        // Top-Left, Bottom-Right
        tl: (f64, f64),
        br: (f64, f64),
        fill: Color,
        alpha: f64,
        border: Option<Color>,
    },
    Polygon {
        points: Vec<(f64, f64)>,
        fill: Color,
        alpha: f64,
        border: Option<Color>,
    },
    /// Centered text label.
    Text {
        at: (f64, f64),
        text: String,
        color: Color,
        size: u32,
    },
}

impl SceneGraph {
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn count(&self, pred: impl Fn(&DrawCommand) -> bool) -> usize {
        self.commands.iter().filter(|c| pred(c)).count()
    }
}
