//! Statistics shared by chart construction and the summary views.

use std::cmp::Ordering;

use crate::data::Dataset;

pub fn sort_floats(values: &mut [f64]) {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

pub fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    Some((min, max))
}

/// Sample standard deviation (n - 1).
pub fn std_dev(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let m = mean(values)?;
    let variance = values.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (n - 1) as f64;
    Some(variance.sqrt())
}

/// Linear-interpolated percentile of already sorted data.
pub fn percentile(sorted_data: &[f64], p: f64) -> f64 {
    let n = sorted_data.len();
    if n == 0 { return 0.0; }
    if n == 1 { return sorted_data[0]; }

    let rank = p * (n - 1) as f64;
    let lower_idx = rank.floor() as usize;
    let upper_idx = rank.ceil() as usize;

    if lower_idx == upper_idx {
        sorted_data[lower_idx]
    } else {
        let weight = rank - lower_idx as f64;
        sorted_data[lower_idx] * (1.0 - weight) + sorted_data[upper_idx] * weight
    }
}

/// Five-number summary with Tukey fences.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxStats {
    pub lower_whisker: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub upper_whisker: f64,
    pub outliers: Vec<f64>,
}

pub fn box_stats(values: &[f64]) -> Option<BoxStats> {
    if values.is_empty() {
        return None;
    }
    let mut ys = values.to_vec();
    sort_floats(&mut ys);

    let q1 = percentile(&ys, 0.25);
    let median = percentile(&ys, 0.50);
    let q3 = percentile(&ys, 0.75);
    let iqr = q3 - q1;

    let lower_fence = q1 - 1.5 * iqr;
    let upper_fence = q3 + 1.5 * iqr;

    // Whiskers reach the most extreme data inside the fences
    let lower_whisker = ys.iter().cloned().find(|&v| v >= lower_fence).unwrap_or(q1);
    let upper_whisker = ys.iter().rev().cloned().find(|&v| v <= upper_fence).unwrap_or(q3);
    let outliers = ys
        .iter()
        .cloned()
        .filter(|&v| v < lower_fence || v > upper_fence)
        .collect();

    Some(BoxStats { lower_whisker, q1, median, q3, upper_whisker, outliers })
}

/// Silverman's rule of thumb for bandwidth selection
pub fn silverman_bandwidth(data: &[f64]) -> f64 {
    let n = data.len() as f64;
    if n < 2.0 { return 1.0; }

    let std = std_dev(data).unwrap_or(0.0);

    let mut sorted = data.to_vec();
    sort_floats(&mut sorted);
    let iqr = percentile(&sorted, 0.75) - percentile(&sorted, 0.25);

    // h = 0.9 * min(std, IQR/1.34) * n^(-1/5)
    let scale = if iqr > 0.0 { std.min(iqr / 1.34) } else { std };
    if scale <= 0.0 { return 1.0; }
    0.9 * scale * n.powf(-0.2)
}

fn gaussian_kernel(u: f64) -> f64 {
    const SQRT_2PI: f64 = 2.5066282746310002;
    (-0.5 * u * u).exp() / SQRT_2PI
}

/// A density curve sampled on a regular grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Density {
    pub grid: Vec<f64>,
    /// Probability density (integrates to ~1 over the grid).
    pub density: Vec<f64>,
}

impl Density {
    /// Density rescaled so its peak is 1.
    pub fn normalized(&self) -> Vec<f64> {
        let peak = self.density.iter().cloned().fold(0.0f64, f64::max);
        if peak > 0.0 {
            self.density.iter().map(|d| d / peak).collect()
        } else {
            self.density.clone()
        }
    }
}

/// Gaussian KDE evaluated over [min - 3h, max + 3h].
pub fn kde(data: &[f64], grid_points: usize) -> Density {
    let n = data.len() as f64;
    let Some((min_v, max_v)) = min_max(data) else {
        return Density { grid: vec![], density: vec![] };
    };
    let bandwidth = silverman_bandwidth(data);

    let extend = 3.0 * bandwidth;
    let start = min_v - extend;
    let range = (max_v + extend) - start;
    let points = grid_points.max(2);
    let step = range / (points - 1) as f64;

    let mut grid = Vec::with_capacity(points);
    let mut density = Vec::with_capacity(points);
    for i in 0..points {
        let y = start + i as f64 * step;
        let d: f64 = data.iter().map(|&xi| gaussian_kernel((y - xi) / bandwidth)).sum();
        grid.push(y);
        density.push(d / (n * bandwidth));
    }

    Density { grid, density }
}

/// Equal-width histogram bins.
#[derive(Debug, Clone, PartialEq)]
pub struct Bins {
    pub start: f64,
    pub width: f64,
    pub counts: Vec<usize>,
}

impl Bins {
    pub fn edges(&self, i: usize) -> (f64, f64) {
        let lo = self.start + i as f64 * self.width;
        (lo, lo + self.width)
    }
}

pub fn histogram(values: &[f64], bin_count: usize) -> Bins {
    let bin_count = bin_count.max(1);
    let Some((min, max)) = min_max(values) else {
        return Bins { start: 0.0, width: 1.0, counts: vec![] };
    };

    let range = max - min;
    let (start, width) = if range == 0.0 {
        (min - 0.5, 1.0 / bin_count as f64)
    } else {
        (min, range / bin_count as f64)
    };

    let mut counts = vec![0usize; bin_count];
    for &v in values {
        // The maximum lands in the last bin rather than one past it
        let idx = (((v - start) / width).floor() as usize).min(bin_count - 1);
        counts[idx] += 1;
    }
    Bins { start, width, counts }
}

/// Sturges' rule.
pub fn sturges_bins(n: usize) -> usize {
    if n <= 1 {
        1
    } else {
        ((n as f64).log2().ceil() as usize) + 1
    }
}

/// Pearson correlation over the pairs where both values are present.
pub fn pearson(a: &[Option<f64>], b: &[Option<f64>]) -> f64 {
    let pairs: Vec<(f64, f64)> = a
        .iter()
        .zip(b)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .collect();
    if pairs.len() < 2 {
        return f64::NAN;
    }

    let n = pairs.len() as f64;
    let mx = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let my = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        sxy += (x - mx) * (y - my);
        sxx += (x - mx).powi(2);
        syy += (y - my).powi(2);
    }
    if sxx == 0.0 || syy == 0.0 {
        return f64::NAN;
    }
    (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0)
}

/// Pairwise correlation of every numeric column.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    /// Row-major, `columns.len()` squared.
    pub values: Vec<f64>,
}

impl CorrelationMatrix {
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.columns.len() + col]
    }
}

pub fn correlation_matrix(view: &Dataset) -> CorrelationMatrix {
    let numeric: Vec<_> = view.columns().iter().filter(|c| c.is_numeric()).collect();
    let series: Vec<Vec<Option<f64>>> = numeric
        .iter()
        .map(|c| c.cells.iter().map(|cell| cell.as_f64()).collect())
        .collect();

    let n = numeric.len();
    let mut values = vec![f64::NAN; n * n];
    for i in 0..n {
        for j in i..n {
            // A constant column has no defined coefficient, even with itself
            let r = pearson(&series[i], &series[j]);
            values[i * n + j] = r;
            values[j * n + i] = r;
        }
    }

    CorrelationMatrix {
        columns: numeric.iter().map(|c| c.name.clone()).collect(),
        values,
    }
}

/// One row of `describe()`.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSummary {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

/// Summary statistics of every numeric column, skipping missing values.
pub fn describe(view: &Dataset) -> Vec<ColumnSummary> {
    view.columns()
        .iter()
        .filter(|c| c.is_numeric())
        .map(|c| {
            let mut values = c.numbers();
            sort_floats(&mut values);
            let (min, max) = min_max(&values).unwrap_or((f64::NAN, f64::NAN));
            ColumnSummary {
                column: c.name.clone(),
                count: values.len(),
                mean: mean(&values).unwrap_or(f64::NAN),
                std: std_dev(&values).unwrap_or(f64::NAN),
                min,
                q1: if values.is_empty() { f64::NAN } else { percentile(&values, 0.25) },
                median: if values.is_empty() { f64::NAN } else { percentile(&values, 0.5) },
                q3: if values.is_empty() { f64::NAN } else { percentile(&values, 0.75) },
                max,
            }
        })
        .collect()
}

/// `describe()` as a text table, one row per statistic.
pub fn describe_table(view: &Dataset) -> String {
    let summaries = describe(view);
    if summaries.is_empty() {
        return "no numeric columns\n".to_string();
    }

    let mut out = format!("{:<6}", "");
    for s in &summaries {
        out.push_str(&format!("{:>14}", s.column));
    }
    out.push('\n');

    let rows: [(&str, fn(&ColumnSummary) -> f64); 8] = [
        ("count", |s| s.count as f64),
        ("mean", |s| s.mean),
        ("std", |s| s.std),
        ("min", |s| s.min),
        ("25%", |s| s.q1),
        ("50%", |s| s.median),
        ("75%", |s| s.q3),
        ("max", |s| s.max),
    ];
    for (label, get) in rows {
        out.push_str(&format!("{:<6}", label));
        for s in &summaries {
            out.push_str(&format!("{:>14.4}", get(s)));
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_percentile_interpolates() {
        let data = [1.0, 2.0, 3.0, 4.0];
        assert!(approx(percentile(&data, 0.5), 2.5));
        assert!(approx(percentile(&data, 0.0), 1.0));
        assert!(approx(percentile(&data, 1.0), 4.0));
    }

    #[test]
    fn test_box_stats_flags_outliers() {
        let stats = box_stats(&[1.0, 2.0, 3.0, 4.0, 100.0]).unwrap();
        assert_eq!(stats.median, 3.0);
        assert_eq!(stats.outliers, vec![100.0]);
        assert_eq!(stats.upper_whisker, 4.0);
        assert_eq!(stats.lower_whisker, 1.0);
        assert!(box_stats(&[]).is_none());
    }

    #[test]
    fn test_kde_integrates_to_one() {
        let d = kde(&[1.0, 2.0, 2.5, 3.0, 7.0], 256);
        let step = d.grid[1] - d.grid[0];
        let area: f64 = d.density.iter().sum::<f64>() * step;
        assert!((area - 1.0).abs() < 0.02, "area {area}");
        assert!(d.normalized().iter().cloned().fold(0.0, f64::max) <= 1.0);
    }

    #[test]
    fn test_histogram_counts_every_value() {
        let bins = histogram(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0], 5);
        assert_eq!(bins.counts.iter().sum::<usize>(), 6);
        assert_eq!(bins.counts[4], 2);
        let flat = histogram(&[3.0, 3.0], 4);
        assert_eq!(flat.counts.iter().sum::<usize>(), 2);
    }

    #[test]
    fn test_sturges() {
        assert_eq!(sturges_bins(1), 1);
        assert_eq!(sturges_bins(8), 4);
        assert_eq!(sturges_bins(100), 8);
    }

    #[test]
    fn test_pearson() {
        let a: Vec<Option<f64>> = vec![Some(1.0), Some(2.0), Some(3.0), None];
        let b: Vec<Option<f64>> = vec![Some(2.0), Some(4.0), Some(6.0), Some(1.0)];
        let c: Vec<Option<f64>> = vec![Some(3.0), Some(2.0), Some(1.0), Some(0.0)];
        assert!(approx(pearson(&a, &b), 1.0));
        assert!(approx(pearson(&a, &c), -1.0));
        let constant = vec![Some(5.0), Some(5.0), Some(5.0), Some(5.0)];
        assert!(pearson(&a, &constant).is_nan());
    }

    #[test]
    fn test_correlation_matrix_is_symmetric() {
        let ds = Dataset::load(b"region,a,b,c\nx,1,2,9\ny,2,4,3\nz,3,7,1\n").unwrap();
        let m = correlation_matrix(&ds);
        assert_eq!(m.columns, vec!["a", "b", "c"]);
        for i in 0..3 {
            assert!(approx(m.get(i, i), 1.0));
            for j in 0..3 {
                assert_eq!(m.get(i, j), m.get(j, i));
            }
        }
        assert!(m.get(0, 2) < 0.0);
    }

    #[test]
    fn test_describe() {
        let ds = Dataset::load(b"name,v\na,1\nb,2\nc,3\nd,\n").unwrap();
        let rows = describe(&ds);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].count, 3);
        assert!(approx(rows[0].mean, 2.0));
        assert!(approx(rows[0].std, 1.0));
        assert_eq!(rows[0].median, 2.0);
        let table = describe_table(&ds);
        assert!(table.lines().next().unwrap().contains('v'));
        assert_eq!(table.lines().count(), 9);
    }
}
