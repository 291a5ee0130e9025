use std::fmt;

use serde::Serialize;

/// arithmetic mean. 0.0 if `v` is empty.
pub fn mean(v: &[u16]) -> f64 {
    if v.is_empty() {
        return 0.0;
    }
    let sum: f64 = v.iter().map(|&x| x as f64).sum();
    sum / v.len() as f64
}

/// element ranked at `len / 2`, found by selection. `v` is reordered.
///
/// for even lengths this is the upper of the two central elements;
/// no averaging takes place.
pub fn median(v: &mut [u16]) -> Option<u16> {
    if v.is_empty() {
        return None;
    }
    let n = v.len() / 2;
    let (_, m, _) = v.select_nth_unstable(n);
    Some(*m)
}

/// population standard deviation. 0.0 with fewer than 2 samples.
pub fn standard_deviation(v: &[u16]) -> f64 {
    if v.len() < 2 {
        return 0.0;
    }
    let m = mean(v);
    let sq_sum: f64 = v.iter().map(|&x| x as f64 * x as f64).sum();
    (sq_sum / v.len() as f64 - m * m).max(0.0).sqrt()
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Summary {
    pub mean: f64,
    pub median: u16,
    pub stdev: f64,
}

impl Summary {
    pub fn from_samples(samples: &[u16]) -> Self {
        let mut sorted = samples.to_vec();
        Self {
            mean: mean(samples),
            median: median(&mut sorted).unwrap_or(0),
            stdev: standard_deviation(samples),
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "mean: {}", Significant(self.mean))?;
        writeln!(f, "median: {}", self.median)?;
        write!(f, "stdev: {}", Significant(self.stdev))
    }
}

/// prints at most 6 significant digits, trailing zeros dropped.
pub struct Significant(pub f64);

impl Significant {
    const DIGITS: i32 = 6;
}

impl fmt::Display for Significant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = self.0;
        if v == 0.0 || !v.is_finite() {
            return write!(f, "{v}");
        }
        let magnitude = v.abs().log10().floor() as i32;
        let decimals = (Self::DIGITS - 1 - magnitude).max(0) as usize;
        let s = format!("{v:.decimals$}");
        let s = if s.contains('.') {
            s.trim_end_matches('0').trim_end_matches('.')
        } else {
            s.as_str()
        };
        write!(f, "{s}")
    }
}

pub trait Stat {
    fn view(&self, max_width: usize) -> Box<dyn StatView + '_>;
}

pub trait StatView: fmt::Display {
    /// header of stat
    fn header(&self) -> String;
    /// body width
    fn width(&self) -> usize;
}

#[derive(Default)]
pub struct Stats<'a> {
    stats: Vec<&'a dyn Stat>,
}

impl<'a> Stats<'a> {
    pub fn push(&mut self, stat: &'a dyn Stat) {
        self.stats.push(stat)
    }
    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }
    pub fn view(&self, max_width: usize) -> StatAllView<'_> {
        StatAllView {
            views: self.stats.iter().map(|s| s.view(max_width)).collect(),
        }
    }
}

pub struct StatAllView<'s> {
    views: Vec<Box<dyn StatView + 's>>,
}

impl fmt::Display for StatAllView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .views
            .iter()
            .map(|s| s.header().len().max(s.width()))
            .max()
            .unwrap_or(0);
        writeln!(f, "{:-^width$}", " statistics ")?;
        for sv in &self.views {
            writeln!(f, "{}:", sv.header())?;
            writeln!(f, "{}", sv)?;
        }
        write!(f, "{:-<width$}", "")
    }
}

/// occupancy histogram of a sample set, bars scaled to fit a width.
pub struct Histogram {
    header: String,
    // (occupancy, count), ascending by occupancy
    bins: Vec<(u16, usize)>,
    bar_width: usize,
}

impl Histogram {
    const LABEL_WIDTH: usize = 16;

    pub fn new(header: String, samples: &[u16], max_width: usize) -> Self {
        let mut sorted = samples.to_vec();
        sorted.sort_unstable();
        let mut bins: Vec<(u16, usize)> = Vec::new();
        for v in sorted {
            if let Some((last, count)) = bins.last_mut() {
                if *last == v {
                    *count += 1;
                    continue;
                }
            }
            bins.push((v, 1));
        }
        Self {
            header,
            bins,
            bar_width: max_width.saturating_sub(Self::LABEL_WIDTH).max(1),
        }
    }

    fn bar_len(&self, count: usize) -> usize {
        let max = self.bins.iter().map(|&(_, c)| c).max().unwrap_or(1);
        (count * self.bar_width).div_ceil(max)
    }
}

impl StatView for Histogram {
    fn header(&self) -> String {
        self.header.clone()
    }
    fn width(&self) -> usize {
        self.bins
            .iter()
            .map(|&(_, c)| Self::LABEL_WIDTH + self.bar_len(c))
            .max()
            .unwrap_or(Self::LABEL_WIDTH)
    }
}

impl fmt::Display for Histogram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for &(v, c) in &self.bins {
            if !first {
                writeln!(f)?;
            }
            first = false;
            let label = format!("{v:>5} ({c:>4}) ");
            write!(f, "  {label:<14}{}", "#".repeat(self.bar_len(c)))?;
        }
        Ok(())
    }
}
