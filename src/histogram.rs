//! Binned accumulators for reduction results
//!
//! Histograms follow the usual HEP bin numbering convention: bin 0 collects
//! underflow, bins `1..=n_bins` cover the axis range, and bin `n_bins + 1`
//! collects overflow. Bin contents are sums of weights, so histograms produced
//! by independent shards can be merged by plain bin-wise addition.

use crate::{numeric::Float, Result};
use eyre::{bail, ensure, eyre};
use indexmap::IndexMap;
use num_traits::{ToPrimitive, Zero};

/// Binning of one histogram axis: `n_bins` equal-width bins over `[low, high)`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Axis {
    n_bins: usize,
    low: Float,
    high: Float,
}
//
impl Axis {
    /// Set up a uniform binning, checking that it makes sense
    pub fn new(n_bins: usize, low: Float, high: Float) -> Result<Self> {
        ensure!(n_bins > 0, "An axis needs at least one bin");
        ensure!(
            low.is_finite() && high.is_finite() && low < high,
            "Invalid axis range [{}, {})",
            low,
            high
        );
        Ok(Self { n_bins, low, high })
    }

    /// Number of in-range bins
    pub fn n_bins(&self) -> usize {
        self.n_bins
    }

    /// Lower edge of the first in-range bin
    pub fn low(&self) -> Float {
        self.low
    }

    /// Upper edge of the last in-range bin
    pub fn high(&self) -> Float {
        self.high
    }

    /// Number of bins including underflow and overflow
    fn n_bins_with_flows(&self) -> usize {
        self.n_bins + 2
    }

    /// Bin which a value falls into, or None for NaN
    pub fn find_bin(&self, x: Float) -> Option<usize> {
        if x.is_nan() {
            return None;
        }
        if x < self.low {
            return Some(0);
        }
        if x >= self.high {
            return Some(self.n_bins + 1);
        }
        let scaled = (x - self.low) / (self.high - self.low) * (self.n_bins as Float);
        // Rounding can push values just below `high` onto the overflow edge
        let in_range = scaled.floor().to_usize()?.min(self.n_bins - 1);
        Some(in_range + 1)
    }

    /// Lower edge of an in-range bin
    pub fn bin_low_edge(&self, bin: usize) -> Float {
        self.low + (bin as Float - 1.) * self.bin_width()
    }

    /// Center of an in-range bin
    pub fn bin_center(&self, bin: usize) -> Float {
        self.bin_low_edge(bin) + 0.5 * self.bin_width()
    }

    /// Width of every bin
    pub fn bin_width(&self) -> Float {
        (self.high - self.low) / (self.n_bins as Float)
    }
}

/// One-dimensional histogram
#[derive(Clone, Debug, PartialEq)]
pub struct Histogram1D {
    name: String,
    title: String,
    axis: Axis,
    /// Sum of weights per bin, flow bins included
    contents: Vec<Float>,
    /// Number of fill calls that landed in any bin
    entries: u64,
}
//
impl Histogram1D {
    /// Create an empty histogram
    pub fn new(name: impl Into<String>, title: impl Into<String>, axis: Axis) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            axis,
            contents: vec![Float::zero(); axis.n_bins_with_flows()],
            entries: 0,
        }
    }

    /// Name which the histogram is looked up by
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Human-readable description
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Binning of the histogram
    pub fn axis(&self) -> &Axis {
        &self.axis
    }

    /// Number of accumulated entries (flow bins included)
    pub fn entries(&self) -> u64 {
        self.entries
    }

    /// Record one unit-weight value, returning the bin it landed in
    pub fn fill(&mut self, x: Float) -> Option<usize> {
        let bin = self.axis.find_bin(x)?;
        self.contents[bin] += 1.;
        self.entries += 1;
        Some(bin)
    }

    /// Content of a bin, following the flow bin numbering convention
    pub fn bin_content(&self, bin: usize) -> Float {
        self.contents.get(bin).copied().unwrap_or_else(Float::zero)
    }

    /// Content of the bin which `x` falls into
    pub fn content_at(&self, x: Float) -> Float {
        self.axis
            .find_bin(x)
            .map_or_else(Float::zero, |bin| self.bin_content(bin))
    }

    /// Content of the underflow bin
    pub fn underflow(&self) -> Float {
        self.contents[0]
    }

    /// Content of the overflow bin
    pub fn overflow(&self) -> Float {
        self.contents[self.axis.n_bins + 1]
    }

    /// Sum of in-range bin contents
    pub fn integral(&self) -> Float {
        self.contents[1..=self.axis.n_bins].iter().sum()
    }

    /// Add another histogram with the same binning to this one
    pub fn merge(&mut self, other: &Self) -> Result<()> {
        self.check_mergeable(other)?;
        self.add(other);
        Ok(())
    }

    fn check_mergeable(&self, other: &Self) -> Result<()> {
        ensure!(
            self.axis == other.axis,
            "Cannot merge {} histograms with different binnings",
            self.name
        );
        Ok(())
    }

    fn add(&mut self, other: &Self) {
        for (acc, &content) in self.contents.iter_mut().zip(&other.contents) {
            *acc += content;
        }
        self.entries += other.entries;
    }
}

/// Two-dimensional histogram
#[derive(Clone, Debug, PartialEq)]
pub struct Histogram2D {
    name: String,
    title: String,
    x_axis: Axis,
    y_axis: Axis,
    /// Sum of weights per bin, flow bins included, x varies fastest
    contents: Vec<Float>,
    entries: u64,
}
//
impl Histogram2D {
    /// Create an empty histogram
    pub fn new(
        name: impl Into<String>,
        title: impl Into<String>,
        x_axis: Axis,
        y_axis: Axis,
    ) -> Self {
        let num_cells = x_axis.n_bins_with_flows() * y_axis.n_bins_with_flows();
        Self {
            name: name.into(),
            title: title.into(),
            x_axis,
            y_axis,
            contents: vec![Float::zero(); num_cells],
            entries: 0,
        }
    }

    /// Name which the histogram is looked up by
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Human-readable description
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Binning along x
    pub fn x_axis(&self) -> &Axis {
        &self.x_axis
    }

    /// Binning along y
    pub fn y_axis(&self) -> &Axis {
        &self.y_axis
    }

    /// Number of accumulated entries (flow bins included)
    pub fn entries(&self) -> u64 {
        self.entries
    }

    fn cell(&self, bin_x: usize, bin_y: usize) -> usize {
        bin_x + self.x_axis.n_bins_with_flows() * bin_y
    }

    /// Record one unit-weight (x, y) pair, returning the bins it landed in
    pub fn fill(&mut self, x: Float, y: Float) -> Option<(usize, usize)> {
        let bin_x = self.x_axis.find_bin(x)?;
        let bin_y = self.y_axis.find_bin(y)?;
        let cell = self.cell(bin_x, bin_y);
        self.contents[cell] += 1.;
        self.entries += 1;
        Some((bin_x, bin_y))
    }

    /// Content of a bin, following the flow bin numbering convention
    pub fn bin_content(&self, bin_x: usize, bin_y: usize) -> Float {
        if bin_x >= self.x_axis.n_bins_with_flows() || bin_y >= self.y_axis.n_bins_with_flows() {
            return Float::zero();
        }
        self.contents[self.cell(bin_x, bin_y)]
    }

    /// Content of the bin which (x, y) falls into
    pub fn content_at(&self, x: Float, y: Float) -> Float {
        match (self.x_axis.find_bin(x), self.y_axis.find_bin(y)) {
            (Some(bin_x), Some(bin_y)) => self.bin_content(bin_x, bin_y),
            _ => Float::zero(),
        }
    }

    /// Sum of bin contents where both coordinates are in range
    pub fn integral(&self) -> Float {
        let mut sum = Float::zero();
        for bin_y in 1..=self.y_axis.n_bins {
            for bin_x in 1..=self.x_axis.n_bins {
                sum += self.bin_content(bin_x, bin_y);
            }
        }
        sum
    }

    /// Add another histogram with the same binning to this one
    pub fn merge(&mut self, other: &Self) -> Result<()> {
        self.check_mergeable(other)?;
        self.add(other);
        Ok(())
    }

    fn check_mergeable(&self, other: &Self) -> Result<()> {
        ensure!(
            self.x_axis == other.x_axis && self.y_axis == other.y_axis,
            "Cannot merge {} histograms with different binnings",
            self.name
        );
        Ok(())
    }

    fn add(&mut self, other: &Self) {
        for (acc, &content) in self.contents.iter_mut().zip(&other.contents) {
            *acc += content;
        }
        self.entries += other.entries;
    }
}

/// Any histogram which a HistogramSet can hold
#[derive(Clone, Debug, PartialEq)]
pub enum Histogram {
    /// Binned in one variable
    OneD(Histogram1D),
    /// Binned in two variables
    TwoD(Histogram2D),
}
//
impl Histogram {
    /// Number of accumulated entries
    pub fn entries(&self) -> u64 {
        match self {
            Histogram::OneD(h) => h.entries(),
            Histogram::TwoD(h) => h.entries(),
        }
    }

    /// Human-readable description
    pub fn title(&self) -> &str {
        match self {
            Histogram::OneD(h) => h.title(),
            Histogram::TwoD(h) => h.title(),
        }
    }

    fn check_mergeable(&self, other: &Self) -> Result<()> {
        match (self, other) {
            (Histogram::OneD(h1), Histogram::OneD(h2)) => h1.check_mergeable(h2),
            (Histogram::TwoD(h1), Histogram::TwoD(h2)) => h1.check_mergeable(h2),
            (h1, _) => bail!(
                "Cannot merge histograms of different dimensions under key {}",
                h1.name()
            ),
        }
    }

    // Only meaningful after check_mergeable succeeded
    fn add(&mut self, other: &Self) {
        match (self, other) {
            (Histogram::OneD(h1), Histogram::OneD(h2)) => h1.add(h2),
            (Histogram::TwoD(h1), Histogram::TwoD(h2)) => h1.add(h2),
            _ => {}
        }
    }

    fn name(&self) -> &str {
        match self {
            Histogram::OneD(h) => h.name(),
            Histogram::TwoD(h) => h.name(),
        }
    }
}

/// Static declaration of a histogram: key, title and binning
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HistogramSpec {
    /// Name which the histogram is looked up by
    pub key: &'static str,

    /// Human-readable description
    pub title: &'static str,

    /// Bin count, low and high edge along x
    pub x: (usize, Float, Float),

    /// Bin count, low and high edge along y, for 2D histograms
    pub y: Option<(usize, Float, Float)>,
}
//
impl HistogramSpec {
    /// Declare a 1D histogram
    pub const fn one_d(key: &'static str, title: &'static str, x: (usize, Float, Float)) -> Self {
        Self {
            key,
            title,
            x,
            y: None,
        }
    }

    /// Declare a 2D histogram
    pub const fn two_d(
        key: &'static str,
        title: &'static str,
        x: (usize, Float, Float),
        y: (usize, Float, Float),
    ) -> Self {
        Self {
            key,
            title,
            x,
            y: Some(y),
        }
    }

    /// Allocate an empty histogram following this declaration
    pub fn build(&self) -> Result<Histogram> {
        let (nx, x_low, x_high) = self.x;
        let x_axis = Axis::new(nx, x_low, x_high)?;
        Ok(match self.y {
            None => Histogram::OneD(Histogram1D::new(self.key, self.title, x_axis)),
            Some((ny, y_low, y_high)) => Histogram::TwoD(Histogram2D::new(
                self.key,
                self.title,
                x_axis,
                Axis::new(ny, y_low, y_high)?,
            )),
        })
    }
}

/// Named collection of histograms, kept in declaration order
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HistogramSet {
    histograms: IndexMap<String, Histogram>,
}
//
impl HistogramSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a set holding one empty histogram per declaration
    pub fn from_specs(specs: &[HistogramSpec]) -> Result<Self> {
        let mut set = Self::new();
        for spec in specs {
            set.declare(spec)?;
        }
        Ok(set)
    }

    /// Allocate a new histogram. Keys must be unique within the set.
    pub fn declare(&mut self, spec: &HistogramSpec) -> Result<()> {
        ensure!(
            !self.histograms.contains_key(spec.key),
            "Histogram {} was declared twice",
            spec.key
        );
        self.histograms.insert(spec.key.to_owned(), spec.build()?);
        Ok(())
    }

    /// Fill a 1D histogram by key
    ///
    /// Filling an undeclared key, or a key which does not hold a 1D
    /// histogram, does nothing and returns false. A typo in a histogram name
    /// thus costs counts, not the whole batch job.
    ///
    pub fn fill_1d(&mut self, key: &str, x: Float) -> bool {
        match self.histograms.get_mut(key) {
            Some(Histogram::OneD(h)) => h.fill(x).is_some(),
            _ => {
                tracing::trace!(key, "dropped 1D fill");
                false
            }
        }
    }

    /// Fill a 2D histogram by key, with the same no-op policy as fill_1d
    pub fn fill_2d(&mut self, key: &str, x: Float, y: Float) -> bool {
        match self.histograms.get_mut(key) {
            Some(Histogram::TwoD(h)) => h.fill(x, y).is_some(),
            _ => {
                tracing::trace!(key, "dropped 2D fill");
                false
            }
        }
    }

    /// Look up any histogram
    pub fn get(&self, key: &str) -> Option<&Histogram> {
        self.histograms.get(key)
    }

    /// Look up a 1D histogram
    pub fn hist_1d(&self, key: &str) -> Option<&Histogram1D> {
        match self.histograms.get(key)? {
            Histogram::OneD(h) => Some(h),
            Histogram::TwoD(_) => None,
        }
    }

    /// Look up a 2D histogram
    pub fn hist_2d(&self, key: &str) -> Option<&Histogram2D> {
        match self.histograms.get(key)? {
            Histogram::TwoD(h) => Some(h),
            Histogram::OneD(_) => None,
        }
    }

    /// Truth that a histogram was declared under this key
    pub fn contains(&self, key: &str) -> bool {
        self.histograms.contains_key(key)
    }

    /// Histogram keys, in declaration order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.histograms.keys().map(String::as_str)
    }

    /// Histograms, in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Histogram)> {
        self.histograms.iter().map(|(k, h)| (k.as_str(), h))
    }

    /// Number of declared histograms
    pub fn len(&self) -> usize {
        self.histograms.len()
    }

    /// Truth that no histogram was declared
    pub fn is_empty(&self) -> bool {
        self.histograms.is_empty()
    }

    /// Integrate the histograms of another set with the same declarations
    ///
    /// Bin contents and entry counts are summed, so merging is commutative and
    /// associative. Both sets must hold the same keys with the same binnings,
    /// otherwise an error is returned and this set is left untouched.
    ///
    pub fn merge(&mut self, other: Self) -> Result<()> {
        ensure!(
            self.histograms.len() == other.histograms.len(),
            "Cannot merge histogram sets with {} and {} histograms",
            self.histograms.len(),
            other.histograms.len()
        );
        for (key, histogram) in &other.histograms {
            self.histograms
                .get(key)
                .ok_or_else(|| eyre!("Histogram {} is missing from the merge target", key))?
                .check_mergeable(histogram)?;
        }
        for (key, histogram) in other.histograms {
            if let Some(target) = self.histograms.get_mut(&key) {
                target.add(&histogram);
            }
        }
        Ok(())
    }
}
