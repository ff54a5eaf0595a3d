//! Per-key timing plots.
//!
//! The aggregator hands every reduced series to a [`Renderer`]. Plotting is
//! optional, so the default renderer does nothing; [`TerminalPlotRenderer`]
//! draws character line plots that are printed or written to files once all
//! keys have been rendered.

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::{debug, info};

/// Sink for reduced per-tick series.
pub trait Renderer {
    /// Render the series of one key.
    fn render(&mut self, key: &str, series: &[f64]) -> Result<()>;

    /// Flush everything rendered so far.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Renderer used when plotting is disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopRenderer;

impl Renderer for NoopRenderer {
    fn render(&mut self, _key: &str, _series: &[f64]) -> Result<()> {
        Ok(())
    }
}

/// Plot configuration.
#[derive(Debug, Clone)]
pub struct PlotConfig {
    /// Prefix for plot titles (the mod source path).
    pub title_prefix: String,
    /// Plot area width in characters.
    pub width: usize,
    /// Plot area height in characters.
    pub height: usize,
    /// Sort a copy of the series from slowest to fastest tick before plotting.
    pub sort_descending: bool,
    /// Fixed top of the y axis in ms; scaled to the series maximum if unset.
    pub y_max: Option<f64>,
    /// Write `<key>.txt` files here instead of printing.
    pub output_dir: Option<PathBuf>,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            title_prefix: String::new(),
            width: 100,
            height: 20,
            sort_descending: false,
            y_max: None,
            output_dir: None,
        }
    }
}

/// Width of the y axis label column.
const LABEL_WIDTH: usize = 10;

/// Draws character line plots, x = tick index and y = duration.
#[derive(Debug)]
pub struct TerminalPlotRenderer {
    config: PlotConfig,
    plots: Vec<(String, String)>,
}

impl TerminalPlotRenderer {
    pub fn new(config: PlotConfig) -> Self {
        Self {
            config,
            plots: Vec::new(),
        }
    }

    /// Plots rendered but not yet flushed, as `(key, plot)` pairs.
    pub fn plots(&self) -> &[(String, String)] {
        &self.plots
    }

    fn title(&self, key: &str) -> String {
        format!("\"{}\" - {}", self.config.title_prefix, key)
    }
}

impl Renderer for TerminalPlotRenderer {
    fn render(&mut self, key: &str, series: &[f64]) -> Result<()> {
        let mut values = series.to_vec();
        if self.config.sort_descending {
            values.sort_by(|a, b| b.total_cmp(a));
        }

        let mut plot = self.title(key);
        plot.push('\n');
        plot.push_str(&plot_series(
            &values,
            self.config.width,
            self.config.height,
            self.config.y_max,
        ));

        debug!("Rendered plot for {} ({} ticks)", key, series.len());
        self.plots.push((key.to_string(), plot));
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        let plots = std::mem::take(&mut self.plots);

        match self.config.output_dir {
            Some(ref dir) => {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create plot directory: {}", dir.display()))?;

                for (key, plot) in plots {
                    let path = dir.join(format!("{}.txt", key.replace(['/', '\\'], "_")));
                    std::fs::write(&path, plot)
                        .with_context(|| format!("Failed to write plot: {}", path.display()))?;
                    info!("Wrote plot: {}", path.display());
                }
            }
            None => {
                for (_, plot) in plots {
                    println!("\n{}", plot);
                }
            }
        }

        Ok(())
    }
}

/// Downsample `values` into `columns` buckets, keeping each bucket's maximum.
fn bucket_max(values: &[f64], columns: usize) -> Vec<f64> {
    let len = values.len();
    (0..columns)
        .map(|c| {
            let start = c * len / columns;
            let end = ((c + 1) * len / columns).max(start + 1);
            values[start..end]
                .iter()
                .copied()
                .fold(f64::NEG_INFINITY, f64::max)
        })
        .collect()
}

/// Draw a line plot of `values` with a labelled y axis.
pub fn plot_series(values: &[f64], width: usize, height: usize, y_max: Option<f64>) -> String {
    let width = width.max(2);
    let height = height.max(2);

    if values.is_empty() {
        return format!("{:>w$} (no data)\n", "", w = LABEL_WIDTH);
    }

    let columns = width.min(values.len());
    let points = bucket_max(values, columns);

    let top = y_max
        .or_else(|| points.iter().copied().reduce(f64::max))
        .filter(|t| *t > 0.0)
        .unwrap_or(1.0);

    let levels: Vec<usize> = points
        .iter()
        .map(|v| {
            let scaled = (v.max(0.0) / top * (height - 1) as f64).round();
            (scaled as usize).min(height - 1)
        })
        .collect();

    let mut grid = vec![vec![' '; columns]; height];
    let mut prev: Option<usize> = None;
    for (x, &level) in levels.iter().enumerate() {
        if let Some(p) = prev {
            for row in grid.iter_mut().take(p.max(level)).skip(p.min(level) + 1) {
                row[x] = '|';
            }
        }
        grid[level][x] = '*';
        prev = Some(level);
    }

    let mut output = String::new();
    for level in (0..height).rev() {
        let label = if level == height - 1 {
            format!("{:>9.3}", top)
        } else if level == (height - 1) / 2 {
            format!("{:>9.3}", top * level as f64 / (height - 1) as f64)
        } else if level == 0 {
            format!("{:>9.3}", 0.0)
        } else {
            String::new()
        };
        let row: String = grid[level].iter().collect();
        output.push_str(&format!("{:>9} ┤{}\n", label, row.trim_end()));
    }

    output.push_str(&format!(
        "{:>w$}└{}\n",
        "",
        "─".repeat(columns),
        w = LABEL_WIDTH
    ));
    let last = values.len().saturating_sub(1).to_string();
    output.push_str(&format!(
        "{:>w$}0{:>pad$}\n",
        "",
        last,
        w = LABEL_WIDTH + 1,
        pad = columns.saturating_sub(1)
    ));

    output
}
