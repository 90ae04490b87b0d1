//! Fitting-curve artifacts.
//!
//! Renders a two-series (train/test) line chart as a standalone SVG file
//! named by a fresh UUID under the output directory. The accuracy variant
//! pins the y-axis to `[0.4, 1.0]`; the loss variant autoscales.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::info;
use uuid::Uuid;

const WIDTH: f64 = 640.0;
const HEIGHT: f64 = 480.0;
const MARGIN_LEFT: f64 = 60.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_TOP: f64 = 40.0;
const MARGIN_BOTTOM: f64 = 50.0;

const TRAIN_COLOR: &str = "#1f77b4";
const TEST_COLOR: &str = "#ff7f0e";

/// A two-series epoch curve plot.
#[derive(Debug, Clone)]
pub struct CurvePlot {
    title: String,
    y_label: &'static str,
    y_range: Option<(f64, f64)>,
    out_dir: PathBuf,
}

impl CurvePlot {
    /// Accuracy plot for a data signature, y-axis pinned to `[0.4, 1.0]`.
    pub fn accuracy(signature: &str, out_dir: impl AsRef<Path>) -> Self {
        Self {
            title: format!("Accuracy plot for the data: ({signature})"),
            y_label: "Accuracy",
            y_range: Some((0.4, 1.0)),
            out_dir: out_dir.as_ref().to_path_buf(),
        }
    }

    /// Loss plot for a data signature, autoscaled y-axis.
    pub fn loss(signature: &str, out_dir: impl AsRef<Path>) -> Self {
        Self {
            title: format!("Loss function plot for the data: ({signature})"),
            y_label: "Loss",
            y_range: None,
            out_dir: out_dir.as_ref().to_path_buf(),
        }
    }

    /// Render the train/test series and write `<uuid>.svg` under the output
    /// directory (created if missing). Returns the artifact path.
    pub fn render(&self, train: &[f64], test: &[f64]) -> io::Result<PathBuf> {
        if train.is_empty() || test.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "cannot plot an empty series",
            ));
        }

        let (y_min, y_max) = match self.y_range {
            Some(range) => range,
            None => autoscale(train.iter().chain(test)),
        };
        let len = train.len().max(test.len());

        let mut svg = String::new();
        svg.push_str(&format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{WIDTH}\" height=\"{HEIGHT}\" \
             viewBox=\"0 0 {WIDTH} {HEIGHT}\">\n"
        ));
        svg.push_str("<rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n");
        svg.push_str(&format!(
            "<text x=\"{}\" y=\"24\" text-anchor=\"middle\" font-family=\"sans-serif\" \
             font-size=\"14\">{}</text>\n",
            WIDTH / 2.0,
            escape(&self.title)
        ));

        self.push_axes(&mut svg, y_min, y_max, len);
        push_series(&mut svg, train, len, y_min, y_max, TRAIN_COLOR);
        push_series(&mut svg, test, len, y_min, y_max, TEST_COLOR);
        push_legend(&mut svg);
        svg.push_str("</svg>\n");

        fs::create_dir_all(&self.out_dir)?;
        let path = self.out_dir.join(format!("{}.svg", Uuid::new_v4()));
        fs::write(&path, svg)?;
        info!(path = %path.display(), "plot written");
        Ok(path)
    }

    fn push_axes(&self, svg: &mut String, y_min: f64, y_max: f64, len: usize) {
        let x0 = MARGIN_LEFT;
        let x1 = WIDTH - MARGIN_RIGHT;
        let y0 = HEIGHT - MARGIN_BOTTOM;
        let y1 = MARGIN_TOP;
        svg.push_str(&format!(
            "<line x1=\"{x0}\" y1=\"{y0}\" x2=\"{x1}\" y2=\"{y0}\" stroke=\"#333\"/>\n\
             <line x1=\"{x0}\" y1=\"{y0}\" x2=\"{x0}\" y2=\"{y1}\" stroke=\"#333\"/>\n"
        ));

        // Five horizontal gridlines with value labels.
        for i in 0..=4 {
            let t = i as f64 / 4.0;
            let value = y_min + t * (y_max - y_min);
            let y = y0 - t * (y0 - y1);
            svg.push_str(&format!(
                "<line x1=\"{x0}\" y1=\"{y}\" x2=\"{x1}\" y2=\"{y}\" stroke=\"#ddd\"/>\n\
                 <text x=\"{}\" y=\"{}\" text-anchor=\"end\" font-family=\"sans-serif\" \
                 font-size=\"10\">{value:.3}</text>\n",
                x0 - 6.0,
                y + 3.0
            ));
        }

        svg.push_str(&format!(
            "<text x=\"{}\" y=\"{}\" text-anchor=\"middle\" font-family=\"sans-serif\" \
             font-size=\"12\">Epoch</text>\n",
            (x0 + x1) / 2.0,
            HEIGHT - 12.0
        ));
        svg.push_str(&format!(
            "<text x=\"16\" y=\"{}\" text-anchor=\"middle\" font-family=\"sans-serif\" \
             font-size=\"12\" transform=\"rotate(-90 16 {})\">{}</text>\n",
            (y0 + y1) / 2.0,
            (y0 + y1) / 2.0,
            self.y_label
        ));
        svg.push_str(&format!(
            "<text x=\"{x1}\" y=\"{}\" text-anchor=\"end\" font-family=\"sans-serif\" \
             font-size=\"10\">{}</text>\n",
            y0 + 16.0,
            len.saturating_sub(1)
        ));
    }
}

/// Min/max over all values with a small pad so flat series stay visible.
fn autoscale<'a>(values: impl Iterator<Item = &'a f64>) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for &v in values {
        if v.is_finite() {
            min = min.min(v);
            max = max.max(v);
        }
    }
    if !min.is_finite() || !max.is_finite() {
        return (0.0, 1.0);
    }
    let pad = ((max - min) * 0.05).max(1e-6);
    (min - pad, max + pad)
}

fn push_series(svg: &mut String, series: &[f64], len: usize, y_min: f64, y_max: f64, color: &str) {
    let x0 = MARGIN_LEFT;
    let x1 = WIDTH - MARGIN_RIGHT;
    let y0 = HEIGHT - MARGIN_BOTTOM;
    let y1 = MARGIN_TOP;
    let x_span = (len.saturating_sub(1)).max(1) as f64;
    let y_span = y_max - y_min;

    let points: Vec<String> = series
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            let x = x0 + (i as f64 / x_span) * (x1 - x0);
            let t = ((v - y_min) / y_span).clamp(0.0, 1.0);
            let y = y0 - t * (y0 - y1);
            format!("{x:.1},{y:.1}")
        })
        .collect();

    svg.push_str(&format!(
        "<polyline fill=\"none\" stroke=\"{color}\" stroke-width=\"1.5\" points=\"{}\"/>\n",
        points.join(" ")
    ));
}

fn push_legend(svg: &mut String) {
    let x = MARGIN_LEFT + 10.0;
    let y = MARGIN_TOP + 10.0;
    for (i, (label, color)) in [("Train", TRAIN_COLOR), ("Test", TEST_COLOR)]
        .into_iter()
        .enumerate()
    {
        let ly = y + i as f64 * 16.0;
        svg.push_str(&format!(
            "<line x1=\"{x}\" y1=\"{ly}\" x2=\"{}\" y2=\"{ly}\" stroke=\"{color}\" \
             stroke-width=\"2\"/>\n\
             <text x=\"{}\" y=\"{}\" font-family=\"sans-serif\" font-size=\"11\">{label}</text>\n",
            x + 20.0,
            x + 26.0,
            ly + 4.0
        ));
    }
}

/// Minimal XML text escaping for titles.
fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}
