// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Quickfact Contributors

//! SVG chart rendering for the comparison report
//!
//! Hand-rendered SVG, no plotting dependency: an accuracy bar chart with the
//! value printed above each bar (y-axis fixed to the metric's [0, 1] range)
//! and one confusion-matrix heatmap per model.

use crate::metrics::ConfusionMatrix;
use anyhow::{Context, Result};
use std::path::Path;

/// One bar in the comparison chart.
#[derive(Debug, Clone)]
pub struct BarData {
    pub label: String,
    pub value: f64,
    pub color: String,
}

/// Bar colors cycled across models.
pub const BAR_PALETTE: &[&str] = &["#87ceeb", "#90ee90", "#fa8072", "#9b59b6", "#f1c40f"];

/// File-name slug for a model display name: lowercased, spaces to
/// underscores.
pub fn file_slug(name: &str) -> String {
    name.to_lowercase().replace(' ', "_")
}

fn xml_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Render an accuracy bar chart to `path`.
///
/// The y-axis is fixed to [0, 1] regardless of the data, so charts from
/// different runs are visually comparable.
pub fn render_bar_chart(title: &str, y_label: &str, bars: &[BarData], path: &Path) -> Result<()> {
    const MARGIN_LEFT: f64 = 70.0;
    const MARGIN_TOP: f64 = 60.0;
    const MARGIN_BOTTOM: f64 = 70.0;
    const PLOT_HEIGHT: f64 = 320.0;
    const SLOT_WIDTH: f64 = 130.0;
    const BAR_WIDTH: f64 = 80.0;

    let width = MARGIN_LEFT + SLOT_WIDTH * bars.len().max(1) as f64 + 30.0;
    let height = MARGIN_TOP + PLOT_HEIGHT + MARGIN_BOTTOM;
    let baseline = MARGIN_TOP + PLOT_HEIGHT;

    let mut svg = String::new();
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{:.0}\" height=\"{:.0}\" \
         viewBox=\"0 0 {:.0} {:.0}\">\n",
        width, height, width, height
    ));
    svg.push_str("<rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n");
    svg.push_str(&format!(
        "<text x=\"{:.0}\" y=\"30\" text-anchor=\"middle\" font-family=\"sans-serif\" \
         font-size=\"18\" font-weight=\"bold\">{}</text>\n",
        width / 2.0,
        xml_escape(title)
    ));

    // Gridlines and y-axis ticks at 0.0, 0.2, ... 1.0.
    for step in 0..=5 {
        let fraction = step as f64 / 5.0;
        let y = baseline - fraction * PLOT_HEIGHT;
        svg.push_str(&format!(
            "<line x1=\"{:.0}\" y1=\"{:.1}\" x2=\"{:.0}\" y2=\"{:.1}\" \
             stroke=\"#dddddd\" stroke-width=\"1\"/>\n",
            MARGIN_LEFT,
            y,
            width - 20.0,
            y
        ));
        svg.push_str(&format!(
            "<text x=\"{:.0}\" y=\"{:.1}\" text-anchor=\"end\" font-family=\"sans-serif\" \
             font-size=\"12\">{:.1}</text>\n",
            MARGIN_LEFT - 8.0,
            y + 4.0,
            fraction
        ));
    }

    // Axis lines.
    svg.push_str(&format!(
        "<line x1=\"{:.0}\" y1=\"{:.0}\" x2=\"{:.0}\" y2=\"{:.0}\" stroke=\"black\"/>\n",
        MARGIN_LEFT, MARGIN_TOP, MARGIN_LEFT, baseline
    ));
    svg.push_str(&format!(
        "<line x1=\"{:.0}\" y1=\"{:.0}\" x2=\"{:.0}\" y2=\"{:.0}\" stroke=\"black\"/>\n",
        MARGIN_LEFT,
        baseline,
        width - 20.0,
        baseline
    ));
    svg.push_str(&format!(
        "<text x=\"18\" y=\"{:.0}\" text-anchor=\"middle\" font-family=\"sans-serif\" \
         font-size=\"13\" transform=\"rotate(-90 18 {:.0})\">{}</text>\n",
        MARGIN_TOP + PLOT_HEIGHT / 2.0,
        MARGIN_TOP + PLOT_HEIGHT / 2.0,
        xml_escape(y_label)
    ));

    for (idx, bar) in bars.iter().enumerate() {
        let value = bar.value.clamp(0.0, 1.0);
        let x = MARGIN_LEFT + SLOT_WIDTH * idx as f64 + (SLOT_WIDTH - BAR_WIDTH) / 2.0;
        let bar_height = value * PLOT_HEIGHT;
        let y = baseline - bar_height;

        svg.push_str(&format!(
            "<rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.0}\" height=\"{:.1}\" fill=\"{}\"/>\n",
            x, y, BAR_WIDTH, bar_height, bar.color
        ));
        // Value label above the bar.
        svg.push_str(&format!(
            "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\" font-family=\"sans-serif\" \
             font-size=\"13\">{:.2}</text>\n",
            x + BAR_WIDTH / 2.0,
            y - 6.0,
            value
        ));
        svg.push_str(&format!(
            "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\" font-family=\"sans-serif\" \
             font-size=\"13\">{}</text>\n",
            x + BAR_WIDTH / 2.0,
            baseline + 22.0,
            xml_escape(&bar.label)
        ));
    }

    svg.push_str("</svg>\n");
    std::fs::write(path, svg).with_context(|| format!("failed to write chart: {}", path.display()))
}

/// Render a confusion-matrix heatmap to `path`.
///
/// Rows are true labels, columns predicted labels, both in the label
/// space's canonical order; cell shading scales with the count.
pub fn render_confusion_heatmap(
    title: &str,
    labels: &[String],
    matrix: &ConfusionMatrix,
    path: &Path,
) -> Result<()> {
    const CELL: f64 = 64.0;
    const MARGIN_LEFT: f64 = 130.0;
    const MARGIN_TOP: f64 = 60.0;
    const MARGIN_BOTTOM: f64 = 110.0;

    let k = matrix.n_classes;
    let grid = CELL * k as f64;
    let width = MARGIN_LEFT + grid + 30.0;
    let height = MARGIN_TOP + grid + MARGIN_BOTTOM;
    let max_count = matrix.counts.iter().copied().max().unwrap_or(0).max(1) as f64;

    let mut svg = String::new();
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{:.0}\" height=\"{:.0}\" \
         viewBox=\"0 0 {:.0} {:.0}\">\n",
        width, height, width, height
    ));
    svg.push_str("<rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n");
    svg.push_str(&format!(
        "<text x=\"{:.0}\" y=\"30\" text-anchor=\"middle\" font-family=\"sans-serif\" \
         font-size=\"17\" font-weight=\"bold\">{}</text>\n",
        width / 2.0,
        xml_escape(title)
    ));

    for row in 0..k {
        for col in 0..k {
            let count = matrix.get(row, col);
            let intensity = count as f64 / max_count;
            // White to steel blue.
            let r = (255.0 - intensity * (255.0 - 31.0)) as u8;
            let g = (255.0 - intensity * (255.0 - 119.0)) as u8;
            let b = (255.0 - intensity * (255.0 - 180.0)) as u8;
            let x = MARGIN_LEFT + CELL * col as f64;
            let y = MARGIN_TOP + CELL * row as f64;

            svg.push_str(&format!(
                "<rect x=\"{:.0}\" y=\"{:.0}\" width=\"{:.0}\" height=\"{:.0}\" \
                 fill=\"rgb({},{},{})\" stroke=\"#cccccc\"/>\n",
                x, y, CELL, CELL, r, g, b
            ));
            let text_color = if intensity > 0.55 { "white" } else { "black" };
            svg.push_str(&format!(
                "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\" font-family=\"sans-serif\" \
                 font-size=\"14\" fill=\"{}\">{}</text>\n",
                x + CELL / 2.0,
                y + CELL / 2.0 + 5.0,
                text_color,
                count
            ));
        }
    }

    for (idx, label) in labels.iter().enumerate() {
        let y = MARGIN_TOP + CELL * idx as f64 + CELL / 2.0 + 4.0;
        svg.push_str(&format!(
            "<text x=\"{:.0}\" y=\"{:.1}\" text-anchor=\"end\" font-family=\"sans-serif\" \
             font-size=\"12\">{}</text>\n",
            MARGIN_LEFT - 8.0,
            y,
            xml_escape(label)
        ));

        let x = MARGIN_LEFT + CELL * idx as f64 + CELL / 2.0;
        let label_y = MARGIN_TOP + grid + 16.0;
        svg.push_str(&format!(
            "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"end\" font-family=\"sans-serif\" \
             font-size=\"12\" transform=\"rotate(-40 {:.1} {:.1})\">{}</text>\n",
            x, label_y, x, label_y, xml_escape(label)
        ));
    }

    svg.push_str(&format!(
        "<text x=\"{:.0}\" y=\"{:.0}\" text-anchor=\"middle\" font-family=\"sans-serif\" \
         font-size=\"13\">Predicted label</text>\n",
        MARGIN_LEFT + grid / 2.0,
        height - 14.0
    ));
    svg.push_str(&format!(
        "<text x=\"18\" y=\"{:.0}\" text-anchor=\"middle\" font-family=\"sans-serif\" \
         font-size=\"13\" transform=\"rotate(-90 18 {:.0})\">True label</text>\n",
        MARGIN_TOP + grid / 2.0,
        MARGIN_TOP + grid / 2.0
    ));

    svg.push_str("</svg>\n");
    std::fs::write(path, svg)
        .with_context(|| format!("failed to write heatmap: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_bar_chart_contains_values_and_labels() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("comparison.svg");
        let bars = vec![
            BarData {
                label: "Naive Bayes".to_string(),
                value: 0.42,
                color: BAR_PALETTE[0].to_string(),
            },
            BarData {
                label: "Random Forest".to_string(),
                value: 0.58,
                color: BAR_PALETTE[1].to_string(),
            },
        ];

        render_bar_chart("Model Accuracy Comparison", "Accuracy", &bars, &path).unwrap();

        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("0.42"));
        assert!(svg.contains("0.58"));
        assert!(svg.contains("Naive Bayes"));
        assert!(svg.contains("Random Forest"));
    }

    #[test]
    fn test_heatmap_contains_labels_and_counts() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("confusion_test.svg");
        let mut matrix = ConfusionMatrix::new(2);
        matrix.add(0, 0);
        matrix.add(0, 1);
        matrix.add(1, 1);

        let labels = vec!["false".to_string(), "true".to_string()];
        render_confusion_heatmap("Confusion: Test", &labels, &matrix, &path).unwrap();

        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("false"));
        assert!(svg.contains("true"));
        assert!(svg.contains("Predicted label"));
    }

    #[test]
    fn test_unwritable_path_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("chart.svg");
        let result = render_bar_chart("t", "y", &[], &path);
        assert!(result.is_err());
    }
}
