use super::{ChartSpec, ChartWriter};
use crate::error::Error;
use resvg::usvg;
use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

const WIDTH: f64 = 1200.0;
const HEIGHT: f64 = 700.0;
const MARGIN_LEFT: f64 = 90.0;
const MARGIN_RIGHT: f64 = 30.0;
const MARGIN_TOP: f64 = 60.0;
const MARGIN_BOTTOM: f64 = 230.0;
const Y_TICKS: usize = 5;
const MAX_LABEL_CHARS: usize = 40;
const BAR_FILL: &str = "#1f77b4";

/// Draws bar charts as SVG and rasterises them to PNG with resvg.
pub struct PngChartWriter {
    fontdb: Arc<usvg::fontdb::Database>,
}

impl Default for PngChartWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl PngChartWriter {
    /// Loads system fonts once; labels are simply not drawn if none are found.
    pub fn new() -> Self {
        let mut fontdb = usvg::fontdb::Database::new();
        fontdb.load_system_fonts();
        Self {
            fontdb: Arc::new(fontdb),
        }
    }
}

impl ChartWriter for PngChartWriter {
    fn write_chart(
        &self,
        spec: &ChartSpec,
        bars: &[(String, usize)],
        path: &Path,
    ) -> Result<(), Error> {
        let svg = bar_chart_svg(spec, bars);

        let mut options = usvg::Options::default();
        options.fontdb = Arc::clone(&self.fontdb);

        let tree = usvg::Tree::from_str(&svg, &options).map_err(|e| Error::Render(e.to_string()))?;

        let size = tree.size().to_int_size();
        let mut pixmap = tiny_skia::Pixmap::new(size.width(), size.height())
            .ok_or_else(|| Error::Render("Failed to allocate chart pixmap".into()))?;
        pixmap.fill(tiny_skia::Color::WHITE);

        resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

        pixmap
            .save_png(path)
            .map_err(|e| Error::Render(format!("{}: {}", path.display(), e)))
    }
}

/// SVG document for a vertical bar chart with rotated category labels.
pub(crate) fn bar_chart_svg(spec: &ChartSpec, bars: &[(String, usize)]) -> String {
    let plot_w = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_h = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
    let plot_bottom = MARGIN_TOP + plot_h;

    let max_count = bars.iter().map(|(_, c)| *c).max().unwrap_or(0);
    let y_max = nice_ceiling(max_count);
    let band = plot_w / bars.len().max(1) as f64;
    let bar_w = band * 0.8;

    let mut svg = String::new();
    // Writing to a String cannot fail.
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="DejaVu Sans, Arial, sans-serif">"#,
        w = WIDTH,
        h = HEIGHT
    );
    let _ = write!(
        svg,
        r#"<rect x="0" y="0" width="{}" height="{}" fill="white"/>"#,
        WIDTH, HEIGHT
    );
    let _ = write!(
        svg,
        r#"<text x="{}" y="{}" font-size="20" text-anchor="middle">{}</text>"#,
        WIDTH / 2.0,
        MARGIN_TOP / 2.0 + 8.0,
        escape_xml(&spec.title)
    );

    for tick in 0..=Y_TICKS {
        let value = y_max as f64 * tick as f64 / Y_TICKS as f64;
        let y = plot_bottom - plot_h * tick as f64 / Y_TICKS as f64;
        let _ = write!(
            svg,
            r##"<line x1="{x1}" y1="{y}" x2="{x2}" y2="{y}" stroke="#dddddd" stroke-width="1"/><text x="{tx}" y="{ty}" font-size="12" text-anchor="end">{label}</text>"##,
            x1 = MARGIN_LEFT,
            x2 = MARGIN_LEFT + plot_w,
            y = y,
            tx = MARGIN_LEFT - 8.0,
            ty = y + 4.0,
            label = format_tick(value)
        );
    }

    for (i, (label, count)) in bars.iter().enumerate() {
        let center = MARGIN_LEFT + band * (i as f64 + 0.5);
        let bar_h = if y_max == 0 {
            0.0
        } else {
            plot_h * *count as f64 / y_max as f64
        };
        let _ = write!(
            svg,
            r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="{}"/>"#,
            center - bar_w / 2.0,
            plot_bottom - bar_h,
            bar_w,
            bar_h,
            BAR_FILL
        );
        let label_y = plot_bottom + 14.0;
        let _ = write!(
            svg,
            r#"<text x="{x:.2}" y="{y:.2}" font-size="11" text-anchor="end" transform="rotate(-45 {x:.2} {y:.2})">{text}</text>"#,
            x = center,
            y = label_y,
            text = escape_xml(&truncate_label(label))
        );
    }

    let _ = write!(
        svg,
        r#"<line x1="{l}" y1="{b}" x2="{r}" y2="{b}" stroke="black"/><line x1="{l}" y1="{t}" x2="{l}" y2="{b}" stroke="black"/>"#,
        l = MARGIN_LEFT,
        r = MARGIN_LEFT + plot_w,
        t = MARGIN_TOP,
        b = plot_bottom
    );
    let _ = write!(
        svg,
        r#"<text x="{}" y="{}" font-size="14" text-anchor="middle">{}</text>"#,
        MARGIN_LEFT + plot_w / 2.0,
        HEIGHT - 16.0,
        escape_xml(&spec.x_label)
    );
    let _ = write!(
        svg,
        r#"<text x="22" y="{y}" font-size="14" text-anchor="middle" transform="rotate(-90 22 {y})">Count</text>"#,
        y = MARGIN_TOP + plot_h / 2.0
    );
    svg.push_str("</svg>");
    svg
}

/// Smallest 1/2/5 × 10^k at or above `max`, so ticks land on round numbers.
fn nice_ceiling(max: usize) -> usize {
    if max == 0 {
        return Y_TICKS;
    }
    let mut magnitude = 1usize;
    loop {
        for step in [1, 2, 5] {
            let candidate = step * magnitude * Y_TICKS;
            if candidate >= max {
                return candidate;
            }
        }
        magnitude = match magnitude.checked_mul(10) {
            Some(m) => m,
            None => return max,
        };
    }
}

fn format_tick(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as u64)
    } else {
        format!("{:.1}", value)
    }
}

fn truncate_label(label: &str) -> String {
    if label.chars().count() <= MAX_LABEL_CHARS {
        label.to_string()
    } else {
        let mut truncated: String = label.chars().take(MAX_LABEL_CHARS - 1).collect();
        truncated.push('…');
        truncated
    }
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            c if c.is_control() => {}
            c => escaped.push(c),
        }
    }
    escaped
}
