//! SVG quality badge.

use crate::config::GradeTier;

/// Badge height in pixels.
const HEIGHT: u32 = 20;
/// Width of the grey "Quality" label.
const LABEL_WIDTH: u32 = 50;
/// Approximate glyph width used to size the value region.
const CHAR_WIDTH: u32 = 7;
/// Horizontal padding of the value region.
const VALUE_PADDING: u32 = 20;
const LABEL: &str = "Quality";

/// Hex fill for a badge color token; unknown tokens get the "red" fill.
pub fn badge_fill(token: &str) -> &'static str {
    match token {
        "brightgreen" => "#4c1",
        "green" => "#97CA00",
        "yellow" => "#dfb317",
        "orange" => "#fe7d37",
        _ => "#e05d44",
    }
}

/// Geometry and text of a two-tone badge.
#[derive(Debug, Clone, PartialEq)]
pub struct Badge {
    pub value: String,
    pub fill: &'static str,
    pub value_width: u32,
}

impl Badge {
    /// Badge showing a grade and its success rate.
    pub fn quality(grade: &GradeTier, success_rate_pct: f64) -> Self {
        let value = format!("{} ({}%)", grade.grade, success_rate_pct);
        let text_len = format!("{}-{}", LABEL, value).chars().count() as u32;

        Self {
            value,
            fill: badge_fill(&grade.badge_color),
            value_width: text_len * CHAR_WIDTH + VALUE_PADDING,
        }
    }

    /// Total badge width.
    pub fn width(&self) -> u32 {
        LABEL_WIDTH + self.value_width
    }

    /// Render as a standalone SVG document.
    pub fn to_svg(&self) -> String {
        let width = self.width();
        let label_x = LABEL_WIDTH as f64 / 2.0;
        let value_x = LABEL_WIDTH as f64 + self.value_width as f64 / 2.0;
        let value = escape_xml(&self.value);

        format!(
            r##"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{HEIGHT}">
  <linearGradient id="smooth" x2="0" y2="100%">
    <stop offset="0" stop-color="#bbb" stop-opacity=".1"/>
    <stop offset="1" stop-opacity=".1"/>
  </linearGradient>
  <clipPath id="round">
    <rect width="{width}" height="{HEIGHT}" rx="3" fill="#fff"/>
  </clipPath>
  <g clip-path="url(#round)">
    <rect width="{LABEL_WIDTH}" height="{HEIGHT}" fill="#555"/>
    <rect x="{LABEL_WIDTH}" width="{value_width}" height="{HEIGHT}" fill="{fill}"/>
    <rect width="{width}" height="{HEIGHT}" fill="url(#smooth)"/>
  </g>
  <g fill="#fff" text-anchor="middle" font-family="DejaVu Sans,Verdana,Geneva,sans-serif" font-size="11">
    <text x="{label_x}" y="15" fill="#010101" fill-opacity=".3">{LABEL}</text>
    <text x="{label_x}" y="14">{LABEL}</text>
    <text x="{value_x}" y="15" fill="#010101" fill-opacity=".3">{value}</text>
    <text x="{value_x}" y="14">{value}</text>
  </g>
</svg>"##,
            value_width = self.value_width,
            fill = self.fill,
        )
    }
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
