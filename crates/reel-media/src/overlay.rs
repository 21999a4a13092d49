//! Drawtext overlay construction.
//!
//! Builds the FFmpeg drawtext filter chain for one segment: escaping,
//! orientation-aware font sizing, and safe-zone multi-line wrapping. All
//! layout constants live in [`OverlayConfig`] so deployments can pin them.

use crate::probe::VideoInfo;

/// Overlay layout configuration.
///
/// The safe zone is a reference rectangle (212x420 px with 8 px padding on a
/// 1080x1920 frame) scaled to the actual frame size.
#[derive(Debug, Clone)]
pub struct OverlayConfig {
    /// Shorter-axis divisor for the font size
    pub font_size_divisor: u32,
    /// Minimum font size
    pub min_font_size: u32,
    /// Maximum font size
    pub max_font_size: u32,
    /// Reference frame the safe-zone constants are expressed against
    pub reference_frame: (u32, u32),
    /// Safe-zone rectangle on the reference frame
    pub safe_zone: (u32, u32),
    /// Safe-zone padding on the reference frame
    pub padding: (u32, u32),
    /// Estimated glyph width as a fraction of the font size
    pub char_width_factor: f64,
    /// Line height as a multiple of the font size
    pub line_height_factor: f64,
    /// Text color
    pub font_color: String,
    /// Background box color (with alpha)
    pub box_color: String,
    /// Text border color
    pub border_color: String,
    /// Text border width
    pub border_width: u32,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            font_size_divisor: 15,
            min_font_size: 20,
            max_font_size: 72,
            reference_frame: (1080, 1920),
            safe_zone: (212, 420),
            padding: (8, 8),
            char_width_factor: 0.6,
            line_height_factor: 1.2,
            font_color: "white".to_string(),
            box_color: "black@0.6".to_string(),
            border_color: "black".to_string(),
            border_width: 2,
        }
    }
}

impl OverlayConfig {
    /// Configuration for resource-constrained deployments (smaller text).
    pub fn constrained() -> Self {
        Self {
            font_size_divisor: 20,
            ..Default::default()
        }
    }

    /// Compute the font size for a frame: the dimension axis follows the
    /// orientation (vertical frames size by width, horizontal by height),
    /// divided by the divisor and clamped.
    pub fn font_size_for(&self, info: &VideoInfo) -> u32 {
        let axis = if info.is_vertical() {
            info.width
        } else {
            info.height
        };
        (axis / self.font_size_divisor).clamp(self.min_font_size, self.max_font_size)
    }

    fn scaled_safe_zone(&self, info: &VideoInfo) -> (u32, u32, u32, u32) {
        let (ref_w, ref_h) = self.reference_frame;
        let (zone_w, zone_h) = self.safe_zone;
        let (pad_x, pad_y) = self.padding;
        (
            info.width * zone_w / ref_w,
            info.height * zone_h / ref_h,
            info.width * pad_x / ref_w,
            info.height * pad_y / ref_h,
        )
    }
}

/// Escape text for the FFmpeg drawtext filter.
///
/// Backslash must go first so the escapes it introduces survive.
pub fn escape_drawtext(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace(':', "\\:")
        .replace('%', "\\%")
}

/// Split overlay text into display lines for the safe zone.
///
/// Explicit newlines split first, then each line greedy-wraps at the
/// estimated characters-per-line. Overflowing lines are dropped and the
/// last kept line gets an ellipsis.
pub fn wrap_overlay_lines(
    config: &OverlayConfig,
    text: &str,
    font_size: u32,
    info: &VideoInfo,
) -> Vec<String> {
    let (zone_w, zone_h, _, _) = config.scaled_safe_zone(info);

    let est_char_width = f64::from(font_size) * config.char_width_factor;
    let max_chars = ((f64::from(zone_w) / est_char_width) as usize).max(8);

    let mut lines = Vec::new();
    for raw_line in text.split('\n') {
        wrap_greedy(raw_line, max_chars, &mut lines);
    }
    lines.retain(|line| !line.trim().is_empty());

    let line_height = (f64::from(font_size) * config.line_height_factor) as u32;
    let max_lines = (zone_h / line_height.max(1)).max(1) as usize;

    if lines.len() > max_lines {
        lines.truncate(max_lines);
        if let Some(last) = lines.last_mut() {
            let kept: String = last.chars().take(max_chars.saturating_sub(3)).collect();
            *last = format!("{}...", kept);
        }
    }

    lines
}

fn wrap_greedy(line: &str, max_chars: usize, out: &mut Vec<String>) {
    let mut current = String::new();
    for word in line.split_whitespace() {
        let word_len = word.chars().count();
        if word_len > max_chars {
            // A single word longer than the line gets hard-broken.
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
            let chars: Vec<char> = word.chars().collect();
            for chunk in chars.chunks(max_chars) {
                out.push(chunk.iter().collect());
            }
            continue;
        }
        let current_len = current.chars().count();
        if current.is_empty() {
            current.push_str(word);
        } else if current_len + 1 + word_len <= max_chars {
            current.push(' ');
            current.push_str(word);
        } else {
            out.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
}

/// Build the complete drawtext filter chain for one overlay.
///
/// One drawtext directive per display line, stacked vertically in the
/// top-left safe zone over a semi-transparent background box.
pub fn build_drawtext_filter(config: &OverlayConfig, text: &str, info: &VideoInfo) -> String {
    let font_size = config.font_size_for(info);
    let lines = wrap_overlay_lines(config, text, font_size, info);

    if lines.is_empty() {
        return "drawtext=text='':fontsize=1:x=0:y=0".to_string();
    }

    let (_, _, pad_x, pad_y) = config.scaled_safe_zone(info);
    let line_height = (f64::from(font_size) * config.line_height_factor) as u32;

    let filters: Vec<String> = lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let y = pad_y + i as u32 * line_height;
            format!(
                "drawtext=text='{}':fontsize={}:fontcolor={}:borderw={}:bordercolor={}:\
                 box=1:boxcolor={}:boxborderw=0:x={}:y={}",
                escape_drawtext(line),
                font_size,
                config.font_color,
                config.border_width,
                config.border_color,
                config.box_color,
                pad_x,
                y
            )
        })
        .collect();

    filters.join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(width: u32, height: u32) -> VideoInfo {
        VideoInfo {
            duration: 60.0,
            width,
            height,
            fps: 30.0,
            codec: "h264".into(),
        }
    }

    #[test]
    fn escape_handles_special_characters() {
        assert_eq!(escape_drawtext("it's 50% off: now"), "it\\'s 50\\% off\\: now");
        assert_eq!(escape_drawtext("a\\b"), "a\\\\b");
        assert_eq!(escape_drawtext("plain"), "plain");
    }

    #[test]
    fn font_size_follows_orientation() {
        let config = OverlayConfig::default();
        // Vertical 1080x1920: width axis, 1080/15 = 72.
        assert_eq!(config.font_size_for(&info(1080, 1920)), 72);
        // Horizontal 1920x1080: height axis, 1080/15 = 72.
        assert_eq!(config.font_size_for(&info(1920, 1080)), 72);
        // Small frame clamps to the minimum.
        assert_eq!(config.font_size_for(&info(640, 240)), 20);
    }

    #[test]
    fn constrained_uses_smaller_divisor() {
        let config = OverlayConfig::constrained();
        assert_eq!(config.font_size_divisor, 20);
        assert_eq!(config.font_size_for(&info(1920, 1080)), 54);
    }

    #[test]
    fn short_text_is_a_single_line() {
        let config = OverlayConfig::default();
        let frame = info(1080, 1920);
        let font_size = config.font_size_for(&frame);
        let lines = wrap_overlay_lines(&config, "Hello", font_size, &frame);
        assert_eq!(lines, vec!["Hello".to_string()]);
    }

    #[test]
    fn explicit_newlines_split_first() {
        let config = OverlayConfig::default();
        let frame = info(1080, 1920);
        let lines = wrap_overlay_lines(&config, "Line one\nLine two", 30, &frame);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "Line one");
    }

    #[test]
    fn long_text_wraps_and_truncates_with_ellipsis() {
        let config = OverlayConfig::default();
        let frame = info(1080, 1920);
        let font_size = config.font_size_for(&frame); // 72
        let long = "word ".repeat(60);
        let lines = wrap_overlay_lines(&config, &long, font_size, &frame);

        // Safe zone: 212px wide, 420px tall; 72px font gives very few
        // characters and lines, so truncation must kick in.
        let line_height = (72.0 * 1.2) as u32;
        let max_lines = (420 / line_height).max(1) as usize;
        assert_eq!(lines.len(), max_lines);
        assert!(lines.last().unwrap().ends_with("..."));
    }

    #[test]
    fn filter_contains_one_directive_per_line() {
        let config = OverlayConfig::default();
        let frame = info(1080, 1920);
        let filter = build_drawtext_filter(&config, "One\nTwo", &frame);
        assert_eq!(filter.matches("drawtext=").count(), 2);
        assert!(filter.contains("box=1"));
        assert!(filter.contains("boxcolor=black@0.6"));
        assert!(filter.contains("fontcolor=white"));
    }

    #[test]
    fn filter_escapes_text() {
        let config = OverlayConfig::default();
        let frame = info(1920, 1080);
        let filter = build_drawtext_filter(&config, "it's here", &frame);
        assert!(filter.contains("it\\'s"));
    }

    #[test]
    fn empty_text_yields_empty_directive() {
        let config = OverlayConfig::default();
        let frame = info(1920, 1080);
        let filter = build_drawtext_filter(&config, "   ", &frame);
        assert!(filter.starts_with("drawtext=text=''"));
    }

    #[test]
    fn lines_stack_at_line_height() {
        let config = OverlayConfig::default();
        let frame = info(1080, 1920);
        let filter = build_drawtext_filter(&config, "One\nTwo", &frame);
        let font_size = config.font_size_for(&frame);
        let line_height = (f64::from(font_size) * 1.2) as u32;
        let pad_y = frame.height * 8 / 1920;
        assert!(filter.contains(&format!("y={}", pad_y)));
        assert!(filter.contains(&format!("y={}", pad_y + line_height)));
    }
}
