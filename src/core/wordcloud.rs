use crate::domain::model::{RenderOptions, WordFrequency};
use quick_xml::escape::escape;
use std::f32::consts::TAU;

const PALETTE: &[&str] = &[
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

/// Average glyph advance as a fraction of the font size.
const CHAR_WIDTH: f32 = 0.6;
const PADDING: f32 = 2.0;
const SHRINK: f32 = 0.85;
/// Radial distance gained per spiral turn.
const SPIRAL_GAP: f32 = 8.0;
/// Largest distance between two spiral samples, in pixels.
const MAX_SPIRAL_STEP: f32 = 4.0;
/// Bound on the shrink-and-retry loop for a single word.
const MAX_ATTEMPTS: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    fn centered(cx: f32, cy: f32, w: f32, h: f32) -> Self {
        Self {
            x: cx - w / 2.0,
            y: cy - h / 2.0,
            w,
            h,
        }
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.x + other.w
            && other.x < self.x + self.w
            && self.y < other.y + other.h
            && other.y < self.y + self.h
    }

    fn padded(&self, by: f32) -> Rect {
        Rect {
            x: self.x - by,
            y: self.y - by,
            w: self.w + 2.0 * by,
            h: self.h + 2.0 * by,
        }
    }

    fn inside(&self, width: f32, height: f32) -> bool {
        self.x >= 0.0 && self.y >= 0.0 && self.x + self.w <= width && self.y + self.h <= height
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.w / 2.0, self.y + self.h / 2.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedWord {
    pub word: String,
    pub frequency: u64,
    pub font_size: f32,
    pub bbox: Rect,
    pub vertical: bool,
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WordCloud {
    pub width: u32,
    pub height: u32,
    pub background: String,
    pub words: Vec<PlacedWord>,
}

fn text_extent(word: &str, font_size: f32) -> (f32, f32) {
    (word.chars().count() as f32 * font_size * CHAR_WIDTH, font_size)
}

fn is_free(candidate: &Rect, width: f32, height: f32, placed: &[PlacedWord]) -> bool {
    candidate.inside(width, height)
        && !placed
            .iter()
            .any(|p| p.bbox.padded(PADDING).intersects(candidate))
}

/// Walks an Archimedean spiral out from the canvas centre and returns the
/// first free spot, trying horizontal before vertical at each step.
/// Samples are spaced by arc length so the outer turns are searched as
/// densely as the inner ones.
fn find_spot(word: &str, font_size: f32, options: &RenderOptions, placed: &[PlacedWord]) -> Option<(Rect, bool)> {
    let width = options.width as f32;
    let height = options.height as f32;
    let (cx, cy) = (width / 2.0, height / 2.0);
    let aspect = width / height;
    let max_radius = (cx / aspect).hypot(cy);
    let (text_w, text_h) = text_extent(word, font_size);
    let step = (font_size / 2.0).clamp(1.0, MAX_SPIRAL_STEP);

    let mut t = 0.0f32;
    loop {
        let radius = SPIRAL_GAP * t / TAU;
        if radius > max_radius {
            return None;
        }
        let x = cx + radius * t.cos() * aspect;
        let y = cy + radius * t.sin();

        for vertical in [false, true] {
            let (w, h) = if vertical { (text_h, text_w) } else { (text_w, text_h) };
            let candidate = Rect::centered(x, y, w, h);
            if is_free(&candidate, width, height, placed) {
                return Some((candidate, vertical));
            }
        }

        t += step / (radius * aspect.max(1.0)).max(1.0);
    }
}

/// Exhaustive search: a free box can always be slid left and then up until it
/// touches the canvas edge or a placed word, so only those edges need to be
/// tried as its top-left corner. `None` means the word does not fit anywhere.
fn scan_spot(word: &str, font_size: f32, options: &RenderOptions, placed: &[PlacedWord]) -> Option<(Rect, bool)> {
    let width = options.width as f32;
    let height = options.height as f32;
    let (text_w, text_h) = text_extent(word, font_size);

    let blocked: Vec<Rect> = placed.iter().map(|p| p.bbox.padded(PADDING)).collect();
    let mut xs: Vec<f32> = std::iter::once(0.0).chain(blocked.iter().map(|r| r.x + r.w)).collect();
    let mut ys: Vec<f32> = std::iter::once(0.0).chain(blocked.iter().map(|r| r.y + r.h)).collect();
    xs.sort_by(f32::total_cmp);
    ys.sort_by(f32::total_cmp);

    for vertical in [false, true] {
        let (w, h) = if vertical { (text_h, text_w) } else { (text_w, text_h) };
        for &y in &ys {
            for &x in &xs {
                let candidate = Rect { x, y, w, h };
                if is_free(&candidate, width, height, placed) {
                    return Some((candidate, vertical));
                }
            }
        }
    }
    None
}

/// Places words largest first. Font size grows with the square root of the
/// word's share of the top frequency. A word with no room left is shrunk down
/// to `min_font` and dropped only when it fits nowhere at that size; where it
/// does fit, the spiral position nearest the centre is preferred.
pub fn layout(frequencies: &[WordFrequency], options: &RenderOptions) -> WordCloud {
    let mut cloud = WordCloud {
        width: options.width,
        height: options.height,
        background: options.background.clone(),
        words: Vec::new(),
    };

    let max_frequency = frequencies.iter().map(|f| f.frequency).max().unwrap_or(0);
    if max_frequency == 0 {
        return cloud;
    }

    for (rank, entry) in frequencies.iter().take(options.max_words).enumerate() {
        let ratio = entry.frequency as f32 / max_frequency as f32;
        let mut font_size = options.min_font + (options.max_font - options.min_font) * ratio.sqrt();

        let mut spot = None;
        for _ in 0..MAX_ATTEMPTS {
            if let Some(fallback) = scan_spot(&entry.word, font_size, options, &cloud.words) {
                spot = find_spot(&entry.word, font_size, options, &cloud.words).or(Some(fallback));
                break;
            }
            if font_size <= options.min_font || font_size.is_nan() {
                break;
            }
            font_size = (font_size * SHRINK).max(options.min_font);
        }

        match spot {
            Some((bbox, vertical)) => cloud.words.push(PlacedWord {
                word: entry.word.clone(),
                frequency: entry.frequency,
                font_size,
                bbox,
                vertical,
                color: PALETTE[rank % PALETTE.len()],
            }),
            None => tracing::debug!("No room left for '{}'", entry.word),
        }
    }

    tracing::debug!(
        "Placed {} of {} words",
        cloud.words.len(),
        frequencies.len().min(options.max_words)
    );
    cloud
}

impl WordCloud {
    pub fn to_svg(&self) -> String {
        let mut svg = format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">\n",
            w = self.width,
            h = self.height
        );
        svg.push_str(&format!(
            "  <rect width=\"100%\" height=\"100%\" fill=\"{}\"/>\n",
            escape(self.background.as_str())
        ));

        for placed in &self.words {
            let (x, y) = placed.bbox.center();
            let rotation = if placed.vertical {
                format!(" transform=\"rotate(-90 {:.1} {:.1})\"", x, y)
            } else {
                String::new()
            };
            svg.push_str(&format!(
                "  <text x=\"{:.1}\" y=\"{:.1}\" font-size=\"{:.1}\" font-family=\"sans-serif\" fill=\"{}\" text-anchor=\"middle\" dominant-baseline=\"central\"{}>{}</text>\n",
                x,
                y,
                placed.font_size,
                placed.color,
                rotation,
                escape(placed.word.as_str())
            ));
        }

        svg.push_str("</svg>\n");
        svg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn freqs(entries: &[(&str, u64)]) -> Vec<WordFrequency> {
        entries
            .iter()
            .map(|(word, frequency)| WordFrequency {
                word: word.to_string(),
                frequency: *frequency,
            })
            .collect()
    }

    fn sample() -> Vec<WordFrequency> {
        freqs(&[
            ("god", 120),
            ("krishna", 90),
            ("vedas", 75),
            ("dharma", 60),
            ("karma", 44),
            ("yoga", 30),
            ("shiva", 25),
            ("temple", 12),
            ("mantra", 9),
            ("puja", 3),
        ])
    }

    #[test]
    fn test_layout_has_no_overlap_and_stays_on_canvas() {
        let options = RenderOptions::default();
        let cloud = layout(&sample(), &options);

        assert!(!cloud.words.is_empty());
        for (i, a) in cloud.words.iter().enumerate() {
            assert!(a.bbox.inside(options.width as f32, options.height as f32), "{} off canvas", a.word);
            for b in &cloud.words[i + 1..] {
                assert!(!a.bbox.intersects(&b.bbox), "{} overlaps {}", a.word, b.word);
            }
        }
    }

    #[test]
    fn test_most_frequent_word_is_largest_and_centered() {
        let options = RenderOptions::default();
        let cloud = layout(&sample(), &options);

        let first = &cloud.words[0];
        assert_eq!(first.word, "god");
        assert_eq!(first.font_size, options.max_font);
        let (x, y) = first.bbox.center();
        assert!((x - 400.0).abs() < 0.01 && (y - 200.0).abs() < 0.01);
        assert!(cloud.words.iter().all(|w| w.font_size <= first.font_size));
    }

    #[test]
    fn test_layout_is_deterministic() {
        let options = RenderOptions::default();
        assert_eq!(layout(&sample(), &options), layout(&sample(), &options));
    }

    #[test]
    fn test_max_words_limits_placement() {
        let options = RenderOptions {
            max_words: 3,
            ..RenderOptions::default()
        };
        assert!(layout(&sample(), &options).words.len() <= 3);
    }

    #[test]
    fn test_tiny_canvas_drops_words_that_never_fit() {
        let options = RenderOptions {
            width: 100,
            height: 40,
            ..RenderOptions::default()
        };
        let cloud = layout(&freqs(&[("incomprehensibilities", 10)]), &options);
        assert!(cloud.words.is_empty());
    }

    #[test]
    fn test_dropped_words_have_no_room_left() {
        let options = RenderOptions {
            width: 300,
            height: 150,
            min_font: 8.0,
            max_font: 48.0,
            ..RenderOptions::default()
        };
        let words: Vec<(String, u64)> = (1..=60).map(|rank| (format!("word{rank}"), 600 / rank)).collect();
        let entries: Vec<(&str, u64)> = words.iter().map(|(w, f)| (w.as_str(), *f)).collect();
        let cloud = layout(&freqs(&entries), &options);

        assert!(!cloud.words.is_empty());
        let (width, height) = (options.width as f32, options.height as f32);
        for (word, _) in &words {
            if cloud.words.iter().any(|p| &p.word == word) {
                continue;
            }
            let (text_w, text_h) = text_extent(word, options.min_font);
            for (w, h) in [(text_w, text_h), (text_h, text_w)] {
                for y in (0..options.height).step_by(2) {
                    for x in (0..options.width).step_by(2) {
                        let candidate = Rect { x: x as f32, y: y as f32, w, h };
                        assert!(
                            !is_free(&candidate, width, height, &cloud.words),
                            "'{word}' was dropped but fits at ({x}, {y})"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_outer_ring_is_used_once_centre_is_full() {
        let options = RenderOptions {
            width: 400,
            height: 200,
            min_font: 10.0,
            max_font: 60.0,
            ..RenderOptions::default()
        };
        // The long word is shrunk until it spans the canvas width, leaving only top and bottom bands.
        let cloud = layout(&freqs(&[("bhagavadgitaa", 100), ("om", 1)]), &options);

        assert_eq!(cloud.words.len(), 2);
        let om = &cloud.words[1];
        assert!(!om.bbox.intersects(&cloud.words[0].bbox.padded(PADDING)));
        assert!(om.bbox.inside(400.0, 200.0));
    }

    #[test]
    fn test_nan_font_size_terminates() {
        let options = RenderOptions {
            min_font: f32::NAN,
            ..RenderOptions::default()
        };
        let cloud = layout(&sample(), &options);
        assert!(cloud.words.is_empty());
    }

    #[test]
    fn test_svg_escapes_words() {
        let cloud = layout(&freqs(&[("q&a", 5), ("<tag>", 2)]), &RenderOptions::default());
        let svg = cloud.to_svg();

        assert!(svg.starts_with("<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"800\" height=\"400\""));
        assert!(svg.contains(">q&amp;a</text>"));
        assert!(svg.contains(">&lt;tag&gt;</text>"));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn test_empty_cloud_has_only_background() {
        let svg = layout(&[], &RenderOptions::default()).to_svg();
        assert!(svg.contains("fill=\"white\""));
        assert!(!svg.contains("<text"));
    }
}
