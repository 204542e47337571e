//! Anti-aliased title text.
//!
//! `FontRenderer` rasterises a title with FreeType into a BGRX buffer the
//! X11 backend uploads with `put_image`. When no font can be loaded the
//! backend falls back to the server's core font.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use freetype::face::LoadFlag;
use freetype::Library as FtLibrary;

const ELLIPSIS: &str = "...";

/// Font files tried, in order, for the "monospace" family
const MONOSPACE_CANDIDATES: &[&str] = &[
    "DejaVuSansMono",
    "LiberationMono",
    "UbuntuMono",
    "DroidSansMono",
    "FreeMono",
    "NotoSansMono",
];

/// A rendered title: BGRX pixels, row-major
pub struct TextImage {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

pub struct FontRenderer {
    _library: FtLibrary,
    face: freetype::Face,
    line_height: u32,
    ascender: i32,
}

impl FontRenderer {
    pub fn new(font_name: &str, font_size: u32) -> Result<Self> {
        let library = FtLibrary::init().context("Failed to initialize FreeType")?;
        let font_path = find_font(font_name)?;
        log::info!("Loading title font {:?}", font_path);

        let face = library
            .new_face(&font_path, 0)
            .context("Failed to load font face")?;
        // 1/64th points at 96 DPI
        face.set_char_size(0, (font_size as isize) * 64, 96, 96)
            .context("Failed to set font size")?;

        let metrics = face.size_metrics().context("Failed to get font metrics")?;
        Ok(Self {
            _library: library,
            face,
            line_height: (metrics.height >> 6) as u32,
            ascender: (metrics.ascender >> 6) as i32,
        })
    }

    pub fn line_height(&self) -> u32 {
        self.line_height
    }

    fn advance(&self, ch: char) -> u32 {
        if self.face.load_char(ch as usize, LoadFlag::DEFAULT).is_ok() {
            (self.face.glyph().advance().x >> 6).max(0) as u32
        } else {
            0
        }
    }

    /// Text width in pixels
    pub fn measure_text(&self, text: &str) -> u32 {
        text.chars().map(|ch| self.advance(ch)).sum()
    }

    /// Cut `text` to fit `max_width`, ending in "..." when shortened
    pub fn truncate_to_width(&self, text: &str, max_width: u32) -> String {
        if self.measure_text(text) <= max_width {
            return text.to_string();
        }
        let ellipsis_width = self.measure_text(ELLIPSIS);
        if ellipsis_width >= max_width {
            return String::new();
        }

        let budget = max_width - ellipsis_width;
        let mut used = 0;
        let mut kept: String = text
            .chars()
            .take_while(|&ch| {
                used += self.advance(ch);
                used <= budget
            })
            .collect();
        kept.push_str(ELLIPSIS);
        kept
    }

    /// Rasterise `text` in `fg` over `bg`. Returns `None` for empty text.
    pub fn render_text(&self, text: &str, fg: u32, bg: u32) -> Option<TextImage> {
        let width = self.measure_text(text);
        let height = self.line_height;
        if width == 0 || height == 0 {
            return None;
        }

        let mut pixels = solid_fill(bg, width, height);
        let mut pen_x: i32 = 0;
        for ch in text.chars() {
            if self.face.load_char(ch as usize, LoadFlag::RENDER).is_err() {
                continue;
            }
            let glyph = self.face.glyph();
            let bitmap = glyph.bitmap();
            let left = pen_x + glyph.bitmap_left();
            let top = self.ascender - glyph.bitmap_top();
            let buffer = bitmap.buffer();

            for row in 0..bitmap.rows() {
                for col in 0..bitmap.width() {
                    let (px, py) = (left + col, top + row);
                    if px < 0 || py < 0 || px >= width as i32 || py >= height as i32 {
                        continue;
                    }
                    let coverage = buffer[(row * bitmap.pitch() + col) as usize];
                    if coverage == 0 {
                        continue;
                    }
                    let offset = ((py as u32 * width + px as u32) * 4) as usize;
                    blend_pixel(&mut pixels[offset..offset + 3], fg, coverage);
                }
            }
            pen_x += (glyph.advance().x >> 6) as i32;
        }

        Some(TextImage {
            pixels,
            width,
            height,
        })
    }
}

/// BGRX buffer of one colour
fn solid_fill(color: u32, width: u32, height: u32) -> Vec<u8> {
    let [b, g, r] = bgr(color);
    (0..width * height).flat_map(|_| [b, g, r, 0xff]).collect()
}

fn bgr(color: u32) -> [u8; 3] {
    [
        (color & 0xff) as u8,
        ((color >> 8) & 0xff) as u8,
        ((color >> 16) & 0xff) as u8,
    ]
}

/// Mix `fg` into a BGR pixel by glyph coverage (0-255)
fn blend_pixel(pixel: &mut [u8], fg: u32, coverage: u8) {
    let alpha = coverage as u32;
    for (dst, src) in pixel.iter_mut().zip(bgr(fg)) {
        *dst = ((src as u32 * alpha + *dst as u32 * (255 - alpha)) / 255) as u8;
    }
}

/// Locate a TrueType/OpenType file for `font_name` in the usual font directories
fn find_font(font_name: &str) -> Result<PathBuf> {
    let mut search_dirs: Vec<PathBuf> = ["/usr/share/fonts", "/usr/local/share/fonts"]
        .iter()
        .map(PathBuf::from)
        .collect();
    if let Some(home) = dirs::home_dir() {
        search_dirs.insert(0, home.join(".local/share/fonts"));
    }
    search_dirs.retain(|dir| dir.exists());

    let patterns: Vec<String> = if font_name == "monospace" {
        MONOSPACE_CANDIDATES.iter().map(|s| s.to_string()).collect()
    } else {
        vec![font_name.replace(' ', ""), font_name.replace(' ', "-")]
    };

    for pattern in &patterns {
        let pattern = pattern.to_lowercase();
        for dir in &search_dirs {
            if let Some(path) = search_dir(dir, &|name: &str| name.contains(&pattern)) {
                return Ok(path);
            }
        }
    }
    for dir in &search_dirs {
        if let Some(path) = search_dir(dir, &|_: &str| true) {
            log::warn!("Font '{}' not found, using {:?}", font_name, path);
            return Ok(path);
        }
    }
    anyhow::bail!("no TTF/OTF font found for '{}'", font_name)
}

/// Depth-first search for a regular-weight font file whose lowercased name
/// satisfies `accept`
fn search_dir(dir: &Path, accept: &dyn Fn(&str) -> bool) -> Option<PathBuf> {
    let entries = std::fs::read_dir(dir).ok()?;
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            if let Some(found) = search_dir(&path, accept) {
                return Some(found);
            }
            continue;
        }
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_lowercase(),
            None => continue,
        };
        if is_regular_font_file(&name) && accept(&name) {
            return Some(path);
        }
    }
    None
}

fn is_regular_font_file(name: &str) -> bool {
    (name.ends_with(".ttf") || name.ends_with(".otf"))
        && !["bold", "italic", "oblique"].iter().any(|s| name.contains(s))
}
