//! PNG rendering
//!
//! Rasterizes the composed SVG with resvg onto a fresh pixmap per call.
//! Label fonts ship with the crate, so output does not depend on the host.

use std::sync::{Arc, OnceLock};

use resvg::usvg::fontdb::Database;
use resvg::{tiny_skia, usvg};
use rust_decimal::Decimal;

use super::svg::draw_svg;
use super::{ChartRenderer, ChartStyle, prepare_series};
use crate::error::{AdvisorError, Result};

const DEJAVU_SANS: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");
const DEJAVU_SANS_BOLD: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans-Bold.ttf");

/// Bundled label fonts, loaded once and only ever read afterwards
fn font_database() -> Result<Arc<Database>> {
    static FONTS: OnceLock<Arc<Database>> = OnceLock::new();

    let fonts = FONTS.get_or_init(|| {
        let mut db = Database::new();
        db.load_font_data(DEJAVU_SANS.to_vec());
        db.load_font_data(DEJAVU_SANS_BOLD.to_vec());
        db.set_sans_serif_family("DejaVu Sans");
        tracing::debug!(faces = db.len(), "Loaded chart fonts");
        Arc::new(db)
    });

    if fonts.is_empty() {
        return Err(AdvisorError::Render("no usable fonts for chart labels".into()));
    }
    Ok(fonts.clone())
}

/// Renders comparison charts as PNG images
pub struct PngChartRenderer {
    style: ChartStyle,
}

impl PngChartRenderer {
    pub const fn new(style: ChartStyle) -> Self {
        Self { style }
    }

    /// Rasterize an SVG document to PNG bytes
    fn rasterize(&self, svg: &str) -> Result<Vec<u8>> {
        let options = usvg::Options {
            fontdb: font_database()?,
            font_family: self.style.font_family.clone(),
            ..usvg::Options::default()
        };

        let tree = usvg::Tree::from_str(svg, &options)
            .map_err(|e| AdvisorError::Render(format!("invalid chart document: {e}")))?;

        let size = tree.size().to_int_size();
        let mut pixmap = tiny_skia::Pixmap::new(size.width(), size.height()).ok_or_else(|| {
            AdvisorError::Render(format!(
                "cannot allocate {}x{} canvas",
                size.width(),
                size.height()
            ))
        })?;

        resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

        pixmap
            .encode_png()
            .map_err(|e| AdvisorError::Render(format!("PNG encoding failed: {e}")))
    }
}

impl ChartRenderer for PngChartRenderer {
    fn render(&self, labels: &[String], values: &[Decimal], highlight: usize) -> Result<Vec<u8>> {
        let points = prepare_series(labels, values, highlight)?;
        let (svg, frame) = draw_svg(labels, &points, highlight, &self.style)?;
        let png = self.rasterize(&svg)?;

        tracing::debug!(
            bars = labels.len(),
            bytes = png.len(),
            plot_width = frame.right - frame.left,
            plot_height = frame.bottom - frame.top,
            baseline = frame.baseline,
            "Rendered comparison chart"
        );
        Ok(png)
    }

    fn content_type(&self) -> &'static str {
        "image/png"
    }

    fn extension(&self) -> &'static str {
        "png"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::svg::Frame;
    use rust_decimal_macros::dec;

    struct Decoded {
        width: u32,
        height: u32,
        rgba: Vec<u8>,
    }

    impl Decoded {
        fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
            let i = ((y * self.width + x) * 4) as usize;
            [self.rgba[i], self.rgba[i + 1], self.rgba[i + 2], self.rgba[i + 3]]
        }
    }

    fn decode(bytes: &[u8]) -> Decoded {
        let decoder = png::Decoder::new(std::io::Cursor::new(bytes));
        let mut reader = decoder.read_info().unwrap();
        let mut rgba = vec![0; reader.output_buffer_size()];
        let info = reader.next_frame(&mut rgba).unwrap();
        assert_eq!(info.color_type, png::ColorType::Rgba);
        rgba.truncate(info.buffer_size());
        Decoded {
            width: info.width,
            height: info.height,
            rgba,
        }
    }

    /// Count distinct colored runs along one pixel row of the plot area
    fn count_bars(image: &Decoded, frame: &Frame, background: [u8; 3]) -> usize {
        let row = (frame.baseline - 4) as u32;
        let mut bars = 0;
        let mut inside = false;
        for x in (frame.left + 3) as u32..(frame.right - 3) as u32 {
            let [r, g, b, _] = image.pixel(x, row);
            let distance = u32::from(r.abs_diff(background[0]))
                + u32::from(g.abs_diff(background[1]))
                + u32::from(b.abs_diff(background[2]));
            let is_bar = distance > 60;
            if is_bar && !inside {
                bars += 1;
            }
            inside = is_bar;
        }
        bars
    }

    /// Pixels drawn in (nearly) pure white: label text only
    fn text_pixels(image: &Decoded) -> usize {
        image
            .rgba
            .chunks_exact(4)
            .filter(|px| px[0] > 230 && px[1] > 230 && px[2] > 230)
            .count()
    }

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_png_has_one_bar_per_entry() {
        let style = ChartStyle::default();
        let renderer = PngChartRenderer::new(style.clone());
        let values = [dec!(1.37), dec!(0.82), dec!(1.64), dec!(2.45)];

        let bytes = renderer
            .render(&labels(&["Status Quo", "A", "B", "C"]), &values, 3)
            .unwrap();

        assert!(!bytes.is_empty());
        let image = decode(&bytes);
        assert_eq!((image.width, image.height), (style.width, style.height));

        let names = labels(&["Status Quo", "A", "B", "C"]);
        let (_, frame) = draw_svg(&names, &[1.37, 0.82, 1.64, 2.45], 3, &style).unwrap();
        assert_eq!(count_bars(&image, &frame, [0x13, 0x17, 0x22]), 4);
    }

    #[test]
    fn test_background_fills_canvas() {
        let renderer = PngChartRenderer::new(ChartStyle::default());
        let bytes = renderer
            .render(&labels(&["Status Quo", "A"]), &[dec!(1), dec!(2)], 1)
            .unwrap();

        let image = decode(&bytes);
        assert_eq!(image.pixel(2, 2), [0x13, 0x17, 0x22, 255]);
    }

    #[test]
    fn test_renders_are_independent() {
        let renderer = PngChartRenderer::new(ChartStyle::default());
        let names = labels(&["Status Quo", "A", "B"]);
        let values = [dec!(0.5), dec!(1.5), dec!(1.0)];

        let first = renderer.render(&names, &values, 1).unwrap();
        let _other = renderer
            .render(&labels(&["Status Quo", "X"]), &[dec!(9), dec!(3)], 0)
            .unwrap();
        let again = renderer.render(&names, &values, 1).unwrap();

        assert_eq!(first, again);
    }

    #[test]
    fn test_invalid_series_is_rejected() {
        let renderer = PngChartRenderer::new(ChartStyle::default());
        let err = renderer
            .render(&labels(&["Status Quo", "A"]), &[dec!(1)], 0)
            .unwrap_err();
        assert!(err.is_input_error());
    }

    #[test]
    fn test_labels_are_drawn() {
        let names = labels(&["Status Quo", "A", "B", "C"]);
        let values = [dec!(1.37), dec!(0.82), dec!(1.64), dec!(2.45)];

        let highlighted = PngChartRenderer::new(ChartStyle::default())
            .render(&names, &values, 3)
            .unwrap();
        let flat_style = ChartStyle {
            highlight_label_size: ChartStyle::default().label_size,
            ..ChartStyle::default()
        };
        let flat = PngChartRenderer::new(flat_style)
            .render(&names, &values, 3)
            .unwrap();

        let with_emphasis = text_pixels(&decode(&highlighted));
        let without = text_pixels(&decode(&flat));
        assert!(without > 0, "no label text was rasterized");
        assert!(with_emphasis > without);
    }

    #[test]
    fn test_fonts_are_bundled() {
        let fonts = font_database().unwrap();
        assert!(
            fonts
                .faces()
                .any(|face| face.families.iter().any(|(name, _)| name == "DejaVu Sans"))
        );
    }

    #[test]
    fn test_awkward_labels_still_render() {
        let renderer = PngChartRenderer::new(ChartStyle::default());
        let bytes = renderer
            .render(&labels(&["Status Quo", "Bonds & <Bills>"]), &[dec!(1), dec!(2)], 1)
            .unwrap();
        assert!(bytes.starts_with(&[0x89, b'P', b'N', b'G']));
    }
}
