use crate::error::AppError;
use crate::models::classify_types::{PredictionResult, UploadedImage};
use image::ImageReader;
use std::io::Cursor;

const BAR_WIDTH: usize = 30;

pub const NO_PREDICTIONS: &str = "No predictions available. Reset or open another image.";

/// `0.873` -> `"87.3%"`
pub fn format_percentage(confidence: f64) -> String {
    format!("{:.1}%", confidence * 100.0)
}

pub fn confidence_bar(confidence: f64, width: usize) -> String {
    let filled = ((confidence * width as f64).round() as usize).min(width);
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

/// One line per prediction: label, percentage and a proportional bar.
/// An empty list renders as an empty string.
pub fn render_results(results: &[PredictionResult]) -> String {
    let label_width = results.iter().map(|r| r.label.chars().count()).max().unwrap_or(0);

    results
        .iter()
        .map(|r| {
            format!(
                "  {:<label_width$}  {:>6}  {}\n",
                r.label,
                format_percentage(r.confidence),
                confidence_bar(r.confidence, BAR_WIDTH),
                label_width = label_width,
            )
        })
        .collect()
}

/// Reads just the image header. Failing here is the terminal equivalent of
/// an `<img>` that never fires its load event.
pub fn render_preview(image: &UploadedImage) -> Result<String, AppError> {
    let (width, height) = ImageReader::new(Cursor::new(&image.raw_bytes[..]))
        .with_guessed_format()?
        .into_dimensions()?;

    Ok(format!(
        "Preview: {} ({}, {}x{}, {:.1} KiB encoded)",
        image.file_name,
        image.media_type,
        width,
        height,
        image.displayable.len() as f64 / 1024.0
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::classify_types::ImageId;
    use std::sync::Arc;

    fn result(label: &str, confidence: f64) -> PredictionResult {
        PredictionResult {
            label: label.to_string(),
            confidence,
        }
    }

    #[test]
    fn percentage_has_one_decimal() {
        assert_eq!(format_percentage(0.873), "87.3%");
        assert_eq!(format_percentage(1.0), "100.0%");
        assert_eq!(format_percentage(0.0), "0.0%");
    }

    #[test]
    fn bar_is_proportional() {
        assert_eq!(confidence_bar(0.5, 10), "█████░░░░░");
        assert_eq!(confidence_bar(1.0, 4), "████");
        assert_eq!(confidence_bar(0.0, 4), "░░░░");
    }

    #[test]
    fn empty_results_render_nothing() {
        assert_eq!(render_results(&[]), "");
    }

    #[test]
    fn results_keep_order_and_align_labels() {
        let text = render_results(&[result("Jute Aphid", 0.873), result("Termite", 0.05)]);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("  Jute Aphid   87.3%  "));
        assert!(lines[1].starts_with("  Termite       5.0%  "));
    }

    #[test]
    fn preview_reports_dimensions() {
        let mut png = Vec::new();
        image::RgbImage::from_pixel(4, 3, image::Rgb([30, 160, 60]))
            .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();
        let uploaded = UploadedImage {
            id: ImageId(1),
            file_name: "leaf.png".to_string(),
            media_type: "image/png".to_string(),
            raw_bytes: Arc::from(png),
            displayable: "data:image/png;base64,AAAA".to_string(),
        };

        let preview = render_preview(&uploaded).unwrap();
        assert!(preview.starts_with("Preview: leaf.png (image/png, 4x3,"));
    }

    #[test]
    fn undecodable_preview_fails() {
        let uploaded = UploadedImage {
            id: ImageId(1),
            file_name: "leaf.png".to_string(),
            media_type: "image/png".to_string(),
            raw_bytes: Arc::from(&b"definitely not a png"[..]),
            displayable: String::new(),
        };
        assert!(render_preview(&uploaded).is_err());
    }
}
