use anyhow::Result;
use bytes::Bytes;
use image::{imageops::FilterType, DynamicImage, ImageFormat};
use std::io::Cursor;

/// Images wider than this are scaled down to it.
const RESIZE_WIDTH: u32 = 2000;

/// Quality and resize decision keyed on source pixel width: wider sources
/// compress harder.
pub fn plan_for_width(width: u32) -> (u8, Option<u32>) {
    if width > 2000 {
        (70, Some(RESIZE_WIDTH))
    } else if width > 1000 {
        (75, None)
    } else {
        (80, None)
    }
}

/// Re-encode an image per the width-keyed policy. Decode and encode are
/// CPU-bound, so the work runs off the async pool.
pub(super) async fn compress(data: Bytes) -> Result<Bytes> {
    tokio::task::spawn_blocking(move || compress_sync(&data)).await?
}

fn compress_sync(data: &[u8]) -> Result<Bytes> {
    let format = image::guess_format(data)?;

    // Re-encoding an animated GIF would flatten it to a single frame
    if format == ImageFormat::Gif {
        return Ok(Bytes::copy_from_slice(data));
    }

    let img = image::load_from_memory_with_format(data, format)?;
    let (quality, target_width) = plan_for_width(img.width());

    let img = match target_width {
        Some(width) => {
            let height = ((img.height() as u64 * width as u64) / img.width() as u64).max(1) as u32;
            img.resize_exact(width, height, FilterType::Lanczos3)
        }
        None => img,
    };

    let mut buf = Cursor::new(Vec::new());
    match format {
        ImageFormat::Png => {
            // PNG has no scalar quality knob; best compression with adaptive
            // filtering is the closest re-encode
            let encoder = image::codecs::png::PngEncoder::new_with_quality(
                &mut buf,
                image::codecs::png::CompressionType::Best,
                image::codecs::png::FilterType::Adaptive,
            );
            img.write_with_encoder(encoder)?;
        }
        // JPEG stays JPEG; any other recognized format re-encodes as JPEG
        _ => {
            let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, quality);
            DynamicImage::ImageRgb8(img.to_rgb8()).write_with_encoder(encoder)?;
        }
    }

    Ok(Bytes::from(buf.into_inner()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn jpeg_of_width(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(
            width,
            height,
            image::Rgb([120, 80, 40]),
        ));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Jpeg).unwrap();
        buf.into_inner()
    }

    #[test]
    fn plan_thresholds() {
        assert_eq!(plan_for_width(800), (80, None));
        assert_eq!(plan_for_width(1000), (80, None));
        assert_eq!(plan_for_width(1001), (75, None));
        assert_eq!(plan_for_width(2000), (75, None));
        assert_eq!(plan_for_width(2001), (70, Some(2000)));
        assert_eq!(plan_for_width(4000), (70, Some(2000)));
    }

    #[test]
    fn small_image_keeps_dimensions() {
        let data = jpeg_of_width(500, 300);
        let out = compress_sync(&data).unwrap();
        let img = image::load_from_memory(&out).unwrap();
        assert_eq!((img.width(), img.height()), (500, 300));
    }

    #[test]
    fn mid_size_image_keeps_dimensions() {
        let data = jpeg_of_width(1500, 900);
        let out = compress_sync(&data).unwrap();
        let img = image::load_from_memory(&out).unwrap();
        assert_eq!((img.width(), img.height()), (1500, 900));
    }

    #[test]
    fn wide_image_is_resized_to_2000() {
        let data = jpeg_of_width(3000, 1200);
        let out = compress_sync(&data).unwrap();
        let img = image::load_from_memory(&out).unwrap();
        assert_eq!(img.width(), 2000);
        assert_eq!(img.height(), 800);
    }

    #[test]
    fn png_stays_png() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(40, 40, image::Rgb([0, 0, 255])));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();

        let out = compress_sync(&buf.into_inner()).unwrap();
        assert_eq!(image::guess_format(&out).unwrap(), ImageFormat::Png);
    }

    #[test]
    fn garbage_bytes_error_out() {
        assert!(compress_sync(b"definitely not an image").is_err());
    }
}
