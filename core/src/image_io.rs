//! Image I/O

use crate::film::*;
use image::{ImageBuffer, ImageFormat, Rgb};
use regex::Regex;
use std::fs;
use std::result::Result;
use std::sync::OnceLock;

/// Write the output image to given path. The format is chosen by extension.
///
/// * `path`   - Output file path.
/// * `pixels` - The image.
pub fn write_image(path: &str, pixels: &PixelBuffer) -> Result<(), String> {
    match get_extension_from_filename(path) {
        Some(".ppm") => write_ppm(path, pixels),
        Some(".png") => write_8_bit(path, pixels, ImageFormat::Png),
        Some(".tga") => write_8_bit(path, pixels, ImageFormat::Tga),
        Some(extension) => Err(format!("Extension {extension} is not supported")),
        None => Err(format!("Can't determine file type from suffix of filename {path}")),
    }
}

/// Returns regular expression for extracting the file extension. This will match the last occurrence of a period
/// followed by no periods or slashes.
fn regex_file_ext() -> &'static Regex {
    static DATA: OnceLock<Regex> = OnceLock::new();
    DATA.get_or_init(|| Regex::new(r"(\.[^./\\]+)$").expect("valid extension regex"))
}

/// Retrieve the extension from a file path.
///
/// * `path` - The file path.
fn get_extension_from_filename(path: &str) -> Option<&str> {
    regex_file_ext()
        .captures(path)
        .map(|c| c.get(1).map_or("", |m| m.as_str()))
}

/// Returns the image as a plain-text PPM (P3): a `P3 width height 255`
/// header followed by one line of `r g b` triplets per row.
///
/// * `pixels` - The image.
pub fn to_ppm_string(pixels: &PixelBuffer) -> String {
    let width = pixels.width();
    let height = pixels.height();

    let mut out = String::with_capacity(16 + pixels.as_bytes().len() * 4);
    out.push_str(&format!("P3 {width} {height} 255\n"));
    for y in 0..height {
        if let Some(row) = pixels.row(y) {
            let line: Vec<String> = row
                .chunks(CHANNELS)
                .map(|p| format!("{} {} {}", p[0], p[1], p[2]))
                .collect();
            out.push_str(&line.join(" "));
        }
        out.push('\n');
    }
    out
}

/// Writes the image in plain-text PPM format.
///
/// * `path`   - Output file path.
/// * `pixels` - The image.
fn write_ppm(path: &str, pixels: &PixelBuffer) -> Result<(), String> {
    info!(
        "Writing image {path} with resolution {}x{}",
        pixels.width(),
        pixels.height()
    );
    fs::write(path, to_ppm_string(pixels)).map_err(|e| format!("Error saving output image {path}: {e}"))
}

/// Writes the image in an 8-bit image format.
///
/// * `path`         - Output file path.
/// * `pixels`       - The image.
/// * `image_format` - Image format.
fn write_8_bit(path: &str, pixels: &PixelBuffer, image_format: ImageFormat) -> Result<(), String> {
    let res_x = pixels.width();
    let res_y = pixels.height();
    info!("Writing image {path} with resolution {res_x}x{res_y}");

    let imgbuf: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::from_raw(res_x, res_y, pixels.as_bytes().to_vec())
        .ok_or_else(|| format!("Error saving output image {path}: buffer size mismatch"))?;

    match imgbuf.save_with_format(path, image_format) {
        Ok(()) => Ok(()),
        Err(err) => Err(format!("Error saving output image {path}: {err}.")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::View;

    #[test]
    fn extension() {
        assert_eq!(get_extension_from_filename("out/image.ppm"), Some(".ppm"));
        assert_eq!(get_extension_from_filename("a.b/image.png"), Some(".png"));
        assert_eq!(get_extension_from_filename("image"), None);
    }

    #[test]
    fn ppm_layout() {
        let mut buf = PixelBuffer::new(View::new(2, 2));
        buf.set_pixel(0, 0, [255, 0, 0]);
        buf.set_pixel(1, 1, [1, 2, 3]);
        assert_eq!(
            to_ppm_string(&buf),
            "P3 2 2 255\n255 0 0 0 0 0\n0 0 0 1 2 3\n"
        );
    }

    #[test]
    fn unsupported_extension() {
        let buf = PixelBuffer::new(View::new(1, 1));
        assert!(write_image("image.exr", &buf).is_err());
        assert!(write_image("image", &buf).is_err());
    }

    #[test]
    fn write_ppm_file() {
        let mut buf = PixelBuffer::new(View::new(1, 1));
        buf.set_pixel(0, 0, [7, 8, 9]);
        let path = std::env::temp_dir().join(format!("rayfarm-{}.ppm", std::process::id()));
        let path = path.to_string_lossy().to_string();
        write_image(&path, &buf).expect("ppm written");
        let text = std::fs::read_to_string(&path).expect("ppm readable");
        assert_eq!(text, "P3 1 1 255\n7 8 9\n");
        let _ = std::fs::remove_file(&path);
    }
}
