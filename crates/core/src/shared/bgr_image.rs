use std::path::Path;

use crate::shared::constants::IMAGE_EXTENSIONS;

/// A decoded image as tightly packed BGR bytes, the layout the detector
/// takes as input.
#[derive(Clone, Debug, PartialEq)]
pub struct BgrImage {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl BgrImage {
    /// Decodes any format the `image` crate supports.
    pub fn open(path: &Path) -> Result<Self, image::ImageError> {
        let img = image::open(path)?.to_rgb8();
        let (width, height) = img.dimensions();
        let mut data = img.into_raw();
        for px in data.chunks_exact_mut(3) {
            px.swap(0, 2);
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }
}

/// True when `path` has one of the [`IMAGE_EXTENSIONS`], ignoring case.
pub fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn write_test_image(dir: &Path, width: u32, height: u32) -> PathBuf {
        let path = dir.join("test.png");
        let mut img = image::RgbImage::new(width, height);
        for pixel in img.pixels_mut() {
            *pixel = image::Rgb([50, 100, 200]);
        }
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn test_open_returns_bgr() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_test_image(dir.path(), 10, 8);
        let img = BgrImage::open(&path).unwrap();
        assert_eq!((img.width, img.height), (10, 8));
        assert_eq!(img.data.len(), 10 * 8 * 3);
        assert_eq!(&img.data[..3], &[200, 100, 50]);
    }

    #[test]
    fn test_open_nonexistent_fails() {
        assert!(BgrImage::open(Path::new("/nonexistent/test.png")).is_err());
    }

    #[test]
    fn test_is_image() {
        assert!(is_image(Path::new("hands.JPG")));
        assert!(is_image(Path::new("/tmp/a.png")));
        assert!(!is_image(Path::new("clip.mp4")));
        assert!(!is_image(Path::new("noext")));
    }
}
