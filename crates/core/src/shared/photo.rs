use image::{DynamicImage, RgbImage};
use ndarray::ArrayView3;

/// A decoded photograph: contiguous RGB bytes in row-major order.
///
/// Exactly one photo travels through the pipeline per request. Decoding
/// and encoding happen at the acquisition/output boundaries only.
#[derive(Clone, Debug, PartialEq)]
pub struct Photo {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl Photo {
    pub const CHANNELS: u8 = 3;

    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * Self::CHANNELS as usize,
            "data length must equal width * height * 3"
        );
        Self {
            data,
            width,
            height,
        }
    }

    pub fn from_rgb_image(image: RgbImage) -> Self {
        let (width, height) = image.dimensions();
        Self::new(image.into_raw(), width, height)
    }

    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self::from_rgb_image(image.into_rgb8())
    }

    pub fn to_rgb_image(&self) -> RgbImage {
        RgbImage::from_raw(self.width, self.height, self.data.clone())
            .expect("Photo data length must match dimensions")
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixel view shaped `(height, width, channels)`.
    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(
            (
                self.height as usize,
                self.width as usize,
                Self::CHANNELS as usize,
            ),
            &self.data,
        )
        .expect("Photo data length must match dimensions")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction_and_accessors() {
        let data = vec![0u8; 18]; // 3x2x3
        let photo = Photo::new(data.clone(), 3, 2);
        assert_eq!(photo.width(), 3);
        assert_eq!(photo.height(), 2);
        assert_eq!(photo.data(), &data[..]);
    }

    #[test]
    #[should_panic(expected = "data length must equal width * height * 3")]
    fn test_mismatched_data_length_panics_in_debug() {
        Photo::new(vec![0u8; 10], 2, 2);
    }

    #[test]
    fn test_rgb_image_conversion_keeps_pixels() {
        let mut img = RgbImage::new(4, 2);
        img.put_pixel(3, 1, image::Rgb([10, 20, 30]));
        let photo = Photo::from_rgb_image(img.clone());
        assert_eq!(photo.width(), 4);
        assert_eq!(photo.height(), 2);
        assert_eq!(photo.to_rgb_image(), img);
    }

    #[test]
    fn test_from_dynamic_drops_alpha() {
        let rgba = image::RgbaImage::from_pixel(2, 2, image::Rgba([1, 2, 3, 4]));
        let photo = Photo::from_dynamic(DynamicImage::ImageRgba8(rgba));
        assert_eq!(photo.data().len(), 12);
        assert_eq!(&photo.data()[..3], &[1, 2, 3]);
    }

    #[test]
    fn test_as_ndarray_pixel_access() {
        let mut data = vec![0u8; 12]; // 2x2
        data[6] = 255; // row=1, col=0, R
        let photo = Photo::new(data, 2, 2);
        let arr = photo.as_ndarray();
        assert_eq!(arr.shape(), &[2, 2, 3]);
        assert_eq!(arr[[1, 0, 0]], 255);
        assert_eq!(arr[[1, 0, 1]], 0);
    }
}
