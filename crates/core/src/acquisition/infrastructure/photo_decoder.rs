use std::path::Path;

use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageReader};

use crate::acquisition::domain::image_source::AcquisitionError;
use crate::acquisition::domain::rotation::Rotation;
use crate::shared::photo::Photo;

/// Decodes a photo file together with the rotation its EXIF orientation asks for.
///
/// Unreadable or missing orientation metadata yields [`Rotation::None`].
pub fn decode_file(path: &Path) -> Result<(Photo, Rotation), AcquisitionError> {
    let decode_err = |source| AcquisitionError::Decode {
        path: path.to_path_buf(),
        source,
    };

    let reader = ImageReader::open(path).map_err(|source| AcquisitionError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = reader
        .with_guessed_format()
        .map_err(|source| AcquisitionError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    let mut decoder = reader.into_decoder().map_err(decode_err)?;

    let orientation = decoder.orientation().unwrap_or_else(|e| {
        log::debug!("Ignoring unreadable orientation in {}: {e}", path.display());
        Orientation::NoTransforms
    });
    let image = DynamicImage::from_decoder(decoder).map_err(decode_err)?;

    Ok((Photo::from_dynamic(image), Rotation::from_orientation(orientation)))
}

/// Decodes in-memory file contents as stored, ignoring any orientation metadata.
pub fn decode_bytes(bytes: &[u8], origin: &Path) -> Result<Photo, AcquisitionError> {
    let image = image::load_from_memory(bytes).map_err(|source| AcquisitionError::Decode {
        path: origin.to_path_buf(),
        source,
    })?;
    Ok(Photo::from_dynamic(image))
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_decode_file_without_exif_has_no_rotation() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "plain.jpg", &split_jpeg());
        let (photo, rotation) = decode_file(&path).unwrap();
        assert_eq!((photo.width(), photo.height()), (32, 16));
        assert_eq!(rotation, Rotation::None);
    }

    #[rstest]
    #[case::rotate_90(6, Rotation::Clockwise90)]
    #[case::rotate_180(3, Rotation::Clockwise180)]
    #[case::rotate_270(8, Rotation::Clockwise270)]
    #[case::mirrored(2, Rotation::None)]
    fn test_decode_file_reads_orientation(#[case] tag: u16, #[case] expected: Rotation) {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "tagged.jpg", &with_orientation(&split_jpeg(), tag));
        let (photo, rotation) = decode_file(&path).unwrap();
        assert_eq!(rotation, expected);
        // Decoding alone never rotates.
        assert_eq!((photo.width(), photo.height()), (32, 16));
    }

    #[test]
    fn test_decode_file_missing_is_read_error() {
        let err = decode_file(Path::new("/nonexistent/photo.jpg")).unwrap_err();
        assert!(matches!(err, AcquisitionError::Read { .. }));
    }

    #[test]
    fn test_decode_file_garbage_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "junk.jpg", b"definitely not an image");
        let err = decode_file(&path).unwrap_err();
        assert!(matches!(err, AcquisitionError::Decode { .. }));
    }

    #[test]
    fn test_decode_bytes_keeps_stored_orientation() {
        let bytes = with_orientation(&split_jpeg(), 6);
        let photo = decode_bytes(&bytes, Path::new("memory.jpg")).unwrap();
        assert_eq!((photo.width(), photo.height()), (32, 16));
        let img = photo.to_rgb_image();
        assert!(is_reddish(img.get_pixel(4, 8)));
        assert!(is_bluish(img.get_pixel(28, 8)));
    }
}
