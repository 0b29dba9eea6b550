use image::imageops;
use image::metadata::Orientation;

use crate::shared::photo::Photo;

/// Clockwise rotation that brings a captured photo upright.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Rotation {
    #[default]
    None,
    Clockwise90,
    Clockwise180,
    Clockwise270,
}

impl Rotation {
    /// Maps an EXIF orientation to a pure rotation.
    ///
    /// Mirrored orientations are left alone: only the three rotate tags
    /// (6, 3 and 8) trigger a correction.
    pub fn from_orientation(orientation: Orientation) -> Self {
        match orientation {
            Orientation::Rotate90 => Rotation::Clockwise90,
            Orientation::Rotate180 => Rotation::Clockwise180,
            Orientation::Rotate270 => Rotation::Clockwise270,
            _ => Rotation::None,
        }
    }

    pub fn degrees(self) -> u32 {
        match self {
            Rotation::None => 0,
            Rotation::Clockwise90 => 90,
            Rotation::Clockwise180 => 180,
            Rotation::Clockwise270 => 270,
        }
    }

    pub fn apply(self, photo: Photo) -> Photo {
        if self == Rotation::None {
            return photo;
        }
        let image = photo.to_rgb_image();
        let rotated = match self {
            Rotation::Clockwise90 => imageops::rotate90(&image),
            Rotation::Clockwise180 => imageops::rotate180(&image),
            Rotation::Clockwise270 => imageops::rotate270(&image),
            Rotation::None => image,
        };
        Photo::from_rgb_image(rotated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    /// 3x2 photo whose pixels are numbered 1..=6 in row-major order:
    ///
    /// ```text
    /// 1 2 3
    /// 4 5 6
    /// ```
    fn numbered() -> Photo {
        let data = (1..=6u8).flat_map(|v| [v, v, v]).collect();
        Photo::new(data, 3, 2)
    }

    fn red_channel(photo: &Photo) -> Vec<u8> {
        photo.data().iter().step_by(3).copied().collect()
    }

    #[rstest]
    #[case::top_left(1, Rotation::None)]
    #[case::rotate_90(6, Rotation::Clockwise90)]
    #[case::rotate_180(3, Rotation::Clockwise180)]
    #[case::rotate_270(8, Rotation::Clockwise270)]
    #[case::flip_horizontal(2, Rotation::None)]
    #[case::flip_vertical(4, Rotation::None)]
    #[case::transpose(5, Rotation::None)]
    #[case::transverse(7, Rotation::None)]
    fn test_from_exif_tag(#[case] tag: u8, #[case] expected: Rotation) {
        let orientation = Orientation::from_exif(tag).unwrap();
        assert_eq!(Rotation::from_orientation(orientation), expected);
    }

    #[test]
    fn test_default_is_none() {
        assert_eq!(Rotation::default(), Rotation::None);
        assert_eq!(Rotation::None.degrees(), 0);
    }

    #[test]
    fn test_none_returns_input_unchanged() {
        assert_eq!(Rotation::None.apply(numbered()), numbered());
    }

    #[test]
    fn test_rotate_90_clockwise() {
        // 4 1
        // 5 2
        // 6 3
        let rotated = Rotation::Clockwise90.apply(numbered());
        assert_eq!((rotated.width(), rotated.height()), (2, 3));
        assert_eq!(red_channel(&rotated), vec![4, 1, 5, 2, 6, 3]);
    }

    #[test]
    fn test_rotate_180() {
        let rotated = Rotation::Clockwise180.apply(numbered());
        assert_eq!((rotated.width(), rotated.height()), (3, 2));
        assert_eq!(red_channel(&rotated), vec![6, 5, 4, 3, 2, 1]);
    }

    #[test]
    fn test_rotate_270_clockwise() {
        // 3 6
        // 2 5
        // 1 4
        let rotated = Rotation::Clockwise270.apply(numbered());
        assert_eq!((rotated.width(), rotated.height()), (2, 3));
        assert_eq!(red_channel(&rotated), vec![3, 6, 2, 5, 1, 4]);
    }

    #[test]
    fn test_four_quarter_turns_restore_photo() {
        let once = Rotation::Clockwise90.apply(numbered());
        let back = Rotation::Clockwise270.apply(once);
        assert_eq!(back, numbered());
    }
}
