use image::RgbImage;

/// One raw frame record read from the container.
///
/// `data` is always exactly one stride long; short reads never produce a `Frame`.
pub struct Frame {
    /// Position of the record in the container (0-based).
    pub index: u64,
    pub data: Vec<u8>,
}

/// A frame after colour conversion, ready to be written.
pub struct DecodedImage {
    /// Index of the source frame.
    pub index: u64,
    pub image: RgbImage,
}
