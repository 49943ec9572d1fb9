use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, ImageBuffer, Luma};
use ndarray::{s, Array2, Array3, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{FaceError, Result};

/// A numeric pixel sample type the descriptor can read.
pub trait Sample: Copy + Default + Send + Sync + 'static {
    /// Short name of the sample type, used in error messages
    const FORMAT: &'static str;

    fn to_f64(self) -> f64;

    /// Wraps a pixel array into the matching [`PixelData`] variant.
    fn wrap(pixels: Array3<Self>) -> PixelData;
}

macro_rules! impl_sample {
    ($ty:ty, $variant:ident, $name:expr) => {
        impl Sample for $ty {
            const FORMAT: &'static str = $name;

            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }

            fn wrap(pixels: Array3<Self>) -> PixelData {
                PixelData::$variant(pixels)
            }
        }
    };
}

impl_sample!(u8, U8, "u8");
impl_sample!(i8, I8, "i8");
impl_sample!(u16, U16, "u16");
impl_sample!(i16, I16, "i16");
impl_sample!(i32, I32, "i32");
impl_sample!(f32, F32, "f32");
impl_sample!(f64, F64, "f64");

/// Pixel storage tagged with its sample type.
///
/// Arrays are laid out as `(height, width, channels)`.
#[derive(Debug, Clone, PartialEq)]
pub enum PixelData {
    U8(Array3<u8>),
    I8(Array3<i8>),
    U16(Array3<u16>),
    I16(Array3<i16>),
    I32(Array3<i32>),
    F32(Array3<f32>),
    F64(Array3<f64>),
}

/// Runs `$body` with `$pixels` bound to the typed array of whichever variant is present.
macro_rules! with_pixels {
    ($data:expr, $pixels:ident => $body:expr) => {
        match $data {
            $crate::raster::PixelData::U8($pixels) => $body,
            $crate::raster::PixelData::I8($pixels) => $body,
            $crate::raster::PixelData::U16($pixels) => $body,
            $crate::raster::PixelData::I16($pixels) => $body,
            $crate::raster::PixelData::I32($pixels) => $body,
            $crate::raster::PixelData::F32($pixels) => $body,
            $crate::raster::PixelData::F64($pixels) => $body,
        }
    };
}

/// Like `with_pixels!`, but re-wraps the resulting array in the same variant.
macro_rules! map_pixels {
    ($data:expr, $pixels:ident => $body:expr) => {
        match $data {
            PixelData::U8($pixels) => PixelData::U8($body),
            PixelData::I8($pixels) => PixelData::I8($body),
            PixelData::U16($pixels) => PixelData::U16($body),
            PixelData::I16($pixels) => PixelData::I16($body),
            PixelData::I32($pixels) => PixelData::I32($body),
            PixelData::F32($pixels) => PixelData::F32($body),
            PixelData::F64($pixels) => PixelData::F64($body),
        }
    };
}

pub(crate) use with_pixels;

impl PixelData {
    /// Name of the sample type.
    pub fn format(&self) -> &'static str {
        match self {
            PixelData::U8(_) => u8::FORMAT,
            PixelData::I8(_) => i8::FORMAT,
            PixelData::U16(_) => u16::FORMAT,
            PixelData::I16(_) => i16::FORMAT,
            PixelData::I32(_) => i32::FORMAT,
            PixelData::F32(_) => f32::FORMAT,
            PixelData::F64(_) => f64::FORMAT,
        }
    }

    fn dim(&self) -> (usize, usize, usize) {
        with_pixels!(self, pixels => pixels.dim())
    }
}

/// An axis-aligned region in pixel coordinates, as returned by a face detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// A 2-D pixel buffer with a runtime sample type and channel count.
///
/// The descriptor accepts only single-channel images; colour input is kept
/// as-is so that it is rejected with [`FaceError::UnsupportedPixelFormat`]
/// instead of being silently converted.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    data: PixelData,
}

impl Image {
    /// Creates a single-channel image from a `(height, width)` array.
    pub fn from_array<T: Sample>(pixels: Array2<T>) -> Self {
        Self {
            data: T::wrap(pixels.insert_axis(Axis(2))),
        }
    }

    /// Creates a single-channel image by evaluating `f(x, y)` for every pixel.
    pub fn from_fn<T, F>(width: u32, height: u32, f: F) -> Self
    where
        T: Sample,
        F: Fn(u32, u32) -> T,
    {
        let pixels = Array2::from_shape_fn((height as usize, width as usize), |(y, x)| {
            f(x as u32, y as u32)
        });
        Self::from_array(pixels)
    }

    /// Creates an image from interleaved row-major samples.
    ///
    /// # Errors
    /// - `InvalidParameter` if `channels` is zero or `data` does not hold
    ///   exactly `width * height * channels` samples
    pub fn from_shape_vec<T: Sample>(
        width: u32,
        height: u32,
        channels: usize,
        data: Vec<T>,
    ) -> Result<Self> {
        if channels == 0 {
            return Err(FaceError::InvalidParameter(
                "Image must have at least one channel".into(),
            ));
        }
        let shape = (height as usize, width as usize, channels);
        let pixels = Array3::from_shape_vec(shape, data).map_err(|e| {
            FaceError::InvalidParameter(format!(
                "Pixel buffer does not match a {}x{}x{} image: {}",
                width, height, channels, e
            ))
        })?;
        Ok(Self {
            data: T::wrap(pixels),
        })
    }

    pub fn width(&self) -> u32 {
        self.data.dim().1 as u32
    }

    pub fn height(&self) -> u32 {
        self.data.dim().0 as u32
    }

    pub fn channels(&self) -> usize {
        self.data.dim().2
    }

    pub fn format(&self) -> &'static str {
        self.data.format()
    }

    pub fn pixel_data(&self) -> &PixelData {
        &self.data
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    pub(crate) fn ensure_single_channel(&self) -> Result<()> {
        if self.channels() != 1 {
            return Err(FaceError::UnsupportedPixelFormat {
                channels: self.channels(),
                format: self.format(),
            });
        }
        Ok(())
    }

    /// Cuts out the part of the image covered by `rect`.
    ///
    /// The rectangle is clamped to the image bounds first.
    ///
    /// # Errors
    /// - `EmptyDetection` if the clamped rectangle covers no pixels
    pub fn crop(&self, rect: &Rect) -> Result<Image> {
        let (width, height) = (self.width(), self.height());
        let x0 = rect.x.min(width) as usize;
        let y0 = rect.y.min(height) as usize;
        let x1 = rect.x.saturating_add(rect.width).min(width) as usize;
        let y1 = rect.y.saturating_add(rect.height).min(height) as usize;
        if x1 <= x0 || y1 <= y0 {
            return Err(FaceError::EmptyDetection);
        }

        let data = map_pixels!(&self.data, pixels => pixels.slice(s![y0..y1, x0..x1, ..]).to_owned());
        Ok(Image { data })
    }

    /// Resamples a single-channel image to `width x height` with a bilinear filter.
    ///
    /// `u8` images stay `u8`; every other sample type is resampled in `f32`.
    ///
    /// # Errors
    /// - `UnsupportedPixelFormat` for multi-channel images
    /// - `InvalidParameter` if the target or source size is zero
    pub fn resize(&self, width: u32, height: u32) -> Result<Image> {
        self.ensure_single_channel()?;
        if width == 0 || height == 0 {
            return Err(FaceError::InvalidParameter(format!(
                "Cannot resize to {}x{}",
                width, height
            )));
        }
        if self.is_empty() {
            return Err(FaceError::InvalidParameter(
                "Cannot resize an empty image".into(),
            ));
        }
        if self.width() == width && self.height() == height {
            return Ok(self.clone());
        }

        let invalid_buffer =
            || FaceError::InvalidParameter("Pixel buffer does not match image size".into());
        match &self.data {
            PixelData::U8(pixels) => {
                let raw: Vec<u8> = pixels.iter().copied().collect();
                let buffer =
                    GrayImage::from_raw(self.width(), self.height(), raw).ok_or_else(invalid_buffer)?;
                let resized = imageops::resize(&buffer, width, height, FilterType::Triangle);
                Image::from_shape_vec(width, height, 1, resized.into_raw())
            }
            other => {
                let raw: Vec<f32> =
                    with_pixels!(other, pixels => pixels.iter().map(|v| v.to_f64() as f32).collect());
                let buffer: ImageBuffer<Luma<f32>, Vec<f32>> =
                    ImageBuffer::from_raw(self.width(), self.height(), raw).ok_or_else(invalid_buffer)?;
                let resized = imageops::resize(&buffer, width, height, FilterType::Triangle);
                Image::from_shape_vec(width, height, 1, resized.into_raw())
            }
        }
    }

    fn from_raw_buffer<T: Sample>(width: u32, height: u32, channels: usize, raw: Vec<T>) -> Self {
        let shape = (height as usize, width as usize, channels);
        // Buffers coming from `image` always hold width * height * channels samples.
        let pixels = Array3::from_shape_vec(shape, raw)
            .unwrap_or_else(|_| Array3::default((0, 0, channels)));
        Self {
            data: T::wrap(pixels),
        }
    }
}

impl From<DynamicImage> for Image {
    /// Keeps the source's sample type and channel count.
    fn from(image: DynamicImage) -> Self {
        let (width, height) = (image.width(), image.height());
        match image {
            DynamicImage::ImageLuma8(buf) => Self::from_raw_buffer(width, height, 1, buf.into_raw()),
            DynamicImage::ImageLumaA8(buf) => Self::from_raw_buffer(width, height, 2, buf.into_raw()),
            DynamicImage::ImageRgb8(buf) => Self::from_raw_buffer(width, height, 3, buf.into_raw()),
            DynamicImage::ImageRgba8(buf) => Self::from_raw_buffer(width, height, 4, buf.into_raw()),
            DynamicImage::ImageLuma16(buf) => Self::from_raw_buffer(width, height, 1, buf.into_raw()),
            DynamicImage::ImageLumaA16(buf) => Self::from_raw_buffer(width, height, 2, buf.into_raw()),
            DynamicImage::ImageRgb16(buf) => Self::from_raw_buffer(width, height, 3, buf.into_raw()),
            DynamicImage::ImageRgba16(buf) => Self::from_raw_buffer(width, height, 4, buf.into_raw()),
            DynamicImage::ImageRgb32F(buf) => Self::from_raw_buffer(width, height, 3, buf.into_raw()),
            DynamicImage::ImageRgba32F(buf) => Self::from_raw_buffer(width, height, 4, buf.into_raw()),
            other => Self::from(DynamicImage::ImageRgba8(other.to_rgba8())),
        }
    }
}

impl From<GrayImage> for Image {
    fn from(image: GrayImage) -> Self {
        let (width, height) = image.dimensions();
        Self::from_raw_buffer(width, height, 1, image.into_raw())
    }
}
