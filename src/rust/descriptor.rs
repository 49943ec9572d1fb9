//! Circular, bilinear-interpolated local binary patterns.
//!
//! For each of `n` sample points on a circle of radius `r` around a pixel, the
//! interpolated intensity is compared with the centre pixel. Bit `k` of the
//! pixel's code is set when sample `k` is brighter than the centre or equal to
//! it within `f32::EPSILON`, scaled by the centre's magnitude once that exceeds
//! 1. The output map loses `r` pixels on every edge.

use std::f64::consts::PI;

use ndarray::{Array2, ArrayView2, Axis};

use crate::error::{FaceError, Result};
use crate::raster::{with_pixels, Image, Sample};

/// Largest neighbour count whose codes fit in a `u32`.
pub const MAX_NEIGHBOURS: usize = 32;

/// Relative tolerance; values below 1.0 in magnitude use it as an absolute bound.
const EQUALITY_TOLERANCE: f64 = f32::EPSILON as f64;

/// Per-pixel pattern codes produced by [`compute_descriptor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorMap {
    codes: Array2<u32>,
    neighbours: usize,
}

impl DescriptorMap {
    /// Wraps precomputed codes, e.g. from an external descriptor cache.
    pub fn from_codes(codes: Array2<u32>, neighbours: usize) -> Self {
        Self { codes, neighbours }
    }

    pub fn codes(&self) -> ArrayView2<'_, u32> {
        self.codes.view()
    }

    pub fn rows(&self) -> usize {
        self.codes.nrows()
    }

    pub fn cols(&self) -> usize {
        self.codes.ncols()
    }

    /// Number of sample points each code was built from.
    pub fn neighbours(&self) -> usize {
        self.neighbours
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn into_codes(self) -> Array2<u32> {
        self.codes
    }
}

/// Integer neighbours and bilinear weights of one sample point, relative to the centre.
#[derive(Debug, Clone, Copy)]
struct CircularOffset {
    floor_x: isize,
    floor_y: isize,
    ceil_x: isize,
    ceil_y: isize,
    weights: [f64; 4],
}

impl CircularOffset {
    /// Sample `k` sits at angle `2πk/n` with the y axis pointing down: sample 0
    /// is the right-hand neighbour and sample `n/4` the one above the centre.
    fn new(radius: usize, k: usize, neighbours: usize) -> Self {
        let angle = 2.0 * PI * k as f64 / neighbours as f64;
        let x = radius as f64 * angle.cos();
        let y = -(radius as f64) * angle.sin();

        let (fx, fy) = (x.floor(), y.floor());
        let (cx, cy) = (x.ceil(), y.ceil());
        let tx = x - fx;
        let ty = y - fy;

        Self {
            floor_x: fx as isize,
            floor_y: fy as isize,
            ceil_x: cx as isize,
            ceil_y: cy as isize,
            weights: [
                (1.0 - tx) * (1.0 - ty),
                tx * (1.0 - ty),
                (1.0 - tx) * ty,
                tx * ty,
            ],
        }
    }

    /// Interpolated intensity at this offset from `(row, col)`.
    ///
    /// The caller guarantees `(row, col)` is at least `radius` away from every edge.
    #[inline]
    fn sample<T: Sample>(&self, src: &ArrayView2<'_, T>, row: usize, col: usize) -> f64 {
        let at = |dy: isize, dx: isize| {
            let r = (row as isize + dy) as usize;
            let c = (col as isize + dx) as usize;
            src[[r, c]].to_f64()
        };
        let [w1, w2, w3, w4] = self.weights;
        w1 * at(self.floor_y, self.floor_x)
            + w2 * at(self.floor_y, self.ceil_x)
            + w3 * at(self.ceil_y, self.floor_x)
            + w4 * at(self.ceil_y, self.ceil_x)
    }
}

/// Computes the circular local binary pattern of every interior pixel.
///
/// # Arguments
/// * `image` - A single-channel image of any supported sample type
/// * `radius` - Distance of the sample points from the centre pixel
/// * `neighbours` - Number of sample points, between 1 and [`MAX_NEIGHBOURS`]
///
/// # Returns
/// A map of `(height - 2*radius) x (width - 2*radius)` codes. Images too small
/// to have an interior produce an empty map.
///
/// # Errors
/// - `UnsupportedPixelFormat` if the image has more than one channel
/// - `InvalidParameter` if `radius` is zero or `neighbours` is out of range
///
/// # Example
/// ```
/// use lbpface::{compute_descriptor, Image};
///
/// let image = Image::from_fn(4, 4, |_, _| 100u8);
/// let map = compute_descriptor(&image, 1, 8).unwrap();
/// assert!(map.codes().iter().all(|&code| code == 255));
/// ```
pub fn compute_descriptor(image: &Image, radius: usize, neighbours: usize) -> Result<DescriptorMap> {
    if radius == 0 {
        return Err(FaceError::InvalidParameter(
            "Descriptor radius must be at least 1".into(),
        ));
    }
    if neighbours == 0 || neighbours > MAX_NEIGHBOURS {
        return Err(FaceError::InvalidParameter(format!(
            "Neighbour count must be between 1 and {}, got {}",
            MAX_NEIGHBOURS, neighbours
        )));
    }
    image.ensure_single_channel()?;

    let codes = with_pixels!(image.pixel_data(), pixels => {
        encode(pixels.index_axis(Axis(2), 0), radius, neighbours, 0..neighbours)
    });
    Ok(DescriptorMap { codes, neighbours })
}

/// Sets one bit per sample point, visiting the points in `order`.
///
/// Each point owns a distinct bit, so the visiting order does not change the result.
fn encode<T, I>(src: ArrayView2<'_, T>, radius: usize, neighbours: usize, order: I) -> Array2<u32>
where
    T: Sample,
    I: IntoIterator<Item = usize>,
{
    let (rows, cols) = src.dim();
    let margin = 2 * radius;
    if rows <= margin || cols <= margin {
        return Array2::zeros((rows.saturating_sub(margin), cols.saturating_sub(margin)));
    }

    let mut dst = Array2::<u32>::zeros((rows - margin, cols - margin));
    for k in order {
        let offset = CircularOffset::new(radius, k, neighbours);
        let bit = 1u32 << k;
        for i in radius..rows - radius {
            for j in radius..cols - radius {
                let center = src[[i, j]].to_f64();
                let t = offset.sample(&src, i, j);
                if t > center || (t - center).abs() < EQUALITY_TOLERANCE * center.abs().max(1.0) {
                    dst[[i - radius, j - radius]] |= bit;
                }
            }
        }
    }
    dst
}
