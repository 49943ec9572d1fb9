use lazy_static::lazy_static;
use log::debug;
use ndarray::{s, Array1, ArrayView2};

use crate::descriptor::DescriptorMap;
use crate::error::{FaceError, Result};

/// Number of uniform-pattern classes for 8-neighbour codes (58 uniform + 1 catch-all).
pub const UNIFORM_CLASSES: usize = 59;

/// Class shared by every non-uniform pattern.
pub const NON_UNIFORM_CLASS: usize = UNIFORM_CLASSES - 1;

/// Pattern counts of one region, indexed by uniform class.
pub type Histogram = [u32; UNIFORM_CLASSES];

/// Row-major concatenation of per-cell histograms.
pub type FeatureVector = Array1<f32>;

lazy_static! {
    /// Uniform class of every 8-bit pattern.
    ///
    /// Patterns with at most two circular bit transitions get consecutive
    /// classes in ascending code order (`0` is class 0, `255` is class 57);
    /// all others fall into [`NON_UNIFORM_CLASS`].
    pub static ref UNIFORM_PATTERNS: [u8; 256] = {
        let mut table = [NON_UNIFORM_CLASS as u8; 256];
        let mut next = 0u8;
        for code in 0..=255u8 {
            if transitions(code) <= 2 {
                table[code as usize] = next;
                next += 1;
            }
        }
        table
    };
}

/// Number of 0→1 and 1→0 changes reading the bits of `code` circularly.
fn transitions(code: u8) -> u32 {
    (code ^ code.rotate_right(1)).count_ones()
}

/// Uniform class of a single code. Codes wider than 8 bits are non-uniform.
#[inline]
pub fn uniform_class(code: u32) -> usize {
    UNIFORM_PATTERNS
        .get(code as usize)
        .map_or(NON_UNIFORM_CLASS, |&class| class as usize)
}

/// Counts the codes of a region per uniform class.
///
/// The counts always sum to the number of pixels in `region`.
pub fn uniform_histogram(region: ArrayView2<'_, u32>) -> Histogram {
    let mut hist = [0u32; UNIFORM_CLASSES];
    for &code in region.iter() {
        hist[uniform_class(code)] += 1;
    }
    hist
}

/// Length of the feature vector produced for a `grid_x x grid_y` grid.
pub fn feature_length(grid_x: usize, grid_y: usize) -> usize {
    grid_x * grid_y * UNIFORM_CLASSES
}

/// Builds the spatial histogram of an 8-neighbour descriptor map.
///
/// The map is split into `grid_x * grid_y` cells of
/// `floor(rows / grid_y) x floor(cols / grid_x)` codes; leftover rows and
/// columns at the bottom and right edges are ignored. Cell `(i, j)` lands at
/// offset `(i * grid_x + j) * 59` of the result.
///
/// An empty map yields an all-zero vector of the full length, so that a bad
/// sample does not abort a whole batch.
///
/// # Errors
/// - `InvalidParameter` if either grid dimension is zero or the map was not
///   built with 8 neighbours
pub fn spatial_histogram(map: &DescriptorMap, grid_x: usize, grid_y: usize) -> Result<FeatureVector> {
    if grid_x == 0 || grid_y == 0 {
        return Err(FaceError::InvalidParameter(format!(
            "Grid must be at least 1x1, got {}x{}",
            grid_x, grid_y
        )));
    }
    if map.neighbours() != 8 {
        return Err(FaceError::InvalidParameter(format!(
            "Uniform pattern histograms need 8-neighbour codes, got {}",
            map.neighbours()
        )));
    }

    let mut features = FeatureVector::zeros(feature_length(grid_x, grid_y));
    if map.is_empty() {
        debug!("Empty descriptor map, returning a zero feature vector");
        return Ok(features);
    }

    let codes = map.codes();
    let cell_width = map.cols() / grid_x;
    let cell_height = map.rows() / grid_y;
    for i in 0..grid_y {
        for j in 0..grid_x {
            let cell = codes.slice(s![
                i * cell_height..(i + 1) * cell_height,
                j * cell_width..(j + 1) * cell_width
            ]);
            let hist = uniform_histogram(cell);
            let offset = (i * grid_x + j) * UNIFORM_CLASSES;
            for (slot, &count) in features
                .slice_mut(s![offset..offset + UNIFORM_CLASSES])
                .iter_mut()
                .zip(hist.iter())
            {
                *slot = count as f32;
            }
        }
    }
    Ok(features)
}
