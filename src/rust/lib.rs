//! A thread-safe face recognition library built on local binary pattern
//! descriptors and a linear multi-class SVM.
//!
//! Each face region is resized to a canonical size, described with circular
//! local binary patterns, summarised as a grid of uniform-pattern histograms
//! and classified by one-vs-one linear SVMs whose regularization is chosen by
//! cross-validation.
//!
//! # Basic Usage
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use lbpface::{Image, Recognizer};
//!
//! let checker = |size: u32| Image::from_fn(64, 64, move |x, y| if ((x / size) + (y / size)) % 2 == 0 { 40u8 } else { 200 });
//! let gradient = |step: u32| Image::from_fn(64, 64, move |x, y| ((x * step + y) % 256) as u8);
//!
//! let recognizer = Recognizer::builder()
//!     .with_grid(4, 4)
//!     .add_sample(checker(4), "alice")?
//!     .add_sample(checker(6), "alice")?
//!     .add_sample(gradient(3), "bob")?
//!     .add_sample(gradient(5), "bob")?
//!     .build()?;
//!
//! let name = recognizer.predict(&checker(5))?;
//! println!("Recognized: {}", name);
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! A trained recognizer is immutable and can be shared across threads using `Arc`:
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use lbpface::{Image, Recognizer};
//! use std::sync::Arc;
//! use std::thread;
//!
//! let face = |seed: u32| Image::from_fn(48, 48, move |x, y| ((x * seed + y * 7) % 256) as u8);
//! let recognizer = Arc::new(Recognizer::builder()
//!     .with_grid(2, 2)
//!     .add_sample(face(3), "first")?
//!     .add_sample(face(11), "second")?
//!     .build()?);
//!
//! let mut handles = vec![];
//! for seed in 0..3 {
//!     let recognizer = Arc::clone(&recognizer);
//!     handles.push(thread::spawn(move || {
//!         recognizer.predict(&face(seed + 3)).unwrap().to_string()
//!     }));
//! }
//!
//! for handle in handles {
//!     handle.join().unwrap();
//! }
//! # Ok(())
//! # }
//! ```

pub mod classifier;
pub mod descriptor;
mod error;
pub mod histogram;
pub mod pipeline;
pub mod raster;
pub mod recognizer;
mod runtime;

pub use classifier::{train, LabelDictionary, ParamGrid, SvmModel, TrainParams, TrainingSet};
pub use descriptor::{compute_descriptor, DescriptorMap, MAX_NEIGHBOURS};
pub use error::{FaceError, Result};
pub use histogram::{
    spatial_histogram, uniform_class, uniform_histogram, FeatureVector, Histogram, NON_UNIFORM_CLASS,
    UNIFORM_CLASSES,
};
pub use pipeline::{extract_batch, extract_features, locate_face, FaceDetector, PipelineConfig};
pub use raster::{Image, PixelData, Rect, Sample};
pub use recognizer::{FaceSample, Recognizer, RecognizerBuilder, RecognizerInfo};
pub use runtime::{create_thread_pool, RuntimeConfig};

pub fn init_logger() {
    env_logger::init();
}
