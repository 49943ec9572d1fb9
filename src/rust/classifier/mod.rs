//! Linear multi-class SVM over spatial histogram features.

mod labels;
mod model;
mod training;
mod utils;

pub use labels::LabelDictionary;
pub use model::SvmModel;
pub use training::{train, ParamGrid, TrainParams, TrainingSet};
