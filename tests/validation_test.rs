use lbpface::{
    compute_descriptor, FaceError, Image, PipelineConfig, Recognizer, RuntimeConfig, TrainParams,
};
use ndarray::Array1;

fn face(seed: u32) -> Image {
    Image::from_fn(40, 40, move |x, y| ((x * (seed + 2) + y * 5) % 230) as u8)
}

#[test]
fn test_single_identity_fails() {
    let result = Recognizer::builder()
        .add_sample(face(1), "same")
        .and_then(|builder| builder.add_sample(face(2), "same"))
        .and_then(|builder| builder.build());

    assert!(matches!(result, Err(FaceError::InsufficientLabels { found: 1 })));
}

#[test]
fn test_empty_training_set() {
    assert!(matches!(
        Recognizer::builder().build(),
        Err(FaceError::EmptyTrainingSet)
    ));
}

#[test]
fn test_colour_image_rejected() -> Result<(), FaceError> {
    let rgb = Image::from_shape_vec(8, 8, 3, vec![50u8; 8 * 8 * 3])?;
    assert!(matches!(
        compute_descriptor(&rgb, 1, 8),
        Err(FaceError::UnsupportedPixelFormat { channels: 3, format: "u8" })
    ));
    assert!(matches!(
        Recognizer::builder().add_sample(rgb, "colour"),
        Err(FaceError::UnsupportedPixelFormat { .. })
    ));
    Ok(())
}

#[test]
fn test_invalid_configuration() {
    let result = Recognizer::builder()
        .with_neighbours(16)
        .add_sample(face(1), "a")
        .and_then(|builder| builder.add_sample(face(2), "b"))
        .and_then(|builder| builder.build());
    assert!(matches!(result, Err(FaceError::InvalidParameter(_))));

    let result = Recognizer::builder()
        .with_grid(0, 3)
        .add_sample(face(1), "a")
        .and_then(|builder| builder.add_sample(face(2), "b"))
        .and_then(|builder| builder.build());
    assert!(matches!(result, Err(FaceError::InvalidParameter(_))));

    let result = Recognizer::builder()
        .with_train_params(TrainParams {
            eps: -1.0,
            ..TrainParams::default()
        })
        .add_sample(face(1), "a")
        .and_then(|builder| builder.add_sample(face(2), "b"))
        .and_then(|builder| builder.build());
    assert!(matches!(result, Err(FaceError::InvalidParameter(_))));
}

#[test]
fn test_invalid_descriptor_parameters() {
    let image = face(3);
    assert!(matches!(
        compute_descriptor(&image, 0, 8),
        Err(FaceError::InvalidParameter(_))
    ));
    assert!(matches!(
        compute_descriptor(&image, 1, 0),
        Err(FaceError::InvalidParameter(_))
    ));
    assert!(matches!(
        compute_descriptor(&image, 1, 33),
        Err(FaceError::InvalidParameter(_))
    ));
}

#[test]
fn test_feature_dimension_mismatch() -> Result<(), FaceError> {
    let recognizer = Recognizer::builder()
        .with_config(PipelineConfig {
            grid_x: 2,
            grid_y: 2,
            ..PipelineConfig::default()
        })
        .with_runtime_config(RuntimeConfig::single_threaded())
        .add_sample(face(1), "a")?
        .add_sample(face(9), "b")?
        .build()?;

    let wrong = Array1::<f32>::zeros(59);
    assert!(matches!(
        recognizer.predict_features(&wrong),
        Err(FaceError::DimensionMismatch { expected: 236, found: 59 })
    ));
    Ok(())
}

#[test]
fn test_failed_detection() -> Result<(), FaceError> {
    let recognizer = Recognizer::builder()
        .with_grid(2, 2)
        .add_sample(face(1), "a")?
        .add_sample(face(9), "b")?
        .build()?;

    let detector = |_: &Image| -> Option<lbpface::Rect> { None };
    assert!(matches!(
        recognizer.predict_detected(&detector, &face(1)),
        Err(FaceError::EmptyDetection)
    ));
    Ok(())
}
