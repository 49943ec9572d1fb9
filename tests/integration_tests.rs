use env_logger::{Builder, Env};
use lbpface::{
    compute_descriptor, spatial_histogram, train, uniform_class, FaceError, Image, LabelDictionary,
    Rect, Recognizer, RuntimeConfig, TrainParams, TrainingSet, UNIFORM_CLASSES,
};
use ndarray::Array1;

// Initialize test logger
fn init() {
    let _ = Builder::from_env(Env::default().default_filter_or("warn")).try_init();
}

fn stripes(period: u32, offset: u8) -> Image {
    Image::from_fn(80, 80, move |x, _| {
        if (x / period) % 2 == 0 { 20 + offset } else { 200 + offset }
    })
}

#[test]
fn test_constant_image_pipeline() -> Result<(), Box<dyn std::error::Error>> {
    init();
    let image = Image::from_fn(4, 4, |_, _| 100u8);
    let map = compute_descriptor(&image, 1, 8)?;
    assert_eq!((map.rows(), map.cols()), (2, 2));
    assert!(map.codes().iter().all(|&code| code == 255));

    let features = spatial_histogram(&map, 1, 1)?;
    assert_eq!(features.len(), UNIFORM_CLASSES);
    assert_eq!(features[uniform_class(255)], 4.0);
    assert_eq!(features.sum(), 4.0);
    Ok(())
}

#[test]
fn test_feature_level_training() -> Result<(), Box<dyn std::error::Error>> {
    init();
    let mut labels = LabelDictionary::new();
    let a = labels.register("A");
    let b = labels.register("B");

    let mut set = TrainingSet::new();
    set.push(Array1::from(vec![9.0, 1.0, 0.0, 0.0]), a);
    set.push(Array1::from(vec![8.5, 1.5, 0.0, 0.0]), a);
    set.push(Array1::from(vec![0.0, 0.0, 1.0, 9.0]), b);

    let model = train(&set, &TrainParams::default())?;
    let held_out = Array1::from(vec![8.8, 1.2, 0.1, 0.0]);
    let predicted = model.predict(&held_out)?;
    assert_eq!(labels.resolve(predicted)?, "A");
    assert!(matches!(labels.resolve(7), Err(FaceError::UnknownLabel(7))));
    Ok(())
}

#[test]
fn test_detected_samples() -> Result<(), Box<dyn std::error::Error>> {
    init();
    // Faces are embedded in a larger frame; blank frames have no face.
    let frame = |face: Option<Image>| match face {
        Some(face) => {
            Image::from_fn(120, 100, move |x, y| {
                if (20..100).contains(&x) && (10..90).contains(&y) {
                    match face.pixel_data() {
                        lbpface::PixelData::U8(p) => p[[(y - 10) as usize, (x - 20) as usize, 0]],
                        _ => 0,
                    }
                } else {
                    0u8
                }
            })
        }
        None => Image::from_fn(120, 100, |_, _| 0u8),
    };
    let detector = |image: &Image| -> Option<Rect> {
        match image.pixel_data() {
            lbpface::PixelData::U8(p) if p.iter().any(|&v| v > 0) => Some(Rect::new(20, 10, 80, 80)),
            _ => None,
        }
    };

    let builder = Recognizer::builder()
        .with_grid(4, 4)
        .with_runtime_config(RuntimeConfig { worker_threads: 2 })
        .add_detected_samples(
            &detector,
            vec![
                (frame(Some(stripes(2, 0))), "narrow"),
                (frame(None), "narrow"),
                (frame(Some(stripes(2, 15))), "narrow"),
                (frame(Some(stripes(5, 0))), "wide"),
                (frame(Some(stripes(5, 15))), "wide"),
            ],
        )?;
    assert_eq!(builder.num_samples(), 4);
    assert_eq!(builder.skipped_samples(), 1);

    let recognizer = builder.build()?;
    assert_eq!(recognizer.predict_detected(&detector, &frame(Some(stripes(2, 7))))?, "narrow");
    assert_eq!(recognizer.predict_detected(&detector, &frame(Some(stripes(5, 7))))?, "wide");
    Ok(())
}

#[test]
fn test_recognizer_serialization() -> Result<(), Box<dyn std::error::Error>> {
    init();
    let recognizer = Recognizer::builder()
        .with_grid(2, 2)
        .add_sample(stripes(2, 0), "narrow")?
        .add_sample(stripes(6, 0), "wide")?
        .build()?;

    let json = serde_json::to_string(&recognizer)?;
    let restored: Recognizer = serde_json::from_str(&json)?;

    assert_eq!(restored.info().class_labels, recognizer.info().class_labels);
    assert_eq!(restored.config(), recognizer.config());
    for face in [stripes(2, 9), stripes(6, 9)] {
        assert_eq!(restored.predict(&face)?, recognizer.predict(&face)?);
    }
    Ok(())
}

#[test]
fn test_label_dictionary_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    init();
    let mut labels = LabelDictionary::new();
    for name in ["carol", "dave", "carol", "erin"] {
        labels.register(name);
    }
    assert_eq!(labels.len(), 3);

    let json = serde_json::to_string(&labels)?;
    assert_eq!(json, r#"["carol","dave","erin"]"#);
    let restored: LabelDictionary = serde_json::from_str(&json)?;
    assert_eq!(restored, labels);
    assert_eq!(restored.index_of("erin"), Some(2));

    assert!(serde_json::from_str::<LabelDictionary>(r#"["x","x"]"#).is_err());
    Ok(())
}
