//! Accuracy regression tests for liftqual-rf.
//!
//! A deterministic five-class dataset shaped like the sensor data: a handful
//! of informative channels plus many noise channels.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use liftqual_rf::{Agreement, ConfusionMatrix, OobMode, RandomForestConfig};

/// 250 rows, 12 columns, 5 classes; columns 0-3 carry the class, 4-11 are noise.
fn make_sensor_like() -> (Vec<Vec<f64>>, Vec<usize>, Vec<String>) {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let n_samples = 250;
    let n_features = 12;
    let n_classes = 5;

    let mut features = Vec::with_capacity(n_samples);
    let mut labels = Vec::with_capacity(n_samples);
    for i in 0..n_samples {
        let class = i % n_classes;
        labels.push(class);
        let row: Vec<f64> = (0..n_features)
            .map(|f| {
                let base = if f < 4 { class as f64 * 2.0 } else { 0.0 };
                base + rng.r#gen::<f64>() * 0.8
            })
            .collect();
        features.push(row);
    }
    let names = (0..n_features).map(|f| format!("sensor_{f}")).collect();
    (features, labels, names)
}

fn split_even_odd<T: Clone>(items: &[T]) -> (Vec<T>, Vec<T>) {
    let even = items.iter().step_by(2).cloned().collect();
    let odd = items.iter().skip(1).step_by(2).cloned().collect();
    (even, odd)
}

#[test]
fn holdout_accuracy_above_threshold() {
    let (features, labels, names) = make_sensor_like();
    let (train_x, test_x) = split_even_odd(&features);
    let (train_y, test_y) = split_even_odd(&labels);

    let result = RandomForestConfig::new(100)
        .unwrap()
        .with_seed(42)
        .fit(&train_x, &train_y, &names)
        .unwrap();
    let predicted = result.forest().predict_batch(&test_x).unwrap();
    let cm = ConfusionMatrix::from_labels(&test_y, &predicted, 5).unwrap();

    assert!(cm.accuracy() > 0.9, "holdout accuracy {} <= 0.9", cm.accuracy());
}

#[test]
fn oob_error_below_threshold_and_curve_settles() {
    let (features, labels, names) = make_sensor_like();
    let result = RandomForestConfig::new(100)
        .unwrap()
        .with_seed(42)
        .with_oob_mode(OobMode::Enabled)
        .fit(&features, &labels, &names)
        .unwrap();

    let oob = result.oob_score().expect("OOB enabled");
    assert!(oob.error < 0.1, "oob error {} >= 0.1", oob.error);
    assert_eq!(oob.error_curve.len(), 100);
    assert!(oob.error_curve.iter().all(|e| (0.0..=1.0).contains(e)));
    assert!(
        oob.error_curve[99] <= oob.error_curve[0],
        "error after 100 trees ({}) exceeds error after one tree ({})",
        oob.error_curve[99],
        oob.error_curve[0]
    );
}

#[test]
fn top_features_are_informative() {
    let (features, labels, names) = make_sensor_like();
    let result = RandomForestConfig::new(100)
        .unwrap()
        .with_seed(42)
        .fit(&features, &labels, &names)
        .unwrap();

    let informative = ["sensor_0", "sensor_1", "sensor_2", "sensor_3"];
    let top4 = result.top_features(4).unwrap();
    let hits = top4.iter().filter(|n| informative.contains(&n.as_str())).count();

    assert!(hits >= 3, "only {hits}/4 of top-4 features are informative: {top4:?}");
}

#[test]
fn identical_fits_agree_on_every_row() {
    let (features, labels, names) = make_sensor_like();
    let config = RandomForestConfig::new(50).unwrap().with_seed(7);

    let a = config.fit(&features, &labels, &names).unwrap();
    let b = config.fit(&features, &labels, &names).unwrap();

    let probe: Vec<Vec<f64>> = features.iter().rev().take(40).cloned().collect();
    let agreement = Agreement::compare(
        &a.forest().predict_batch(&probe).unwrap(),
        &b.forest().predict_batch(&probe).unwrap(),
    )
    .unwrap();

    assert!(agreement.identical, "disagreements at {:?}", agreement.disagreeing_rows);
}

#[test]
fn reduced_predictor_set_keeps_accuracy() {
    let (features, labels, names) = make_sensor_like();
    let full = RandomForestConfig::new(60)
        .unwrap()
        .with_seed(42)
        .fit(&features, &labels, &names)
        .unwrap();

    let top = full.top_features(4).unwrap();
    let keep: Vec<usize> = top
        .iter()
        .map(|n| names.iter().position(|m| m == n).unwrap())
        .collect();
    let reduced_x: Vec<Vec<f64>> = features
        .iter()
        .map(|row| keep.iter().map(|&i| row[i]).collect())
        .collect();

    let (train_x, test_x) = split_even_odd(&reduced_x);
    let (train_y, test_y) = split_even_odd(&labels);
    let reduced = RandomForestConfig::new(60)
        .unwrap()
        .with_seed(43)
        .fit(&train_x, &train_y, &top)
        .unwrap();
    let predicted = reduced.forest().predict_batch(&test_x).unwrap();
    let cm = ConfusionMatrix::from_labels(&test_y, &predicted, 5).unwrap();

    assert!(cm.accuracy() > 0.85, "reduced-model accuracy {}", cm.accuracy());
}
