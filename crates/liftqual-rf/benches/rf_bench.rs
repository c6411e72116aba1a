//! Criterion benchmarks for liftqual-rf: forest training and prediction.

use criterion::{Criterion, criterion_group, criterion_main};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use liftqual_rf::{OobMode, RandomForestConfig};

/// Sensor-shaped data: 52 predictor columns, 5 classes.
fn make_sensor_like(n_samples: usize, seed: u64) -> (Vec<Vec<f64>>, Vec<usize>, Vec<String>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let n_features = 52;
    let mut features = Vec::with_capacity(n_samples);
    let mut labels = Vec::with_capacity(n_samples);
    for i in 0..n_samples {
        let class = i % 5;
        labels.push(class);
        let row: Vec<f64> = (0..n_features)
            .map(|f| {
                let base = if f % 7 == 0 { class as f64 } else { 0.0 };
                base + rng.r#gen::<f64>()
            })
            .collect();
        features.push(row);
    }
    let names = (0..n_features).map(|f| format!("sensor_{f}")).collect();
    (features, labels, names)
}

fn bench_train(c: &mut Criterion) {
    let (features, labels, names) = make_sensor_like(1000, 42);
    let cfg = RandomForestConfig::new(50).unwrap().with_seed(42);

    c.bench_function("rf_train_1000x52_5class_50trees", |b| {
        b.iter(|| cfg.fit(&features, &labels, &names).unwrap());
    });
}

fn bench_train_with_oob(c: &mut Criterion) {
    let (features, labels, names) = make_sensor_like(1000, 42);
    let cfg = RandomForestConfig::new(50)
        .unwrap()
        .with_seed(42)
        .with_oob_mode(OobMode::Enabled);

    c.bench_function("rf_train_oob_1000x52_5class_50trees", |b| {
        b.iter(|| cfg.fit(&features, &labels, &names).unwrap());
    });
}

fn bench_predict_batch(c: &mut Criterion) {
    let (features, labels, names) = make_sensor_like(1000, 42);
    let forest = RandomForestConfig::new(50)
        .unwrap()
        .with_seed(42)
        .fit(&features, &labels, &names)
        .unwrap()
        .into_forest();

    c.bench_function("rf_predict_batch_1000x52_50trees", |b| {
        b.iter(|| forest.predict_batch(&features).unwrap());
    });
}

criterion_group!(benches, bench_train, bench_train_with_oob, bench_predict_batch);
criterion_main!(benches);
