//! Benchmarks for filter and prediction throughput

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use gaze_tracker::aggregator::CalibrationExample;
use gaze_tracker::features::GazeFeatures;
use gaze_tracker::filters::{
    blend::BlendFilter, exponential::ExponentialFilter, kalman::KalmanFilter,
    moving_average::MovingAverageFilter, GazeFilter, NoFilter,
};
use gaze_tracker::predictor::{OutputGain, Predictor};
use gaze_tracker::trainer::{train, TrainerConfig};

fn benchmark_filters(c: &mut Criterion) {
    let mut group = c.benchmark_group("filters");

    // Simulated noisy cursor trail
    let test_data: Vec<(f64, f64)> = (0..100)
        .map(|i| {
            let t = i as f64 * 0.1;
            let x = 960.0 + 400.0 * t.sin() + 5.0 * rand::random::<f64>();
            let y = 540.0 + 200.0 * t.cos() + 5.0 * rand::random::<f64>();
            (x, y)
        })
        .collect();

    let filter_configs: Vec<(&str, Box<dyn GazeFilter>)> = vec![
        ("no_filter", Box::new(NoFilter)),
        ("blend_7", Box::new(BlendFilter::new(7, 0.5, 200.0))),
        ("blend_15", Box::new(BlendFilter::new(15, 0.5, 200.0))),
        ("kalman", Box::new(KalmanFilter::new(0.1, 1.0))),
        ("moving_average_5", Box::new(MovingAverageFilter::new(5))),
        ("exponential_0.3", Box::new(ExponentialFilter::new(0.3))),
    ];

    for (name, mut filter) in filter_configs {
        group.bench_with_input(
            BenchmarkId::new("single_update", name),
            &test_data[0],
            |b, &(x, y)| {
                b.iter(|| black_box(filter.apply(black_box(x), black_box(y))));
            },
        );

        group.bench_with_input(BenchmarkId::new("sequence_100", name), &test_data, |b, data| {
            b.iter(|| {
                filter.reset();
                for &(x, y) in data {
                    black_box(filter.apply(black_box(x), black_box(y)));
                }
            });
        });
    }

    group.finish();
}

fn benchmark_prediction(c: &mut Criterion) {
    let examples: Vec<CalibrationExample> = (0..21)
        .map(|i| {
            let u = 0.05 + 0.9 * (i as f64 / 20.0);
            let v = 0.95 - 0.9 * (i as f64 / 20.0);
            CalibrationExample {
                features: [u, v, u, v, u, v, 0.0, 0.0, 0.5, 0.5],
                screen_x: u * 1920.0,
                screen_y: v * 1080.0,
                target_index: i,
            }
        })
        .collect();

    let predictor = Predictor::new(1920, 1080, OutputGain::default()).unwrap();
    let features = GazeFeatures::new((0.4, 0.6), (0.45, 0.55), (0.5, 0.5));

    let mut group = c.benchmark_group("prediction");
    for degree in [2, 3] {
        let config = TrainerConfig {
            poly_degree: degree,
            ..TrainerConfig::default()
        };
        let model = train(&examples, 1920, 1080, &config).unwrap();

        group.bench_with_input(BenchmarkId::new("predict", format!("degree_{degree}")), &model, |b, model| {
            b.iter(|| black_box(predictor.predict(black_box(model), black_box(&features)).unwrap()));
        });
    }
    group.finish();
}

fn benchmark_training(c: &mut Criterion) {
    let examples: Vec<CalibrationExample> = (0..21)
        .map(|i| {
            let u = 0.05 + 0.9 * (i as f64 / 20.0);
            let v = (0.1 * i as f64).sin().abs();
            CalibrationExample {
                features: [u, v, u, v, u, v, 0.0, 0.0, 0.5, 0.5],
                screen_x: u * 1920.0,
                screen_y: v * 1080.0,
                target_index: i,
            }
        })
        .collect();

    c.bench_function("train_21_points_degree_3", |b| {
        b.iter(|| black_box(train(black_box(&examples), 1920, 1080, &TrainerConfig::default()).unwrap()));
    });
}

criterion_group!(benches, benchmark_filters, benchmark_prediction, benchmark_training);
criterion_main!(benches);
