//! End-to-end pipeline test: grid generation through aggregation,
//! training and prediction against a known linear ground truth.

use gaze_tracker::aggregator::{PointStatus, SampleAggregator};
use gaze_tracker::features::GazeFeatures;
use gaze_tracker::grid::{generate_grid, GridSize};
use gaze_tracker::predictor::{OutputGain, Predictor};
use gaze_tracker::trainer::{train, TrainerConfig};

const SCREEN_W: u32 = 1920;
const SCREEN_H: u32 = 1080;

/// Ground truth: gaze ratios map linearly onto the screen. The iris
/// ratio equals the normalized screen position, both eyes agree, and the
/// nose stays centered.
fn ground_truth_features(screen_x: f64, screen_y: f64) -> GazeFeatures {
    let u = screen_x / f64::from(SCREEN_W);
    let v = screen_y / f64::from(SCREEN_H);
    GazeFeatures::new((u, v), (u, v), (0.5, 0.5))
}

#[test]
fn test_nine_point_linear_ground_truth() {
    let grid = generate_grid(SCREEN_W, SCREEN_H, GridSize::Nine).unwrap();

    // Feed each target exactly 60 identical synthetic samples
    let mut aggregator = SampleAggregator::new(60);
    let mut examples = Vec::new();
    for target in &grid {
        aggregator.begin_point(target.clone());
        let f = ground_truth_features(f64::from(target.x), f64::from(target.y));
        for frame in 0..60 {
            match aggregator.add_sample(&f).unwrap() {
                PointStatus::Collecting { collected, .. } => assert_eq!(collected, frame + 1),
                PointStatus::Complete(example) => {
                    assert_eq!(frame, 59);
                    examples.push(example);
                }
            }
        }
    }
    assert_eq!(examples.len(), 9);

    let model = train(&examples, SCREEN_W, SCREEN_H, &TrainerConfig::default()).unwrap();
    assert!(
        model.train_error_x < 5.0,
        "x error {} exceeds 5px",
        model.train_error_x
    );
    assert!(
        model.train_error_y < 5.0,
        "y error {} exceeds 5px",
        model.train_error_y
    );

    // Held-out point interpolated between two calibration targets
    let held_out_x = (f64::from(grid[0].x) + f64::from(grid[1].x)) / 2.0;
    let held_out_y = f64::from(grid[0].y);
    let f = ground_truth_features(held_out_x, held_out_y);

    let predictor = Predictor::new(SCREEN_W, SCREEN_H, OutputGain::default()).unwrap();
    let (px, py) = predictor.predict(&model, &f).unwrap();

    let diagonal = (f64::from(SCREEN_W).powi(2) + f64::from(SCREEN_H).powi(2)).sqrt();
    let miss = ((px - held_out_x).powi(2) + (py - held_out_y).powi(2)).sqrt();
    assert!(
        miss < diagonal * 0.1,
        "held-out miss {miss:.1}px exceeds 10% of diagonal ({:.1}px)",
        diagonal * 0.1
    );
}

#[test]
fn test_training_is_order_independent() {
    let grid = generate_grid(SCREEN_W, SCREEN_H, GridSize::Nine).unwrap();

    let examples: Vec<_> = grid
        .iter()
        .map(|t| {
            let mut agg = SampleAggregator::new(1);
            agg.begin_point(t.clone());
            let f = ground_truth_features(f64::from(t.x), f64::from(t.y));
            match agg.add_sample(&f).unwrap() {
                PointStatus::Complete(e) => e,
                PointStatus::Collecting { .. } => unreachable!(),
            }
        })
        .collect();

    let forward = train(&examples, SCREEN_W, SCREEN_H, &TrainerConfig::default()).unwrap();
    let mut reversed_examples = examples;
    reversed_examples.reverse();
    let reversed = train(&reversed_examples, SCREEN_W, SCREEN_H, &TrainerConfig::default()).unwrap();

    let f = ground_truth_features(700.0, 400.0);
    let a = forward.evaluate(&f.feature_vector()).unwrap();
    let b = reversed.evaluate(&f.feature_vector()).unwrap();
    assert!((a.0 - b.0).abs() < 1e-6);
    assert!((a.1 - b.1).abs() < 1e-6);
}

#[test]
fn test_larger_grids_fit_the_same_mapping() {
    for size in [GridSize::Fifteen, GridSize::TwentyOne] {
        let grid = generate_grid(SCREEN_W, SCREEN_H, size).unwrap();

        let mut aggregator = SampleAggregator::new(3);
        let mut examples = Vec::new();
        for target in &grid {
            aggregator.begin_point(target.clone());
            let f = ground_truth_features(f64::from(target.x), f64::from(target.y));
            for _ in 0..3 {
                if let PointStatus::Complete(example) = aggregator.add_sample(&f).unwrap() {
                    examples.push(example);
                }
            }
        }
        assert_eq!(examples.len(), size.point_count());

        let model = train(&examples, SCREEN_W, SCREEN_H, &TrainerConfig::default()).unwrap();
        assert!(model.train_error_x < 5.0);
        assert!(model.train_error_y < 5.0);
    }
}

#[test]
fn test_degree_is_honored_end_to_end() {
    let grid = generate_grid(SCREEN_W, SCREEN_H, GridSize::Nine).unwrap();
    let examples: Vec<_> = grid
        .iter()
        .map(|t| {
            let mut agg = SampleAggregator::new(1);
            agg.begin_point(t.clone());
            let f = ground_truth_features(f64::from(t.x), f64::from(t.y));
            match agg.add_sample(&f).unwrap() {
                PointStatus::Complete(e) => e,
                PointStatus::Collecting { .. } => unreachable!(),
            }
        })
        .collect();

    let config = TrainerConfig {
        poly_degree: 2,
        ..TrainerConfig::default()
    };
    let model = train(&examples, SCREEN_W, SCREEN_H, &config).unwrap();

    assert_eq!(model.poly_degree, 2);
    // degree-2 expansion of 10 features: C(12, 2) terms
    assert_eq!(model.expanded_dim, 66);
    assert!(model.train_error_x < 5.0);
}
