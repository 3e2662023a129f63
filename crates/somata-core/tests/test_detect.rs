#[allow(dead_code)]
mod common;

use approx::assert_relative_eq;
use ndarray::Array3;

use somata_core::correlate::CorrelationMethod;
use somata_core::detect::{
    detect_cells, detect_cells_with, CancelToken, DetectionConfig, GreedyDetector, StepOutcome,
    Termination,
};
use somata_core::error::SomataError;
use somata_core::template::ball;

use common::{chebyshev, four_blobs, paint_ball, single_voxel, small_config};

// ---------------------------------------------------------------------------
// End-to-end
// ---------------------------------------------------------------------------

#[test]
fn test_single_voxel_gives_one_detection() {
    let vol = single_voxel((20, 20, 20), (10, 10, 10), 1.0);
    let config = DetectionConfig {
        max_cells: 5,
        ..small_config(CorrelationMethod::Direct)
    };

    let result = detect_cells(&vol, &config).unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result.termination, Termination::BelowStoppingCriterion);

    let c = result.centroids[0];
    assert!(
        chebyshev((c.row, c.col, c.z), (10, 10, 10)) <= 1,
        "centroid at ({}, {}, {})",
        c.row,
        c.col,
        c.z
    );
    // One voxel under a seven-voxel template.
    assert_relative_eq!(c.confidence, 1.0 / 7.0, epsilon = 1e-6);
    assert_eq!(result.labels[[10, 10, 10]], 1);
    assert_eq!(result.max_label(), 1);
}

#[test]
fn test_matching_blob_detected_at_center_with_full_confidence() {
    let mut vol = Array3::<f32>::zeros((20, 20, 20));
    paint_ball(&mut vol, (10, 10, 10), 1.0, 1.0);
    let config = DetectionConfig {
        max_cells: 5,
        ..small_config(CorrelationMethod::Direct)
    };

    let result = detect_cells(&vol, &config).unwrap();
    assert_eq!(result.len(), 1);
    let c = result.centroids[0];
    assert_eq!((c.row, c.col, c.z), (10, 10, 10));
    assert_relative_eq!(c.confidence, 1.0, epsilon = 1e-5);

    let labeled = result.labels.iter().filter(|&&l| l == 1).count();
    assert_eq!(labeled, 7);
    assert_eq!(result.termination, Termination::BelowStoppingCriterion);
}

#[test]
fn test_largest_matching_template_wins() {
    let mut vol = Array3::<f32>::zeros((24, 24, 24));
    paint_ball(&mut vol, (12, 12, 12), 3.0, 1.0);
    let config = DetectionConfig {
        template_radii: vec![3.0, 7.0],
        ..small_config(CorrelationMethod::Direct)
    };

    let result = detect_cells(&vol, &config).unwrap();
    assert_eq!(result.len(), 1);
    let c = result.centroids[0];
    assert_eq!((c.row, c.col, c.z), (12, 12, 12));
    assert_relative_eq!(c.confidence, 1.0, epsilon = 1e-5);
    let labeled = result.labels.iter().filter(|&&l| l == 1).count();
    assert_eq!(labeled, ball(3.0).len());
}

#[test]
fn test_blobs_found_in_order_of_strength() {
    let (vol, centers) = four_blobs();
    let result = detect_cells(&vol, &small_config(CorrelationMethod::Direct)).unwrap();

    assert_eq!(result.len(), 4);
    for (c, &expected) in result.centroids.iter().zip(&centers) {
        assert_eq!((c.row, c.col, c.z), expected);
    }
    let conf: Vec<f64> = result.centroids.iter().map(|c| c.confidence).collect();
    for (got, want) in conf.iter().zip([1.0, 0.9, 0.8, 0.7]) {
        assert_relative_eq!(*got, want, epsilon = 1e-5);
    }
}

#[test]
fn test_centroid_table_layout() {
    let (vol, centers) = four_blobs();
    let result = detect_cells(&vol, &small_config(CorrelationMethod::Direct)).unwrap();
    let table = result.to_array();
    assert_eq!(table.dim(), (4, 4));
    assert_eq!(table[[1, 0]], centers[1].0 as f64);
    assert_eq!(table[[1, 2]], centers[1].2 as f64);
    assert_relative_eq!(table[[3, 3]], 0.7, epsilon = 1e-5);
}

// ---------------------------------------------------------------------------
// Termination
// ---------------------------------------------------------------------------

#[test]
fn test_empty_volume_yields_no_detections() {
    let vol = Array3::<f32>::zeros((12, 12, 12));
    let result = detect_cells(&vol, &small_config(CorrelationMethod::Direct)).unwrap();
    assert!(result.is_empty());
    assert_eq!(result.termination, Termination::BelowStoppingCriterion);
    assert!(result.labels.iter().all(|&l| l == 0));
}

#[test]
fn test_values_below_threshold_are_ignored() {
    let vol = Array3::<f32>::from_elem((12, 12, 12), 0.4);
    let result = detect_cells(&vol, &small_config(CorrelationMethod::Direct)).unwrap();
    assert!(result.is_empty());
}

#[test]
fn test_value_equal_to_threshold_is_kept() {
    let mut vol = Array3::<f32>::zeros((12, 12, 12));
    paint_ball(&mut vol, (6, 6, 6), 1.0, 0.5);
    let result = detect_cells(&vol, &small_config(CorrelationMethod::Direct)).unwrap();
    assert_eq!(result.len(), 1);
    assert_relative_eq!(result.centroids[0].confidence, 0.5, epsilon = 1e-5);
}

#[test]
fn test_weak_candidates_below_stopping_criterion_give_empty_result() {
    // Best confidence is 1/7, under the 0.47 default criterion.
    let vol = single_voxel((16, 16, 16), (8, 8, 8), 1.0);
    let config = DetectionConfig {
        stopping_criterion: 0.47,
        ..small_config(CorrelationMethod::Direct)
    };
    let result = detect_cells(&vol, &config).unwrap();
    assert!(result.is_empty());
    assert!(result.labels.iter().all(|&l| l == 0));
    assert_eq!(result.max_label(), 0);
}

#[test]
fn test_max_cells_caps_output() {
    let (vol, _) = four_blobs();
    let config = DetectionConfig {
        max_cells: 2,
        ..small_config(CorrelationMethod::Direct)
    };
    let result = detect_cells(&vol, &config).unwrap();
    assert_eq!(result.len(), 2);
    assert_eq!(result.termination, Termination::MaxCells);
    assert_eq!(result.max_label() as usize, result.len());
}

#[test]
fn test_label_count_matches_centroids() {
    let (vol, _) = four_blobs();
    let result = detect_cells(&vol, &small_config(CorrelationMethod::Direct)).unwrap();
    assert!(result.len() <= 10);
    assert_eq!(result.max_label() as usize, result.len());
    for id in 1..=result.len() as u32 {
        assert!(result.labels.iter().any(|&l| l == id), "label {id} missing");
    }
}

// ---------------------------------------------------------------------------
// Step-wise behaviour
// ---------------------------------------------------------------------------

#[test]
fn test_labels_are_never_rewritten() {
    let mut vol = Array3::<f32>::zeros((20, 20, 20));
    // Overlapping blobs so later detections touch earlier footprints.
    paint_ball(&mut vol, (8, 8, 8), 2.0, 1.0);
    paint_ball(&mut vol, (8, 8, 12), 2.0, 0.9);
    paint_ball(&mut vol, (12, 8, 10), 2.0, 0.8);
    let config = DetectionConfig {
        template_radii: vec![3.0, 5.0],
        dilation_size: 0.0,
        ..small_config(CorrelationMethod::Direct)
    };

    let mut detector = GreedyDetector::new(&vol, &config).unwrap();
    let mut previous = detector.labels().to_owned();
    loop {
        let outcome = detector.step().unwrap();
        let current = detector.labels().to_owned();
        for (before, after) in previous.iter().zip(current.iter()) {
            if *before != 0 {
                assert_eq!(before, after, "label {before} rewritten to {after}");
            }
        }
        previous = current;
        if !matches!(outcome, StepOutcome::Accepted(_)) {
            break;
        }
    }
    assert!(detector.is_finished());
    assert!(!detector.centroids().is_empty());
}

#[test]
fn test_step_after_finish_reports_termination() {
    let vol = Array3::<f32>::zeros((10, 10, 10));
    let mut detector = GreedyDetector::new(&vol, &small_config(CorrelationMethod::Direct)).unwrap();

    match detector.step().unwrap() {
        StepOutcome::Rejected { confidence } => assert_eq!(confidence, 0.0),
        other => panic!("expected rejection, got {other:?}"),
    }
    assert_eq!(
        detector.step().unwrap(),
        StepOutcome::Finished(Termination::BelowStoppingCriterion)
    );
    assert_eq!(detector.termination(), Some(Termination::BelowStoppingCriterion));
}

#[test]
fn test_suppression_zeroes_winner_region() {
    let (vol, centers) = four_blobs();
    let mut detector = GreedyDetector::new(&vol, &small_config(CorrelationMethod::Direct)).unwrap();
    let outcome = detector.step().unwrap();
    assert!(matches!(outcome, StepOutcome::Accepted(_)));

    let (r, c, z) = centers[0];
    assert_eq!(detector.residual()[[r, c, z]], 0.0);
    // Other blobs are untouched.
    let (r, c, z) = centers[1];
    assert_eq!(detector.residual()[[r, c, z]], 0.9);
}

#[test]
fn test_rerun_on_residual_never_repeats_a_centroid() {
    let (vol, _) = four_blobs();
    let config = DetectionConfig {
        max_cells: 2,
        ..small_config(CorrelationMethod::Direct)
    };

    let mut detector = GreedyDetector::new(&vol, &config).unwrap();
    detector.run(&CancelToken::new(), |_, _| {}).unwrap();
    let residual = detector.residual().to_owned();
    let first = detector.finish();

    let second = detect_cells(&residual, &config).unwrap();
    assert_eq!(second.len(), 2);
    for a in &first.centroids {
        for b in &second.centroids {
            assert_ne!((a.row, a.col, a.z), (b.row, b.col, b.z));
        }
    }
}

#[test]
fn test_libraries_share_box() {
    let config = DetectionConfig {
        template_radii: vec![3.0, 7.0],
        dilation_size: 4.0,
        ..small_config(CorrelationMethod::Direct)
    };
    let vol = Array3::<f32>::zeros((16, 16, 16));
    let detector = GreedyDetector::new(&vol, &config).unwrap();
    assert_eq!(
        detector.detect_library().box_length(),
        detector.suppress_library().box_length()
    );
    assert_eq!(detector.detect_library().len(), 2);
    assert_eq!(detector.suppress_library().get(1).unwrap().radius(), 11.0);
}

// ---------------------------------------------------------------------------
// Cancellation and progress
// ---------------------------------------------------------------------------

#[test]
fn test_cancel_before_start() {
    let (vol, _) = four_blobs();
    let cancel = CancelToken::new();
    cancel.cancel();
    let result = detect_cells_with(&vol, &small_config(CorrelationMethod::Direct), &cancel, |_, _| {})
        .unwrap();
    assert!(result.is_empty());
    assert_eq!(result.termination, Termination::Cancelled);
}

#[test]
fn test_cancel_from_progress_callback_keeps_partial_result() {
    let (vol, centers) = four_blobs();
    let cancel = CancelToken::new();
    let trigger = cancel.clone();
    let result = detect_cells_with(
        &vol,
        &small_config(CorrelationMethod::Direct),
        &cancel,
        move |done, _| {
            if done == 1 {
                trigger.cancel();
            }
        },
    )
    .unwrap();

    assert_eq!(result.len(), 1);
    assert_eq!(result.termination, Termination::Cancelled);
    let c = result.centroids[0];
    assert_eq!((c.row, c.col, c.z), centers[0]);
}

#[test]
fn test_progress_callback_sees_running_count() {
    let (vol, _) = four_blobs();
    let mut seen = Vec::new();
    detect_cells_with(
        &vol,
        &small_config(CorrelationMethod::Direct),
        &CancelToken::new(),
        |done, c| seen.push((done, c.confidence)),
    )
    .unwrap();
    let counts: Vec<usize> = seen.iter().map(|(d, _)| *d).collect();
    assert_eq!(counts, vec![1, 2, 3, 4]);
}

// ---------------------------------------------------------------------------
// Correlation backends
// ---------------------------------------------------------------------------

#[test]
fn test_direct_and_fft_find_same_cells() {
    let (vol, _) = four_blobs();
    let direct = detect_cells(&vol, &small_config(CorrelationMethod::Direct)).unwrap();
    let fft = detect_cells(&vol, &small_config(CorrelationMethod::Fft)).unwrap();

    assert_eq!(direct.len(), fft.len());
    for (a, b) in direct.centroids.iter().zip(&fft.centroids) {
        assert_eq!((a.row, a.col, a.z), (b.row, b.col, b.z));
        assert_relative_eq!(a.confidence, b.confidence, epsilon = 1e-4);
    }
    assert_eq!(direct.labels, fft.labels);
}

#[test]
fn test_single_voxel_ties_resolve_identically_on_both_backends() {
    let vol = single_voxel((20, 20, 20), (10, 10, 10), 1.0);
    let run = |method| {
        let config = DetectionConfig {
            max_cells: 5,
            ..small_config(method)
        };
        detect_cells(&vol, &config).unwrap()
    };
    let direct = run(CorrelationMethod::Direct);
    let fft = run(CorrelationMethod::Fft);

    assert_eq!(direct.len(), 1);
    assert_eq!(fft.len(), 1);
    let (a, b) = (direct.centroids[0], fft.centroids[0]);
    // First row-major voxel among the seven tied positions.
    assert_eq!((a.row, a.col, a.z), (9, 10, 10));
    assert_eq!((b.row, b.col, b.z), (a.row, a.col, a.z));
    assert_relative_eq!(b.confidence, a.confidence, epsilon = 1e-9);
    assert_eq!(direct.labels, fft.labels);
}

#[test]
fn test_detector_reports_resolved_method() {
    let vol = Array3::<f32>::zeros((10, 10, 10));
    let detector = GreedyDetector::new(&vol, &small_config(CorrelationMethod::Auto)).unwrap();
    assert_ne!(detector.method(), CorrelationMethod::Auto);
}

// ---------------------------------------------------------------------------
// Input validation
// ---------------------------------------------------------------------------

#[test]
fn test_invalid_configs_rejected() {
    let vol = Array3::<f32>::zeros((8, 8, 8));
    let base = small_config(CorrelationMethod::Direct);
    let bad = [
        DetectionConfig {
            probability_threshold: 0.0,
            ..base.clone()
        },
        DetectionConfig {
            stopping_criterion: 1.0,
            ..base.clone()
        },
        DetectionConfig {
            template_radii: vec![],
            ..base.clone()
        },
        DetectionConfig {
            template_radii: vec![3.0, -1.0],
            ..base.clone()
        },
        DetectionConfig {
            dilation_size: -1.0,
            ..base.clone()
        },
        DetectionConfig {
            max_cells: 0,
            ..base.clone()
        },
    ];
    for config in &bad {
        let err = detect_cells(&vol, config).unwrap_err();
        assert!(matches!(err, SomataError::InvalidInput(_)), "got {err}");
    }
}

#[test]
fn test_empty_or_non_finite_volume_rejected() {
    let config = small_config(CorrelationMethod::Direct);
    assert!(detect_cells(&Array3::<f32>::zeros((0, 4, 4)), &config).is_err());

    let mut vol = Array3::<f32>::zeros((6, 6, 6));
    vol[[1, 2, 3]] = f32::NAN;
    assert!(detect_cells(&vol, &config).is_err());
}
