//! Segments a synthetic feature matrix against a Switchboard transcript and
//! runs both passes of the training statistics.

use std::path::{Path, PathBuf};

use corpusprep::{MEAN_FILE, STDDEV_FILE, SegmentJob};
use corpusprep_config::Settings;
use corpusprep_features::npy;
use ndarray::Array2;

const TRANSCRIPT: &str = "\
sw02001A-ms98-a-0001 0.000000 0.500000 [silence]
sw02001A-ms98-a-0002 1.000000 2.000000 hello there
sw02001A-ms98-a-0003 2.500000 4.000000 how are you
";

fn settings(output_dir: &Path, padding: usize) -> Settings {
    Settings {
        corpus: Some("switchboard".to_string()),
        output_dir: output_dir.to_path_buf(),
        sil_padding_frames: padding,
        ..Settings::default()
    }
}

fn fixture(root: &Path) -> Vec<(PathBuf, PathBuf)> {
    let features = root.join("sw02001A.npy");
    let ramp = Array2::from_shape_fn((500, 2), |(i, j)| if j == 0 { i as f32 } else { 1.0 });
    npy::write_matrix(&features, &ramp).unwrap();
    let transcript = root.join("sw02001A-ms98-a-trans.text");
    std::fs::write(&transcript, TRANSCRIPT).unwrap();
    vec![(features, transcript)]
}

#[test]
fn test_writes_padded_slices() {
    let dir = tempfile::tempdir().unwrap();
    let pairs = fixture(dir.path());
    let out = dir.path().join("out");

    let summary = SegmentJob::from_settings(&settings(&out, 20), false)
        .unwrap()
        .run(&pairs)
        .unwrap();
    assert_eq!(summary.utterances, 2);
    assert_eq!(summary.dropped, 1);
    assert_eq!(summary.frames, 140 + 190);
    assert!(summary.mean_path.is_none());

    let first = npy::read_matrix(out.join("sw02001A/sw02001A_0002.npy")).unwrap();
    assert_eq!(first.nrows(), 140);
    assert_eq!(first[[0, 0]], 80.0);
    let second = npy::read_matrix(out.join("sw02001A/sw02001A_0003.npy")).unwrap();
    assert_eq!(second[[0, 0]], 230.0);
    assert_eq!(second[[second.nrows() - 1, 0]], 419.0);

    // the silence-only utterance gets no slice
    assert!(!out.join("sw02001A/sw02001A_0001.npy").exists());
}

#[test]
fn test_two_training_passes_then_normalize() {
    let dir = tempfile::tempdir().unwrap();
    let pairs = fixture(dir.path());
    let out = dir.path().join("out");

    let first = SegmentJob::from_settings(&settings(&out, 0), true)
        .unwrap()
        .run(&pairs)
        .unwrap();
    let mean_path = first.mean_path.unwrap();
    assert_eq!(mean_path, out.join(MEAN_FILE));
    let mean = npy::read_vector(&mean_path).unwrap();
    // frames 100..200 and 250..400
    let expected = ((100..200).sum::<usize>() + (250..400).sum::<usize>()) as f32 / 250.0;
    assert!((mean[0] - expected).abs() < 1e-3);
    assert_eq!(mean[1], 1.0);

    let second = SegmentJob::from_settings(&settings(&out, 0), true)
        .unwrap()
        .with_mean(&mean_path)
        .unwrap()
        .run(&pairs)
        .unwrap();
    let stddev_path = second.stddev_path.unwrap();
    assert_eq!(stddev_path, out.join(STDDEV_FILE));
    let stddev = npy::read_vector(&stddev_path).unwrap();
    assert!(stddev[0] > 0.0);
    assert_eq!(stddev[1], 0.0);

    let normalized_out = dir.path().join("normalized");
    let third = SegmentJob::from_settings(&settings(&normalized_out, 0), false)
        .unwrap()
        .with_mean(&mean_path)
        .unwrap()
        .with_stddev(&stddev_path)
        .unwrap()
        .run(&pairs)
        .unwrap();
    assert!(third.normalized);
    let slice = npy::read_matrix(normalized_out.join("sw02001A/sw02001A_0002.npy")).unwrap();
    assert!(slice.column(1).iter().all(|&v| v == 0.0));
    assert!((slice[[0, 0]] - (100.0 - mean[0]) / stddev[0]).abs() < 1e-4);
}

#[test]
fn test_unmatched_speaker_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let transcript = dir.path().join("two-speakers.text");
    std::fs::write(
        &transcript,
        "sw02001A-ms98-a-0001 0.0 1.0 hello\nsw02001B-ms98-a-0001 0.0 1.0 hi\n",
    )
    .unwrap();
    let features = dir.path().join("unrelated.npy");
    npy::write_matrix(&features, &Array2::zeros((200, 2))).unwrap();

    let err = SegmentJob::from_settings(&settings(dir.path(), 0), false)
        .unwrap()
        .run(&[(features, transcript)])
        .unwrap_err();
    assert!(err.to_string().contains("2 speakers"));
}
