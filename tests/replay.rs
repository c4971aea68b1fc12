// tests/replay.rs - Recorded landmark CSV through the linear model and pipeline
use gesture_remote::classifier::ModelArtifact;
use gesture_remote::landmarks::FEATURE_LEN;
use gesture_remote::sink::RecordingSink;
use gesture_remote::source::CsvLandmarkSource;
use gesture_remote::{Command, ControllerConfig, Gesture, LinearModel, Pipeline, SessionState};
use std::io::Write;
use std::sync::atomic::AtomicBool;
use std::time::{Duration, Instant};

const LABELS: [Gesture; 4] = [Gesture::Fist, Gesture::Palm, Gesture::Pinch, Gesture::Point];

// Gesture i is recognized by joint i+1 sitting 0.2 to the right of the wrist.
fn model_file() -> tempfile::NamedTempFile {
    let weights = (0..LABELS.len())
        .map(|i| {
            let mut row = vec![0.0; FEATURE_LEN];
            row[2 * (i + 1)] = 40.0;
            row
        })
        .collect();
    let artifact = ModelArtifact {
        labels: LABELS.to_vec(),
        weights,
        intercepts: vec![0.0; LABELS.len()],
    };
    let mut file = tempfile::NamedTempFile::new().unwrap();
    serde_json::to_writer(&mut file, &artifact).unwrap();
    file.flush().unwrap();
    file
}

fn hand_row(gesture: Gesture, fingertip_y: f64) -> String {
    let i = LABELS.iter().position(|g| *g == gesture).unwrap();
    let mut coords = vec![0.5; FEATURE_LEN];
    coords[2 * (i + 1)] = 0.7;
    coords[17] = fingertip_y;
    let mut fields: Vec<String> = coords.iter().map(|v| v.to_string()).collect();
    fields.push(gesture.code().to_string());
    fields.join(",")
}

fn no_hand_row() -> String {
    let mut fields = vec!["0".to_string(); FEATURE_LEN];
    fields.push("5".to_string());
    fields.join(",")
}

fn csv_file(rows: &[String]) -> tempfile::NamedTempFile {
    let mut header: Vec<String> = (0..21).flat_map(|i| [format!("x{i}"), format!("y{i}")]).collect();
    header.push("Label".to_string());

    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "{}", header.join(",")).unwrap();
    for row in rows {
        writeln!(file, "{row}").unwrap();
    }
    file.flush().unwrap();
    file
}

fn clock(fps: f64) -> impl FnMut() -> Instant {
    let start = Instant::now();
    let interval = Duration::from_secs_f64(1.0 / fps);
    let mut elapsed = Duration::ZERO;
    move || {
        elapsed += interval;
        start + elapsed
    }
}

#[test]
fn player_session_from_recording() {
    let model = LinearModel::load(model_file().path()).unwrap();
    let mut config = ControllerConfig::player();
    config.frame_skip = 1;

    let mut rows = Vec::new();
    // fist while locked: ignored
    rows.extend(std::iter::repeat(hand_row(Gesture::Fist, 0.5)).take(3));
    // palm unlocks, then keeps toggling play at most every 1.5 s
    rows.extend(std::iter::repeat(hand_row(Gesture::Palm, 0.5)).take(10));
    rows.push(no_hand_row());
    rows.extend(std::iter::repeat(hand_row(Gesture::Point, 0.5)).take(2));

    let csv = csv_file(&rows);
    let source = CsvLandmarkSource::open(csv.path()).unwrap();
    let mut pipeline = Pipeline::new(source, model, RecordingSink::default(), &config);
    let summary = pipeline.run(clock(10.0), &AtomicBool::new(false)).unwrap();

    assert_eq!(summary.frames_read, 16);
    assert_eq!(summary.frames_classified, 16);
    assert_eq!(summary.unlocks, 1);
    assert_eq!(summary.final_state, SessionState::Unlocked);
    assert_eq!(
        pipeline.sink().commands,
        vec![Command::TogglePlayPause, Command::VolumeDown]
    );
    assert_eq!(summary.stable_accuracy(), Some(1.0));
}

#[test]
fn desktop_pinch_volume_from_recording() {
    let model = LinearModel::load(model_file().path()).unwrap();
    let config = ControllerConfig::desktop();

    let rows = vec![
        hand_row(Gesture::Palm, 0.5),
        hand_row(Gesture::Palm, 0.5),
        hand_row(Gesture::Pinch, 0.60),
        hand_row(Gesture::Pinch, 0.60),
        hand_row(Gesture::Pinch, 0.50),
        hand_row(Gesture::Pinch, 0.50),
        hand_row(Gesture::Pinch, 0.50),
        hand_row(Gesture::Pinch, 0.50),
        hand_row(Gesture::Pinch, 0.62),
    ];
    let csv = csv_file(&rows);
    let source = CsvLandmarkSource::open(csv.path()).unwrap();
    let mut pipeline = Pipeline::new(source, model, RecordingSink::default(), &config);
    pipeline.run(clock(4.0), &AtomicBool::new(false)).unwrap();

    assert_eq!(
        pipeline.into_sink().commands,
        vec![Command::VolumeUp, Command::VolumeDown]
    );
}

#[test]
fn missing_model_is_fatal() {
    assert!(LinearModel::load("/nonexistent/gesture_model.json").is_err());
}
