//! Loading sequences from documents and running them

use cadence_sequence::{ConfigError, ProgressionMode, Sequence, SequenceConfig};
use tracing_subscriber::EnvFilter;

const PULSE_TOML: &str = r#"
seed = 42
overlap_time = 0.2

[[steps]]
name = "rise"

[steps.duration]
type = "random"
initial = 1.0
range = 0.5

[[steps.modifiers]]
name = "alpha"
minimum = 0.0
maximum = 1.0
easing = "in_out_sine"

[[steps.modifiers]]
name = "shadow"
minimum = 0.0
maximum = 4.0
sync = { type = "other_modifier", index = 0 }

[[steps]]
name = "swell"

[steps.duration]
type = "ramp"
minimum = 0.5
maximum = 2.0
over = 3.0

[[steps.modifiers]]
name = "scale"
minimum = 1.0
maximum = 1.5
sync = { type = "step_progress" }
"#;

fn values(sequence: &Sequence) -> Vec<f32> {
    sequence
        .steps()
        .flat_map(|(_, step)| step.modifiers().iter().map(|m| m.value()))
        .collect()
}

fn run(sequence: &mut Sequence, frames: usize) -> Vec<Vec<f32>> {
    (0..frames)
        .map(|_| {
            sequence.tick(1.0 / 60.0);
            values(sequence)
        })
        .collect()
}

#[test]
fn toml_document_runs_within_ranges() {
    let config = SequenceConfig::from_toml(PULSE_TOML).unwrap();
    let mut sequence = Sequence::from_config(&config).unwrap();
    assert_eq!(sequence.len(), 2);
    assert_eq!(sequence.mode(), ProgressionMode::Ordered);

    for frame in run(&mut sequence, 600) {
        let [alpha, shadow, scale] = frame[..] else {
            panic!("expected three modifiers, got {frame:?}");
        };
        assert!((-1e-4..=1.0 + 1e-4).contains(&alpha));
        assert!((-1e-4..=4.0 + 1e-4).contains(&shadow));
        assert!((1.0 - 1e-4..=1.5 + 1e-4).contains(&scale));
    }
}

#[test]
fn same_seed_replays_same_run() {
    let config = SequenceConfig::from_toml(PULSE_TOML).unwrap();
    let mut a = Sequence::from_config(&config).unwrap();
    let mut b = Sequence::from_config(&config).unwrap();

    assert_eq!(run(&mut a, 300), run(&mut b, 300));
}

#[test]
fn json_and_toml_describe_the_same_sequence() {
    let config = SequenceConfig::from_toml(PULSE_TOML).unwrap();
    let sequence = Sequence::from_config(&config).unwrap();

    let json = sequence.to_config().to_json().unwrap();
    let reloaded = SequenceConfig::from_json(&json).unwrap();
    assert_eq!(reloaded, config);
}

#[test]
fn invalid_documents_are_rejected() {
    let err = SequenceConfig::from_json(r#"{ "steps": [ { "name": 3 } ] }"#).unwrap_err();
    assert!(matches!(err, ConfigError::Json(_)));

    let err = SequenceConfig::from_toml("overlap_time = -0.5").unwrap_err();
    assert!(matches!(err, ConfigError::OverlapTime(_)));

    let err = SequenceConfig::from_toml(
        r#"
        [[steps]]
        name = "loop"

        [[steps.modifiers]]
        name = "self"
        sync = { type = "other_modifier", index = 0 }
        "#,
    )
    .unwrap_err();
    assert!(err.to_string().contains("loop"));
}

#[test]
fn runs_under_a_subscriber() {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("cadence_sequence=trace,cadence_overlap=trace"))
        .with_test_writer()
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        let config = SequenceConfig::from_toml(PULSE_TOML).unwrap();
        let mut sequence = Sequence::from_config(&config).unwrap();
        sequence.set_mode(ProgressionMode::Concurrent);
        run(&mut sequence, 120);
        assert!(sequence.steps().all(|(_, step)| step.enabled()));
    });
}
