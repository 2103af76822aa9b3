//! Starter documents

use cadence_sequence::{ModifierConfig, SequenceConfig, StepConfig, SyncConfig};
use cadence_timing::{Cutoff, DelayConfig, DurationConfig, Easing};

/// A small sequence that touches every sync strategy
pub fn sample(template: &str) -> SequenceConfig {
    match template {
        "minimal" => minimal(),
        _ => showcase(),
    }
}

fn minimal() -> SequenceConfig {
    let mut step = StepConfig::new("fade");
    step.modifiers.push(ModifierConfig::new("alpha", 0.0, 1.0));
    SequenceConfig {
        steps: vec![step],
        ..Default::default()
    }
}

fn showcase() -> SequenceConfig {
    let mut rise = StepConfig::new("rise");
    rise.duration = DurationConfig::Random {
        initial: 2.0,
        range: 0.5,
        interval: 0.0,
        cutoff: Cutoff::Exact,
        cutoff_step: 0.1,
    };
    rise.delay = DelayConfig {
        halfway: true,
        halfway_duration: DurationConfig::fixed(0.25),
        ..Default::default()
    };
    rise.modifiers.push(ModifierConfig {
        easing: Easing::InOutSine,
        ..ModifierConfig::new("alpha", 0.0, 1.0)
    });
    rise.modifiers
        .push(ModifierConfig::new("glow", 0.0, 8.0).with_sync(SyncConfig::OtherModifier {
            index: Some(0),
        }));

    let mut swell = StepConfig::new("swell");
    swell.duration = DurationConfig::Ramp {
        minimum: 1.0,
        maximum: 3.0,
        over: 6.0,
        hold: 0.0,
        ramp_up: true,
        ramp_down: true,
        easing: Easing::Linear,
    };
    swell.half_move = true;
    swell
        .modifiers
        .push(ModifierConfig::new("scale", 1.0, 1.25).with_sync(SyncConfig::StepProgress));
    swell.modifiers.push(
        ModifierConfig::new("drift", -0.5, 0.5).with_sync(SyncConfig::Unsynced {
            duration: DurationConfig::fixed(1.5),
            delay: DelayConfig::default(),
        }),
    );

    SequenceConfig {
        overlap_time: 0.3,
        seed: Some(7),
        steps: vec![rise, swell],
        ..Default::default()
    }
}
