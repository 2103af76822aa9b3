use cadence_timing::{
    Delay, DelayConfig, DelayPhase, DelayTick, Duration, DurationConfig, DurationCycle,
    PcgSource, RandomDuration,
};

fn fixed(seconds: f32) -> Duration {
    Duration::Random(RandomDuration::with_source(
        seconds,
        0.0,
        PcgSource::seeded(7).boxed(),
    ))
}

/// Drive a duration the way a step does: pause at the half crossing and
/// again at the end, and count how long the whole cycle took.
fn run_cycle(duration: &mut Duration, delay: &mut Delay, dt: f32) -> f32 {
    let mut clock = 0.0;
    let mut was_first = duration.in_first_half();
    for _ in 0..10_000 {
        clock += dt;
        match delay.tick(dt) {
            DelayTick::Running => continue,
            DelayTick::Finished { stop: true, .. } => return clock,
            DelayTick::Finished { .. } | DelayTick::Idle => {}
        }

        duration.tick(dt);
        if duration.finished() {
            if delay.enabled(DelayPhase::EndForwards) {
                delay.activate_then_reset(DelayPhase::EndForwards);
                continue;
            }
            return clock;
        }
        if was_first && !duration.in_first_half() && delay.enabled(DelayPhase::Halfway) {
            delay.activate(DelayPhase::Halfway);
        }
        was_first = duration.in_first_half();
    }
    panic!("cycle never ended");
}

#[test]
fn delays_extend_the_cycle() {
    let mut duration = fixed(2.0);
    let mut delay = Delay::from_config(
        &DelayConfig {
            halfway: true,
            end_forwards: true,
            halfway_duration: DurationConfig::fixed(0.5),
            end_forwards_duration: DurationConfig::fixed(1.0),
            ..Default::default()
        },
        &mut PcgSource::seeded(1),
    )
    .unwrap();

    let total = run_cycle(&mut duration, &mut delay, 0.05);
    assert!((total - 3.5).abs() < 0.11, "cycle took {}", total);
    assert!(!delay.is_active());
}

#[test]
fn without_delays_cycle_matches_duration() {
    let mut duration = fixed(2.0);
    let mut delay = Delay::new();
    let total = run_cycle(&mut duration, &mut delay, 0.05);
    assert!((total - 2.0).abs() < 0.06, "cycle took {}", total);
}

#[test]
fn shared_delay_runs_for_every_phase() {
    let mut duration = fixed(1.0);
    let mut delay = Delay::from_config(
        &DelayConfig {
            same_delay: true,
            halfway: true,
            end_forwards: true,
            single: DurationConfig::fixed(0.25),
            halfway_duration: DurationConfig::fixed(5.0),
            end_forwards_duration: DurationConfig::fixed(5.0),
            ..Default::default()
        },
        &mut PcgSource::seeded(2),
    )
    .unwrap();

    let total = run_cycle(&mut duration, &mut delay, 0.05);
    assert!((total - 1.5).abs() < 0.11, "cycle took {}", total);
}

#[test]
fn seeded_sources_replay_the_same_draws() {
    let config = DurationConfig::Random {
        initial: 3.0,
        range: 2.0,
        interval: 0.0,
        cutoff: Default::default(),
        cutoff_step: 0.1,
    };
    let mut a = Duration::from_config(&config, &mut PcgSource::seeded(42)).unwrap();
    let mut b = Duration::from_config(&config, &mut PcgSource::seeded(42)).unwrap();

    for _ in 0..20 {
        assert_eq!(a.reset(None), b.reset(None));
    }
}

#[test]
fn capped_reset_fits_the_budget() {
    let mut source = PcgSource::seeded(3);
    let ramp = DurationConfig::Ramp {
        minimum: 0.0,
        maximum: 1.0,
        over: 2.0,
        hold: 1.0,
        ramp_up: true,
        ramp_down: true,
        easing: Default::default(),
    };
    let mut durations = [
        Duration::from_config(&DurationConfig::fixed(4.0), &mut source).unwrap(),
        Duration::from_config(&ramp, &mut source).unwrap(),
    ];

    for duration in &mut durations {
        assert!((duration.reset(Some(1.5)) - 1.5).abs() < 1e-5);
        let mut ticks = 0;
        while !duration.finished() {
            duration.tick(0.1);
            ticks += 1;
        }
        assert!((14..=16).contains(&ticks), "{:?} took {} ticks", duration.kind(), ticks);
    }
}
