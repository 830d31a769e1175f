use aircraft_sim::physics::propulsion::MAX_THRUST_FRACTION;
use aircraft_sim::sim::{self, Engine, SimulationEvents};
use aircraft_sim::types::{
    AircraftParameters, Control, DivergencePolicy, SimConfig, State, AIRSPEED_FLOOR, G0,
    MAX_DEFLECTION,
};
use aircraft_sim::vehicle::{presets, ParametersBuilder};
use aircraft_sim::{evaluate_derivative, SimError};
use approx::assert_relative_eq;
use nalgebra::Vector3;

fn cruise_state() -> State {
    State::from_slice(&[85.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.1, 0.0]).unwrap()
}

fn cruise_control() -> Control {
    Control::from_slice(&[0.0, -0.1, 0.0, 0.8, 0.8]).unwrap()
}

fn run(config: SimConfig, events: SimulationEvents) -> sim::Trajectory {
    sim::integrate(&presets::rcam(), &cruise_state(), &cruise_control(), &config, &events).unwrap()
}

#[test]
fn one_second_run_has_eleven_finite_snapshots() {
    let traj = run(SimConfig::new(1.0, 0.1), SimulationEvents::none());

    assert_eq!(traj.len(), 11);
    let first = traj.first().unwrap();
    assert_eq!(first.time, 0.0);
    assert_eq!(first.state, cruise_state());
    assert!(traj.records().iter().flatten().all(|x| x.is_finite()));
    assert!(!traj.diverged());
}

#[test]
fn second_engine_failure_only_drops_its_thrust() {
    let dt = 0.1;
    let nominal = run(SimConfig::new(1.0, dt), SimulationEvents::none());
    let failed = run(
        SimConfig::new(1.0, dt),
        SimulationEvents::none().with_failed_engine(Engine::Two),
    );

    let du = nominal.snapshots()[1].state.vel.x - failed.snapshots()[1].state.vel.x;
    assert_relative_eq!(du, MAX_THRUST_FRACTION * G0 * dt, max_relative = 1e-9);

    // same initial condition
    assert_eq!(nominal.snapshots()[0].state, failed.snapshots()[0].state);
    assert!(failed.iter().all(|s| s.control.throttle2 == 0.0));
}

#[test]
fn first_engine_failure_holds_for_whole_run() {
    let traj = run(
        SimConfig::new(2.0, 0.1),
        SimulationEvents::none().with_failed_engine(Engine::One),
    );
    assert!(traj.iter().all(|s| s.control.throttle1 == 0.0));
    assert!(traj.iter().all(|s| s.control.throttle2 == 0.8));
}

#[test]
fn deflection_window_is_exact_and_inclusive() {
    // dt is a power of two so every grid time is exact
    let dt = 0.125;
    let (start, end) = (1.25, 2.5);
    let traj = run(
        SimConfig::new(3.75, dt),
        SimulationEvents::none().with_deflection(5.0, start, end),
    );

    assert_eq!(traj.len(), 31);
    let deflected = cruise_control().aileron + 5.0_f64.to_radians();
    let mut inside = 0;
    for snap in &traj {
        if (start..=end).contains(&snap.time) {
            assert_eq!(snap.control.aileron, deflected, "t = {}", snap.time);
            inside += 1;
        } else {
            assert_eq!(snap.control.aileron, cruise_control().aileron, "t = {}", snap.time);
        }
    }
    assert_eq!(inside, 11);
}

#[test]
fn deflection_window_at_one_second_steps() {
    // A very heavy airframe keeps one-second Euler steps bounded; the window logic
    // does not depend on the dynamics.
    let heavy = ParametersBuilder::starting_from(presets::rcam()).scalar("m", 1.2e9).build();
    let events = SimulationEvents::none().with_deflection(5.0, 10.0, 20.0);
    let traj = sim::integrate(
        &heavy,
        &cruise_state(),
        &cruise_control(),
        &SimConfig::new(30.0, 1.0),
        &events,
    )
    .unwrap();

    assert_eq!(traj.len(), 31);
    let nominal = cruise_control().aileron;
    for (n, snap) in traj.iter().enumerate() {
        assert_eq!(snap.time, n as f64);
        let expected = if (10..=20).contains(&n) { nominal + 5.0_f64.to_radians() } else { nominal };
        assert_eq!(snap.control.aileron, expected, "t = {}", snap.time);
    }
}

#[test]
fn time_column_is_arithmetic_from_zero() {
    let config = SimConfig::new(1.0, 0.05);
    let traj = run(config, SimulationEvents::none());
    let times = traj.times();

    assert_eq!(times[0], 0.0);
    for w in times.windows(2) {
        assert!(w[1] > w[0]);
        assert_relative_eq!(w[1] - w[0], 0.05, epsilon = 1e-12);
    }
    assert!(*times.last().unwrap() <= config.total_time);
}

#[test]
fn clamped_controls_stay_in_range() {
    let extremes = [-1e6, -3.0, -0.5, 0.0, 0.3, 2.0, 1e6];
    for &a in &extremes {
        for &t in &extremes {
            let u = Control { aileron: a, elevator: -a, rudder: a, throttle1: t, throttle2: -t }
                .clamped();
            for s in [u.aileron, u.elevator, u.rudder] {
                assert!((-MAX_DEFLECTION..=MAX_DEFLECTION).contains(&s));
            }
            for th in [u.throttle1, u.throttle2] {
                assert!((0.0..=1.0).contains(&th));
            }
        }
    }
}

#[test]
fn airspeed_floor_and_sideslip_at_rest() {
    let at_rest = State::from_slice(&[0.0; 9]).unwrap();
    assert_eq!(at_rest.airspeed(), AIRSPEED_FLOOR);
    assert_eq!(at_rest.beta(), 0.0);

    let tiny = State::new(Vector3::new(0.0, 1e-9, 0.0), Vector3::zeros(), Vector3::zeros());
    assert_eq!(tiny.airspeed(), AIRSPEED_FLOOR);
    assert!(tiny.beta().is_finite());

    let d = evaluate_derivative(&at_rest, &cruise_control(), &presets::rcam()).unwrap();
    assert!(d.is_finite());
}

#[test]
fn derivative_is_bitwise_deterministic() {
    let params = presets::rcam();
    let x = State::from_slice(&[80.0, 2.0, 4.0, 0.01, -0.02, 0.03, 0.1, 0.05, 0.2]).unwrap();
    let u = Control::from_slice(&[0.02, -0.1, 0.01, 0.6, 0.7]).unwrap();

    let a = evaluate_derivative(&x, &u, &params).unwrap().to_array();
    let b = evaluate_derivative(&x, &u, &params).unwrap().to_array();
    assert_eq!(a.map(f64::to_bits), b.map(f64::to_bits));
}

#[test]
fn empty_parameter_set_is_rejected() {
    let err = evaluate_derivative(&cruise_state(), &cruise_control(), &AircraftParameters::new())
        .unwrap_err();
    assert!(matches!(err, SimError::Validation(_)));
}

#[test]
fn divergence_flag_stays_raised_and_run_completes() {
    let mut x0 = cruise_state();
    x0.euler.y = 1.7;
    let config = SimConfig::new(1.0, 0.1);
    let traj = sim::integrate(&presets::rcam(), &x0, &cruise_control(), &config, &SimulationEvents::none())
        .unwrap();

    assert_eq!(traj.len(), 11);
    let d = traj.divergence().unwrap();
    assert_eq!(d.iteration, 2);
    assert_relative_eq!(d.time, 0.1);
    assert!(traj.diverged());
}

#[test]
fn abort_policy_surfaces_divergence() {
    let mut x0 = cruise_state();
    x0.vel.x = 310.0;
    let config = SimConfig::new(1.0, 0.1).with_policy(DivergencePolicy::AbortOnDivergence);
    let err = sim::integrate(&presets::rcam(), &x0, &cruise_control(), &config, &SimulationEvents::none())
        .unwrap_err();
    assert!(matches!(err, SimError::Diverged { iteration: 2, .. }));
}
