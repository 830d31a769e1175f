use tracing::{debug, error, info, info_span, warn};

use crate::dynamics::state::{AeroAngles, Control, DivergencePolicy, SimConfig, State};
use crate::error::{Result, SimError};
use crate::vehicle::{AircraftParameters, Airframe};
use super::event::SimulationEvents;
use super::integrator::euler_step;

// ---------------------------------------------------------------------------
// Divergence envelope
// ---------------------------------------------------------------------------

pub const MAX_AIRSPEED: f64 = 300.0; // m/s
pub const MAX_EULER: f64 = std::f64::consts::FRAC_PI_2; // rad

/// Iterations between repeated divergence warnings.
pub const WARN_EVERY: usize = 2500;

/// Relative slack, in steps, for the last grid time against `total_time`.
const END_TOLERANCE: f64 = 1e-9;

/// Whether the periodic divergence warning fires at `iteration`.
pub fn warn_due(diverged: bool, iteration: usize) -> bool {
    diverged && iteration % WARN_EVERY == 0
}

/// True once the state leaves the physically meaningful envelope.
pub fn out_of_envelope(state: &State) -> bool {
    state.vel.norm() > MAX_AIRSPEED || state.euler.iter().any(|a| a.abs() > MAX_EULER)
}

// ---------------------------------------------------------------------------
// Trajectory
// ---------------------------------------------------------------------------

/// One row of the trajectory.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapshot {
    pub time: f64,
    pub state: State,
    pub angles: AeroAngles,
    /// Effective (pre-clamp) control that produced this state.
    pub control: Control,
}

impl Snapshot {
    /// Persisted column order: `u, v, w, phi, theta, psi, alpha, beta, gamma, time`.
    pub fn record(&self) -> [f64; 10] {
        let s = &self.state;
        [
            s.vel.x, s.vel.y, s.vel.z,
            s.euler.x, s.euler.y, s.euler.z,
            self.angles.alpha, self.angles.beta, self.angles.gamma,
            self.time,
        ]
    }
}

/// Where the run first left the envelope.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Divergence {
    pub iteration: usize,
    pub time: f64,
}

/// Append-only record of a run, starting with the initial condition.
#[derive(Debug, Clone, Default)]
pub struct Trajectory {
    snapshots: Vec<Snapshot>,
    divergence: Option<Divergence>,
}

impl Trajectory {
    fn with_capacity(cap: usize) -> Self {
        Self { snapshots: Vec::with_capacity(cap), divergence: None }
    }

    fn push(&mut self, snapshot: Snapshot) {
        self.snapshots.push(snapshot);
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Snapshot> {
        self.snapshots.iter()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn first(&self) -> Option<&Snapshot> {
        self.snapshots.first()
    }

    pub fn last(&self) -> Option<&Snapshot> {
        self.snapshots.last()
    }

    pub fn diverged(&self) -> bool {
        self.divergence.is_some()
    }

    pub fn divergence(&self) -> Option<Divergence> {
        self.divergence
    }

    pub fn times(&self) -> Vec<f64> {
        self.snapshots.iter().map(|s| s.time).collect()
    }

    pub fn records(&self) -> Vec<[f64; 10]> {
        self.snapshots.iter().map(Snapshot::record).collect()
    }

    pub fn into_snapshots(self) -> Vec<Snapshot> {
        self.snapshots
    }
}

impl<'a> IntoIterator for &'a Trajectory {
    type Item = &'a Snapshot;
    type IntoIter = std::slice::Iter<'a, Snapshot>;

    fn into_iter(self) -> Self::IntoIter {
        self.snapshots.iter()
    }
}

// ---------------------------------------------------------------------------
// Full run
// ---------------------------------------------------------------------------

/// Integrate from `initial` using the parameter mapping.
pub fn integrate(
    params: &AircraftParameters,
    initial: &State,
    nominal: &Control,
    config: &SimConfig,
    events: &SimulationEvents,
) -> Result<Trajectory> {
    let airframe = params.resolve()?;
    integrate_with(&airframe, initial, nominal, config, events)
}

/// Integrate with an already resolved airframe.
///
/// Steps while `n * dt <= total_time`, allowing rounding slack of a billionth of a
/// step; the final time is then pinned to `total_time`. Any failed step aborts the run, since
/// skipping it would break the fixed time grid.
pub fn integrate_with(
    airframe: &Airframe,
    initial: &State,
    nominal: &Control,
    config: &SimConfig,
    events: &SimulationEvents,
) -> Result<Trajectory> {
    config.validate()?;
    if !initial.is_finite() {
        return Err(SimError::Validation("initial state must be finite".into()));
    }

    let span = info_span!("integrate", dt = config.dt, total_time = config.total_time);
    let _guard = span.enter();

    let end_time = config.total_time + END_TOLERANCE * config.dt;
    let expected_steps = (config.total_time / config.dt + END_TOLERANCE).floor() as usize;
    let mut trajectory = Trajectory::with_capacity((expected_steps + 1).min(200_000));
    trajectory.push(Snapshot {
        time: 0.0,
        state: *initial,
        angles: AeroAngles::from_state(initial, 0.0),
        control: events.effective_control(nominal, 0.0),
    });

    info!(
        steps = expected_steps,
        deflection = events.deflection.is_some(),
        failed_engine = ?events.failed_engine.map(u8::from),
        "starting run"
    );

    let progress_every = (expected_steps / 20).max(1);
    let mut state = *initial;
    let mut step: usize = 1;

    loop {
        let time = step as f64 * config.dt;
        if time > end_time {
            break;
        }
        let time = time.min(config.total_time);

        let control = events.effective_control(nominal, time);
        state = euler_step(&state, &control, airframe, config.dt).map_err(|e| {
            error!(step, time, error = %e, "step failed, aborting run");
            e
        })?;
        if !state.is_finite() {
            error!(step, time, "state overflowed, aborting run");
            return Err(SimError::Numerical(format!("non-finite state at t = {time:.4} s")));
        }

        // iteration counts snapshots including the initial condition
        let iteration = step + 1;

        if out_of_envelope(&state) {
            if trajectory.divergence.is_none() {
                warn!(iteration, time, airspeed = state.vel.norm(), "trajectory left the envelope");
                trajectory.divergence = Some(Divergence { iteration, time });
            }
            if config.divergence == DivergencePolicy::AbortOnDivergence {
                error!(iteration, time, "aborting on divergence");
                return Err(SimError::Diverged { iteration, time });
            }
        }

        trajectory.push(Snapshot {
            time,
            state,
            angles: AeroAngles::from_state(&state, time),
            control,
        });

        if warn_due(trajectory.diverged(), iteration) {
            warn!(iteration, time = time.round(), "simulation can not converge");
        }
        if step % progress_every == 0 {
            debug!(
                percent = (100.0 * time / config.total_time).round(),
                iteration,
                "integrating"
            );
        }

        step += 1;
    }

    info!(
        snapshots = trajectory.len(),
        diverged = trajectory.diverged(),
        "run complete"
    );
    Ok(trajectory)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::event::Engine;
    use crate::vehicle::presets;
    use nalgebra::Vector3;

    fn cruise() -> (State, Control) {
        (
            State::from_slice(&[85.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.1, 0.0]).unwrap(),
            Control::from_slice(&[0.0, -0.1, 0.0, 0.8, 0.8]).unwrap(),
        )
    }

    #[test]
    fn one_second_at_tenth_steps() {
        let (x0, u0) = cruise();
        let traj = integrate(
            &presets::rcam(),
            &x0,
            &u0,
            &SimConfig::new(1.0, 0.1),
            &SimulationEvents::none(),
        )
        .unwrap();
        assert_eq!(traj.len(), 11);
        let first = traj.first().unwrap();
        assert_eq!(first.state, x0);
        assert_eq!(first.time, 0.0);
        for snap in &traj {
            assert!(snap.state.is_finite());
            assert!(snap.record().iter().all(|x| x.is_finite()));
        }
    }

    #[test]
    fn time_grid_is_exact() {
        let (x0, u0) = cruise();
        let config = SimConfig::new(2.0, 0.25);
        let traj = integrate(&presets::rcam(), &x0, &u0, &config, &SimulationEvents::none()).unwrap();
        for (i, t) in traj.times().iter().enumerate() {
            assert_eq!(*t, i as f64 * 0.25);
        }
        assert!(traj.last().unwrap().time <= config.total_time);
    }

    #[test]
    fn partial_last_step_is_dropped() {
        let (x0, u0) = cruise();
        let traj = integrate(
            &presets::rcam(),
            &x0,
            &u0,
            &SimConfig::new(1.0, 0.3),
            &SimulationEvents::none(),
        )
        .unwrap();
        // 0, 0.3, 0.6, 0.9
        assert_eq!(traj.len(), 4);
    }

    #[test]
    fn rounded_up_last_step_is_kept() {
        let (x0, u0) = cruise();
        // 7 * 0.1 and 3 * 0.1 both round above the nominal end time
        let traj = integrate(
            &presets::rcam(),
            &x0,
            &u0,
            &SimConfig::new(0.7, 0.1),
            &SimulationEvents::none(),
        )
        .unwrap();
        assert_eq!(traj.len(), 8);
        assert_eq!(traj.last().unwrap().time, 0.7);

        let traj = integrate(
            &presets::rcam(),
            &x0,
            &u0,
            &SimConfig::new(0.3, 0.1),
            &SimulationEvents::none(),
        )
        .unwrap();
        assert_eq!(traj.times(), vec![0.0, 0.1, 0.2, 0.3]);
    }

    #[test]
    fn divergence_warning_cadence() {
        assert!(!warn_due(true, 2499));
        assert!(warn_due(true, 2500));
        assert!(!warn_due(true, 2501));
        assert!(warn_due(true, 5000));
        assert!(!warn_due(false, 2500));
    }

    #[test]
    fn iteration_counts_initial_snapshot() {
        // Already outside the envelope: the first integrated state is snapshot 2.
        let (mut x0, u0) = cruise();
        x0.euler.y = 1.7;
        let traj = integrate(
            &presets::rcam(),
            &x0,
            &u0,
            &SimConfig::new(0.3, 0.1),
            &SimulationEvents::none(),
        )
        .unwrap();
        let d = traj.divergence().unwrap();
        assert_eq!(d.iteration, 2);
        assert_eq!(traj.snapshots()[d.iteration - 1].time, d.time);
    }

    #[test]
    fn engine_failure_applied_every_step() {
        let (x0, u0) = cruise();
        let events = SimulationEvents::none().with_failed_engine(Engine::One);
        let traj = integrate(&presets::rcam(), &x0, &u0, &SimConfig::new(1.0, 0.1), &events).unwrap();
        assert!(traj.iter().all(|s| s.control.throttle1 == 0.0));
        assert!(traj.iter().all(|s| s.control.throttle2 == 0.8));
        assert_eq!(u0.throttle1, 0.8);
    }

    #[test]
    fn divergence_is_sticky_and_non_fatal() {
        let (mut x0, u0) = cruise();
        x0.vel = Vector3::new(320.0, 0.0, 0.0);
        let config = SimConfig::new(0.5, 0.1);
        let traj = integrate(&presets::rcam(), &x0, &u0, &config, &SimulationEvents::none()).unwrap();
        assert!(traj.diverged());
        assert_eq!(traj.divergence().unwrap().iteration, 2);
        assert_eq!(traj.len(), 6);
    }

    #[test]
    fn abort_policy_stops_run() {
        let (mut x0, u0) = cruise();
        x0.euler.x = 1.6;
        let config = SimConfig::new(0.5, 0.1).with_policy(DivergencePolicy::AbortOnDivergence);
        let err = integrate(&presets::rcam(), &x0, &u0, &config, &SimulationEvents::none())
            .unwrap_err();
        assert!(matches!(err, SimError::Diverged { iteration: 2, .. }));
    }

    #[test]
    fn envelope_limits() {
        let (mut s, _) = cruise();
        assert!(!out_of_envelope(&s));
        s.euler.y = -1.6;
        assert!(out_of_envelope(&s));
        s.euler.y = 0.0;
        s.vel.x = 300.5;
        assert!(out_of_envelope(&s));
    }

    #[test]
    fn invalid_config_rejected() {
        let (x0, u0) = cruise();
        let err = integrate(
            &presets::rcam(),
            &x0,
            &u0,
            &SimConfig::new(1.0, -0.1),
            &SimulationEvents::none(),
        )
        .unwrap_err();
        assert!(matches!(err, SimError::Validation(_)));
    }
}
