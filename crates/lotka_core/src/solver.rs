use crate::error::IntegrationFailure;
use crate::traits::{Scalar, VectorField};
use num_traits::Float;
use serde::{Deserialize, Serialize};

/// Tolerance and budget knobs for the adaptive stepper.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SolverSettings {
    /// Relative tolerance on the local error.
    pub rtol: f64,
    /// Absolute tolerance on the local error.
    pub atol: f64,
    /// First attempted step size; defaults to 1% of the span.
    pub initial_step: Option<f64>,
    /// Upper bound on the step size.
    pub max_step: Option<f64>,
    /// Attempted steps (accepted + rejected) before giving up.
    pub max_steps: usize,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            rtol: 1e-6,
            atol: 1e-9,
            initial_step: None,
            max_step: None,
            max_steps: 100_000,
        }
    }
}

/// Accepted integration nodes: time, state, and derivative at each node,
/// states and derivatives flattened row-major. The stored derivative is the
/// FSAL stage the solver already evaluated, so dense evaluation between
/// nodes costs no extra right-hand-side calls.
#[derive(Debug, Clone, Serialize)]
pub struct SolutionPath<T: Scalar> {
    dim: usize,
    times: Vec<T>,
    states: Vec<T>,
    derivs: Vec<T>,
}

impl<T: Scalar> SolutionPath<T> {
    fn new(dim: usize) -> Self {
        Self {
            dim,
            times: Vec::new(),
            states: Vec::new(),
            derivs: Vec::new(),
        }
    }

    fn push_node(&mut self, t: T, state: &[T], deriv: &[T]) {
        self.times.push(t);
        self.states.extend_from_slice(state);
        self.derivs.extend_from_slice(deriv);
    }

    pub fn dimension(&self) -> usize {
        self.dim
    }

    pub fn node_count(&self) -> usize {
        self.times.len()
    }

    pub fn node_times(&self) -> &[T] {
        &self.times
    }

    fn node_state(&self, idx: usize) -> &[T] {
        &self.states[idx * self.dim..(idx + 1) * self.dim]
    }

    fn node_deriv(&self, idx: usize) -> &[T] {
        &self.derivs[idx * self.dim..(idx + 1) * self.dim]
    }

    /// Evaluates the solution at `t` by cubic Hermite interpolation on the
    /// bracketing accepted step. Times at or beyond the covered span clamp
    /// to the boundary nodes.
    pub fn sample_into(&self, t: T, out: &mut [T]) {
        let first = self.times[0];
        let last = self.times[self.times.len() - 1];
        if t <= first {
            out.copy_from_slice(self.node_state(0));
            return;
        }
        if t >= last {
            out.copy_from_slice(self.node_state(self.times.len() - 1));
            return;
        }

        // First node with time >= t; the segment starts one before it.
        let upper = self.times.partition_point(|&tk| tk < t);
        let seg = upper - 1;

        let t0 = self.times[seg];
        let t1 = self.times[seg + 1];
        let h = t1 - t0;
        let theta = (t - t0) / h;
        let theta2 = theta * theta;
        let theta3 = theta2 * theta;

        let one = T::one();
        let two = T::from_f64(2.0).unwrap();
        let three = T::from_f64(3.0).unwrap();

        let h00 = two * theta3 - three * theta2 + one;
        let h10 = theta3 - two * theta2 + theta;
        let h01 = three * theta2 - two * theta3;
        let h11 = theta3 - theta2;

        let y0 = self.node_state(seg);
        let y1 = self.node_state(seg + 1);
        let f0 = self.node_deriv(seg);
        let f1 = self.node_deriv(seg + 1);
        for i in 0..self.dim {
            out[i] = h00 * y0[i] + h01 * y1[i] + h * (h10 * f0[i] + h11 * f1[i]);
        }
    }

    pub fn sample(&self, t: T) -> Vec<T> {
        let mut out = vec![T::zero(); self.dim];
        self.sample_into(t, &mut out);
        out
    }
}

/// Dormand-Prince 5(4) adaptive stepper with FSAL.
///
/// The embedded 4th-order solution supplies the local error estimate; the
/// step controller shrinks or grows the step to hold the weighted RMS error
/// at or below one.
pub struct Dopri5<T: Scalar> {
    k1: Vec<T>,
    k2: Vec<T>,
    k3: Vec<T>,
    k4: Vec<T>,
    k5: Vec<T>,
    k6: Vec<T>,
    k7: Vec<T>,
    tmp: Vec<T>,
    y_next: Vec<T>,
    settings: SolverSettings,
}

impl<T: Scalar> Dopri5<T> {
    pub fn new(dim: usize, settings: SolverSettings) -> Self {
        let z = T::zero();
        Self {
            k1: vec![z; dim],
            k2: vec![z; dim],
            k3: vec![z; dim],
            k4: vec![z; dim],
            k5: vec![z; dim],
            k6: vec![z; dim],
            k7: vec![z; dim],
            tmp: vec![z; dim],
            y_next: vec![z; dim],
            settings,
        }
    }

    /// Integrates `system` from `(t0, y0)` to `t_end`, recording every
    /// accepted node. `t_end` must lie strictly after `t0`.
    pub fn solve(
        &mut self,
        system: &impl VectorField<T>,
        t0: T,
        t_end: T,
        y0: &[T],
    ) -> Result<SolutionPath<T>, IntegrationFailure> {
        let dim = y0.len();
        debug_assert_eq!(dim, system.dimension());

        let fl = |v: f64| T::from_f64(v).unwrap();
        let one = T::one();

        // Dormand-Prince tableau.
        let c2 = fl(1.0 / 5.0);
        let c3 = fl(3.0 / 10.0);
        let c4 = fl(4.0 / 5.0);
        let c5 = fl(8.0 / 9.0);

        let a21 = fl(1.0 / 5.0);

        let a31 = fl(3.0 / 40.0);
        let a32 = fl(9.0 / 40.0);

        let a41 = fl(44.0 / 45.0);
        let a42 = fl(-56.0 / 15.0);
        let a43 = fl(32.0 / 9.0);

        let a51 = fl(19372.0 / 6561.0);
        let a52 = fl(-25360.0 / 2187.0);
        let a53 = fl(64448.0 / 6561.0);
        let a54 = fl(-212.0 / 729.0);

        let a61 = fl(9017.0 / 3168.0);
        let a62 = fl(-355.0 / 33.0);
        let a63 = fl(46732.0 / 5247.0);
        let a64 = fl(49.0 / 176.0);
        let a65 = fl(-5103.0 / 18656.0);

        // 5th-order weights (doubling as the a7 row: FSAL).
        let b1 = fl(35.0 / 384.0);
        let b3 = fl(500.0 / 1113.0);
        let b4 = fl(125.0 / 192.0);
        let b5 = fl(-2187.0 / 6784.0);
        let b6 = fl(11.0 / 84.0);

        // Difference between 5th- and embedded 4th-order weights.
        let e1 = fl(71.0 / 57600.0);
        let e3 = fl(-71.0 / 16695.0);
        let e4 = fl(71.0 / 1920.0);
        let e5 = fl(-17253.0 / 339200.0);
        let e6 = fl(22.0 / 525.0);
        let e7 = fl(-1.0 / 40.0);

        let rtol = fl(self.settings.rtol);
        let atol = fl(self.settings.atol);
        let span = t_end - t0;
        let max_step = self.settings.max_step.map(fl).unwrap_or(span);
        let mut h = self
            .settings
            .initial_step
            .map(fl)
            .unwrap_or(span * fl(0.01))
            .min(max_step)
            .min(span);

        let mut t = t0;
        let mut y = y0.to_vec();
        let mut path = SolutionPath::new(dim);

        system.eval(t, &y, &mut self.k1);
        path.push_node(t, &y, &self.k1);

        let mut attempts = 0usize;
        loop {
            // The remaining span below this is floating-point residue from
            // the final clipped step, not a step left to take.
            let tiny = T::epsilon() * Float::max(t_end.abs(), one) * fl(4.0);
            if t_end - t <= tiny {
                break;
            }
            if attempts >= self.settings.max_steps {
                return Err(IntegrationFailure::StepBudgetExhausted {
                    max_steps: self.settings.max_steps,
                    t: t.to_f64().unwrap_or(f64::NAN),
                });
            }
            let h_floor = T::epsilon() * Float::max(t.abs(), one) * fl(16.0);
            if !(h > h_floor) {
                return Err(IntegrationFailure::StepSizeUnderflow {
                    t: t.to_f64().unwrap_or(f64::NAN),
                    h: h.to_f64().unwrap_or(f64::NAN),
                });
            }
            h = h.min(t_end - t);
            attempts += 1;

            // Stages 2..6.
            for i in 0..dim {
                self.tmp[i] = y[i] + h * (a21 * self.k1[i]);
            }
            system.eval(t + c2 * h, &self.tmp, &mut self.k2);

            for i in 0..dim {
                self.tmp[i] = y[i] + h * (a31 * self.k1[i] + a32 * self.k2[i]);
            }
            system.eval(t + c3 * h, &self.tmp, &mut self.k3);

            for i in 0..dim {
                self.tmp[i] =
                    y[i] + h * (a41 * self.k1[i] + a42 * self.k2[i] + a43 * self.k3[i]);
            }
            system.eval(t + c4 * h, &self.tmp, &mut self.k4);

            for i in 0..dim {
                self.tmp[i] = y[i]
                    + h * (a51 * self.k1[i]
                        + a52 * self.k2[i]
                        + a53 * self.k3[i]
                        + a54 * self.k4[i]);
            }
            system.eval(t + c5 * h, &self.tmp, &mut self.k5);

            for i in 0..dim {
                self.tmp[i] = y[i]
                    + h * (a61 * self.k1[i]
                        + a62 * self.k2[i]
                        + a63 * self.k3[i]
                        + a64 * self.k4[i]
                        + a65 * self.k5[i]);
            }
            system.eval(t + h, &self.tmp, &mut self.k6);

            // 5th-order solution; its weight row is the a7 row, so k7
            // evaluated here is also the k1 of the next step (FSAL).
            for i in 0..dim {
                self.y_next[i] = y[i]
                    + h * (b1 * self.k1[i]
                        + b3 * self.k3[i]
                        + b4 * self.k4[i]
                        + b5 * self.k5[i]
                        + b6 * self.k6[i]);
            }
            system.eval(t + h, &self.y_next, &mut self.k7);

            // Weighted RMS of the embedded error estimate.
            let mut err_sq = T::zero();
            for i in 0..dim {
                let err_i = h
                    * (e1 * self.k1[i]
                        + e3 * self.k3[i]
                        + e4 * self.k4[i]
                        + e5 * self.k5[i]
                        + e6 * self.k6[i]
                        + e7 * self.k7[i]);
                let scale = atol + rtol * Float::max(y[i].abs(), self.y_next[i].abs());
                let ratio = err_i / scale;
                err_sq = err_sq + ratio * ratio;
            }
            let err_norm = (err_sq / fl(dim as f64)).sqrt();

            if err_norm <= one {
                t = t + h;
                y.copy_from_slice(&self.y_next);
                path.push_node(t, &y, &self.k7);
                self.k1.copy_from_slice(&self.k7);
            }

            // 0.9 * err^(-1/5), growth and shrink both limited. IEEE max
            // turns a NaN error (overflowed state) into the maximum shrink.
            let factor = Float::min(
                Float::max(fl(0.9) * err_norm.powf(fl(-0.2)), fl(0.2)),
                fl(5.0),
            );
            h = (h * factor).min(max_step);
        }

        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::{Dopri5, SolverSettings};
    use crate::error::IntegrationFailure;
    use crate::traits::VectorField;

    struct Decay {
        rate: f64,
    }

    impl VectorField<f64> for Decay {
        fn dimension(&self) -> usize {
            1
        }

        fn eval(&self, _t: f64, state: &[f64], out: &mut [f64]) {
            out[0] = -self.rate * state[0];
        }
    }

    struct Quadratic;

    impl VectorField<f64> for Quadratic {
        fn dimension(&self) -> usize {
            1
        }

        fn eval(&self, _t: f64, state: &[f64], out: &mut [f64]) {
            out[0] = state[0] * state[0];
        }
    }

    struct Oscillator;

    impl VectorField<f64> for Oscillator {
        fn dimension(&self) -> usize {
            2
        }

        fn eval(&self, _t: f64, state: &[f64], out: &mut [f64]) {
            out[0] = state[1];
            out[1] = -state[0];
        }
    }

    #[test]
    fn exponential_decay_matches_closed_form() {
        let mut solver = Dopri5::new(1, SolverSettings::default());
        let path = solver
            .solve(&Decay { rate: 1.0 }, 0.0, 5.0, &[1.0])
            .expect("decay should integrate");
        for &t in &[0.0, 0.5, 1.7, 3.3, 5.0] {
            let value = path.sample(t)[0];
            assert!(
                (value - (-t).exp()).abs() < 1e-5,
                "at t = {t}: {value} vs {}",
                (-t).exp()
            );
        }
    }

    #[test]
    fn node_times_are_strictly_increasing_and_cover_the_span() {
        let mut solver = Dopri5::new(2, SolverSettings::default());
        let path = solver
            .solve(&Oscillator, 0.0, 10.0, &[1.0, 0.0])
            .expect("oscillator should integrate");
        let times = path.node_times();
        assert_eq!(times[0], 0.0);
        assert!((times[times.len() - 1] - 10.0).abs() < 1e-9);
        for pair in times.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn oscillator_holds_its_amplitude() {
        let mut solver = Dopri5::new(2, SolverSettings::default());
        let path = solver
            .solve(&Oscillator, 0.0, 20.0, &[1.0, 0.0])
            .expect("oscillator should integrate");
        let end = path.sample(20.0);
        assert!((end[0] - 20.0_f64.cos()).abs() < 1e-4);
        assert!((end[1] + 20.0_f64.sin()).abs() < 1e-4);
    }

    #[test]
    fn dense_sampling_clamps_outside_the_span() {
        let mut solver = Dopri5::new(1, SolverSettings::default());
        let path = solver
            .solve(&Decay { rate: 1.0 }, 0.0, 1.0, &[2.0])
            .expect("decay should integrate");
        assert_eq!(path.sample(-1.0)[0], 2.0);
        let end = path.sample(1.0)[0];
        assert_eq!(path.sample(5.0)[0], end);
    }

    #[test]
    fn blow_up_reports_integration_failure() {
        let settings = SolverSettings {
            max_steps: 10_000,
            ..SolverSettings::default()
        };
        let mut solver = Dopri5::new(1, settings);
        // dy/dt = y^2 from y(0) = 1 blows up at t = 1; asking for t = 2
        // cannot succeed.
        let result = solver.solve(&Quadratic, 0.0, 2.0, &[1.0]);
        assert!(matches!(
            result,
            Err(IntegrationFailure::StepBudgetExhausted { .. })
                | Err(IntegrationFailure::StepSizeUnderflow { .. })
        ));
    }

    #[test]
    fn tighter_tolerance_takes_more_steps() {
        let loose = SolverSettings {
            rtol: 1e-3,
            atol: 1e-6,
            ..SolverSettings::default()
        };
        let tight = SolverSettings {
            rtol: 1e-9,
            atol: 1e-12,
            ..SolverSettings::default()
        };
        let path_loose = Dopri5::new(2, loose)
            .solve(&Oscillator, 0.0, 10.0, &[1.0, 0.0])
            .expect("loose run should integrate");
        let path_tight = Dopri5::new(2, tight)
            .solve(&Oscillator, 0.0, 10.0, &[1.0, 0.0])
            .expect("tight run should integrate");
        assert!(path_tight.node_count() > path_loose.node_count());
    }
}
