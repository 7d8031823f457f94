//! Joint multi-tone refinement
//!
//! Minimizes `E = Σ r[n]²` with `r[n] = pcm[n] − Σ_k A_k·sin(ω_k·n + φ_k)`
//! over all `3·dim` parameters at once. Each iteration assembles the
//! Newton system `H·δ = ∇E` in the parameter order
//! `[A_0..A_dim, ω_0..ω_dim, φ_0..φ_dim]`:
//!
//! - `∇E_a = 2·Σ r·∂r/∂θ_a`
//! - `H_ab = 2·Σ (∂r/∂θ_a · ∂r/∂θ_b)`, plus `2·Σ r·∂²r/∂θ_a∂θ_b` when both
//!   parameters belong to the same tone (the only non-zero second derivatives).
//!
//! The step is damped and every tone is folded back into canonical ranges.

use std::f64::consts::{PI, TAU};

use crate::context::GhaContext;
use crate::error::{GhaError, Result, SolveError, try_alloc};
use crate::info::{HarmonicInfo, fold_frequency, wrap_phase};
use crate::observer::ResidualObserver;
use crate::sample::Sample;
use crate::solver::solve;

/// Parameters per tone: amplitude, angular frequency, phase.
const PARAMS_PER_TONE: usize = 3;

const AMPLITUDE: usize = 0;
const FREQUENCY: usize = 1;
const PHASE: usize = 2;

/// Per-call overrides for [`GhaContext::adjust_info_with`].
pub struct AdjustOptions<'a, T> {
    effective_len: Option<usize>,
    observer: Option<&'a mut dyn ResidualObserver<T>>,
}

impl<T> Default for AdjustOptions<'_, T> {
    fn default() -> Self {
        Self {
            effective_len: None,
            observer: None,
        }
    }
}

impl<'a, T> AdjustOptions<'a, T> {
    /// Options matching [`GhaContext::adjust_info`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Only use the first `len` samples of the frame in every sum.
    pub fn effective_len(mut self, len: usize) -> Self {
        self.effective_len = Some(len);
        self
    }

    /// Report the final residual here instead of the context's observer.
    pub fn observer(mut self, observer: &'a mut dyn ResidualObserver<T>) -> Self {
        self.observer = Some(observer);
        self
    }
}

/// Working copy of one tone in `f64`.
#[derive(Debug, Clone, Copy)]
struct Tone {
    magnitude: f64,
    frequency: f64,
    phase: f64,
}

impl Tone {
    fn from_info<T: Sample>(info: &HarmonicInfo<T>) -> Self {
        Self {
            magnitude: info.magnitude.widen(),
            frequency: info.frequency.widen(),
            phase: info.phase.widen(),
        }
    }

    fn to_info<T: Sample>(self) -> HarmonicInfo<T> {
        HarmonicInfo::new(
            T::narrow(self.frequency),
            T::narrow(self.phase),
            T::narrow(self.magnitude),
        )
    }

    fn value_at(&self, n: f64) -> f64 {
        self.magnitude * (self.frequency * n + self.phase).sin()
    }

    /// Fold parameters back into canonical ranges after a Newton step.
    fn canonicalize(&mut self, max_magnitude: Option<f64>) {
        if self.magnitude < 0.0 {
            self.magnitude = -self.magnitude;
            self.phase += PI;
        }
        // Crude overflow guard: an overshooting fit restarts from half the ceiling
        if let Some(max) = max_magnitude
            && self.magnitude > max
        {
            self.magnitude = max / 2.0;
        }
        if self.frequency < 0.0 {
            self.frequency = -self.frequency;
            self.phase = TAU - self.phase;
        }
        self.frequency = fold_frequency(self.frequency);
        self.phase = wrap_phase(self.phase);
    }
}

/// Residual-weighted second derivatives of one tone, `Σ r·∂²r/∂θ_p∂θ_q`.
#[derive(Debug, Clone, Copy, Default)]
struct Curvature {
    amp_freq: f64,
    amp_phase: f64,
    freq_freq: f64,
    freq_phase: f64,
    phase_phase: f64,
}

impl Curvature {
    fn get(&self, p: usize, q: usize) -> f64 {
        match (p.min(q), p.max(q)) {
            (AMPLITUDE, FREQUENCY) => self.amp_freq,
            (AMPLITUDE, PHASE) => self.amp_phase,
            (FREQUENCY, FREQUENCY) => self.freq_freq,
            (FREQUENCY, PHASE) => self.freq_phase,
            (PHASE, PHASE) => self.phase_phase,
            // ∂²r/∂A² vanishes
            _ => 0.0,
        }
    }
}

/// Buffers for one `adjust_info` call, sized once from the tone count.
struct Workspace {
    dim: usize,
    len: usize,
    residual: Vec<f64>,
    /// First derivatives `∂r/∂θ`, one row of `len` samples per parameter.
    basis: Vec<f64>,
    curvature: Vec<Curvature>,
    system: Vec<f64>,
    delta: Vec<f64>,
}

impl Workspace {
    fn new(dim: usize, len: usize) -> Result<Self> {
        let params = PARAMS_PER_TONE * dim;
        Ok(Self {
            dim,
            len,
            residual: try_alloc("joint residual", len, 0.0)?,
            basis: try_alloc("derivative basis", params * len, 0.0)?,
            curvature: try_alloc("curvature terms", dim, Curvature::default())?,
            system: try_alloc("normal equations", params * (params + 1), 0.0)?,
            delta: try_alloc("newton step", params, 0.0)?,
        })
    }

    fn params(&self) -> usize {
        PARAMS_PER_TONE * self.dim
    }

    fn row(&self, param: usize) -> &[f64] {
        &self.basis[param * self.len..(param + 1) * self.len]
    }

    /// `r[n] = pcm[n] − Σ_k A_k·sin(ω_k·n + φ_k)` over the effective length.
    fn fill_residual<T: Sample>(&mut self, pcm: &[T], tones: &[Tone]) {
        for (n, (r, &x)) in self.residual.iter_mut().zip(pcm).enumerate() {
            let n = n as f64;
            *r = x.widen() - tones.iter().map(|t| t.value_at(n)).sum::<f64>();
        }
    }

    /// First derivatives of `r` and residual-weighted second derivatives, in closed form.
    fn fill_derivatives(&mut self, tones: &[Tone]) {
        let (dim, len) = (self.dim, self.len);
        for (k, tone) in tones.iter().enumerate() {
            let a = tone.magnitude;
            let mut curv = Curvature::default();
            for n in 0..len {
                let nf = n as f64;
                let (s, c) = (tone.frequency * nf + tone.phase).sin_cos();
                let r = self.residual[n];

                self.basis[(AMPLITUDE * dim + k) * len + n] = -s;
                self.basis[(FREQUENCY * dim + k) * len + n] = -a * nf * c;
                self.basis[(PHASE * dim + k) * len + n] = -a * c;

                curv.amp_freq += r * (-nf * c);
                curv.amp_phase += r * (-c);
                curv.freq_freq += r * (a * nf * nf * s);
                curv.freq_phase += r * (a * nf * s);
                curv.phase_phase += r * (a * s);
            }
            self.curvature[k] = curv;
        }
    }

    /// Assemble the symmetric Hessian with the gradient as the augmented column.
    fn assemble(&mut self) {
        let params = self.params();
        let cols = params + 1;
        for a in 0..params {
            let (pa, ka) = (a / self.dim, a % self.dim);
            for b in a..params {
                let (pb, kb) = (b / self.dim, b % self.dim);
                let mut h = dot(self.row(a), self.row(b));
                if ka == kb {
                    h += self.curvature[ka].get(pa, pb);
                }
                self.system[a * cols + b] = 2.0 * h;
                self.system[b * cols + a] = 2.0 * h;
            }
            self.system[a * cols + params] = 2.0 * dot(&self.residual, self.row(a));
        }
    }

    #[cfg(feature = "tracing")]
    fn energy(&self) -> f64 {
        dot(&self.residual, &self.residual)
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

impl<T: Sample> GhaContext<T> {
    /// Jointly refine `info` against the full frame `pcm`.
    ///
    /// See [`adjust_info_with`](Self::adjust_info_with).
    pub fn adjust_info(&mut self, pcm: &[T], info: &mut [HarmonicInfo<T>]) -> Result<()> {
        self.adjust_info_with(pcm, info, AdjustOptions::default())
    }

    /// Jointly refine `info` with multidimensional Newton steps.
    ///
    /// Runs `adjust_loops` damped iterations (fewer only when a convergence
    /// tolerance is configured). Updates are applied even if the residual
    /// grows. If the linear system becomes singular the call fails and
    /// `info` keeps the values of the last successful iteration.
    ///
    /// On success [`analyzed`](Self::analyzed) holds the residual of the
    /// refined tones over the whole frame, and the observer (the one in
    /// `options`, else the context's) receives it.
    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    pub fn adjust_info_with(
        &mut self,
        pcm: &[T],
        info: &mut [HarmonicInfo<T>],
        options: AdjustOptions<'_, T>,
    ) -> Result<()> {
        self.check_len(pcm.len())?;
        if info.is_empty() {
            return Err(SolveError::Empty.into());
        }
        let len = options.effective_len.unwrap_or(self.size);
        if len == 0 || len > self.size {
            return Err(GhaError::EffectiveLength {
                len,
                size: self.size,
            });
        }

        let dim = info.len();
        let damping = self.config.damping;
        let max_magnitude = self.config.max_magnitude;
        let mut tones: Vec<Tone> = info.iter().map(Tone::from_info).collect();
        let mut ws = Workspace::new(dim, len)?;

        for iteration in 0..self.config.adjust_loops {
            ws.fill_residual(&pcm[..len], &tones);
            ws.fill_derivatives(&tones);
            ws.assemble();

            #[cfg(feature = "tracing")]
            tracing::debug!(iteration, energy = ws.energy(), "joint refinement");

            let params = ws.params();
            if let Err(err) = solve(&mut ws.system, params, &mut ws.delta) {
                #[cfg(feature = "tracing")]
                tracing::warn!(iteration, %err, "joint refinement aborted");
                return Err(err.into());
            }

            let mut largest_step = 0.0f64;
            for (k, tone) in tones.iter_mut().enumerate() {
                let step_a = damping * ws.delta[AMPLITUDE * dim + k];
                let step_w = damping * ws.delta[FREQUENCY * dim + k];
                let step_p = damping * ws.delta[PHASE * dim + k];
                tone.magnitude -= step_a;
                tone.frequency -= step_w;
                tone.phase -= step_p;
                largest_step = largest_step
                    .max(step_a.abs())
                    .max(step_w.abs())
                    .max(step_p.abs());
                tone.canonicalize(max_magnitude);
            }

            for (slot, tone) in info.iter_mut().zip(&tones) {
                *slot = tone.to_info();
            }

            if self
                .config
                .convergence_tolerance
                .is_some_and(|tol| largest_step < tol)
            {
                break;
            }
        }

        for (n, (dst, &x)) in self.scratch.iter_mut().zip(pcm).enumerate() {
            let n = n as f64;
            *dst = T::narrow(x.widen() - tones.iter().map(|t| t.value_at(n)).sum::<f64>());
        }

        match options.observer {
            Some(observer) => observer.on_residual(&self.scratch),
            None => {
                if let Some(observer) = self.observer.as_mut() {
                    observer.on_residual(&self.scratch);
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tones(n: usize, parts: &[(f64, f64, f64)]) -> Vec<f64> {
        (0..n)
            .map(|i| {
                parts
                    .iter()
                    .map(|&(w, p, a)| a * (w * i as f64 + p).sin())
                    .sum()
            })
            .collect()
    }

    #[test]
    fn canonicalize_folds_negative_magnitude_into_phase() {
        let mut tone = Tone {
            magnitude: -0.5,
            frequency: 1.0,
            phase: 0.25,
        };
        tone.canonicalize(None);
        assert_eq!(tone.magnitude, 0.5);
        assert!((tone.phase - (0.25 + PI)).abs() < 1e-12);
    }

    #[test]
    fn canonicalize_reflects_negative_frequency() {
        let mut tone = Tone {
            magnitude: 0.5,
            frequency: -1.0,
            phase: 0.25,
        };
        tone.canonicalize(None);
        assert_eq!(tone.frequency, 1.0);
        assert!((tone.phase - (TAU - 0.25)).abs() < 1e-12);
    }

    #[test]
    fn canonicalize_halves_overshooting_magnitude() {
        let mut tone = Tone {
            magnitude: 3.0,
            frequency: 4.0,
            phase: 7.0,
        };
        tone.canonicalize(Some(1.0));
        assert_eq!(tone.magnitude, 0.5);
        assert!((tone.frequency - (TAU - 4.0)).abs() < 1e-12);
        assert!((tone.phase - (7.0 - TAU)).abs() < 1e-12);
    }

    #[test]
    fn hessian_is_symmetric() {
        let pcm = tones(64, &[(0.5, 0.2, 0.7), (1.2, 1.0, 0.3)]);
        let guess = [
            Tone {
                magnitude: 0.6,
                frequency: 0.51,
                phase: 0.25,
            },
            Tone {
                magnitude: 0.35,
                frequency: 1.19,
                phase: 0.9,
            },
        ];
        let mut ws = Workspace::new(2, 64).unwrap();
        ws.fill_residual(&pcm, &guess);
        ws.fill_derivatives(&guess);
        ws.assemble();
        let p = ws.params();
        for a in 0..p {
            for b in 0..p {
                assert_eq!(ws.system[a * (p + 1) + b], ws.system[b * (p + 1) + a]);
            }
        }
    }

    #[test]
    fn gradient_matches_finite_difference() {
        let pcm = tones(48, &[(0.8, 0.4, 0.5)]);
        let tone = Tone {
            magnitude: 0.45,
            frequency: 0.79,
            phase: 0.5,
        };
        let energy = |t: Tone| -> f64 {
            pcm.iter()
                .enumerate()
                .map(|(n, &x)| {
                    let r = x - t.value_at(n as f64);
                    r * r
                })
                .sum()
        };
        let mut ws = Workspace::new(1, 48).unwrap();
        ws.fill_residual(&pcm, &[tone]);
        ws.fill_derivatives(&[tone]);
        ws.assemble();

        let h = 1e-6;
        let mut up = tone;
        up.frequency += h;
        let mut down = tone;
        down.frequency -= h;
        let numeric = (energy(up) - energy(down)) / (2.0 * h);
        let analytic = ws.system[FREQUENCY * 4 + 3];
        assert!(
            (numeric - analytic).abs() < 1e-4 * analytic.abs().max(1.0),
            "numeric {numeric}, analytic {analytic}"
        );
    }

    #[test]
    fn refines_single_tone_to_machine_precision() {
        let mut ctx = GhaContext::<f64>::new(128).unwrap();
        let pcm = tones(128, &[(0.5, 1.0, 0.7)]);
        let mut info = [ctx.analyze_one(&pcm).unwrap()];
        ctx.adjust_info(&pcm, &mut info).unwrap();
        assert!((info[0].frequency - 0.5).abs() < 1e-7);
        assert!((info[0].phase - 1.0).abs() < 1e-5);
        assert!((info[0].magnitude - 0.7).abs() < 1e-7);
    }

    #[test]
    fn empty_tone_set_fails() {
        let mut ctx = GhaContext::<f32>::new(16).unwrap();
        let err = ctx.adjust_info(&[0.0; 16], &mut []).unwrap_err();
        assert!(matches!(err, GhaError::Solve(SolveError::Empty)));
    }

    #[test]
    fn effective_length_bounds_checked() {
        let mut ctx = GhaContext::<f32>::new(16).unwrap();
        let mut info = [HarmonicInfo::new(0.5, 0.0, 0.5)];
        for len in [0, 17] {
            let err = ctx
                .adjust_info_with(&[0.0; 16], &mut info, AdjustOptions::new().effective_len(len))
                .unwrap_err();
            assert!(matches!(err, GhaError::EffectiveLength { .. }));
        }
    }

    #[test]
    fn singular_system_keeps_previous_estimates() {
        // A zero-amplitude tone has no frequency or phase sensitivity.
        let mut ctx = GhaContext::<f64>::new(32).unwrap();
        let pcm = vec![0.0; 32];
        let original = HarmonicInfo::new(0.7, 0.3, 0.0);
        let mut info = [original];
        let err = ctx.adjust_info(&pcm, &mut info).unwrap_err();
        assert!(matches!(err, GhaError::Solve(SolveError::Singular { .. })));
        assert_eq!(info[0], original);
    }

    #[test]
    fn override_observer_takes_precedence() {
        use std::cell::Cell;
        use std::rc::Rc;

        let mut ctx = GhaContext::<f64>::new(64).unwrap();
        let context_calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&context_calls);
        ctx.set_residual_observer(move |_: &[f64]| counter.set(counter.get() + 1));

        let pcm = tones(64, &[(0.9, 0.3, 0.5)]);
        let mut info = [ctx.analyze_one(&pcm).unwrap()];
        let mut override_calls = 0;
        let mut local = |r: &[f64]| {
            assert_eq!(r.len(), 64);
            override_calls += 1;
        };
        ctx.adjust_info_with(&pcm, &mut info, AdjustOptions::new().observer(&mut local))
            .unwrap();
        assert_eq!(override_calls, 1);
        assert_eq!(context_calls.get(), 0);
    }
}
