/*
 * // Copyright (c) Radzivon Bartoshyk 6/2026. All rights reserved.
 * //
 * // Redistribution and use in source and binary forms, with or without modification,
 * // are permitted provided that the following conditions are met:
 * //
 * // 1.  Redistributions of source code must retain the above copyright notice, this
 * // list of conditions and the following disclaimer.
 * //
 * // 2.  Redistributions in binary form must reproduce the above copyright notice,
 * // this list of conditions and the following disclaimer in the documentation
 * // and/or other materials provided with the distribution.
 * //
 * // 3.  Neither the name of the copyright holder nor the names of its
 * // contributors may be used to endorse or promote products derived from
 * // this software without specific prior written permission.
 * //
 * // THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS AND CONTRIBUTORS "AS IS"
 * // AND ANY EXPRESS OR IMPLIED WARRANTIES, INCLUDING, BUT NOT LIMITED TO, THE
 * // IMPLIED WARRANTIES OF MERCHANTABILITY AND FITNESS FOR A PARTICULAR PURPOSE ARE
 * // DISCLAIMED. IN NO EVENT SHALL THE COPYRIGHT HOLDER OR CONTRIBUTORS BE LIABLE
 * // FOR ANY DIRECT, INDIRECT, INCIDENTAL, SPECIAL, EXEMPLARY, OR CONSEQUENTIAL
 * // DAMAGES (INCLUDING, BUT NOT LIMITED TO, PROCUREMENT OF SUBSTITUTE GOODS OR
 * // SERVICES; LOSS OF USE, DATA, OR PROFITS; OR BUSINESS INTERRUPTION) HOWEVER
 * // CAUSED AND ON ANY THEORY OF LIABILITY, WHETHER IN CONTRACT, STRICT LIABILITY,
 * // OR TORT (INCLUDING NEGLIGENCE OR OTHERWISE) ARISING IN ANY WAY OUT OF THE USE
 * // OF THIS SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF SUCH DAMAGE.
 */
use crate::bsp::World;
use crate::dft::Dft;
use crate::err::try_vec;
use crate::traits::FftTrigonometry;
use crate::ufft::{twiddle, ufft, ufft_init};
use crate::util::{bit_reverse_indices, permute_inplace};
use crate::{FftDirection, FftExecutor, WeftError};
use num_complex::Complex;
use num_traits::{AsPrimitive, Float};

/// Plan construction for an accelerated local-transform backend. A plan is
/// an ordered in-place FFT over `howmany` consecutive blocks of `length`.
/// Construction is not required to be thread safe; `BspFft::bind_kernel`
/// serializes it across ranks.
pub trait KernelPlanner<T> {
    fn plan(
        &mut self,
        length: usize,
        howmany: usize,
        direction: FftDirection,
    ) -> Result<Box<dyn FftExecutor<T> + Send + Sync>, WeftError>;
}

/// Plans the crate's naive reference kernels. Stands in for an external
/// accelerated backend and exercises the same binding path.
pub struct ReferenceDftPlanner;

impl<T> KernelPlanner<T> for ReferenceDftPlanner
where
    T: Default + Float + FftTrigonometry + Send + Sync + 'static,
    f64: AsPrimitive<T>,
{
    fn plan(
        &mut self,
        length: usize,
        howmany: usize,
        direction: FftDirection,
    ) -> Result<Box<dyn FftExecutor<T> + Send + Sync>, WeftError> {
        // A Dft executor already runs over every `length` chunk of the
        // buffer it is handed, which is exactly the `howmany` layout.
        let _ = howmany;
        Dft::new(length, direction).map(|d| Box::new(d) as Box<dyn FftExecutor<T> + Send + Sync>)
    }
}

struct BoundKernel<T> {
    consec_fwd: Box<dyn FftExecutor<T> + Send + Sync>,
    consec_bwd: Box<dyn FftExecutor<T> + Send + Sync>,
    long_fwd: Box<dyn FftExecutor<T> + Send + Sync>,
    long_bwd: Box<dyn FftExecutor<T> + Send + Sync>,
    rho_k1: Vec<usize>,
    // Address of the buffer the plans were built against.
    buffer: usize,
}

impl<T> BoundKernel<T> {
    fn consec(&self, direction: FftDirection) -> &(dyn FftExecutor<T> + Send + Sync) {
        match direction {
            FftDirection::Forward => self.consec_fwd.as_ref(),
            FftDirection::Inverse => self.consec_bwd.as_ref(),
        }
    }

    fn long(&self, direction: FftDirection) -> &(dyn FftExecutor<T> + Send + Sync) {
        match direction {
            FftDirection::Forward => self.long_fwd.as_ref(),
            FftDirection::Inverse => self.long_bwd.as_ref(),
        }
    }
}

/// Distributed FFT over `p` cooperating ranks in cyclic distribution: on
/// rank `s` local element `j` is global element `j * p + s`, and the output
/// comes back in the same layout. `n` and `p` must be powers of two with
/// `p <= n`, and every rank must construct the engine with the same `n`.
///
/// All weight and permutation tables are owned by the engine instance and
/// rebuilt by `reinitialize`; the local buffer stays with the caller.
pub struct BspFft<T> {
    n: usize,
    p: usize,
    s: usize,
    k1: usize,
    w0: Vec<Complex<T>>,
    w: Vec<Complex<T>>,
    tw: Vec<Complex<T>>,
    rho_np: Vec<usize>,
    rho_p: Vec<usize>,
    kernel: Option<BoundKernel<T>>,
}

impl<T> BspFft<T>
where
    T: Default + Float + FftTrigonometry + 'static,
    f64: AsPrimitive<T>,
{
    pub fn new<W: World<Complex<T>>>(world: &W, n: usize) -> Result<BspFft<T>, WeftError> {
        let mut engine = BspFft {
            n: 0,
            p: world.processors(),
            s: world.rank(),
            k1: 0,
            w0: Vec::new(),
            w: Vec::new(),
            tw: Vec::new(),
            rho_np: Vec::new(),
            rho_p: Vec::new(),
            kernel: None,
        };
        engine.init(n)?;
        Ok(engine)
    }

    /// Rebuilds every table for a new transform length and drops any bound
    /// accelerated kernel.
    pub fn reinitialize(&mut self, n: usize) -> Result<(), WeftError> {
        self.kernel = None;
        self.init(n)
    }

    pub fn length(&self) -> usize {
        self.n
    }

    /// Local share of the transform on every rank.
    pub fn local_length(&self) -> usize {
        self.n / self.p
    }

    fn init(&mut self, n: usize) -> Result<(), WeftError> {
        if !n.is_power_of_two() {
            return Err(WeftError::TransformLengthNotPowerOfTwo(n));
        }
        if !self.p.is_power_of_two() {
            return Err(WeftError::ProcessorCountNotPowerOfTwo(self.p));
        }
        if self.p > n {
            return Err(WeftError::ProcessorCountExceedsLength(self.p, n));
        }
        let np = n / self.p;
        self.n = n;

        // Largest butterfly size of the first superstep: the smallest power
        // of np reaching p. One element per processor cannot grow the
        // cycle, hence the explicit guard.
        self.k1 = if np == 1 {
            n
        } else {
            let mut c = 1;
            while c < self.p {
                c *= np;
            }
            n / c
        };

        self.rho_np = bit_reverse_indices(np)?;
        self.rho_p = bit_reverse_indices(self.p)?;

        self.w0 = ufft_init(self.k1)?;
        self.w = ufft_init(np)?;

        let cycles: Vec<usize> = self.rounds().collect();
        let mut tw = try_vec![Complex::<T>::default(); cycles.len() * np];
        for (round, &c) in cycles.iter().enumerate() {
            // tw[j] = exp(-2 pi i rho_np(j) alpha / np), alpha = (s mod c) / c
            let alpha = (self.s % c) as f64 / c as f64;
            let slice = &mut tw[round * np..(round + 1) * np];
            for (j, dst) in slice.iter_mut().enumerate() {
                let angle: T = (-2.0 * alpha * self.rho_np[j] as f64 / np as f64).as_();
                let (v_sin, v_cos) = angle.sincos_pi();
                *dst = Complex {
                    re: v_cos,
                    im: v_sin,
                };
            }
        }
        self.tw = tw;

        log::debug!(
            "bspfft tables ready: n={} p={} k1={} rounds={}",
            n,
            self.p,
            self.k1,
            cycles.len()
        );
        Ok(())
    }

    /// Redistribution cycles of one transform: `c = k1, k1*np, ...` while
    /// `c <= p`. A single round when `np == 1`, where the cycle can no
    /// longer grow; no rounds at all on a lone processor.
    fn rounds(&self) -> impl Iterator<Item = usize> {
        let np = self.n / self.p;
        let p = self.p;
        let mut c = self.k1;
        std::iter::from_fn(move || {
            if c > p {
                return None;
            }
            let current = c;
            c = if np == 1 { p + 1 } else { c * np };
            Some(current)
        })
    }

    /// Builds the four local plans (first-stage blocks and full local
    /// length, both directions) through `planner`, one rank at a time with
    /// a barrier in between, and binds them to `xs`. Plan construction is
    /// not assumed thread safe, so the loop serializes it across the world.
    pub fn bind_kernel<W, P>(
        &mut self,
        world: &mut W,
        planner: &mut P,
        xs: &mut [Complex<T>],
    ) -> Result<(), WeftError>
    where
        W: World<Complex<T>>,
        P: KernelPlanner<T>,
    {
        let mut built: Result<BoundKernel<T>, WeftError> = Err(WeftError::KernelNotBound);
        for i in 0..self.p {
            if i == self.s {
                built = self.build_plans(planner, xs);
            }
            world.sync(xs)?;
        }

        if !world.vote(built.is_ok())? {
            return built.map(|_| ()).and(Err(WeftError::PeerFailure));
        }
        self.kernel = Some(built?);
        log::debug!("bspfft kernel bound: n={} k1={}", self.n, self.k1);
        Ok(())
    }

    fn build_plans<P: KernelPlanner<T>>(
        &self,
        planner: &mut P,
        xs: &[Complex<T>],
    ) -> Result<BoundKernel<T>, WeftError> {
        let np = self.n / self.p;
        if xs.len() != np {
            return Err(WeftError::InvalidInPlaceLength(np, xs.len()));
        }
        if self.k1 > np {
            return Err(WeftError::KernelUnsupported(np, self.k1));
        }
        Ok(BoundKernel {
            consec_fwd: planner.plan(self.k1, np / self.k1, FftDirection::Forward)?,
            consec_bwd: planner.plan(self.k1, np / self.k1, FftDirection::Inverse)?,
            long_fwd: planner.plan(np, 1, FftDirection::Forward)?,
            long_bwd: planner.plan(np, 1, FftDirection::Inverse)?,
            rho_k1: bit_reverse_indices(self.k1)?,
            buffer: xs.as_ptr() as usize,
        })
    }

    /// Forward transform of the cyclically distributed vector:
    /// `y[k] = sum_j exp(-2 pi i k j / n) x[j]`.
    pub fn forward<W: World<Complex<T>>>(
        &self,
        world: &mut W,
        xs: &mut [Complex<T>],
    ) -> Result<(), WeftError> {
        self.transform(world, xs, FftDirection::Forward)
    }

    /// Inverse transform, scaled by `1/n`:
    /// `y[k] = (1/n) sum_j exp(+2 pi i k j / n) x[j]`.
    pub fn inverse<W: World<Complex<T>>>(
        &self,
        world: &mut W,
        xs: &mut [Complex<T>],
    ) -> Result<(), WeftError> {
        self.transform(world, xs, FftDirection::Inverse)
    }

    fn check_local(&self, xs: &[Complex<T>]) -> Result<(), WeftError> {
        let np = self.n / self.p;
        if xs.len() != np {
            return Err(WeftError::InvalidInPlaceLength(np, xs.len()));
        }
        if let Some(kernel) = &self.kernel {
            if kernel.buffer != xs.as_ptr() as usize {
                return Err(WeftError::KernelBufferMismatch);
            }
        }
        Ok(())
    }

    fn transform<W: World<Complex<T>>>(
        &self,
        world: &mut W,
        xs: &mut [Complex<T>],
        direction: FftDirection,
    ) -> Result<(), WeftError> {
        let np = self.n / self.p;

        // Agree on the configuration before the first data superstep, so a
        // rejecting rank cannot leave the others stranded at a barrier.
        let verdict = self.check_local(xs);
        if !world.vote(verdict.is_ok())? {
            return verdict.and(Err(WeftError::PeerFailure));
        }

        permute_inplace(xs, &self.rho_np);

        match &self.kernel {
            Some(kernel) => {
                // An ordered kernel reproduces the unordered butterflies
                // once each block is bit-reversed first.
                for block in xs.chunks_exact_mut(self.k1) {
                    permute_inplace(block, &kernel.rho_k1);
                }
                kernel.consec(direction).execute(xs)?;
            }
            None => {
                for block in xs.chunks_exact_mut(self.k1) {
                    ufft(block, &self.w0, direction);
                }
            }
        }

        let mut c0 = 1usize;
        let mut rev = true;
        for (round, c) in self.rounds().enumerate() {
            self.redistribute(world, xs, c0, c, rev)?;
            rev = false;
            c0 = c;

            twiddle(xs, &self.tw[round * np..(round + 1) * np], direction);

            match &self.kernel {
                Some(kernel) => {
                    permute_inplace(xs, &self.rho_np);
                    kernel.long(direction).execute(xs)?;
                }
                None => ufft(xs, &self.w, direction),
            }
        }

        if direction == FftDirection::Inverse {
            let ninv: T = (1.0 / self.n as f64).as_();
            for x in xs.iter_mut() {
                *x = *x * ninv;
            }
        }
        Ok(())
    }

    /// Redistributes `xs` from group-cyclic cycle `c0` to cycle `c1`, where
    /// `c0 | c1` and `c1 <= p`. With `reversed` the processor numbering is
    /// taken bit-reversed, which matches the layout the first butterfly
    /// stage leaves behind. Costs exactly one superstep on every rank.
    fn redistribute<W: World<Complex<T>>>(
        &self,
        world: &mut W,
        xs: &mut [Complex<T>],
        c0: usize,
        c1: usize,
        reversed: bool,
    ) -> Result<(), WeftError> {
        let np = self.n / self.p;
        let ratio = c1 / c0;
        let size = (np / ratio).max(1);
        let npackets = np / size;

        let (j0, j2) = if reversed {
            (self.rho_p[self.s] % c0, self.rho_p[self.s] / c0)
        } else {
            (self.s % c0, self.s / c0)
        };

        let mut tmp = try_vec![Complex::<T>::default(); size];
        for j in 0..npackets {
            for (r, dst) in tmp.iter_mut().enumerate() {
                *dst = xs[j + r * ratio];
            }
            let jglob = j2 * c0 * np + j * c0 + j0;
            let destproc = (jglob / (c1 * np)) * c1 + jglob % c1;
            let destindex = (jglob % (c1 * np)) / c1;
            world.put(destproc, destindex, &tmp)?;
        }
        world.sync(xs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bsp::ThreadWorld;
    use rand::Rng;

    fn random_local(np: usize) -> Vec<Complex<f64>> {
        let mut xs = vec![Complex::<f64>::default(); np];
        for z in xs.iter_mut() {
            *z = Complex {
                re: rand::rng().random(),
                im: rand::rng().random(),
            };
        }
        xs
    }

    #[test]
    fn test_roundtrip_across_world_shapes() {
        for (n, p) in [
            (2usize, 1usize),
            (8, 1),
            (4, 2),
            (8, 2),
            (16, 2),
            (8, 4),
            (64, 4),
            (32, 8),
            (256, 4),
        ] {
            let outcome = ThreadWorld::<Complex<f64>>::spawn(p, |world| {
                let engine = BspFft::<f64>::new(world, n).unwrap();
                let mut xs = random_local(n / p);
                let src = xs.to_vec();

                engine.forward(world, &mut xs).unwrap();
                engine.inverse(world, &mut xs).unwrap();

                let mut max_error = 0f64;
                for (a, b) in xs.iter().zip(src.iter()) {
                    max_error = max_error.max((a - b).norm());
                }
                max_error
            });
            for (s, max_error) in outcome.into_iter().enumerate() {
                assert!(
                    max_error < 1e-9,
                    "roundtrip error {max_error} on rank {s} for n={n} p={p}"
                );
            }
        }
    }

    #[test]
    fn test_forward_known_values_two_ranks() {
        // x[j] = j for n = 8; the transform comes back cyclically
        // distributed, X[j * 2 + s] at local index j.
        let sqrt2 = std::f64::consts::SQRT_2;
        let expected = [
            Complex::new(28.0, 0.0),
            Complex::new(-4.0, 4.0 + 4.0 * sqrt2),
            Complex::new(-4.0, 4.0),
            Complex::new(-4.0, 4.0 * sqrt2 - 4.0),
            Complex::new(-4.0, 0.0),
            Complex::new(-4.0, 4.0 - 4.0 * sqrt2),
            Complex::new(-4.0, -4.0),
            Complex::new(-4.0, -4.0 - 4.0 * sqrt2),
        ];

        let outcome = ThreadWorld::<Complex<f64>>::spawn(2, |world| {
            let s = world.rank();
            let engine = BspFft::<f64>::new(world, 8).unwrap();
            let mut xs: Vec<Complex<f64>> = (0..4)
                .map(|j| Complex::new((j * 2 + s) as f64, 0.0))
                .collect();
            engine.forward(world, &mut xs).unwrap();
            xs
        });

        for (s, xs) in outcome.iter().enumerate() {
            for (j, a) in xs.iter().enumerate() {
                let b = expected[j * 2 + s];
                assert!(
                    (a.re - b.re).abs() < 1e-9 && (a.im - b.im).abs() < 1e-9,
                    "rank {s} local {j}: got {a}, expected {b}"
                );
            }
        }
    }

    #[test]
    fn test_single_processor_matches_reference() {
        use crate::dft::Dft;

        let outcome = ThreadWorld::<Complex<f64>>::spawn(1, |world| {
            let engine = BspFft::<f64>::new(world, 8).unwrap();
            let mut xs = random_local(8);
            let mut expected = xs.to_vec();

            engine.forward(world, &mut xs).unwrap();
            let dft = Dft::new(8, FftDirection::Forward).unwrap();
            dft.execute(&mut expected).unwrap();

            xs.iter()
                .zip(expected.iter())
                .map(|(a, b)| (a - b).norm())
                .fold(0f64, f64::max)
        });
        assert!(outcome[0] < 1e-9, "distributed and reference outputs differ");
    }

    #[test]
    fn test_inverse_restores_scaling_at_zero() {
        let outcome = ThreadWorld::<Complex<f64>>::spawn(4, |world| {
            let engine = BspFft::<f64>::new(world, 64).unwrap();
            let mut xs = random_local(16);
            let first = xs[0];
            engine.forward(world, &mut xs).unwrap();
            engine.inverse(world, &mut xs).unwrap();
            (xs[0] - first).norm()
        });
        for err in outcome {
            // Element zero amplifies any 1/n bookkeeping mistake.
            assert!(err < 1e-10, "scaling drift {err} at element zero");
        }
    }

    #[test]
    fn test_degenerate_one_element_per_rank() {
        // n == p: table construction must terminate and stay usable.
        let outcome = ThreadWorld::<Complex<f64>>::spawn(4, |world| {
            let engine = BspFft::<f64>::new(world, 4)?;
            Ok::<(usize, usize, usize), WeftError>((
                engine.k1,
                engine.tw.len(),
                engine.local_length(),
            ))
        });
        for result in outcome {
            let (k1, tw_len, np) = result.unwrap();
            assert_eq!(k1, 4);
            assert_eq!(tw_len, 1);
            assert_eq!(np, 1);
        }
    }

    #[test]
    fn test_length_one_world_of_one() {
        let outcome = ThreadWorld::<Complex<f64>>::spawn(1, |world| {
            let engine = BspFft::<f64>::new(world, 1).unwrap();
            let mut xs = vec![Complex::new(2.5f64, -0.5)];
            engine.forward(world, &mut xs).unwrap();
            xs[0]
        });
        assert_eq!(outcome[0], Complex::new(2.5, -0.5));
    }

    #[test]
    fn test_invalid_configuration_is_rejected() {
        let outcome = ThreadWorld::<Complex<f64>>::spawn(2, |world| {
            (
                BspFft::<f64>::new(world, 12).map(|_| ()),
                BspFft::<f64>::new(world, 1).map(|_| ()),
            )
        });
        for (not_pow2, too_small) in outcome {
            assert_eq!(not_pow2, Err(WeftError::TransformLengthNotPowerOfTwo(12)));
            assert_eq!(too_small, Err(WeftError::ProcessorCountExceedsLength(2, 1)));
        }
    }

    #[test]
    fn test_wrong_buffer_length_fails_collectively() {
        let outcome = ThreadWorld::<Complex<f64>>::spawn(2, |world| {
            let s = world.rank();
            let engine = BspFft::<f64>::new(world, 8).unwrap();
            let len = if s == 0 { 3 } else { 4 };
            let mut xs = random_local(len);
            engine.forward(world, &mut xs)
        });
        assert_eq!(outcome[0], Err(WeftError::InvalidInPlaceLength(4, 3)));
        assert_eq!(outcome[1], Err(WeftError::PeerFailure));
    }

    #[test]
    fn test_reinitialize_rebuilds_tables() {
        let outcome = ThreadWorld::<Complex<f64>>::spawn(2, |world| {
            let mut engine = BspFft::<f64>::new(world, 8).unwrap();
            engine.reinitialize(32).unwrap();

            let mut xs = random_local(16);
            let src = xs.to_vec();
            engine.forward(world, &mut xs).unwrap();
            engine.inverse(world, &mut xs).unwrap();

            xs.iter()
                .zip(src.iter())
                .map(|(a, b)| (a - b).norm())
                .fold(0f64, f64::max)
        });
        for err in outcome {
            assert!(err < 1e-9, "roundtrip after reinitialize drifted by {err}");
        }
    }

    #[test]
    fn test_kernel_path_matches_butterflies() {
        let outcome = ThreadWorld::<Complex<f64>>::spawn(2, |world| {
            let plain = BspFft::<f64>::new(world, 16).unwrap();
            let mut accelerated = BspFft::<f64>::new(world, 16).unwrap();

            let mut xs = random_local(8);
            let mut ys = xs.to_vec();
            let src = xs.to_vec();

            accelerated
                .bind_kernel(world, &mut ReferenceDftPlanner, &mut ys)
                .unwrap();

            plain.forward(world, &mut xs).unwrap();
            accelerated.forward(world, &mut ys).unwrap();

            let diverged = xs
                .iter()
                .zip(ys.iter())
                .map(|(a, b)| (a - b).norm())
                .fold(0f64, f64::max);

            accelerated.inverse(world, &mut ys).unwrap();
            let restored = ys
                .iter()
                .zip(src.iter())
                .map(|(a, b)| (a - b).norm())
                .fold(0f64, f64::max);

            (diverged, restored)
        });
        for (diverged, restored) in outcome {
            assert!(diverged < 1e-9, "kernel path diverged by {diverged}");
            assert!(restored < 1e-9, "kernel roundtrip drifted by {restored}");
        }
    }

    #[test]
    fn test_kernel_refuses_foreign_buffer() {
        let outcome = ThreadWorld::<Complex<f64>>::spawn(2, |world| {
            let mut engine = BspFft::<f64>::new(world, 8).unwrap();
            let mut bound = random_local(4);
            engine
                .bind_kernel(world, &mut ReferenceDftPlanner, &mut bound)
                .unwrap();

            let mut other = random_local(4);
            engine.forward(world, &mut other)
        });
        for status in outcome {
            assert_eq!(status, Err(WeftError::KernelBufferMismatch));
        }
    }
}
