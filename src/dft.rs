/*
 * // Copyright (c) Radzivon Bartoshyk 5/2026. All rights reserved.
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
use crate::err::try_vec;
use crate::traits::FftTrigonometry;
use crate::util::compute_twiddle;
use crate::{FftDirection, FftExecutor, WeftError};
use num_complex::Complex;
use num_traits::{AsPrimitive, Float};

/// Naive O(n^2) transform. Slow beyond toy sizes, but its output is the
/// definition of the DFT, which makes it the oracle for every faster path
/// and a stand-in plan for the accelerated kernel interface.
pub(crate) struct Dft<T> {
    execution_length: usize,
    twiddles: Vec<Complex<T>>,
    direction: FftDirection,
}

impl<T> Dft<T>
where
    T: Default + Float + FftTrigonometry + 'static,
    f64: AsPrimitive<T>,
{
    pub fn new(size: usize, fft_direction: FftDirection) -> Result<Dft<T>, WeftError> {
        let mut twiddles = try_vec![Complex::<T>::default(); size];
        for (k, dst) in twiddles.iter_mut().enumerate() {
            *dst = compute_twiddle(k, size, fft_direction);
        }
        Ok(Dft {
            execution_length: size,
            twiddles,
            direction: fft_direction,
        })
    }
}

impl<T> FftExecutor<T> for Dft<T>
where
    T: Default + Float + 'static,
{
    fn execute(&self, in_place: &mut [Complex<T>]) -> Result<(), WeftError> {
        if in_place.len() % self.execution_length != 0 {
            return Err(WeftError::InvalidInPlaceLength(
                self.execution_length,
                in_place.len(),
            ));
        }

        let mut output = try_vec![Complex::<T>::default(); self.execution_length];

        for chunk in in_place.chunks_exact_mut(self.execution_length) {
            for (k, dst) in output.iter_mut().enumerate() {
                let mut sum = Complex::new(T::zero(), T::zero());
                let mut twiddle_idx = 0usize;
                for src in chunk.iter() {
                    sum = sum + *src * self.twiddles[twiddle_idx];
                    twiddle_idx += k;
                    if twiddle_idx >= self.twiddles.len() {
                        twiddle_idx -= self.twiddles.len();
                    }
                }
                *dst = sum;
            }
            chunk.copy_from_slice(&output);
        }
        Ok(())
    }

    fn direction(&self) -> FftDirection {
        self.direction
    }

    fn length(&self) -> usize {
        self.execution_length
    }
}
