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
use crate::err::try_vec;
use crate::traits::FftTrigonometry;
use crate::util::compute_twiddle;
use crate::{FftDirection, WeftError};
use num_complex::Complex;
use num_traits::{AsPrimitive, Float};

/// Weight table for an unordered FFT of length `len`, `len = 2^m`, `m >= 0`:
/// `ws[j] = exp(-2 pi i j / len)` for `0 <= j < len / 2`. One table serves
/// both directions; the inverse conjugates at use.
pub(crate) fn ufft_init<T>(len: usize) -> Result<Vec<Complex<T>>, WeftError>
where
    T: Default + Float + FftTrigonometry + 'static,
    f64: AsPrimitive<T>,
{
    let mut ws = try_vec![Complex::<T>::default(); len / 2];
    for (j, w) in ws.iter_mut().enumerate() {
        *w = compute_twiddle(j, len, FftDirection::Forward);
    }
    Ok(ws)
}

/// Unordered FFT of a power-of-two slice: the butterfly stages without the
/// final reordering, so the output is bit-reversed relative to natural
/// frequency order. Forward computes `F R x`, inverse `conj(F) R x`, where
/// `R` is the bit-reversal matrix. `ws` must come from `ufft_init(xs.len())`.
pub(crate) fn ufft<T>(xs: &mut [Complex<T>], ws: &[Complex<T>], direction: FftDirection)
where
    T: Float + 'static,
{
    let m = xs.len();
    debug_assert!(m.is_power_of_two());
    debug_assert_eq!(ws.len(), m / 2);

    let mut k = 2usize;
    while k <= m {
        let nk = m / k;
        let half = k / 2;
        for block in xs.chunks_exact_mut(k) {
            for j in 0..half {
                let mut w = ws[j * nk];
                if direction == FftDirection::Inverse {
                    w = w.conj();
                }
                let tau = w * block[j + half];
                block[j + half] = block[j] - tau;
                block[j] = block[j] + tau;
            }
        }
        k *= 2;
    }
}

/// Componentwise multiply by a twiddle slice, conjugated for the inverse.
pub(crate) fn twiddle<T>(xs: &mut [Complex<T>], ws: &[Complex<T>], direction: FftDirection)
where
    T: Float + 'static,
{
    debug_assert_eq!(xs.len(), ws.len());
    for (x, w) in xs.iter_mut().zip(ws.iter()) {
        let w = match direction {
            FftDirection::Forward => *w,
            FftDirection::Inverse => w.conj(),
        };
        *x = *x * w;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dft::Dft;
    use crate::util::{bit_reverse_indices, permute_inplace};
    use crate::FftExecutor;
    use rand::Rng;

    fn random_signal(size: usize) -> Vec<Complex<f64>> {
        let mut input = vec![Complex::<f64>::default(); size];
        for z in input.iter_mut() {
            *z = Complex {
                re: rand::rng().random(),
                im: rand::rng().random(),
            };
        }
        input
    }

    #[test]
    fn test_ufft_matches_reference() {
        for m in [2usize, 4, 8, 16, 64, 128] {
            let mut xs = random_signal(m);
            let mut expected = xs.to_vec();

            let rho = bit_reverse_indices(m).unwrap();
            let ws = ufft_init::<f64>(m).unwrap();
            // Bit-reversing first turns the unordered transform into the
            // ordered one.
            permute_inplace(&mut xs, &rho);
            ufft(&mut xs, &ws, FftDirection::Forward);

            let dft = Dft::new(m, FftDirection::Forward).unwrap();
            dft.execute(&mut expected).unwrap();

            xs.iter().zip(expected.iter()).for_each(|(a, b)| {
                assert!(
                    (a.re - b.re).abs() < 1e-8,
                    "a_re {} != b_re {} for size {}",
                    a.re,
                    b.re,
                    m
                );
                assert!(
                    (a.im - b.im).abs() < 1e-8,
                    "a_im {} != b_im {} for size {}",
                    a.im,
                    b.im,
                    m
                );
            });
        }
    }

    #[test]
    fn test_ufft_roundtrip() {
        for m in [2usize, 8, 32, 256] {
            let mut xs = random_signal(m);
            let src = xs.to_vec();

            let rho = bit_reverse_indices(m).unwrap();
            let ws = ufft_init::<f64>(m).unwrap();

            permute_inplace(&mut xs, &rho);
            ufft(&mut xs, &ws, FftDirection::Forward);
            permute_inplace(&mut xs, &rho);
            ufft(&mut xs, &ws, FftDirection::Inverse);

            xs = xs.iter().map(|&x| x * (1.0 / m as f64)).collect();

            xs.iter().zip(src.iter()).for_each(|(a, b)| {
                assert!((a.re - b.re).abs() < 1e-9, "a_re {} != b_re {}", a.re, b.re);
                assert!((a.im - b.im).abs() < 1e-9, "a_im {} != b_im {}", a.im, b.im);
            });
        }
    }

    #[test]
    fn test_ufft_length_one_is_identity() {
        let mut xs = vec![Complex::new(3.5f64, -1.25)];
        let ws = ufft_init::<f64>(1).unwrap();
        assert!(ws.is_empty());
        ufft(&mut xs, &ws, FftDirection::Forward);
        assert_eq!(xs[0], Complex::new(3.5, -1.25));
    }

    #[test]
    fn test_twiddle_conjugates_for_inverse() {
        let ws = vec![Complex::new(0.0f64, -1.0); 4];
        let mut fwd = vec![Complex::new(1.0f64, 0.0); 4];
        let mut inv = fwd.to_vec();
        twiddle(&mut fwd, &ws, FftDirection::Forward);
        twiddle(&mut inv, &ws, FftDirection::Inverse);
        for (a, b) in fwd.iter().zip(inv.iter()) {
            assert!((a.im + b.im).abs() < 1e-12 && (a.re - b.re).abs() < 1e-12);
        }
    }
}
