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
use std::error::Error;
use std::fmt::Formatter;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WeftError {
    OutOfMemory(usize),
    InvalidInPlaceLength(usize, usize),
    TransformLengthNotPowerOfTwo(usize),
    ProcessorCountNotPowerOfTwo(usize),
    ProcessorCountExceedsLength(usize, usize),
    RankOutOfRange(usize, usize),
    PutOutOfRange(usize, usize, usize),
    EmptyDataAxis(usize),
    EmptyGridAxis(usize),
    AxisOutOfRange(usize, usize),
    DuplicateAxis(usize),
    GridExceedsData(usize, usize, usize),
    KernelNotBound,
    KernelBufferMismatch,
    KernelUnsupported(usize, usize),
    PeerFailure,
}

impl Error for WeftError {}

impl std::fmt::Display for WeftError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            WeftError::OutOfMemory(length) => {
                f.write_fmt(format_args!("Cannot allocate {length} bytes to vector"))
            }
            WeftError::InvalidInPlaceLength(s0, s1) => f.write_fmt(format_args!(
                "In-place length expected to be {s0}, but it was {s1}"
            )),
            WeftError::TransformLengthNotPowerOfTwo(n) => f.write_fmt(format_args!(
                "Transform length must be a power of two, but it was {n}"
            )),
            WeftError::ProcessorCountNotPowerOfTwo(p) => f.write_fmt(format_args!(
                "Processor count must be a power of two, but it was {p}"
            )),
            WeftError::ProcessorCountExceedsLength(p, n) => f.write_fmt(format_args!(
                "Processor count {p} exceeds transform length {n}"
            )),
            WeftError::RankOutOfRange(s, p) => f.write_fmt(format_args!(
                "Rank {s} does not exist in a world of {p} processors"
            )),
            WeftError::PutOutOfRange(offset, len, window) => f.write_fmt(format_args!(
                "Put of {len} elements at offset {offset} does not fit a window of {window}"
            )),
            WeftError::EmptyDataAxis(axis) => {
                f.write_fmt(format_args!("Data axis {axis} has zero extent"))
            }
            WeftError::EmptyGridAxis(axis) => {
                f.write_fmt(format_args!("Processor grid axis {axis} has zero extent"))
            }
            WeftError::AxisOutOfRange(axis, d) => f.write_fmt(format_args!(
                "Partitioned axis {axis} is outside the data dimensionality {d}"
            )),
            WeftError::DuplicateAxis(axis) => f.write_fmt(format_args!(
                "Data axis {axis} is mapped by more than one grid axis"
            )),
            WeftError::GridExceedsData(axis, grid, data) => f.write_fmt(format_args!(
                "Grid extent {grid} exceeds data extent {data} on axis {axis}"
            )),
            WeftError::KernelNotBound => {
                f.write_str("Accelerated kernel was not bound before the transform")
            }
            WeftError::KernelBufferMismatch => f.write_str(
                "Accelerated kernel was planned for a different buffer than the one supplied",
            ),
            WeftError::KernelUnsupported(np, k1) => f.write_fmt(format_args!(
                "Accelerated kernels cannot cover a local length {np} below the first-stage radix {k1}"
            )),
            WeftError::PeerFailure => {
                f.write_str("A cooperating processor rejected the collective call")
            }
        }
    }
}

macro_rules! try_vec {
    () => {
        Vec::new()
    };
    ($elem:expr; $n:expr) => {{
        let mut v = Vec::new();
        v.try_reserve_exact($n)
            .map_err(|_| crate::err::WeftError::OutOfMemory($n))?;
        v.resize($n, $elem);
        v
    }};
}

pub(crate) use try_vec;
