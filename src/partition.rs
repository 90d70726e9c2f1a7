/*
 * // Copyright (c) Radzivon Bartoshyk 7/2026. All rights reserved.
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
use crate::WeftError;

/// Block distribution of a `D`-dimensional data space over a `G`-dimensional
/// processor grid, `G <= D`. Each of the `G` mapped data axes is split into
/// equally sized blocks of `ceil(extent / grid)`; the block holding the
/// global end is shorter, and grid coordinates past the data own nothing.
///
/// All shape arithmetic happens once at construction; every query afterwards
/// is pure index math over the fixed block sizes.
pub struct BlockPartitioning<const D: usize, const G: usize> {
    global_size: [usize; D],
    grid_size: [usize; G],
    axes: [usize; G],
    block_size: [usize; D],
}

impl<const D: usize, const G: usize> BlockPartitioning<D, G> {
    /// Block-distributes the first `G` data axes.
    pub fn new(global_size: [usize; D], grid: [usize; G]) -> Result<Self, WeftError> {
        let mut axes = [0usize; G];
        for (i, axis) in axes.iter_mut().enumerate() {
            *axis = i;
        }
        Self::with_axes(global_size, grid, axes)
    }

    /// Block-distributes the data axes selected by `axes`, one grid axis
    /// each. The map must be injective, and the data extent on every mapped
    /// axis must cover the grid.
    pub fn with_axes(
        global_size: [usize; D],
        grid: [usize; G],
        axes: [usize; G],
    ) -> Result<Self, WeftError> {
        const {
            assert!(
                G <= D,
                "data dimensionality must cover the processor grid dimensionality"
            )
        }

        for (d, &extent) in global_size.iter().enumerate() {
            if extent == 0 {
                return Err(WeftError::EmptyDataAxis(d));
            }
        }
        for (i, &extent) in grid.iter().enumerate() {
            if extent == 0 {
                return Err(WeftError::EmptyGridAxis(i));
            }
        }

        let mut seen = [false; D];
        for &axis in axes.iter() {
            if axis >= D {
                return Err(WeftError::AxisOutOfRange(axis, D));
            }
            if seen[axis] {
                return Err(WeftError::DuplicateAxis(axis));
            }
            seen[axis] = true;
        }

        let mut block_size = global_size;
        for (i, &axis) in axes.iter().enumerate() {
            if global_size[axis] < grid[i] {
                return Err(WeftError::GridExceedsData(axis, grid[i], global_size[axis]));
            }
            block_size[axis] = (global_size[axis] - 1) / grid[i] + 1;
        }

        Ok(BlockPartitioning {
            global_size,
            grid_size: grid,
            axes,
            block_size,
        })
    }

    /// Per-axis block extent; the global extent on unpartitioned axes.
    pub fn block_size(&self) -> [usize; D] {
        self.block_size
    }

    /// Owned extent per axis for the processor at grid coordinate `index`.
    pub fn local_size(&self, index: [usize; G]) -> [usize; D] {
        let mut size = self.global_size;
        for (i, &axis) in self.axes.iter().enumerate() {
            let start = self.block_size[axis] * index[i];
            size[axis] = self.global_size[axis]
                .saturating_sub(start)
                .min(self.block_size[axis]);
        }
        size
    }

    /// Element offset of the block owned by the linear processor id `t`.
    pub fn origin(&self, t: usize) -> [usize; D] {
        let coord = self.unflatten(t);
        let mut result = [0usize; D];
        for (i, &axis) in self.axes.iter().enumerate() {
            result[axis] = self.block_size[axis] * coord[i];
        }
        result
    }

    /// Local indices of an element from its global indices. Unpartitioned
    /// axes pass through unchanged.
    pub fn global_to_local(&self, mut index: [usize; D]) -> [usize; D] {
        for (v, block) in index.iter_mut().zip(self.block_size.iter()) {
            *v %= *block;
        }
        index
    }

    /// Grid coordinate of the processor owning a global element.
    pub fn grid_owner(&self, index: [usize; D]) -> [usize; G] {
        let mut result = [0usize; G];
        for (i, &axis) in self.axes.iter().enumerate() {
            result[i] = index[axis] / self.block_size[axis];
        }
        result
    }

    /// Row-major linear processor id of a grid coordinate.
    pub fn flatten(&self, coord: [usize; G]) -> usize {
        let mut t = 0usize;
        for (extent, c) in self.grid_size.iter().zip(coord.iter()) {
            t = t * extent + c;
        }
        t
    }

    fn unflatten(&self, mut t: usize) -> [usize; G] {
        let mut coord = [0usize; G];
        for i in (0..G).rev() {
            coord[i] = t % self.grid_size[i];
            t /= self.grid_size[i];
        }
        coord
    }
}
