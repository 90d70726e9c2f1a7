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
use crate::WeftError;
use std::sync::{Arc, Barrier, Mutex, MutexGuard};

/// The collective fabric a superstep algorithm runs on: `p` cooperating
/// ranks, one-sided bulk writes, and a barrier. Writes queued with `put`
/// become visible in the destination window only after the destination has
/// passed the matching `sync`.
///
/// `vote` is the collective escape hatch for fatal conditions: every rank
/// reports a local verdict and learns whether the whole world passed. A
/// failing rank therefore never leaves the others stranded at a barrier;
/// all ranks abandon the call together.
pub trait World<E: Copy> {
    fn rank(&self) -> usize;

    fn processors(&self) -> usize;

    /// Queue a one-sided bulk write of `data` into `dest`'s window at
    /// `offset`. Delivery happens at the destination's next `sync`.
    fn put(&mut self, dest: usize, offset: usize, data: &[E]) -> Result<(), WeftError>;

    /// Superstep barrier. Blocks until every rank arrives, then delivers
    /// all writes queued for this rank into `window`.
    fn sync(&mut self, window: &mut [E]) -> Result<(), WeftError>;

    /// Collective AND-reduction over one barrier: `Ok(true)` iff every rank
    /// voted `true`.
    fn vote(&mut self, ok: bool) -> Result<bool, WeftError>;
}

struct Packet<E> {
    offset: usize,
    data: Vec<E>,
}

struct VoteCell {
    acc: bool,
    arrived: usize,
    result: bool,
}

struct Shared<E> {
    mailboxes: Vec<Mutex<Vec<Packet<E>>>>,
    barrier: Barrier,
    vote: Mutex<VoteCell>,
}

/// In-process BSP world: one OS thread per rank over shared mailboxes and a
/// single barrier. Mirrors the superstep semantics of a real fabric closely
/// enough to run and test collective algorithms on one machine.
pub struct ThreadWorld<E> {
    rank: usize,
    shared: Arc<Shared<E>>,
}

// Lock poisoning only happens when a sibling rank already panicked, and the
// panic is re-raised at join. The data itself stays consistent.
fn relock<T>(lock: &Mutex<T>) -> MutexGuard<'_, T> {
    lock.lock().unwrap_or_else(|e| e.into_inner())
}

impl<E: Copy + Send> ThreadWorld<E> {
    /// Runs `f` on `processors` ranks, each on its own thread, and returns
    /// the per-rank results in rank order.
    pub fn spawn<R, F>(processors: usize, f: F) -> Vec<R>
    where
        F: Fn(&mut ThreadWorld<E>) -> R + Sync,
        R: Send,
    {
        assert!(processors > 0, "a world needs at least one processor");
        let shared = Arc::new(Shared {
            mailboxes: (0..processors).map(|_| Mutex::new(Vec::new())).collect(),
            barrier: Barrier::new(processors),
            vote: Mutex::new(VoteCell {
                acc: true,
                arrived: 0,
                result: true,
            }),
        });

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..processors)
                .map(|rank| {
                    let shared = Arc::clone(&shared);
                    let f = &f;
                    scope.spawn(move || {
                        let mut world = ThreadWorld { rank, shared };
                        f(&mut world)
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|h| {
                    h.join()
                        .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
                })
                .collect()
        })
    }
}

impl<E: Copy + Send> World<E> for ThreadWorld<E> {
    fn rank(&self) -> usize {
        self.rank
    }

    fn processors(&self) -> usize {
        self.shared.mailboxes.len()
    }

    fn put(&mut self, dest: usize, offset: usize, data: &[E]) -> Result<(), WeftError> {
        let Some(mailbox) = self.shared.mailboxes.get(dest) else {
            return Err(WeftError::RankOutOfRange(dest, self.processors()));
        };
        relock(mailbox).push(Packet {
            offset,
            data: data.to_vec(),
        });
        Ok(())
    }

    fn sync(&mut self, window: &mut [E]) -> Result<(), WeftError> {
        // First wait: every rank has issued all its puts for this superstep.
        self.shared.barrier.wait();

        let mut status = Ok(());
        {
            let mut mailbox = relock(&self.shared.mailboxes[self.rank]);
            for packet in mailbox.drain(..) {
                let end = packet.offset + packet.data.len();
                if end > window.len() {
                    status = Err(WeftError::PutOutOfRange(
                        packet.offset,
                        packet.data.len(),
                        window.len(),
                    ));
                    continue;
                }
                window[packet.offset..end].copy_from_slice(&packet.data);
            }
        }

        // Second wait: nobody starts queueing the next superstep's writes
        // while a peer is still draining.
        self.shared.barrier.wait();
        status
    }

    fn vote(&mut self, ok: bool) -> Result<bool, WeftError> {
        {
            let processors = self.processors();
            let mut cell = relock(&self.shared.vote);
            cell.acc &= ok;
            cell.arrived += 1;
            if cell.arrived == processors {
                // Last arriver publishes and rearms the cell; nobody can
                // start the next vote before reading this one.
                cell.result = cell.acc;
                cell.acc = true;
                cell.arrived = 0;
            }
        }
        self.shared.barrier.wait();
        let result = relock(&self.shared.vote).result;
        Ok(result)
    }
}
