//! Synchronous logic, one clock domain.

/// Registered logic block
///
/// Single input, single output, clocked once per cycle by the core clock.
///
/// The state of an implementor is exactly its register contents.
/// [`Clocked::next()`] is pure: it computes the combinational outputs of the current
/// cycle and the register contents after the next edge from the registered state and
/// the current inputs only. [`Clocked::commit()`] latches that next state.
/// There is no same-cycle read-after-write through registers.
///
/// Blocks that are wired together are evaluated with `next()` against their current
/// state in any order and then all committed, which reproduces the simultaneous update
/// of all registers on the clock edge.
pub trait Clocked: Sized {
    /// Input signals sampled in the current cycle
    type Input: Copy;
    /// Output signals driven in the current cycle
    type Output;

    /// Evaluate the current cycle and obtain the next state
    fn next(&self, x: Self::Input) -> (Self::Output, Self);

    /// Latch the next state on the clock edge
    fn commit(&mut self, next: Self) {
        *self = next;
    }

    /// Return all registers to their reset values
    fn reset(&mut self);

    /// Evaluate and commit one cycle
    fn tick(&mut self, x: Self::Input) -> Self::Output {
        let (y, next) = self.next(x);
        self.commit(next);
        y
    }

    /// Clock a block of inputs into a block of outputs, one cycle per item
    ///
    /// Input and output must be of the same size.
    fn block(&mut self, x: &[Self::Input], y: &mut [Self::Output]) {
        debug_assert_eq!(x.len(), y.len());
        for (x, y) in x.iter().zip(y) {
            *y = self.tick(*x);
        }
    }
}
