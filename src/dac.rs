use crate::Clocked;

/// First order delta-sigma DAC
///
/// * `N` bit unsigned amplitude code in, one bit out, one sample per clock cycle.
/// * The `N + 1` bit accumulator drops its carry before adding the next code.
///   The carry has already been latched into the output bit.
/// * Given constant input `c`, the average output is `c/(1 << N)`.
/// * The output bit lags the carry by one cycle.
/// * No overload handling: `c = 0` is constant low, `c = (1 << N) - 1` is high on all but
///   a vanishing fraction of cycles.
///
/// ```
/// # use pulsegen::{Clocked, Dac};
/// let mut d = Dac::<16>::default();
/// let c = 0x3456;
/// let n = 1 << 20;
/// let y = (0..n).filter(|_| d.tick(c)).count() as f32 / n as f32;
/// let m = c as f32 / (1 << 16) as f32;
/// assert!((y - m).abs() < 3.0 / n as f32, "{y} != {m}");
/// ```
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Dac<const N: u32 = 16> {
    accu: u32,
    out: bool,
}

impl<const N: u32> Dac<N> {
    const MASK: u32 = (1 << N) - 1;
    const WIDTH: () = assert!(N > 0 && N < 32);

    /// The physical output line
    pub fn output(&self) -> bool {
        self.out
    }

    /// Accumulator contents, `N + 1` bits
    pub fn accumulator(&self) -> u32 {
        self.accu
    }
}

impl<const N: u32> Clocked for Dac<N> {
    type Input = u32;
    type Output = bool;

    /// Ingest the amplitude code of this cycle, emit the current output bit.
    ///
    /// Code bits above `N` are ignored.
    fn next(&self, code: u32) -> (bool, Self) {
        let () = Self::WIDTH;
        debug_assert!(code <= Self::MASK);
        let next = Self {
            accu: (self.accu & Self::MASK) + (code & Self::MASK),
            out: (self.accu >> N) & 1 != 0,
        };
        (self.out, next)
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use quickcheck_macros::quickcheck;

    /// Count high output cycles over `m` cycles after the two cycle pipeline fill.
    fn ones<const N: u32>(code: u32, m: usize) -> usize {
        let mut d = Dac::<N>::default();
        d.tick(code);
        d.tick(code);
        (0..m).filter(|_| d.tick(code)).count()
    }

    #[test]
    fn extremes() {
        assert_eq!(ones::<16>(0, 1 << 12), 0);
        let m = 1 << 18;
        // one cycle without carry per 1 << 16
        assert_eq!(ones::<16>(0xffff, m), m - (m >> 16));
    }

    #[test]
    fn exhaustive_narrow() {
        let m = 1 << 14;
        for c in 0..1 << 8 {
            let n = ones::<8>(c, m);
            assert_eq!(n, (m * c as usize) >> 8, "{c}");
        }
    }

    #[quickcheck]
    fn average(code: u16) -> bool {
        let m = 1 << 20;
        let y = ones::<16>(code as _, m) as f64 / m as f64;
        (y - code as f64 / (1 << 16) as f64).abs() < 1.0 / m as f64
    }

    #[test]
    fn carry_latched_late() {
        let mut d = Dac::<4>::default();
        // 8 + 8 carries on the second addition, visible one edge later
        assert!(!d.tick(8));
        assert_eq!(d.accumulator(), 8);
        assert!(!d.tick(8));
        assert_eq!(d.accumulator(), 16);
        assert!(!d.tick(8));
        assert!(d.output());
        assert_eq!(d.accumulator(), 8);
        assert!(d.tick(8));
        assert!(!d.output());
        d.reset();
        assert_eq!(d, Dac::default());
    }

    #[test]
    fn half_scale_block() {
        let mut d = Dac::<2>::default();
        let mut y = [false; 8];
        d.block(&[2; 8], &mut y);
        assert_eq!(y, [false, false, false, true, false, true, false, true]);
    }
}
