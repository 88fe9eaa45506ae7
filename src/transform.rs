use num_complex::Complex;

use crate::{InputWrite, pack, unpack};

include!(concat!(env!("OUT_DIR"), "/twiddle_table.rs"));

/// Transform engine contract
///
/// The engine owns an input and an output buffer of packed complex samples.
/// All outputs are registered: `done()` and `read()` reflect the state after the
/// previous clock edge.
pub trait Transform {
    /// Clock the engine once.
    ///
    /// A write is applied to the input buffer before a start in the same cycle
    /// captures it.
    fn tick(&mut self, start: bool, write: Option<InputWrite>);

    /// Completion of the last started computation
    fn done(&self) -> bool;

    /// Output buffer word
    fn read(&self, adr: usize) -> u32;

    /// Input buffer word
    fn input(&self, adr: usize) -> u32;

    /// Return to reset state
    fn reset(&mut self);
}

/// Inverse DFT engine model
///
/// * `N` point inverse transform, `N` a power of two up to `1 << 12`.
/// * Input and output words are [`pack()`]ed complex samples of `width` bits each.
/// * On start the input buffer is captured. After `latency` further cycles the output
///   buffer holds `x[n] = sum_k X[k] exp(2 pi i k n / N)`, scaled down by one bit for
///   each set bit in the low `log2(N)` bits of `scaling` (one per butterfly stage),
///   rounded half up and wrapped to `width` bits.
/// * `done` goes high on completion and stays high until the next start.
///
/// Twiddle factors are Q1.30, accumulation is exact in 64 bit.
#[derive(Clone, Debug)]
pub struct Idft<const N: usize> {
    width: u32,
    scaling: u32,
    latency: u32,
    x_in: [u32; N],
    x_out: [u32; N],
    captured: [u32; N],
    busy: Option<u32>,
    done: bool,
}

impl<const N: usize> Idft<N> {
    const SIZE: () = assert!(N.is_power_of_two() && N > 1 && N <= 1 << TWIDDLE_DEPTH);

    /// Number of butterfly stages
    pub const STAGES: u32 = N.ilog2();

    /// Create a new engine model
    ///
    /// # Args
    /// * `width`: Sample component width, `1..=16`
    /// * `scaling`: Stage scaling mask
    /// * `latency`: Cycles from start to done
    pub fn new(width: u32, scaling: u32, latency: u32) -> Self {
        let () = Self::SIZE;
        debug_assert!((1..=16).contains(&width));
        Self {
            width,
            scaling,
            latency,
            x_in: [0; N],
            x_out: [0; N],
            captured: [0; N],
            busy: None,
            done: false,
        }
    }

    /// Total scaling shift
    pub fn shift(&self) -> u32 {
        (self.scaling & ((1 << Self::STAGES) - 1)).count_ones()
    }

    /// Whether a computation is in progress
    pub fn busy(&self) -> bool {
        self.busy.is_some()
    }

    /// Compute the output buffer from the captured input
    fn compute(&mut self) {
        let step = (1 << TWIDDLE_DEPTH) / N;
        let quarter = 3 << (TWIDDLE_DEPTH - 2);
        let mask = (1 << TWIDDLE_DEPTH) - 1;
        let shift = 30 + self.shift();
        let bias = 1i64 << (shift - 1);
        for (n, y) in self.x_out.iter_mut().enumerate() {
            let (re, im) = self
                .captured
                .iter()
                .enumerate()
                .fold((0i64, 0i64), |(re, im), (k, x)| {
                    let x = unpack(*x, self.width);
                    let i = ((k * n) % N) * step;
                    let c = TWIDDLE[i] as i64;
                    let s = TWIDDLE[(i + quarter) & mask] as i64;
                    (
                        re + x.re as i64 * c - x.im as i64 * s,
                        im + x.re as i64 * s + x.im as i64 * c,
                    )
                });
            let x = Complex::new(((re + bias) >> shift) as _, ((im + bias) >> shift) as _);
            *y = pack(x, self.width);
        }
    }
}

impl<const N: usize> Transform for Idft<N> {
    fn tick(&mut self, start: bool, write: Option<InputWrite>) {
        if let Some(InputWrite { adr, data }) = write {
            self.x_in[adr & (N - 1)] = data;
        }
        match self.busy {
            Some(0) => {
                self.compute();
                self.busy = None;
                self.done = true;
                log::debug!("transform done");
            }
            Some(ref mut n) => *n -= 1,
            None => {}
        }
        if start {
            self.captured = self.x_in;
            self.busy = Some(self.latency);
            self.done = false;
            log::debug!("transform start");
        }
    }

    fn done(&self) -> bool {
        self.done
    }

    fn read(&self, adr: usize) -> u32 {
        self.x_out[adr & (N - 1)]
    }

    fn input(&self, adr: usize) -> u32 {
        self.x_in[adr & (N - 1)]
    }

    fn reset(&mut self) {
        *self = Self::new(self.width, self.scaling, self.latency);
    }
}
