use num_traits::{Num, WrappingAdd};

/// Rate interpolator contract
///
/// One input sample is accepted in each cycle where [`Interpolate::ready()`] is true,
/// one output sample is produced every cycle.
pub trait Interpolate {
    /// Whether the current cycle accepts an input sample
    fn ready(&self) -> bool;

    /// Clock once. `x` is consumed only if [`Interpolate::ready()`].
    fn tick(&mut self, x: i32) -> i32;

    /// Set the rate. Changes are the implementation's responsibility to range check.
    fn set_rate(&mut self, rate: u32);

    /// Return to reset state
    fn reset(&mut self);

    /// Whether `width` bit samples are supported up to rate `rate_max`
    fn supports_rate(&self, _width: u32, _rate_max: u32) -> bool {
        true
    }
}

/// No interpolation: accept every cycle and pass through.
impl Interpolate for () {
    fn ready(&self) -> bool {
        true
    }

    fn tick(&mut self, x: i32) -> i32 {
        x
    }

    fn set_rate(&mut self, _rate: u32) {}

    fn reset(&mut self) {}
}

/// Comb stage
#[derive(Clone, Copy, PartialEq, PartialOrd, Debug, Default)]
pub struct Comb<T>(T);

impl<T: Num + Copy> Comb<T> {
    /// Ingest a new sample into the filter and return its current output.
    pub fn update(&mut self, x: T) -> T {
        let y = x - self.0;
        self.0 = x;
        y
    }
}

/// Integrator stage
#[derive(Clone, Copy, PartialEq, PartialOrd, Debug, Default)]
pub struct Integrator<T>(T);

impl<T: Num + WrappingAdd + Copy> Integrator<T> {
    /// Ingest a new sample into the filter and return its current output.
    pub fn update(&mut self, x: T) -> T {
        self.0 = self.0.wrapping_add(&x);
        self.0
    }
}

/// Cascaded integrator comb interpolator model
///
/// Order `N` where `N = 3` is cubic.
///
/// The combs run at the input rate, their output is held for `rate` cycles and
/// integrated `N` times at the output rate. The output is normalized by the gain
/// `rate.pow(N)` and saturated to `width` bits.
///
/// The rate is clamped to `1..=rate_max`. A rate change clears the filter state.
#[derive(Clone, Debug)]
pub struct Cic<const N: usize> {
    width: u32,
    rate_max: u32,
    rate: u32,
    index: u32,
    combs: [Comb<i64>; N],
    hold: i64,
    integrators: [Integrator<i64>; N],
}

impl<const N: usize> Cic<N> {
    /// Create a new zero-initialized filter
    ///
    /// # Args
    /// * `width`: Signed output width
    /// * `rate`: Rate change
    /// * `rate_max`: Highest supported rate. `rate_max.pow(N) << width` must fit 63 bits.
    pub fn new(width: u32, rate: u32, rate_max: u32) -> Self {
        debug_assert!(Self::supports(width, rate_max));
        let mut c = Self {
            width,
            rate_max,
            rate: 0,
            index: 0,
            combs: [Comb::default(); N],
            hold: 0,
            integrators: [Integrator::default(); N],
        };
        c.rate = c.clamp(rate);
        c
    }

    /// Whether the gain at `rate_max` fits the accumulator for `width` bit samples
    pub fn supports(width: u32, rate_max: u32) -> bool {
        rate_max > 0
            && (rate_max as i64)
                .checked_pow(N as _)
                .and_then(|g| g.checked_mul(1 << width))
                .is_some()
    }

    /// Return the filter gain
    pub fn gain(&self) -> i64 {
        (self.rate as i64).pow(N as _)
    }

    /// Current rate
    pub fn rate(&self) -> u32 {
        self.rate
    }

    fn clamp(&self, rate: u32) -> u32 {
        let r = rate.clamp(1, self.rate_max);
        if r != rate && r != self.rate {
            log::warn!("rate {rate} clamped to {r}");
        }
        r
    }
}

impl<const N: usize> Interpolate for Cic<N> {
    fn ready(&self) -> bool {
        self.index == 0
    }

    fn tick(&mut self, x: i32) -> i32 {
        if self.index == 0 {
            self.hold = self.combs.iter_mut().fold(x as i64, |x, c| c.update(x));
            self.index = self.rate - 1;
        } else {
            self.index -= 1;
        }
        let y = self
            .integrators
            .iter_mut()
            .fold(self.hold, |x, i| i.update(x));
        let max = (1i64 << (self.width - 1)) - 1;
        (y / self.gain()).clamp(-max - 1, max) as i32
    }

    fn set_rate(&mut self, rate: u32) {
        let rate = self.clamp(rate);
        if rate != self.rate {
            log::debug!("rate {} -> {rate}", self.rate);
            *self = Self::new(self.width, rate, self.rate_max);
        }
    }

    fn reset(&mut self) {
        *self = Self::new(self.width, self.rate, self.rate_max);
    }

    fn supports_rate(&self, width: u32, rate_max: u32) -> bool {
        width <= self.width && rate_max <= self.rate_max && Self::supports(width, rate_max)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn accept_every_rate_cycles() {
        let mut c = Cic::<3>::new(16, 5, 4096);
        let accepted: Vec<_> = (0..20)
            .map(|_| {
                let r = c.ready();
                c.tick(0);
                r
            })
            .collect();
        for (i, r) in accepted.iter().enumerate() {
            assert_eq!(*r, i % 5 == 0, "{i}");
        }
    }

    #[test]
    fn dc_gain() {
        for rate in [1, 2, 7, 200, 4096] {
            let mut c = Cic::<3>::new(16, rate, 4096);
            let mut y = 0;
            for _ in 0..5 * rate {
                y = c.tick(-12345);
            }
            assert_eq!(y, -12345, "{rate}");
        }
    }

    #[test]
    fn saturate() {
        let mut c = Cic::<1>::new(8, 4, 16);
        let mut y = 0;
        for _ in 0..100 {
            y = c.tick(1000);
        }
        assert_eq!(y, 127);
    }

    #[test]
    fn linear_first_order() {
        // first order: linear ramp between held samples
        let mut c = Cic::<1>::new(16, 4, 16);
        let y: Vec<_> = [400, 0, 0, 0, 800, 0, 0, 0]
            .iter()
            .map(|x| c.tick(*x))
            .collect();
        assert_eq!(y, [100, 200, 300, 400, 500, 600, 700, 800]);
    }

    #[test]
    fn rate_range() {
        let mut c = Cic::<3>::new(16, 0, 100);
        assert_eq!(c.rate(), 1);
        c.set_rate(1000);
        assert_eq!(c.rate(), 100);
        c.set_rate(200);
        assert_eq!(c.rate(), 100);
        c.set_rate(3);
        assert_eq!((c.rate(), c.gain()), (3, 27));
        assert!(c.supports_rate(16, 100));
        assert!(!c.supports_rate(16, 200));
        assert!(Cic::<3>::supports(16, 4096));
        assert!(!Cic::<3>::supports(16, 1 << 16));
        assert!(!Cic::<3>::supports(16, 0));
    }

    #[test]
    fn out_of_range_rate_kept() {
        let mut c = Cic::<3>::new(16, 4, 16);
        c.set_rate(1000);
        assert_eq!(c.rate(), 16);
        c.tick(100);
        assert!(!c.ready());
        // repeating the out of range rate changes nothing
        for _ in 0..10 {
            c.set_rate(1000);
            assert_eq!(c.rate(), 16);
            c.tick(100);
            assert!(!c.ready());
        }
        c.set_rate(0);
        assert_eq!(c.rate(), 1);
        assert!(c.ready());
    }

    #[test]
    fn bypass() {
        let mut b = ();
        assert!(b.ready());
        assert_eq!(b.tick(-5), -5);
    }
}
