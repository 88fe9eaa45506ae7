use miniconf::{Leaf, Tree};
use serde::{Deserialize, Serialize};

use crate::{Format, Pacing, Window};

/// Writer of the transform input buffer
///
/// Exactly one writer is wired per build.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputSource {
    /// Host bus writes through the input window
    #[default]
    HostBus,
    /// Internal test pattern, written once when the transform is started
    InternalGenerator,
}

/// Producer of the DAC amplitude code
///
/// Exactly one producer is wired per build.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AmplitudeSource {
    /// The direct DAC register
    Register,
    /// The formatted transform output word at the output position
    Transform,
    /// The formatted interpolator output
    #[default]
    Interpolator,
}

/// [`Config::validate()`] errors
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// Sample width out of range
    #[error("sample width {0} not in 1..=16")]
    Width(u32),
    /// Slow clock divider width out of range
    #[error("slow clock width {0} not in 1..=31")]
    SlowClock(u32),
    /// Output format slice outside the word or wider than the DAC code
    #[error("output format {0:?} does not fit")]
    Slice(Format),
    /// Input window overlapping the register region
    #[error("input window sentinel {0} invalid")]
    Window(u32),
    /// Interpolation rate range unsupported
    #[error("interpolation rate {rate} not in 1..={rate_max} or accumulator overflow")]
    Rate {
        /// Rate reset value
        rate: u32,
        /// Maximum rate
        rate_max: u32,
    },
}

/// Build configuration
///
/// Selects the variant of the core. All choices are static: they are made once when the
/// core is built and never change while it runs.
#[derive(Clone, Debug, PartialEq, Tree)]
pub struct Config {
    /// Sample component width of the transform buffers
    pub width: u32,
    /// Sequencer pacing
    #[tree(with=miniconf::leaf)]
    pub pacing: Pacing,
    /// Transform input buffer writer
    #[tree(with=miniconf::leaf)]
    pub input: InputSource,
    /// DAC code producer
    #[tree(with=miniconf::leaf)]
    pub amplitude: AmplitudeSource,
    /// DAC code format
    pub format: Leaf<Format>,
    /// Transform input window on the host bus
    pub window: Leaf<Window>,
    /// Interpolation rate register reset value
    pub rate: u32,
    /// Maximum interpolation rate
    pub rate_max: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self::interpolated()
    }
}

impl Config {
    /// Host loaded transform input, interpolator paced, DAC on the interpolator output
    pub fn interpolated() -> Self {
        Self {
            width: 16,
            pacing: Pacing::Interpolator,
            input: InputSource::HostBus,
            amplitude: AmplitudeSource::Interpolator,
            format: Leaf(Format::new(0, 16, 0)),
            window: Leaf(Window::default()),
            rate: 200,
            rate_max: 4096,
        }
    }

    /// Internal test pattern, slow clock paced, DAC on the transform output
    pub fn slow_clock() -> Self {
        Self {
            pacing: Pacing::SlowClock { bits: 10 },
            input: InputSource::InternalGenerator,
            amplitude: AmplitudeSource::Transform,
            format: Leaf(Format::new(16, 8, 8)),
            ..Self::interpolated()
        }
    }

    /// DAC driven by the direct register only
    pub fn direct() -> Self {
        Self {
            amplitude: AmplitudeSource::Register,
            ..Self::interpolated()
        }
    }

    /// The internal generator test pattern value, `2^(width - 4) - 2000` wrapped to
    /// `width` bits
    ///
    /// Zero for zero `width`.
    pub fn pattern(&self) -> u32 {
        let mask = u32::MAX
            .checked_shr(32u32.saturating_sub(self.width))
            .filter(|_| self.width > 0)
            .unwrap_or(0);
        1u32.checked_shl(self.width.saturating_sub(4))
            .unwrap_or(0)
            .wrapping_sub(2000)
            & mask
    }

    /// Check consistency
    ///
    /// # Args
    /// * `supports_rate`: Whether the interpolator supports `(width, rate_max)`
    pub fn validate(&self, supports_rate: impl Fn(u32, u32) -> bool) -> Result<(), ConfigError> {
        if !(1..=16).contains(&self.width) {
            return Err(ConfigError::Width(self.width));
        }
        if let Pacing::SlowClock { bits } = self.pacing {
            if !(1..32).contains(&bits) {
                return Err(ConfigError::SlowClock(bits));
            }
        }
        if !self.format.is_valid(16) {
            return Err(ConfigError::Slice(*self.format));
        }
        if self.window.sentinel == 0 || self.window.sentinel >> crate::TAG_BITS != 0 {
            return Err(ConfigError::Window(self.window.sentinel));
        }
        if !(1..=self.rate_max).contains(&self.rate) || !supports_rate(self.width, self.rate_max) {
            return Err(ConfigError::Rate {
                rate: self.rate,
                rate_max: self.rate_max,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::Cic;

    fn check(c: &Config) -> Result<(), ConfigError> {
        c.validate(Cic::<3>::supports)
    }

    #[test]
    fn presets() {
        for c in [Config::interpolated(), Config::slow_clock(), Config::direct()] {
            assert_eq!(check(&c), Ok(()));
        }
        assert_eq!(Config::default(), Config::interpolated());
        assert_eq!(Config::default().pattern(), 2096);
    }

    #[test]
    fn pattern_any_width() {
        for (width, pattern) in [
            (0, 0),
            (1, 1),
            (12, 2352),
            (16, 2096),
            (40, 0xffff_f830),
        ] {
            let c = Config {
                width,
                ..Default::default()
            };
            assert_eq!(c.pattern(), pattern, "{width}");
        }
    }

    #[test]
    fn errors() {
        let c = Config {
            width: 17,
            ..Default::default()
        };
        assert_eq!(check(&c), Err(ConfigError::Width(17)));
        let c = Config {
            pacing: Pacing::SlowClock { bits: 0 },
            ..Default::default()
        };
        assert_eq!(check(&c), Err(ConfigError::SlowClock(0)));
        let c = Config {
            format: Leaf(Format::new(16, 16, 8)),
            ..Default::default()
        };
        assert!(matches!(check(&c), Err(ConfigError::Slice(_))));
        let c = Config {
            window: Leaf(Window::at(0x1000)),
            ..Default::default()
        };
        assert_eq!(check(&c), Err(ConfigError::Window(0)));
        let c = Config {
            rate: 0,
            ..Default::default()
        };
        assert!(matches!(check(&c), Err(ConfigError::Rate { .. })));
        let c = Config {
            rate_max: 1 << 20,
            ..Default::default()
        };
        assert!(matches!(check(&c), Err(ConfigError::Rate { .. })));
    }
}
