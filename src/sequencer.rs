use serde::{Deserialize, Serialize};

use crate::Clocked;

/// Pacing condition for output position advances
///
/// Besides transform completion, an advance needs the pacing condition of the
/// selected variant to hold in the same cycle.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Pacing {
    /// Free running divider of `bits` width.
    ///
    /// The first time its top bit is set the sequencer starts the transform.
    /// Advances happen when the divider is zero.
    /// The host start register is not used.
    SlowClock {
        /// Divider width, `1..=31`
        bits: u32,
    },
    /// Start on a rising edge of the host start register.
    /// Advance when the interpolator accepts a sample.
    #[default]
    Interpolator,
}

/// Sequencer state
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, strum::AsRefStr)]
pub enum State {
    /// Waiting for the start trigger
    #[default]
    Idle,
    /// Start is asserted for this one cycle
    StartPending,
    /// Waiting for completion and pacing
    WaitDone,
    /// The position advanced on the last edge
    Advance,
}

/// Sequencer inputs of one cycle
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Handshake {
    /// Host start register level
    pub go: bool,
    /// Transform completion
    pub done: bool,
    /// Interpolator accepts a sample in this cycle
    pub accepted: bool,
}

/// Sequencer outputs of one cycle
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Sequence {
    /// Transform start strobe
    pub start: bool,
    /// Transform output read address
    pub position: usize,
    /// Completion and pacing coincide: the position advances on this edge
    pub advance: bool,
}

/// Sample sequencer
///
/// Starts the transform, then walks the output position through the transform output
/// buffer, one step per completion-and-pacing event, forever.
///
/// ```text
/// Idle -> StartPending -> WaitDone <-> Advance
/// ```
///
/// There is no timeout: if the transform never completes the sequencer waits forever.
/// `N` is the transform size, a power of two. The position wraps silently.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Sequencer<const N: usize> {
    pacing: Pacing,
    state: State,
    position: usize,
    slow: u32,
    go: bool,
}

impl<const N: usize> Sequencer<N> {
    const SIZE: () = assert!(N.is_power_of_two());

    /// Create a new sequencer in reset state
    pub fn new(pacing: Pacing) -> Self {
        let () = Self::SIZE;
        if let Pacing::SlowClock { bits } = pacing {
            debug_assert!((1..32).contains(&bits));
        }
        Self {
            pacing,
            state: State::Idle,
            position: 0,
            slow: 0,
            go: false,
        }
    }

    /// Current state
    pub fn state(&self) -> State {
        self.state
    }

    /// Current output position
    pub fn position(&self) -> usize {
        self.position
    }

    /// Pacing variant
    pub fn pacing(&self) -> Pacing {
        self.pacing
    }

    /// Slow divider count
    pub fn slow(&self) -> u32 {
        self.slow
    }
}

impl<const N: usize> Clocked for Sequencer<N> {
    type Input = Handshake;
    type Output = Sequence;

    fn next(&self, x: Handshake) -> (Sequence, Self) {
        let mut next = *self;
        next.go = x.go;
        let (trigger, paced) = match self.pacing {
            Pacing::SlowClock { bits } => {
                next.slow = self.slow.wrapping_add(1) & ((1 << bits) - 1);
                (
                    self.state == State::Idle && (self.slow >> (bits - 1)) & 1 != 0,
                    self.slow == 0,
                )
            }
            Pacing::Interpolator => (x.go && !self.go, x.accepted),
        };
        let advance = matches!(self.state, State::WaitDone | State::Advance) && x.done && paced;
        if advance {
            next.position = (self.position + 1) & (N - 1);
            log::trace!("advance to {}", next.position);
        }
        next.state = if trigger {
            State::StartPending
        } else {
            match self.state {
                State::Idle => State::Idle,
                State::StartPending => State::WaitDone,
                State::WaitDone | State::Advance if advance => State::Advance,
                State::WaitDone | State::Advance => State::WaitDone,
            }
        };
        let running = |s: State| matches!(s, State::WaitDone | State::Advance);
        if next.state != self.state && !(running(self.state) && running(next.state)) {
            log::debug!("{} -> {}", self.state.as_ref(), next.state.as_ref());
        }
        let y = Sequence {
            start: self.state == State::StartPending,
            position: self.position,
            advance,
        };
        (y, next)
    }

    fn reset(&mut self) {
        *self = Self::new(self.pacing);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::{prelude::*, rngs::StdRng};

    fn started<const N: usize>() -> Sequencer<N> {
        let mut s = Sequencer::<N>::new(Pacing::Interpolator);
        s.tick(Handshake::default());
        s.tick(Handshake {
            go: true,
            ..Default::default()
        });
        assert_eq!(s.state(), State::StartPending);
        let y = s.tick(Handshake {
            go: true,
            ..Default::default()
        });
        assert!(y.start);
        assert_eq!(s.state(), State::WaitDone);
        s
    }

    #[test]
    fn host_start() {
        let mut s = Sequencer::<8>::new(Pacing::Interpolator);
        let y = s.tick(Handshake {
            go: true,
            done: true,
            accepted: true,
        });
        assert!(!y.start);
        assert_eq!(s.state(), State::StartPending);
        let y = s.tick(Handshake {
            go: true,
            done: true,
            accepted: true,
        });
        // done is ignored while the start is pending
        assert!(y.start && !y.advance);
        assert_eq!(s.position(), 0);
        for _ in 0..10 {
            let y = s.tick(Handshake {
                go: true,
                ..Default::default()
            });
            assert!(!y.start);
        }
        assert_eq!(s.state(), State::WaitDone);
    }

    #[test]
    fn advance_once_per_event() {
        let mut s = started::<16>();
        let mut rng = StdRng::seed_from_u64(42);
        let mut events = 0;
        let mut returns = 0;
        while events < 3 * 16 {
            let x = Handshake {
                go: true,
                done: rng.random_bool(0.7),
                accepted: rng.random_bool(0.3),
            };
            let p = s.position();
            let y = s.tick(x);
            assert_eq!(y.position, p);
            assert_eq!(y.advance, x.done && x.accepted);
            if y.advance {
                events += 1;
                assert_eq!(s.position(), (p + 1) % 16);
                assert_eq!(s.state(), State::Advance);
                if s.position() == 0 {
                    returns += 1;
                }
            } else {
                assert_eq!(s.position(), p);
                assert_eq!(s.state(), State::WaitDone);
            }
        }
        assert_eq!(returns, 3);
        assert_eq!(s.position(), 0);
    }

    #[test]
    fn back_to_back() {
        let mut s = started::<4>();
        let x = Handshake {
            go: true,
            done: true,
            accepted: true,
        };
        for i in 1..=9 {
            assert!(s.tick(x).advance);
            assert_eq!(s.position(), i % 4);
        }
    }

    #[test]
    fn restart_keeps_position() {
        let mut s = started::<8>();
        s.tick(Handshake {
            go: true,
            done: true,
            accepted: true,
        });
        assert_eq!(s.position(), 1);
        s.tick(Handshake::default());
        s.tick(Handshake {
            go: true,
            ..Default::default()
        });
        assert_eq!(s.state(), State::StartPending);
        assert!(s.tick(Handshake::default()).start);
        assert_eq!(s.position(), 1);
    }

    #[test]
    fn slow_clock() {
        let bits = 4;
        let mut s = Sequencer::<8>::new(Pacing::SlowClock { bits });
        let x = Handshake {
            go: false,
            done: true,
            accepted: false,
        };
        // top bit of the divider is first set at count 8
        for _ in 0..8 {
            assert!(!s.tick(x).start);
            assert_eq!(s.state(), State::Idle);
        }
        s.tick(x);
        assert_eq!(s.state(), State::StartPending);
        assert!(s.tick(x).start);
        for cycle in 10..200u32 {
            let y = s.tick(x);
            assert_eq!(y.advance, cycle % 16 == 0, "{cycle}");
            // only started once
            assert!(!y.start);
        }
        assert_eq!(s.position(), (10..200).filter(|c| c % 16 == 0).count() % 8);
        s.reset();
        assert_eq!(s, Sequencer::new(Pacing::SlowClock { bits }));
    }

    /// Liveness depends on the transform: without completion there is no progress.
    #[test]
    fn stalls_without_done() {
        let mut s = started::<8>();
        for _ in 0..10_000 {
            let y = s.tick(Handshake {
                go: true,
                done: false,
                accepted: true,
            });
            assert!(!y.advance);
        }
        assert_eq!(s.state(), State::WaitDone);
        assert_eq!(s.position(), 0);
    }
}
