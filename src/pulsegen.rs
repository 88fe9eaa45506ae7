use num_complex::Complex;

use crate::{
    AmplitudeSource, BusAdapter, BusCycle, Clocked, Config, ConfigError, Csr, Dac, Handshake,
    InputSource, InputWrite, Interpolate, Registers, Sequencer, State, Transform, csr, pack,
    truncate,
};

/// Pins of the core in one cycle
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Outputs {
    /// DAC output line
    pub dac: bool,
    /// Host bus acknowledge
    pub ack: bool,
    /// Host bus read data
    pub dat_r: u32,
}

/// Pulse generator core
///
/// Wires the register bank, the input load bus adapter, the sample sequencer,
/// the transform engine `T`, the rate interpolator `I` and the delta-sigma DAC
/// into one clock domain. `N` is the transform size.
///
/// The host bus is split by address: the register region goes to the register bank,
/// everything else to the bus adapter.
///
/// ```
/// # use pulsegen::{Cic, Config, Idft, Pulsegen, csr};
/// # use num_complex::Complex;
/// let mut p = Pulsegen::<128, _, _>::new(
///     Config::default(),
///     Idft::<128>::new(16, 0b11, 10),
///     Cic::<3>::new(16, 200, 4096),
/// )
/// .unwrap();
/// p.load(&[Complex::new(0, 0), Complex::new(16000, 16000)]);
/// p.write(csr::R, 200);
/// p.start();
/// let ones = (0..10_000).filter(|_| p.idle().dac).count();
/// assert!(ones > 0);
/// ```
#[derive(Clone, Debug)]
pub struct Pulsegen<const N: usize, T, I> {
    config: Config,
    csr: Csr,
    sequencer: Sequencer<N>,
    bus: BusAdapter<N>,
    engine: T,
    interpolator: I,
    dac: Dac<16>,
    sample: i32,
    code: u32,
}

/// Host loaded, interpolator paced core with the default engine and interpolator models
pub type Interpolated<const N: usize> = Pulsegen<N, crate::Idft<N>, crate::Cic<3>>;

impl<const N: usize, T: Transform, I: Interpolate> Pulsegen<N, T, I> {
    /// Build a core
    ///
    /// # Args
    /// * `config`: Variant selection, see [`Config`]
    /// * `engine`: Transform engine of size `N`
    /// * `interpolator`: Rate interpolator
    pub fn new(config: Config, engine: T, mut interpolator: I) -> Result<Self, ConfigError> {
        config.validate(|width, rate_max| interpolator.supports_rate(width, rate_max))?;
        interpolator.set_rate(config.rate);
        log::info!(
            "N={N} width={} pacing={:?} input={:?} amplitude={:?} window={:#010x}",
            config.width,
            config.pacing,
            config.input,
            config.amplitude,
            config.window.base()
        );
        Ok(Self {
            csr: Csr::new(config.rate),
            sequencer: Sequencer::new(config.pacing),
            bus: BusAdapter::new(*config.window),
            engine,
            interpolator,
            dac: Dac::default(),
            sample: 0,
            code: 0,
            config,
        })
    }

    /// Return every register to its reset value
    ///
    /// The transform buffers are cleared as well.
    pub fn reset(&mut self) {
        log::debug!("reset");
        self.csr.reset();
        self.sequencer.reset();
        self.bus.reset();
        self.engine.reset();
        self.interpolator.reset();
        self.interpolator.set_rate(self.config.rate);
        self.dac.reset();
        self.sample = 0;
        self.code = 0;
    }

    /// Clock the core once
    ///
    /// With `reset` asserted all registers take their reset values on this edge
    /// and the bus cycle is ignored.
    pub fn tick(&mut self, reset: bool, cyc: BusCycle) -> Outputs {
        if reset {
            self.reset();
            return Outputs::default();
        }

        // registered state of this cycle
        let done = self.engine.done();
        let position = self.sequencer.position();
        let x_out = self.engine.read(position);
        let ready = self.interpolator.ready();

        let (csr_cyc, bus_cyc) = if Csr::contains(cyc.adr) {
            (cyc, BusCycle { stb: false, ..cyc })
        } else {
            (BusCycle { stb: false, ..cyc }, cyc)
        };
        let status = csr::Status {
            position,
            dropped: self.bus.dropped(),
        };
        let (regs, csr) = self.csr.next((csr_cyc, status));
        let (seq, sequencer) = self.sequencer.next(Handshake {
            go: regs.go,
            done,
            accepted: ready,
        });
        let (resp, bus) = self.bus.next((bus_cyc, x_out));

        let write = match self.config.input {
            InputSource::HostBus => resp.write,
            InputSource::InternalGenerator => seq.start.then_some(InputWrite {
                adr: 1,
                data: self.config.pattern(),
            }),
        };

        self.sample = self.interpolator.tick(truncate(x_out, self.config.width));
        self.code = match self.config.amplitude {
            AmplitudeSource::Register => regs.dacval as u32,
            AmplitudeSource::Transform => self.config.format.apply(x_out),
            AmplitudeSource::Interpolator => self.config.format.apply(self.sample as u32),
        };
        let (dac, next) = self.dac.next(self.code);

        self.csr.commit(csr);
        self.sequencer.commit(sequencer);
        self.bus.commit(bus);
        self.dac.commit(next);
        self.engine.tick(seq.start, write);
        // the rate register applies from the next input sample on
        self.interpolator.set_rate(regs.r);

        Outputs {
            dac,
            ack: regs.ack || resp.ack,
            dat_r: if regs.ack { regs.dat_r } else { resp.dat_r },
        }
    }

    /// Clock one cycle without a bus transaction
    pub fn idle(&mut self) -> Outputs {
        self.tick(false, BusCycle::IDLE)
    }

    /// Clock a block of cycles without bus transactions, one DAC bit per item
    pub fn run(&mut self, y: &mut [bool]) {
        for y in y.iter_mut() {
            *y = self.idle().dac;
        }
    }

    /// Host write of a byte address
    ///
    /// Takes the strobe cycle and the acknowledge cycle.
    /// Returns whether the write was acknowledged.
    pub fn write(&mut self, address: u32, data: u32) -> bool {
        self.tick(false, BusCycle::write(address >> 2, data));
        self.idle().ack
    }

    /// Host read of a byte address
    ///
    /// Takes the strobe cycle and the acknowledge cycle.
    /// Returns the read data, `None` if the read was not acknowledged.
    pub fn read(&mut self, address: u32) -> Option<u32> {
        self.tick(false, BusCycle::read(address >> 2));
        let y = self.idle();
        y.ack.then_some(y.dat_r)
    }

    /// Write samples to the transform input buffer through the input window,
    /// starting at address zero
    pub fn load(&mut self, samples: &[Complex<i32>]) {
        let base = self.config.window.base();
        for (k, x) in samples.iter().take(N).enumerate() {
            self.write(base + ((k as u32) << 2), pack(*x, self.config.width));
        }
    }

    /// Produce a rising edge on the start register
    pub fn start(&mut self) {
        self.write(csr::GO, 0);
        self.write(csr::GO, 1);
    }

    /// Build configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Current register values
    pub fn registers(&self) -> &Registers {
        self.csr.registers()
    }

    /// Sequencer state
    pub fn state(&self) -> State {
        self.sequencer.state()
    }

    /// Output position
    pub fn position(&self) -> usize {
        self.sequencer.position()
    }

    /// Dropped input window writes
    pub fn dropped(&self) -> u32 {
        self.bus.dropped()
    }

    /// Transform engine
    pub fn engine(&self) -> &T {
        &self.engine
    }

    /// Rate interpolator
    pub fn interpolator(&self) -> &I {
        &self.interpolator
    }

    /// Interpolator output of the last cycle
    pub fn sample(&self) -> i32 {
        self.sample
    }

    /// DAC amplitude code of the last cycle
    pub fn amplitude(&self) -> u32 {
        self.code
    }

    /// DAC output line
    pub fn output(&self) -> bool {
        self.dac.output()
    }
}
