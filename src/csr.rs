//! Host register interface
//!
//! The register bank occupies the low [`CSR_SIZE`] bytes of the host address space.
//! Register addresses are byte addresses of 32 bit words.

use crate::{BusCycle, Clocked};

/// Size of the register region in bytes
pub const CSR_SIZE: u32 = 0x1_0000;

/// Transform start, bit 0
pub const GO: u32 = 0x1800;
/// Interpolation rate
pub const R: u32 = 0x1810;
/// Output position, read only
pub const POS: u32 = 0x1820;
/// Dropped input window writes, read only
pub const DROPPED: u32 = 0x1830;
/// Direct DAC amplitude code, 16 bit
pub const DACVAL: u32 = 0x2000;

/// Read only status fed back into the register bank
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Status {
    /// Output position
    pub position: usize,
    /// Dropped write count
    pub dropped: u32,
}

/// Register bank outputs of one cycle
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Registers {
    /// Start register level
    pub go: bool,
    /// Interpolation rate
    pub r: u32,
    /// Direct DAC code
    pub dacval: u16,
    /// Acknowledge of the strobe of the previous cycle
    pub ack: bool,
    /// Read data for the acknowledged strobe
    pub dat_r: u32,
}

/// Register bank
///
/// Writes take effect on the edge ending the strobe cycle.
/// Reads are registered and returned with the acknowledge one cycle later.
/// Writes to read only or unmapped addresses are ignored, reads of unmapped addresses
/// return zero.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Csr {
    rate: u32,
    regs: Registers,
}

impl Default for Csr {
    fn default() -> Self {
        Self::new(200)
    }
}

impl Csr {
    /// Create a new register bank given the rate register reset value
    pub fn new(rate: u32) -> Self {
        Self {
            rate,
            regs: Registers {
                r: rate,
                ..Default::default()
            },
        }
    }

    /// Whether a word address is in the register region
    pub const fn contains(adr: u32) -> bool {
        adr < CSR_SIZE >> 2
    }

    /// Current register values
    pub fn registers(&self) -> &Registers {
        &self.regs
    }
}

impl Clocked for Csr {
    type Input = (BusCycle, Status);
    type Output = Registers;

    fn next(&self, (cyc, status): (BusCycle, Status)) -> (Registers, Self) {
        let mut next = *self;
        next.regs.ack = cyc.stb;
        next.regs.dat_r = 0;
        if cyc.stb && Self::contains(cyc.adr) {
            let address = cyc.adr << 2;
            if cyc.we {
                match address {
                    GO => next.regs.go = cyc.dat_w & 1 != 0,
                    R => next.regs.r = cyc.dat_w,
                    DACVAL => next.regs.dacval = cyc.dat_w as u16,
                    _ => log::debug!("ignored register write to {address:#06x}"),
                }
            } else {
                next.regs.dat_r = match address {
                    GO => self.regs.go as u32,
                    R => self.regs.r,
                    POS => status.position as u32,
                    DROPPED => status.dropped,
                    DACVAL => self.regs.dacval as u32,
                    _ => 0,
                };
            }
        }
        (self.regs, next)
    }

    fn reset(&mut self) {
        *self = Self::new(self.rate);
    }
}
