use serde::{Deserialize, Serialize};

use crate::Clocked;

/// Width of the word address of the host bus
pub const ADDRESS_WIDTH: u32 = 30;

/// Number of high order word address bits decoding the input window
pub const TAG_BITS: u32 = 4;

/// One cycle of the word addressed host bus
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct BusCycle {
    /// Word address
    pub adr: u32,
    /// Write data
    pub dat_w: u32,
    /// Write enable
    pub we: bool,
    /// Strobe
    pub stb: bool,
}

impl BusCycle {
    /// No transaction
    pub const IDLE: Self = Self {
        adr: 0,
        dat_w: 0,
        we: false,
        stb: false,
    };

    /// Strobed read of a word address
    pub const fn read(adr: u32) -> Self {
        Self {
            adr,
            dat_w: 0,
            we: false,
            stb: true,
        }
    }

    /// Strobed write of a word address
    pub const fn write(adr: u32, dat_w: u32) -> Self {
        Self {
            adr,
            dat_w,
            we: true,
            stb: true,
        }
    }
}

/// Transform input window
///
/// A bus address hits the window if its top [`TAG_BITS`] word address bits equal the
/// sentinel. Only the lowest `log2(N)` bits address the transform input buffer, the
/// bits in between are ignored.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    /// Tag of the window
    pub sentinel: u32,
}

impl Default for Window {
    fn default() -> Self {
        Self::at(0x2000_0000)
    }
}

impl Window {
    /// The window containing the given byte address
    pub const fn at(base: u32) -> Self {
        Self {
            sentinel: ((base >> 2) >> (ADDRESS_WIDTH - TAG_BITS)) & ((1 << TAG_BITS) - 1),
        }
    }

    /// The byte address of the window
    pub const fn base(&self) -> u32 {
        self.sentinel << (ADDRESS_WIDTH - TAG_BITS) << 2
    }

    /// Whether a word address hits the window
    pub const fn contains(&self, adr: u32) -> bool {
        ((adr >> (ADDRESS_WIDTH - TAG_BITS)) & ((1 << TAG_BITS) - 1)) == self.sentinel
    }
}

/// Transform input buffer write port
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct InputWrite {
    /// Input buffer address
    pub adr: usize,
    /// Packed complex sample
    pub data: u32,
}

/// Bus adapter outputs of one cycle
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct BusResponse {
    /// Acknowledge of the strobe of the previous cycle
    pub ack: bool,
    /// Read data
    pub dat_r: u32,
    /// Transform input write, asserted in the strobe cycle
    pub write: Option<InputWrite>,
}

/// Input load bus adapter
///
/// * A strobed write hitting the [`Window`] writes the transform input buffer in the
///   same cycle.
/// * Any strobe is acknowledged exactly one cycle later, hit or miss.
/// * Read data is the current transform output word, independent of the address.
/// * Strobed writes missing the window are dropped. They are acknowledged normally
///   and counted.
///
/// Input is the bus cycle and the current transform output word.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BusAdapter<const N: usize> {
    window: Window,
    ack: bool,
    dropped: u32,
}

impl<const N: usize> BusAdapter<N> {
    const SIZE: () = assert!(N.is_power_of_two() && N <= 1 << (ADDRESS_WIDTH - TAG_BITS));

    /// Create a new adapter for a window
    pub fn new(window: Window) -> Self {
        let () = Self::SIZE;
        Self {
            window,
            ack: false,
            dropped: 0,
        }
    }

    /// The decoded window
    pub fn window(&self) -> Window {
        self.window
    }

    /// Number of dropped writes, saturating
    pub fn dropped(&self) -> u32 {
        self.dropped
    }
}

impl<const N: usize> Clocked for BusAdapter<N> {
    type Input = (BusCycle, u32);
    type Output = BusResponse;

    fn next(&self, (cyc, x_out): (BusCycle, u32)) -> (BusResponse, Self) {
        let mut next = *self;
        next.ack = cyc.stb;
        let mut write = None;
        if cyc.stb && cyc.we {
            if self.window.contains(cyc.adr) {
                let adr = cyc.adr as usize & (N - 1);
                log::trace!("input[{adr}] = {:#010x}", cyc.dat_w);
                write = Some(InputWrite {
                    adr,
                    data: cyc.dat_w,
                });
            } else {
                log::warn!("dropped write to {:#010x}", cyc.adr << 2);
                next.dropped = self.dropped.saturating_add(1);
            }
        }
        let y = BusResponse {
            ack: self.ack,
            dat_r: x_out,
            write,
        };
        (y, next)
    }

    fn reset(&mut self) {
        *self = Self::new(self.window);
    }
}
