// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Phase fractional dividers of the i.MX6 480/528 MHz PLLs.
//!
//! Four PFDs share one register, one byte each:
//!
//! ```text
//!   7       6   5          0
//! +-------+---+------------+
//! | GATE  |   |    FRAC    |   byte `idx`
//! +-------+---+------------+
//! ```
//!
//! `rate = parent * 18 / FRAC` with FRAC in 12..=35. GATE set stops the
//! output. The register has SET, CLR and TOG aliases at +0x4, +0x8 and +0xc,
//! so all writes go through them and no read-modify-write is needed.

use tock_registers::fields::Field;

use crate::errorcode::ClkError;
use crate::hil::{ClkGate, ClkRate};
use crate::io::{self, Reg, RegisterIo};

const SET: usize = 0x4;
const CLR: usize = 0x8;

const FRAC_MASK: u32 = 0x3f;
const FRAC_MIN: u64 = 12;
const FRAC_MAX: u64 = 35;
const PFD_MULT: u64 = 18;

#[derive(Clone, Copy)]
pub struct Pfd {
    reg: Reg,
    frac: Field<u32, ()>,
    gate: u32,
}

impl Pfd {
    pub fn new(reg: Reg, idx: u8) -> Result<Pfd, ClkError> {
        if idx > 3 {
            return Err(ClkError::InvalidConfig);
        }
        let shift = usize::from(idx) * 8;
        Ok(Pfd {
            reg,
            frac: Field::new(FRAC_MASK, shift),
            gate: 1 << (shift + 7),
        })
    }

    fn best_frac(rate: u64, parent_rate: u64) -> u64 {
        if rate == 0 {
            return FRAC_MAX;
        }
        ((parent_rate * PFD_MULT + rate / 2) / rate).clamp(FRAC_MIN, FRAC_MAX)
    }
}

impl ClkRate for Pfd {
    fn recalc_rate(&self, io: &dyn RegisterIo, parent_rate: u64) -> u64 {
        match u64::from(io::read_as::<()>(io, self.reg).read(self.frac)) {
            // Not a valid setting; the output is stopped.
            0 => 0,
            frac => parent_rate * PFD_MULT / frac,
        }
    }

    fn round_rate(&self, _io: &dyn RegisterIo, rate: u64, parent_rate: u64) -> u64 {
        parent_rate * PFD_MULT / Self::best_frac(rate, parent_rate)
    }

    fn set_rate(&self, io: &dyn RegisterIo, rate: u64, parent_rate: u64) -> Result<(), ClkError> {
        let frac = Self::best_frac(rate, parent_rate) as u32;
        io.write(self.reg.offset(CLR), FRAC_MASK << self.frac.shift);
        io.write(self.reg.offset(SET), frac << self.frac.shift);
        Ok(())
    }
}

impl ClkGate for Pfd {
    fn enable(&self, io: &dyn RegisterIo) -> Result<(), ClkError> {
        io.write(self.reg.offset(CLR), self.gate);
        Ok(())
    }

    fn disable(&self, io: &dyn RegisterIo) {
        io.write(self.reg.offset(SET), self.gate);
    }

    fn is_enabled(&self, io: &dyn RegisterIo) -> bool {
        io.read(self.reg) & self.gate == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::InMemoryIo;

    const PFD_528: Reg = Reg::new(0x020c_8100);
    const PLL2: u64 = 528_000_000;

    fn io() -> InMemoryIo {
        let io = InMemoryIo::new();
        io.add_set_clr_alias(PFD_528);
        // All four outputs gated, FRAC 24.
        io.set(PFD_528, 0x9898_9898);
        io
    }

    #[test]
    fn recalc_per_slot() {
        let io = InMemoryIo::new();
        io.set(PFD_528, (24 << 16) | (16 << 0));
        assert_eq!(Pfd::new(PFD_528, 0).unwrap().recalc_rate(&io, PLL2), 594_000_000);
        assert_eq!(Pfd::new(PFD_528, 2).unwrap().recalc_rate(&io, PLL2), 396_000_000);
        assert_eq!(Pfd::new(PFD_528, 1).unwrap().recalc_rate(&io, PLL2), 0);
    }

    #[test]
    fn clamps_frac() {
        let io = io();
        let pfd = Pfd::new(PFD_528, 1).unwrap();

        // Would need FRAC 10.
        let high = pfd.round_rate(&io, 1_000_000_000, PLL2);
        assert_eq!(high, PLL2 * 18 / 12);
        pfd.set_rate(&io, 1_000_000_000, PLL2).unwrap();
        assert_eq!((io.get(PFD_528) >> 8) & 0x3f, 12);
        assert_eq!(pfd.recalc_rate(&io, PLL2), high);

        // Would need FRAC 95.
        let low = pfd.round_rate(&io, 100_000_000, PLL2);
        assert_eq!(low, 271_542_857);
        pfd.set_rate(&io, 100_000_000, PLL2).unwrap();
        assert_eq!((io.get(PFD_528) >> 8) & 0x3f, 35);
        assert_eq!(pfd.recalc_rate(&io, PLL2), low);
    }

    #[test]
    fn set_rate_touches_only_its_slot() {
        let io = io();
        let before = io.get(PFD_528);
        let pfd = Pfd::new(PFD_528, 2).unwrap();
        assert_eq!(pfd.round_rate(&io, 450_000_000, PLL2), 452_571_428);
        pfd.set_rate(&io, 450_000_000, PLL2).unwrap();
        let after = io.get(PFD_528);
        assert_eq!(after & !0x003f_0000, before & !0x003f_0000);
        assert_eq!((after >> 16) & 0x3f, 21);
        assert_eq!(pfd.recalc_rate(&io, PLL2), 452_571_428);
    }

    #[test]
    fn gate_bit_is_inverted() {
        let io = io();
        let pfd = Pfd::new(PFD_528, 3).unwrap();
        assert!(!pfd.is_enabled(&io));
        pfd.enable(&io).unwrap();
        assert_eq!(io.get(PFD_528) & (1 << 31), 0);
        assert!(pfd.is_enabled(&io));
        pfd.disable(&io);
        assert_eq!(io.get(PFD_528) & (1 << 31), 1 << 31);
    }

    #[test]
    fn slot_index_checked() {
        assert!(Pfd::new(PFD_528, 4).is_err());
    }
}
