// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! i.MX6 ANATOP PLLs.
//!
//! All PLLv3 instances share the control bits (lock flag, bypass, power,
//! output enable) but differ in how the loop divider is encoded, so the
//! kind carries a [`PllV3Type`] tag:
//!
//! | type      | output                                        |
//! |-----------|-----------------------------------------------|
//! | `Generic` | `parent * 22` if DIV is 1, else `parent * 20` |
//! | `Usb`     | same as `Generic`, but powered by setting POWER |
//! | `Sys`     | `parent * DIV / 2`, DIV in 54..=108           |
//! | `Av`      | `parent * (DIV + NUM / DENOM)`, DIV in 27..=54 |
//! | `Enet`    | fixed 500 MHz                                 |
//! | `Mlb`     | parent rate                                   |
//!
//! Audio/video PLLs keep NUM and DENOM in separate registers at +0x10 and
//! +0x20 from the control register.

use tock_registers::fields::Field;
use tock_registers::register_bitfields;
use tock_registers::LocalRegisterCopy;

use crate::config::CONFIG;
use crate::errorcode::ClkError;
use crate::hil::{ClkGate, ClkRate};
use crate::io::{self, Reg, RegisterIo};

register_bitfields![u32,
    PLL_CTRL [
        LOCK OFFSET(31) NUMBITS(1) [],
        BYPASS OFFSET(16) NUMBITS(1) [],
        /// Output enable on most PLLs
        ENABLE OFFSET(13) NUMBITS(1) [],
        /// POWERDOWN, except on the USB PLLs where it is POWER
        POWER OFFSET(12) NUMBITS(1) []
    ]
];

const PLL_NUM_OFFSET: usize = 0x10;
const PLL_DENOM_OFFSET: usize = 0x20;

const ENET_RATE: u64 = 500_000_000;
const SYS_DIV_MIN: u64 = 54;
const SYS_DIV_MAX: u64 = 108;
const AV_DIV_MIN: u64 = 27;
const AV_DIV_MAX: u64 = 54;
const AV_MFD: u64 = 1_000_000;

/// Default output gate: the ENABLE bit.
pub const PLL_ENABLE: u32 = bits(PLL_CTRL::ENABLE);

/// Register bits covered by `field`.
const fn bits(field: Field<u32, PLL_CTRL::Register>) -> u32 {
    field.mask << field.shift
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PllV3Type {
    Generic,
    Sys,
    Usb,
    Av,
    Enet,
    Mlb,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PllV3 {
    base: Reg,
    pll_type: PllV3Type,
    div_mask: u32,
    gate_mask: u32,
}

impl PllV3 {
    pub fn new(
        base: Reg,
        pll_type: PllV3Type,
        div_mask: u32,
        gate_mask: u32,
    ) -> Result<PllV3, ClkError> {
        // The divider must sit at bit 0 and must not overlap the control bits.
        let control = bits(PLL_CTRL::LOCK) | bits(PLL_CTRL::BYPASS) | bits(PLL_CTRL::POWER);
        if div_mask & div_mask.wrapping_add(1) != 0
            || (div_mask | gate_mask) & control != 0
            || div_mask & gate_mask != 0
        {
            return Err(ClkError::InvalidConfig);
        }
        Ok(PllV3 {
            base,
            pll_type,
            div_mask,
            gate_mask,
        })
    }

    pub fn pll_type(&self) -> PllV3Type {
        self.pll_type
    }

    fn div(&self, io: &dyn RegisterIo) -> u64 {
        u64::from(io.read(self.base) & self.div_mask)
    }

    fn write_div(&self, io: &dyn RegisterIo, div: u64) {
        let value = io.read(self.base) & !self.div_mask;
        io.write(self.base, value | (div as u32 & self.div_mask));
    }

    /// Loop divider and fractional numerator for an audio/video PLL.
    fn av_solve(rate: u64, parent_rate: u64) -> (u64, u64) {
        let div = rate / parent_rate;
        let mfn = (rate - div * parent_rate) * AV_MFD / parent_rate;
        (div, mfn)
    }

    fn av_rate(parent_rate: u64, div: u64, mfn: u64, mfd: u64) -> u64 {
        if mfd == 0 {
            return parent_rate * div;
        }
        parent_rate * div + parent_rate * mfn / mfd
    }

    fn power_up(&self) -> bool {
        self.pll_type == PllV3Type::Usb
    }
}

impl ClkRate for PllV3 {
    fn recalc_rate(&self, io: &dyn RegisterIo, parent_rate: u64) -> u64 {
        match self.pll_type {
            PllV3Type::Generic | PllV3Type::Usb => {
                if self.div(io) == 1 {
                    parent_rate * 22
                } else {
                    parent_rate * 20
                }
            }
            PllV3Type::Sys => parent_rate * self.div(io) / 2,
            PllV3Type::Av => {
                let mfn = u64::from(io.read(self.base.offset(PLL_NUM_OFFSET)));
                let mfd = u64::from(io.read(self.base.offset(PLL_DENOM_OFFSET)));
                Self::av_rate(parent_rate, self.div(io), mfn, mfd)
            }
            PllV3Type::Enet => ENET_RATE,
            PllV3Type::Mlb => parent_rate,
        }
    }

    fn round_rate(&self, io: &dyn RegisterIo, rate: u64, parent_rate: u64) -> u64 {
        match self.pll_type {
            PllV3Type::Generic | PllV3Type::Usb => {
                if rate >= parent_rate * 22 {
                    parent_rate * 22
                } else {
                    parent_rate * 20
                }
            }
            PllV3Type::Sys => {
                let rate = rate.clamp(parent_rate * SYS_DIV_MIN / 2, parent_rate * SYS_DIV_MAX / 2);
                match parent_rate {
                    0 => 0,
                    _ => parent_rate * (rate * 2 / parent_rate) / 2,
                }
            }
            PllV3Type::Av => {
                if parent_rate == 0 {
                    return 0;
                }
                let rate = rate.clamp(parent_rate * AV_DIV_MIN, parent_rate * AV_DIV_MAX);
                let (div, mfn) = Self::av_solve(rate, parent_rate);
                Self::av_rate(parent_rate, div, mfn, AV_MFD)
            }
            PllV3Type::Enet | PllV3Type::Mlb => self.recalc_rate(io, parent_rate),
        }
    }

    /// Targets outside the lock range are clamped first, so this lands on
    /// the rate `round_rate` returned for the same target.
    fn set_rate(&self, io: &dyn RegisterIo, rate: u64, parent_rate: u64) -> Result<(), ClkError> {
        match self.pll_type {
            PllV3Type::Generic | PllV3Type::Usb => {
                let div = if rate >= parent_rate * 22 { 1 } else { 0 };
                self.write_div(io, div);
                Ok(())
            }
            PllV3Type::Sys => {
                if parent_rate == 0 {
                    return Err(ClkError::InvalidRate);
                }
                let rate = rate.clamp(parent_rate * SYS_DIV_MIN / 2, parent_rate * SYS_DIV_MAX / 2);
                self.write_div(io, rate * 2 / parent_rate);
                Ok(())
            }
            PllV3Type::Av => {
                if parent_rate == 0 {
                    return Err(ClkError::InvalidRate);
                }
                let rate = rate.clamp(parent_rate * AV_DIV_MIN, parent_rate * AV_DIV_MAX);
                let (div, mfn) = Self::av_solve(rate, parent_rate);
                self.write_div(io, div);
                io.write(self.base.offset(PLL_NUM_OFFSET), mfn as u32);
                io.write(self.base.offset(PLL_DENOM_OFFSET), AV_MFD as u32);
                Ok(())
            }
            PllV3Type::Enet | PllV3Type::Mlb => Err(ClkError::NoSupport),
        }
    }
}

impl ClkGate for PllV3 {
    /// Powers the PLL, waits for lock, then opens the output gate.
    fn enable(&self, io: &dyn RegisterIo) -> Result<(), ClkError> {
        let power = if self.power_up() {
            PLL_CTRL::POWER::SET
        } else {
            PLL_CTRL::POWER::CLEAR
        };
        io::modify_as(io, self.base, PLL_CTRL::BYPASS::CLEAR + power);
        io::poll(io, self.base, CONFIG.pll_lock_retries, |v| {
            LocalRegisterCopy::<u32, PLL_CTRL::Register>::new(v).is_set(PLL_CTRL::LOCK)
        })?;
        io.write(self.base, io.read(self.base) | self.gate_mask);
        Ok(())
    }

    fn disable(&self, io: &dyn RegisterIo) {
        let value = io.read(self.base) & !self.gate_mask;
        io.write(self.base, value);
        let power = if self.power_up() {
            PLL_CTRL::POWER::CLEAR
        } else {
            PLL_CTRL::POWER::SET
        };
        io::modify_as(io, self.base, PLL_CTRL::BYPASS::SET + power);
    }

    fn is_enabled(&self, io: &dyn RegisterIo) -> bool {
        io.read(self.base) & self.gate_mask == self.gate_mask
    }
}
