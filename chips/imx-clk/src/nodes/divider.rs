// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Integer dividers.
//!
//! The register field holds `divisor - 1`, so a field of `width` bits covers
//! divisors 1 to `2^width`. Requests outside that range clamp to the nearest
//! end.

use tock_registers::fields::Field;

use crate::errorcode::ClkError;
use crate::hil::ClkRate;
use crate::io::{self, Reg, RegisterIo};
use crate::nodes::busy::BusyBit;

#[derive(Clone, Copy)]
pub struct Divider {
    reg: Reg,
    field: Field<u32, ()>,
}

impl Divider {
    pub fn new(reg: Reg, shift: u8, width: u8) -> Result<Divider, ClkError> {
        // A 32 bit field would need a divisor of 2^32.
        if width >= 32 {
            return Err(ClkError::InvalidConfig);
        }
        Ok(Divider {
            reg,
            field: io::field(shift, width)?,
        })
    }

    fn max_divisor(&self) -> u64 {
        u64::from(self.field.mask) + 1
    }

    /// Divisor whose output is nearest to `rate`.
    fn best_divisor(&self, rate: u64, parent_rate: u64) -> u64 {
        if rate == 0 {
            return self.max_divisor();
        }
        ((parent_rate + rate / 2) / rate).clamp(1, self.max_divisor())
    }

    fn divisor(&self, io: &dyn RegisterIo) -> u64 {
        u64::from(io::read_as::<()>(io, self.reg).read(self.field)) + 1
    }
}

impl ClkRate for Divider {
    fn recalc_rate(&self, io: &dyn RegisterIo, parent_rate: u64) -> u64 {
        parent_rate / self.divisor(io)
    }

    fn round_rate(&self, _io: &dyn RegisterIo, rate: u64, parent_rate: u64) -> u64 {
        parent_rate / self.best_divisor(rate, parent_rate)
    }

    fn set_rate(&self, io: &dyn RegisterIo, rate: u64, parent_rate: u64) -> Result<(), ClkError> {
        if rate == 0 {
            return Err(ClkError::InvalidRate);
        }
        let div = self.best_divisor(rate, parent_rate);
        io::modify_as(io, self.reg, self.field.val((div - 1) as u32));
        Ok(())
    }
}

/// Divider whose writes complete asynchronously; the CCM raises a busy bit
/// until the new ratio is in effect.
#[derive(Clone, Copy)]
pub struct BusyDivider {
    divider: Divider,
    busy: BusyBit,
}

impl BusyDivider {
    pub fn new(divider: Divider, busy: BusyBit) -> BusyDivider {
        BusyDivider { divider, busy }
    }
}

impl ClkRate for BusyDivider {
    fn recalc_rate(&self, io: &dyn RegisterIo, parent_rate: u64) -> u64 {
        self.divider.recalc_rate(io, parent_rate)
    }

    fn round_rate(&self, io: &dyn RegisterIo, rate: u64, parent_rate: u64) -> u64 {
        self.divider.round_rate(io, rate, parent_rate)
    }

    fn set_rate(&self, io: &dyn RegisterIo, rate: u64, parent_rate: u64) -> Result<(), ClkError> {
        self.divider.set_rate(io, rate, parent_rate)?;
        self.busy.wait(io)
    }
}
