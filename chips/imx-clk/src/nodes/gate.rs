// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Clock gates.
//!
//! A gate passes its parent's rate through unchanged and only differs from a
//! wire in that it can be switched off. Three register encodings exist across
//! the i.MX families:
//!
//! - one bit, set to run (most peripheral gates),
//! - one bit, set to stop (e.g. PLL output gates and PFD gates),
//! - a two bit CCGR field, `0b11` to run in all modes and `0b00` to stop.

use tock_registers::fields::Field;

use crate::errorcode::ClkError;
use crate::hil::{ClkGate, ClkRate};
use crate::io::{self, Reg, RegisterIo};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateEncoding {
    SetToEnable,
    SetToDisable,
    /// CCM clock gating register field: 2 bits, `0b11` is on.
    TwoBit,
}

#[derive(Clone, Copy)]
pub struct Gate {
    reg: Reg,
    field: Field<u32, ()>,
    encoding: GateEncoding,
}

impl Gate {
    pub fn new(reg: Reg, shift: u8, encoding: GateEncoding) -> Result<Gate, ClkError> {
        let width = match encoding {
            GateEncoding::TwoBit => 2,
            GateEncoding::SetToEnable | GateEncoding::SetToDisable => 1,
        };
        Ok(Gate {
            reg,
            field: io::field(shift, width)?,
            encoding,
        })
    }

    fn on_value(&self) -> u32 {
        match self.encoding {
            GateEncoding::SetToEnable | GateEncoding::TwoBit => self.field.mask,
            GateEncoding::SetToDisable => 0,
        }
    }

    fn off_value(&self) -> u32 {
        self.field.mask ^ self.on_value()
    }
}

impl ClkRate for Gate {
    fn recalc_rate(&self, _io: &dyn RegisterIo, parent_rate: u64) -> u64 {
        parent_rate
    }
}

impl ClkGate for Gate {
    fn enable(&self, io: &dyn RegisterIo) -> Result<(), ClkError> {
        io::modify_as(io, self.reg, self.field.val(self.on_value()));
        Ok(())
    }

    fn disable(&self, io: &dyn RegisterIo) {
        io::modify_as(io, self.reg, self.field.val(self.off_value()));
    }

    fn is_enabled(&self, io: &dyn RegisterIo) -> bool {
        io::read_as::<()>(io, self.reg).read(self.field) == self.on_value()
    }
}
