// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Clock multiplexers.
//!
//! The selector field value is the index into the candidate parent list
//! given at registration.

use tock_registers::fields::Field;

use crate::errorcode::ClkError;
use crate::hil::{ClkRate, ClkSelect};
use crate::io::{self, Reg, RegisterIo};
use crate::nodes::busy::BusyBit;

#[derive(Clone, Copy)]
pub struct Mux {
    reg: Reg,
    field: Field<u32, ()>,
    num_parents: usize,
}

impl Mux {
    pub fn new(reg: Reg, shift: u8, width: u8, num_parents: usize) -> Result<Mux, ClkError> {
        let field = io::field(shift, width)?;
        if num_parents == 0 || num_parents as u64 > u64::from(field.mask) + 1 {
            return Err(ClkError::InvalidConfig);
        }
        Ok(Mux {
            reg,
            field,
            num_parents,
        })
    }

    pub fn num_parents(&self) -> usize {
        self.num_parents
    }
}

impl ClkRate for Mux {
    fn recalc_rate(&self, _io: &dyn RegisterIo, parent_rate: u64) -> u64 {
        parent_rate
    }
}

impl ClkSelect for Mux {
    fn parent_index(&self, io: &dyn RegisterIo) -> usize {
        io::read_as::<()>(io, self.reg).read(self.field) as usize
    }

    fn set_parent_index(&self, io: &dyn RegisterIo, index: usize) -> Result<(), ClkError> {
        if index >= self.num_parents {
            return Err(ClkError::InvalidParent);
        }
        io::modify_as(io, self.reg, self.field.val(index as u32));
        Ok(())
    }
}

/// Mux that reports an in-progress switch through a busy bit. Used for the
/// glitchless periph/axi/ahb selectors of the i.MX5/6 CCM.
#[derive(Clone, Copy)]
pub struct BusyMux {
    mux: Mux,
    busy: BusyBit,
}

impl BusyMux {
    pub fn new(mux: Mux, busy: BusyBit) -> BusyMux {
        BusyMux { mux, busy }
    }

    pub fn num_parents(&self) -> usize {
        self.mux.num_parents()
    }
}

impl ClkRate for BusyMux {
    fn recalc_rate(&self, _io: &dyn RegisterIo, parent_rate: u64) -> u64 {
        parent_rate
    }
}

impl ClkSelect for BusyMux {
    fn parent_index(&self, io: &dyn RegisterIo) -> usize {
        self.mux.parent_index(io)
    }

    fn set_parent_index(&self, io: &dyn RegisterIo, index: usize) -> Result<(), ClkError> {
        self.mux.set_parent_index(io, index)?;
        self.busy.wait(io)
    }
}
