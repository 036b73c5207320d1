// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Register accessor primitives shared by all clock kinds.
//!
//! Clock nodes never dereference addresses themselves. They describe their
//! registers as a [`Reg`] plus a `tock-registers` field and go through a
//! [`RegisterIo`] implementation, which is [`Mmio`] on the target and
//! [`InMemoryIo`](crate::sim::InMemoryIo) on a host.
//!
//! Read-modify-write sequences are only atomic with respect to other clock
//! operations: the registry holds its tree lock around every call into a node.

use log::trace;
use tock_registers::fields::{Field, FieldValue};
use tock_registers::interfaces::{Readable, Writeable};
use tock_registers::registers::ReadWrite;
use tock_registers::{LocalRegisterCopy, RegisterLongName};

use crate::config::CONFIG;
use crate::errorcode::ClkError;

/// Address of a 32-bit clock control register.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Reg(usize);

impl Reg {
    pub const fn new(addr: usize) -> Reg {
        Reg(addr)
    }

    pub const fn addr(self) -> usize {
        self.0
    }

    /// Register `bytes` past this one, e.g. a SET/CLR alias or the NUM
    /// register of an audio PLL.
    pub const fn offset(self, bytes: usize) -> Reg {
        Reg(self.0 + bytes)
    }
}

/// Word access to the clock control register space.
pub trait RegisterIo: Sync {
    fn read(&self, reg: Reg) -> u32;
    fn write(&self, reg: Reg, value: u32);
}

/// Memory-mapped register access for the running SoC.
pub struct Mmio {
    _private: (),
}

impl Mmio {
    /// # Safety
    ///
    /// Every `Reg` later passed to this accessor must be the address of a
    /// device register that is valid for volatile 32-bit access, and nothing
    /// outside the clock registry may program those registers.
    pub const unsafe fn new() -> Mmio {
        Mmio { _private: () }
    }

    fn register(&self, reg: Reg) -> &ReadWrite<u32> {
        // Safety: the contract of `Mmio::new` guarantees `reg` is a valid
        // device register.
        unsafe { &*(reg.addr() as *const ReadWrite<u32>) }
    }
}

impl RegisterIo for Mmio {
    fn read(&self, reg: Reg) -> u32 {
        self.register(reg).get()
    }

    fn write(&self, reg: Reg, value: u32) {
        self.register(reg).set(value);
    }
}

/// Wraps another accessor and traces every access when
/// `trace_register_io` is configured.
pub(crate) struct Traced<'a>(pub(crate) &'a dyn RegisterIo);

impl RegisterIo for Traced<'_> {
    fn read(&self, reg: Reg) -> u32 {
        let value = self.0.read(reg);
        if CONFIG.trace_register_io {
            trace!("clk: read  {:#010x} -> {:#010x}", reg.addr(), value);
        }
        value
    }

    fn write(&self, reg: Reg, value: u32) {
        if CONFIG.trace_register_io {
            trace!("clk: write {:#010x} <- {:#010x}", reg.addr(), value);
        }
        self.0.write(reg, value);
    }
}

pub(crate) fn read_as<R: RegisterLongName>(io: &dyn RegisterIo, reg: Reg) -> LocalRegisterCopy<u32, R> {
    LocalRegisterCopy::new(io.read(reg))
}

pub(crate) fn modify_as<R: RegisterLongName>(io: &dyn RegisterIo, reg: Reg, value: FieldValue<u32, R>) {
    let mut local: LocalRegisterCopy<u32, R> = read_as(io, reg);
    local.modify(value);
    io.write(reg, local.get());
}

/// Builds a field descriptor for a bit range only known at registration.
pub(crate) fn field(shift: u8, width: u8) -> Result<Field<u32, ()>, ClkError> {
    if width == 0 || u32::from(shift) + u32::from(width) > 32 {
        return Err(ClkError::InvalidConfig);
    }
    let mask = if width == 32 {
        u32::MAX
    } else {
        (1 << width) - 1
    };
    Ok(Field::new(mask, usize::from(shift)))
}

/// Re-reads `reg` until `done` holds, at most `retries` times.
pub(crate) fn poll(
    io: &dyn RegisterIo,
    reg: Reg,
    retries: usize,
    done: impl Fn(u32) -> bool,
) -> Result<(), ClkError> {
    for _ in 0..retries {
        if done(io.read(reg)) {
            return Ok(());
        }
    }
    Err(ClkError::HwTimeout)
}
