// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

use log::warn;

use crate::config::CONFIG;
use crate::errorcode::ClkError;
use crate::io::{self, Reg, RegisterIo};

/// Handshake status bit raised by the CCM while a divider or mux change is
/// in flight (CDHIPR on i.MX5/6).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BusyBit {
    reg: Reg,
    shift: u8,
}

impl BusyBit {
    pub fn new(reg: Reg, shift: u8) -> Result<BusyBit, ClkError> {
        if shift > 31 {
            return Err(ClkError::InvalidConfig);
        }
        Ok(BusyBit { reg, shift })
    }

    /// Spins until hardware drops the bit, bounded by
    /// `CONFIG.busy_poll_retries`.
    pub(crate) fn wait(&self, io: &dyn RegisterIo) -> Result<(), ClkError> {
        let mask = 1 << self.shift;
        io::poll(io, self.reg, CONFIG.busy_poll_retries, |v| v & mask == 0).inspect_err(|_| {
            warn!(
                "clk: busy bit {} at {:#010x} stuck",
                self.shift,
                self.reg.addr()
            );
        })
    }
}
