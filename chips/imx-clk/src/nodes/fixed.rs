// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Clocks without registers: oscillators and fixed ratios.

use crate::errorcode::ClkError;
use crate::hil::ClkRate;
use crate::io::RegisterIo;

/// Root clock running at a constant rate, e.g. an external crystal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedRate {
    rate: u64,
}

impl FixedRate {
    pub const fn new(rate: u64) -> FixedRate {
        FixedRate { rate }
    }
}

impl ClkRate for FixedRate {
    fn recalc_rate(&self, _io: &dyn RegisterIo, _parent_rate: u64) -> u64 {
        self.rate
    }
}

/// Parent rate scaled by `mult / div`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedFactor {
    mult: u32,
    div: u32,
}

impl FixedFactor {
    pub fn new(mult: u32, div: u32) -> Result<FixedFactor, ClkError> {
        if div == 0 {
            return Err(ClkError::InvalidConfig);
        }
        Ok(FixedFactor { mult, div })
    }
}

impl ClkRate for FixedFactor {
    fn recalc_rate(&self, _io: &dyn RegisterIo, parent_rate: u64) -> u64 {
        let rate = u128::from(parent_rate) * u128::from(self.mult) / u128::from(self.div);
        u64::try_from(rate).unwrap_or(u64::MAX)
    }
}
