// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Capabilities a clock kind can implement.
//!
//! Every kind computes a rate ([`ClkRate`]). Kinds with a hardware enable
//! bit also implement [`ClkGate`], and kinds that pick their input from a
//! list of candidates implement [`ClkSelect`]. The tree only deals in these
//! traits; bit layouts stay inside the kind.
//!
//! None of these methods keep software state. Reference counting, rate
//! caching and parent links belong to the registry, which also holds its lock
//! around every call.

use crate::errorcode::ClkError;
use crate::io::RegisterIo;

pub trait ClkRate {
    /// Output rate in Hz for the current register contents, given the rate
    /// of the active parent (0 for roots).
    fn recalc_rate(&self, io: &dyn RegisterIo, parent_rate: u64) -> u64;

    /// Closest rate to `rate` that `set_rate` would produce. Must not touch
    /// hardware.
    fn round_rate(&self, io: &dyn RegisterIo, rate: u64, parent_rate: u64) -> u64 {
        let _ = rate;
        self.recalc_rate(io, parent_rate)
    }

    /// Programs the output rate.
    ///
    /// # Errors
    ///
    /// - `NoSupport` if the kind has nothing to program.
    /// - `InvalidRate` if `rate` is outside what the hardware can encode.
    /// - `HwTimeout` if the hardware did not acknowledge the change.
    fn set_rate(&self, io: &dyn RegisterIo, rate: u64, parent_rate: u64) -> Result<(), ClkError> {
        let _ = (io, rate, parent_rate);
        Err(ClkError::NoSupport)
    }
}

pub trait ClkGate {
    /// Opens the gate. Called on the 0 -> 1 reference count transition, after
    /// the parent is running.
    fn enable(&self, io: &dyn RegisterIo) -> Result<(), ClkError>;

    /// Closes the gate. Called on the 1 -> 0 reference count transition.
    fn disable(&self, io: &dyn RegisterIo);

    /// Gate state as read back from hardware.
    fn is_enabled(&self, io: &dyn RegisterIo) -> bool;
}

pub trait ClkSelect {
    /// Index into the candidate parent list currently selected in hardware.
    fn parent_index(&self, io: &dyn RegisterIo) -> usize;

    /// Programs the selector.
    ///
    /// # Errors
    ///
    /// `InvalidParent` if `index` is not a candidate, `HwTimeout` if the
    /// hardware did not acknowledge the switch.
    fn set_parent_index(&self, io: &dyn RegisterIo, index: usize) -> Result<(), ClkError>;
}
