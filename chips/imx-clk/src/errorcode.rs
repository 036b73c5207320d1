// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Standard error enum for clock tree operations

use core::fmt;

/// Errors returned by the clock registry and by individual clock nodes.
///
/// Registration errors (`DuplicateName`, `UnknownParent`, `InvalidConfig`)
/// mean the platform clock table is wrong. Everything else is reported to the
/// driver that issued the request, which decides whether to retry or to treat
/// the clock as absent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClkError {
    /// A clock with this name is already registered
    DuplicateName,
    /// A parent name does not refer to an already registered clock
    UnknownParent,
    /// No clock or consumer mapping matches the request
    NotFound,
    /// `disable` was called more often than `enable`
    RefcountUnderflow,
    /// Hardware did not acknowledge a switch or a PLL did not lock in time
    HwTimeout,
    /// The requested rate cannot be produced by this clock
    InvalidRate,
    /// The requested parent is not one of the mux candidates
    InvalidParent,
    /// A register description or constant passed at registration is unusable
    InvalidConfig,
    /// Operation is not supported by this kind of clock
    NoSupport,
}

impl fmt::Display for ClkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            ClkError::DuplicateName => "duplicate clock name",
            ClkError::UnknownParent => "parent clock not registered",
            ClkError::NotFound => "clock not found",
            ClkError::RefcountUnderflow => "clock disabled more often than enabled",
            ClkError::HwTimeout => "clock hardware timed out",
            ClkError::InvalidRate => "rate not achievable",
            ClkError::InvalidParent => "not a candidate parent",
            ClkError::InvalidConfig => "invalid clock configuration",
            ClkError::NoSupport => "operation not supported by clock",
        };
        f.write_str(msg)
    }
}
