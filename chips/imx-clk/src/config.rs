// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Compile-time configuration of the clock engine.
//!
//! Values live in a typed `const` rather than behind `#[cfg]` so every code
//! path is type-checked even when an option is off. Boolean switches can be
//! flipped from a board crate through the matching cargo feature; numeric
//! limits are changed here.

/// Data structure holding compile-time configuration options.
pub(crate) struct Config {
    /// Trace every clock register read and write through `log::trace!`.
    ///
    /// Useful when bringing up a new clock table against a datasheet, far too
    /// noisy otherwise.
    pub(crate) trace_register_io: bool,

    /// How many times a busy mux or busy divider re-reads its status bit
    /// after a write before giving up with `ClkError::HwTimeout`.
    pub(crate) busy_poll_retries: usize,

    /// How many times a PLL enable re-reads its lock bit before giving up.
    // The i.MX5 DPLL driver waits at most 1000 x 1us. Without a delay
    // primitive we poll back to back, so the bound is larger.
    pub(crate) pll_lock_retries: usize,
}

/// A unique instance of `Config` where compile-time configuration options are
/// defined.
pub(crate) const CONFIG: Config = Config {
    trace_register_io: cfg!(feature = "trace_register_io"),
    busy_poll_retries: 10_000,
    pll_lock_retries: 100_000,
};
