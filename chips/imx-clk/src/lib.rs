// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Clock tree management for NXP i.MX application processors.
//!
//! Platform code describes its clock control module (CCM/ANATOP) as a tree of
//! typed clock nodes in a [`Registry`]: fixed oscillators, PLLs, phase
//! fractional dividers, muxes, dividers and gates. Drivers then find their
//! clocks by consumer id and enable them, query rates or reprogram them
//! without knowing any register layout.
//!
//! The crate runs on the target through [`Mmio`] and on a host through
//! [`InMemoryIo`], which can also load a register dump taken from a board.

#![crate_name = "imx_clk"]
#![crate_type = "rlib"]
#![no_std]

extern crate alloc;
#[cfg(test)]
extern crate std;

pub mod clk;
pub mod clkdev;
mod config;
pub mod errorcode;
pub mod hil;
pub mod io;
pub mod nodes;
pub mod registry;
pub mod sim;
mod tree;

pub use crate::clk::Clk;
pub use crate::clkdev::ClkLookup;
pub use crate::errorcode::ClkError;
pub use crate::io::{Mmio, Reg, RegisterIo};
pub use crate::nodes::{ClkKind, ClkType};
pub use crate::registry::{ClkId, Registry};
pub use crate::sim::InMemoryIo;
