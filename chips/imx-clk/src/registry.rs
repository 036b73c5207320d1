// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Clock registry.
//!
//! A `Registry` owns every clock of one platform together with its consumer
//! lookup table. Platform code creates it once, registers clocks from the
//! oscillators down to the leaf gates, adds its consumer table, and turns on
//! the clocks that must never stop. Drivers then share it by reference.
//!
//! All state sits behind a single spin lock. The clock control registers of
//! these SoCs form one block, so there is nothing to gain from finer locking,
//! and holding the lock across register sequences keeps read-modify-write
//! cycles from interleaving.
//!
//! Usage
//! -----
//!
//! ```rust,ignore
//! static IO: Mmio = unsafe { Mmio::new() };
//! let clocks = Registry::new(&IO);
//!
//! clocks.fixed("osc", 24_000_000)?;
//! clocks.pllv3("pll3_usb_otg", "osc", PllV3Type::Usb, Reg::new(0x020c_8010), 0x3)?;
//! clocks.fixed_factor("pll3_80m", "pll3_usb_otg", 1, 6)?;
//! clocks.divider("uart_serial_podf", "pll3_80m", CSCDR1, 0, 6)?;
//! clocks.gate2("uart_serial", "uart_serial_podf", CCGR5, 26)?;
//! clocks.add_lookup_entries(&[ClkLookup::new(Some("2020000.serial"), Some("per"), "uart_serial")])?;
//! clocks.enable_init_on(&["uart_serial"])?;
//!
//! let uart = clocks.clk_get(Some("2020000.serial"), Some("per"))?;
//! let baud_clock = uart.get_rate();
//! ```

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use log::{debug, error};
use spin::Mutex;

use crate::clk::Clk;
use crate::clkdev::ClkLookup;
use crate::errorcode::ClkError;
use crate::io::{Reg, RegisterIo, Traced};
use crate::nodes::busy::BusyBit;
use crate::nodes::divider::{BusyDivider, Divider};
use crate::nodes::fixed::{FixedFactor, FixedRate};
use crate::nodes::gate::{Gate, GateEncoding};
use crate::nodes::mux::{BusyMux, Mux};
use crate::nodes::pfd::Pfd;
use crate::nodes::pllv1::{MfnEncoding, PllV1};
use crate::nodes::pllv2::PllV2;
use crate::nodes::pllv3::{PllV3, PllV3Type, PLL_ENABLE};
use crate::nodes::{ClkKind, ClkType};
use crate::tree::ClkTree;

/// Handle to a registered clock, valid for the registry that returned it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClkId(usize);

impl ClkId {
    pub(crate) const fn from_index(index: usize) -> ClkId {
        ClkId(index)
    }

    pub(crate) const fn index(self) -> usize {
        self.0
    }
}

pub struct Registry<'a> {
    io: &'a dyn RegisterIo,
    tree: Mutex<ClkTree>,
}

impl<'a> Registry<'a> {
    pub const fn new(io: &'a dyn RegisterIo) -> Registry<'a> {
        Registry {
            io,
            tree: Mutex::new(ClkTree::new()),
        }
    }

    /// Runs `f` with the tree locked.
    pub(crate) fn with_tree<R>(&self, f: impl FnOnce(&mut ClkTree, &dyn RegisterIo) -> R) -> R {
        let io = Traced(self.io);
        let mut tree = self.tree.lock();
        f(&mut tree, &io)
    }

    /// Like `with_tree`, for ids supplied by the caller.
    fn with_node<R>(
        &self,
        id: ClkId,
        f: impl FnOnce(&mut ClkTree, &dyn RegisterIo, ClkId) -> R,
    ) -> Result<R, ClkError> {
        self.with_tree(|tree, io| {
            let id = tree.check(id)?;
            Ok(f(tree, io, id))
        })
    }

    /// Adds a clock.
    ///
    /// `parents` lists the parent names: none for fixed-rate roots, one for
    /// most kinds, and every selectable input in selector order for muxes.
    ///
    /// # Errors
    ///
    /// - `DuplicateName` if `name` is taken.
    /// - `UnknownParent` if a parent has not been registered yet.
    /// - `InvalidConfig` if the number of parents does not suit the kind.
    pub fn register(
        &self,
        name: &str,
        parents: &[&str],
        kind: impl Into<ClkKind>,
    ) -> Result<ClkId, ClkError> {
        let kind = kind.into();
        self.with_tree(|tree, io| tree.insert(io, name, kind, parents))
            .inspect_err(|err| error!("clk: cannot register {}: {}", name, err))
    }

    pub fn fixed(&self, name: &str, rate: u64) -> Result<ClkId, ClkError> {
        self.register(name, &[], FixedRate::new(rate))
    }

    pub fn fixed_factor(
        &self,
        name: &str,
        parent: &str,
        mult: u32,
        div: u32,
    ) -> Result<ClkId, ClkError> {
        self.register(name, &[parent], FixedFactor::new(mult, div)?)
    }

    /// Single bit gate, set to enable.
    pub fn gate(&self, name: &str, parent: &str, reg: Reg, shift: u8) -> Result<ClkId, ClkError> {
        self.register(name, &[parent], Gate::new(reg, shift, GateEncoding::SetToEnable)?)
    }

    /// Single bit gate, set to disable.
    pub fn gate_inverted(
        &self,
        name: &str,
        parent: &str,
        reg: Reg,
        shift: u8,
    ) -> Result<ClkId, ClkError> {
        self.register(name, &[parent], Gate::new(reg, shift, GateEncoding::SetToDisable)?)
    }

    /// Two bit CCGR gate.
    pub fn gate2(&self, name: &str, parent: &str, reg: Reg, shift: u8) -> Result<ClkId, ClkError> {
        self.register(name, &[parent], Gate::new(reg, shift, GateEncoding::TwoBit)?)
    }

    pub fn divider(
        &self,
        name: &str,
        parent: &str,
        reg: Reg,
        shift: u8,
        width: u8,
    ) -> Result<ClkId, ClkError> {
        self.register(name, &[parent], Divider::new(reg, shift, width)?)
    }

    pub fn busy_divider(
        &self,
        name: &str,
        parent: &str,
        reg: Reg,
        shift: u8,
        width: u8,
        busy_reg: Reg,
        busy_shift: u8,
    ) -> Result<ClkId, ClkError> {
        let divider = Divider::new(reg, shift, width)?;
        let busy = BusyBit::new(busy_reg, busy_shift)?;
        self.register(name, &[parent], BusyDivider::new(divider, busy))
    }

    pub fn mux(
        &self,
        name: &str,
        reg: Reg,
        shift: u8,
        width: u8,
        parents: &[&str],
    ) -> Result<ClkId, ClkError> {
        self.register(name, parents, Mux::new(reg, shift, width, parents.len())?)
    }

    pub fn busy_mux(
        &self,
        name: &str,
        reg: Reg,
        shift: u8,
        width: u8,
        busy_reg: Reg,
        busy_shift: u8,
        parents: &[&str],
    ) -> Result<ClkId, ClkError> {
        let mux = Mux::new(reg, shift, width, parents.len())?;
        let busy = BusyBit::new(busy_reg, busy_shift)?;
        self.register(name, parents, BusyMux::new(mux, busy))
    }

    pub fn pllv1(
        &self,
        name: &str,
        parent: &str,
        reg: Reg,
        mfn: MfnEncoding,
    ) -> Result<ClkId, ClkError> {
        self.register(name, &[parent], PllV1::new(reg, mfn))
    }

    pub fn pllv2(&self, name: &str, parent: &str, base: Reg) -> Result<ClkId, ClkError> {
        self.register(name, &[parent], PllV2::new(base))
    }

    /// PLLv3 gated by the standard ENABLE bit. Use `register` with
    /// `PllV3::new` for PLLs with other output gates, such as ENET.
    pub fn pllv3(
        &self,
        name: &str,
        parent: &str,
        pll_type: PllV3Type,
        base: Reg,
        div_mask: u32,
    ) -> Result<ClkId, ClkError> {
        self.register(name, &[parent], PllV3::new(base, pll_type, div_mask, PLL_ENABLE)?)
    }

    pub fn pfd(&self, name: &str, parent: &str, reg: Reg, idx: u8) -> Result<ClkId, ClkError> {
        self.register(name, &[parent], Pfd::new(reg, idx)?)
    }

    pub fn lookup_by_name(&self, name: &str) -> Result<ClkId, ClkError> {
        self.with_tree(|tree, _| tree.id(name))
    }

    /// Appends consumer mappings. Either all rows are added or none.
    ///
    /// # Errors
    ///
    /// `NotFound` if a row names an unregistered clock, `InvalidConfig` if a
    /// row wildcards both ids and so could never match.
    pub fn add_lookup_entries(&self, entries: &[ClkLookup<'_>]) -> Result<(), ClkError> {
        self.with_tree(|tree, _| {
            let resolved = entries
                .iter()
                .map(|entry| {
                    if entry.dev_id.is_none() && entry.con_id.is_none() {
                        return Err(ClkError::InvalidConfig);
                    }
                    tree.id(entry.clk)
                })
                .collect::<Result<Vec<_>, _>>()?;
            for (entry, id) in entries.iter().zip(resolved) {
                tree.clkdev.push(entry.dev_id, entry.con_id, id);
            }
            debug!("clk: {} consumer entries", tree.clkdev.len());
            Ok(())
        })
    }

    pub fn lookup_for_consumer(
        &self,
        dev_id: Option<&str>,
        con_id: Option<&str>,
    ) -> Result<ClkId, ClkError> {
        self.with_tree(|tree, _| tree.clkdev.find(dev_id, con_id).ok_or(ClkError::NotFound))
    }

    /// Consumer lookup returning a handle.
    pub fn clk_get(&self, dev_id: Option<&str>, con_id: Option<&str>) -> Result<Clk<'_>, ClkError> {
        self.lookup_for_consumer(dev_id, con_id)
            .map(|id| Clk::new(self, id))
    }

    pub fn clk(&self, id: ClkId) -> Result<Clk<'_>, ClkError> {
        self.with_node(id, |_, _, id| Clk::new(self, id))
    }

    /// Enables clocks that must run from boot onwards. Each name is resolved
    /// as a consumer device id first and as a clock name otherwise.
    ///
    /// All names are tried even if some fail; the first error is returned.
    pub fn enable_init_on(&self, names: &[&str]) -> Result<(), ClkError> {
        let mut first_err = None;
        for name in names {
            let result = self
                .lookup_for_consumer(Some(name), None)
                .or_else(|_| self.lookup_by_name(name))
                .and_then(|id| self.enable(id));
            if let Err(err) = result {
                error!("clk: cannot enable always-on clock {}: {}", name, err);
                first_err.get_or_insert(err);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    pub fn get_rate(&self, id: ClkId) -> Result<u64, ClkError> {
        self.with_node(id, |tree, io, id| tree.rate(io, id))
    }

    pub fn round_rate(&self, id: ClkId, rate: u64) -> Result<u64, ClkError> {
        self.with_node(id, |tree, io, id| tree.round_rate(io, id, rate))
    }

    /// Programs `id` to the achievable rate closest to `rate`. Cached rates of
    /// the clock and everything below it are dropped.
    ///
    /// # Errors
    ///
    /// `NoSupport` if the clock cannot change rate on its own, `InvalidRate`
    /// if it cannot get near `rate`, `HwTimeout` if the hardware did not
    /// confirm the change.
    pub fn set_rate(&self, id: ClkId, rate: u64) -> Result<(), ClkError> {
        self.with_node(id, |tree, io, id| tree.set_rate(io, id, rate))?
    }

    /// Switches a mux to `parent`, which must be one of its candidates.
    pub fn set_parent(&self, id: ClkId, parent: ClkId) -> Result<(), ClkError> {
        self.with_tree(|tree, io| {
            let id = tree.check(id)?;
            let parent = tree.check(parent)?;
            tree.set_parent(io, id, parent)
        })
    }

    pub fn get_parent(&self, id: ClkId) -> Result<Option<ClkId>, ClkError> {
        self.with_node(id, |tree, _, id| tree.node(id).parent)
    }

    /// Every parent the clock can be switched to, in selector order.
    pub fn parent_candidates(&self, id: ClkId) -> Result<Vec<ClkId>, ClkError> {
        self.with_node(id, |tree, _, id| tree.node(id).candidates.clone())
    }

    pub fn enable(&self, id: ClkId) -> Result<(), ClkError> {
        self.with_node(id, |tree, io, id| tree.enable(io, id))?
    }

    /// # Panics
    ///
    /// In debug builds, if the clock is not enabled.
    pub fn disable(&self, id: ClkId) -> Result<(), ClkError> {
        self.with_node(id, |tree, io, id| tree.disable(io, id))?
    }

    pub fn enable_count(&self, id: ClkId) -> Result<usize, ClkError> {
        self.with_node(id, |tree, _, id| tree.node(id).enable_count)
    }

    /// Hardware gate state for clocks with a gate, `enable_count > 0`
    /// otherwise.
    pub fn is_enabled(&self, id: ClkId) -> Result<bool, ClkError> {
        self.with_node(id, |tree, io, id| tree.is_enabled(io, id))
    }

    pub fn name(&self, id: ClkId) -> Result<String, ClkError> {
        self.with_node(id, |tree, _, id| tree.node(id).name.clone())
    }

    pub fn clk_type(&self, id: ClkId) -> Result<ClkType, ClkError> {
        self.with_node(id, |tree, _, id| tree.node(id).kind.clk_type())
    }

    /// Dumps the tree with enable counts and rates.
    pub fn write_summary(&self, w: &mut dyn fmt::Write) -> fmt::Result {
        self.with_tree(|tree, io| tree.write_summary(io, w))
    }
}
