// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Host-side register space.
//!
//! `InMemoryIo` stands in for the clock control module when there is no
//! hardware: unit tests, or evaluating a clock tree against a register dump
//! taken from a running board. Unwritten registers read as zero.
//!
//! Two pieces of hardware behaviour are modelled because clock drivers rely
//! on them:
//!
//! - SET/CLR/TOG alias windows at +0x4/+0x8/+0xc, as used by the i.MX6
//!   ANATOP PFD registers.
//! - Status bits that change on their own after a number of polls, such as a
//!   CCM handshake busy bit clearing or a PLL lock bit rising.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use spin::Mutex;
use tock_registers::interfaces::{Readable, Writeable};
use tock_registers::registers::InMemoryRegister;

use crate::io::{Reg, RegisterIo};

const SET: usize = 0x4;
const CLR: usize = 0x8;
const TOG: usize = 0xc;

struct Settle {
    addr: usize,
    mask: u32,
    set: bool,
    reads_left: usize,
}

#[derive(Default)]
struct Space {
    cells: BTreeMap<usize, InMemoryRegister<u32>>,
    sct_bases: Vec<usize>,
    settling: Vec<Settle>,
}

impl Space {
    fn load(&self, addr: usize) -> u32 {
        self.cells.get(&addr).map_or(0, |cell| cell.get())
    }

    fn store(&mut self, addr: usize, value: u32) {
        self.cells
            .entry(addr)
            .or_insert_with(|| InMemoryRegister::new(0))
            .set(value);
    }
}

/// Register space backed by memory.
#[derive(Default)]
pub struct InMemoryIo {
    space: Mutex<Space>,
}

impl InMemoryIo {
    pub fn new() -> InMemoryIo {
        InMemoryIo::default()
    }

    /// Loads consecutive 32-bit words starting at `base`.
    pub fn from_dump(base: Reg, words: &[u32]) -> InMemoryIo {
        let io = InMemoryIo::new();
        for (i, word) in words.iter().enumerate() {
            io.set(base.offset(i * 4), *word);
        }
        io
    }

    /// Stores `value` directly, bypassing alias handling.
    pub fn set(&self, reg: Reg, value: u32) {
        self.space.lock().store(reg.addr(), value);
    }

    /// Returns the stored value without counting as a poll.
    pub fn get(&self, reg: Reg) -> u32 {
        self.space.lock().load(reg.addr())
    }

    /// Makes writes to `reg + 0x4`, `reg + 0x8` and `reg + 0xc` set, clear and
    /// toggle bits of `reg` instead of landing at their own address.
    pub fn add_set_clr_alias(&self, reg: Reg) {
        self.space.lock().sct_bases.push(reg.addr());
    }

    /// Sets (`set == true`) or clears the bits in `mask` of `reg` once
    /// `after_reads` reads have observed the current value.
    pub fn schedule(&self, reg: Reg, mask: u32, set: bool, after_reads: usize) {
        self.space.lock().settling.push(Settle {
            addr: reg.addr(),
            mask,
            set,
            reads_left: after_reads,
        });
    }
}

impl RegisterIo for InMemoryIo {
    fn read(&self, reg: Reg) -> u32 {
        let mut space = self.space.lock();
        let addr = reg.addr();
        let mut due = Vec::new();
        space.settling.retain_mut(|settle| {
            if settle.addr != addr {
                return true;
            }
            if settle.reads_left == 0 {
                due.push((settle.mask, settle.set));
                return false;
            }
            settle.reads_left -= 1;
            true
        });
        for (mask, set) in due {
            let value = space.load(addr);
            space.store(addr, if set { value | mask } else { value & !mask });
        }
        space.load(addr)
    }

    fn write(&self, reg: Reg, value: u32) {
        let mut space = self.space.lock();
        let addr = reg.addr();
        let alias = space
            .sct_bases
            .iter()
            .copied()
            .find(|&base| matches!(addr.checked_sub(base), Some(SET | CLR | TOG)));
        match alias {
            Some(base) => {
                let current = space.load(base);
                let next = match addr - base {
                    SET => current | value,
                    CLR => current & !value,
                    _ => current ^ value,
                };
                space.store(base, next);
            }
            None => space.store(addr, value),
        }
    }
}
