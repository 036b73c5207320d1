// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! i.MX5 digital PLL (DPLLIP).
//!
//! Each DPLL has two register sets for its operating point, the normal one
//! (DP_OP/DP_MFD/DP_MFN) and the hardware frequency switch copy
//! (DP_HFS_OP/DP_HFS_MFD/DP_HFS_MFN); DP_CTL.HFSM selects which is live.
//!
//! ```text
//! ref  = 2 * parent * (DPDCK0_2_EN ? 2 : 1) / (PDF + 1)
//! rate = ref * MFI + ref * MFN / (MFD + 1)
//! ```
//!
//! MFI is clamped to at least 5 and MFN is a 27-bit two's complement
//! numerator.
//!
//! Usage
//! -----
//!
//! ```rust,ignore
//! let pll1 = registry.pllv2("pll1_sw", "osc", Reg::new(0x63f8_0000))?;
//! registry.set_rate(pll1, 800_000_000)?;
//! assert_eq!(registry.get_rate(pll1), Ok(799_999_968));
//! ```

use tock_registers::register_bitfields;
use tock_registers::LocalRegisterCopy;

use crate::config::CONFIG;
use crate::errorcode::ClkError;
use crate::hil::{ClkGate, ClkRate};
use crate::io::{self, Reg, RegisterIo};

register_bitfields![u32,
    DP_CTL [
        /// Output doubler enable
        DPDCK0_2_EN OFFSET(12) NUMBITS(1) [],
        /// Hardware frequency switch mode: use the DP_HFS_* registers
        HFSM OFFSET(7) NUMBITS(1) [],
        /// PLL enable
        UPEN OFFSET(5) NUMBITS(1) [],
        /// Lock flag
        LRF OFFSET(0) NUMBITS(1) []
    ],
    DP_OP [
        MFI OFFSET(4) NUMBITS(4) [],
        PDF OFFSET(0) NUMBITS(4) []
    ],
    DP_MF [
        VALUE OFFSET(0) NUMBITS(27) []
    ]
];

const DP_CTL_OFFSET: usize = 0x00;
const DP_OP_OFFSET: usize = 0x08;
const DP_MFD_OFFSET: usize = 0x0c;
const DP_MFN_OFFSET: usize = 0x10;
const DP_HFS_OP_OFFSET: usize = 0x1c;
const DP_HFS_MFD_OFFSET: usize = 0x20;
const DP_HFS_MFN_OFFSET: usize = 0x24;

const MFI_MIN: u64 = 5;
const MFI_MAX: u64 = 15;
const PDF_COUNT: u64 = 16;
const MFN_SIGN: u32 = 0x0400_0000;
const MFN_MODULUS: u32 = 0x0800_0000;
/// Denominator used when programming; MFN then counts millionths of the
/// reference.
const MFD_PROGRAMMED: u32 = 999_999;

/// Operating point of a DPLL as held in DP_OP/DP_MFD/DP_MFN.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct OpPoint {
    op: u32,
    mfd: u32,
    mfn: u32,
}

impl OpPoint {
    fn decode(&self, parent_rate: u64, doubled: bool) -> u64 {
        let op: LocalRegisterCopy<u32, DP_OP::Register> = LocalRegisterCopy::new(self.op);
        let pdf = u64::from(op.read(DP_OP::PDF));
        let mfi = u64::from(op.read(DP_OP::MFI)).max(MFI_MIN);
        let mfd = u64::from(self.mfd & DP_MF::VALUE.mask);
        let mfn = self.mfn & DP_MF::VALUE.mask;
        let (mfn_abs, negative) = if mfn >= MFN_SIGN {
            (MFN_MODULUS - mfn, true)
        } else {
            (mfn, false)
        };

        let mut ref_clk = 2 * parent_rate;
        if doubled {
            ref_clk *= 2;
        }
        ref_clk /= pdf + 1;
        let frac = ref_clk * u64::from(mfn_abs) / (mfd + 1);
        if negative {
            (ref_clk * mfi).saturating_sub(frac)
        } else {
            ref_clk * mfi + frac
        }
    }

    /// Finds the smallest predivider that keeps MFI in range, with the
    /// output doubler on.
    fn solve(rate: u64, parent_rate: u64) -> Result<OpPoint, ClkError> {
        let quad = 4 * parent_rate;
        let step = quad / 1_000_000;
        if step == 0 {
            return Err(ClkError::InvalidRate);
        }

        let mut pdf = 0;
        let mut mfi = rate / quad;
        while mfi < MFI_MIN && pdf + 1 < PDF_COUNT {
            pdf += 1;
            mfi = rate * (pdf + 1) / quad;
        }
        if !(MFI_MIN..=MFI_MAX).contains(&mfi) {
            return Err(ClkError::InvalidRate);
        }

        let mfn = (rate * (pdf + 1) - quad * mfi) / step;
        let mut op: LocalRegisterCopy<u32, DP_OP::Register> = LocalRegisterCopy::new(0);
        op.modify(DP_OP::MFI.val(mfi as u32) + DP_OP::PDF.val(pdf as u32));
        Ok(OpPoint {
            op: op.get(),
            mfd: MFD_PROGRAMMED,
            mfn: mfn as u32,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PllV2 {
    base: Reg,
}

impl PllV2 {
    pub const fn new(base: Reg) -> PllV2 {
        PllV2 { base }
    }

    fn ctl(&self) -> Reg {
        self.base.offset(DP_CTL_OFFSET)
    }

    /// OP, MFD and MFN registers currently driving the output.
    fn live_regs(&self, io: &dyn RegisterIo) -> [Reg; 3] {
        if io::read_as::<DP_CTL::Register>(io, self.ctl()).is_set(DP_CTL::HFSM) {
            [DP_HFS_OP_OFFSET, DP_HFS_MFD_OFFSET, DP_HFS_MFN_OFFSET].map(|o| self.base.offset(o))
        } else {
            [DP_OP_OFFSET, DP_MFD_OFFSET, DP_MFN_OFFSET].map(|o| self.base.offset(o))
        }
    }

    /// Clamps `rate` into the range `solve` can encode.
    fn clamp(rate: u64, parent_rate: u64) -> u64 {
        let quad = 4 * parent_rate;
        let min = quad * MFI_MIN / PDF_COUNT;
        let max = (quad * (MFI_MAX + 1)).saturating_sub(1);
        rate.clamp(min, max.max(min))
    }
}

impl ClkRate for PllV2 {
    fn recalc_rate(&self, io: &dyn RegisterIo, parent_rate: u64) -> u64 {
        let doubled = io::read_as::<DP_CTL::Register>(io, self.ctl()).is_set(DP_CTL::DPDCK0_2_EN);
        let [op, mfd, mfn] = self.live_regs(io);
        OpPoint {
            op: io.read(op),
            mfd: io.read(mfd),
            mfn: io.read(mfn),
        }
        .decode(parent_rate, doubled)
    }

    fn round_rate(&self, io: &dyn RegisterIo, rate: u64, parent_rate: u64) -> u64 {
        match OpPoint::solve(Self::clamp(rate, parent_rate), parent_rate) {
            Ok(point) => point.decode(parent_rate, true),
            Err(_) => self.recalc_rate(io, parent_rate),
        }
    }

    /// Clamps the target into the lock range like `round_rate` does.
    fn set_rate(&self, io: &dyn RegisterIo, rate: u64, parent_rate: u64) -> Result<(), ClkError> {
        let point = OpPoint::solve(Self::clamp(rate, parent_rate), parent_rate)?;
        io::modify_as(io, self.ctl(), DP_CTL::DPDCK0_2_EN::SET);
        let [op, mfd, mfn] = self.live_regs(io);
        io.write(op, point.op);
        io.write(mfd, point.mfd);
        io.write(mfn, point.mfn);
        Ok(())
    }
}

impl ClkGate for PllV2 {
    fn enable(&self, io: &dyn RegisterIo) -> Result<(), ClkError> {
        io::modify_as(io, self.ctl(), DP_CTL::UPEN::SET);
        io::poll(io, self.ctl(), CONFIG.pll_lock_retries, |v| {
            v & DP_CTL::LRF.mask != 0
        })
    }

    fn disable(&self, io: &dyn RegisterIo) {
        io::modify_as(io, self.ctl(), DP_CTL::UPEN::CLEAR);
    }

    fn is_enabled(&self, io: &dyn RegisterIo) -> bool {
        io::read_as::<DP_CTL::Register>(io, self.ctl()).is_set(DP_CTL::UPEN)
    }
}
