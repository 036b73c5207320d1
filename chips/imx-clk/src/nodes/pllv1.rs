// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Legacy i.MX1/2/3 PLL (MPCTL/SPCTL style).
//!
//! The whole configuration lives in one register:
//!
//! ```text
//!  31 30   26 25      16 15  14   10 9        0
//! +-----+------+----------+-------+----------+
//! |     |  PD  |   MFD    |  MFI  |   MFN    |
//! +-----+------+----------+-------+----------+
//! ```
//!
//! ```text
//! rate = 2 * parent * (MFI + MFN / (MFD + 1)) / (PD + 1)
//! ```
//!
//! MFI values below 5 behave like 5. On later silicon revisions MFN is a
//! 10-bit two's complement number, so values from 0x200 up subtract from the
//! integer part; which interpretation applies is chosen with [`MfnEncoding`]
//! when the PLL is registered.
//!
//! These PLLs are programmed by the boot loader; the driver only reads them.

use tock_registers::register_bitfields;
use tock_registers::LocalRegisterCopy;

use crate::hil::ClkRate;
use crate::io::{Reg, RegisterIo};

register_bitfields![u32,
    PCTL [
        /// Pre-divider
        PD OFFSET(26) NUMBITS(4) [],
        /// Multiplication factor denominator
        MFD OFFSET(16) NUMBITS(10) [],
        /// Multiplication factor integer
        MFI OFFSET(10) NUMBITS(4) [],
        /// Multiplication factor numerator
        MFN OFFSET(0) NUMBITS(10) []
    ]
];

const MFI_MIN: u64 = 5;
const MFN_SIGN: u32 = 0x200;
const MFN_MODULUS: u32 = 0x400;

/// How the MFN field is interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MfnEncoding {
    Unsigned,
    TwosComplement,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PllV1 {
    reg: Reg,
    mfn: MfnEncoding,
}

impl PllV1 {
    pub const fn new(reg: Reg, mfn: MfnEncoding) -> PllV1 {
        PllV1 { reg, mfn }
    }
}

/// Decodes a PCTL value. A negative result saturates to 0.
pub fn decode(value: u32, parent_rate: u64, encoding: MfnEncoding) -> u64 {
    let pctl: LocalRegisterCopy<u32, PCTL::Register> = LocalRegisterCopy::new(value);
    let mfi = u64::from(pctl.read(PCTL::MFI)).max(MFI_MIN);
    let mfd = u64::from(pctl.read(PCTL::MFD));
    let pd = u64::from(pctl.read(PCTL::PD));
    let mfn = pctl.read(PCTL::MFN);

    let (mfn_abs, negative) = match encoding {
        MfnEncoding::TwosComplement if mfn >= MFN_SIGN => (MFN_MODULUS - mfn, true),
        _ => (mfn, false),
    };

    let freq = parent_rate * 2 / (pd + 1);
    let frac = freq * u64::from(mfn_abs) / (mfd + 1);
    if negative {
        (freq * mfi).saturating_sub(frac)
    } else {
        freq * mfi + frac
    }
}

impl ClkRate for PllV1 {
    fn recalc_rate(&self, io: &dyn RegisterIo, parent_rate: u64) -> u64 {
        decode(io.read(self.reg), parent_rate, self.mfn)
    }
}
