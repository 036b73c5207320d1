// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Clock kinds.
//!
//! Each submodule implements one hardware block against the traits in
//! [`crate::hil`]. [`ClkKind`] wraps them so the tree can store any kind in
//! one arena and ask it for the capabilities it has.

pub mod busy;
pub mod divider;
pub mod fixed;
pub mod gate;
pub mod mux;
pub mod pfd;
pub mod pllv1;
pub mod pllv2;
pub mod pllv3;

use crate::hil::{ClkGate, ClkRate, ClkSelect};

use self::divider::{BusyDivider, Divider};
use self::fixed::{FixedFactor, FixedRate};
use self::gate::Gate;
use self::mux::{BusyMux, Mux};
use self::pfd::Pfd;
use self::pllv1::PllV1;
use self::pllv2::PllV2;
use self::pllv3::PllV3;

/// Kind tag of a registered clock, for introspection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClkType {
    FixedRate,
    FixedFactor,
    Gate,
    Divider,
    Mux,
    BusyMux,
    BusyDivider,
    PllV1,
    PllV2,
    PllV3,
    Pfd,
}

#[derive(Clone, Copy)]
pub enum ClkKind {
    FixedRate(FixedRate),
    FixedFactor(FixedFactor),
    Gate(Gate),
    Divider(Divider),
    Mux(Mux),
    BusyMux(BusyMux),
    BusyDivider(BusyDivider),
    PllV1(PllV1),
    PllV2(PllV2),
    PllV3(PllV3),
    Pfd(Pfd),
}

impl ClkKind {
    pub fn clk_type(&self) -> ClkType {
        match self {
            ClkKind::FixedRate(_) => ClkType::FixedRate,
            ClkKind::FixedFactor(_) => ClkType::FixedFactor,
            ClkKind::Gate(_) => ClkType::Gate,
            ClkKind::Divider(_) => ClkType::Divider,
            ClkKind::Mux(_) => ClkType::Mux,
            ClkKind::BusyMux(_) => ClkType::BusyMux,
            ClkKind::BusyDivider(_) => ClkType::BusyDivider,
            ClkKind::PllV1(_) => ClkType::PllV1,
            ClkKind::PllV2(_) => ClkType::PllV2,
            ClkKind::PllV3(_) => ClkType::PllV3,
            ClkKind::Pfd(_) => ClkType::Pfd,
        }
    }

    /// Number of parent names registration expects for this kind.
    pub fn num_parents(&self) -> usize {
        match self {
            ClkKind::FixedRate(_) => 0,
            ClkKind::Mux(mux) => mux.num_parents(),
            ClkKind::BusyMux(mux) => mux.num_parents(),
            _ => 1,
        }
    }

    pub fn rate(&self) -> &dyn ClkRate {
        match self {
            ClkKind::FixedRate(k) => k,
            ClkKind::FixedFactor(k) => k,
            ClkKind::Gate(k) => k,
            ClkKind::Divider(k) => k,
            ClkKind::Mux(k) => k,
            ClkKind::BusyMux(k) => k,
            ClkKind::BusyDivider(k) => k,
            ClkKind::PllV1(k) => k,
            ClkKind::PllV2(k) => k,
            ClkKind::PllV3(k) => k,
            ClkKind::Pfd(k) => k,
        }
    }

    pub fn gate(&self) -> Option<&dyn ClkGate> {
        match self {
            ClkKind::Gate(k) => Some(k as &dyn ClkGate),
            ClkKind::PllV2(k) => Some(k as &dyn ClkGate),
            ClkKind::PllV3(k) => Some(k as &dyn ClkGate),
            ClkKind::Pfd(k) => Some(k as &dyn ClkGate),
            _ => None,
        }
    }

    pub fn select(&self) -> Option<&dyn ClkSelect> {
        match self {
            ClkKind::Mux(k) => Some(k as &dyn ClkSelect),
            ClkKind::BusyMux(k) => Some(k as &dyn ClkSelect),
            _ => None,
        }
    }
}

macro_rules! impl_from_kind {
    ($($variant:ident),*) => {
        $(
            impl From<$variant> for ClkKind {
                fn from(kind: $variant) -> ClkKind {
                    ClkKind::$variant(kind)
                }
            }
        )*
    };
}

impl_from_kind!(
    FixedRate,
    FixedFactor,
    Gate,
    Divider,
    Mux,
    BusyMux,
    BusyDivider,
    PllV1,
    PllV2,
    PllV3,
    Pfd
);
