// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! A slice of the i.MX6Quad clock tree evaluated against a register dump.

use imx_clk::nodes::pllv3::PllV3Type;
use imx_clk::{ClkError, ClkLookup, InMemoryIo, Reg, Registry};

const CCM_BASE: Reg = Reg::new(0x020c_4000);
const CBCDR: Reg = CCM_BASE.offset(0x14);
const CBCMR: Reg = CCM_BASE.offset(0x18);
const CSCDR1: Reg = CCM_BASE.offset(0x24);
const CDHIPR: Reg = CCM_BASE.offset(0x48);
const CCGR5: Reg = CCM_BASE.offset(0x7c);

const PLL_USB1: Reg = Reg::new(0x020c_8010);
const PLL_BUS: Reg = Reg::new(0x020c_8030);
const PFD_528: Reg = Reg::new(0x020c_8100);

const UART1: &str = "2020000.serial";

/// CCM registers up to CSCDR1 as read from a board running at reset defaults
/// with periph_pre on PFD2 and AHB at /3.
const CCM_DUMP: [u32; 10] = [
    0x0402_6800,
    0x0000_0000,
    0x0000_0000,
    0x0000_0010,
    0x0000_0100,
    0x0000_0900, // CBCDR: ahb_podf 2, ipg_podf 1
    0x0004_0000, // CBCMR: pre_periph_clk_sel 1
    0x0000_0000,
    0x0000_0000,
    0x0000_0000, // CSCDR1: uart_clk_podf 0
];

fn board_io() -> InMemoryIo {
    let io = InMemoryIo::from_dump(CCM_BASE, &CCM_DUMP);
    // Locked, enabled, 480 MHz.
    io.set(PLL_USB1, 0x8000_3000);
    // Locked, enabled, 528 MHz.
    io.set(PLL_BUS, 0x8000_2001);
    io.add_set_clr_alias(PFD_528);
    // PFD0 27, PFD1 16, PFD2 24, all ungated.
    io.set(PFD_528, 0x0018_101b);
    io
}

fn board_clocks(io: &InMemoryIo) -> Registry<'_> {
    let clocks = Registry::new(io);
    register_tree(&clocks).unwrap();
    clocks
}

fn register_tree(clocks: &Registry<'_>) -> Result<(), ClkError> {
    clocks.fixed("osc", 24_000_000)?;
    clocks.pllv3("pll2_bus", "osc", PllV3Type::Generic, PLL_BUS, 0x1)?;
    clocks.pllv3("pll3_usb_otg", "osc", PllV3Type::Usb, PLL_USB1, 0x3)?;
    clocks.pfd("pll2_pfd0_352m", "pll2_bus", PFD_528, 0)?;
    clocks.pfd("pll2_pfd2_396m", "pll2_bus", PFD_528, 2)?;
    clocks.fixed_factor("pll2_198m", "pll2_pfd2_396m", 1, 2)?;
    clocks.fixed_factor("pll3_80m", "pll3_usb_otg", 1, 6)?;

    clocks.mux(
        "periph_pre",
        CBCMR,
        18,
        2,
        &["pll2_bus", "pll2_pfd2_396m", "pll2_pfd0_352m", "pll2_198m"],
    )?;
    clocks.busy_mux("periph", CBCDR, 25, 1, CDHIPR, 5, &["periph_pre", "osc"])?;
    clocks.busy_divider("ahb", "periph", CBCDR, 10, 3, CDHIPR, 1)?;
    clocks.divider("ipg", "ahb", CBCDR, 8, 2)?;
    clocks.divider("uart_serial_podf", "pll3_80m", CSCDR1, 0, 6)?;
    clocks.gate2("uart_ipg", "ipg", CCGR5, 24)?;
    clocks.gate2("uart_serial", "uart_serial_podf", CCGR5, 26)?;

    clocks.add_lookup_entries(&[
        ClkLookup::new(Some(UART1), Some("ipg"), "uart_ipg"),
        ClkLookup::new(Some(UART1), Some("per"), "uart_serial"),
        ClkLookup::new(Some(UART1), None, "uart_ipg"),
        ClkLookup::new(None, Some("ahb"), "ahb"),
    ])
}

/// Same tree as `register_tree`, with the independent branches registered
/// in a different order.
fn register_tree_interleaved(clocks: &Registry<'_>) -> Result<(), ClkError> {
    clocks.fixed("osc", 24_000_000)?;
    clocks.pllv3("pll3_usb_otg", "osc", PllV3Type::Usb, PLL_USB1, 0x3)?;
    clocks.fixed_factor("pll3_80m", "pll3_usb_otg", 1, 6)?;
    clocks.divider("uart_serial_podf", "pll3_80m", CSCDR1, 0, 6)?;
    clocks.gate2("uart_serial", "uart_serial_podf", CCGR5, 26)?;
    clocks.pllv3("pll2_bus", "osc", PllV3Type::Generic, PLL_BUS, 0x1)?;
    clocks.pfd("pll2_pfd2_396m", "pll2_bus", PFD_528, 2)?;
    clocks.fixed_factor("pll2_198m", "pll2_pfd2_396m", 1, 2)?;
    clocks.pfd("pll2_pfd0_352m", "pll2_bus", PFD_528, 0)?;

    clocks.mux(
        "periph_pre",
        CBCMR,
        18,
        2,
        &["pll2_bus", "pll2_pfd2_396m", "pll2_pfd0_352m", "pll2_198m"],
    )?;
    clocks.busy_mux("periph", CBCDR, 25, 1, CDHIPR, 5, &["periph_pre", "osc"])?;
    clocks.busy_divider("ahb", "periph", CBCDR, 10, 3, CDHIPR, 1)?;
    clocks.divider("ipg", "ahb", CBCDR, 8, 2)?;
    clocks.gate2("uart_ipg", "ipg", CCGR5, 24)?;
    Ok(())
}

const TREE_NAMES: [&str; 14] = [
    "osc",
    "pll2_bus",
    "pll3_usb_otg",
    "pll2_pfd0_352m",
    "pll2_pfd2_396m",
    "pll2_198m",
    "pll3_80m",
    "periph_pre",
    "periph",
    "ahb",
    "ipg",
    "uart_serial_podf",
    "uart_ipg",
    "uart_serial",
];

fn rate(clocks: &Registry<'_>, name: &str) -> u64 {
    clocks
        .get_rate(clocks.lookup_by_name(name).unwrap())
        .unwrap()
}

#[test]
fn rates_from_dump() {
    let io = board_io();
    let clocks = board_clocks(&io);
    assert_eq!(rate(&clocks, "pll2_bus"), 528_000_000);
    assert_eq!(rate(&clocks, "pll3_usb_otg"), 480_000_000);
    assert_eq!(rate(&clocks, "pll2_pfd0_352m"), 352_000_000);
    assert_eq!(rate(&clocks, "pll2_198m"), 198_000_000);
    assert_eq!(rate(&clocks, "periph"), 396_000_000);
    assert_eq!(rate(&clocks, "ahb"), 132_000_000);
    assert_eq!(rate(&clocks, "ipg"), 66_000_000);
    assert_eq!(rate(&clocks, "uart_serial"), 80_000_000);
}

#[test]
fn registration_order_does_not_change_the_tree() {
    let io_a = board_io();
    let a = board_clocks(&io_a);
    let io_b = board_io();
    let b = Registry::new(&io_b);
    register_tree_interleaved(&b).unwrap();

    let shape = |clocks: &Registry<'_>, name: &str| {
        let id = clocks.lookup_by_name(name).unwrap();
        let parent = clocks
            .get_parent(id)
            .unwrap()
            .map(|parent| clocks.name(parent).unwrap());
        let candidates: Vec<String> = clocks
            .parent_candidates(id)
            .unwrap()
            .into_iter()
            .map(|candidate| clocks.name(candidate).unwrap())
            .collect();
        (parent, candidates, clocks.get_rate(id).unwrap())
    };
    for name in TREE_NAMES {
        assert_eq!(shape(&a, name), shape(&b, name), "{}", name);
    }
}

#[test]
fn parents_must_come_first() {
    let io = board_io();
    let clocks = Registry::new(&io);
    assert_eq!(
        clocks.divider("ipg", "ahb", CBCDR, 8, 2),
        Err(ClkError::UnknownParent)
    );
    assert_eq!(
        clocks.mux("periph_pre", CBCMR, 18, 2, &["pll2_bus"]),
        Err(ClkError::UnknownParent)
    );
    assert_eq!(clocks.lookup_by_name("ipg"), Err(ClkError::NotFound));
    register_tree(&clocks).unwrap();
    assert_eq!(clocks.fixed("osc", 24_000_000), Err(ClkError::DuplicateName));
}

#[test]
fn consumer_lookup_precedence() {
    let io = board_io();
    let clocks = board_clocks(&io);
    let uart_ipg = clocks.lookup_by_name("uart_ipg").unwrap();
    let uart_serial = clocks.lookup_by_name("uart_serial").unwrap();
    let ahb = clocks.lookup_by_name("ahb").unwrap();

    assert_eq!(clocks.clk_get(Some(UART1), Some("per")).unwrap().id(), uart_serial);
    assert_eq!(clocks.clk_get(Some(UART1), Some("ipg")).unwrap().id(), uart_ipg);
    // The device entry outranks the connection-only "ahb" entry.
    assert_eq!(clocks.clk_get(Some(UART1), Some("ahb")).unwrap().id(), uart_ipg);
    assert_eq!(clocks.clk_get(Some("2021c000.serial"), Some("ahb")).unwrap().id(), ahb);
    assert_eq!(
        clocks.clk_get(Some("2021c000.serial"), Some("per")).err(),
        Some(ClkError::NotFound)
    );
}

#[test]
fn enable_reaches_the_pll() {
    let io = board_io();
    let clocks = board_clocks(&io);
    let per = clocks.clk_get(Some(UART1), Some("per")).unwrap();
    let pll3 = clocks.clk(clocks.lookup_by_name("pll3_usb_otg").unwrap()).unwrap();
    let osc = clocks.clk(clocks.lookup_by_name("osc").unwrap()).unwrap();

    per.enable().unwrap();
    assert_eq!((io.get(CCGR5) >> 26) & 0b11, 0b11);
    assert_eq!(pll3.enable_count(), 1);
    assert_eq!(osc.enable_count(), 1);
    assert!(pll3.is_enabled());

    per.disable().unwrap();
    assert_eq!((io.get(CCGR5) >> 26) & 0b11, 0);
    assert!(!per.is_enabled());
    // The PLL keeps running for whoever else may use it.
    assert_eq!(pll3.enable_count(), 1);
    assert_eq!(io.get(PLL_USB1) & (1 << 13), 1 << 13);
}

#[test]
fn shared_ancestor_counts_children() {
    let io = board_io();
    let clocks = board_clocks(&io);
    let ipg = clocks.clk_get(Some(UART1), Some("ipg")).unwrap();
    let per = clocks.clk_get(Some(UART1), Some("per")).unwrap();
    let osc = clocks.clk(clocks.lookup_by_name("osc").unwrap()).unwrap();

    ipg.enable().unwrap();
    per.enable().unwrap();
    // One reference through pll2_bus, one through pll3_usb_otg.
    assert_eq!(osc.enable_count(), 2);
    assert_eq!((io.get(CCGR5) >> 24) & 0xf, 0xf);
}

#[test]
#[cfg(debug_assertions)]
#[should_panic(expected = "disabled more often than enabled")]
fn unbalanced_disable_panics_in_debug() {
    let io = board_io();
    let clocks = board_clocks(&io);
    let per = clocks.clk_get(Some(UART1), Some("per")).unwrap();
    let _ = per.disable();
}

#[test]
#[cfg(not(debug_assertions))]
fn unbalanced_disable_reported_in_release() {
    let io = board_io();
    let clocks = board_clocks(&io);
    let per = clocks.clk_get(Some(UART1), Some("per")).unwrap();
    assert_eq!(per.disable(), Err(ClkError::RefcountUnderflow));
}

#[test]
fn ahb_divider_handshake() {
    let io = board_io();
    let clocks = board_clocks(&io);
    let ahb = clocks.lookup_by_name("ahb").unwrap();
    assert_eq!(rate(&clocks, "ipg"), 66_000_000);

    io.set(CDHIPR, 1 << 1);
    io.schedule(CDHIPR, 1 << 1, false, 3);
    clocks.set_rate(ahb, 198_000_000).unwrap();
    assert_eq!((io.get(CBCDR) >> 10) & 0x7, 1);
    assert_eq!(rate(&clocks, "ahb"), 198_000_000);
    // Cached descendants follow.
    assert_eq!(rate(&clocks, "ipg"), 99_000_000);
}

#[test]
fn periph_switch_times_out() {
    let io = board_io();
    let clocks = board_clocks(&io);
    let periph = clocks.lookup_by_name("periph").unwrap();
    let periph_pre = clocks.lookup_by_name("periph_pre").unwrap();
    let osc = clocks.lookup_by_name("osc").unwrap();

    io.set(CDHIPR, 1 << 5);
    assert_eq!(clocks.set_parent(periph, osc), Err(ClkError::HwTimeout));
    assert_eq!(clocks.get_parent(periph), Ok(Some(periph_pre)));
}

#[test]
fn reparent_updates_descendant_rates() {
    let io = board_io();
    let clocks = board_clocks(&io);
    let periph_pre = clocks.lookup_by_name("periph_pre").unwrap();
    let pll2 = clocks.lookup_by_name("pll2_bus").unwrap();
    assert_eq!(rate(&clocks, "ipg"), 66_000_000);

    clocks.set_parent(periph_pre, pll2).unwrap();
    assert_eq!((io.get(CBCMR) >> 18) & 0x3, 0);
    assert_eq!(rate(&clocks, "ahb"), 176_000_000);
    assert_eq!(rate(&clocks, "ipg"), 88_000_000);
}

#[test]
fn pfd_rate_change() {
    let io = board_io();
    let clocks = board_clocks(&io);
    let pfd0 = clocks.lookup_by_name("pll2_pfd0_352m").unwrap();
    assert_eq!(clocks.round_rate(pfd0, 400_000_000), Ok(396_000_000));
    clocks.set_rate(pfd0, 400_000_000).unwrap();
    assert_eq!(io.get(PFD_528) & 0x3f, 24);
    assert_eq!(rate(&clocks, "pll2_pfd0_352m"), 396_000_000);
    // PFD2 shares the register and is unaffected.
    assert_eq!(rate(&clocks, "periph"), 396_000_000);
}

#[test]
fn pll_rate_snaps_to_fixed_choice() {
    let io = board_io();
    let clocks = board_clocks(&io);
    let pll2 = clocks.lookup_by_name("pll2_bus").unwrap();
    assert_eq!(clocks.round_rate(pll2, 500_000_000), Ok(480_000_000));
    clocks.set_rate(pll2, 500_000_000).unwrap();
    assert_eq!(clocks.get_rate(pll2), Ok(480_000_000));
    assert_eq!(io.get(PLL_BUS) & 0x1, 0);
    assert_eq!(rate(&clocks, "pll2_pfd2_396m"), 360_000_000);
}

#[test]
fn init_on_and_summary() {
    let io = board_io();
    let clocks = board_clocks(&io);
    clocks.enable_init_on(&["ahb", UART1]).unwrap();

    let mut summary = String::new();
    clocks.write_summary(&mut summary).unwrap();
    let uart_ipg = summary
        .lines()
        .find(|line| line.trim_start().starts_with("uart_ipg "))
        .unwrap();
    // osc > pll2_bus > pll2_pfd2_396m > periph_pre > periph > ahb > ipg
    assert!(uart_ipg.starts_with(&format!("{}uart_ipg", " ".repeat(14))));
    assert!(uart_ipg.trim_end().ends_with("1     66000000"));
    let ahb = summary
        .lines()
        .find(|line| line.trim_start().starts_with("ahb "))
        .unwrap();
    assert!(ahb.trim_end().ends_with("2    132000000"));
}

#[test]
fn concurrent_consumers() {
    let io = board_io();
    let clocks = board_clocks(&io);
    let ipg = clocks.clk_get(Some(UART1), Some("ipg")).unwrap();

    std::thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| {
                for _ in 0..200 {
                    ipg.enable().unwrap();
                    assert!(ipg.is_enabled());
                    ipg.disable().unwrap();
                }
            });
        }
    });
    assert_eq!(ipg.enable_count(), 0);
    assert_eq!((io.get(CCGR5) >> 24) & 0b11, 0);
}
