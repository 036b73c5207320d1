// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Consumer lookup table.
//!
//! Drivers ask for a clock by their device id and a connection name (e.g.
//! `("imx-uart.0", "per")`) instead of by tree node name. Either id of an
//! entry may be `None`, which matches any value. A device id match outranks a
//! connection id match, so the most specific entry for a request wins. Among
//! equally specific entries the first one added wins.

use alloc::string::String;
use alloc::vec::Vec;

use crate::registry::ClkId;

/// One row of a platform's consumer table, as written in board code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClkLookup<'a> {
    pub dev_id: Option<&'a str>,
    pub con_id: Option<&'a str>,
    /// Name of the registered clock.
    pub clk: &'a str,
}

impl<'a> ClkLookup<'a> {
    pub const fn new(dev_id: Option<&'a str>, con_id: Option<&'a str>, clk: &'a str) -> Self {
        ClkLookup {
            dev_id,
            con_id,
            clk,
        }
    }
}

const DEV_MATCH: u8 = 2;
const CON_MATCH: u8 = 1;

struct ClkdevEntry {
    dev_id: Option<String>,
    con_id: Option<String>,
    clk: ClkId,
}

impl ClkdevEntry {
    /// Match quality for a request, `None` if the entry does not apply.
    fn score(&self, dev_id: Option<&str>, con_id: Option<&str>) -> Option<u8> {
        let mut score = 0;
        if let Some(entry_dev) = self.dev_id.as_deref() {
            if dev_id != Some(entry_dev) {
                return None;
            }
            score += DEV_MATCH;
        }
        if let Some(entry_con) = self.con_id.as_deref() {
            if con_id != Some(entry_con) {
                return None;
            }
            score += CON_MATCH;
        }
        Some(score)
    }
}

pub(crate) struct ClkdevTable {
    entries: Vec<ClkdevEntry>,
}

impl ClkdevTable {
    pub(crate) const fn new() -> ClkdevTable {
        ClkdevTable {
            entries: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, dev_id: Option<&str>, con_id: Option<&str>, clk: ClkId) {
        self.entries.push(ClkdevEntry {
            dev_id: dev_id.map(String::from),
            con_id: con_id.map(String::from),
            clk,
        });
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn find(&self, dev_id: Option<&str>, con_id: Option<&str>) -> Option<ClkId> {
        let best_possible = if dev_id.is_some() { DEV_MATCH } else { 0 }
            + if con_id.is_some() { CON_MATCH } else { 0 };
        let mut best: Option<(u8, ClkId)> = None;
        for entry in &self.entries {
            let score = match entry.score(dev_id, con_id) {
                Some(score) if score > 0 => score,
                _ => continue,
            };
            if best.is_some_and(|(found, _)| found >= score) {
                continue;
            }
            best = Some((score, entry.clk));
            if score == best_possible {
                break;
            }
        }
        best.map(|(_, clk)| clk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> ClkdevTable {
        let mut table = ClkdevTable::new();
        table.push(Some("x"), None, ClkId::from_index(0));
        table.push(Some("x"), Some("per"), ClkId::from_index(1));
        table.push(None, Some("ipg"), ClkId::from_index(2));
        table.push(Some("x"), Some("per"), ClkId::from_index(3));
        table
    }

    #[test]
    fn specific_entry_beats_wildcard() {
        let table = table();
        assert_eq!(table.find(Some("x"), Some("per")), Some(ClkId::from_index(1)));
        assert_eq!(table.find(Some("x"), Some("other")), Some(ClkId::from_index(0)));
        assert_eq!(table.find(Some("x"), None), Some(ClkId::from_index(0)));
    }

    #[test]
    fn device_wildcard() {
        let table = table();
        assert_eq!(table.find(Some("y"), Some("ipg")), Some(ClkId::from_index(2)));
        assert_eq!(table.find(None, Some("ipg")), Some(ClkId::from_index(2)));
        // A device match outranks a connection match.
        assert_eq!(table.find(Some("x"), Some("ipg")), Some(ClkId::from_index(0)));
    }

    #[test]
    fn misses() {
        let table = table();
        assert_eq!(table.find(Some("y"), Some("per")), None);
        assert_eq!(table.find(None, None), None);
    }

    #[test]
    fn entry_order_breaks_ties() {
        let mut table = ClkdevTable::new();
        table.push(Some("uart"), None, ClkId::from_index(7));
        table.push(Some("uart"), None, ClkId::from_index(8));
        assert_eq!(table.find(Some("uart"), Some("per")), Some(ClkId::from_index(7)));
    }
}
