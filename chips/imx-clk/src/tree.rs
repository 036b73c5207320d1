// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Clock tree arena: parent links, reference counts and cached rates.
//!
//! Nodes live in a `Vec` and refer to each other by index. A node's parents
//! must already be registered, so a parent always has a lower index than its
//! children and the graph cannot contain cycles.
//!
//! Everything here assumes the caller holds the registry lock.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::{self, Write};

use log::{debug, error, warn};

use crate::clkdev::ClkdevTable;
use crate::errorcode::ClkError;
use crate::io::RegisterIo;
use crate::nodes::ClkKind;
use crate::registry::ClkId;

pub(crate) struct ClkNode {
    pub(crate) name: String,
    pub(crate) kind: ClkKind,
    /// Candidate parents in selector order; one entry for single-parent kinds.
    pub(crate) candidates: Vec<ClkId>,
    pub(crate) parent: Option<ClkId>,
    children: Vec<ClkId>,
    pub(crate) enable_count: usize,
    /// `None` when dirty.
    rate: Option<u64>,
}

pub(crate) struct ClkTree {
    nodes: Vec<ClkNode>,
    names: BTreeMap<String, ClkId>,
    pub(crate) clkdev: ClkdevTable,
}

impl ClkTree {
    pub(crate) const fn new() -> ClkTree {
        ClkTree {
            nodes: Vec::new(),
            names: BTreeMap::new(),
            clkdev: ClkdevTable::new(),
        }
    }

    pub(crate) fn id(&self, name: &str) -> Result<ClkId, ClkError> {
        self.names.get(name).copied().ok_or(ClkError::NotFound)
    }

    /// Rejects ids that were not handed out by this tree.
    pub(crate) fn check(&self, id: ClkId) -> Result<ClkId, ClkError> {
        if id.index() < self.nodes.len() {
            Ok(id)
        } else {
            Err(ClkError::NotFound)
        }
    }

    pub(crate) fn node(&self, id: ClkId) -> &ClkNode {
        &self.nodes[id.index()]
    }

    fn node_mut(&mut self, id: ClkId) -> &mut ClkNode {
        &mut self.nodes[id.index()]
    }

    pub(crate) fn insert(
        &mut self,
        io: &dyn RegisterIo,
        name: &str,
        kind: ClkKind,
        parent_names: &[&str],
    ) -> Result<ClkId, ClkError> {
        if self.names.contains_key(name) {
            return Err(ClkError::DuplicateName);
        }
        if parent_names.len() != kind.num_parents() {
            return Err(ClkError::InvalidConfig);
        }
        let candidates = parent_names
            .iter()
            .map(|parent| self.id(parent).map_err(|_| ClkError::UnknownParent))
            .collect::<Result<Vec<_>, _>>()?;

        let parent = match kind.select() {
            Some(select) => {
                let index = select.parent_index(io);
                let parent = candidates.get(index).copied();
                if parent.is_none() {
                    warn!("clk: {} selects missing parent {}, orphaned", name, index);
                }
                parent
            }
            None => candidates.first().copied(),
        };

        let id = ClkId::from_index(self.nodes.len());
        if let Some(parent) = parent {
            debug_assert!(parent < id);
            self.node_mut(parent).children.push(id);
        }
        self.nodes.push(ClkNode {
            name: String::from(name),
            kind,
            candidates,
            parent,
            children: Vec::new(),
            enable_count: 0,
            rate: None,
        });
        self.names.insert(String::from(name), id);
        debug!("clk: registered {} ({:?})", name, kind.clk_type());
        Ok(id)
    }

    /// Rate of `id`, recomputing dirty nodes from the nearest cached ancestor
    /// downwards.
    pub(crate) fn rate(&mut self, io: &dyn RegisterIo, id: ClkId) -> u64 {
        let mut dirty = Vec::new();
        let mut parent_rate = 0;
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let node = self.node(current);
            if let Some(rate) = node.rate {
                parent_rate = rate;
                break;
            }
            dirty.push(current);
            cursor = node.parent;
        }
        for current in dirty.into_iter().rev() {
            let node = self.node_mut(current);
            let rate = node.kind.rate().recalc_rate(io, parent_rate);
            node.rate = Some(rate);
            parent_rate = rate;
        }
        parent_rate
    }

    fn parent_rate(&mut self, io: &dyn RegisterIo, id: ClkId) -> u64 {
        match self.node(id).parent {
            Some(parent) => self.rate(io, parent),
            None => 0,
        }
    }

    /// Marks `id` and everything below it dirty.
    fn invalidate(&mut self, id: ClkId) {
        let mut stack = Vec::from([id]);
        while let Some(current) = stack.pop() {
            let node = self.node_mut(current);
            node.rate = None;
            stack.extend_from_slice(&node.children);
        }
    }

    pub(crate) fn round_rate(&mut self, io: &dyn RegisterIo, id: ClkId, rate: u64) -> u64 {
        let parent_rate = self.parent_rate(io, id);
        self.node(id).kind.rate().round_rate(io, rate, parent_rate)
    }

    pub(crate) fn set_rate(
        &mut self,
        io: &dyn RegisterIo,
        id: ClkId,
        rate: u64,
    ) -> Result<(), ClkError> {
        if self.rate(io, id) == rate {
            return Ok(());
        }
        let parent_rate = self.parent_rate(io, id);
        let result = self.node(id).kind.rate().set_rate(io, rate, parent_rate);
        // A failed busy handshake may still have changed the divider.
        if !matches!(result, Err(ClkError::NoSupport | ClkError::InvalidRate)) {
            self.invalidate(id);
        }
        match result {
            Ok(()) => debug!("clk: {} rate set to {}", self.node(id).name, rate),
            Err(err) => warn!("clk: {} set_rate({}) failed: {}", self.node(id).name, rate, err),
        }
        result
    }

    pub(crate) fn set_parent(
        &mut self,
        io: &dyn RegisterIo,
        id: ClkId,
        parent: ClkId,
    ) -> Result<(), ClkError> {
        let node = self.node(id);
        if node.kind.select().is_none() {
            return Err(ClkError::NoSupport);
        }
        let index = node
            .candidates
            .iter()
            .position(|&candidate| candidate == parent)
            .ok_or(ClkError::InvalidParent)?;
        let old_parent = node.parent;
        if old_parent == Some(parent) {
            return Ok(());
        }

        // An enabled mux keeps running across the switch, so its new input
        // must run first. The mux's own reference then moves off the old
        // input.
        let running = node.enable_count > 0;
        if running {
            self.enable(io, parent)?;
        }
        let switched = match self.node(id).kind.select() {
            Some(select) => select.set_parent_index(io, index),
            None => Err(ClkError::NoSupport),
        };
        if let Err(err) = switched {
            if running {
                self.release_chain(io, parent);
            }
            self.invalidate(id);
            warn!("clk: {} reparent failed: {}", self.node(id).name, err);
            return Err(err);
        }

        if let Some(old) = old_parent {
            self.node_mut(old).children.retain(|&child| child != id);
        }
        self.node_mut(parent).children.push(id);
        self.node_mut(id).parent = Some(parent);
        self.invalidate(id);
        debug!(
            "clk: {} reparented to {}",
            self.node(id).name,
            self.node(parent).name
        );
        match old_parent {
            Some(old) if running => self.disable(io, old),
            _ => Ok(()),
        }
    }

    /// Takes a reference on `id`. The first reference also takes one on the
    /// parent and then opens the node's own gate.
    pub(crate) fn enable(&mut self, io: &dyn RegisterIo, id: ClkId) -> Result<(), ClkError> {
        if self.node(id).enable_count == 0 {
            let parent = self.node(id).parent;
            if let Some(parent) = parent {
                self.enable(io, parent)?;
            }
            if let Some(gate) = self.node(id).kind.gate() {
                if let Err(err) = gate.enable(io) {
                    warn!("clk: {} failed to enable: {}", self.node(id).name, err);
                    if let Some(parent) = parent {
                        self.release_chain(io, parent);
                    }
                    return Err(err);
                }
            }
        }
        self.node_mut(id).enable_count += 1;
        Ok(())
    }

    /// Gives back the reference a failed `enable` took on `id`, and the ones
    /// its 0 -> 1 transitions took further up. Stops at the first clock that
    /// was already running before.
    fn release_chain(&mut self, io: &dyn RegisterIo, id: ClkId) {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let node = self.node_mut(current);
            node.enable_count -= 1;
            if node.enable_count > 0 {
                break;
            }
            if let Some(gate) = node.kind.gate() {
                gate.disable(io);
            }
            cursor = node.parent;
        }
    }

    /// Drops a reference on `id` and closes its gate when the last one goes.
    /// Ancestors keep the references taken on them.
    pub(crate) fn disable(&mut self, io: &dyn RegisterIo, id: ClkId) -> Result<(), ClkError> {
        let node = self.node_mut(id);
        if node.enable_count == 0 {
            error!("clk: {} disabled more often than enabled", node.name);
            debug_assert!(
                node.enable_count > 0,
                "clock {} disabled more often than enabled",
                node.name
            );
            return Err(ClkError::RefcountUnderflow);
        }
        node.enable_count -= 1;
        if node.enable_count == 0 {
            if let Some(gate) = node.kind.gate() {
                gate.disable(io);
            }
        }
        Ok(())
    }

    pub(crate) fn is_enabled(&self, io: &dyn RegisterIo, id: ClkId) -> bool {
        let node = self.node(id);
        match node.kind.gate() {
            Some(gate) => gate.is_enabled(io),
            None => node.enable_count > 0,
        }
    }

    /// Writes one line per clock, children indented under their parent.
    pub(crate) fn write_summary(&mut self, io: &dyn RegisterIo, w: &mut dyn Write) -> fmt::Result {
        writeln!(w, "{:<40} {:>10} {:>12}", "clock", "enable_cnt", "rate")?;
        let mut stack: Vec<(ClkId, usize)> = (0..self.nodes.len())
            .rev()
            .map(ClkId::from_index)
            .filter(|&id| self.node(id).parent.is_none())
            .map(|id| (id, 0))
            .collect();
        while let Some((id, depth)) = stack.pop() {
            let rate = self.rate(io, id);
            let node = self.node(id);
            let indent = depth * 2;
            writeln!(
                w,
                "{:indent$}{:<width$} {:>10} {:>12}",
                "",
                node.name,
                node.enable_count,
                rate,
                indent = indent,
                width = 40usize.saturating_sub(indent),
            )?;
            stack.extend(node.children.iter().rev().map(|&child| (child, depth + 1)));
        }
        Ok(())
    }
}
