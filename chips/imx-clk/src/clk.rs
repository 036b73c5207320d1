// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Consumer handle to one clock.

use alloc::string::String;
use core::fmt;

use crate::errorcode::ClkError;
use crate::registry::{ClkId, Registry};

/// A clock as seen by a driver. The id is known to belong to the registry,
/// so the accessors that cannot fail for other reasons return plain values.
#[derive(Clone, Copy)]
pub struct Clk<'r> {
    registry: &'r Registry<'r>,
    id: ClkId,
}

impl<'r> Clk<'r> {
    pub(crate) fn new(registry: &'r Registry<'r>, id: ClkId) -> Clk<'r> {
        Clk { registry, id }
    }

    pub fn id(&self) -> ClkId {
        self.id
    }

    pub fn name(&self) -> String {
        self.registry.with_tree(|tree, _| tree.node(self.id).name.clone())
    }

    pub fn get_rate(&self) -> u64 {
        self.registry.with_tree(|tree, io| tree.rate(io, self.id))
    }

    pub fn round_rate(&self, rate: u64) -> u64 {
        self.registry
            .with_tree(|tree, io| tree.round_rate(io, self.id, rate))
    }

    pub fn set_rate(&self, rate: u64) -> Result<(), ClkError> {
        self.registry
            .with_tree(|tree, io| tree.set_rate(io, self.id, rate))
    }

    pub fn enable(&self) -> Result<(), ClkError> {
        self.registry.with_tree(|tree, io| tree.enable(io, self.id))
    }

    pub fn disable(&self) -> Result<(), ClkError> {
        self.registry.with_tree(|tree, io| tree.disable(io, self.id))
    }

    pub fn is_enabled(&self) -> bool {
        self.registry
            .with_tree(|tree, io| tree.is_enabled(io, self.id))
    }

    pub fn enable_count(&self) -> usize {
        self.registry
            .with_tree(|tree, _| tree.node(self.id).enable_count)
    }

    pub fn set_parent(&self, parent: &Clk<'_>) -> Result<(), ClkError> {
        self.registry.set_parent(self.id, parent.id)
    }

    pub fn get_parent(&self) -> Option<Clk<'r>> {
        self.registry
            .with_tree(|tree, _| tree.node(self.id).parent)
            .map(|parent| Clk::new(self.registry, parent))
    }
}

impl fmt::Debug for Clk<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Clk")
            .field("id", &self.id)
            .field("name", &self.name())
            .finish()
    }
}
