//! Example feature groups used by the command-line tool

pub mod iris;

use crate::execution::GroupRegistry;

/// Registry with every bundled group
pub fn default_registry() -> GroupRegistry {
    let mut registry = GroupRegistry::new();
    registry
        .register::<iris::Lengths>("lengths")
        .register::<iris::Widths>("widths");
    registry
}
