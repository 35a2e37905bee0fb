//
// mod.rs
//
// Copyright (C) 2026 Posit Software, PBC. All rights reserved.
//
//

pub mod debounce;
pub mod handler;
pub mod inspection;

use crate::inspector::inspection::InspectionUpdate;
use crate::signal::Signal;

/// A source of inspection results that can feed the inspector display.
pub trait Inspectable {
    /// Emitted with the outcome of every inspection cycle.
    fn inspected(&self) -> &Signal<InspectionUpdate>;

    /// Emitted once, when the source is disposed.
    fn disposed(&self) -> &Signal<()>;

    fn is_disposed(&self) -> bool;

    /// A source on standby doesn't make requests. Sources that are not
    /// displayed are put on standby.
    fn standby(&self) -> bool;

    fn set_standby(&self, standby: bool);
}
