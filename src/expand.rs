//! Lazy expansion of wiring adjusters into container adjusters.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use wiring_core::{Container, Result};

use crate::adjuster::AdjusterId;
use crate::registry::WiringState;
use crate::wiring::Wiring;

/// The private wiring state of one container creation.
///
/// Ensuing containers created through the container's wiring bean share it, so wiring
/// adjusters resolved for one of them stay resolved for the others.
#[derive(Clone)]
pub(crate) struct Working(Arc<Mutex<WiringState>>);

impl Working {
    pub(crate) fn new(state: WiringState) -> Self {
        Self(Arc::new(Mutex::new(state)))
    }

    /// Runs `f` with the state locked. The lock must not be held across an `.await`.
    pub(crate) fn with<R>(&self, f: impl FnOnce(&mut WiringState) -> R) -> R {
        let mut state = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }

    pub(crate) fn snapshot(&self) -> WiringState {
        self.with(|state| state.clone())
    }
}

impl fmt::Debug for Working {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Working").finish_non_exhaustive()
    }
}

/// Handle given to a running wiring adjuster to hand over the wiring it supplies.
#[derive(Clone)]
pub struct WiringSupply {
    working: Working,
    adjuster: AdjusterId,
}

impl WiringSupply {
    /// Adds `wiring` to what the running adjuster supplies.
    ///
    /// Its container adjusters take the place of the adjuster in every container type's list.
    /// Its wiring adjusters are expanded as part of the ongoing expansion.
    pub fn add_wiring(&self, wiring: &Wiring) {
        self.working
            .with(|state| state.supply(self.adjuster, wiring.state()));
    }
}

impl fmt::Debug for WiringSupply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WiringSupply")
            .field("adjuster", &self.adjuster)
            .finish_non_exhaustive()
    }
}

/// Runs every wiring adjuster queued under `scope_key` that has not run yet, including those
/// queued while expanding.
pub(crate) async fn expand_pending(
    working: &Working,
    scope_key: &str,
    context: Option<&Container>,
) -> Result<()> {
    while let Some(adjuster) = working.with(|state| state.take_unresolved(scope_key)) {
        trace!(scope = scope_key, ?adjuster, "expanding wiring adjuster");

        let supply = WiringSupply {
            working: working.clone(),
            adjuster: adjuster.id(),
        };
        if let Err(err) = adjuster.adjust(supply, context.cloned()).await {
            error!(scope = scope_key, ?adjuster, %err, "wiring adjuster failed");
            return Err(err);
        }

        working.with(|state| state.reconcile(adjuster.id()));
    }
    Ok(())
}
