//! Crash containment for the view.
//!
//! A panic while rendering replaces the view with a recovery screen instead
//! of taking the process down. Reloading rebuilds the view state from its
//! factory, discarding whatever was left half-updated.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

/// Title of the recovery screen.
pub const RECOVERY_TITLE: &str = "System Malfunction";

/// Label of the recovery screen's only action.
pub const RECOVERY_ACTION: &str = "Reboot System";

/// What is shown after the view panicked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryView {
    /// Screen title.
    pub title: &'static str,
    /// The panic message, when it carried one.
    pub detail: String,
    /// Label of the reload action.
    pub action: &'static str,
}

impl RecoveryView {
    fn from_panic(payload: &(dyn Any + Send)) -> Self {
        let detail = payload
            .downcast_ref::<&str>()
            .map(ToString::to_string)
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown error".to_string());
        Self {
            title: RECOVERY_TITLE,
            detail,
            action: RECOVERY_ACTION,
        }
    }
}

/// Wraps view state of type `S` and contains panics raised while using it.
pub struct Boundary<S> {
    factory: Box<dyn Fn() -> S + Send>,
    state: S,
    failure: Option<RecoveryView>,
}

impl<S> Boundary<S> {
    /// Creates the boundary and the initial state.
    pub fn new(factory: impl Fn() -> S + Send + 'static) -> Self {
        let state = factory();
        Self {
            factory: Box::new(factory),
            state,
            failure: None,
        }
    }

    /// Runs `view` against the state. Once a view has panicked, every call
    /// returns the recovery screen until [`Self::reload`].
    ///
    /// # Errors
    ///
    /// Returns the [`RecoveryView`] if `view` panics now or panicked before.
    pub fn render<T>(&mut self, view: impl FnOnce(&mut S) -> T) -> Result<T, RecoveryView> {
        if let Some(failure) = &self.failure {
            return Err(failure.clone());
        }

        let state = &mut self.state;
        match catch_unwind(AssertUnwindSafe(|| view(state))) {
            Ok(output) => Ok(output),
            Err(payload) => {
                let failure = RecoveryView::from_panic(payload.as_ref());
                log::error!("View crashed: {}", failure.detail);
                self.failure = Some(failure.clone());
                Err(failure)
            }
        }
    }

    /// The recovery screen, while the view is crashed.
    #[must_use]
    pub const fn recovery(&self) -> Option<&RecoveryView> {
        self.failure.as_ref()
    }

    /// Rebuilds the state from the factory and clears the crash.
    pub fn reload(&mut self) {
        log::info!("Reloading view");
        self.state = (self.factory)();
        self.failure = None;
    }
}

impl<S: std::fmt::Debug> std::fmt::Debug for Boundary<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Boundary")
            .field("state", &self.state)
            .field("failure", &self.failure)
            .finish_non_exhaustive()
    }
}
