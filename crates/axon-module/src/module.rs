//! The module lifecycle trait.

use crate::{ModuleError, Pane};

/// A pluggable subsystem registered with the engine.
///
/// # Lifecycle contract
///
/// | Step | Who calls | When |
/// |------|-----------|------|
/// | `attach_pane` | `Engine::use_module` | at registration |
/// | `start` | `Engine::start` | after the dispatch worker is up |
/// | `shutdown` | `Engine::stop` | before the intake channel closes |
///
/// A module keeps the first pane it receives; a second `attach_pane`
/// (the engine never sends one) should be ignored.
///
/// `shutdown` must stop the module from producing: any publish issued
/// after the engine closes its intake is lost.
///
/// # Example
///
/// ```
/// use axon_module::{Module, ModuleError, Pane};
/// use serde_json::json;
///
/// struct Heartbeat {
///     pane: Option<Box<dyn Pane>>,
/// }
///
/// impl Module for Heartbeat {
///     fn name(&self) -> &str {
///         "heartbeat"
///     }
///
///     fn attach_pane(&mut self, pane: Box<dyn Pane>) {
///         if self.pane.is_none() {
///             self.pane = Some(pane);
///         }
///     }
///
///     fn start(&mut self) -> Result<(), ModuleError> {
///         if let Some(pane) = &self.pane {
///             pane.submit_to("heartbeat", json!("alive"));
///         }
///         Ok(())
///     }
///
///     fn shutdown(&mut self) {}
/// }
/// ```
pub trait Module: Send + Sync {
    /// Unique name of the module; duplicate registration is rejected.
    fn name(&self) -> &str;

    /// Receives the capability object granting scoped engine access.
    fn attach_pane(&mut self, pane: Box<dyn Pane>);

    /// Brings the module up. The engine is already Running.
    ///
    /// # Errors
    ///
    /// Returns [`ModuleError`] when the module cannot come up; the
    /// engine surfaces this from `start` under the module's name.
    fn start(&mut self) -> Result<(), ModuleError>;

    /// Tears the module down. Called while the engine still accepts
    /// events, so final publishes are safe.
    fn shutdown(&mut self);
}
