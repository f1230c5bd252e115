//! Actuator repository port: inventory and the state-transition protocol.

use std::future::Future;

use greenhouse_domain::actuator::{Actuator, TransitionOutcome};
use greenhouse_domain::error::GreenhouseError;
use greenhouse_domain::time::Timestamp;

/// Persistence for [`Actuator`]s and their transition log.
pub trait ActuatorRepository {
    /// Every provisioned actuator, in no particular order.
    fn list(&self) -> impl Future<Output = Result<Vec<Actuator>, GreenhouseError>> + Send;

    /// Look up an actuator by its unique name.
    fn get_by_name(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<Actuator>, GreenhouseError>> + Send;

    /// Move `name` to `to_state`, stamping the change with `at`.
    ///
    /// Implementations must compare-and-set the state and append the
    /// transition record as one atomic unit, evicting the oldest records when
    /// the transition log is full. When the actuator already holds `to_state`
    /// nothing is written and [`TransitionOutcome::Unchanged`] is returned.
    ///
    /// Returns [`GreenhouseError::NotFound`] for an unknown name.
    fn transition(
        &self,
        name: &str,
        to_state: bool,
        at: Timestamp,
    ) -> impl Future<Output = Result<TransitionOutcome, GreenhouseError>> + Send;
}
