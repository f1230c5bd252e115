//! Actuator service: inventory lookups and the state-transition protocol.

use greenhouse_domain::actuator::{Actuator, ActuatorTransition, TransitionOutcome};
use greenhouse_domain::error::{GreenhouseError, NotFoundError};
use greenhouse_domain::query::QueryWindow;
use greenhouse_domain::time::now;

use crate::ports::{ActuatorRepository, BoundedLog};

/// Application service for actuators and their transition history.
pub struct ActuatorService<R, L> {
    repo: R,
    log: L,
}

impl<R, L> ActuatorService<R, L>
where
    R: ActuatorRepository,
    L: BoundedLog<ActuatorTransition>,
{
    /// Create a new service backed by the given repository and transition log.
    pub fn new(repo: R, log: L) -> Self {
        Self { repo, log }
    }

    /// List every actuator, sorted by type then name.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_actuators(&self) -> Result<Vec<Actuator>, GreenhouseError> {
        let mut actuators = self.repo.list().await?;
        actuators.sort_by(Actuator::listing_order);
        Ok(actuators)
    }

    /// Look up an actuator by name, returning an error if not found.
    ///
    /// # Errors
    ///
    /// Returns [`GreenhouseError::NotFound`] when no actuator is named `name`,
    /// or a storage error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn get_actuator(&self, name: &str) -> Result<Actuator, GreenhouseError> {
        self.repo.get_by_name(name).await?.ok_or_else(|| {
            NotFoundError {
                entity: "actuator",
                id: name.to_string(),
            }
            .into()
        })
    }

    /// Move an actuator to `to_state`.
    ///
    /// Asking for the state the actuator already holds succeeds without
    /// writing anything.
    ///
    /// # Errors
    ///
    /// Returns [`GreenhouseError::NotFound`] for an unknown actuator, or a
    /// storage error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn transition(
        &self,
        name: &str,
        to_state: bool,
    ) -> Result<TransitionOutcome, GreenhouseError> {
        let outcome = self.repo.transition(name, to_state, now()).await?;
        match &outcome {
            TransitionOutcome::Applied(transition) => {
                tracing::info!(timestamp = %transition.timestamp, "actuator state changed");
            }
            TransitionOutcome::Unchanged => {
                tracing::debug!("actuator already in requested state");
            }
        }
        Ok(outcome)
    }

    /// Switch an actuator on.
    ///
    /// # Errors
    ///
    /// See [`transition`](Self::transition).
    pub async fn turn_on(&self, name: &str) -> Result<TransitionOutcome, GreenhouseError> {
        self.transition(name, true).await
    }

    /// Switch an actuator off.
    ///
    /// # Errors
    ///
    /// See [`transition`](Self::transition).
    pub async fn turn_off(&self, name: &str) -> Result<TransitionOutcome, GreenhouseError> {
        self.transition(name, false).await
    }

    /// Transitions of one actuator within `window`, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`GreenhouseError::NotFound`] for an unknown actuator, or a
    /// storage error.
    #[tracing::instrument(skip(self))]
    pub async fn history(
        &self,
        name: &str,
        window: QueryWindow,
    ) -> Result<Vec<ActuatorTransition>, GreenhouseError> {
        let actuator = self.get_actuator(name).await?;
        if window.is_inverted() {
            tracing::debug!("inverted window, nothing to query");
            return Ok(Vec::new());
        }
        self.log.query(&actuator.name, window).await
    }
}
