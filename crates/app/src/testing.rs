//! In-memory port implementations shared by the service tests.

use std::collections::{BTreeMap, VecDeque};
use std::future::Future;
use std::sync::{Arc, Mutex};

use greenhouse_domain::actuator::{Actuator, ActuatorTransition, TransitionOutcome};
use greenhouse_domain::error::{GreenhouseError, NotFoundError};
use greenhouse_domain::log::LogRecord;
use greenhouse_domain::query::QueryWindow;
use greenhouse_domain::settings::{Settings, StoredSettings};
use greenhouse_domain::time::Timestamp;

use crate::ports::{ActuatorRepository, BoundedLog, SettingsRepository};

/// Ring buffer dropping its oldest record once `capacity` is exceeded.
#[derive(Clone)]
pub(crate) struct InMemoryLog<T> {
    records: Arc<Mutex<VecDeque<T>>>,
    capacity: u32,
}

impl<T: LogRecord> InMemoryLog<T> {
    pub(crate) fn with_capacity(capacity: u32) -> Self {
        Self {
            records: Arc::new(Mutex::new(VecDeque::new())),
            capacity,
        }
    }

    pub(crate) fn push(&self, record: T) {
        let mut records = self.records.lock().unwrap();
        records.push_back(record);
        while records.len() > self.capacity as usize {
            records.pop_front();
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }
}

impl<T: LogRecord> BoundedLog<T> for InMemoryLog<T> {
    fn append(&self, record: T) -> impl Future<Output = Result<T, GreenhouseError>> + Send {
        self.push(record.clone());
        async { Ok(record) }
    }

    fn query(
        &self,
        key: &T::Key,
        window: QueryWindow,
    ) -> impl Future<Output = Result<Vec<T>, GreenhouseError>> + Send {
        let records = self.records.lock().unwrap();
        let mut found: Vec<T> = records
            .iter()
            .rev()
            .filter(|record| record.matches(key) && window.contains(record.timestamp()))
            .cloned()
            .collect();
        found.sort_by(T::canonical_order);
        async { Ok(found) }
    }

    fn capacity(&self) -> impl Future<Output = Result<u32, GreenhouseError>> + Send {
        let capacity = self.capacity;
        async move { Ok(capacity) }
    }
}

pub(crate) struct InMemoryActuatorRepo {
    actuators: Mutex<BTreeMap<String, Actuator>>,
    log: InMemoryLog<ActuatorTransition>,
}

impl InMemoryActuatorRepo {
    pub(crate) fn new(
        actuators: impl IntoIterator<Item = Actuator>,
        log: InMemoryLog<ActuatorTransition>,
    ) -> Self {
        Self {
            actuators: Mutex::new(
                actuators
                    .into_iter()
                    .map(|actuator| (actuator.name.clone(), actuator))
                    .collect(),
            ),
            log,
        }
    }
}

impl ActuatorRepository for InMemoryActuatorRepo {
    fn list(&self) -> impl Future<Output = Result<Vec<Actuator>, GreenhouseError>> + Send {
        let result: Vec<Actuator> = self.actuators.lock().unwrap().values().cloned().collect();
        async { Ok(result) }
    }

    fn get_by_name(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<Actuator>, GreenhouseError>> + Send {
        let result = self.actuators.lock().unwrap().get(name).cloned();
        async { Ok(result) }
    }

    fn transition(
        &self,
        name: &str,
        to_state: bool,
        at: Timestamp,
    ) -> impl Future<Output = Result<TransitionOutcome, GreenhouseError>> + Send {
        let mut actuators = self.actuators.lock().unwrap();
        let result = match actuators.get_mut(name) {
            None => Err(NotFoundError {
                entity: "actuator",
                id: name.to_string(),
            }
            .into()),
            Some(actuator) if actuator.state == to_state => Ok(TransitionOutcome::Unchanged),
            Some(actuator) => {
                actuator.state = to_state;
                let transition = ActuatorTransition {
                    name: name.to_string(),
                    to_state,
                    timestamp: at,
                };
                self.log.push(transition.clone());
                Ok(TransitionOutcome::Applied(transition))
            }
        };
        async { result }
    }
}

#[derive(Default)]
pub(crate) struct InMemorySettingsRepo {
    stored: Mutex<Option<StoredSettings>>,
}

impl SettingsRepository for InMemorySettingsRepo {
    fn current(
        &self,
    ) -> impl Future<Output = Result<Option<StoredSettings>, GreenhouseError>> + Send {
        let result = self.stored.lock().unwrap().clone();
        async { Ok(result) }
    }

    fn replace(
        &self,
        settings: Settings,
        at: Timestamp,
    ) -> impl Future<Output = Result<StoredSettings, GreenhouseError>> + Send {
        let stored = StoredSettings {
            settings,
            updated_at: at,
        };
        *self.stored.lock().unwrap() = Some(stored.clone());
        async { Ok(stored) }
    }
}
