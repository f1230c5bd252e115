//! `SQLite` implementation of [`ActuatorRepository`].

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use greenhouse_app::ports::ActuatorRepository;
use greenhouse_domain::actuator::{Actuator, ActuatorTransition, TransitionOutcome};
use greenhouse_domain::error::{GreenhouseError, NotFoundError};
use greenhouse_domain::time::Timestamp;

use crate::bounded_log::append_on;
use crate::error::{StorageError, decode_error};

/// Wrapper for converting database rows into domain types without polluting
/// domain structs with database concerns.
struct Wrapper(Actuator);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let kind: String = row.try_get("type")?;
        Ok(Self(Actuator {
            name: row.try_get("name")?,
            kind: kind.parse().map_err(decode_error)?,
            state: row.try_get("state")?,
        }))
    }
}

const SELECT_ALL: &str = "SELECT name, type, state FROM actuators ORDER BY type, name";

const SELECT_BY_NAME: &str = "SELECT name, type, state FROM actuators WHERE name = ?";

const EXISTS: &str = "SELECT 1 FROM actuators WHERE name = ?";

/// Flips the state only when it differs, so a racing duplicate matches no row.
const COMPARE_AND_SET: &str = r"
    UPDATE actuators SET state = ?
    WHERE name = ? AND state <> ?
";

/// `SQLite`-backed actuator repository.
#[derive(Clone)]
pub struct SqliteActuatorRepository {
    pool: SqlitePool,
}

impl SqliteActuatorRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl ActuatorRepository for SqliteActuatorRepository {
    async fn list(&self) -> Result<Vec<Actuator>, GreenhouseError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_ALL)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Actuator>, GreenhouseError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_NAME)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(row.map(|w| w.0))
    }

    async fn transition(
        &self,
        name: &str,
        to_state: bool,
        at: Timestamp,
    ) -> Result<TransitionOutcome, GreenhouseError> {
        let mut tx = self.pool.begin().await.map_err(StorageError::from)?;

        let changed = sqlx::query(COMPARE_AND_SET)
            .bind(to_state)
            .bind(name)
            .bind(to_state)
            .execute(&mut *tx)
            .await
            .map_err(StorageError::from)?
            .rows_affected();

        if changed == 0 {
            let exists = sqlx::query(EXISTS)
                .bind(name)
                .fetch_optional(&mut *tx)
                .await
                .map_err(StorageError::from)?
                .is_some();
            tx.rollback().await.map_err(StorageError::from)?;
            if !exists {
                return Err(NotFoundError {
                    entity: "actuator",
                    id: name.to_string(),
                }
                .into());
            }
            return Ok(TransitionOutcome::Unchanged);
        }

        let transition = ActuatorTransition {
            name: name.to_string(),
            to_state,
            timestamp: at,
        };
        append_on(&mut tx, &transition)
            .await
            .map_err(StorageError::from)?;
        tx.commit().await.map_err(StorageError::from)?;

        Ok(TransitionOutcome::Applied(transition))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Config, Database};
    use greenhouse_app::ports::BoundedLog;
    use greenhouse_domain::actuator::ActuatorKind;
    use greenhouse_domain::query::QueryWindow;
    use greenhouse_domain::time::now;

    async fn setup() -> Database {
        let db = Config::in_memory().build().await.unwrap();
        for (name, kind) in [
            ("solenoid01", ActuatorKind::Water),
            ("fan02", ActuatorKind::Fan),
            ("bigfan", ActuatorKind::Fan),
            ("heater01", ActuatorKind::Heater),
        ] {
            sqlx::query("INSERT INTO actuators (name, type, state) VALUES (?, ?, 0)")
                .bind(name)
                .bind(kind.as_str())
                .execute(db.pool())
                .await
                .unwrap();
        }
        db
    }

    async fn log_len(db: &Database, name: &str) -> usize {
        db.transitions()
            .query(&name.to_string(), QueryWindow::everything())
            .await
            .unwrap()
            .len()
    }

    #[tokio::test]
    async fn should_list_by_type_then_name() {
        let db = setup().await;
        let names: Vec<String> = db
            .actuators()
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.name)
            .collect();
        assert_eq!(names, ["bigfan", "fan02", "heater01", "solenoid01"]);
    }

    #[tokio::test]
    async fn should_get_actuator_by_name() {
        let db = setup().await;
        let repo = db.actuators();
        let found = repo.get_by_name("solenoid01").await.unwrap().unwrap();
        assert_eq!(found.kind, ActuatorKind::Water);
        assert!(!found.state);
        assert!(repo.get_by_name("ghost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn should_apply_and_log_transition_when_state_differs() {
        let db = setup().await;
        let repo = db.actuators();
        let at = now();

        let outcome = repo.transition("fan02", true, at).await.unwrap();

        assert_eq!(
            outcome,
            TransitionOutcome::Applied(ActuatorTransition {
                name: "fan02".to_string(),
                to_state: true,
                timestamp: at,
            })
        );
        assert!(repo.get_by_name("fan02").await.unwrap().unwrap().state);
        assert_eq!(log_len(&db, "fan02").await, 1);
    }

    #[tokio::test]
    async fn should_not_log_when_state_already_matches() {
        let db = setup().await;
        let repo = db.actuators();

        let outcome = repo.transition("heater01", false, now()).await.unwrap();

        assert_eq!(outcome, TransitionOutcome::Unchanged);
        assert_eq!(log_len(&db, "heater01").await, 0);
    }

    #[tokio::test]
    async fn should_return_not_found_when_actuator_missing() {
        let db = setup().await;
        let result = db.actuators().transition("ghost", true, now()).await;
        assert!(matches!(result, Err(GreenhouseError::NotFound(_))));
        assert_eq!(log_len(&db, "ghost").await, 0);
    }

    #[tokio::test]
    async fn should_log_exactly_once_when_racing_to_same_state() {
        let db = setup().await;
        let first = db.actuators();
        let second = db.actuators();
        let at = now();

        let (a, b) = tokio::join!(
            first.transition("bigfan", true, at),
            second.transition("bigfan", true, at)
        );

        let applied = [a.unwrap(), b.unwrap()]
            .iter()
            .filter(|outcome| outcome.is_applied())
            .count();
        assert_eq!(applied, 1);
        assert_eq!(log_len(&db, "bigfan").await, 1);
    }

    #[tokio::test]
    async fn should_evict_oldest_transitions_when_log_full() {
        let db = setup().await;
        sqlx::query("UPDATE bounded_logs SET capacity = 2 WHERE name = 'actuators_state_log'")
            .execute(db.pool())
            .await
            .unwrap();
        let repo = db.actuators();

        for state in [true, false, true, false] {
            repo.transition("fan02", state, now()).await.unwrap();
        }

        let history = db
            .transitions()
            .query(&"fan02".to_string(), QueryWindow::everything())
            .await
            .unwrap();
        let states: Vec<bool> = history.iter().map(|t| t.to_state).collect();
        assert_eq!(states, [false, true]);
        assert!(!repo.get_by_name("fan02").await.unwrap().unwrap().state);
    }
}
