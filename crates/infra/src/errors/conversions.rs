//! Conversions from external infrastructure errors into domain errors.

use eventhub_domain::EventHubError;
use r2d2::Error as PoolError;
use reqwest::Error as HttpError;
use rusqlite::Error as SqlError;
use serde_json::Error as JsonError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub EventHubError);

impl From<InfraError> for EventHubError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<EventHubError> for InfraError {
    fn from(value: EventHubError) -> Self {
        Self(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoEventHubError {
    fn into_eventhub(self) -> EventHubError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → EventHubError */
/* -------------------------------------------------------------------------- */

impl IntoEventHubError for SqlError {
    fn into_eventhub(self) -> EventHubError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match (err.code, err.extended_code) {
                    (ErrorCode::DatabaseBusy, _) => {
                        EventHubError::Database("database is busy".into())
                    }
                    (ErrorCode::DatabaseLocked, _) => {
                        EventHubError::Database("database is locked".into())
                    }
                    (ErrorCode::ConstraintViolation, 2067 | 1555) => {
                        EventHubError::Database("unique constraint violation".into())
                    }
                    (ErrorCode::ConstraintViolation, 787) => {
                        EventHubError::Database("foreign key constraint violation".into())
                    }
                    _ => EventHubError::Database(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => EventHubError::Database("no rows returned by query".into()),
            RE::FromSqlConversionFailure(_, _, cause) => {
                EventHubError::Database(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, _, ty) => {
                EventHubError::Database(format!("invalid column type: {ty}"))
            }
            RE::Utf8Error(_) => {
                EventHubError::Database("invalid UTF-8 returned from sqlite".into())
            }
            RE::InvalidParameterName(parameter_name) => {
                EventHubError::Database(format!("invalid parameter name: {parameter_name}"))
            }
            RE::InvalidPath(path) => EventHubError::Database(format!(
                "invalid database path: {}",
                path.to_string_lossy()
            )),
            RE::InvalidQuery => EventHubError::Database("invalid SQL query".into()),
            other => EventHubError::Database(other.to_string()),
        }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        Self(value.into_eventhub())
    }
}

/* -------------------------------------------------------------------------- */
/* r2d2::Error → EventHubError */
/* -------------------------------------------------------------------------- */

impl From<PoolError> for InfraError {
    fn from(value: PoolError) -> Self {
        Self(EventHubError::Database(format!("connection pool: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* serde_json::Error → EventHubError */
/* -------------------------------------------------------------------------- */

impl From<JsonError> for InfraError {
    fn from(value: JsonError) -> Self {
        Self(EventHubError::Internal(format!("json encoding failed: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → EventHubError */
/* -------------------------------------------------------------------------- */

impl IntoEventHubError for HttpError {
    fn into_eventhub(self) -> EventHubError {
        if self.is_timeout() {
            return EventHubError::Network("HTTP request timed out".into());
        }

        if self.is_connect() {
            return EventHubError::Network("HTTP connection failure".into());
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                400..=499 => EventHubError::Internal(message),
                _ => EventHubError::Network(message),
            };
        }

        EventHubError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        Self(value.into_eventhub())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use reqwest::{Client, StatusCode};
    use rusqlite::ffi::{Error as FfiError, ErrorCode};
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[test]
    fn sqlite_busy_maps_to_database_error() {
        let err = SqlError::SqliteFailure(
            FfiError { code: ErrorCode::DatabaseBusy, extended_code: 5 },
            Some("database is locked".into()),
        );

        let mapped: EventHubError = InfraError::from(err).into();
        match mapped {
            EventHubError::Database(msg) => {
                assert!(msg.contains("busy") || msg.contains("locked"));
            }
            other => panic!("expected database error, got {other:?}"),
        }
    }

    #[test]
    fn unique_violation_is_named() {
        let err = SqlError::SqliteFailure(
            FfiError { code: ErrorCode::ConstraintViolation, extended_code: 1555 },
            None,
        );
        let mapped: EventHubError = InfraError::from(err).into();
        assert_eq!(mapped, EventHubError::Database("unique constraint violation".into()));
    }

    #[test]
    fn json_errors_are_internal() {
        let err = serde_json::from_str::<Vec<String>>("{").unwrap_err();
        let mapped: EventHubError = InfraError::from(err).into();
        assert!(matches!(mapped, EventHubError::Internal(_)));
    }

    #[tokio::test]
    async fn http_server_errors_map_to_network() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(StatusCode::BAD_GATEWAY))
            .mount(&server)
            .await;

        let client = Client::builder().no_proxy().build().unwrap();
        let error =
            client.get(server.uri()).send().await.unwrap().error_for_status().unwrap_err();

        let mapped: EventHubError = InfraError::from(error).into();
        match mapped {
            EventHubError::Network(msg) => assert!(msg.contains("502")),
            other => panic!("expected network error, got {other:?}"),
        }
    }
}
