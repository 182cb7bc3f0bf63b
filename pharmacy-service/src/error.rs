use http::StatusCode;
use pharmacy_catalog::CatalogError;
use pharmacy_core::{CoreError, ErrorClass, StoreError};
use pharmacy_order::OrderError;
use serde_json::json;

/// Caller-facing failure. Every crate error folds into one of four classes.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    TerminalState(String),
    #[error("Internal Server Error")]
    Internal(String),
}

impl ServiceError {
    fn classify(class: ErrorClass, message: String) -> Self {
        match class {
            ErrorClass::Validation => ServiceError::Validation(message),
            ErrorClass::NotFound => ServiceError::NotFound(message),
            ErrorClass::TerminalState => ServiceError::TerminalState(message),
            ErrorClass::Internal => {
                tracing::error!("Internal Server Error: {}", message);
                ServiceError::Internal(message)
            }
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            ServiceError::Validation(_) => ErrorClass::Validation,
            ServiceError::NotFound(_) => ErrorClass::NotFound,
            ServiceError::TerminalState(_) => ErrorClass::TerminalState,
            ServiceError::Internal(_) => ErrorClass::Internal,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) | ServiceError::TerminalState(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// `{"error": ...}`; internal details stay in the log.
    pub fn body(&self) -> serde_json::Value {
        json!({ "error": self.to_string() })
    }
}

impl From<OrderError> for ServiceError {
    fn from(err: OrderError) -> Self {
        Self::classify(err.class(), err.to_string())
    }
}

impl From<CatalogError> for ServiceError {
    fn from(err: CatalogError) -> Self {
        Self::classify(err.class(), err.to_string())
    }
}

impl From<CoreError> for ServiceError {
    fn from(err: CoreError) -> Self {
        Self::classify(err.class(), err.to_string())
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        Self::classify(ErrorClass::Internal, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pharmacy_order::OrderStatus;
    use uuid::Uuid;

    #[test]
    fn test_status_mapping() {
        let err = ServiceError::from(OrderError::PickupWithoutPharmacy);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.body()["error"], "A pharmacy must be selected for pickup");

        let err = ServiceError::from(OrderError::NotFound(Uuid::nil()));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let err = ServiceError::from(OrderError::TerminalState(OrderStatus::Completed));
        assert_eq!(err.class(), ErrorClass::TerminalState);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err = ServiceError::from(OrderError::EmptyCart);
        assert_eq!(err.class(), ErrorClass::Validation);
    }

    #[test]
    fn test_internal_errors_hide_details() {
        let err = ServiceError::from(StoreError::Backend("connection reset".into()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.body()["error"], "Internal Server Error");

        let err = ServiceError::from(OrderError::Store(StoreError::Corrupt("status".into())));
        assert_eq!(err.class(), ErrorClass::Internal);
    }
}
