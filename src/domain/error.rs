use thiserror::Error;

/// Field-level rule violations on records entering the store.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("{field} must not be negative (got {value})")]
    Negative { field: &'static str, value: i64 },
    #[error("{field} must be greater than zero (got {value})")]
    NotPositive { field: &'static str, value: i64 },
}

impl DomainError {
    pub fn field(&self) -> &'static str {
        match self {
            Self::Negative { field, .. } | Self::NotPositive { field, .. } => field,
        }
    }
}

pub fn ensure_non_negative(field: &'static str, value: impl Into<i64>) -> Result<(), DomainError> {
    let value = value.into();
    if value < 0 {
        return Err(DomainError::Negative { field, value });
    }
    Ok(())
}

pub fn ensure_positive(field: &'static str, value: impl Into<i64>) -> Result<(), DomainError> {
    let value = value.into();
    if value <= 0 {
        return Err(DomainError::NotPositive { field, value });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_non_negative_but_not_positive() {
        assert!(ensure_non_negative("quantity", 0).is_ok());
        assert_eq!(
            ensure_positive("quantity", 0),
            Err(DomainError::NotPositive {
                field: "quantity",
                value: 0
            })
        );
    }

    #[test]
    fn message_names_field_and_value() {
        let err = ensure_non_negative("price_cents", -5_i64).expect_err("negative");
        assert_eq!(err.field(), "price_cents");
        assert_eq!(err.to_string(), "price_cents must not be negative (got -5)");
    }
}
