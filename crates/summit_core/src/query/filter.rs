//! Filter token validation.
//!
//! # Responsibility
//! - Map user-facing field and operator tokens to closed enums.
//! - Coerce values for numeric fields and collect the inequality field.
//!
//! # Invariants
//! - Validation is a pure function over its inputs.
//! - Two distinct fields with non-equality operators always fail.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result type for filter validation.
pub type FilterResult<T> = Result<T, FilterError>;

/// Errors produced while validating user-supplied filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    /// Field token is not one of the supported filter fields.
    InvalidField(String),
    /// Operator token is not one of the supported comparison operators.
    InvalidOperator(String),
    /// Value cannot be coerced for a numeric field.
    InvalidValue { field: FilterField, value: String },
    /// A second distinct field requested a non-equality operator.
    MultipleInequalityFields {
        first: FilterField,
        second: FilterField,
    },
}

impl Display for FilterError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidField(token) => write!(f, "invalid filter field token `{token}`"),
            Self::InvalidOperator(token) => {
                write!(f, "invalid filter operator token `{token}`")
            }
            Self::InvalidValue { field, value } => write!(
                f,
                "invalid value `{value}` for numeric field `{}`",
                field.field_name()
            ),
            Self::MultipleInequalityFields { first, second } => write!(
                f,
                "inequality filter allowed on one field only, got `{}` and `{}`",
                first.field_name(),
                second.field_name()
            ),
        }
    }
}

impl Error for FilterError {}

/// Closed set of filterable conference fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    City,
    Topic,
    Month,
    MaxAttendees,
}

impl FilterField {
    /// Parses a user-facing field token.
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "CITY" => Some(Self::City),
            "TOPIC" => Some(Self::Topic),
            "MONTH" => Some(Self::Month),
            "MAX_ATTENDEES" => Some(Self::MaxAttendees),
            _ => None,
        }
    }

    /// Internal field name used by the store layer.
    pub fn field_name(self) -> &'static str {
        match self {
            Self::City => "city",
            Self::Topic => "topics",
            Self::Month => "month",
            Self::MaxAttendees => "max_attendees",
        }
    }

    /// Whether values for this field are coerced from text to integer.
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Month | Self::MaxAttendees)
    }
}

/// Closed set of comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    Eq,
    Gt,
    GtEq,
    Lt,
    LtEq,
    Ne,
}

impl FilterOperator {
    /// Parses a user-facing operator token.
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "EQ" => Some(Self::Eq),
            "GT" => Some(Self::Gt),
            "GTEQ" => Some(Self::GtEq),
            "LT" => Some(Self::Lt),
            "LTEQ" => Some(Self::LtEq),
            "NE" => Some(Self::Ne),
            _ => None,
        }
    }

    /// SQL comparison spelling for this operator.
    pub fn sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Ne => "!=",
        }
    }

    /// Whether this operator marks its field as the inequality field.
    pub fn is_equality(self) -> bool {
        matches!(self, Self::Eq)
    }
}

/// Coerced filter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    Text(String),
    Integer(i64),
}

/// Raw, unvalidated filter triple as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFilter {
    pub field: String,
    pub operator: String,
    pub value: String,
}

impl RawFilter {
    pub fn new(
        field: impl Into<String>,
        operator: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            operator: operator.into(),
            value: value.into(),
        }
    }
}

/// One validated filter predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConferenceFilter {
    pub field: FilterField,
    pub operator: FilterOperator,
    pub value: FilterValue,
}

/// Validated filter sequence plus the designated inequality field, if any.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidatedFilters {
    pub filters: Vec<ConferenceFilter>,
    pub inequality_field: Option<FilterField>,
}

/// Validates raw filters into typed predicates.
///
/// # Contract
/// - Rejects unknown field tokens with [`FilterError::InvalidField`].
/// - Rejects unknown operator tokens with [`FilterError::InvalidOperator`].
/// - Coerces values of numeric fields, rejecting non-numeric input.
/// - Collects at most one inequality field; a second distinct one fails
///   with [`FilterError::MultipleInequalityFields`].
pub fn validate_filters(raw_filters: &[RawFilter]) -> FilterResult<ValidatedFilters> {
    let mut filters = Vec::with_capacity(raw_filters.len());
    let mut inequality_field: Option<FilterField> = None;

    for raw in raw_filters {
        let field = FilterField::parse(raw.field.as_str())
            .ok_or_else(|| FilterError::InvalidField(raw.field.clone()))?;
        let operator = FilterOperator::parse(raw.operator.as_str())
            .ok_or_else(|| FilterError::InvalidOperator(raw.operator.clone()))?;

        let value = if field.is_numeric() {
            let parsed = raw.value.trim().parse::<i64>().map_err(|_| {
                FilterError::InvalidValue {
                    field,
                    value: raw.value.clone(),
                }
            })?;
            FilterValue::Integer(parsed)
        } else {
            FilterValue::Text(raw.value.clone())
        };

        if !operator.is_equality() {
            match inequality_field {
                Some(existing) if existing != field => {
                    return Err(FilterError::MultipleInequalityFields {
                        first: existing,
                        second: field,
                    });
                }
                _ => inequality_field = Some(field),
            }
        }

        filters.push(ConferenceFilter {
            field,
            operator,
            value,
        });
    }

    Ok(ValidatedFilters {
        filters,
        inequality_field,
    })
}

#[cfg(test)]
mod tests {
    use super::{validate_filters, FilterError, FilterField, FilterValue, RawFilter};

    #[test]
    fn parses_known_tokens_and_coerces_numeric_values() {
        let validated = validate_filters(&[
            RawFilter::new("CITY", "EQ", "London"),
            RawFilter::new("MONTH", "EQ", "6"),
        ])
        .unwrap();

        assert_eq!(validated.filters.len(), 2);
        assert_eq!(validated.inequality_field, None);
        assert_eq!(
            validated.filters[1].value,
            FilterValue::Integer(6),
            "numeric fields must be coerced from text"
        );
    }

    #[test]
    fn unknown_field_token_is_rejected() {
        let err = validate_filters(&[RawFilter::new("COUNTRY", "EQ", "UK")]).unwrap_err();
        assert!(matches!(err, FilterError::InvalidField(token) if token == "COUNTRY"));
    }

    #[test]
    fn unknown_operator_token_is_rejected() {
        let err = validate_filters(&[RawFilter::new("CITY", "LIKE", "Lon")]).unwrap_err();
        assert!(matches!(err, FilterError::InvalidOperator(token) if token == "LIKE"));
    }

    #[test]
    fn non_numeric_value_for_numeric_field_is_rejected() {
        let err = validate_filters(&[RawFilter::new("MAX_ATTENDEES", "GT", "many")]).unwrap_err();
        assert!(matches!(
            err,
            FilterError::InvalidValue {
                field: FilterField::MaxAttendees,
                ..
            }
        ));
    }

    #[test]
    fn second_distinct_inequality_field_is_rejected() {
        let err = validate_filters(&[
            RawFilter::new("MONTH", "GT", "3"),
            RawFilter::new("MAX_ATTENDEES", "LT", "100"),
        ])
        .unwrap_err();
        assert!(matches!(err, FilterError::MultipleInequalityFields { .. }));
    }

    #[test]
    fn repeated_inequality_on_same_field_is_allowed() {
        let validated = validate_filters(&[
            RawFilter::new("MONTH", "GTEQ", "3"),
            RawFilter::new("MONTH", "LTEQ", "9"),
        ])
        .unwrap();
        assert_eq!(validated.inequality_field, Some(FilterField::Month));
    }
}
