/// Query-builder error type with actionable variants.
#[derive(Debug)]
pub enum QueryError {
    /// Underlying sqlx error.
    Sqlx(sqlx::Error),
    /// The operation is not available for the current dialect or builder state.
    Unsupported(String),
    /// A field that is not a column of the entity.
    InvalidField(String),
    /// A field that is not a primary key of the entity.
    InvalidPrimaryKey(String),
    /// A `${name}` variable without a bound value.
    MissingVariable(String),
    /// Invalid data source configuration.
    Config(String),
    /// Failed to read an SQL script or metadata file.
    Io(std::io::Error),
    /// Malformed JSON metadata or configuration.
    Json(serde_json::Error),
    /// Generic message error.
    Message(String),
}

impl std::fmt::Display for QueryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlx(err) => write!(f, "sqlx error: {}", err),
            Self::Unsupported(what) => write!(f, "unsupported operation: {}", what),
            Self::InvalidField(field) => write!(f, "'{}' isn't table field.", field),
            Self::InvalidPrimaryKey(field) => write!(f, "'{}' isn't primary key field.", field),
            Self::MissingVariable(name) => write!(f, "no value bound for variable '{}'", name),
            Self::Config(message) => write!(f, "invalid configuration: {}", message),
            Self::Io(err) => write!(f, "io error: {}", err),
            Self::Json(err) => write!(f, "json error: {}", err),
            Self::Message(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for QueryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Sqlx(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for QueryError {
    fn from(err: sqlx::Error) -> Self {
        map_sqlx_error(err)
    }
}

impl From<std::io::Error> for QueryError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for QueryError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

/// Result alias for query operations.
pub type QueryResult<T> = Result<T, QueryError>;

/// Convert sqlx errors to query errors, unwrapping configuration failures.
pub fn map_sqlx_error(err: sqlx::Error) -> QueryError {
    match err {
        sqlx::Error::Configuration(source) => QueryError::Config(source.to_string()),
        sqlx::Error::Io(source) => QueryError::Io(source),
        other => QueryError::Sqlx(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_field_messages_match_entity_validation() {
        assert_eq!(
            QueryError::InvalidField("nick".to_owned()).to_string(),
            "'nick' isn't table field."
        );
        assert_eq!(
            QueryError::InvalidPrimaryKey("name".to_owned()).to_string(),
            "'name' isn't primary key field."
        );
    }

    #[test]
    fn sqlx_io_errors_are_unwrapped() {
        let err = sqlx::Error::Io(std::io::Error::other("disk gone"));
        assert!(matches!(QueryError::from(err), QueryError::Io(_)));
        let err = sqlx::Error::RowNotFound;
        assert!(matches!(QueryError::from(err), QueryError::Sqlx(_)));
    }
}
