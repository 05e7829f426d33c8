use thiserror::Error;

/// Errors that can occur while reading or writing State fields
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    /// A typed value could not be converted into a serializable field value
    #[error("Field '{field}' could not be serialized: {message}")]
    Serialize { field: String, message: String },

    /// A field holds a value that does not have the requested shape
    #[error("Field '{field}' does not hold a {expected}: {message}")]
    FieldType {
        field: String,
        expected: &'static str,
        message: String,
    },
}
