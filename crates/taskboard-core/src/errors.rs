/// Request-shape errors raised before any storage access.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),
}

impl ValidationError {
    /// Message returned to HTTP clients.
    pub fn client_message(&self) -> String {
        match self {
            Self::MissingField("title") => "Title is required".to_string(),
            Self::MissingField("name") => "Category name is required".to_string(),
            Self::MissingField(field) => format!("{field} is required"),
        }
    }

    /// Short classification string for logging.
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::MissingField(_) => "missing_field",
        }
    }
}
