//! Response bodies and messages shared by every generated handler.

use serde::Serialize;

/// The one error shape every generated route answers with.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ApiErrorBody {
    pub api_error: String,
}

/// Body used wherever an authorization layer rejects a request.
pub const UNAUTHORIZED_MESSAGE: &str = "Unauthorized";

/// Primary entity addressed by the request is absent.
pub fn object_missing(model_name: &str) -> String {
    format!("Requested {} object does not exist", model_name)
}

/// Field name as the client supplied it in JSON: relation fields always end in `_id`.
pub fn reported_field_name(field: &str) -> String {
    if field.ends_with("_id") {
        field.to_string()
    } else {
        format!("{}_id", field)
    }
}

/// Related record missing while creating. Answered with 400.
pub fn related_missing_on_create(related_model: &str, field: &str) -> String {
    format!(
        "{} referenced by '{}' does not exist!",
        related_model,
        reported_field_name(field)
    )
}

/// Related record missing while updating. Answered with 404.
pub fn related_missing_on_update(related_model: &str, field: &str) -> String {
    format!(
        "{} referenced by '{}' does not exist",
        related_model,
        reported_field_name(field)
    )
}
