//! Bridge from `validator` derive output to `ValidationErrors`

use blog_core::error::ValidationErrors;
use validator::Validate;

/// Run the derived validations, collecting failures per field
pub fn validate<T: Validate>(value: &T) -> Result<(), ValidationErrors> {
    let Err(report) = value.validate() else {
        return Ok(());
    };

    let mut errors = ValidationErrors::new();
    for (field, field_errors) in report.field_errors() {
        for error in field_errors {
            let message = error
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("is invalid ({})", error.code));
            errors.add(field.to_string(), message);
        }
    }
    errors.into_result()
}
