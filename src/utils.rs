use crate::errors::ArborError;

/// Create a string of all available items.
pub fn items_to_strings(items: Vec<&str>) -> String {
    items.join(", ")
}

// Validation
pub fn validate_min_parameter(value: usize, min: usize, parameter: &str) -> Result<(), ArborError> {
    if value < min {
        Err(ArborError::InvalidParameter(
            parameter.to_string(),
            format!("an integer of at least {}", min),
            value.to_string(),
        ))
    } else {
        Ok(())
    }
}
