use super::{LoginRequest, RegisterRequest, ValidationError, ValidationResult};

/// Trait for validating input models
pub trait Validate {
    fn validate(&self) -> ValidationResult<()>;
}

/// Validation constants
pub const MAX_CART_ID_LENGTH: usize = 200;
pub const MAX_USER_NAME_LENGTH: usize = 100;
pub const MIN_ADD_QUANTITY: u32 = 1;

impl Validate for RegisterRequest {
    fn validate(&self) -> ValidationResult<()> {
        validate_user_name(&self.name)?;
        require_field("password", &self.password)?;
        require_field("email", &self.email)?;
        Ok(())
    }
}

impl Validate for LoginRequest {
    fn validate(&self) -> ValidationResult<()> {
        require_field("name", &self.name)?;
        require_field("password", &self.password)?;
        Ok(())
    }
}

/// Parse a quantity path segment for the add-item workflow.
///
/// Accepts any integral number (`"3"`, `"3.0"`, `"1e2"`) that is at least 1.
pub fn parse_add_quantity(raw: &str) -> ValidationResult<u32> {
    parse_quantity(raw, MIN_ADD_QUANTITY)
}

/// Parse a quantity path segment for updates, where 0 removes the line
pub fn parse_update_quantity(raw: &str) -> ValidationResult<u32> {
    parse_quantity(raw, 0)
}

fn parse_quantity(raw: &str, min: u32) -> ValidationResult<u32> {
    let trimmed = raw.trim();

    let value = match trimmed.parse::<i64>() {
        Ok(value) => value,
        Err(_) => match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() && value.fract() == 0.0 => value as i64,
            _ => {
                return Err(ValidationError::InvalidValue {
                    field: "qty".to_string(),
                    value: raw.to_string(),
                    reason: "quantity must be a whole number".to_string(),
                })
            }
        },
    };

    if value < i64::from(min) || value > i64::from(u32::MAX) {
        return Err(ValidationError::OutOfRange {
            field: "qty".to_string(),
            min: min.to_string(),
            max: u32::MAX.to_string(),
            value: raw.to_string(),
        });
    }

    Ok(value as u32)
}

/// Validate a caller-supplied cart identifier
pub fn validate_cart_id(cart_id: &str) -> ValidationResult<()> {
    let trimmed = cart_id.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::RequiredField {
            field: "cart_id".to_string(),
        });
    }

    if trimmed.len() > MAX_CART_ID_LENGTH {
        return Err(ValidationError::TooLong {
            field: "cart_id".to_string(),
            max_length: MAX_CART_ID_LENGTH,
            actual_length: trimmed.len(),
        });
    }

    Ok(())
}

/// Validate a user name used as the document key
pub fn validate_user_name(name: &str) -> ValidationResult<()> {
    require_field("name", name)?;

    let trimmed = name.trim();
    if trimmed.len() > MAX_USER_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max_length: MAX_USER_NAME_LENGTH,
            actual_length: trimmed.len(),
        });
    }

    if trimmed.chars().any(|c| c.is_control()) {
        return Err(ValidationError::InvalidValue {
            field: "name".to_string(),
            value: name.to_string(),
            reason: "Contains invalid control characters".to_string(),
        });
    }

    Ok(())
}

fn require_field(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::RequiredField {
            field: field.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_add_quantity() {
        // Valid quantities
        assert_eq!(parse_add_quantity("1").unwrap(), 1);
        assert_eq!(parse_add_quantity("42").unwrap(), 42);
        assert_eq!(parse_add_quantity("3.0").unwrap(), 3);
        assert_eq!(parse_add_quantity("1e2").unwrap(), 100);

        // Invalid quantities
        assert!(parse_add_quantity("0").is_err());
        assert!(parse_add_quantity("-2").is_err());
        assert!(parse_add_quantity("2.5").is_err());
        assert!(parse_add_quantity("abc").is_err());
        assert!(parse_add_quantity("").is_err());
        assert!(parse_add_quantity("NaN").is_err());
        assert!(parse_add_quantity("99999999999").is_err());
    }

    #[test]
    fn test_parse_update_quantity_allows_zero() {
        assert_eq!(parse_update_quantity("0").unwrap(), 0);
        assert_eq!(parse_update_quantity("5").unwrap(), 5);
        assert!(parse_update_quantity("-1").is_err());
    }

    #[test]
    fn test_validate_cart_id() {
        assert!(validate_cart_id("anonymous-1").is_ok());
        assert!(validate_cart_id("").is_err());
        assert!(validate_cart_id("   ").is_err());
        assert!(validate_cart_id(&"a".repeat(MAX_CART_ID_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_register_request_validation() {
        let valid_request = RegisterRequest {
            name: "robot".to_string(),
            password: "secret".to_string(),
            email: "robot@example.com".to_string(),
        };
        assert!(valid_request.validate().is_ok());

        let missing_email = RegisterRequest {
            email: "".to_string(),
            ..valid_request.clone()
        };
        assert!(missing_email.validate().is_err());

        let bad_name = RegisterRequest {
            name: "ro\u{0}bot".to_string(),
            ..valid_request
        };
        assert!(bad_name.validate().is_err());
    }

    #[test]
    fn test_login_request_validation() {
        let request = LoginRequest {
            name: "robot".to_string(),
            password: "".to_string(),
        };
        assert!(request.validate().is_err());
    }
}
