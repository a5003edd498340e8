//! # Validation Module
//!
//! Field-level validators shared by every payload in [`crate::payload`].
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: JSON decode (axum extractor)                                 │
//! │  ├── Shape and types (string vs number, missing required keys)         │
//! │  └── Malformed body → 400                                              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Payload::validate() using THIS MODULE                        │
//! │  ├── Lengths, positivity, formats                                      │
//! │  ├── Normalization (trim, lowercase email)                             │
//! │  └── Every failing field collected → 400 with `errors[]`               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Entity service + SQLite                                      │
//! │  ├── Existence, price ordering after merge                             │
//! │  └── UNIQUE (name_key) and FOREIGN KEY constraints                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Validators take the field path as a parameter so nested entries report
//! paths like `items.2.quantity` or `tags.0`.
//!
//! ## Usage
//! ```rust
//! use comanda_core::validation::{validate_email, validate_text};
//!
//! assert_eq!(validate_text("name", "  X-Burger ", 1, Some(100)).unwrap(), "X-Burger");
//! assert_eq!(validate_email("email", " Ana@Example.COM ").unwrap(), "ana@example.com");
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::Role;
use crate::MAX_PAGE_SIZE;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Trims `value` and checks its length in characters.
///
/// ## Rules
/// - `min == 0` accepts the empty string
/// - `min > 0` reports an empty value as `Required`
/// - `max` of `None` means unbounded
pub fn validate_text(
    field: &str,
    value: &str,
    min: usize,
    max: Option<usize>,
) -> ValidationResult<String> {
    let value = value.trim();
    let len = value.chars().count();

    if min > 0 && len == 0 {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if len < min {
        return Err(ValidationError::TooShort {
            field: field.to_string(),
            min,
        });
    }

    if let Some(max) = max {
        if len > max {
            return Err(ValidationError::TooLong {
                field: field.to_string(),
                max,
            });
        }
    }

    Ok(value.to_string())
}

/// Case-folded form of a name, used for uniqueness and lookups.
///
/// Folds the whole of Unicode, not only ASCII.
///
/// ## Example
/// ```rust
/// use comanda_core::validation::name_key;
///
/// assert_eq!(name_key("PÃO DE QUEIJO"), name_key("Pão de Queijo"));
/// ```
pub fn name_key(name: &str) -> String {
    name.to_lowercase()
}

/// Case-folded text a product listing search matches against.
pub fn search_key(name: &str, description: Option<&str>) -> String {
    match description {
        Some(description) => format!("{} {}", name_key(name), name_key(description)),
        None => name_key(name),
    }
}

/// Validates and normalizes an email address (trimmed, lowercased).
///
/// ## Rules
/// - Exactly one `@` with a non-empty local part
/// - Domain contains a dot that is neither first nor last
/// - No whitespace
///
/// ## Example
/// ```rust
/// use comanda_core::validation::validate_email;
///
/// assert!(validate_email("email", "admin@comanda.dev").is_ok());
/// assert!(validate_email("email", "admin@localhost").is_err());
/// assert!(validate_email("email", "").is_err());
/// ```
pub fn validate_email(field: &str, value: &str) -> ValidationResult<String> {
    let email = value.trim().to_lowercase();

    if email.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    let invalid = || ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid email address".to_string(),
    };

    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }

    let dot_ok = domain
        .find('.')
        .map(|_| !domain.starts_with('.') && !domain.ends_with('.') && !domain.contains(".."))
        .unwrap_or(false);
    if !dot_ok {
        return Err(invalid());
    }

    Ok(email)
}

/// Validates an absolute http(s) URL.
///
/// ## Example
/// ```rust
/// use comanda_core::validation::validate_url;
///
/// assert!(validate_url("imageUrl", "https://cdn.example.com/burger.png").is_ok());
/// assert!(validate_url("imageUrl", "burger.png").is_err());
/// ```
pub fn validate_url(field: &str, value: &str) -> ValidationResult<String> {
    let url = value.trim();

    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"));

    let host = rest.and_then(|r| r.split(['/', '?', '#']).next());
    match host {
        Some(host) if !host.is_empty() && !url.chars().any(char::is_whitespace) => {
            Ok(url.to_string())
        }
        _ => Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must be a valid URL".to_string(),
        }),
    }
}

/// Validates a password length without trimming it.
pub fn validate_password(field: &str, value: &str, min: usize) -> ValidationResult<()> {
    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() < min {
        return Err(ValidationError::TooShort {
            field: field.to_string(),
            min,
        });
    }

    Ok(())
}

/// Trims every entry of a string list; empty entries fail as `field.<index>`.
///
/// Returns the trimmed list, or every failing entry.
pub fn validate_string_list(
    field: &str,
    values: &[String],
) -> Result<Vec<String>, Vec<ValidationError>> {
    let mut out = Vec::with_capacity(values.len());
    let mut errors = Vec::new();

    for (index, value) in values.iter().enumerate() {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            errors.push(ValidationError::TooShort {
                field: format!("{field}.{index}"),
                min: 1,
            });
        } else {
            out.push(trimmed.to_string());
        }
    }

    if errors.is_empty() {
        Ok(out)
    } else {
        Err(errors)
    }
}

/// Parses a role name accepted by the user admin screen.
///
/// `VIP_CLIENT` exists but cannot be assigned through this path.
pub fn validate_assignable_role(field: &str, value: &str) -> ValidationResult<Role> {
    const ASSIGNABLE: [Role; 3] = [Role::Client, Role::Admin, Role::Staff];

    ASSIGNABLE
        .into_iter()
        .find(|role| role.as_str() == value)
        .ok_or_else(|| ValidationError::NotAllowed {
            field: field.to_string(),
            allowed: ASSIGNABLE.iter().map(|r| r.as_str().to_string()).collect(),
        })
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates that an amount is strictly positive.
///
/// ## Example
/// ```rust
/// use comanda_core::money::Money;
/// use comanda_core::validation::validate_positive_money;
///
/// assert!(validate_positive_money("price", Money::from_cents(1990)).is_ok());
/// assert!(validate_positive_money("price", Money::zero()).is_err());
/// ```
pub fn validate_positive_money(field: &str, amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates that a count (quantity, serving) is strictly positive.
pub fn validate_positive_count(field: &str, value: i64) -> ValidationResult<()> {
    if value <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a quantity is in `1..=max`.
///
/// ## Example
/// ```rust
/// use comanda_core::validation::validate_quantity;
///
/// assert!(validate_quantity("items.0.quantity", 3, 999).is_ok());
/// assert!(validate_quantity("items.0.quantity", 0, 999).is_err());
/// assert!(validate_quantity("items.0.quantity", 1000, 999).is_err());
/// ```
pub fn validate_quantity(field: &str, value: i64, max: i64) -> ValidationResult<()> {
    validate_positive_count(field, value)?;
    if value > max {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 1,
            max,
        });
    }
    Ok(())
}

/// Validates a JSON value is an object (`nutritionalInfo`).
pub fn validate_json_object(field: &str, value: &serde_json::Value) -> ValidationResult<()> {
    if !value.is_object() {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must be a JSON object".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Pagination Validators
// =============================================================================

/// Parses the `page` query parameter. Missing or empty means page 1.
pub fn parse_page(raw: Option<&str>) -> ValidationResult<u32> {
    let page = parse_count("page", raw, 1)?;
    if page == 0 {
        return Err(ValidationError::MustBePositive {
            field: "page".to_string(),
        });
    }
    Ok(page)
}

/// Parses the `limit` query parameter (1..=MAX_PAGE_SIZE).
pub fn parse_limit(raw: Option<&str>) -> ValidationResult<u32> {
    let limit = parse_count("limit", raw, crate::DEFAULT_PAGE_SIZE)?;
    if limit == 0 || limit > MAX_PAGE_SIZE {
        return Err(ValidationError::OutOfRange {
            field: "limit".to_string(),
            min: 1,
            max: MAX_PAGE_SIZE as i64,
        });
    }
    Ok(limit)
}

fn parse_count(field: &str, raw: Option<&str>, default: u32) -> ValidationResult<u32> {
    match raw.map(str::trim) {
        None | Some("") => Ok(default),
        Some(value) => value.parse::<u32>().map_err(|_| ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must be a positive integer".to_string(),
        }),
    }
}

/// Parses a boolean query flag. Only the literal `true` is true.
pub fn parse_flag(raw: Option<&str>) -> Option<bool> {
    raw.map(|value| value == "true")
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_key_folds_non_ascii() {
        assert_eq!(name_key("PÃO DE QUEIJO"), "pão de queijo");
        assert_eq!(name_key("Crème Brûlée"), name_key("CRÈME BRÛLÉE"));
        assert_ne!(name_key("Pão"), name_key("Pao"));

        assert_eq!(search_key("Açaí", Some("Com GRANOLA")), "açaí com granola");
        assert_eq!(search_key("Açaí", None), "açaí");
    }

    #[test]
    fn test_validate_text() {
        assert_eq!(validate_text("name", " Fries ", 1, Some(50)).unwrap(), "Fries");
        assert!(matches!(
            validate_text("name", "   ", 1, Some(50)),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            validate_text("name", "ab", 3, None),
            Err(ValidationError::TooShort { min: 3, .. })
        ));
        assert!(matches!(
            validate_text("name", &"a".repeat(51), 1, Some(50)),
            Err(ValidationError::TooLong { max: 50, .. })
        ));
        assert_eq!(validate_text("description", "", 0, Some(200)).unwrap(), "");
    }

    #[test]
    fn test_validate_text_counts_characters() {
        // 50 multi-byte characters still fit in a 50-character limit
        let name = "ã".repeat(50);
        assert!(validate_text("name", &name, 1, Some(50)).is_ok());
    }

    #[test]
    fn test_validate_email() {
        assert_eq!(
            validate_email("email", "  Chef@Comanda.Dev ").unwrap(),
            "chef@comanda.dev"
        );
        assert!(validate_email("email", "no-at-sign").is_err());
        assert!(validate_email("email", "@example.com").is_err());
        assert!(validate_email("email", "a@b@example.com").is_err());
        assert!(validate_email("email", "a@example.").is_err());
        assert!(validate_email("email", "a b@example.com").is_err());
    }

    #[test]
    fn test_validate_url() {
        assert!(validate_url("imageUrl", "http://img.test/a.png").is_ok());
        assert!(validate_url("imageUrl", "https://img.test").is_ok());
        assert!(validate_url("imageUrl", "ftp://img.test/a.png").is_err());
        assert!(validate_url("imageUrl", "https://").is_err());
    }

    #[test]
    fn test_validate_string_list() {
        let ok = validate_string_list("tags", &[" vegan ".into(), "spicy".into()]).unwrap();
        assert_eq!(ok, vec!["vegan", "spicy"]);

        let errs = validate_string_list("tags", &["ok".into(), "  ".into()]).unwrap_err();
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].field(), "tags.1");
    }

    #[test]
    fn test_validate_assignable_role() {
        assert_eq!(validate_assignable_role("role", "STAFF").unwrap(), Role::Staff);
        assert!(validate_assignable_role("role", "VIP_CLIENT").is_err());
        assert!(validate_assignable_role("role", "admin").is_err());
    }

    #[test]
    fn test_positive_checks() {
        assert!(validate_positive_money("price", Money::from_cents(1)).is_ok());
        assert!(validate_positive_money("price", Money::from_cents(-1)).is_err());
        assert!(validate_positive_count("serving", 2).is_ok());
        assert!(validate_positive_count("items.0.quantity", 0).is_err());

        assert!(matches!(
            validate_quantity("items.0.quantity", 0, 999),
            Err(ValidationError::MustBePositive { .. })
        ));
        assert!(matches!(
            validate_quantity("items.0.quantity", 9_000_000_000_000_000, 999),
            Err(ValidationError::OutOfRange { min: 1, max: 999, .. })
        ));
        assert!(validate_quantity("items.0.quantity", 999, 999).is_ok());
    }

    #[test]
    fn test_pagination() {
        assert_eq!(parse_page(None).unwrap(), 1);
        assert_eq!(parse_page(Some("3")).unwrap(), 3);
        assert!(parse_page(Some("0")).is_err());
        assert!(parse_page(Some("abc")).is_err());

        assert_eq!(parse_limit(None).unwrap(), 10);
        assert_eq!(parse_limit(Some("100")).unwrap(), 100);
        assert!(parse_limit(Some("101")).is_err());
        assert!(parse_limit(Some("0")).is_err());
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag(None), None);
        assert_eq!(parse_flag(Some("true")), Some(true));
        assert_eq!(parse_flag(Some("false")), Some(false));
        assert_eq!(parse_flag(Some("yes")), Some(false));
    }
}
