//! Field-level checks shared by the HTTP forms and the CSV seed loader.
//!
//! Every constructor takes the raw, untrimmed text of each field (`None` when the
//! field was absent) and either returns a value that is safe to insert or a
//! `CoreError` naming the first field that failed.

use crate::error::CoreError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::str::FromStr;

/// Maximum length of `name` and `email` columns (`VARCHAR(100)`).
pub const MAX_TEXT_LEN: usize = 100;

/// Exclusive upper bound of a `NUMERIC(10, 2)` price.
pub const MAX_PRICE: Decimal = dec!(100000000);

/// A product that passed validation and can be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub price: Decimal,
}

impl NewProduct {
    pub fn parse(name: Option<&str>, price: Option<&str>) -> Result<Self, CoreError> {
        let name = required_text(name).ok_or(CoreError::InvalidProduct("name"))?;

        let price = price
            .map(str::trim)
            .and_then(|raw| Decimal::from_str(raw).ok())
            .map(|price| price.round_dp(2))
            .filter(|price| *price > Decimal::ZERO && *price < MAX_PRICE)
            .ok_or(CoreError::InvalidProduct("price"))?;

        Ok(Self { name, price })
    }
}

/// A customer that passed validation and can be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCustomer {
    pub name: String,
    pub email: String,
}

impl NewCustomer {
    pub fn parse(name: Option<&str>, email: Option<&str>) -> Result<Self, CoreError> {
        let name = required_text(name).ok_or(CoreError::InvalidCustomer("name"))?;

        let email = required_text(email)
            .filter(|email| is_plausible_email(email))
            .ok_or(CoreError::InvalidCustomer("email"))?;

        Ok(Self { name, email })
    }
}

/// A sale line that passed validation. Foreign keys are only checked for
/// positivity here; existence is enforced by the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewSale {
    pub customer_id: i32,
    pub product_id: i32,
    pub quantity: i32,
}

impl NewSale {
    pub fn parse(
        customer_id: Option<&str>,
        product_id: Option<&str>,
        quantity: Option<&str>,
    ) -> Result<Self, CoreError> {
        Ok(Self {
            customer_id: positive_int(customer_id).ok_or(CoreError::InvalidSale("customer_id"))?,
            product_id: positive_int(product_id).ok_or(CoreError::InvalidSale("product_id"))?,
            quantity: positive_int(quantity).ok_or(CoreError::InvalidSale("quantity"))?,
        })
    }
}

/// Trimmed, non-empty, at most `MAX_TEXT_LEN` characters.
fn required_text(raw: Option<&str>) -> Option<String> {
    let value = raw?.trim();
    if value.is_empty() || value.chars().count() > MAX_TEXT_LEN {
        return None;
    }
    Some(value.to_string())
}

fn positive_int(raw: Option<&str>) -> Option<i32> {
    raw?.trim().parse::<i32>().ok().filter(|value| *value > 0)
}

/// Accepts `local@domain.tld`: no whitespace, exactly one `@`, a non-empty
/// local part and a domain with a dot that is neither its first nor last char.
pub fn is_plausible_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn product_name_is_trimmed() {
        let product = NewProduct::parse(Some("  Lamp "), Some("12.50")).unwrap();
        assert_eq!(product.name, "Lamp");
        assert_eq!(product.price, dec!(12.50));
    }

    #[rstest]
    #[case(Some("0"))]
    #[case(Some("-3"))]
    #[case(Some("abc"))]
    #[case(Some(""))]
    #[case(Some("100000000"))]
    #[case(Some("0.001"))]
    #[case(None)]
    fn rejects_bad_prices(#[case] price: Option<&str>) {
        assert_eq!(
            NewProduct::parse(Some("Lamp"), price),
            Err(CoreError::InvalidProduct("price"))
        );
    }

    #[test]
    fn product_name_length_is_counted_in_chars() {
        let exactly = "é".repeat(MAX_TEXT_LEN);
        assert!(NewProduct::parse(Some(&exactly), Some("1")).is_ok());

        let too_long = "a".repeat(MAX_TEXT_LEN + 1);
        assert_eq!(
            NewProduct::parse(Some(&too_long), Some("1")),
            Err(CoreError::InvalidProduct("name"))
        );
    }

    #[rstest]
    #[case("ana@example.com", true)]
    #[case("a@b.co", true)]
    #[case("first.last@sub.example.org", true)]
    #[case("ana@example", false)]
    #[case("ana@.com", false)]
    #[case("ana@example.", false)]
    #[case("@example.com", false)]
    #[case("ana@@example.com", false)]
    #[case("a na@example.com", false)]
    #[case("ana.example.com", false)]
    fn email_pattern(#[case] email: &str, #[case] expected: bool) {
        assert_eq!(is_plausible_email(email), expected);
    }

    #[test]
    fn customer_requires_both_fields() {
        assert_eq!(
            NewCustomer::parse(Some(" "), Some("ana@example.com")),
            Err(CoreError::InvalidCustomer("name"))
        );
        assert_eq!(
            NewCustomer::parse(Some("Ana"), None),
            Err(CoreError::InvalidCustomer("email"))
        );

        let long_email = format!("{}@example.com", "a".repeat(MAX_TEXT_LEN));
        assert_eq!(
            NewCustomer::parse(Some("Ana"), Some(&long_email)),
            Err(CoreError::InvalidCustomer("email"))
        );
    }

    #[rstest]
    #[case(Some("1"), Some("2"), Some("3"), Ok(NewSale { customer_id: 1, product_id: 2, quantity: 3 }))]
    #[case(Some(" 4 "), Some("5"), Some("6"), Ok(NewSale { customer_id: 4, product_id: 5, quantity: 6 }))]
    #[case(Some("0"), Some("2"), Some("3"), Err(CoreError::InvalidSale("customer_id")))]
    #[case(Some("1"), Some("x"), Some("3"), Err(CoreError::InvalidSale("product_id")))]
    #[case(Some("1"), Some("2"), Some("-1"), Err(CoreError::InvalidSale("quantity")))]
    #[case(Some("1"), Some("2"), Some("1.5"), Err(CoreError::InvalidSale("quantity")))]
    #[case(Some("1"), Some("2"), None, Err(CoreError::InvalidSale("quantity")))]
    fn sale_fields(
        #[case] customer_id: Option<&str>,
        #[case] product_id: Option<&str>,
        #[case] quantity: Option<&str>,
        #[case] expected: Result<NewSale, CoreError>,
    ) {
        assert_eq!(NewSale::parse(customer_id, product_id, quantity), expected);
    }

    #[test]
    fn error_messages_are_client_safe() {
        assert_eq!(CoreError::InvalidSale("quantity").to_string(), "Invalid sale data");
        assert_eq!(CoreError::InvalidSale("quantity").field(), "quantity");
    }
}
