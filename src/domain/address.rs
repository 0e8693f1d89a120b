//! Job address parsing.

use serde::Serialize;

/// A job address split into its postal parts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
}

impl Address {
    fn street_only(street: &str) -> Self {
        Self {
            street: street.to_string(),
            ..Default::default()
        }
    }
}

/// Parses a multi-line job address whose last line reads `"City, STATE ZIP"`.
///
/// A single-line value is all street. When the last line does not split into
/// exactly two parts on `", "`, the address is malformed and `Err` carries the
/// fallback: the first line as street, everything else empty.
///
/// ```
/// use workorder_redactor::domain::parse_address;
///
/// let addr = parse_address("123 Main St\nSpringfield, IL 62704").unwrap();
/// assert_eq!(addr.city, "Springfield");
/// assert_eq!(addr.zip, "62704");
/// ```
pub fn parse_address(raw: &str) -> Result<Address, Address> {
    let lines: Vec<&str> = raw.split('\n').collect();
    let Some((last, rest)) = lines.split_last().filter(|_| lines.len() >= 2) else {
        return Ok(Address::street_only(raw));
    };

    let parts: Vec<&str> = last.split(", ").collect();
    let [city, state_zip] = parts.as_slice() else {
        return Err(Address::street_only(lines[0]));
    };

    let mut tokens = state_zip.split_whitespace();
    Ok(Address {
        street: rest.join(" "),
        city: city.to_string(),
        state: tokens.next().unwrap_or_default().to_string(),
        zip: tokens.next().unwrap_or_default().to_string(),
    })
}
