use chrono::NaiveDate;

use crate::Error;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
const MAX_PRODUCT_ID_LEN: usize = 64;

/// Parse a `YYYY-MM-DD` civil date. Unpadded fields, signs and surrounding
/// whitespace are rejected.
pub fn parse_date(s: &str) -> Result<NaiveDate, Error> {
    let invalid = || Error::InvalidRange(format!("{:?} is not a YYYY-MM-DD date", s));
    if !has_date_shape(s) {
        return Err(invalid());
    }
    NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|_| invalid())
}

fn has_date_shape(s: &str) -> bool {
    s.len() == 10
        && s.bytes().enumerate().all(|(i, b)| match i {
            4 | 7 => b == b'-',
            _ => b.is_ascii_digit(),
        })
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn validate_product_id(id: &str) -> Result<(), Error> {
    if id.is_empty() || id.len() > MAX_PRODUCT_ID_LEN {
        return Err(Error::InvalidProductId(id.to_string()));
    }
    Ok(())
}
