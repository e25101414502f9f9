//! Parsing of Azure storage connection strings.

use std::collections::HashMap;

use crate::{Error, Result};

/// Splits a storage connection string into its settings.
///
/// The string is a list of `Key=Value` pairs separated by `;`, a trailing `;`
/// is allowed. Values are split on the first `=` only since account keys are
/// base64 and usually end in `=`. A blank string or any segment without `=`
/// is rejected. Later duplicates win.
///
/// ```
/// use bcpaz_storage::parse_connection_string;
///
/// let settings = parse_connection_string("AccountName=acc;AccountKey=a2V5==;").unwrap();
/// assert_eq!(settings["AccountName"], "acc");
/// assert_eq!(settings["AccountKey"], "a2V5==");
/// ```
pub fn parse_connection_string(conn_str: &str) -> Result<HashMap<String, String>> {
    conn_str
        .trim_end_matches(';')
        .split(';')
        .map(|segment| {
            segment
                .split_once('=')
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .ok_or(Error::MalformedConnectionString)
        })
        .collect()
}
