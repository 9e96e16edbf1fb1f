//! Date-of-birth conversions between input, portal form, and portal path formats

use chrono::NaiveDate;

/// Format used by member input files
const INPUT_DATE_FORMAT: &str = "%Y-%m-%d";

/// Format the portal expects in forms and returns in member info
const OUTPUT_DATE_FORMAT: &str = "%m/%d/%Y";

/// Converts an input date (`YYYY-MM-DD`) to the portal format (`MM/DD/YYYY`)
///
/// Missing or malformed dates produce an empty string rather than an error.
///
/// # Examples
///
/// ```
/// use eligibility_crawler::session::convert_date;
///
/// assert_eq!(convert_date(Some("2020-05-01")), "05/01/2020");
/// assert_eq!(convert_date(Some("05/01/2020")), "");
/// assert_eq!(convert_date(None), "");
/// ```
pub fn convert_date(date: Option<&str>) -> String {
    date.and_then(|d| NaiveDate::parse_from_str(d, INPUT_DATE_FORMAT).ok())
        .map(|d| d.format(OUTPUT_DATE_FORMAT).to_string())
        .unwrap_or_default()
}

/// Reorders a portal date (`MM/DD/YYYY`) into the eligibility path form (`YYYY-MM-DD`)
///
/// The parts are reordered as-is; anything that does not split into exactly
/// three parts yields `None`.
pub fn portal_dob(dob: &str) -> Option<String> {
    let parts: Vec<&str> = dob.trim().split('/').collect();
    match parts.as_slice() {
        [month, day, year] if !month.is_empty() && !day.is_empty() && !year.is_empty() => {
            Some(format!("{}-{}-{}", year, month, day))
        }
        _ => None,
    }
}
