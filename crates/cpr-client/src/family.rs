//! Minor-children filter over family rows.

use crate::response::Row;
use chrono::{Datelike, NaiveDate};

/// Display name field.
pub const FIELD_NAME: &str = "ADRNVN";
/// Compound birth field; characters 5 and 6 hold the two-digit birth year.
pub const FIELD_BIRTH: &str = "PNR_FOEDDATO";
/// Family relationship field.
pub const FIELD_RELATION: &str = "FAMMRK";
/// Relationship value for a child.
pub const RELATION_CHILD: &str = "Barn";

const ADULT_AGE: i32 = 18;

/// A family member selected from a registry row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilyMember {
    pub display_name: Option<String>,
    pub birth_identifier: String,
    pub relationship_tag: String,
}

/// Keep children under 18, in input order.
///
/// Age is the difference of two-digit years (reference year mod 100 minus
/// the birth year digits), with no century correction. A row without a
/// usable birth field is skipped, the rest are still processed.
pub fn filter_minor_children(rows: &[Row], reference_date: NaiveDate) -> Vec<FamilyMember> {
    let current_year = reference_date.year() % 100;

    rows.iter()
        .filter(|row| {
            two_digit_age(row, current_year)
                .map(|age| age > 0 && age < ADULT_AGE)
                .unwrap_or(false)
        })
        .filter(|row| row.get(FIELD_RELATION) == Some(RELATION_CHILD))
        .filter_map(|row| {
            Some(FamilyMember {
                display_name: row.get(FIELD_NAME).map(String::from),
                birth_identifier: row.get(FIELD_BIRTH)?.to_string(),
                relationship_tag: RELATION_CHILD.to_string(),
            })
        })
        .collect()
}

fn two_digit_age(row: &Row, current_year: i32) -> Option<i32> {
    let year = row.get(FIELD_BIRTH)?.get(4..6)?;
    if !year.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    year.parse::<i32>().ok().map(|birth| current_year - birth)
}
