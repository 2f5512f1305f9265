use chrono::{Datelike, NaiveDate};

use super::Contact;

/// Days ahead covered by the upcoming-birthdays listing
pub const BIRTHDAY_WINDOW_DAYS: i64 = 7;

/// Next anniversary of `birth_date` on or after `today`.
///
/// A 29 February birthday falls on 28 February in non-leap years.
pub fn next_birthday(birth_date: NaiveDate, today: NaiveDate) -> NaiveDate {
    let this_year = anniversary(birth_date, today.year());
    if this_year >= today {
        this_year
    } else {
        anniversary(birth_date, today.year() + 1)
    }
}

fn anniversary(birth_date: NaiveDate, year: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, birth_date.month(), birth_date.day())
        .or_else(|| NaiveDate::from_ymd_opt(year, 2, 28))
        .unwrap_or(birth_date)
}

/// Contacts whose next birthday falls within `today..=today + days`,
/// soonest first.
pub fn upcoming_birthdays(contacts: Vec<Contact>, today: NaiveDate, days: i64) -> Vec<Contact> {
    let mut upcoming: Vec<(i64, Contact)> = contacts
        .into_iter()
        .filter_map(|contact| {
            let until = (next_birthday(contact.birth_date, today) - today).num_days();
            (until <= days).then_some((until, contact))
        })
        .collect();

    upcoming.sort_by_key(|(until, contact)| (*until, contact.id));
    upcoming.into_iter().map(|(_, contact)| contact).collect()
}
