use thiserror::Error;

use crate::users::repo_types::User;

/// Fields a record can be looked up by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Id,
    Name,
    Phone,
    Email,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no record ids left to allocate")]
pub struct IdsExhausted;

/// Next free id: one past the highest valid id, or 1 for an empty collection.
pub fn next_id(users: &[User]) -> Result<u64, IdsExhausted> {
    match users.iter().filter_map(|u| u.id).max() {
        Some(max) => max.checked_add(1).ok_or(IdsExhausted),
        None => Ok(1),
    }
}

/// Gives every record without a valid id the next free one, in encounter order.
///
/// Only touches the collection in memory; returns how many records changed so the
/// caller can decide whether to persist. Nothing changes when the ids would run out.
pub fn repair_ids(users: &mut [User]) -> Result<usize, IdsExhausted> {
    let missing = users.iter().filter(|u| u.id.is_none()).count();
    if missing == 0 {
        return Ok(0);
    }
    let mut next = next_id(users)?;
    if next.checked_add(missing as u64 - 1).is_none() {
        return Err(IdsExhausted);
    }

    for user in users.iter_mut().filter(|u| u.id.is_none()) {
        tracing::debug!(id = next, name = %user.name, "assigning missing id");
        user.id = Some(next);
        // the last step may sit at u64::MAX; capacity was checked above
        next = next.saturating_add(1);
    }
    Ok(missing)
}

/// Phone number reduced to digits, with a leading `91` dropped from 12-digit values.
pub fn phone_key(phone: &str) -> String {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    match digits.strip_prefix("91") {
        Some(rest) if digits.len() == 12 => rest.to_string(),
        _ => digits,
    }
}

fn email_key(email: &str) -> String {
    email.trim().to_lowercase()
}

fn matches(user: &User, field: Field, value: &str) -> bool {
    match field {
        Field::Id => value
            .trim()
            .parse::<u64>()
            .is_ok_and(|id| user.id == Some(id)),
        Field::Name => user.name == value,
        Field::Phone => {
            let key = phone_key(value);
            !key.is_empty() && phone_key(&user.phone) == key
        }
        Field::Email => user
            .email
            .as_deref()
            .is_some_and(|email| email_key(email) == email_key(value)),
    }
}

/// Every record whose `field` matches `value`, in collection order.
pub fn filter_by_field<'a>(
    users: &'a [User],
    field: Field,
    value: &'a str,
) -> impl Iterator<Item = &'a User> + 'a {
    let blank = value.trim().is_empty();
    users
        .iter()
        .filter(move |u| !blank && matches(u, field, value))
}

pub fn find_by_field<'a>(users: &'a [User], field: Field, value: &'a str) -> Option<&'a User> {
    filter_by_field(users, field, value).next()
}

pub fn find_by_phone<'a>(users: &'a [User], phone: &'a str) -> Option<&'a User> {
    find_by_field(users, Field::Phone, phone)
}

pub fn find_by_email<'a>(users: &'a [User], email: &'a str) -> Option<&'a User> {
    find_by_field(users, Field::Email, email)
}

pub fn exists_by_phone(users: &[User], phone: &str) -> bool {
    find_by_phone(users, phone).is_some()
}
