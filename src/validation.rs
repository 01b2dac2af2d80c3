//! Shape checks for user-supplied credentials.
//!
//! Each check receives `None` when the JSON field was absent or not a string.

use lazy_static::lazy_static;
use regex::Regex;

const USERNAME_MIN_CHARS: usize = 6;
const USERNAME_MAX_CHARS: usize = 15;
const EMAIL_ACCOUNT_MAX_CHARS: usize = 64;
const EMAIL_ADDRESS_MAX_CHARS: usize = 255;
const PASSWORD_MIN_CHARS: usize = 8;
const PASSWORD_MAX_CHARS: usize = 128;

lazy_static! {
    // Whole-string match: every character must be a letter, digit, underscore or dot.
    static ref USERNAME_RE: Regex = Regex::new(r"^[A-Za-z0-9_.]+$").unwrap();
    static ref EMAIL_RE: Regex = Regex::new(
        r"^[-!#$%&'*+/0-9=?A-Z^_a-z`{|}~](\.?[-!#$%&'*+/0-9=?A-Z^_a-z`{|}~])*@[a-zA-Z0-9](-*\.?[a-zA-Z0-9])*\.[a-zA-Z](-?[a-zA-Z0-9])+$"
    )
    .unwrap();
}

pub fn sanitize_username(username: Option<&str>) -> bool {
    let Some(username) = username else {
        return false;
    };
    let len = username.chars().count();
    if !(USERNAME_MIN_CHARS..=USERNAME_MAX_CHARS).contains(&len) {
        return false;
    }
    USERNAME_RE.is_match(username)
}

pub fn sanitize_email(email: Option<&str>) -> bool {
    let Some(email) = email else {
        return false;
    };
    let Some((account, address)) = email.split_once('@') else {
        return false;
    };
    if address.contains('@') {
        return false;
    }
    if account.chars().count() > EMAIL_ACCOUNT_MAX_CHARS
        || address.chars().count() > EMAIL_ADDRESS_MAX_CHARS
    {
        return false;
    }
    EMAIL_RE.is_match(email)
}

pub fn sanitize_password(password: Option<&str>) -> bool {
    password.is_some_and(|p| {
        (PASSWORD_MIN_CHARS..=PASSWORD_MAX_CHARS).contains(&p.chars().count())
    })
}
