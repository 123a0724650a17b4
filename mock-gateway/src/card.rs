//! Card number checks the sandbox applies.

/// Luhn check over a 12 to 19 digit number. Any non-digit fails.
pub fn is_valid_number(number: &str) -> bool {
    if !(12..=19).contains(&number.len()) || !number.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    let sum: u32 = number
        .bytes()
        .rev()
        .map(|b| u32::from(b - b'0'))
        .enumerate()
        .map(|(i, d)| match (i % 2, d * 2) {
            (0, _) => d,
            (_, doubled) if doubled > 9 => doubled - 9,
            (_, doubled) => doubled,
        })
        .sum();
    sum % 10 == 0
}

/// Replace every character but the last four with `X`.
pub fn mask(number: &str) -> String {
    let len = number.chars().count();
    let keep = len.min(4);
    let tail: String = number.chars().skip(len - keep).collect();
    "X".repeat(len - keep) + &tail
}

/// `MM/YYYY` with a month of 1 to 12.
pub fn is_valid_expiry(expiry: &str) -> bool {
    let Some((month, year)) = expiry.split_once('/') else {
        return false;
    };
    let month_ok = matches!(month.len(), 1 | 2) && month.parse::<u8>().is_ok_and(|m| (1..=12).contains(&m));
    month_ok && year.len() == 4 && year.bytes().all(|b| b.is_ascii_digit())
}
