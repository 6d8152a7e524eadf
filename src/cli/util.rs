use chrono::NaiveDate;
use rust_decimal::Decimal;

pub fn fmt_money(d: &Decimal) -> String {
    format!("{:.2}", d.round_dp(2))
}

pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

pub fn iso(d: &NaiveDate) -> String {
    d.format("%Y-%m-%d").to_string()
}

/// Cycle an optional index over `len` items; `None` sits before the first.
pub fn cycle_optional(cur: Option<usize>, len: usize, delta: i32) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let slots = len as i32 + 1;
    let pos = cur.map(|i| i as i32 + 1).unwrap_or(0);
    let next = (pos + delta).rem_euclid(slots);
    if next == 0 { None } else { Some(next as usize - 1) }
}

pub fn wrap_index(cur: Option<usize>, len: usize, delta: isize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let cur = cur.unwrap_or(0) as isize;
    Some((cur + delta).rem_euclid(len as isize) as usize)
}
