pub const PRICE_UNAVAILABLE: &str = "Price unavailable";

/// Abbreviate a count such as `"12.345"` or `"1,500,000"` to `12.3K` / `1.5M`.
///
/// Non-digits are ignored; an empty or oversized value counts as zero.
pub fn format_count(raw: &str) -> String {
    let n = raw
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect::<String>()
        .parse::<u64>()
        .unwrap_or(0);

    if n >= 1_000_000 {
        format!("{}M", one_decimal(n, 1_000_000))
    } else if n >= 1_000 {
        format!("{}K", one_decimal(n, 1_000))
    } else {
        n.to_string()
    }
}

// Rounds the f64 quotient half-up on its exact binary value, so 1150 / 1000
// (stored as 1.1499...) gives 1.1 and 1250 / 1000 (exactly 1.25) gives 1.3.
// `{:.1}` alone would round that tie to even.
fn one_decimal(n: u64, divisor: u64) -> String {
    let quotient = n as f64 / divisor as f64;
    // 60 places is enough to print any quotient in range without rounding.
    let exact = format!("{:.60}", quotient);
    let (whole, frac) = exact.split_once('.').unwrap_or((exact.as_str(), ""));
    let digit = |i: usize| {
        frac.as_bytes()
            .get(i)
            .map_or(0, |b| u64::from(b.wrapping_sub(b'0')))
    };

    let tenths = whole.parse::<u64>().unwrap_or(0) * 10 + digit(0) + u64::from(digit(1) >= 5);
    format!("{}.{}", tenths / 10, tenths % 10)
}

pub fn format_price(price: Option<&str>, symbol: &str) -> String {
    match price {
        Some(p) => format!("{} {}", symbol, p),
        None => PRICE_UNAVAILABLE.to_string(),
    }
}
