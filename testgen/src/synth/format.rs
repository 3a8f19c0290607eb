//! Realistic fake values for string formats.

use rand::Rng;

/// Formats whose syntax a plain run of letters cannot satisfy, so a
/// letters-only string is a clean single-constraint violation.
pub(crate) const CHECKABLE_FORMATS: &[&str] = &[
    "email",
    "uuid",
    "date",
    "date-time",
    "time",
    "uri",
    "url",
    "ipv4",
    "ipv6",
];

/// A realistic value for `format`, or `None` for formats we don't fake.
pub(crate) fn fake_for_format(format: &str, rng: &mut impl Rng) -> Option<String> {
    let value = match format {
        "email" => format!("user{}@example.com", rng.gen_range(1000..10000)),
        "uuid" => fake_uuid(rng),
        "date" => fake_date(rng),
        "date-time" => format!(
            "{}T{:02}:{:02}:00Z",
            fake_date(rng),
            rng.gen_range(0..24),
            rng.gen_range(0..60)
        ),
        "time" => format!(
            "{:02}:{:02}:{:02}",
            rng.gen_range(0..24),
            rng.gen_range(0..60),
            rng.gen_range(0..60)
        ),
        "uri" | "url" => format!("https://example.com/resource/{}", rng.gen_range(1..1000)),
        "hostname" => format!("api{}.example.com", rng.gen_range(1..100)),
        "ipv4" => format!("192.168.{}.{}", rng.gen_range(0..256), rng.gen_range(1..255)),
        "ipv6" => format!("2001:db8::{:x}", rng.gen_range(1..0xffff)),
        "password" => format!("P@ssw0rd{}!", rng.gen_range(10..100)),
        "byte" => "c2FtcGxlLWRhdGE=".to_string(),
        "phone" => format!("+1555{:07}", rng.gen_range(0..10_000_000)),
        _ => return None,
    };
    Some(value)
}

/// Guess a format from a property name when the schema declares none.
pub(crate) fn format_hint_for_name(name: &str) -> Option<&'static str> {
    let lower = name.to_lowercase();
    if lower.contains("email") {
        Some("email")
    } else if lower.contains("phone") {
        Some("phone")
    } else if lower.ends_with("url") || lower.ends_with("uri") {
        Some("url")
    } else {
        None
    }
}

fn fake_date(rng: &mut impl Rng) -> String {
    format!(
        "{}-{:02}-{:02}",
        rng.gen_range(2020..2030),
        rng.gen_range(1..=12),
        rng.gen_range(1..=28)
    )
}

fn fake_uuid(rng: &mut impl Rng) -> String {
    let mut bytes: [u8; 16] = rng.gen();
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;
    let hex: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}

/// Resize `value` to exactly `len` characters, keeping an email's domain intact.
pub(crate) fn fit_length(value: &str, len: usize, format: Option<&str>) -> String {
    if format == Some("email") {
        if let Some((local, domain)) = value.split_once('@') {
            if len > domain.len() + 1 {
                let local_len = len - domain.len() - 1;
                return format!("{}@{}", resize(local, local_len), domain);
            }
        }
    }
    resize(value, len)
}

fn resize(value: &str, len: usize) -> String {
    let mut out: String = value.chars().take(len).collect();
    while out.chars().count() < len {
        out.push('a');
    }
    out
}
