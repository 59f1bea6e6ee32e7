//! Semantic validators for candidate matches that a regex alone cannot rule out.
//!
//! Every validator here is a pure, total function over a candidate string:
//! no I/O, no shared state, no panics on malformed input.

/// Luhn checksum used for credit-card-shaped numbers.
pub fn luhn_check(candidate: &str) -> bool {
    let digits: Vec<u32> = candidate.chars().filter_map(|c| c.to_digit(10)).collect();
    if digits.len() < 13 || digits.len() > 19 {
        return false;
    }
    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                d
            }
        })
        .sum();
    sum % 10 == 0
}

/// US Social Security Number validation: area/group/serial rules.
/// Rejects area `000`, `666`, and `9xx`; group `00`; serial `0000`.
pub fn government_id_us_validate(candidate: &str) -> bool {
    let digits: String = candidate.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() != 9 {
        return false;
    }
    let area: u32 = digits[0..3].parse().unwrap_or(0);
    let group = &digits[3..5];
    let serial = &digits[5..9];

    if area == 0 || area == 666 || area >= 900 {
        return false;
    }
    if group == "00" {
        return false;
    }
    if serial == "0000" {
        return false;
    }
    true
}

/// India Aadhaar-shaped 12-digit identifier: rejects all-identical-digit runs
/// and the conventional leading-zero/one exclusion.
pub fn government_id_in_validate(candidate: &str) -> bool {
    let digits: String = candidate.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() != 12 {
        return false;
    }
    if digits.starts_with('0') || digits.starts_with('1') {
        return false;
    }
    !all_same_digit(&digits)
}

/// E.164 phone candidate: length bound plus rejection of uniform-digit and
/// trivially monotonic sequences that regex cannot distinguish from real numbers.
pub fn e164_validate(candidate: &str) -> bool {
    let digits: String = candidate.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() < 8 || digits.len() > 15 {
        return false;
    }
    if all_same_digit(&digits) {
        return false;
    }
    if is_monotonic_sequence(&digits) {
        return false;
    }
    true
}

/// IPv4 candidate: four octets, each in `[0, 255]`.
pub fn ipv4_validate(candidate: &str) -> bool {
    let parts: Vec<&str> = candidate.split('.').collect();
    if parts.len() != 4 {
        return false;
    }
    parts.iter().all(|p| {
        if p.is_empty() || p.len() > 3 || (p.len() > 1 && p.starts_with('0')) {
            return false;
        }
        p.parse::<u16>().map(|v| v <= 255).unwrap_or(false)
    })
}

/// A generic API-key-shaped token has no further semantic validation beyond
/// its regex — any printable run of the right shape is accepted.
pub fn api_key_validate(_candidate: &str) -> bool {
    true
}

/// Email regex matches are self-validating via structure; no extra check needed.
pub fn email_validate(_candidate: &str) -> bool {
    true
}

fn all_same_digit(digits: &str) -> bool {
    let mut chars = digits.chars();
    match chars.next() {
        Some(first) => chars.all(|c| c == first),
        None => true,
    }
}

fn is_monotonic_sequence(digits: &str) -> bool {
    let vals: Vec<i32> = digits.chars().filter_map(|c| c.to_digit(10)).map(|d| d as i32).collect();
    if vals.len() < 2 {
        return false;
    }
    let ascending = vals.windows(2).all(|w| w[1] - w[0] == 1);
    let descending = vals.windows(2).all(|w| w[0] - w[1] == 1);
    ascending || descending
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn luhn_rejects_known_invalid_and_accepts_known_valid() {
        assert!(luhn_check("4532015112830366")); // known-valid test Visa number
        assert!(!luhn_check("4532015112830367")); // one digit off breaks the checksum
    }

    #[test]
    fn government_id_us_rejects_reserved_areas() {
        assert!(!government_id_us_validate("000-12-3456"));
        assert!(!government_id_us_validate("666-12-3456"));
        assert!(!government_id_us_validate("900-12-3456"));
        assert!(!government_id_us_validate("123-00-4567"));
        assert!(!government_id_us_validate("123-45-0000"));
        assert!(government_id_us_validate("123-45-6789"));
    }

    #[test]
    fn e164_rejects_uniform_and_monotonic_digits() {
        assert!(!e164_validate("+11111111111"));
        assert!(!e164_validate("+12345678901"));
        assert!(e164_validate("+14155552671"));
    }

    #[test]
    fn ipv4_rejects_out_of_range_octets() {
        assert!(ipv4_validate("192.168.1.1"));
        assert!(!ipv4_validate("256.1.1.1"));
        assert!(!ipv4_validate("1.2.3"));
    }

    #[test]
    fn card_length_bounds_enforced_by_luhn() {
        assert!(!luhn_check("123456789012")); // 12 digits, below the 13-19 window
    }
}
