//! ISO 3779 VIN check-digit validation.
//!
//! Position 9 of a VIN is a check digit computed from the other sixteen
//! characters via a weighted mod-11 sum. The scheme detects transcription
//! errors; it is not collision-free, so a valid check digit is necessary
//! but not sufficient evidence of a genuine VIN.

/// Per-position weights. Position 9 (index 8) is the check digit itself
/// and contributes nothing to its own sum.
const WEIGHTS: [u32; 17] = [8, 7, 6, 5, 4, 3, 2, 10, 0, 9, 8, 7, 6, 5, 4, 3, 2];

/// Transliteration table: digits map to themselves, letters cycle 1–9
/// with I, O, and Q excluded from the VIN alphabet.
fn transliterate(c: char) -> Option<u32> {
    match c {
        '0'..='9' => Some(c as u32 - '0' as u32),
        'A' | 'J' => Some(1),
        'B' | 'K' | 'S' => Some(2),
        'C' | 'L' | 'T' => Some(3),
        'D' | 'M' | 'U' => Some(4),
        'E' | 'N' | 'V' => Some(5),
        'F' | 'W' => Some(6),
        'G' | 'P' | 'X' => Some(7),
        'H' | 'Y' => Some(8),
        'R' | 'Z' => Some(9),
        _ => None,
    }
}

/// Value the check-digit character itself encodes: 1–9, or 10 for 'X'.
fn check_digit_value(c: char) -> Option<u32> {
    match c {
        '1'..='9' => Some(c as u32 - '0' as u32),
        'X' => Some(10),
        _ => None,
    }
}

/// Validate a VIN candidate's check digit.
///
/// Returns `false` for anything malformed: too short to hold a check
/// digit, characters outside the VIN alphabet, a check-digit position
/// outside `1-9`/`X`, or a weighted sum that doesn't match.
pub fn check_digit_valid(vin: &str) -> bool {
    let chars: Vec<char> = vin.chars().collect();
    if chars.len() <= 8 {
        return false;
    }

    let Some(expected) = check_digit_value(chars[8]) else {
        return false;
    };

    let mut sum = 0u32;
    for (&c, &weight) in chars.iter().zip(WEIGHTS.iter()) {
        match transliterate(c) {
            Some(value) => sum += value * weight,
            None => return false,
        }
    }

    sum % 11 == expected
}
