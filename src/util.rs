//! Helpers shared by the .lp reader and writer
use std::collections::{HashMap, HashSet};

use crate::error::NameRule;

/// Significant digits kept when writing numbers
pub const SIGNIFICANT_DIGITS: usize = 12;

/// Characters that cannot appear in a variable name
pub const RESERVED_CHARACTERS: [char; 11] = ['*', '+', '-', '\\', ']', '^', ':', '[', '<', '=', '>'];

/// Format a number like C's `%.12g`: at most 12 significant digits, no trailing zeros,
/// scientific notation for very small or very large magnitudes.
///
/// ```
/// use lp_model::util::format_number;
///
/// assert_eq!(format_number(998.), "998");
/// assert_eq!(format_number(-3.5), "-3.5");
/// assert_eq!(format_number(1. / 3.), "0.333333333333");
/// assert_eq!(format_number(1e20), "1e+20");
/// assert_eq!(format_number(0.00001), "1e-05");
/// ```
pub fn format_number(value: f64) -> String {
    if value == 0. {
        return "0".to_string();
    }
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0. { "inf" } else { "-inf" }.to_string();
    }
    let precision = SIGNIFICANT_DIGITS - 1;
    let scientific = format!("{:.*e}", precision, value);
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some((mantissa, exponent)) => match exponent.parse::<i32>() {
            Ok(exponent) => (mantissa, exponent),
            Err(_) => return scientific,
        },
        None => return scientific,
    };
    if (-4..SIGNIFICANT_DIGITS as i32).contains(&exponent) {
        let decimals = (precision as i32 - exponent) as usize;
        trim_fraction(&format!("{:.*}", decimals, value)).to_string()
    } else {
        format!(
            "{}e{}{:02}",
            trim_fraction(mantissa),
            if exponent < 0 { '-' } else { '+' },
            exponent.abs()
        )
    }
}

fn trim_fraction(number: &str) -> &str {
    if number.contains('.') {
        number.trim_end_matches('0').trim_end_matches('.')
    } else {
        number
    }
}

/// Check that `name` can be used as a variable name in an .lp file.
///
/// ```
/// use lp_model::error::NameRule;
/// use lp_model::util::check_variable_name;
///
/// assert_eq!(check_variable_name("x2(lkj290s9_er0)y"), Ok(()));
/// assert_eq!(check_variable_name("5x"), Err(NameRule::LeadingDigitOrPeriod));
/// assert_eq!(check_variable_name("x y"), Err(NameRule::Whitespace));
/// assert_eq!(check_variable_name("x^2"), Err(NameRule::ForbiddenCharacter('^')));
/// ```
pub fn check_variable_name(name: &str) -> Result<(), NameRule> {
    if name.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
        return Err(NameRule::LeadingDigitOrPeriod);
    }
    if name.contains(char::is_whitespace) {
        return Err(NameRule::Whitespace);
    }
    match name
        .chars()
        .find(|&c| !('!'..='~').contains(&c) || RESERVED_CHARACTERS.contains(&c))
    {
        Some(c) => Err(NameRule::ForbiddenCharacter(c)),
        None => Ok(()),
    }
}

/// Generates numbered names that collide neither with each other nor with reserved names
#[derive(Debug, Default)]
pub struct UniqueNameGenerator {
    taken: HashSet<String>,
    counters: HashMap<String, usize>,
}

impl UniqueNameGenerator {
    /// Mark a name as used. Returns false if it was already used.
    pub fn reserve(&mut self, name: &str) -> bool {
        self.taken.insert(name.to_string())
    }

    /// Return `stem` followed by the smallest counter value giving an unused name.
    ///
    /// ```
    /// use lp_model::util::UniqueNameGenerator;
    ///
    /// let mut names = UniqueNameGenerator::default();
    /// names.reserve("c2");
    /// assert_eq!(names.add_numbered("c"), "c1");
    /// assert_eq!(names.add_numbered("c"), "c3");
    /// assert_eq!(names.add_numbered("r"), "r1");
    /// ```
    pub fn add_numbered(&mut self, stem: &str) -> String {
        let counter = self.counters.entry(stem.to_string()).or_insert(0);
        loop {
            *counter += 1;
            let name = format!("{}{}", stem, counter);
            if self.taken.insert(name.clone()) {
                return name;
            }
        }
    }
}
