//! Text helpers shared by the stages.

/// Collapse whitespace runs to one space and trim.
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse a decimal number written with `.` or `,`.
pub fn to_float(num: &str) -> Option<f64> {
    num.trim().replace(',', ".").parse::<f64>().ok()
}

/// One run of a natural-order key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EnumNaturalPart {
    /// Case-folded non-digit run (may be empty).
    Text(String),
    /// Digit run; saturates at `u64::MAX`.
    Number(u64),
}

/// Split text into alternating text/digit runs so that `A2 < A10`.
///
/// The key always starts and ends with a text run, so runs at the same index
/// of two keys are always of the same kind.
pub fn derive_natural_key(text: &str) -> Vec<EnumNaturalPart> {
    let c_text = clean_text(text).to_lowercase();
    let mut l_parts = Vec::new();
    let mut c_text_run = String::new();
    let mut c_digit_run = String::new();

    for chr in c_text.chars() {
        if chr.is_ascii_digit() {
            c_digit_run.push(chr);
            continue;
        }
        if !c_digit_run.is_empty() {
            l_parts.push(EnumNaturalPart::Text(std::mem::take(&mut c_text_run)));
            l_parts.push(EnumNaturalPart::Number(
                c_digit_run.parse::<u64>().unwrap_or(u64::MAX),
            ));
            c_digit_run.clear();
        }
        c_text_run.push(chr);
    }
    if !c_digit_run.is_empty() {
        l_parts.push(EnumNaturalPart::Text(std::mem::take(&mut c_text_run)));
        l_parts.push(EnumNaturalPart::Number(
            c_digit_run.parse::<u64>().unwrap_or(u64::MAX),
        ));
    }
    l_parts.push(EnumNaturalPart::Text(c_text_run));
    l_parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("  Винт \n M3\tx10  "), "Винт M3 x10");
        assert_eq!(clean_text(""), "");
    }

    #[test]
    fn test_to_float_accepts_decimal_comma() {
        assert_eq!(to_float("4,7"), Some(4.7));
        assert_eq!(to_float("10"), Some(10.0));
        assert_eq!(to_float("1,2,3"), None);
    }

    #[test]
    fn test_natural_key_orders_digit_runs_numerically() {
        assert!(derive_natural_key("A2") < derive_natural_key("A10"));
        assert!(derive_natural_key("a10") == derive_natural_key("A10"));
        assert_eq!(
            derive_natural_key("12ab"),
            vec![
                EnumNaturalPart::Text(String::new()),
                EnumNaturalPart::Number(12),
                EnumNaturalPart::Text("ab".into()),
            ]
        );
        let key_huge = derive_natural_key("x99999999999999999999999");
        assert_eq!(key_huge[1], EnumNaturalPart::Number(u64::MAX));
    }
}
