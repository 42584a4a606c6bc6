//! Descriptor splitter: separate a part name into a clean name and the
//! supply-document string (standards, design codes, part number, vendor).

use std::sync::LazyLock;

use regex::Regex;

use crate::util::clean_text;

/// Package and dielectric codes never taken as part numbers.
pub const TUP_PART_DENY: [&str; 12] = [
    "SOIC", "SOIC-8", "SOIC8", "DIP", "DIP-8", "DIP-32", "PLCC", "QFN", "SOT", "X7R", "NP0", "C0G",
];

/// Minimum character count of a part-number token.
pub const N_PART_TOKEN_LEN_MIN: usize = 6;

static RE_VENDOR_AT_END: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\s*["“”«»]([^"“”«»]+)["“”«»]\s*$"#).expect("valid vendor regex")
});
static RE_STANDARD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)\b(?:DIN|ISO|EN|IEC|ГОСТ(?:\s*Р)?|ТУ|ОСТ|СТО)(?:\s+(?:EN|ISO|IEC))*\b",
        r"(?:\s*№?\s*\d[\d.\-/]*)*",
    ))
    .expect("valid standard regex")
});
static RE_DECIMAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b[А-ЯЁA-Z]{2,6}\.\d{3,6}\.\d{2,3}(?:\.\d{1,3})?\b")
        .expect("valid decimal designator regex")
});
static RE_PART_CANDIDATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[A-ZА-ЯЁ0-9][A-ZА-ЯЁ0-9\-._]*").expect("valid part candidate regex")
});
static RE_REFDES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:[RCVDT]{1,2}|\p{L}{1,2})\d+$").expect("valid refdes regex")
});

/// Result of [`split_name`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecDescriptor {
    /// Residual name after every extraction.
    pub name_clean: String,
    /// Standards, design codes and the part number, de-duplicated in order.
    pub l_supply_parts: Vec<String>,
    /// Quoted vendor found at the end of the name.
    pub vendor: Option<String>,
}

impl SpecDescriptor {
    /// `part; part; part "Vendor"`.
    pub fn supply_doc(&self) -> String {
        let c_parts = self.l_supply_parts.join("; ");
        match &self.vendor {
            Some(c_vendor) if c_parts.is_empty() => format!("\"{c_vendor}\""),
            Some(c_vendor) => format!("{c_parts} \"{c_vendor}\""),
            None => c_parts,
        }
    }
}

/// Split a name. Each step removes what it found before the next one runs.
pub fn split_name(name: &str) -> SpecDescriptor {
    let mut c_work = clean_text(name);

    let mut vendor = None;
    if let Some(caps) = RE_VENDOR_AT_END.captures(&c_work)
        && let Some(m_all) = caps.get(0)
    {
        let c_vendor = caps.get(1).map(|m| clean_text(m.as_str())).unwrap_or_default();
        if !c_vendor.is_empty() {
            vendor = Some(c_vendor);
        }
        c_work = clean_text(&c_work[..m_all.start()]);
    }

    let mut l_parts: Vec<String> = Vec::new();
    for re in [&*RE_STANDARD, &*RE_DECIMAL] {
        let l_found: Vec<String> = re.find_iter(&c_work).map(|m| clean_text(m.as_str())).collect();
        if !l_found.is_empty() {
            l_parts.extend(l_found);
            c_work = clean_text(&re.replace_all(&c_work, ""));
        }
    }

    if let Some((n_start, n_end)) = find_part_token(&c_work) {
        l_parts.push(c_work[n_start..n_end].to_string());
        c_work = clean_text(&format!("{}{}", &c_work[..n_start], &c_work[n_end..]));
    }

    let mut l_supply_parts: Vec<String> = Vec::with_capacity(l_parts.len());
    for c_part in l_parts {
        if !c_part.is_empty() && !l_supply_parts.contains(&c_part) {
            l_supply_parts.push(c_part);
        }
    }

    SpecDescriptor {
        name_clean: c_work,
        l_supply_parts,
        vendor,
    }
}

/// Byte span of the last part-number token, if any.
fn find_part_token(text: &str) -> Option<(usize, usize)> {
    RE_PART_CANDIDATE
        .find_iter(text)
        .filter_map(|m| {
            let c_token = m.as_str().trim_end_matches(['-', '.', '_']);
            is_part_token(c_token).then(|| (m.start(), m.start() + c_token.len()))
        })
        .last()
}

fn is_part_token(token: &str) -> bool {
    token.chars().count() >= N_PART_TOKEN_LEN_MIN
        && token.chars().any(|c| c.is_ascii_digit())
        && !TUP_PART_DENY.contains(&token.to_uppercase().as_str())
        && !RE_REFDES.is_match(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_standard_and_vendor() {
        let desc = split_name("Винт  ГОСТ 17473-80 \"Крептехника\"");
        assert_eq!(desc.name_clean, "Винт");
        assert_eq!(desc.l_supply_parts, vec!["ГОСТ 17473-80"]);
        assert_eq!(desc.vendor.as_deref(), Some("Крептехника"));
        assert_eq!(desc.supply_doc(), "ГОСТ 17473-80 \"Крептехника\"");
    }

    #[test]
    fn test_split_decimal_and_part_number() {
        let desc = split_name("Плата СЦМЕ.420009.001 микросхема SN74HC245DW SOIC-8");
        assert_eq!(desc.l_supply_parts, vec!["СЦМЕ.420009.001", "SN74HC245DW"]);
        assert_eq!(desc.name_clean, "Плата микросхема SOIC-8");
        assert_eq!(desc.supply_doc(), "СЦМЕ.420009.001; SN74HC245DW");
    }

    #[test]
    fn test_split_multiple_standards_and_russian_r() {
        let desc = split_name("Шайба ГОСТ Р 52857.1-2007 ТУ 6329-003-07518941 ГОСТ Р 52857.1-2007");
        assert_eq!(
            desc.l_supply_parts,
            vec!["ГОСТ Р 52857.1-2007", "ТУ 6329-003-07518941"]
        );
        assert_eq!(desc.name_clean, "Шайба");
    }

    #[test]
    fn test_part_token_filters() {
        // Reference designators, packages and short tokens stay in the name.
        let desc = split_name("Резистор R12345 DIP-32 X7R AB12");
        assert!(desc.l_supply_parts.is_empty());
        assert_eq!(desc.name_clean, "Резистор R12345 DIP-32 X7R AB12");
        // Trailing separators are not part of the token; the last token wins.
        let desc = split_name("Стабилизатор LM317T, аналог LM1117-3.3-");
        assert_eq!(desc.l_supply_parts, vec!["LM1117-3.3"]);
        assert_eq!(desc.name_clean, "Стабилизатор LM317T, аналог -");
    }

    #[test]
    fn test_vendor_only_and_empty() {
        assert_eq!(split_name("Кабель «Belden»").supply_doc(), "\"Belden\"");
        assert_eq!(split_name(""), SpecDescriptor::default());
        // A quote in the middle is not a vendor.
        assert_eq!(split_name("Реле \"TQ2\" 5V").vendor, None);
    }
}
