//! Numeric extractors over free-text part names.
//!
//! Every parser degrades to a sentinel instead of failing: resistance and
//! capacitance use [`N_SENTINEL_VALUE`], everything else [`N_SENTINEL_DIM`].
//! Values are recognised only as whole tokens, so `R10K5` or `C0G` never
//! produce a reading.

use std::cmp::Ordering;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::util::{EnumNaturalPart, clean_text, derive_natural_key, to_float};

/// Unknown resistance/capacitance.
pub const N_SENTINEL_VALUE: f64 = 1e18;
/// Unknown power, voltage, thread, length.
pub const N_SENTINEL_DIM: f64 = 1e9;
/// Unknown fastener standard number.
pub const N_SENTINEL_STANDARD_CODE: u64 = 1_000_000_000;

const C_TOKEN_HEAD: &str = r"(?:^|[^\p{L}\p{N}.,])";
const C_TOKEN_TAIL: &str = r"(?:$|[^\p{L}\p{N}])";
const C_NUMBER: &str = r"(\d+(?:[.,]\d+)?)";

static RE_DIN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bDIN\s*([0-9]{2,6})\b").expect("valid DIN regex"));
static RE_ISO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bISO\s*([0-9]{2,6})\b").expect("valid ISO regex"));
static RE_GOST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bГОСТ(?:\s*Р)?\s*([0-9]{2,6})\b").expect("valid GOST regex")
});
static RE_M_SIZE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b[МM]\s*(\d+(?:[.,]\d+)?)\s*(?:[xх×*]\s*(\d+(?:[.,]\d+)?))?")
        .expect("valid thread size regex")
});
static RE_RESISTANCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i){C_TOKEN_HEAD}(?:{C_NUMBER}\s*(ком|мом|ом|kohm|mohm|ohm|kω|mω|ω|k|m)|(\d+)r(\d+)){C_TOKEN_TAIL}"
    ))
    .expect("valid resistance regex")
});
static RE_POWER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i){C_TOKEN_HEAD}{C_NUMBER}\s*(?:вт|w){C_TOKEN_TAIL}"))
        .expect("valid power regex")
});
static RE_CAPACITANCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i){C_TOKEN_HEAD}{C_NUMBER}\s*(пф|нф|мкф|pf|nf|uf|µf|μf){C_TOKEN_TAIL}"
    ))
    .expect("valid capacitance regex")
});
static RE_VOLTAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i){C_TOKEN_HEAD}{C_NUMBER}\s*(?:в|v){C_TOKEN_TAIL}"))
        .expect("valid voltage regex")
});

////////////////////////////////////////////////////////////////////////////////
// #region FastenerKey

/// Sort key for fasteners and Standard-section items.
#[derive(Debug, Clone)]
pub struct SpecFastenerKey {
    /// DIN 1, ISO 2, GOST 3, none 9.
    pub family_rank: u8,
    /// Standard number or [`N_SENTINEL_STANDARD_CODE`].
    pub standard_code: u64,
    /// Lower-cased cleaned name.
    pub alpha: String,
    /// Thread diameter or [`N_SENTINEL_DIM`].
    pub thread: f64,
    /// Length or [`N_SENTINEL_DIM`].
    pub length: f64,
    /// Natural-order fallback.
    pub natural: Vec<EnumNaturalPart>,
}

impl Ord for SpecFastenerKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.family_rank
            .cmp(&other.family_rank)
            .then_with(|| self.standard_code.cmp(&other.standard_code))
            .then_with(|| self.alpha.cmp(&other.alpha))
            .then_with(|| self.thread.total_cmp(&other.thread))
            .then_with(|| self.length.total_cmp(&other.length))
            .then_with(|| self.natural.cmp(&other.natural))
    }
}

impl PartialOrd for SpecFastenerKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for SpecFastenerKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SpecFastenerKey {}

/// Build the fastener key: first standard family found in DIN, ISO, GOST
/// priority, then thread/length from `M<d>[x<l>]`.
pub fn derive_fastener_key(name: &str) -> SpecFastenerKey {
    let c_name = clean_text(name);

    let (family_rank, standard_code) = [(1u8, &*RE_DIN), (2, &*RE_ISO), (3, &*RE_GOST)]
        .into_iter()
        .find_map(|(n_rank, re)| {
            re.captures(&c_name)
                .and_then(|caps| caps.get(1))
                .and_then(|m| m.as_str().parse::<u64>().ok())
                .map(|n_code| (n_rank, n_code))
        })
        .unwrap_or((9, N_SENTINEL_STANDARD_CODE));

    let (thread, length) = match RE_M_SIZE.captures(&c_name) {
        Some(caps) => (
            parse_group(&caps, 1).unwrap_or(N_SENTINEL_DIM),
            parse_group(&caps, 2).unwrap_or(N_SENTINEL_DIM),
        ),
        None => (N_SENTINEL_DIM, N_SENTINEL_DIM),
    };

    SpecFastenerKey {
        family_rank,
        standard_code,
        alpha: c_name.to_lowercase(),
        thread,
        length,
        natural: derive_natural_key(&c_name),
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ElectricalValues

/// Resistance in Ohms, or [`N_SENTINEL_VALUE`].
///
/// Accepts `Ом/кОм/МОм`, `Ohm/kOhm/MOhm`, `Ω`, `k`/`m` suffixes and the
/// `4R7` shorthand.
pub fn parse_resistance_ohms(name: &str) -> f64 {
    let c_name = clean_text(name).to_lowercase();
    let Some(caps) = RE_RESISTANCE.captures(&c_name) else {
        return N_SENTINEL_VALUE;
    };

    if let (Some(m_int), Some(m_frac)) = (caps.get(3), caps.get(4)) {
        return to_float(&format!("{}.{}", m_int.as_str(), m_frac.as_str()))
            .unwrap_or(N_SENTINEL_VALUE);
    }

    let Some(n_val) = parse_group(&caps, 1) else {
        return N_SENTINEL_VALUE;
    };
    let n_mult = match caps.get(2).map(|m| m.as_str()) {
        Some("ом" | "ohm" | "ω") => 1.0,
        Some("ком" | "kohm" | "kω" | "k") => 1e3,
        Some("мом" | "mohm" | "mω" | "m") => 1e6,
        _ => return N_SENTINEL_VALUE,
    };
    n_val * n_mult
}

/// Power rating in Watts, or [`N_SENTINEL_DIM`].
pub fn parse_power_watts(name: &str) -> f64 {
    let c_name = clean_text(name).to_lowercase();
    RE_POWER
        .captures(&c_name)
        .and_then(|caps| parse_group(&caps, 1))
        .unwrap_or(N_SENTINEL_DIM)
}

/// Capacitance in picofarads, or [`N_SENTINEL_VALUE`].
pub fn parse_capacitance_pf(name: &str) -> f64 {
    let c_name = clean_text(name).to_lowercase();
    let Some(caps) = RE_CAPACITANCE.captures(&c_name) else {
        return N_SENTINEL_VALUE;
    };
    let Some(n_val) = parse_group(&caps, 1) else {
        return N_SENTINEL_VALUE;
    };
    match caps.get(2).map(|m| m.as_str()) {
        Some("пф" | "pf") => n_val,
        Some("нф" | "nf") => n_val * 1e3,
        Some("мкф" | "uf" | "µf" | "μf") => n_val * 1e6,
        _ => N_SENTINEL_VALUE,
    }
}

/// Voltage rating in Volts, or [`N_SENTINEL_DIM`].
pub fn parse_voltage_volts(name: &str) -> f64 {
    let c_name = clean_text(name).to_lowercase();
    RE_VOLTAGE
        .captures(&c_name)
        .and_then(|caps| parse_group(&caps, 1))
        .unwrap_or(N_SENTINEL_DIM)
}

fn parse_group(caps: &Captures<'_>, n_group: usize) -> Option<f64> {
    caps.get(n_group).and_then(|m| to_float(m.as_str()))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fastener_key_family_and_dimensions() {
        let key_din = derive_fastener_key("Винт DIN 912 M3x10");
        assert_eq!(key_din.family_rank, 1);
        assert_eq!(key_din.standard_code, 912);
        assert_eq!(key_din.thread, 3.0);
        assert_eq!(key_din.length, 10.0);

        let key_gost = derive_fastener_key("Шайба 4 ГОСТ Р 11371-78");
        assert_eq!(key_gost.family_rank, 3);
        assert_eq!(key_gost.standard_code, 11371);
        assert_eq!(key_gost.thread, N_SENTINEL_DIM);

        let key_none = derive_fastener_key("Гайка М4");
        assert_eq!(key_none.family_rank, 9);
        assert_eq!(key_none.standard_code, N_SENTINEL_STANDARD_CODE);
        assert_eq!(key_none.thread, 4.0);
        assert_eq!(key_none.length, N_SENTINEL_DIM);
    }

    #[test]
    fn test_fastener_key_prefers_din_over_iso() {
        assert!(derive_fastener_key("DIN 912 M3x10") < derive_fastener_key("ISO 4762 M3x10"));
        let key_both = derive_fastener_key("ISO 4762 (DIN 912) M2,5×8");
        assert_eq!(key_both.family_rank, 1);
        assert_eq!(key_both.thread, 2.5);
        assert_eq!(key_both.length, 8.0);
    }

    #[test]
    fn test_parse_resistance_units() {
        assert_eq!(parse_resistance_ohms("Резистор 4,7 кОм 0,25 Вт"), 4700.0);
        assert_eq!(parse_resistance_ohms("Resistor 4.7 kOhm"), 4700.0);
        assert_eq!(parse_resistance_ohms("Р1-12 1 МОм"), 1e6);
        assert_eq!(parse_resistance_ohms("Резистор 100Ом"), 100.0);
        assert_eq!(parse_resistance_ohms("RC0603 10k 1%"), 1e4);
        assert_eq!(parse_resistance_ohms("2.2M 0.1W"), 2.2e6);
        assert_eq!(parse_resistance_ohms("Resistor 4R7"), 4.7);
        assert_eq!(parse_resistance_ohms("330 Ω"), 330.0);
        assert_eq!(parse_resistance_ohms("Перемычка"), N_SENTINEL_VALUE);
    }

    #[test]
    fn test_parse_resistance_ignores_glued_tokens() {
        assert_eq!(parse_resistance_ohms("MAX1232k"), N_SENTINEL_VALUE);
        assert_eq!(parse_resistance_ohms("R10K5"), N_SENTINEL_VALUE);
    }

    #[test]
    fn test_resistance_order_with_unknown_last() {
        let n_small = parse_resistance_ohms("4.7 kOhm");
        let n_big = parse_resistance_ohms("10 kOhm");
        let n_none = parse_resistance_ohms("Resistor jumper");
        assert!(n_small < n_big);
        assert!(n_big < n_none);
    }

    #[test]
    fn test_parse_power_and_voltage() {
        assert_eq!(parse_power_watts("Резистор С2-33Н-0,25 Вт-10 кОм"), 0.25);
        assert_eq!(parse_power_watts("0.125W"), 0.125);
        assert_eq!(parse_power_watts("Резистор 1 кОм"), N_SENTINEL_DIM);
        assert_eq!(parse_voltage_volts("Конденсатор 0,1 мкФ 50 В"), 50.0);
        assert_eq!(parse_voltage_volts("100nF 16V X7R"), 16.0);
        assert_eq!(parse_voltage_volts("100nF"), N_SENTINEL_DIM);
    }

    #[test]
    fn test_parse_capacitance_units() {
        assert_eq!(parse_capacitance_pf("Конденсатор 22 пФ"), 22.0);
        assert_eq!(parse_capacitance_pf("100nF 16V"), 1e5);
        assert_eq!(parse_capacitance_pf("Конденсатор 0,1 мкФ"), 1e5);
        assert_eq!(parse_capacitance_pf("10µF 25V"), 1e7);
        assert_eq!(parse_capacitance_pf("10 uF"), 1e7);
        assert_eq!(parse_capacitance_pf("Конденсатор C0G"), N_SENTINEL_VALUE);
    }
}
