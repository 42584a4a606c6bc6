//! Domain sort key and the stable row sort built on it.

use std::cmp::Ordering;

use bomkit_io_xlsx::{SpecSheetGrid, XlsxIoError};

use crate::conf::{C_COL_CATEGORY, C_COL_NAME, C_COL_SECTION};
use crate::spec::{EnumCategory, EnumSection};
use crate::unit::{
    SpecFastenerKey, derive_fastener_key, parse_capacitance_pf, parse_power_watts,
    parse_resistance_ohms, parse_voltage_volts,
};
use crate::util::{EnumNaturalPart, clean_text, derive_natural_key};

/// Tier-specific tail of a [`SpecSortKey`].
#[derive(Debug, Clone)]
pub enum EnumSortDetail {
    /// Tier 0: fasteners and Standard-section items.
    Fastener(SpecFastenerKey),
    /// Tier 1: resistance, power, natural name.
    Resistor(f64, f64, Vec<EnumNaturalPart>),
    /// Tier 2: capacitance, voltage, natural name.
    Capacitor(f64, f64, Vec<EnumNaturalPart>),
    /// Tier 9: natural name only.
    Other(Vec<EnumNaturalPart>),
}

impl EnumSortDetail {
    /// Tier number of this detail.
    pub fn tier(&self) -> u8 {
        match self {
            Self::Fastener(_) => 0,
            Self::Resistor(..) => 1,
            Self::Capacitor(..) => 2,
            Self::Other(_) => 9,
        }
    }
}

impl Ord for EnumSortDetail {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Fastener(a), Self::Fastener(b)) => a.cmp(b),
            (Self::Resistor(a_val, a_dim, a_nat), Self::Resistor(b_val, b_dim, b_nat))
            | (Self::Capacitor(a_val, a_dim, a_nat), Self::Capacitor(b_val, b_dim, b_nat)) => a_val
                .total_cmp(b_val)
                .then_with(|| a_dim.total_cmp(b_dim))
                .then_with(|| a_nat.cmp(b_nat)),
            (Self::Other(a), Self::Other(b)) => a.cmp(b),
            _ => self.tier().cmp(&other.tier()),
        }
    }
}

impl PartialOrd for EnumSortDetail {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for EnumSortDetail {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for EnumSortDetail {}

/// Total order over rows: category label, then tier, then tier detail.
///
/// Categories compare alphabetically on the lower-cased, whitespace-collapsed
/// label, so unknown labels interleave with known ones.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SpecSortKey {
    /// Lower-cased category label.
    pub category_key: String,
    /// 0, 1, 2 or 9.
    pub tier: u8,
    /// Tier-specific detail.
    pub detail: EnumSortDetail,
}

/// Build the sort key of one row from its category, section and name cells.
pub fn derive_sort_key(category: &str, section: &str, name: &str) -> SpecSortKey {
    let c_category = clean_text(category);
    let category_parsed = EnumCategory::from_label(&c_category);
    let c_name = clean_text(name);

    let detail = match category_parsed {
        _ if category_parsed == Some(EnumCategory::Fasteners)
            || EnumSection::from_label(section) == Some(EnumSection::Standard) =>
        {
            EnumSortDetail::Fastener(derive_fastener_key(&c_name))
        }
        Some(EnumCategory::Resistors) => EnumSortDetail::Resistor(
            parse_resistance_ohms(&c_name),
            parse_power_watts(&c_name),
            derive_natural_key(&c_name),
        ),
        Some(EnumCategory::Capacitors) => EnumSortDetail::Capacitor(
            parse_capacitance_pf(&c_name),
            parse_voltage_volts(&c_name),
            derive_natural_key(&c_name),
        ),
        _ => EnumSortDetail::Other(derive_natural_key(&c_name)),
    };

    SpecSortKey {
        category_key: c_category.to_lowercase(),
        tier: detail.tier(),
        detail,
    }
}

/// Stable-sort body rows by [`derive_sort_key`], dropping fully blank rows.
///
/// Returns the number of dropped rows. Requires `Category` and `Name`;
/// `Section` is optional.
pub fn sort_rows_by_key(grid: &mut SpecSheetGrid) -> Result<usize, XlsxIoError> {
    let l_idx = grid.require_columns(&[C_COL_CATEGORY, C_COL_NAME])?;
    let (n_idx_cat, n_idx_name) = (l_idx[0], l_idx[1]);
    let n_idx_section = grid.column_index(C_COL_SECTION);

    let n_rows_before = grid.height();
    grid.rows
        .retain(|row| !row.iter().all(bomkit_io_xlsx::EnumCellValue::is_blank));
    let n_dropped = n_rows_before - grid.height();

    grid.rows.sort_by_cached_key(|row| {
        let c_text_at = |n_idx: usize| row.get(n_idx).map(|v| v.to_text()).unwrap_or_default();
        derive_sort_key(
            &c_text_at(n_idx_cat),
            &n_idx_section.map(c_text_at).unwrap_or_default(),
            &c_text_at(n_idx_name),
        )
    });
    Ok(n_dropped)
}
