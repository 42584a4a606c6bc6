//! Ordered regex classifier: first matching rule wins.

use std::sync::LazyLock;

use regex::Regex;

use crate::spec::EnumCategory;
use crate::util::clean_text;

/// Category fallback when no rule matches.
pub const ENUM_CATEGORY_DEFAULT: EnumCategory = EnumCategory::Other;

/// Classification table in evaluation order.
///
/// Semiconductors run before structural parts so that words such as
/// "панель DIP-32" or "корпус SOIC" never claim a chip. Fastener rules carry
/// no standard numbers, which would otherwise capture every GOST/DIN item.
/// Truncated stems end in `\w*` so inflected forms still match.
pub const TUP_CATEGORY_RULES: [(EnumCategory, &str); 10] = [
    (
        EnumCategory::Fasteners,
        r"(?i)\b(винт|болт|гайка|шайба|гровер|саморез|шуруп|закл[её]пк\w*|шпильк\w*|штифт|шплинт|стопорн\w*)\b",
    ),
    (
        EnumCategory::PowerSupplies,
        r"(?i)\b(блок\s*питан\w*|источник\s*питан\w*|power\s*supply|psu|ac[-\s]*dc|dc[-\s]*dc)\b",
    ),
    (
        EnumCategory::Fuses,
        r"(?i)\b(предохранител\w*|fuse)\b|\bFU\d+\b",
    ),
    (
        EnumCategory::Connectors,
        concat!(
            r"(?i)\b(раз[ъе]м|вилка|розетка|клемм\w*|колодк\w*|панельк\w*|терминал\w*|разъём|din\s*41612|d[-\s]?sub|db[-\s]?\d+|header|socket)\b",
            r"|\b(реле|контактор|переключател\w*)\b",
        ),
    ),
    (
        EnumCategory::Semiconductors,
        concat!(
            r"(?i)\b(",
            r"линейн\w*\s+регулятор|",
            r"регулятор\s+напряжени\w*\s+линейн\w*|",
            r"модул\w*\s+памят\w*|",
            r"мост\s+диодн\w*|",
            r"оптрон\w*|",
            r"позистор\w*|",
            r"стабилитрон\w*|",
            r"термистор\w*|",
            r"усилител\w*\s+звуков\w*\s+мощност\w*|",
            r"усилител\w*\s+низк\w*\s+частот\w*|",
            r"усилител\w*\s+операцион\w*|",
            r"операцион\w*\s+усилител\w*|",
            r"регистр|резонатор|инвертер|микросхем\w*|диод|транзистор|буфер|",
            r"контроллер|оптопар\w*|триггер|счетчик|микроконтроллер|усилител\w*",
            r")\b",
            r"|\b(IC|DD|DA|VT|D)\d+\b",
            r"|PIC\d+|SN74|AM29|ispLSI|MC74|uPD|UPD",
        ),
    ),
    (
        EnumCategory::Structural,
        concat!(
            r"(?i)\b(шкаф|держатель|шасси|кронштейн|стойк\w*|стойка\s*резьбов\w*|втулк\w*|ручк\w*|корпус|кожух|панел\w*|крышк\w*|рам\w*|направляющ\w*|салазк\w*|планк\w*)\b",
            r"|Schroff|Assmann",
        ),
    ),
    (
        EnumCategory::Magnetics,
        r"(?i)\b(трансформатор|дроссел\w*|катушк\w*|индуктивн\w*|inductor|choke)\b|\bTR\d+\b",
    ),
    (
        EnumCategory::Capacitors,
        r"(?i)\b(конденсатор|capacitor)\b|\bC\d+\b",
    ),
    (
        EnumCategory::Resistors,
        r"(?i)\b(резистор|сборка\s*резисторн\w*|resistor)\b|\bR\d+\b",
    ),
    (
        EnumCategory::Indicators,
        r"(?i)\b(светодиод|ламп\w*|кнопк\w*|индикатор\w*|led)\b",
    ),
];

static L_CATEGORY_RULES_COMPILED: LazyLock<Vec<(EnumCategory, Regex)>> = LazyLock::new(|| {
    TUP_CATEGORY_RULES
        .iter()
        .map(|(category, c_pattern)| {
            (
                *category,
                Regex::new(c_pattern).expect("valid category rule regex"),
            )
        })
        .collect()
});

/// Classify a free-text part name. Total and deterministic.
pub fn classify_name(name: &str) -> EnumCategory {
    let c_name = clean_text(name);
    L_CATEGORY_RULES_COMPILED
        .iter()
        .find(|(_, re)| re.is_match(&c_name))
        .map_or(ENUM_CATEGORY_DEFAULT, |(category, _)| *category)
}
