//! Static country tables used when providers need codes or give no answer

const ISO2: &[(&str, &str)] = &[
    ("united states", "US"),
    ("united kingdom", "GB"),
    ("germany", "DE"),
    ("france", "FR"),
    ("japan", "JP"),
    ("china", "CN"),
    ("india", "IN"),
    ("canada", "CA"),
    ("australia", "AU"),
    ("brazil", "BR"),
    ("russia", "RU"),
    ("south korea", "KR"),
    ("italy", "IT"),
    ("spain", "ES"),
    ("netherlands", "NL"),
    ("switzerland", "CH"),
    ("sweden", "SE"),
    ("norway", "NO"),
    ("denmark", "DK"),
    ("finland", "FI"),
    ("belgium", "BE"),
    ("austria", "AT"),
    ("poland", "PL"),
    ("czech republic", "CZ"),
    ("hungary", "HU"),
    ("portugal", "PT"),
    ("greece", "GR"),
    ("ireland", "IE"),
    ("luxembourg", "LU"),
    ("singapore", "SG"),
    ("hong kong", "HK"),
    ("new zealand", "NZ"),
    ("south africa", "ZA"),
    ("mexico", "MX"),
    ("argentina", "AR"),
    ("chile", "CL"),
    ("colombia", "CO"),
    ("peru", "PE"),
    ("venezuela", "VE"),
    ("thailand", "TH"),
    ("malaysia", "MY"),
    ("philippines", "PH"),
    ("indonesia", "ID"),
    ("vietnam", "VN"),
    ("turkey", "TR"),
    ("israel", "IL"),
    ("saudi arabia", "SA"),
    ("united arab emirates", "AE"),
    ("egypt", "EG"),
    ("morocco", "MA"),
    ("nigeria", "NG"),
    ("kenya", "KE"),
    ("ethiopia", "ET"),
];

const ISO3: &[(&str, &str)] = &[
    ("united states", "USA"),
    ("usa", "USA"),
    ("america", "USA"),
    ("united kingdom", "GBR"),
    ("uk", "GBR"),
    ("britain", "GBR"),
    ("canada", "CAN"),
    ("germany", "DEU"),
    ("france", "FRA"),
    ("italy", "ITA"),
    ("spain", "ESP"),
    ("japan", "JPN"),
    ("china", "CHN"),
    ("india", "IND"),
    ("brazil", "BRA"),
    ("russia", "RUS"),
    ("australia", "AUS"),
    ("mexico", "MEX"),
    ("south korea", "KOR"),
    ("netherlands", "NLD"),
    ("belgium", "BEL"),
    ("switzerland", "CHE"),
    ("austria", "AUT"),
    ("sweden", "SWE"),
    ("norway", "NOR"),
    ("denmark", "DNK"),
    ("finland", "FIN"),
    ("poland", "POL"),
    ("turkey", "TUR"),
    ("thailand", "THA"),
    ("singapore", "SGP"),
    ("hong kong", "HKG"),
    ("new zealand", "NZL"),
    ("united arab emirates", "ARE"),
    ("israel", "ISR"),
    ("malaysia", "MYS"),
    ("indonesia", "IDN"),
    ("philippines", "PHL"),
];

/// Rough life expectancy at birth, used when the World Bank has nothing
const LIFE_EXPECTANCY: &[(&str, f64)] = &[
    ("united states", 78.9),
    ("canada", 82.0),
    ("united kingdom", 81.2),
    ("germany", 81.3),
    ("france", 82.7),
    ("italy", 83.5),
    ("spain", 83.6),
    ("japan", 84.6),
    ("south korea", 83.0),
    ("australia", 83.4),
    ("new zealand", 82.3),
    ("sweden", 82.8),
    ("norway", 82.0),
    ("denmark", 80.9),
    ("finland", 81.7),
    ("netherlands", 82.3),
    ("belgium", 82.0),
    ("switzerland", 83.8),
    ("austria", 81.6),
    ("singapore", 83.1),
    ("hong kong", 85.3),
    ("china", 76.9),
    ("india", 69.7),
    ("brazil", 75.9),
    ("russia", 72.6),
    ("mexico", 75.1),
    ("poland", 77.8),
    ("turkey", 77.7),
    ("thailand", 77.0),
    ("south africa", 64.1),
    ("nigeria", 54.7),
    ("kenya", 66.7),
    ("egypt", 72.0),
    ("argentina", 76.7),
    ("chile", 80.2),
    ("colombia", 77.3),
    ("peru", 76.7),
];

/// Global average, for countries missing from the table
pub const DEFAULT_LIFE_EXPECTANCY: f64 = 72.0;

fn lookup<T: Copy>(table: &[(&str, T)], country: &str) -> Option<T> {
    let country = country.trim().to_lowercase();
    table
        .iter()
        .find(|(name, _)| *name == country)
        .map(|(_, value)| *value)
}

/// Two-letter code; unknown countries use their first two letters
#[must_use]
pub fn iso2(country: &str) -> String {
    lookup(ISO2, country).map_or_else(
        || country.trim().chars().take(2).collect::<String>().to_uppercase(),
        str::to_string,
    )
}

#[must_use]
pub fn iso3(country: &str) -> Option<&'static str> {
    lookup(ISO3, country)
}

#[must_use]
pub fn estimated_life_expectancy(country: &str) -> f64 {
    lookup(LIFE_EXPECTANCY, country).unwrap_or(DEFAULT_LIFE_EXPECTANCY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iso2_lookup_and_fallback() {
        assert_eq!(iso2("United Kingdom"), "GB");
        assert_eq!(iso2("south korea"), "KR");
        assert_eq!(iso2("Atlantis"), "AT");
    }

    #[test]
    fn test_iso3_aliases() {
        assert_eq!(iso3("USA"), Some("USA"));
        assert_eq!(iso3("Britain"), Some("GBR"));
        assert_eq!(iso3("Atlantis"), None);
    }

    #[test]
    fn test_estimates() {
        assert_eq!(estimated_life_expectancy("Japan"), 84.6);
        assert_eq!(estimated_life_expectancy("Atlantis"), DEFAULT_LIFE_EXPECTANCY);
    }
}
