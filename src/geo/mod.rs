// ============================================================================
// Country Resolution
// ============================================================================
//
// Delivery addresses carry free-text country names ("Trinidad & Tobago",
// "St. Lucia", "USA"). Aggregations group by ISO 3166 alpha-2 code instead.
//
// `CountryResolver` is the seam; `CountryTable` is the built-in table
// covering CARICOM members, associate members and the usual shipping
// destinations.
//
// ============================================================================

/// Pure name -> code lookup
pub trait CountryResolver: Send + Sync {
    fn country_name_to_code(&self, name: &str) -> Option<&'static str>;

    /// Display name for a code this resolver produced
    fn country_name(&self, code: &str) -> Option<&'static str>;
}

struct CountryEntry {
    code: &'static str,
    name: &'static str,
    aliases: &'static [&'static str],
}

const COUNTRIES: &[CountryEntry] = &[
    // CARICOM members
    CountryEntry { code: "AG", name: "Antigua and Barbuda", aliases: &["antigua", "barbuda"] },
    CountryEntry { code: "BS", name: "Bahamas", aliases: &[] },
    CountryEntry { code: "BB", name: "Barbados", aliases: &[] },
    CountryEntry { code: "BZ", name: "Belize", aliases: &[] },
    CountryEntry { code: "DM", name: "Dominica", aliases: &[] },
    CountryEntry { code: "GD", name: "Grenada", aliases: &[] },
    CountryEntry { code: "GY", name: "Guyana", aliases: &[] },
    CountryEntry { code: "HT", name: "Haiti", aliases: &[] },
    CountryEntry { code: "JM", name: "Jamaica", aliases: &[] },
    CountryEntry { code: "MS", name: "Montserrat", aliases: &[] },
    CountryEntry { code: "KN", name: "Saint Kitts and Nevis", aliases: &["saint kitts", "st kitts"] },
    CountryEntry { code: "LC", name: "Saint Lucia", aliases: &["st lucia"] },
    CountryEntry {
        code: "VC",
        name: "Saint Vincent and the Grenadines",
        aliases: &["saint vincent", "st vincent", "st vincent and the grenadines"],
    },
    CountryEntry { code: "SR", name: "Suriname", aliases: &["surinam"] },
    CountryEntry { code: "TT", name: "Trinidad and Tobago", aliases: &["trinidad", "tobago"] },
    // CARICOM associate members
    CountryEntry { code: "AI", name: "Anguilla", aliases: &[] },
    CountryEntry { code: "BM", name: "Bermuda", aliases: &[] },
    CountryEntry { code: "VG", name: "British Virgin Islands", aliases: &["virgin islands british"] },
    CountryEntry { code: "KY", name: "Cayman Islands", aliases: &["cayman"] },
    CountryEntry { code: "TC", name: "Turks and Caicos Islands", aliases: &["turks and caicos"] },
    // Other destinations
    CountryEntry {
        code: "US",
        name: "United States",
        aliases: &["usa", "us", "united states of america", "america"],
    },
    CountryEntry { code: "CA", name: "Canada", aliases: &[] },
    CountryEntry {
        code: "GB",
        name: "United Kingdom",
        aliases: &["uk", "great britain", "england", "britain"],
    },
    CountryEntry { code: "FR", name: "France", aliases: &[] },
    CountryEntry { code: "DE", name: "Germany", aliases: &[] },
    CountryEntry { code: "IT", name: "Italy", aliases: &[] },
    CountryEntry { code: "ES", name: "Spain", aliases: &[] },
    CountryEntry { code: "NL", name: "Netherlands", aliases: &["holland"] },
    CountryEntry { code: "JP", name: "Japan", aliases: &[] },
    CountryEntry { code: "KR", name: "South Korea", aliases: &["korea", "republic of korea"] },
    CountryEntry { code: "SG", name: "Singapore", aliases: &[] },
    CountryEntry { code: "HK", name: "Hong Kong", aliases: &[] },
    CountryEntry { code: "CN", name: "China", aliases: &[] },
    CountryEntry { code: "IN", name: "India", aliases: &[] },
    CountryEntry { code: "TH", name: "Thailand", aliases: &[] },
    CountryEntry { code: "PH", name: "Philippines", aliases: &[] },
    CountryEntry { code: "AU", name: "Australia", aliases: &[] },
    CountryEntry { code: "NZ", name: "New Zealand", aliases: &[] },
    CountryEntry { code: "BR", name: "Brazil", aliases: &[] },
    CountryEntry { code: "AR", name: "Argentina", aliases: &[] },
    CountryEntry { code: "PE", name: "Peru", aliases: &[] },
    CountryEntry { code: "CO", name: "Colombia", aliases: &[] },
    CountryEntry { code: "MX", name: "Mexico", aliases: &[] },
    CountryEntry { code: "DO", name: "Dominican Republic", aliases: &[] },
    CountryEntry { code: "PR", name: "Puerto Rico", aliases: &[] },
    CountryEntry { code: "ZA", name: "South Africa", aliases: &[] },
    CountryEntry { code: "NG", name: "Nigeria", aliases: &[] },
    CountryEntry { code: "EG", name: "Egypt", aliases: &[] },
    CountryEntry { code: "AE", name: "United Arab Emirates", aliases: &["uae"] },
    CountryEntry { code: "LB", name: "Lebanon", aliases: &[] },
    CountryEntry { code: "JO", name: "Jordan", aliases: &[] },
    CountryEntry { code: "QA", name: "Qatar", aliases: &[] },
];

/// Lowercase, `&` -> `and`, `st.` -> `st`, drop a leading "the", collapse spaces
fn normalize(name: &str) -> String {
    let lowered = name.trim().to_lowercase().replace('&', " and ").replace('.', " ");
    let words: Vec<&str> = lowered.split_whitespace().collect();
    let words = match words.first() {
        Some(&"the") if words.len() > 1 => &words[1..],
        _ => &words[..],
    };
    words.join(" ")
}

/// Built-in country table
#[derive(Debug, Clone, Copy, Default)]
pub struct CountryTable;

impl CountryResolver for CountryTable {
    fn country_name_to_code(&self, name: &str) -> Option<&'static str> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return None;
        }

        if trimmed.len() == 2 {
            if let Some(entry) = COUNTRIES.iter().find(|e| e.code.eq_ignore_ascii_case(trimmed)) {
                return Some(entry.code);
            }
        }

        let normalized = normalize(trimmed);
        COUNTRIES
            .iter()
            .find(|entry| {
                normalize(entry.name) == normalized
                    || entry.aliases.iter().any(|alias| *alias == normalized)
            })
            .map(|entry| entry.code)
    }

    fn country_name(&self, code: &str) -> Option<&'static str> {
        COUNTRIES
            .iter()
            .find(|entry| entry.code.eq_ignore_ascii_case(code))
            .map(|entry| entry.name)
    }
}

/// Resolve with the built-in table
pub fn country_name_to_code(name: &str) -> Option<&'static str> {
    CountryTable.country_name_to_code(name)
}
