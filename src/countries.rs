//! Member states: flag glyphs, populations and names.
//!
//! Vote tallies and sponsor lists are rendered as rows of flags, most
//! populous country first. The table covers the 193 member states and the
//! two observer states; populations are rounded mid-2020s estimates and only
//! used for ordering.

/// One member or observer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Country {
    pub alpha3: &'static str,
    pub alpha2: &'static str,
    pub name: &'static str,
    pub population: u64,
}

impl Country {
    /// Emoji flag built from regional indicator symbols.
    pub fn flag(&self) -> String {
        self.alpha2
            .chars()
            .filter_map(|c| char::from_u32(0x1F1E6 + (c.to_ascii_uppercase() as u32 - 'A' as u32)))
            .collect()
    }
}

macro_rules! countries {
    ($(($a3:literal, $a2:literal, $name:literal, $pop:literal)),* $(,)?) => {
        &[$(Country { alpha3: $a3, alpha2: $a2, name: $name, population: $pop }),*]
    };
}

pub static COUNTRIES: &[Country] = countries![
    ("AFG", "AF", "Afghanistan", 41_100_000),
    ("ALB", "AL", "Albania", 2_800_000),
    ("DZA", "DZ", "Algeria", 45_600_000),
    ("AND", "AD", "Andorra", 80_000),
    ("AGO", "AO", "Angola", 36_700_000),
    ("ATG", "AG", "Antigua and Barbuda", 94_000),
    ("ARG", "AR", "Argentina", 46_600_000),
    ("ARM", "AM", "Armenia", 2_800_000),
    ("AUS", "AU", "Australia", 26_600_000),
    ("AUT", "AT", "Austria", 9_100_000),
    ("AZE", "AZ", "Azerbaijan", 10_400_000),
    ("BHS", "BS", "Bahamas", 410_000),
    ("BHR", "BH", "Bahrain", 1_500_000),
    ("BGD", "BD", "Bangladesh", 173_000_000),
    ("BRB", "BB", "Barbados", 282_000),
    ("BLR", "BY", "Belarus", 9_200_000),
    ("BEL", "BE", "Belgium", 11_800_000),
    ("BLZ", "BZ", "Belize", 410_000),
    ("BEN", "BJ", "Benin", 13_700_000),
    ("BTN", "BT", "Bhutan", 787_000),
    ("BOL", "BO", "Bolivia (Plurinational State of)", 12_400_000),
    ("BIH", "BA", "Bosnia and Herzegovina", 3_200_000),
    ("BWA", "BW", "Botswana", 2_700_000),
    ("BRA", "BR", "Brazil", 216_400_000),
    ("BRN", "BN", "Brunei Darussalam", 452_000),
    ("BGR", "BG", "Bulgaria", 6_700_000),
    ("BFA", "BF", "Burkina Faso", 23_300_000),
    ("BDI", "BI", "Burundi", 13_200_000),
    ("CPV", "CV", "Cabo Verde", 598_000),
    ("KHM", "KH", "Cambodia", 16_900_000),
    ("CMR", "CM", "Cameroon", 28_600_000),
    ("CAN", "CA", "Canada", 38_800_000),
    ("CAF", "CF", "Central African Republic", 5_700_000),
    ("TCD", "TD", "Chad", 18_300_000),
    ("CHL", "CL", "Chile", 19_600_000),
    ("CHN", "CN", "China", 1_410_000_000),
    ("COL", "CO", "Colombia", 52_100_000),
    ("COM", "KM", "Comoros", 852_000),
    ("COG", "CG", "Congo", 6_100_000),
    ("CRI", "CR", "Costa Rica", 5_200_000),
    ("CIV", "CI", "Côte d'Ivoire", 28_900_000),
    ("HRV", "HR", "Croatia", 3_900_000),
    ("CUB", "CU", "Cuba", 11_200_000),
    ("CYP", "CY", "Cyprus", 1_300_000),
    ("CZE", "CZ", "Czechia", 10_500_000),
    ("PRK", "KP", "Democratic People's Republic of Korea", 26_200_000),
    ("COD", "CD", "Democratic Republic of the Congo", 102_300_000),
    ("DNK", "DK", "Denmark", 5_900_000),
    ("DJI", "DJ", "Djibouti", 1_100_000),
    ("DMA", "DM", "Dominica", 73_000),
    ("DOM", "DO", "Dominican Republic", 11_300_000),
    ("ECU", "EC", "Ecuador", 18_200_000),
    ("EGY", "EG", "Egypt", 112_700_000),
    ("SLV", "SV", "El Salvador", 6_400_000),
    ("GNQ", "GQ", "Equatorial Guinea", 1_700_000),
    ("ERI", "ER", "Eritrea", 3_700_000),
    ("EST", "EE", "Estonia", 1_400_000),
    ("SWZ", "SZ", "Eswatini", 1_200_000),
    ("ETH", "ET", "Ethiopia", 126_500_000),
    ("FJI", "FJ", "Fiji", 936_000),
    ("FIN", "FI", "Finland", 5_600_000),
    ("FRA", "FR", "France", 68_200_000),
    ("GAB", "GA", "Gabon", 2_400_000),
    ("GMB", "GM", "Gambia", 2_800_000),
    ("GEO", "GE", "Georgia", 3_700_000),
    ("DEU", "DE", "Germany", 84_500_000),
    ("GHA", "GH", "Ghana", 34_100_000),
    ("GRC", "GR", "Greece", 10_400_000),
    ("GRD", "GD", "Grenada", 126_000),
    ("GTM", "GT", "Guatemala", 18_100_000),
    ("GIN", "GN", "Guinea", 14_200_000),
    ("GNB", "GW", "Guinea-Bissau", 2_200_000),
    ("GUY", "GY", "Guyana", 813_000),
    ("HTI", "HT", "Haiti", 11_700_000),
    ("VAT", "VA", "Holy See", 800),
    ("HND", "HN", "Honduras", 10_600_000),
    ("HUN", "HU", "Hungary", 9_600_000),
    ("ISL", "IS", "Iceland", 390_000),
    ("IND", "IN", "India", 1_428_600_000),
    ("IDN", "ID", "Indonesia", 277_500_000),
    ("IRN", "IR", "Iran (Islamic Republic of)", 89_200_000),
    ("IRQ", "IQ", "Iraq", 45_500_000),
    ("IRL", "IE", "Ireland", 5_300_000),
    ("ISR", "IL", "Israel", 9_800_000),
    ("ITA", "IT", "Italy", 58_900_000),
    ("JAM", "JM", "Jamaica", 2_800_000),
    ("JPN", "JP", "Japan", 124_500_000),
    ("JOR", "JO", "Jordan", 11_300_000),
    ("KAZ", "KZ", "Kazakhstan", 19_900_000),
    ("KEN", "KE", "Kenya", 55_100_000),
    ("KIR", "KI", "Kiribati", 133_000),
    ("KWT", "KW", "Kuwait", 4_300_000),
    ("KGZ", "KG", "Kyrgyzstan", 7_000_000),
    ("LAO", "LA", "Lao People's Democratic Republic", 7_600_000),
    ("LVA", "LV", "Latvia", 1_900_000),
    ("LBN", "LB", "Lebanon", 5_400_000),
    ("LSO", "LS", "Lesotho", 2_300_000),
    ("LBR", "LR", "Liberia", 5_400_000),
    ("LBY", "LY", "Libya", 6_900_000),
    ("LIE", "LI", "Liechtenstein", 40_000),
    ("LTU", "LT", "Lithuania", 2_900_000),
    ("LUX", "LU", "Luxembourg", 660_000),
    ("MDG", "MG", "Madagascar", 30_300_000),
    ("MWI", "MW", "Malawi", 20_900_000),
    ("MYS", "MY", "Malaysia", 34_300_000),
    ("MDV", "MV", "Maldives", 521_000),
    ("MLI", "ML", "Mali", 23_300_000),
    ("MLT", "MT", "Malta", 535_000),
    ("MHL", "MH", "Marshall Islands", 42_000),
    ("MRT", "MR", "Mauritania", 4_900_000),
    ("MUS", "MU", "Mauritius", 1_300_000),
    ("MEX", "MX", "Mexico", 128_500_000),
    ("FSM", "FM", "Micronesia (Federated States of)", 115_000),
    ("MCO", "MC", "Monaco", 36_000),
    ("MNG", "MN", "Mongolia", 3_400_000),
    ("MNE", "ME", "Montenegro", 617_000),
    ("MAR", "MA", "Morocco", 37_800_000),
    ("MOZ", "MZ", "Mozambique", 33_900_000),
    ("MMR", "MM", "Myanmar", 54_600_000),
    ("NAM", "NA", "Namibia", 2_600_000),
    ("NRU", "NR", "Nauru", 12_800),
    ("NPL", "NP", "Nepal", 30_900_000),
    ("NLD", "NL", "Netherlands", 17_900_000),
    ("NZL", "NZ", "New Zealand", 5_200_000),
    ("NIC", "NI", "Nicaragua", 7_000_000),
    ("NER", "NE", "Niger", 27_200_000),
    ("NGA", "NG", "Nigeria", 223_800_000),
    ("MKD", "MK", "North Macedonia", 2_100_000),
    ("NOR", "NO", "Norway", 5_500_000),
    ("OMN", "OM", "Oman", 4_600_000),
    ("PAK", "PK", "Pakistan", 240_500_000),
    ("PLW", "PW", "Palau", 18_000),
    ("PSE", "PS", "State of Palestine", 5_400_000),
    ("PAN", "PA", "Panama", 4_500_000),
    ("PNG", "PG", "Papua New Guinea", 10_300_000),
    ("PRY", "PY", "Paraguay", 6_900_000),
    ("PER", "PE", "Peru", 34_400_000),
    ("PHL", "PH", "Philippines", 117_300_000),
    ("POL", "PL", "Poland", 36_800_000),
    ("PRT", "PT", "Portugal", 10_400_000),
    ("QAT", "QA", "Qatar", 2_700_000),
    ("KOR", "KR", "Republic of Korea", 51_700_000),
    ("MDA", "MD", "Republic of Moldova", 2_500_000),
    ("ROU", "RO", "Romania", 19_000_000),
    ("RUS", "RU", "Russian Federation", 144_400_000),
    ("RWA", "RW", "Rwanda", 14_100_000),
    ("KNA", "KN", "Saint Kitts and Nevis", 48_000),
    ("LCA", "LC", "Saint Lucia", 180_000),
    ("VCT", "VC", "Saint Vincent and the Grenadines", 104_000),
    ("WSM", "WS", "Samoa", 225_000),
    ("SMR", "SM", "San Marino", 34_000),
    ("STP", "ST", "Sao Tome and Principe", 231_000),
    ("SAU", "SA", "Saudi Arabia", 36_900_000),
    ("SEN", "SN", "Senegal", 17_800_000),
    ("SRB", "RS", "Serbia", 6_700_000),
    ("SYC", "SC", "Seychelles", 108_000),
    ("SLE", "SL", "Sierra Leone", 8_800_000),
    ("SGP", "SG", "Singapore", 5_900_000),
    ("SVK", "SK", "Slovakia", 5_400_000),
    ("SVN", "SI", "Slovenia", 2_100_000),
    ("SLB", "SB", "Solomon Islands", 740_000),
    ("SOM", "SO", "Somalia", 18_100_000),
    ("ZAF", "ZA", "South Africa", 60_400_000),
    ("SSD", "SS", "South Sudan", 11_100_000),
    ("ESP", "ES", "Spain", 48_400_000),
    ("LKA", "LK", "Sri Lanka", 21_900_000),
    ("SDN", "SD", "Sudan", 48_100_000),
    ("SUR", "SR", "Suriname", 623_000),
    ("SWE", "SE", "Sweden", 10_500_000),
    ("CHE", "CH", "Switzerland", 8_800_000),
    ("SYR", "SY", "Syrian Arab Republic", 23_200_000),
    ("TJK", "TJ", "Tajikistan", 10_100_000),
    ("THA", "TH", "Thailand", 71_800_000),
    ("TLS", "TL", "Timor-Leste", 1_400_000),
    ("TGO", "TG", "Togo", 9_100_000),
    ("TON", "TO", "Tonga", 107_000),
    ("TTO", "TT", "Trinidad and Tobago", 1_500_000),
    ("TUN", "TN", "Tunisia", 12_500_000),
    ("TUR", "TR", "Türkiye", 85_800_000),
    ("TKM", "TM", "Turkmenistan", 6_500_000),
    ("TUV", "TV", "Tuvalu", 11_000),
    ("UGA", "UG", "Uganda", 48_600_000),
    ("UKR", "UA", "Ukraine", 37_000_000),
    ("ARE", "AE", "United Arab Emirates", 9_500_000),
    ("GBR", "GB", "United Kingdom", 68_400_000),
    ("TZA", "TZ", "United Republic of Tanzania", 67_400_000),
    ("USA", "US", "United States", 339_900_000),
    ("URY", "UY", "Uruguay", 3_400_000),
    ("UZB", "UZ", "Uzbekistan", 35_200_000),
    ("VUT", "VU", "Vanuatu", 334_000),
    ("VEN", "VE", "Venezuela (Bolivarian Republic of)", 28_800_000),
    ("VNM", "VN", "Viet Nam", 98_900_000),
    ("YEM", "YE", "Yemen", 34_400_000),
    ("ZMB", "ZM", "Zambia", 20_600_000),
    ("ZWE", "ZW", "Zimbabwe", 16_700_000),
];

/// Look a country up by its alpha-3 code (case-insensitive).
pub fn by_alpha3(code: &str) -> Option<&'static Country> {
    let code = code.trim();
    COUNTRIES
        .iter()
        .find(|c| c.alpha3.eq_ignore_ascii_case(code))
}

/// Look a country up by its English name (case-insensitive).
pub fn by_name(name: &str) -> Option<&'static Country> {
    let name = name.trim();
    COUNTRIES
        .iter()
        .find(|c| c.name.to_lowercase() == name.to_lowercase())
}

/// Known countries among `codes`, most populous first. Unknown codes are
/// dropped.
pub fn by_population<'a>(codes: impl IntoIterator<Item = &'a str>) -> Vec<&'static Country> {
    let mut known: Vec<&'static Country> = codes.into_iter().filter_map(by_alpha3).collect();
    known.sort_by(|a, b| b.population.cmp(&a.population));
    known
}

/// Flags of `codes` concatenated, most populous first.
pub fn flags<'a>(codes: impl IntoIterator<Item = &'a str>) -> String {
    by_population(codes).iter().map(|c| c.flag()).collect()
}
