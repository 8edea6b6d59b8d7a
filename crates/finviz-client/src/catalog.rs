//! Static mapping from abstract filter keys to Finviz screener parameters.
//!
//! Every `f=` token the compiler emits comes from this table. Changes to the
//! site's vocabulary should only ever touch this file.

use finviz_core::FinvizError;

/// How a bound is rendered when the other side of a range is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenBound {
    /// Preset style: the prefix is glued to the value (`o10`, `u50`, `eo5`).
    Prefix(&'static str),
    /// Custom-range style: the missing side is replaced with a filler (`10to`, `to50`, `1tox`).
    Custom(&'static str),
}

/// Unit the caller supplies a bound in, and how it maps onto the site's unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Plain,
    Dollars,
    Percent,
    /// Caller gives shares; the site expects thousands.
    SharesInThousands,
    /// Caller gives billions of dollars, same as the site.
    Billions,
}

impl Unit {
    pub fn scale(&self, value: f64) -> f64 {
        match self {
            Unit::SharesInThousands => value / 1000.0,
            _ => value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeRule {
    pub unit: Unit,
    /// Maximum fractional digits after unit scaling; more precision is rejected.
    pub decimals: u32,
    pub allow_negative: bool,
    pub min_only: OpenBound,
    pub max_only: OpenBound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// (abstract value, external encoding) pairs.
    Enumerated(&'static [(&'static str, &'static str)]),
    Range(RangeRule),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogEntry {
    pub key: &'static str,
    /// Parameter prefix of the emitted token, e.g. `sh_price`.
    pub code: &'static str,
    pub rule: Rule,
    /// Compare values case- and punctuation-insensitively.
    pub normalize: bool,
    /// Several values may be joined with `|` into one token.
    pub multi: bool,
}

impl CatalogEntry {
    /// External encoding for one enumerated value.
    pub fn encode(&self, value: &str) -> Result<&'static str, FinvizError> {
        let wanted = if self.normalize {
            normalize(value)
        } else {
            value.trim().to_ascii_lowercase()
        };
        let found = match self.rule {
            Rule::Enumerated(pairs) => pairs
                .iter()
                .find(|(name, external)| {
                    if self.normalize {
                        normalize(name) == wanted || normalize(external) == wanted
                    } else {
                        *name == wanted
                    }
                })
                .map(|(_, external)| *external),
            Rule::Range(_) => {
                return Err(FinvizError::validation(
                    self.key,
                    "expects a numeric range, not a discrete value",
                ))
            }
        };

        found.ok_or_else(|| {
            FinvizError::validation(
                self.key,
                format!(
                    "unknown value '{}'; accepted values: {}",
                    value,
                    self.accepted().join(", ")
                ),
            )
        })
    }

    /// Abstract values a caller may pass, in table order.
    pub fn accepted(&self) -> Vec<&'static str> {
        match self.rule {
            Rule::Enumerated(pairs) => pairs.iter().map(|(name, _)| *name).collect(),
            Rule::Range(_) => Vec::new(),
        }
    }

    pub fn range_rule(&self) -> Option<&RangeRule> {
        match &self.rule {
            Rule::Range(rule) => Some(rule),
            _ => None,
        }
    }
}

/// Lowercase ASCII alphanumerics only: "Software - Application" -> "softwareapplication".
pub fn normalize(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Look up an abstract filter key. Unknown keys are a caller error.
pub fn lookup(key: &str) -> Result<&'static CatalogEntry, FinvizError> {
    CATALOG.iter().find(|e| e.key == key).ok_or_else(|| {
        let known: Vec<&str> = CATALOG.iter().map(|e| e.key).collect();
        FinvizError::validation(
            key,
            format!("unknown filter key; known keys: {}", known.join(", ")),
        )
    })
}

/// Finviz `o=` column for an abstract sort key.
pub fn sort_code(key: &str) -> Result<&'static str, FinvizError> {
    SORT_KEYS
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, code)| *code)
        .ok_or_else(|| {
            let known: Vec<&str> = SORT_KEYS.iter().map(|(name, _)| *name).collect();
            FinvizError::validation(
                "sort_by",
                format!("unknown sort key '{}'; accepted values: {}", key, known.join(", ")),
            )
        })
}

const OVER_UNDER: (OpenBound, OpenBound) = (OpenBound::Prefix("o"), OpenBound::Prefix("u"));
const CUSTOM: (OpenBound, OpenBound) = (OpenBound::Custom(""), OpenBound::Custom(""));

const fn range(unit: Unit, decimals: u32, allow_negative: bool, bounds: (OpenBound, OpenBound)) -> Rule {
    Rule::Range(RangeRule {
        unit,
        decimals,
        allow_negative,
        min_only: bounds.0,
        max_only: bounds.1,
    })
}

const fn entry(key: &'static str, code: &'static str, rule: Rule) -> CatalogEntry {
    CatalogEntry { key, code, rule, normalize: false, multi: false }
}

pub const MARKET_CAPS: &[(&str, &str)] = &[
    ("mega", "mega"),
    ("large", "large"),
    ("mid", "mid"),
    ("small", "small"),
    ("micro", "micro"),
    ("nano", "nano"),
    ("largeover", "largeover"),
    ("midover", "midover"),
    ("smallover", "smallover"),
    ("microover", "microover"),
    ("largeunder", "largeunder"),
    ("midunder", "midunder"),
    ("smallunder", "smallunder"),
    ("microunder", "microunder"),
];

pub const SECTORS: &[(&str, &str)] = &[
    ("Basic Materials", "basicmaterials"),
    ("Communication Services", "communicationservices"),
    ("Consumer Cyclical", "consumercyclical"),
    ("Consumer Defensive", "consumerdefensive"),
    ("Energy", "energy"),
    ("Financial Services", "financial"),
    ("Healthcare", "healthcare"),
    ("Industrials", "industrials"),
    ("Real Estate", "realestate"),
    ("Technology", "technology"),
    ("Utilities", "utilities"),
];

pub const INDUSTRIES: &[(&str, &str)] = &[
    ("Advertising Agencies", "advertisingagencies"),
    ("Aerospace & Defense", "aerospacedefense"),
    ("Agricultural Inputs", "agriculturalinputs"),
    ("Airlines", "airlines"),
    ("Airports & Air Services", "airportsairservices"),
    ("Aluminum", "aluminum"),
    ("Apparel Manufacturing", "apparelmanufacturing"),
    ("Apparel Retail", "apparelretail"),
    ("Asset Management", "assetmanagement"),
    ("Auto Manufacturers", "automanufacturers"),
    ("Auto Parts", "autoparts"),
    ("Auto & Truck Dealerships", "autotruckdealerships"),
    ("Banks - Diversified", "banksdiversified"),
    ("Banks - Regional", "banksregional"),
    ("Beverages - Brewers", "beveragesbrewers"),
    ("Beverages - Non-Alcoholic", "beveragesnonalcoholic"),
    ("Beverages - Wineries & Distilleries", "beverageswineriesdistilleries"),
    ("Biotechnology", "biotechnology"),
    ("Broadcasting", "broadcasting"),
    ("Building Materials", "buildingmaterials"),
    ("Building Products & Equipment", "buildingproductsequipment"),
    ("Business Equipment & Supplies", "businessequipmentsupplies"),
    ("Capital Markets", "capitalmarkets"),
    ("Chemicals", "chemicals"),
    ("Closed-End Fund - Debt", "closedendfunddebt"),
    ("Closed-End Fund - Equity", "closedendfundequity"),
    ("Closed-End Fund - Foreign", "closedendfundforeign"),
    ("Coking Coal", "cokingcoal"),
    ("Communication Equipment", "communicationequipment"),
    ("Computer Hardware", "computerhardware"),
    ("Confectioners", "confectioners"),
    ("Conglomerates", "conglomerates"),
    ("Consulting Services", "consultingservices"),
    ("Consumer Electronics", "consumerelectronics"),
    ("Copper", "copper"),
    ("Credit Services", "creditservices"),
    ("Department Stores", "departmentstores"),
    ("Diagnostics & Research", "diagnosticsresearch"),
    ("Discount Stores", "discountstores"),
    ("Drug Manufacturers - General", "drugmanufacturersgeneral"),
    ("Drug Manufacturers - Specialty & Generic", "drugmanufacturersspecialtygeneric"),
    ("Education & Training Services", "educationtrainingservices"),
    ("Electrical Equipment & Parts", "electricalequipmentparts"),
    ("Electronic Components", "electroniccomponents"),
    ("Electronic Gaming & Multimedia", "electronicgamingmultimedia"),
    ("Electronics & Computer Distribution", "electronicscomputerdistribution"),
    ("Engineering & Construction", "engineeringconstruction"),
    ("Entertainment", "entertainment"),
    ("Exchange Traded Fund", "exchangetradedfund"),
    ("Farm & Heavy Construction Machinery", "farmheavyconstructionmachinery"),
    ("Farm Products", "farmproducts"),
    ("Financial Conglomerates", "financialconglomerates"),
    ("Financial Data & Stock Exchanges", "financialdatastockexchanges"),
    ("Food Distribution", "fooddistribution"),
    ("Footwear & Accessories", "footwearaccessories"),
    ("Furnishings, Fixtures & Appliances", "furnishingsfixturesappliances"),
    ("Gambling", "gambling"),
    ("Gold", "gold"),
    ("Grocery Stores", "grocerystores"),
    ("Health Information Services", "healthinformationservices"),
    ("Healthcare Plans", "healthcareplans"),
    ("Home Improvement Retail", "homeimprovementretail"),
    ("Household & Personal Products", "householdpersonalproducts"),
    ("Industrial Distribution", "industrialdistribution"),
    ("Information Technology Services", "informationtechnologyservices"),
    ("Infrastructure Operations", "infrastructureoperations"),
    ("Insurance - Diversified", "insurancediversified"),
    ("Insurance - Life", "insurancelife"),
    ("Insurance - Property & Casualty", "insurancepropertycasualty"),
    ("Insurance - Reinsurance", "insurancereinsurance"),
    ("Insurance - Specialty", "insurancespecialty"),
    ("Insurance Brokers", "insurancebrokers"),
    ("Integrated Freight & Logistics", "integratedfreightlogistics"),
    ("Internet Content & Information", "internetcontentinformation"),
    ("Internet Retail", "internetretail"),
    ("Leisure", "leisure"),
    ("Lodging", "lodging"),
    ("Lumber & Wood Production", "lumberwoodproduction"),
    ("Luxury Goods", "luxurygoods"),
    ("Marine Shipping", "marineshipping"),
    ("Medical Care Facilities", "medicalcarefacilities"),
    ("Medical Devices", "medicaldevices"),
    ("Medical Distribution", "medicaldistribution"),
    ("Medical Instruments & Supplies", "medicalinstrumentssupplies"),
    ("Metal Fabrication", "metalfabrication"),
    ("Mortgage Finance", "mortgagefinance"),
    ("Oil & Gas Drilling", "oilgasdrilling"),
    ("Oil & Gas E&P", "oilgasep"),
    ("Oil & Gas Equipment & Services", "oilgasequipmentservices"),
    ("Oil & Gas Integrated", "oilgasintegrated"),
    ("Oil & Gas Midstream", "oilgasmidstream"),
    ("Oil & Gas Refining & Marketing", "oilgasrefiningmarketing"),
    ("Other Industrial Metals & Mining", "otherindustrialmetalsmining"),
    ("Other Precious Metals & Mining", "otherpreciousmetalsmining"),
    ("Packaged Foods", "packagedfoods"),
    ("Packaging & Containers", "packagingcontainers"),
    ("Paper & Paper Products", "paperpaperproducts"),
    ("Personal Services", "personalservices"),
    ("Pharmaceutical Retailers", "pharmaceuticalretailers"),
    ("Pollution & Treatment Controls", "pollutiontreatmentcontrols"),
    ("Publishing", "publishing"),
    ("Railroads", "railroads"),
    ("Real Estate - Development", "realestatedevelopment"),
    ("Real Estate - Diversified", "realestatediversified"),
    ("Real Estate Services", "realestateservices"),
    ("Recreational Vehicles", "recreationalvehicles"),
    ("REIT - Diversified", "reitdiversified"),
    ("REIT - Healthcare Facilities", "reithealthcarefacilities"),
    ("REIT - Hotel & Motel", "reithotelmotel"),
    ("REIT - Industrial", "reitindustrial"),
    ("REIT - Mortgage", "reitmortgage"),
    ("REIT - Office", "reitoffice"),
    ("REIT - Residential", "reitresidential"),
    ("REIT - Retail", "reitretail"),
    ("REIT - Specialty", "reitspecialty"),
    ("Rental & Leasing Services", "rentalleasingservices"),
    ("Residential Construction", "residentialconstruction"),
    ("Resorts & Casinos", "resortscasinos"),
    ("Restaurants", "restaurants"),
    ("Scientific & Technical Instruments", "scientifictechnicalinstruments"),
    ("Security & Protection Services", "securityprotectionservices"),
    ("Semiconductor Equipment & Materials", "semiconductorequipmentmaterials"),
    ("Semiconductors", "semiconductors"),
    ("Shell Companies", "shellcompanies"),
    ("Silver", "silver"),
    ("Software - Application", "softwareapplication"),
    ("Software - Infrastructure", "softwareinfrastructure"),
    ("Solar", "solar"),
    ("Specialty Business Services", "specialtybusinessservices"),
    ("Specialty Chemicals", "specialtychemicals"),
    ("Specialty Industrial Machinery", "specialtyindustrialmachinery"),
    ("Specialty Retail", "specialtyretail"),
    ("Staffing & Employment Services", "staffingemploymentservices"),
    ("Steel", "steel"),
    ("Telecom Services", "telecomservices"),
    ("Textile Manufacturing", "textilemanufacturing"),
    ("Thermal Coal", "thermalcoal"),
    ("Tobacco", "tobacco"),
    ("Tools & Accessories", "toolsaccessories"),
    ("Travel Services", "travelservices"),
    ("Trucking", "trucking"),
    ("Uranium", "uranium"),
    ("Utilities - Diversified", "utilitiesdiversified"),
    ("Utilities - Independent Power Producers", "utilitiesindependentpowerproducers"),
    ("Utilities - Regulated Electric", "utilitiesregulatedelectric"),
    ("Utilities - Regulated Gas", "utilitiesregulatedgas"),
    ("Utilities - Regulated Water", "utilitiesregulatedwater"),
    ("Utilities - Renewable", "utilitiesrenewable"),
    ("Waste Management", "wastemanagement"),
];

pub const COUNTRIES: &[(&str, &str)] = &[
    ("USA", "usa"),
    ("Asia", "asia"),
    ("Europe", "europe"),
    ("Latin America", "latinamerica"),
    ("BRIC", "bric"),
    ("Argentina", "argentina"),
    ("Australia", "australia"),
    ("Belgium", "belgium"),
    ("Bermuda", "bermuda"),
    ("Brazil", "brazil"),
    ("Canada", "canada"),
    ("Cayman Islands", "caymanislands"),
    ("Chile", "chile"),
    ("China", "china"),
    ("Colombia", "colombia"),
    ("Denmark", "denmark"),
    ("Finland", "finland"),
    ("France", "france"),
    ("Germany", "germany"),
    ("Greece", "greece"),
    ("Hong Kong", "hongkong"),
    ("India", "india"),
    ("Indonesia", "indonesia"),
    ("Ireland", "ireland"),
    ("Israel", "israel"),
    ("Italy", "italy"),
    ("Japan", "japan"),
    ("Luxembourg", "luxembourg"),
    ("Mexico", "mexico"),
    ("Netherlands", "netherlands"),
    ("New Zealand", "newzealand"),
    ("Norway", "norway"),
    ("Peru", "peru"),
    ("Singapore", "singapore"),
    ("South Africa", "southafrica"),
    ("South Korea", "southkorea"),
    ("Spain", "spain"),
    ("Sweden", "sweden"),
    ("Switzerland", "switzerland"),
    ("Taiwan", "taiwan"),
    ("United Kingdom", "unitedkingdom"),
];


const SMA_RELATIONS_20: &[(&str, &str)] = &[
    ("price_above", "pa"),
    ("price_below", "pb"),
    ("price_crossed_above", "pca"),
    ("price_crossed_below", "pcb"),
    ("above_sma50", "sa50"),
    ("below_sma50", "sb50"),
    ("above_sma200", "sa200"),
    ("below_sma200", "sb200"),
];

const SMA_RELATIONS_50: &[(&str, &str)] = &[
    ("price_above", "pa"),
    ("price_below", "pb"),
    ("price_crossed_above", "pca"),
    ("price_crossed_below", "pcb"),
    ("above_sma20", "sa20"),
    ("below_sma20", "sb20"),
    ("above_sma200", "sa200"),
    ("below_sma200", "sb200"),
];

const SMA_RELATIONS_200: &[(&str, &str)] = &[
    ("price_above", "pa"),
    ("price_below", "pb"),
    ("price_crossed_above", "pca"),
    ("price_crossed_below", "pcb"),
    ("above_sma20", "sa20"),
    ("below_sma20", "sb20"),
    ("above_sma50", "sa50"),
    ("below_sma50", "sb50"),
];

pub const EARNINGS_DATES: &[(&str, &str)] = &[
    ("today", "today"),
    ("today_before", "todaybefore"),
    ("today_after", "todayafter"),
    ("tomorrow", "tomorrow"),
    ("tomorrow_before", "tomorrowbefore"),
    ("tomorrow_after", "tomorrowafter"),
    ("yesterday", "yesterday"),
    ("yesterday_before", "yesterdaybefore"),
    ("yesterday_after", "yesterdayafter"),
    ("next_5_days", "nextdays5"),
    ("this_week", "thisweek"),
    ("next_week", "nextweek"),
    ("prev_week", "prevweek"),
    ("this_month", "thismonth"),
    ("within_2_weeks", "nextdays5"),
    ("todaybefore", "todaybefore"),
    ("todayafter", "todayafter"),
    ("tomorrowbefore", "tomorrowbefore"),
    ("tomorrowafter", "tomorrowafter"),
    ("yesterdaybefore", "yesterdaybefore"),
    ("yesterdayafter", "yesterdayafter"),
    ("nextdays5", "nextdays5"),
    ("thisweek", "thisweek"),
    ("nextweek", "nextweek"),
    ("prevweek", "prevweek"),
    ("thismonth", "thismonth"),
];

const POSITIVE_NEGATIVE: &[(&str, &str)] = &[("positive", "pos"), ("negative", "neg")];

const PERFORMANCE: &[(&str, &str)] = &[
    ("today_up", "dup"),
    ("today_down", "ddown"),
    ("week_up", "1wup"),
    ("week_down", "1wdown"),
    ("month_up", "4wup"),
    ("month_down", "4wdown"),
    ("month_flat_or_down", "0to-4w"),
    ("quarter_up", "13wup"),
    ("quarter_down", "13wdown"),
    ("half_up", "26wup"),
    ("half_down", "26wdown"),
    ("year_up", "52wup"),
    ("year_down", "52wdown"),
    ("ytd_up", "ytdup"),
    ("ytd_down", "ytddown"),
];

const HIGH_LOW_52W: &[(&str, &str)] = &[
    ("new_high", "nh"),
    ("new_low", "nl"),
    ("below_high_5", "b5h"),
    ("below_high_10", "b10h"),
    ("below_high_20", "b20h"),
    ("below_high_30", "b30h"),
    ("below_high_50", "b50h"),
    ("above_low_5", "a5h"),
    ("above_low_10", "a10h"),
    ("above_low_20", "a20h"),
    ("above_low_30", "a30h"),
    ("above_low_50", "a50h"),
];

pub const CATALOG: &[CatalogEntry] = &[
    entry("market_cap", "cap", Rule::Enumerated(MARKET_CAPS)),
    entry("market_cap_range", "cap", range(Unit::Billions, 2, false, CUSTOM)),
    CatalogEntry {
        key: "sector",
        code: "sec",
        rule: Rule::Enumerated(SECTORS),
        normalize: true,
        multi: true,
    },
    CatalogEntry {
        key: "industry",
        code: "ind",
        rule: Rule::Enumerated(INDUSTRIES),
        normalize: true,
        multi: false,
    },
    entry(
        "instrument",
        "ind",
        Rule::Enumerated(&[("stocks_only", "stocksonly"), ("etf", "exchangetradedfund")]),
    ),
    CatalogEntry {
        key: "country",
        code: "geo",
        rule: Rule::Enumerated(COUNTRIES),
        normalize: true,
        multi: false,
    },
    entry(
        "index",
        "idx",
        Rule::Enumerated(&[
            ("sp500", "sp500"),
            ("dji", "dji"),
            ("nasdaq100", "ndx"),
            ("russell2000", "rut"),
        ]),
    ),
    entry("price", "sh_price", range(Unit::Dollars, 2, false, OVER_UNDER)),
    entry("volume", "sh_curvol", range(Unit::SharesInThousands, 1, false, OVER_UNDER)),
    entry("avg_volume", "sh_avgvol", range(Unit::SharesInThousands, 1, false, OVER_UNDER)),
    entry("relative_volume", "sh_relvol", range(Unit::Plain, 1, false, OVER_UNDER)),
    entry(
        "price_change",
        "ta_change",
        range(Unit::Percent, 1, true, (OpenBound::Prefix("o"), OpenBound::Custom(""))),
    ),
    entry(
        "afterhours_change",
        "ah_change",
        range(Unit::Percent, 1, true, (OpenBound::Prefix("o"), OpenBound::Custom(""))),
    ),
    entry("dividend_yield", "fa_div", range(Unit::Percent, 1, false, OVER_UNDER)),
    entry("pe", "fa_pe", range(Unit::Plain, 1, false, OVER_UNDER)),
    entry("pb", "fa_pb", range(Unit::Plain, 1, false, OVER_UNDER)),
    entry("rsi", "ta_rsi", range(Unit::Plain, 1, false, CUSTOM)),
    entry("eps_qoq", "fa_epsqoq", range(Unit::Percent, 1, true, OVER_UNDER)),
    entry("sales_qoq", "fa_salesqoq", range(Unit::Percent, 1, true, OVER_UNDER)),
    entry("roe", "fa_roe", range(Unit::Percent, 1, true, OVER_UNDER)),
    entry("debt_equity", "fa_debteq", range(Unit::Plain, 1, false, OVER_UNDER)),
    entry("payout_ratio", "fa_payoutratio", range(Unit::Percent, 1, false, OVER_UNDER)),
    entry(
        "eps_revision_pct",
        "fa_epsrev",
        range(Unit::Percent, 1, false, (OpenBound::Prefix("eo"), OpenBound::Prefix("eu"))),
    ),
    entry(
        "volatility",
        "ta_volatility",
        range(Unit::Percent, 1, false, (OpenBound::Custom("x"), OpenBound::Custom("x"))),
    ),
    entry(
        "eps_revision",
        "fa_epsrev",
        Rule::Enumerated(&[("positive", "ep"), ("negative", "en")]),
    ),
    entry(
        "price_direction",
        "ta_change",
        Rule::Enumerated(&[("up", "u"), ("down", "d")]),
    ),
    entry("eps_growth_qoq", "fa_epsqoq", Rule::Enumerated(POSITIVE_NEGATIVE)),
    entry("eps_growth_yoy", "fa_epsyoy", Rule::Enumerated(POSITIVE_NEGATIVE)),
    entry("eps_growth_5y", "fa_eps5years", Rule::Enumerated(POSITIVE_NEGATIVE)),
    entry("sales_growth_qoq", "fa_salesqoq", Rule::Enumerated(POSITIVE_NEGATIVE)),
    entry("sales_growth_5y", "fa_sales5years", Rule::Enumerated(POSITIVE_NEGATIVE)),
    entry("sma20", "ta_sma20", Rule::Enumerated(SMA_RELATIONS_20)),
    entry("sma50", "ta_sma50", Rule::Enumerated(SMA_RELATIONS_50)),
    entry("sma200", "ta_sma200", Rule::Enumerated(SMA_RELATIONS_200)),
    CatalogEntry {
        key: "earnings_date",
        code: "earningsdate",
        rule: Rule::Enumerated(EARNINGS_DATES),
        normalize: false,
        multi: true,
    },
    entry("performance", "ta_perf", Rule::Enumerated(PERFORMANCE)),
    entry("performance2", "ta_perf2", Rule::Enumerated(PERFORMANCE)),
    entry("high_low_52w", "ta_highlow52w", Rule::Enumerated(HIGH_LOW_52W)),
];

pub const SORT_KEYS: &[(&str, &str)] = &[
    ("price_change", "change"),
    ("relative_volume", "relvol"),
    ("volume", "volume"),
    ("avg_volume", "averagevolume"),
    ("price", "price"),
    ("market_cap", "marketcap"),
    ("ticker", "ticker"),
    ("company", "company"),
    ("performance_1w", "perf1w"),
    ("performance_4w", "perf4w"),
    ("eps_surprise", "epssurprise"),
    ("eps_growth_yoy", "epsyoy1"),
    ("eps_growth_this_y", "epsthisy"),
    ("eps_qoq_growth", "epsqoq"),
    ("afterhours_change", "afterchange"),
    ("pe", "pe"),
    ("dividend_yield", "dividendyield"),
    ("rsi", "rsi"),
    ("sma200", "sma200"),
    ("earnings_date", "earningsdate"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_unknown_key_is_error() {
        let err = lookup("moon_phase").unwrap_err();
        assert!(matches!(err, FinvizError::Validation { ref field, .. } if field == "moon_phase"));
    }

    #[test]
    fn test_sector_normalization() {
        let sector = lookup("sector").unwrap();
        assert_eq!(sector.encode("Financial Services").unwrap(), "financial");
        assert_eq!(sector.encode("financial").unwrap(), "financial");
        assert_eq!(sector.encode("basic-materials").unwrap(), "basicmaterials");
        assert_eq!(sector.encode("TECHNOLOGY").unwrap(), "technology");
    }

    #[test]
    fn test_unknown_sector_lists_accepted_set() {
        let sector = lookup("sector").unwrap();
        match sector.encode("made_up_sector").unwrap_err() {
            FinvizError::Validation { field, message } => {
                assert_eq!(field, "sector");
                assert!(message.contains("Technology"));
                assert!(message.contains("Utilities"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_industry_codes_match_normalized_names() {
        for (name, code) in INDUSTRIES.iter().chain(COUNTRIES.iter()) {
            assert_eq!(normalize(name), *code, "{}", name);
        }
        let industry = lookup("industry").unwrap();
        assert_eq!(industry.encode("Software - Application").unwrap(), "softwareapplication");
        assert_eq!(industry.encode("oil & gas e&p").unwrap(), "oilgasep");
    }

    #[test]
    fn test_enumerated_values_are_exact() {
        let cap = lookup("market_cap").unwrap();
        assert_eq!(cap.encode("smallover").unwrap(), "smallover");
        assert!(cap.encode("small over").is_err());

        let earnings = lookup("earnings_date").unwrap();
        assert_eq!(earnings.encode("within_2_weeks").unwrap(), "nextdays5");
        assert_eq!(earnings.encode("today_after").unwrap(), "todayafter");
    }

    #[test]
    fn test_range_entry_rejects_discrete_value() {
        assert!(lookup("price").unwrap().encode("10").is_err());
    }

    #[test]
    fn test_sort_codes() {
        assert_eq!(sort_code("price_change").unwrap(), "change");
        assert_eq!(sort_code("eps_growth_yoy").unwrap(), "epsyoy1");
        assert!(sort_code("vibes").is_err());
    }

    #[test]
    fn test_catalog_keys_unique() {
        let mut keys: Vec<&str> = CATALOG.iter().map(|e| e.key).collect();
        keys.sort();
        let before = keys.len();
        keys.dedup();
        assert_eq!(before, keys.len());
    }
}
