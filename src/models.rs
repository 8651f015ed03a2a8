use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::errors::FetchErrorKind;

/// Sentinel for firmographic identity fields the remote never returned.
pub const NOT_FOUND: &str = "None found";
/// Sentinel for every other optional string field.
pub const NOT_AVAILABLE: &str = "Not Available";

// ============ Identifier ============

/// External key used to request one entity from the remote API.
///
/// The endpoint accepts and returns identifiers as either JSON numbers or
/// strings; internally a string consisting of an integer literal is coerced
/// to the numeric variant, everything else stays textual. Coercion is total
/// and never fails.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identifier {
    Numeric(i64),
    Text(String),
}

impl Identifier {
    /// Coerce a raw string into the internal representation.
    ///
    /// `"42"` becomes `Numeric(42)`, `"abc"` stays `Text("abc")`.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.parse::<i64>() {
            Ok(n) => Identifier::Numeric(n),
            Err(_) => Identifier::Text(trimmed.to_string()),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Identifier::Text(s) => Some(s),
            Identifier::Numeric(_) => None,
        }
    }
}

impl Default for Identifier {
    fn default() -> Self {
        Identifier::Numeric(0)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Numeric(n) => write!(f, "{}", n),
            Identifier::Text(s) => write!(f, "{}", s),
        }
    }
}

impl Serialize for Identifier {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Identifier::Numeric(n) => serializer.serialize_i64(*n),
            Identifier::Text(s) => serializer.serialize_str(s),
        }
    }
}

impl<'de> Deserialize<'de> for Identifier {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        match value {
            serde_json::Value::Null => Ok(Identifier::default()),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Ok(Identifier::Numeric(i)),
                // Floats and out-of-range numbers keep their textual form.
                None => Ok(Identifier::Text(n.to_string())),
            },
            serde_json::Value::String(s) => Ok(Identifier::parse(&s)),
            other => Err(serde::de::Error::custom(format!(
                "identifier must be a number or string, got {}",
                other
            ))),
        }
    }
}

// ============ Serde defaulting helpers ============
//
// A null wire value and an absent key must both land on the documented
// default, independently at every nesting level. `#[serde(default = ...)]`
// covers the absent key; these `deserialize_with` helpers cover explicit
// nulls.

pub(crate) fn none_found() -> String {
    NOT_FOUND.to_string()
}

pub(crate) fn not_available() -> String {
    NOT_AVAILABLE.to_string()
}

pub(crate) fn null_to_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

pub(crate) fn null_to_none_found<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(none_found))
}

pub(crate) fn null_to_not_available<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(not_available))
}

fn default_security_ratings() -> Vec<SecurityRating> {
    vec![SecurityRating::default()]
}

fn null_to_default_ratings<'de, D>(deserializer: D) -> Result<Vec<SecurityRating>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<SecurityRating>>::deserialize(deserializer)?
        .unwrap_or_else(default_security_ratings))
}

// ============ Credit score ============

/// Innermost credit rating pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentCreditRating {
    #[serde(
        alias = "commonValue",
        default = "not_available",
        deserialize_with = "null_to_not_available"
    )]
    pub value: String,
    #[serde(
        alias = "commonDescription",
        default = "not_available",
        deserialize_with = "null_to_not_available"
    )]
    pub description: String,
}

impl Default for CurrentCreditRating {
    fn default() -> Self {
        Self {
            value: not_available(),
            description: not_available(),
        }
    }
}

/// Credit score wrapper. A null wrapper decodes to a fully-defaulted rating,
/// never to a null nested object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreditScore {
    #[serde(
        alias = "currentCreditRating",
        default,
        deserialize_with = "null_to_default"
    )]
    pub current_rating: CurrentCreditRating,
}

// ============ Compliance profile ============

/// Closed vocabulary of dataset codes the compliance feed can carry.
#[allow(dead_code)]
pub const DATASET_CODES: [&str; 9] = [
    "RRE",
    "REL",
    "SOE",
    "POI",
    "INS",
    "SAN-CURRENT",
    "SAN-FORMER",
    "PEP-FORMER",
    "PEP-CURRENT",
];

/// Derived booleans, one per monitored dataset code.
///
/// `INS` is part of the vocabulary but not monitored, so there are eight
/// flags for nine codes. Flags are a pure function of the dataset list; the
/// decoder computes them once at construction and nothing else can set them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ComplianceFlags {
    pub adverse_media: bool,
    pub enforcements: bool,
    pub state_owned: bool,
    pub persons_of_interest: bool,
    pub current_sanctions: bool,
    pub former_sanctions: bool,
    pub current_peps: bool,
    pub former_peps: bool,
}

impl ComplianceFlags {
    /// Compute all eight flags as `code present in list`.
    pub fn from_datasets(datasets: &[String]) -> Self {
        let has = |code: &str| datasets.iter().any(|d| d == code);
        Self {
            adverse_media: has("RRE"),
            enforcements: has("REL"),
            state_owned: has("SOE"),
            persons_of_interest: has("POI"),
            current_sanctions: has("SAN-CURRENT"),
            former_sanctions: has("SAN-FORMER"),
            current_peps: has("PEP-CURRENT"),
            former_peps: has("PEP-FORMER"),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ComplianceWire {
    #[serde(alias = "datasets", default, deserialize_with = "null_to_default")]
    datasets: Vec<String>,
}

/// Compliance summary: the dataset-code list plus the derived flags.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "ComplianceWire")]
pub struct ComplianceProfile {
    pub datasets: Vec<String>,
    #[serde(flatten)]
    pub flags: ComplianceFlags,
}

impl ComplianceProfile {
    /// Build a profile from a dataset list, deriving the flags.
    pub fn from_datasets(datasets: Vec<String>) -> Self {
        let flags = ComplianceFlags::from_datasets(&datasets);
        Self { datasets, flags }
    }
}

impl From<ComplianceWire> for ComplianceProfile {
    fn from(wire: ComplianceWire) -> Self {
        ComplianceProfile::from_datasets(wire.datasets)
    }
}

// ============ Security ratings ============

/// One entry of the security-rating history, newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityRating {
    #[serde(default, deserialize_with = "null_to_default")]
    pub score: f64,
    #[serde(
        default = "not_available",
        deserialize_with = "null_to_not_available"
    )]
    pub grade: String,
    #[serde(
        default = "not_available",
        deserialize_with = "null_to_not_available"
    )]
    pub datetime: String,
}

impl Default for SecurityRating {
    fn default() -> Self {
        Self {
            score: 0.0,
            grade: not_available(),
            datetime: not_available(),
        }
    }
}

/// Latest-entry convenience fields for downstream flattening.
///
/// The history is ordered newest first, so "latest" is the first entry; the
/// list is never empty after defaulting.
pub fn latest_rating_fields(ratings: &[SecurityRating]) -> (String, String) {
    match ratings.first() {
        Some(r) => (r.grade.clone(), r.datetime.clone()),
        None => (not_available(), not_available()),
    }
}

// ============ Financial ratios ============

/// One ratio snapshot, tagged with its reporting period.
///
/// An empty snapshot list is a valid value (entity reported no financials),
/// distinct from a decode failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatioSnapshot {
    #[serde(
        alias = "reportingPeriod",
        default = "not_available",
        deserialize_with = "null_to_not_available"
    )]
    pub period: String,
    #[serde(
        alias = "currencyCode",
        default = "not_available",
        deserialize_with = "null_to_not_available"
    )]
    pub currency: String,
    #[serde(
        alias = "currentRatio",
        default,
        deserialize_with = "null_to_default"
    )]
    pub current_ratio: f64,
    #[serde(alias = "quickRatio", default, deserialize_with = "null_to_default")]
    pub quick_ratio: f64,
    #[serde(
        alias = "debtToEquity",
        default,
        deserialize_with = "null_to_default"
    )]
    pub debt_to_equity: f64,
    #[serde(
        alias = "grossMargin",
        default,
        deserialize_with = "null_to_default"
    )]
    pub gross_margin: f64,
}

impl Default for RatioSnapshot {
    fn default() -> Self {
        Self {
            period: not_available(),
            currency: not_available(),
            current_ratio: 0.0,
            quick_ratio: 0.0,
            debt_to_equity: 0.0,
            gross_margin: 0.0,
        }
    }
}

// ============ Company record ============

/// The normalized company record.
///
/// Every field carries its documented default after decoding; no field is
/// ever null, at any nesting level. Constructed only by the decoder and
/// immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyRecord {
    pub id: Identifier,
    pub duns: String,
    pub display_name: String,
    pub country_of_registration: String,
    pub homepage: String,
    pub short_description: String,
    pub company_type: String,
    pub credit_score: CreditScore,
    pub compliance: ComplianceProfile,
    pub security_ratings: Vec<SecurityRating>,
    /// Grade of the newest security rating, flattened for the sink.
    pub latest_security_grade: String,
    /// Timestamp of the newest security rating, flattened for the sink.
    pub latest_security_date: String,
    pub financial_ratios: Vec<RatioSnapshot>,
}

impl Default for CompanyRecord {
    fn default() -> Self {
        let security_ratings = default_security_ratings();
        let (latest_security_grade, latest_security_date) =
            latest_rating_fields(&security_ratings);
        Self {
            id: Identifier::default(),
            duns: none_found(),
            display_name: none_found(),
            country_of_registration: none_found(),
            homepage: none_found(),
            short_description: none_found(),
            company_type: none_found(),
            credit_score: CreditScore::default(),
            compliance: ComplianceProfile::default(),
            security_ratings,
            latest_security_grade,
            latest_security_date,
            financial_ratios: Vec::new(),
        }
    }
}

// Keep the serde attribute table in one place: the record itself doubles as
// the wire shape for the company object, with the derived latest_* fields
// recomputed by the decoder after deserialization.
pub(crate) use self::wire_attrs::CompanyWire;

mod wire_attrs {
    use super::*;

    /// Wire-side company object: external field names, null-to-default at
    /// this level; nested levels default themselves recursively.
    #[derive(Debug, Clone, Deserialize)]
    pub(crate) struct CompanyWire {
        #[serde(default, deserialize_with = "null_to_default")]
        pub id: Identifier,
        #[serde(default = "none_found", deserialize_with = "null_to_none_found")]
        pub duns: String,
        #[serde(
            alias = "displayName",
            default = "none_found",
            deserialize_with = "null_to_none_found"
        )]
        pub display_name: String,
        #[serde(
            alias = "countryOfRegistration",
            default = "none_found",
            deserialize_with = "null_to_none_found"
        )]
        pub country_of_registration: String,
        #[serde(default = "none_found", deserialize_with = "null_to_none_found")]
        pub homepage: String,
        #[serde(
            alias = "shortDescription",
            default = "none_found",
            deserialize_with = "null_to_none_found"
        )]
        pub short_description: String,
        #[serde(
            alias = "companyType",
            default = "none_found",
            deserialize_with = "null_to_none_found"
        )]
        pub company_type: String,
        #[serde(
            alias = "creditScore",
            default,
            deserialize_with = "null_to_default"
        )]
        pub credit_score: CreditScore,
        #[serde(
            alias = "complianceData",
            default,
            deserialize_with = "null_to_default"
        )]
        pub compliance: ComplianceProfile,
        #[serde(
            alias = "securityRatings",
            default = "default_security_ratings",
            deserialize_with = "null_to_default_ratings"
        )]
        pub security_ratings: Vec<SecurityRating>,
        #[serde(
            alias = "financialRatios",
            default,
            deserialize_with = "null_to_default"
        )]
        pub financial_ratios: Vec<RatioSnapshot>,
    }

    impl From<CompanyWire> for CompanyRecord {
        fn from(wire: CompanyWire) -> Self {
            let (latest_security_grade, latest_security_date) =
                latest_rating_fields(&wire.security_ratings);
            CompanyRecord {
                id: wire.id,
                duns: wire.duns,
                display_name: wire.display_name,
                country_of_registration: wire.country_of_registration,
                homepage: wire.homepage,
                short_description: wire.short_description,
                company_type: wire.company_type,
                credit_score: wire.credit_score,
                compliance: wire.compliance,
                security_ratings: wire.security_ratings,
                latest_security_grade,
                latest_security_date,
                financial_ratios: wire.financial_ratios,
            }
        }
    }
}

// ============ Fetch outcome ============

/// Tagged per-identifier result. One outcome per input identifier; output
/// order matches input order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FetchOutcome {
    Success(CompanyRecord),
    Failure {
        id: Identifier,
        kind: FetchErrorKind,
        message: String,
    },
}

impl FetchOutcome {
    pub fn failure(id: Identifier, kind: FetchErrorKind, message: impl Into<String>) -> Self {
        FetchOutcome::Failure {
            id,
            kind,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success(_))
    }

    pub fn is_failure(&self) -> bool {
        !self.is_success()
    }

    /// The record, discarding failure detail.
    pub fn into_record(self) -> Option<CompanyRecord> {
        match self {
            FetchOutcome::Success(record) => Some(record),
            FetchOutcome::Failure { .. } => None,
        }
    }

    pub fn record(&self) -> Option<&CompanyRecord> {
        match self {
            FetchOutcome::Success(record) => Some(record),
            FetchOutcome::Failure { .. } => None,
        }
    }
}
