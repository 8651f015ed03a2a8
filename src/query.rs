use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::errors::{AppError, ResultExt};

/// Which company field the single query variable binds to.
///
/// The remote schema accepts a lookup by internal id, registry id (DUNS) or
/// registered domain name; the variable name in the document stays `$id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierBinding {
    InternalId,
    RegistryId,
    DomainName,
}

impl IdentifierBinding {
    /// Field name used both in the query document and the variables object.
    pub fn key(&self) -> &'static str {
        match self {
            IdentifierBinding::InternalId => "id",
            IdentifierBinding::RegistryId => "duns",
            IdentifierBinding::DomainName => "domain",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, AppError> {
        match raw {
            "id" => Ok(IdentifierBinding::InternalId),
            "duns" => Ok(IdentifierBinding::RegistryId),
            "domain" => Ok(IdentifierBinding::DomainName),
            other => Err(AppError::Config(format!(
                "ID_BINDING must be one of id, duns, domain (got '{}')",
                other
            ))),
        }
    }
}

impl fmt::Display for IdentifierBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// One GraphQL fragment: its definition plus the spread that pulls it into
/// the company selection set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fragment {
    pub name: String,
    pub definition: String,
    pub spread: String,
}

/// The fragment table a query document is assembled from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fragments {
    pub fragments: Vec<Fragment>,
}

impl Fragments {
    /// Load a fragment table from a JSON file.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Fragments, AppError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(AppError::Io)
            .context(format!("reading fragment file {}", path.display()))?;
        let fragments: Fragments = serde_json::from_str(&raw).map_err(|e| {
            AppError::BadInput(format!("fragment file {}: {}", path.display(), e))
        })?;
        if fragments.fragments.is_empty() {
            return Err(AppError::BadInput(format!(
                "fragment file {} contains no fragments",
                path.display()
            )));
        }
        Ok(fragments)
    }

    /// Built-in fragment set covering the full company profile.
    pub fn company_profile() -> Fragments {
        fn fragment(name: &str, definition: &str) -> Fragment {
            Fragment {
                name: name.to_string(),
                definition: definition.to_string(),
                spread: format!("...{}", name),
            }
        }

        Fragments {
            fragments: vec![
                fragment(
                    "Firmographics",
                    "fragment Firmographics on Company { id duns displayName \
                     countryOfRegistration homepage shortDescription companyType }",
                ),
                fragment(
                    "CreditScore",
                    "fragment CreditScore on Company { creditScore { \
                     currentCreditRating { commonValue commonDescription } } }",
                ),
                fragment(
                    "ComplianceData",
                    "fragment ComplianceData on Company { complianceData { datasets } }",
                ),
                fragment(
                    "SecurityRatings",
                    "fragment SecurityRatings on Company { securityRatings { \
                     score grade datetime } }",
                ),
                fragment(
                    "FinancialRatios",
                    "fragment FinancialRatios on Company { financialRatios { \
                     reportingPeriod currencyCode currentRatio quickRatio \
                     debtToEquity grossMargin } }",
                ),
            ],
        }
    }
}

/// Assemble the query document: fragment definitions followed by a `company`
/// query spreading every fragment, looked up by the bound field.
pub fn build_query(fragments: &Fragments, binding: IdentifierBinding) -> String {
    let definitions = fragments
        .fragments
        .iter()
        .map(|f| f.definition.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    let spreads = fragments
        .fragments
        .iter()
        .map(|f| f.spread.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    format!(
        "{} query company ($id: ID!) {{ company({}: $id) {{ {} }} }}",
        definitions,
        binding.key(),
        spreads
    )
}
