use serde::Deserialize;
use serde_json::Value;

use crate::errors::DecodeError;
use crate::models::{CompanyRecord, CompanyWire};

/// Top-level response envelope: `{data: {company: {...}}, error?: string}`.
#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    #[serde(default)]
    data: Option<DataEnvelope>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DataEnvelope {
    #[serde(default)]
    company: Option<Value>,
}

/// Decode one raw payload into a normalized [`CompanyRecord`].
///
/// A missing or null `data.company` wrapper is the only structural failure
/// (the remote returned no entity). Everything inside the company object is
/// optional and defaults per field, so a sparse entity always decodes.
pub fn decode_company(payload: Value) -> Result<CompanyRecord, DecodeError> {
    let envelope: ApiEnvelope = serde_json::from_value(payload)
        .map_err(|e| DecodeError::new(format!("unreadable response envelope: {}", e)))?;

    let remote_error = envelope.error;
    let company = envelope.data.and_then(|d| d.company);

    let company = match company {
        Some(value) if !value.is_null() => value,
        _ => {
            let message = match remote_error {
                Some(err) => format!("no company in response: {}", err),
                None => "no company in response".to_string(),
            };
            return Err(DecodeError::new(message));
        }
    };

    let wire: CompanyWire = serde_json::from_value(company)
        .map_err(|e| DecodeError::new(format!("malformed company object: {}", e)))?;

    Ok(CompanyRecord::from(wire))
}
