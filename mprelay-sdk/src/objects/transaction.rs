//! Provider transaction documents.
//!
//! The payment-search API returns loosely shaped JSON: any nested block may be
//! missing or `null`. [`RawTransaction`] keeps the document as-is and exposes
//! path accessors that resolve to `None` instead of failing when an
//! intermediate level is absent.

use compact_str::{CompactString, ToCompactString};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;
use time::OffsetDateTime;
use time::format_description::well_known::{Iso8601, Rfc3339};

/// Field paths inside a provider transaction document.
pub mod paths {
    pub const ID: &[&str] = &["id"];
    pub const CREATED_AT: &[&str] = &["date_created"];
    pub const AMOUNT: &[&str] = &["transaction_amount"];
    pub const STATUS: &[&str] = &["status"];
    pub const OPERATION_TYPE: &[&str] = &["operation_type"];

    pub const PAYER_DOCUMENT_NUMBER: &[&str] = &["payer", "identification", "number"];
    pub const PAYER_EMAIL: &[&str] = &["payer", "email"];
    pub const PAYER_FIRST_NAME: &[&str] = &["payer", "first_name"];
    pub const PAYER_LAST_NAME: &[&str] = &["payer", "last_name"];

    pub const BANK_TRANSFER_ID: &[&str] = &["transaction_details", "bank_transfer_id"];
    pub const ACQUIRER_REFERENCE: &[&str] = &["transaction_details", "acquirer_reference"];
    pub const END_TO_END_ID: &[&str] = &["point_of_interaction", "transaction_data", "e2e_id"];
    pub const TRANSFER_ACCOUNT_ID: &[&str] = &[
        "point_of_interaction",
        "transaction_data",
        "bank_info",
        "collector",
        "transfer_account_id",
    ];
}

/// A single transaction document as returned by the provider.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawTransaction(Map<String, Value>);

impl RawTransaction {
    /// Wrap a JSON value. Only objects are transaction documents.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    /// The underlying document.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Resolve a path of object keys.
    ///
    /// Returns `None` when any level is missing, `null`, or not an object.
    pub fn get(&self, path: &[&str]) -> Option<&Value> {
        let (first, rest) = path.split_first()?;
        let mut current = self.0.get(*first)?;
        for key in rest {
            current = current.as_object()?.get(*key)?;
        }
        match current {
            Value::Null => None,
            other => Some(other),
        }
    }

    /// Resolve a path to a scalar rendered as text.
    ///
    /// Strings are returned verbatim, numbers and booleans are rendered in
    /// their JSON form. Objects and arrays resolve to `None`.
    pub fn text_at(&self, path: &[&str]) -> Option<String> {
        match self.get(path)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Like [`text_at`](Self::text_at), but empty strings count as absent.
    pub fn non_empty_text_at(&self, path: &[&str]) -> Option<String> {
        self.text_at(path).filter(|s| !s.is_empty())
    }

    /// The provider's transaction id. Numeric ids are rendered in decimal.
    pub fn id(&self) -> Option<CompactString> {
        match self.get(paths::ID)? {
            Value::String(s) if !s.is_empty() => Some(CompactString::from(s.as_str())),
            Value::Number(n) => Some(n.to_compact_string()),
            _ => None,
        }
    }

    /// The creation timestamp exactly as the provider sent it.
    pub fn created_at_raw(&self) -> Option<&str> {
        self.get(paths::CREATED_AT)?.as_str()
    }

    /// The creation timestamp, parsed.
    ///
    /// Accepts RFC 3339 and extended ISO 8601 with an explicit offset. A
    /// timestamp without an offset cannot be ordered against the watermark
    /// and is treated as unparseable.
    pub fn created_at(&self) -> Option<OffsetDateTime> {
        let raw = self.created_at_raw()?;
        OffsetDateTime::parse(raw, &Rfc3339)
            .or_else(|_| OffsetDateTime::parse(raw, &Iso8601::DEFAULT))
            .ok()
    }

    /// The transaction amount.
    pub fn amount(&self) -> Option<Decimal> {
        match self.get(paths::AMOUNT)? {
            Value::Number(n) => {
                let text = n.to_string();
                Decimal::from_str(&text)
                    .or_else(|_| Decimal::from_scientific(&text))
                    .ok()
            }
            Value::String(s) => Decimal::from_str(s).ok(),
            _ => None,
        }
    }

    /// Payer document number, ignoring empty values.
    pub fn payer_document_number(&self) -> Option<String> {
        self.non_empty_text_at(paths::PAYER_DOCUMENT_NUMBER)
    }

    /// Payer email, ignoring empty values.
    pub fn payer_email(&self) -> Option<String> {
        self.non_empty_text_at(paths::PAYER_EMAIL)
    }

    /// Whether the payer can be attributed by document number or email.
    pub fn has_identified_payer(&self) -> bool {
        self.payer_document_number().is_some() || self.payer_email().is_some()
    }
}

impl From<Map<String, Value>> for RawTransaction {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::datetime;

    fn tx(value: Value) -> RawTransaction {
        RawTransaction::from_value(value).unwrap()
    }

    #[test]
    fn test_only_objects_are_documents() {
        assert!(RawTransaction::from_value(json!([1, 2])).is_none());
        assert!(RawTransaction::from_value(json!("x")).is_none());
        assert!(RawTransaction::from_value(json!({})).is_some());
    }

    #[test]
    fn test_path_through_missing_or_null_levels() {
        let t = tx(json!({
            "point_of_interaction": { "transaction_data": null },
            "payer": { "identification": {} }
        }));
        assert_eq!(t.get(paths::END_TO_END_ID), None);
        assert_eq!(t.get(paths::TRANSFER_ACCOUNT_ID), None);
        assert_eq!(t.get(paths::PAYER_DOCUMENT_NUMBER), None);
        assert_eq!(t.get(paths::BANK_TRANSFER_ID), None);
    }

    #[test]
    fn test_path_through_scalar_level() {
        let t = tx(json!({ "payer": "anonymous" }));
        assert_eq!(t.payer_email(), None);
    }

    #[test]
    fn test_numeric_id_and_text() {
        let t = tx(json!({
            "id": 123456789012u64,
            "transaction_details": { "bank_transfer_id": 42 }
        }));
        assert_eq!(t.id().as_deref(), Some("123456789012"));
        assert_eq!(t.text_at(paths::BANK_TRANSFER_ID).as_deref(), Some("42"));
    }

    #[test]
    fn test_missing_or_empty_id() {
        assert_eq!(tx(json!({})).id(), None);
        assert_eq!(tx(json!({ "id": "" })).id(), None);
        assert_eq!(tx(json!({ "id": null })).id(), None);
    }

    #[test]
    fn test_created_at_parsing() {
        let t = tx(json!({ "date_created": "2024-05-01T12:34:56.789-04:00" }));
        assert_eq!(t.created_at(), Some(datetime!(2024-05-01 12:34:56.789 -4)));

        let t = tx(json!({ "date_created": "2024-05-01T16:34:56Z" }));
        assert_eq!(t.created_at(), Some(datetime!(2024-05-01 16:34:56 UTC)));

        let t = tx(json!({ "date_created": "2024-05-01T16:34:56" }));
        assert_eq!(t.created_at(), None);

        let t = tx(json!({ "date_created": "yesterday" }));
        assert_eq!(t.created_at(), None);

        let t = tx(json!({ "date_created": 1714581296 }));
        assert_eq!(t.created_at(), None);
    }

    #[test]
    fn test_amount() {
        assert_eq!(
            tx(json!({ "transaction_amount": 1500.5 })).amount(),
            Some(Decimal::new(15005, 1))
        );
        assert_eq!(
            tx(json!({ "transaction_amount": 200 })).amount(),
            Some(Decimal::from(200))
        );
        assert_eq!(
            tx(json!({ "transaction_amount": "10.25" })).amount(),
            Some(Decimal::new(1025, 2))
        );
        assert_eq!(tx(json!({})).amount(), None);
    }

    #[test]
    fn test_identified_payer() {
        let doc_only = tx(json!({ "payer": { "identification": { "number": "12345678" } } }));
        let email_only = tx(json!({ "payer": { "email": "a@b.com" } }));
        let empty = tx(json!({ "payer": { "email": "", "identification": { "number": "" } } }));
        let none = tx(json!({ "payer": null }));

        assert!(doc_only.has_identified_payer());
        assert!(email_only.has_identified_payer());
        assert!(!empty.has_identified_payer());
        assert!(!none.has_identified_payer());
    }
}
