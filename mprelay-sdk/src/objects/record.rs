//! The canonical record shape delivered to collectors.

use compact_str::CompactString;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One accepted transaction in the shape collectors consume.
///
/// Every field is always serialized; absent values are sent as `null` so the
/// collector sees a stable set of keys. The serialized key names are the ones
/// the spreadsheet collectors read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub id: CompactString,
    /// Name of the account the transaction was polled from.
    #[serde(rename = "origen")]
    pub origin: CompactString,
    #[serde(rename = "monto", default, with = "rust_decimal::serde::float_option")]
    pub amount: Option<Decimal>,
    /// Provider creation timestamp, verbatim.
    #[serde(rename = "fecha")]
    pub created_at: Option<String>,
    #[serde(rename = "estado")]
    pub status: Option<String>,
    #[serde(rename = "tipo")]
    pub operation_type: Option<String>,

    #[serde(rename = "dni")]
    pub payer_document_number: Option<String>,
    #[serde(rename = "email")]
    pub payer_email: Option<String>,
    #[serde(rename = "nombre")]
    pub payer_first_name: Option<String>,
    #[serde(rename = "apellido")]
    pub payer_last_name: Option<String>,

    pub bank_transfer_id: Option<String>,
    pub acquirer_reference: Option<String>,
    #[serde(rename = "e2e_id")]
    pub end_to_end_id: Option<String>,
    pub transfer_account_id: Option<String>,
}
