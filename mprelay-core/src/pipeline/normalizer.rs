//! Record normalizer.

use compact_str::CompactString;
use mprelay_sdk::objects::transaction::paths;
use mprelay_sdk::objects::{NormalizedRecord, RawTransaction};

/// Map a provider transaction into the collector record shape.
///
/// Never fails: any field absent from `raw`, including whole nested blocks,
/// comes out as `None`.
pub fn normalize(raw: &RawTransaction, origin: &str) -> NormalizedRecord {
    NormalizedRecord {
        id: raw.id().unwrap_or_default(),
        origin: CompactString::from(origin),
        amount: raw.amount(),
        created_at: raw.text_at(paths::CREATED_AT),
        status: raw.text_at(paths::STATUS),
        operation_type: raw.text_at(paths::OPERATION_TYPE),

        payer_document_number: raw.text_at(paths::PAYER_DOCUMENT_NUMBER),
        payer_email: raw.text_at(paths::PAYER_EMAIL),
        payer_first_name: raw.text_at(paths::PAYER_FIRST_NAME),
        payer_last_name: raw.text_at(paths::PAYER_LAST_NAME),

        bank_transfer_id: raw.text_at(paths::BANK_TRANSFER_ID),
        acquirer_reference: raw.text_at(paths::ACQUIRER_REFERENCE),
        end_to_end_id: raw.text_at(paths::END_TO_END_ID),
        transfer_account_id: raw.text_at(paths::TRANSFER_ACCOUNT_ID),
    }
}
