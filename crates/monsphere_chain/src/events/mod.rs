//! # Receipts and Events
//!
//! Transaction receipts as the wallet returns them, plus parsing of the
//! one event the client reacts to (`ForumCreated`).

use alloy_primitives::{Address, Bytes, B256, U256, U64};
use alloy_sol_types::SolEvent;
use serde::{Deserialize, Serialize};

use crate::contracts::IForums;

/// A mined transaction's receipt.
///
/// Only the fields the client reads; the rest of the JSON is ignored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    /// Transaction hash.
    pub transaction_hash: B256,
    /// Block the transaction landed in.
    #[serde(default)]
    pub block_number: Option<U64>,
    /// `1` success, `0` revert. Absent on pre-Byzantium chains.
    #[serde(default)]
    pub status: Option<U64>,
    /// Emitted logs.
    #[serde(default)]
    pub logs: Vec<ReceiptLog>,
}

impl TransactionReceipt {
    /// Returns true unless the receipt reports a revert.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.status.map_or(true, |status| status != U64::ZERO)
    }

    /// Finds the first `ForumCreated` emitted by `forums`.
    #[must_use]
    pub fn forum_created(&self, forums: Address) -> Option<ForumCreated> {
        self.logs
            .iter()
            .filter(|log| log.address == forums)
            .find_map(EventParser::parse_forum_created)
    }
}

/// A raw event log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptLog {
    /// Emitting contract.
    pub address: Address,
    /// Indexed topics; topic 0 is the event signature.
    pub topics: Vec<B256>,
    /// Non-indexed data.
    #[serde(default)]
    pub data: Bytes,
}

/// `ForumCreated` event data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ForumCreated {
    /// New forum id.
    pub forum_id: U256,
    /// Creator.
    pub creator: Address,
}

/// Event parser for raw log data.
///
/// Reads indexed parameters straight from the topics; the non-indexed title
/// is not needed by the client.
pub struct EventParser;

impl EventParser {
    /// Parses a `ForumCreated` event.
    ///
    /// # Returns
    ///
    /// Parsed event or None if the log is a different event.
    #[must_use]
    pub fn parse_forum_created(log: &ReceiptLog) -> Option<ForumCreated> {
        // event sig + forumId + creator = 3
        if log.topics.len() < 3 || log.topics[0] != IForums::ForumCreated::SIGNATURE_HASH {
            return None;
        }

        let forum_id = U256::from_be_slice(log.topics[1].as_slice());
        let creator = Address::from_slice(&log.topics[2][12..32]);

        Some(ForumCreated { forum_id, creator })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forum_created_log(emitter: Address, forum_id: u64) -> ReceiptLog {
        let mut creator = [0u8; 32];
        creator[12..].copy_from_slice(Address::repeat_byte(7).as_slice());
        ReceiptLog {
            address: emitter,
            topics: vec![
                IForums::ForumCreated::SIGNATURE_HASH,
                B256::from(U256::from(forum_id).to_be_bytes::<32>()),
                B256::from(creator),
            ],
            data: Bytes::new(),
        }
    }

    #[test]
    fn test_parse_forum_created() {
        let log = forum_created_log(Address::repeat_byte(1), 42);
        let event = EventParser::parse_forum_created(&log).unwrap();

        assert_eq!(event.forum_id, U256::from(42));
        assert_eq!(event.creator, Address::repeat_byte(7));
    }

    #[test]
    fn test_other_event_ignored() {
        let mut log = forum_created_log(Address::repeat_byte(1), 42);
        log.topics[0] = B256::ZERO;
        assert!(EventParser::parse_forum_created(&log).is_none());
    }

    #[test]
    fn test_receipt_filters_by_emitter() {
        let forums = Address::repeat_byte(1);
        let receipt = TransactionReceipt {
            transaction_hash: B256::ZERO,
            block_number: None,
            status: Some(U64::from(1)),
            logs: vec![
                forum_created_log(Address::repeat_byte(2), 5),
                forum_created_log(forums, 6),
            ],
        };

        assert_eq!(receipt.forum_created(forums).unwrap().forum_id, U256::from(6));
    }

    #[test]
    fn test_receipt_json() {
        let json = serde_json::json!({
            "transactionHash": "0x00000000000000000000000000000000000000000000000000000000000000aa",
            "blockNumber": "0x10",
            "status": "0x0",
            "logs": [],
            "gasUsed": "0x5208"
        });
        let receipt: TransactionReceipt = serde_json::from_value(json).unwrap();

        assert!(!receipt.succeeded());
        assert_eq!(receipt.block_number, Some(U64::from(16)));
    }
}
