//! Fuzz target for untrusted import paths
//!
//! # Strategy
//!
//! - Raw bytes as interchange JSON
//! - Raw bytes as a CBOR exchange snapshot
//!
//! # Invariants
//!
//! - NEVER panic on malformed input
//! - An accepted document rebuilds a ledger with no self-assignment and no
//!   repeated picker or recipient
//! - A rebuilt ledger re-exports to an equivalent ledger

#![no_main]

use std::collections::HashSet;

use libfuzzer_sys::fuzz_target;
use tinsel_core::{ExchangeSnapshot, InterchangeDocument, Ledger};

fuzz_target!(|data: &[u8]| {
    let _ = ExchangeSnapshot::from_cbor(data);

    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(document) = InterchangeDocument::from_json(text) else {
        return;
    };
    let Ok(ledger) = Ledger::from_interchange(&document) else {
        return;
    };

    let mut pickers = HashSet::new();
    let mut recipients = HashSet::new();
    for record in ledger.records() {
        assert_ne!(record.picker().id, record.recipient().id);
        assert!(pickers.insert(&record.picker().id));
        assert!(recipients.insert(&record.recipient().id));
    }

    let generated_at = document.generated_at.unwrap_or_default();
    let reexported = ledger.to_interchange(document.event.clone(), generated_at);
    let again = Ledger::from_interchange(&reexported);
    assert_eq!(again.ok().as_ref(), Some(&ledger));
});
