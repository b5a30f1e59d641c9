//! Core Nostr types for relaypub.
//!
//! This crate provides:
//! - The signed event structure with canonical serialization, hashing,
//!   Schnorr signing, and verification
//! - Key material handling (hex and bech32 `nsec`/`npub` forms)
//! - The relay wire protocol (EVENT/REQ/CLOSE out, OK/EOSE/NOTICE/... in)
//!
//! Cryptographic primitives are supplied by `secp256k1` and `sha2`; this
//! crate only defines the event canonicalization they operate on.

pub mod event;
pub mod keys;
pub mod message;

pub use event::{
    event_hash, finalize_event, kind_for_change, serialize_event, validate_event,
    validate_unsigned_event, verify_event, Event, EventError, EventTemplate, UnsignedEvent,
    KIND_METADATA, KIND_REPO_BRANCH, KIND_REPO_COMMIT, KIND_REPO_MERGE_REQUEST,
    KIND_SHORT_TEXT_NOTE,
};
pub use keys::{
    generate_secret_key, normalize_public_key, parse_secret_key, public_key, public_key_hex,
    KeyError,
};
pub use message::{ClientMessage, Filter, MessageError, RelayMessage};
