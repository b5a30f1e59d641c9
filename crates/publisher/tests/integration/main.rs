//! Integration tests for the publish orchestrator.
//!
//! Every test runs against scriptable mock relays listening on loopback
//! ports, covering dispatch, the adaptive retry loop, probing and ranking,
//! and post-publish confirmation.


mod adaptive;
mod publish;
