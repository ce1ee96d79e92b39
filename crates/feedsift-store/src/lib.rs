//! Durable persistence for the corpus and the delivery ledger.
//!
//! Everything lives in a remote HTTP object store: the corpus as a CSV
//! object written through a resumable chunked upload, the delivery ledger
//! as a newline-delimited identity set, and the reference vectors as a JSON
//! object read once per run. Object replacement is atomic on the server
//! side, so readers always observe either the prior or the new snapshot.

pub mod codec;
pub mod corpus;
pub mod error;
pub mod ledger;
pub mod object;

pub use corpus::CorpusStore;
pub use error::StoreError;
pub use ledger::DeliveryLedger;
pub use object::ObjectStore;
