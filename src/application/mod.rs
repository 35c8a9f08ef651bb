// Application layer: the account service and its error taxonomy.
// Transport adapters (CLI, HTTP) only ever talk to `AccountService`.

pub mod error;
mod service;

pub use error::*;
pub use service::*;
