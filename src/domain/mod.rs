mod account;
mod money;
mod statement;
mod transaction;
mod validation;

pub use account::*;
pub use money::*;
pub use statement::*;
pub use transaction::*;
pub use validation::*;
