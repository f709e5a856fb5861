mod alert;
mod snapshot;
mod validator;

pub use alert::*;
pub use snapshot::*;
pub use validator::*;
