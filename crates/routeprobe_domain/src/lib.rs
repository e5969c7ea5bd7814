mod console;
mod error;
mod error_kind;
mod identity;
mod partition;
mod probe;
mod reconcile;
mod route;
mod summary;
mod totals;

pub use console::*;
pub use error::*;
pub use error_kind::*;
pub use identity::*;
pub use partition::*;
pub use probe::*;
pub use reconcile::*;
pub use route::*;
pub use summary::*;
pub use totals::*;
