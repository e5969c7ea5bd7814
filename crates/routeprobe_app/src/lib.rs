mod console;
mod cris;
mod dispatch;
mod fallback;
mod infra;
mod load_balance;
mod quota;
mod reconciler;
mod runner;
mod sharding;

pub use console::*;
pub use cris::*;
pub use dispatch::*;
pub use fallback::*;
pub use infra::*;
pub use load_balance::*;
pub use quota::*;
pub use reconciler::*;
pub use runner::*;
pub use sharding::*;
