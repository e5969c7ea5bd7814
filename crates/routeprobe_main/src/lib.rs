mod cli;
mod logging;
mod run;

pub use cli::*;
pub use logging::*;
pub use run::*;
