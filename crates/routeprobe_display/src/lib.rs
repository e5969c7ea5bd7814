mod account;
mod lines;
mod looping;
mod progress;
mod quota;
mod region;
mod routed;
mod router;
mod table;

pub use account::*;
pub use lines::*;
pub use looping::*;
pub use progress::*;
pub use quota::*;
pub use region::*;
pub use routed::*;
pub use router::*;
pub use table::*;
