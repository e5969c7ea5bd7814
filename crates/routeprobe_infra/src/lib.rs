mod aws;
mod bedrock;
mod console;
mod identity;
mod logs;
#[cfg(test)]
mod mock_server;
mod proxy;
mod routeprobe_infra;

pub use console::*;
pub use routeprobe_infra::*;
