mod call_client;
mod handle_command_impl;
mod handle_signal_impl;
#[allow(clippy::module_inception)]
mod session;
mod session_actor;
mod session_command;
mod session_event;

pub use call_client::*;
pub use session::*;
pub use session_event::*;
