pub use meshcall_core::model::{ClientId, RoomId};

pub mod model {
    pub use meshcall_core::model::*;
    pub use meshcall_core::utils::*;
}

#[cfg(feature = "client")]
pub mod client {
    pub use meshcall_client::*;
}

#[cfg(feature = "relay")]
pub mod relay {
    pub use meshcall_relay::*;
}
