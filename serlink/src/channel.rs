//! Channel state and the minimal streaming base the connection controller
//! drives.

pub mod promise;
pub mod serial;
pub mod stream;
pub mod types;

pub use promise::ConnectFuture;
pub use serial::SerialChannel;
pub use stream::StreamCore;
pub use types::{ChannelError, ChannelEvent, ChannelId, ConnectError};
