pub mod telegram_relay;
pub mod traits;

pub use telegram_relay::TelegramRelay;
pub use traits::{DocumentRelay, RelayError};
