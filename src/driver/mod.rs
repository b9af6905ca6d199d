// ABOUTME: GSM modem driver sending and receiving SMS over an AT command channel
// ABOUTME: Exports the driver, its configuration, error types and response parsers

//! GSM driver
//!
//! [`Gsm`] layers SMS on top of any [`AtChannel`](crate::channel::AtChannel):
//!
//! * **Negotiation** - `init` checks `+GCAP` for `+CGSM` and selects PDU or text mode
//! * **Sending** - single PDUs, text mode messages, or long messages split into
//!   concatenated PDUs sent one at a time
//! * **Receiving** - `+CMT` indications are acknowledged, reassembled and decoded
//!   onto queues by a background task
//!
//! ## Example
//!
//! ```rust,no_run
//! use gsm_modem::channel::{AtChannel, CommandOptions, InitOptions};
//! use gsm_modem::driver::{Gsm, GsmConfig, RxEvent};
//!
//! # async fn example<C: AtChannel>(channel: C) -> Result<(), Box<dyn std::error::Error>> {
//! let gsm = Gsm::with_config(channel, GsmConfig::new());
//! gsm.init(&InitOptions::default()).await?;
//!
//! let reference = gsm
//!     .send_short_message("+61409894000", "Hello!", &CommandOptions::default())
//!     .await?;
//! println!("sent as {reference}");
//!
//! let mut rx = gsm.start_message_rx().await?;
//! while let Some(event) = rx.recv().await {
//!     match event {
//!         RxEvent::Message(m) => println!("{}: {}", m.number, m.text),
//!         RxEvent::Error(e) => eprintln!("receive error: {e}"),
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod modem;
mod receive;
mod response;

pub use config::{GsmConfig, Mode};
pub use error::{GsmError, GsmResult, PartialSend};
pub use modem::Gsm;
pub use receive::{CMT_PREFIX, Message, MessageRx, RxEvent};
pub use response::{has_prefix, parse_capabilities, parse_message_reference, trim_prefix, unmarshal_tpdu};
