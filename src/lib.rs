// ABOUTME: GSM modem SMS driver crate: AT channel abstraction, SMS PDU codec and the driver itself
// ABOUTME: Re-exports the driver API for direct use

//! Send and receive SMS through a GSM modem.
//!
//! The crate is split in three layers:
//!
//! * [`channel`] - the [`AtChannel`] trait a modem transport implements
//! * [`pdu`] - the GSM 03.40 codec: TPDUs, PDU mode hex, concatenation
//! * [`driver`] - [`Gsm`], which negotiates the modem's mode and sends and
//!   receives messages over the channel
//!
//! # Example
//!
//! ```rust,no_run
//! use gsm_modem::{AtChannel, CommandOptions, Gsm, GsmConfig, InitOptions};
//!
//! # async fn example<C: AtChannel>(channel: C) -> Result<(), Box<dyn std::error::Error>> {
//! let gsm = Gsm::with_config(channel, GsmConfig::new());
//! gsm.init(&InitOptions::default()).await?;
//!
//! // Long messages are split into concatenated PDUs
//! let text = "A much longer message than fits in one SMS. ".repeat(8);
//! let references = gsm
//!     .send_long_message("+61409894000", &text, &CommandOptions::default())
//!     .await?;
//! println!("sent {} parts", references.len());
//! # Ok(())
//! # }
//! ```

pub mod channel;
pub mod driver;
pub mod pdu;


pub use channel::{
    AtChannel, ChannelError, ChannelResult, CommandOptions, IndicationOptions, InitOptions,
};
pub use driver::{Gsm, GsmConfig, GsmError, GsmResult, Message, MessageRx, Mode, PartialSend, RxEvent};
