// ABOUTME: Inbound SMS reception: +CMT indication registration and the task that services it
// ABOUTME: Each indication is unmarshalled, acknowledged, reassembled and decoded onto message and error queues

use crate::channel::{AtChannel, CommandOptions, IndicationOptions};
use crate::driver::config::Mode;
use crate::driver::error::{GsmError, GsmResult};
use crate::driver::modem::Gsm;
use crate::driver::response::unmarshal_tpdu;
use crate::pdu::{Collector, decode};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

/// Prefix of the unsolicited SMS-DELIVER indication
pub const CMT_PREFIX: &str = "+CMT:";

/// A received, fully reassembled SMS
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Originating address, `+` prefixed when international
    pub number: String,
    pub text: String,
}

#[derive(Debug)]
pub enum RxEvent {
    Message(Message),
    Error(GsmError),
}

/// Handle to an active receive session
///
/// Both queues close once [`Gsm::stop_message_rx`] has been called and the
/// indications already delivered have been processed.
#[derive(Debug)]
pub struct MessageRx {
    pub messages: mpsc::UnboundedReceiver<Message>,
    pub errors: mpsc::UnboundedReceiver<GsmError>,
    task: JoinHandle<()>,
}

impl MessageRx {
    pub async fn recv_message(&mut self) -> Option<Message> {
        self.messages.recv().await
    }

    pub async fn recv_error(&mut self) -> Option<GsmError> {
        self.errors.recv().await
    }

    /// Waits for the next message or error, returning `None` once both
    /// queues are closed and drained
    pub async fn recv(&mut self) -> Option<RxEvent> {
        tokio::select! {
            Some(message) = self.messages.recv() => Some(RxEvent::Message(message)),
            Some(error) = self.errors.recv() => Some(RxEvent::Error(error)),
            else => None,
        }
    }

    /// True once the receive task has exited
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub fn into_parts(
        self,
    ) -> (
        mpsc::UnboundedReceiver<Message>,
        mpsc::UnboundedReceiver<GsmError>,
    ) {
        (self.messages, self.errors)
    }
}

impl<C: AtChannel> Gsm<C> {
    /// Starts forwarding received SMS-DELIVERs from the modem
    ///
    /// Registers for `+CMT` indications and enables them with `+CNMI`.
    /// Concatenated messages are reassembled before being queued. Errors
    /// found while receiving are queued on [`MessageRx::errors`] and do not
    /// stop reception. Needs PDU mode.
    pub async fn start_message_rx(&self) -> GsmResult<MessageRx> {
        if self.config.mode() != Mode::Pdu {
            return Err(GsmError::WrongMode);
        }
        let notifications = self
            .channel
            .add_indication(CMT_PREFIX, IndicationOptions::new().with_trailing_lines(1))?;

        // route SMS-DELIVERs to us as +CMT, acknowledged with +CNMA
        let enable = self
            .channel
            .command("+CNMI=1,2,0,0,0", &CommandOptions::default())
            .await;
        if let Err(e) = enable {
            self.channel.cancel_indication(CMT_PREFIX);
            return Err(e.into());
        }

        let (message_tx, messages) = mpsc::unbounded_channel();
        let (error_tx, errors) = mpsc::unbounded_channel();
        let collector = match self.config.reassembly_timeout() {
            Some(timeout) => Collector::with_timeout(timeout),
            None => Collector::new(),
        };
        let bridge = Bridge {
            channel: Arc::clone(&self.channel),
            collector,
            report_ack_errors: self.config.report_ack_errors(),
            messages: message_tx,
            errors: error_tx,
        };
        let task = tokio::spawn(bridge.run(notifications));
        debug!("SMS reception started");
        Ok(MessageRx {
            messages,
            errors,
            task,
        })
    }

    /// Stops SMS reception
    ///
    /// Disabling indications on the modem is best effort; the registration is
    /// always removed.
    pub async fn stop_message_rx(&self) {
        let disable = self
            .channel
            .command("+CNMI=0,0,0,0,0", &CommandOptions::default())
            .await;
        if let Err(e) = disable {
            warn!(error = %e, "Failed to disable SMS indications");
        }
        self.channel.cancel_indication(CMT_PREFIX);
        debug!("SMS reception stopped");
    }
}

/// Services `+CMT` indications for one receive session
struct Bridge<C> {
    channel: Arc<C>,
    collector: Collector,
    report_ack_errors: bool,
    messages: mpsc::UnboundedSender<Message>,
    errors: mpsc::UnboundedSender<GsmError>,
}

impl<C: AtChannel> Bridge<C> {
    async fn run(mut self, mut notifications: mpsc::UnboundedReceiver<Vec<String>>) {
        while let Some(lines) = notifications.recv().await {
            self.handle(&lines).await;
        }
        debug!(
            pending = self.collector.pending(),
            "SMS indications closed, receive task exiting"
        );
    }

    async fn handle(&mut self, lines: &[String]) {
        trace!(?lines, "SMS indication");
        let tpdu = match unmarshal_tpdu(lines) {
            Ok(tpdu) => tpdu,
            Err(e) => return self.report(e),
        };

        let ack = self.channel.command("+CNMA", &CommandOptions::default()).await;
        if let Err(e) = ack {
            if self.report_ack_errors {
                self.report(e.into());
            } else {
                warn!(error = %e, "Failed to acknowledge SMS");
            }
        }

        for expired in self.collector.expire(Instant::now()) {
            self.report(expired.into());
        }
        let parts = match self.collector.collect(tpdu) {
            Ok(Some(parts)) => parts,
            Ok(None) => return,
            Err(e) => return self.report(e.into()),
        };
        let number = parts
            .first()
            .map(|tpdu| tpdu.address.to_string())
            .unwrap_or_default();
        match decode(&parts) {
            Ok(text) => {
                debug!(%number, parts = parts.len(), "SMS received");
                if self.messages.send(Message { number, text }).is_err() {
                    trace!("Message queue closed, dropping SMS");
                }
            }
            Err(e) => self.report(e.into()),
        }
    }

    fn report(&self, error: GsmError) {
        debug!(%error, "SMS receive error");
        if self.errors.send(error).is_err() {
            trace!("Error queue closed, dropping error");
        }
    }
}
