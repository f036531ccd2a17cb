//! Bounded duplex endpoint over tokio mpsc channels
//!
//! Single-process transport: messages are passed directly with no
//! serialization overhead, as in any in-process deployment of the server.

use kairos_core::{ChannelError, Message, ProtocolError};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{self, Instant};

/// Which side of the request/reply pair this endpoint plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Sends first, then receives the reply.
    Requester,
    /// Receives first, then owes exactly one reply.
    Responder,
}

/// Outcome of a paired send-then-receive exchange.
///
/// Callers branch on this instead of catching errors: the failing leg and
/// its cause (deadline vs. transport) are what retry policy keys off.
#[derive(Debug)]
pub enum ExchangeOutcome {
    Ok {
        reply: Message,
        /// Time the peer took to answer.
        elapsed: Duration,
    },
    SendTimedOut,
    SendFailed(String),
    ReceiveTimedOut,
    ReceiveFailed(String),
}

impl ExchangeOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, ExchangeOutcome::Ok { .. })
    }

    /// Short label for diagnostics and logs.
    pub fn status_label(&self) -> &'static str {
        match self {
            ExchangeOutcome::Ok { .. } => "ok",
            ExchangeOutcome::SendTimedOut => "send_failed_due_to_timeout",
            ExchangeOutcome::SendFailed(_) => "send_failed_for_other_reason",
            ExchangeOutcome::ReceiveTimedOut => "receive_failed_due_to_timeout",
            ExchangeOutcome::ReceiveFailed(_) => "receive_failed_for_other_reason",
        }
    }
}

/// One endpoint of a duplex, request/reply paired message channel.
#[derive(Debug)]
pub struct BoundedChannel {
    tx: Option<mpsc::Sender<Message>>,
    rx: mpsc::Receiver<Message>,
    role: Role,
    send_timeout: Option<Duration>,
    recv_timeout: Option<Duration>,
    /// Requester: a request is out and awaits its reply.
    /// Responder: a request was taken and a reply is owed.
    in_flight: bool,
}

impl BoundedChannel {
    /// Create a connected requester/responder endpoint pair with unbounded
    /// timeouts on both sides.
    pub fn duplex(capacity: usize) -> (BoundedChannel, BoundedChannel) {
        let (req_tx, rep_rx) = mpsc::channel(capacity);
        let (rep_tx, req_rx) = mpsc::channel(capacity);
        (
            BoundedChannel::new(req_tx, req_rx, Role::Requester),
            BoundedChannel::new(rep_tx, rep_rx, Role::Responder),
        )
    }

    fn new(tx: mpsc::Sender<Message>, rx: mpsc::Receiver<Message>, role: Role) -> Self {
        Self {
            tx: Some(tx),
            rx,
            role,
            send_timeout: None,
            recv_timeout: None,
            in_flight: false,
        }
    }

    /// Configure timeouts. `None` means unbounded; a bounded timeout must
    /// be strictly positive.
    pub fn with_timeouts(
        mut self,
        send: Option<Duration>,
        recv: Option<Duration>,
    ) -> Result<Self, ChannelError> {
        if send.is_some_and(|d| d.is_zero()) || recv.is_some_and(|d| d.is_zero()) {
            return Err(ChannelError::InvalidTimeout);
        }
        self.send_timeout = send;
        self.recv_timeout = recv;
        Ok(self)
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Send one message, honoring the send timeout and the request/reply
    /// turn order.
    pub async fn send(&mut self, message: Message) -> Result<(), ChannelError> {
        let out_of_turn = match self.role {
            Role::Requester => self.in_flight,
            Role::Responder => !self.in_flight,
        };
        if out_of_turn {
            return Err(ProtocolError::OutOfOrderExchange.into());
        }
        let Some(tx) = self.tx.as_ref() else {
            return Err(ChannelError::Transport("endpoint closed".to_string()));
        };
        let sent = match self.send_timeout {
            Some(limit) => time::timeout(limit, tx.send(message))
                .await
                .map_err(|_| ChannelError::TimedOut)?,
            None => tx.send(message).await,
        };
        sent.map_err(|_| ChannelError::Transport("peer endpoint dropped".to_string()))?;
        self.in_flight = self.role == Role::Requester;
        Ok(())
    }

    /// Receive one message, honoring the receive timeout and the turn order.
    pub async fn receive(&mut self) -> Result<Message, ChannelError> {
        let out_of_turn = match self.role {
            Role::Requester => !self.in_flight,
            Role::Responder => self.in_flight,
        };
        if out_of_turn {
            return Err(ProtocolError::OutOfOrderExchange.into());
        }
        let received = match self.recv_timeout {
            Some(limit) => time::timeout(limit, self.rx.recv())
                .await
                .map_err(|_| ChannelError::TimedOut)?,
            None => self.rx.recv().await,
        };
        let message = received
            .ok_or_else(|| ChannelError::Transport("peer endpoint dropped".to_string()))?;
        self.in_flight = self.role == Role::Responder;
        Ok(message)
    }

    /// Send then receive, collapsing both legs into one branchable outcome.
    pub async fn exchange(&mut self, message: Message) -> ExchangeOutcome {
        if let Err(e) = self.send(message).await {
            return match e {
                ChannelError::TimedOut => ExchangeOutcome::SendTimedOut,
                other => ExchangeOutcome::SendFailed(other.to_string()),
            };
        }
        let start = Instant::now();
        match self.receive().await {
            Ok(reply) => ExchangeOutcome::Ok {
                reply,
                elapsed: start.elapsed(),
            },
            Err(ChannelError::TimedOut) => ExchangeOutcome::ReceiveTimedOut,
            Err(other) => ExchangeOutcome::ReceiveFailed(other.to_string()),
        }
    }

    /// Release the endpoint; subsequent operations fail with a transport
    /// error and the peer observes closure.
    pub fn close(&mut self) {
        self.tx = None;
        self.rx.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_request_reply_roundtrip() {
        let (mut requester, mut responder) = BoundedChannel::duplex(4);

        let server = tokio::spawn(async move {
            let request = responder.receive().await.unwrap();
            assert_eq!(request, Message::Ping);
            responder
                .send(Message::Status("pong".to_string()))
                .await
                .unwrap();
        });

        requester.send(Message::Ping).await.unwrap();
        let reply = requester.receive().await.unwrap();
        assert_eq!(reply, Message::Status("pong".to_string()));

        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_out_of_order_send_and_receive() {
        let (mut requester, mut responder) = BoundedChannel::duplex(4);

        // Requester must send before receiving.
        let err = requester.receive().await.unwrap_err();
        assert_eq!(
            err,
            ChannelError::Protocol(ProtocolError::OutOfOrderExchange)
        );

        // Responder must receive before sending.
        let err = responder.send(Message::Ping).await.unwrap_err();
        assert_eq!(
            err,
            ChannelError::Protocol(ProtocolError::OutOfOrderExchange)
        );

        // A second send without an intervening receive is also rejected.
        requester.send(Message::Ping).await.unwrap();
        let err = requester.send(Message::Ping).await.unwrap_err();
        assert_eq!(
            err,
            ChannelError::Protocol(ProtocolError::OutOfOrderExchange)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_receive_times_out() {
        let (requester, _responder) = BoundedChannel::duplex(4);
        let mut requester = requester
            .with_timeouts(None, Some(Duration::from_secs(1)))
            .unwrap();

        requester.send(Message::Ping).await.unwrap();
        let err = requester.receive().await.unwrap_err();
        assert_eq!(err, ChannelError::TimedOut);
    }

    #[tokio::test]
    async fn test_dropped_peer_is_transport_error() {
        let (mut requester, responder) = BoundedChannel::duplex(4);
        drop(responder);

        let err = requester.send(Message::Ping).await.unwrap_err();
        assert!(matches!(err, ChannelError::Transport(_)));
    }

    #[tokio::test]
    async fn test_closed_endpoint_rejects_send() {
        let (mut requester, _responder) = BoundedChannel::duplex(4);
        requester.close();
        let err = requester.send(Message::Ping).await.unwrap_err();
        assert!(matches!(err, ChannelError::Transport(_)));
    }

    #[tokio::test]
    async fn test_zero_timeout_rejected() {
        let (requester, _responder) = BoundedChannel::duplex(4);
        let err = requester
            .with_timeouts(Some(Duration::ZERO), None)
            .unwrap_err();
        assert_eq!(err, ChannelError::InvalidTimeout);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exchange_outcomes() {
        let (mut requester, mut responder) = BoundedChannel::duplex(4);
        requester = requester
            .with_timeouts(Some(Duration::from_secs(1)), Some(Duration::from_secs(1)))
            .unwrap();

        let server = tokio::spawn(async move {
            let _ = responder.receive().await.unwrap();
            responder
                .send(Message::Status("ready".to_string()))
                .await
                .unwrap();
            // Second request is taken but never answered.
            let _ = responder.receive().await.unwrap();
            tokio::time::sleep(Duration::from_secs(10)).await;
        });

        let outcome = requester.exchange(Message::Ping).await;
        assert!(outcome.is_ok());
        assert_eq!(outcome.status_label(), "ok");

        let outcome = requester.exchange(Message::Ping).await;
        assert!(matches!(outcome, ExchangeOutcome::ReceiveTimedOut));
        assert_eq!(outcome.status_label(), "receive_failed_due_to_timeout");

        server.abort();
        let _ = server.await;
    }
}
