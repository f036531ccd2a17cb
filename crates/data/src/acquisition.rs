//! Trial acquisition with bounded, jittered retry

use kairos_channel::{BoundedChannel, ExchangeOutcome};
use kairos_core::{
    ChannelError, DataError, DataStatus, Message, SampleConfig, SampleStats, TrialSample,
};
use rand::Rng;
use std::time::Duration;
use tokio::time;

/// Finite deadline on every data-channel leg; a misbehaving provider must
/// not wedge the session.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(60);

/// How long to keep retrying while the provider reports "not ready".
pub const WAIT_BUDGET: Duration = Duration::from_secs(300);

/// Owns the channel to the data provider and the retry policy around it.
pub struct DataAcquisition {
    channel: BoundedChannel,
    wait_budget: Duration,
}

impl DataAcquisition {
    /// Take ownership of the provider channel, bounding both legs with
    /// [`CONNECT_TIMEOUT`]. The deadline is applied here rather than left
    /// to the caller: every exchange in this module must be finite.
    pub fn new(channel: BoundedChannel) -> Result<Self, ChannelError> {
        let channel =
            channel.with_timeouts(Some(CONNECT_TIMEOUT), Some(CONNECT_TIMEOUT))?;
        Ok(Self {
            channel,
            wait_budget: WAIT_BUDGET,
        })
    }

    /// Override the not-ready wait budget (tests use a short one).
    pub fn with_wait_budget(mut self, budget: Duration) -> Self {
        self.wait_budget = budget;
        self
    }

    /// Liveness probe, run once at session start. Any failure is fatal to
    /// the session: a backtest cannot proceed without data.
    pub async fn ping(&mut self) -> Result<(), DataError> {
        match self.channel.exchange(Message::Ping).await {
            ExchangeOutcome::Ok { reply, elapsed } => {
                log::debug!(
                    "data provider ready in {:.3}s with reply: {:?}",
                    elapsed.as_secs_f64(),
                    reply
                );
                Ok(())
            }
            outcome => Err(DataError::Unreachable(outcome.status_label().to_string())),
        }
    }

    /// Ask the provider for a trial sample until it is ready or the wait
    /// budget elapses.
    ///
    /// A failed exchange is not retried: it indicates a transport or
    /// process problem, not a transient readiness gap. A "not ready" reply
    /// is retried after a uniform [0, 2) second pause until the accumulated
    /// wait exceeds the budget, at which point the provider is told to stop
    /// and the error is session-fatal.
    pub async fn acquire(
        &mut self,
        config: &SampleConfig,
    ) -> Result<(TrialSample, SampleStats, SampleStats), DataError> {
        let mut waited = Duration::ZERO;
        loop {
            let outcome = self
                .channel
                .exchange(Message::GetData {
                    kwargs: config.clone(),
                })
                .await;
            let (reply, elapsed) = match outcome {
                ExchangeOutcome::Ok { reply, elapsed } => (reply, elapsed),
                outcome => {
                    let status = outcome.status_label();
                    log::error!("sampling attempt: data provider unreachable: <{status}>");
                    return Err(DataError::Unreachable(status.to_string()));
                }
            };
            match reply {
                Message::Data(data) => match data.status {
                    DataStatus::Ready { mut sample, stat } => {
                        log::debug!(
                            "data provider responded with data in about {:.3}s",
                            elapsed.as_secs_f64()
                        );
                        let trial_stat = sample.describe();
                        sample.reset();
                        return Ok((sample, trial_stat, stat));
                    }
                    DataStatus::NotReady => {
                        if waited > self.wait_budget {
                            log::error!("failed to assert domain dataset is ready, giving up");
                            self.stop().await;
                            self.channel.close();
                            return Err(DataError::Timeout);
                        }
                        let pause =
                            Duration::from_secs_f64(rand::thread_rng().gen_range(0.0..2.0));
                        time::sleep(pause).await;
                        waited += pause;
                        log::info!(
                            "domain dataset not ready, wait time left: {:4.2}s",
                            (self.wait_budget.saturating_sub(waited)).as_secs_f64()
                        );
                    }
                },
                other => {
                    return Err(DataError::Unreachable(format!(
                        "unexpected reply: {other:?}"
                    )));
                }
            }
        }
    }

    /// Best-effort stop notification, sent when the session gives up
    /// waiting for data or shuts down. Failures are ignored.
    pub async fn stop(&mut self) {
        let outcome = self.channel.exchange(Message::Stop).await;
        log::debug!("data provider stop notification: {}", outcome.status_label());
    }

    /// Release the data channel.
    pub fn close(&mut self) {
        self.channel.close();
    }
}
