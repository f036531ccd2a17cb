//! Session control loop
//!
//! The outer two-mode state machine. A session blocks in control mode
//! until `reset` (enter episode mode) or `stop` (terminate); `getstat`
//! and `render` are answered in place. Strict request/reply alternation:
//! exactly one reply per controller request, always.

use crate::config::SessionConfig;
use crate::episode::{CachedTrial, EpisodeRunner};
use crate::error::SessionError;
use kairos_channel::BoundedChannel;
use kairos_core::{EpisodeResult, Message};
use kairos_data::DataAcquisition;
use kairos_ports::{Engine, Observer, Renderer};

/// One coordination-core session: owns the controller channel, the data
/// client, the engine template and the renderer for its whole lifetime.
pub struct Session<E: Engine + Clone, R: Renderer> {
    config: SessionConfig,
    channel: BoundedChannel,
    data: DataAcquisition,
    engine: E,
    renderer: R,
    /// Explicit episode counter, incremented after each completed episode.
    /// No upper bound is enforced here; bounding is external policy.
    episode_number: u64,
    episode_result: EpisodeResult,
    trial: Option<CachedTrial>,
    aux_observers: Vec<Observer>,
}

impl<E: Engine + Clone, R: Renderer> Session<E, R> {
    pub fn new(
        config: SessionConfig,
        channel: BoundedChannel,
        data: DataAcquisition,
        engine: E,
        renderer: R,
    ) -> Self {
        // DrawDown is mandatory; plotting observers only pay off when
        // rendering is enabled.
        let aux_observers = if renderer.enabled() {
            vec![
                Observer::DrawDown,
                Observer::NormPnl,
                Observer::Position,
                Observer::Reward,
            ]
        } else {
            vec![Observer::DrawDown]
        };
        Self {
            config,
            channel,
            data,
            engine,
            renderer,
            episode_number: 0,
            episode_result: EpisodeResult::default(),
            trial: None,
            aux_observers,
        }
    }

    /// Session runtime body. Returns on `stop`; any error is session-fatal
    /// and is logged with the session identity before resources are
    /// released.
    pub async fn run(mut self) -> Result<(), SessionError> {
        let session_id = self.config.session_id;
        let task = self.config.task;
        log::info!("session {session_id} (task {task}): starting");

        match self.run_loop().await {
            Ok(()) => {
                log::info!("session {session_id} (task {task}): exiting");
                Ok(())
            }
            Err(e) => {
                log::error!("session {session_id} (task {task}): fatal: {e}");
                // Attempt to notify the data provider, then release both
                // channels; the controller observes closure.
                self.data.stop().await;
                self.data.close();
                self.channel.close();
                Err(e)
            }
        }
    }

    async fn run_loop(&mut self) -> Result<(), SessionError> {
        // The data provider must be alive before any episode can run.
        self.data.ping().await?;

        // Control mode loop; only `reset` and `stop` cause a state exit.
        loop {
            let request = self.channel.receive().await?;
            log::debug!("control mode: received {request:?}");

            match request {
                Message::Stop => {
                    self.channel
                        .send(Message::Status("exiting".to_string()))
                        .await?;
                    self.data.stop().await;
                    self.data.close();
                    self.channel.close();
                    return Ok(());
                }
                Message::Reset { kwargs } => {
                    self.channel
                        .send(Message::Status(format!(
                            "preparing new episode with kwargs: {kwargs:?}"
                        )))
                        .await?;

                    let result = EpisodeRunner {
                        channel: &mut self.channel,
                        renderer: &mut self.renderer,
                        data: &mut self.data,
                        trial: &mut self.trial,
                        aux_observers: &self.aux_observers,
                        skip_frame: self.config.skip_frame,
                        episode_number: self.episode_number,
                    }
                    .run(&self.engine, &kwargs)
                    .await?;

                    self.episode_result = result;
                    self.episode_number += 1;
                }
                Message::GetStat => {
                    self.channel
                        .send(Message::Stat(self.episode_result.clone()))
                        .await?;
                    log::debug!("episode statistic sent");
                }
                Message::Render { modes } => {
                    let payload = self.renderer.render(&modes, None, true);
                    self.channel.send(Message::Rendered(payload)).await?;
                    log::debug!("episode rendering for {modes:?} sent");
                }
                Message::Action(_) => {
                    // No control command at all; hint at the likely cause.
                    self.channel
                        .send(Message::Status(
                            "no <ctrl> key received, hint: forgot to call reset()?".to_string(),
                        ))
                        .await?;
                }
                other => {
                    log::debug!("control mode: ignoring {other:?}");
                    self.channel.send(Message::usage_hint()).await?;
                }
            }
        }
    }
}
