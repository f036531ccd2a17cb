//! Per-tick step exchange
//!
//! [`StepExchange`] is the hook the engine invokes once per simulation
//! tick; it is the point where engine time and controller time
//! synchronize. Communication is gated to every `skip_frame`-th tick (and
//! to terminal ticks) so the controller can operate at a coarser cadence
//! than the engine's internal stepping; free-running ticks still collect
//! info records, so no intermediate information is lost.
//!
//! All handles are injected at construction, never discovered from
//! ambient context.

use async_trait::async_trait;
use kairos_channel::BoundedChannel;
use kairos_core::{Action, InfoRecord, Message, ProtocolError, RenderMode, StepReply, StepSnapshot};
use kairos_ports::{HookError, Renderer, TickHook, TickView};

/// Per-tick protocol hook wired into one episode's engine copy.
pub struct StepExchange<'a, R: Renderer> {
    channel: &'a mut BoundedChannel,
    renderer: &'a mut R,
    skip_frame: u64,
    tick: u64,
    info_batch: Vec<InfoRecord>,
    /// Backed-up communicated step. Under skip-frame, rendering from live
    /// engine state would show the agent a future it has not observed yet.
    snapshot: Option<StepSnapshot>,
    last_action: Action,
    /// Everything except the episode view, rendered (not transmitted) on
    /// early stop.
    render_at_stop: Vec<RenderMode>,
}

impl<'a, R: Renderer> StepExchange<'a, R> {
    pub fn new(channel: &'a mut BoundedChannel, renderer: &'a mut R, skip_frame: u64) -> Self {
        let render_at_stop = renderer
            .modes()
            .into_iter()
            .filter(|mode| *mode != RenderMode::Episode)
            .collect();
        Self {
            channel,
            renderer,
            skip_frame: skip_frame.max(1),
            tick: 0,
            info_batch: Vec::new(),
            snapshot: None,
            last_action: Action::Hold,
            render_at_stop,
        }
    }

    /// Last action an agent message carried, for downstream state logic.
    pub fn last_action(&self) -> Action {
        self.last_action
    }

    /// Final backed-up step, for the post-run episode rendering pass.
    pub fn into_snapshot(self) -> Option<StepSnapshot> {
        self.snapshot
    }

    /// Stop, take a picture and get out: render all non-episode views
    /// without transmitting them, then signal the engine to halt.
    fn early_stop(&mut self, view: &mut dyn TickView) {
        log::debug!("episode halt: {}", view.info().broker_message);
        let _ = self
            .renderer
            .render(&self.render_at_stop, self.snapshot.as_ref(), false);
        view.halt();
    }
}

#[async_trait]
impl<R: Renderer> TickHook for StepExchange<'_, R> {
    async fn on_tick(&mut self, view: &mut dyn TickView) -> Result<(), HookError> {
        // Every tick: check for termination, collect info, put the agent
        // on hold.
        let is_done = view.is_done();
        self.info_batch.push(view.info());
        view.set_action(Action::Hold);

        // Only if it's time to communicate or the episode has come to an
        // end; all other ticks are free-running.
        if self.tick % self.skip_frame == 0 || is_done {
            let raw_state = view.raw_state();
            let state = view.state();
            let reward = view.reward();

            // Halt and wait for the controller; it sets the pace.
            let mut message = self.channel.receive().await?;
            log::debug!("comm received: {message:?}");

            // Control sub-commands do not consume the action turn.
            let action = loop {
                match message {
                    Message::Render { ref modes } => {
                        let payload = self.renderer.render(modes, self.snapshot.as_ref(), true);
                        self.channel.send(Message::Rendered(payload)).await?;
                    }
                    Message::Done => {
                        self.channel
                            .send(Message::Status("done signal received".to_string()))
                            .await?;
                        self.early_stop(view);
                        return Ok(());
                    }
                    Message::Action(action) => break action,
                    Message::Reset { .. }
                    | Message::Stop
                    | Message::GetStat
                    | Message::GetData { .. }
                    | Message::Ping => {
                        return Err(
                            ProtocolError::UnknownControl(format!("{message:?}")).into()
                        );
                    }
                    _ => return Err(ProtocolError::MissingAction.into()),
                }
                message = self.channel.receive().await?;
                log::debug!("comm received: {message:?}");
            };

            view.set_action(action);
            self.last_action = action;

            // Reply with the (state, reward, done, info) tuple; only the
            // latest info record is transmitted, the full batch is kept
            // for rendering and final statistics.
            let latest = self.info_batch.last().cloned().unwrap_or_default();
            self.channel
                .send(Message::Step(StepReply {
                    state: state.clone(),
                    reward,
                    done: is_done,
                    info: vec![latest],
                }))
                .await?;

            self.snapshot = Some(StepSnapshot {
                raw_state,
                state,
                reward,
                done: is_done,
                info: std::mem::take(&mut self.info_batch),
            });
        }

        // Natural termination: fall back to control mode.
        if is_done {
            self.early_stop(view);
        }

        self.tick += 1;
        Ok(())
    }
}
