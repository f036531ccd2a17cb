//! Episode runner
//!
//! Orchestrates one full episode: clones the engine template, wires the
//! step exchange into it, resolves trial and episode samples, runs the
//! engine to completion and harvests the result record.

use crate::error::SessionError;
use crate::step::StepExchange;
use chrono::Utc;
use kairos_channel::BoundedChannel;
use kairos_core::{
    DataError, EpisodeResult, RenderMode, ResetConfig, SampleConfig, SampleStats, StrategyStats,
    TrialSample,
};
use kairos_data::DataAcquisition;
use kairos_ports::{Engine, Observer, Renderer};
use tokio::time::Instant;

/// A trial sample cached by the session across episodes, together with the
/// statistics that arrived with it.
#[derive(Debug, Clone)]
pub struct CachedTrial {
    pub sample: TrialSample,
    pub trial_stat: SampleStats,
    pub dataset_stat: SampleStats,
}

/// Borrows the session's collaborators for the duration of one episode.
pub(crate) struct EpisodeRunner<'a, R: Renderer> {
    pub channel: &'a mut BoundedChannel,
    pub renderer: &'a mut R,
    pub data: &'a mut DataAcquisition,
    pub trial: &'a mut Option<CachedTrial>,
    pub aux_observers: &'a [Observer],
    pub skip_frame: u64,
    pub episode_number: u64,
}

impl<R: Renderer> EpisodeRunner<'_, R> {
    /// Run one episode against a fresh copy of `template`.
    pub(crate) async fn run<E: Engine + Clone>(
        self,
        template: &E,
        kwargs: &ResetConfig,
    ) -> Result<EpisodeResult, SessionError> {
        let EpisodeRunner {
            channel,
            renderer,
            data,
            trial,
            aux_observers,
            skip_frame,
            episode_number,
        } = self;

        let started_at = Utc::now();
        let start = Instant::now();

        // Mutations during this episode must never leak into the template
        // used for the next one.
        let mut engine = template.clone();

        // Idempotent attach: skip observers an earlier configuration
        // already added.
        for aux in aux_observers {
            if !engine.observers().contains(aux) {
                engine.add_observer(*aux);
            }
        }

        let trial_config = kwargs.trial_config.clone().unwrap_or_else(|| {
            let config = SampleConfig::default();
            log::debug!("reset <trial_config> kwarg not found, using defaults: {config:?}");
            config
        });
        let episode_config = kwargs.episode_config.clone().unwrap_or_else(|| {
            let config = SampleConfig::default();
            log::debug!("reset <episode_config> kwarg not found, using defaults: {config:?}");
            config
        });

        // Fetch a new trial only when requested or when none is cached;
        // reuse is an explicit policy decision, and checking here avoids
        // redundant data-channel traffic.
        if trial_config.get_new || trial.is_none() {
            log::debug!("requesting new trial sample with args: {trial_config:?}");
            let (sample, trial_stat, dataset_stat) = data.acquire(&trial_config).await?;
            log::debug!("got new trial <{}>", sample.name());
            *trial = Some(CachedTrial {
                sample,
                trial_stat,
                dataset_stat,
            });
        } else if let Some(cached) = trial.as_ref() {
            log::debug!("reusing trial <{}>", cached.sample.name());
        }
        let Some(trial) = trial.as_mut() else {
            return Err(DataError::Unreachable("no trial sample resolved".to_string()).into());
        };

        log::debug!("requesting episode from <{}>", trial.sample.name());
        let episode_sample = trial.sample.sample(&episode_config)?;

        // Episode/trial/dataset statistics go into the strategy parameters
        // before the run.
        engine.set_strategy_stats(StrategyStats {
            trial_stat: trial.trial_stat.clone(),
            trial_metadata: trial.sample.metadata().clone(),
            dataset_stat: trial.dataset_stat.clone(),
            episode_stat: episode_sample.describe(),
            episode_metadata: episode_sample.metadata().clone(),
        });
        engine.add_feed(episode_sample.to_feed());

        // Run to completion; returns only after the step exchange has
        // driven the engine to termination.
        let mut hook = StepExchange::new(&mut *channel, &mut *renderer, skip_frame);
        let run = engine.run(&mut hook).await?;
        let snapshot = hook.into_snapshot();

        // Episode-view rendering pass; kept by the renderer, not sent.
        let _ = renderer.render(&[RenderMode::Episode], snapshot.as_ref(), false);

        let runtime = start.elapsed();
        log::info!(
            "episode {episode_number} elapsed time: {:.3}s",
            runtime.as_secs_f64()
        );

        // Per-episode engine copies can be large; reclaim eagerly.
        let length = run.length;
        let analyzers = run.analyzers;
        drop(engine);

        Ok(EpisodeResult {
            episode: episode_number,
            started_at: Some(started_at),
            runtime,
            length,
            analyzers,
        })
    }
}
