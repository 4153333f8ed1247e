//! The operator facade.
//!
//! [`Simulator`] owns one parameter store, one transcript, one player and one
//! catalog cache, and exposes the operations an operator performs: edit a
//! parameter, play a scenario, clear the transcript, refresh the catalog and
//! observe what is happening.

use std::sync::Arc;

use linesim_catalog::{CatalogCache, CatalogSource, CategoryGroup, RefreshReport};
use linesim_core::{
    ParameterSet, ParameterStore, PlaybackState, Scenario, ScenarioId, TranscriptEntry,
    template,
};
use linesim_playback::{PlayOutcome, PlaybackEvent, Player, Transcript, TranscriptEvent};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::info;

use crate::error::{CliError, CliResult};

/// One simulator session.
///
/// Cloning creates a new handle to the same session.
#[derive(Clone)]
pub struct Simulator {
    params: ParameterStore,
    transcript: Transcript,
    player: Player,
    catalog: CatalogCache,
    source: Arc<dyn CatalogSource>,
}

impl std::fmt::Debug for Simulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulator")
            .field("source", &self.source.describe())
            .field("player", &self.player)
            .finish_non_exhaustive()
    }
}

impl Simulator {
    /// Create a session reading scenarios from `source`, starting with
    /// `initial` parameters. The catalog starts empty until
    /// [`refresh_catalog`](Self::refresh_catalog) runs.
    pub fn new(source: Arc<dyn CatalogSource>, initial: ParameterSet) -> Self {
        let transcript = Transcript::new();
        let player = Player::new(Arc::new(transcript.clone()));
        Self {
            params: ParameterStore::new(initial),
            transcript,
            player,
            catalog: CatalogCache::new(),
            source,
        }
    }

    /// Label used for messages without a time label.
    #[must_use]
    pub fn with_default_time_label(mut self, label: impl Into<String>) -> Self {
        self.player = self.player.with_default_time_label(label);
        self
    }

    // --- parameters -------------------------------------------------------

    /// Set one parameter. Takes effect for every message emitted afterwards,
    /// including later messages of a playback already in flight.
    ///
    /// Returns the previous value.
    pub async fn set_parameter(
        &self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> CliResult<Option<String>> {
        let name = name.into();
        let previous = self.params.set(name.clone(), value).await?;
        info!(parameter = %name, "parameter updated");
        Ok(previous)
    }

    /// Snapshot of the current parameters.
    pub async fn parameters(&self) -> ParameterSet {
        self.params.snapshot().await
    }

    /// Current value of one parameter.
    pub async fn parameter(&self, name: &str) -> Option<String> {
        self.params.get(name).await
    }

    // --- playback ---------------------------------------------------------

    /// Start playing the loaded scenario `id` in the background.
    ///
    /// Returns `Ok(None)` if another playback is in flight; the request is
    /// then ignored without side effects.
    pub async fn play_scenario(
        &self,
        id: &ScenarioId,
    ) -> CliResult<Option<JoinHandle<PlayOutcome>>> {
        let scenario = self
            .catalog
            .get(id)
            .await
            .ok_or_else(|| CliError::UnknownScenario(id.to_string()))?;
        Ok(self.play(scenario))
    }

    /// Start playing `scenario` in the background, whether or not it is in
    /// the catalog.
    pub fn play(&self, scenario: Arc<Scenario>) -> Option<JoinHandle<PlayOutcome>> {
        self.player.spawn_play(scenario, self.params.clone())
    }

    /// Play `scenario` and wait for it to finish.
    pub async fn play_to_end(&self, scenario: &Scenario) -> PlayOutcome {
        self.player.play(scenario, &self.params).await
    }

    /// Stop the in-flight playback. Returns `true` if one was signalled.
    pub fn stop(&self) -> bool {
        self.player.stop()
    }

    /// Current playback state.
    pub fn playback_state(&self) -> PlaybackState {
        self.player.state()
    }

    /// Subscribe to playback start/finish notifications.
    pub fn subscribe_playback(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.player.subscribe()
    }

    // --- transcript -------------------------------------------------------

    /// Entries emitted so far, in order.
    pub async fn transcript(&self) -> Vec<TranscriptEntry> {
        self.transcript.entries().await
    }

    /// Empty the transcript. Playback state is unaffected.
    ///
    /// Returns the number of entries removed.
    pub async fn clear_transcript(&self) -> usize {
        self.transcript.clear().await
    }

    /// Subscribe to transcript changes.
    pub fn subscribe_transcript(&self) -> broadcast::Receiver<TranscriptEvent> {
        self.transcript.subscribe()
    }

    // --- catalog ----------------------------------------------------------

    /// Reload the catalog from the source.
    ///
    /// Returns `None` if a refresh is already running.
    pub async fn refresh_catalog(&self) -> Option<RefreshReport> {
        self.catalog.refresh(self.source.as_ref()).await
    }

    /// Returns `true` while a catalog refresh is running.
    pub fn is_loading(&self) -> bool {
        self.catalog.is_loading()
    }

    /// Loaded scenarios grouped by category, in first-seen order.
    pub async fn grouped_scenarios(&self) -> Vec<CategoryGroup> {
        self.catalog.grouped().await
    }

    /// Number of loaded scenarios.
    pub async fn scenario_count(&self) -> usize {
        self.catalog.len().await
    }

    /// Look up a loaded scenario.
    pub async fn scenario(&self, id: &ScenarioId) -> Option<Arc<Scenario>> {
        self.catalog.get(id).await
    }

    /// Placeholders in scenario `id` that no current parameter resolves.
    /// Each name appears once, in first-seen order.
    pub async fn unresolved_placeholders(&self, id: &ScenarioId) -> CliResult<Vec<String>> {
        let scenario = self
            .catalog
            .get(id)
            .await
            .ok_or_else(|| CliError::UnknownScenario(id.to_string()))?;
        let params = self.params.snapshot().await;

        let mut missing: Vec<String> = Vec::new();
        for text in scenario.messages.iter().filter_map(|m| m.text.as_deref()) {
            for name in template::unresolved(text, &params) {
                if !missing.iter().any(|m| m == name) {
                    missing.push(name.to_string());
                }
            }
        }
        Ok(missing)
    }

    /// Description of the catalog source.
    pub fn source_description(&self) -> String {
        self.source.describe()
    }
}
