//! The orchestrator: entry point for every request.
//!
//! Classify, fan out to generators on the runtime's pool, merge. The DAW
//! generator is the gatekeeper: its failure fails the request and cancels
//! the others. Arranger and drummer failures only cost their contribution.
//!
//! Each generator task reports through one mpsc channel; the merge loop owns
//! the merge state exclusively, so the emit callback always runs with no
//! lock held. In streaming mode DAW actions go out as they parse, drummer
//! patterns go out when the drummer completes, and the single `add_midi` is
//! deferred until the clip exists and every generator has finished.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use dawproto::{Action, NoteEvent, StateSnapshot, Usage};

use crate::classifier::{classify, Classification};
use crate::error::{ModelError, OrchestratorError};
use crate::generators::{ArrangerGenerator, DawGenerator, DrummerGenerator};
use crate::merge;
use crate::model::{RequestCtx, TextModel};

pub struct Orchestrator {
    model: Arc<dyn TextModel>,
    daw: DawGenerator,
    arranger: ArrangerGenerator,
    drummer: DrummerGenerator,
    deadline: Duration,
}

/// What a generator task reports to the merge loop. Per-task send order is
/// preserved, so a generator's actions always precede its completion.
enum GenEvent {
    DawAction(Action),
    DawDone(Result<Usage, OrchestratorError>),
    ArrangerDone(Result<(Vec<chart::ArrangerAction>, Usage), OrchestratorError>),
    DrummerDone(Result<(Vec<Action>, Usage), OrchestratorError>),
}

impl Orchestrator {
    pub fn new(model: Arc<dyn TextModel>, deadline: Duration) -> Self {
        Orchestrator {
            daw: DawGenerator::new(model.clone()),
            arranger: ArrangerGenerator::new(model.clone()),
            drummer: DrummerGenerator::new(model.clone()),
            model,
            deadline,
        }
    }

    fn ctx(&self) -> RequestCtx {
        RequestCtx::new(self.deadline)
    }

    async fn classify(
        &self,
        ctx: &RequestCtx,
        utterance: &str,
        state: &StateSnapshot,
    ) -> Result<(Classification, bool, Usage), OrchestratorError> {
        let (classification, usage) = classify(self.model.as_ref(), ctx, utterance).await?;
        // A content generator with nowhere to put content: the DAW generator
        // is told to create a receiving track.
        let elevated = (classification.needs_arranger || classification.needs_drummer)
            && state.tracks.is_empty();
        Ok((classification, elevated, usage))
    }

    /// Synchronous orchestration: the complete merged action list.
    #[tracing::instrument(skip(self, state), fields(tracks = state.track_count()))]
    pub async fn generate_actions(
        &self,
        utterance: &str,
        state: &StateSnapshot,
    ) -> Result<(Vec<Action>, Usage), OrchestratorError> {
        let ctx = self.ctx();
        let _cancel_on_drop = ctx.cancel.clone().drop_guard();

        let (classification, elevated, mut usage) = self.classify(&ctx, utterance, state).await?;

        let state = Arc::new(state.clone());
        let utterance = Arc::<str>::from(utterance);

        let daw_handle = {
            let generator = self.daw.clone();
            let ctx = ctx.clone();
            let utterance = utterance.clone();
            let state = state.clone();
            tokio::spawn(async move {
                generator
                    .generate(&ctx, &utterance, &state, elevated)
                    .await
            })
        };

        let arranger_handle = classification.needs_arranger.then(|| {
            let generator = self.arranger.clone();
            let ctx = ctx.clone();
            let utterance = utterance.clone();
            let state = state.clone();
            tokio::spawn(async move { generator.generate(&ctx, &utterance, &state).await })
        });

        let drummer_handle = classification.needs_drummer.then(|| {
            let generator = self.drummer.clone();
            let ctx = ctx.clone();
            let utterance = utterance.clone();
            let state = state.clone();
            tokio::spawn(async move { generator.generate(&ctx, &utterance, &state).await })
        });

        let daw_result = daw_handle.await.map_err(join_error)?;
        if daw_result.is_err() {
            // gatekeeper down: stop the others before they do more work
            ctx.cancel.cancel();
        }

        let mut notes: Vec<NoteEvent> = Vec::new();
        if let Some(handle) = arranger_handle {
            match handle.await.map_err(join_error)? {
                Ok(output) => {
                    usage += output.usage;
                    notes = chart::to_note_events(&output.actions);
                }
                Err(e) => tracing::warn!(error = %e, "arranger failed, dropping its output"),
            }
        }

        let mut drummer_actions: Vec<Action> = Vec::new();
        if let Some(handle) = drummer_handle {
            match handle.await.map_err(join_error)? {
                Ok(output) => {
                    usage += output.usage;
                    drummer_actions = output.actions;
                }
                Err(e) => tracing::warn!(error = %e, "drummer failed, dropping its output"),
            }
        }

        let daw_output = daw_result?;
        usage += daw_output.usage;

        let actions = merge::merge_batched(daw_output.actions, notes, drummer_actions, &state);
        Ok((actions, usage))
    }

    /// Streaming orchestration: same result, but `emit` sees every action
    /// the moment it is safe for the client to execute.
    #[tracing::instrument(skip(self, state, emit), fields(tracks = state.track_count()))]
    pub async fn generate_actions_stream(
        &self,
        utterance: &str,
        state: &StateSnapshot,
        mut emit: impl FnMut(&Action),
    ) -> Result<(Vec<Action>, Usage), OrchestratorError> {
        let ctx = self.ctx();
        let _cancel_on_drop = ctx.cancel.clone().drop_guard();

        let (classification, elevated, mut usage) = self.classify(&ctx, utterance, state).await?;

        let state = Arc::new(state.clone());
        let utterance = Arc::<str>::from(utterance);
        let (tx, mut rx) = mpsc::unbounded_channel::<GenEvent>();

        {
            let generator = self.daw.clone();
            let ctx = ctx.clone();
            let utterance = utterance.clone();
            let state = state.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                let action_tx = tx.clone();
                let result = generator
                    .generate_stream(&ctx, &utterance, &state, elevated, &mut |action| {
                        let _ = action_tx.send(GenEvent::DawAction(action.clone()));
                    })
                    .await;
                let _ = tx.send(GenEvent::DawDone(result.map(|output| output.usage)));
            });
        }

        if classification.needs_arranger {
            let generator = self.arranger.clone();
            let ctx = ctx.clone();
            let utterance = utterance.clone();
            let state = state.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                let result = generator.generate(&ctx, &utterance, &state).await;
                let _ = tx.send(GenEvent::ArrangerDone(
                    result.map(|output| (output.actions, output.usage)),
                ));
            });
        }

        if classification.needs_drummer {
            let generator = self.drummer.clone();
            let ctx = ctx.clone();
            let utterance = utterance.clone();
            let state = state.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                let result = generator.generate(&ctx, &utterance, &state).await;
                let _ = tx.send(GenEvent::DrummerDone(
                    result.map(|output| (output.actions, output.usage)),
                ));
            });
        }
        drop(tx);

        let mut emitted: Vec<Action> = Vec::new();
        let mut pending_notes: Vec<NoteEvent> = Vec::new();
        let mut clip_created = false;
        let mut midi_track: Option<usize> = None;
        let mut daw_done = false;
        let mut arranger_done = !classification.needs_arranger;
        let mut drummer_done = !classification.needs_drummer;
        let mut daw_failure: Option<OrchestratorError> = None;

        while let Some(event) = rx.recv().await {
            match event {
                GenEvent::DawAction(action) => {
                    if daw_failure.is_some() {
                        continue;
                    }
                    if action.creates_clip() {
                        clip_created = true;
                        midi_track = action.track_index();
                    }
                    match &action {
                        // swallow empty placeholders; the real add_midi is
                        // assembled after the barrier, and an empty one has
                        // nothing for the client to execute
                        Action::AddMidi { track, notes } if notes.is_empty() => {
                            midi_track = Some(*track);
                        }
                        _ => {
                            emit(&action);
                            emitted.push(action);
                        }
                    }
                }
                GenEvent::DawDone(result) => {
                    daw_done = true;
                    match result {
                        Ok(u) => usage += u,
                        Err(e) => {
                            ctx.cancel.cancel();
                            daw_failure = Some(e);
                        }
                    }
                }
                GenEvent::ArrangerDone(result) => {
                    arranger_done = true;
                    match result {
                        Ok((actions, u)) => {
                            usage += u;
                            pending_notes = chart::to_note_events(&actions);
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "arranger failed, dropping its output")
                        }
                    }
                }
                GenEvent::DrummerDone(result) => {
                    drummer_done = true;
                    match result {
                        Ok((actions, u)) => {
                            usage += u;
                            if daw_failure.is_none() {
                                for action in actions {
                                    emit(&action);
                                    emitted.push(action);
                                }
                            }
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "drummer failed, dropping its output")
                        }
                    }
                }
            }

            if daw_done && arranger_done && drummer_done {
                break;
            }
        }

        if let Some(failure) = daw_failure {
            return Err(failure);
        }
        if !daw_done {
            // channel closed without a verdict: the task died
            return Err(OrchestratorError::Provider(ModelError::Provider(
                "daw generator task ended without reporting".to_string(),
            )));
        }

        // The barrier is down: clip created (or synthesized below) and every
        // generator finished. One add_midi carries all arranger content.
        if !pending_notes.is_empty() {
            let track = midi_track
                .or_else(|| merge::last_referenced_track(&emitted))
                .or_else(|| state.last_track_index())
                .unwrap_or(0);
            if !clip_created {
                let clip = Action::CreateClipAtBar {
                    track,
                    bar: 1,
                    length_bars: 4,
                };
                emit(&clip);
                emitted.push(clip);
            }
            let midi = Action::AddMidi {
                track,
                notes: pending_notes,
            };
            emit(&midi);
            emitted.push(midi);
        }

        Ok((emitted, usage))
    }

    /// Drummer-only orchestration for `/api/v1/drummer/generate`. No
    /// classification; the drummer's failure is fatal here.
    #[tracing::instrument(skip(self, state))]
    pub async fn drummer_actions(
        &self,
        utterance: &str,
        state: &StateSnapshot,
    ) -> Result<(Vec<Action>, Usage), OrchestratorError> {
        let ctx = self.ctx();
        let output = self.drummer.generate(&ctx, utterance, state).await?;
        Ok((output.actions, output.usage))
    }

    /// Arranger-only orchestration for `/api/v1/aideas/generations`: one
    /// `add_midi` targeting the first selected track, else track 0.
    #[tracing::instrument(skip(self, state))]
    pub async fn arranger_actions(
        &self,
        utterance: &str,
        state: &StateSnapshot,
    ) -> Result<(Vec<Action>, Usage), OrchestratorError> {
        let ctx = self.ctx();
        let output = self.arranger.generate(&ctx, utterance, state).await?;
        let track = state.selected_track().map(|t| t.index).unwrap_or(0);
        let notes = chart::to_note_events(&output.actions);
        Ok((
            vec![Action::AddMidi { track, notes }],
            output.usage,
        ))
    }
}

fn join_error(e: tokio::task::JoinError) -> OrchestratorError {
    OrchestratorError::Provider(ModelError::Provider(format!("generator task failed: {e}")))
}
