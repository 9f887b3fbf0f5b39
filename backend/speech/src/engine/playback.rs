//! Local playback engine: synthesized audio narrated through a rodio sink.
//!
//! Rodio's output objects are not `Send`, so they live on one dedicated
//! audio thread fed commands over a std mpsc channel. Engine events flow
//! back over the tokio channel given at construction, each tagged with the
//! utterance id it belongs to.

use std::io::Cursor;
use std::sync::mpsc::{RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use rodio::{Decoder, OutputStream, Sink};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};
use uuid::Uuid;

use pagevoice_core::{EngineEvent, EngineEventKind, SpeechEngine, UtteranceRequest, Voice};

use crate::engine::synth::{SynthesisRequest, Synthesizer};

enum AudioCommand {
    Play { utterance: Uuid, audio: Vec<u8> },
    Pause,
    Resume,
    Cancel,
}

pub struct PlaybackEngine {
    synthesizer: Arc<dyn Synthesizer>,
    events: UnboundedSender<EngineEvent>,
    /// None when no audio output device could be opened.
    commands: Option<Sender<AudioCommand>>,
}

impl PlaybackEngine {
    pub fn new(synthesizer: Arc<dyn Synthesizer>, events: UnboundedSender<EngineEvent>) -> Self {
        let commands = spawn_audio_thread(events.clone());
        if commands.is_none() {
            warn!("no audio output available; speech commands will be no-ops");
        }
        Self {
            synthesizer,
            events,
            commands,
        }
    }
}

#[async_trait]
impl SpeechEngine for PlaybackEngine {
    fn is_supported(&self) -> bool {
        self.commands.is_some()
    }

    async fn voices(&self) -> Result<Vec<Voice>> {
        Ok(self.synthesizer.voices())
    }

    async fn speak(&self, request: UtteranceRequest) -> Result<()> {
        let Some(commands) = &self.commands else {
            bail!("speech is not supported in this runtime");
        };

        let synth_request = SynthesisRequest {
            text: request.text.clone(),
            voice_id: request.voice.as_ref().map(|v| v.id.clone()),
            speed: request.rate,
        };
        match self.synthesizer.synthesize(&synth_request).await {
            Ok(audio) => {
                commands
                    .send(AudioCommand::Play {
                        utterance: request.id,
                        audio: audio.to_vec(),
                    })
                    .map_err(|_| anyhow::anyhow!("audio thread is gone"))?;
                Ok(())
            }
            Err(e) => {
                // Start failure is reported as an engine event so the
                // controller stays in (or returns to) idle.
                warn!(error = %e, "synthesis failed");
                let _ = self.events.send(EngineEvent {
                    utterance: request.id,
                    kind: EngineEventKind::Error(e.to_string()),
                });
                Ok(())
            }
        }
    }

    fn pause(&self) {
        if let Some(commands) = &self.commands {
            let _ = commands.send(AudioCommand::Pause);
        }
    }

    fn resume(&self) {
        if let Some(commands) = &self.commands {
            let _ = commands.send(AudioCommand::Resume);
        }
    }

    fn cancel(&self) {
        if let Some(commands) = &self.commands {
            let _ = commands.send(AudioCommand::Cancel);
        }
    }
}

/// Spawn the audio thread. Returns None when no output device exists.
fn spawn_audio_thread(events: UnboundedSender<EngineEvent>) -> Option<Sender<AudioCommand>> {
    let (tx, rx) = std::sync::mpsc::channel::<AudioCommand>();
    let (ready_tx, ready_rx) = std::sync::mpsc::channel::<bool>();

    let spawned = thread::Builder::new()
        .name("pagevoice-audio".to_string())
        .spawn(move || audio_loop(rx, ready_tx, events));
    if spawned.is_err() {
        return None;
    }

    match ready_rx.recv() {
        Ok(true) => Some(tx),
        _ => None,
    }
}

fn audio_loop(
    rx: std::sync::mpsc::Receiver<AudioCommand>,
    ready: Sender<bool>,
    events: UnboundedSender<EngineEvent>,
) {
    let (stream, handle) = match OutputStream::try_default() {
        Ok(pair) => pair,
        Err(e) => {
            warn!(error = %e, "failed to open audio output stream");
            let _ = ready.send(false);
            return;
        }
    };
    let sink = match Sink::try_new(&handle) {
        Ok(sink) => sink,
        Err(e) => {
            warn!(error = %e, "failed to create audio sink");
            let _ = ready.send(false);
            return;
        }
    };
    // Keep the stream alive for the lifetime of the thread.
    let _stream = stream;
    let _ = ready.send(true);

    let send = |utterance: Uuid, kind: EngineEventKind| {
        let _ = events.send(EngineEvent { utterance, kind });
    };

    let mut current: Option<Uuid> = None;
    loop {
        // While an utterance is active, poll so sink drain is noticed.
        let command = if current.is_some() {
            match rx.recv_timeout(Duration::from_millis(100)) {
                Ok(c) => Some(c),
                Err(RecvTimeoutError::Timeout) => None,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        } else {
            match rx.recv() {
                Ok(c) => Some(c),
                Err(_) => break,
            }
        };

        if let Some(command) = command {
            match command {
                AudioCommand::Play { utterance, audio } => {
                    sink.stop();
                    match Decoder::new(Cursor::new(audio)) {
                        Ok(source) => {
                            sink.append(source);
                            sink.play();
                            current = Some(utterance);
                            send(utterance, EngineEventKind::Started);
                        }
                        Err(e) => {
                            send(utterance, EngineEventKind::Error(e.to_string()));
                        }
                    }
                }
                AudioCommand::Pause => {
                    if let Some(id) = current {
                        sink.pause();
                        send(id, EngineEventKind::Paused);
                    }
                }
                AudioCommand::Resume => {
                    if let Some(id) = current {
                        sink.play();
                        send(id, EngineEventKind::Resumed);
                    }
                }
                AudioCommand::Cancel => {
                    sink.stop();
                    current = None;
                }
            }
        }

        if let Some(id) = current {
            if sink.empty() {
                debug!(utterance = %id, "utterance playback drained");
                send(id, EngineEventKind::Ended);
                current = None;
            }
        }
    }
}
