//! The speech playback controller.
//!
//! A small state machine over the external engine: idle, speaking, paused.
//! Transitions into `speaking` happen only when the engine confirms start;
//! every engine event carries its utterance token, and events for a token
//! that is no longer current are discarded, so rapid stop/speak sequences
//! cannot race the state machine.

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, warn};
use uuid::Uuid;

use pagevoice_core::{
    EngineEvent, EngineEventKind, SpeechEngine, SpeechError, SpeechStatus, UtteranceRequest, Voice,
};

use crate::preprocess::speakable_text;

pub struct SpeechController {
    engine: Arc<dyn SpeechEngine>,
    events: UnboundedReceiver<EngineEvent>,
    status: SpeechStatus,
    /// Token of the utterance currently owned by this controller.
    active: Option<Uuid>,
    voice: Option<Voice>,
    rate: f32,
}

impl SpeechController {
    /// `events` must be the receiving half of the channel the engine was
    /// constructed with.
    pub fn new(engine: Arc<dyn SpeechEngine>, events: UnboundedReceiver<EngineEvent>) -> Self {
        Self {
            engine,
            events,
            status: SpeechStatus::Idle,
            active: None,
            voice: None,
            rate: 1.0,
        }
    }

    pub fn status(&self) -> SpeechStatus {
        self.status
    }

    /// Whether an utterance is in progress (even before start confirmation).
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn is_supported(&self) -> bool {
        self.engine.is_supported()
    }

    pub fn voice(&self) -> Option<&Voice> {
        self.voice.as_ref()
    }

    /// Takes effect on the next `speak`; an in-flight utterance keeps the
    /// voice it started with.
    pub fn set_voice(&mut self, voice: Voice) {
        self.voice = Some(voice);
    }

    pub fn rate(&self) -> f32 {
        self.rate
    }

    /// Takes effect on the next `speak`.
    pub fn set_rate(&mut self, rate: f32) {
        self.rate = rate;
    }

    /// If no voice is selected yet, pick the first engine voice matching
    /// the preferred language tag. Returns the selected voice, if any.
    pub async fn select_default_voice(
        &mut self,
        preferred_language: &str,
    ) -> anyhow::Result<Option<Voice>> {
        if self.voice.is_none() {
            let voices = self.engine.voices().await?;
            if let Some(v) = voices
                .into_iter()
                .find(|v| v.language.starts_with(preferred_language))
            {
                debug!(voice = %v.id, language = %v.language, "selected default voice");
                self.voice = Some(v);
            }
        }
        Ok(self.voice.clone())
    }

    /// Start narrating `text`, cancelling any active utterance first.
    ///
    /// The transition to `speaking` happens when the engine reports start;
    /// until then (and on start failure) the controller is idle.
    pub async fn speak(&mut self, text: &str) -> Result<(), SpeechError> {
        if !self.engine.is_supported() {
            warn!("speech engine unavailable; ignoring speak");
            return Err(SpeechError::Unsupported);
        }

        // Unconditional, idempotent when idle.
        self.engine.cancel();
        self.status = SpeechStatus::Idle;

        let mut request = UtteranceRequest::new(speakable_text(text));
        request.voice = self.voice.clone();
        request.rate = self.rate;
        let id = request.id;

        info!(utterance = %id, rate = self.rate, "starting narration");
        self.active = Some(id);
        if let Err(e) = self.engine.speak(request).await {
            self.active = None;
            self.status = SpeechStatus::Idle;
            return Err(SpeechError::Engine(e.to_string()));
        }
        Ok(())
    }

    /// Valid only while speaking; otherwise a no-op.
    pub fn pause(&self) {
        if self.status == SpeechStatus::Speaking {
            self.engine.pause();
        }
    }

    /// Valid only while paused; otherwise a no-op.
    pub fn resume(&self) {
        if self.status == SpeechStatus::Paused {
            self.engine.resume();
        }
    }

    /// Valid from any state: cancels the engine and returns to idle.
    pub fn stop(&mut self) {
        self.engine.cancel();
        self.active = None;
        self.status = SpeechStatus::Idle;
    }

    /// Receive the next engine event. Returns None when the engine side of
    /// the channel is gone.
    pub async fn next_event(&mut self) -> Option<EngineEvent> {
        self.events.recv().await
    }

    /// Apply one engine event to the state machine.
    pub fn handle_event(&mut self, event: EngineEvent) {
        if self.active != Some(event.utterance) {
            debug!(utterance = %event.utterance, "ignoring event for superseded utterance");
            return;
        }
        match event.kind {
            EngineEventKind::Started => {
                self.status = SpeechStatus::Speaking;
            }
            EngineEventKind::Ended => {
                self.status = SpeechStatus::Idle;
                self.active = None;
            }
            EngineEventKind::Error(message) => {
                warn!(utterance = %event.utterance, %message, "engine reported error");
                self.status = SpeechStatus::Idle;
                self.active = None;
            }
            EngineEventKind::Paused => {
                if self.status == SpeechStatus::Speaking {
                    self.status = SpeechStatus::Paused;
                }
            }
            EngineEventKind::Resumed => {
                if self.status == SpeechStatus::Paused {
                    self.status = SpeechStatus::Speaking;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tokio::sync::mpsc;

    #[derive(Default)]
    struct EngineLog {
        commands: Vec<String>,
        requests: Vec<UtteranceRequest>,
    }

    struct MockEngine {
        supported: bool,
        log: Mutex<EngineLog>,
        voices: Vec<Voice>,
    }

    impl MockEngine {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                supported: true,
                log: Mutex::new(EngineLog::default()),
                voices: vec![
                    Voice {
                        id: "daniel".into(),
                        name: "Daniel".into(),
                        language: "en-GB".into(),
                    },
                    Voice {
                        id: "kyoko".into(),
                        name: "Kyoko".into(),
                        language: "ja-JP".into(),
                    },
                ],
            })
        }

        fn unsupported() -> Arc<Self> {
            Arc::new(Self {
                supported: false,
                log: Mutex::new(EngineLog::default()),
                voices: Vec::new(),
            })
        }

        fn commands(&self) -> Vec<String> {
            self.log.lock().unwrap().commands.clone()
        }

        fn last_request(&self) -> UtteranceRequest {
            self.log.lock().unwrap().requests.last().unwrap().clone()
        }
    }

    #[async_trait]
    impl SpeechEngine for MockEngine {
        fn is_supported(&self) -> bool {
            self.supported
        }

        async fn voices(&self) -> anyhow::Result<Vec<Voice>> {
            Ok(self.voices.clone())
        }

        async fn speak(&self, request: UtteranceRequest) -> anyhow::Result<()> {
            let mut log = self.log.lock().unwrap();
            log.commands.push("speak".into());
            log.requests.push(request);
            Ok(())
        }

        fn pause(&self) {
            self.log.lock().unwrap().commands.push("pause".into());
        }

        fn resume(&self) {
            self.log.lock().unwrap().commands.push("resume".into());
        }

        fn cancel(&self) {
            self.log.lock().unwrap().commands.push("cancel".into());
        }
    }

    fn controller(engine: Arc<MockEngine>) -> SpeechController {
        let (_tx, rx) = mpsc::unbounded_channel();
        SpeechController::new(engine, rx)
    }

    fn started(id: Uuid) -> EngineEvent {
        EngineEvent {
            utterance: id,
            kind: EngineEventKind::Started,
        }
    }

    #[tokio::test]
    async fn speaking_requires_engine_start_confirmation() {
        let engine = MockEngine::new();
        let mut ctl = controller(engine.clone());

        ctl.speak("hello").await.unwrap();
        assert_eq!(ctl.status(), SpeechStatus::Idle);

        let id = engine.last_request().id;
        ctl.handle_event(started(id));
        assert_eq!(ctl.status(), SpeechStatus::Speaking);
    }

    #[tokio::test]
    async fn speak_cancels_prior_utterance_first() {
        let engine = MockEngine::new();
        let mut ctl = controller(engine.clone());

        ctl.speak("first").await.unwrap();
        let first = engine.last_request().id;
        ctl.handle_event(started(first));

        ctl.speak("second").await.unwrap();
        let commands = engine.commands();
        assert_eq!(commands, vec!["cancel", "speak", "cancel", "speak"]);
        // The superseded utterance no longer drives the state machine.
        assert_eq!(ctl.status(), SpeechStatus::Idle);
    }

    #[tokio::test]
    async fn stale_start_event_is_ignored() {
        let engine = MockEngine::new();
        let mut ctl = controller(engine.clone());

        ctl.speak("first").await.unwrap();
        let first = engine.last_request().id;
        ctl.speak("second").await.unwrap();
        let second = engine.last_request().id;

        ctl.handle_event(started(first));
        assert_eq!(ctl.status(), SpeechStatus::Idle);
        ctl.handle_event(started(second));
        assert_eq!(ctl.status(), SpeechStatus::Speaking);
    }

    #[tokio::test]
    async fn pause_is_noop_unless_speaking() {
        let engine = MockEngine::new();
        let mut ctl = controller(engine.clone());

        ctl.pause();
        assert!(engine.commands().is_empty());

        ctl.speak("text").await.unwrap();
        let id = engine.last_request().id;
        ctl.handle_event(started(id));
        ctl.pause();
        ctl.handle_event(EngineEvent {
            utterance: id,
            kind: EngineEventKind::Paused,
        });
        assert_eq!(ctl.status(), SpeechStatus::Paused);

        // Already paused: the second pause is swallowed.
        ctl.pause();
        assert_eq!(engine.commands().iter().filter(|c| *c == "pause").count(), 1);
    }

    #[tokio::test]
    async fn resume_is_noop_unless_paused() {
        let engine = MockEngine::new();
        let mut ctl = controller(engine.clone());

        ctl.resume();
        assert!(engine.commands().is_empty());

        ctl.speak("text").await.unwrap();
        let id = engine.last_request().id;
        ctl.handle_event(started(id));
        ctl.resume(); // speaking, not paused
        assert!(!engine.commands().contains(&"resume".to_string()));
    }

    #[tokio::test]
    async fn stop_forces_idle_from_paused() {
        let engine = MockEngine::new();
        let mut ctl = controller(engine.clone());

        ctl.speak("text").await.unwrap();
        let id = engine.last_request().id;
        ctl.handle_event(started(id));
        ctl.handle_event(EngineEvent {
            utterance: id,
            kind: EngineEventKind::Paused,
        });

        ctl.stop();
        assert_eq!(ctl.status(), SpeechStatus::Idle);
        assert!(!ctl.is_active());
        // A late end event from the cancelled utterance changes nothing.
        ctl.handle_event(EngineEvent {
            utterance: id,
            kind: EngineEventKind::Ended,
        });
        assert_eq!(ctl.status(), SpeechStatus::Idle);
    }

    #[tokio::test]
    async fn engine_error_returns_to_idle() {
        let engine = MockEngine::new();
        let mut ctl = controller(engine.clone());

        ctl.speak("text").await.unwrap();
        let id = engine.last_request().id;
        ctl.handle_event(started(id));
        ctl.handle_event(EngineEvent {
            utterance: id,
            kind: EngineEventKind::Error("device lost".into()),
        });
        assert_eq!(ctl.status(), SpeechStatus::Idle);
        assert!(!ctl.is_active());
    }

    #[tokio::test]
    async fn unsupported_engine_makes_speak_report_and_noop() {
        let engine = MockEngine::unsupported();
        let mut ctl = controller(engine.clone());

        let err = ctl.speak("text").await.unwrap_err();
        assert!(matches!(err, SpeechError::Unsupported));
        assert!(engine.commands().is_empty());
    }

    #[tokio::test]
    async fn default_voice_matches_preferred_language() {
        let engine = MockEngine::new();
        let mut ctl = controller(engine.clone());

        let chosen = ctl.select_default_voice("ja").await.unwrap();
        assert_eq!(chosen.unwrap().id, "kyoko");

        // Already selected: a later call does not override.
        let again = ctl.select_default_voice("en").await.unwrap();
        assert_eq!(again.unwrap().id, "kyoko");
    }

    #[tokio::test]
    async fn rate_change_applies_only_to_next_utterance() {
        let engine = MockEngine::new();
        let mut ctl = controller(engine.clone());

        ctl.speak("first").await.unwrap();
        assert_eq!(engine.last_request().rate, 1.0);

        ctl.set_rate(1.5);
        ctl.speak("second").await.unwrap();
        assert_eq!(engine.last_request().rate, 1.5);
    }

    #[tokio::test]
    async fn speak_preprocesses_markdown() {
        let engine = MockEngine::new();
        let mut ctl = controller(engine.clone());

        ctl.speak("**Bold** and `code`").await.unwrap();
        assert_eq!(engine.last_request().text, "Bold and code");
    }
}
