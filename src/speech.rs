//! Voice synthesis seam and the sequential narration queue for turn
//! instructions.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::info;

use crate::models::RouteInstruction;

/// Platform text-to-speech collaborator. Cancellation is cancel-all, not
/// per-utterance.
#[async_trait]
pub trait SpeechAnnouncer: Send + Sync {
    async fn speak(&self, text: &str, lang: &str);
    fn cancel_all(&self);
}

/// Announcer for headless deployments: utterances go to the log.
pub struct LogAnnouncer;

#[async_trait]
impl SpeechAnnouncer for LogAnnouncer {
    async fn speak(&self, text: &str, lang: &str) {
        info!(lang, "speaking: {text}");
    }

    fn cancel_all(&self) {}
}

/// Removes embedded `<...>` markup from an instruction, keeping plain text.
pub fn strip_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_tag = false;
    for ch in text.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

/// Speaks a route's instructions in order with a fixed inter-step delay.
/// Pacing is a simplification, not tied to vehicle progress. At most one
/// narration task runs at a time; starting a new one cancels the old one.
pub struct Narrator {
    announcer: Arc<dyn SpeechAnnouncer>,
    lang: String,
    step_delay: Duration,
    current: Mutex<Option<JoinHandle<()>>>,
}

impl Narrator {
    pub fn new(announcer: Arc<dyn SpeechAnnouncer>, lang: impl Into<String>, step_delay: Duration) -> Self {
        Self {
            announcer,
            lang: lang.into(),
            step_delay,
            current: Mutex::new(None),
        }
    }

    /// Cancels any narration in progress, then starts speaking the given
    /// instructions.
    pub fn narrate(&self, instructions: &[RouteInstruction]) {
        self.cancel();

        let texts: Vec<String> = instructions
            .iter()
            .map(|i| strip_markup(&i.text))
            .collect();
        let announcer = self.announcer.clone();
        let lang = self.lang.clone();
        let delay = self.step_delay;

        let task = tokio::spawn(async move {
            for text in texts {
                announcer.speak(&text, &lang).await;
                tokio::time::sleep(delay).await;
            }
        });
        *self.current.lock() = Some(task);
    }

    /// Idempotent; safe to call after the narration finished on its own.
    pub fn cancel(&self) {
        if let Some(task) = self.current.lock().take() {
            task.abort();
        }
        self.announcer.cancel_all();
    }
}

impl Drop for Narrator {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingAnnouncer {
        spoken: Mutex<Vec<String>>,
    }

    impl RecordingAnnouncer {
        fn spoken(&self) -> Vec<String> {
            self.spoken.lock().clone()
        }
    }

    #[async_trait]
    impl SpeechAnnouncer for RecordingAnnouncer {
        async fn speak(&self, text: &str, _lang: &str) {
            self.spoken.lock().push(text.to_string());
        }

        fn cancel_all(&self) {}
    }

    fn instructions(texts: &[&str]) -> Vec<RouteInstruction> {
        texts
            .iter()
            .map(|t| RouteInstruction {
                text: t.to_string(),
            })
            .collect()
    }

    #[test]
    fn strips_embedded_markup() {
        assert_eq!(
            strip_markup("Turn <b>left</b> onto <i>Main St</i>"),
            "Turn left onto Main St"
        );
        assert_eq!(strip_markup("no markup"), "no markup");
    }

    #[tokio::test(start_paused = true)]
    async fn speaks_instructions_in_order_with_pacing() {
        let announcer = Arc::new(RecordingAnnouncer::default());
        let narrator = Narrator::new(announcer.clone(), "en-US", Duration::from_millis(3500));

        narrator.narrate(&instructions(&["Head out", "Turn left", "Arrive"]));
        tokio::task::yield_now().await;
        assert_eq!(announcer.spoken(), vec!["Head out"]);

        tokio::time::advance(Duration::from_millis(3500)).await;
        tokio::task::yield_now().await;
        assert_eq!(announcer.spoken(), vec!["Head out", "Turn left"]);

        tokio::time::advance(Duration::from_millis(3500)).await;
        tokio::task::yield_now().await;
        assert_eq!(announcer.spoken(), vec!["Head out", "Turn left", "Arrive"]);
    }

    #[tokio::test(start_paused = true)]
    async fn new_narration_replaces_the_previous_one() {
        let announcer = Arc::new(RecordingAnnouncer::default());
        let narrator = Narrator::new(announcer.clone(), "en-US", Duration::from_millis(3500));

        narrator.narrate(&instructions(&["old one", "old two"]));
        tokio::task::yield_now().await;

        narrator.narrate(&instructions(&["new one", "new two"]));
        tokio::task::yield_now().await;
        tokio::time::advance(Duration::from_millis(3500)).await;
        tokio::task::yield_now().await;
        tokio::time::advance(Duration::from_millis(3500)).await;
        tokio::task::yield_now().await;

        let spoken = announcer.spoken();
        assert!(!spoken.contains(&"old two".to_string()));
        assert!(spoken.ends_with(&["new one".to_string(), "new two".to_string()]));
    }

    #[tokio::test]
    async fn cancel_after_completion_is_a_no_op() {
        let announcer = Arc::new(RecordingAnnouncer::default());
        let narrator = Narrator::new(announcer.clone(), "en-US", Duration::from_millis(0));
        narrator.narrate(&instructions(&["only step"]));
        tokio::task::yield_now().await;
        narrator.cancel();
        narrator.cancel();
    }
}
