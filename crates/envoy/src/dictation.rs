pub const UNSUPPORTED_NOTICE: &str = "Speech recognition is not supported in your browser";

/// Speech-to-text source. None ships with the terminal client.
pub trait Recognizer {
    fn start(&mut self) -> anyhow::Result<()>;
    fn stop(&mut self);
}

/// Dictation toggle. Without a recognizer every toggle is a notice and the
/// state never changes.
pub struct Dictation {
    recognizer: Option<Box<dyn Recognizer>>,
    listening: bool,
}

impl Dictation {
    pub fn unsupported() -> Self {
        Self {
            recognizer: None,
            listening: false,
        }
    }

    pub fn with_recognizer(recognizer: Box<dyn Recognizer>) -> Self {
        Self {
            recognizer: Some(recognizer),
            listening: false,
        }
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    /// Flips listening on or off. `Err` carries the notice to show the user.
    pub fn toggle(&mut self) -> Result<bool, String> {
        let Some(recognizer) = self.recognizer.as_mut() else {
            return Err(UNSUPPORTED_NOTICE.to_string());
        };

        if self.listening {
            recognizer.stop();
            self.listening = false;
        } else {
            recognizer.start().map_err(|e| {
                tracing::warn!("Speech recognition failed to start: {}", e);
                "Error starting voice input".to_string()
            })?;
            self.listening = true;
        }
        Ok(self.listening)
    }
}

/// Appends a recognized transcript to the draft.
pub fn merge_transcript(draft: &str, transcript: &str) -> String {
    if draft.is_empty() {
        transcript.to_string()
    } else {
        format!("{} {}", draft, transcript)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fake {
        fail: bool,
    }

    impl Recognizer for Fake {
        fn start(&mut self) -> anyhow::Result<()> {
            if self.fail {
                anyhow::bail!("microphone busy");
            }
            Ok(())
        }

        fn stop(&mut self) {}
    }

    #[test]
    fn terminal_has_no_recognizer() {
        let mut dictation = Dictation::unsupported();
        assert_eq!(dictation.toggle().unwrap_err(), UNSUPPORTED_NOTICE);
        assert_eq!(dictation.toggle().unwrap_err(), UNSUPPORTED_NOTICE);
        assert!(!dictation.is_listening());
    }

    #[test]
    fn recognizer_toggles_listening() {
        let mut dictation = Dictation::with_recognizer(Box::new(Fake { fail: false }));
        assert_eq!(dictation.toggle(), Ok(true));
        assert_eq!(dictation.toggle(), Ok(false));
    }

    #[test]
    fn failed_start_stays_off() {
        let mut dictation = Dictation::with_recognizer(Box::new(Fake { fail: true }));
        assert_eq!(dictation.toggle().unwrap_err(), "Error starting voice input");
        assert!(!dictation.is_listening());
    }

    #[test]
    fn transcripts_join_with_one_space() {
        assert_eq!(merge_transcript("", "hello"), "hello");
        assert_eq!(merge_transcript("hello", "world"), "hello world");
    }
}
