pub mod transcription;
pub mod translation;

pub use transcription::{GroqTranscriber, Transcript, TranscriptionError, TranscriptionProvider};
pub use translation::{GoogleTranslateProvider, TranslationProvider};
