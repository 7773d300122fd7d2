pub mod transcribe_audio_use_case;
