use super::*;
use crate::audio::output::NullOutput;
use crate::audio::session::SessionOptions;
use crate::audio::OutputDevice;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[test]
fn test_every_event_has_a_distinct_asset() {
    let mut names: Vec<_> = SoundEvent::ALL.iter().map(|e| e.file_name()).collect();
    names.sort();
    names.dedup();
    assert_eq!(names.len(), SoundEvent::ALL.len());
    assert_eq!(SoundEvent::Pause.file_name(), "pause_start_sound.mp3");
    assert_eq!(SoundEvent::Unpause.file_name(), "pause_stop_sound.mp3");
    assert_eq!(SoundEvent::BufferSaved.file_name(), "buffer_save_sound.mp3");
}

#[test]
fn test_event_names_parse_back() {
    for event in SoundEvent::ALL {
        assert_eq!(event.to_string().parse::<SoundEvent>(), Ok(event));
    }
    assert_eq!("record_start".parse::<SoundEvent>(), Ok(SoundEvent::RecordStart));
    assert_eq!(" Stream-Stop ".parse::<SoundEvent>(), Ok(SoundEvent::StreamStop));
    assert!("scene-switch".parse::<SoundEvent>().is_err());
}

#[test]
fn test_event_serde_uses_kebab_case() -> Result<(), serde_json::Error> {
    assert_eq!(serde_json::to_string(&SoundEvent::BufferSaved)?, "\"buffer-saved\"");
    let event: SoundEvent = serde_json::from_str("\"record-stop\"")?;
    assert_eq!(event, SoundEvent::RecordStop);
    Ok(())
}

#[test]
fn test_library_resolves_against_data_dir() {
    let library = SoundLibrary::new("/srv/sounds").with_override(SoundEvent::Pause, "custom/pause.ogg");
    assert_eq!(
        library.resolve(SoundEvent::StreamStart),
        PathBuf::from("/srv/sounds/stream_start_sound.mp3")
    );
    assert_eq!(library.resolve(SoundEvent::Pause), PathBuf::from("/srv/sounds/custom/pause.ogg"));

    let absolute = SoundLibrary::new("/srv/sounds").with_override(SoundEvent::Unpause, "/tmp/u.wav");
    assert_eq!(absolute.resolve(SoundEvent::Unpause), PathBuf::from("/tmp/u.wav"));
}

#[tokio::test]
async fn test_missing_asset_does_not_reach_caller() {
    let dir = tempfile::tempdir().expect("tempdir");
    let opened = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&opened);
    let factory: DeviceFactory = Arc::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Box::new(NullOutput::new()) as Box<dyn OutputDevice>
    });

    let mut player = EventPlayer::new(SoundLibrary::new(dir.path()), SessionOptions::default(), factory);
    player.trigger(SoundEvent::StreamStart).await;
    player.trigger(SoundEvent::StreamStart).await;
    player.trigger(SoundEvent::Pause).await;
    assert_eq!(player.pending(), 2);

    player.shutdown().await;
    assert_eq!(player.pending(), 0);
    assert_eq!(opened.load(Ordering::SeqCst), 3);
}
