//! Session loop tests with a scripted listener and a recording speaker

use std::time::Duration;

use astra::assistant::{ACKNOWLEDGEMENT, FAREWELL, greeting};
use astra::{AlarmClock, Assistant, WakePhrases};

mod common;

use common::{
    FIXED_TIME_REPLY, Heard, ManualClock, RecordingOpener, RecordingRinger, RecordingSpeaker,
    ScriptedListener, test_alarm, test_handlers,
};

fn assistant(listener: ScriptedListener, speaker: &RecordingSpeaker, alarm: AlarmClock) -> Assistant {
    Assistant::new(
        "Astra".to_string(),
        Box::new(listener),
        Box::new(speaker.clone()),
        test_handlers(&RecordingOpener::default(), alarm),
        WakePhrases::default(),
    )
}

fn idle_alarm() -> AlarmClock {
    test_alarm(&ManualClock::at(6, 0), &RecordingRinger::default(), 1)
}

#[tokio::test]
async fn test_wake_then_command_then_exit() {
    let speaker = RecordingSpeaker::default();
    let listener = ScriptedListener::lines(&[
        "what time is it",
        "hey astra",
        "what time is it",
        "bye",
        "hello astra",
        "bye",
    ]);

    assistant(listener, &speaker, idle_alarm()).run().await.unwrap();

    // Utterances without a wake phrase are ignored, including exit words
    assert_eq!(
        speaker.spoken(),
        vec![
            greeting("Astra"),
            ACKNOWLEDGEMENT.to_string(),
            FIXED_TIME_REPLY.to_string(),
            ACKNOWLEDGEMENT.to_string(),
            FAREWELL.to_string(),
        ]
    );
}

#[tokio::test]
async fn test_inline_command_and_exit_word() {
    let speaker = RecordingSpeaker::default();
    let listener = ScriptedListener::lines(&["hey astra what time is it", "astra", "exit"]);

    assistant(listener, &speaker, idle_alarm()).run().await.unwrap();

    assert_eq!(
        speaker.spoken(),
        vec![
            greeting("Astra"),
            FIXED_TIME_REPLY.to_string(),
            ACKNOWLEDGEMENT.to_string(),
            FAREWELL.to_string(),
        ]
    );
}

#[tokio::test]
async fn test_listen_failures_are_absorbed() {
    let speaker = RecordingSpeaker::default();
    let listener = ScriptedListener::new([
        Heard::Nothing,
        Heard::SttFailure,
        Heard::Text("hey astra"),
        Heard::Nothing,
        Heard::Text("astra, what time is it"),
    ]);

    // Input closes after the script: the session ends cleanly
    assistant(listener, &speaker, idle_alarm()).run().await.unwrap();

    assert_eq!(
        speaker.spoken(),
        vec![
            greeting("Astra"),
            "Speech recognition service is not available.".to_string(),
            ACKNOWLEDGEMENT.to_string(),
            FIXED_TIME_REPLY.to_string(),
        ]
    );
}

#[tokio::test]
async fn test_alarm_set_by_voice_is_cancelled_on_exit() {
    let speaker = RecordingSpeaker::default();
    let alarm = idle_alarm();
    let listener = ScriptedListener::lines(&["hey astra set alarm for 07:30", "astra bye"]);

    assistant(listener, &speaker, alarm.clone()).run().await.unwrap();

    assert_eq!(
        speaker.spoken(),
        vec![
            greeting("Astra"),
            "Alarm set for 07:30".to_string(),
            FAREWELL.to_string(),
        ]
    );
    assert!(alarm.active().is_none());
}

#[tokio::test]
async fn test_q_dismisses_ringing_alarm() {
    let speaker = RecordingSpeaker::default();
    let ringer = RecordingRinger::default();
    let alarm = test_alarm(&ManualClock::at(7, 30), &ringer, 1_000);
    let listener = ScriptedListener::lines(&["hey astra set alarm for 07:30", "q"])
        .with_delay(Duration::from_millis(50));

    assistant(listener, &speaker, alarm.clone()).run().await.unwrap();

    assert!(ringer.rings() > 0);
    assert!(alarm.active().is_none());
    assert_eq!(
        speaker.spoken(),
        vec![
            greeting("Astra"),
            "Alarm set for 07:30".to_string(),
            "Alarm stopped.".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_q_without_alarm_is_ignored() {
    let speaker = RecordingSpeaker::default();
    let listener = ScriptedListener::lines(&["q"]);

    assistant(listener, &speaker, idle_alarm()).run().await.unwrap();

    assert_eq!(speaker.spoken(), vec![greeting("Astra")]);
}

#[tokio::test]
async fn test_respond_skips_wake_phrase() {
    let speaker = RecordingSpeaker::default();
    let bot = assistant(ScriptedListener::lines(&[]), &speaker, idle_alarm());

    assert_eq!(bot.respond("What time is it").await, FIXED_TIME_REPLY);
    assert_eq!(
        bot.respond("cancel alarm").await,
        "No alarm is currently set."
    );
    assert!(speaker.spoken().is_empty());
}
