use sw_core::types::*;

#[test]
fn task_state_wire_names() {
    let state: TaskState = serde_json::from_str("\"stalledUP\"").unwrap();
    assert_eq!(state, TaskState::StalledUpload);
    let state: TaskState = serde_json::from_str("\"forcedUP\"").unwrap();
    assert_eq!(state, TaskState::ForcedUpload);
    let state: TaskState = serde_json::from_str("\"missingFiles\"").unwrap();
    assert_eq!(state, TaskState::MissingFiles);
}

#[test]
fn stopped_states_alias_paused() {
    let state: TaskState = serde_json::from_str("\"stoppedUP\"").unwrap();
    assert_eq!(state, TaskState::PausedUpload);
    let state: TaskState = serde_json::from_str("\"stoppedDL\"").unwrap();
    assert_eq!(state, TaskState::PausedDownload);
}

#[test]
fn unrecognised_state_is_unknown() {
    let state: TaskState = serde_json::from_str("\"somethingNew\"").unwrap();
    assert_eq!(state, TaskState::Unknown);
    assert!(state.is_severe_error());
}

#[test]
fn state_predicates() {
    assert!(TaskState::Uploading.is_active_seeding());
    assert!(TaskState::ForcedUpload.is_active_seeding());
    assert!(!TaskState::StalledUpload.is_active_seeding());
    assert!(TaskState::Error.is_severe_error());
    assert!(!TaskState::PausedUpload.is_severe_error());
}

#[test]
fn condition_upload_stall_family() {
    assert!(Condition::StalledUpload.is_upload_stall());
    assert!(Condition::PausedUpload.is_upload_stall());
    assert!(Condition::UploadingZeroSpeed.is_upload_stall());
    assert!(!Condition::StalledDownload.is_upload_stall());
    assert!(!Condition::DownloadingZeroSpeed.is_upload_stall());
}

#[test]
fn condition_serializes_as_tag() {
    assert_eq!(
        serde_json::to_string(&Condition::UploadingZeroSpeed).unwrap(),
        "\"uploading_zero_speed\""
    );
    assert_eq!(Condition::StalledDownload.to_string(), "stalledDL");
}

#[test]
fn parse_tags_trims_and_drops_empties() {
    assert_eq!(parse_tags(" FL, 刷流 ,,x"), vec!["FL", "刷流", "x"]);
    assert!(parse_tags("").is_empty());
}

#[test]
fn monitor_entry_elapsed() {
    let start = chrono::Utc::now();
    let entry = MonitorEntry::new("t", Condition::PausedUpload, start, true);
    let later = start + chrono::Duration::minutes(30);
    assert_eq!(entry.elapsed(later).num_minutes(), 30);
}
