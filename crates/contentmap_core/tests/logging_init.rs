use contentmap_core::{init_logging, logging_status};

// One test fn on purpose: the logger state is process-global, so repeated
// and conflicting calls must be exercised in a fixed order.
#[test]
fn init_is_idempotent_and_rejects_conflicting_config() {
    let dir = tempfile::tempdir().unwrap();
    let log_dir = dir.path().to_str().unwrap().to_string();

    assert!(logging_status().is_none());
    init_logging("info", &log_dir).unwrap();
    init_logging("INFO", &log_dir).unwrap();

    let (level, active_dir) = logging_status().unwrap();
    assert_eq!(level, "info");
    assert_eq!(active_dir, dir.path());

    let err = init_logging("debug", &log_dir).unwrap_err();
    assert!(err.contains("already initialized"));

    let other = tempfile::tempdir().unwrap();
    let err = init_logging("info", other.path().to_str().unwrap()).unwrap_err();
    assert!(err.contains("refusing to switch"));

    assert!(init_logging("loud", &log_dir).is_err());
    assert!(init_logging("info", "relative/logs").is_err());
}
