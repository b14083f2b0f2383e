use sw_core::config::Config;

#[test]
fn default_config() {
    let cfg = Config::default();
    assert_eq!(cfg.general.log_level, "info");
    assert!(!cfg.general.dry_run);
    assert_eq!(cfg.qbittorrent.url, "http://localhost:8080");
    assert_eq!(cfg.qbittorrent.password_env, "QBIT_PASSWORD");
    assert!(cfg.classification.managed_categories.contains("刷流"));
    assert!(cfg.classification.protected_categories.contains("电影"));
    assert!(cfg.classification.freeleech_tags.contains("FL"));
    assert_eq!(cfg.monitor.base_threshold_minutes, 15);
    assert_eq!(cfg.monitor.stalled_with_leechers_minutes, 45);
    assert_eq!(cfg.monitor.freeleech_stalled_minutes, 240);
    assert_eq!(cfg.monitor.grace_period_hours, 24);
    assert_eq!(cfg.retirement.min_ratio, 5.0);
    assert_eq!(cfg.retirement.low_demand_leechers, 1);
    assert_eq!(cfg.retirement.min_seeding_days, 14);
    assert_eq!(cfg.retirement.long_idle_seeding_days, 90);
    assert_eq!(cfg.retirement.long_idle_max_leechers, 0);
    assert_eq!(cfg.retirement.long_idle_inactive_days, 7);
    assert_eq!(cfg.notifications.max_report_items, 20);
    cfg.validate().expect("defaults validate");
}

#[test]
fn config_roundtrip() {
    let cfg = Config::default();
    let toml_str = cfg.to_toml().expect("serialize to toml");
    assert!(toml_str.contains("QBIT_USERNAME"));

    let parsed: Config = toml::from_str(&toml_str).expect("parse toml back");
    assert_eq!(parsed.qbittorrent.url, cfg.qbittorrent.url);
    assert_eq!(
        parsed.classification.protected_tags,
        cfg.classification.protected_tags
    );
    assert_eq!(parsed.monitor.store_path, cfg.monitor.store_path);
    parsed.validate().expect("config validates");
}

#[test]
fn config_partial_toml() {
    let partial = r#"
[general]
dry_run = true

[classification]
managed_categories = ["brush", "racing"]

[monitor]
base_threshold_minutes = 20
"#;
    let cfg: Config = toml::from_str(partial).expect("parse partial");
    assert!(cfg.general.dry_run);
    assert!(cfg.classification.managed_categories.contains("racing"));
    assert_eq!(cfg.monitor.base_threshold_minutes, 20);
    // defaults should fill in the rest
    assert_eq!(cfg.monitor.freeleech_stalled_minutes, 240);
    assert!(cfg.classification.protected_tags.contains("personal"));
    cfg.validate().expect("config validates");
}

#[test]
fn overlapping_category_fails_validation() {
    let mut cfg = Config::default();
    cfg.classification
        .protected_categories
        .insert("刷流".to_string());
    let err = cfg.validate().expect_err("validation should fail");
    assert!(err.to_string().contains("both managed and protected"));
}

#[test]
fn threshold_below_base_fails_validation() {
    let mut cfg = Config::default();
    cfg.monitor.stalled_with_leechers_minutes = 5;
    let err = cfg.validate().expect_err("validation should fail");
    assert!(err.to_string().contains("stalled_with_leechers_minutes"));
}

#[test]
fn zero_retained_backups_fails_validation() {
    let mut cfg = Config::default();
    cfg.monitor.corrupt_backups_retained = 0;
    let err = cfg.validate().expect_err("validation should fail");
    assert!(err.to_string().contains("corrupt_backups_retained"));
}

#[test]
fn nan_ratio_fails_validation() {
    let mut cfg = Config::default();
    cfg.retirement.min_ratio = f64::NAN;
    let err = cfg.validate().expect_err("validation should fail");
    assert!(err.to_string().contains("min_ratio"));
}

#[test]
fn load_from_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Config::load_from(dir.path().join("nope.toml")).expect_err("missing file");
    assert!(err.to_string().starts_with("io:"));
}

#[test]
fn store_path_expands_home() {
    let cfg = Config::default();
    let resolved = cfg.monitor.resolved_store_path();
    assert!(resolved.ends_with(".seedwarden/monitor.json"));
    assert!(!resolved.to_string_lossy().starts_with('~'));
}
