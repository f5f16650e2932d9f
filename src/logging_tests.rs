use super::*;

#[test]
fn test_log_config_default() {
    let config = LogConfig::default();
    assert_eq!(config.log_level, Level::INFO);
    assert!(!config.json_format);
    assert!(config.log_dir.ends_with("logs"));
}

#[test]
fn test_log_config_default_log_dir_under_store_home() {
    let config = LogConfig::default();
    let path_str = config.log_dir.to_string_lossy();
    assert!(path_str.contains(".content-store"));
}

#[test]
fn test_log_config_from_settings() {
    let settings = Settings::from_toml(
        "[log]\njson = true\nrotation = \"hourly\"\ndir = \"/tmp/cs-logs\"\n",
    )
    .unwrap();
    let config = LogConfig::from_settings(&settings, Level::DEBUG);
    assert!(config.json_format);
    assert_eq!(config.log_file(), PathBuf::from("/tmp/cs-logs").join(LOG_FILENAME));
    assert_eq!(
        format!("{:?}", config.rotation),
        format!("{:?}", parse_rotation("hourly"))
    );
}

#[test]
fn test_default_directive_targets_crate() {
    let config = LogConfig {
        log_level: Level::WARN,
        ..LogConfig::default()
    };
    assert_eq!(config.default_directive(), "content_store=WARN");
}

#[test]
fn test_parse_rotation_named_periods_differ() {
    let hourly = format!("{:?}", parse_rotation("hourly"));
    let never = format!("{:?}", parse_rotation("never"));
    let daily = format!("{:?}", parse_rotation("daily"));
    assert_ne!(hourly, daily);
    assert_ne!(never, daily);
    assert_ne!(hourly, never);
}

#[test]
fn test_parse_rotation_case_insensitive() {
    assert_eq!(
        format!("{:?}", parse_rotation(" HOURLY ")),
        format!("{:?}", parse_rotation("hourly"))
    );
}

#[test]
fn test_parse_rotation_unknown_defaults_to_daily() {
    let rotation = parse_rotation("weekly");
    let debug = format!("{rotation:?}");
    let daily = format!("{:?}", parse_rotation("daily"));
    assert_eq!(debug, daily);
}

#[test]
fn test_log_filename_constant() {
    assert_eq!(LOG_FILENAME, "content-store.log");
}
