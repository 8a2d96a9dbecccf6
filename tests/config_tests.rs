//! Config tests: file loading, discovery order, bring-up from config

use ledpulse::config::CONFIG_ENV;
use ledpulse::{Bit, ConfigError, LedConfig, LedpulseConfig, PatternOptions, Registry, Shutdown};
use once_cell::sync::Lazy;
use std::path::Path;
use std::sync::Mutex;
use tempfile::TempDir;

static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

fn lock_env() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK.lock().unwrap_or_else(|p| p.into_inner())
}

fn write_config(dir: &Path, json: &str) -> std::path::PathBuf {
    let path = dir.join("config.json");
    std::fs::write(&path, json).expect("write config");
    path
}

#[test]
fn load_reads_leds_and_sequencers() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_config(
        dir.path(),
        r#"{
            "leds": [{"name": "status"}, {"name": "power", "backend": "simulated"}],
            "sequencers": [{"options": {"led_target": "power", "durations": [500], "resets": [10000]}}]
        }"#,
    );

    let config = LedpulseConfig::load(&path).expect("load");
    assert_eq!(config.leds.len(), 2);
    let options = &config.sequencers[0].options;
    assert_eq!(options.led_target.as_deref(), Some("power"));
    assert_eq!(options.durations, Some(vec![500]));
    assert_eq!(options.resets, Some(Some(vec![10000])));
}

#[test]
fn load_missing_file_is_read_error() {
    let dir = TempDir::new().expect("tempdir");
    let err = LedpulseConfig::load(dir.path().join("nope.json")).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
}

#[test]
fn load_invalid_json_is_parse_error() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_config(dir.path(), "{ leds: ");
    assert!(matches!(LedpulseConfig::load(&path), Err(ConfigError::Parse { .. })));
}

#[test]
fn load_rejects_sequencer_without_led() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_config(
        dir.path(),
        r#"{"leds": [{"name": "power"}], "sequencers": [{"options": {}}]}"#,
    );
    assert!(matches!(LedpulseConfig::load(&path), Err(ConfigError::UnknownTarget(t)) if t == "status"));
}

#[test]
fn discover_prefers_explicit_path_over_env() {
    let _guard = lock_env();
    let dir = TempDir::new().expect("tempdir");
    let explicit = write_config(dir.path(), r#"{"leds": [{"name": "explicit"}]}"#);
    let env_dir = TempDir::new().expect("tempdir");
    let from_env = write_config(env_dir.path(), r#"{"leds": [{"name": "env"}]}"#);

    std::env::set_var(CONFIG_ENV, &from_env);
    let config = LedpulseConfig::discover(Some(&explicit)).expect("discover");
    assert_eq!(config.leds[0].name, "explicit");

    let config = LedpulseConfig::discover(None).expect("discover");
    assert_eq!(config.leds[0].name, "env");
    std::env::remove_var(CONFIG_ENV);
}

#[test]
fn discover_env_path_must_exist() {
    let _guard = lock_env();
    let dir = TempDir::new().expect("tempdir");

    std::env::set_var(CONFIG_ENV, dir.path().join("missing.json"));
    let result = LedpulseConfig::discover(None);
    std::env::remove_var(CONFIG_ENV);
    assert!(matches!(result, Err(ConfigError::Read { .. })));
}

#[test]
fn config_serializes_back_to_loadable_json() {
    let config = LedpulseConfig::new()
        .with_led(LedConfig::simulated("status"))
        .with_led(LedConfig::sysfs("power", "/sys/class/leds/pwr/brightness"))
        .with_sequencer(PatternOptions::new().with_intervals(vec![50]).without_resets());

    let json = serde_json::to_string(&config).expect("serialize");
    assert_eq!(LedpulseConfig::from_json(&json).expect("parse"), config);
}

#[tokio::test(start_paused = true)]
async fn spawn_registers_leds_and_starts_sequencers() {
    let config = LedpulseConfig::new()
        .with_led(LedConfig::simulated("status"))
        .with_led(LedConfig::simulated("power"))
        .with_sequencer(PatternOptions::new().with_target("power"));
    let registry = Registry::new();
    let shutdown = Shutdown::new();

    let running = config.spawn(&registry, &shutdown).expect("spawn");
    assert_eq!(registry.names(), vec!["power".to_string(), "status".to_string()]);
    assert_eq!(running.sequencers.len(), 1);
    // The first trigger has been sent once the sequencer answers
    assert!(running.sequencers[0].state().await.unwrap().is_running());

    let power = running.led("power").expect("power led");
    assert!(power.status().await.unwrap().blinking);
    assert!(!running.led("status").unwrap().status().await.unwrap().blinking);

    shutdown.trigger();
    running.join().await;
    assert!(registry.lookup("power").is_none());
}

#[tokio::test]
async fn spawn_rejects_duplicate_registration() {
    let config = LedpulseConfig::default();
    let registry = Registry::new();
    let shutdown = Shutdown::new();

    let _running = config.spawn(&registry, &shutdown).expect("first spawn");
    let err = config.spawn(&registry, &shutdown).err().expect("second spawn fails");
    assert!(matches!(err, ConfigError::Registry(_)));
}

#[cfg(feature = "sysfs")]
#[tokio::test]
async fn spawn_opens_sysfs_backend() {
    let dir = TempDir::new().expect("tempdir");
    let brightness = dir.path().join("brightness");
    std::fs::write(&brightness, "0\n").expect("write");

    let config = LedpulseConfig::new().with_led(LedConfig::sysfs("board", &brightness));
    let shutdown = Shutdown::new();
    let running = config.spawn(&Registry::new(), &shutdown).expect("spawn");

    let led = running.led("board").expect("board led");
    led.on().await.unwrap();
    assert_eq!(std::fs::read_to_string(&brightness).unwrap().trim(), "1");
    assert_eq!(led.read().await.unwrap(), Bit::On);

    shutdown.trigger();
    running.join().await;
    assert_eq!(std::fs::read_to_string(&brightness).unwrap().trim(), "0");
}

#[cfg(feature = "sysfs")]
#[test]
fn sysfs_backend_missing_file_fails_spawn() {
    let rt = tokio::runtime::Runtime::new().expect("runtime");
    let dir = TempDir::new().expect("tempdir");
    let config = LedpulseConfig::new().with_led(LedConfig::sysfs("board", dir.path().join("absent")));

    let result = rt.block_on(async { config.spawn(&Registry::new(), &Shutdown::new()).err() });
    assert!(matches!(result, Some(ConfigError::Actuator { name, .. }) if name == "board"));
}
