// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the modbus-slave-sim project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Tests for configuration loading, saving and validation

use modbus_slave_sim::config::Config;
use modbus_slave_sim::simulator::Mode;

#[test]
fn save_and_reload_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");

    let mut config = Config::default();
    config.simulation.holding_registers.count = 12;
    config.simulation.holding_registers.start_address = 40;
    config.simulation.update_interval = 0.25;
    config.simulation.initial_mode = Mode::Incremental;
    config.modbus.port = 1502;
    config.save_to_file(&path).unwrap();

    let reloaded = Config::from_file(&path).unwrap();
    assert_eq!(reloaded.simulation.holding_registers.count, 12);
    assert_eq!(reloaded.simulation.holding_registers.start_address, 40);
    assert_eq!(reloaded.simulation.update_interval, 0.25);
    assert_eq!(reloaded.simulation.initial_mode, Mode::Incremental);
    assert_eq!(reloaded.modbus.port, 1502);
}

#[test]
fn missing_file_creates_a_default_template() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fresh.yaml");
    assert!(!path.exists());

    let config = Config::from_file(&path).unwrap();
    assert!(path.exists());
    assert_eq!(config.modbus.port, 502);
    assert_eq!(config.simulation.update_interval, 1.0);
    assert_eq!(config.simulation.initial_mode, Mode::Random);
    // padding is on unless the file disables it
    assert!(config.simulation.pad_counts);
}

#[test]
fn partial_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("partial.yaml");
    std::fs::write(
        &path,
        "simulation:\n  update_interval: 0.5\nmodbus:\n  port: 10502\n",
    )
    .unwrap();

    let config = Config::from_file(&path).unwrap();
    assert_eq!(config.simulation.update_interval, 0.5);
    assert_eq!(config.modbus.port, 10502);
    assert_eq!(config.simulation.coils.count, 1);
    assert_eq!(config.modbus.address, "127.0.0.1");
}

#[test]
fn non_numeric_input_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.yaml");
    std::fs::write(&path, "modbus:\n  port: not-a-number\n").unwrap();

    assert!(Config::from_file(&path).is_err());
}

#[test]
fn invalid_interval_fails_validation_on_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad_interval.yaml");
    std::fs::write(&path, "simulation:\n  update_interval: -1.0\n").unwrap();

    assert!(Config::from_file(&path).is_err());
}

#[test]
fn cli_overrides_replace_file_settings() {
    let mut config = Config::default();
    config.apply_args(
        Some(false),
        Some("0.0.0.0".to_string()),
        Some(1502),
        Some(0.1),
        Some(Mode::Injected),
    );

    assert!(!config.modbus.enabled);
    assert_eq!(config.modbus.address, "0.0.0.0");
    assert_eq!(config.modbus.port, 1502);
    assert_eq!(config.simulation.update_interval, 0.1);
    assert_eq!(config.simulation.initial_mode, Mode::Injected);

    // None leaves settings untouched
    config.apply_args(None, None, None, None, None);
    assert_eq!(config.modbus.port, 1502);
}
