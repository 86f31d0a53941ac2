//! Loading testbenches from configuration files and running them.

use kairo::config::{MonitorConfig, PartConfig, SimConfig, SimConfigBuilder};
use kairo::{create_default_registry, ConfigError, Execution, Logic, Propagation, StopReason};

fn testbench_yaml(wave: &str) -> String {
    format!(
        r#"
simulation:
  max_steps: 40
  time_step: 1
  propagation: single_hop
  log_level: warn

monitor:
  file: '{wave}'
  signals:
    - {{ name: clk, path: clock.clk }}
    - {{ name: rst, path: source.rst }}
    - {{ name: q, path: dut.out_0 }}

design:
  top: tb
  parts:
    - name: tb
      class: Testbench
      children: [clock, source, dut, sink]
      wires:
        - {{ from: clock.clk, to: source.clk }}
        - {{ from: clock.clk, to: dut.clk }}
        - {{ from: source.rst, to: dut.rst }}
        - {{ from: source.out_0, to: dut.in_0 }}
        - {{ from: dut.out_0, to: sink.in_0 }}
    - name: clock
      type: FreeRunningClock
    - name: source
      type: Source
      attrs:
        reset_cycles: "2"
        data_period: "3"
    - name: dut
      type: Register
    - name: sink
      type: Sink
"#
    )
}

#[test]
fn test_yaml_testbench_runs_with_monitor() {
    let dir = tempfile::tempdir().unwrap();
    let wave = dir.path().join("wave.vcd");
    let config_path = dir.path().join("bench.yaml");
    std::fs::write(&config_path, testbench_yaml(&wave.display().to_string())).unwrap();

    let config = SimConfig::from_file(&config_path).unwrap();
    assert_eq!(config.part_count(), 5);
    assert_eq!(config.simulation.propagation, Propagation::SingleHop);

    let registry = create_default_registry();
    let mut sim = config.build_simulation(&registry).unwrap();
    assert_eq!(sim.design().top().class(), "Testbench");

    let summary = sim.run().unwrap();
    assert_eq!(summary.steps, 40);
    assert_eq!(summary.reason, StopReason::MaxSteps);

    let dump = std::fs::read_to_string(&wave).unwrap();
    assert!(dump.contains("$var wire 1 ! clk $end"));
    assert!(dump.contains("$var wire 1 \" rst $end"));
    assert!(dump.contains("$var wire 1 # q $end"));

    // the register tracked its data input once out of reset
    let q = sim.design().peek("dut.out_0").unwrap().and_then(|v| v.as_logic());
    assert!(matches!(q, Some(Logic::Zero) | Some(Logic::One)));
}

#[test]
fn test_json_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let yaml = testbench_yaml("wave.vcd");
    let config = SimConfig::from_yaml(&yaml).unwrap();

    let json_path = dir.path().join("bench.json");
    config.to_json_file(&json_path).unwrap();
    let reloaded = SimConfig::from_file(&json_path).unwrap();
    assert_eq!(reloaded, config);

    let yml_path = dir.path().join("bench.YML");
    config.to_yaml_file(&yml_path).unwrap();
    assert_eq!(SimConfig::from_file(&yml_path).unwrap(), config);
}

#[test]
fn test_unknown_extension() {
    let err = SimConfig::from_file("bench.toml").unwrap_err();
    assert!(matches!(err, ConfigError::UnknownFormat(ext) if ext == "toml"));
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = SimConfig::from_file(dir.path().join("absent.yaml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

#[test]
fn test_bad_attribute_surfaces_at_build() {
    let config = SimConfigBuilder::new()
        .max_steps(4)
        .top("tb")
        .add_part(PartConfig::composite("tb", Execution::Sequential).with_child("source"))
        .add_part(PartConfig::leaf("source", "Source").with_attr("data_period", "0"))
        .build()
        .unwrap();

    let err = config.build_simulation(&create_default_registry()).unwrap_err();
    assert!(matches!(err, ConfigError::Validation(_)));
}

#[test]
fn test_wiring_errors_surface_as_design_errors() {
    let config = SimConfigBuilder::new()
        .top("tb")
        .add_part(
            PartConfig::composite("tb", Execution::Sequential)
                .with_child("a")
                .with_child("b")
                .with_child("sink")
                .with_wire("a.y", "sink.in_0")
                .with_wire("b.y", "sink.in_0"),
        )
        .add_part(PartConfig::leaf("a", "Not"))
        .add_part(PartConfig::leaf("b", "Not"))
        .add_part(PartConfig::leaf("sink", "Sink"))
        .build()
        .unwrap();

    let err = config.build_simulation(&create_default_registry()).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::Design(kairo::SimError::FanInViolation { .. })
    ));
}

#[test]
fn test_monitor_on_unknown_signal() {
    let dir = tempfile::tempdir().unwrap();
    let wave = dir.path().join("w.vcd");
    let config = SimConfigBuilder::new()
        .top("tb")
        .monitor(MonitorConfig::new(wave.display().to_string()).with_signal("q", "inv.q"))
        .add_part(PartConfig::composite("tb", Execution::Sequential).with_child("inv"))
        .add_part(PartConfig::leaf("inv", "Not"))
        .build()
        .unwrap();

    let err = config.build_simulation(&create_default_registry()).unwrap_err();
    assert!(matches!(err, ConfigError::Design(kairo::SimError::UnknownPort(_))));
}
