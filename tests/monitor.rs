//! Waveform monitor tests against real dump files.

use std::time::Duration;

use kairo::{
    parts, EngineConfig, EngineState, Event, EventQueue, Execution, Logic, Part, SimError,
    Simulation, TimeSource, Value, WaveformMonitor,
};

fn testbench() -> Part {
    Part::composite("tb", Execution::Sequential)
        .with_children([
            parts::free_running_clock("clock"),
            parts::source("source"),
            parts::register("dut"),
            parts::sink("sink"),
        ])
        .wire("clock.clk", "source.clk")
        .wire("clock.clk", "dut.clk")
        .wire("source.rst", "dut.rst")
        .wire("source.out_0", "dut.in_0")
        .wire("dut.out_0", "sink.in_0")
}

const SIGNALS: [(&str, &str); 4] = [
    ("clock.clk", "clock.clk"),
    ("source.rst", "source.rst"),
    ("dut.in_0", "source.out_0"),
    ("dut.out_0", "dut.out_0"),
];

fn timestamps(dump: &str) -> Vec<u64> {
    dump.lines()
        .filter_map(|line| line.strip_prefix('#'))
        .map(|t| t.parse().unwrap())
        .collect()
}

#[test]
fn test_dump_file_layout() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("logs").join("waveforms.vcd");

    let config = EngineConfig::new().with_time_step(10).with_max_steps(30);
    let mut sim = Simulation::from_part(testbench(), config).unwrap();
    let monitor = WaveformMonitor::to_file(&path).unwrap();
    sim.attach_monitor(monitor, SIGNALS, TimeSource::SimTime).unwrap();
    sim.run().unwrap();

    let dump = std::fs::read_to_string(&path).unwrap();
    assert!(dump.starts_with("$date"));
    assert!(dump.contains("$timescale 1ms $end"));
    assert!(dump.contains("$scope module top $end"));
    assert!(dump.contains("$var wire 1 ! clock.clk $end"));
    assert!(dump.contains("$var wire 1 $ dut.out_0 $end"));
    assert!(dump.contains("$enddefinitions $end"));
    // clk is driven to 0 in the first step
    assert!(dump.contains("#0\n0!\n"));

    let times = timestamps(&dump);
    assert!(!times.is_empty());
    assert!(times.windows(2).all(|w| w[0] < w[1]));
    assert!(times.iter().all(|t| t % 10 == 0));
}

#[test]
fn test_records_are_monotonic() {
    let dir = tempfile::tempdir().unwrap();
    let config = EngineConfig::new().with_max_steps(40);
    let mut sim = Simulation::from_part(testbench(), config).unwrap();
    let monitor = WaveformMonitor::to_file(dir.path().join("w.vcd")).unwrap().with_records(true);
    sim.attach_monitor(monitor, SIGNALS, TimeSource::SimTime).unwrap();
    sim.run().unwrap();

    let monitor = sim.monitor().unwrap();
    let records = monitor.records();
    assert!(records.windows(2).all(|w| w[0].time <= w[1].time));
    assert_eq!(sim.stats().records_dumped, records.len() as u64);

    let clk: Vec<_> = records.iter().filter(|r| r.name == "clock.clk").collect();
    assert_eq!(clk.len(), 40);
    assert_eq!(clk[0].value, Value::Logic(Logic::Zero));
    assert_eq!(clk[1].value, Value::Logic(Logic::One));

    let names: Vec<_> = monitor.signal_names().collect();
    assert_eq!(names, vec!["clock.clk", "source.rst", "dut.in_0", "dut.out_0"]);
}

fn event_clock_bench() -> Part {
    Part::composite("tb", Execution::Sequential)
        .with_children([parts::clock("clock"), parts::sink("sink")])
        .wire("clock.clk", "sink.in_0")
}

#[test]
fn test_port_time_source_scaled() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("timed.vcd");

    let mut sim = Simulation::from_part(event_clock_bench(), EngineConfig::new().with_max_steps(8)).unwrap();
    let queue = EventQueue::new("timer_q", 8);
    for (i, secs) in [0.5, 1.0, 1.5, 2.0].into_iter().enumerate() {
        queue.push(Event::new(i as u64, secs)).unwrap();
    }
    sim.synchronize(&queue, "clock.time").unwrap();
    sim.attach_monitor(
        WaveformMonitor::to_file(&path).unwrap().with_records(true),
        [("clk", "clock.clk")],
        TimeSource::Port("clock.time_port".to_string()),
    )
    .unwrap();
    sim.run().unwrap();

    let records = sim.monitor().unwrap().records();
    let times: Vec<_> = records.iter().map(|r| r.time).collect();
    assert_eq!(times, vec![500, 1000, 1500, 2000]);
    let values: Vec<_> = records.iter().map(|r| r.value).collect();
    assert_eq!(
        values,
        vec![
            Value::Logic(Logic::Zero),
            Value::Logic(Logic::One),
            Value::Logic(Logic::Zero),
            Value::Logic(Logic::One),
        ]
    );

    let dump = std::fs::read_to_string(&path).unwrap();
    assert_eq!(timestamps(&dump), vec![500, 1000, 1500, 2000]);
}

#[test]
fn test_timer_style_seconds_keep_their_millisecond() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("timer.vcd");

    let mut sim = Simulation::from_part(event_clock_bench(), EngineConfig::new().with_max_steps(6)).unwrap();
    let queue = EventQueue::new("timer_q", 8);
    let ticks = [1340_u64, 1360, 1820, 1840, 1860, 2720];
    for ms in ticks {
        queue
            .push(Event::new(ms, Duration::from_millis(ms).as_secs_f64()))
            .unwrap();
    }
    sim.synchronize(&queue, "clock.time").unwrap();
    sim.attach_monitor(
        WaveformMonitor::to_file(&path).unwrap(),
        [("clk", "clock.clk")],
        TimeSource::Port("clock.time_port".to_string()),
    )
    .unwrap();
    sim.run().unwrap();

    let dump = std::fs::read_to_string(&path).unwrap();
    assert_eq!(timestamps(&dump), ticks.to_vec());
}

#[test]
fn test_backwards_time_fails_run() {
    let dir = tempfile::tempdir().unwrap();
    let mut sim = Simulation::from_part(event_clock_bench(), EngineConfig::new().with_max_steps(8)).unwrap();
    let queue = EventQueue::new("timer_q", 4);
    queue.push(Event::new(0, 2.0)).unwrap();
    queue.push(Event::new(1, 1.0)).unwrap();
    sim.synchronize(&queue, "clock.time").unwrap();
    sim.attach_monitor(
        WaveformMonitor::to_file(dir.path().join("w.vcd")).unwrap(),
        [("clk", "clock.clk")],
        TimeSource::Port("clock.time_port".to_string()),
    )
    .unwrap();

    let err = sim.run().unwrap_err();
    assert!(matches!(
        err,
        SimError::MonitorTimeOrder {
            time: 1000,
            last: 2000,
            ..
        }
    ));
    assert_eq!(sim.state(), EngineState::Failed);
}

#[test]
fn test_missing_time_value_skips_dump() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("w.vcd");
    let top = Part::composite("tb", Execution::Sequential)
        .with_children([parts::free_running_clock("fast"), parts::clock("idle")]);

    let mut sim = Simulation::from_part(top, EngineConfig::new().with_max_steps(5)).unwrap();
    sim.attach_monitor(
        WaveformMonitor::to_file(&path).unwrap().with_records(true),
        [("clk", "fast.clk")],
        TimeSource::Port("idle.time_port".to_string()),
    )
    .unwrap();
    sim.run().unwrap();

    assert!(sim.monitor().unwrap().records().is_empty());
    let dump = std::fs::read_to_string(&path).unwrap();
    assert!(dump.contains("$enddefinitions $end"));
    assert!(timestamps(&dump).is_empty());
}

#[test]
fn test_duplicate_signal_name() {
    let dir = tempfile::tempdir().unwrap();
    let mut sim = Simulation::from_part(testbench(), EngineConfig::new()).unwrap();
    let err = sim
        .attach_monitor(
            WaveformMonitor::to_file(dir.path().join("w.vcd")).unwrap(),
            [("clk", "clock.clk"), ("clk", "dut.clk")],
            TimeSource::SimTime,
        )
        .unwrap_err();
    assert!(matches!(err, SimError::DuplicateName { name, .. } if name == "clk"));
}

#[test]
fn test_unknown_signal_path() {
    let dir = tempfile::tempdir().unwrap();
    let mut sim = Simulation::from_part(testbench(), EngineConfig::new()).unwrap();
    let err = sim
        .attach_monitor(
            WaveformMonitor::to_file(dir.path().join("w.vcd")).unwrap(),
            [("q", "dut.q")],
            TimeSource::SimTime,
        )
        .unwrap_err();
    assert!(matches!(err, SimError::UnknownPort(_)));
}
