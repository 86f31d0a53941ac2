//! Register testbench driven by a wall-clock timer.
//!
//! A timer thread ticks every 100 ms for 3 s. Each tick reaches the clock part
//! through a synchronized queue and toggles `clk`, so the clock period is
//! 200 ms. A stimulus source holds reset for five cycles and then pulses the
//! register's data input every fourth cycle. The run is dumped to
//! `logs/waveforms.vcd` using the tick time as the dump time.
//!
//! ```text
//! cargo run --example register_testbench            # simulate
//! cargo run --example register_testbench codegen    # write gen/register.vhd
//! cargo run --example register_testbench snapshot   # write gen/testbench.json
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use kairo::codegen::{generate, CodegenOptions};
use kairo::{
    init_logging, parts, EngineConfig, EventQueue, Execution, OnFull, Part, Simulation, Snapshot,
    StatsCollector, TimeSource, Timer, WaveformMonitor,
};

type DemoResult<T> = Result<T, Box<dyn std::error::Error>>;

const TICK: Duration = Duration::from_millis(100);
const DURATION: Duration = Duration::from_secs(3);

fn testbench() -> Part {
    Part::composite("tb", Execution::Sequential)
        .with_class("Testbench")
        .with_children([
            parts::clock("clock"),
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

fn simulate() -> DemoResult<()> {
    let config = EngineConfig::new().with_wall_clock(DURATION + Duration::from_secs(5));
    let mut sim = Simulation::from_part(testbench(), config)?;

    let monitor = WaveformMonitor::to_file("logs/waveforms.vcd")?;
    sim.attach_monitor(
        monitor,
        [
            ("clock.clk", "clock.clk"),
            ("source.rst", "source.rst"),
            ("dut.in_0", "source.out_0"),
            ("dut.out_0", "dut.out_0"),
        ],
        TimeSource::Port("clock.time_port".to_string()),
    )?;

    let queue = EventQueue::new("timer_q", 1).with_on_full(OnFull::Drop);
    sim.synchronize(&queue, "clock.time")?;

    let mut collector = StatsCollector::new();
    collector.set_name("register_testbench");
    collector.start();

    let timer = Timer::spawn("timer", queue.sender(), TICK, DURATION, Some(sim.stop_handle()))?;
    let summary = sim.run()?;
    let report = timer.join()?;

    collector.stop();
    collector.update_from_json(&sim.export_stats());

    println!("==== Register testbench ====");
    println!(
        "{} steps, stopped by {:?}; timer sent {} ticks ({} dropped)",
        summary.steps, summary.reason, report.ticks, report.dropped
    );
    println!("{}", collector.stats().summary());
    println!("Waveforms written to logs/waveforms.vcd");
    Ok(())
}

fn codegen() -> DemoResult<()> {
    let options = CodegenOptions::default()
        .with_language("VHDL")
        .with_entity_name("register")
        .with_architecture_name("rtl");
    let hdl = generate(&parts::register("dut"), &options, None)?;

    let path = Path::new("gen").join("register.vhd");
    fs::create_dir_all("gen")?;
    fs::write(&path, hdl.text())?;
    println!("VHDL code generated in {}", path.display());
    Ok(())
}

fn snapshot() -> DemoResult<()> {
    let snapshot = Snapshot::capture(&testbench())?;
    let path = Path::new("gen").join("testbench.json");
    fs::create_dir_all("gen")?;
    fs::write(&path, snapshot.to_json()?)?;
    println!(
        "Snapshot of '{}' ({} parts, {} connections) written to {}",
        snapshot.part.identifier,
        snapshot.part.inner_parts.len(),
        snapshot.part.connections.len(),
        path.display()
    );
    Ok(())
}

fn main() -> DemoResult<()> {
    init_logging("info");

    match std::env::args().nth(1).as_deref() {
        None | Some("simulate") => simulate(),
        Some("codegen") => codegen(),
        Some("snapshot") => snapshot(),
        Some(other) => Err(format!("unknown command '{other}'").into()),
    }
}
