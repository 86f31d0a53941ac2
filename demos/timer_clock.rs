//! Configuration-driven gate network with a timer-fed clock.
//!
//! The design is declared in YAML and built through the default part
//! registry. A timer ticks every 20 ms for one second into a blocking queue;
//! the clock toggles on each tick and drives an XOR of itself with a delayed
//! inverted copy. Afterwards the XOR gate is rendered as VHDL using a small
//! rule-based translator in place of a remote one.

use std::time::Duration;

use kairo::codegen::{generate, CodegenOptions, FnTranslator, HdlLanguage, TranslateError};
use kairo::config::SimConfig;
use kairo::{create_default_registry, parts, EventQueue, Logic, OnFull, StopReason, Timer};

const DESIGN: &str = r#"
simulation:
  max_steps: 200000
  wall_timeout_ms: 5000
  propagation: single_hop
  log_level: kairo=info,warn

design:
  top: bench
  parts:
    - name: bench
      execution: concurrent
      children: [clock, inv, mix]
      wires:
        - { from: clock.clk, to: inv.a }
        - { from: clock.clk, to: mix.a }
        - { from: inv.y, to: mix.b }
    - name: clock
      type: Clock
    - name: inv
      type: Not
    - name: mix
      type: Xor
"#;

/// Turns `y <= a op b;` lines into a combinational process.
fn rule_based(source: &str, language: HdlLanguage) -> Result<String, TranslateError> {
    if language != HdlLanguage::Vhdl {
        return Err(TranslateError::Rejected(format!("{language} is not supported")));
    }
    let body: Vec<_> = source
        .lines()
        .map(str::trim)
        .filter(|line| line.contains("<="))
        .map(|line| format!("    {line}"))
        .collect();
    if body.is_empty() {
        return Err(TranslateError::Empty);
    }
    Ok(format!("process(all)\nbegin\n{}\nend process;", body.join("\n")))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = SimConfig::from_yaml(DESIGN)?;
    config.init_logging();

    let registry = create_default_registry();
    let mut sim = config.build_simulation(&registry)?;

    let queue = EventQueue::new("ticks", 4).with_on_full(OnFull::Block);
    sim.synchronize(&queue, "clock.time")?;
    let timer = Timer::spawn(
        "tick",
        queue.sender(),
        Duration::from_millis(20),
        Duration::from_secs(1),
        Some(sim.stop_handle()),
    )?;

    let summary = sim.run()?;
    let report = timer.join()?;

    println!("==== Timer-driven clock ====");
    println!("Timer ticks: {} queued, {} dropped", report.queued, report.dropped);
    println!("Steps executed: {} ({:?})", summary.steps, summary.reason);
    if summary.reason != StopReason::StopRequested {
        println!("Run ended before the timer finished");
    }
    let mix = sim
        .design()
        .peek("mix.y")?
        .and_then(|v| v.as_logic())
        .unwrap_or(Logic::U);
    println!("Final XOR output: {mix}");

    let translator = FnTranslator::new("rule-based", rule_based);
    let hdl = generate(&parts::xor_gate("mix"), &CodegenOptions::default(), Some(&translator))?;
    println!("\n{hdl}");
    Ok(())
}
