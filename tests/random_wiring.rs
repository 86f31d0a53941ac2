//! Randomly wired gate networks: whatever the topology, a legal design never
//! writes a port twice in one step, and both execution strategies agree.

use kairo::{
    parts, EngineConfig, Execution, FnBehavior, Logic, Part, PortSpec, Propagation, Simulation,
    Value,
};

const STIMULUS_PORTS: usize = 4;

struct XorShift(u64);

impl XorShift {
    fn next(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next() % n as u64) as usize
    }
}

fn stimulus(seed: u64) -> Part {
    let mut rng = XorShift(seed);
    let mut part = Part::leaf(
        "stim",
        FnBehavior::new(move |ctx| {
            for i in 0..STIMULUS_PORTS {
                let level = if rng.next() & 1 == 1 { Logic::One } else { Logic::Zero };
                ctx.write(&format!("s{i}"), level)?;
            }
            Ok(())
        }),
    );
    for i in 0..STIMULUS_PORTS {
        part = part.with_port(PortSpec::output(format!("s{i}")).logic());
    }
    part
}

/// Gates are added in order and each input picks a driver among the stimulus
/// outputs and earlier gates, so every input has exactly one driver.
fn network(seed: u64, gates: usize, execution: Execution) -> Part {
    let mut rng = XorShift(seed);
    let mut drivers: Vec<String> = (0..STIMULUS_PORTS).map(|i| format!("stim.s{i}")).collect();
    let mut top = Part::composite("net", execution).with_child(stimulus(seed ^ 0x9e37_79b9));

    for g in 0..gates {
        let name = format!("g{g}");
        let gate = match rng.below(4) {
            0 => parts::and_gate(&name),
            1 => parts::or_gate(&name),
            2 => parts::xor_gate(&name),
            _ => parts::not_gate(&name),
        };
        let inputs: &[&str] = if gate.class() == "Not" { &["a"] } else { &["a", "b"] };
        top = top.with_child(gate);
        for input in inputs {
            let from = drivers[rng.below(drivers.len())].clone();
            top = top.wire(from, format!("{name}.{input}"));
        }
        drivers.push(format!("{name}.y"));
    }
    top
}

fn outputs(sim: &Simulation, gates: usize) -> Vec<Option<Value>> {
    (0..gates)
        .map(|g| sim.design().peek(&format!("g{g}.y")).unwrap())
        .collect()
}

#[test]
fn test_random_networks_never_overwrite() {
    for seed in 1..=20_u64 {
        for propagation in [Propagation::SingleHop, Propagation::Transitive] {
            let config = EngineConfig::new()
                .with_max_steps(50)
                .with_propagation(propagation);
            let mut sim = Simulation::from_part(network(seed, 24, Execution::Sequential), config).unwrap();
            let result = sim.run();
            assert!(result.is_ok(), "seed {seed} {propagation:?}: {:?}", result.err());
        }
    }
}

#[test]
fn test_random_networks_strategies_agree() {
    for seed in [3_u64, 17, 42, 1234] {
        let run = |execution| {
            let config = EngineConfig::new().with_max_steps(40);
            let mut sim = Simulation::from_part(network(seed, 32, execution), config).unwrap();
            sim.run().unwrap();
            outputs(&sim, 32)
        };
        assert_eq!(run(Execution::Sequential), run(Execution::Concurrent), "seed {seed}");
    }
}
