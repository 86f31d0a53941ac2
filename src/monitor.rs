//! Waveform monitoring.
//!
//! A [`WaveformMonitor`] is attached to a simulation with a mapping from
//! display names to port paths and a [`TimeSource`]. After every step it dumps
//! the monitored ports that were updated in that step, stamped with the
//! current value of the time source.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::design::Design;
use crate::error::{SimError, SimResult};
use crate::types::{PortId, SimTime};
use crate::value::Value;
use crate::vcd::{VarKind, VcdWriter};

/// Where dump timestamps come from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeSource {
    /// The current value of a port. Integer values are used as is; real
    /// values are multiplied by the monitor's real scale.
    Port(String),
    /// The engine's simulated time.
    SimTime,
}

/// One dumped value change.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DumpRecord {
    pub time: u64,
    pub name: String,
    pub value: Value,
}

struct Signal {
    name: String,
    port: PortId,
    var: usize,
}

/// Records value changes of monitored ports in VCD format.
pub struct WaveformMonitor {
    writer: VcdWriter<Box<dyn Write + Send>>,
    real_scale: f64,
    signals: Vec<Signal>,
    time_port: Option<PortId>,
    time_path: Option<String>,
    last_time: Option<u64>,
    records: Vec<DumpRecord>,
    keep_records: bool,
    finalized: bool,
}

impl WaveformMonitor {
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Self {
            writer: VcdWriter::new(Box::new(writer)),
            real_scale: 1000.0,
            signals: Vec::new(),
            time_port: None,
            time_path: None,
            last_time: None,
            records: Vec::new(),
            keep_records: false,
            finalized: false,
        }
    }

    /// Creates a monitor dumping to a new file at `path`.
    pub fn to_file(path: impl AsRef<Path>) -> SimResult<Self> {
        let path = path.as_ref();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        let file = File::create(path)?;
        tracing::info!(path = %path.display(), "waveform dump opened");
        Ok(Self::new(BufWriter::new(file)))
    }

    pub fn with_timescale(mut self, timescale: impl Into<String>) -> Self {
        self.writer = self.writer.with_timescale(timescale);
        self
    }

    /// Multiplier applied to real-valued time sources. The default of 1000
    /// turns seconds into the default `1ms` timescale.
    pub fn with_real_scale(mut self, scale: f64) -> Self {
        self.real_scale = scale;
        self
    }

    /// Keeps every dumped record in memory for [`records`](Self::records).
    /// Off by default; the dump file is the primary output.
    pub fn with_records(mut self, keep: bool) -> Self {
        self.keep_records = keep;
        self
    }

    /// Binds the monitor to a design and declares the dump variables.
    pub(crate) fn bind<I, N, P>(&mut self, design: &Design, signals: I, time: TimeSource) -> SimResult<()>
    where
        I: IntoIterator<Item = (N, P)>,
        N: Into<String>,
        P: AsRef<str>,
    {
        self.time_port = match &time {
            TimeSource::Port(path) => {
                let id = design.resolve_port(path)?;
                self.time_path = Some(design.port_path(id));
                Some(id)
            }
            TimeSource::SimTime => None,
        };

        for (name, path) in signals {
            let name = name.into();
            let port = design.resolve_port(path.as_ref())?;
            if self.signals.iter().any(|s| s.name == name) {
                return Err(SimError::DuplicateName {
                    scope: "monitor".to_string(),
                    name,
                });
            }
            let kind = VarKind::for_type(design.port(port).value_type());
            let var = self.writer.declare(&name, kind)?;
            self.signals.push(Signal { name, port, var });
        }
        tracing::debug!(signals = self.signals.len(), ?time, "monitor attached");
        Ok(())
    }

    fn timestamp(&self, design: &Design, sim_time: SimTime) -> SimResult<Option<u64>> {
        let Some(port) = self.time_port else {
            return Ok(Some(sim_time));
        };
        let path = || self.time_path.clone().unwrap_or_default();
        match design.port(port).peek() {
            None => Ok(None),
            Some(Value::Int(t)) if t >= 0 => Ok(Some(t as u64)),
            Some(Value::Real(t)) if t >= 0.0 && t.is_finite() => {
                Ok(Some((t * self.real_scale).round() as u64))
            }
            Some(other) => Err(SimError::InvalidTimeSource {
                port: path(),
                found: other.to_string(),
            }),
        }
    }

    /// Dumps every monitored port updated in the current step.
    ///
    /// Returns the number of records written.
    pub(crate) fn observe(&mut self, design: &Design, sim_time: SimTime) -> SimResult<usize> {
        let updated: Vec<usize> = (0..self.signals.len())
            .filter(|&i| design.port(self.signals[i].port).is_updated())
            .collect();
        if updated.is_empty() {
            return Ok(0);
        }
        let Some(time) = self.timestamp(design, sim_time)? else {
            tracing::debug!(sim_time, "time source has no value yet, changes not dumped");
            return Ok(0);
        };
        if let Some(last) = self.last_time {
            if time < last {
                return Err(SimError::MonitorTimeOrder {
                    signal: self.signals[updated[0]].name.clone(),
                    time,
                    last,
                });
            }
        }

        let mut written = 0;
        for &i in &updated {
            let signal = &self.signals[i];
            let Some(value) = design.port(signal.port).peek() else {
                continue;
            };
            self.writer.change(time, signal.var, value)?;
            written += 1;
            tracing::trace!(time, signal = %signal.name, %value, "dumped");
            if self.keep_records {
                self.records.push(DumpRecord {
                    time,
                    name: signal.name.clone(),
                    value,
                });
            }
        }
        self.last_time = Some(time);
        Ok(written)
    }

    /// Flushes the dump. Further calls are no-ops.
    pub fn finalize(&mut self) -> SimResult<()> {
        if self.finalized {
            return Ok(());
        }
        self.finalized = true;
        self.writer.finalize()?;
        tracing::debug!(records = self.records.len(), "waveform dump finalized");
        Ok(())
    }

    pub fn records(&self) -> &[DumpRecord] {
        &self.records
    }

    pub fn signal_names(&self) -> impl Iterator<Item = &str> {
        self.signals.iter().map(|s| s.name.as_str())
    }
}
