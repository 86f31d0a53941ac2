//! Value Change Dump writer.
//!
//! Produces IEEE 1364 VCD text: a header declaring every variable, then
//! `#time` markers followed by the changes at that time. Identifier codes are
//! printable ASCII starting at `!`, growing to several characters past 94
//! variables.

use std::io::Write;

use crate::error::{SimError, SimResult};
use crate::logic::Logic;
use crate::value::{Value, ValueType};

/// VCD variable kind, derived from the declared port type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VarKind {
    /// One-bit wire for logic and boolean signals
    Wire,
    /// 64-bit integer
    Integer,
    /// Real number
    Real,
}

impl VarKind {
    pub fn for_type(ty: Option<ValueType>) -> Self {
        match ty {
            Some(ValueType::Int) => VarKind::Integer,
            Some(ValueType::Real) => VarKind::Real,
            Some(ValueType::Logic) | Some(ValueType::Bool) | None => VarKind::Wire,
        }
    }

    fn keyword(self) -> &'static str {
        match self {
            VarKind::Wire => "wire",
            VarKind::Integer => "integer",
            VarKind::Real => "real",
        }
    }

    fn width(self) -> u32 {
        match self {
            VarKind::Wire => 1,
            VarKind::Integer | VarKind::Real => 64,
        }
    }
}

#[derive(Debug)]
struct Var {
    name: String,
    code: String,
    kind: VarKind,
}

/// Streaming VCD writer.
pub struct VcdWriter<W: Write> {
    writer: W,
    vars: Vec<Var>,
    scope: String,
    timescale: String,
    version: String,
    header_written: bool,
    current_time: Option<u64>,
}

impl<W: Write> VcdWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            vars: Vec::new(),
            scope: "top".to_string(),
            timescale: "1ms".to_string(),
            version: format!("kairo {}", env!("CARGO_PKG_VERSION")),
            header_written: false,
            current_time: None,
        }
    }

    pub fn with_timescale(mut self, timescale: impl Into<String>) -> Self {
        self.timescale = timescale.into();
        self
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    pub fn timescale(&self) -> &str {
        &self.timescale
    }

    /// Declares a variable and returns its handle.
    ///
    /// Must be called before the first change is recorded.
    pub fn declare(&mut self, name: &str, kind: VarKind) -> SimResult<usize> {
        if self.header_written {
            return Err(SimError::InvalidState {
                state: "dumping".to_string(),
                action: format!("declare '{}' after the header", name),
            });
        }
        let index = self.vars.len();
        self.vars.push(Var {
            name: name.to_string(),
            code: id_code(index),
            kind,
        });
        Ok(index)
    }

    fn write_header(&mut self) -> SimResult<()> {
        writeln!(self.writer, "$date\n   simulation run\n$end")?;
        writeln!(self.writer, "$version\n   {}\n$end", self.version)?;
        writeln!(self.writer, "$timescale {} $end", self.timescale)?;
        writeln!(self.writer, "$scope module {} $end", self.scope)?;
        for var in &self.vars {
            writeln!(
                self.writer,
                "$var {} {} {} {} $end",
                var.kind.keyword(),
                var.kind.width(),
                var.code,
                var.name
            )?;
        }
        writeln!(self.writer, "$upscope $end")?;
        writeln!(self.writer, "$enddefinitions $end")?;
        self.header_written = true;
        Ok(())
    }

    /// Records a change of variable `var` at `time`.
    ///
    /// Times must be non-decreasing; a `#time` marker is written only when
    /// the time advances.
    pub fn change(&mut self, time: u64, var: usize, value: Value) -> SimResult<()> {
        if !self.header_written {
            self.write_header()?;
        }
        let Some(entry) = self.vars.get(var) else {
            return Err(SimError::UnknownPort(format!("vcd variable #{}", var)));
        };
        if let Some(last) = self.current_time {
            if time < last {
                return Err(SimError::MonitorTimeOrder {
                    signal: entry.name.clone(),
                    time,
                    last,
                });
            }
        }
        if self.current_time != Some(time) {
            writeln!(self.writer, "#{}", time)?;
            self.current_time = Some(time);
        }

        let entry = &self.vars[var];
        match (entry.kind, value) {
            (VarKind::Integer, Value::Int(i)) => writeln!(self.writer, "b{:b} {}", i, entry.code)?,
            (VarKind::Real, Value::Real(r)) => writeln!(self.writer, "r{} {}", r, entry.code)?,
            (VarKind::Real, Value::Int(i)) => writeln!(self.writer, "r{} {}", i as f64, entry.code)?,
            (VarKind::Wire, v) => {
                let c = v.as_logic().map_or('x', Logic::vcd_char);
                writeln!(self.writer, "{}{}", c, entry.code)?
            }
            (_, Value::Logic(l)) => writeln!(self.writer, "b{} {}", l.vcd_char(), entry.code)?,
            (_, _) => writeln!(self.writer, "bx {}", entry.code)?,
        }
        Ok(())
    }

    /// Last time marker written.
    pub fn current_time(&self) -> Option<u64> {
        self.current_time
    }

    /// Writes the header if nothing was dumped, then flushes.
    pub fn finalize(&mut self) -> SimResult<()> {
        if !self.header_written {
            self.write_header()?;
        }
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Generates the identifier code for a variable index.
fn id_code(index: usize) -> String {
    let mut code = String::new();
    let mut idx = index;
    loop {
        code.push((b'!' + (idx % 94) as u8) as char);
        idx /= 94;
        if idx == 0 {
            break;
        }
        idx -= 1;
    }
    code
}
