//! The compiler backend abstraction and the driving loop.
//!
//! A backend is a pure emitter for one controller dialect: given an action
//! and the cursor snapshot derived from it, it returns zero or one
//! declaration lines and zero or one instruction lines. The driving loop
//! ([`compile`]) owns all sequencing — it advances a private cursor in
//! lockstep with the action list, collects the emitted lines, and assembles
//! the final program by plain concatenation. Backends never mutate the
//! cursor.

use crate::action::{Action, ActionKind};
use crate::cursor::{Cursor, DeviceState};
use crate::error::CompileError;
use crate::geometry::round_to;
use crate::queue::ActionQueue;
use tracing::debug;

/// Addressing strategy for emitted targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Addressing {
    /// Instructions embed literal numeric targets.
    Inline,
    /// A first pass declares symbolic variables, named by a running index;
    /// instructions then reference the variable instead of a literal.
    Variables,
}

/// Which pending actions one compile pass reads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Consume {
    /// The next contiguous block.
    Block,
    /// Everything pending.
    All,
}

/// How one emitted instruction addresses its target: a literal value or a
/// previously declared variable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Target {
    Inline,
    Variable(usize),
}

/// Options for one compile pass.
#[derive(Clone, Copy, Debug)]
pub struct CompileOptions {
    pub consume: Consume,
    /// Remove the compiled actions from the source queue on success.
    pub drain: bool,
    pub addressing: Addressing,
    /// Suffix every non-comment instruction with the action's description.
    pub annotate: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            consume: Consume::All,
            drain: false,
            addressing: Addressing::Inline,
            annotate: false,
        }
    }
}

/// Numeric and structural configuration of one controller dialect.
///
/// Rounding and unit conversion are per physical unit class and applied
/// uniformly to every value of that class, so a fixed action sequence always
/// renders to byte-identical text.
#[derive(Clone, Debug)]
pub struct Dialect {
    pub name: &'static str,
    pub comment_leader: char,
    /// Fallback motion parameters in native units, substituted when the
    /// corresponding cursor setting is unset (zero).
    pub default_speed: f64,
    pub default_acceleration: f64,
    pub default_joint_speed: f64,
    pub default_joint_acceleration: f64,
    pub digital_pins: usize,
    pub analog_pins: usize,
    pub analog_min: f64,
    pub analog_max: f64,
    /// Decimal places per unit class, applied after unit conversion.
    pub length_decimals: u32,
    pub angle_decimals: u32,
    pub voltage_decimals: u32,
    /// Multiplier from cursor lengths (mm) to native length units.
    pub length_factor: f64,
    /// Multiplier from cursor angles (degrees) to native angle units.
    pub angle_factor: f64,
}

impl Dialect {
    /// Converts a length given in mm to native units and rounds it.
    pub fn length(&self, mm: f64) -> f64 {
        round_to(mm * self.length_factor, self.length_decimals)
    }

    /// Converts an angle given in degrees to native units and rounds it.
    pub fn angle(&self, degrees: f64) -> f64 {
        round_to(degrees * self.angle_factor, self.angle_decimals)
    }

    /// Rounds an already-normalized voltage value.
    pub fn voltage(&self, value: f64) -> f64 {
        round_to(value, self.voltage_decimals)
    }
}

/// One controller dialect's emitter.
///
/// Both emission methods are pure functions of `(action, state)`: no side
/// effects beyond returning text. Dispatch over [`ActionKind`] must be an
/// exhaustive `match` so adding a variant fails the build until every
/// backend handles it.
pub trait CompilerBackend {
    fn dialect(&self) -> &Dialect;

    /// Symbolic-variable declaration for this action, if it declares one.
    /// Only consulted in [`Addressing::Variables`] mode.
    fn declaration(&self, action: &Action, state: &DeviceState, index: usize) -> Option<String>;

    /// Instruction line for this action, addressed per `target`.
    ///
    /// Recoverable problems (an unsupported setting, an out-of-range pin)
    /// are downgraded to an inline diagnostic comment; only structural
    /// failures return an error and abort the pass.
    fn instruction(
        &self,
        action: &Action,
        state: &DeviceState,
        target: Target,
    ) -> Result<Option<String>, CompileError>;

    /// Program-open delimiter, qualified by the program name.
    fn program_open(&self, name: &str) -> String;

    /// Program-close delimiter.
    fn program_close(&self) -> String;

    /// Final line invoking the assembled program by name.
    fn program_invocation(&self, name: &str) -> String;
}

/// Compiles pending actions into a complete native program.
///
/// The queue is read as an exclusive point-in-time snapshot before folding;
/// on error no partial program is returned and the queue is left untouched.
/// On success the compiled prefix is removed iff `options.drain`.
pub fn compile<B: CompilerBackend>(
    backend: &B,
    program_name: &str,
    queue: &mut ActionQueue,
    options: CompileOptions,
) -> Result<Vec<String>, CompileError> {
    let actions = match options.consume {
        Consume::Block => queue.peek_block(false),
        Consume::All => queue.peek_all(false),
    };
    debug!(
        program = program_name,
        dialect = backend.dialect().name,
        actions = actions.len(),
        "compile pass"
    );

    let mut writer = Cursor::new();
    let mut declarations = Vec::new();
    let mut instructions = Vec::new();

    for (index, action) in actions.iter().enumerate() {
        writer.issue(action.clone());
        let state = writer.apply_next().map_err(CompileError::from)?;

        if options.addressing == Addressing::Variables {
            if let Some(line) = backend.declaration(action, state, index) {
                declarations.push(line);
            }
        }

        let target = match options.addressing {
            Addressing::Inline => Target::Inline,
            Addressing::Variables => Target::Variable(index),
        };
        if let Some(mut line) = backend.instruction(action, state, target)? {
            if options.annotate && !matches!(action.kind(), ActionKind::Comment { .. }) {
                line = format!("{line}  {} [{action}]", backend.dialect().comment_leader);
            }
            instructions.push(line);
        }
    }

    let mut program = disclaimer(backend.dialect(), program_name);
    program.push(String::new());
    program.push(backend.program_open(program_name));
    program.push(String::new());
    if !declarations.is_empty() {
        program.append(&mut declarations);
        program.push(String::new());
    }
    if !instructions.is_empty() {
        program.append(&mut instructions);
        program.push(String::new());
    }
    program.push(backend.program_close());
    program.push(String::new());
    program.push(backend.program_invocation(program_name));

    if options.drain {
        queue.remove_prefix(actions.len());
    }

    debug!(program = program_name, lines = program.len(), "compile complete");
    Ok(program)
}

fn disclaimer(dialect: &Dialect, name: &str) -> Vec<String> {
    let c = dialect.comment_leader;
    vec![
        format!("{c}{c} PROGRAM \"{name}\""),
        format!(
            "{c}{c} Compiled for {} from a device-agnostic action sequence.",
            dialect.name
        ),
        format!("{c}{c} Machine-generated file, review before running on a physical device."),
    ]
}
