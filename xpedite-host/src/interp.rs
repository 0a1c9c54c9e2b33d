//! Interpreter for unit method bodies.

use thiserror::Error;
use tracing::trace;
use xpedite::{
    CallsiteId, RecordingEngine,
    trampoline::RECORD_ENTRY_POINT,
    unit::{Instr, Op, Unit},
};

const MAX_CALL_DEPTH: usize = 256;

/// How a method invocation finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    Returned,
    Threw(String),
}

/// How a block finished.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Flow {
    Normal,
    Return,
    Throw(String),
}

/// Runs methods of one unit. Record entry point calls go to `engine`.
pub struct Machine<'a> {
    unit: &'a Unit,
    engine: &'a dyn RecordingEngine,
}

impl<'a> Machine<'a> {
    pub fn new(unit: &'a Unit, engine: &'a dyn RecordingEngine) -> Self {
        Self { unit, engine }
    }

    /// Invoke `method` with `arg`.
    pub fn invoke(&self, method: &str, arg: i64) -> Result<Completion, ExecError> {
        self.call(method, arg, 0)
    }

    fn call(&self, method: &str, arg: i64, depth: usize) -> Result<Completion, ExecError> {
        if depth >= MAX_CALL_DEPTH {
            return Err(ExecError::StackOverflow {
                method: method.to_owned(),
            });
        }
        let body = &self
            .unit
            .method(method)
            .ok_or_else(|| ExecError::UnknownMethod {
                unit: self.unit.name.clone(),
                method: method.to_owned(),
            })?
            .body;

        Ok(match self.run_block(body, arg, depth)? {
            Flow::Normal | Flow::Return => Completion::Returned,
            Flow::Throw(message) => Completion::Threw(message),
        })
    }

    fn run_block(&self, block: &[Instr], arg: i64, depth: usize) -> Result<Flow, ExecError> {
        for instr in block {
            let flow = self.step(instr, arg, depth)?;
            if flow != Flow::Normal {
                return Ok(flow);
            }
        }

        Ok(Flow::Normal)
    }

    fn step(&self, instr: &Instr, arg: i64, depth: usize) -> Result<Flow, ExecError> {
        match &instr.op {
            Op::CallStatic { target, arg: id } => {
                if target.as_str() != RECORD_ENTRY_POINT {
                    return Err(ExecError::UnknownTarget(target.clone()));
                }
                let id = u32::try_from(*id).map_err(|_| ExecError::InvalidCallsiteId(*id))?;
                self.engine.record_event(CallsiteId::from(id));
            }
            Op::Invoke { method } => {
                if let Completion::Threw(message) = self.call(method, arg, depth + 1)? {
                    return Ok(Flow::Throw(message));
                }
            }
            Op::Work { label } => trace!(unit = %self.unit.name, label = %label, "work"),
            Op::Repeat { times, body } => {
                for _ in 0..*times {
                    let flow = self.run_block(body, arg, depth)?;
                    if flow != Flow::Normal {
                        return Ok(flow);
                    }
                }
            }
            Op::IfArgEquals { value, then } => {
                if arg == *value {
                    return self.run_block(then, arg, depth);
                }
            }
            Op::Return => return Ok(Flow::Return),
            Op::Throw { message } => return Ok(Flow::Throw(message.clone())),
            Op::Finally { body, handler } => {
                let outcome = self.run_block(body, arg, depth)?;
                // An abrupt handler replaces the body's outcome.
                let handled = self.run_block(handler, arg, depth)?;
                if handled != Flow::Normal {
                    return Ok(handled);
                }
                return Ok(outcome);
            }
        }

        Ok(Flow::Normal)
    }
}

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("unit `{unit}` has no method `{method}`")]
    UnknownMethod { unit: String, method: String },
    #[error("unknown static call target `{0}`")]
    UnknownTarget(String),
    #[error("invalid call site Id {0}")]
    InvalidCallsiteId(i32),
    #[error("call depth exceeded invoking `{method}`")]
    StackOverflow { method: String },
}
