//! Structured representation of a unit of compiled code.
//!
//! A unit is the granularity at which code is loaded and rewritten: one class with its methods.
//! Method bodies are trees of [`Instr`]s. Instructions optionally carry the source line they were
//! compiled from, which is how anchored probes find their insertion point.
//!
//! See [`codec`] for the raw byte form that crosses the code-loading boundary.

use serde::{Deserialize, Serialize};

pub mod codec;

pub use codec::{ReadUnitError, WriteUnitError, decode, encode};

/// A loadable unit of code.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Unit {
    /// Slash separated unit name, e.g. `com/xpedite/demo/App`.
    pub name: String,
    pub methods: Vec<Method>,
}

impl Unit {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            methods: Vec::new(),
        }
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.methods.push(method);
        self
    }

    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods.iter().find(|method| method.name == name)
    }

    pub fn method_mut(&mut self, name: &str) -> Option<&mut Method> {
        self.methods.iter_mut().find(|method| method.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Method {
    pub name: String,
    pub body: Vec<Instr>,
}

impl Method {
    pub fn new(name: impl Into<String>, body: Vec<Instr>) -> Self {
        Self {
            name: name.into(),
            body,
        }
    }
}

/// One instruction, optionally tagged with the source line it came from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Instr {
    pub line: Option<u32>,
    pub op: Op,
}

impl Instr {
    /// An instruction with no source line.
    pub fn synthetic(op: Op) -> Self {
        Self { line: None, op }
    }

    pub fn at_line(line: u32, op: Op) -> Self {
        Self {
            line: Some(line),
            op,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub enum Op {
    /// Call a static entry point with a literal integer argument.
    CallStatic { target: String, arg: i32 },
    /// Call a method of the same unit, forwarding the current argument.
    Invoke { method: String },
    /// Opaque application work.
    Work { label: String },
    /// Run `body` a fixed number of times.
    Repeat { times: u32, body: Vec<Instr> },
    /// Run `then` when the method argument equals `value`.
    IfArgEquals { value: i64, then: Vec<Instr> },
    Return,
    Throw { message: String },
    /// Run `body`, then `handler` on every way out of `body`.
    Finally {
        body: Vec<Instr>,
        handler: Vec<Instr>,
    },
}

impl Op {
    /// Nested instruction blocks, in execution order.
    pub fn blocks_mut(&mut self) -> Vec<&mut Vec<Instr>> {
        match self {
            Self::Repeat { body, .. } => vec![body],
            Self::IfArgEquals { then, .. } => vec![then],
            Self::Finally { body, handler } => vec![body, handler],
            Self::CallStatic { .. }
            | Self::Invoke { .. }
            | Self::Work { .. }
            | Self::Return
            | Self::Throw { .. } => Vec::new(),
        }
    }
}
