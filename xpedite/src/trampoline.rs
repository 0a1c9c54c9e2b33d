use crate::{
    callsite::CallsiteId,
    unit::{Instr, Op},
};

/// The static entry point every trampoline calls.
pub const RECORD_ENTRY_POINT: &str = "com/xpedite/Xpedite.record";

/// Build the instruction that reports `id` to the recording engine.
///
/// The Id is embedded as a literal argument so nothing is looked up when the trampoline runs.
pub fn build_trampoline(id: CallsiteId) -> Instr {
    Instr::synthetic(Op::CallStatic {
        target: RECORD_ENTRY_POINT.to_owned(),
        arg: id.as_i32(),
    })
}

/// Returns the call site Id if `instr` is a trampoline.
pub fn trampoline_id(instr: &Instr) -> Option<CallsiteId> {
    match &instr.op {
        Op::CallStatic { target, arg } if target.as_str() == RECORD_ENTRY_POINT => {
            u32::try_from(*arg).ok().map(CallsiteId::from)
        }
        _ => None,
    }
}
