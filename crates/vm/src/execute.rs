//! Main execution loop and opcode dispatch.

use bvm_common::{ConstantPool, Instruction, Opcode};
use tracing::{debug, instrument, trace, warn};

use crate::error::{ErrorKind, RuntimeError};
use crate::frame::StackFrame;
use crate::machine::Machine;

impl<'a> Machine<'a> {
    /// Run the program from its entry function until the outermost call
    /// returns or the stream ends.
    ///
    /// Returns the entry frame as it was when it retired, so the caller can
    /// read the final register and local state.
    #[instrument(skip_all, fields(entry = tracing::field::Empty))]
    pub fn exec_main(&mut self) -> Result<StackFrame<'a>, RuntimeError> {
        self.start()?;
        while self.step()? {}
        self.finish()
    }

    /// Reset the machine and push the entry frame, ready for [`step`].
    ///
    /// [`step`]: Machine::step
    pub fn start(&mut self) -> Result<(), RuntimeError> {
        self.stack.unwind();
        self.retired = None;
        self.faulted = None;
        self.ip = 0;
        self.at = 0;

        if let Err(kind) = self.push_entry() {
            return Err(self.abort(kind, None));
        }
        Ok(())
    }

    fn push_entry(&mut self) -> Result<(), ErrorKind> {
        let program = self.program;
        let entry = program
            .entry_function()
            .ok_or(ErrorKind::NoEntryFunction(program.entry))?;
        let address = self.code_address(entry)?;
        tracing::Span::current().record("entry", entry.name.as_str());
        trace!(listing = %program.disassemble(), "program");

        self.stack.push(StackFrame::new(entry, 0, &[]))?;
        self.ip = address;
        Ok(())
    }

    /// Execute one instruction.
    ///
    /// Returns `Ok(true)` if the machine can keep going. Hosts that want to
    /// cancel a run can drive this in their own loop after [`start`]. Once a
    /// failure aborts the run, every further call returns that failure.
    ///
    /// [`start`]: Machine::start
    pub fn step(&mut self) -> Result<bool, RuntimeError> {
        if let Some(err) = &self.faulted {
            return Err(err.clone());
        }
        if !self.is_running() {
            return Ok(false);
        }
        let program = self.program;
        let instr = &program.instructions[self.ip];
        self.at = self.ip;
        self.ip += 1;
        trace!(at = self.at, depth = self.stack.depth(), "{instr}");

        if let Err(kind) = self.dispatch(instr) {
            return Err(self.abort(kind, Some(instr.code)));
        }
        Ok(self.is_running())
    }

    /// Hand back the entry frame of a run that has stopped.
    fn finish(&mut self) -> Result<StackFrame<'a>, RuntimeError> {
        if let Some(frame) = self.retired.take() {
            return Ok(frame);
        }
        let depth = self.stack.depth();
        debug!(ip = self.ip, depth, "ran off end of stream");
        if depth > 1 {
            return Err(self.abort(ErrorKind::UnterminatedCall { depth }, None));
        }
        self.stack
            .unwind()
            .ok_or_else(|| self.abort(ErrorKind::NoActiveFrame, None))
    }

    /// Latch `kind` as the failure of this run.
    fn abort(&mut self, kind: ErrorKind, opcode: Option<i32>) -> RuntimeError {
        let err = self.fail(kind, opcode);
        warn!(%err, "execution aborted");
        self.faulted = Some(err.clone());
        err
    }

    fn dispatch(&mut self, instr: &Instruction) -> Result<(), ErrorKind> {
        let op = instr
            .opcode()
            .map_err(|_| ErrorKind::UnknownOpcode(instr.code))?;
        let ops = operands(op, instr)?;

        match op {
            // Control transfer
            Opcode::Goto => self.jump(ops[0]),
            Opcode::Ifeq
            | Opcode::Ifne
            | Opcode::Iflt
            | Opcode::Ifge
            | Opcode::Ifgt
            | Opcode::Ifle => self.exec_branch(op, ops),
            Opcode::Call => self.exec_call(ops),
            Opcode::Ret => self.exec_ret(ops),

            // Everything else only touches the active frame
            _ => {
                let program = self.program;
                let frame = self.active_frame_mut()?;
                exec_in_frame(frame, &program.constants, op, ops)
            }
        }
    }

    fn exec_branch(&mut self, op: Opcode, ops: &[i32]) -> Result<(), ErrorKind> {
        let flag = self.active_frame()?.regs.flag(ops[0])?;
        let taken = match op {
            Opcode::Ifeq => flag == 0,
            Opcode::Ifne => flag != 0,
            Opcode::Iflt => flag < 0,
            Opcode::Ifge => flag >= 0,
            Opcode::Ifgt => flag > 0,
            Opcode::Ifle => flag <= 0,
            _ => return Err(ErrorKind::UnimplementedOpcode(op)),
        };
        if taken {
            self.jump(ops[1])?;
        }
        Ok(())
    }
}

/// The operand prefix `op` needs, or an error if the instruction is short.
fn operands(op: Opcode, instr: &Instruction) -> Result<&[i32], ErrorKind> {
    let expected = op.operand_count();
    instr
        .operands
        .get(..expected)
        .ok_or(ErrorKind::MissingOperands {
            opcode: op,
            expected,
            found: instr.operands.len(),
        })
}

/// Opcodes whose effects stay inside the active frame.
fn exec_in_frame(
    frame: &mut StackFrame<'_>,
    pool: &ConstantPool,
    op: Opcode,
    ops: &[i32],
) -> Result<(), ErrorKind> {
    let regs = &mut frame.regs;
    match op {
        Opcode::Nop => {}

        // Constant loads
        Opcode::Iconst => regs.set_int(ops[1], pool.integer(ops[0])?)?,
        Opcode::Fconst => regs.set_float(ops[1], pool.float(ops[0])?)?,
        Opcode::Sconst => regs.set_string(ops[1], pool.string(ops[0])?.to_owned())?,
        Opcode::Iconst0 => regs.set_int(ops[0], 0)?,
        Opcode::Iconst1 => regs.set_int(ops[0], 1)?,
        Opcode::Iconst2 => regs.set_int(ops[0], 2)?,
        Opcode::Iconst3 => regs.set_int(ops[0], 3)?,
        Opcode::Iconst4 => regs.set_int(ops[0], 4)?,
        Opcode::Iconst5 => regs.set_int(ops[0], 5)?,
        Opcode::Fconst0 => regs.set_float(ops[0], 0.0)?,
        Opcode::Fconst1 => regs.set_float(ops[0], 1.0)?,
        Opcode::Fconst2 => regs.set_float(ops[0], 2.0)?,
        Opcode::Fconst3 => regs.set_float(ops[0], 3.0)?,
        Opcode::Fconst4 => regs.set_float(ops[0], 4.0)?,
        Opcode::Fconst5 => regs.set_float(ops[0], 5.0)?,
        Opcode::Bconst0 => regs.set_flag(ops[0], 0)?,
        Opcode::Bconst1 => regs.set_flag(ops[0], 1)?,

        // Local loads: (local, reg)
        Opcode::Iload => regs.set_int(ops[1], frame.locals.int(ops[0])?)?,
        Opcode::Fload => regs.set_float(ops[1], frame.locals.float(ops[0])?)?,
        Opcode::Sload => regs.set_string(ops[1], frame.locals.string(ops[0])?.to_owned())?,
        Opcode::Bload => regs.set_flag(ops[1], frame.locals.flag(ops[0])?)?,

        // Local stores: (reg, local)
        Opcode::Istore => frame.locals.set_int(ops[1], regs.int(ops[0])?)?,
        Opcode::Fstore => frame.locals.set_float(ops[1], regs.float(ops[0])?)?,
        Opcode::Sstore => frame.locals.set_string(ops[1], regs.string(ops[0])?.to_owned())?,
        Opcode::Bstore => frame.locals.set_flag(ops[1], regs.flag(ops[0])?)?,

        // Integer arithmetic wraps; division and remainder trap on zero.
        Opcode::Iadd => {
            let (a, b) = (regs.int(ops[0])?, regs.int(ops[1])?);
            regs.set_int(ops[2], a.wrapping_add(b))?;
        }
        Opcode::Isub => {
            let (a, b) = (regs.int(ops[0])?, regs.int(ops[1])?);
            regs.set_int(ops[2], a.wrapping_sub(b))?;
        }
        Opcode::Imul => {
            let (a, b) = (regs.int(ops[0])?, regs.int(ops[1])?);
            regs.set_int(ops[2], a.wrapping_mul(b))?;
        }
        Opcode::Idiv => {
            let (a, b) = (regs.int(ops[0])?, regs.int(ops[1])?);
            if b == 0 {
                return Err(ErrorKind::DivisionByZero);
            }
            regs.set_int(ops[2], a.wrapping_div(b))?;
        }
        Opcode::Imod => {
            let (a, b) = (regs.int(ops[0])?, regs.int(ops[1])?);
            if b == 0 {
                return Err(ErrorKind::DivisionByZero);
            }
            regs.set_int(ops[2], a.wrapping_rem(b))?;
        }
        Opcode::Ineg => regs.set_int(ops[1], regs.int(ops[0])?.wrapping_neg())?,

        // Float arithmetic is plain IEEE-754.
        Opcode::Fadd => {
            let (a, b) = (regs.float(ops[0])?, regs.float(ops[1])?);
            regs.set_float(ops[2], a + b)?;
        }
        Opcode::Fsub => {
            let (a, b) = (regs.float(ops[0])?, regs.float(ops[1])?);
            regs.set_float(ops[2], a - b)?;
        }
        Opcode::Fmul => {
            let (a, b) = (regs.float(ops[0])?, regs.float(ops[1])?);
            regs.set_float(ops[2], a * b)?;
        }
        Opcode::Fdiv => {
            let (a, b) = (regs.float(ops[0])?, regs.float(ops[1])?);
            regs.set_float(ops[2], a / b)?;
        }
        Opcode::Fmod => {
            let (a, b) = (regs.float(ops[0])?, regs.float(ops[1])?);
            regs.set_float(ops[2], a % b)?;
        }
        Opcode::Fneg => regs.set_float(ops[1], -regs.float(ops[0])?)?,

        Opcode::Sadd => {
            let joined = [regs.string(ops[0])?, regs.string(ops[1])?].concat();
            regs.set_string(ops[2], joined)?;
        }

        // Moves: (src, dest)
        Opcode::Imove => regs.set_int(ops[1], regs.int(ops[0])?)?,
        Opcode::Fmove => regs.set_float(ops[1], regs.float(ops[0])?)?,
        Opcode::Smove => regs.set_string(ops[1], regs.string(ops[0])?.to_owned())?,
        Opcode::Bmove => regs.set_flag(ops[1], regs.flag(ops[0])?)?,

        // Three-way compares into a flag register
        Opcode::Icmp => {
            let flag = compare(&regs.int(ops[0])?, &regs.int(ops[1])?);
            regs.set_flag(ops[2], flag)?;
        }
        Opcode::Fcmp => {
            let flag = compare(&regs.float(ops[0])?, &regs.float(ops[1])?);
            regs.set_flag(ops[2], flag)?;
        }
        Opcode::Scmp => {
            let flag = compare(regs.string(ops[0])?, regs.string(ops[1])?);
            regs.set_flag(ops[2], flag)?;
        }
        Opcode::Bcmp => {
            let flag = compare(&regs.flag(ops[0])?, &regs.flag(ops[1])?);
            regs.set_flag(ops[2], flag)?;
        }

        // Reference-typed loads/stores, conversions and constructors are
        // part of the catalog but not executed here.
        _ => return Err(ErrorKind::UnimplementedOpcode(op)),
    }
    Ok(())
}

/// `0` if equal, `1` if `a > b`, otherwise `-1` (including unordered floats).
fn compare<T: PartialOrd + ?Sized>(a: &T, b: &T) -> i32 {
    if a == b {
        0
    } else if a > b {
        1
    } else {
        -1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compare_is_three_way() {
        assert_eq!(compare(&1i64, &2), -1);
        assert_eq!(compare(&2i64, &2), 0);
        assert_eq!(compare(&3i64, &2), 1);
        assert_eq!(compare("abc", "abd"), -1);
        assert_eq!(compare(&f64::NAN, &1.0), -1);
    }

    #[test]
    fn short_instruction_is_rejected() {
        let instr = Instruction::new(Opcode::Iadd, &[0, 1]);
        assert_eq!(
            operands(Opcode::Iadd, &instr),
            Err(ErrorKind::MissingOperands {
                opcode: Opcode::Iadd,
                expected: 3,
                found: 2,
            })
        );
    }

    #[test]
    fn extra_operands_are_ignored() {
        let instr = Instruction::new(Opcode::Goto, &[4, 9]);
        assert_eq!(operands(Opcode::Goto, &instr), Ok(&[4][..]));
    }
}
