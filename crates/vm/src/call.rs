//! Call/return ABI: frame push/pop and signature-driven value marshalling.
//!
//! Bank selection across frames comes only from the callee's parameter and
//! return signatures. Arguments land in the callee's locals with one write
//! cursor per bank, so the second int parameter is int local 1 no matter
//! how many float or string parameters come before it.

use bvm_common::type_sig::ALL_BANKS;
use bvm_common::TypeSig;
use tracing::debug;

use crate::error::ErrorKind;
use crate::frame::{RegisterFile, StackFrame};
use crate::machine::Machine;

impl<'a> Machine<'a> {
    /// `CALL function_cp call_site_cp`
    pub(crate) fn exec_call(&mut self, ops: &[i32]) -> Result<(), ErrorKind> {
        let program = self.program;
        let func = program.constants.function(ops[0])?;
        let callee_info = program
            .function(func)
            .ok_or(ErrorKind::UnknownFunction {
                package_index: func.package_index,
                function_ref: func.function_ref,
            })?;
        let address = self.code_address(callee_info)?;
        let call_site = program.constants.call_site(ops[1])?;

        let params = &callee_info.param_sigs;
        let args = &call_site.arg_registers;
        if params.len() != args.len() {
            return Err(ErrorKind::ArgumentCountMismatch {
                params: params.len(),
                args: args.len(),
            });
        }

        let mut callee = StackFrame::new(callee_info, self.ip, &call_site.return_registers);
        bind_arguments(&self.active_frame()?.regs, &mut callee.locals, params, args)?;
        self.stack.push(callee)?;

        debug!(callee = %callee_info.name, depth = self.stack.depth(), "call");
        self.ip = address;
        Ok(())
    }

    /// `RET return_site_cp`
    pub(crate) fn exec_ret(&mut self, ops: &[i32]) -> Result<(), ErrorKind> {
        let program = self.program;
        let results = &program.constants.return_site(ops[0])?.result_registers;

        // The outermost frame has no caller to hand results to.
        if let Some((caller, callee)) = self.stack.caller_and_top() {
            let sigs = &callee.function.return_sigs;
            let targets = callee.return_registers;
            if results.len() != sigs.len() || results.len() != targets.len() {
                return Err(ErrorKind::ReturnCountMismatch {
                    results: results.len(),
                    signatures: sigs.len(),
                    registers: targets.len(),
                });
            }
            marshal_results(&callee.regs, &mut caller.regs, sigs, results, targets)?;
        }

        let frame = self.stack.pop().ok_or(ErrorKind::NoActiveFrame)?;
        debug!(function = %frame.function.name, depth = self.stack.depth(), "return");
        self.ip = frame.return_address;
        if self.stack.is_empty() {
            self.retired = Some(frame);
        }
        Ok(())
    }
}

/// Copy caller registers into callee locals, one independent cursor per bank.
fn bind_arguments(
    caller: &RegisterFile,
    callee: &mut RegisterFile,
    params: &[TypeSig],
    args: &[i32],
) -> Result<(), ErrorKind> {
    let mut cursors = [0i32; ALL_BANKS.len()];
    for (&sig, &reg) in params.iter().zip(args) {
        let bank = sig.bank().ok_or(ErrorKind::UnsupportedTypeSig(sig))?;
        let slot = &mut cursors[bank.index()];
        callee.copy_from(bank, *slot, caller, reg)?;
        *slot += 1;
    }
    Ok(())
}

/// Copy callee result registers into the caller's target registers.
///
/// Every slot is checked before the first write, so a fault leaves the
/// caller untouched.
fn marshal_results(
    callee: &RegisterFile,
    caller: &mut RegisterFile,
    sigs: &[TypeSig],
    results: &[i32],
    targets: &[i32],
) -> Result<(), ErrorKind> {
    let mut banks = Vec::with_capacity(sigs.len());
    for ((&sig, &from), &to) in sigs.iter().zip(results).zip(targets) {
        let bank = sig.bank().ok_or(ErrorKind::UnsupportedTypeSig(sig))?;
        callee.check(bank, from)?;
        caller.check(bank, to)?;
        banks.push(bank);
    }
    for ((bank, &from), &to) in banks.into_iter().zip(results).zip(targets) {
        caller.copy_from(bank, to, callee, from)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{BankFault, Space};
    use bvm_common::{Bank, BankSizes};

    #[test]
    fn cursors_advance_per_bank() {
        let mut caller = RegisterFile::new(Space::Register, &BankSizes::new(3, 2, 1, 0));
        caller.set_int(0, 10).unwrap();
        caller.set_float(1, 2.5).unwrap();
        caller.set_int(2, 30).unwrap();
        caller.set_string(0, "s".into()).unwrap();

        let mut callee = RegisterFile::new(Space::Local, &BankSizes::new(2, 1, 1, 0));
        bind_arguments(
            &caller,
            &mut callee,
            &[TypeSig::Int, TypeSig::Float, TypeSig::String, TypeSig::Int],
            &[0, 1, 0, 2],
        )
        .unwrap();

        assert_eq!(callee.ints(), &[10, 30]);
        assert_eq!(callee.float(0), Ok(2.5));
        assert_eq!(callee.string(0), Ok("s"));
    }

    #[test]
    fn reference_parameter_is_unsupported() {
        let caller = RegisterFile::new(Space::Register, &BankSizes::default());
        let mut callee = RegisterFile::new(Space::Local, &BankSizes::default());
        assert_eq!(
            bind_arguments(&caller, &mut callee, &[TypeSig::Json], &[0]),
            Err(ErrorKind::UnsupportedTypeSig(TypeSig::Json))
        );
    }

    #[test]
    fn results_land_by_signature_bank() {
        let mut callee = RegisterFile::new(Space::Register, &BankSizes::new(1, 1, 0, 0));
        callee.set_int(0, 42).unwrap();
        callee.set_float(0, 0.5).unwrap();
        let mut caller = RegisterFile::new(Space::Register, &BankSizes::new(3, 2, 0, 0));
        marshal_results(
            &callee,
            &mut caller,
            &[TypeSig::Float, TypeSig::Int],
            &[0, 0],
            &[1, 2],
        )
        .unwrap();
        assert_eq!(caller.ints(), &[0, 0, 42]);
        assert_eq!(caller.floats(), &[0.0, 0.5]);
    }

    #[test]
    fn faulting_result_leaves_caller_untouched() {
        let mut callee = RegisterFile::new(Space::Register, &BankSizes::new(2, 0, 0, 0));
        callee.set_int(0, 7).unwrap();
        callee.set_int(1, 8).unwrap();
        let mut caller = RegisterFile::new(Space::Register, &BankSizes::new(2, 0, 0, 0));
        assert_eq!(
            marshal_results(
                &callee,
                &mut caller,
                &[TypeSig::Int, TypeSig::Int],
                &[0, 1],
                &[0, 5],
            ),
            Err(ErrorKind::BankIndexOutOfRange(BankFault {
                bank: Bank::Int,
                index: 5,
                size: 2,
                space: Space::Register,
            }))
        );
        assert_eq!(caller.ints(), &[0, 0]);
    }

    #[test]
    fn undersized_callee_locals_fault() {
        let caller = RegisterFile::new(Space::Register, &BankSizes::new(2, 0, 0, 0));
        let mut callee = RegisterFile::new(Space::Local, &BankSizes::new(1, 0, 0, 0));
        assert_eq!(
            bind_arguments(&caller, &mut callee, &[TypeSig::Int, TypeSig::Int], &[0, 1]),
            Err(ErrorKind::BankIndexOutOfRange(BankFault {
                bank: Bank::Int,
                index: 1,
                size: 1,
                space: Space::Local,
            }))
        );
    }
}
