use eyre::Result;
use shuttle_common::utils::strings::sign_uint;

use super::super::core::Machine;

/// LT - Less-than comparison
pub fn lt(vm: &mut Machine) -> Result<()> {
    let a = vm.stack.pop()?;
    let b = vm.stack.pop()?;
    vm.push_boolean(a < b)
}

/// GT - Greater-than comparison
pub fn gt(vm: &mut Machine) -> Result<()> {
    let a = vm.stack.pop()?;
    let b = vm.stack.pop()?;
    vm.push_boolean(a > b)
}

/// SLT - Signed less-than comparison
pub fn slt(vm: &mut Machine) -> Result<()> {
    let a = vm.stack.pop()?;
    let b = vm.stack.pop()?;
    vm.push_boolean(sign_uint(a) < sign_uint(b))
}

/// SGT - Signed greater-than comparison
pub fn sgt(vm: &mut Machine) -> Result<()> {
    let a = vm.stack.pop()?;
    let b = vm.stack.pop()?;
    vm.push_boolean(sign_uint(a) > sign_uint(b))
}

/// EQ - Equality comparison
pub fn eq(vm: &mut Machine) -> Result<()> {
    let a = vm.stack.pop()?;
    let b = vm.stack.pop()?;
    vm.push_boolean(a == b)
}

/// ISZERO - Simple not operator
pub fn iszero(vm: &mut Machine) -> Result<()> {
    let a = vm.stack.pop()?;
    vm.push_boolean(a.is_zero())
}
