//! Incremental construction of IR functions and modules.
//!
//! The builder keeps a current block; value-producing ops return the
//! `ValueId` of their result. Parameters occupy the first value slots.

use std::collections::HashMap;

use crate::entity::{EntityRef, PrimaryMap};

use super::block::{Block, BlockId};
use super::func::{FuncId, Function, Linkage};
use super::inst::{CmpKind, Inst, Op};
use super::module::Module;
use super::ty::{FunctionSig, Type};
use super::value::{Constant, ValueId};

pub struct FunctionBuilder {
    func: Function,
    current: BlockId,
}

impl FunctionBuilder {
    pub fn new(name: &str, sig: FunctionSig, linkage: Linkage) -> Self {
        let mut blocks = PrimaryMap::new();
        let entry = blocks.push(Block::default());
        let mut value_types = PrimaryMap::new();
        for ty in &sig.params {
            value_types.push(ty.clone());
        }
        let func = Function {
            name: name.to_string(),
            sig,
            linkage,
            blocks,
            insts: PrimaryMap::new(),
            value_types,
            entry,
            value_names: HashMap::new(),
        };
        Self {
            func,
            current: entry,
        }
    }

    /// The value bound to parameter `index`.
    pub fn param(&self, index: usize) -> ValueId {
        debug_assert!(index < self.func.sig.params.len());
        ValueId::new(index as u32)
    }

    pub fn create_block(&mut self) -> BlockId {
        self.func.blocks.push(Block::default())
    }

    pub fn switch_to_block(&mut self, block: BlockId) {
        self.current = block;
    }

    /// Attach a debug name to a value.
    pub fn name_value(&mut self, value: ValueId, name: &str) {
        self.func.value_names.insert(value, name.to_string());
    }

    fn push_inst(&mut self, op: Op, result: Option<ValueId>) {
        let inst = self.func.insts.push(Inst { op, result });
        self.func.blocks[self.current].insts.push(inst);
    }

    pub fn const_int(&mut self, value: i64) -> ValueId {
        let result = self.func.value_types.push(Type::Int(64));
        self.push_inst(Op::Const(Constant::Int(value)), Some(result));
        result
    }

    pub fn const_bool(&mut self, value: bool) -> ValueId {
        let result = self.func.value_types.push(Type::Bool);
        self.push_inst(Op::Const(Constant::Bool(value)), Some(result));
        result
    }

    pub fn cmp(&mut self, kind: CmpKind, lhs: ValueId, rhs: ValueId) -> ValueId {
        let result = self.func.value_types.push(Type::Bool);
        self.push_inst(Op::Cmp { kind, lhs, rhs }, Some(result));
        result
    }

    pub fn add(&mut self, lhs: ValueId, rhs: ValueId) -> ValueId {
        let result = self.func.value_types.push(Type::Int(64));
        self.push_inst(Op::Add { lhs, rhs }, Some(result));
        result
    }

    pub fn not(&mut self, value: ValueId) -> ValueId {
        let result = self.func.value_types.push(Type::Bool);
        self.push_inst(Op::Not { value }, Some(result));
        result
    }

    pub fn br(&mut self, target: BlockId) {
        self.push_inst(Op::Br { target }, None);
    }

    pub fn br_if(&mut self, cond: ValueId, then_target: BlockId, else_target: BlockId) {
        self.push_inst(
            Op::BrIf {
                cond,
                then_target,
                else_target,
            },
            None,
        );
    }

    pub fn switch(&mut self, value: ValueId, targets: Vec<(i64, BlockId)>, default: BlockId) {
        self.push_inst(
            Op::Switch {
                value,
                targets,
                default,
            },
            None,
        );
    }

    pub fn ret(&mut self, value: Option<ValueId>) {
        self.push_inst(Op::Return(value), None);
    }

    pub fn build(self) -> Function {
        self.func
    }
}

pub struct ModuleBuilder {
    module: Module,
}

impl ModuleBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            module: Module::new(name.to_string()),
        }
    }

    pub fn add_function(&mut self, func: Function) -> FuncId {
        self.module.functions.push(func)
    }

    pub fn build(self) -> Module {
        self.module
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn straight_line_function() {
        let sig = FunctionSig {
            params: vec![Type::Int(64), Type::Int(64)],
            return_ty: Type::Int(64),
        };
        let mut fb = FunctionBuilder::new("add", sig, Linkage::Export);
        let a = fb.param(0);
        let b = fb.param(1);
        let sum = fb.add(a, b);
        fb.ret(Some(sum));

        let func = fb.build();
        assert_eq!(func.blocks.len(), 1);
        assert_eq!(func.insts.len(), 2);
        assert!(matches!(
            func.terminator(func.entry),
            Some(Op::Return(Some(v))) if *v == sum
        ));
    }

    #[test]
    fn params_occupy_first_value_slots() {
        let sig = FunctionSig {
            params: vec![Type::Bool, Type::Int(64)],
            return_ty: Type::Void,
        };
        let mut fb = FunctionBuilder::new("f", sig, Linkage::Local);
        let p0 = fb.param(0);
        let p1 = fb.param(1);
        assert_eq!(p0.index(), 0);
        assert_eq!(p1.index(), 1);
        let c = fb.const_int(7);
        assert_eq!(c.index(), 2);
        fb.ret(None);
        let func = fb.build();
        assert_eq!(func.value_types[p0], Type::Bool);
        assert_eq!(func.value_types[p1], Type::Int(64));
    }

    #[test]
    fn terminator_skips_straight_line_ops() {
        let sig = FunctionSig {
            params: vec![],
            return_ty: Type::Void,
        };
        let mut fb = FunctionBuilder::new("f", sig, Linkage::Local);
        let next = fb.create_block();
        fb.const_int(1);
        fb.br(next);
        fb.switch_to_block(next);
        fb.ret(None);

        let func = fb.build();
        assert!(matches!(
            func.terminator(func.entry),
            Some(Op::Br { target }) if *target == next
        ));
    }
}
