//! Bit-parallel simulation of netlists
//!
//! Simulation is only needed on small circuits here: the locking tests check
//! the correct-key-restores-function law by exhausting every primary-input
//! assignment. Values are packed 64 patterns to a word.

use fxhash::FxHashMap;
use thiserror::Error;

use crate::netlist::{GateOp, Netlist, NetlistError};

/// Errors raised during simulation
#[derive(Debug, Error)]
pub enum SimError {
    /// The netlist contains an operator the simulator cannot evaluate
    #[error("cannot simulate operator {0}")]
    UnknownOperator(String),
    /// The number of key values does not match the netlist's key inputs
    #[error("expected {expected} key bits, got {got}")]
    KeyLengthMismatch {
        /// Key inputs declared by the netlist
        expected: usize,
        /// Key bits supplied by the caller
        got: usize,
    },
    /// The netlist itself is structurally invalid
    #[error(transparent)]
    Netlist(#[from] NetlistError),
}

/// Multi-pattern simulator working directly on the name-based netlist
pub struct Simulator<'a> {
    netlist: &'a Netlist,
    order: Vec<usize>,
    values: FxHashMap<String, u64>,
}

impl<'a> Simulator<'a> {
    /// Prepare a simulator, computing the evaluation order once
    pub fn new(netlist: &'a Netlist) -> Result<Simulator<'a>, SimError> {
        let order = netlist.topo_order()?;
        Ok(Simulator {
            netlist,
            order,
            values: FxHashMap::default(),
        })
    }

    /// Evaluate every net for one word of input patterns
    ///
    /// `inputs` and `keys` hold one 64-pattern word per primary input and key
    /// input, in declaration order.
    pub fn run(&mut self, inputs: &[u64], keys: &[u64]) -> Result<(), SimError> {
        assert_eq!(inputs.len(), self.netlist.nb_inputs());
        if keys.len() != self.netlist.nb_key_inputs() {
            return Err(SimError::KeyLengthMismatch {
                expected: self.netlist.nb_key_inputs(),
                got: keys.len(),
            });
        }
        self.values.clear();
        for (name, v) in self.netlist.inputs().iter().zip(inputs) {
            self.values.insert(name.clone(), *v);
        }
        for (name, v) in self.netlist.key_inputs().iter().zip(keys) {
            self.values.insert(name.clone(), *v);
        }
        for &i in &self.order {
            let (name, gate) = self.netlist.gate_at(i);
            let a = self.values[&gate.operands[0]];
            let b = gate.operands.get(1).map(|o| self.values[o]);
            let val = match (&gate.op, b) {
                (GateOp::And, Some(b)) => a & b,
                (GateOp::Or, Some(b)) => a | b,
                (GateOp::Nand, Some(b)) => !(a & b),
                (GateOp::Nor, Some(b)) => !(a | b),
                (GateOp::Xor, Some(b)) => a ^ b,
                (GateOp::Xnor, Some(b)) => !(a ^ b),
                (GateOp::Not, None) => !a,
                (GateOp::Buf, None) => a,
                (op, _) => return Err(SimError::UnknownOperator(op.keyword().to_string())),
            };
            self.values.insert(name.to_string(), val);
        }
        Ok(())
    }

    /// Value word of a net after [`Simulator::run`]
    pub fn value(&self, name: &str) -> Option<u64> {
        self.values.get(name).copied()
    }
}

/// Truth tables of the named nets over all primary-input assignments, with the
/// key inputs fixed to the given bits
///
/// Returns one `Vec<bool>` of length 2^nb_inputs per requested net; pattern p
/// assigns bit i of p to input i.
pub fn exhaustive_tables(
    netlist: &Netlist,
    nets: &[&str],
    key_bits: &[bool],
) -> Result<Vec<Vec<bool>>, SimError> {
    let nb_inputs = netlist.nb_inputs();
    assert!(nb_inputs <= 20, "exhaustive simulation of {nb_inputs} inputs");
    let total = 1usize << nb_inputs;
    let keys: Vec<u64> = key_bits.iter().map(|b| if *b { !0 } else { 0 }).collect();
    let mut sim = Simulator::new(netlist)?;
    let mut tables = vec![Vec::with_capacity(total); nets.len()];
    for block in (0..total).step_by(64) {
        let width = (total - block).min(64);
        let mut inputs = vec![0u64; nb_inputs];
        for (i, word) in inputs.iter_mut().enumerate() {
            for b in 0..width {
                if ((block + b) >> i) & 1 == 1 {
                    *word |= 1 << b;
                }
            }
        }
        sim.run(&inputs, &keys)?;
        for (net, table) in nets.iter().zip(tables.iter_mut()) {
            let word = sim
                .value(net)
                .ok_or_else(|| NetlistError::UndrivenNet(net.to_string()))?;
            for b in 0..width {
                table.push((word >> b) & 1 == 1);
            }
        }
    }
    Ok(tables)
}

/// Whether a locked netlist behaves exactly like the original under a key
///
/// Compares the original's outputs (by name) for every primary-input
/// assignment; outputs the locking scheme added on top are ignored.
pub fn equivalent_under_key(
    original: &Netlist,
    locked: &Netlist,
    key_bits: &[bool],
) -> Result<bool, SimError> {
    assert_eq!(original.inputs(), locked.inputs());
    let nets: Vec<&str> = original.outputs().iter().map(|s| s.as_str()).collect();
    let want = exhaustive_tables(original, &nets, &[])?;
    let got = exhaustive_tables(locked, &nets, key_bits)?;
    Ok(want == got)
}
