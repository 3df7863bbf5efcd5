//! Anti-SAT locking
//!
//! Type-0 Anti-SAT: `Y = g(X xor Kl1) and g(X xor Kl2)` with `g` an AND
//! reduction, and the protected output gated by `lock_enable = NOT(Y)`. Under
//! a key whose halves differ the two comparators can never match the same
//! input, `Y` stays 0 and the circuit behaves as before; under a wrong key
//! with equal halves a single input pattern drops `lock_enable` to 0.

use rand::rngs::SmallRng;

use crate::netlist::{Gate, GateOp, Netlist};

use super::tree::{fresh_name, reduce};
use super::{
    allocate_key_inputs, find_target_output, random_key, LockError, LockedNetlist, LockingKey,
};

pub(super) fn lock(
    original: &Netlist,
    half_key_len: usize,
    rng: &mut SmallRng,
) -> Result<LockedNetlist, LockError> {
    let n = half_key_len;
    if n == 0 {
        return Err(LockError::EmptyKey);
    }
    if n > original.nb_inputs() {
        return Err(LockError::KeyTooLong {
            needed: n,
            available: original.nb_inputs(),
            resource: "primary inputs",
        });
    }
    let mut netlist = original.clone();
    let target = find_target_output(&netlist)?;

    let mut bits = random_key(rng, 2 * n);
    if bits[..n] == bits[n..] {
        // Equal halves would make the correct key itself corrupt one pattern
        bits[2 * n - 1] = !bits[2 * n - 1];
    }
    let key_inputs = allocate_key_inputs(&mut netlist, 2 * n)?;
    let (kl1, kl2) = key_inputs.split_at(n);
    let compared: Vec<String> = netlist.inputs()[..n].to_vec();

    let mut layer1 = Vec::with_capacity(n);
    let mut layer2 = Vec::with_capacity(n);
    for (i, x) in compared.iter().enumerate() {
        let w1 = fresh_name(&netlist, &format!("antisat_x1_{}", i));
        netlist.add_gate(w1.clone(), Gate::binary(GateOp::Xor, x.clone(), kl1[i].clone()))?;
        layer1.push(w1);
        let w2 = fresh_name(&netlist, &format!("antisat_x2_{}", i));
        netlist.add_gate(w2.clone(), Gate::binary(GateOp::Xor, x.clone(), kl2[i].clone()))?;
        layer2.push(w2);
    }
    let g1 = reduce(&mut netlist, &layer1, GateOp::And, "antisat_g1")?;
    let g2 = reduce(&mut netlist, &layer2, GateOp::And, "antisat_g2")?;

    let y = fresh_name(&netlist, "antisat_and");
    netlist.add_gate(y.clone(), Gate::binary(GateOp::And, g1, g2))?;
    let enable = fresh_name(&netlist, "lock_enable");
    netlist.add_gate(enable.clone(), Gate::unary(GateOp::Not, y))?;

    let enc = fresh_name(&netlist, &format!("{}_enc", target));
    netlist.rename_gate(&target, enc.clone())?;
    netlist.add_gate(target, Gate::binary(GateOp::And, enable, enc))?;

    Ok(LockedNetlist {
        netlist,
        key: LockingKey { bits, key_inputs },
    })
}
