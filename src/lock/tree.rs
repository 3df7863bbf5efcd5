//! Balanced reduction trees and collision-free net naming

use crate::netlist::{Gate, GateOp, Netlist, NetlistError};

/// Pick a net name that nothing in the netlist drives yet
///
/// Returns the stem itself when free, otherwise probes `<stem>_1`, `<stem>_2`,
/// ... Locking transforms route every new name through here, so repeated
/// locking passes over the same netlist cannot collide.
pub(crate) fn fresh_name(netlist: &Netlist, stem: &str) -> String {
    if !netlist.is_driven(stem) {
        return stem.to_string();
    }
    let mut i = 1;
    loop {
        let name = format!("{}_{}", stem, i);
        if !netlist.is_driven(&name) {
            return name;
        }
        i += 1;
    }
}

/// Reduce wires to a single root with a balanced tree of 2-input gates
///
/// Intermediate nets are named `<prefix>_l<level>_<index>`. A trailing odd
/// wire is promoted unchanged to the next level; every scheme relies on this
/// one parity rule, since a construction/verification mismatch here would
/// silently change which input patterns the locking logic singles out.
pub(crate) fn reduce(
    netlist: &mut Netlist,
    wires: &[String],
    op: GateOp,
    prefix: &str,
) -> Result<String, NetlistError> {
    assert!(!wires.is_empty());
    let mut current: Vec<String> = wires.to_vec();
    let mut level = 0;
    while current.len() > 1 {
        let mut next = Vec::with_capacity(current.len() / 2 + 1);
        for (i, pair) in current.chunks(2).enumerate() {
            match pair {
                [a, b] => {
                    let name = fresh_name(netlist, &format!("{}_l{}_{}", prefix, level, i));
                    netlist.add_gate(name.clone(), Gate::binary(op.clone(), a.clone(), b.clone()))?;
                    next.push(name);
                }
                [odd] => next.push(odd.clone()),
                _ => unreachable!(),
            }
        }
        current = next;
        level += 1;
    }
    Ok(current.pop().unwrap())
}
