//! Random XOR/XNOR key-gate insertion (RLL)
//!
//! The oldest locking style: pick random gates, move each body to a `_lock`
//! net and re-drive the original name through a key gate. The inserted
//! operator depends on the key bit (XNOR for 1, XOR for 0), so the correct
//! key always reduces every key gate to a buffer. Unlike the point-function
//! schemes the key is supplied by the caller, and each locked site is
//! independent: no reduction tree is involved.

use rand::rngs::SmallRng;

use crate::netlist::{Gate, GateOp, Netlist};

use super::tree::fresh_name;
use super::{allocate_key_inputs, LockError, LockedNetlist, LockingKey};

/// Gates carrying this marker in their name are already key-gated and are
/// never selected again
const LOCK_MARKER: &str = "lock";

pub(super) fn lock(
    original: &Netlist,
    key: &[bool],
    rng: &mut SmallRng,
) -> Result<LockedNetlist, LockError> {
    if key.is_empty() {
        return Err(LockError::EmptyKey);
    }
    let unlocked: Vec<String> = original
        .gate_names()
        .filter(|n| !n.contains(LOCK_MARKER))
        .map(|n| n.to_string())
        .collect();
    if key.len() > unlocked.len() {
        return Err(LockError::KeyTooLong {
            needed: key.len(),
            available: unlocked.len(),
            resource: "unlocked gates",
        });
    }
    let mut netlist = original.clone();
    let key_inputs = allocate_key_inputs(&mut netlist, key.len())?;

    let chosen = rand::seq::index::sample(rng, unlocked.len(), key.len());
    for (i, pick) in chosen.into_iter().enumerate() {
        let name = unlocked[pick].clone();
        let moved = fresh_name(&netlist, &format!("{}_lock", name));
        netlist.rename_gate(&name, moved.clone())?;
        let op = if key[i] { GateOp::Xnor } else { GateOp::Xor };
        netlist.add_gate(name, Gate::binary(op, key_inputs[i].clone(), moved))?;
    }

    Ok(LockedNetlist {
        netlist,
        key: LockingKey {
            bits: key.to_vec(),
            key_inputs,
        },
    })
}

#[cfg(test)]
mod test {
    use crate::io::read_bench;
    use crate::lock::LockingScheme;
    use crate::netlist::Netlist;
    use crate::sim::exhaustive_tables;

    fn and2() -> Netlist {
        let text = "INPUT(A)\nINPUT(B)\nOUTPUT(Y)\nY = AND(A, B)\n";
        read_bench(text.as_bytes()).unwrap().netlist
    }

    #[test]
    fn test_single_gate_end_to_end() {
        let locked = LockingScheme::RandomXor { key: vec![true] }
            .lock(&and2(), 0)
            .unwrap();
        // key bit 1: XNOR site, transparent under 1, inverting under 0
        let and_table = vec![false, false, false, true];
        let under_1 = &exhaustive_tables(&locked.netlist, &["Y"], &[true]).unwrap()[0];
        assert_eq!(*under_1, and_table);
        let under_0 = &exhaustive_tables(&locked.netlist, &["Y"], &[false]).unwrap()[0];
        let inverted: Vec<bool> = and_table.iter().map(|b| !b).collect();
        assert_eq!(*under_0, inverted);
    }

    #[test]
    fn test_zero_bit_uses_xor_site() {
        let locked = LockingScheme::RandomXor { key: vec![false] }
            .lock(&and2(), 0)
            .unwrap();
        let site = locked.netlist.gate("Y").unwrap();
        assert_eq!(site.op, crate::netlist::GateOp::Xor);
        assert_eq!(site.operands, vec!["keyinput0".to_string(), "Y_lock".to_string()]);
        let under_0 = &exhaustive_tables(&locked.netlist, &["Y"], &[false]).unwrap()[0];
        assert_eq!(*under_0, vec![false, false, false, true]);
    }

    #[test]
    fn test_relock_skips_locked_sites() {
        let first = LockingScheme::RandomXor { key: vec![true] }
            .lock(&and2(), 0)
            .unwrap();
        // Only the re-driven Y is selectable now; Y_lock carries the marker
        let second = LockingScheme::RandomXor { key: vec![false] }
            .lock(&first.netlist, 1)
            .unwrap();
        assert_eq!(second.key.key_inputs, vec!["keyinput1".to_string()]);
        assert!(second.netlist.gate("Y_lock_1").is_some());
        assert!(second
            .netlist
            .gate("Y")
            .unwrap()
            .operands
            .contains(&"keyinput1".to_string()));
        // Both keys together still restore the original function
        let under_both =
            &exhaustive_tables(&second.netlist, &["Y"], &[true, false]).unwrap()[0];
        assert_eq!(*under_both, vec![false, false, false, true]);
    }

    #[test]
    fn test_not_enough_unlocked_gates() {
        let err = LockingScheme::RandomXor {
            key: vec![true, false],
        }
        .lock(&and2(), 0);
        assert!(matches!(err, Err(crate::lock::LockError::KeyTooLong { .. })));
    }
}
