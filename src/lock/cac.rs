//! Corrupt-and-correct locking
//!
//! Each key bit gates one randomly chosen internal signal: the gate's body
//! moves to a `_CORRUPT` clone and the signal is redefined as the XOR of the
//! clone with the key input. For a 1-bit the clone's operator is complemented,
//! so the stored logic really is corrupted and only the matching key bit
//! corrects it; for a 0-bit the clone is verbatim and the XOR passes it
//! through. A wrong bit inverts that one signal, and whether the inversion
//! reaches an output depends on the surrounding don't-care structure. Every
//! selected signal is exposed as an output so the corrupted path stays
//! observable.

use rand::rngs::SmallRng;

use crate::netlist::{Gate, GateOp, Netlist};

use super::tree::fresh_name;
use super::{allocate_key_inputs, random_key, LockError, LockedNetlist, LockingKey};

pub(super) fn lock(
    original: &Netlist,
    key_len: usize,
    rng: &mut SmallRng,
) -> Result<LockedNetlist, LockError> {
    if key_len == 0 {
        return Err(LockError::EmptyKey);
    }
    // Gates with dialect-extension operators cannot be complemented
    let eligible: Vec<usize> = (0..original.nb_gates())
        .filter(|i| !original.gate_at(*i).1.op.is_unknown())
        .collect();
    if key_len > eligible.len() {
        return Err(LockError::KeyTooLong {
            needed: key_len,
            available: eligible.len(),
            resource: "lockable gates",
        });
    }
    let mut netlist = original.clone();
    let bits = random_key(rng, key_len);
    let key_inputs = allocate_key_inputs(&mut netlist, key_len)?;

    // Sample over the original gates only; the XOR gates appended below keep
    // higher indices and renaming does not move a gate
    let chosen = rand::seq::index::sample(rng, eligible.len(), key_len);
    for (i, pick) in chosen.into_iter().enumerate() {
        let (name, mut clone) = {
            let (n, g) = netlist.gate_at(eligible[pick]);
            (n.to_string(), g.clone())
        };
        let corrupt = fresh_name(&netlist, &format!("{}_CORRUPT", name));
        netlist.rename_gate(&name, corrupt.clone())?;
        if bits[i] {
            if let Some(op) = clone.op.complement() {
                clone.op = op;
            }
            netlist.replace_gate(&corrupt, clone)?;
        }
        netlist.add_gate(
            name.clone(),
            Gate::binary(GateOp::Xor, corrupt, key_inputs[i].clone()),
        )?;
        netlist.add_output_dedup(name);
    }

    Ok(LockedNetlist {
        netlist,
        key: LockingKey { bits, key_inputs },
    })
}

#[cfg(test)]
mod test {
    use itertools::Itertools;

    use crate::io::read_bench;
    use crate::lock::LockingScheme;
    use crate::netlist::Netlist;
    use crate::sim::exhaustive_tables;

    fn sample() -> Netlist {
        let text = "INPUT(a)
INPUT(b)
INPUT(c)
OUTPUT(y)
t0 = AND(a, b)
t1 = OR(t0, c)
y = XNOR(t1, a)
";
        read_bench(text.as_bytes()).unwrap().netlist
    }

    #[test]
    fn test_selected_signals_become_observable() {
        let locked = LockingScheme::CorruptAndCorrect { key_len: 3 }
            .lock(&sample(), 9)
            .unwrap();
        // All three gates selected: t0, t1 and y are all outputs now
        for name in ["t0", "t1", "y"] {
            assert!(locked.netlist.is_output(name), "{} not observable", name);
        }
        // y was an output already and must not be declared twice
        assert!(locked.netlist.outputs().iter().all_unique());
    }

    #[test]
    fn test_wrong_bit_inverts_its_signal() {
        let original = sample();
        let locked = LockingScheme::CorruptAndCorrect { key_len: 3 }
            .lock(&original, 1)
            .unwrap();
        // Flipping one key bit inverts the gated signal itself; downstream
        // propagation is left to the circuit
        let mut wrong = locked.key.bits.clone();
        wrong[0] = !wrong[0];
        let gated = &locked.key.key_inputs[0];
        let gate_name = locked
            .netlist
            .gates()
            .find(|(_, g)| g.operands.contains(gated))
            .map(|(n, _)| n.to_string())
            .unwrap();
        let good = &exhaustive_tables(&locked.netlist, &[&gate_name], &locked.key.bits).unwrap()[0];
        let bad = &exhaustive_tables(&locked.netlist, &[&gate_name], &wrong).unwrap()[0];
        assert!(good.iter().zip(bad).all(|(a, b)| a != b));
    }

    #[test]
    fn test_clone_corruption_matches_key_bit() {
        let original = sample();
        let locked = LockingScheme::CorruptAndCorrect { key_len: 3 }
            .lock(&original, 4)
            .unwrap();
        for (bit, key_input) in locked.key.bits.iter().zip(&locked.key.key_inputs) {
            let (name, _) = locked
                .netlist
                .gates()
                .find(|(_, g)| g.operands.contains(key_input))
                .unwrap();
            let corrupt = format!("{}_CORRUPT", name);
            let clone_op = &locked.netlist.gate(&corrupt).unwrap().op;
            let source_op = &original.gate(name).unwrap().op;
            if *bit {
                assert_eq!(*clone_op, source_op.complement().unwrap());
            } else {
                assert_eq!(clone_op, source_op);
            }
        }
    }
}
