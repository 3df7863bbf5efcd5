//! SARLock
//!
//! The flip signal is `(X == K_applied) and (K_applied != K_correct)`: every
//! wrong key corrupts the protected output on exactly the one input pattern
//! that equals it, and the correct key corrupts nothing. The second term
//! compares each key input against a constant carrying the correct key bit,
//! so the secret pattern coincides with the correct key by construction.

use rand::rngs::SmallRng;

use crate::netlist::{Gate, GateOp, Netlist};

use super::tree::{fresh_name, reduce};
use super::{
    allocate_key_inputs, find_target_output, random_key, LockError, LockedNetlist, LockingKey,
};

/// Constant nets synthesized on demand from the first primary input
///
/// `XOR(x, x)` is 0 and `XNOR(x, x)` is 1 for either value of `x`; building
/// them lazily keeps an all-zeros or all-ones key from leaving one of the two
/// constants floating.
struct ConstNets {
    seed_wire: String,
    zero: Option<String>,
    one: Option<String>,
}

impl ConstNets {
    fn new(seed_wire: String) -> ConstNets {
        ConstNets {
            seed_wire,
            zero: None,
            one: None,
        }
    }

    fn get(&mut self, netlist: &mut Netlist, value: bool) -> Result<String, LockError> {
        let (slot, op, stem) = if value {
            (&mut self.one, GateOp::Xnor, "sar_one")
        } else {
            (&mut self.zero, GateOp::Xor, "sar_zero")
        };
        if let Some(name) = slot {
            return Ok(name.clone());
        }
        let name = fresh_name(netlist, stem);
        netlist.add_gate(
            name.clone(),
            Gate::binary(op, self.seed_wire.clone(), self.seed_wire.clone()),
        )?;
        *slot = Some(name.clone());
        Ok(name)
    }
}

pub(super) fn lock(
    original: &Netlist,
    key_len: usize,
    rng: &mut SmallRng,
) -> Result<LockedNetlist, LockError> {
    if key_len == 0 {
        return Err(LockError::EmptyKey);
    }
    if key_len > original.nb_inputs() {
        return Err(LockError::KeyTooLong {
            needed: key_len,
            available: original.nb_inputs(),
            resource: "primary inputs",
        });
    }
    let mut netlist = original.clone();
    let target = find_target_output(&netlist)?;

    let bits = random_key(rng, key_len);
    let key_inputs = allocate_key_inputs(&mut netlist, key_len)?;
    let compared: Vec<String> = netlist.inputs()[..key_len].to_vec();
    let mut consts = ConstNets::new(netlist.inputs()[0].clone());

    // First layer: does the applied key match the inputs / the correct key
    let mut match_terms = Vec::with_capacity(key_len);
    let mut pattern_terms = Vec::with_capacity(key_len);
    for (i, x) in compared.iter().enumerate() {
        let cmp = fresh_name(&netlist, &format!("sar_cmp_{}", i));
        netlist.add_gate(
            cmp.clone(),
            Gate::binary(GateOp::Xnor, x.clone(), key_inputs[i].clone()),
        )?;
        match_terms.push(cmp);

        let pattern_bit = consts.get(&mut netlist, bits[i])?;
        let pat = fresh_name(&netlist, &format!("sar_pat_{}", i));
        netlist.add_gate(
            pat.clone(),
            Gate::binary(GateOp::Xnor, key_inputs[i].clone(), pattern_bit),
        )?;
        pattern_terms.push(pat);
    }

    let dtl0 = reduce(&mut netlist, &match_terms, GateOp::And, "sar_dtl0")?;
    let pattern_root = reduce(&mut netlist, &pattern_terms, GateOp::And, "sar_dtl2")?;
    let dtl2 = fresh_name(&netlist, "sar_dtl2_n");
    netlist.add_gate(dtl2.clone(), Gate::unary(GateOp::Not, pattern_root))?;

    let flip = fresh_name(&netlist, "sar_flip");
    netlist.add_gate(flip.clone(), Gate::binary(GateOp::And, dtl0, dtl2))?;

    let enc = fresh_name(&netlist, &format!("{}_enc", target));
    netlist.rename_gate(&target, enc.clone())?;
    netlist.add_gate(target, Gate::binary(GateOp::Xor, flip, enc))?;

    Ok(LockedNetlist {
        netlist,
        key: LockingKey { bits, key_inputs },
    })
}

#[cfg(test)]
mod test {
    use crate::io::read_bench;
    use crate::lock::LockingScheme;
    use crate::netlist::Netlist;
    use crate::sim::exhaustive_tables;

    fn sample() -> Netlist {
        let text = "INPUT(a)
INPUT(b)
INPUT(c)
INPUT(d)
OUTPUT(y)
t0 = AND(a, b)
t1 = OR(c, d)
y = XOR(t0, t1)
";
        read_bench(text.as_bytes()).unwrap().netlist
    }

    /// Mismatch count between the unlocked output and the locked one under a key
    fn corrupted_patterns(original: &Netlist, locked: &Netlist, key: &[bool]) -> usize {
        let want = &exhaustive_tables(original, &["y"], &[]).unwrap()[0];
        let got = &exhaustive_tables(locked, &["y"], key).unwrap()[0];
        want.iter().zip(got).filter(|(a, b)| a != b).count()
    }

    #[test]
    fn test_single_point_corruption() {
        let original = sample();
        // Key width equal to the input count: the flip condition pins every input
        let locked = LockingScheme::SarLock { key_len: 4 }.lock(&original, 5).unwrap();

        assert_eq!(corrupted_patterns(&original, &locked.netlist, &locked.key.bits), 0);

        for wrong_id in 0..16u32 {
            let wrong: Vec<bool> = (0..4).map(|i| (wrong_id >> i) & 1 == 1).collect();
            if wrong == locked.key.bits {
                continue;
            }
            assert_eq!(
                corrupted_patterns(&original, &locked.netlist, &wrong),
                1,
                "wrong key {:04b} must corrupt exactly one pattern",
                wrong_id
            );
        }
    }

    #[test]
    fn test_uniform_keys_leave_no_floating_constant() {
        // Exercises the lazy constant nets: a single-bit key uses only one of them
        let original = sample();
        for seed in 0..8 {
            let locked = LockingScheme::SarLock { key_len: 1 }.lock(&original, seed).unwrap();
            assert!(locked.netlist.unconsumed_nets().is_empty());
        }
    }

    #[test]
    fn test_flip_net_structure() {
        let locked = LockingScheme::SarLock { key_len: 3 }.lock(&sample(), 2).unwrap();
        let final_gate = locked.netlist.gate("y").unwrap();
        assert_eq!(final_gate.op, crate::netlist::GateOp::Xor);
        assert_eq!(final_gate.operands[0], "sar_flip");
        assert_eq!(final_gate.operands[1], "y_enc");
    }
}
