//! Logic locking schemes
//!
//! Each scheme takes an unlocked netlist and produces a locked copy plus the
//! key that restores the original behavior. The input netlist is never
//! mutated; every transform works on its own clone and self-checks the result
//! before returning it.

mod antisat;
mod cac;
mod rll;
mod sarlock;
mod tree;

use core::fmt;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use crate::netlist::{Netlist, NetlistError};

/// Errors raised by locking transforms
#[derive(Debug, Error)]
pub enum LockError {
    /// No declared output has a driving gate, so there is nothing to protect
    #[error("no declared output is driven by a gate")]
    NoDrivenOutput,
    /// The transform would emit a net with a driver but no consumer
    #[error("locking would leave net {0} floating")]
    FloatingNet(String),
    /// The netlist is too small for the requested key
    #[error("key needs {needed} {resource}, netlist only has {available}")]
    KeyTooLong {
        /// Resource units the key requires
        needed: usize,
        /// Resource units the netlist provides
        available: usize,
        /// What is being consumed: primary inputs or lockable gates
        resource: &'static str,
    },
    /// Zero-length keys lock nothing
    #[error("key must have at least one bit")]
    EmptyKey,
    /// The transform tripped a structural invariant of the netlist
    #[error(transparent)]
    Netlist(#[from] NetlistError),
}

/// A locking key: bit values plus the key inputs they drive, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockingKey {
    /// Key bit values
    pub bits: Vec<bool>,
    /// Key input net names, one per bit
    pub key_inputs: Vec<String>,
}

impl LockingKey {
    /// Number of key bits
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Whether the key is empty
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// The key as a bit string, as it appears in the `#key=` header
    pub fn bit_string(&self) -> String {
        self.bits.iter().map(|b| if *b { '1' } else { '0' }).collect()
    }

    /// Parse a `0101`-style bit string
    pub fn parse_bits(s: &str) -> Option<Vec<bool>> {
        s.chars()
            .map(|c| match c {
                '0' => Some(false),
                '1' => Some(true),
                _ => None,
            })
            .collect()
    }
}

impl fmt::Display for LockingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bit_string())
    }
}

/// A locked netlist together with its key
#[derive(Debug, Clone)]
pub struct LockedNetlist {
    /// The locked netlist, key inputs included
    pub netlist: Netlist,
    /// The key that restores the original behavior
    pub key: LockingKey,
}

/// The supported locking schemes, each owning its parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockingScheme {
    /// Anti-SAT point function: two complementary comparator trees gate the
    /// protected output; key length is twice the half length
    AntiSat {
        /// Number of bits per key half
        half_key_len: usize,
    },
    /// SARLock: flips the protected output on exactly one input pattern per
    /// wrong key
    SarLock {
        /// Key length
        key_len: usize,
    },
    /// Corrupt-and-correct: key-XORs random internal signals
    CorruptAndCorrect {
        /// Key length, one bit per corrupted signal
        key_len: usize,
    },
    /// Random XOR/XNOR key gate insertion with a caller-supplied key
    RandomXor {
        /// The key to embed; XNOR is inserted for 1-bits, XOR for 0-bits
        key: Vec<bool>,
    },
}

impl LockingScheme {
    /// Short tag used in locked file names, e.g. `c432_SARLock_K16_0.bench`
    pub fn tag(&self) -> &'static str {
        match self {
            LockingScheme::AntiSat { .. } => "AntiSATLock",
            LockingScheme::SarLock { .. } => "SARLock",
            LockingScheme::CorruptAndCorrect { .. } => "CACLock",
            LockingScheme::RandomXor { .. } => "RLL",
        }
    }

    /// Total key bits the scheme will embed
    pub fn key_len(&self) -> usize {
        match self {
            LockingScheme::AntiSat { half_key_len } => 2 * half_key_len,
            LockingScheme::SarLock { key_len } => *key_len,
            LockingScheme::CorruptAndCorrect { key_len } => *key_len,
            LockingScheme::RandomXor { key } => key.len(),
        }
    }

    /// Lock a netlist, returning the locked copy and the generated key
    ///
    /// The same seed reproduces the same key and the same gate selection.
    pub fn lock(&self, netlist: &Netlist, seed: u64) -> Result<LockedNetlist, LockError> {
        let mut rng = SmallRng::seed_from_u64(seed);
        let locked = match self {
            LockingScheme::AntiSat { half_key_len } => {
                antisat::lock(netlist, *half_key_len, &mut rng)
            }
            LockingScheme::SarLock { key_len } => sarlock::lock(netlist, *key_len, &mut rng),
            LockingScheme::CorruptAndCorrect { key_len } => cac::lock(netlist, *key_len, &mut rng),
            LockingScheme::RandomXor { key } => rll::lock(netlist, key, &mut rng),
        }?;
        check_no_floating(&locked.netlist)?;
        Ok(locked)
    }
}

impl fmt::Display for LockingScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// Draw a uniform random key
fn random_key(rng: &mut SmallRng, len: usize) -> Vec<bool> {
    (0..len).map(|_| rng.gen()).collect()
}

/// Declare `n` fresh key inputs, numbered after any already present
///
/// Re-locking an already locked netlist keeps the existing `keyinput<N>` nets
/// untouched and continues the numbering, so both keys stay addressable.
fn allocate_key_inputs(netlist: &mut Netlist, n: usize) -> Result<Vec<String>, NetlistError> {
    let start = netlist
        .key_inputs()
        .iter()
        .filter_map(|name| {
            name.to_lowercase()
                .strip_prefix("keyinput")
                .and_then(|idx| idx.parse::<usize>().ok())
        })
        .max()
        .map_or(0, |m| m + 1);
    let mut names = Vec::with_capacity(n);
    for i in 0..n {
        let name = format!("keyinput{}", start + i);
        netlist.add_key_input(name.clone())?;
        names.push(name);
    }
    Ok(names)
}

/// First declared output that a gate drives; the net the point-function
/// schemes protect
fn find_target_output(netlist: &Netlist) -> Result<String, LockError> {
    netlist
        .outputs()
        .iter()
        .find(|o| netlist.gate(o).is_some())
        .cloned()
        .ok_or(LockError::NoDrivenOutput)
}

/// Refuse to emit a netlist with a floating net
///
/// Checks that every operand and output is driven and that every gate-driven
/// net is consumed somewhere or exposed as an output.
fn check_no_floating(netlist: &Netlist) -> Result<(), LockError> {
    netlist.validate()?;
    if let Some(net) = netlist.unconsumed_nets().into_iter().next() {
        return Err(LockError::FloatingNet(net));
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::io::{read_bench, write_bench};
    use crate::sim::equivalent_under_key;

    fn sample_netlist() -> Netlist {
        let text = "INPUT(a)
INPUT(b)
INPUT(c)
INPUT(d)
OUTPUT(y)
t0 = AND(a, b)
t1 = OR(c, d)
t2 = XOR(t0, t1)
y = NAND(t2, d)
";
        read_bench(text.as_bytes()).unwrap().netlist
    }

    fn all_schemes() -> Vec<LockingScheme> {
        vec![
            LockingScheme::AntiSat { half_key_len: 2 },
            LockingScheme::SarLock { key_len: 3 },
            LockingScheme::CorruptAndCorrect { key_len: 2 },
            LockingScheme::RandomXor {
                key: vec![true, false, true],
            },
        ]
    }

    #[test]
    fn test_correct_key_restores_function() {
        let original = sample_netlist();
        for scheme in all_schemes() {
            for seed in 0..4 {
                let locked = scheme.lock(&original, seed).unwrap();
                assert!(
                    equivalent_under_key(&original, &locked.netlist, &locked.key.bits).unwrap(),
                    "{} broke the circuit under its own key",
                    scheme
                );
            }
        }
    }

    #[test]
    fn test_locked_netlists_are_clean() {
        let original = sample_netlist();
        for scheme in all_schemes() {
            let locked = scheme.lock(&original, 7).unwrap();
            locked.netlist.validate().unwrap();
            assert!(locked.netlist.unconsumed_nets().is_empty());
            assert_eq!(locked.key.len(), scheme.key_len());
            assert_eq!(locked.key.key_inputs.len(), scheme.key_len());
        }
    }

    #[test]
    fn test_lock_roundtrips_through_bench() {
        let original = sample_netlist();
        for scheme in all_schemes() {
            let locked = scheme.lock(&original, 3).unwrap();
            let mut buf = Vec::new();
            write_bench(&mut buf, &locked.netlist, Some(&locked.key.bit_string())).unwrap();
            let reparsed = read_bench(buf.as_slice()).unwrap();
            assert_eq!(reparsed.key.as_deref(), Some(locked.key.bit_string().as_str()));
            assert_eq!(reparsed.netlist, locked.netlist);
        }
    }

    #[test]
    fn test_locking_is_deterministic_per_seed() {
        let original = sample_netlist();
        let scheme = LockingScheme::CorruptAndCorrect { key_len: 2 };
        let a = scheme.lock(&original, 42).unwrap();
        let b = scheme.lock(&original, 42).unwrap();
        assert_eq!(a.netlist, b.netlist);
        assert_eq!(a.key, b.key);
    }

    #[test]
    fn test_original_is_untouched() {
        let original = sample_netlist();
        let before = original.clone();
        LockingScheme::SarLock { key_len: 2 }.lock(&original, 1).unwrap();
        assert_eq!(original, before);
    }

    #[test]
    fn test_no_driven_output() {
        // Both outputs are pass-through inputs: nothing to protect
        let text = "INPUT(a)\nINPUT(b)\nOUTPUT(a)\nOUTPUT(b)\n";
        let netlist = read_bench(text.as_bytes()).unwrap().netlist;
        let err = LockingScheme::AntiSat { half_key_len: 1 }.lock(&netlist, 0);
        assert!(matches!(err, Err(LockError::NoDrivenOutput)));
    }

    #[test]
    fn test_key_too_long() {
        let original = sample_netlist();
        let err = LockingScheme::SarLock { key_len: 9 }.lock(&original, 0);
        assert!(matches!(err, Err(LockError::KeyTooLong { .. })));
        let err = LockingScheme::CorruptAndCorrect { key_len: 5 }.lock(&original, 0);
        assert!(matches!(err, Err(LockError::KeyTooLong { .. })));
    }

    #[test]
    fn test_key_input_numbering_continues() {
        let original = sample_netlist();
        let first = LockingScheme::RandomXor { key: vec![true, true] }
            .lock(&original, 0)
            .unwrap();
        assert_eq!(first.key.key_inputs, vec!["keyinput0", "keyinput1"]);
        let second = LockingScheme::RandomXor { key: vec![false] }
            .lock(&first.netlist, 1)
            .unwrap();
        assert_eq!(second.key.key_inputs, vec!["keyinput2"]);
    }

    #[test]
    fn test_parse_bits() {
        assert_eq!(
            LockingKey::parse_bits("0110"),
            Some(vec![false, true, true, false])
        );
        assert_eq!(LockingKey::parse_bits("01x0"), None);
    }
}
