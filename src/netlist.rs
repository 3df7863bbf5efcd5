//! Gate-level netlist representation
//!
//! Unlike index-based logic networks, locking transforms constantly rename and
//! rewire nets by name: the driver of an output is moved to `<name>_enc`, a
//! selected gate becomes `<name>_lock`, and so on. The netlist therefore keeps
//! gates in declaration order under their textual names, with a hash index for
//! lookups.

use core::fmt;

use fxhash::{FxHashMap, FxHashSet};
use thiserror::Error;

/// Errors for structurally invalid netlists
#[derive(Debug, Error)]
pub enum NetlistError {
    /// A net appears as the left-hand side of two assignments, or shadows an input
    #[error("net {0} is driven twice")]
    DoubleDrive(String),
    /// An input or output is declared twice
    #[error("{0} is declared twice")]
    DuplicateDeclaration(String),
    /// An operand or output references a net that nothing drives
    #[error("net {0} is not driven by any input or gate")]
    UndrivenNet(String),
    /// A net transitively appears in its own operand list
    #[error("net {0} is part of a combinational cycle")]
    CombinationalCycle(String),
    /// A gate has an operand count outside 1-2
    #[error("gate {0} has {1} operands, expected 1 or 2")]
    BadArity(String, usize),
    /// A line is neither a declaration, a comment nor an assignment
    #[error("cannot parse line: {0}")]
    BadLine(String),
    /// A gate was renamed or looked up under a name that does not exist
    #[error("no gate drives net {0}")]
    NoSuchGate(String),
    /// Underlying file IO failed
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Boolean operator of a gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOp {
    /// 2-input and
    And,
    /// 2-input or
    Or,
    /// 2-input nand
    Nand,
    /// 2-input nor
    Nor,
    /// 2-input xor
    Xor,
    /// 2-input xnor
    Xnor,
    /// Inverter
    Not,
    /// Buffer
    Buf,
    /// Unrecognized operator keyword, kept verbatim
    Unknown(String),
}

impl GateOp {
    /// Build the operator from its bench keyword; unrecognized keywords are kept as-is
    pub fn from_keyword(kw: &str) -> GateOp {
        match kw.to_uppercase().as_str() {
            "AND" => GateOp::And,
            "OR" => GateOp::Or,
            "NAND" => GateOp::Nand,
            "NOR" => GateOp::Nor,
            "XOR" => GateOp::Xor,
            "XNOR" => GateOp::Xnor,
            "NOT" => GateOp::Not,
            "BUF" | "BUFF" => GateOp::Buf,
            _ => GateOp::Unknown(kw.to_string()),
        }
    }

    /// Bench keyword for the operator
    pub fn keyword(&self) -> &str {
        match self {
            GateOp::And => "AND",
            GateOp::Or => "OR",
            GateOp::Nand => "NAND",
            GateOp::Nor => "NOR",
            GateOp::Xor => "XOR",
            GateOp::Xnor => "XNOR",
            GateOp::Not => "NOT",
            GateOp::Buf => "BUF",
            GateOp::Unknown(kw) => kw,
        }
    }

    /// Whether the operator keyword was not recognized at parse time
    pub fn is_unknown(&self) -> bool {
        matches!(self, GateOp::Unknown(_))
    }

    /// The operator computing the inverted function, if there is one
    pub fn complement(&self) -> Option<GateOp> {
        match self {
            GateOp::And => Some(GateOp::Nand),
            GateOp::Nand => Some(GateOp::And),
            GateOp::Or => Some(GateOp::Nor),
            GateOp::Nor => Some(GateOp::Or),
            GateOp::Xor => Some(GateOp::Xnor),
            GateOp::Xnor => Some(GateOp::Xor),
            GateOp::Not => Some(GateOp::Buf),
            GateOp::Buf => Some(GateOp::Not),
            GateOp::Unknown(_) => None,
        }
    }
}

impl fmt::Display for GateOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.keyword())
    }
}

/// A gate assignment: operator plus 1-2 operand nets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gate {
    /// Boolean operator
    pub op: GateOp,
    /// Operand net names, in order
    pub operands: Vec<String>,
}

impl Gate {
    /// Build a gate; the operand count is checked on insertion
    pub fn new(op: GateOp, operands: Vec<String>) -> Gate {
        Gate { op, operands }
    }

    /// Build a 2-input gate
    pub fn binary(op: GateOp, a: impl Into<String>, b: impl Into<String>) -> Gate {
        Gate::new(op, vec![a.into(), b.into()])
    }

    /// Build a 1-input gate
    pub fn unary(op: GateOp, a: impl Into<String>) -> Gate {
        Gate::new(op, vec![a.into()])
    }
}

/// What a name resolves to inside a netlist
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NetRef {
    Input(usize),
    KeyInput(usize),
    Gate(usize),
}

/// Representation of a combinational netlist: primary inputs, key inputs,
/// primary outputs, and named gates in declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Netlist {
    inputs: Vec<String>,
    key_inputs: Vec<String>,
    outputs: Vec<String>,
    gates: Vec<(String, Gate)>,
    index: FxHashMap<String, NetRef>,
}

impl Netlist {
    /// Create an empty netlist
    pub fn new() -> Netlist {
        Netlist::default()
    }

    /// Return the number of primary inputs
    pub fn nb_inputs(&self) -> usize {
        self.inputs.len()
    }

    /// Return the number of key inputs
    pub fn nb_key_inputs(&self) -> usize {
        self.key_inputs.len()
    }

    /// Return the number of primary outputs
    pub fn nb_outputs(&self) -> usize {
        self.outputs.len()
    }

    /// Return the number of gates
    pub fn nb_gates(&self) -> usize {
        self.gates.len()
    }

    /// Primary input names, in declaration order
    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    /// Key input names, in declaration order
    pub fn key_inputs(&self) -> &[String] {
        &self.key_inputs
    }

    /// Primary output names, in declaration order
    pub fn outputs(&self) -> &[String] {
        &self.outputs
    }

    /// Gates with their names, in declaration order
    pub fn gates(&self) -> impl Iterator<Item = (&str, &Gate)> {
        self.gates.iter().map(|(n, g)| (n.as_str(), g))
    }

    /// Names of the gates, in declaration order
    pub fn gate_names(&self) -> impl Iterator<Item = &str> {
        self.gates.iter().map(|(n, _)| n.as_str())
    }

    /// Gate at the given declaration index
    pub fn gate_at(&self, i: usize) -> (&str, &Gate) {
        let (n, g) = &self.gates[i];
        (n.as_str(), g)
    }

    /// Gate driving the given net, if any
    pub fn gate(&self, name: &str) -> Option<&Gate> {
        match self.index.get(name) {
            Some(NetRef::Gate(i)) => Some(&self.gates[*i].1),
            _ => None,
        }
    }

    /// Whether the name is a primary input, a key input or a gate output
    pub fn is_driven(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Whether the name is declared as a primary output
    pub fn is_output(&self, name: &str) -> bool {
        self.outputs.iter().any(|o| o == name)
    }

    fn claim(&mut self, name: &str, r: NetRef) -> Result<(), NetlistError> {
        if self.index.contains_key(name) {
            return Err(match r {
                NetRef::Gate(_) => NetlistError::DoubleDrive(name.to_string()),
                _ => NetlistError::DuplicateDeclaration(name.to_string()),
            });
        }
        self.index.insert(name.to_string(), r);
        Ok(())
    }

    /// Declare a primary input
    pub fn add_input(&mut self, name: impl Into<String>) -> Result<(), NetlistError> {
        let name = name.into();
        self.claim(&name, NetRef::Input(self.inputs.len()))?;
        self.inputs.push(name);
        Ok(())
    }

    /// Declare a key input
    pub fn add_key_input(&mut self, name: impl Into<String>) -> Result<(), NetlistError> {
        let name = name.into();
        self.claim(&name, NetRef::KeyInput(self.key_inputs.len()))?;
        self.key_inputs.push(name);
        Ok(())
    }

    /// Declare a primary output
    pub fn add_output(&mut self, name: impl Into<String>) -> Result<(), NetlistError> {
        let name = name.into();
        if self.is_output(&name) {
            return Err(NetlistError::DuplicateDeclaration(name));
        }
        self.outputs.push(name);
        Ok(())
    }

    /// Declare a primary output unless it is one already
    pub fn add_output_dedup(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !self.is_output(&name) {
            self.outputs.push(name);
        }
    }

    /// Add a gate driving a new net
    pub fn add_gate(&mut self, name: impl Into<String>, gate: Gate) -> Result<(), NetlistError> {
        let name = name.into();
        if gate.operands.is_empty() || gate.operands.len() > 2 {
            return Err(NetlistError::BadArity(name, gate.operands.len()));
        }
        self.claim(&name, NetRef::Gate(self.gates.len()))?;
        self.gates.push((name, gate));
        Ok(())
    }

    /// Rename the net driven by a gate, keeping its body and position
    ///
    /// Only the left-hand side changes: operands referencing the old name keep
    /// referencing it, and resolve to whatever drives that name afterwards.
    pub fn rename_gate(&mut self, old: &str, new: impl Into<String>) -> Result<(), NetlistError> {
        let new = new.into();
        let i = match self.index.get(old) {
            Some(NetRef::Gate(i)) => *i,
            _ => return Err(NetlistError::NoSuchGate(old.to_string())),
        };
        if self.index.contains_key(&new) {
            return Err(NetlistError::DoubleDrive(new));
        }
        self.index.remove(old);
        self.index.insert(new.clone(), NetRef::Gate(i));
        self.gates[i].0 = new;
        Ok(())
    }

    /// Replace the body of an existing gate, keeping its name and position
    pub fn replace_gate(&mut self, name: &str, gate: Gate) -> Result<(), NetlistError> {
        if gate.operands.is_empty() || gate.operands.len() > 2 {
            return Err(NetlistError::BadArity(name.to_string(), gate.operands.len()));
        }
        match self.index.get(name) {
            Some(NetRef::Gate(i)) => {
                self.gates[*i].1 = gate;
                Ok(())
            }
            _ => Err(NetlistError::NoSuchGate(name.to_string())),
        }
    }

    /// Gate names in topological order (operands before the gates using them)
    ///
    /// Fails with [`NetlistError::CombinationalCycle`] if a net transitively
    /// feeds itself, and [`NetlistError::UndrivenNet`] on dangling operands.
    pub fn topo_order(&self) -> Result<Vec<usize>, NetlistError> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            White,
            Grey,
            Black,
        }
        let mut marks = vec![Mark::White; self.gates.len()];
        let mut order = Vec::with_capacity(self.gates.len());
        for start in 0..self.gates.len() {
            if marks[start] != Mark::White {
                continue;
            }
            // Iterative DFS: (gate, next operand to visit)
            let mut stack = vec![(start, 0usize)];
            marks[start] = Mark::Grey;
            while let Some((i, op_pos)) = stack.pop() {
                let (_, gate) = &self.gates[i];
                if op_pos == gate.operands.len() {
                    marks[i] = Mark::Black;
                    order.push(i);
                    continue;
                }
                stack.push((i, op_pos + 1));
                let dep = &gate.operands[op_pos];
                match self.index.get(dep.as_str()) {
                    None => return Err(NetlistError::UndrivenNet(dep.clone())),
                    Some(NetRef::Gate(j)) => match marks[*j] {
                        Mark::White => {
                            marks[*j] = Mark::Grey;
                            stack.push((*j, 0));
                        }
                        Mark::Grey => {
                            return Err(NetlistError::CombinationalCycle(
                                self.gates[*j].0.clone(),
                            ))
                        }
                        Mark::Black => (),
                    },
                    Some(_) => (),
                }
            }
        }
        Ok(order)
    }

    /// Check the structural invariants: every operand and output driven,
    /// no double drive, no combinational cycle
    pub fn validate(&self) -> Result<(), NetlistError> {
        self.topo_order()?;
        for o in &self.outputs {
            if !self.is_driven(o) {
                return Err(NetlistError::UndrivenNet(o.clone()));
            }
        }
        Ok(())
    }

    /// Gate-driven nets that no gate consumes and that are not primary outputs
    ///
    /// Downstream ATPG and SAT tools reject netlists with such dangling nets,
    /// so locking transforms refuse to emit them.
    pub fn unconsumed_nets(&self) -> Vec<String> {
        let mut consumed = FxHashSet::default();
        for (_, gate) in &self.gates {
            for op in &gate.operands {
                consumed.insert(op.as_str());
            }
        }
        self.gates
            .iter()
            .map(|(n, _)| n)
            .filter(|n| !consumed.contains(n.as_str()) && !self.is_output(n))
            .cloned()
            .collect()
    }
}
