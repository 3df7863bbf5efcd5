//! IO for .bench (ISCAS) files

use std::io::{BufRead, BufReader, Read, Write};

use crate::netlist::{Gate, GateOp, Netlist, NetlistError};

/// A parsed bench file: the netlist plus its `#key=` annotation if present
#[derive(Debug, Clone)]
pub struct BenchFile {
    /// The parsed netlist
    pub netlist: Netlist,
    /// Key bits from a `#key=<bits>` header, for locked files
    pub key: Option<String>,
}

/// Inputs named like key inputs are tracked separately, so that re-locking an
/// already locked file numbers new key inputs after the existing ones.
fn is_key_input(name: &str) -> bool {
    name.to_lowercase().contains("keyinput")
}

fn parse_declaration(line: &str, netlist: &mut Netlist) -> Result<(), NetlistError> {
    let parts: Vec<_> = line
        .split(&['(', ')'])
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();
    if parts.len() != 2 {
        return Err(NetlistError::BadLine(line.to_string()));
    }
    match parts[0] {
        "INPUT" | "PINPUT" => {
            if is_key_input(parts[1]) {
                netlist.add_key_input(parts[1])
            } else {
                netlist.add_input(parts[1])
            }
        }
        "OUTPUT" | "POUTPUT" => netlist.add_output(parts[1]),
        _ => Err(NetlistError::BadLine(line.to_string())),
    }
}

fn parse_assignment(line: &str, netlist: &mut Netlist) -> Result<(), NetlistError> {
    let parts: Vec<_> = line
        .split(&['=', '(', ',', ')'])
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
        .collect();
    if parts.len() < 3 {
        return Err(NetlistError::BadLine(line.to_string()));
    }
    let name = parts[0].clone();
    let op = GateOp::from_keyword(&parts[1]);
    let operands: Vec<String> = parts[2..].to_vec();
    match op {
        GateOp::Not | GateOp::Buf if operands.len() != 1 => {
            return Err(NetlistError::BadArity(name, operands.len()));
        }
        GateOp::And | GateOp::Or | GateOp::Nand | GateOp::Nor | GateOp::Xor | GateOp::Xnor
            if operands.len() != 2 =>
        {
            return Err(NetlistError::BadArity(name, operands.len()));
        }
        _ => (),
    }
    netlist.add_gate(name, Gate::new(op, operands))
}

/// Read a netlist in .bench format, as used by the ISCAS benchmarks
///
/// These files describe the design with simple statements like:
/// ```text
///     # This is a comment
///     INPUT(i0)
///     INPUT(i1)
///     x0 = AND(i0, i1)
///     x1 = NAND(x0, i1)
///     x2 = NOT(x1)
///     OUTPUT(x2)
/// ```
///
/// Locked files carry a `#key=<bits>` header and declare their key inputs as
/// regular `INPUT(keyinput<N>)` lines; both are recognized here.
pub fn read_bench<R: Read>(r: R) -> Result<BenchFile, NetlistError> {
    let mut netlist = Netlist::new();
    let mut key = None;
    for l in BufReader::new(r).lines() {
        let t = l?.trim().to_owned();
        if t.is_empty() {
            continue;
        }
        if let Some(stripped) = t.strip_prefix('#') {
            if key.is_none() {
                if let Some(bits) = stripped.trim().strip_prefix("key=") {
                    key = Some(bits.trim().to_string());
                }
            }
            continue;
        }
        if t.contains('=') {
            parse_assignment(&t, &mut netlist)?;
        } else {
            parse_declaration(&t, &mut netlist)?;
        }
    }
    netlist.validate()?;
    Ok(BenchFile { netlist, key })
}

/// Write a netlist in .bench format, as used by the ISCAS benchmarks
///
/// Emits the `#key=<bits>` annotation first when a key is given, then the
/// primary inputs, the key inputs, the outputs, and the gate assignments in
/// declaration order. The format does not require topological order.
pub fn write_bench<W: Write>(
    w: &mut W,
    netlist: &Netlist,
    key: Option<&str>,
) -> std::io::Result<()> {
    if let Some(bits) = key {
        writeln!(w, "#key={}", bits)?;
    }
    writeln!(w, "# .bench (ISCAS) file")?;
    for name in netlist.inputs() {
        writeln!(w, "INPUT({})", name)?;
    }
    for name in netlist.key_inputs() {
        writeln!(w, "INPUT({})", name)?;
    }
    for name in netlist.outputs() {
        writeln!(w, "OUTPUT({})", name)?;
    }
    for (name, gate) in netlist.gates() {
        writeln!(w, "{} = {}({})", name, gate.op, gate.operands.join(", "))?;
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    const EXAMPLE: &str = "# .bench (ISCAS) file
INPUT(i0)
INPUT(i1)

OUTPUT(x0)
OUTPUT(x4)

x0 = AND(i0, i1)
x1 = NAND(i0, i1)
x2 = OR(x0, x1)
x3 = NOR(i0, x1)
x4 = XOR(x3, x2)
x5   =  XNOR( x4 , i0 )
x6 = NOT(x5)
x7 = BUF(x6)
";

    #[test]
    fn test_basic_readwrite() {
        let parsed = read_bench(EXAMPLE.as_bytes()).unwrap();
        assert_eq!(parsed.netlist.nb_inputs(), 2);
        assert_eq!(parsed.netlist.nb_outputs(), 2);
        assert_eq!(parsed.netlist.nb_gates(), 8);
        assert!(parsed.key.is_none());
        let mut buf = Vec::new();
        write_bench(&mut buf, &parsed.netlist, None).unwrap();
        String::from_utf8(buf).unwrap();
    }

    #[test]
    fn test_roundtrip_identity() {
        let parsed = read_bench(EXAMPLE.as_bytes()).unwrap();
        let mut buf = Vec::new();
        write_bench(&mut buf, &parsed.netlist, Some("0110")).unwrap();
        let reparsed = read_bench(buf.as_slice()).unwrap();
        assert_eq!(reparsed.netlist, parsed.netlist);
        assert_eq!(reparsed.key.as_deref(), Some("0110"));
    }

    #[test]
    fn test_key_inputs_recognized() {
        let text = "#key=10
INPUT(a)
INPUT(keyinput0)
INPUT(KEYINPUT1)
OUTPUT(y)
y0 = XOR(a, keyinput0)
y = XNOR(y0, KEYINPUT1)
";
        let parsed = read_bench(text.as_bytes()).unwrap();
        assert_eq!(parsed.netlist.nb_inputs(), 1);
        assert_eq!(parsed.netlist.nb_key_inputs(), 2);
        assert_eq!(parsed.key.as_deref(), Some("10"));
    }

    #[test]
    fn test_unknown_operator_preserved() {
        let text = "INPUT(a)\nINPUT(b)\nOUTPUT(y)\ny = FOO(a, b)\n";
        let parsed = read_bench(text.as_bytes()).unwrap();
        let gate = parsed.netlist.gate("y").unwrap();
        assert!(gate.op.is_unknown());
        let mut buf = Vec::new();
        write_bench(&mut buf, &parsed.netlist, None).unwrap();
        let out = String::from_utf8(buf).unwrap();
        assert!(out.contains("y = FOO(a, b)"));
    }

    #[test]
    fn test_malformed_lines_rejected() {
        assert!(read_bench("WHATEVER(a)\n".as_bytes()).is_err());
        assert!(read_bench("INPUT(a)\nx = NOT(a, a)\nOUTPUT(x)\n".as_bytes()).is_err());
        assert!(read_bench("INPUT(a)\nOUTPUT(x)\nx = AND(a, ghost)\n".as_bytes()).is_err());
    }

    #[test]
    fn test_output_feeding_from_input_is_legal() {
        // Pass-through outputs have no driving gate but are still driven nets
        let text = "INPUT(a)\nINPUT(b)\nOUTPUT(a)\nOUTPUT(y)\ny = AND(a, b)\n";
        let parsed = read_bench(text.as_bytes()).unwrap();
        assert_eq!(parsed.netlist.nb_outputs(), 2);
    }
}
