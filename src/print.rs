//! Diagnostic output for PDAGs.
//!
//! The printer emits each gate once in an Aralia-like infix form, children
//! before parents. This output is for debugging and logging; it is not a
//! stable format.

use std::fmt;
use std::fmt::Write as _;
use std::io;

use log::debug;

use crate::gate::{Gate, Operator, State};
use crate::node::{GateRef, NodeRef};
use crate::pdag::Pdag;
use crate::reference::Ref;
use crate::Result;

impl Pdag {
    /// Renders the graph in the Aralia-like format, one definition line per
    /// gate: variables print as `B<i>`, gates as `G<i>`, complements with a
    /// `~` prefix, and K/N gates as `@(k, [..])`.
    ///
    /// Node visit marks are used and left dirty; callers must reset them
    /// with [`Pdag::clear_node_visits`] afterwards.
    pub fn to_aralia(&self) -> std::result::Result<String, fmt::Error> {
        let mut out = String::new();
        match self.root() {
            None => writeln!(out, "PDAG without a root")?,
            Some(root) => {
                writeln!(out, "PDAG root G{}", root.borrow().index())?;
                write_gate(root, &mut out)?;
            }
        }
        Ok(out)
    }

    /// Writes the Aralia-like rendering into an I/O stream.
    ///
    /// Node visit marks are used and left dirty, as with
    /// [`Pdag::to_aralia`].
    pub fn print<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        let text = self.to_aralia().expect("String formatting cannot fail");
        writer.write_all(text.as_bytes())?;
        Ok(())
    }

    /// Writes the graph properties into the debug log: the node counts per
    /// operator and the graph flags.
    ///
    /// Gate marks are used and cleared on exit.
    pub fn log(&self) {
        if !log::log_enabled!(log::Level::Debug) {
            return;
        }
        let Some(root) = self.root() else {
            debug!("The graph is root-less");
            return;
        };
        let mut counts = GateCounts::default();
        count_gates(root, &mut counts);
        self.clear_gate_marks();
        debug!(
            "PDAG with root G{}: {} gates, {} variables",
            root.borrow().index(),
            counts.total,
            self.num_variables()
        );
        for (operator, count) in counts.per_operator {
            if count > 0 {
                debug!("  {}: {}", operator, count);
            }
        }
        if counts.constant_states > 0 {
            debug!("  constant-state gates: {}", counts.constant_states);
        }
        debug!(
            "  complement: {}, coherent: {}, normal: {}",
            self.complement(),
            self.coherent(),
            self.normal()
        );
    }
}

impl fmt::Display for Pdag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_aralia()?)
    }
}

#[derive(Default)]
struct GateCounts {
    total: usize,
    constant_states: usize,
    per_operator: Vec<(Operator, usize)>,
}

impl GateCounts {
    fn record(&mut self, operator: Operator) {
        self.total += 1;
        for (existing, count) in &mut self.per_operator {
            if *existing == operator {
                *count += 1;
                return;
            }
        }
        self.per_operator.push((operator, 1));
    }
}

fn count_gates(gate: &GateRef, counts: &mut GateCounts) {
    if gate.borrow().mark() {
        return;
    }
    gate.borrow_mut().set_mark(true);
    {
        let g = gate.borrow();
        counts.record(g.operator());
        if g.is_constant() {
            counts.constant_states += 1;
        }
    }
    let children: Vec<GateRef> = gate.borrow().gate_args().values().cloned().collect();
    for child in &children {
        count_gates(child, counts);
    }
}

/// Formats one edge term of a gate definition.
fn term(gate: &Gate, arg: Ref) -> String {
    let name = match gate.get_arg(arg) {
        NodeRef::Gate(_) => format!("G{}", arg.index()),
        NodeRef::Variable(_) => format!("B{}", arg.index()),
        // The constant polarity is the whole story.
        NodeRef::Constant(_) => {
            return if arg.is_complement() { "FALSE".to_string() } else { "TRUE".to_string() }
        }
    };
    if arg.is_complement() {
        format!("~{}", name)
    } else {
        name
    }
}

fn write_gate(gate: &GateRef, out: &mut String) -> fmt::Result {
    if gate.borrow().node().visited() {
        return Ok(());
    }
    gate.borrow_mut().node_mut().visit(1);

    {
        let g = gate.borrow();
        if g.is_constant() {
            let value = if g.state() == State::Unity { "TRUE" } else { "FALSE" };
            return writeln!(out, "G{} := {}", g.index(), value);
        }
    }

    // Children first, so definitions precede their uses.
    let children: Vec<GateRef> = gate.borrow().gate_args().values().cloned().collect();
    for child in &children {
        write_gate(child, out)?;
    }

    let g = gate.borrow();
    let terms: Vec<String> = g.args().iter().map(|&arg| term(&g, arg)).collect();
    let rhs = match g.operator() {
        Operator::And => format!("({})", terms.join(" & ")),
        Operator::Or => format!("({})", terms.join(" | ")),
        Operator::Xor => format!("({})", terms.join(" ^ ")),
        Operator::Vote => format!("@({}, [{}])", g.vote_number(), terms.join(", ")),
        Operator::Not => format!("~{}", terms[0]),
        Operator::Nand => format!("~({})", terms.join(" & ")),
        Operator::Nor => format!("~({})", terms.join(" | ")),
        Operator::Null => terms[0].clone(),
    };
    writeln!(out, "G{} := {}", g.index(), rhs)
}
