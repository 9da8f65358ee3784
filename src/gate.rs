use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

use log::debug;

use crate::linear_map::LinearMap;
use crate::node::{ConstantRef, GateRef, GateWeak, Node, NodeRef, VariableRef};
use crate::pdag::ContextRef;
use crate::reference::Ref;

/// Boolean operators of gates.
///
/// A gate starts with any of these operators; preprocessing gradually
/// rewrites the graph so that only `And` and `Or` remain for analysis.
///
/// If a new operator is ever added, every rewrite in this module must be
/// reviewed: the algorithms assume this exact set.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Operator {
    /// Simple AND gate.
    And,
    /// Simple OR gate.
    Or,
    /// Combination, K/N, or Vote gate.
    Vote,
    /// Exclusive OR gate with two arguments.
    Xor,
    /// Boolean negation.
    Not,
    /// NAND gate.
    Nand,
    /// NOR gate.
    Nor,
    /// Pass-through or NULL gate. This is not the NULL set.
    Null,
}

impl Display for Operator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Operator::And => "and",
            Operator::Or => "or",
            Operator::Vote => "atleast",
            Operator::Xor => "xor",
            Operator::Not => "not",
            Operator::Nand => "nand",
            Operator::Nor => "nor",
            Operator::Null => "null",
        };
        write!(f, "{}", name)
    }
}

/// The state of a gate as a Boolean set.
///
/// Rewrites can collapse a gate into a constant; the state records which.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum State {
    /// The arguments represent the gate literally.
    Normal,
    /// The set is null: the gate is constantly FALSE.
    Null,
    /// The set is unity: the gate is constantly TRUE.
    Unity,
}

/// An indexed gate of a PDAG.
///
/// The gate owns its arguments through three typed containers partitioned by
/// node kind and keyed by positive index; the signed `args` set carries the
/// edge polarities. Every editing operation preserves the graph invariants:
/// no self-references, at most one polarity per argument, parent-set
/// consistency, and the arity constraints of the operator.
///
/// Adding an argument that duplicates or complements an existing one
/// triggers the Boolean rewrites of the operator, which may erase arguments,
/// collapse the gate into a constant state, or introduce new gates. Callers
/// must check `state()` after edits.
#[derive(Debug)]
pub struct Gate {
    node: Node,
    operator: Operator,
    state: State,
    vote_number: i32,
    mark: bool,
    module: bool,
    coherent: bool,
    descendant: i32,
    ancestor: i32,
    min_time: i32,
    max_time: i32,
    args: BTreeSet<Ref>,
    gate_args: LinearMap<i32, GateRef>,
    variable_args: LinearMap<i32, VariableRef>,
    constant_args: LinearMap<i32, ConstantRef>,
    context: ContextRef,
    weak_self: GateWeak,
}

impl Gate {
    /// Creates a gate with a fresh index from the graph.
    pub(crate) fn new(operator: Operator, context: &ContextRef) -> GateRef {
        let index = context.next_index();
        std::rc::Rc::new_cyclic(|weak_self| {
            std::cell::RefCell::new(Gate {
                node: Node::new(index),
                operator,
                state: State::Normal,
                vote_number: 0,
                mark: false,
                module: false,
                coherent: false,
                descendant: 0,
                ancestor: 0,
                min_time: 0,
                max_time: 0,
                args: BTreeSet::new(),
                gate_args: LinearMap::new(),
                variable_args: LinearMap::new(),
                constant_args: LinearMap::new(),
                context: context.clone(),
                weak_self: weak_self.clone(),
            })
        })
    }

    pub fn index(&self) -> i32 {
        self.node.index()
    }

    pub(crate) fn context(&self) -> &ContextRef {
        &self.context
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    pub fn node_mut(&mut self) -> &mut Node {
        &mut self.node
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    /// Changes the logic of the gate.
    ///
    /// Pass-through gates are registered with the graph worklist so an outer
    /// pass can splice them out.
    ///
    /// The new logic must be compatible with the existing arguments, and the
    /// previous operator must differ from the new one.
    pub fn set_operator(&mut self, operator: Operator) {
        assert_ne!(self.operator, operator, "Invalid operator change");
        self.operator = operator;
        if operator == Operator::Null {
            self.context.register_null_gate(self.weak_self.clone());
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// True if this gate has collapsed into a Boolean constant.
    pub fn is_constant(&self) -> bool {
        self.state != State::Normal
    }

    /// The vote number of a K/N gate.
    pub fn vote_number(&self) -> i32 {
        self.vote_number
    }

    /// Sets the vote number. The number must fit the gate logic and
    /// arguments.
    pub fn set_vote_number(&mut self, number: i32) {
        self.vote_number = number;
    }

    /// The ordered set of signed argument references of this gate.
    pub fn args(&self) -> &BTreeSet<Ref> {
        &self.args
    }

    pub fn gate_args(&self) -> &LinearMap<i32, GateRef> {
        &self.gate_args
    }

    pub fn variable_args(&self) -> &LinearMap<i32, VariableRef> {
        &self.variable_args
    }

    pub fn constant_args(&self) -> &LinearMap<i32, ConstantRef> {
        &self.constant_args
    }

    pub fn mark(&self) -> bool {
        self.mark
    }

    pub fn set_mark(&mut self, flag: bool) {
        self.mark = flag;
    }

    pub fn module(&self) -> bool {
        self.module
    }

    /// Sets the module flag. The gate must carry the opposite flag already.
    pub fn set_module(&mut self, flag: bool) {
        assert_ne!(self.module, flag, "Redundant module flag assignment");
        self.module = flag;
    }

    /// True if the whole sub-graph of this gate is coherent.
    pub fn coherent(&self) -> bool {
        self.coherent
    }

    pub fn set_coherent(&mut self, flag: bool) {
        self.coherent = flag;
    }

    pub fn descendant(&self) -> i32 {
        self.descendant
    }

    pub fn set_descendant(&mut self, index: i32) {
        self.descendant = index;
    }

    pub fn ancestor(&self) -> i32 {
        self.ancestor
    }

    pub fn set_ancestor(&mut self, index: i32) {
        self.ancestor = index;
    }

    /// The minimum visit time of this gate's sub-graph, 0 if unassigned.
    pub fn min_time(&self) -> i32 {
        self.min_time
    }

    pub fn set_min_time(&mut self, time: i32) {
        assert!(time > 0, "Visit times are positive");
        self.min_time = time;
    }

    /// The maximum visit time of this gate's sub-graph, 0 if unassigned.
    pub fn max_time(&self) -> i32 {
        self.max_time
    }

    pub fn set_max_time(&mut self, time: i32) {
        assert!(time > 0, "Visit times are positive");
        self.max_time = time;
    }

    /// The sign of an existing argument node: 1 if positive, -1 if
    /// complemented.
    ///
    /// The node must be an argument of this gate.
    pub fn arg_sign(&self, index: i32) -> i32 {
        debug_assert!(index > 0, "Node indices are positive");
        assert!(
            self.args.contains(&Ref::positive(index)) || self.args.contains(&Ref::negative(index)),
            "No argument with the given index exists"
        );
        if self.args.contains(&Ref::positive(index)) {
            1
        } else {
            -1
        }
    }

    /// Retrieves an argument node through the typed containers.
    ///
    /// The reference must be an argument of this gate.
    pub fn get_arg(&self, arg: Ref) -> NodeRef {
        assert!(self.args.contains(&arg), "No argument with the given reference exists");
        let index = arg.index();
        if let Some(gate) = self.gate_args.get(index) {
            NodeRef::Gate(gate.clone())
        } else if let Some(variable) = self.variable_args.get(index) {
            NodeRef::Variable(variable.clone())
        } else {
            let constant = self.constant_args.get(index).expect("Corrupted argument containers");
            NodeRef::Constant(constant.clone())
        }
    }

    /// Adds an argument node to this gate.
    ///
    /// The existing arguments are checked for duplicates and complements
    /// first; either dispatches into the Boolean rewrite of the operator,
    /// which may change the state or the type of this gate and may introduce
    /// new gates (K/N duplicates). Callers must be prepared for any of these
    /// side effects.
    ///
    /// The gate must be in the normal state, the reference must match the
    /// node's index, and the arity constraints of the operator must not be
    /// violated by a genuinely new argument.
    pub fn add_arg(&mut self, arg: Ref, node: &NodeRef) {
        assert_eq!(arg.index(), node.index(), "Reference and argument node disagree");
        assert_ne!(arg.index(), self.index(), "A gate cannot be its own argument");
        assert_eq!(self.state, State::Normal, "Constant gates carry no arguments");
        assert!(
            !((self.operator == Operator::Not || self.operator == Operator::Null) && !self.args.is_empty()),
            "Single-argument gate already has its argument"
        );
        assert!(
            !(self.operator == Operator::Xor && self.args.len() > 1),
            "XOR gates take exactly two arguments"
        );

        if self.args.contains(&arg) {
            return self.process_duplicate_arg(arg);
        }
        if self.args.contains(&-arg) {
            return self.process_complement_arg(arg);
        }
        self.args.insert(arg);
        match node {
            NodeRef::Gate(gate) => self.gate_args.insert(arg.index(), gate.clone()),
            NodeRef::Variable(variable) => self.variable_args.insert(arg.index(), variable.clone()),
            NodeRef::Constant(constant) => self.constant_args.insert(arg.index(), constant.clone()),
        }
        node.add_parent(self.index(), self.weak_self.clone());
    }

    /// Wrapper to add a gate argument with the polarity given separately.
    pub fn add_gate_arg(&mut self, gate: &GateRef, complement: bool) {
        let arg = Ref::new(gate.borrow().index(), complement);
        self.add_arg(arg, &NodeRef::Gate(gate.clone()));
    }

    /// Wrapper to add a variable argument with the polarity given separately.
    pub fn add_variable_arg(&mut self, variable: &VariableRef, complement: bool) {
        let arg = Ref::new(variable.borrow().node().index(), complement);
        self.add_arg(arg, &NodeRef::Variable(variable.clone()));
    }

    /// Wrapper to add the graph constant with the polarity given separately.
    ///
    /// A positive edge is the constant TRUE; a complement edge is FALSE.
    pub fn add_constant_arg(&mut self, constant: &ConstantRef, complement: bool) {
        let arg = Ref::new(constant.borrow().node().index(), complement);
        self.add_arg(arg, &NodeRef::Constant(constant.clone()));
    }

    /// Removes an argument edge and detaches the parent back-reference.
    ///
    /// The reference must be an argument of this gate. The gate may be left
    /// with one or zero arguments, which the caller must handle.
    pub fn erase_arg(&mut self, arg: Ref) {
        let removed = self.args.remove(&arg);
        assert!(removed, "No argument with the given reference exists");
        let index = arg.index();
        let self_index = self.index();
        if let Some(gate) = self.gate_args.remove(index) {
            gate.borrow_mut().node_mut().erase_parent(self_index);
        } else if let Some(variable) = self.variable_args.remove(index) {
            variable.borrow_mut().node_mut().erase_parent(self_index);
        } else {
            let constant = self.constant_args.remove(index).expect("Corrupted argument containers");
            constant.borrow_mut().node_mut().erase_parent(self_index);
        }
    }

    /// Removes all argument edges, detaching every parent back-reference.
    pub fn erase_all_args(&mut self) {
        let self_index = self.index();
        for (_, gate) in self.gate_args.drain() {
            gate.borrow_mut().node_mut().erase_parent(self_index);
        }
        for (_, variable) in self.variable_args.drain() {
            variable.borrow_mut().node_mut().erase_parent(self_index);
        }
        for (_, constant) in self.constant_args.drain() {
            constant.borrow_mut().node_mut().erase_parent(self_index);
        }
        self.args.clear();
    }

    /// Complements every argument edge. This pushes a negation down through
    /// the gate for De Morgan conversions.
    ///
    /// The typed containers are keyed by positive index, so only the signed
    /// set is rewritten.
    pub fn invert_args(&mut self) {
        let flipped: BTreeSet<Ref> = self.args.iter().map(|&arg| -arg).collect();
        self.args = flipped;
    }

    /// Complements a single argument edge.
    ///
    /// The flipped polarity cannot be present already: signed uniqueness of
    /// arguments rules a collision out. Re-introducing the original polarity
    /// afterwards goes through [`Gate::add_arg`] and resolves by the
    /// complement-argument rule of the operator.
    pub fn invert_arg(&mut self, existing: Ref) {
        assert!(self.args.contains(&existing), "No argument with the given reference exists");
        assert!(!self.args.contains(&-existing), "Both polarities of an argument cannot coexist");
        self.args.remove(&existing);
        self.args.insert(-existing);
    }

    /// Absorbs the arguments of an AND/OR argument gate of the same logic.
    ///
    /// Every argument of the child is re-added to this gate (running the
    /// duplicate/complement rules), and the edge to the child is removed.
    /// The edge to the child must be positive, and both gates must share
    /// AND/OR logic. Constant arguments must have been propagated already.
    pub fn coalesce_gate(&mut self, arg: Ref) {
        assert!(!arg.is_complement(), "Cannot coalesce a complement gate");
        assert!(self.args.contains(&arg), "No argument with the given reference exists");
        assert!(
            matches!(self.operator, Operator::And | Operator::Or),
            "Only AND/OR gates coalesce"
        );
        let child = self
            .gate_args
            .get(arg.index())
            .expect("The argument to coalesce is not a gate")
            .clone();
        debug!("coalesce: gate {} into gate {}", arg.index(), self.index());
        let child_args: Vec<(Ref, NodeRef)> = {
            let child = child.borrow();
            assert_eq!(child.operator(), self.operator, "Coalescing requires matching logic");
            assert_eq!(child.state(), State::Normal, "Impossible to coalesce a constant gate");
            assert!(!child.args().is_empty(), "Corrupted gate");
            child.args().iter().map(|&r| (r, child.get_arg(r))).collect()
        };
        for (r, node) in child_args {
            self.add_arg(r, &node);
            if self.state != State::Normal {
                return; // The rewrite erased all arguments, the child included.
            }
        }
        self.erase_arg(arg);
    }

    /// Splices out a pass-through argument gate, taking the edge signs into
    /// account: an edge `s * k` to a NULL gate with single argument `s' * m`
    /// becomes the edge `s * s' * m`.
    ///
    /// The replacement edge runs the duplicate/complement rules of this
    /// gate.
    pub fn join_null_gate(&mut self, arg: Ref) {
        assert!(self.args.contains(&arg), "No argument with the given reference exists");
        let child = self
            .gate_args
            .get(arg.index())
            .expect("The argument to join is not a gate")
            .clone();
        debug!("join: NULL gate {} into gate {}", arg.index(), self.index());
        let (inner, inner_node) = {
            let child = child.borrow();
            assert_eq!(child.operator(), Operator::Null, "Only pass-through gates join");
            assert_eq!(child.args().len(), 1, "Corrupted pass-through gate");
            let &inner = child.args().iter().next().expect("Pass-through gate without argument");
            (inner, child.get_arg(inner))
        };
        self.erase_arg(arg);
        self.add_arg(arg.imposed_on(inner), &inner_node);
    }

    /// Folds a Boolean constant argument into the gate.
    ///
    /// `value` is the value of the argument node; the sign of the edge is
    /// applied before the operator-specific folding. The gate may drop the
    /// edge, change its operator, or collapse into a constant state.
    pub fn process_constant_arg(&mut self, arg: Ref, value: bool) {
        let value = if arg.is_complement() { !value } else { value };
        if value {
            self.process_true_arg(arg);
        } else {
            self.process_false_arg(arg);
        }
    }

    /// Moves an argument of this gate onto the recipient gate.
    ///
    /// The recipient must be a different gate; the duplicate/complement
    /// rules of the recipient apply.
    pub fn transfer_arg(&mut self, arg: Ref, recipient: &GateRef) {
        let node = self.get_arg(arg);
        recipient.borrow_mut().add_arg(arg, &node);
        self.erase_arg(arg);
    }

    /// Adds an argument of this gate to the recipient gate as well.
    ///
    /// The recipient must be a different gate; the duplicate/complement
    /// rules of the recipient apply.
    pub fn share_arg(&self, arg: Ref, recipient: &GateRef) {
        let node = self.get_arg(arg);
        recipient.borrow_mut().add_arg(arg, &node);
    }

    /// Clones the semantics of this gate into a fresh gate: same operator,
    /// same vote number, shallow-copied argument containers (children are
    /// shared, not duplicated). The index is new; parents, marks, and state
    /// do not carry over.
    ///
    /// Cloning does not preserve module invariants; callers that clone
    /// modules must clear the flag themselves.
    pub fn clone_gate(&self) -> GateRef {
        debug!("clone: gate {}", self.index());
        let clone = Gate::new(self.operator, &self.context);
        {
            let mut gate = clone.borrow_mut();
            gate.vote_number = self.vote_number;
            gate.args = self.args.clone();
            gate.gate_args = self.gate_args.clone();
            gate.variable_args = self.variable_args.clone();
            gate.constant_args = self.constant_args.clone();
        }
        let clone_index = clone.borrow().index();
        let weak = std::rc::Rc::downgrade(&clone);
        for gate in self.gate_args.values() {
            gate.borrow_mut().node_mut().add_parent(clone_index, weak.clone());
        }
        for variable in self.variable_args.values() {
            variable.borrow_mut().node_mut().add_parent(clone_index, weak.clone());
        }
        for constant in self.constant_args.values() {
            constant.borrow_mut().node_mut().add_parent(clone_index, weak.clone());
        }
        clone
    }

    /// Collapses this gate into a Boolean constant: sets the state, erases
    /// all arguments, and registers the gate on the constant-gate worklist.
    ///
    /// The gate must be in the normal state. This is a normal rewrite
    /// outcome, not an error.
    pub fn make_constant(&mut self, value: bool) {
        assert_eq!(self.state, State::Normal, "The gate is already constant");
        self.state = if value { State::Unity } else { State::Null };
        debug!("constant: gate {} became {}", self.index(), value);
        self.erase_all_args();
        self.context.register_const_gate(self.weak_self.clone());
    }

    /// Resolves an addition of an argument that is already present.
    fn process_duplicate_arg(&mut self, arg: Ref) {
        debug_assert!(self.args.contains(&arg));
        match self.operator {
            // Idempotent logic absorbs the duplicate.
            Operator::And | Operator::Or | Operator::Nand | Operator::Nor => {}
            Operator::Xor => {
                debug!("rewrite: x ^ x = false");
                self.make_constant(false);
            }
            Operator::Vote => self.process_vote_gate_duplicate_arg(arg),
            Operator::Not | Operator::Null => {
                unreachable!("Single-argument gates cannot receive duplicates")
            }
        }
    }

    /// Resolves a K/N duplicate by materialising the multiplicity:
    ///
    /// ```text
    /// @(k, [x, x, Z]) = x & @(k-2, [Z]) | @(k, [Z])
    /// ```
    ///
    /// The duplicated literal counts twice toward the threshold. New gates
    /// take fresh indices from the graph; every surviving K/N gate keeps the
    /// vote invariant, and degenerate forms collapse into AND/OR/NULL logic
    /// or a constant state.
    fn process_vote_gate_duplicate_arg(&mut self, arg: Ref) {
        let k = self.vote_number;
        debug!("rewrite: @({}, [x, x, Z]) = x & @({}, [Z]) | @({}, [Z])", k, k - 2, k);
        assert!(k >= 2, "K/N gates take a vote number of at least 2");
        if self.args.len() == 1 {
            // Only the pair [x, x] exists; it meets the threshold iff k <= 2.
            if k == 2 {
                self.set_operator(Operator::Null);
            } else {
                self.make_constant(false);
            }
            return;
        }
        let x_node = self.get_arg(arg);

        // The @(k, [Z]) branch.
        let low = self.clone_gate();
        low.borrow_mut().erase_arg(arg);

        // The @(k-2, [Z]) factor under the AND branch; trivial when k == 2.
        let high_sub = if k > 2 {
            let sub = low.borrow().clone_gate();
            sub.borrow_mut().set_vote_number(k - 2);
            Some(sub)
        } else {
            None
        };
        low.borrow_mut().reduce_vote();
        if let Some(sub) = &high_sub {
            sub.borrow_mut().reduce_vote();
        }

        self.erase_all_args();
        self.set_operator(Operator::Or);

        match high_sub {
            None => self.add_arg(arg, &x_node), // x & TRUE
            Some(sub) => {
                let sub_state = sub.borrow().state();
                match sub_state {
                    State::Unity => self.add_arg(arg, &x_node),
                    State::Null => {} // x & FALSE contributes nothing
                    State::Normal => {
                        let and_gate = Gate::new(Operator::And, &self.context);
                        {
                            let mut gate = and_gate.borrow_mut();
                            gate.add_arg(arg, &x_node);
                            gate.add_gate_arg(&sub, false);
                        }
                        self.add_gate_arg(&and_gate, false);
                    }
                }
            }
        }

        let low_state = low.borrow().state();
        match low_state {
            State::Unity => return self.make_constant(true),
            State::Null => {}
            State::Normal => self.add_gate_arg(&low, false),
        }

        match self.args.len() {
            0 => self.make_constant(false),
            1 => self.set_operator(Operator::Null),
            _ => {}
        }
    }

    /// Resolves an addition of the complement of an existing argument.
    fn process_complement_arg(&mut self, arg: Ref) {
        debug_assert!(self.args.contains(&-arg));
        match self.operator {
            Operator::And | Operator::Nor => self.make_constant(false),
            Operator::Or | Operator::Nand | Operator::Xor => self.make_constant(true),
            Operator::Vote => {
                // The pair [x, ~x] contributes exactly one to the count.
                let k = self.vote_number;
                debug!("rewrite: @({}, [x, ~x, Z]) = @({}, [Z])", k, k - 1);
                self.erase_arg(-arg);
                self.vote_number = k - 1;
                self.reduce_vote();
            }
            Operator::Not | Operator::Null => {
                unreachable!("Single-argument gates cannot receive complements")
            }
        }
    }

    /// Folds a TRUE value on the given edge into the gate logic.
    fn process_true_arg(&mut self, arg: Ref) {
        match self.operator {
            Operator::Null | Operator::Or => self.make_constant(true),
            Operator::And | Operator::Nand => self.remove_constant_arg(arg),
            Operator::Nor | Operator::Not => self.make_constant(false),
            Operator::Xor => {
                // x ^ 1 = ~x
                assert_eq!(self.args.len(), 2, "XOR gates take exactly two arguments");
                self.erase_arg(arg);
                self.set_operator(Operator::Null);
                self.invert_args();
            }
            Operator::Vote => {
                // (k-1) out of the remaining (n-1).
                self.erase_arg(arg);
                self.vote_number -= 1;
                self.reduce_vote();
            }
        }
    }

    /// Folds a FALSE value on the given edge into the gate logic.
    fn process_false_arg(&mut self, arg: Ref) {
        match self.operator {
            Operator::Null | Operator::And => self.make_constant(false),
            Operator::Or | Operator::Nor => self.remove_constant_arg(arg),
            Operator::Nand | Operator::Not => self.make_constant(true),
            Operator::Xor => {
                // x ^ 0 = x
                assert_eq!(self.args.len(), 2, "XOR gates take exactly two arguments");
                self.erase_arg(arg);
                self.set_operator(Operator::Null);
            }
            Operator::Vote => {
                // k out of the remaining (n-1).
                self.erase_arg(arg);
                self.reduce_vote();
            }
        }
    }

    /// Drops a neutral constant edge and resolves the remnant gate.
    ///
    /// An emptied gate becomes the neutral element of its logic; a gate left
    /// with a single argument decays to pass-through or negation.
    fn remove_constant_arg(&mut self, arg: Ref) {
        self.erase_arg(arg);
        match self.args.len() {
            0 => match self.operator {
                Operator::And => self.make_constant(true),
                Operator::Or => self.make_constant(false),
                Operator::Nand => self.make_constant(false),
                Operator::Nor => self.make_constant(true),
                _ => unreachable!("Only n-ary gates drop constant arguments"),
            },
            1 => match self.operator {
                Operator::And | Operator::Or => self.set_operator(Operator::Null),
                Operator::Nand | Operator::Nor => self.set_operator(Operator::Not),
                _ => unreachable!("Only n-ary gates drop constant arguments"),
            },
            _ => {}
        }
    }

    /// Collapses a K/N gate whose vote arithmetic left the K/N range.
    ///
    /// `k <= 0` is always satisfied; `k > n` is unsatisfiable; `k == 1` is
    /// an OR; `k == n` is an AND; a single-argument survivor is a
    /// pass-through. A gate that stays K/N satisfies `2 <= k < n`.
    fn reduce_vote(&mut self) {
        assert_eq!(self.operator, Operator::Vote, "Only K/N gates reduce vote arithmetic");
        let k = self.vote_number;
        let n = self.args.len() as i32;
        if k <= 0 {
            self.make_constant(true);
        } else if n < k {
            self.make_constant(false);
        } else if k == 1 {
            if n == 1 {
                self.set_operator(Operator::Null);
            } else {
                self.set_operator(Operator::Or);
            }
        } else if k == n {
            self.set_operator(Operator::And);
        }
    }
}

impl Drop for Gate {
    fn drop(&mut self) {
        debug_assert!(self.node.parents().is_empty(), "A gate got dropped while still in use");
        self.erase_all_args();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdag::Pdag;

    use test_log::test;

    fn two_vars(graph: &mut Pdag) -> (VariableRef, VariableRef) {
        (graph.new_variable(), graph.new_variable())
    }

    #[test]
    fn test_add_arg_plain() {
        let mut graph = Pdag::new();
        let (x, y) = two_vars(&mut graph);
        let gate = graph.new_gate(Operator::And);

        gate.borrow_mut().add_variable_arg(&x, false);
        gate.borrow_mut().add_variable_arg(&y, true);

        let g = gate.borrow();
        assert_eq!(g.args().len(), 2);
        assert!(g.args().contains(&Ref::positive(2)));
        assert!(g.args().contains(&Ref::negative(3)));
        assert_eq!(g.variable_args().len(), 2);
        assert!(x.borrow().node().parents().contains_key(g.index()));
        assert!(y.borrow().node().parents().contains_key(g.index()));
    }

    #[test]
    fn test_duplicate_and_or_idempotent() {
        for operator in [Operator::And, Operator::Or, Operator::Nand, Operator::Nor] {
            let mut graph = Pdag::new();
            let (x, y) = two_vars(&mut graph);
            let gate = graph.new_gate(operator);
            gate.borrow_mut().add_variable_arg(&x, false);
            gate.borrow_mut().add_variable_arg(&y, false);
            gate.borrow_mut().add_variable_arg(&x, false);

            let g = gate.borrow();
            assert_eq!(g.state(), State::Normal);
            assert_eq!(g.args().len(), 2);
            assert_eq!(x.borrow().node().parents().len(), 1);
        }
    }

    #[test]
    fn test_duplicate_xor_is_null_state() {
        let mut graph = Pdag::new();
        let x = graph.new_variable();
        let gate = graph.new_gate(Operator::Xor);
        gate.borrow_mut().add_variable_arg(&x, false);
        gate.borrow_mut().add_variable_arg(&x, false);

        let g = gate.borrow();
        assert_eq!(g.state(), State::Null);
        assert!(g.args().is_empty());
        assert!(x.borrow().node().parents().is_empty());
    }

    #[test]
    fn test_complement_table() {
        let cases = [
            (Operator::And, State::Null),
            (Operator::Or, State::Unity),
            (Operator::Nand, State::Unity),
            (Operator::Nor, State::Null),
            (Operator::Xor, State::Unity),
        ];
        for (operator, expected) in cases {
            let mut graph = Pdag::new();
            let x = graph.new_variable();
            let gate = graph.new_gate(operator);
            gate.borrow_mut().add_variable_arg(&x, false);
            gate.borrow_mut().add_variable_arg(&x, true);

            let g = gate.borrow();
            assert_eq!(g.state(), expected, "complement on {:?}", operator);
            assert!(g.args().is_empty());
            assert!(x.borrow().node().parents().is_empty());
        }
    }

    #[test]
    fn test_complement_registers_const_gate() {
        let mut graph = Pdag::new();
        let x = graph.new_variable();
        let gate = graph.new_gate(Operator::And);
        gate.borrow_mut().add_variable_arg(&x, false);
        gate.borrow_mut().add_variable_arg(&x, true);

        let registered = graph.const_gates();
        assert_eq!(registered.len(), 1);
        assert_eq!(registered[0].borrow().index(), gate.borrow().index());
    }

    #[test]
    fn test_erase_arg_round_trip() {
        let mut graph = Pdag::new();
        let (x, y) = two_vars(&mut graph);
        let gate = graph.new_gate(Operator::Or);
        gate.borrow_mut().add_variable_arg(&x, false);

        let before: Vec<_> = gate.borrow().args().iter().copied().collect();
        gate.borrow_mut().add_variable_arg(&y, true);
        gate.borrow_mut().erase_arg(Ref::negative(3));

        let after: Vec<_> = gate.borrow().args().iter().copied().collect();
        assert_eq!(before, after);
        assert!(y.borrow().node().parents().is_empty());
        assert_eq!(x.borrow().node().parents().len(), 1);
    }

    #[test]
    fn test_erase_all_args() {
        let mut graph = Pdag::new();
        let (x, y) = two_vars(&mut graph);
        let gate = graph.new_gate(Operator::And);
        gate.borrow_mut().add_variable_arg(&x, false);
        gate.borrow_mut().add_variable_arg(&y, false);

        gate.borrow_mut().erase_all_args();
        assert!(gate.borrow().args().is_empty());
        assert!(gate.borrow().variable_args().is_empty());
        assert!(x.borrow().node().parents().is_empty());
        assert!(y.borrow().node().parents().is_empty());
    }

    #[test]
    fn test_invert_args_involution() {
        let mut graph = Pdag::new();
        let (x, y) = two_vars(&mut graph);
        let gate = graph.new_gate(Operator::And);
        gate.borrow_mut().add_variable_arg(&x, false);
        gate.borrow_mut().add_variable_arg(&y, true);

        let before: Vec<_> = gate.borrow().args().iter().copied().collect();
        gate.borrow_mut().invert_args();
        let flipped: Vec<_> = gate.borrow().args().iter().copied().collect();
        assert_eq!(flipped, vec![Ref::negative(2), Ref::positive(3)]);
        gate.borrow_mut().invert_args();
        let after: Vec<_> = gate.borrow().args().iter().copied().collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_arg_sign() {
        let mut graph = Pdag::new();
        let (x, y) = two_vars(&mut graph);
        let gate = graph.new_gate(Operator::And);
        gate.borrow_mut().add_variable_arg(&x, false);
        gate.borrow_mut().add_variable_arg(&y, true);

        assert_eq!(gate.borrow().arg_sign(2), 1);
        assert_eq!(gate.borrow().arg_sign(3), -1);
    }

    #[test]
    #[should_panic(expected = "No argument with the given index exists")]
    fn test_arg_sign_requires_existing_argument() {
        let mut graph = Pdag::new();
        let x = graph.new_variable();
        let gate = graph.new_gate(Operator::And);
        gate.borrow_mut().add_variable_arg(&x, false);

        gate.borrow().arg_sign(7);
    }

    #[test]
    fn test_invert_single_arg() {
        let mut graph = Pdag::new();
        let (x, y) = two_vars(&mut graph);
        let gate = graph.new_gate(Operator::And);
        gate.borrow_mut().add_variable_arg(&x, false);
        gate.borrow_mut().add_variable_arg(&y, false);

        gate.borrow_mut().invert_arg(Ref::positive(2));
        let g = gate.borrow();
        assert!(g.args().contains(&Ref::negative(2)));
        assert!(g.args().contains(&Ref::positive(3)));
        // The typed containers are keyed by positive index and stay put.
        assert!(g.variable_args().contains_key(2));
    }

    #[test]
    fn test_constant_arg_and_table() {
        // AND with TRUE drops the edge; AND with FALSE nulls the gate.
        let mut graph = Pdag::new();
        let (x, y) = two_vars(&mut graph);
        let constant = graph.constant().clone();
        let gate = graph.new_gate(Operator::And);
        gate.borrow_mut().add_variable_arg(&x, false);
        gate.borrow_mut().add_variable_arg(&y, false);
        gate.borrow_mut().add_constant_arg(&constant, false);

        gate.borrow_mut().process_constant_arg(Ref::TRUE, true);
        assert_eq!(gate.borrow().state(), State::Normal);
        assert_eq!(gate.borrow().args().len(), 2);
        assert!(constant.borrow().node().parents().is_empty());

        let other = graph.new_gate(Operator::And);
        other.borrow_mut().add_variable_arg(&x, false);
        other.borrow_mut().add_constant_arg(&constant, true); // FALSE edge
        other.borrow_mut().process_constant_arg(Ref::FALSE, true);
        assert_eq!(other.borrow().state(), State::Null);
    }

    #[test]
    fn test_constant_arg_or_table() {
        let mut graph = Pdag::new();
        let (x, y) = two_vars(&mut graph);
        let constant = graph.constant().clone();

        let unity = graph.new_gate(Operator::Or);
        unity.borrow_mut().add_variable_arg(&x, false);
        unity.borrow_mut().add_constant_arg(&constant, false);
        unity.borrow_mut().process_constant_arg(Ref::TRUE, true);
        assert_eq!(unity.borrow().state(), State::Unity);

        let dropping = graph.new_gate(Operator::Or);
        dropping.borrow_mut().add_variable_arg(&x, false);
        dropping.borrow_mut().add_variable_arg(&y, false);
        dropping.borrow_mut().add_constant_arg(&constant, true);
        dropping.borrow_mut().process_constant_arg(Ref::FALSE, true);
        assert_eq!(dropping.borrow().state(), State::Normal);
        assert_eq!(dropping.borrow().args().len(), 2);
    }

    #[test]
    fn test_constant_arg_single_survivor_becomes_null_gate() {
        let mut graph = Pdag::new();
        let x = graph.new_variable();
        let constant = graph.constant().clone();
        let gate = graph.new_gate(Operator::And);
        gate.borrow_mut().add_variable_arg(&x, false);
        gate.borrow_mut().add_constant_arg(&constant, false);

        gate.borrow_mut().process_constant_arg(Ref::TRUE, true);
        let g = gate.borrow();
        assert_eq!(g.operator(), Operator::Null);
        assert_eq!(g.args().len(), 1);
        drop(g);
        let nulls = graph.null_gates();
        assert_eq!(nulls.len(), 1);
    }

    #[test]
    fn test_constant_arg_nand_nor_duals() {
        let mut graph = Pdag::new();
        let (x, y) = two_vars(&mut graph);
        let constant = graph.constant().clone();

        // NAND sees FALSE: constantly TRUE.
        let nand = graph.new_gate(Operator::Nand);
        nand.borrow_mut().add_variable_arg(&x, false);
        nand.borrow_mut().add_constant_arg(&constant, true);
        nand.borrow_mut().process_constant_arg(Ref::FALSE, true);
        assert_eq!(nand.borrow().state(), State::Unity);

        // NOR sees TRUE: constantly FALSE.
        let nor = graph.new_gate(Operator::Nor);
        nor.borrow_mut().add_variable_arg(&x, false);
        nor.borrow_mut().add_constant_arg(&constant, false);
        nor.borrow_mut().process_constant_arg(Ref::TRUE, true);
        assert_eq!(nor.borrow().state(), State::Null);

        // NAND sees TRUE: drops the edge; one survivor decays to NOT.
        let decays = graph.new_gate(Operator::Nand);
        decays.borrow_mut().add_variable_arg(&y, false);
        decays.borrow_mut().add_constant_arg(&constant, false);
        decays.borrow_mut().process_constant_arg(Ref::TRUE, true);
        assert_eq!(decays.borrow().operator(), Operator::Not);
        assert_eq!(decays.borrow().args().len(), 1);
    }

    #[test]
    fn test_constant_arg_xor_flips_survivor() {
        let mut graph = Pdag::new();
        let (x, y) = two_vars(&mut graph);
        let constant = graph.constant().clone();

        // x ^ 1 = ~x
        let gate = graph.new_gate(Operator::Xor);
        gate.borrow_mut().add_variable_arg(&x, false);
        gate.borrow_mut().add_constant_arg(&constant, false);
        gate.borrow_mut().process_constant_arg(Ref::TRUE, true);
        assert_eq!(gate.borrow().operator(), Operator::Null);
        assert!(gate.borrow().args().contains(&Ref::negative(2)));

        // y ^ 0 = y
        let other = graph.new_gate(Operator::Xor);
        other.borrow_mut().add_variable_arg(&y, false);
        other.borrow_mut().add_constant_arg(&constant, true);
        other.borrow_mut().process_constant_arg(Ref::FALSE, true);
        assert_eq!(other.borrow().operator(), Operator::Null);
        assert!(other.borrow().args().contains(&Ref::positive(3)));
    }

    #[test]
    fn test_constant_arg_not_null() {
        let graph = Pdag::new();
        let constant = graph.constant().clone();

        let not_gate = graph.new_gate(Operator::Not);
        not_gate.borrow_mut().add_constant_arg(&constant, false);
        not_gate.borrow_mut().process_constant_arg(Ref::TRUE, true);
        assert_eq!(not_gate.borrow().state(), State::Null);

        let not_false = graph.new_gate(Operator::Not);
        not_false.borrow_mut().add_constant_arg(&constant, true);
        not_false.borrow_mut().process_constant_arg(Ref::FALSE, true);
        assert_eq!(not_false.borrow().state(), State::Unity);

        let null_gate = graph.new_gate(Operator::Null);
        null_gate.borrow_mut().add_constant_arg(&constant, false);
        null_gate.borrow_mut().process_constant_arg(Ref::TRUE, true);
        assert_eq!(null_gate.borrow().state(), State::Unity);
    }

    #[test]
    fn test_vote_true_arg_decrements() {
        let mut graph = Pdag::new();
        let vars: Vec<_> = (0..4).map(|_| graph.new_variable()).collect();
        let constant = graph.constant().clone();
        let gate = graph.new_gate(Operator::Vote);
        gate.borrow_mut().set_vote_number(3);
        for v in &vars {
            gate.borrow_mut().add_variable_arg(v, false);
        }
        gate.borrow_mut().add_constant_arg(&constant, false);

        gate.borrow_mut().process_constant_arg(Ref::TRUE, true);
        let g = gate.borrow();
        // @(3, [TRUE, v...]) = @(2, [v...])
        assert_eq!(g.operator(), Operator::Vote);
        assert_eq!(g.vote_number(), 2);
        assert_eq!(g.args().len(), 4);
    }

    #[test]
    fn test_vote_false_arg_collapses_to_and() {
        let mut graph = Pdag::new();
        let vars: Vec<_> = (0..2).map(|_| graph.new_variable()).collect();
        let constant = graph.constant().clone();
        let gate = graph.new_gate(Operator::Vote);
        gate.borrow_mut().set_vote_number(2);
        for v in &vars {
            gate.borrow_mut().add_variable_arg(v, false);
        }
        gate.borrow_mut().add_constant_arg(&constant, true);

        gate.borrow_mut().process_constant_arg(Ref::FALSE, true);
        let g = gate.borrow();
        // @(2, [FALSE, v1, v2]) = v1 & v2
        assert_eq!(g.operator(), Operator::And);
        assert_eq!(g.args().len(), 2);
    }

    #[test]
    fn test_vote_duplicate_two_args() {
        // @(2, [x, x]) = x: the gate decays to pass-through.
        let mut graph = Pdag::new();
        let x = graph.new_variable();
        let gate = graph.new_gate(Operator::Vote);
        gate.borrow_mut().set_vote_number(2);
        gate.borrow_mut().add_variable_arg(&x, false);
        gate.borrow_mut().add_variable_arg(&x, false);

        let g = gate.borrow();
        assert_eq!(g.operator(), Operator::Null);
        assert_eq!(g.args().len(), 1);
        assert!(g.args().contains(&Ref::positive(2)));
    }

    #[test]
    fn test_vote_duplicate_threshold_two() {
        // @(2, [x, x, y, z, w]) = x | @(2, [y, z, w])
        let mut graph = Pdag::new();
        let vars: Vec<_> = (0..4).map(|_| graph.new_variable()).collect();
        let gate = graph.new_gate(Operator::Vote);
        gate.borrow_mut().set_vote_number(2);
        for v in &vars {
            gate.borrow_mut().add_variable_arg(v, false);
        }
        gate.borrow_mut().add_variable_arg(&vars[0], false);

        let g = gate.borrow();
        assert_eq!(g.operator(), Operator::Or);
        assert_eq!(g.args().len(), 2);
        assert!(g.args().contains(&Ref::positive(2)));
        assert_eq!(g.gate_args().len(), 1);
        let sub = g.gate_args().values().next().unwrap().borrow();
        assert_eq!(sub.operator(), Operator::Vote);
        assert_eq!(sub.vote_number(), 2);
        assert_eq!(sub.args().len(), 3);
    }

    #[test]
    fn test_vote_duplicate_small_remainder_collapses() {
        // @(2, [x, x, y, z]) = x | (y & z): the remainder vote turns AND.
        let mut graph = Pdag::new();
        let x = graph.new_variable();
        let y = graph.new_variable();
        let z = graph.new_variable();
        let gate = graph.new_gate(Operator::Vote);
        gate.borrow_mut().set_vote_number(2);
        gate.borrow_mut().add_variable_arg(&x, false);
        gate.borrow_mut().add_variable_arg(&y, false);
        gate.borrow_mut().add_variable_arg(&z, false);
        gate.borrow_mut().add_variable_arg(&x, false);

        let g = gate.borrow();
        assert_eq!(g.operator(), Operator::Or);
        assert_eq!(g.args().len(), 2);
        assert!(g.args().contains(&Ref::positive(2)));
        let sub = g.gate_args().values().next().unwrap().borrow();
        assert_eq!(sub.operator(), Operator::And);
        assert_eq!(sub.args().len(), 2);
    }

    #[test]
    fn test_vote_duplicate_full_decomposition() {
        // @(3, [x, x, y, z, w]) = x & (y | z | w) | (y & z & w)
        let mut graph = Pdag::new();
        let vars: Vec<_> = (0..4).map(|_| graph.new_variable()).collect();
        let gate = graph.new_gate(Operator::Vote);
        gate.borrow_mut().set_vote_number(3);
        for v in &vars {
            gate.borrow_mut().add_variable_arg(v, false);
        }
        gate.borrow_mut().add_variable_arg(&vars[0], false);

        let g = gate.borrow();
        assert_eq!(g.operator(), Operator::Or);
        assert_eq!(g.args().len(), 2);
        assert_eq!(g.gate_args().len(), 2);
        for sub in g.gate_args().values() {
            assert_eq!(sub.borrow().operator(), Operator::And);
        }
    }

    #[test]
    fn test_vote_duplicate_deep_threshold_turns_pass_through() {
        // @(3, [x, x, y, z]) = x & (y | z): the @(3, [y, z]) branch is
        // unsatisfiable, so the outer OR decays to a pass-through.
        let mut graph = Pdag::new();
        let x = graph.new_variable();
        let y = graph.new_variable();
        let z = graph.new_variable();
        let gate = graph.new_gate(Operator::Vote);
        gate.borrow_mut().set_vote_number(3);
        gate.borrow_mut().add_variable_arg(&x, false);
        gate.borrow_mut().add_variable_arg(&y, false);
        gate.borrow_mut().add_variable_arg(&z, false);
        gate.borrow_mut().add_variable_arg(&x, false);

        let g = gate.borrow();
        assert_eq!(g.operator(), Operator::Null);
        assert_eq!(g.args().len(), 1);
        let sub = g.gate_args().values().next().unwrap().borrow();
        assert_eq!(sub.operator(), Operator::And);
        assert_eq!(sub.args().len(), 2);
        assert!(sub.args().contains(&Ref::positive(2)));
    }

    #[test]
    fn test_vote_complement_decrements() {
        // @(2, [x, ~x, y, z]) = @(1, [y, z]) = y | z
        let mut graph = Pdag::new();
        let x = graph.new_variable();
        let y = graph.new_variable();
        let z = graph.new_variable();
        let gate = graph.new_gate(Operator::Vote);
        gate.borrow_mut().set_vote_number(2);
        gate.borrow_mut().add_variable_arg(&x, false);
        gate.borrow_mut().add_variable_arg(&y, false);
        gate.borrow_mut().add_variable_arg(&z, false);
        gate.borrow_mut().add_variable_arg(&x, true);

        let g = gate.borrow();
        assert_eq!(g.operator(), Operator::Or);
        assert_eq!(g.args().len(), 2);
        assert!(!g.args().contains(&Ref::positive(2)));
        assert!(x.borrow().node().parents().is_empty());
    }

    #[test]
    fn test_vote_complement_to_pass_through() {
        // @(2, [x, ~x, y]) = @(1, [y]) = y
        let mut graph = Pdag::new();
        let x = graph.new_variable();
        let y = graph.new_variable();
        let gate = graph.new_gate(Operator::Vote);
        gate.borrow_mut().set_vote_number(2);
        gate.borrow_mut().add_variable_arg(&x, false);
        gate.borrow_mut().add_variable_arg(&y, false);
        gate.borrow_mut().add_variable_arg(&x, true);

        let g = gate.borrow();
        assert_eq!(g.operator(), Operator::Null);
        assert_eq!(g.args().len(), 1);
        assert!(g.args().contains(&Ref::positive(3)));
    }

    #[test]
    fn test_coalesce() {
        let mut graph = Pdag::new();
        let a = graph.new_variable();
        let b = graph.new_variable();
        let c = graph.new_variable();
        let inner = graph.new_gate(Operator::Or);
        inner.borrow_mut().add_variable_arg(&a, false);
        inner.borrow_mut().add_variable_arg(&b, false);
        let outer = graph.new_gate(Operator::Or);
        outer.borrow_mut().add_gate_arg(&inner, false);
        outer.borrow_mut().add_variable_arg(&c, false);

        let inner_ref = Ref::positive(inner.borrow().index());
        outer.borrow_mut().coalesce_gate(inner_ref);

        let g = outer.borrow();
        assert_eq!(g.args().len(), 3);
        assert!(g.gate_args().is_empty());
        assert!(a.borrow().node().parents().contains_key(g.index()));
        assert!(inner.borrow().node().parents().is_empty());
    }

    #[test]
    fn test_join_null_gate() {
        let mut graph = Pdag::new();
        let x = graph.new_variable();
        let y = graph.new_variable();
        let pass = graph.new_gate(Operator::Null);
        pass.borrow_mut().add_variable_arg(&x, false);
        let outer = graph.new_gate(Operator::And);
        outer.borrow_mut().add_gate_arg(&pass, false);
        outer.borrow_mut().add_variable_arg(&y, false);

        let pass_index = pass.borrow().index();
        outer.borrow_mut().join_null_gate(Ref::positive(pass_index));

        let g = outer.borrow();
        assert_eq!(g.args().len(), 2);
        assert!(g.args().contains(&Ref::positive(2)));
        assert!(g.args().contains(&Ref::positive(3)));
        assert!(g.gate_args().is_empty());
        assert!(x.borrow().node().parents().contains_key(g.index()));
    }

    #[test]
    fn test_join_null_gate_signs_multiply() {
        // ~NULL(~x) joins as +x.
        let mut graph = Pdag::new();
        let x = graph.new_variable();
        let y = graph.new_variable();
        let pass = graph.new_gate(Operator::Null);
        pass.borrow_mut().add_variable_arg(&x, true);
        let outer = graph.new_gate(Operator::And);
        outer.borrow_mut().add_gate_arg(&pass, true);
        outer.borrow_mut().add_variable_arg(&y, false);

        let pass_index = pass.borrow().index();
        outer.borrow_mut().join_null_gate(Ref::negative(pass_index));

        let g = outer.borrow();
        assert!(g.args().contains(&Ref::positive(2)));
    }

    #[test]
    fn test_clone_gate() {
        let mut graph = Pdag::new();
        let (x, y) = two_vars(&mut graph);
        let gate = graph.new_gate(Operator::Vote);
        gate.borrow_mut().set_vote_number(2);
        gate.borrow_mut().add_variable_arg(&x, false);
        gate.borrow_mut().add_variable_arg(&y, true);
        gate.borrow_mut().set_mark(true);

        let clone = gate.borrow().clone_gate();
        let c = clone.borrow();
        assert_ne!(c.index(), gate.borrow().index());
        assert_eq!(c.operator(), Operator::Vote);
        assert_eq!(c.vote_number(), 2);
        assert_eq!(c.args(), gate.borrow().args());
        assert!(!c.mark(), "Marks do not carry over");
        assert!(c.node().parents().is_empty(), "Parents do not carry over");
        // Children gain the clone as a parent.
        assert!(x.borrow().node().parents().contains_key(c.index()));
        assert!(x.borrow().node().parents().contains_key(gate.borrow().index()));
    }

    #[test]
    fn test_clone_mutation_is_isolated() {
        let mut graph = Pdag::new();
        let (x, y) = two_vars(&mut graph);
        let gate = graph.new_gate(Operator::And);
        gate.borrow_mut().add_variable_arg(&x, false);
        gate.borrow_mut().add_variable_arg(&y, false);

        let clone = gate.borrow().clone_gate();
        clone.borrow_mut().erase_arg(Ref::positive(2));

        assert_eq!(gate.borrow().args().len(), 2);
        assert_eq!(clone.borrow().args().len(), 1);
    }

    #[test]
    fn test_transfer_and_share_arg() {
        let mut graph = Pdag::new();
        let (x, y) = two_vars(&mut graph);
        let source = graph.new_gate(Operator::And);
        source.borrow_mut().add_variable_arg(&x, false);
        source.borrow_mut().add_variable_arg(&y, false);
        let recipient = graph.new_gate(Operator::Or);

        source.borrow_mut().transfer_arg(Ref::positive(2), &recipient);
        assert!(!source.borrow().args().contains(&Ref::positive(2)));
        assert!(recipient.borrow().args().contains(&Ref::positive(2)));

        source.borrow().share_arg(Ref::positive(3), &recipient);
        assert!(source.borrow().args().contains(&Ref::positive(3)));
        assert!(recipient.borrow().args().contains(&Ref::positive(3)));
        assert_eq!(y.borrow().node().parents().len(), 2);
    }

    #[test]
    fn test_make_constant() {
        let mut graph = Pdag::new();
        let x = graph.new_variable();
        let gate = graph.new_gate(Operator::And);
        gate.borrow_mut().add_variable_arg(&x, false);

        gate.borrow_mut().make_constant(true);
        assert_eq!(gate.borrow().state(), State::Unity);
        assert!(gate.borrow().args().is_empty());
        assert!(x.borrow().node().parents().is_empty());
        assert_eq!(graph.const_gates().len(), 1);
    }

    #[test]
    fn test_invert_arg_then_readd_folds_complement() {
        // After an inversion, re-adding the original polarity meets the
        // flipped edge in `add_arg` and resolves by the complement rule:
        // @(2, [~x, y, z]) plus x loses the pair and decays to an OR.
        let mut graph = Pdag::new();
        let x = graph.new_variable();
        let y = graph.new_variable();
        let z = graph.new_variable();
        let gate = graph.new_gate(Operator::Vote);
        gate.borrow_mut().set_vote_number(2);
        gate.borrow_mut().add_variable_arg(&x, false);
        gate.borrow_mut().add_variable_arg(&y, false);
        gate.borrow_mut().add_variable_arg(&z, false);

        gate.borrow_mut().invert_arg(Ref::positive(2));
        assert!(gate.borrow().args().contains(&Ref::negative(2)));
        // Re-adding the positive literal is a complement addition.
        gate.borrow_mut().add_variable_arg(&x, false);
        let g = gate.borrow();
        assert_eq!(g.operator(), Operator::Or);
        assert_eq!(g.args().len(), 2);
    }
}
