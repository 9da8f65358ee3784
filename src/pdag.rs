use std::cell::{Cell, RefCell};
use std::rc::Rc;

use hashbrown::{HashMap, HashSet};
use log::debug;

use crate::error::{Error, Result};
use crate::gate::{Gate, Operator};
use crate::model;
use crate::model::Event;
use crate::node::{Constant, ConstantRef, GateRef, GateWeak, Variable, VariableRef};

/// Construction options for a PDAG.
#[derive(Debug, Clone, Default)]
pub struct PdagConfig {
    ccf: bool,
}

impl PdagConfig {
    /// Requests incorporation of common-cause failure groups: basic events
    /// that belong to a CCF group are replaced by their CCF gates.
    pub fn with_ccf(mut self, ccf: bool) -> Self {
        self.ccf = ccf;
        self
    }

    pub fn ccf(&self) -> bool {
        self.ccf
    }
}

/// Per-graph shared state: the index counter and the rewrite worklists.
///
/// Every gate holds a handle to its graph context so rewrites can issue
/// indices for new gates and register degenerated gates. The worklists hold
/// weak references only; they never extend gate lifetimes.
#[derive(Debug)]
pub(crate) struct GraphContext {
    node_index: Cell<i32>,
    register_null_gates: Cell<bool>,
    null_gates: RefCell<Vec<GateWeak>>,
    const_gates: RefCell<Vec<GateWeak>>,
}

pub(crate) type ContextRef = Rc<GraphContext>;

impl GraphContext {
    fn new() -> ContextRef {
        Rc::new(Self {
            node_index: Cell::new(0),
            register_null_gates: Cell::new(true),
            null_gates: RefCell::new(Vec::new()),
            const_gates: RefCell::new(Vec::new()),
        })
    }

    /// Issues the next unique node index of this graph.
    pub(crate) fn next_index(&self) -> i32 {
        let index = self.node_index.get() + 1;
        self.node_index.set(index);
        index
    }

    /// Registers a pass-through gate for the NULL-gate worklist, unless
    /// auto-registration is off (construction phase).
    pub(crate) fn register_null_gate(&self, gate: GateWeak) {
        if !self.register_null_gates.get() {
            return;
        }
        self.null_gates.borrow_mut().push(gate);
    }

    /// Registers a gate that collapsed into a Boolean constant.
    pub(crate) fn register_const_gate(&self, gate: GateWeak) {
        self.const_gates.borrow_mut().push(gate);
    }
}

/// Nodes created from fault-tree events, memoised on event identity so a
/// source gate or basic event referenced twice maps to one graph node.
#[derive(Default)]
struct ProcessedNodes {
    gates: HashMap<usize, GateRef>,
    variables: HashMap<usize, VariableRef>,
    gathered: HashSet<usize>,
    in_progress: HashSet<usize>,
}

/// A propositional directed acyclic graph of a fault tree.
///
/// The graph works with node indices instead of event names: the constant
/// TRUE takes index 1, the `V` variables take the dense range `[2, 2 + V)`,
/// and gates take indices from `2 + V` in creation order. The graph owns the
/// root gate strongly; gates own their arguments; all upward references are
/// weak. Dropping the last strong reference into a sub-graph releases it.
///
/// A PDAG is built either root-less for general Boolean formulas (tests,
/// experiments) or from the top gate of a fault-tree model. It is not safe
/// for concurrent mutation; the handle types are single-threaded by
/// construction.
pub struct Pdag {
    context: ContextRef,
    constant: ConstantRef,
    root: Option<GateRef>,
    complement: bool,
    coherent: bool,
    normal: bool,
    num_variables: usize,
    basic_events: Vec<Rc<model::BasicEvent>>,
}

impl Pdag {
    /// The index of the first variable; variables precede all gates.
    pub const VARIABLE_START_INDEX: i32 = 2;

    /// Constructs a graph with no root gate, ready for general purpose
    /// Boolean formulas.
    pub fn new() -> Self {
        let context = GraphContext::new();
        let constant = Rc::new(RefCell::new(Constant::new(context.next_index())));
        Self {
            context,
            constant,
            root: None,
            complement: false,
            coherent: true,
            normal: true,
            num_variables: 0,
            basic_events: Vec::new(),
        }
    }

    /// Constructs a PDAG from the top gate of a fault tree.
    ///
    /// Construction gathers all basic events first so variables take the
    /// dense index range, then materialises gates with memoisation over
    /// shared sub-trees. House events fold in as constant edges. With CCF
    /// requested, basic events in CCF groups contribute their CCF gates
    /// instead, and the CCF member events become fresh variables.
    ///
    /// NULL-gate auto-registration is off during construction and on
    /// afterwards, so the worklists reflect preprocessing edits only.
    ///
    /// A malformed model (wrong arity, bad vote number, repeated formula
    /// argument, cyclic gate definition) fails with a validation error, and
    /// the partially-built graph is dropped.
    pub fn from_fault_tree(root: &Rc<model::Gate>, config: PdagConfig) -> Result<Self> {
        debug!("Constructing a PDAG from fault tree root {:?}", root.name());
        let mut graph = Pdag::new();
        graph.context.register_null_gates.set(false);
        let mut nodes = ProcessedNodes::default();
        graph.gather_variables(root.formula(), config.ccf, &mut nodes)?;
        debug!("Gathered {} variables", graph.num_variables);

        let key = Rc::as_ptr(root) as usize;
        nodes.in_progress.insert(key);
        let root_gate = graph.construct_gate(root.name(), root.formula(), config.ccf, &mut nodes)?;
        graph.root = Some(root_gate);
        graph.context.register_null_gates.set(true);
        debug!(
            "Constructed a PDAG with {} nodes (coherent: {}, normal: {})",
            graph.context.node_index.get(),
            graph.coherent,
            graph.normal
        );
        Ok(graph)
    }

    /// The current root gate, or none for a root-less graph.
    pub fn root(&self) -> Option<&GateRef> {
        self.root.as_ref()
    }

    /// Replaces the root gate. The gate must belong to this graph.
    pub fn set_root(&mut self, gate: &GateRef) {
        assert!(
            Rc::ptr_eq(&self.context, gate.borrow().context()),
            "The gate is from a different graph"
        );
        self.root = Some(gate.clone());
    }

    /// True if the graph represents the complement of the root.
    pub fn complement(&self) -> bool {
        self.complement
    }

    pub fn set_complement(&mut self, flag: bool) {
        self.complement = flag;
    }

    /// True if the fault tree is coherent (no complements anywhere).
    pub fn coherent(&self) -> bool {
        self.coherent
    }

    pub fn set_coherent(&mut self, flag: bool) {
        self.coherent = flag;
    }

    /// True if all gates are normalized AND/OR.
    pub fn normal(&self) -> bool {
        self.normal
    }

    pub fn set_normal(&mut self, flag: bool) {
        self.normal = flag;
    }

    /// The single Boolean constant TRUE of this graph.
    pub fn constant(&self) -> &ConstantRef {
        &self.constant
    }

    pub fn num_variables(&self) -> usize {
        self.num_variables
    }

    /// The source basic events, positioned by variable index.
    pub fn basic_events(&self) -> &[Rc<model::BasicEvent>] {
        &self.basic_events
    }

    /// The source basic event of a variable index.
    ///
    /// Valid only for model-built graphs and indices in `[2, 2 + V)`.
    pub fn basic_event(&self, index: i32) -> &Rc<model::BasicEvent> {
        &self.basic_events[(index - Self::VARIABLE_START_INDEX) as usize]
    }

    /// Creates a new variable of this graph.
    ///
    /// All variables must be created before any gate so the variable index
    /// range stays dense.
    pub fn new_variable(&mut self) -> VariableRef {
        let index = self.context.next_index();
        assert_eq!(
            index as usize,
            Self::VARIABLE_START_INDEX as usize + self.num_variables,
            "Variables precede all gates"
        );
        self.num_variables += 1;
        Rc::new(RefCell::new(Variable::new(index)))
    }

    fn new_variable_for(&mut self, event: Rc<model::BasicEvent>) -> VariableRef {
        let variable = self.new_variable();
        self.basic_events.push(event);
        variable
    }

    /// Creates a new gate of this graph.
    pub fn new_gate(&self, operator: Operator) -> GateRef {
        Gate::new(operator, &self.context)
    }

    /// Pass-through gates registered by rewrites, pruned of dead entries.
    pub fn null_gates(&self) -> Vec<GateRef> {
        self.context.null_gates.borrow().iter().filter_map(GateWeak::upgrade).collect()
    }

    /// Gates that collapsed into constants, pruned of dead entries.
    pub fn const_gates(&self) -> Vec<GateRef> {
        self.context.const_gates.borrow().iter().filter_map(GateWeak::upgrade).collect()
    }

    /// Empties the NULL-gate worklist after a splicing pass.
    pub fn clear_null_gates(&self) {
        self.context.null_gates.borrow_mut().clear();
    }

    /// Empties the constant-gate worklist after a propagation pass.
    pub fn clear_const_gates(&self) {
        self.context.const_gates.borrow_mut().clear();
    }

    fn gather_variables(
        &mut self,
        formula: &model::Formula,
        ccf: bool,
        nodes: &mut ProcessedNodes,
    ) -> Result<()> {
        for event in formula.args() {
            match event {
                Event::Basic(basic) => self.gather_basic_event(basic, ccf, nodes)?,
                Event::Gate(gate) => {
                    let key = Rc::as_ptr(gate) as usize;
                    if nodes.gathered.insert(key) {
                        self.gather_variables(gate.formula(), ccf, nodes)?;
                    }
                }
                Event::House(_) => {}
            }
        }
        Ok(())
    }

    fn gather_basic_event(
        &mut self,
        basic: &Rc<model::BasicEvent>,
        ccf: bool,
        nodes: &mut ProcessedNodes,
    ) -> Result<()> {
        if ccf {
            if let Some(ccf_gate) = basic.ccf_gate() {
                let key = Rc::as_ptr(&ccf_gate) as usize;
                if nodes.gathered.insert(key) {
                    self.gather_variables(ccf_gate.formula(), true, nodes)?;
                }
                return Ok(());
            }
        }
        let key = Rc::as_ptr(basic) as usize;
        if !nodes.variables.contains_key(&key) {
            let variable = self.new_variable_for(basic.clone());
            nodes.variables.insert(key, variable);
        }
        Ok(())
    }

    /// Checks a formula against the model-level constraints of its
    /// connective before any graph node is created for it.
    fn validate_formula(name: &str, formula: &model::Formula) -> Result<()> {
        let args = formula.args().len();
        let arity_error = |expected: &str| {
            Err(Error::InvalidArity {
                gate: name.to_string(),
                connective: formula.connective(),
                expected: expected.to_string(),
                actual: args,
            })
        };
        match formula.connective() {
            Operator::Null | Operator::Not if args != 1 => return arity_error("exactly 1"),
            Operator::Xor if args != 2 => return arity_error("exactly 2"),
            Operator::And | Operator::Or | Operator::Nand | Operator::Nor if args < 2 => {
                return arity_error("at least 2")
            }
            Operator::Vote => {
                if args < 2 {
                    return arity_error("at least 2");
                }
                let vote_number = formula.vote_number().unwrap_or(0);
                if vote_number < 1 || vote_number as usize > args {
                    return Err(Error::InvalidVoteNumber {
                        gate: name.to_string(),
                        vote_number,
                        args,
                    });
                }
            }
            _ => {}
        }
        let mut seen = HashSet::with_capacity(args);
        for event in formula.args() {
            if !seen.insert(event.key()) {
                return Err(Error::DuplicateFormulaArg { gate: name.to_string() });
            }
        }
        Ok(())
    }

    fn construct_gate(
        &mut self,
        name: &str,
        formula: &model::Formula,
        ccf: bool,
        nodes: &mut ProcessedNodes,
    ) -> Result<GateRef> {
        Self::validate_formula(name, formula)?;

        // Degenerate vote thresholds fold into the simpler connective so the
        // K/N invariant holds from birth.
        let operator = match formula.connective() {
            Operator::Vote => {
                let vote_number = formula.vote_number().expect("Validated K/N formula");
                if vote_number == 1 {
                    Operator::Or
                } else if vote_number as usize == formula.args().len() {
                    Operator::And
                } else {
                    Operator::Vote
                }
            }
            operator => operator,
        };
        let gate = self.new_gate(operator);
        if operator == Operator::Vote {
            gate.borrow_mut().set_vote_number(formula.vote_number().expect("Validated K/N formula"));
        }
        self.normal &= matches!(operator, Operator::And | Operator::Or);
        self.coherent &= !matches!(
            operator,
            Operator::Not | Operator::Nand | Operator::Nor | Operator::Xor
        );

        for event in formula.args() {
            match event {
                Event::Gate(child) => {
                    let child_gate = self.child_gate(child, ccf, nodes)?;
                    gate.borrow_mut().add_gate_arg(&child_gate, false);
                }
                Event::Basic(basic) => {
                    if ccf {
                        if let Some(ccf_gate) = basic.ccf_gate() {
                            let child_gate = self.child_gate(&ccf_gate, true, nodes)?;
                            gate.borrow_mut().add_gate_arg(&child_gate, false);
                            continue;
                        }
                    }
                    let key = Rc::as_ptr(basic) as usize;
                    let variable = nodes.variables.get(&key).expect("Ungathered basic event").clone();
                    gate.borrow_mut().add_variable_arg(&variable, false);
                }
                Event::House(house) => {
                    gate.borrow_mut().add_constant_arg(&self.constant, !house.state());
                }
            }
        }
        Ok(gate)
    }

    /// Materialises or reuses the graph gate of a source gate argument.
    fn child_gate(
        &mut self,
        child: &Rc<model::Gate>,
        ccf: bool,
        nodes: &mut ProcessedNodes,
    ) -> Result<GateRef> {
        let key = Rc::as_ptr(child) as usize;
        if let Some(existing) = nodes.gates.get(&key) {
            return Ok(existing.clone());
        }
        if !nodes.in_progress.insert(key) {
            return Err(Error::CyclicModel(child.name().to_string()));
        }
        let built = self.construct_gate(child.name(), child.formula(), ccf, nodes)?;
        nodes.in_progress.remove(&key);
        nodes.gates.insert(key, built.clone());
        Ok(built)
    }

    /// Sets the traversal marks of all gates to false, assuming the marks
    /// were assigned in a top-down traversal from the root.
    ///
    /// Every algorithm using gate marks must clean them before running;
    /// cleaning afterwards is optional but polite.
    pub fn clear_gate_marks(&self) {
        if let Some(root) = &self.root {
            Self::clear_gate_marks_in(root);
        }
    }

    /// Clears the marks of the sub-graph rooted at the given gate.
    pub fn clear_gate_marks_in(gate: &GateRef) {
        if !gate.borrow().mark() {
            return;
        }
        gate.borrow_mut().set_mark(false);
        let children: Vec<GateRef> = gate.borrow().gate_args().values().cloned().collect();
        for child in &children {
            Self::clear_gate_marks_in(child);
        }
    }

    /// Clears the visit times of every node in the graph.
    ///
    /// Gate marks are used for the linear-time traversal and left clean.
    pub fn clear_node_visits(&self) {
        debug!("Clearing node visit times...");
        self.clear_gate_marks();
        if let Some(root) = &self.root {
            Self::clear_node_visits_in(root);
        }
        self.clear_gate_marks();
        debug!("Node visit times are clear!");
    }

    /// Clears visit times of the sub-graph rooted at the given gate.
    ///
    /// Gate marks are set during the descent; the caller cleans them.
    pub fn clear_node_visits_in(gate: &GateRef) {
        if gate.borrow().mark() {
            return;
        }
        gate.borrow_mut().set_mark(true);
        {
            let mut g = gate.borrow_mut();
            if g.node().visited() {
                g.node_mut().clear_visits();
            }
        }
        let children: Vec<GateRef> = gate.borrow().gate_args().values().cloned().collect();
        for child in &children {
            Self::clear_node_visits_in(child);
        }
        let g = gate.borrow();
        for variable in g.variable_args().values() {
            let mut variable = variable.borrow_mut();
            if variable.node().visited() {
                variable.node_mut().clear_visits();
            }
        }
        for constant in g.constant_args().values() {
            let mut constant = constant.borrow_mut();
            if constant.node().visited() {
                constant.node_mut().clear_visits();
            }
        }
    }

    /// Resets the optimization values of every node to 0.
    ///
    /// Gate marks are used for the linear-time traversal and left clean.
    pub fn clear_opti_values(&self) {
        debug!("Clearing node optimization values...");
        self.clear_gate_marks();
        if let Some(root) = &self.root {
            Self::clear_opti_values_in(root);
        }
        self.clear_gate_marks();
        debug!("Node optimization values are clear!");
    }

    /// Resets optimization values of the sub-graph rooted at the given gate.
    pub fn clear_opti_values_in(gate: &GateRef) {
        if gate.borrow().mark() {
            return;
        }
        gate.borrow_mut().set_mark(true);
        gate.borrow_mut().node_mut().set_opti_value(0);
        let children: Vec<GateRef> = gate.borrow().gate_args().values().cloned().collect();
        for child in &children {
            Self::clear_opti_values_in(child);
        }
        let g = gate.borrow();
        for variable in g.variable_args().values() {
            variable.borrow_mut().node_mut().set_opti_value(0);
        }
        for constant in g.constant_args().values() {
            constant.borrow_mut().node_mut().set_opti_value(0);
        }
    }

    /// Resets the positive and negative occurrence counts of every node.
    ///
    /// Gate marks are used for the linear-time traversal and left clean.
    pub fn clear_node_counts(&self) {
        debug!("Clearing node counts...");
        self.clear_gate_marks();
        if let Some(root) = &self.root {
            Self::clear_node_counts_in(root);
        }
        self.clear_gate_marks();
        debug!("Node counts are clear!");
    }

    /// Resets occurrence counts of the sub-graph rooted at the given gate.
    pub fn clear_node_counts_in(gate: &GateRef) {
        if gate.borrow().mark() {
            return;
        }
        gate.borrow_mut().set_mark(true);
        gate.borrow_mut().node_mut().reset_count();
        let children: Vec<GateRef> = gate.borrow().gate_args().values().cloned().collect();
        for child in &children {
            Self::clear_node_counts_in(child);
        }
        let g = gate.borrow();
        for variable in g.variable_args().values() {
            variable.borrow_mut().node_mut().reset_count();
        }
        for constant in g.constant_args().values() {
            constant.borrow_mut().node_mut().reset_count();
        }
    }

    /// Resets the descendant indices of all gates.
    ///
    /// Gate marks are used for the linear-time traversal and left clean.
    pub fn clear_descendant_marks(&self) {
        debug!("Clearing gate descendant marks...");
        self.clear_gate_marks();
        if let Some(root) = &self.root {
            Self::clear_descendant_marks_in(root);
        }
        self.clear_gate_marks();
        debug!("Gate descendant marks are clear!");
    }

    /// Resets descendant indices of the sub-graph rooted at the given gate.
    pub fn clear_descendant_marks_in(gate: &GateRef) {
        if gate.borrow().mark() {
            return;
        }
        {
            let mut g = gate.borrow_mut();
            g.set_mark(true);
            g.set_descendant(0);
        }
        let children: Vec<GateRef> = gate.borrow().gate_args().values().cloned().collect();
        for child in &children {
            Self::clear_descendant_marks_in(child);
        }
    }

    /// Resets the ancestor indices of all gates.
    ///
    /// Gate marks are used for the linear-time traversal and left clean.
    pub fn clear_ancestor_marks(&self) {
        debug!("Clearing gate ancestor marks...");
        self.clear_gate_marks();
        if let Some(root) = &self.root {
            Self::clear_ancestor_marks_in(root);
        }
        self.clear_gate_marks();
        debug!("Gate ancestor marks are clear!");
    }

    /// Resets ancestor indices of the sub-graph rooted at the given gate.
    pub fn clear_ancestor_marks_in(gate: &GateRef) {
        if gate.borrow().mark() {
            return;
        }
        {
            let mut g = gate.borrow_mut();
            g.set_mark(true);
            g.set_ancestor(0);
        }
        let children: Vec<GateRef> = gate.borrow().gate_args().values().cloned().collect();
        for child in &children {
            Self::clear_ancestor_marks_in(child);
        }
    }

    /// Resets the ordering marks of every node to 0.
    ///
    /// Gate marks are used for the linear-time traversal and left clean.
    pub fn clear_node_orders(&self) {
        debug!("Clearing node order marks...");
        self.clear_gate_marks();
        if let Some(root) = &self.root {
            Self::clear_node_orders_in(root);
        }
        self.clear_gate_marks();
        debug!("Node order marks are clear!");
    }

    /// Resets ordering marks of the sub-graph rooted at the given gate.
    pub fn clear_node_orders_in(gate: &GateRef) {
        if gate.borrow().mark() {
            return;
        }
        gate.borrow_mut().set_mark(true);
        {
            let mut g = gate.borrow_mut();
            if g.node().order() != 0 {
                g.node_mut().set_order(0);
            }
        }
        let children: Vec<GateRef> = gate.borrow().gate_args().values().cloned().collect();
        for child in &children {
            Self::clear_node_orders_in(child);
        }
        let g = gate.borrow();
        for variable in g.variable_args().values() {
            variable.borrow_mut().node_mut().set_order(0);
        }
    }
}

impl Default for Pdag {
    fn default() -> Self {
        Self::new()
    }
}
