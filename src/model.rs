//! The symbolic fault-tree model that PDAG construction consumes.
//!
//! The PDAG core treats this model as an opaque source: a formula tree over
//! named gates, basic events with probabilities, and house events with fixed
//! Boolean states. Shared sub-trees are expressed by referencing the same
//! `Rc` node from several formulas; construction memoises on pointer
//! identity.

use std::cell::RefCell;
use std::rc::Rc;

use crate::gate::Operator;

/// A leaf random Boolean with an assigned failure probability.
///
/// A basic event may belong to a common-cause failure group, in which case
/// it carries the CCF gate that replaces it when CCF incorporation is
/// requested at construction.
#[derive(Debug)]
pub struct BasicEvent {
    name: String,
    probability: f64,
    ccf_gate: RefCell<Option<Rc<Gate>>>,
}

impl BasicEvent {
    pub fn new(name: impl Into<String>, probability: f64) -> Rc<Self> {
        assert!((0.0..=1.0).contains(&probability), "Probabilities lie in [0, 1]");
        Rc::new(Self {
            name: name.into(),
            probability,
            ccf_gate: RefCell::new(None),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The failure probability of this event.
    pub fn p(&self) -> f64 {
        self.probability
    }

    /// Wires the CCF gate that substitutes this event under CCF analysis.
    pub fn set_ccf_gate(&self, gate: Rc<Gate>) {
        *self.ccf_gate.borrow_mut() = Some(gate);
    }

    pub fn ccf_gate(&self) -> Option<Rc<Gate>> {
        self.ccf_gate.borrow().clone()
    }

    /// True if this event belongs to a CCF group.
    pub fn has_ccf(&self) -> bool {
        self.ccf_gate.borrow().is_some()
    }
}

/// A leaf Boolean constant (deterministic TRUE or FALSE).
#[derive(Debug)]
pub struct HouseEvent {
    name: String,
    state: bool,
}

impl HouseEvent {
    pub fn new(name: impl Into<String>, state: bool) -> Rc<Self> {
        Rc::new(Self { name: name.into(), state })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The fixed Boolean state of this event.
    pub fn state(&self) -> bool {
        self.state
    }
}

/// A named gate of the symbolic fault tree.
#[derive(Debug)]
pub struct Gate {
    name: String,
    formula: Formula,
}

impl Gate {
    pub fn new(name: impl Into<String>, formula: Formula) -> Rc<Self> {
        Rc::new(Self { name: name.into(), formula })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn formula(&self) -> &Formula {
        &self.formula
    }
}

/// An argument of a formula with a discriminated kind.
#[derive(Debug, Clone)]
pub enum Event {
    Gate(Rc<Gate>),
    Basic(Rc<BasicEvent>),
    House(Rc<HouseEvent>),
}

impl Event {
    /// The memoisation key of this event: its pointer identity.
    pub(crate) fn key(&self) -> usize {
        match self {
            Event::Gate(gate) => Rc::as_ptr(gate) as usize,
            Event::Basic(event) => Rc::as_ptr(event) as usize,
            Event::House(event) => Rc::as_ptr(event) as usize,
        }
    }
}

impl From<Rc<Gate>> for Event {
    fn from(gate: Rc<Gate>) -> Self {
        Event::Gate(gate)
    }
}

impl From<Rc<BasicEvent>> for Event {
    fn from(event: Rc<BasicEvent>) -> Self {
        Event::Basic(event)
    }
}

impl From<Rc<HouseEvent>> for Event {
    fn from(event: Rc<HouseEvent>) -> Self {
        Event::House(event)
    }
}

/// A Boolean formula: a connective over event arguments.
///
/// The connective set matches the PDAG operators one to one; `vote_number`
/// is meaningful only for the `Vote` connective.
#[derive(Debug)]
pub struct Formula {
    connective: Operator,
    vote_number: Option<i32>,
    args: Vec<Event>,
}

impl Formula {
    pub fn new(connective: Operator, args: Vec<Event>) -> Self {
        assert_ne!(connective, Operator::Vote, "K/N formulas take a vote number");
        Self { connective, vote_number: None, args }
    }

    /// Builds a K/N (at-least) formula.
    pub fn vote(vote_number: i32, args: Vec<Event>) -> Self {
        Self {
            connective: Operator::Vote,
            vote_number: Some(vote_number),
            args,
        }
    }

    pub fn connective(&self) -> Operator {
        self.connective
    }

    pub fn vote_number(&self) -> Option<i32> {
        self.vote_number
    }

    pub fn args(&self) -> &[Event] {
        &self.args
    }
}
