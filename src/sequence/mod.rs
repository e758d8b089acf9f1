//! Parameter sources for event schedules
//!
//! Each schedule parameter is bound to a constant, a stepped sequence or a
//! random choice. All of them advance once per event.

mod choice;
mod seq;
mod value;

pub use choice::ParameterChoice;
pub use seq::{Exhaustion, ParameterSequence};
pub use value::Value;

/// What a parameter name is bound to
#[derive(Debug, Clone)]
pub enum Param {
    /// The same value on every event
    Constant(Value),
    /// Stepped sequence
    Sequence(ParameterSequence),
    /// Random pick per event
    Choice(ParameterChoice),
}

impl Param {
    /// Value for the next event; `None` ends the schedule
    pub fn next(&mut self) -> Option<Value> {
        match self {
            Param::Constant(value) => Some(value.clone()),
            Param::Sequence(seq) => seq.next(),
            Param::Choice(choice) => choice.next(),
        }
    }

    pub fn peek(&self) -> Option<&Value> {
        match self {
            Param::Constant(value) => Some(value),
            Param::Sequence(seq) => seq.peek(),
            Param::Choice(choice) => choice.peek(),
        }
    }

    pub fn reset(&mut self) {
        match self {
            Param::Constant(_) => {}
            Param::Sequence(seq) => seq.reset(),
            Param::Choice(choice) => choice.reset(),
        }
    }

    /// Every value this parameter can produce
    pub fn candidates(&self) -> &[Value] {
        match self {
            Param::Constant(value) => std::slice::from_ref(value),
            Param::Sequence(seq) => seq.values(),
            Param::Choice(choice) => choice.values(),
        }
    }
}

impl From<Value> for Param {
    fn from(value: Value) -> Self {
        Param::Constant(value)
    }
}

impl From<f64> for Param {
    fn from(n: f64) -> Self {
        Param::Constant(Value::Number(n))
    }
}

impl From<Vec<f64>> for Param {
    fn from(list: Vec<f64>) -> Self {
        Param::Constant(Value::List(list))
    }
}

impl From<&str> for Param {
    fn from(s: &str) -> Self {
        Param::Constant(Value::from(s))
    }
}

impl From<ParameterSequence> for Param {
    fn from(seq: ParameterSequence) -> Self {
        Param::Sequence(seq)
    }
}

impl From<ParameterChoice> for Param {
    fn from(choice: ParameterChoice) -> Self {
        Param::Choice(choice)
    }
}
