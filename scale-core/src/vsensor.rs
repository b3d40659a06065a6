//! Virtual math sensor: a sensor whose "reading" is a sum of physical
//! loadcells' readings, expressed to the operator as a short formula like
//! `"1+2"` (sensor 1 plus sensor 2) and compiled once into a small byte-code
//! program so evaluation never re-parses the formula. For v1 the only
//! operator is binary `+`; a math sensor may only reference physical
//! loadcell channels, never another math sensor.

use crate::error::CommandError;
use crate::loadcell::status::Status;
use crate::sensor::{SensorId, MAX_LOADCELL};
use arrayvec::ArrayVec;

pub const MAX_TERMS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Term {
    pub sensor: SensorId,
}

/// Compiled formula: a flat list of sensor references. This is the "byte
/// code" -- evaluation is a single pass summing inputs, no re-parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    terms: ArrayVec<Term, MAX_TERMS>,
}

/// Compile a formula of the form `"S[+S...]"`, e.g. `"1+2"`. Sensor numbers
/// are decimal `u8` and must each name a physical loadcell channel
/// (`< MAX_LOADCELL`).
pub fn compile(formula: &str) -> Result<Program, CommandError> {
    let formula = formula.trim();
    if formula.is_empty() {
        return Err(CommandError::InvalidValueType);
    }

    let mut terms = ArrayVec::new();
    let mut digits = String::new();

    let push_term = |terms: &mut ArrayVec<Term, MAX_TERMS>, digits: &mut String| -> Result<(), CommandError> {
        if digits.is_empty() {
            return Err(CommandError::InvalidValueType);
        }
        let id: u8 = digits.parse().map_err(|_| CommandError::InvalidValueType)?;
        if id >= MAX_LOADCELL {
            return Err(CommandError::InvalidSensorNumber);
        }
        terms
            .try_push(Term { sensor: SensorId(id) })
            .map_err(|_| CommandError::InvalidValueType)?;
        digits.clear();
        Ok(())
    };

    for ch in formula.chars() {
        match ch {
            '+' => push_term(&mut terms, &mut digits)?,
            c if c.is_ascii_digit() => digits.push(c),
            _ => return Err(CommandError::InvalidValueType),
        }
    }
    push_term(&mut terms, &mut digits)?;

    Ok(Program { terms })
}

/// One physical input to a math sensor's formula: its current value already
/// converted into that physical sensor's own unit, the multiplicative factor
/// to bring it into the math sensor's unit, and the status bits to
/// propagate up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VSensorInput {
    pub value: f32,
    pub unit_factor: f32,
    pub status: Status,
}

/// Status bits that, if raised on any input, are propagated to the math
/// sensor's own reading rather than silently dropped.
const PROPAGATED: Status = Status::OVERLOAD
    .union(Status::UNDERLOAD)
    .union(Status::UNCALIBRATED)
    .union(Status::OUT_OF_RANGE);

/// Evaluate a compiled program, looking up each referenced sensor's current
/// input through `lookup`. If any referenced input is missing, the whole
/// evaluation is invalid (propagated, never silently zeroed). Returns the
/// summed value (each input scaled by its own `unit_factor` first) together
/// with the union of every input's propagated status bits.
pub fn evaluate(program: &Program, mut lookup: impl FnMut(SensorId) -> Option<VSensorInput>) -> Option<(f32, Status)> {
    let mut acc = 0.0f32;
    let mut status = Status::empty();
    for term in &program.terms {
        let input = lookup(term.sensor)?;
        acc += input.value * input.unit_factor;
        status |= input.status & PROPAGATED;
    }
    Some((acc, status))
}

impl Program {
    pub fn terms(&self) -> &[Term] {
        &self.terms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(value: f32) -> VSensorInput {
        VSensorInput {
            value,
            unit_factor: 1.0,
            status: Status::empty(),
        }
    }

    #[test]
    fn compiles_simple_sum() {
        let p = compile("1+2").unwrap();
        assert_eq!(p.terms().len(), 2);
        assert_eq!(p.terms()[0], Term { sensor: SensorId(1) });
        assert_eq!(p.terms()[1], Term { sensor: SensorId(2) });
    }

    #[test]
    fn rejects_malformed_formula() {
        assert!(compile("").is_err());
        assert!(compile("1+").is_err());
        assert!(compile("1+x").is_err());
    }

    #[test]
    fn rejects_subtraction() {
        assert_eq!(compile("1-2").unwrap_err(), CommandError::InvalidValueType);
    }

    #[test]
    fn rejects_sensor_numbers_past_max_loadcell() {
        assert_eq!(compile("1+4").unwrap_err(), CommandError::InvalidSensorNumber);
    }

    #[test]
    fn evaluate_sums_looked_up_values() {
        let p = compile("1+2").unwrap();
        let result = evaluate(&p, |id| match id.0 {
            1 => Some(input(10.0)),
            2 => Some(input(5.0)),
            _ => None,
        });
        assert_eq!(result, Some((15.0, Status::empty())));
    }

    #[test]
    fn evaluate_applies_per_input_unit_conversion() {
        let p = compile("1+2").unwrap();
        let result = evaluate(&p, |id| match id.0 {
            1 => Some(VSensorInput {
                value: 10.0,
                unit_factor: 2.0,
                status: Status::empty(),
            }),
            2 => Some(input(5.0)),
            _ => None,
        });
        assert_eq!(result, Some((25.0, Status::empty())));
    }

    #[test]
    fn evaluate_propagates_input_status_bits() {
        let p = compile("1+2").unwrap();
        let result = evaluate(&p, |id| match id.0 {
            1 => Some(VSensorInput {
                value: 10.0,
                unit_factor: 1.0,
                status: Status::OVERLOAD | Status::IN_MOTION,
            }),
            2 => Some(input(5.0)),
            _ => None,
        });
        // IN_MOTION isn't a propagated bit, only OVERLOAD is.
        assert_eq!(result, Some((15.0, Status::OVERLOAD)));
    }

    #[test]
    fn evaluate_propagates_missing_input_as_invalid() {
        let p = compile("1+2").unwrap();
        let result = evaluate(&p, |id| if id.0 == 1 { Some(input(1.0)) } else { None });
        assert_eq!(result, None);
    }
}
