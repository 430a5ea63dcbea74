//! Expression recording and forward-mode replay.

use tapelease_core::Resource;

/// Error type for recording and replaying tapes.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TapeError {
    /// The tape holds no recording.
    #[error("tape is empty")]
    EmptyTape,

    /// A node handle does not belong to this recording.
    #[error("node {0} is not part of this recording")]
    DanglingNode(usize),

    /// Replay was asked for a NaN or infinite point.
    #[error("cannot evaluate at non-finite point {0}")]
    NonFiniteInput(f64),
}

/// Handle to a recorded value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Node(usize);

#[derive(Debug, Clone, Copy, PartialEq)]
enum Op {
    Input,
    Const(f64),
    Add(usize, usize),
    Sub(usize, usize),
    Mul(usize, usize),
    Powi(usize, i32),
}

/// Value and first derivative carried through a forward sweep.
#[derive(Debug, Clone, Copy, Default)]
struct Taylor {
    value: f64,
    slope: f64,
}

/// Records the operations of a scalar function of one variable.
///
/// ```
/// use tapelease_tape::TapeBuilder;
///
/// let mut b = TapeBuilder::new();
/// let x = b.input();
/// let one = b.constant(1.0);
/// let y = b.add(x, one);
/// let y = b.mul(y, x);
/// let mut tape = b.finish(y).unwrap();
/// assert_eq!(tape.forward(2.0).unwrap(), 6.0);
/// assert_eq!(tape.jacobian(2.0).unwrap(), 5.0);
/// ```
#[derive(Debug)]
pub struct TapeBuilder {
    ops: Vec<Op>,
}

impl TapeBuilder {
    /// Start a recording with its independent variable in place.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ops: vec![Op::Input],
        }
    }

    fn push(&mut self, op: Op) -> Node {
        self.ops.push(op);
        Node(self.ops.len() - 1)
    }

    /// The independent variable.
    #[must_use]
    pub fn input(&self) -> Node {
        Node(0)
    }

    /// Record a constant.
    pub fn constant(&mut self, value: f64) -> Node {
        self.push(Op::Const(value))
    }

    /// Record `a + b`.
    pub fn add(&mut self, a: Node, b: Node) -> Node {
        self.push(Op::Add(a.0, b.0))
    }

    /// Record `a - b`.
    pub fn sub(&mut self, a: Node, b: Node) -> Node {
        self.push(Op::Sub(a.0, b.0))
    }

    /// Record `a * b`.
    pub fn mul(&mut self, a: Node, b: Node) -> Node {
        self.push(Op::Mul(a.0, b.0))
    }

    /// Record `a` raised to an integer power.
    pub fn powi(&mut self, a: Node, exponent: i32) -> Node {
        self.push(Op::Powi(a.0, exponent))
    }

    /// Seal the recording with `output` as the dependent variable.
    pub fn finish(self, output: Node) -> Result<Tape, TapeError> {
        if output.0 >= self.ops.len() {
            return Err(TapeError::DanglingNode(output.0));
        }
        for (at, op) in self.ops.iter().enumerate() {
            let (a, b) = match *op {
                Op::Input | Op::Const(_) => continue,
                Op::Add(a, b) | Op::Sub(a, b) | Op::Mul(a, b) => (a, b),
                Op::Powi(a, _) => (a, a),
            };
            // Operands must be recorded before they are used.
            if let Some(bad) = [a, b].into_iter().find(|&i| i >= at) {
                return Err(TapeError::DanglingNode(bad));
            }
        }
        Ok(Tape::from_ops(self.ops, output.0))
    }
}

impl Default for TapeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A sealed recording of `y = f(x)`.
///
/// Each replay overwrites the tape's Taylor buffer, which is why evaluation
/// takes `&mut self`.
#[derive(Debug, Clone, Default)]
pub struct Tape {
    ops: Vec<Op>,
    output: usize,
    taylor: Vec<Taylor>,
    sweeps: u64,
}

impl Tape {
    /// Record `coef * x * x`.
    #[must_use]
    pub fn quadratic(coef: f64) -> Self {
        let mut b = TapeBuilder::new();
        let x = b.input();
        let c = b.constant(coef);
        let cx = b.mul(c, x);
        let y = b.mul(cx, x);
        Self::from_ops(b.ops, y.0)
    }

    fn from_ops(ops: Vec<Op>, output: usize) -> Self {
        Self {
            taylor: Vec::with_capacity(ops.len()),
            ops,
            output,
            sweeps: 0,
        }
    }

    /// Number of recorded operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Whether the tape holds no recording.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Number of forward sweeps run on this copy.
    #[must_use]
    pub fn sweeps(&self) -> u64 {
        self.sweeps
    }

    /// Evaluate `f(x)`.
    pub fn forward(&mut self, x: f64) -> Result<f64, TapeError> {
        self.sweep(x).map(|t| t.value)
    }

    /// Evaluate `f'(x)`.
    pub fn jacobian(&mut self, x: f64) -> Result<f64, TapeError> {
        self.sweep(x).map(|t| t.slope)
    }

    fn sweep(&mut self, x: f64) -> Result<Taylor, TapeError> {
        if self.ops.is_empty() {
            return Err(TapeError::EmptyTape);
        }
        if !x.is_finite() {
            return Err(TapeError::NonFiniteInput(x));
        }
        self.sweeps += 1;
        self.taylor.clear();
        for op in &self.ops {
            let t = &self.taylor;
            let next = match *op {
                Op::Input => Taylor {
                    value: x,
                    slope: 1.0,
                },
                Op::Const(c) => Taylor {
                    value: c,
                    slope: 0.0,
                },
                Op::Add(a, b) => Taylor {
                    value: t[a].value + t[b].value,
                    slope: t[a].slope + t[b].slope,
                },
                Op::Sub(a, b) => Taylor {
                    value: t[a].value - t[b].value,
                    slope: t[a].slope - t[b].slope,
                },
                Op::Mul(a, b) => Taylor {
                    value: t[a].value * t[b].value,
                    slope: t[a].slope * t[b].value + t[a].value * t[b].slope,
                },
                Op::Powi(_, 0) => Taylor {
                    value: 1.0,
                    slope: 0.0,
                },
                Op::Powi(a, k) => {
                    let below = match k.checked_sub(1) {
                        Some(k1) => t[a].value.powi(k1),
                        None => t[a].value.powf(f64::from(k) - 1.0),
                    };
                    Taylor {
                        value: t[a].value.powi(k),
                        slope: f64::from(k) * below * t[a].slope,
                    }
                }
            };
            self.taylor.push(next);
        }
        Ok(self.taylor[self.output])
    }
}

impl Resource for Tape {
    type CloneError = TapeError;

    fn try_clone(&self) -> Result<Self, TapeError> {
        if self.is_empty() {
            return Err(TapeError::EmptyTape);
        }
        Ok(Self::from_ops(self.ops.clone(), self.output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quadratic_value_and_slope() {
        let mut tape = Tape::quadratic(3.0);
        assert_eq!(tape.forward(3.0).unwrap(), 27.0);
        assert_eq!(tape.jacobian(3.0).unwrap(), 18.0);
        assert_eq!(tape.sweeps(), 2);
    }

    #[test]
    fn builder_records_polynomial() {
        // y = x^3 - 2x
        let mut b = TapeBuilder::new();
        let x = b.input();
        let cube = b.powi(x, 3);
        let two = b.constant(2.0);
        let two_x = b.mul(two, x);
        let y = b.sub(cube, two_x);
        let mut tape = b.finish(y).unwrap();
        assert_eq!(tape.len(), 5);
        assert_eq!(tape.forward(2.0).unwrap(), 4.0);
        assert_eq!(tape.jacobian(2.0).unwrap(), 10.0);
    }

    #[test]
    fn zero_power_is_constant_one() {
        let mut b = TapeBuilder::new();
        let x = b.input();
        let y = b.powi(x, 0);
        let mut tape = b.finish(y).unwrap();
        assert_eq!(tape.forward(5.0).unwrap(), 1.0);
        assert_eq!(tape.jacobian(5.0).unwrap(), 0.0);
    }

    #[test]
    fn negative_power() {
        let mut b = TapeBuilder::new();
        let x = b.input();
        let y = b.powi(x, -1);
        let mut tape = b.finish(y).unwrap();
        assert_eq!(tape.forward(2.0).unwrap(), 0.5);
        assert_eq!(tape.jacobian(2.0).unwrap(), -0.25);
    }

    #[test]
    fn most_negative_power_does_not_overflow() {
        let mut b = TapeBuilder::new();
        let x = b.input();
        let y = b.powi(x, i32::MIN);
        let mut tape = b.finish(y).unwrap();
        assert_eq!(tape.jacobian(1.0).unwrap(), f64::from(i32::MIN));
        assert_eq!(tape.jacobian(2.0).unwrap(), 0.0);
        assert_eq!(tape.forward(1.0).unwrap(), 1.0);
    }

    #[test]
    fn output_may_be_the_input() {
        let b = TapeBuilder::new();
        let x = b.input();
        let mut tape = b.finish(x).unwrap();
        assert_eq!(tape.jacobian(7.0).unwrap(), 1.0);
    }

    #[test]
    fn foreign_node_is_rejected() {
        let mut big = TapeBuilder::new();
        let x = big.input();
        let c = big.constant(1.0);
        let far = big.add(x, c);

        let small = TapeBuilder::new();
        assert_eq!(small.finish(far).unwrap_err(), TapeError::DanglingNode(2));

        let mut other = TapeBuilder::new();
        let x = other.input();
        let y = other.add(x, far);
        assert_eq!(other.finish(y).unwrap_err(), TapeError::DanglingNode(2));
    }

    #[test]
    fn empty_tape_cannot_evaluate_or_clone() {
        let mut tape = Tape::default();
        assert!(tape.is_empty());
        assert_eq!(tape.forward(1.0), Err(TapeError::EmptyTape));
        assert!(matches!(tape.try_clone(), Err(TapeError::EmptyTape)));
    }

    #[test]
    fn non_finite_input_is_rejected() {
        let mut tape = Tape::quadratic(1.0);
        assert!(matches!(
            tape.jacobian(f64::NAN),
            Err(TapeError::NonFiniteInput(_))
        ));
        assert_eq!(tape.sweeps(), 0);
    }

    #[test]
    fn clone_is_independent() {
        let mut tape = Tape::quadratic(2.0);
        tape.forward(1.0).unwrap();
        let mut copy = tape.try_clone().unwrap();
        assert_eq!(copy.sweeps(), 0);
        assert_eq!(copy.jacobian(4.0).unwrap(), 16.0);
        assert_eq!(tape.sweeps(), 1);
    }
}
