//! Scalar rate and function providers.
//!
//! Every rate the growth phases consume (thermal time, plastochron,
//! phyllochron, final node number, branching, mortality, height) is read
//! through [`ScalarFunction`]. The providers here cover the common cases;
//! hosts can implement the trait for anything else.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// A provider of a single read-only scalar "current value".
pub trait ScalarFunction: fmt::Debug {
    fn value(&self) -> f64;
}

impl<T: ScalarFunction + ?Sized> ScalarFunction for Box<T> {
    fn value(&self) -> f64 {
        (**self).value()
    }
}

/// A value that never changes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Constant(pub f64);

impl ScalarFunction for Constant {
    fn value(&self) -> f64 {
        self.0
    }
}

/// A scalar written by the host and read by the model.
///
/// Clones share the same cell, so the host keeps one handle and hands
/// another to the model. Single-threaded by construction.
#[derive(Clone, Debug, Default)]
pub struct SharedValue(Rc<Cell<f64>>);

impl SharedValue {
    pub fn new(value: f64) -> Self {
        Self(Rc::new(Cell::new(value)))
    }

    pub fn set(&self, value: f64) {
        self.0.set(value);
    }

    pub fn get(&self) -> f64 {
        self.0.get()
    }
}

impl ScalarFunction for SharedValue {
    fn value(&self) -> f64 {
        self.get()
    }
}

/// Wraps a closure as a provider.
pub struct FnValue<F>(pub F);

impl<F: Fn() -> f64> ScalarFunction for FnValue<F> {
    fn value(&self) -> f64 {
        (self.0)()
    }
}

impl<F> fmt::Debug for FnValue<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnValue(..)")
    }
}

/// Sum of several providers, e.g. drought- plus shade-induced branch
/// mortality.
#[derive(Debug, Default)]
pub struct Sum(pub Vec<Box<dyn ScalarFunction>>);

impl ScalarFunction for Sum {
    fn value(&self) -> f64 {
        self.0.iter().map(|f| f.value()).sum()
    }
}

/// Piecewise-linear response of `y` to the current value of `x`.
///
/// Outside the range of the breakpoints the response is held at the
/// first/last `y`. With no breakpoints the value is `0.0`.
#[derive(Debug)]
pub struct LinearInterpolation {
    x: Box<dyn ScalarFunction>,
    points: Vec<(f64, f64)>,
}

impl LinearInterpolation {
    /// Creates a response curve over `x`.
    ///
    /// ### Parameters
    /// - `x` - Provider of the independent variable.
    /// - `points` - `(x, y)` breakpoints in any order; they are sorted by `x`.
    pub fn new(x: impl ScalarFunction + 'static, mut points: Vec<(f64, f64)>) -> Self {
        points.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self {
            x: Box::new(x),
            points,
        }
    }

    /// Evaluates the curve at an arbitrary `x`.
    pub fn at(&self, x: f64) -> f64 {
        let (Some(first), Some(last)) = (self.points.first(), self.points.last()) else {
            return 0.0;
        };
        if x <= first.0 {
            return first.1;
        }
        if x >= last.0 {
            return last.1;
        }
        for w in self.points.windows(2) {
            let (x0, y0) = w[0];
            let (x1, y1) = w[1];
            if x <= x1 {
                if x1 == x0 {
                    return y1;
                }
                return y0 + (y1 - y0) * (x - x0) / (x1 - x0);
            }
        }
        last.1
    }
}

impl ScalarFunction for LinearInterpolation {
    fn value(&self) -> f64 {
        self.at(self.x.value())
    }
}

/// The full set of providers a [`crate::structure::Structure`] reads from,
/// resolved once at construction.
///
/// `plant_mortality` is optional: `None` skips the whole-plant mortality
/// pathway, which is not the same as a rate of zero.
#[derive(Debug)]
pub struct StructureFunctions {
    pub thermal_time: Box<dyn ScalarFunction>,
    pub primordia_initiation_rate: Box<dyn ScalarFunction>,
    pub node_appearance_rate: Box<dyn ScalarFunction>,
    pub final_node_number: Box<dyn ScalarFunction>,
    pub height: Box<dyn ScalarFunction>,
    pub branching_rate: Box<dyn ScalarFunction>,
    pub branch_mortality: Box<dyn ScalarFunction>,
    pub plant_mortality: Option<Box<dyn ScalarFunction>>,
}
