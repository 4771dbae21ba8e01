use async_trait::async_trait;
use graphcore::{Node, NodeContext, NodeDescriptor, NodeError, Number, ParameterSpec, Value};

pub const OPERATIONS: [&str; 4] = ["add", "subtract", "multiply", "divide"];

/// Binary arithmetic on its `a` and `b` inputs
pub struct BasicMathNode;

#[async_trait]
impl Node for BasicMathNode {
    fn node_type(&self) -> &str {
        "BasicMath Node"
    }

    fn describe(&self) -> NodeDescriptor {
        NodeDescriptor::new(self.node_type(), "Math")
            .with_input("a", "int")
            .with_input("b", "int")
            .with_output("output", "int")
            .with_parameter(ParameterSpec::dropdown("operation", &OPERATIONS, "add"))
    }

    async fn execute(&self, ctx: NodeContext) -> Result<Value, NodeError> {
        let a = ctx.input("a").to_number("a")?;
        let b = ctx.input("b").to_number("b")?;
        let operation = ctx.param_or("operation", Value::from("add"));

        let result = match operation.as_str() {
            Some("add") => add(a, b),
            Some("subtract") => subtract(a, b),
            Some("multiply") => multiply(a, b),
            Some("divide") => divide(a, b),
            other => {
                return Err(NodeError::Configuration(format!(
                    "unknown operation {}",
                    other.unwrap_or(operation.type_name())
                )))
            }
        };
        finite(result).map(Value::from)
    }
}

/// `a` raised to the power `b`
pub struct ExpMathNode;

#[async_trait]
impl Node for ExpMathNode {
    fn node_type(&self) -> &str {
        "Exp Math Node"
    }

    fn describe(&self) -> NodeDescriptor {
        NodeDescriptor::new(self.node_type(), "Math")
            .with_input("a", "int")
            .with_input("b", "int")
            .with_output("output", "int")
            .with_parameter(ParameterSpec::dropdown("operation", &["exp"], "exp"))
    }

    async fn execute(&self, ctx: NodeContext) -> Result<Value, NodeError> {
        let a = ctx.input("a").to_number("a")?;
        let b = ctx.input("b").to_number("b")?;
        finite(power(a, b)).map(Value::from)
    }
}

pub fn add(a: Number, b: Number) -> Number {
    match (a, b) {
        (Number::Integer(x), Number::Integer(y)) => x
            .checked_add(y)
            .map(Number::Integer)
            .unwrap_or(Number::Float(x as f64 + y as f64)),
        _ => Number::Float(a.as_f64() + b.as_f64()),
    }
}

pub fn subtract(a: Number, b: Number) -> Number {
    match (a, b) {
        (Number::Integer(x), Number::Integer(y)) => x
            .checked_sub(y)
            .map(Number::Integer)
            .unwrap_or(Number::Float(x as f64 - y as f64)),
        _ => Number::Float(a.as_f64() - b.as_f64()),
    }
}

pub fn multiply(a: Number, b: Number) -> Number {
    match (a, b) {
        (Number::Integer(x), Number::Integer(y)) => x
            .checked_mul(y)
            .map(Number::Integer)
            .unwrap_or(Number::Float(x as f64 * y as f64)),
        _ => Number::Float(a.as_f64() * b.as_f64()),
    }
}

/// True division. Dividing by zero yields integer zero.
pub fn divide(a: Number, b: Number) -> Number {
    if b.is_zero() {
        return Number::Integer(0);
    }
    Number::Float(a.as_f64() / b.as_f64())
}

/// Integer powers stay integers while they fit
pub fn power(base: Number, exponent: Number) -> Number {
    if let (Number::Integer(x), Number::Integer(y)) = (base, exponent) {
        if let Some(result) = u32::try_from(y).ok().and_then(|y| x.checked_pow(y)) {
            return Number::Integer(result);
        }
    }
    Number::Float(base.as_f64().powf(exponent.as_f64()))
}

pub(crate) fn finite(n: Number) -> Result<Number, NodeError> {
    match n {
        Number::Float(f) if !f.is_finite() => Err(NodeError::ExecutionFailed(format!(
            "result {} is not a finite number",
            f
        ))),
        _ => Ok(n),
    }
}
