use crate::math::{add, finite, power};
use async_trait::async_trait;
use graphcore::{Node, NodeContext, NodeDescriptor, NodeError, ParameterSpec, Value};

const INPUTS: [&str; 5] = ["a", "b", "c", "d", "e"];

/// Computes `a ** b + c + d + e` and logs its inputs to the log channel
pub struct DebugNode;

#[async_trait]
impl Node for DebugNode {
    fn node_type(&self) -> &str {
        "Debug Node"
    }

    fn describe(&self) -> NodeDescriptor {
        let mut descriptor = NodeDescriptor::new(self.node_type(), "Debug")
            .with_output("output", "int")
            .with_parameter(ParameterSpec::dropdown("operation", &["exp"], "exp"))
            .with_parameter(ParameterSpec::int("value", 42));
        for name in INPUTS {
            descriptor = descriptor.with_input(name, "int");
        }
        descriptor
    }

    async fn execute(&self, ctx: NodeContext) -> Result<Value, NodeError> {
        for name in INPUTS {
            ctx.logs.info(format!("  {}: {}", name, ctx.input(name)));
        }

        let mut numbers = Vec::with_capacity(INPUTS.len());
        for name in INPUTS {
            numbers.push(ctx.input(name).to_number(name)?);
        }

        let mut total = power(numbers[0], numbers[1]);
        for &n in &numbers[2..] {
            total = add(total, n);
        }
        let total = Value::from(finite(total)?);

        ctx.logs.info(format!("DEBUG: {} = {}", ctx.node_id, total));
        Ok(total)
    }
}
