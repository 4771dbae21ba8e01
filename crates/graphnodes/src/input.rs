use async_trait::async_trait;
use graphcore::{Node, NodeContext, NodeDescriptor, NodeError, ParameterSpec, Value};

/// Emits its `value` parameter as an integer
pub struct IntegerNode;

#[async_trait]
impl Node for IntegerNode {
    fn node_type(&self) -> &str {
        "Integer Node"
    }

    fn describe(&self) -> NodeDescriptor {
        NodeDescriptor::new(self.node_type(), "Input")
            .with_output("output", "int")
            .with_parameter(ParameterSpec::int("value", 42))
    }

    async fn execute(&self, ctx: NodeContext) -> Result<Value, NodeError> {
        let value = ctx.param_or("value", Value::Integer(0)).to_i64("value")?;
        Ok(Value::Integer(value))
    }
}
