use async_trait::async_trait;
use graphcore::{Node, NodeContext, NodeDescriptor, NodeError, ParameterSpec, Value};

/// Sink node. A run evaluates every instance of this type.
pub struct ResultNode;

#[async_trait]
impl Node for ResultNode {
    fn node_type(&self) -> &str {
        "Result Node"
    }

    fn describe(&self) -> NodeDescriptor {
        NodeDescriptor::new(self.node_type(), "Output")
            .with_input("input", "int")
            .with_parameter(ParameterSpec::int("result", 0))
    }

    async fn execute(&self, ctx: NodeContext) -> Result<Value, NodeError> {
        Ok(ctx.input("input"))
    }
}
