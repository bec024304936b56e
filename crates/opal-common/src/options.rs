//! Lowering configuration.

/// Options controlling tree shapes the lowering engine may legitimately
/// produce in more than one way.
#[derive(Clone, Debug)]
pub struct LoweringOptions {
    /// Keep the two-layer shape for `&&`/`||` over a type that declares
    /// `operator true`/`operator false` but no short-circuit operator: an
    /// untyped `None` node holding the two operands, wrapped in the
    /// implicit `True` unary probe. When false, a single typed
    /// `BinaryOperator` node is produced instead.
    pub preserve_untyped_logical_shape: bool,
}

impl Default for LoweringOptions {
    fn default() -> Self {
        Self {
            // Default matches the canonical tree-print format byte for byte.
            preserve_untyped_logical_shape: true,
        }
    }
}
