//! Type Inference
//!
//! Answers "what type does this expression evaluate to" with a symbolic
//! `PhpType`. Inference is total: anything unprovable is `Mixed`. It
//! interleaves with the reference resolver for member lookups, checks a
//! cooperative cancellation token at each recursion entry, and bounds
//! recursion depth so pathological sources cannot blow the stack.

pub mod expression;
pub mod node;
pub mod php_type;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub use php_type::PhpType;

use crate::ast::Ast;
use crate::indexer::index::ReadableIndex;

/// Recursion bound for expression inference; overflow degrades to `Mixed`.
pub(crate) const MAX_DEPTH: u32 = 64;

/// Cooperative cancellation flag shared between a request handler and the
/// inference it started. Observed cancellation makes inference return
/// `Mixed`; the caller discards the result.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        CancelToken::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Borrow of everything inference needs: the tree and the index.
pub struct TypeInferrer<'a> {
    pub(crate) ast: &'a Ast,
    pub(crate) index: &'a dyn ReadableIndex,
    pub(crate) cancel: CancelToken,
}

impl<'a> TypeInferrer<'a> {
    pub fn new(ast: &'a Ast, index: &'a dyn ReadableIndex) -> Self {
        TypeInferrer {
            ast,
            index,
            cancel: CancelToken::new(),
        }
    }

    pub fn with_cancel(
        ast: &'a Ast,
        index: &'a dyn ReadableIndex,
        cancel: CancelToken,
    ) -> Self {
        TypeInferrer { ast, index, cancel }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_token() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
    }
}
