//! Moving around a checked package's syntax tree.

use crate::analyzer::Symbol;
use crate::error::QueryError;
use crate::hir::ResolvedPackage;
use crate::syntax::ast::{CallExpr, Expr};
use crate::syntax::{Ancestors, Node, NodeId, find_ancestors};

/// One call of a function or method.
#[derive(Debug, Clone)]
pub struct Invocation<'a> {
    pub call: &'a CallExpr,
    /// What the callee was selected from in `x.f(...)`, when `x` is a
    /// resolved identifier.
    pub receiver: Option<Symbol>,
    pub args: &'a [Expr],
    /// Ancestors of `call`.
    pub ancestors: Ancestors<'a>,
}

impl ResolvedPackage {
    /// Ancestors of the node `target`, root first.
    pub fn ancestors_of(&self, target: NodeId) -> Result<Ancestors<'_>, QueryError> {
        find_ancestors(Node::Package(self.syntax()), target)
            .ok_or_else(|| QueryError::NodeNotFound(self.identity().to_string()))
    }

    /// Every call of `func` in this package, in position order. Uses that
    /// are not calls, such as passing the function as a value, are skipped.
    pub fn invocations_of(&self, func: &Symbol) -> Result<Vec<Invocation<'_>>, QueryError> {
        if !func.is_func() {
            return Err(QueryError::NotAFunction(func.to_string()));
        }
        let Some(lifetime) = self.lifetime_of(func) else {
            return Ok(Vec::new());
        };

        let mut invocations = Vec::new();
        for used in &lifetime.uses {
            let mut chain = self.ancestors_of(used.id)?.into_vec();
            let mut callee = used.id;
            let mut receiver = None;

            if let Some(parent) = chain.last().copied()
                && let Some(selector) = parent.as_selector()
                && selector.sel.id == used.id
            {
                receiver = selector
                    .x
                    .unparen()
                    .as_ident()
                    .and_then(|x| self.object_of(x))
                    .cloned();
                callee = parent.id();
                chain.pop();
            }

            let Some(call) = chain.last().and_then(|node| node.as_call()) else {
                continue;
            };
            if call.fun.id() != callee {
                continue;
            }
            chain.pop();
            invocations.push(Invocation {
                call,
                receiver,
                args: &call.args,
                ancestors: Ancestors::new(chain),
            });
        }
        Ok(invocations)
    }
}
