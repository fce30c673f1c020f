//! Finds the features a global-phase expression needs from the content nodes.
//!
//! Global-phase ranking runs after the hits are gathered, so every rank
//! feature it reads must be shipped along as a match feature. Function
//! calls are followed into their bodies unless the function itself is
//! already a match feature; `constant(..)` and `query(..)` are available
//! everywhere and are never reported.

use std::collections::HashMap;

use indexmap::IndexSet;

use super::type_context::FunctionTable;
use crate::expr::Expr;
use crate::reference::Reference;
use crate::reference::feature_names::{as_constant_feature, is_simple_feature};

/// Inputs of `expr` that must become match features, in discovery order.
pub fn global_phase_inputs(
    expr: &Expr,
    functions: &FunctionTable,
    match_features: &IndexSet<Reference>,
    constants: &IndexSet<String>,
) -> IndexSet<String> {
    let mut recorder = InputRecorder {
        functions,
        match_features,
        constants,
        inputs: IndexSet::new(),
        active: Vec::new(),
    };
    recorder.visit(expr, &HashMap::new());
    recorder
        .inputs
        .into_iter()
        .filter(|input| !input.starts_with("constant(") && !input.starts_with("query("))
        .collect()
}

/// Parameter name to the argument text it is bound to; lambda parameters
/// have no binding.
type Scope = HashMap<String, Option<String>>;

struct InputRecorder<'a> {
    functions: &'a FunctionTable,
    match_features: &'a IndexSet<Reference>,
    constants: &'a IndexSet<String>,
    inputs: IndexSet<String>,
    /// Functions currently being followed.
    active: Vec<String>,
}

impl InputRecorder<'_> {
    fn visit(&mut self, expr: &Expr, scope: &Scope) {
        match expr {
            Expr::Reference(reference) => self.visit_reference(reference, scope),
            Expr::Map { argument, lambda } => {
                self.visit(argument, scope);
                self.visit(&lambda.body, &with_lambda(scope, &lambda.parameters));
            }
            Expr::Join { lhs, rhs, lambda } => {
                self.visit(lhs, scope);
                self.visit(rhs, scope);
                self.visit(&lambda.body, &with_lambda(scope, &lambda.parameters));
            }
            other => {
                for child in other.children() {
                    self.visit(child, scope);
                }
            }
        }
    }

    fn visit_reference(&mut self, reference: &Reference, scope: &Scope) {
        let name = reference.name();
        if reference.is_identifier() && scope.contains_key(name) {
            return;
        }

        if is_simple_feature(reference) {
            let argument = reference.simple_argument().unwrap_or_default();
            let input = match scope.get(argument) {
                Some(Some(bound)) => Reference::simple(name, bound),
                _ => reference.clone(),
            };
            self.inputs.insert(input.to_string());
            return;
        }

        if let Some(function) = self.functions.get(name)
            && function.arguments.len() == reference.arguments().len()
        {
            if self.match_features.contains(reference) {
                self.inputs.insert(reference.to_string());
                return;
            }
            for argument in reference.arguments() {
                // Bare names are usually field names consumed through the body.
                if let Expr::Reference(r) = argument
                    && r.is_identifier()
                    && !self.functions.contains_key(r.name())
                    && !self.constants.contains(r.name())
                {
                    continue;
                }
                self.visit(argument, scope);
            }
            if self.active.iter().any(|active| active == name) {
                return;
            }
            let bindings = function
                .arguments
                .iter()
                .cloned()
                .zip(reference.arguments().iter().map(|a| Some(a.to_string())))
                .collect();
            self.active.push(name.to_owned());
            self.visit(&function.body.root, &bindings);
            self.active.pop();
            return;
        }

        if reference.is_identifier() && self.constants.contains(name) {
            self.inputs.insert(as_constant_feature(name).to_string());
            return;
        }

        self.inputs.insert(reference.to_string());
    }
}

fn with_lambda(scope: &Scope, parameters: &[String]) -> Scope {
    let mut inner = scope.clone();
    inner.extend(parameters.iter().map(|p| (p.clone(), None)));
    inner
}
