//! Type resolution for feature references within one rank profile.
//!
//! A top-level context owns the state shared by the whole resolution tree:
//! declared feature types, a cache for references that type the same
//! regardless of argument bindings, the in-progress call stack and the set
//! of query features used without a declaration. Child contexts are created
//! per function invocation and carry that invocation's argument bindings.
//!
//! Contexts hold `Rc`/`RefCell` state and are confined to one thread.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use indexmap::{IndexMap, IndexSet};
use rankdef_core::utils::unquote;
use rankdef_core::{CellType, Dimension, TensorType};

use crate::expr::{Expr, ExpressionFunction, Literal, TypeResolver};
use crate::reference::Reference;
use crate::reference::feature_names::{self, as_constant_feature};
use crate::{Error, Result};

pub type FunctionTable = IndexMap<String, ExpressionFunction>;

const TOKEN_FEATURES: [&str; 3] = ["tokenTypeIds", "tokenInputIds", "tokenAttentionMask"];
const LABEL_FEATURES: [&str; 2] = ["tensorFromLabels", "tensorFromWeightedSet"];

#[derive(Default)]
struct SharedState {
    feature_types: RefCell<HashMap<Reference, TensorType>>,
    globally_resolved: RefCell<HashMap<Reference, TensorType>>,
    call_stack: RefCell<Vec<Reference>>,
    query_features_not_declared: RefCell<IndexSet<Reference>>,
    tensors_are_used: Cell<bool>,
    resolutions: Cell<usize>,
}

pub struct TypeContext<'p> {
    functions: Rc<FunctionTable>,
    shared: Rc<SharedState>,
    resolved: RefCell<HashMap<Reference, TensorType>>,
    bindings: BTreeMap<String, String>,
    parent: Option<&'p TypeContext<'p>>,
}

impl TypeContext<'static> {
    pub fn new(functions: FunctionTable) -> Self {
        Self {
            functions: Rc::new(functions),
            shared: Rc::default(),
            resolved: RefCell::default(),
            bindings: BTreeMap::new(),
            parent: None,
        }
    }
}

impl<'p> TypeContext<'p> {
    /// Declare the type of a feature, e.g. `query(q)` or `attribute(embedding)`.
    pub fn set_type(&self, reference: Reference, tensor_type: TensorType) {
        self.shared
            .feature_types
            .borrow_mut()
            .insert(reference, tensor_type);
    }

    pub fn feature_type(&self, reference: &Reference) -> Option<TensorType> {
        self.shared.feature_types.borrow().get(reference).cloned()
    }

    pub fn functions(&self) -> &FunctionTable {
        &self.functions
    }

    /// Query features that were referenced but never declared, in discovery order.
    pub fn query_features_not_declared(&self) -> Vec<Reference> {
        self.shared
            .query_features_not_declared
            .borrow()
            .iter()
            .cloned()
            .collect()
    }

    /// True once any resolved reference had a non-scalar type.
    pub fn tensors_are_used(&self) -> bool {
        self.shared.tensors_are_used.get()
    }

    /// Number of cache misses resolved so far in this context tree.
    pub fn resolutions(&self) -> usize {
        self.shared.resolutions.get()
    }

    /// A child context for one function invocation.
    pub fn with_bindings(&self, bindings: BTreeMap<String, String>) -> TypeContext<'_> {
        TypeContext {
            functions: Rc::clone(&self.functions),
            shared: Rc::clone(&self.shared),
            resolved: RefCell::default(),
            bindings,
            parent: Some(self),
        }
    }

    pub fn get_type(&self, reference: &Reference) -> Result<TensorType> {
        let global = self.is_globally_resolvable(reference);
        let cached = if global {
            self.shared.globally_resolved.borrow().get(reference).cloned()
        } else {
            self.resolved.borrow().get(reference).cloned()
        };
        if let Some(tensor_type) = cached {
            return Ok(tensor_type);
        }

        let tensor_type = self.resolve_type(reference)?;
        if tensor_type.rank() > 0 {
            self.shared.tensors_are_used.set(true);
        }
        let cache = if global {
            &self.shared.globally_resolved
        } else {
            &self.resolved
        };
        cache
            .borrow_mut()
            .insert(reference.clone(), tensor_type.clone());
        Ok(tensor_type)
    }

    /// A zero-argument function invocation types the same in every context.
    fn is_globally_resolvable(&self, reference: &Reference) -> bool {
        reference.arguments().is_empty()
            && !self.bindings.contains_key(reference.name())
            && self
                .functions
                .get(reference.name())
                .is_some_and(|f| f.arguments.is_empty())
    }

    fn resolve_type(&self, reference: &Reference) -> Result<TensorType> {
        self.shared.resolutions.set(self.shared.resolutions.get() + 1);

        if self.shared.call_stack.borrow().contains(reference) {
            let mut path: Vec<String> = self
                .shared
                .call_stack
                .borrow()
                .iter()
                .map(|r| r.to_string())
                .collect();
            path.push(reference.to_string());
            return Err(Error::InvocationLoop(path));
        }

        if reference.is_identifier()
            && let Some(binding) = self.bindings.get(reference.name())
            && let Some(parent) = self.parent
        {
            return Expr::parse(binding)?.type_of(parent);
        }

        self.shared.call_stack.borrow_mut().push(reference.clone());
        let result = self.resolve_unbound(reference);
        self.shared.call_stack.borrow_mut().pop();
        result
    }

    fn resolve_unbound(&self, reference: &Reference) -> Result<TensorType> {
        if feature_names::is_simple_feature(reference) {
            return Ok(self.simple_feature_type(reference));
        }

        if let Some(function) = self.invoked_function(reference) {
            let bindings = function
                .arguments
                .iter()
                .cloned()
                .zip(reference.arguments().iter().map(|a| a.to_string()))
                .collect();
            let child = self.with_bindings(bindings);
            return function.body.root.type_of(&child);
        }

        if reference.name() == "onnx" {
            return self.onnx_feature_type(reference);
        }
        if TOKEN_FEATURES.contains(&reference.name()) {
            return token_feature_type(reference);
        }
        if LABEL_FEATURES.contains(&reference.name()) {
            return label_feature_type(reference);
        }

        if reference.is_identifier() {
            let feature_types = self.shared.feature_types.borrow();
            if let Some(tensor_type) = feature_types.get(reference) {
                return Ok(tensor_type.clone());
            }
            if let Some(tensor_type) = feature_types.get(&as_constant_feature(reference.name())) {
                return Ok(tensor_type.clone());
            }
        }

        // Rank features unknown here (bm25, nativeRank, ...) produce scalars.
        Ok(TensorType::empty())
    }

    fn simple_feature_type(&self, reference: &Reference) -> TensorType {
        let argument = self.resolve_argument(reference.simple_argument().unwrap_or_default());
        let canonical = Reference::simple(reference.name(), &argument);

        if let Some(tensor_type) = self.shared.feature_types.borrow().get(&canonical) {
            return tensor_type.clone();
        }
        if feature_names::is_query_feature(&canonical) {
            self.shared
                .query_features_not_declared
                .borrow_mut()
                .insert(canonical);
        }
        TensorType::empty()
    }

    /// A simple feature argument after following its binding. Bound text is
    /// printed expression text, so a string literal keeps its quotes there.
    fn resolve_argument(&self, argument: &str) -> String {
        match self.binding_of(argument) {
            Some(bound) => unquote(&bound).to_owned(),
            None => argument.to_owned(),
        }
    }

    /// What `name` is bound to, followed through the parent chain.
    fn binding_of(&self, name: &str) -> Option<String> {
        let binding = self.bindings.get(name)?;
        let further = self.parent.and_then(|parent| parent.binding_of(binding));
        Some(further.unwrap_or_else(|| binding.clone()))
    }

    fn invoked_function(&self, reference: &Reference) -> Option<&ExpressionFunction> {
        self.functions
            .get(reference.name())
            .filter(|f| f.arguments.len() == reference.arguments().len())
    }

    fn onnx_feature_type(&self, reference: &Reference) -> Result<TensorType> {
        let model = match reference.arguments() {
            [_] => reference.simple_argument(),
            _ => None,
        };
        let Some(model) = model else {
            return Err(Error::invalid(format!(
                "{reference}: an onnx feature takes exactly one argument naming the model"
            )));
        };
        let model = self.resolve_argument(model);
        let lookup =
            Reference::simple("onnx", &model).with_output(reference.output().map(str::to_owned));
        self.shared
            .feature_types
            .borrow()
            .get(&lookup)
            .cloned()
            .ok_or_else(|| Error::UnknownOnnxModel(lookup.to_string()))
    }
}

impl TypeResolver for TypeContext<'_> {
    fn resolve(&self, reference: &Reference) -> Result<TensorType> {
        self.get_type(reference)
    }
}

/// `tokenInputIds(size, ...)`: `tensor<float>(d0[1],d1[size])`.
fn token_feature_type(reference: &Reference) -> Result<TensorType> {
    let arguments = reference.arguments();
    if arguments.len() < 2 {
        return Err(Error::invalid(format!(
            "{reference}: {} takes a size and at least one input",
            reference.name()
        )));
    }
    let size = match &arguments[0] {
        Expr::Literal(Literal::Number(n)) if *n >= 0.0 && n.fract() == 0.0 => Some(*n as u64),
        Expr::Reference(word) if word.is_identifier() => word.name().parse().ok(),
        _ => None,
    };
    let Some(size) = size else {
        return Err(Error::invalid(format!(
            "{reference}: the first argument of {} must be a size, not '{}'",
            reference.name(),
            arguments[0]
        )));
    };
    Ok(TensorType::new(
        CellType::Float,
        [Dimension::indexed("d0", 1), Dimension::indexed("d1", size)],
    )?)
}

/// `tensorFromLabels(attribute(a), dim)`: `tensor(dim{})`, the dimension
/// defaulting to the attribute name.
fn label_feature_type(reference: &Reference) -> Result<TensorType> {
    let arguments = reference.arguments();
    if arguments.is_empty() || arguments.len() > 2 {
        return Err(Error::invalid(format!(
            "{reference}: {} takes one or two arguments",
            reference.name()
        )));
    }
    let source = match &arguments[0] {
        Expr::Reference(source) if source.is_simple() => source,
        other => {
            return Err(Error::invalid(format!(
                "{reference}: the first argument must be a simple feature, not '{other}'"
            )));
        }
    };
    let dimension = match arguments.get(1) {
        None => source.simple_argument().unwrap_or_default().to_owned(),
        Some(Expr::Reference(dimension)) if dimension.is_identifier() => {
            dimension.name().to_owned()
        }
        Some(other) => {
            return Err(Error::invalid(format!(
                "{reference}: the second argument must be a dimension name, not '{other}'"
            )));
        }
    };
    Ok(TensorType::mapped(dimension))
}
