use crate::reference::SddId;
use crate::types::{Literal, VtreeId};

/// A (prime, sub) pair of a decomposition node.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Element {
    pub prime: SddId,
    pub sub: SddId,
}

impl Element {
    pub fn new(prime: SddId, sub: SddId) -> Self {
        Self { prime, sub }
    }
}

impl From<(SddId, SddId)> for Element {
    fn from((prime, sub): (SddId, SddId)) -> Self {
        Self { prime, sub }
    }
}

/// Kind of an SDD node.
///
/// # Semantics
///
/// A decomposition node normalized for vtree `v` represents
/// ```text
/// (p1 ∧ s1) ∨ ... ∨ (pk ∧ sk)
/// ```
/// where the primes are over `v.left`, the subs over `v.right`, and the primes
/// are mutually exclusive and exhaustive.
#[derive(Debug, Clone, PartialEq)]
pub enum Sdd {
    False,
    /// `vtree` is `None` for the manager's singleton and a leaf for PSDD TRUE
    /// nodes, which are distributions over that leaf's variable.
    True { vtree: Option<VtreeId> },
    Literal(Literal),
    Decision { vtree: VtreeId, elements: Vec<Element> },
}

/// Non-negative weights of a PSDD node and their sum.
///
/// For a TRUE node the weights are indexed by the value of its variable
/// (`[false, true]`); for a decomposition node they are aligned with its
/// elements.
#[derive(Debug, Clone, PartialEq)]
pub struct Theta {
    weights: Vec<f64>,
    sum: f64,
}

impl Theta {
    pub fn new(weights: Vec<f64>) -> Self {
        debug_assert!(weights.iter().all(|&w| w >= 0.0), "weights must be non-negative: {:?}", weights);
        let sum = weights.iter().sum();
        Self { weights, sum }
    }

    /// Weights of a TRUE node with `Pr(x) = p`.
    pub fn bernoulli(p: f64) -> Self {
        Self::new(vec![1.0 - p, p])
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn weight(&self, i: usize) -> f64 {
        self.weights[i]
    }

    pub fn sum(&self) -> f64 {
        self.sum
    }

    /// `weight(i) / sum`.
    pub fn normalized(&self, i: usize) -> f64 {
        self.weights[i] / self.sum
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SddNode {
    pub kind: Sdd,
    pub theta: Option<Theta>,
}

impl SddNode {
    pub fn new(kind: Sdd) -> Self {
        Self { kind, theta: None }
    }

    pub fn with_theta(kind: Sdd, theta: Theta) -> Self {
        Self {
            kind,
            theta: Some(theta),
        }
    }

    pub fn is_false(&self) -> bool {
        matches!(self.kind, Sdd::False)
    }

    pub fn is_true(&self) -> bool {
        matches!(self.kind, Sdd::True { .. })
    }

    pub fn is_literal(&self) -> bool {
        matches!(self.kind, Sdd::Literal(_))
    }

    pub fn is_decision(&self) -> bool {
        matches!(self.kind, Sdd::Decision { .. })
    }

    /// Elements of a decomposition node, empty for anything else.
    pub fn elements(&self) -> &[Element] {
        match &self.kind {
            Sdd::Decision { elements, .. } => elements,
            _ => &[],
        }
    }

    /// Weight attached to `element`, if the node carries weights for it.
    pub fn element_weight(&self, element: &Element) -> Option<f64> {
        let theta = self.theta.as_ref()?;
        let i = self.elements().iter().position(|e| e == element)?;
        theta.weights.get(i).copied()
    }
}
