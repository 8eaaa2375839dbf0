//! Predicate trees built from normalized filters
//!
//! Only equality and set membership exist, combined by conjunction. The tree
//! is right-associative: `a AND (b AND (c AND d))`.

use crate::metadata::AttributePath;
use crate::normalize::{FilterValue, NormalizedFilter};
use crate::value::Value;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    Equals { path: AttributePath, value: Value },
    In { path: AttributePath, values: Vec<Value> },
    And(Box<Predicate>, Box<Predicate>),
}

impl Predicate {
    pub fn equals(path: AttributePath, value: Value) -> Self {
        Self::Equals { path, value }
    }

    pub fn is_in(path: AttributePath, values: Vec<Value>) -> Self {
        Self::In { path, values }
    }

    pub fn and(left: Predicate, right: Predicate) -> Self {
        Self::And(Box::new(left), Box::new(right))
    }

    /// `In` for list values, `Equals` for scalars.
    pub fn from_filter(filter: &NormalizedFilter) -> Self {
        match &filter.value {
            FilterValue::List(values) => Self::is_in(filter.path.clone(), values.clone()),
            FilterValue::Single(value) => Self::equals(filter.path.clone(), value.clone()),
        }
    }

    /// Right-associative conjunction of `predicates`.
    ///
    /// Returns `None` for an empty input, meaning "match everything".
    pub fn conjoin<I>(predicates: I) -> Option<Self>
    where
        I: IntoIterator<Item = Predicate>,
        I::IntoIter: DoubleEndedIterator,
    {
        predicates
            .into_iter()
            .rev()
            .fold(None, |acc, p| match acc {
                None => Some(p),
                Some(rest) => Some(Self::and(p, rest)),
            })
    }

    /// Leaf predicates in left-to-right order.
    pub fn leaves(&self) -> Vec<&Predicate> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            match node {
                Self::And(left, right) => {
                    stack.push(right.as_ref());
                    stack.push(left.as_ref());
                }
                leaf => out.push(leaf),
            }
        }
        out
    }

    /// Every attribute path referenced by the tree.
    pub fn paths(&self) -> Vec<&AttributePath> {
        self.leaves()
            .into_iter()
            .filter_map(|leaf| match leaf {
                Self::Equals { path, .. } | Self::In { path, .. } => Some(path),
                Self::And(..) => None,
            })
            .collect()
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equals { path, value } => write!(f, "{path} = {value}"),
            Self::In { path, values } => {
                let items: Vec<String> = values.iter().map(ToString::to_string).collect();
                write!(f, "{path} IN ({})", items.join(", "))
            }
            Self::And(left, right) => write!(f, "({left} AND {right})"),
        }
    }
}

/// Build the conjunction of all filters; `None` when there are no filters.
pub fn build_predicate(filters: &[NormalizedFilter]) -> Option<Predicate> {
    Predicate::conjoin(filters.iter().map(Predicate::from_filter).collect::<Vec<_>>())
}
