//! Owned fault tree raised by wrapped actions.
//!
//! A [`Fault`] wraps any `std::error::Error + Send + Sync + 'static` and may
//! additionally own a single wrapped *cause* and/or an ordered list of
//! *branches* (an aggregate of several faults). The tree is immutable and
//! reference-counted, so cloning a fault is cheap and two clones compare
//! equal under [`Fault::ptr_eq`].
//!
//! # Examples
//!
//! ```rust
//! use rebound_core::fault::Fault;
//! use std::io;
//!
//! let timeout = Fault::new(io::Error::new(io::ErrorKind::TimedOut, "read timed out"));
//! let wrapped = Fault::wrap(io::Error::other("request failed"), timeout.clone());
//! let aggregate = Fault::aggregate([wrapped.clone(), Fault::msg("second branch")]);
//!
//! assert!(aggregate.is_aggregate());
//! assert_eq!(aggregate.flatten().len(), 2);
//! assert!(wrapped.cause().is_some_and(|cause| cause.ptr_eq(&timeout)));
//! ```

use std::collections::VecDeque;
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

/// Boxed error type stored inside every [`Fault`].
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Error carried by aggregate faults built with [`Fault::aggregate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{count} fault(s) occurred")]
pub struct AggregateError {
    count: usize,
}

impl AggregateError {
    /// Number of faults directly contained in the aggregate.
    pub fn count(&self) -> usize {
        self.count
    }
}

/// Plain-message error backing [`Fault::msg`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct MessageError(String);

/// A fault raised by a wrapped action.
///
/// Any error type converts into a `Fault`, so `?` works inside actions:
///
/// ```rust
/// use rebound_core::fault::Fault;
///
/// fn parse(input: &str) -> Result<u16, Fault> {
///     Ok(input.parse::<u16>()?)
/// }
///
/// let fault = parse("not a number").unwrap_err();
/// assert!(fault.is::<std::num::ParseIntError>());
/// ```
#[derive(Clone)]
pub struct Fault {
    node: Arc<Node>,
}

struct Node {
    error: BoxError,
    cause: Option<Fault>,
    branches: Vec<Fault>,
}

impl Fault {
    /// Wrap an error in a leaf fault.
    pub fn new<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::from_boxed(Box::new(error))
    }

    /// Wrap an already boxed error in a leaf fault.
    pub fn from_boxed(error: BoxError) -> Self {
        Self::from_node(Node {
            error,
            cause: None,
            branches: Vec::new(),
        })
    }

    /// Build a leaf fault from a plain message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::new(MessageError(message.into()))
    }

    /// Wrap an error around an inner cause.
    pub fn wrap<E>(error: E, cause: impl Into<Fault>) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::from_node(Node {
            error: Box::new(error),
            cause: Some(cause.into()),
            branches: Vec::new(),
        })
    }

    /// Combine several faults into one aggregate fault.
    ///
    /// Branch order is preserved; it is significant for nested matching.
    pub fn aggregate<I>(faults: I) -> Self
    where
        I: IntoIterator<Item = Fault>,
    {
        let branches: Vec<Fault> = faults.into_iter().collect();
        Self::from_node(Node {
            error: Box::new(AggregateError {
                count: branches.len(),
            }),
            cause: None,
            branches,
        })
    }

    fn from_node(node: Node) -> Self {
        Self {
            node: Arc::new(node),
        }
    }

    /// The error carried by this node.
    pub fn error(&self) -> &(dyn StdError + Send + Sync + 'static) {
        &*self.node.error
    }

    /// Whether this node's own error is of type `E`.
    ///
    /// Causes and branches are not inspected.
    pub fn is<E>(&self) -> bool
    where
        E: StdError + 'static,
    {
        self.node.error.is::<E>()
    }

    /// Borrow this node's own error as `E`.
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: StdError + 'static,
    {
        self.node.error.downcast_ref::<E>()
    }

    /// The inner fault of this node.
    ///
    /// For an aggregate this is its first branch.
    pub fn cause(&self) -> Option<&Fault> {
        self.node
            .cause
            .as_ref()
            .or_else(|| self.node.branches.first())
    }

    /// Faults directly contained in this aggregate (empty for leaves).
    pub fn branches(&self) -> &[Fault] {
        &self.node.branches
    }

    /// Whether this fault was built with [`Fault::aggregate`].
    pub fn is_aggregate(&self) -> bool {
        self.is::<AggregateError>()
    }

    /// All non-aggregate faults reachable through branch lists.
    ///
    /// Nested aggregates are expanded breadth-first: the direct branches of
    /// this fault come first, followed by the leaves of each nested aggregate
    /// in the order the aggregates were encountered. A non-aggregate fault
    /// flattens to an empty list.
    pub fn flatten(&self) -> Vec<Fault> {
        let mut leaves = Vec::new();
        let mut pending: VecDeque<&Fault> = VecDeque::from([self]);

        while let Some(current) = pending.pop_front() {
            for branch in current.branches() {
                if branch.is_aggregate() {
                    pending.push_back(branch);
                } else {
                    leaves.push(branch.clone());
                }
            }
        }

        leaves
    }

    /// Iterate over this fault followed by its cause chain.
    pub fn chain(&self) -> Chain<'_> {
        Chain { next: Some(self) }
    }

    /// Whether both handles point at the same fault node.
    pub fn ptr_eq(&self, other: &Fault) -> bool {
        Arc::ptr_eq(&self.node, &other.node)
    }
}

impl<E> From<E> for Fault
where
    E: StdError + Send + Sync + 'static,
{
    fn from(error: E) -> Self {
        Fault::new(error)
    }
}

impl fmt::Display for Fault {
    /// `{}` prints this node's error; `{:#}` appends the cause chain.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.node.error)?;
        if f.alternate() {
            for cause in self.chain().skip(1) {
                write!(f, ": {}", cause.node.error)?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("Fault");
        debug.field("error", &self.node.error);
        if let Some(cause) = &self.node.cause {
            debug.field("cause", cause);
        }
        if !self.node.branches.is_empty() {
            debug.field("branches", &self.node.branches);
        }
        debug.finish()
    }
}

/// Iterator returned by [`Fault::chain`].
#[derive(Debug, Clone)]
pub struct Chain<'a> {
    next: Option<&'a Fault>,
}

impl<'a> Iterator for Chain<'a> {
    type Item = &'a Fault;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.cause();
        Some(current)
    }
}
