//! Persistent stack of ancestor index values.
//!
//! Every index directory pushes the value it is expanding onto the stack it
//! received and hands the derived stack to the subtree below. Pushing never
//! touches the original, so sibling subtrees each see only their own
//! ancestry while sharing the common tail.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A value that can live on an [`IndexStack`]
pub trait IndexValue: Any + fmt::Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any + fmt::Debug + Send + Sync> IndexValue for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

struct Frame {
    value: Box<dyn IndexValue>,
    next: Option<Arc<Frame>>,
}

/// Immutable LIFO sequence of index values, top = nearest ancestor
#[derive(Clone, Default)]
pub struct IndexStack {
    head: Option<Arc<Frame>>,
    len: usize,
}

impl IndexStack {
    /// Empty stack, used at the root of a preparation pass
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive a new stack with `value` on top
    pub fn push<T: IndexValue>(&self, value: T) -> Self {
        Self {
            head: Some(Arc::new(Frame {
                value: Box::new(value),
                next: self.head.clone(),
            })),
            len: self.len + 1,
        }
    }

    pub fn peek(&self) -> Option<&dyn IndexValue> {
        self.head.as_deref().map(|frame| &*frame.value)
    }

    /// Top value, if it has type `T`
    pub fn peek_as<T: Any>(&self) -> Option<&T> {
        self.get_as(0)
    }

    /// Value `depth` levels below the top, if it has type `T`
    pub fn get_as<T: Any>(&self, depth: usize) -> Option<&T> {
        self.iter().nth(depth)?.as_any().downcast_ref()
    }

    /// Nearest ancestor value of type `T`
    pub fn find<T: Any>(&self) -> Option<&T> {
        self.iter().find_map(|value| value.as_any().downcast_ref())
    }

    /// The stack below the top element
    pub fn parent(&self) -> Self {
        match &self.head {
            Some(frame) => Self {
                head: frame.next.clone(),
                len: self.len - 1,
            },
            None => Self::new(),
        }
    }

    /// Values from top to bottom
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            next: self.head.as_deref(),
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether both stacks share the same top frame
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (&self.head, &other.head) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl fmt::Debug for IndexStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// Iterator over stack values, top first
pub struct Iter<'a> {
    next: Option<&'a Frame>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a dyn IndexValue;

    fn next(&mut self) -> Option<Self::Item> {
        let frame = self.next?;
        self.next = frame.next.as_deref();
        Some(&*frame.value)
    }
}

impl Drop for IndexStack {
    // Unlink uniquely owned frames iteratively; deep stacks would otherwise
    // recurse once per frame.
    fn drop(&mut self) {
        let mut next = self.head.take();
        while let Some(frame) = next {
            match Arc::try_unwrap(frame) {
                Ok(mut frame) => next = frame.next.take(),
                Err(_) => break,
            }
        }
    }
}
