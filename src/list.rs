//! Doubly linked recency list.
//!
//! Backbone of the LRU store: nodes near the head were touched recently,
//! the node before the tail sentinel is the eviction candidate. Sentinel
//! (sigil) nodes at both ends keep every splice branch-free.
//!
//! This module is internal infrastructure. It hands out raw node pointers
//! that stay valid only while the node is linked, so all callers live inside
//! this crate where the invariants are enforced.

use core::fmt;
use core::mem;
use core::ptr;

/// A node in the recency list.
///
/// Holds a value and links to its neighbors. Sigil nodes leave the value
/// uninitialized, which is why it is wrapped in `MaybeUninit`.
pub(crate) struct Entry<T> {
    val: mem::MaybeUninit<T>,
    prev: *mut Entry<T>,
    next: *mut Entry<T>,
}

impl<T> Entry<T> {
    fn new(val: T) -> Self {
        Entry {
            val: mem::MaybeUninit::new(val),
            prev: ptr::null_mut(),
            next: ptr::null_mut(),
        }
    }

    /// Creates a sentinel entry without initializing the value.
    fn new_sigil() -> Self {
        Entry {
            val: mem::MaybeUninit::uninit(),
            prev: ptr::null_mut(),
            next: ptr::null_mut(),
        }
    }

    /// Borrows the stored value.
    ///
    /// # Safety
    ///
    /// Must only be called on non-sigil nodes; the value is assumed
    /// initialized.
    pub(crate) unsafe fn value(&self) -> &T {
        // SAFETY: guaranteed initialized by the caller contract
        unsafe { self.val.assume_init_ref() }
    }

    /// Mutably borrows the stored value.
    ///
    /// # Safety
    ///
    /// Must only be called on non-sigil nodes; the value is assumed
    /// initialized.
    pub(crate) unsafe fn value_mut(&mut self) -> &mut T {
        // SAFETY: guaranteed initialized by the caller contract
        unsafe { self.val.assume_init_mut() }
    }

    /// Consumes a detached node and returns the owned value.
    ///
    /// # Safety
    ///
    /// The node must be a non-sigil entry that has already been unlinked
    /// from its list.
    pub(crate) unsafe fn into_value(self: Box<Self>) -> T {
        let entry = *self;
        // SAFETY: non-sigil nodes always hold an initialized value
        unsafe { entry.val.assume_init() }
    }
}

/// A doubly linked list ordered by recency.
///
/// The node after `head` is the most recently used entry; the node before
/// `tail` is the least recently used one. All operations are O(1).
pub(crate) struct List<T> {
    len: usize,
    head: *mut Entry<T>,
    tail: *mut Entry<T>,
}

impl<T> List<T> {
    /// Creates an empty list with linked sentinel nodes.
    pub(crate) fn new() -> List<T> {
        let head = Box::into_raw(Box::new(Entry::new_sigil()));
        let tail = Box::into_raw(Box::new(Entry::new_sigil()));

        let list = List { len: 0, head, tail };

        unsafe {
            // SAFETY: head and tail are newly allocated, valid pointers
            (*list.head).next = list.tail;
            (*list.tail).prev = list.head;
        }

        list
    }

    /// Current number of entries.
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the list contains no entries.
    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Unlinks a node from its neighbors without deallocating it.
    ///
    /// # Safety
    ///
    /// `node` must be a valid non-sigil entry currently linked in this list.
    unsafe fn detach(&mut self, node: *mut Entry<T>) {
        // SAFETY: a linked node always has valid prev and next entries
        unsafe {
            (*(*node).prev).next = (*node).next;
            (*(*node).next).prev = (*node).prev;
        }
    }

    /// Links a node directly after the head sentinel (most recent position).
    ///
    /// # Safety
    ///
    /// `node` must be a valid entry that is not currently linked in any list.
    unsafe fn attach(&mut self, node: *mut Entry<T>) {
        // SAFETY: head is valid since construction; node is unlinked per the
        // caller contract
        unsafe {
            (*node).next = (*self.head).next;
            (*node).prev = self.head;
            (*self.head).next = node;
            (*(*node).next).prev = node;
        }
    }

    /// Allocates a node for `val` at the most recent position and returns a
    /// pointer to it.
    ///
    /// The pointer stays valid until the node is removed from the list.
    pub(crate) fn push_front(&mut self, val: T) -> *mut Entry<T> {
        let node = Box::into_raw(Box::new(Entry::new(val)));
        // SAFETY: node is newly allocated and not part of any list yet
        unsafe { self.attach(node) };
        self.len += 1;
        node
    }

    /// Moves a node to the most recent position.
    ///
    /// # Safety
    ///
    /// `node` must be a valid entry currently linked in this list.
    pub(crate) unsafe fn move_to_front(&mut self, node: *mut Entry<T>) {
        if node.is_null() || node == self.head || node == self.tail {
            return;
        }
        // SAFETY: head is valid since construction
        if unsafe { (*self.head).next } == node {
            return;
        }
        // SAFETY: caller guarantees node is linked in this list
        unsafe {
            self.detach(node);
            self.attach(node);
        }
    }

    /// Unlinks and returns the least recently used entry.
    pub(crate) fn remove_last(&mut self) -> Option<Box<Entry<T>>> {
        if self.is_empty() {
            return None;
        }
        // SAFETY: tail is valid since construction, and a non-empty list has
        // at least one real node before it
        let prev = unsafe { (*self.tail).prev };
        if prev == self.head {
            return None;
        }
        // SAFETY: prev is a real node linked in this list
        unsafe { self.detach(prev) };
        self.len -= 1;
        // SAFETY: prev was allocated by push_front via Box::into_raw and has
        // just been unlinked
        Some(unsafe { Box::from_raw(prev) })
    }
}

impl<T> Drop for List<T> {
    fn drop(&mut self) {
        // Drain real nodes first so their values are dropped.
        while let Some(entry) = self.remove_last() {
            // SAFETY: remove_last only yields detached non-sigil nodes
            let _ = unsafe { entry.into_value() };
        }

        // SAFETY: the sentinels were allocated in `new` and are only freed
        // here; their values are uninitialized and must not be dropped, which
        // `MaybeUninit` guarantees.
        unsafe {
            let _ = Box::from_raw(self.head);
            let _ = Box::from_raw(self.tail);
            self.head = ptr::null_mut();
            self.tail = ptr::null_mut();
        }
    }
}

impl<T> fmt::Debug for List<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("List").field("len", &self.len).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_and_remove_follow_recency_order() {
        let mut list = List::new();
        list.push_front(1);
        list.push_front(2);
        list.push_front(3);
        assert_eq!(list.len(), 3);

        // Oldest out first.
        let one = list.remove_last().map(|e| unsafe { e.into_value() });
        assert_eq!(one, Some(1));
        let two = list.remove_last().map(|e| unsafe { e.into_value() });
        assert_eq!(two, Some(2));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn move_to_front_rescues_a_node() {
        let mut list = List::new();
        let a = list.push_front("a");
        list.push_front("b");
        list.push_front("c");

        unsafe { list.move_to_front(a) };

        let oldest = list.remove_last().map(|e| unsafe { e.into_value() });
        assert_eq!(oldest, Some("b"));
    }

    #[test]
    fn remove_last_on_empty_is_none() {
        let mut list: List<u32> = List::new();
        assert!(list.remove_last().is_none());
        assert!(list.is_empty());
    }

    #[test]
    fn drop_releases_owned_values() {
        // Heap-owned values dropped with the list; run under miri to observe
        // any leak or double free.
        let mut list = List::new();
        for i in 0..16 {
            list.push_front(format!("value-{i}"));
        }
        drop(list);
    }
}
