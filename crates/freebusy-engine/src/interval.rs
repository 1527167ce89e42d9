//! Augmented interval tree for overlap queries.
//!
//! An AVL tree keyed by range start. Every node also records the latest end
//! time found in its subtree, which lets a query skip any subtree that ends
//! at or before the query start. Insertion is O(log n); an overlap query is
//! O(log n + k) for k matches.

use std::cmp::max;

use chrono::{DateTime, Utc};

use crate::range::TimeRange;

type Link<T> = Option<Box<Node<T>>>;

struct Node<T> {
    range: TimeRange,
    payload: T,
    /// Latest `range.end` in this subtree.
    max_end: DateTime<Utc>,
    height: i32,
    left: Link<T>,
    right: Link<T>,
}

impl<T> Node<T> {
    fn leaf(range: TimeRange, payload: T) -> Self {
        Self {
            range,
            payload,
            max_end: range.end,
            height: 1,
            left: None,
            right: None,
        }
    }

    fn update(&mut self) {
        self.height = 1 + max(height(&self.left), height(&self.right));
        let mut end = self.range.end;
        if let Some(left) = &self.left {
            end = end.max(left.max_end);
        }
        if let Some(right) = &self.right {
            end = end.max(right.max_end);
        }
        self.max_end = end;
    }

    fn balance(&self) -> i32 {
        height(&self.left) - height(&self.right)
    }
}

fn height<T>(link: &Link<T>) -> i32 {
    link.as_ref().map_or(0, |n| n.height)
}

/// Interval tree mapping time ranges to payloads.
///
/// Ranges with equal starts are all kept; the tree is a multimap.
pub struct IntervalTree<T> {
    root: Link<T>,
    len: usize,
}

impl<T> Default for IntervalTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> IntervalTree<T> {
    pub fn new() -> Self {
        Self { root: None, len: 0 }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Insert `payload` under `range`. The caller guarantees `start <= end`.
    pub fn insert(&mut self, range: TimeRange, payload: T) {
        self.root = Some(insert(self.root.take(), range, payload));
        self.len += 1;
    }

    /// Every payload whose range satisfies `start < query.end && end > query.start`.
    ///
    /// Results come back in start order, but callers should not rely on it.
    pub fn find_overlapping(&self, query: &TimeRange) -> Vec<&T> {
        let mut out = Vec::new();
        collect(&self.root, query, &mut out);
        out
    }

    /// Tree height; 0 when empty.
    pub fn height(&self) -> i32 {
        height(&self.root)
    }
}

fn insert<T>(link: Link<T>, range: TimeRange, payload: T) -> Box<Node<T>> {
    match link {
        None => Box::new(Node::leaf(range, payload)),
        Some(mut node) => {
            if range.start < node.range.start {
                node.left = Some(insert(node.left.take(), range, payload));
            } else {
                node.right = Some(insert(node.right.take(), range, payload));
            }
            rebalance(node)
        }
    }
}

fn rebalance<T>(mut node: Box<Node<T>>) -> Box<Node<T>> {
    node.update();
    let balance = node.balance();
    if balance > 1 {
        if node.left.as_ref().is_some_and(|l| l.balance() < 0) {
            node.left = node.left.take().map(rotate_left);
        }
        return rotate_right(node);
    }
    if balance < -1 {
        if node.right.as_ref().is_some_and(|r| r.balance() > 0) {
            node.right = node.right.take().map(rotate_right);
        }
        return rotate_left(node);
    }
    node
}

fn rotate_right<T>(mut node: Box<Node<T>>) -> Box<Node<T>> {
    let Some(mut pivot) = node.left.take() else {
        return node;
    };
    node.left = pivot.right.take();
    node.update();
    pivot.right = Some(node);
    pivot.update();
    pivot
}

fn rotate_left<T>(mut node: Box<Node<T>>) -> Box<Node<T>> {
    let Some(mut pivot) = node.right.take() else {
        return node;
    };
    node.right = pivot.left.take();
    node.update();
    pivot.left = Some(node);
    pivot.update();
    pivot
}

fn collect<'a, T>(link: &'a Link<T>, query: &TimeRange, out: &mut Vec<&'a T>) {
    let Some(node) = link else {
        return;
    };
    // Nothing below ends after the query starts.
    if node.max_end <= query.start {
        return;
    }
    collect(&node.left, query, out);
    if node.range.overlaps(query) {
        out.push(&node.payload);
    }
    // Right subtree starts no earlier than this node.
    if node.range.start < query.end {
        collect(&node.right, query, out);
    }
}
