// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn fifo_order_preserved() {
    let mut q = JobQueue::new();
    let a = JobId::new();
    let b = JobId::new();
    let c = JobId::new();
    q.push_back(a);
    q.push_back(b);
    q.push_back(c);
    assert_eq!(q.pop_front(), Some(a));
    assert_eq!(q.pop_front(), Some(b));
    assert_eq!(q.pop_front(), Some(c));
    assert_eq!(q.pop_front(), None);
}

#[test]
fn position_is_one_based_and_recomputed_after_dequeue() {
    let mut q = JobQueue::new();
    let a = JobId::new();
    let b = JobId::new();
    q.push_back(a);
    q.push_back(b);
    assert_eq!(q.position_of(&a), Some(1));
    assert_eq!(q.position_of(&b), Some(2));
    q.pop_front();
    assert_eq!(q.position_of(&b), Some(1));
}

#[test]
fn remove_cancels_from_middle_of_queue() {
    let mut q = JobQueue::new();
    let a = JobId::new();
    let b = JobId::new();
    let c = JobId::new();
    q.push_back(a);
    q.push_back(b);
    q.push_back(c);
    assert!(q.remove(&b));
    assert_eq!(q.len(), 2);
    assert_eq!(q.position_of(&c), Some(2));
    assert!(!q.remove(&b));
}
