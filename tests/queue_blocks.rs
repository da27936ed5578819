// tests/queue_blocks.rs
use kinescript::{Action, ActionIds, ActionQueue};

fn filled_queue(ids: &ActionIds, count: usize) -> ActionQueue {
    let mut queue = ActionQueue::new();
    for _ in 0..count {
        queue.enqueue(Action::wait(ids, 100));
    }
    queue
}

#[test]
fn non_draining_reads_are_idempotent() {
    let ids = ActionIds::new();
    let mut queue = filled_queue(&ids, 3);

    let first = queue.peek_all(false);
    let second = queue.peek_all(false);
    assert_eq!(first, second);
    assert_eq!(queue.len(), 3);
}

#[test]
fn draining_removes_exactly_the_returned_prefix() {
    let ids = ActionIds::new();
    let mut queue = ActionQueue::new();
    for _ in 0..2 {
        queue.enqueue(Action::wait(&ids, 100));
    }
    queue.close_block();
    queue.enqueue(Action::wait(&ids, 100));

    let block = queue.peek_block(true);
    assert_eq!(block.len(), 2);
    assert_eq!(queue.len(), 1);

    // Whatever remains is now the open tail; with no boundary recorded,
    // peek_block returns it all.
    let rest = queue.peek_block(false);
    assert_eq!(rest.len(), 1);
    assert_eq!(queue.len(), 1);
}

#[test]
fn fifo_order_is_preserved() {
    let ids = ActionIds::new();
    let mut queue = ActionQueue::new();
    let first = Action::speed_to(&ids, 10.0);
    let second = Action::speed_to(&ids, 20.0);
    let third = Action::speed_to(&ids, 30.0);
    let expected_ids = [first.id(), second.id(), third.id()];
    queue.enqueue(first);
    queue.enqueue(second);
    queue.enqueue(third);

    let read: Vec<u32> = queue.peek_all(false).iter().map(|a| a.id()).collect();
    assert_eq!(read, expected_ids);
}

#[test]
fn blocks_are_returned_oldest_first() {
    let ids = ActionIds::new();
    let mut queue = ActionQueue::new();
    queue.enqueue(Action::wait(&ids, 1));
    queue.close_block();
    queue.enqueue(Action::wait(&ids, 2));
    queue.enqueue(Action::wait(&ids, 3));
    queue.close_block();

    assert_eq!(queue.peek_block(true).len(), 1);
    assert_eq!(queue.peek_block(true).len(), 2);
    assert!(queue.is_empty());
}

#[test]
fn closing_an_empty_block_records_nothing() {
    let ids = ActionIds::new();
    let mut queue = filled_queue(&ids, 2);
    queue.close_block();
    queue.close_block();

    assert_eq!(queue.peek_block(true).len(), 2);
    assert!(queue.peek_block(false).is_empty());
}

#[test]
fn peek_all_drain_clears_blocks_too() {
    let ids = ActionIds::new();
    let mut queue = filled_queue(&ids, 2);
    queue.close_block();
    queue.enqueue(Action::wait(&ids, 100));

    let all = queue.peek_all(true);
    assert_eq!(all.len(), 3);
    assert!(queue.is_empty());
    assert!(queue.peek_block(false).is_empty());
}
