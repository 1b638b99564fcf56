use super::*;

#[test]
fn fires_in_due_then_schedule_order() {
    let mut q = TimerQueue::new();
    q.schedule(Millis(500), TimerEvent::SampleAddWindow);
    q.schedule(Millis(100), TimerEvent::Spawn);
    q.schedule(Millis(100), TimerEvent::SampleRemoveWindow);

    assert_eq!(q.pop_due(Millis(99)), None);
    assert_eq!(q.pop_due(Millis(100)).map(|(_, e)| e), Some(TimerEvent::Spawn));
    assert_eq!(
        q.pop_due(Millis(100)).map(|(_, e)| e),
        Some(TimerEvent::SampleRemoveWindow)
    );
    assert_eq!(q.pop_due(Millis(499)), None);
    assert_eq!(q.next_due(), Some(Millis(500)));
    assert!(q.pop_due(Millis(10_000)).is_some());
    assert_eq!(q.pending(), 0);
}

#[test]
fn cancel_is_one_shot() {
    let mut q = TimerQueue::new();
    let id = q.schedule(Millis(10), TimerEvent::HoldExpired(ElementId(4)));
    assert!(q.has_pending(TimerEvent::HoldExpired(ElementId(4))));
    assert!(q.cancel(id));
    assert!(!q.cancel(id));
    assert_eq!(q.pop_due(Millis(100)), None);
}

#[test]
fn cancel_all_reports_pending_and_empties() {
    let mut q = TimerQueue::new();
    for i in 0..4 {
        q.schedule(Millis(i * 10), TimerEvent::Spawn);
    }
    assert_eq!(q.cancel_all(), 4);
    assert_eq!(q.cancel_all(), 0);
    assert_eq!(q.next_due(), None);
}
