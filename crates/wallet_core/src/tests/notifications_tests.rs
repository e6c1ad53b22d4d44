use super::*;

fn center() -> (NotificationCenter, broadcast::Receiver<ControllerEvent>) {
    let (events, rx) = broadcast::channel(16);
    (NotificationCenter::new(Duration::from_secs(5), events), rx)
}

#[tokio::test(start_paused = true)]
async fn notification_dismisses_itself_after_ttl() {
    let (center, mut rx) = center();

    let shown = center.success("Wallet connected successfully!");
    assert_eq!(shown.kind, NotificationKind::Success);
    match rx.recv().await.expect("event") {
        ControllerEvent::Notification(n) => assert_eq!(n, shown),
        other => panic!("unexpected event: {other:?}"),
    }

    tokio::time::sleep(Duration::from_secs(4)).await;
    assert_eq!(center.visible(), Some(shown.clone()));

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(center.visible().is_none());
    match rx.recv().await.expect("event") {
        ControllerEvent::NotificationDismissed(id) => assert_eq!(id, shown.id),
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn new_notification_replaces_previous_and_outlives_its_timer() {
    let (center, mut rx) = center();

    let first = center.error("Please connect your wallet.");
    tokio::time::sleep(Duration::from_secs(3)).await;
    let second = center.success("Account changed");
    assert_eq!(center.visible(), Some(second.clone()));

    // first timer fires at t=5 but must not remove the replacement
    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(center.visible(), Some(second.clone()));

    tokio::time::sleep(Duration::from_secs(3)).await;
    assert!(center.visible().is_none());

    let mut dismissed = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let ControllerEvent::NotificationDismissed(id) = event {
            dismissed.push(id);
        }
    }
    assert_eq!(dismissed, vec![second.id]);
    assert_ne!(first.id, second.id);
}

#[tokio::test]
async fn clear_hides_visible_notification_and_announces_it() {
    let (center, mut rx) = center();
    let shown = center.error("Wallet disconnected");
    center.clear();
    assert!(center.visible().is_none());

    let events: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok()).collect();
    assert_eq!(
        events,
        vec![
            ControllerEvent::Notification(shown.clone()),
            ControllerEvent::NotificationDismissed(shown.id),
        ]
    );

    // nothing visible: no second dismissal
    center.clear();
    assert!(rx.try_recv().is_err());
}
