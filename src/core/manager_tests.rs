// Author: Dustin Pilgrim
// License: MIT

use crate::core::action::{Action, LiveUpdate};
use crate::core::events::{Event, TabInfo};
use crate::core::manager::Manager;
use crate::core::state::{TabId, TableSnapshot, TimerHandle, TrackingTable};

const X: &str = "https://x.example/";
const Y: &str = "https://y.example/";
const Z: &str = "https://z.example/";

fn flushes(actions: &[Action]) -> Vec<(TabId, String, u64)> {
    actions
        .iter()
        .filter_map(|a| match a {
            Action::Flush {
                tab_id,
                url,
                duration_ms,
            } => Some((*tab_id, url.clone(), *duration_ms)),
            _ => None,
        })
        .collect()
}

fn persists(actions: &[Action]) -> usize {
    actions.iter().filter(|a| **a == Action::Persist).count()
}

fn start(mgr: &mut Manager, table: &mut TrackingTable, tab_id: TabId, url: &str, now_ms: u64) -> TimerHandle {
    let actions = mgr.handle_event(
        table,
        Event::StartTracking {
            tab_id,
            url: Some(url.to_string()),
            now_ms,
        },
    );

    match actions.first() {
        Some(Action::StartTicker { tab_id: t, handle }) if *t == tab_id => *handle,
        other => panic!("expected StartTicker, got {other:?}"),
    }
}

fn tick(
    mgr: &mut Manager,
    table: &mut TrackingTable,
    tab_id: TabId,
    handle: TimerHandle,
    live_url: &str,
    now_ms: u64,
) -> Vec<Action> {
    mgr.handle_event(
        table,
        Event::Tick {
            tab_id,
            handle,
            live_url: Some(live_url.to_string()),
            now_ms,
        },
    )
}

fn open(mgr: &mut Manager, table: &mut TrackingTable, tab_id: TabId, url: &str, now_ms: u64) {
    mgr.handle_event(
        table,
        Event::TabOpened {
            tab_id,
            url: Some(url.to_string()),
            now_ms,
        },
    );
}

// ---------------- reconciler rows ----------------

#[test]
fn start_enters_tracking_and_persists() {
    let mut mgr = Manager::default();
    let mut table = TrackingTable::new();

    let actions = mgr.handle_event(
        &mut table,
        Event::StartTracking {
            tab_id: 1,
            url: Some(X.into()),
            now_ms: 500,
        },
    );

    assert!(matches!(actions[0], Action::StartTicker { tab_id: 1, .. }));
    assert_eq!(persists(&actions), 1);

    let entry = table.get(1).expect("entry");
    assert!(entry.is_tracking());
    assert_eq!(entry.accrual_start_ms(), Some(500));
    assert_eq!(entry.url(), Some(X));
}

#[test]
fn start_while_tracking_is_a_noop() {
    let mut mgr = Manager::default();
    let mut table = TrackingTable::new();
    let h = start(&mut mgr, &mut table, 1, X, 0);

    let actions = mgr.handle_event(
        &mut table,
        Event::StartTracking {
            tab_id: 1,
            url: Some(X.into()),
            now_ms: 4_000,
        },
    );

    assert!(actions.is_empty());
    assert_eq!(table.get(1).unwrap().timer(), Some(h));
    assert_eq!(table.get(1).unwrap().accrual_start_ms(), Some(0));
}

#[test]
fn stop_flushes_and_leaves_untracked() {
    let mut mgr = Manager::default();
    let mut table = TrackingTable::new();
    start(&mut mgr, &mut table, 1, X, 1_000);

    let actions = mgr.handle_event(&mut table, Event::StopTracking { tab_id: 1, now_ms: 4_500 });

    assert_eq!(flushes(&actions), vec![(1, X.to_string(), 3_500)]);
    assert!(actions.contains(&Action::StopTicker { tab_id: 1 }));
    assert_eq!(persists(&actions), 1);

    let entry = table.get(1).unwrap();
    assert!(!entry.enabled());
    assert_eq!(entry.accrual_start_ms(), None);
    assert_eq!(entry.timer(), None);
}

#[test]
fn stop_on_untracked_tab_does_nothing() {
    let mut mgr = Manager::default();
    let mut table = TrackingTable::new();
    open(&mut mgr, &mut table, 1, X, 0);

    let actions = mgr.handle_event(&mut table, Event::StopTracking { tab_id: 1, now_ms: 10 });
    assert!(actions.is_empty());

    let actions = mgr.handle_event(&mut table, Event::StopTracking { tab_id: 99, now_ms: 10 });
    assert!(actions.is_empty());
}

#[test]
fn zero_length_stop_flushes_nothing() {
    let mut mgr = Manager::default();
    let mut table = TrackingTable::new();
    start(&mut mgr, &mut table, 1, X, 7_000);

    let actions = mgr.handle_event(&mut table, Event::StopTracking { tab_id: 1, now_ms: 7_000 });
    assert!(flushes(&actions).is_empty());
    assert!(!table.get(1).unwrap().enabled());
}

#[test]
fn open_creates_untracked_entry() {
    let mut mgr = Manager::default();
    let mut table = TrackingTable::new();

    let actions = mgr.handle_event(
        &mut table,
        Event::TabOpened {
            tab_id: 3,
            url: Some(Y.into()),
            now_ms: 0,
        },
    );

    assert_eq!(actions, vec![Action::Persist]);
    let entry = table.get(3).unwrap();
    assert!(!entry.enabled());
    assert_eq!(entry.url(), Some(Y));
}

#[test]
fn reopening_tracked_tab_on_new_url_closes_old_window() {
    let mut mgr = Manager::default();
    let mut table = TrackingTable::new();
    let h = start(&mut mgr, &mut table, 1, X, 0);

    let actions = mgr.handle_event(
        &mut table,
        Event::TabOpened {
            tab_id: 1,
            url: Some(Y.into()),
            now_ms: 8_000,
        },
    );

    assert_eq!(flushes(&actions), vec![(1, X.to_string(), 8_000)]);
    assert_eq!(persists(&actions), 1);
    assert_eq!(table.get(1).unwrap().url(), Some(Y));
    assert_eq!(table.get(1).unwrap().accrual_start_ms(), Some(8_000));

    let actions = tick(&mut mgr, &mut table, 1, h, Y, 18_000);
    assert_eq!(flushes(&actions), vec![(1, Y.to_string(), 10_000)]);
}

#[test]
fn reopening_tracked_tab_on_same_url_keeps_window() {
    let mut mgr = Manager::default();
    let mut table = TrackingTable::new();
    start(&mut mgr, &mut table, 1, X, 0);

    let actions = mgr.handle_event(
        &mut table,
        Event::TabOpened {
            tab_id: 1,
            url: Some(X.into()),
            now_ms: 8_000,
        },
    );

    assert!(actions.is_empty());
    assert_eq!(table.get(1).unwrap().accrual_start_ms(), Some(0));
}

#[test]
fn start_on_tracking_tab_with_new_url_closes_old_window() {
    let mut mgr = Manager::default();
    let mut table = TrackingTable::new();
    let h = start(&mut mgr, &mut table, 1, X, 0);

    let actions = mgr.handle_event(
        &mut table,
        Event::StartTracking {
            tab_id: 1,
            url: Some(Y.into()),
            now_ms: 2_000,
        },
    );

    assert_eq!(flushes(&actions), vec![(1, X.to_string(), 2_000)]);
    assert!(!actions.iter().any(|a| matches!(a, Action::StartTicker { .. })));
    assert_eq!(table.get(1).unwrap().timer(), Some(h));
    assert_eq!(table.get(1).unwrap().url(), Some(Y));
}

#[test]
fn url_change_on_untracked_tab_updates_url_only() {
    let mut mgr = Manager::default();
    let mut table = TrackingTable::new();
    open(&mut mgr, &mut table, 2, X, 0);

    let actions = mgr.handle_event(
        &mut table,
        Event::TabUpdated {
            tab_id: 2,
            url: Some(Y.into()),
            now_ms: 100,
        },
    );

    assert!(flushes(&actions).is_empty());
    assert_eq!(table.get(2).unwrap().url(), Some(Y));
    assert!(!table.get(2).unwrap().enabled());
}

#[test]
fn update_without_url_changes_nothing() {
    let mut mgr = Manager::default();
    let mut table = TrackingTable::new();
    start(&mut mgr, &mut table, 1, X, 0);

    let actions = mgr.handle_event(
        &mut table,
        Event::TabUpdated {
            tab_id: 1,
            url: None,
            now_ms: 3_000,
        },
    );

    assert!(actions.is_empty());
    assert_eq!(table.get(1).unwrap().accrual_start_ms(), Some(0));
}

#[test]
fn removing_untracked_tab_deletes_entry() {
    let mut mgr = Manager::default();
    let mut table = TrackingTable::new();
    open(&mut mgr, &mut table, 5, X, 0);

    let actions = mgr.handle_event(&mut table, Event::TabRemoved { tab_id: 5, now_ms: 10 });

    assert!(flushes(&actions).is_empty());
    assert!(!actions.contains(&Action::StopTicker { tab_id: 5 }));
    assert!(!table.contains(5));
}

#[test]
fn activating_tracked_tab_flushes_it_and_keeps_ticker() {
    let mut mgr = Manager::default();
    let mut table = TrackingTable::new();
    let h = start(&mut mgr, &mut table, 1, X, 0);

    let actions = mgr.handle_event(
        &mut table,
        Event::TabActivated {
            tab_id: 1,
            url: Some(X.into()),
            now_ms: 4_000,
        },
    );

    assert_eq!(flushes(&actions), vec![(1, X.to_string(), 4_000)]);
    assert!(!actions.iter().any(|a| matches!(a, Action::StartTicker { .. })));
    assert_eq!(table.get(1).unwrap().accrual_start_ms(), Some(4_000));
    assert_eq!(table.get(1).unwrap().timer(), Some(h));
}

#[test]
fn activating_enabled_tab_without_ticker_restarts_it() {
    let mut mgr = Manager::default();
    let mut table = TrackingTable::new();

    let mut snap = TableSnapshot::default();
    snap.tracking_enabled.insert(1, true);
    snap.start_time.insert(1, 1_000);
    snap.tab_urls.insert(1, X.into());
    table.restore(snap);

    let actions = mgr.handle_event(
        &mut table,
        Event::TabActivated {
            tab_id: 1,
            url: Some(X.into()),
            now_ms: 9_000,
        },
    );

    assert!(actions.iter().any(|a| matches!(a, Action::StartTicker { tab_id: 1, .. })));
    assert!(table.get(1).unwrap().is_tracking());
    assert_eq!(table.get(1).unwrap().accrual_start_ms(), Some(1_000));
}

#[test]
fn suspend_flushes_every_tracked_tab() {
    let mut mgr = Manager::default();
    let mut table = TrackingTable::new();
    start(&mut mgr, &mut table, 1, X, 0);
    start(&mut mgr, &mut table, 2, Y, 1_000);
    open(&mut mgr, &mut table, 3, Z, 0);

    let actions = mgr.handle_event(&mut table, Event::Suspending { now_ms: 6_000 });

    let mut got = flushes(&actions);
    got.sort();
    assert_eq!(got, vec![(1, X.to_string(), 6_000), (2, Y.to_string(), 5_000)]);
    assert_eq!(persists(&actions), 1);

    // tracking survives a suspend
    assert!(table.get(1).unwrap().is_tracking());
    assert_eq!(table.get(2).unwrap().accrual_start_ms(), Some(6_000));
}

#[test]
fn sync_seeds_refreshes_and_removes() {
    let mut mgr = Manager::default();
    let mut table = TrackingTable::new();
    start(&mut mgr, &mut table, 1, X, 0);
    open(&mut mgr, &mut table, 2, Y, 0);

    let actions = mgr.handle_event(
        &mut table,
        Event::TabsSynced {
            tabs: vec![
                TabInfo {
                    id: 2,
                    url: Some(Z.into()),
                },
                TabInfo { id: 4, url: None },
            ],
            now_ms: 8_000,
        },
    );

    // tab 1 vanished while tracking
    assert_eq!(flushes(&actions), vec![(1, X.to_string(), 8_000)]);
    assert!(actions.contains(&Action::StopTicker { tab_id: 1 }));
    assert!(!table.contains(1));

    assert_eq!(table.get(2).unwrap().url(), Some(Z));
    assert!(table.contains(4));
    assert!(!table.get(4).unwrap().enabled());
}

#[test]
fn sync_flushes_drifted_url_under_old_url() {
    let mut mgr = Manager::default();
    let mut table = TrackingTable::new();
    start(&mut mgr, &mut table, 1, X, 0);

    let actions = mgr.handle_event(
        &mut table,
        Event::TabsSynced {
            tabs: vec![TabInfo {
                id: 1,
                url: Some(Y.into()),
            }],
            now_ms: 2_000,
        },
    );

    assert_eq!(flushes(&actions), vec![(1, X.to_string(), 2_000)]);
    let entry = table.get(1).unwrap();
    assert_eq!(entry.url(), Some(Y));
    assert!(entry.is_tracking());
}

// ---------------- accrual ----------------

#[test]
fn tick_below_period_only_publishes() {
    let mut mgr = Manager::new(10_000);
    let mut table = TrackingTable::new();
    let h = start(&mut mgr, &mut table, 1, X, 0);

    let actions = tick(&mut mgr, &mut table, 1, h, X, 3_400);
    assert_eq!(
        actions,
        vec![Action::Publish(LiveUpdate {
            tab_id: 1,
            url: X.into(),
            hours: 0,
            minutes: 0,
            seconds: 3,
        })]
    );
}

#[test]
fn stale_tick_is_ignored() {
    let mut mgr = Manager::new(10_000);
    let mut table = TrackingTable::new();
    let old = start(&mut mgr, &mut table, 1, X, 0);
    mgr.handle_event(&mut table, Event::StopTracking { tab_id: 1, now_ms: 1_000 });
    let new = start(&mut mgr, &mut table, 1, X, 2_000);
    assert_ne!(old, new);

    assert!(tick(&mut mgr, &mut table, 1, old, X, 50_000).is_empty());
    assert_eq!(table.get(1).unwrap().accrual_start_ms(), Some(2_000));
}

#[test]
fn tick_with_drifted_url_waits_for_update() {
    let mut mgr = Manager::new(10_000);
    let mut table = TrackingTable::new();
    let h = start(&mut mgr, &mut table, 1, X, 0);

    assert!(tick(&mut mgr, &mut table, 1, h, Y, 20_000).is_empty());
    assert_eq!(table.get(1).unwrap().accrual_start_ms(), Some(0));
}

#[test]
fn late_tick_flushes_whole_window() {
    let mut mgr = Manager::new(10_000);
    let mut table = TrackingTable::new();
    let h = start(&mut mgr, &mut table, 1, X, 0);

    let actions = tick(&mut mgr, &mut table, 1, h, X, 27_000);
    assert_eq!(flushes(&actions), vec![(1, X.to_string(), 27_000)]);
    assert_eq!(table.get(1).unwrap().accrual_start_ms(), Some(27_000));
}

#[test]
fn negative_window_is_rejected_and_reset() {
    let mut mgr = Manager::new(10_000);
    let mut table = TrackingTable::new();
    let h = start(&mut mgr, &mut table, 1, X, 50_000);

    let actions = tick(&mut mgr, &mut table, 1, h, X, 40_000);
    assert!(flushes(&actions).is_empty());
    assert_eq!(mgr.rejected_intervals(), 1);
    assert_eq!(table.get(1).unwrap().accrual_start_ms(), Some(40_000));

    // closing paths refuse too
    let actions = mgr.handle_event(&mut table, Event::StopTracking { tab_id: 1, now_ms: 30_000 });
    assert!(flushes(&actions).is_empty());
    assert_eq!(mgr.rejected_intervals(), 2);
    assert!(!table.get(1).unwrap().enabled());
}

// ---------------- scenarios ----------------

#[test]
fn scenario_close_after_25_seconds() {
    let mut mgr = Manager::new(10_000);
    let mut table = TrackingTable::new();
    let h = start(&mut mgr, &mut table, 1, X, 0);

    let mut recorded = Vec::new();
    for s in 1..25u64 {
        recorded.extend(flushes(&tick(&mut mgr, &mut table, 1, h, X, s * 1_000)));
    }
    let closed = mgr.handle_event(&mut table, Event::TabRemoved { tab_id: 1, now_ms: 25_000 });
    recorded.extend(flushes(&closed));
    assert!(closed.contains(&Action::StopTicker { tab_id: 1 }));

    assert_eq!(
        recorded,
        vec![
            (1, X.to_string(), 10_000),
            (1, X.to_string(), 10_000),
            (1, X.to_string(), 5_000),
        ]
    );
    let total: u64 = recorded.iter().map(|r| r.2).sum();
    assert!((20_000..=25_000).contains(&total));

    // nothing after the close
    assert!(tick(&mut mgr, &mut table, 1, h, X, 26_000).is_empty());
}

#[test]
fn scenario_activating_other_tab_splits_window() {
    let mut mgr = Manager::new(10_000);
    let mut table = TrackingTable::new();
    start(&mut mgr, &mut table, 1, X, 0);
    open(&mut mgr, &mut table, 2, Y, 0);

    let actions = mgr.handle_event(
        &mut table,
        Event::TabActivated {
            tab_id: 2,
            url: Some(Y.into()),
            now_ms: 5_000,
        },
    );

    assert_eq!(flushes(&actions), vec![(1, X.to_string(), 5_000)]);
    let one = table.get(1).unwrap();
    assert!(one.is_tracking());
    assert_eq!(one.accrual_start_ms(), Some(5_000));
    assert!(!table.get(2).unwrap().enabled());
}

#[test]
fn scenario_navigation_attributes_to_new_url() {
    let mut mgr = Manager::new(10_000);
    let mut table = TrackingTable::new();
    let h = start(&mut mgr, &mut table, 1, X, 0);

    let actions = mgr.handle_event(
        &mut table,
        Event::TabUpdated {
            tab_id: 1,
            url: Some(Y.into()),
            now_ms: 3_000,
        },
    );
    assert_eq!(flushes(&actions), vec![(1, X.to_string(), 3_000)]);

    let actions = tick(&mut mgr, &mut table, 1, h, Y, 13_000);
    assert_eq!(flushes(&actions), vec![(1, Y.to_string(), 10_000)]);
}

#[test]
fn scenario_restart_resumes_from_stored_start() {
    const T0: u64 = 1_700_000_000_000;

    let mut mgr = Manager::new(10_000);
    let mut table = TrackingTable::new();

    let mut snap = TableSnapshot::default();
    snap.tracking_enabled.insert(1, true);
    snap.start_time.insert(1, T0);
    snap.tab_urls.insert(1, Z.into());

    let resume = table.restore(snap);
    let actions = mgr.resume_restored(&mut table, &resume);

    let h = match actions.as_slice() {
        [Action::StartTicker { tab_id: 1, handle }] => *handle,
        other => panic!("expected one StartTicker, got {other:?}"),
    };

    let actions = tick(&mut mgr, &mut table, 1, h, Z, T0 + 40_000);
    assert_eq!(flushes(&actions), vec![(1, Z.to_string(), 40_000)]);
}

#[test]
fn status_reports_pending_time() {
    let mut mgr = Manager::new(10_000);
    let mut table = TrackingTable::new();
    start(&mut mgr, &mut table, 1, X, 1_000);
    open(&mut mgr, &mut table, 2, Y, 0);

    let status = mgr.status(&table, 4_000);
    assert_eq!(status.tracking_count(), 1);
    assert_eq!(status.flush_period_ms, 10_000);

    let one = status.tabs.iter().find(|t| t.tab_id == 1).unwrap();
    assert_eq!(one.pending_ms, 3_000);
    let two = status.tabs.iter().find(|t| t.tab_id == 2).unwrap();
    assert_eq!(two.pending_ms, 0);
    assert!(status.pretty().contains("1 tracking"));
}
