mod common;

use clicktip_shared::{AppEvent, OverlaySurface, Phase, Point, Propagation, Rect, TimerId, WindowId};
use common::*;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

const NO_AUTO_HIDE: Duration = Duration::ZERO;

fn widget_a() -> Rc<dyn clicktip_shared::ReferenceWidget> {
    widget(1, Rect::new(0, 0, 90, 90))
}

fn position(m: &clicktip_shared::OverlayManager<FakePlatform>) -> Point {
    m.surface().map(|s| s.position()).unwrap_or_default()
}

#[test]
fn hide_with_nothing_shown_is_a_no_op() {
    let mut m = manager();
    m.hide();
    m.hide();
    assert_eq!(m.phase(), Phase::Hidden);
    assert_eq!(m.surfaces_created(), 0);
    assert_eq!(m.platform().counters.detaches.get(), 0);
}

#[test]
fn hide_twice_matches_hide_once() {
    let mut m = manager();
    m.show_near(Point::new(100, 100), "hello", None, Duration::from_secs(2))
        .unwrap();
    m.hide();

    let snapshot = |m: &clicktip_shared::OverlayManager<FakePlatform>| {
        (
            m.phase(),
            m.anchor(),
            m.has_reference(),
            m.is_router_attached(),
            m.is_timer_active(TimerId::Proximity),
            m.is_timer_active(TimerId::AutoHide),
            m.platform().counters.detaches.get(),
            m.surface().map(|s| s.is_visible()),
        )
    };
    let once = snapshot(&m);
    m.hide();
    assert_eq!(snapshot(&m), once);
    assert_eq!(once.0, Phase::Hidden);
    assert_eq!(once.6, 1);
    assert_eq!(once.7, Some(false));
}

#[test]
fn teardown_clears_everything() {
    let mut m = manager();
    let a = widget_a();
    m.show_near(Point::new(100, 100), "hello", Some(&a), Duration::from_secs(1))
        .unwrap()
        .on_link_activated(|_| {});
    assert!(m.has_link_listener());

    m.hide();
    assert!(!m.has_reference());
    assert_eq!(m.anchor(), None);
    assert!(!m.is_router_attached());
    assert!(!m.platform().attached);
    assert!(!m.is_timer_active(TimerId::Proximity));
    assert!(!m.is_timer_active(TimerId::AutoHide));
    assert!(!m.platform().is_running(TimerId::Proximity));
    assert!(!m.has_link_listener());
}

#[test]
fn only_one_surface_is_ever_built() {
    let mut m = manager();
    let a = widget_a();
    let b = widget(2, Rect::new(300, 300, 50, 50));
    for i in 0..40 {
        let p = Point::new(i * 37 % 1900, i * 53 % 1000);
        let reference = match i % 3 {
            0 => Some(&a),
            1 => Some(&b),
            _ => None,
        };
        m.show_near(p, &format!("tip {i}"), reference, NO_AUTO_HIDE)
            .unwrap();
        if i % 4 == 0 {
            m.hide();
        }
    }
    assert_eq!(m.surfaces_created(), 1);
    assert_eq!(m.platform().counters.surfaces.get(), 1);
}

#[test]
fn first_show_offsets_from_the_cursor() {
    let mut m = manager();
    m.show_near(Point::new(100, 100), "hello", None, NO_AUTO_HIDE)
        .unwrap();
    assert_eq!(position(&m), Point::new(116, 116));
    assert_eq!(m.phase(), Phase::Visible);
    assert_eq!(m.anchor(), Some(Point::new(100, 100)));
    assert!(m.is_router_attached());
    assert_eq!(
        m.platform().timer_period(TimerId::Proximity),
        Some(Duration::from_millis(250))
    );
    assert!(!m.platform().is_running(TimerId::AutoHide));
}

#[test]
fn show_near_screen_corner_stays_on_screen() {
    let mut m = manager();
    m.show_near(Point::new(1900, 1070), "hello", None, NO_AUTO_HIDE)
        .unwrap();
    let frame = m.surface().unwrap().frame();
    assert!(PRIMARY.contains_rect(&frame), "{frame:?}");
    assert_eq!(frame.right(), PRIMARY.right());
    assert_eq!(frame.bottom(), PRIMARY.bottom());
}

#[test]
fn secondary_monitor_is_respected() {
    let mut m = manager();
    m.show_near(Point::new(3170, 990), "hello", None, NO_AUTO_HIDE)
        .unwrap();
    let frame = m.surface().unwrap().frame();
    assert!(SECONDARY.contains_rect(&frame), "{frame:?}");
}

#[test]
fn point_outside_all_monitors_uses_primary() {
    let mut m = manager();
    m.show_near(Point::new(9000, 9000), "hello", None, NO_AUTO_HIDE)
        .unwrap();
    let frame = m.surface().unwrap().frame();
    assert!(PRIMARY.contains_rect(&frame), "{frame:?}");
}

#[test]
fn same_widget_does_not_jitter() {
    let mut m = manager();
    let a = widget_a();
    m.show_near(Point::new(100, 100), "hello", Some(&a), NO_AUTO_HIDE)
        .unwrap();
    let first = position(&m);
    let moves = m.surface().unwrap().moves;

    m.show_near(Point::new(104, 103), "hello", Some(&a), NO_AUTO_HIDE)
        .unwrap();
    m.show_near(Point::new(96, 108), "hello", Some(&a), NO_AUTO_HIDE)
        .unwrap();
    assert_eq!(position(&m), first);
    assert_eq!(m.surface().unwrap().moves, moves);
}

#[test]
fn longer_content_in_place_is_pulled_back_on_screen() {
    let mut m = manager();
    let corner = widget(3, Rect::new(1780, 980, 40, 40));
    m.show_near(Point::new(1800, 1000), "hello", Some(&corner), NO_AUTO_HIDE)
        .unwrap();
    assert_eq!(position(&m), Point::new(1816, 1016));
    let moves = m.surface().unwrap().moves;

    let longer = "a much longer line of text here";
    m.show_near(Point::new(1802, 1001), longer, Some(&corner), NO_AUTO_HIDE)
        .unwrap();
    let frame = m.surface().unwrap().frame();
    assert!(PRIMARY.contains_rect(&frame), "{frame:?}");
    assert_eq!(frame.right(), PRIMARY.right());
    assert_eq!(frame.y, 1016);
    assert_eq!(m.surface().unwrap().moves, moves + 1);

    // Already on screen: no further correction
    m.show_near(Point::new(1801, 1002), longer, Some(&corner), NO_AUTO_HIDE)
        .unwrap();
    assert_eq!(m.surface().unwrap().moves, moves + 1);
}

#[test]
fn another_widget_repositions() {
    let mut m = manager();
    let a = widget_a();
    let b = widget(2, Rect::new(400, 400, 60, 20));
    m.show_near(Point::new(100, 100), "hello", Some(&a), NO_AUTO_HIDE)
        .unwrap();
    m.show_near(Point::new(410, 410), "hello", Some(&b), NO_AUTO_HIDE)
        .unwrap();
    assert_eq!(position(&m), Point::new(426, 426));
}

#[test]
fn anchor_tolerance_without_reference() {
    let mut m = manager();
    m.show_near(Point::new(100, 100), "hello", None, NO_AUTO_HIDE)
        .unwrap();
    m.show_near(Point::new(105, 104), "hello", None, NO_AUTO_HIDE)
        .unwrap();
    assert_eq!(position(&m), Point::new(116, 116));
    assert_eq!(m.anchor(), Some(Point::new(100, 100)));

    m.show_near(Point::new(120, 100), "hello", None, NO_AUTO_HIDE)
        .unwrap();
    assert_eq!(position(&m), Point::new(136, 116));
    assert_eq!(m.anchor(), Some(Point::new(120, 100)));
}

#[test]
fn showing_again_after_hide_repositions() {
    let mut m = manager();
    m.show_near(Point::new(100, 100), "hello", None, NO_AUTO_HIDE)
        .unwrap();
    m.hide();
    m.show_near(Point::new(102, 100), "hello", None, NO_AUTO_HIDE)
        .unwrap();
    assert_eq!(position(&m), Point::new(118, 116));
}

#[test]
fn pointer_leaving_the_region_hides_on_next_tick() {
    let mut m = manager();
    let a = widget_a();
    move_cursor(&mut m, Point::new(50, 50));
    m.show_near(Point::new(100, 100), "<a href='x'>L</a>", Some(&a), NO_AUTO_HIDE)
        .unwrap();

    move_cursor(&mut m, Point::new(500, 500));
    run_for(&mut m, Duration::from_millis(250));
    assert_eq!(m.phase(), Phase::Hidden);
    assert!(!m.is_router_attached());
    assert!(!m.platform().attached);
}

#[test]
fn exit_is_noticed_within_one_interval() {
    let mut m = manager();
    let a = widget_a();
    move_cursor(&mut m, Point::new(50, 50));
    m.show_near(Point::new(100, 100), "hello", Some(&a), NO_AUTO_HIDE)
        .unwrap();
    run_for(&mut m, Duration::from_millis(130));

    move_cursor(&mut m, Point::new(800, 20));
    run_for(&mut m, Duration::from_millis(120));
    assert_eq!(m.phase(), Phase::Hidden);
}

#[test]
fn travelling_into_the_overlay_keeps_it() {
    let mut m = manager();
    let a = widget_a();
    move_cursor(&mut m, Point::new(50, 50));
    m.show_near(Point::new(100, 100), "<a href='x'>L</a>", Some(&a), NO_AUTO_HIDE)
        .unwrap();

    // Widget, then the overlay margin, then the overlay itself
    for p in [Point::new(85, 85), Point::new(108, 108), Point::new(125, 125)] {
        move_cursor(&mut m, p);
        run_for(&mut m, Duration::from_millis(250));
        assert_eq!(m.phase(), Phase::Visible, "hidden at {p:?}");
    }
}

#[test]
fn auto_hide_fires_after_its_delay() {
    let mut m = manager();
    move_cursor(&mut m, Point::new(100, 100));
    m.show_near(Point::new(100, 100), "hello", None, Duration::from_millis(2000))
        .unwrap();
    assert!(m.is_timer_active(TimerId::AutoHide));

    run_for(&mut m, Duration::from_millis(1990));
    assert_eq!(m.phase(), Phase::Visible);

    run_for(&mut m, Duration::from_millis(20));
    assert_eq!(m.phase(), Phase::Hidden);
    assert!(!m.platform().is_running(TimerId::AutoHide));
}

#[test]
fn new_content_resets_the_auto_hide_timer() {
    let mut m = manager();
    move_cursor(&mut m, Point::new(100, 100));
    m.show_near(Point::new(100, 100), "hello", None, Duration::from_millis(2000))
        .unwrap();
    run_for(&mut m, Duration::from_millis(1500));
    m.show_near(Point::new(100, 100), "hello again", None, NO_AUTO_HIDE)
        .unwrap();
    assert!(!m.is_timer_active(TimerId::AutoHide));

    run_for(&mut m, Duration::from_millis(1500));
    assert_eq!(m.phase(), Phase::Visible);
}

#[test]
fn open_menu_blocks_every_hide() {
    let mut m = manager();
    move_cursor(&mut m, Point::new(100, 100));
    m.show_near(Point::new(100, 100), "hello", None, Duration::from_millis(500))
        .unwrap();
    m.menu_opened();
    assert!(m.is_menu_active());

    move_cursor(&mut m, Point::new(1500, 900));
    run_for(&mut m, Duration::from_secs(3));
    m.handle_event(&AppEvent::PointerPress { target: WindowId(7) });
    m.handle_event(&AppEvent::KeyPress { target: HOST });
    m.handle_event(&AppEvent::Deactivated { window: HOST });
    m.hide();

    assert!(m.is_visible());
    assert!(m.is_router_attached());
    assert_eq!(
        m.phase(),
        Phase::MenuOpen {
            content_changed: false,
            hide_requested: true
        }
    );

    m.menu_closed();
    assert_eq!(m.phase(), Phase::Hidden);
    assert!(!m.is_router_attached());
}

#[test]
fn closing_menu_with_pointer_near_stays_visible() {
    let mut m = manager();
    move_cursor(&mut m, Point::new(120, 120));
    m.show_near(Point::new(100, 100), "hello", None, NO_AUTO_HIDE)
        .unwrap();
    m.menu_opened();
    run_for(&mut m, Duration::from_secs(1));
    m.menu_closed();
    assert_eq!(m.phase(), Phase::Visible);
}

#[test]
fn closing_menu_with_pointer_gone_hides() {
    let mut m = manager();
    move_cursor(&mut m, Point::new(120, 120));
    m.show_near(Point::new(100, 100), "hello", None, NO_AUTO_HIDE)
        .unwrap();
    m.menu_opened();
    move_cursor(&mut m, Point::new(900, 900));
    m.menu_closed();
    assert_eq!(m.phase(), Phase::Hidden);
}

#[test]
fn new_content_during_menu_survives_the_close() {
    let mut m = manager();
    move_cursor(&mut m, Point::new(120, 120));
    m.show_near(Point::new(100, 100), "hello", None, NO_AUTO_HIDE)
        .unwrap();
    m.menu_opened();
    m.handle_event(&AppEvent::PointerPress { target: WindowId(7) });
    m.show_near(Point::new(100, 100), "fresh", None, NO_AUTO_HIDE)
        .unwrap();
    assert_eq!(
        m.phase(),
        Phase::MenuOpen {
            content_changed: true,
            hide_requested: false
        }
    );

    move_cursor(&mut m, Point::new(900, 900));
    m.menu_closed();
    assert_eq!(m.phase(), Phase::Visible);
    assert_eq!(m.surface().unwrap().text, "fresh");
}

#[test]
fn hide_after_new_content_during_menu_wins() {
    let mut m = manager();
    move_cursor(&mut m, Point::new(120, 120));
    m.show_near(Point::new(100, 100), "hello", None, NO_AUTO_HIDE)
        .unwrap();
    m.menu_opened();
    m.show_near(Point::new(100, 100), "fresh", None, NO_AUTO_HIDE)
        .unwrap();
    m.show_near(Point::new(100, 100), "", None, NO_AUTO_HIDE)
        .unwrap();
    assert_eq!(
        m.phase(),
        Phase::MenuOpen {
            content_changed: false,
            hide_requested: true
        }
    );

    m.menu_closed();
    assert_eq!(m.phase(), Phase::Hidden);
    assert!(!m.is_router_attached());
}

#[test]
fn menu_cannot_open_while_hidden() {
    let mut m = manager();
    m.menu_opened();
    assert_eq!(m.phase(), Phase::Hidden);
    m.menu_closed();
    assert_eq!(m.phase(), Phase::Hidden);
}

#[test]
fn outside_press_hides_and_propagates() {
    let mut m = manager();
    m.show_near(Point::new(100, 100), "hello", None, NO_AUTO_HIDE)
        .unwrap();
    let result = m.handle_event(&AppEvent::PointerPress { target: WindowId(42) });
    assert_eq!(result, Propagation::Continue);
    assert_eq!(m.phase(), Phase::Hidden);
}

#[test]
fn presses_on_the_overlay_are_left_alone() {
    let mut m = manager();
    m.show_near(Point::new(100, 100), "hello", None, NO_AUTO_HIDE)
        .unwrap();
    let result = m.handle_event(&AppEvent::PointerPress { target: SURFACE });
    assert_eq!(result, Propagation::Continue);
    m.handle_event(&AppEvent::KeyPress { target: SURFACE });
    assert_eq!(m.phase(), Phase::Visible);
}

#[test]
fn host_deactivation_hides() {
    let mut m = manager();
    m.show_near(Point::new(100, 100), "hello", None, NO_AUTO_HIDE)
        .unwrap();
    m.handle_event(&AppEvent::Deactivated { window: WindowId(55) });
    assert_eq!(m.phase(), Phase::Visible);
    m.handle_event(&AppEvent::Deactivated { window: HOST });
    assert_eq!(m.phase(), Phase::Hidden);
}

#[test]
fn link_activation_forwards_then_hides() {
    let mut m = manager();
    let opened = Rc::new(RefCell::new(Vec::new()));
    let sink = opened.clone();
    m.show_near(Point::new(100, 100), "<a href='x'>L</a>", None, NO_AUTO_HIDE)
        .unwrap()
        .on_link_activated(move |target| sink.borrow_mut().push(target.to_string()));

    let result = m.handle_event(&AppEvent::LinkActivated { target: "x".into() });
    assert_eq!(result, Propagation::Handled);
    assert_eq!(*opened.borrow(), vec!["x".to_string()]);
    assert_eq!(m.phase(), Phase::Hidden);
}

#[test]
fn only_the_latest_listener_is_called() {
    let mut m = manager();
    let hits = Rc::new(RefCell::new(Vec::new()));

    let first = hits.clone();
    m.show_near(Point::new(100, 100), "<a href='a'>A</a>", None, NO_AUTO_HIDE)
        .unwrap()
        .on_link_activated(move |t| first.borrow_mut().push(format!("first {t}")));
    let second = hits.clone();
    m.show_near(Point::new(100, 100), "<a href='b'>B</a>", None, NO_AUTO_HIDE)
        .unwrap()
        .on_link_activated(move |t| second.borrow_mut().push(format!("second {t}")));

    m.handle_event(&AppEvent::LinkActivated { target: "b".into() });
    assert_eq!(*hits.borrow(), vec!["second b".to_string()]);
}

#[test]
fn reshow_without_listener_disconnects_the_old_one() {
    let mut m = manager();
    let hits = Rc::new(RefCell::new(0));
    let counter = hits.clone();
    m.show_near(Point::new(100, 100), "<a href='a'>A</a>", None, NO_AUTO_HIDE)
        .unwrap()
        .on_link_activated(move |_| *counter.borrow_mut() += 1);
    m.show_near(Point::new(100, 100), "<a href='a'>A</a>", None, NO_AUTO_HIDE)
        .unwrap();
    assert!(!m.has_link_listener());

    m.handle_event(&AppEvent::LinkActivated { target: "a".into() });
    assert_eq!(*hits.borrow(), 0);
    assert_eq!(m.phase(), Phase::Hidden);
}

#[test]
fn blank_text_is_a_hide_request() {
    let mut m = manager();
    m.show_near(Point::new(100, 100), "hello", None, NO_AUTO_HIDE)
        .unwrap();
    let handle = m.show_near(Point::new(100, 100), "  ", None, NO_AUTO_HIDE).unwrap();
    assert!(!handle.is_visible());
    assert_eq!(m.phase(), Phase::Hidden);

    let handle = m.show_near(Point::new(100, 100), "", None, NO_AUTO_HIDE).unwrap();
    assert!(!handle.is_visible());
    assert_eq!(m.surfaces_created(), 1);
}

#[test]
fn events_while_hidden_are_ignored() {
    let mut m = manager();
    let result = m.handle_event(&AppEvent::LinkActivated { target: "x".into() });
    assert_eq!(result, Propagation::Continue);
    m.on_timer(TimerId::Proximity);
    m.on_timer(TimerId::AutoHide);
    assert_eq!(m.phase(), Phase::Hidden);
}

#[test]
fn router_is_attached_once_per_visible_period() {
    let mut m = manager();
    for x in [100, 300, 500] {
        m.show_near(Point::new(x, 100), "hello", None, NO_AUTO_HIDE)
            .unwrap();
    }
    assert_eq!(m.platform().counters.attaches.get(), 1);
    m.hide();
    m.show_near(Point::new(100, 100), "hello", None, NO_AUTO_HIDE)
        .unwrap();
    assert_eq!(m.platform().counters.attaches.get(), 2);
    assert_eq!(m.platform().counters.detaches.get(), 1);
}

#[test]
fn failed_attach_still_dismisses_by_proximity() {
    let mut m = manager();
    m.platform_mut().fail_attach = true;
    move_cursor(&mut m, Point::new(100, 100));
    m.show_near(Point::new(100, 100), "hello", None, NO_AUTO_HIDE)
        .unwrap();
    assert!(m.is_visible());
    assert!(!m.is_router_attached());

    move_cursor(&mut m, Point::new(700, 700));
    run_for(&mut m, Duration::from_millis(250));
    assert_eq!(m.phase(), Phase::Hidden);
    assert_eq!(m.platform().counters.detaches.get(), 0);
}

#[test]
fn failed_attach_still_activates_links() {
    let mut m = manager();
    m.platform_mut().fail_attach = true;
    let hits = Rc::new(RefCell::new(Vec::new()));
    let sink = hits.clone();
    m.show_near(Point::new(100, 100), "<a href='x'>L</a>", None, NO_AUTO_HIDE)
        .unwrap()
        .on_link_activated(move |t| sink.borrow_mut().push(t.to_string()));
    assert!(!m.is_router_attached());

    // Interception is gone, but the surface's own clicks still count
    m.handle_event(&AppEvent::PointerPress { target: WindowId(7) });
    assert_eq!(m.phase(), Phase::Visible);

    let result = m.handle_event(&AppEvent::LinkActivated { target: "x".into() });
    assert_eq!(result, Propagation::Handled);
    assert_eq!(*hits.borrow(), vec!["x".to_string()]);
    assert_eq!(m.phase(), Phase::Hidden);
}

#[test]
fn dropped_reference_widget_shrinks_the_region() {
    let mut m = manager();
    let a = widget_a();
    move_cursor(&mut m, Point::new(50, 50));
    m.show_near(Point::new(100, 100), "hello", Some(&a), NO_AUTO_HIDE)
        .unwrap();
    run_for(&mut m, Duration::from_millis(250));
    assert_eq!(m.phase(), Phase::Visible);

    drop(a);
    run_for(&mut m, Duration::from_millis(250));
    assert_eq!(m.phase(), Phase::Hidden);
}

#[test]
fn dropping_the_manager_detaches_the_router() {
    let mut m = manager();
    let counters = m.platform().counters.clone();
    m.show_near(Point::new(100, 100), "hello", None, NO_AUTO_HIDE)
        .unwrap();
    drop(m);
    assert_eq!(counters.attaches.get(), 1);
    assert_eq!(counters.detaches.get(), 1);
}
