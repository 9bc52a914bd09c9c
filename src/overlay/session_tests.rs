//! Unit tests for the interaction state machine.

use proptest::prelude::*;

use super::*;

type Locked = fn(&HighlightId) -> bool;

fn unlocked(_: &HighlightId) -> bool {
    false
}

fn ctx(store: &mut HighlightStore) -> GestureContext<'_, Locked> {
    GestureContext {
        store,
        page_number: 1,
        limits: SizeLimits::default(),
        draw_threshold: 1.0,
        is_locked: unlocked,
    }
}

fn id(s: &str) -> HighlightId {
    HighlightId::Server(s.into())
}

fn highlight(name: &str, rect: HighlightRect) -> Highlight {
    Highlight {
        id: id(name),
        document_id: "doc".into(),
        page_number: 1,
        rect,
        color: "#FFFF00".into(),
        owner_ref: None,
    }
}

fn store_with(name: &str, rect: HighlightRect) -> HighlightStore {
    let mut store = HighlightStore::new();
    store.upsert(highlight(name, rect));
    store
}

fn p(x: f32, y: f32) -> PagePoint {
    PagePoint::new(x, y)
}

fn close(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-3
}

#[test]
fn test_draw_commits_box_between_anchor_and_pointer() {
    let mut store = HighlightStore::new();
    let mut session = InteractionSession::new();
    session.set_highlight_mode(true, &mut store);
    let mut ctx = ctx(&mut store);

    session.handle(PointerKind::Down, p(10.0, 12.5), &PointerTarget::Canvas, &mut ctx);
    assert_eq!(session.mode().name(), "drawing");
    session.handle(PointerKind::Move, p(25.0, 20.0), &PointerTarget::Canvas, &mut ctx);
    let gesture = session.handle(PointerKind::Up, p(30.0, 25.0), &PointerTarget::Canvas, &mut ctx);

    let Some(Gesture::Drawn(rect)) = gesture else {
        panic!("expected a drawn gesture, got {:?}", gesture);
    };
    assert!(close(rect.center_x, 20.0));
    assert!(close(rect.center_y, 18.75));
    assert!(close(rect.width, 20.0));
    assert!(close(rect.height, 12.5));
    assert!(session.mode().is_idle());
}

#[test]
fn test_draw_in_reverse_direction_uses_absolute_size() {
    let mut store = HighlightStore::new();
    let mut session = InteractionSession::new();
    session.set_highlight_mode(true, &mut store);
    let mut ctx = ctx(&mut store);

    session.handle(PointerKind::Down, p(30.0, 25.0), &PointerTarget::Canvas, &mut ctx);
    let gesture = session.handle(PointerKind::Up, p(10.0, 12.5), &PointerTarget::Canvas, &mut ctx);
    assert!(matches!(gesture, Some(Gesture::Drawn(r)) if close(r.width, 20.0) && close(r.height, 12.5)));
}

#[test]
fn test_draw_below_threshold_is_discarded() {
    let mut store = HighlightStore::new();
    let mut session = InteractionSession::new();
    session.set_highlight_mode(true, &mut store);
    let mut ctx = ctx(&mut store);

    session.handle(PointerKind::Down, p(10.0, 10.0), &PointerTarget::Canvas, &mut ctx);
    let gesture = session.handle(PointerKind::Up, p(30.0, 10.5), &PointerTarget::Canvas, &mut ctx);
    assert!(gesture.is_none());
    assert!(session.mode().is_idle());
}

#[test]
fn test_draw_clamps_pointer_to_page() {
    let mut store = HighlightStore::new();
    let mut session = InteractionSession::new();
    session.set_highlight_mode(true, &mut store);
    let mut ctx = ctx(&mut store);

    session.handle(PointerKind::Down, p(90.0, 90.0), &PointerTarget::Canvas, &mut ctx);
    let gesture = session.handle(PointerKind::Up, p(130.0, 120.0), &PointerTarget::Canvas, &mut ctx);
    let Some(Gesture::Drawn(rect)) = gesture else {
        panic!("expected a drawn gesture");
    };
    assert!(close(rect.right(), 100.0));
    assert!(close(rect.bottom(), 100.0));
}

#[test]
fn test_highlight_mode_makes_highlights_inert() {
    let mut store = store_with("a", HighlightRect::new(50.0, 50.0, 20.0, 20.0));
    let mut session = InteractionSession::new();
    session.set_highlight_mode(true, &mut store);
    let mut ctx = ctx(&mut store);

    session.handle(PointerKind::Down, p(50.0, 50.0), &PointerTarget::Body(id("a")), &mut ctx);
    assert_eq!(session.mode().name(), "drawing");
}

#[test]
fn test_canvas_down_without_highlight_mode_only_clears_selection() {
    let mut store = store_with("a", HighlightRect::new(50.0, 50.0, 20.0, 20.0));
    let mut session = InteractionSession::new();
    session.set_active(Some(id("a")));
    let mut ctx = ctx(&mut store);

    session.handle(PointerKind::Down, p(5.0, 5.0), &PointerTarget::Canvas, &mut ctx);
    assert!(session.mode().is_idle());
    assert!(session.active().is_none());
}

#[test]
fn test_drag_keeps_grab_offset() {
    let mut store = store_with("a", HighlightRect::new(50.0, 50.0, 10.0, 10.0));
    let mut session = InteractionSession::new();
    let mut ctx = ctx(&mut store);

    // Grab 3% right of and 2% below the center.
    session.handle(PointerKind::Down, p(53.0, 52.0), &PointerTarget::Body(id("a")), &mut ctx);
    assert_eq!(session.active(), Some(&id("a")));
    session.handle(PointerKind::Move, p(63.0, 42.0), &PointerTarget::Canvas, &mut ctx);

    let live = ctx.store.by_id(&id("a")).unwrap().rect;
    assert!(close(live.center_x, 60.0));
    assert!(close(live.center_y, 40.0));

    let gesture = session.handle(PointerKind::Up, p(63.0, 42.0), &PointerTarget::Canvas, &mut ctx);
    match gesture {
        Some(Gesture::Edited { prior, next }) => {
            assert!(close(prior.rect.center_x, 50.0));
            assert!(close(next.rect.center_x, 60.0));
            assert!(close(next.rect.width, 10.0));
        }
        other => panic!("expected an edit, got {:?}", other),
    }
}

#[test]
fn test_drag_clamps_center_into_page() {
    let mut store = store_with("a", HighlightRect::new(50.0, 50.0, 10.0, 10.0));
    let mut session = InteractionSession::new();
    let mut ctx = ctx(&mut store);

    session.handle(PointerKind::Down, p(50.0, 50.0), &PointerTarget::Body(id("a")), &mut ctx);
    session.handle(PointerKind::Move, p(180.0, -40.0), &PointerTarget::Canvas, &mut ctx);
    let live = ctx.store.by_id(&id("a")).unwrap().rect;
    assert!(close(live.center_x, 100.0));
    assert!(close(live.center_y, 0.0));
}

#[test]
fn test_drag_without_movement_commits_nothing() {
    let mut store = store_with("a", HighlightRect::new(50.0, 50.0, 10.0, 10.0));
    let mut session = InteractionSession::new();
    let mut ctx = ctx(&mut store);

    session.handle(PointerKind::Down, p(50.0, 50.0), &PointerTarget::Body(id("a")), &mut ctx);
    let gesture = session.handle(PointerKind::Up, p(50.0, 50.0), &PointerTarget::Canvas, &mut ctx);
    assert!(gesture.is_none());
    assert!(session.mode().is_idle());
}

#[test]
fn test_resize_keeps_opposite_corner_fixed() {
    let mut store = store_with("a", HighlightRect::new(50.0, 50.0, 10.0, 10.0));
    let mut session = InteractionSession::new();
    session.set_active(Some(id("a")));
    let mut ctx = ctx(&mut store);

    session.handle(
        PointerKind::Down,
        p(55.0, 55.0),
        &PointerTarget::Handle(id("a"), Corner::SouthEast),
        &mut ctx,
    );
    assert_eq!(session.mode().name(), "resizing");
    let gesture = session.handle(PointerKind::Up, p(70.0, 70.0), &PointerTarget::Canvas, &mut ctx);

    let Some(Gesture::Edited { next, .. }) = gesture else {
        panic!("expected an edit");
    };
    assert!(close(next.rect.width, 25.0));
    assert!(close(next.rect.height, 25.0));
    assert!(close(next.rect.center_x, 57.5));
    assert!(close(next.rect.center_y, 57.5));
    let nw = next.rect.corner(Corner::NorthWest);
    assert!(close(nw.x, 45.0) && close(nw.y, 45.0));
}

#[test]
fn test_resize_from_nw_handle() {
    let mut store = store_with("a", HighlightRect::new(30.0, 30.0, 40.0, 40.0));
    let mut session = InteractionSession::new();
    session.set_active(Some(id("a")));
    let mut ctx = ctx(&mut store);

    session.handle(
        PointerKind::Down,
        p(10.0, 10.0),
        &PointerTarget::Handle(id("a"), Corner::NorthWest),
        &mut ctx,
    );
    session.handle(PointerKind::Up, p(20.0, 30.0), &PointerTarget::Canvas, &mut ctx);

    // SE corner stays at (50, 50).
    let rect = ctx.store.by_id(&id("a")).unwrap().rect;
    assert!(close(rect.right(), 50.0));
    assert!(close(rect.bottom(), 50.0));
    assert!(close(rect.width, 30.0));
    assert!(close(rect.height, 20.0));
}

#[test]
fn test_resize_clamps_size_limits() {
    let mut store = store_with("a", HighlightRect::new(50.0, 50.0, 10.0, 10.0));
    let mut session = InteractionSession::new();
    session.set_active(Some(id("a")));
    let mut ctx = ctx(&mut store);

    session.handle(
        PointerKind::Down,
        p(55.0, 55.0),
        &PointerTarget::Handle(id("a"), Corner::SouthEast),
        &mut ctx,
    );
    session.handle(PointerKind::Move, p(45.2, 200.0), &PointerTarget::Canvas, &mut ctx);
    let rect = ctx.store.by_id(&id("a")).unwrap().rect;
    assert!(close(rect.width, 1.0));
    assert!(close(rect.height, 80.0));
    assert!(rect.validate(&SizeLimits::default()).is_ok());
}

#[test]
fn test_handle_of_inactive_highlight_is_ignored() {
    let mut store = store_with("a", HighlightRect::new(50.0, 50.0, 10.0, 10.0));
    let mut session = InteractionSession::new();
    let mut ctx = ctx(&mut store);

    session.handle(
        PointerKind::Down,
        p(55.0, 55.0),
        &PointerTarget::Handle(id("a"), Corner::SouthEast),
        &mut ctx,
    );
    assert!(session.mode().is_idle());
}

#[test]
fn test_cancel_reverts_drag() {
    let mut store = store_with("a", HighlightRect::new(50.0, 50.0, 10.0, 10.0));
    let mut session = InteractionSession::new();
    let mut ctx = ctx(&mut store);

    session.handle(PointerKind::Down, p(50.0, 50.0), &PointerTarget::Body(id("a")), &mut ctx);
    session.handle(PointerKind::Move, p(80.0, 80.0), &PointerTarget::Canvas, &mut ctx);
    let gesture = session.handle(PointerKind::Cancel, p(0.0, 0.0), &PointerTarget::Canvas, &mut ctx);

    assert!(gesture.is_none());
    assert!(session.mode().is_idle());
    assert!(close(ctx.store.by_id(&id("a")).unwrap().rect.center_x, 50.0));
}

#[test]
fn test_leave_finishes_gesture_like_pointer_up() {
    let mut store = store_with("a", HighlightRect::new(50.0, 50.0, 10.0, 10.0));
    let mut session = InteractionSession::new();
    let mut ctx = ctx(&mut store);

    session.handle(PointerKind::Down, p(50.0, 50.0), &PointerTarget::Body(id("a")), &mut ctx);
    let gesture = session.handle(PointerKind::Leave, p(70.0, 50.0), &PointerTarget::Canvas, &mut ctx);
    assert!(matches!(gesture, Some(Gesture::Edited { .. })));
    assert!(session.mode().is_idle());
}

#[test]
fn test_locked_highlight_cannot_be_dragged() {
    let mut store = store_with("a", HighlightRect::new(50.0, 50.0, 10.0, 10.0));
    let mut session = InteractionSession::new();
    let mut ctx = GestureContext {
        store: &mut store,
        page_number: 1,
        limits: SizeLimits::default(),
        draw_threshold: 1.0,
        is_locked: |_: &HighlightId| true,
    };

    session.handle(PointerKind::Down, p(50.0, 50.0), &PointerTarget::Body(id("a")), &mut ctx);
    assert!(session.mode().is_idle());
    // Still selectable.
    assert_eq!(session.active(), Some(&id("a")));
}

#[test]
fn test_toggling_highlight_mode_reverts_gesture_and_selection() {
    let mut store = store_with("a", HighlightRect::new(50.0, 50.0, 10.0, 10.0));
    let mut session = InteractionSession::new();
    {
        let mut ctx = ctx(&mut store);
        session.handle(PointerKind::Down, p(50.0, 50.0), &PointerTarget::Body(id("a")), &mut ctx);
        session.handle(PointerKind::Move, p(60.0, 60.0), &PointerTarget::Canvas, &mut ctx);
    }
    session.set_highlight_mode(true, &mut store);
    assert!(session.mode().is_idle());
    assert!(session.active().is_none());
    assert!(close(store.by_id(&id("a")).unwrap().rect.center_x, 50.0));
}

#[test]
fn test_rebind_follows_server_id() {
    let mut session = InteractionSession::new();
    session.set_active(Some(HighlightId::Local(1)));
    session.rebind(&HighlightId::Local(1), &id("srv"));
    assert_eq!(session.active(), Some(&id("srv")));

    session.forget(&id("srv"));
    assert!(session.active().is_none());
}

#[test]
fn test_hit_test_prefers_active_handles_then_topmost() {
    let mut store = HighlightStore::new();
    store.upsert(highlight("a", HighlightRect::new(50.0, 50.0, 20.0, 20.0)));
    store.upsert(highlight("b", HighlightRect::new(55.0, 55.0, 20.0, 20.0)));

    let tolerance = (1.0, 1.0);
    // Overlap region: active "a" renders on top, so it wins.
    let target = hit_test(&store, 1, Some(&id("a")), p(55.0, 55.0), tolerance);
    assert_eq!(target, PointerTarget::Body(id("a")));

    // Without a selection, "b" sorts last by id and is on top.
    let target = hit_test(&store, 1, None, p(55.0, 55.0), tolerance);
    assert_eq!(target, PointerTarget::Body(id("b")));

    // Corner of the active highlight.
    let target = hit_test(&store, 1, Some(&id("a")), p(40.5, 39.5), tolerance);
    assert_eq!(target, PointerTarget::Handle(id("a"), Corner::NorthWest));

    assert_eq!(
        hit_test(&store, 1, None, p(5.0, 5.0), tolerance),
        PointerTarget::Canvas
    );
    assert_eq!(
        hit_test(&store, 2, None, p(55.0, 55.0), tolerance),
        PointerTarget::Canvas
    );
}

proptest! {
    #[test]
    fn prop_drag_and_resize_keep_invariants(
        moves in prop::collection::vec((-50.0f32..150.0, -50.0f32..150.0), 1..20),
        corner_index in 0usize..4,
        resize in any::<bool>(),
    ) {
        let limits = SizeLimits::default();
        let mut store = store_with("a", HighlightRect::new(50.0, 50.0, 10.0, 10.0));
        let mut session = InteractionSession::new();
        session.set_active(Some(id("a")));
        let mut ctx = ctx(&mut store);

        let target = if resize {
            PointerTarget::Handle(id("a"), Corner::ALL[corner_index])
        } else {
            PointerTarget::Body(id("a"))
        };
        session.handle(PointerKind::Down, p(50.0, 50.0), &target, &mut ctx);
        for (x, y) in &moves {
            session.handle(PointerKind::Move, p(*x, *y), &PointerTarget::Canvas, &mut ctx);
            let rect = ctx.store.by_id(&id("a")).unwrap().rect;
            prop_assert!(rect.validate(&limits).is_ok());
        }
        let (x, y) = moves[moves.len() - 1];
        session.handle(PointerKind::Up, p(x, y), &PointerTarget::Canvas, &mut ctx);
        prop_assert!(session.mode().is_idle());
        prop_assert!(ctx.store.by_id(&id("a")).unwrap().rect.validate(&limits).is_ok());
    }

    #[test]
    fn prop_draw_threshold(
        ax in 0.0f32..100.0,
        ay in 0.0f32..100.0,
        dx in -3.0f32..3.0,
        dy in -3.0f32..3.0,
    ) {
        let mut store = HighlightStore::new();
        let mut session = InteractionSession::new();
        session.set_highlight_mode(true, &mut store);
        let mut ctx = ctx(&mut store);

        session.handle(PointerKind::Down, p(ax, ay), &PointerTarget::Canvas, &mut ctx);
        let gesture = session.handle(PointerKind::Up, p(ax + dx, ay + dy), &PointerTarget::Canvas, &mut ctx);
        let raw = HighlightRect::from_corners(p(ax, ay), p(ax + dx, ay + dy).clamped());
        let expected = raw.width > 1.0 && raw.height > 1.0;
        prop_assert_eq!(gesture.is_some(), expected);
        prop_assert!(session.preview().is_none());
    }
}
