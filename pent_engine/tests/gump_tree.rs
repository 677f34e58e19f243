use pent_engine::audio::AudioControl;
use pent_engine::geometry::PointRoundDir;
use pent_engine::gump::{
    Gump, GumpFlags, GumpKind, LAYER_ABOVE_NORMAL, LAYER_GAMEMAP, LAYER_MODAL, LAYER_NORMAL,
};
use pent_engine::gumps::{BarkGump, ItemRelativeGump, ModalGump};
use pent_engine::input::MouseButton;
use pent_engine::item::Item;
use pent_engine::shapes::{ShapeRef, MAIN_SHAPES};
use pent_engine::{GameContext, ObjId};

const TL: PointRoundDir = PointRoundDir::TopLeft;

fn panel(x: i32, y: i32, w: i32, h: i32, layer: i32) -> Gump {
    Gump::new(x, y, w, h, 0, GumpFlags::empty(), layer)
}

fn children(ctx: &GameContext, id: ObjId) -> Vec<ObjId> {
    ctx.objects.gump_at(id).children.clone()
}

fn assert_layers_sorted(ctx: &GameContext, id: ObjId) {
    let layers: Vec<i32> = children(ctx, id)
        .iter()
        .map(|c| ctx.objects.gump_at(*c).layer)
        .collect();
    assert!(
        layers.windows(2).all(|w| w[0] <= w[1]),
        "children of {id} out of layer order: {layers:?}"
    );
}

#[test]
fn children_stay_sorted_by_layer_whatever_the_insert_order() {
    let mut ctx = GameContext::headless();
    let root = ctx.init_gump(panel(0, 0, 200, 200, LAYER_NORMAL), None, true);
    let layers = [
        LAYER_ABOVE_NORMAL,
        LAYER_GAMEMAP,
        LAYER_NORMAL,
        LAYER_MODAL,
        LAYER_NORMAL,
        LAYER_ABOVE_NORMAL,
        LAYER_GAMEMAP,
    ];
    for (i, layer) in layers.into_iter().enumerate() {
        ctx.init_gump(panel(i as i32, 0, 10, 10, layer), Some(root), i % 2 == 0);
        assert_layers_sorted(&ctx, root);
        let focus = ctx.objects.gump_at(root).focus_child;
        assert!(focus.map(|f| children(&ctx, root).contains(&f)).unwrap_or(false));
    }
    assert_eq!(children(&ctx, root).len(), layers.len());
}

#[test]
fn raising_a_child_keeps_it_within_its_layer() {
    let mut ctx = GameContext::headless();
    let root = ctx.init_gump(panel(0, 0, 200, 200, LAYER_NORMAL), None, true);
    let low = ctx.init_gump(panel(0, 0, 10, 10, LAYER_NORMAL), Some(root), false);
    let other = ctx.init_gump(panel(0, 0, 10, 10, LAYER_NORMAL), Some(root), true);
    let high = ctx.init_gump(panel(0, 0, 10, 10, LAYER_ABOVE_NORMAL), Some(root), false);

    assert_eq!(children(&ctx, root), vec![low, other, high]);
    ctx.objects.move_child_to_front(root, low);
    assert_eq!(children(&ctx, root), vec![other, low, high]);
    assert_layers_sorted(&ctx, root);
}

#[test]
fn losing_the_focus_child_hands_focus_to_the_topmost() {
    let mut ctx = GameContext::headless();
    let root = ctx.init_gump(panel(0, 0, 200, 200, LAYER_NORMAL), None, true);
    let a = ctx.init_gump(panel(0, 0, 10, 10, LAYER_NORMAL), Some(root), true);
    let b = ctx.init_gump(panel(0, 0, 10, 10, LAYER_ABOVE_NORMAL), Some(root), false);
    let c = ctx.init_gump(panel(0, 0, 10, 10, LAYER_NORMAL), Some(root), true);
    assert_eq!(ctx.objects.gump_at(root).focus_child, Some(c));

    ctx.objects.remove_child(root, c);
    assert_eq!(ctx.objects.gump_at(root).focus_child, Some(b));
    ctx.objects.remove_child(root, a);
    assert_eq!(ctx.objects.gump_at(root).focus_child, Some(b));
    ctx.objects.remove_child(root, b);
    assert_eq!(ctx.objects.gump_at(root).focus_child, None);
}

fn bark_panel(ctx: &mut GameContext) -> (ObjId, [ObjId; 3]) {
    let item = ctx
        .objects
        .add_item(Item::new(ShapeRef::new(MAIN_SHAPES, 1), 0).at(500, 500, 0));
    let root = ctx.init_gump(panel(20, 20, 200, 100, LAYER_NORMAL), None, true);
    let first = ctx.init_gump(panel(0, 0, 10, 10, LAYER_NORMAL), Some(root), false);
    let bark = ctx.init_gump(BarkGump::gump(item, "hi"), Some(root), true);
    let last = ctx.init_gump(panel(0, 0, 10, 10, LAYER_NORMAL), Some(root), false);
    (root, [first, bark, last])
}

#[test]
fn child_closing_inside_its_parents_run_is_reaped_by_that_run() {
    let mut ctx = GameContext::headless();
    ctx.config.bark_ticks_per_char = 1;
    let (root, [first, bark, last]) = bark_panel(&mut ctx);
    assert_eq!(ctx.objects.gump_at(root).focus_child, Some(bark));

    ctx.run_gump(root);
    assert!(ctx.objects.gump(bark).is_some());

    ctx.run_gump(root);
    assert!(ctx.objects.gump(bark).is_none());
    let remaining = children(&ctx, root);
    assert_eq!(remaining.len(), 2);
    assert!(remaining.contains(&first) && remaining.contains(&last));
    assert_eq!(ctx.objects.gump_at(root).focus_child, remaining.last().copied());
}

#[test]
fn child_closed_from_an_event_handler_waits_for_the_next_run() {
    let mut ctx = GameContext::headless();
    let (root, [_, bark, _]) = bark_panel(&mut ctx);

    let handled = ctx.on_mouse_down(bark, MouseButton::Left, 0, 0);
    assert_eq!(handled, Some(bark));
    assert!(ctx.objects.gump_at(bark).is_closing());
    assert!(children(&ctx, root).contains(&bark));

    ctx.run_gump(root);
    assert!(ctx.objects.gump(bark).is_none());
    assert!(!children(&ctx, root).contains(&bark));
    let focus = ctx.objects.gump_at(root).focus_child;
    assert_eq!(focus, children(&ctx, root).last().copied());
}

#[test]
fn screen_and_gump_space_round_trip_through_three_levels() {
    let mut ctx = GameContext::headless();
    let desktop = ctx.core.desktop;
    let item = ctx
        .objects
        .add_item(Item::new(ShapeRef::new(MAIN_SHAPES, 1), 0).at(530, 490, 0));

    let root = ctx.init_gump(panel(3, 4, 300, 300, LAYER_NORMAL), Some(desktop), true);
    let mut mid = panel(17, -9, 100, 100, LAYER_NORMAL);
    mid.dims.x = -50;
    mid.dims.y = -50;
    let mid = ctx.init_gump(mid, Some(root), true);
    let leaf = ctx.init_gump(
        ItemRelativeGump::gump(20, 10, item, GumpFlags::empty(), LAYER_NORMAL),
        Some(mid),
        true,
    );
    if let Some(rel) = ctx
        .objects
        .gump_mut(leaf)
        .and_then(|g| g.kind.item_relative_mut())
    {
        rel.ix = -31;
        rel.iy = 12;
    }
    assert!(matches!(ctx.objects.gump_at(leaf).kind, GumpKind::ItemRelative(_)));

    for (x, y) in [(0, 0), (-7, 13), (250, -40), (1, 1), (639, 479)] {
        let (gx, gy) = ctx.objects.screen_space_to_gump(leaf, x, y, TL);
        assert_eq!(ctx.objects.gump_to_screen_space(leaf, gx, gy, TL), (x, y));
        let (sx, sy) = ctx.objects.gump_to_screen_space(leaf, x, y, TL);
        assert_eq!(ctx.objects.screen_space_to_gump(leaf, sx, sy, TL), (x, y));
    }
}

#[test]
fn frontmost_gump_wins_the_hit_test() {
    let mut ctx = GameContext::headless();
    let desktop = ctx.core.desktop;
    let back = ctx.init_gump(panel(10, 10, 50, 50, LAYER_NORMAL), Some(desktop), true);
    let front = ctx.init_gump(panel(30, 30, 50, 50, LAYER_NORMAL), Some(desktop), true);
    let inner = ctx.init_gump(panel(5, 5, 10, 10, LAYER_NORMAL), Some(front), true);

    assert_eq!(ctx.find_gump(desktop, 50, 50), Some(front));
    assert_eq!(ctx.find_gump(desktop, 36, 36), Some(inner));
    assert_eq!(ctx.find_gump(desktop, 15, 15), Some(back));

    ctx.hide_gump(front);
    assert_eq!(ctx.find_gump(desktop, 50, 50), Some(back));
}

#[test]
fn nested_modals_balance_the_pause_depth() {
    let mut ctx = GameContext::headless();
    let outer = ctx.init_gump(ModalGump::gump(0, 0, 100, 100), None, true);
    let inner = ctx.init_gump(ModalGump::gump(10, 10, 50, 50), None, true);
    assert_eq!(ctx.kernel.pause_depth(), 2);
    assert!(ctx.audio.is_paused());
    assert_eq!(ctx.open_modal(), Some(inner));
    assert_eq!(ctx.objects.gump_at(outer).parent, Some(ctx.core.desktop));

    ctx.close_gump(inner, false);
    ctx.close_gump(inner, false);
    assert_eq!(ctx.kernel.pause_depth(), 1);
    assert_eq!(ctx.open_modal(), Some(outer));

    ctx.close_gump(outer, false);
    assert_eq!(ctx.kernel.pause_depth(), 0);
    assert!(!ctx.audio.is_paused());

    ctx.run_gump(ctx.core.desktop);
    assert!(ctx.objects.gump(inner).is_none());
    assert!(ctx.objects.gump(outer).is_none());
    assert!(!ctx.is_modal_open());
}
