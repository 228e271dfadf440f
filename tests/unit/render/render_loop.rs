use super::*;
use crate::media::still::StillSource;

const W: u32 = 64;
const H: u32 = 36;

fn canvas() -> Canvas {
    Canvas {
        width: W,
        height: H,
    }
}

fn slate(rgb: [u8; 3]) -> StillSource {
    StillSource::solid(W, H, rgb, 5.0).unwrap()
}

fn center(rl: &RenderLoop) -> [u8; 4] {
    rl.content().pixel(W / 2, H / 2)
}

fn close(a: u8, b: u8, tol: u8) -> bool {
    a.abs_diff(b) <= tol
}

/// Render a red frame, then switch to a blue clip with `kind` at t=0.
fn switched(kind: Transition) -> (RenderLoop, StillSource) {
    let mut rl = RenderLoop::new(canvas(), 1000, 1.08).unwrap();
    let mut red = slate([255, 0, 0]);
    rl.render_content(Some(&mut red), ColorFilter::None, -16.0)
        .unwrap();
    assert_eq!(center(&rl), [255, 0, 0, 255]);
    rl.begin_clip_switch(kind, 0.0);
    (rl, slate([0, 0, 255]))
}

#[test]
fn steady_state_draws_live_clip() {
    let mut rl = RenderLoop::new(canvas(), 1000, 1.08).unwrap();
    let mut green = slate([0, 255, 0]);
    rl.render_content(Some(&mut green), ColorFilter::None, 0.0)
        .unwrap();
    assert_eq!(center(&rl), [0, 255, 0, 255]);
    assert!(!rl.has_ghost());
}

#[test]
fn not_ready_without_transition_is_black() {
    let mut rl = RenderLoop::new(canvas(), 1000, 1.08).unwrap();
    let mut loading = slate([0, 255, 0]).with_load_delay(1.0);
    rl.render_content(Some(&mut loading), ColorFilter::None, 0.0)
        .unwrap();
    assert_eq!(center(&rl), [0, 0, 0, 255]);
    rl.render_content(None, ColorFilter::None, 16.0).unwrap();
    assert_eq!(center(&rl), [0, 0, 0, 255]);
}

#[test]
fn dissolve_blends_ghost_into_live() {
    let (mut rl, mut blue) = switched(Transition::Dissolve);
    assert!(rl.has_ghost());

    rl.render_content(Some(&mut blue), ColorFilter::None, 0.0)
        .unwrap();
    assert_eq!(center(&rl), [255, 0, 0, 255]);

    rl.render_content(Some(&mut blue), ColorFilter::None, 500.0)
        .unwrap();
    let mid = center(&rl);
    assert!(close(mid[0], mid[2], 2), "midpoint not symmetric: {mid:?}");
    assert!(close(mid[0], 128, 3));

    rl.render_content(Some(&mut blue), ColorFilter::None, 990.0)
        .unwrap();
    let late = center(&rl);
    assert!(late[2] > 245 && late[0] < 10, "{late:?}");
}

#[test]
fn transition_expires_after_its_length() {
    let (mut rl, mut blue) = switched(Transition::Dissolve);
    rl.render_content(Some(&mut blue), ColorFilter::None, 999.0)
        .unwrap();
    assert!(rl.transition_active());
    rl.render_content(Some(&mut blue), ColorFilter::None, 1000.0)
        .unwrap();
    assert!(!rl.transition_active());
    assert!(!rl.has_ghost());
    assert_eq!(center(&rl), [0, 0, 255, 255]);
}

#[test]
fn fade_to_black_darkens_then_reveals() {
    let (mut rl, mut blue) = switched(Transition::FadeToBlack);

    rl.render_content(Some(&mut blue), ColorFilter::None, 250.0)
        .unwrap();
    let out = center(&rl);
    assert!(close(out[0], 128, 3) && out[2] == 0, "{out:?}");

    rl.render_content(Some(&mut blue), ColorFilter::None, 750.0)
        .unwrap();
    let inb = center(&rl);
    assert!(close(inb[2], 128, 3) && inb[0] == 0, "{inb:?}");
}

#[test]
fn not_ready_during_transition_shows_ghost() {
    let (mut rl, _) = switched(Transition::Dissolve);
    let mut loading = slate([0, 0, 255]).with_load_delay(2.0);
    rl.render_content(Some(&mut loading), ColorFilter::None, 400.0)
        .unwrap();
    assert_eq!(center(&rl), [255, 0, 0, 255]);
}

#[test]
fn cut_never_holds_a_ghost() {
    let (mut rl, mut blue) = switched(Transition::Dissolve);
    rl.begin_clip_switch(Transition::Cut, 100.0);
    assert!(!rl.has_ghost());
    assert!(!rl.transition_active());
    rl.render_content(Some(&mut blue), ColorFilter::None, 100.0)
        .unwrap();
    assert_eq!(center(&rl), [0, 0, 255, 255]);
}

#[test]
fn live_draw_applies_filter() {
    let mut rl = RenderLoop::new(canvas(), 1000, 1.08).unwrap();
    let mut red = slate([255, 0, 0]);
    rl.render_content(Some(&mut red), ColorFilter::Grayscale, 0.0)
        .unwrap();
    let px = center(&rl);
    assert_eq!(px[0], px[1]);
    assert_eq!(px[1], px[2]);
}
