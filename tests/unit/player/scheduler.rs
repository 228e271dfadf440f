use super::*;

#[test]
fn fixed_step_is_constant() {
    let mut s = FixedStep::from_fps(30);
    assert!((s.next_frame() - 1.0 / 30.0).abs() < 1e-12);
    assert!((s.next_frame() - 1.0 / 30.0).abs() < 1e-12);
    assert_eq!(FixedStep::new(-1.0).next_frame(), 0.0);
}

#[test]
fn realtime_waits_roughly_one_interval() {
    let mut s = Realtime::new(200);
    assert_eq!(s.next_frame(), 0.0);
    let dt = s.next_frame();
    assert!(dt >= 0.004, "dt = {dt}");
}
