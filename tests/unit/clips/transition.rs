use super::*;
use crate::media::still::StillSource;

fn registry(n: usize) -> ClipRegistry {
    let mut reg = ClipRegistry::new();
    for i in 0..n {
        let src = StillSource::solid(4, 4, [i as u8, 0, 0], 1.0).unwrap();
        reg.add(format!("clip {i}"), Box::new(src)).unwrap();
    }
    reg
}

#[test]
fn serde_names_are_kebab_case() {
    let t: Vec<Transition> = serde_json::from_str(r#"["cut","dissolve","fade-to-black"]"#).unwrap();
    assert_eq!(
        t,
        vec![Transition::Cut, Transition::Dissolve, Transition::FadeToBlack]
    );
    assert!(!Transition::Cut.needs_ghost());
    assert!(Transition::Dissolve.needs_ghost());
}

#[test]
fn short_plan_falls_back_for_missing_gaps() {
    let reg = registry(4);
    let plan =
        TransitionPlan::from_positional(&reg, &[Transition::Dissolve], Transition::FadeToBlack);
    assert_eq!(plan.resolve(0, 1, &reg), Transition::Dissolve);
    assert_eq!(plan.resolve(1, 2, &reg), Transition::FadeToBlack);
    assert_eq!(plan.resolve(2, 3, &reg), Transition::FadeToBlack);
}

#[test]
fn long_plan_ignores_extra_entries() {
    let reg = registry(2);
    let plan = TransitionPlan::from_positional(
        &reg,
        &[Transition::Dissolve, Transition::FadeToBlack, Transition::Dissolve],
        Transition::Cut,
    );
    assert_eq!(plan.resolve(0, 1, &reg), Transition::Dissolve);
    assert_eq!(plan.resolve(1, 2, &reg), Transition::Cut);
    assert_eq!(plan.gap(reg.ids()[1]), None);
}

#[test]
fn jumps_always_cut() {
    let reg = registry(5);
    let plan = TransitionPlan::from_positional(
        &reg,
        &[Transition::Dissolve; 4],
        Transition::Dissolve,
    );
    for i in 0..5 {
        for j in 0..5 {
            let t = plan.resolve(i, j, &reg);
            if j == i + 1 {
                assert_eq!(t, Transition::Dissolve);
            } else {
                assert_eq!(t, Transition::Cut, "jump {i} -> {j}");
            }
        }
    }
}

#[test]
fn gaps_follow_clips_when_reordered() {
    let mut reg = registry(3);
    let ids = reg.ids();
    let mut plan = TransitionPlan::new(Transition::Cut);
    plan.set_gap(ids[0], Transition::Dissolve);

    reg.move_clip(0, 1).unwrap();
    assert_eq!(plan.resolve(0, 1, &reg), Transition::Cut);
    assert_eq!(plan.resolve(1, 2, &reg), Transition::Dissolve);

    plan.clear_gap(ids[0]);
    assert_eq!(plan.resolve(1, 2, &reg), Transition::Cut);
    plan.set_fallback(Transition::FadeToBlack);
    assert_eq!(plan.fallback(), Transition::FadeToBlack);
}
