use super::*;
use crate::media::still::StillSource;

fn slate(rgb: [u8; 3], secs: f64) -> Box<dyn MediaSource> {
    Box::new(StillSource::solid(320, 180, rgb, secs).unwrap())
}

#[test]
fn roles_follow_sequence_position() {
    assert_eq!(ClipRole::for_index(0, 1), Some(ClipRole::Only));
    assert_eq!(ClipRole::for_index(0, 3), Some(ClipRole::First));
    assert_eq!(ClipRole::for_index(1, 3), Some(ClipRole::Middle));
    assert_eq!(ClipRole::for_index(2, 3), Some(ClipRole::Last));
    assert_eq!(ClipRole::for_index(3, 3), None);
    assert!(ClipRole::Only.is_first() && ClipRole::Only.is_last());
    assert!(!ClipRole::Middle.is_first() && !ClipRole::Middle.is_last());
}

#[test]
fn add_assigns_unique_ids_and_thumbnails() {
    let mut reg = ClipRegistry::new();
    let a = reg.add("a", slate([255, 0, 0], 4.0)).unwrap();
    let b = reg.add("b", slate([0, 255, 0], 5.0)).unwrap();
    assert_ne!(a, b);
    assert_eq!(reg.len(), 2);

    let thumb = image::load_from_memory(reg.get(0).unwrap().thumbnail_png()).unwrap();
    assert_eq!((thumb.width(), thumb.height()), (160, 90));
    assert!((reg.total_duration_secs() - 9.0).abs() < 1e-12);
    assert!((reg.start_offset_secs(1) - 4.0).abs() < 1e-12);
}

#[test]
fn buffering_source_gets_empty_thumbnail() {
    let mut reg = ClipRegistry::new();
    let src = StillSource::solid(8, 8, [1, 1, 1], 1.0)
        .unwrap()
        .with_load_delay(1.0);
    reg.add("late", Box::new(src)).unwrap();
    assert!(reg.get(0).unwrap().thumbnail_png().is_empty());
}

#[test]
fn remove_and_reorder_keep_ids_stable() {
    let mut reg = ClipRegistry::new();
    let a = reg.add("a", slate([1, 0, 0], 1.0)).unwrap();
    let b = reg.add("b", slate([2, 0, 0], 1.0)).unwrap();
    let c = reg.add("c", slate([3, 0, 0], 1.0)).unwrap();

    reg.move_clip(2, 0).unwrap();
    assert_eq!(reg.ids(), vec![c, a, b]);
    assert!(reg.move_clip(0, 3).is_err());

    reg.remove(a).unwrap();
    assert_eq!(reg.ids(), vec![c, b]);
    assert!(reg.remove(a).is_err());

    let d = reg.add("d", slate([4, 0, 0], 1.0)).unwrap();
    assert!(d != a && d != b && d != c);
}

#[test]
fn rejects_unusable_durations() {
    struct Broken(StillSource);
    impl MediaSource for Broken {
        fn duration(&self) -> f64 {
            f64::INFINITY
        }
        fn current_time(&self) -> f64 {
            self.0.current_time()
        }
        fn ready_state(&self) -> crate::media::source::ReadyState {
            self.0.ready_state()
        }
        fn dimensions(&self) -> (u32, u32) {
            self.0.dimensions()
        }
        fn is_paused(&self) -> bool {
            self.0.is_paused()
        }
        fn play(&mut self) -> ReelResult<()> {
            self.0.play()
        }
        fn pause(&mut self) {
            self.0.pause()
        }
        fn seek(&mut self, secs: f64) {
            self.0.seek(secs)
        }
        fn advance(&mut self, dt_secs: f64) {
            self.0.advance(dt_secs)
        }
        fn current_frame(&mut self) -> ReelResult<Option<SourceFrame>> {
            self.0.current_frame()
        }
        fn mix_audio_into(&mut self, start_secs: f64, out: &mut [f32], gain: f32) {
            self.0.mix_audio_into(start_secs, out, gain)
        }
    }

    let mut reg = ClipRegistry::new();
    let inner = StillSource::solid(2, 2, [0, 0, 0], 1.0).unwrap();
    assert!(reg.add("broken", Box::new(Broken(inner))).is_err());
    assert!(reg.is_empty());
}
