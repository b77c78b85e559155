//! Tick-driven animation previews. Previews are transient: they never touch history and
//! always hand the object back with its captured values.

use std::cell::RefCell;
use std::rc::Rc;

use thiserror::Error;

use crate::effects::{AnimatedProps, Effect, Phase, DEFAULT_DURATION_MS};
use crate::objects::SceneObject;
use crate::scene::Scene;
use crate::types::ObjectId;

/// Called once per preview, after the originals are back in place.
pub type Completion = Box<dyn FnOnce(ObjectId)>;

/// Collects finished preview ids so callers can run their own callbacks later, outside
/// whatever borrow was held while the scheduler ran.
#[derive(Clone, Default)]
pub struct FinishedQueue {
    ids: Rc<RefCell<Vec<ObjectId>>>,
}

impl FinishedQueue {
    pub fn new() -> Self {
        FinishedQueue::default()
    }

    /// A completion that only records the id.
    pub fn completion(&self) -> Completion {
        let queue = self.clone();
        Box::new(move |id| queue.push(id))
    }

    pub fn push(&self, id: ObjectId) {
        self.ids.borrow_mut().push(id);
    }

    /// Ids finished since the last drain, oldest first.
    pub fn drain(&self) -> Vec<ObjectId> {
        std::mem::take(&mut *self.ids.borrow_mut())
    }

    pub fn is_empty(&self) -> bool {
        self.ids.borrow().is_empty()
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnimationError {
    #[error("object {0} is already animating")]
    AlreadyRunning(ObjectId),
    #[error("cannot animate missing object {0}")]
    ObjectNotFound(ObjectId),
}

struct Preview {
    object_id: ObjectId,
    effect: Effect,
    originals: AnimatedProps,
    phases: Vec<Phase>,
    started_at: Option<f64>,
    on_complete: Option<Completion>,
}

impl Preview {
    fn total_ms(&self) -> f64 {
        self.phases.iter().map(|p| p.duration_ms).sum()
    }

    /// Phase active at `elapsed` and the local progress within it.
    fn locate(&self, elapsed: f64) -> Option<(&Phase, f64)> {
        let mut start = 0.0;
        for phase in &self.phases {
            if elapsed < start + phase.duration_ms {
                let t = if phase.duration_ms > 0.0 { (elapsed - start) / phase.duration_ms } else { 1.0 };
                return Some((phase, t));
            }
            start += phase.duration_ms;
        }
        None
    }

    fn complete(mut self) {
        if let Some(done) = self.on_complete.take() {
            done(self.object_id);
        }
    }
}

pub struct AnimationScheduler {
    previews: Vec<Preview>,
    duration_ms: f64,
}

impl Default for AnimationScheduler {
    fn default() -> Self {
        AnimationScheduler::new(DEFAULT_DURATION_MS)
    }
}

impl AnimationScheduler {
    pub fn new(duration_ms: f64) -> Self {
        AnimationScheduler { previews: Vec::new(), duration_ms }
    }

    pub fn is_animating(&self, id: ObjectId) -> bool {
        self.previews.iter().any(|p| p.object_id == id)
    }

    pub fn active_count(&self) -> usize {
        self.previews.len()
    }

    /// Starts a preview of `effect_id` on `id`. The first frame is applied right away;
    /// the clock starts at the next `tick`. An unknown effect completes immediately.
    pub fn start(&mut self, scene: &mut Scene, id: ObjectId, effect_id: &str, on_complete: Completion) -> Result<(), AnimationError> {
        if self.is_animating(id) {
            return Err(AnimationError::AlreadyRunning(id));
        }
        let obj = scene.get_mut(id).ok_or(AnimationError::ObjectNotFound(id))?;
        let Some(effect) = Effect::from_id(effect_id) else {
            tracing::debug!(id, effect_id, "unknown effect, completing immediately");
            on_complete(id);
            return Ok(());
        };

        let originals = AnimatedProps::capture(obj);
        let phases = effect.phases(&originals, self.duration_ms);
        if let Some(first) = phases.first() {
            first.sample(obj, 0.0);
        }
        tracing::debug!(id, effect = effect.id(), "animation preview started");
        self.previews.push(Preview { object_id: id, effect, originals, phases, started_at: None, on_complete: Some(on_complete) });
        Ok(())
    }

    /// Advances every preview to `now_ms`. Finished previews restore their originals
    /// before their completion runs. Returns how many previews finished.
    pub fn tick(&mut self, now_ms: f64, scene: &mut Scene) -> usize {
        let mut finished = Vec::new();
        let mut i = 0;
        while i < self.previews.len() {
            let preview = &mut self.previews[i];
            let started = *preview.started_at.get_or_insert(now_ms);
            let elapsed = (now_ms - started).max(0.0);

            let done = match scene.get_mut(preview.object_id) {
                None => {
                    tracing::warn!(id = preview.object_id, "animated object removed, dropping preview");
                    true
                }
                Some(obj) => match preview.locate(elapsed) {
                    Some((phase, t)) => {
                        phase.sample(obj, t);
                        false
                    }
                    None => {
                        preview.originals.restore(obj);
                        true
                    }
                },
            };
            if done {
                finished.push(self.previews.remove(i));
            } else {
                i += 1;
            }
        }

        let count = finished.len();
        for preview in finished {
            tracing::debug!(id = preview.object_id, effect = preview.effect.id(), total_ms = preview.total_ms(), "animation preview finished");
            preview.complete();
        }
        count
    }

    /// Writes captured originals into `scene`, so a copy of a mid-preview scene
    /// serializes without in-between values.
    pub fn restore_into(&self, scene: &mut Scene) {
        for preview in &self.previews {
            if let Some(obj) = scene.get_mut(preview.object_id) {
                preview.originals.restore(obj);
            }
        }
    }

    /// Writes the captured originals into a detached copy of an animating object.
    /// Objects without a preview are left as they are.
    pub fn settle(&self, obj: &mut SceneObject) {
        if let Some(preview) = self.previews.iter().find(|p| p.object_id == obj.id) {
            preview.originals.restore(obj);
        }
    }

    /// Ends the preview on `id`, if any: originals restored, completion fired.
    pub fn finish(&mut self, id: ObjectId, scene: &mut Scene) -> bool {
        let Some(index) = self.previews.iter().position(|p| p.object_id == id) else { return false };
        let preview = self.previews.remove(index);
        if let Some(obj) = scene.get_mut(id) {
            preview.originals.restore(obj);
        }
        tracing::debug!(id, effect = preview.effect.id(), "animation preview cut short");
        preview.complete();
        true
    }

    /// Ends every preview at once: originals restored, completions fired.
    pub fn finish_all(&mut self, scene: &mut Scene) -> usize {
        self.restore_into(scene);
        let previews = std::mem::take(&mut self.previews);
        let count = previews.len();
        previews.into_iter().for_each(Preview::complete);
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::{Primitive, SceneObject};
    use crate::types::{Geometry, Paint};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn scene_with_rect() -> (Scene, ObjectId) {
        let mut scene = Scene::new(800.0, 600.0, "#fff");
        let mut rect = SceneObject::shape(Primitive::Rect { rx: 0.0, ry: 0.0 }, Geometry::new(100.0, 100.0, 40.0, 40.0), Paint::filled("#f00"));
        rect.paint.opacity = 0.7;
        let id = scene.insert(rect, None);
        (scene, id)
    }

    fn counter() -> (Rc<RefCell<Vec<ObjectId>>>, impl Fn() -> Completion) {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let c = calls.clone();
        (calls, move || {
            let c = c.clone();
            Box::new(move |id| c.borrow_mut().push(id)) as Completion
        })
    }

    #[test]
    fn every_effect_restores_originals_and_completes_once() {
        for effect in Effect::ALL {
            let (mut scene, id) = scene_with_rect();
            let before = scene.get(id).unwrap().clone();
            let (calls, make) = counter();
            let mut s = AnimationScheduler::default();
            s.start(&mut scene, id, effect.id(), make()).unwrap();
            s.tick(0.0, &mut scene);
            s.tick(120.0, &mut scene);
            assert!(s.is_animating(id), "{}", effect.id());
            s.tick(10_000.0, &mut scene);
            assert!(!s.is_animating(id));
            assert_eq!(scene.get(id).unwrap(), &before, "{}", effect.id());
            assert_eq!(*calls.borrow(), vec![id]);
        }
    }

    #[test]
    fn overlapping_preview_is_rejected() {
        let (mut scene, id) = scene_with_rect();
        let (_, make) = counter();
        let mut s = AnimationScheduler::default();
        s.start(&mut scene, id, "pulse", make()).unwrap();
        assert_eq!(s.start(&mut scene, id, "bounce", make()), Err(AnimationError::AlreadyRunning(id)));
    }

    #[test]
    fn unknown_effect_completes_without_change() {
        let (mut scene, id) = scene_with_rect();
        let before = scene.get(id).unwrap().clone();
        let (calls, make) = counter();
        let mut s = AnimationScheduler::default();
        s.start(&mut scene, id, "wobble", make()).unwrap();
        assert_eq!(*calls.borrow(), vec![id]);
        assert!(!s.is_animating(id));
        assert_eq!(scene.get(id).unwrap(), &before);
    }

    #[test]
    fn mid_flight_values_differ_but_restore_into_hides_them() {
        let (mut scene, id) = scene_with_rect();
        let (_, make) = counter();
        let mut s = AnimationScheduler::default();
        s.start(&mut scene, id, "fade-in", make()).unwrap();
        s.tick(1000.0, &mut scene);
        s.tick(1250.0, &mut scene);
        let mid = scene.get(id).unwrap().paint.opacity;
        assert!((mid - 0.35).abs() < 1e-9);

        let mut copy = scene.clone();
        s.restore_into(&mut copy);
        assert_eq!(copy.get(id).unwrap().paint.opacity, 0.7);
    }

    #[test]
    fn removed_object_drops_preview_and_still_completes() {
        let (mut scene, id) = scene_with_rect();
        let (calls, make) = counter();
        let mut s = AnimationScheduler::default();
        s.start(&mut scene, id, "rotate", make()).unwrap();
        scene.remove(id);
        assert_eq!(s.tick(16.0, &mut scene), 1);
        assert_eq!(*calls.borrow(), vec![id]);
        assert_eq!(s.active_count(), 0);
    }

    #[test]
    fn missing_object_cannot_start() {
        let mut scene = Scene::new(10.0, 10.0, "#fff");
        let (calls, make) = counter();
        let mut s = AnimationScheduler::default();
        assert_eq!(s.start(&mut scene, 9, "pulse", make()), Err(AnimationError::ObjectNotFound(9)));
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn finish_all_restores_and_completes() {
        let (mut scene, id) = scene_with_rect();
        let before = scene.get(id).unwrap().clone();
        let (calls, make) = counter();
        let mut s = AnimationScheduler::default();
        s.start(&mut scene, id, "bounce", make()).unwrap();
        s.tick(0.0, &mut scene);
        s.tick(100.0, &mut scene);
        assert_eq!(s.finish_all(&mut scene), 1);
        assert_eq!(scene.get(id).unwrap(), &before);
        assert_eq!(calls.borrow().len(), 1);
    }

    #[test]
    fn finish_one_leaves_the_others_running() {
        let (mut scene, id) = scene_with_rect();
        let twin = scene.get(id).unwrap().clone();
        let other = scene.insert(twin, None);
        let (calls, make) = counter();
        let mut s = AnimationScheduler::default();
        s.start(&mut scene, id, "scale", make()).unwrap();
        s.start(&mut scene, other, "scale", make()).unwrap();
        s.tick(0.0, &mut scene);
        s.tick(200.0, &mut scene);

        assert!(s.finish(id, &mut scene));
        assert!(!s.finish(id, &mut scene));
        assert_eq!(scene.get(id).unwrap().geometry.scale_x, 1.0);
        assert!(scene.get(other).unwrap().geometry.scale_x < 1.0);
        assert!(s.is_animating(other));
        assert_eq!(*calls.borrow(), vec![id]);
    }

    #[test]
    fn settle_rewrites_a_detached_copy_only() {
        let (mut scene, id) = scene_with_rect();
        let (_, make) = counter();
        let mut s = AnimationScheduler::default();
        s.start(&mut scene, id, "fade-in", make()).unwrap();
        s.tick(0.0, &mut scene);
        s.tick(100.0, &mut scene);

        let mut copy = scene.get(id).unwrap().clone();
        s.settle(&mut copy);
        assert_eq!(copy.paint.opacity, 0.7);
        assert!(scene.get(id).unwrap().paint.opacity < 0.7);
        assert!(s.is_animating(id));
    }

    #[test]
    fn finished_queue_defers_until_drained() {
        let (mut scene, id) = scene_with_rect();
        let queue = FinishedQueue::new();
        let mut s = AnimationScheduler::default();
        s.start(&mut scene, id, "pulse", queue.completion()).unwrap();
        s.start(&mut scene, 999, "pulse", queue.completion()).unwrap_err();
        assert!(queue.is_empty());
        s.tick(0.0, &mut scene);
        s.tick(10_000.0, &mut scene);
        assert_eq!(queue.drain(), vec![id]);
        assert!(queue.drain().is_empty());
    }
}
