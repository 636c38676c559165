//! Headless rendering backend for the stimulus band.
//!
//! Records instances, transforms, anchors, and per-instance color overrides
//! instead of drawing them. Stands in for the real HMD pipeline in tests,
//! benches, and the app's dry-run mode, including the color-property alias
//! walk a real material system needs.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use slotmap::{Key, KeyData, SlotMap, new_key_type};
use tracing::warn;

use pulfrich_core::backend::{
    BackendError, BandAnchor, ColorRgba, InstanceHandle, InstanceTransform, RenderBackend,
};

new_key_type! {
    /// Generational key for recorded instances.
    struct InstanceKey;
}

/// Behavior knobs for the headless backend.
#[derive(Debug, Clone)]
pub struct HeadlessConfig {
    /// Color property names tried in order when applying an override.
    pub color_aliases: Vec<String>,
    /// Property names the simulated material system actually recognizes.
    pub recognized_properties: Vec<String>,
    /// When false, instantiation fails as if the visual template were never
    /// assigned.
    pub has_template: bool,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            color_aliases: vec![
                "_BaseColor".to_owned(),
                "_Color".to_owned(),
                "_TintColor".to_owned(),
                "_EmissionColor".to_owned(),
            ],
            recognized_properties: vec!["_BaseColor".to_owned(), "_EmissionColor".to_owned()],
            has_template: true,
        }
    }
}

#[derive(Debug, Default, Clone)]
struct RecordedInstance {
    sequence: u64,
    transform: Option<InstanceTransform>,
    /// Property block stand-in; overrides land here, never on a shared
    /// material.
    properties: HashMap<String, ColorRgba>,
}

#[derive(Debug, Default)]
struct SceneState {
    instances: SlotMap<InstanceKey, RecordedInstance>,
    anchor: Option<BandAnchor>,
    next_sequence: u64,
}

/// Read-only view of one recorded instance.
#[derive(Debug, Clone)]
pub struct InstanceSnapshot {
    pub handle: InstanceHandle,
    pub transform: Option<InstanceTransform>,
    /// First recognized color property, if any override landed.
    pub color: Option<ColorRgba>,
}

/// Recording backend; see the crate docs.
pub struct HeadlessBackend {
    config: HeadlessConfig,
    scene: Rc<RefCell<SceneState>>,
}

/// Shared handle onto a [`HeadlessBackend`]'s scene, usable after the
/// backend itself has been boxed into the engine.
#[derive(Clone)]
pub struct HeadlessProbe {
    config: HeadlessConfig,
    scene: Rc<RefCell<SceneState>>,
}

impl HeadlessBackend {
    #[must_use]
    pub fn new(config: HeadlessConfig) -> Self {
        Self {
            config,
            scene: Rc::new(RefCell::new(SceneState::default())),
        }
    }

    /// Probe retaining access to the recorded scene.
    #[must_use]
    pub fn probe(&self) -> HeadlessProbe {
        HeadlessProbe {
            config: self.config.clone(),
            scene: Rc::clone(&self.scene),
        }
    }

    fn key(handle: InstanceHandle) -> InstanceKey {
        InstanceKey::from(KeyData::from_ffi(handle.0))
    }
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new(HeadlessConfig::default())
    }
}

impl RenderBackend for HeadlessBackend {
    fn name(&self) -> &'static str {
        "headless"
    }

    fn create_instance(&mut self) -> Result<InstanceHandle, BackendError> {
        if !self.config.has_template {
            return Err(BackendError::MissingTemplate("bar template not assigned"));
        }
        let mut scene = self.scene.borrow_mut();
        let sequence = scene.next_sequence;
        scene.next_sequence += 1;
        let key = scene.instances.insert(RecordedInstance {
            sequence,
            ..RecordedInstance::default()
        });
        Ok(InstanceHandle(key.data().as_ffi()))
    }

    fn destroy_instance(&mut self, handle: InstanceHandle) -> Result<(), BackendError> {
        self.scene
            .borrow_mut()
            .instances
            .remove(Self::key(handle))
            .map(|_| ())
            .ok_or(BackendError::UnknownInstance(handle.0))
    }

    fn set_band_anchor(&mut self, anchor: BandAnchor) {
        self.scene.borrow_mut().anchor = Some(anchor);
    }

    fn set_transform(
        &mut self,
        handle: InstanceHandle,
        transform: InstanceTransform,
    ) -> Result<(), BackendError> {
        let mut scene = self.scene.borrow_mut();
        let instance = scene
            .instances
            .get_mut(Self::key(handle))
            .ok_or(BackendError::UnknownInstance(handle.0))?;
        instance.transform = Some(transform);
        Ok(())
    }

    fn set_color(&mut self, handle: InstanceHandle, color: ColorRgba) -> Result<(), BackendError> {
        let mut scene = self.scene.borrow_mut();
        let instance = scene
            .instances
            .get_mut(Self::key(handle))
            .ok_or(BackendError::UnknownInstance(handle.0))?;
        let mut matched = 0;
        for alias in &self.config.color_aliases {
            if self.config.recognized_properties.contains(alias) {
                instance.properties.insert(alias.clone(), color);
                matched += 1;
            }
        }
        if matched == 0 {
            // No pipeline property matched; visible as an uncolored bar, not
            // a crash.
            warn!(
                aliases = self.config.color_aliases.len(),
                "no color property alias recognized by the bound pipeline"
            );
        }
        Ok(())
    }
}

impl HeadlessProbe {
    /// Instances in creation order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<InstanceSnapshot> {
        let scene = self.scene.borrow();
        let mut entries: Vec<(InstanceKey, &RecordedInstance)> = scene.instances.iter().collect();
        entries.sort_by_key(|(_, instance)| instance.sequence);
        entries
            .into_iter()
            .map(|(key, instance)| InstanceSnapshot {
                handle: InstanceHandle(key.data().as_ffi()),
                transform: instance.transform,
                color: self.first_recognized_color(instance),
            })
            .collect()
    }

    /// Number of live instances.
    #[must_use]
    pub fn len(&self) -> usize {
        self.scene.borrow().instances.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scene.borrow().instances.is_empty()
    }

    /// Last anchor the engine pushed.
    #[must_use]
    pub fn anchor(&self) -> Option<BandAnchor> {
        self.scene.borrow().anchor
    }

    /// Recorded state of one instance.
    #[must_use]
    pub fn instance(&self, handle: InstanceHandle) -> Option<InstanceSnapshot> {
        let scene = self.scene.borrow();
        let key = InstanceKey::from(KeyData::from_ffi(handle.0));
        scene.instances.get(key).map(|instance| InstanceSnapshot {
            handle,
            transform: instance.transform,
            color: self.first_recognized_color(instance),
        })
    }

    fn first_recognized_color(&self, instance: &RecordedInstance) -> Option<ColorRgba> {
        self.config
            .color_aliases
            .iter()
            .find_map(|alias| instance.properties.get(alias).copied())
    }
}
