//! Animation values and the player interface the transition planner drives.

/// What an [`Animatable`] plays.
#[derive(Debug, Clone, PartialEq)]
pub enum AnimatableKind {
    /// A single clip of known length, in seconds.
    Channel { duration: f32 },
    /// A nested sequence whose length is not known up front.
    Sequence,
}

/// A schedulable animation fragment.
#[derive(Debug, Clone, PartialEq)]
pub struct Animatable {
    name: String,
    kind: AnimatableKind,
    start_delay: f32,
    fade_in: f32,
    fade_out: f32,
    max_duration: Option<f32>,
    is_action: bool,
}

impl Animatable {
    pub fn channel(name: impl Into<String>, duration: f32) -> Self {
        Self::with_kind(name, AnimatableKind::Channel { duration })
    }

    pub fn sequence(name: impl Into<String>) -> Self {
        Self::with_kind(name, AnimatableKind::Sequence)
    }

    fn with_kind(name: impl Into<String>, kind: AnimatableKind) -> Self {
        Self {
            name: name.into(),
            kind,
            start_delay: 0.0,
            fade_in: 0.0,
            fade_out: 0.0,
            max_duration: None,
            is_action: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &AnimatableKind {
        &self.kind
    }

    /// Clip length for channels, `None` for sequences.
    pub fn duration(&self) -> Option<f32> {
        match self.kind {
            AnimatableKind::Channel { duration } => Some(duration),
            AnimatableKind::Sequence => None,
        }
    }

    pub fn start_delay(&self) -> f32 {
        self.start_delay
    }

    pub fn set_start_delay(&mut self, delay: f32) {
        self.start_delay = delay;
    }

    pub fn fade_in(&self) -> f32 {
        self.fade_in
    }

    pub fn set_fade_in(&mut self, fade: f32) {
        self.fade_in = fade;
    }

    pub fn fade_out(&self) -> f32 {
        self.fade_out
    }

    pub fn set_fade_out(&mut self, fade: f32) {
        self.fade_out = fade;
    }

    /// `None` means the fragment loops until replaced.
    pub fn max_duration(&self) -> Option<f32> {
        self.max_duration
    }

    pub fn set_max_duration(&mut self, duration: f32) {
        self.max_duration = Some(duration);
    }

    /// Action fragments play once and end on their own.
    pub fn is_action(&self) -> bool {
        self.is_action
    }

    pub fn set_action(&mut self, is_action: bool) {
        self.is_action = is_action;
    }
}

/// A named, ordered list of animatables played as one unit.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnimationSequence {
    name: String,
    animations: Vec<Animatable>,
}

impl AnimationSequence {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            animations: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_animation(&mut self, animation: Animatable) {
        self.animations.push(animation);
    }

    pub fn animations(&self) -> &[Animatable] {
        &self.animations
    }

    pub fn last_mut(&mut self) -> Option<&mut Animatable> {
        self.animations.last_mut()
    }

    pub fn len(&self) -> usize {
        self.animations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.animations.is_empty()
    }
}

/// The animation system of the character the planner animates.
pub trait AnimationPlayer {
    /// Whether a model is loaded and animations can be played.
    fn has_model(&self) -> bool;

    /// Looks up a registered animation template by name.
    fn registered_animation(&self, name: &str) -> Option<&Animatable>;

    /// Starts playing a generated sequence.
    fn play_animation(&mut self, sequence: AnimationSequence);

    /// Fades out every active animation over `blend_time` seconds.
    fn clear_active_animations(&mut self, blend_time: f32);

    /// Clears active and queued animations over `blend_time` seconds.
    fn clear_all(&mut self, blend_time: f32);

    /// Plays a registered animation directly, returning whether it was found.
    fn play_registered(&mut self, name: &str) -> bool;
}
