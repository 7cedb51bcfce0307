use crate::geometry::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    MouseDown,
    MouseUp,
    MouseMove,
    MouseOut,
    Click,
    DoubleClick,
    Wheel,
    KeyDown,
    KeyUp,
}

pub const EVENT_KIND_COUNT: usize = 9;

impl EventKind {
    pub const ALL: [EventKind; EVENT_KIND_COUNT] = [
        EventKind::MouseDown,
        EventKind::MouseUp,
        EventKind::MouseMove,
        EventKind::MouseOut,
        EventKind::Click,
        EventKind::DoubleClick,
        EventKind::Wheel,
        EventKind::KeyDown,
        EventKind::KeyUp,
    ];

    pub const fn index(self) -> usize {
        match self {
            EventKind::MouseDown => 0,
            EventKind::MouseUp => 1,
            EventKind::MouseMove => 2,
            EventKind::MouseOut => 3,
            EventKind::Click => 4,
            EventKind::DoubleClick => 5,
            EventKind::Wheel => 6,
            EventKind::KeyDown => 7,
            EventKind::KeyUp => 8,
        }
    }

    pub const fn is_keyboard(self) -> bool {
        matches!(self, EventKind::KeyDown | EventKind::KeyUp)
    }

    pub const fn is_pointer(self) -> bool {
        !self.is_keyboard()
    }

    /// DOM event name, used in logs.
    pub const fn name(self) -> &'static str {
        match self {
            EventKind::MouseDown => "mousedown",
            EventKind::MouseUp => "mouseup",
            EventKind::MouseMove => "mousemove",
            EventKind::MouseOut => "mouseout",
            EventKind::Click => "click",
            EventKind::DoubleClick => "dblclick",
            EventKind::Wheel => "wheel",
            EventKind::KeyDown => "keydown",
            EventKind::KeyUp => "keyup",
        }
    }
}

/// Bit mask of held buttons, same layout as the DOM `buttons` field.
pub mod buttons {
    pub const PRIMARY: u16 = 1;
    pub const SECONDARY: u16 = 2;
    pub const AUXILIARY: u16 = 4;
}

/// Set of event kinds a listener is subscribed to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventKindSet {
    bits: u16,
}

impl EventKindSet {
    pub const fn empty() -> Self {
        Self { bits: 0 }
    }

    pub fn all() -> Self {
        EventKind::ALL.into_iter().collect()
    }

    pub fn insert(&mut self, kind: EventKind) {
        self.bits |= 1 << kind.index();
    }

    pub fn remove(&mut self, kind: EventKind) {
        self.bits &= !(1 << kind.index());
    }

    pub fn contains(&self, kind: EventKind) -> bool {
        self.bits & (1 << kind.index()) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }
}

impl FromIterator<EventKind> for EventKindSet {
    fn from_iter<I: IntoIterator<Item = EventKind>>(iter: I) -> Self {
        let mut set = Self::empty();
        for kind in iter {
            set.insert(kind);
        }
        set
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InputEvent {
    pub kind: EventKind,
    /// Pointer position relative to the host surface. `None` when the host
    /// could not supply one; such events skip spatial resolution.
    pub offset: Option<Vec2>,
    pub buttons: u16,
    pub key: Option<String>,
    pub wheel_delta: Vec2,
}

impl InputEvent {
    pub fn pointer(kind: EventKind, x: f32, y: f32) -> Self {
        Self {
            kind,
            offset: Some(Vec2 { x, y }),
            buttons: 0,
            key: None,
            wheel_delta: Vec2::default(),
        }
    }

    pub fn pointer_without_offset(kind: EventKind) -> Self {
        Self {
            kind,
            offset: None,
            buttons: 0,
            key: None,
            wheel_delta: Vec2::default(),
        }
    }

    pub fn key(kind: EventKind, key: impl Into<String>) -> Self {
        Self {
            kind,
            offset: None,
            buttons: 0,
            key: Some(key.into()),
            wheel_delta: Vec2::default(),
        }
    }

    pub fn with_buttons(mut self, buttons: u16) -> Self {
        self.buttons = buttons;
        self
    }

    pub fn with_wheel_delta(mut self, delta: Vec2) -> Self {
        self.wheel_delta = delta;
        self
    }

    /// Copy of this event re-tagged as `kind`, keeping position and buttons.
    pub fn retarget(&self, kind: EventKind) -> Self {
        Self {
            kind,
            ..self.clone()
        }
    }

    pub fn is_primary_pressed(&self) -> bool {
        self.buttons & buttons::PRIMARY != 0
    }
}
