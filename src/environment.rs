use crate::{error::LispError, value::Value};


/// Handle to a frame owned by a [Frames] arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameId(usize);

/// One lexical scope: bindings in insertion order plus the enclosing scope.
/// The outer frame is fixed when the frame is constructed
#[derive(Debug)]
struct Frame {
    bindings: Vec<(String, Value)>,
    outer: Option<FrameId>,
}

/// Arena owning every frame created by an interpreter. Frames are never freed
/// before the arena itself, so a [FrameId] stays valid for the arena's lifetime
#[derive(Debug, Default)]
pub struct Frames {
    frames: Vec<Frame>,
}

impl Frames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a frame binding each name to the value at the same position.
    /// Callers check that both sequences have the same length
    pub fn construct(
        &mut self,
        names: impl IntoIterator<Item = String>,
        values: impl IntoIterator<Item = Value>,
        outer: Option<FrameId>,
    ) -> FrameId {
        let mut frame = Frame { bindings: Vec::new(), outer };
        for (name, value) in names.into_iter().zip(values) {
            Self::insert(&mut frame, name, value);
        }

        self.frames.push(frame);
        FrameId(self.frames.len() - 1)
    }

    /// Creates a frame without bindings nested inside `outer`
    pub fn child(&mut self, outer: FrameId) -> FrameId {
        self.frames.push(Frame { bindings: Vec::new(), outer: Some(outer) });
        FrameId(self.frames.len() - 1)
    }

    fn insert(frame: &mut Frame, name: String, value: Value) {
        match frame.bindings.iter_mut().find(|(bound, _)| *bound == name) {
            Some((_, slot)) => *slot = value,
            None => frame.bindings.push((name, value)),
        }
    }

    /// Number of live frames. Frames created after this point can be handed
    /// back with [Frames::release]
    pub(crate) fn len(&self) -> usize {
        self.frames.len()
    }

    /// Drops every frame created since `mark`, unless `captured` is one of them.
    /// Frames only ever refer to older frames, so the ones below `mark` stay valid
    pub(crate) fn release(&mut self, mark: usize, captured: Option<FrameId>) {
        if captured.map_or(true, |frame| frame.0 < mark) {
            self.frames.truncate(mark);
        }
    }

    pub fn outer(&self, frame: FrameId) -> Option<FrameId> {
        self.frames[frame.0].outer
    }

    pub fn lookup_local(&self, frame: FrameId, name: &str) -> Option<&Value> {
        self.frames[frame.0].bindings.iter()
            .find(|(bound, _)| bound == name)
            .map(|(_, value)| value)
    }

    /// Binds `name` in `frame` only, replacing any binding it already has there
    pub fn define(&mut self, frame: FrameId, name: &str, value: Value) {
        Self::insert(&mut self.frames[frame.0], name.to_owned(), value);
    }

    /// Finds the innermost binding of `name`, walking outwards from `frame`
    pub fn resolve(&self, frame: FrameId, name: &str) -> Result<&Value, LispError> {
        let mut current = Some(frame);
        while let Some(frame) = current {
            if let Some(value) = self.lookup_local(frame, name) {
                return Ok(value);
            }
            current = self.outer(frame);
        }

        Err(LispError::Name(name.to_owned()))
    }

    pub fn bindings(&self, frame: FrameId) -> impl Iterator<Item = (&str, &Value)> {
        self.frames[frame.0].bindings.iter()
            .map(|(name, value)| (name.as_str(), value))
    }
}
