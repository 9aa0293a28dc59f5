//! Lexical frames with write-through assignment.
//!
//! Frames live in an arena owned by [`Environment`] and refer to their parent
//! by [`FrameId`]. Each binding names a slot in a shared cell table. A frame
//! that writes a name already bound in an ancestor binds it to the nearest
//! ancestor's cell instead of a copy, so every frame on that chain reads the
//! latest value.
//!
//! Two rules differ from ordinary shadowing:
//!
//! * [`Environment::push_frame`] forwards every initial binding whose name
//!   already exists in an ancestor into that ancestor.
//! * [`Environment::set`] updates the local binding and every ancestor
//!   binding of the same name.
//!
//! [`Environment::define`] is the only local-only write.
//!
//! Frames are released in stack order with [`Environment::pop_frame`]. A
//! frame captured by a closure, and everything below it, stays alive for the
//! rest of the run.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use log::debug;

use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameId(usize);

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CellId(usize);

#[derive(Debug, Clone)]
struct Frame {
    bindings: HashMap<String, CellId>,
    parent: Option<FrameId>,
    /// Length of the cell table when the frame was pushed.
    first_cell: usize,
}

#[derive(Debug, Clone)]
struct Cell {
    value: Value,
    owner: FrameId,
}

#[derive(Debug, Clone)]
pub struct Environment {
    frames: Vec<Frame>,
    cells: Vec<Cell>,
    /// Frames below this index are closure environments or their ancestors.
    pinned: usize,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment {
    /// A fresh environment holding only the empty top-level frame.
    pub fn new() -> Self {
        Environment {
            frames: vec![Frame {
                bindings: HashMap::new(),
                parent: None,
                first_cell: 0,
            }],
            cells: Vec::new(),
            pinned: 0,
        }
    }

    pub fn global(&self) -> FrameId {
        FrameId(0)
    }

    pub fn parent(&self, frame: FrameId) -> Option<FrameId> {
        self.frames[frame.0].parent
    }

    /// Number of live frames, the top-level frame included.
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Create a child of `parent` bound to `initial`.
    pub fn push_frame<I>(&mut self, parent: FrameId, initial: I) -> FrameId
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        let id = FrameId(self.frames.len());
        self.frames.push(Frame {
            bindings: HashMap::new(),
            parent: Some(parent),
            first_cell: self.cells.len(),
        });

        for (name, value) in initial {
            self.set(id, &name, value);
        }

        debug!("Pushed frame {} (parent {})", id, parent);

        id
    }

    /// Create a child of `parent` with no bindings of its own.
    pub fn push_block(&mut self, parent: FrameId) -> FrameId {
        self.push_frame(parent, std::iter::empty::<(String, Value)>())
    }

    /// Release `frame`, the most recently pushed live frame, with its cells.
    ///
    /// A pinned frame is kept.
    pub fn pop_frame(&mut self, frame: FrameId) {
        if frame.0 < self.pinned || frame.0 >= self.frames.len() {
            debug!("Keeping frame {}", frame);
            return;
        }

        let first_cell = self.frames[frame.0].first_cell;
        self.frames.truncate(frame.0);
        self.cells.truncate(first_cell);

        debug!("Popped frame {}", frame);
    }

    /// Keep `frame` and its ancestors alive for the rest of the run.
    pub fn capture(&mut self, frame: FrameId) {
        self.pinned = self.pinned.max(frame.0 + 1);
    }

    /// Nearest binding of `name`, searching `frame` then its ancestors.
    pub fn get(&self, frame: FrameId, name: &str) -> Option<&Value> {
        self.chain(frame)
            .find_map(|id| self.frames[id.0].bindings.get(name))
            .map(|cell| &self.cells[cell.0].value)
    }

    /// Bind `name` in `frame` only.
    ///
    /// A local binding that shares an ancestor's cell is replaced by a fresh
    /// cell, leaving the ancestor untouched.
    pub fn define(&mut self, frame: FrameId, name: &str, value: Value) {
        debug!("Define '{}' = {} in frame {}", name, value, frame);

        match self.frames[frame.0].bindings.get(name).copied() {
            Some(cell) if self.cells[cell.0].owner == frame => self.cells[cell.0].value = value,
            _ => self.allocate(frame, name.to_string(), value),
        }
    }

    /// Assign `name` in `frame` and in every ancestor that binds it.
    ///
    /// When `frame` has no binding of its own it shares the nearest ancestor's
    /// cell, or gets a new one if no ancestor binds `name`.
    pub fn set(&mut self, frame: FrameId, name: &str, value: Value) {
        debug!("Set '{}' = {} from frame {}", name, value, frame);

        let owners: Vec<CellId> = self
            .chain(frame)
            .skip(1)
            .filter_map(|id| self.frames[id.0].bindings.get(name).copied())
            .collect();

        for cell in &owners {
            self.cells[cell.0].value = value.clone();
        }

        match (self.frames[frame.0].bindings.get(name).copied(), owners.first()) {
            (Some(cell), _) => self.cells[cell.0].value = value,
            (None, Some(&shared)) => {
                self.frames[frame.0].bindings.insert(name.to_string(), shared);
            }
            (None, None) => self.allocate(frame, name.to_string(), value),
        }
    }

    /// The bindings held by `frame` itself, ordered by name.
    pub fn locals(&self, frame: FrameId) -> BTreeMap<&str, &Value> {
        self.frames[frame.0]
            .bindings
            .iter()
            .map(|(name, cell)| (name.as_str(), &self.cells[cell.0].value))
            .collect()
    }

    /// `frame` followed by each of its ancestors.
    pub fn chain(&self, frame: FrameId) -> Chain<'_> {
        Chain {
            env: self,
            next: Some(frame),
        }
    }

    fn allocate(&mut self, frame: FrameId, name: String, value: Value) {
        let cell = CellId(self.cells.len());
        self.cells.push(Cell {
            value,
            owner: frame,
        });
        self.frames[frame.0].bindings.insert(name, cell);
    }
}

/// Iterator over a frame and its ancestors.
pub struct Chain<'e> {
    env: &'e Environment,
    next: Option<FrameId>,
}

impl Iterator for Chain<'_> {
    type Item = FrameId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.env.parent(current);
        Some(current)
    }
}

impl fmt::Display for Environment {
    /// One line per frame: `#id -> #parent {name: value, ...}`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, frame) in self.frames.iter().enumerate() {
            let id = FrameId(index);
            let locals: Vec<String> = self
                .locals(id)
                .into_iter()
                .map(|(name, value)| format!("{}: {}", name, value))
                .collect();

            match frame.parent {
                Some(parent) => writeln!(f, "{} -> {} {{{}}}", id, parent, locals.join(", "))?,
                None => writeln!(f, "{} {{{}}}", id, locals.join(", "))?,
            }
        }
        Ok(())
    }
}
